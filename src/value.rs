//! Defines [`Value`] and [`Fields`], the statically typed form of a parsed
//! front-matter block. YAML input of any shape is converted into these types
//! once, in [`crate::frontmatter`], and the rest of the pipeline only ever
//! matches on the variants.

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::borrow::Cow;
use std::fmt;

/// A single front-matter value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(Fields),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Fields> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Returns the value as text if it is a scalar. Strings come back
    /// verbatim; `null`, lists and maps have no textual form.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Value::String(s) => Some(Cow::Borrowed(s)),
            Value::Integer(i) => Some(Cow::Owned(i.to_string())),
            Value::Float(f) => Some(Cow::Owned(f.to_string())),
            Value::Bool(b) => Some(Cow::Owned(b.to_string())),
            Value::Null | Value::List(_) | Value::Map(_) => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Value {
        Value::Integer(i)
    }
}

/// An insertion-ordered mapping of field names to [`Value`]s. Inserting an
/// existing key replaces its value in place, keeping the original position.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Fields(IndexMap<String, Value>);

impl Fields {
    pub fn new() -> Fields {
        Fields::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Inserts `value` under `key`, returning the previous value if any.
    pub fn insert<K: Into<String>, V: Into<Value>>(
        &mut self,
        key: K,
        value: V,
    ) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Fields {
        let mut fields = Fields::new();
        for (k, v) in iter {
            fields.insert(k, v);
        }
        fields
    }
}

impl From<Fields> for Value {
    fn from(fields: Fields) -> Value {
        Value::Map(fields)
    }
}

impl TryFrom<serde_yaml::Value> for Value {
    type Error = Error;

    fn try_from(value: serde_yaml::Value) -> Result<Value, Error> {
        use serde_yaml::Value as Yaml;
        Ok(match value {
            Yaml::Null => Value::Null,
            Yaml::Bool(b) => Value::Bool(b),
            Yaml::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().ok_or(Error::Number)?),
            },
            Yaml::String(s) => Value::String(s),
            Yaml::Sequence(items) => Value::List(
                items
                    .into_iter()
                    .map(Value::try_from)
                    .collect::<Result<Vec<Value>, Error>>()?,
            ),
            Yaml::Mapping(mapping) => {
                Value::Map(Fields::try_from(Yaml::Mapping(mapping))?)
            }
        })
    }
}

impl TryFrom<serde_yaml::Value> for Fields {
    type Error = Error;

    /// Converts a top-level YAML document into [`Fields`]. An empty document
    /// (`null`) yields no fields; any other non-mapping document is an error.
    fn try_from(value: serde_yaml::Value) -> Result<Fields, Error> {
        use serde_yaml::Value as Yaml;
        match value {
            Yaml::Null => Ok(Fields::new()),
            Yaml::Mapping(mapping) => {
                let mut fields = Fields::new();
                for (k, v) in mapping {
                    let key = match k {
                        Yaml::String(s) => s,
                        Yaml::Bool(b) => b.to_string(),
                        Yaml::Number(n) => n.to_string(),
                        _ => return Err(Error::Key),
                    };
                    fields.insert(key, Value::try_from(v)?);
                }
                Ok(fields)
            }
            _ => Err(Error::NotAMapping),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(fields) => fields.serialize(serializer),
        }
    }
}

impl Serialize for Fields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Returned when a YAML document can't be represented as [`Fields`].
#[derive(Debug, PartialEq)]
pub enum Error {
    /// The top-level document is a scalar or a list.
    NotAMapping,

    /// A mapping key is itself a list or a mapping.
    Key,

    /// A number fits neither `i64` nor `f64`.
    Number,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NotAMapping => {
                write!(f, "front matter must be a mapping of keys to values")
            }
            Error::Key => write!(f, "front matter keys must be scalars"),
            Error::Number => write!(f, "unrepresentable number"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_insert_replaces_in_place() {
        let mut fields: Fields =
            vec![("a", Value::Integer(1)), ("b", Value::Integer(2))]
                .into_iter()
                .collect();
        assert_eq!(Some(Value::Integer(1)), fields.insert("a", "one"));
        let keys: Vec<&str> = fields.iter().map(|(k, _)| k).collect();
        assert_eq!(vec!["a", "b"], keys);
        assert_eq!(Some("one"), fields.get_str("a"));
    }

    #[test]
    fn test_many_fields_keep_order() {
        let mut fields: Fields = (0..100i64).map(|i| (format!("k{}", i), i)).collect();
        fields.insert("k42", "replaced");
        assert_eq!(100, fields.len());
        assert_eq!(Some("replaced"), fields.get_str("k42"));
        assert_eq!(Some(&Value::Integer(99)), fields.get("k99"));
        assert!(fields.contains_key("k0") && !fields.contains_key("k100"));
        let keys: Vec<&str> = fields.iter().map(|(k, _)| k).skip(41).take(3).collect();
        assert_eq!(vec!["k41", "k42", "k43"], keys);
    }

    #[test]
    fn test_from_yaml_preserves_order_and_shapes() -> Result<(), Box<dyn std::error::Error>> {
        let yaml: serde_yaml::Value = serde_yaml::from_str(
            "zeta: 1\nalpha: [x, 2.5]\nnested:\n  flag: true\n  none: ~\n",
        )?;
        let fields = Fields::try_from(yaml)?;

        let keys: Vec<&str> = fields.iter().map(|(k, _)| k).collect();
        assert_eq!(vec!["zeta", "alpha", "nested"], keys);
        assert_eq!(Some(&Value::Integer(1)), fields.get("zeta"));
        assert_eq!(
            Some(&Value::List(vec![Value::from("x"), Value::Float(2.5)])),
            fields.get("alpha")
        );
        let nested = fields.get("nested").and_then(Value::as_map).unwrap();
        assert_eq!(Some(true), nested.get("flag").and_then(Value::as_bool));
        assert_eq!(Some(&Value::Null), nested.get("none"));
        Ok(())
    }

    #[test]
    fn test_scalar_document_is_rejected() -> Result<(), serde_yaml::Error> {
        let yaml: serde_yaml::Value = serde_yaml::from_str("just a string")?;
        assert_eq!(Err(Error::NotAMapping), Fields::try_from(yaml));
        Ok(())
    }

    #[test]
    fn test_as_text() {
        assert_eq!(Some("My Post"), Value::from("My Post").as_text().as_deref());
        assert_eq!(Some("3"), Value::Integer(3).as_text().as_deref());
        assert_eq!(None, Value::List(Vec::new()).as_text());
    }

    #[test]
    fn test_serialize_keeps_order() -> Result<(), serde_yaml::Error> {
        let fields: Fields = vec![("b", Value::Integer(1)), ("a", Value::from("x"))]
            .into_iter()
            .collect();
        let out = serde_yaml::to_string(&fields)?;
        let b = out.find("b:").unwrap();
        let a = out.find("a:").unwrap();
        assert!(b < a, "unexpected order in {:?}", out);
        Ok(())
    }
}
