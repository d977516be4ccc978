//! Splits a raw content file into its front-matter [`Fields`] and its body.
//!
//! A file carries front matter only if it *starts* with a block like:
//!
//! ```md
//! ---
//! title: Hello, world!
//! date: 2021-04-16
//! ---
//! # Hello
//! ```
//!
//! i.e., an opening `---` line, the YAML document, and a closing `---` line
//! immediately followed by a newline. Anything else is an opaque body with no
//! metadata.

use crate::value::{self, Fields};
use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

const FENCE: &str = "---";

fn block_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // `\A` anchors at the start of the input (not at line starts) and `(?s)`
    // lets `.` cross newlines. The match runs to the last `---` line, so a
    // stripped body never starts with another block.
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)\A---\n.*\n---\n").expect("front matter pattern is valid")
    })
}

/// The result of splitting a content file.
#[derive(Debug, PartialEq)]
pub struct FrontMatter {
    /// The parsed front matter; empty when the file has no front matter.
    pub fields: Fields,

    /// The file contents with the front-matter block removed.
    pub body: String,

    /// Whether a front-matter block was found at all. A file with an empty
    /// block (`---\n\n---\n`) has front matter but no fields.
    pub present: bool,
}

/// Returns true if `input` begins with a front-matter block.
pub fn has_front_matter(input: &str) -> bool {
    block_pattern().is_match(input)
}

/// Removes the leading front-matter block from `input`, up to and including
/// the last `---` line. Input without front matter is returned unchanged.
pub fn strip_front_matter(input: &str) -> String {
    block_pattern().replace_all(input, "").into_owned()
}

/// Returns the text between the opening fence and the next `---`, trimmed.
fn front_matter_text(input: &str) -> &str {
    match input[FENCE.len()..].find(FENCE) {
        Some(offset) => input[FENCE.len()..FENCE.len() + offset].trim(),
        None => "",
    }
}

/// Splits `input` into front matter and body. `path` only annotates errors.
pub fn extract(path: &Path, input: &str) -> Result<FrontMatter> {
    if !has_front_matter(input) {
        return Ok(FrontMatter {
            fields: Fields::new(),
            body: input.to_owned(),
            present: false,
        });
    }

    let text = front_matter_text(input);
    let fields = if text.is_empty() {
        Fields::new()
    } else {
        let yaml: serde_yaml::Value =
            serde_yaml::from_str(text).map_err(|err| Error::Parse {
                path: path.to_owned(),
                err,
            })?;
        Fields::try_from(yaml).map_err(|err| Error::Shape {
            path: path.to_owned(),
            err,
        })?
    };

    Ok(FrontMatter {
        fields,
        body: strip_front_matter(input),
        present: true,
    })
}

pub type Result<T> = std::result::Result<T, Error>;

/// Returned when a front-matter block can't be parsed.
#[derive(Debug)]
pub enum Error {
    /// The block is not valid YAML.
    Parse {
        path: PathBuf,
        err: serde_yaml::Error,
    },

    /// The block is valid YAML but not a mapping of scalar keys.
    Shape { path: PathBuf, err: value::Error },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse { path, err } => write!(
                f,
                "Parsing front matter in '{}': {}",
                path.display(),
                err
            ),
            Error::Shape { path, err } => write!(
                f,
                "Parsing front matter in '{}': {}",
                path.display(),
                err
            ),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse { path: _, err } => Some(err),
            Error::Shape { path: _, err } => Some(err),
        }
    }
}
