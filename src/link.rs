//! Resolves output links from link templates.
//!
//! A link template is a path with `:name` placeholders, e.g.
//! `:year/:month/:day/:title`. Each placeholder is replaced from the page's
//! context:
//!
//! * `:year`, `:month`, `:day` come from the `date` field when it holds a
//!   date, and otherwise from fields of the same name.
//! * `:title` is the file name without extension (`baseFileName`), falling
//!   back to the raw `title` field. It is never slugified.
//! * `:collection` and `:page` come from the collection and page number
//!   being linked, falling back to fields of the same name.
//! * `:path` is the source path without its extension, with a trailing
//!   `index` dropped.
//! * Any other placeholder is replaced by the field with that exact name.
//!
//! Placeholders that can't be resolved are left in the link as written.

use crate::date::parse_iso_local;
use crate::document::{
    file_name, remove_extension, BASE_FILE_NAME_KEY, DATE_KEY, FILE_PATH_KEY, TITLE_KEY,
};
use crate::value::Fields;
use chrono::NaiveDateTime;
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::OnceLock;

/// The link of every page after the first of a paginated page.
pub const DEFAULT_PAGINATE_LINK_TEMPLATE: &str = ":collection/page:page";

/// The link of a plain page.
pub const DEFAULT_PAGE_LINK_TEMPLATE: &str = ":path";

/// The link of a collection member.
pub const DEFAULT_DOCUMENT_LINK_TEMPLATE: &str = ":collection/:title";

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r":([A-Za-z0-9_]+)").expect("placeholder pattern is valid"))
}

/// The context placeholders are resolved from.
#[derive(Clone, Copy, Debug)]
pub struct LinkData<'a> {
    pub fields: &'a Fields,

    /// The page's source path. Falls back to the `filePath` field.
    pub path: Option<&'a str>,

    pub collection: Option<&'a str>,

    /// The 1-based page number of a paginated page.
    pub page: Option<usize>,
}

impl<'a> LinkData<'a> {
    pub fn new(fields: &'a Fields) -> LinkData<'a> {
        LinkData {
            fields,
            path: None,
            collection: None,
            page: None,
        }
    }

    fn path(&self) -> Option<&'a str> {
        self.path.or_else(|| self.fields.get_str(FILE_PATH_KEY))
    }

    fn field(&self, name: &str) -> Option<Cow<'a, str>> {
        self.fields.get(name).and_then(|value| value.as_text())
    }

    fn date(&self) -> Option<NaiveDateTime> {
        self.fields.get_str(DATE_KEY).and_then(parse_iso_local)
    }

    fn resolve(&self, name: &str) -> Option<Cow<'a, str>> {
        match name {
            "year" | "month" | "day" => match self.date() {
                Some(date) => Some(Cow::Owned(
                    date.format(match name {
                        "year" => "%Y",
                        "month" => "%m",
                        _ => "%d",
                    })
                    .to_string(),
                )),
                None => self.field(name),
            },
            "title" => self
                .fields
                .get_str(BASE_FILE_NAME_KEY)
                .map(Cow::Borrowed)
                .or_else(|| self.path().map(|p| Cow::Borrowed(remove_extension(file_name(p)))))
                .or_else(|| self.field(TITLE_KEY)),
            "collection" => match self.collection {
                Some(collection) => Some(Cow::Borrowed(collection)),
                None => self.field(name),
            },
            "page" => match self.page {
                Some(page) => Some(Cow::Owned(page.to_string())),
                None => self.field(name),
            },
            "path" => self.path().map(|path| Cow::Borrowed(strip_index(remove_extension(path)))),
            _ => self.field(name),
        }
    }
}

fn strip_index(path: &str) -> &str {
    if path == "index" {
        ""
    } else if path.ends_with("/index") {
        &path[..path.len() - "index".len()]
    } else {
        path
    }
}

/// Resolves `template` against `fields` alone.
pub fn link(root_path: &str, template: &str, fields: &Fields) -> String {
    resolve(root_path, template, &LinkData::new(fields))
}

/// Resolves `template` against `data` and normalizes the result into a link
/// relative to `root_path`: forward slashes only, no repeated or leading
/// slashes, and no leading `root_path` if the template already spelled it.
pub fn resolve(root_path: &str, template: &str, data: &LinkData<'_>) -> String {
    let resolved = placeholder_pattern().replace_all(template, |caps: &Captures<'_>| {
        match data.resolve(&caps[1]) {
            Some(value) => value.into_owned(),
            None => caps[0].to_owned(),
        }
    });
    normalize(root_path, &resolved)
}

fn normalize(root_path: &str, link: &str) -> String {
    let mut link = link.replace('\\', "/");
    while link.contains("//") {
        link = link.replace("//", "/");
    }

    let root = root_path.trim_matches('/');
    let mut rest = link.trim_start_matches('/');
    if !root.is_empty() {
        if rest == root {
            rest = "";
        } else if let Some(stripped) = rest.strip_prefix(root).and_then(|r| r.strip_prefix('/')) {
            rest = stripped;
        }
    }
    rest.to_owned()
}
