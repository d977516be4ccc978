//! Defines the [`Document`] type, one content file after extraction, and the
//! classification rules that decide a file's collection, source path and
//! template path from where it was found.

use crate::value::Fields;
use serde::Serialize;
use std::path::Path;

/// Front-matter flag that marks a document as a draft.
pub const DRAFT_KEY: &str = "draft";

/// Front-matter date of a document, rewritten as an ISO local date-time.
pub const DATE_KEY: &str = "date";

/// Front-matter name of the parent layout.
pub const LAYOUT_KEY: &str = "layout";

pub const TITLE_KEY: &str = "title";

/// Front-matter link template overriding the default page link.
pub const LINK_KEY: &str = "link";

/// Front-matter pagination declaration.
pub const PAGINATE_KEY: &str = "paginate";

// Injected into every document with front matter.
pub const RAW_CONTENT_KEY: &str = "rawContent";
pub const BASE_FILE_NAME_KEY: &str = "baseFileName";
pub const FILE_NAME_KEY: &str = "fileName";
pub const FILE_PATH_KEY: &str = "filePath";

/// One content file after extraction. Documents are built once per scan and
/// never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// The owning collection, if the file was found in a collection
    /// directory.
    pub collection: Option<String>,

    /// Forward-slash path relative to the scan root, prefixed with the
    /// collection name for collection members (e.g. `posts/hello.md`).
    pub source_path: String,

    /// `source_path` with its extension replaced by `.html`.
    pub template_path: String,

    /// False for layouts and includes.
    pub is_publishable: bool,

    /// The parent layout, extension stripped.
    pub layout: Option<String>,

    /// Parsed front matter plus the injected fields.
    pub fields: Fields,

    /// The output of [`crate::template::generate`], or the raw file contents
    /// for files without front matter.
    pub generated_template: String,
}

impl Document {
    pub fn is_layout(&self) -> bool {
        !self.is_publishable
    }

    /// The file name without extension, from the injected field or, for
    /// documents without front matter, from the source path.
    pub fn base_file_name(&self) -> String {
        match self.fields.get_str(BASE_FILE_NAME_KEY) {
            Some(name) => name.to_owned(),
            None => remove_extension(file_name(&self.source_path)).to_owned(),
        }
    }
}

/// The kind of root a file was found under.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Source<'a> {
    /// An includes directory: the file is a layout or partial.
    Include,

    /// A collection directory, with the collection's name.
    Collection(&'a str),

    /// The general page tree.
    Page,
}

impl<'a> Source<'a> {
    pub fn collection(&self) -> Option<&'a str> {
        match *self {
            Source::Collection(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_layout(&self) -> bool {
        matches!(self, Source::Include)
    }
}

/// Where a file lands in the document model.
#[derive(Clone, Debug, PartialEq)]
pub struct Classification {
    pub collection: Option<String>,
    pub source_path: String,
    pub template_path: String,
    pub is_publishable: bool,
}

/// Classifies the file at `relative` (relative to the root it was found
/// under).
pub fn classify(source: Source<'_>, relative: &Path) -> Classification {
    let relative = to_unix_path(&relative.to_string_lossy());
    let source_path = match source.collection() {
        Some(collection) => format!("{}/{}", collection, relative),
        None => relative,
    };
    Classification {
        collection: source.collection().map(str::to_owned),
        template_path: template_path(&source_path),
        source_path,
        is_publishable: !source.is_layout(),
    }
}

/// Replaces the extension of `source_path` with `.html`.
pub fn template_path(source_path: &str) -> String {
    format!("{}.html", remove_extension(source_path))
}

/// Strips the extension from the last path segment, if it has one.
pub fn remove_extension(path: &str) -> &str {
    let start = path.rfind('/').map(|i| i + 1).unwrap_or(0);
    match path[start..].rfind('.') {
        Some(dot) => &path[..start + dot],
        None => path,
    }
}

pub fn file_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(i) => &path[i + 1..],
        None => path,
    }
}

pub fn to_unix_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Returns true if any segment of `relative` starts with `_`. Such files are
/// skipped when walking the page tree (they belong to includes, collections
/// and data directories).
pub fn is_excluded(relative: &str) -> bool {
    let relative = to_unix_path(relative);
    relative.starts_with('_') || relative.contains("/_")
}

/// File name suffixes of the content files picked up by a scan.
pub const SUPPORTED_EXTENSIONS: [&str; 5] = [".md", "markdown", ".html", ".asciidoc", ".adoc"];

pub fn is_extension_supported(file_name: &str) -> bool {
    SUPPORTED_EXTENSIONS
        .iter()
        .any(|extension| file_name.ends_with(extension))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_classify_include() {
        assert_eq!(
            Classification {
                collection: None,
                source_path: String::from("partials/header.html"),
                template_path: String::from("partials/header.html"),
                is_publishable: false,
            },
            classify(Source::Include, Path::new("partials/header.html")),
        );
    }

    #[test]
    fn test_classify_collection_member() {
        assert_eq!(
            Classification {
                collection: Some(String::from("posts")),
                source_path: String::from("posts/2024/hello.md"),
                template_path: String::from("posts/2024/hello.html"),
                is_publishable: true,
            },
            classify(Source::Collection("posts"), Path::new("2024/hello.md")),
        );
    }

    #[test]
    fn test_classify_page() {
        let c = classify(Source::Page, Path::new("docs/guide.adoc"));
        assert_eq!(None, c.collection);
        assert_eq!("docs/guide.adoc", c.source_path);
        assert_eq!("docs/guide.html", c.template_path);
        assert!(c.is_publishable);
    }

    #[test]
    fn test_remove_extension() {
        assert_eq!("a/b", remove_extension("a/b.md"));
        assert_eq!("a.d/b", remove_extension("a.d/b"));
        assert_eq!("default", remove_extension("default.html"));
        assert_eq!("default", remove_extension("default"));
        assert_eq!("archive.tar", remove_extension("archive.tar.gz"));
    }

    #[test]
    fn test_is_excluded() {
        assert!(is_excluded("_posts/hello.md"));
        assert!(is_excluded("blog/_drafts/hello.md"));
        assert!(is_excluded("blog\\_drafts\\hello.md"));
        assert!(!is_excluded("blog/my_post.md"));
        assert!(!is_excluded("index.html"));
    }

    #[test]
    fn test_is_extension_supported() {
        for name in &["a.md", "a.markdown", "a.html", "a.adoc", "a.asciidoc"] {
            assert!(is_extension_supported(name), "{}", name);
        }
        for name in &["a.css", "a.yml", "a.htm", "md"] {
            assert!(!is_extension_supported(name), "{}", name);
        }
    }

    #[test]
    fn test_base_file_name_without_front_matter() {
        let doc = Document {
            collection: None,
            source_path: String::from("blog/raw.html"),
            template_path: String::from("blog/raw.html"),
            is_publishable: true,
            layout: None,
            fields: Fields::new(),
            generated_template: String::new(),
        };
        assert_eq!("raw", doc.base_file_name());
    }
}
