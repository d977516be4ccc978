//! Walks the content tree and turns every content file into a [`Document`].
//!
//! A scan makes three passes over the content root, in order:
//!
//! 1. Every configured includes directory. Files found there are layouts and
//!    partials; they are never published.
//! 2. Every configured collection directory. Files found there belong to the
//!    collection and their source paths are prefixed with its name.
//! 3. The whole content root, skipping any path with a segment that starts
//!    with `_`.
//!
//! Each pass returns its own list of documents and the lists are merged once
//! all passes finish. A scan either produces the full document set or fails
//! on the first bad file.

use crate::config::Config;
use crate::date::{self, DateFormat};
use crate::document::*;
use crate::frontmatter;
use crate::template;
use crate::value::Fields;
use chrono::{DateTime, FixedOffset, Local};
use rayon::prelude::*;
use rayon::{ThreadPoolBuildError, ThreadPoolBuilder};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Scans a content tree into [`Document`]s.
pub struct Scanner<'a> {
    /// Directories (relative to the content root) holding layouts and
    /// partials.
    includes_dirs: &'a [String],

    /// Collection directories (relative to the content root) mapped to the
    /// collection name.
    collections: Vec<(&'a str, &'a str)>,

    /// Whether documents flagged `draft: true` are kept.
    draft: bool,

    /// Whether documents dated after `now` are kept.
    future: bool,

    date_format: &'a DateFormat,

    /// The moment future-dated documents are compared against.
    now: DateTime<FixedOffset>,

    /// The maximum number of roots walked at once.
    threads: usize,
}

/// One directory walk.
struct Root<'a> {
    dir: PathBuf,
    source: Source<'a>,
}

impl<'a> Scanner<'a> {
    /// Constructs a scanner from `config`, dating the scan at the current
    /// local time.
    pub fn new(config: &'a Config) -> Scanner<'a> {
        let now = Local::now();
        Scanner {
            includes_dirs: &config.includes_dirs,
            collections: config
                .collections
                .iter()
                .map(|(dir, name)| (dir.as_str(), name.as_str()))
                .collect(),
            draft: config.draft,
            future: config.future,
            date_format: &config.date_format,
            now: now.with_timezone(now.offset()),
            threads: config.threads.max(1),
        }
    }

    /// Overrides the moment future-dated documents are compared against.
    pub fn with_now(mut self, now: DateTime<FixedOffset>) -> Scanner<'a> {
        self.now = now;
        self
    }

    /// Scans `content_directory`. A missing content directory yields no
    /// documents.
    pub fn scan(&self, content_directory: &Path) -> Result<Vec<Document>> {
        if !content_directory.is_dir() {
            info!(
                directory = %content_directory.display(),
                "content directory not found; nothing to scan"
            );
            return Ok(Vec::new());
        }

        let roots = self.roots(content_directory);
        let walks: Vec<Result<Vec<Document>>> = if self.threads < 2 {
            roots.iter().map(|root| self.walk(root)).collect()
        } else {
            self.walk_parallel(&roots)?
        };

        let mut lists = Vec::with_capacity(walks.len());
        for walk in walks {
            lists.push(walk?);
        }
        let documents = merge(lists);
        info!(
            documents = documents.len(),
            roots = roots.len(),
            "scanned content"
        );
        Ok(documents)
    }

    fn roots(&self, content_directory: &Path) -> Vec<Root<'a>> {
        let mut roots = Vec::new();
        for includes_dir in self.includes_dirs {
            let dir = content_directory.join(includes_dir);
            if dir.is_dir() {
                roots.push(Root {
                    dir,
                    source: Source::Include,
                });
            }
        }
        for &(collection_dir, collection) in &self.collections {
            let dir = content_directory.join(collection_dir);
            if dir.is_dir() {
                roots.push(Root {
                    dir,
                    source: Source::Collection(collection),
                });
            }
        }
        roots.push(Root {
            dir: content_directory.to_owned(),
            source: Source::Page,
        });
        roots
    }

    // Walks the roots on a dedicated pool of `threads` workers. Results keep
    // the order of `roots` so the first error reported is the same as in a
    // sequential scan.
    fn walk_parallel(&self, roots: &[Root<'a>]) -> Result<Vec<Result<Vec<Document>>>> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .build()
            .map_err(Error::ThreadPool)?;
        Ok(pool.install(|| roots.par_iter().map(|root| self.walk(root)).collect()))
    }

    fn walk(&self, root: &Root<'a>) -> Result<Vec<Document>> {
        let mut documents = Vec::new();
        for result in WalkDir::new(&root.dir)
            .sort_by(|a, b| a.file_name().cmp(b.file_name()))
        {
            let entry = result.map_err(|err| Error::Walk {
                root: root.dir.clone(),
                err,
            })?;
            if !entry.file_type().is_file()
                || !is_extension_supported(&entry.file_name().to_string_lossy())
            {
                continue;
            }

            // walkdir only yields descendants of the root
            let relative = match entry.path().strip_prefix(&root.dir) {
                Ok(relative) => relative,
                Err(_) => continue,
            };
            if root.source == Source::Page
                && is_excluded(&relative.to_string_lossy())
            {
                continue;
            }

            if let Some(document) = self.scan_file(root, entry.path(), relative)? {
                documents.push(document);
            }
        }
        Ok(documents)
    }

    /// Reads and extracts a single file. Returns `None` for files filtered
    /// out as drafts or as future-dated.
    fn scan_file(
        &self,
        root: &Root<'a>,
        path: &Path,
        relative: &Path,
    ) -> Result<Option<Document>> {
        let Classification {
            collection,
            source_path,
            template_path,
            is_publishable,
        } = classify(root.source, relative);

        let contents = std::fs::read_to_string(path).map_err(|err| Error::Io {
            path: path.to_owned(),
            root: root.dir.clone(),
            err,
        })?;
        let front_matter = frontmatter::extract(path, &contents).map_err(|err| {
            Error::FrontMatter {
                root: root.dir.clone(),
                err,
            }
        })?;

        if !front_matter.present {
            return Ok(Some(Document {
                collection,
                source_path,
                template_path,
                is_publishable,
                layout: None,
                fields: Fields::new(),
                generated_template: contents,
            }));
        }

        let mut fields = front_matter.fields;
        let body = front_matter.body;

        let is_draft = fields
            .get(DRAFT_KEY)
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        if is_draft && !self.draft {
            debug!(path = %source_path, "skipping draft");
            return Ok(None);
        }

        if let Some(value) = fields.get(DATE_KEY) {
            let date = self.parse_date(value.as_text().as_deref(), root, path)?;
            if !self.future && date > self.now {
                debug!(path = %source_path, date = %date, "skipping future-dated document");
                return Ok(None);
            }
            fields.insert(DATE_KEY, date::iso_local(&date));
        }

        let layout = fields
            .get_str(LAYOUT_KEY)
            .map(|layout| remove_extension(layout).to_owned());

        let name = file_name(&source_path).to_owned();
        fields.insert(RAW_CONTENT_KEY, body.as_str());
        fields.insert(BASE_FILE_NAME_KEY, remove_extension(&name));
        fields.insert(FILE_NAME_KEY, name.as_str());
        fields.insert(FILE_PATH_KEY, source_path.as_str());

        debug!(template = %template_path, "creating generated template");
        let generated_template = template::generate(&source_path, layout.as_deref(), &body);

        Ok(Some(Document {
            collection,
            source_path,
            template_path,
            is_publishable,
            layout,
            fields,
            generated_template,
        }))
    }

    fn parse_date(
        &self,
        value: Option<&str>,
        root: &Root<'a>,
        path: &Path,
    ) -> Result<DateTime<FixedOffset>> {
        // Lists, maps and nulls can't be dates; report them like any other
        // value that doesn't match the pattern.
        self.date_format
            .parse(value.unwrap_or_default())
            .map_err(|err| Error::Date {
                path: path.to_owned(),
                root: root.dir.clone(),
                err,
            })
    }
}

/// Concatenates the per-root lists, drops documents that are structurally
/// equal to one already kept, and orders the result by source path.
fn merge(lists: Vec<Vec<Document>>) -> Vec<Document> {
    let mut documents: Vec<Document> = lists.into_iter().flatten().collect();
    documents.sort_by(|a, b| {
        (&a.source_path, &a.collection, a.is_publishable).cmp(&(
            &b.source_path,
            &b.collection,
            b.is_publishable,
        ))
    });

    let mut merged: Vec<Document> = Vec::with_capacity(documents.len());
    for document in documents {
        let duplicate = merged
            .iter()
            .rev()
            .take_while(|kept| {
                kept.source_path == document.source_path
                    && kept.collection == document.collection
            })
            .any(|kept| *kept == document);
        if !duplicate {
            merged.push(document);
        }
    }
    merged
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error scanning the content tree. Every variant names the
/// root being walked.
#[derive(Debug)]
pub enum Error {
    /// Returned when a content file can't be read.
    Io {
        path: PathBuf,
        root: PathBuf,
        err: std::io::Error,
    },

    /// Returned when a directory can't be walked.
    Walk { root: PathBuf, err: walkdir::Error },

    /// Returned when a file's front matter can't be parsed.
    FrontMatter {
        root: PathBuf,
        err: frontmatter::Error,
    },

    /// Returned when a file's `date` doesn't match the date pattern.
    Date {
        path: PathBuf,
        root: PathBuf,
        err: date::Error,
    },

    /// Returned when the worker pool for a parallel scan can't be started.
    ThreadPool(ThreadPoolBuildError),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io { path, root, err } => write!(
                f,
                "Reading '{}' (scanning '{}'): {}",
                path.display(),
                root.display(),
                err
            ),
            Error::Walk { root, err } => {
                write!(f, "Scanning '{}': {}", root.display(), err)
            }
            Error::FrontMatter { root, err } => {
                write!(f, "{} (scanning '{}')", err, root.display())
            }
            Error::Date { path, root, err } => write!(
                f,
                "Parsing date in '{}' (scanning '{}'): {}",
                path.display(),
                root.display(),
                err
            ),
            Error::ThreadPool(err) => write!(f, "Starting scan workers: {}", err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { err, .. } => Some(err),
            Error::Walk { err, .. } => Some(err),
            Error::FrontMatter { err, .. } => Some(err),
            Error::Date { err, .. } => Some(err),
            Error::ThreadPool(err) => Some(err),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::value::Value;
    use chrono::TimeZone;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn site() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "_layouts/default.html", "<html>{#insert /}</html>\n");
        write(
            root,
            "_includes/header.html",
            "---\ntitle: header\n---\n<header></header>\n",
        );
        write(
            root,
            "_posts/hello.md",
            "---\ntitle: Hello\nlayout: default.html\ndate: 2024-08-27 10:30\n---\n# Hello\n",
        );
        write(
            root,
            "_posts/draft.md",
            "---\ntitle: Draft\ndraft: true\n---\nwip\n",
        );
        write(
            root,
            "_posts/later.md",
            "---\ntitle: Later\ndate: 2999-01-01\n---\nsoon\n",
        );
        write(root, "index.html", "---\nlayout: default\npaginate: posts\n---\n<h1>Home</h1>\n");
        write(root, "pages/about.adoc", "= About\n");
        write(root, "pages/_private/secret.md", "---\ntitle: s\n---\nsecret\n");
        write(root, "assets/style.css", "body {}\n");
        dir
    }

    fn scan(config: &Config) -> Result<Vec<Document>> {
        Scanner::new(config)
            .with_now(FixedOffset::east_opt(0).unwrap().with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())
            .scan(&config.content_directory)
    }

    fn find<'d>(documents: &'d [Document], source_path: &str) -> Option<&'d Document> {
        documents.iter().find(|d| d.source_path == source_path)
    }

    #[test]
    fn test_scan_passes() -> Result<()> {
        let dir = site();
        let documents = scan(&Config::new(dir.path()))?;

        let paths: Vec<(&str, Option<&str>, bool)> = documents
            .iter()
            .map(|d| (d.source_path.as_str(), d.collection.as_deref(), d.is_publishable))
            .collect();
        assert_eq!(
            vec![
                ("default.html", None, false),
                ("header.html", None, false),
                ("index.html", None, true),
                ("pages/about.adoc", None, true),
                ("posts/hello.md", Some("posts"), true),
            ],
            paths
        );
        Ok(())
    }

    #[test]
    fn test_scan_document_fields() -> Result<()> {
        let dir = site();
        let documents = scan(&Config::new(dir.path()))?;

        let hello = find(&documents, "posts/hello.md").unwrap();
        assert_eq!("posts/hello.html", hello.template_path);
        assert_eq!(Some("default"), hello.layout.as_deref());
        assert_eq!(Some("2024-08-27T10:30:00"), hello.fields.get_str(DATE_KEY));
        assert_eq!(Some("# Hello\n"), hello.fields.get_str(RAW_CONTENT_KEY));
        assert_eq!(Some("hello"), hello.fields.get_str(BASE_FILE_NAME_KEY));
        assert_eq!(Some("hello.md"), hello.fields.get_str(FILE_NAME_KEY));
        assert_eq!(Some("posts/hello.md"), hello.fields.get_str(FILE_PATH_KEY));
        assert_eq!(
            "{#include default}\n{#markdown}\n# Hello\n{/markdown}\n{/include}",
            hello.generated_template
        );

        let index = find(&documents, "index.html").unwrap();
        assert_eq!(Some(&Value::from("posts")), index.fields.get(PAGINATE_KEY));
        Ok(())
    }

    #[test]
    fn test_files_without_front_matter_are_opaque() -> Result<()> {
        let dir = site();
        let documents = scan(&Config::new(dir.path()))?;

        let about = find(&documents, "pages/about.adoc").unwrap();
        assert!(about.fields.is_empty());
        assert_eq!(None, about.layout);
        assert_eq!("= About\n", about.generated_template);

        let layout = find(&documents, "default.html").unwrap();
        assert!(layout.is_layout());
        assert_eq!("<html>{#insert /}</html>\n", layout.generated_template);
        Ok(())
    }

    #[test]
    fn test_drafts_and_future_included_when_allowed() -> Result<()> {
        let dir = site();
        let mut config = Config::new(dir.path());
        config.draft = true;
        config.future = true;
        let documents = scan(&config)?;

        let draft = find(&documents, "posts/draft.md").unwrap();
        assert_eq!("{#markdown}\nwip\n{/markdown}", draft.generated_template);
        let later = find(&documents, "posts/later.md").unwrap();
        assert_eq!(Some("2999-01-01T00:00:00"), later.fields.get_str(DATE_KEY));
        Ok(())
    }

    #[test]
    fn test_underscore_paths_only_excluded_from_pages() -> Result<()> {
        let dir = site();
        let mut config = Config::new(dir.path());
        config.includes_dirs = vec![String::from("pages/_private")];
        let documents = scan(&config)?;

        let secret = find(&documents, "secret.md").unwrap();
        assert!(secret.is_layout());
        assert!(find(&documents, "pages/_private/secret.md").is_none());
        Ok(())
    }

    #[test]
    fn test_parallel_scan_matches_sequential() -> Result<()> {
        let dir = site();
        let mut config = Config::new(dir.path());
        config.threads = 1;
        let sequential = scan(&config)?;
        config.threads = 4;
        assert_eq!(sequential, scan(&config)?);
        Ok(())
    }

    #[test]
    fn test_duplicate_roots_are_merged() -> Result<()> {
        let dir = site();
        let mut config = Config::new(dir.path());
        config.includes_dirs = vec![String::from("_layouts"), String::from("_layouts")];
        let documents = scan(&config)?;
        assert_eq!(
            1,
            documents
                .iter()
                .filter(|d| d.source_path == "default.html")
                .count()
        );
        Ok(())
    }

    #[test]
    fn test_bad_date_aborts_scan() {
        let dir = site();
        write(dir.path(), "_posts/bad.md", "---\ndate: tomorrow\n---\nx\n");
        match scan(&Config::new(dir.path())) {
            Err(Error::Date { path, .. }) => assert!(path.ends_with("_posts/bad.md")),
            other => panic!("wanted date error; found {:?}", other),
        }
    }

    #[test]
    fn test_bad_front_matter_aborts_scan() {
        let dir = site();
        write(dir.path(), "broken.md", "---\ntitle: [oops\n---\nx\n");
        match scan(&Config::new(dir.path())) {
            Err(Error::FrontMatter { root, .. }) => assert_eq!(dir.path(), root),
            other => panic!("wanted front matter error; found {:?}", other),
        }
    }

    #[test]
    fn test_unreadable_file_aborts_scan() {
        let dir = site();
        fs::write(dir.path().join("bad.md"), [0xff, 0xfe]).unwrap();
        for threads in &[1, 4] {
            let mut config = Config::new(dir.path());
            config.threads = *threads;
            match scan(&config) {
                Err(Error::Io { path, root, .. }) => {
                    assert_eq!(dir.path().join("bad.md"), path);
                    assert_eq!(dir.path(), root);
                }
                other => panic!("wanted I/O error; found {:?}", other),
            }
        }
    }

    #[test]
    fn test_missing_content_directory() -> Result<()> {
        let dir = TempDir::new().unwrap();
        let config = Config::new(&dir.path().join("missing"));
        assert!(scan(&config)?.is_empty());
        Ok(())
    }
}
