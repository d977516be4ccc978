//! Loads the project configuration from a `folio.yaml` file. Every key is
//! optional; see [`Config`] for the defaults.

use crate::date::{DateFormat, DEFAULT_DATE_FORMAT};
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use url::Url;

pub const PROJECT_FILE: &str = "folio.yaml";

#[derive(Deserialize)]
#[serde(default)]
struct Project {
    content_dir: Option<PathBuf>,
    includes_dirs: Vec<String>,
    collections: BTreeMap<String, String>,
    draft: bool,
    future: bool,
    date_format: String,
    root_path: String,
    site_url: Option<Url>,
    default_paginated_collection: Option<String>,
    threads: Option<usize>,
}

impl Default for Project {
    fn default() -> Self {
        Project {
            content_dir: None,
            includes_dirs: default_includes_dirs(),
            collections: default_collections(),
            draft: false,
            future: false,
            date_format: String::from(DEFAULT_DATE_FORMAT),
            root_path: String::from("/"),
            site_url: None,
            default_paginated_collection: Some(String::from("posts")),
            threads: None,
        }
    }
}

fn default_includes_dirs() -> Vec<String> {
    vec![String::from("_layouts"), String::from("_includes")]
}

fn default_collections() -> BTreeMap<String, String> {
    let mut collections = BTreeMap::new();
    collections.insert(String::from("_posts"), String::from("posts"));
    collections
}

/// The resolved configuration for one pipeline run.
#[derive(Clone, Debug)]
pub struct Config {
    /// The content root. Includes and collection directories are resolved
    /// against it.
    pub content_directory: PathBuf,

    /// Directories holding layouts and partials, scanned in order.
    pub includes_dirs: Vec<String>,

    /// Collection directories, keyed by directory name, mapped to the
    /// collection name.
    pub collections: BTreeMap<String, String>,

    /// Include documents flagged `draft: true`.
    pub draft: bool,

    /// Include documents dated after the scan started.
    pub future: bool,

    pub date_format: DateFormat,

    /// The root path prefix for generated links, e.g. `/` or `/blog/`.
    pub root_path: String,

    /// When set, previous/next URLs are absolute URLs under this address
    /// instead of root-relative paths.
    pub site_url: Option<Url>,

    /// The collection paginated by `paginate: true`.
    pub default_paginated_collection: Option<String>,

    /// Number of threads used to walk the scan roots.
    pub threads: usize,
}

impl Config {
    /// A configuration with every default, rooted at `content_directory`.
    pub fn new(content_directory: &Path) -> Config {
        let project = Project::default();
        Config {
            content_directory: content_directory.to_owned(),
            includes_dirs: project.includes_dirs,
            collections: project.collections,
            draft: project.draft,
            future: project.future,
            date_format: DateFormat::default(),
            root_path: project.root_path,
            site_url: project.site_url,
            default_paginated_collection: project.default_paginated_collection,
            threads: default_threads(),
        }
    }

    /// Looks for `folio.yaml` in `dir` and then in each of its ancestors.
    pub fn from_directory(dir: &Path) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.exists() {
            Config::from_project_file(&path)
                .with_context(|| format!("Loading configuration from `{}`", path.display()))
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent),
                None => Err(anyhow!(
                    "Could not find `{}` in any parent directory",
                    PROJECT_FILE
                )),
            }
        }
    }

    pub fn from_project_file(path: &Path) -> Result<Config> {
        let file = File::open(path)
            .map_err(|e| anyhow!("Opening project file `{}`: {}", path.display(), e))?;
        let project: Project = serde_yaml::from_reader(file)?;
        match path.parent() {
            None => Err(anyhow!(
                "Can't get parent directory for provided project file path '{:?}'",
                path
            )),
            Some(project_root) => Config::from_project(project_root, project),
        }
    }

    fn from_project(project_root: &Path, project: Project) -> Result<Config> {
        let date_format = DateFormat::new(&project.date_format)?;
        if let Some(url) = &project.site_url {
            if url.cannot_be_a_base() {
                return Err(anyhow!("`site_url` must be an absolute URL: {}", url));
            }
        }
        Ok(Config {
            content_directory: match project.content_dir {
                Some(dir) => project_root.join(dir),
                None => project_root.to_owned(),
            },
            includes_dirs: project.includes_dirs,
            collections: project.collections,
            draft: project.draft,
            future: project.future,
            date_format,
            root_path: project.root_path,
            site_url: project.site_url,
            default_paginated_collection: project.default_paginated_collection,
            threads: project.threads.unwrap_or_else(default_threads),
        })
    }

    /// The names of every configured collection.
    pub fn collection_names(&self) -> impl Iterator<Item = &str> {
        self.collections.values().map(String::as_str)
    }
}

// Sized like rayon's global pool: one thread per logical CPU unless
// `RAYON_NUM_THREADS` says otherwise.
fn default_threads() -> usize {
    rayon::current_num_threads()
}
