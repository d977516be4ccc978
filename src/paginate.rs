//! Splits pages that declare `paginate` into a sequence of pages over a
//! collection, each carrying a [`Paginator`] that points at its neighbours.
//!
//! A page asks for pagination with one of:
//!
//! ```yaml
//! paginate: posts          # collection name; size 5, default link
//! paginate: true           # the default collection
//! paginate:
//!   collection: posts      # optional when there is a default collection
//!   size: 10               # default 5
//!   link: blog/:page       # default `:collection/page:page`
//! ```
//!
//! The first page keeps the originating page's link; page `i > 1` is linked
//! by resolving the link template with `page = i`.

use crate::document::PAGINATE_KEY;
use crate::link::{self, LinkData, DEFAULT_PAGINATE_LINK_TEMPLATE};
use crate::url::RootUrl;
use crate::value::{Fields, Value};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

pub const DEFAULT_PAGE_SIZE: usize = 5;

/// A pagination declaration read from a page's front matter.
#[derive(Clone, Debug, PartialEq)]
pub struct Paginate {
    pub collection: String,
    pub size: usize,

    /// The link template for pages after the first.
    pub link: String,
}

impl Paginate {
    /// Reads the declaration under `paginate` in `fields`. Returns `None` if
    /// the page doesn't paginate. `default_collection` is the collection
    /// assumed by declarations that don't name one.
    pub fn from_fields(
        page: &str,
        fields: &Fields,
        default_collection: Option<&str>,
    ) -> Result<Option<Paginate>> {
        let value = match fields.get(PAGINATE_KEY) {
            Some(value) => value,
            None => return Ok(None),
        };
        let invalid = || Error::InvalidDeclaration {
            page: page.to_owned(),
        };
        let paginate = match value {
            Value::Map(declaration) => {
                let collection = match declaration.get("collection") {
                    Some(Value::String(collection)) => collection.as_str(),
                    Some(_) => return Err(invalid()),
                    None => default_collection.ok_or_else(invalid)?,
                };
                let size = match declaration.get("size") {
                    Some(Value::Integer(size)) if *size > 0 => *size as usize,
                    Some(Value::Integer(size)) => {
                        return Err(Error::InvalidSize {
                            page: page.to_owned(),
                            size: *size,
                        })
                    }
                    Some(_) => return Err(invalid()),
                    None => DEFAULT_PAGE_SIZE,
                };
                let link = match declaration.get("link") {
                    Some(Value::String(link)) => link.as_str(),
                    Some(_) => return Err(invalid()),
                    None => DEFAULT_PAGINATE_LINK_TEMPLATE,
                };
                Paginate {
                    collection: collection.to_owned(),
                    size,
                    link: link.to_owned(),
                }
            }
            Value::String(collection) => Paginate::new(collection),
            Value::Bool(true) => Paginate::new(default_collection.ok_or_else(invalid)?),
            _ => return Err(invalid()),
        };
        Ok(Some(paginate))
    }

    fn new(collection: &str) -> Paginate {
        Paginate {
            collection: collection.to_owned(),
            size: DEFAULT_PAGE_SIZE,
            link: String::from(DEFAULT_PAGINATE_LINK_TEMPLATE),
        }
    }
}

/// Items contributed to a collection by something other than the scan
/// (e.g. a tag index). Only the count is known here.
#[derive(Clone, Debug, PartialEq)]
pub struct DerivedCollection {
    pub collection: String,
    pub count: usize,
}

impl DerivedCollection {
    pub fn new(collection: &str, count: usize) -> DerivedCollection {
        DerivedCollection {
            collection: collection.to_owned(),
            count,
        }
    }

    pub fn from_document_ids(collection: &str, document_ids: &[String]) -> DerivedCollection {
        DerivedCollection::new(collection, document_ids.len())
    }
}

/// The number of items in each known collection.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CollectionSizes(HashMap<String, usize>);

impl CollectionSizes {
    /// Counts one item per collection name in `documents` plus every derived
    /// collection's count.
    pub fn new<'d>(
        documents: impl IntoIterator<Item = &'d str>,
        derived: &[DerivedCollection],
    ) -> CollectionSizes {
        let mut sizes = CollectionSizes::default();
        for collection in documents {
            sizes.add(collection, 1);
        }
        for derived in derived {
            sizes.add(&derived.collection, derived.count);
        }
        sizes
    }

    // Counts saturate; no site gets near `usize::MAX` items.
    fn add(&mut self, collection: &str, count: usize) {
        let size = self.0.entry(collection.to_owned()).or_insert(0);
        *size = size.saturating_add(count);
    }

    /// Makes `collection` known even if it has no items.
    pub fn declare(&mut self, collection: &str) {
        self.0.entry(collection.to_owned()).or_insert(0);
    }

    pub fn get(&self, collection: &str) -> Option<usize> {
        self.0.get(collection).copied()
    }
}

/// Identifies a published page. Every page of a paginated page shares the
/// originating page's info except for the `id`, which is the page's link
/// for pages after the first.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub id: String,
    pub source_path: String,
    pub template_path: String,
    pub collection: Option<String>,
    pub base_file_name: String,
    pub date: Option<String>,
}

impl PageInfo {
    pub fn change_id(&self, id: &str) -> PageInfo {
        PageInfo {
            id: id.to_owned(),
            ..self.clone()
        }
    }
}

/// A page's position within a paginated sequence.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginator {
    pub collection: String,
    pub total_items: usize,
    pub page_size: usize,
    pub page_count: usize,

    /// 1-based.
    pub current_index: usize,
    pub previous_index: Option<usize>,
    pub previous_url: Option<String>,
    pub next_index: Option<usize>,
    pub next_url: Option<String>,
}

/// One page of a paginated page.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PaginatedPage {
    pub link: String,
    pub info: PageInfo,

    /// The originating page's fields, shared by every page.
    pub data: Fields,
    pub paginator: Paginator,
}

/// A page that declared `paginate`.
#[derive(Clone, Debug)]
pub struct PaginationSource<'a> {
    /// The originating page's own link, kept by the first page.
    pub link: &'a str,
    pub info: &'a PageInfo,
    pub data: &'a Fields,
    pub default_collection: Option<&'a str>,
}

/// Computes the pages of paginated pages. Must be built from the complete
/// set of collection sizes.
pub struct PaginationEngine<'a> {
    root_path: &'a str,
    root_url: &'a dyn RootUrl,
    sizes: &'a CollectionSizes,
}

impl<'a> PaginationEngine<'a> {
    pub fn new(
        root_path: &'a str,
        root_url: &'a dyn RootUrl,
        sizes: &'a CollectionSizes,
    ) -> PaginationEngine<'a> {
        PaginationEngine {
            root_path,
            root_url,
            sizes,
        }
    }

    /// Paginates `source`. Returns no pages if it doesn't declare `paginate`.
    pub fn paginate(&self, source: &PaginationSource<'_>) -> Result<Vec<PaginatedPage>> {
        let page = source.info.id.as_str();
        let paginate = match Paginate::from_fields(page, source.data, source.default_collection)? {
            Some(paginate) => paginate,
            None => return Ok(Vec::new()),
        };
        let total = self
            .sizes
            .get(&paginate.collection)
            .ok_or_else(|| Error::UnknownCollection {
                page: page.to_owned(),
                collection: paginate.collection.clone(),
            })?;

        // An empty collection still publishes the originating page, as a
        // single page with no neighbours.
        let page_count = match total.div_ceil(paginate.size) {
            0 => 1,
            n => n,
        };

        let links: Vec<String> = (1..=page_count)
            .map(|i| match i {
                1 => source.link.to_owned(),
                _ => link::resolve(
                    self.root_path,
                    &paginate.link,
                    &LinkData {
                        fields: source.data,
                        path: Some(&source.info.source_path),
                        collection: Some(&paginate.collection),
                        page: Some(i),
                    },
                ),
            })
            .collect();

        let url = |index: usize| -> Result<String> {
            self.root_url
                .resolve(&links[index - 1])
                .map_err(|err| Error::Url {
                    page: page.to_owned(),
                    err,
                })
        };

        let mut pages = Vec::with_capacity(page_count);
        for (i, link) in (1..=page_count).zip(links.iter()) {
            let previous_index = if i > 1 { Some(i - 1) } else { None };
            let next_index = if i < page_count { Some(i + 1) } else { None };
            let paginator = Paginator {
                collection: paginate.collection.clone(),
                total_items: total,
                page_size: paginate.size,
                page_count,
                current_index: i,
                previous_index,
                previous_url: previous_index.map(&url).transpose()?,
                next_index,
                next_url: next_index.map(&url).transpose()?,
            };
            debug!(page = %page, link = %link, index = i, count = page_count, "paginated page");
            pages.push(PaginatedPage {
                link: link.clone(),
                info: match i {
                    1 => source.info.clone(),
                    _ => source.info.change_id(link),
                },
                data: source.data.clone(),
                paginator,
            });
        }
        Ok(pages)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a bad pagination declaration. Every variant names the page
/// that declared it.
#[derive(Debug, PartialEq)]
pub enum Error {
    /// Returned when `paginate` has an unsupported shape, or names no
    /// collection and there is no default collection.
    InvalidDeclaration { page: String },

    /// Returned when the paginated collection doesn't exist.
    UnknownCollection { page: String, collection: String },

    /// Returned when the page size isn't positive.
    InvalidSize { page: String, size: i64 },

    /// Returned when a neighbour's link can't be turned into a URL.
    Url { page: String, err: url::ParseError },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidDeclaration { page } => {
                write!(f, "Invalid pagination configuration in {}", page)
            }
            Error::UnknownCollection { page, collection } => write!(
                f,
                "Paginate collection not found '{}' in {}",
                collection, page
            ),
            Error::InvalidSize { page, size } => write!(
                f,
                "Page size must be greater than zero (found {}) in {}",
                size, page
            ),
            Error::Url { page, err } => {
                write!(f, "Resolving pagination URL in {}: {}", page, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Url { err, .. } => Some(err),
            _ => None,
        }
    }
}
