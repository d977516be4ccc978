//! Exports the [`build_site`] function which stitches together the two
//! stages of the pipeline: scanning the content tree into documents
//! ([`crate::scan`]) and publishing them ([`crate::publish`]), which
//! paginates the pages that ask for it ([`crate::paginate`]). Publishing only
//! starts once the scan has produced the complete document set.

use crate::config::Config;
use crate::document::Document;
use crate::paginate::{DerivedCollection, Error as PaginateError};
use crate::publish::{Published, Publisher};
use crate::scan::{Error as ScanError, Scanner};
use crate::url::{RootPath, RootUrl, SiteUrl};
use serde::Serialize;
use std::fmt;
use tracing::info;

/// Everything one pipeline run produces for the downstream renderer.
#[derive(Clone, Debug, Serialize)]
pub struct Site {
    /// Every scanned document, layouts and partials included, carrying its
    /// generated template.
    pub documents: Vec<Document>,

    /// The published collection members and pages.
    pub published: Published,
}

/// Builds the site from a [`Config`] object. `derived` are item counts other
/// components contribute to collections (e.g. a tag index). Returns the
/// first error encountered; there is no partial result.
pub fn build_site(config: &Config, derived: &[DerivedCollection]) -> Result<Site> {
    build_site_with(Scanner::new(config), config, derived)
}

/// Like [`build_site`], with a caller-supplied [`Scanner`].
pub fn build_site_with(
    scanner: Scanner<'_>,
    config: &Config,
    derived: &[DerivedCollection],
) -> Result<Site> {
    let documents = scanner.scan(&config.content_directory)?;

    let root_url: Box<dyn RootUrl> = match &config.site_url {
        Some(site_url) => Box::new(SiteUrl::new(site_url.clone())),
        None => Box::new(RootPath::new(&config.root_path)),
    };
    let published = Publisher::new(&config.root_path, root_url.as_ref())
        .with_collections(config.collection_names())
        .with_default_collection(config.default_paginated_collection.as_deref())
        .publish(&documents, derived)?;

    info!(
        documents = documents.len(),
        pages = published.pages.len(),
        "built site"
    );
    Ok(Site {
        documents,
        published,
    })
}

pub type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site: either the scan or the publishing
/// stage failed.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors scanning the content tree.
    Scan(ScanError),

    /// Returned for bad pagination declarations.
    Paginate(PaginateError),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Scan(err) => err.fmt(f),
            Error::Paginate(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Scan(err) => Some(err),
            Error::Paginate(err) => Some(err),
        }
    }
}

impl From<ScanError> for Error {
    /// Converts [`ScanError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: ScanError) -> Error {
        Error::Scan(err)
    }
}

impl From<PaginateError> for Error {
    /// Converts [`PaginateError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: PaginateError) -> Error {
        Error::Paginate(err)
    }
}
