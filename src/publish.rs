//! Publishes every publishable [`Document`]: collection members become
//! [`PublishedDocument`]s, plain pages become [`PublishedPage`]s, and pages
//! that declare `paginate` are expanded into one published page per
//! paginated page.

use crate::document::{Document, DATE_KEY, LINK_KEY, PAGINATE_KEY};
use crate::link::{self, LinkData, DEFAULT_DOCUMENT_LINK_TEMPLATE, DEFAULT_PAGE_LINK_TEMPLATE};
use crate::paginate::{
    CollectionSizes, DerivedCollection, PageInfo, PaginationEngine, PaginationSource, Paginator,
    Result,
};
use crate::url::RootUrl;
use crate::value::Fields;
use serde::Serialize;
use tracing::info;

/// A published collection member.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PublishedDocument {
    pub link: String,
    pub info: PageInfo,
    pub collection: String,
    pub data: Fields,
}

/// A published plain page. Pages produced by pagination carry their
/// [`Paginator`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PublishedPage {
    pub link: String,
    pub info: PageInfo,
    pub data: Fields,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paginator: Option<Paginator>,
}

/// The result of publishing a document set.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Published {
    pub documents: Vec<PublishedDocument>,
    pub pages: Vec<PublishedPage>,
}

/// Computes the link of a publishable document from its `link` field, or
/// from the default template for its kind.
pub fn page_link(root_path: &str, document: &Document) -> String {
    let template = document.fields.get_str(LINK_KEY).unwrap_or_else(|| {
        match document.collection {
            Some(_) => DEFAULT_DOCUMENT_LINK_TEMPLATE,
            None => DEFAULT_PAGE_LINK_TEMPLATE,
        }
    });
    link::resolve(
        root_path,
        template,
        &LinkData {
            path: Some(&document.source_path),
            collection: document.collection.as_deref(),
            ..LinkData::new(&document.fields)
        },
    )
}

pub fn page_info(document: &Document) -> PageInfo {
    PageInfo {
        id: document.source_path.clone(),
        source_path: document.source_path.clone(),
        template_path: document.template_path.clone(),
        collection: document.collection.clone(),
        base_file_name: document.base_file_name(),
        date: document.fields.get_str(DATE_KEY).map(str::to_owned),
    }
}

/// Publishes documents once the complete document set is known.
pub struct Publisher<'a> {
    root_path: &'a str,
    root_url: &'a dyn RootUrl,
    collections: Vec<&'a str>,
    default_collection: Option<&'a str>,
}

impl<'a> Publisher<'a> {
    pub fn new(root_path: &'a str, root_url: &'a dyn RootUrl) -> Publisher<'a> {
        Publisher {
            root_path,
            root_url,
            collections: Vec::new(),
            default_collection: None,
        }
    }

    /// Declares configured collections, which can be paginated even when
    /// they're empty.
    pub fn with_collections(mut self, collections: impl IntoIterator<Item = &'a str>) -> Self {
        self.collections.extend(collections);
        self
    }

    /// Sets the collection paginated by declarations that don't name one.
    pub fn with_default_collection(mut self, collection: Option<&'a str>) -> Self {
        self.default_collection = collection;
        self
    }

    /// Publishes the publishable documents in `documents`, counting
    /// `derived` toward the sizes of their collections.
    pub fn publish(
        &self,
        documents: &[Document],
        derived: &[DerivedCollection],
    ) -> Result<Published> {
        let publishable: Vec<&Document> = documents.iter().filter(|d| d.is_publishable).collect();

        let mut published = Published::default();
        for document in &publishable {
            if let Some(collection) = &document.collection {
                published.documents.push(PublishedDocument {
                    link: page_link(self.root_path, document),
                    info: page_info(document),
                    collection: collection.clone(),
                    data: document.fields.clone(),
                });
            }
        }

        let mut sizes = CollectionSizes::new(
            published.documents.iter().map(|d| d.collection.as_str()),
            derived,
        );
        for collection in &self.collections {
            sizes.declare(collection);
        }
        let engine = PaginationEngine::new(self.root_path, self.root_url, &sizes);

        for document in publishable.iter().filter(|d| d.collection.is_none()) {
            let link = page_link(self.root_path, document);
            let info = page_info(document);
            if document.fields.contains_key(PAGINATE_KEY) {
                let pages = engine.paginate(&PaginationSource {
                    link: &link,
                    info: &info,
                    data: &document.fields,
                    default_collection: self.default_collection,
                })?;
                published
                    .pages
                    .extend(pages.into_iter().map(|page| PublishedPage {
                        link: page.link,
                        info: page.info,
                        data: page.data,
                        paginator: Some(page.paginator),
                    }));
            } else {
                published.pages.push(PublishedPage {
                    link,
                    info,
                    data: document.fields.clone(),
                    paginator: None,
                });
            }
        }

        info!(
            documents = published.documents.len(),
            pages = published.pages.len(),
            "published"
        );
        Ok(published)
    }
}
