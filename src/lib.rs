//! The library code for the `folio` static site content pipeline. The
//! pipeline is broken down into two stages:
//!
//! 1. Scanning the content tree into documents ([`crate::scan`])
//! 2. Publishing the documents ([`crate::publish`])
//!
//! The first stage walks the includes directories, the collection
//! directories and the general page tree. Each content file's front matter
//! is extracted ([`crate::frontmatter`]), drafts and future-dated files are
//! filtered out, and the body is turned into an intermediate template for the
//! renderer ([`crate::template`]).
//!
//! The second stage starts once the whole document set is known. Every
//! publishable document gets an output link ([`crate::link`]), and pages that
//! declare `paginate` are expanded into a sequence of pages over a
//! collection, each carrying a paginator that points at its neighbours
//! ([`crate::paginate`]).
//!
//! Rendering the templates is left to a downstream renderer.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod date;
pub mod document;
pub mod frontmatter;
pub mod link;
pub mod paginate;
pub mod publish;
pub mod scan;
pub mod template;
pub mod url;
pub mod value;
