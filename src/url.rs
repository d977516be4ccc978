//! Turns links (paths relative to the site root, as produced by
//! [`crate::link`]) into URLs a page can point at.

use url::{ParseError, Url};

/// Resolves a root-relative link into a URL.
pub trait RootUrl {
    fn resolve(&self, link: &str) -> Result<String>;
}

/// Resolves links into root-relative paths under a root path, e.g. `/blog/`
/// and `posts/page2` give `/blog/posts/page2`.
#[derive(Clone, Debug)]
pub struct RootPath(String);

impl RootPath {
    pub fn new(root_path: &str) -> RootPath {
        let trimmed = root_path.trim_matches('/');
        RootPath(match trimmed.is_empty() {
            true => String::from("/"),
            false => format!("/{}/", trimmed),
        })
    }
}

impl RootUrl for RootPath {
    fn resolve(&self, link: &str) -> Result<String> {
        Ok(format!("{}{}", self.0, link.trim_start_matches('/')))
    }
}

/// Resolves links into absolute URLs under a site URL.
#[derive(Clone, Debug)]
pub struct SiteUrl(Url);

impl SiteUrl {
    pub fn new(mut site_url: Url) -> SiteUrl {
        // NOTE: [`Url::join`] treats the last path segment of a base without
        // a trailing slash as a file name and drops it, so
        // `https://example.org/blog` joined with `posts` would give
        // `https://example.org/posts`.
        if !site_url.path().ends_with('/') {
            let path = format!("{}/", site_url.path());
            site_url.set_path(&path);
        }
        SiteUrl(site_url)
    }
}

impl RootUrl for SiteUrl {
    fn resolve(&self, link: &str) -> Result<String> {
        Ok(self.0.join(link.trim_start_matches('/'))?.to_string())
    }
}

type Result<T> = std::result::Result<T, ParseError>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_root_path() -> Result<()> {
        fixture(&RootPath::new("/"), "/posts/page2", "posts/page2")?;
        fixture(&RootPath::new("/"), "/", "")?;
        fixture(&RootPath::new("/blog/"), "/blog/posts/page2", "posts/page2")?;
        fixture(&RootPath::new("blog"), "/blog/posts/page2", "/posts/page2")
    }

    #[test]
    fn test_site_url() -> Result<()> {
        let root = SiteUrl::new(Url::parse("https://example.org/blog")?);
        fixture(&root, "https://example.org/blog/posts/page2", "posts/page2")?;
        fixture(&root, "https://example.org/blog/", "")?;

        let root = SiteUrl::new(Url::parse("https://example.org")?);
        fixture(&root, "https://example.org/posts/page3", "posts/page3")
    }

    fn fixture(root: &dyn RootUrl, wanted: &str, link: &str) -> Result<()> {
        assert_eq!(wanted, root.resolve(link)?);
        Ok(())
    }
}
