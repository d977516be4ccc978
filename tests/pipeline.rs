use folio::build::{build_site, Error};
use folio::config::{Config, PROJECT_FILE};
use folio::paginate::{DerivedCollection, Error as PaginateError};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn site(posts: usize) -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(
        root,
        PROJECT_FILE,
        "root_path: /blog/\nsite_url: https://example.org/blog/\nthreads: 2\n",
    );
    write(root, "_layouts/default.html", "<html>{#insert /}</html>\n");
    for i in 1..=posts {
        write(
            root,
            &format!("_posts/post-{:02}.md", i),
            &format!(
                "---\ntitle: Post {}\nlayout: default\ndate: 2020-01-{:02}\n---\nBody {}\n",
                i, i, i
            ),
        );
    }
    write(
        root,
        "_posts/unfinished.md",
        "---\ntitle: Unfinished\ndraft: true\n---\nwip\n",
    );
    write(
        root,
        "index.html",
        "---\nlayout: default\npaginate:\n  size: 5\n---\n<ul></ul>\n",
    );
    write(
        root,
        "about.md",
        "---\ntitle: About\nlink: about-us\n---\nWho we are.\n",
    );
    dir
}

#[test]
fn test_build_site() -> Result<(), Box<dyn std::error::Error>> {
    let dir = site(11);
    let config = Config::from_directory(dir.path())?;
    let site = build_site(&config, &[])?;

    assert_eq!(11, site.published.documents.len());
    let first = &site.published.documents[0];
    assert_eq!("posts/post-01", first.link);
    assert_eq!(Some("2020-01-01T00:00:00"), first.info.date.as_deref());

    let links: Vec<&str> = site
        .published
        .pages
        .iter()
        .map(|p| p.link.as_str())
        .collect();
    assert_eq!(vec!["about-us", "", "posts/page2", "posts/page3"], links);

    let pages = &site.published.pages[1..];
    let urls: Vec<(Option<&str>, Option<&str>)> = pages
        .iter()
        .map(|p| {
            let paginator = p.paginator.as_ref().unwrap();
            (
                paginator.previous_url.as_deref(),
                paginator.next_url.as_deref(),
            )
        })
        .collect();
    assert_eq!(
        vec![
            (None, Some("https://example.org/blog/posts/page2")),
            (
                Some("https://example.org/blog/"),
                Some("https://example.org/blog/posts/page3")
            ),
            (Some("https://example.org/blog/posts/page2"), None),
        ],
        urls
    );

    let layout = site
        .documents
        .iter()
        .find(|d| d.source_path == "default.html")
        .unwrap();
    assert!(layout.is_layout());
    Ok(())
}

#[test]
fn test_derived_collections_extend_pagination() -> Result<(), Box<dyn std::error::Error>> {
    let dir = site(2);
    let config = Config::from_directory(dir.path())?;
    let site = build_site(&config, &[DerivedCollection::new("posts", 4)])?;
    let paginated: Vec<_> = site
        .published
        .pages
        .iter()
        .filter_map(|p| p.paginator.as_ref())
        .collect();
    assert_eq!(2, paginated.len());
    assert_eq!(6, paginated[0].total_items);
    Ok(())
}

#[test]
fn test_empty_collection_keeps_index() -> Result<(), Box<dyn std::error::Error>> {
    let dir = site(0);
    let config = Config::from_directory(dir.path())?;
    let site = build_site(&config, &[])?;
    assert!(site.published.documents.is_empty());
    let index = site
        .published
        .pages
        .iter()
        .find(|p| p.info.source_path == "index.html")
        .unwrap();
    assert_eq!(1, index.paginator.as_ref().unwrap().page_count);
    Ok(())
}

#[test]
fn test_unknown_collection_fails_build() {
    let dir = site(1);
    write(dir.path(), "tags.html", "---\npaginate: tags\n---\n");
    let config = Config::from_directory(dir.path()).unwrap();
    match build_site(&config, &[]) {
        Err(Error::Paginate(PaginateError::UnknownCollection { page, collection })) => {
            assert_eq!("tags.html", page);
            assert_eq!("tags", collection);
        }
        other => panic!("wanted unknown collection error; found {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_defaults_without_project_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = site(6);
    let config = Config::new(dir.path());
    let site = build_site(&config, &[])?;
    assert_eq!(6, site.published.documents.len());
    let paginator = site.published.pages[1].paginator.as_ref().unwrap();
    assert_eq!(2, paginator.page_count);
    assert_eq!(Some("/posts/page2"), paginator.next_url.as_deref());
    Ok(())
}
