//! Generates the intermediate template for a content file: the body wrapped
//! in its layout's include directive and, for markup sources, in the section
//! that tells the renderer which markup language the body is written in.

/// A markup section marker pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Markup {
    Markdown,
    Asciidoc,
}

impl Markup {
    /// Picks the markup for a file from its extension. Files whose extension
    /// isn't a known markup language (e.g. `.html`) get no section.
    pub fn from_path(path: &str) -> Option<Markup> {
        let (_, extension) = path.rsplit_once('.')?;
        match extension {
            "md" | "markdown" => Some(Markup::Markdown),
            "adoc" | "asciidoc" => Some(Markup::Asciidoc),
            _ => None,
        }
    }

    fn open(self) -> &'static str {
        match self {
            Markup::Markdown => "{#markdown}",
            Markup::Asciidoc => "{#asciidoc}",
        }
    }

    fn close(self) -> &'static str {
        match self {
            Markup::Markdown => "{/markdown}",
            Markup::Asciidoc => "{/asciidoc}",
        }
    }

    /// Wraps the trimmed `body` in this markup's section.
    pub fn apply(self, body: &str) -> String {
        format!("{}\n{}\n{}", self.open(), body.trim(), self.close())
    }
}

/// Generates the template for the file at `path` (which only contributes its
/// extension). With a `layout`, the output is:
///
/// ```text
/// {#include default}
/// {#markdown}
/// body
/// {/markdown}
/// {/include}
/// ```
pub fn generate(path: &str, layout: Option<&str>, body: &str) -> String {
    let content = match Markup::from_path(path) {
        Some(markup) => markup.apply(body),
        None => body.to_owned(),
    };
    match layout {
        Some(layout) => format!("{{#include {}}}\n{}\n{{/include}}", layout, content),
        None => content,
    }
}
