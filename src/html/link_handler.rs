//! Resolution of internal links to HTML.

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

/// Characters that must be escaped when a page locator becomes a URL path
/// segment.
const PATH: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'?')
    .add(b'#')
    .add(b'%');

/// Maps page locators to URLs and markup. The defaults produce `/wiki/...`
/// links; a site embedding the renderer overrides whichever methods its URL
/// scheme needs.
pub trait LinkHandler {
    /// The URL for a page locator.
    fn url_for(&mut self, page: &str) -> String {
        let page = page.trim().replace(' ', "_");
        format!("/wiki/{}", utf8_percent_encode(&page, PATH))
    }

    /// An anchor element linking to a page. `text` is already rendered HTML.
    fn link_for(&mut self, page: &str, text: &str) -> String {
        format!("<a href=\"{}\">{text}</a>", self.url_for(page))
    }

    /// Markup for a prefixed link such as `[[Image:...]]`. Each option is
    /// already rendered HTML; the last one is conventionally the caption.
    fn link_for_resource(&mut self, prefix: &str, locator: &str, options: &[String]) -> String {
        let page = format!("{prefix}:{locator}");
        match options.last() {
            Some(caption) => self.link_for(&page, caption),
            None => {
                let text = html_escape::encode_text(&page).into_owned();
                self.link_for(&page, &text)
            }
        }
    }

    /// An anchor element linking to a category page.
    fn link_for_category(&mut self, locator: &str, text: &str) -> String {
        let text = if text.is_empty() {
            html_escape::encode_text(locator).into_owned()
        } else {
            text.to_owned()
        };
        self.link_for(&format!("Category:{locator}"), &text)
    }

    /// Records that the page belongs to a category. Returns markup to insert
    /// at the declaration site, which is usually nothing.
    fn category_add(&mut self, _locator: &str, _sort_as: Option<&str>) -> String {
        String::new()
    }
}

/// The stock handler. Collects category memberships so a caller can render
/// them after the body.
#[derive(Debug, Default)]
pub struct DefaultLinkHandler {
    /// Categories declared by the document, with their sort keys.
    pub categories: Vec<(String, Option<String>)>,
}

impl LinkHandler for DefaultLinkHandler {
    fn category_add(&mut self, locator: &str, sort_as: Option<&str>) -> String {
        self.categories
            .push((locator.to_owned(), sort_as.map(str::to_owned)));
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_encodes_spaces_and_reserved_characters() {
        let mut handler = DefaultLinkHandler::default();
        assert_eq!(handler.url_for("Main Page"), "/wiki/Main_Page");
        assert_eq!(handler.url_for("a?b#c"), "/wiki/a%3Fb%23c");
    }

    #[test]
    fn category_declarations_are_collected() {
        let mut handler = DefaultLinkHandler::default();
        assert_eq!(handler.category_add("help", Some("sort")), "");
        assert_eq!(
            handler.categories,
            vec![("help".to_owned(), Some("sort".to_owned()))]
        );
    }
}
