//! XHTML generation from a parsed document tree.

mod link_handler;
mod template_handler;

use core::fmt::Write;

use time::OffsetDateTime;

pub use self::link_handler::{DefaultLinkHandler, LinkHandler};
pub use self::template_handler::{DefaultTemplateHandler, TemplateHandler};
use crate::Error;
use crate::ast::{CellKind, Formatting, LinkType, ListKind, Node, NodeKind};
use crate::walker::Walker;

/// Environment used to expand signatures.
#[derive(Clone, Debug)]
pub struct Params {
    /// The name of the user signing edits.
    pub author: String,
    /// The timestamp inserted by `~~~~` and `~~~~~`.
    pub time: OffsetDateTime,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            author: "Creator".to_owned(),
            time: OffsetDateTime::now_utc(),
        }
    }
}

impl Params {
    /// The signature timestamp, e.g. `01:01, 01 January 2000 `.
    pub fn formatted_time(&self) -> String {
        let format =
            time::macros::format_description!("[hour]:[minute], [day] [month repr:long] [year] ");
        self.time.format(format).unwrap_or_else(|err| {
            log::error!("failed to format signature timestamp: {err}");
            String::new()
        })
    }

    /// The wiki markup for the signing user’s name, `[[User:...|...]]`.
    pub fn signature_name(&self) -> String {
        format!("[[User:{author}|{author}]]", author = self.author)
    }
}

/// Renders a document tree to an XHTML fragment.
pub struct HtmlGenerator<'ast> {
    params: Params,
    link_handler: Box<dyn LinkHandler>,
    template_handler: Box<dyn TemplateHandler>,
    root: Option<&'ast Node>,
    out: String,
}

impl<'ast> HtmlGenerator<'ast> {
    pub fn new(params: Params) -> Self {
        Self {
            params,
            link_handler: Box::new(DefaultLinkHandler::default()),
            template_handler: Box::new(DefaultTemplateHandler),
            root: None,
            out: String::new(),
        }
    }

    pub fn with_link_handler(mut self, handler: Box<dyn LinkHandler>) -> Self {
        self.link_handler = handler;
        self
    }

    pub fn with_template_handler(mut self, handler: Box<dyn TemplateHandler>) -> Self {
        self.template_handler = handler;
        self
    }

    /// Renders `root` and returns the generated fragment.
    pub fn generate(&mut self, root: &'ast Node) -> Result<&str, Error> {
        self.root = Some(root);
        self.out.clear();
        self.visit_node(root)?;
        Ok(&self.out)
    }

    /// Renders the subtree into the output buffer and detaches the rendered
    /// slice, leaving the buffer as it was.
    fn render_detached(&mut self, node: &'ast Node) -> Result<String, core::fmt::Error> {
        let mark = self.out.len();
        self.visit_children(node)?;
        Ok(self.out.split_off(mark))
    }
}

impl<'ast> Walker<'ast, core::fmt::Error> for HtmlGenerator<'ast> {
    fn visit_paragraph(&mut self, node: &'ast Node) -> Result<(), core::fmt::Error> {
        let mark = self.out.len();
        self.visit_children(node)?;
        if self.out[mark..].trim().is_empty() {
            self.out.truncate(mark);
            self.out.push_str("<p><br /></p>");
        } else {
            self.out.insert_str(mark, "<p>");
            self.out.push_str("</p>");
        }
        Ok(())
    }

    fn visit_formatted(
        &mut self,
        node: &'ast Node,
        formatting: Formatting,
    ) -> Result<(), core::fmt::Error> {
        let tag = match formatting {
            Formatting::Bold => "b",
            Formatting::Italic => "i",
            _ => return self.visit_children(node),
        };
        write!(self.out, "<{tag}>")?;
        self.visit_children(node)?;
        write!(self.out, "</{tag}>")
    }

    fn visit_text(
        &mut self,
        node: &'ast Node,
        formatting: Formatting,
    ) -> Result<(), core::fmt::Error> {
        match formatting {
            Formatting::None | Formatting::Bold | Formatting::Italic => {
                self.out
                    .push_str(&html_escape::encode_text(&node.contents));
            }
            Formatting::CharacterEntity => write!(self.out, "&{};", node.contents)?,
            Formatting::HLine => self.out.push_str("<hr />"),
            Formatting::SignatureName => {
                let page = format!("User:{}", self.params.author);
                let text = html_escape::encode_text(&self.params.author).into_owned();
                let link = self.link_handler.link_for(&page, &text);
                self.out.push_str(&link);
            }
            Formatting::SignatureDate => {
                let date = self.params.formatted_time();
                self.out.push_str(&html_escape::encode_text(&date));
            }
            Formatting::SignatureFull => {
                let page = format!("User:{}", self.params.author);
                let text = html_escape::encode_text(&self.params.author).into_owned();
                let link = self.link_handler.link_for(&page, &text);
                let date = self.params.formatted_time();
                write!(self.out, "{link} {}", html_escape::encode_text(&date))?;
            }
        }
        Ok(())
    }

    fn visit_list(&mut self, node: &'ast Node, kind: ListKind) -> Result<(), core::fmt::Error> {
        let tag = match kind {
            ListKind::Bulleted => "ul",
            ListKind::Numbered => "ol",
            ListKind::Definition => "dl",
        };
        write!(self.out, "<{tag}>")?;
        self.visit_children(node)?;
        write!(self.out, "</{tag}>")
    }

    fn visit_list_item(&mut self, node: &'ast Node) -> Result<(), core::fmt::Error> {
        self.out.push_str("<li>");
        self.visit_children(node)?;
        self.out.push_str("</li>");
        Ok(())
    }

    fn visit_list_term(&mut self, node: &'ast Node) -> Result<(), core::fmt::Error> {
        self.out.push_str("<dt>");
        self.visit_children(node)?;
        self.out.push_str("</dt>");
        Ok(())
    }

    fn visit_list_definition(&mut self, node: &'ast Node) -> Result<(), core::fmt::Error> {
        self.out.push_str("<dd>");
        self.visit_children(node)?;
        self.out.push_str("</dd>");
        Ok(())
    }

    fn visit_section(&mut self, node: &'ast Node, level: u8) -> Result<(), core::fmt::Error> {
        let anchor = anchor_for(&node.text_contents());
        write!(self.out, "<h{level}><a name=\"{anchor}\"></a>")?;
        self.visit_children(node)?;
        writeln!(self.out, "</h{level}>")
    }

    fn visit_preformatted(
        &mut self,
        node: &'ast Node,
        indented: bool,
    ) -> Result<(), core::fmt::Error> {
        let mut content = self.render_detached(node)?;
        if indented {
            // Every source line of an indented block carries the leading
            // space that selected preformatted mode. Drop it.
            let raw = core::mem::take(&mut content);
            for line in raw.split_inclusive('\n') {
                content.push_str(line.strip_prefix(' ').unwrap_or(line));
            }
        }
        write!(self.out, "<pre>{content}</pre>")
    }

    fn visit_paste(&mut self, node: &'ast Node) -> Result<(), core::fmt::Error> {
        self.out.push_str("<div class=\"paste\">");
        self.visit_children(node)?;
        self.out.push_str("</div>");
        Ok(())
    }

    fn visit_link(
        &mut self,
        node: &'ast Node,
        url: &'ast str,
        _link_type: LinkType,
    ) -> Result<(), core::fmt::Error> {
        write!(
            self.out,
            "<a href=\"{}\">",
            html_escape::encode_double_quoted_attribute(url)
        )?;
        if node.children.is_empty() {
            self.out.push_str(&html_escape::encode_text(url));
        } else {
            self.visit_children(node)?;
        }
        self.out.push_str("</a>");
        Ok(())
    }

    fn visit_internal_link(
        &mut self,
        node: &'ast Node,
        locator: &'ast str,
    ) -> Result<(), core::fmt::Error> {
        let mut text = self.render_detached(node)?;
        if text.is_empty() {
            text = html_escape::encode_text(locator).into_owned();
        }
        let link = self.link_handler.link_for(locator, &text);
        self.out.push_str(&link);
        Ok(())
    }

    fn visit_resource_link(
        &mut self,
        node: &'ast Node,
        prefix: &'ast str,
        locator: &'ast str,
    ) -> Result<(), core::fmt::Error> {
        let mut options = Vec::with_capacity(node.children.len());
        for item in &node.children {
            let mark = self.out.len();
            self.visit_node(item)?;
            options.push(self.out.split_off(mark));
        }
        let link = self
            .link_handler
            .link_for_resource(prefix, locator, &options);
        self.out.push_str(&link);
        Ok(())
    }

    fn visit_category_link(
        &mut self,
        node: &'ast Node,
        locator: &'ast str,
    ) -> Result<(), core::fmt::Error> {
        let text = self.render_detached(node)?;
        let link = self.link_handler.link_for_category(locator, &text);
        self.out.push_str(&link);
        Ok(())
    }

    fn visit_category(
        &mut self,
        _node: &'ast Node,
        locator: &'ast str,
        sort_as: Option<&'ast str>,
    ) -> Result<(), core::fmt::Error> {
        let markup = self.link_handler.category_add(locator, sort_as);
        self.out.push_str(&markup);
        Ok(())
    }

    /// Table, row, and cell option strings are emitted verbatim, not
    /// attribute-escaped. [`sanitize`](crate::sanitizer::sanitize) does not
    /// see option text either, so untrusted documents need their table
    /// options filtered by the caller.
    fn visit_table(
        &mut self,
        node: &'ast Node,
        options: Option<&'ast str>,
    ) -> Result<(), core::fmt::Error> {
        match options {
            Some(options) => writeln!(self.out, "<table {options}>")?,
            None => writeln!(self.out, "<table cellpadding=\"5\" border=\"1\">")?,
        }
        self.visit_children(node)?;
        writeln!(self.out, "</table>")
    }

    fn visit_table_row(
        &mut self,
        node: &'ast Node,
        options: Option<&'ast str>,
    ) -> Result<(), core::fmt::Error> {
        match options {
            Some(options) => writeln!(self.out, "<tr {options}>")?,
            None => writeln!(self.out, "<tr>")?,
        }
        self.visit_children(node)?;
        writeln!(self.out, "</tr>")
    }

    fn visit_table_cell(
        &mut self,
        node: &'ast Node,
        kind: CellKind,
        attributes: Option<&'ast str>,
    ) -> Result<(), core::fmt::Error> {
        let tag = match kind {
            CellKind::Body => "td",
            CellKind::Heading => "th",
        };
        match attributes {
            Some(attributes) => write!(self.out, "<{tag} {attributes}>")?,
            None => write!(self.out, "<{tag}>")?,
        }
        self.visit_children(node)?;
        write!(self.out, "</{tag}>")
    }

    fn visit_element(
        &mut self,
        node: &'ast Node,
        name: &'ast str,
        attributes: &'ast indexmap::IndexMap<String, String>,
    ) -> Result<(), core::fmt::Error> {
        write!(self.out, "<{name}")?;
        for (attr, value) in attributes {
            if value.is_empty() {
                write!(self.out, " {attr}")?;
            } else {
                write!(
                    self.out,
                    " {attr}=\"{}\"",
                    html_escape::encode_double_quoted_attribute(value)
                )?;
            }
        }
        if node.children.is_empty() {
            self.out.push_str(" />");
        } else {
            self.out.push('>');
            self.visit_children(node)?;
            write!(self.out, "</{name}>")?;
        }
        Ok(())
    }

    fn visit_template(&mut self, node: &'ast Node, name: &'ast str) -> Result<(), core::fmt::Error> {
        let mut parameters = Vec::with_capacity(node.children.len());
        for parameter in &node.children {
            let mark = self.out.len();
            self.visit_node(parameter)?;
            parameters.push(self.out.split_off(mark));
        }
        let markup = self.template_handler.included(name, &parameters);
        self.out.push_str(&markup);
        Ok(())
    }

    fn visit_keyword(&mut self, node: &'ast Node) -> Result<(), core::fmt::Error> {
        if node.contents == "__TOC__"
            && let Some(root) = self.root
        {
            let toc = table_of_contents(root);
            self.out.push_str(&toc);
        }
        Ok(())
    }
}

/// Renders a linked table of contents for every heading in the document, or
/// nothing if there are no headings.
pub fn table_of_contents(root: &Node) -> String {
    fn collect(node: &Node, sections: &mut Vec<(u8, String)>) {
        if let NodeKind::Section { level } = node.kind {
            sections.push((level, node.text_contents()));
        }
        for child in &node.children {
            collect(child, sections);
        }
    }

    let mut sections = Vec::new();
    collect(root, &mut sections);
    if sections.is_empty() {
        return String::new();
    }

    let mut out =
        String::from("<div class=\"wikitoc\">\n<div class=\"wikitoctitle\">Contents</div>\n");
    let mut depth: usize = 0;
    let mut prev = 0;
    for (level, text) in &sections {
        let level = usize::from(*level);
        // a deeper heading opens exactly one new list no matter how far
        // its level jumps; a shallower one closes only lists that exist
        if level > prev {
            out.push_str("<ul>\n");
            depth += 1;
        } else {
            for _ in 0..(prev - level).min(depth.saturating_sub(1)) {
                out.push_str("</ul>\n");
                depth -= 1;
            }
        }
        prev = level;
        let _ = writeln!(
            out,
            "<li><a href=\"#{}\">{}</a></li>",
            anchor_for(text),
            html_escape::encode_text(text.trim())
        );
    }
    while depth > 0 {
        out.push_str("</ul>\n");
        depth -= 1;
    }
    out.push_str("</div>\n");
    out
}

/// Derives a fragment anchor from heading text: trimmed, runs of whitespace
/// collapsed to a single `_`, quotes dropped.
fn anchor_for(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.trim().chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push('_');
            }
            in_space = true;
        } else if c != '\'' && c != '"' {
            out.push(c);
            in_space = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::parser;

    fn fixed_params() -> Params {
        Params {
            author: "Creator".to_owned(),
            time: datetime!(2000-01-01 01:01:01 UTC),
        }
    }

    fn html(input: &str) -> String {
        let ast = parser::parse(input).unwrap();
        let mut generator = HtmlGenerator::new(fixed_params());
        generator.generate(&ast).unwrap().to_owned()
    }

    #[test]
    fn paragraph_and_formatting() {
        assert_eq!(html("text"), "<p>text</p>");
        assert_eq!(html("'''bold''' and ''italic''"),
            "<p><b>bold</b> and <i>italic</i></p>");
    }

    #[test]
    fn whitespace_only_paragraph_renders_a_line_break() {
        assert_eq!(
            html("one\n\n\n\n\ntwo"),
            "<p>one\n\n</p><p><br /></p><p>two</p>"
        );
    }

    #[test]
    fn text_is_escaped() {
        assert_eq!(html("a < b & c"), "<p>a &lt; b &amp; c</p>");
    }

    #[test]
    fn heading_gets_an_anchor() {
        assert_eq!(html("== Main title ==\n"),
            "<h2><a name=\"Main_title\"></a> Main title </h2>\n");
    }

    #[test]
    fn lists() {
        assert_eq!(html("*a\n*b\n"), "<ul><li>a\n</li><li>b\n</li></ul>");
        assert_eq!(html(";term\n:def\n"),
            "<dl><dt>term\n</dt><dd>def\n</dd></dl>");
    }

    #[test]
    fn external_link_without_caption_shows_the_url() {
        assert_eq!(
            html("http://example.com/"),
            "<p><a href=\"http://example.com/\">http://example.com/</a></p>"
        );
    }

    #[test]
    fn external_link_with_caption() {
        assert_eq!(
            html("[http://example.com here]"),
            "<p><a href=\"http://example.com\">here</a></p>"
        );
    }

    #[test]
    fn internal_link_uses_the_handler() {
        assert_eq!(
            html("[[Main Page|start]]"),
            "<p><a href=\"/wiki/Main_Page\">start</a></p>"
        );
        assert_eq!(
            html("[[example]]"),
            "<p><a href=\"/wiki/example\">example</a></p>"
        );
    }

    #[test]
    fn category_membership_renders_nothing() {
        assert_eq!(html("[[Category:help]]"), "<p><br /></p>");
    }

    #[test]
    fn category_memberships_reach_a_custom_handler() {
        use std::cell::RefCell;
        use std::rc::Rc;

        struct Collector(Rc<RefCell<Vec<(String, Option<String>)>>>);

        impl LinkHandler for Collector {
            fn category_add(&mut self, locator: &str, sort_as: Option<&str>) -> String {
                self.0
                    .borrow_mut()
                    .push((locator.to_owned(), sort_as.map(str::to_owned)));
                String::new()
            }
        }

        let categories = Rc::new(RefCell::new(Vec::new()));
        let ast = parser::parse("[[Category:help|h]]").unwrap();
        let mut generator = HtmlGenerator::new(fixed_params())
            .with_link_handler(Box::new(Collector(Rc::clone(&categories))));
        generator.generate(&ast).unwrap();
        assert_eq!(
            *categories.borrow(),
            vec![("help".to_owned(), Some("h".to_owned()))]
        );
    }

    #[test]
    fn signatures_expand() {
        assert_eq!(
            html("~~~"),
            "<p><a href=\"/wiki/User:Creator\">Creator</a></p>"
        );
        assert_eq!(html("~~~~~"), "<p>01:01, 01 January 2000 </p>");
        assert_eq!(
            html("~~~~"),
            "<p><a href=\"/wiki/User:Creator\">Creator</a> 01:01, 01 January 2000 </p>"
        );
    }

    #[test]
    fn character_entity_passes_through() {
        assert_eq!(html("&amp;"), "<p>&amp;</p>");
        assert_eq!(html("&copy;"), "<p>&copy;</p>");
    }

    #[test]
    fn horizontal_rule() {
        assert_eq!(html("----\n"), "<hr />");
    }

    #[test]
    fn table_defaults() {
        assert_eq!(
            html("{|\n|a||b\n|}"),
            "<table cellpadding=\"5\" border=\"1\">\n<tr>\n<td>a</td><td>b\n</td></tr>\n</table>\n"
        );
    }

    #[test]
    fn table_with_options_and_heading_cells() {
        assert_eq!(
            html("{| border=0\n! h\n|}"),
            "<table border=0>\n<tr>\n<th> h\n</th></tr>\n</table>\n"
        );
    }

    #[test]
    fn indented_preformatted_drops_the_marker_space() {
        assert_eq!(html(" code\n more\n"), "<pre>code\nmore\n</pre>");
    }

    #[test]
    fn pre_tag_contents_are_escaped_verbatim() {
        assert_eq!(
            html("<pre>''not italic''</pre>"),
            "<pre>''not italic''</pre>"
        );
    }

    #[test]
    fn allowed_element_with_attributes() {
        assert_eq!(
            html("<span class=\"note\">x</span>"),
            "<p><span class=\"note\">x</span></p>"
        );
        assert_eq!(html("a<br />b"), "<p>a<br />b</p>");
    }

    #[test]
    fn template_falls_back_to_source_form() {
        assert_eq!(html("{{stub}}"), "<p>{{stub}}</p>");
        assert_eq!(html("{{cite|a|b}}"), "<p>{{cite|a|b}}</p>");
    }

    #[test]
    fn toc_lists_headings() {
        let out = html("__TOC__\n\n== One ==\n=== Sub ===\n== Two ==\n");
        assert!(out.contains("<div class=\"wikitoc\">"));
        assert!(out.contains("<li><a href=\"#One\">One</a></li>"));
        assert!(out.contains("<li><a href=\"#Sub\">Sub</a></li>"));
        let one = out.find("#One").unwrap();
        let sub = out.find("#Sub").unwrap();
        let two = out.find("#Two").unwrap();
        assert!(one < sub && sub < two);
    }

    #[test]
    fn toc_level_jumps_do_not_stack_lists() {
        let out = html("__TOC__\n\n= One =\n=== Deep ===\n= Two =\n");
        assert!(!out.contains("<ul>\n<ul>"));
        let one = out.find("#One").unwrap();
        let deep = out.find("#Deep").unwrap();
        let two = out.find("#Two").unwrap();
        assert!(one < deep && deep < two);
    }

    #[test]
    fn notoc_renders_nothing() {
        assert_eq!(html("__NOTOC__"), "");
        assert_eq!(html("text __NOTOC__"), "<p>text </p>");
    }

    #[test]
    fn anchors_squeeze_whitespace() {
        assert_eq!(anchor_for("  a  b 'c' "), "a_b_c");
    }
}
