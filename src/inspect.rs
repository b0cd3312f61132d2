//! Debugging output for document trees.

use core::fmt;

use indexmap::IndexMap;

use crate::ast::{CellKind, Formatting, LinkType, ListKind, Node};
use crate::walker::Walker;

/// Displays a document tree one node per line, indented by depth, with each
/// node’s source index and length.
///
/// ```text
/// Wiki[0, 26]
///     Paragraph[0, 26]
///         Formatted[0, 26]: Italic
///             Text[2, 6]: None "italic"
/// ```
pub struct TreeDump<'ast>(pub &'ast Node);

impl fmt::Display for TreeDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut printer = Printer { f, depth: 0 };
        printer.visit_node(self.0)
    }
}

struct Printer<'a, 'b> {
    f: &'a mut fmt::Formatter<'b>,
    depth: usize,
}

impl Printer<'_, '_> {
    fn open(&mut self, node: &Node, name: &str) -> fmt::Result {
        for _ in 0..self.depth {
            self.f.write_str("    ")?;
        }
        write!(self.f, "{name}[{}, {}]", node.index, node.length)
    }

    fn close(&mut self) -> fmt::Result {
        self.f.write_str("\n")
    }

    fn nest<'ast>(&mut self, node: &'ast Node) -> fmt::Result {
        self.depth += 1;
        let result = self.visit_children(node);
        self.depth -= 1;
        result
    }

    fn plain<'ast>(&mut self, node: &'ast Node, name: &str) -> fmt::Result {
        self.open(node, name)?;
        self.close()?;
        self.nest(node)
    }
}

impl<'ast> Walker<'ast, fmt::Error> for Printer<'_, '_> {
    fn visit_wiki(&mut self, node: &'ast Node) -> fmt::Result {
        self.plain(node, "Wiki")
    }

    fn visit_paragraph(&mut self, node: &'ast Node) -> fmt::Result {
        self.plain(node, "Paragraph")
    }

    fn visit_formatted(&mut self, node: &'ast Node, formatting: Formatting) -> fmt::Result {
        self.open(node, "Formatted")?;
        write!(self.f, ": {formatting:?}")?;
        self.close()?;
        self.nest(node)
    }

    fn visit_text(&mut self, node: &'ast Node, formatting: Formatting) -> fmt::Result {
        self.open(node, "Text")?;
        write!(self.f, ": {formatting:?} {:?}", node.contents)?;
        self.close()
    }

    fn visit_list(&mut self, node: &'ast Node, kind: ListKind) -> fmt::Result {
        self.open(node, "List")?;
        write!(self.f, ": {kind:?}")?;
        self.close()?;
        self.nest(node)
    }

    fn visit_list_item(&mut self, node: &'ast Node) -> fmt::Result {
        self.plain(node, "ListItem")
    }

    fn visit_list_term(&mut self, node: &'ast Node) -> fmt::Result {
        self.plain(node, "ListTerm")
    }

    fn visit_list_definition(&mut self, node: &'ast Node) -> fmt::Result {
        self.plain(node, "ListDefinition")
    }

    fn visit_section(&mut self, node: &'ast Node, level: u8) -> fmt::Result {
        self.open(node, "Section")?;
        write!(self.f, ": level {level}")?;
        self.close()?;
        self.nest(node)
    }

    fn visit_preformatted(&mut self, node: &'ast Node, indented: bool) -> fmt::Result {
        self.open(node, "Preformatted")?;
        if indented {
            self.f.write_str(": indented")?;
        }
        self.close()?;
        self.nest(node)
    }

    fn visit_paste(&mut self, node: &'ast Node) -> fmt::Result {
        self.plain(node, "Paste")
    }

    fn visit_link(&mut self, node: &'ast Node, url: &'ast str, _: LinkType) -> fmt::Result {
        self.open(node, "Link")?;
        write!(self.f, ": {url}")?;
        self.close()?;
        self.nest(node)
    }

    fn visit_internal_link(&mut self, node: &'ast Node, locator: &'ast str) -> fmt::Result {
        self.open(node, "InternalLink")?;
        write!(self.f, ": {locator}")?;
        self.close()?;
        self.nest(node)
    }

    fn visit_resource_link(
        &mut self,
        node: &'ast Node,
        prefix: &'ast str,
        locator: &'ast str,
    ) -> fmt::Result {
        self.open(node, "ResourceLink")?;
        write!(self.f, ": {prefix}:{locator}")?;
        self.close()?;
        self.nest(node)
    }

    fn visit_internal_link_item(&mut self, node: &'ast Node) -> fmt::Result {
        self.plain(node, "InternalLinkItem")
    }

    fn visit_category_link(&mut self, node: &'ast Node, locator: &'ast str) -> fmt::Result {
        self.open(node, "CategoryLink")?;
        write!(self.f, ": {locator}")?;
        self.close()?;
        self.nest(node)
    }

    fn visit_category(
        &mut self,
        node: &'ast Node,
        locator: &'ast str,
        sort_as: Option<&'ast str>,
    ) -> fmt::Result {
        self.open(node, "Category")?;
        write!(self.f, ": {locator}")?;
        if let Some(sort_as) = sort_as {
            write!(self.f, " ({sort_as})")?;
        }
        self.close()
    }

    fn visit_table(&mut self, node: &'ast Node, options: Option<&'ast str>) -> fmt::Result {
        self.open(node, "Table")?;
        if let Some(options) = options {
            write!(self.f, ": {options}")?;
        }
        self.close()?;
        self.nest(node)
    }

    fn visit_table_row(&mut self, node: &'ast Node, options: Option<&'ast str>) -> fmt::Result {
        self.open(node, "TableRow")?;
        if let Some(options) = options {
            write!(self.f, ": {options}")?;
        }
        self.close()?;
        self.nest(node)
    }

    fn visit_table_cell(
        &mut self,
        node: &'ast Node,
        kind: CellKind,
        attributes: Option<&'ast str>,
    ) -> fmt::Result {
        self.open(node, "TableCell")?;
        write!(self.f, ": {kind:?}")?;
        if let Some(attributes) = attributes {
            write!(self.f, " {attributes}")?;
        }
        self.close()?;
        self.nest(node)
    }

    fn visit_element(
        &mut self,
        node: &'ast Node,
        name: &'ast str,
        _: &'ast IndexMap<String, String>,
    ) -> fmt::Result {
        self.open(node, "Element")?;
        write!(self.f, ": {name}")?;
        self.close()?;
        self.nest(node)
    }

    fn visit_template(&mut self, node: &'ast Node, name: &'ast str) -> fmt::Result {
        self.open(node, "Template")?;
        write!(self.f, ": {name}")?;
        self.close()?;
        self.nest(node)
    }

    fn visit_template_parameter(&mut self, node: &'ast Node) -> fmt::Result {
        self.plain(node, "TemplateParameter")
    }

    fn visit_keyword(&mut self, node: &'ast Node) -> fmt::Result {
        self.open(node, "Keyword")?;
        write!(self.f, ": {}", node.contents)?;
        self.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    #[test]
    fn dump_shape() {
        let ast = parser::parse("text").unwrap();
        assert_eq!(
            TreeDump(&ast).to_string(),
            "Wiki[0, 4]\n    Paragraph[0, 4]\n        Text[0, 4]: None \"text\"\n"
        );
    }
}
