//! Helper trait for implementing document tree walkers.

use indexmap::IndexMap;

use crate::ast::{CellKind, Formatting, LinkType, ListKind, Node, NodeKind};

/// A trait for visiting the nodes of a document tree.
///
/// Every method has a default implementation that recurses into child nodes,
/// so a walker only overrides the kinds it cares about.
pub trait Walker<'ast, E> {
    /// Visits any [`Node`], dispatching on its kind.
    #[inline]
    fn visit_node(&mut self, node: &'ast Node) -> Result<(), E> {
        visit_node(self, node)
    }

    /// Visits the children of a node in order.
    #[inline]
    fn visit_children(&mut self, node: &'ast Node) -> Result<(), E> {
        visit_children(self, node)
    }

    /// Visits a [`NodeKind::Wiki`].
    #[inline]
    fn visit_wiki(&mut self, node: &'ast Node) -> Result<(), E> {
        self.visit_children(node)
    }

    /// Visits a [`NodeKind::Paragraph`].
    #[inline]
    fn visit_paragraph(&mut self, node: &'ast Node) -> Result<(), E> {
        self.visit_children(node)
    }

    /// Visits a [`NodeKind::Formatted`].
    #[inline]
    fn visit_formatted(&mut self, node: &'ast Node, _formatting: Formatting) -> Result<(), E> {
        self.visit_children(node)
    }

    /// Visits a [`NodeKind::Text`].
    #[inline]
    fn visit_text(&mut self, _node: &'ast Node, _formatting: Formatting) -> Result<(), E> {
        Ok(())
    }

    /// Visits a [`NodeKind::List`].
    #[inline]
    fn visit_list(&mut self, node: &'ast Node, _kind: ListKind) -> Result<(), E> {
        self.visit_children(node)
    }

    /// Visits a [`NodeKind::ListItem`].
    #[inline]
    fn visit_list_item(&mut self, node: &'ast Node) -> Result<(), E> {
        self.visit_children(node)
    }

    /// Visits a [`NodeKind::ListTerm`].
    #[inline]
    fn visit_list_term(&mut self, node: &'ast Node) -> Result<(), E> {
        self.visit_children(node)
    }

    /// Visits a [`NodeKind::ListDefinition`].
    #[inline]
    fn visit_list_definition(&mut self, node: &'ast Node) -> Result<(), E> {
        self.visit_children(node)
    }

    /// Visits a [`NodeKind::Section`].
    #[inline]
    fn visit_section(&mut self, node: &'ast Node, _level: u8) -> Result<(), E> {
        self.visit_children(node)
    }

    /// Visits a [`NodeKind::Preformatted`].
    #[inline]
    fn visit_preformatted(&mut self, node: &'ast Node, _indented: bool) -> Result<(), E> {
        self.visit_children(node)
    }

    /// Visits a [`NodeKind::Paste`].
    #[inline]
    fn visit_paste(&mut self, node: &'ast Node) -> Result<(), E> {
        self.visit_children(node)
    }

    /// Visits a [`NodeKind::Link`].
    #[inline]
    fn visit_link(
        &mut self,
        node: &'ast Node,
        _url: &'ast str,
        _link_type: LinkType,
    ) -> Result<(), E> {
        self.visit_children(node)
    }

    /// Visits a [`NodeKind::InternalLink`].
    #[inline]
    fn visit_internal_link(&mut self, node: &'ast Node, _locator: &'ast str) -> Result<(), E> {
        self.visit_children(node)
    }

    /// Visits a [`NodeKind::ResourceLink`].
    #[inline]
    fn visit_resource_link(
        &mut self,
        node: &'ast Node,
        _prefix: &'ast str,
        _locator: &'ast str,
    ) -> Result<(), E> {
        self.visit_children(node)
    }

    /// Visits a [`NodeKind::InternalLinkItem`].
    #[inline]
    fn visit_internal_link_item(&mut self, node: &'ast Node) -> Result<(), E> {
        self.visit_children(node)
    }

    /// Visits a [`NodeKind::CategoryLink`].
    #[inline]
    fn visit_category_link(&mut self, node: &'ast Node, _locator: &'ast str) -> Result<(), E> {
        self.visit_children(node)
    }

    /// Visits a [`NodeKind::Category`].
    #[inline]
    fn visit_category(
        &mut self,
        _node: &'ast Node,
        _locator: &'ast str,
        _sort_as: Option<&'ast str>,
    ) -> Result<(), E> {
        Ok(())
    }

    /// Visits a [`NodeKind::Table`].
    #[inline]
    fn visit_table(&mut self, node: &'ast Node, _options: Option<&'ast str>) -> Result<(), E> {
        self.visit_children(node)
    }

    /// Visits a [`NodeKind::TableRow`].
    #[inline]
    fn visit_table_row(&mut self, node: &'ast Node, _options: Option<&'ast str>) -> Result<(), E> {
        self.visit_children(node)
    }

    /// Visits a [`NodeKind::TableCell`].
    #[inline]
    fn visit_table_cell(
        &mut self,
        node: &'ast Node,
        _kind: CellKind,
        _attributes: Option<&'ast str>,
    ) -> Result<(), E> {
        self.visit_children(node)
    }

    /// Visits a [`NodeKind::Element`].
    #[inline]
    fn visit_element(
        &mut self,
        node: &'ast Node,
        _name: &'ast str,
        _attributes: &'ast IndexMap<String, String>,
    ) -> Result<(), E> {
        self.visit_children(node)
    }

    /// Visits a [`NodeKind::Template`].
    #[inline]
    fn visit_template(&mut self, node: &'ast Node, _name: &'ast str) -> Result<(), E> {
        self.visit_children(node)
    }

    /// Visits a [`NodeKind::TemplateParameter`].
    #[inline]
    fn visit_template_parameter(&mut self, node: &'ast Node) -> Result<(), E> {
        self.visit_children(node)
    }

    /// Visits a [`NodeKind::Keyword`].
    #[inline]
    fn visit_keyword(&mut self, _node: &'ast Node) -> Result<(), E> {
        Ok(())
    }
}

/// Default implementation of [`Walker::visit_node`].
#[inline]
pub fn visit_node<'ast, W, E>(walker: &mut W, node: &'ast Node) -> Result<(), E>
where
    W: Walker<'ast, E> + ?Sized,
{
    match &node.kind {
        NodeKind::Wiki => walker.visit_wiki(node),
        NodeKind::Paragraph => walker.visit_paragraph(node),
        NodeKind::Formatted(formatting) => walker.visit_formatted(node, *formatting),
        NodeKind::Text(formatting) => walker.visit_text(node, *formatting),
        NodeKind::List(kind) => walker.visit_list(node, *kind),
        NodeKind::ListItem => walker.visit_list_item(node),
        NodeKind::ListTerm => walker.visit_list_term(node),
        NodeKind::ListDefinition => walker.visit_list_definition(node),
        NodeKind::Section { level } => walker.visit_section(node, *level),
        NodeKind::Preformatted { indented } => walker.visit_preformatted(node, *indented),
        NodeKind::Paste => walker.visit_paste(node),
        NodeKind::Link { url, link_type } => walker.visit_link(node, url, *link_type),
        NodeKind::InternalLink { locator } => walker.visit_internal_link(node, locator),
        NodeKind::ResourceLink { prefix, locator } => {
            walker.visit_resource_link(node, prefix, locator)
        }
        NodeKind::InternalLinkItem => walker.visit_internal_link_item(node),
        NodeKind::CategoryLink { locator } => walker.visit_category_link(node, locator),
        NodeKind::Category { locator, sort_as } => {
            walker.visit_category(node, locator, sort_as.as_deref())
        }
        NodeKind::Table { options } => walker.visit_table(node, options.as_deref()),
        NodeKind::TableRow { options } => walker.visit_table_row(node, options.as_deref()),
        NodeKind::TableCell { kind, attributes } => {
            walker.visit_table_cell(node, *kind, attributes.as_deref())
        }
        NodeKind::Element { name, attributes } => walker.visit_element(node, name, attributes),
        NodeKind::Template { name } => walker.visit_template(node, name),
        NodeKind::TemplateParameter => walker.visit_template_parameter(node),
        NodeKind::Keyword => walker.visit_keyword(node),
    }
}

/// Default implementation of [`Walker::visit_children`].
#[inline]
pub fn visit_children<'ast, W, E>(walker: &mut W, node: &'ast Node) -> Result<(), E>
where
    W: Walker<'ast, E> + ?Sized,
{
    for child in &node.children {
        walker.visit_node(child)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    #[derive(Default)]
    struct TextCollector(String);

    impl<'ast> Walker<'ast, core::convert::Infallible> for TextCollector {
        fn visit_text(
            &mut self,
            node: &'ast Node,
            _formatting: Formatting,
        ) -> Result<(), core::convert::Infallible> {
            self.0.push_str(&node.contents);
            Ok(())
        }
    }

    #[test]
    fn default_walk_reaches_every_text_leaf() {
        let ast = parser::parse("''a'' [[b|c]] {{d|e}}\n* f\n").unwrap();
        let mut collector = TextCollector::default();
        match collector.visit_node(&ast) {
            Ok(()) => {}
            Err(never) => match never {},
        }
        assert!(collector.0.contains('a'));
        assert!(collector.0.contains('c'));
        assert!(collector.0.contains('e'));
        assert!(collector.0.contains("f\n"));
    }
}
