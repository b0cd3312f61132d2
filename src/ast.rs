//! The document tree produced by the [parser](crate::parser).

use indexmap::IndexMap;

use crate::codemap::Span;

/// Inline text formatting carried by a [`NodeKind::Text`] or
/// [`NodeKind::Formatted`] node.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Formatting {
    /// Plain text.
    None,
    /// `'''`-delimited text.
    Bold,
    /// `''`-delimited text.
    Italic,
    /// A named character entity. The node contents hold the entity name.
    CharacterEntity,
    /// A horizontal rule. The node contents hold the source dashes.
    HLine,
    /// A `~~~` signature. The node contents are empty.
    SignatureName,
    /// A `~~~~` signature. The node contents are empty.
    SignatureFull,
    /// A `~~~~~` signature. The node contents are empty.
    SignatureDate,
}

/// The flavour of a [`NodeKind::List`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ListKind {
    /// A `*` list.
    Bulleted,
    /// A `#` list.
    Numbered,
    /// A `;`/`:` list.
    Definition,
}

/// Whether a [`NodeKind::TableCell`] is a body or heading cell.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CellKind {
    /// A `|` cell.
    Body,
    /// A `!` cell.
    Heading,
}

/// The protocol of a [`NodeKind::Link`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LinkType {
    Http,
    Https,
}

/// What a [`Node`] represents.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum NodeKind {
    /// The document root.
    Wiki,
    /// A top-level paragraph.
    Paragraph,
    /// An inline formatting span containing child flow.
    Formatted(Formatting),
    /// A text leaf. The node contents hold the text.
    Text(Formatting),
    /// A bulleted, numbered, or definition list.
    List(ListKind),
    /// A `*` or `#` list item.
    ListItem,
    /// A `;` definition list term.
    ListTerm,
    /// A `:` definition list definition.
    ListDefinition,
    /// A heading. The level is clamped to `1..=6`.
    Section { level: u8 },
    /// A preformatted block, either space-indented or `<pre>`-delimited.
    Preformatted { indented: bool },
    /// A `<paste>` block.
    Paste,
    /// An external link. Children hold the caption flow, which is empty for
    /// bare URLs.
    Link { url: String, link_type: LinkType },
    /// An internal link. Children hold the caption flow.
    InternalLink { locator: String },
    /// A prefixed internal link such as `[[Image:...]]`. Children are
    /// [`NodeKind::InternalLinkItem`] nodes, one per `|`-separated option.
    ResourceLink { prefix: String, locator: String },
    /// One option of a [`NodeKind::ResourceLink`].
    InternalLinkItem,
    /// A visible link to a category page, `[[:Category:...]]`.
    CategoryLink { locator: String },
    /// A category membership declaration, `[[Category:...]]`.
    Category { locator: String, sort_as: Option<String> },
    /// A table. The options text is the raw attribute string after `{|`.
    Table { options: Option<String> },
    /// A table row.
    TableRow { options: Option<String> },
    /// A table cell.
    TableCell { kind: CellKind, attributes: Option<String> },
    /// An allow-listed XHTML element.
    Element { name: String, attributes: IndexMap<String, String> },
    /// A `{{...}}` template invocation.
    Template { name: String },
    /// One parameter of a [`NodeKind::Template`]. Children hold the
    /// parameter flow, which may itself contain templates.
    TemplateParameter,
    /// A behaviour switch such as `__TOC__`. The node contents hold the
    /// keyword text.
    Keyword,
}

/// One node of the document tree.
///
/// `index` and `length` locate the node in the source in bytes, covering its
/// markup as well as its content. A child’s range always lies within its
/// parent’s.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    /// Normalised text for leaf nodes; empty for containers.
    pub contents: String,
    pub children: Vec<Node>,
    /// The byte offset of the first character of the node in the source.
    pub index: usize,
    /// The number of source bytes covered by the node.
    pub length: usize,
}

impl Node {
    pub(crate) fn new(kind: NodeKind, index: usize) -> Self {
        Self {
            kind,
            contents: String::new(),
            children: Vec::new(),
            index,
            length: 0,
        }
    }

    pub(crate) fn leaf(kind: NodeKind, contents: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            contents: contents.into(),
            children: Vec::new(),
            index: span.start,
            length: span.len(),
        }
    }

    /// The source range covered by this node.
    pub fn span(&self) -> Span {
        Span::new(self.index, self.index + self.length)
    }

    /// Appends a child, merging adjacent plain text leaves.
    pub(crate) fn push_child(&mut self, child: Node) {
        if let (
            Some(Node {
                kind: NodeKind::Text(Formatting::None),
                contents,
                index,
                length,
                ..
            }),
            Node {
                kind: NodeKind::Text(Formatting::None),
                contents: new_contents,
                index: new_index,
                length: new_length,
                ..
            },
        ) = (self.children.last_mut(), &child)
        {
            contents.push_str(new_contents);
            *length = new_index + new_length - *index;
            return;
        }

        self.children.push(child);
    }

    /// Concatenates the contents of every text leaf in the subtree.
    pub fn text_contents(&self) -> String {
        fn collect(node: &Node, out: &mut String) {
            if let NodeKind::Text(_) = node.kind {
                out.push_str(&node.contents);
            }
            for child in &node.children {
                collect(child, out);
            }
        }

        let mut out = String::new();
        collect(self, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_adjacent_plain_text() {
        let mut parent = Node::new(NodeKind::Paragraph, 0);
        parent.push_child(Node::leaf(
            NodeKind::Text(Formatting::None),
            "one",
            Span::new(0, 3),
        ));
        parent.push_child(Node::leaf(
            NodeKind::Text(Formatting::None),
            "|two",
            Span::new(3, 7),
        ));
        assert_eq!(parent.children.len(), 1);
        assert_eq!(parent.children[0].contents, "one|two");
        assert_eq!(parent.children[0].length, 7);
    }

    #[test]
    fn keeps_formatted_text_separate() {
        let mut parent = Node::new(NodeKind::Paragraph, 0);
        parent.push_child(Node::leaf(
            NodeKind::Text(Formatting::None),
            "a",
            Span::new(0, 1),
        ));
        parent.push_child(Node::leaf(
            NodeKind::Text(Formatting::CharacterEntity),
            "amp",
            Span::new(1, 6),
        ));
        assert_eq!(parent.children.len(), 2);
    }
}
