//! Builds the document tree from the token stream.
//!
//! The lexer guarantees a balanced stream, so tree construction is a single
//! stack pass: start tokens push a frame, end tokens seal the frame and hand
//! the finished node to its parent. Links and templates carry extra frame
//! state because their `|`-separated segments only gain meaning once the
//! closing token fixes how many there were.

use crate::Error;
use crate::ast::{CellKind, Formatting, LinkType, ListKind, Node, NodeKind};
use crate::codemap::{FileMap, Span};
use crate::lexer;
use crate::token::{Token, TokenKind};

/// Parses wikitext into a document tree.
pub fn parse(input: &str) -> Result<Node, Error> {
    let tokens = lexer::tokenize(input)?;
    Ok(parse_tokens(input, &tokens))
}

/// State carried by a frame whose children need restructuring when the
/// frame is sealed.
enum State {
    Plain,
    Link {
        url: String,
        seen_sep: bool,
    },
    IntLink {
        prefix: Option<String>,
        segments: Vec<Vec<Node>>,
        seps: Vec<Span>,
    },
    Template {
        segments: Vec<Vec<Node>>,
        seps: Vec<Span>,
    },
}

struct Frame {
    node: Node,
    state: State,
    /// An attribute name waiting for its value.
    pending_attr: Option<String>,
}

impl Frame {
    fn new(node: Node) -> Self {
        Self {
            node,
            state: State::Plain,
            pending_attr: None,
        }
    }

    fn with_state(node: Node, state: State) -> Self {
        Self {
            node,
            state,
            pending_attr: None,
        }
    }
}

struct Builder<'src> {
    map: FileMap<'src>,
    stack: Vec<Frame>,
}

/// Builds the document tree from an existing token stream over `input`.
pub fn parse_tokens(input: &str, tokens: &[Token]) -> Node {
    let mut builder = Builder {
        map: FileMap::new(input),
        stack: vec![Frame::new(Node::new(NodeKind::Wiki, 0))],
    };

    for token in tokens {
        builder.step(token);
    }

    while builder.stack.len() > 1 {
        log::warn!("unterminated construct at end of token stream");
        let end = Span::new(input.len(), input.len());
        builder.seal(&Token::new(TokenKind::Eof, "", end));
    }

    let mut root = builder.stack.pop().unwrap().node;
    root.length = input.len();
    root
}

impl Builder<'_> {
    fn step(&mut self, token: &Token) {
        use TokenKind::*;
        match token.kind {
            ParaStart => self.push(Node::new(NodeKind::Paragraph, token.span.start)),
            BoldStart => self.push(Node::new(
                NodeKind::Formatted(Formatting::Bold),
                token.span.start,
            )),
            ItalicStart => self.push(Node::new(
                NodeKind::Formatted(Formatting::Italic),
                token.span.start,
            )),
            SectionStart => {
                let level = token.text.len().clamp(1, 6) as u8;
                self.push(Node::new(NodeKind::Section { level }, token.span.start));
            }
            UlStart => self.push(Node::new(
                NodeKind::List(ListKind::Bulleted),
                token.span.start,
            )),
            OlStart => self.push(Node::new(
                NodeKind::List(ListKind::Numbered),
                token.span.start,
            )),
            DlStart => self.push(Node::new(
                NodeKind::List(ListKind::Definition),
                token.span.start,
            )),
            LiStart => self.push(Node::new(NodeKind::ListItem, token.span.start)),
            DtStart => self.push(Node::new(NodeKind::ListTerm, token.span.start)),
            DdStart => self.push(Node::new(NodeKind::ListDefinition, token.span.start)),
            TableStart => self.push(Node::new(
                NodeKind::Table { options: None },
                token.span.start,
            )),
            RowStart => self.push(Node::new(
                NodeKind::TableRow { options: None },
                token.span.start,
            )),
            CellStart => self.push(Node::new(
                NodeKind::TableCell {
                    kind: CellKind::Body,
                    attributes: None,
                },
                token.span.start,
            )),
            HeadStart => self.push(Node::new(
                NodeKind::TableCell {
                    kind: CellKind::Heading,
                    attributes: None,
                },
                token.span.start,
            )),
            PreStart => self.push(Node::new(
                NodeKind::Preformatted {
                    indented: token.text.is_empty(),
                },
                token.span.start,
            )),
            PasteStart => self.push(Node::new(NodeKind::Paste, token.span.start)),
            TagStart => self.push(Node::new(
                NodeKind::Element {
                    name: token.text.clone(),
                    attributes: Default::default(),
                },
                token.span.start,
            )),
            LinkStart => self.stack.push(Frame::with_state(
                Node::new(
                    NodeKind::Link {
                        url: String::new(),
                        link_type: LinkType::Http,
                    },
                    token.span.start,
                ),
                State::Link {
                    url: String::new(),
                    seen_sep: false,
                },
            )),
            IntLinkStart => self.stack.push(Frame::with_state(
                Node::new(
                    NodeKind::InternalLink {
                        locator: String::new(),
                    },
                    token.span.start,
                ),
                State::IntLink {
                    prefix: None,
                    segments: vec![Vec::new()],
                    seps: Vec::new(),
                },
            )),
            TemplateStart => self.stack.push(Frame::with_state(
                Node::new(
                    NodeKind::Template {
                        name: String::new(),
                    },
                    token.span.start,
                ),
                State::Template {
                    segments: vec![Vec::new()],
                    seps: Vec::new(),
                },
            )),

            ParaEnd | BoldEnd | ItalicEnd | SectionEnd | UlEnd | OlEnd | DlEnd | LiEnd
            | DtEnd | DdEnd | TableEnd | RowEnd | CellEnd | HeadEnd | PreEnd | PasteEnd
            | TagEnd | LinkEnd | IntLinkEnd | TemplateEnd => self.seal(token),

            LinkSep => {
                if let State::Link { seen_sep, .. } = &mut self.top().state {
                    *seen_sep = true;
                }
            }
            IntLinkSep => {
                let used = match &mut self.top().state {
                    State::IntLink { segments, seps, .. }
                    | State::Template { segments, seps } => {
                        segments.push(Vec::new());
                        seps.push(token.span);
                        true
                    }
                    _ => false,
                };
                if !used {
                    self.discard(token);
                }
            }
            ResourceSep => {
                if let State::IntLink {
                    prefix, segments, ..
                } = &mut self.top().state
                {
                    let target = core::mem::take(&mut segments[0]);
                    *prefix = Some(text_of(&target));
                } else {
                    self.discard(token);
                }
            }

            Text => self.text(token),
            CharEnt => self.add(Node::leaf(
                NodeKind::Text(Formatting::CharacterEntity),
                &*token.text,
                token.span,
            )),
            Hline => self.add(Node::leaf(
                NodeKind::Text(Formatting::HLine),
                &*token.text,
                token.span,
            )),
            SignatureName => self.add(Node::leaf(
                NodeKind::Text(Formatting::SignatureName),
                "",
                token.span,
            )),
            SignatureFull => self.add(Node::leaf(
                NodeKind::Text(Formatting::SignatureFull),
                "",
                token.span,
            )),
            SignatureDate => self.add(Node::leaf(
                NodeKind::Text(Formatting::SignatureDate),
                "",
                token.span,
            )),
            Keyword => self.add(Node::leaf(NodeKind::Keyword, &*token.text, token.span)),

            AttrName => {
                let frame = self.top();
                if let Some(prev) = frame.pending_attr.take() {
                    if let NodeKind::Element { attributes, .. } = &mut frame.node.kind {
                        attributes.insert(prev, String::new());
                    }
                }
                frame.pending_attr = Some(token.text.clone());
            }
            AttrValue => {
                let frame = self.top();
                let used = match &mut frame.node.kind {
                    NodeKind::Element { attributes, .. } => {
                        if let Some(name) = frame.pending_attr.take() {
                            attributes.insert(name, token.text.clone());
                        }
                        true
                    }
                    NodeKind::Table { options } | NodeKind::TableRow { options } => {
                        *options = Some(token.text.clone());
                        true
                    }
                    NodeKind::TableCell { attributes, .. } => {
                        *attributes = Some(token.text.clone());
                        true
                    }
                    _ => false,
                };
                if !used {
                    self.discard(token);
                }
            }

            Eof => {}
        }
    }

    fn top(&mut self) -> &mut Frame {
        self.stack.last_mut().unwrap()
    }

    fn push(&mut self, node: Node) {
        self.stack.push(Frame::new(node));
    }

    fn discard(&mut self, token: &Token) {
        log::debug!(
            "discarding unexpected {:?} at {}",
            token.kind,
            self.map.find_line_col(token.span.start.min(self.map.len()))
        );
    }

    /// Routes a finished node to the innermost open frame.
    fn add(&mut self, node: Node) {
        let frame = self.top();
        match &mut frame.state {
            State::Plain => frame.node.push_child(node),
            State::Link { url, seen_sep } => {
                if !*seen_sep && matches!(node.kind, NodeKind::Text(Formatting::None)) {
                    url.push_str(&node.contents);
                } else {
                    frame.node.push_child(node);
                }
            }
            State::IntLink { segments, .. } | State::Template { segments, .. } => {
                segments.last_mut().unwrap().push(node);
            }
        }
    }

    fn text(&mut self, token: &Token) {
        self.add(Node::leaf(
            NodeKind::Text(Formatting::None),
            &*token.text,
            token.span,
        ));
    }

    /// Closes the innermost frame at the end position of `token`.
    fn seal(&mut self, token: &Token) {
        if self.stack.len() == 1 {
            self.discard(token);
            return;
        }
        let Frame {
            mut node,
            state,
            pending_attr,
        } = self.stack.pop().unwrap();
        node.length = token.span.end - node.index;

        if let Some(name) = pending_attr {
            // a valueless attribute
            if let NodeKind::Element { attributes, .. } = &mut node.kind {
                attributes.insert(name, String::new());
            }
        }

        match state {
            State::Plain => {}
            State::Link { url, .. } => {
                let link_type = if url.starts_with("https://") {
                    LinkType::Https
                } else {
                    LinkType::Http
                };
                node.kind = NodeKind::Link { url, link_type };
            }
            State::IntLink {
                prefix,
                segments,
                seps,
            } => finish_int_link(&mut node, prefix, segments, seps),
            State::Template { segments, seps } => finish_template(&mut node, segments, seps),
        }

        self.add(node);
    }
}

/// Concatenates the text content of a segment.
fn text_of(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        out.push_str(&node.text_contents());
    }
    out
}

fn merged_span(nodes: &[Node]) -> Option<Span> {
    let first = nodes.first()?;
    let last = nodes.last()?;
    Some(first.span().merge(last.span()))
}

fn finish_int_link(
    node: &mut Node,
    prefix: Option<String>,
    mut segments: Vec<Vec<Node>>,
    seps: Vec<Span>,
) {
    let locator = text_of(&segments.remove(0));

    match prefix {
        None => {
            node.kind = NodeKind::InternalLink { locator };
            flatten_caption(node, segments, &seps);
        }
        Some(prefix) => {
            if let Some(escaped) = prefix.strip_prefix(':') {
                if escaped.eq_ignore_ascii_case("category") {
                    // a visible link to the category page rather than a
                    // membership declaration
                    node.kind = NodeKind::CategoryLink { locator };
                } else {
                    node.kind = NodeKind::InternalLink {
                        locator: format!("{escaped}:{locator}"),
                    };
                }
                flatten_caption(node, segments, &seps);
            } else if prefix.eq_ignore_ascii_case("category") {
                let sort_as = segments.first().map(|seg| text_of(seg));
                node.kind = NodeKind::Category { locator, sort_as };
            } else {
                node.kind = NodeKind::ResourceLink { prefix, locator };
                for seg in segments {
                    let Some(span) = merged_span(&seg) else {
                        // empty options are dropped
                        continue;
                    };
                    let mut item = Node::new(NodeKind::InternalLinkItem, span.start);
                    item.length = span.len();
                    for child in seg {
                        item.push_child(child);
                    }
                    node.push_child(item);
                }
            }
        }
    }
}

/// Rejoins caption segments of a plain link: only the first `|` is a
/// separator, the rest are literal text.
fn flatten_caption(node: &mut Node, segments: Vec<Vec<Node>>, seps: &[Span]) {
    for (k, seg) in segments.into_iter().enumerate() {
        if k >= 1 {
            node.push_child(Node::leaf(NodeKind::Text(Formatting::None), "|", seps[k]));
        }
        for child in seg {
            node.push_child(child);
        }
    }
}

fn finish_template(node: &mut Node, mut segments: Vec<Vec<Node>>, seps: Vec<Span>) {
    let name = text_of(&segments.remove(0));
    node.kind = NodeKind::Template { name };

    for (k, seg) in segments.into_iter().enumerate() {
        let span = merged_span(&seg)
            .unwrap_or_else(|| Span::new(seps[k].end, seps[k].end));
        let mut param = Node::new(NodeKind::TemplateParameter, span.start);
        param.length = span.len();
        for child in seg {
            param.push_child(child);
        }
        node.push_child(param);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root(input: &str) -> Node {
        parse(input).unwrap()
    }

    #[test]
    fn paragraph_wraps_text() {
        let ast = root("text");
        assert_eq!(ast.kind, NodeKind::Wiki);
        assert_eq!((ast.index, ast.length), (0, 4));
        let para = &ast.children[0];
        assert_eq!(para.kind, NodeKind::Paragraph);
        assert_eq!((para.index, para.length), (0, 4));
        assert_eq!(para.children[0].contents, "text");
    }

    #[test]
    fn link_url_is_not_a_child() {
        let ast = root("[http://example.com caption]");
        let link = &ast.children[0].children[0];
        let NodeKind::Link { url, link_type } = &link.kind else {
            panic!("expected link, got {:?}", link.kind)
        };
        assert_eq!(url, "http://example.com");
        assert_eq!(*link_type, LinkType::Http);
        assert_eq!(link.children.len(), 1);
        assert_eq!(link.children[0].contents, "caption");
    }

    #[test]
    fn https_link_type() {
        let ast = root("https://example.com");
        let NodeKind::Link { link_type, .. } = &ast.children[0].children[0].kind else {
            panic!()
        };
        assert_eq!(*link_type, LinkType::Https);
    }

    #[test]
    fn extra_pipes_in_plain_link_are_literal() {
        let ast = root("[[example|option1|option2]]");
        let link = &ast.children[0].children[0];
        let NodeKind::InternalLink { locator } = &link.kind else { panic!() };
        assert_eq!(locator, "example");
        assert_eq!(link.children.len(), 1);
        assert_eq!(link.children[0].contents, "option1|option2");
        assert_eq!((link.children[0].index, link.children[0].length), (10, 15));
    }

    #[test]
    fn resource_link_options_become_items() {
        let ast = root("[[resource:example|option1|option2]]");
        let link = &ast.children[0].children[0];
        let NodeKind::ResourceLink { prefix, locator } = &link.kind else { panic!() };
        assert_eq!(prefix, "resource");
        assert_eq!(locator, "example");
        assert_eq!(link.children.len(), 2);
        assert!(link
            .children
            .iter()
            .all(|c| c.kind == NodeKind::InternalLinkItem));
    }

    #[test]
    fn empty_resource_option_is_dropped() {
        let ast = root("[[resource:example||option]]");
        let link = &ast.children[0].children[0];
        assert_eq!(link.children.len(), 1);
    }

    #[test]
    fn category_membership() {
        let ast = root("[[Category:help|sort key]]");
        let cat = &ast.children[0].children[0];
        let NodeKind::Category { locator, sort_as } = &cat.kind else { panic!() };
        assert_eq!(locator, "help");
        assert_eq!(sort_as.as_deref(), Some("sort key"));
        assert!(cat.children.is_empty());
    }

    #[test]
    fn escaped_category_is_a_visible_link() {
        let ast = root("[[:Category:help]]");
        let link = &ast.children[0].children[0];
        let NodeKind::CategoryLink { locator } = &link.kind else {
            panic!("expected category link, got {:?}", link.kind)
        };
        assert_eq!(locator, "help");
    }

    #[test]
    fn template_parameters() {
        let ast = root("{{name|one|{{nested}}}}");
        let template = &ast.children[0].children[0];
        let NodeKind::Template { name } = &template.kind else { panic!() };
        assert_eq!(name, "name");
        assert_eq!(template.children.len(), 2);
        assert_eq!(template.children[0].kind, NodeKind::TemplateParameter);
        assert!(matches!(
            template.children[1].children[0].kind,
            NodeKind::Template { .. }
        ));
    }

    #[test]
    fn heading_level_is_clamped() {
        let ast = root("======= h =======\n");
        let NodeKind::Section { level } = ast.children[0].kind else { panic!() };
        assert_eq!(level, 6);
    }

    #[test]
    fn child_spans_nest_within_parents() {
        fn check(node: &Node) {
            for child in &node.children {
                assert!(child.index >= node.index);
                assert!(child.index + child.length <= node.index + node.length);
                check(child);
            }
        }
        for input in [
            "''italic'''bold'''italic''",
            "*a\n**b\n*c\n",
            "{|\n|- align='x'\n|a||b\n|}",
            "= h =\ntext\n\ntext",
            "[[resource:example|''x'']]",
        ] {
            check(&parse(input).unwrap());
        }
    }
}
