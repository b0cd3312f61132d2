//! The token stream produced by the [lexer](crate::lexer).

use crate::codemap::Span;

/// The kind of a [`Token`].
///
/// Paired `*Start`/`*End` kinds delimit a region of the stream; the lexer
/// guarantees they are balanced, synthesising zero-width end tokens for
/// markup left unterminated in the source.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TokenKind {
    /// The start of a top-level paragraph. Zero-width.
    ParaStart,
    /// The end of a top-level paragraph. Zero-width.
    ParaEnd,
    /// A run of plain text.
    Text,
    /// `'''`.
    BoldStart,
    /// `'''`, or zero-width when synthesised.
    BoldEnd,
    /// `''`.
    ItalicStart,
    /// `''`, or zero-width when synthesised.
    ItalicEnd,
    /// A run of `=` at the start of a heading line. The text length gives
    /// the heading level.
    SectionStart,
    /// The closing run of `=`, or zero-width at end of line.
    SectionEnd,
    /// `[` opening a bracketed external link, or zero-width for a bare URL.
    LinkStart,
    /// `]`, or zero-width when synthesised.
    LinkEnd,
    /// The space between an external link target and its caption.
    LinkSep,
    /// `[[`.
    IntLinkStart,
    /// `]]`, or zero-width when synthesised.
    IntLinkEnd,
    /// `|` inside an internal link or template.
    IntLinkSep,
    /// The `:` separating a resource prefix from an internal link target.
    ResourceSep,
    /// The start of a bulleted list. Zero-width.
    UlStart,
    /// The end of a bulleted list. Zero-width.
    UlEnd,
    /// The start of a numbered list. Zero-width.
    OlStart,
    /// The end of a numbered list. Zero-width.
    OlEnd,
    /// The start of a definition list. Zero-width.
    DlStart,
    /// The end of a definition list. Zero-width.
    DlEnd,
    /// A `*` or `#` starting a list item.
    LiStart,
    /// The end of a list item. Zero-width.
    LiEnd,
    /// A `;` starting a definition list term.
    DtStart,
    /// The end of a definition list term. Zero-width.
    DtEnd,
    /// A `:` starting a definition list definition.
    DdStart,
    /// The end of a definition list definition. Zero-width.
    DdEnd,
    /// `{|`.
    TableStart,
    /// `|}`, or zero-width when synthesised.
    TableEnd,
    /// `|-`, or zero-width for an implicit first row.
    RowStart,
    /// The end of a table row. Zero-width.
    RowEnd,
    /// `|` or `||` starting a table body cell.
    CellStart,
    /// The end of a table body cell. Zero-width.
    CellEnd,
    /// `!` or `!!` starting a table heading cell.
    HeadStart,
    /// The end of a table heading cell. Zero-width.
    HeadEnd,
    /// The opening tag of an allow-listed XHTML element. The text is the
    /// lowercased element name.
    TagStart,
    /// The closing tag of an allow-listed XHTML element, or zero-width when
    /// synthesised. The text is the lowercased element name.
    TagEnd,
    /// An attribute name inside an opening tag, or a table/row/cell options
    /// marker.
    AttrName,
    /// An attribute value, or raw table/row/cell options text.
    AttrValue,
    /// `&name;`. The text is the entity name without the delimiters.
    CharEnt,
    /// A horizontal rule, a run of four or more `-` at the start of a line.
    Hline,
    /// A behaviour switch such as `__TOC__`.
    Keyword,
    /// `<paste>`.
    PasteStart,
    /// `</paste>`, or zero-width when synthesised.
    PasteEnd,
    /// `{{`.
    TemplateStart,
    /// `}}`, or zero-width when synthesised.
    TemplateEnd,
    /// `<pre>`, or zero-width for space-indented preformatted text.
    PreStart,
    /// `</pre>`, or zero-width when synthesised.
    PreEnd,
    /// `~~~`: the signing user’s name.
    SignatureName,
    /// `~~~~`: the signing user’s name and the current date.
    SignatureFull,
    /// `~~~~~`: the current date.
    SignatureDate,
    /// End of input. Always the last token.
    Eof,
}

/// A single token.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Token {
    /// What this token is.
    pub kind: TokenKind,
    /// The text of the token. For `Text` tokens this is the normalised
    /// content; for structural tokens it is the markup that produced them,
    /// which is empty for synthesised tokens.
    pub text: String,
    /// Where the token came from in the source.
    pub span: Span,
}

impl Token {
    pub(crate) fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Self { kind, text: text.into(), span }
    }
}
