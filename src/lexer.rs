//! A hand-written context-sensitive lexer for wikitext.
//!
//! Wikitext cannot be tokenised by a regular scanner: the meaning of most
//! characters depends on where they appear (`|` is a cell separator inside a
//! table, a caption separator inside a link, and plain text everywhere else),
//! and markup left unterminated in the source must still produce a balanced
//! token stream. The lexer therefore keeps an explicit stack of open
//! constructs and derives its scanning mode from the innermost one, emitting
//! zero-width end tokens for anything the source forgot to close.

use crate::Error;
use crate::codemap::Span;
use crate::tags::ALLOWED_TAGS;
use crate::token::{Token, TokenKind};

/// The maximum nesting depth of constructs that re-enter the lexer, such as
/// list items containing further lists.
pub(crate) const MAX_DEPTH: usize = 16;

/// Converts wikitext into a flat stream of balanced tokens ending with
/// [`TokenKind::Eof`].
pub fn tokenize(input: &str) -> Result<Vec<Token>, Error> {
    Lexer::new(input, 0, 0).tokenize()
}

/// An open construct on the lexer stack.
#[derive(Clone, Debug, Eq, PartialEq)]
enum Context {
    Paragraph,
    Bold,
    Italic,
    Section,
    ExternalLink,
    InternalLink { seen_pipe: bool, seen_colon: bool },
    Element { name: String },
    Template,
    Table { row: bool, cell: Option<bool> },
    IndentPre,
}

/// The scanning mode, derived from the innermost mode-setting context.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Mode {
    Default,
    Heading,
    ExternalLink,
    InternalLink,
    Template,
    Table,
    IndentPre,
}

/// The result of scanning a `<...>` tag without consuming it.
struct TagScan {
    closing: bool,
    name: String,
    self_closing: bool,
    /// Name span and optional value span of each attribute.
    attrs: Vec<(Span, Option<Span>)>,
    /// The position just past the closing `>`.
    end: usize,
}

struct Lexer<'src> {
    src: &'src str,
    cursor: usize,
    /// Offset added to every emitted span, used when re-lexing a slice of a
    /// larger source.
    base: usize,
    depth: usize,
    tokens: Vec<Token>,
    /// Text accumulated since the last structural token.
    pending: String,
    pending_start: usize,
    contexts: Vec<Context>,
}

impl<'src> Lexer<'src> {
    fn new(src: &'src str, base: usize, depth: usize) -> Self {
        Self {
            src,
            cursor: 0,
            base,
            depth,
            tokens: Vec::new(),
            pending: String::new(),
            pending_start: 0,
            contexts: Vec::new(),
        }
    }

    fn tokenize(mut self) -> Result<Vec<Token>, Error> {
        if self.depth > MAX_DEPTH {
            return Err(Error::NestingTooDeep(MAX_DEPTH));
        }

        while self.cursor < self.src.len() {
            match self.mode() {
                Mode::Default => self.lex_default()?,
                Mode::Heading => self.lex_heading()?,
                Mode::ExternalLink => self.lex_external_link()?,
                Mode::InternalLink => self.lex_internal_link()?,
                Mode::Template => self.lex_template(),
                Mode::Table => self.lex_table()?,
                Mode::IndentPre => self.lex_indent_pre()?,
            }
        }

        self.finish();
        Ok(self.tokens)
    }

    // Stream plumbing

    fn token(&mut self, kind: TokenKind, text: impl Into<String>, start: usize, end: usize) {
        self.flush_pending(start);
        self.tokens
            .push(Token::new(kind, text, Span::new(self.base + start, self.base + end)));
    }

    fn flush_pending(&mut self, end: usize) {
        if self.pending.is_empty() {
            return;
        }
        let text = core::mem::take(&mut self.pending);
        let span = Span::new(self.base + self.pending_start, self.base + end);
        self.tokens.push(Token::new(TokenKind::Text, text, span));
    }

    fn pending_mark(&mut self) {
        if self.pending.is_empty() {
            self.pending_start = self.cursor;
        }
    }

    fn text_char(&mut self) {
        self.ensure_paragraph();
        self.pending_mark();
        let c = self.rest().chars().next().unwrap();
        self.pending.push(c);
        self.cursor += c.len_utf8();
    }

    // Context plumbing

    fn mode(&self) -> Mode {
        for ctx in self.contexts.iter().rev() {
            match ctx {
                Context::Section => return Mode::Heading,
                Context::ExternalLink => return Mode::ExternalLink,
                Context::InternalLink { .. } => return Mode::InternalLink,
                Context::Template => return Mode::Template,
                Context::Table { .. } => return Mode::Table,
                Context::IndentPre => return Mode::IndentPre,
                _ => {}
            }
        }
        Mode::Default
    }

    /// Whether the current position is in top-level paragraph flow, where
    /// block constructs are recognised and paragraphs are managed.
    fn in_paragraph_flow(&self) -> bool {
        self.contexts
            .iter()
            .all(|c| matches!(c, Context::Paragraph | Context::Bold | Context::Italic))
    }

    /// Opens a paragraph if text is about to appear at the top level.
    fn ensure_paragraph(&mut self) {
        if self.contexts.is_empty() {
            debug_assert!(self.pending.is_empty());
            self.token(TokenKind::ParaStart, "", self.cursor, self.cursor);
            self.contexts.push(Context::Paragraph);
        }
    }

    /// Emits the end token for a context popped off the stack. `pos` is used
    /// for the zero-width span of the synthesised token.
    fn close_context(&mut self, ctx: Context, pos: usize) {
        use TokenKind::*;
        match ctx {
            Context::Paragraph => {
                self.flush_pending(pos);
                if self.tokens.last().is_some_and(|t| t.kind == ParaStart) {
                    // nothing ended up inside the paragraph
                    self.tokens.pop();
                } else {
                    self.token(ParaEnd, "", pos, pos);
                }
            }
            Context::Bold => self.token(BoldEnd, "", pos, pos),
            Context::Italic => self.token(ItalicEnd, "", pos, pos),
            Context::Section => self.token(SectionEnd, "", pos, pos),
            Context::ExternalLink => self.token(LinkEnd, "", pos, pos),
            Context::InternalLink { .. } => self.token(IntLinkEnd, "", pos, pos),
            Context::Element { name } => self.token(TagEnd, name, pos, pos),
            Context::Template => self.token(TemplateEnd, "", pos, pos),
            Context::Table { row, cell } => {
                if let Some(heading) = cell {
                    self.token(if heading { HeadEnd } else { CellEnd }, "", pos, pos);
                }
                if row {
                    self.token(RowEnd, "", pos, pos);
                }
                self.token(TableEnd, "", pos, pos);
            }
            Context::IndentPre => self.token(PreEnd, "", pos, pos),
        }
    }

    /// Force-closes every context above the one at `index`.
    fn close_above(&mut self, index: usize) {
        while self.contexts.len() > index + 1 {
            let ctx = self.contexts.pop().unwrap();
            self.close_context(ctx, self.cursor);
        }
    }

    /// Ends the current paragraph, if any, ahead of a block construct. A
    /// pending lone newline is furniture between blocks and is dropped.
    fn break_blocks(&mut self) {
        if self.pending == "\n" || self.pending == "\r\n" {
            self.pending.clear();
        }
        while matches!(
            self.contexts.last(),
            Some(Context::Paragraph | Context::Bold | Context::Italic)
        ) {
            let ctx = self.contexts.pop().unwrap();
            self.close_context(ctx, self.cursor);
        }
    }

    fn finish(&mut self) {
        if self.pending == "\n" || self.pending == "\r\n" {
            self.pending.clear();
        }
        self.flush_pending(self.cursor);
        while let Some(ctx) = self.contexts.pop() {
            self.close_context(ctx, self.src.len());
        }
        let end = self.src.len();
        self.token(TokenKind::Eof, "", end, end);
    }

    // Scanning helpers

    fn byte(&self) -> u8 {
        self.src.as_bytes()[self.cursor]
    }

    fn rest(&self) -> &'src str {
        &self.src[self.cursor..]
    }

    fn at_sol(&self) -> bool {
        self.cursor == 0 || self.src.as_bytes()[self.cursor - 1] == b'\n'
    }

    /// The end of the current line, excluding the newline.
    fn line_end(&self) -> usize {
        memchr::memchr(b'\n', &self.src.as_bytes()[self.cursor..])
            .map_or(self.src.len(), |i| self.cursor + i)
    }

    // Default mode

    fn lex_default(&mut self) -> Result<(), Error> {
        if self.at_sol() && self.in_paragraph_flow() && self.lex_line_start()? {
            return Ok(());
        }

        match self.byte() {
            b'\n' | b'\r' => self.lex_newline(),
            b'{' if self.rest().starts_with("{{") => self.open_template(),
            b'_' if self.lex_keyword() => {}
            _ => {
                if !self.lex_inline()? {
                    self.text_char();
                }
            }
        }
        Ok(())
    }

    /// Block constructs recognised at the start of a line. Returns false if
    /// the line turned out to be ordinary flow.
    fn lex_line_start(&mut self) -> Result<bool, Error> {
        match self.byte() {
            b'=' => self.lex_heading_line(),
            b'*' | b'#' | b';' | b':' => {
                self.lex_list()?;
                Ok(true)
            }
            b'-' if self.dash_run() >= 4 => {
                self.lex_hline();
                Ok(true)
            }
            b'{' if self.rest().starts_with("{|") => {
                self.open_table();
                Ok(true)
            }
            b' ' if self.indent_pre_line() => {
                self.open_indent_pre();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn lex_newline(&mut self) {
        let rest = self.rest();
        let brk = if rest.starts_with("\r\n\r\n") {
            4
        } else if rest.starts_with("\n\n") {
            2
        } else {
            0
        };
        // A blank line ends the paragraph, but only when no inline construct
        // is still open.
        if brk != 0 && matches!(self.contexts.last(), Some(Context::Paragraph)) {
            self.pending_mark();
            self.pending.push_str(&rest[..brk]);
            self.cursor += brk;
            self.contexts.pop();
            self.flush_pending(self.cursor);
            self.token(TokenKind::ParaEnd, "", self.cursor, self.cursor);
            return;
        }
        self.text_char();
    }

    /// Inline constructs shared by every mode that allows markup. Returns
    /// false if the current character is ordinary text.
    fn lex_inline(&mut self) -> Result<bool, Error> {
        match self.byte() {
            b'\'' if self.rest().starts_with("''") => {
                self.lex_quotes();
                Ok(true)
            }
            b'[' => self.lex_bracket(),
            b'h' => Ok(self.lex_bare_url()),
            b'<' => self.lex_angle(),
            b'&' => Ok(self.lex_entity()),
            b'~' if self.rest().starts_with("~~~") => {
                self.lex_signature();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    // Bold and italics

    /// Positions of open bold and italic contexts within the innermost run
    /// of inline contexts.
    fn open_quotes(&self) -> (Option<usize>, Option<usize>) {
        let mut bold = None;
        let mut italic = None;
        for (i, ctx) in self.contexts.iter().enumerate().rev() {
            match ctx {
                Context::Bold => bold = Some(i),
                Context::Italic => italic = Some(i),
                _ => break,
            }
        }
        (bold, italic)
    }

    fn lex_quotes(&mut self) {
        use TokenKind::*;
        let start = self.cursor;
        let run = self.rest().bytes().take_while(|&b| b == b'\'').count();
        debug_assert!(run >= 2);
        self.ensure_paragraph();
        let (bold, italic) = self.open_quotes();

        if run >= 5 {
            self.cursor += 5;
            match (bold, italic) {
                (None, None) => {
                    self.token(ItalicStart, "''", start, start + 2);
                    self.contexts.push(Context::Italic);
                    self.token(BoldStart, "'''", start + 2, start + 5);
                    self.contexts.push(Context::Bold);
                }
                (Some(_), Some(_)) => {
                    // both are open and are the top two contexts; the inner
                    // one closes first
                    match self.contexts.pop().unwrap() {
                        Context::Bold => {
                            self.contexts.pop();
                            self.token(BoldEnd, "'''", start, start + 3);
                            self.token(ItalicEnd, "''", start + 3, start + 5);
                        }
                        _ => {
                            self.contexts.pop();
                            self.token(ItalicEnd, "''", start, start + 2);
                            self.token(BoldEnd, "'''", start + 2, start + 5);
                        }
                    }
                }
                (Some(_), None) => {
                    self.contexts.pop();
                    self.token(BoldEnd, "'''", start, start + 3);
                    self.token(ItalicStart, "''", start + 3, start + 5);
                    self.contexts.push(Context::Italic);
                }
                (None, Some(_)) => {
                    self.contexts.pop();
                    self.token(ItalicEnd, "''", start, start + 2);
                    self.token(BoldStart, "'''", start + 2, start + 5);
                    self.contexts.push(Context::Bold);
                }
            }
        } else if run >= 3 {
            self.cursor += 3;
            if let Some(b) = bold {
                // italics opened after the bold close with it
                if italic.is_some_and(|i| i > b) {
                    self.contexts.pop();
                    self.token(ItalicEnd, "", start, start);
                }
                self.contexts.pop();
                self.token(BoldEnd, "'''", start, start + 3);
            } else {
                self.token(BoldStart, "'''", start, start + 3);
                self.contexts.push(Context::Bold);
            }
        } else {
            self.cursor += 2;
            if let Some(i) = italic {
                if bold.is_some_and(|b| b > i) {
                    self.contexts.pop();
                    self.token(BoldEnd, "", start, start);
                }
                self.contexts.pop();
                self.token(ItalicEnd, "''", start, start + 2);
            } else {
                self.token(ItalicStart, "''", start, start + 2);
                self.contexts.push(Context::Italic);
            }
        }
    }

    // Links

    fn in_link(&self) -> bool {
        self.contexts
            .iter()
            .any(|c| matches!(c, Context::ExternalLink | Context::InternalLink { .. }))
    }

    fn lex_bracket(&mut self) -> Result<bool, Error> {
        let rest = self.rest();
        if rest.starts_with("[[") {
            if self.in_link() || rest[2..].starts_with("]]") {
                return Ok(false);
            }
            self.ensure_paragraph();
            let start = self.cursor;
            self.cursor += 2;
            self.token(TokenKind::IntLinkStart, "[[", start, start + 2);
            self.contexts.push(Context::InternalLink {
                seen_pipe: false,
                seen_colon: false,
            });
            Ok(true)
        } else if !self.in_link()
            && (rest[1..].starts_with("http://") || rest[1..].starts_with("https://"))
        {
            self.ensure_paragraph();
            let start = self.cursor;
            self.cursor += 1;
            self.token(TokenKind::LinkStart, "[", start, start + 1);
            self.contexts.push(Context::ExternalLink);
            self.lex_url();
            if self.cursor < self.src.len() && self.byte() == b' ' {
                let sep = self.cursor;
                self.cursor += 1;
                self.token(TokenKind::LinkSep, " ", sep, sep + 1);
            }
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Emits the URL at the cursor as a single text token.
    fn lex_url(&mut self) {
        let start = self.cursor;
        let end = start
            + self
                .rest()
                .bytes()
                .take_while(|b| !matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b']'))
                .count();
        self.cursor = end;
        self.token(TokenKind::Text, &self.src[start..end], start, end);
    }

    fn lex_bare_url(&mut self) -> bool {
        let rest = self.rest();
        if self.in_link() || !(rest.starts_with("http://") || rest.starts_with("https://")) {
            return false;
        }
        self.ensure_paragraph();
        let start = self.cursor;
        self.token(TokenKind::LinkStart, "", start, start);
        self.lex_url();
        self.token(TokenKind::LinkEnd, "", self.cursor, self.cursor);
        true
    }

    fn lex_external_link(&mut self) -> Result<(), Error> {
        let idx = self
            .contexts
            .iter()
            .rposition(|c| matches!(c, Context::ExternalLink))
            .unwrap();
        match self.byte() {
            b']' => {
                self.close_above(idx);
                self.contexts.pop();
                let start = self.cursor;
                self.cursor += 1;
                self.token(TokenKind::LinkEnd, "]", start, start + 1);
            }
            b'\n' | b'\r' => {
                // links do not span lines; the newline is re-lexed outside
                self.close_above(idx);
                self.contexts.pop();
                self.token(TokenKind::LinkEnd, "", self.cursor, self.cursor);
            }
            _ => {
                if !self.lex_inline()? {
                    self.text_char();
                }
            }
        }
        Ok(())
    }

    fn lex_internal_link(&mut self) -> Result<(), Error> {
        let idx = self
            .contexts
            .iter()
            .rposition(|c| matches!(c, Context::InternalLink { .. }))
            .unwrap();
        let rest = self.rest();
        if rest.starts_with("]]") {
            self.close_above(idx);
            self.contexts.pop();
            let start = self.cursor;
            self.cursor += 2;
            self.token(TokenKind::IntLinkEnd, "]]", start, start + 2);
            return Ok(());
        }
        match self.byte() {
            b'|' => {
                self.close_above(idx);
                if let Some(Context::InternalLink { seen_pipe, .. }) = self.contexts.last_mut() {
                    *seen_pipe = true;
                }
                let start = self.cursor;
                self.cursor += 1;
                self.token(TokenKind::IntLinkSep, "|", start, start + 1);
            }
            b':' => {
                // the first colon inside a non-empty target marks a resource
                // prefix
                let is_resource = matches!(
                    self.contexts.last(),
                    Some(Context::InternalLink {
                        seen_pipe: false,
                        seen_colon: false,
                    })
                ) && !self.pending.is_empty();
                if is_resource {
                    if let Some(Context::InternalLink { seen_colon, .. }) =
                        self.contexts.last_mut()
                    {
                        *seen_colon = true;
                    }
                    let start = self.cursor;
                    self.cursor += 1;
                    self.token(TokenKind::ResourceSep, ":", start, start + 1);
                } else {
                    self.text_char();
                }
            }
            b'\n' | b'\r' => {
                self.close_above(idx);
                self.contexts.pop();
                self.token(TokenKind::IntLinkEnd, "", self.cursor, self.cursor);
            }
            _ => {
                if !self.lex_inline()? {
                    self.text_char();
                }
            }
        }
        Ok(())
    }

    // Templates

    fn open_template(&mut self) {
        self.ensure_paragraph();
        let start = self.cursor;
        self.cursor += 2;
        self.token(TokenKind::TemplateStart, "{{", start, start + 2);
        self.contexts.push(Context::Template);
    }

    fn lex_template(&mut self) {
        let rest = self.rest();
        if rest.starts_with("}}") {
            let idx = self
                .contexts
                .iter()
                .rposition(|c| matches!(c, Context::Template))
                .unwrap();
            self.close_above(idx);
            self.contexts.pop();
            let start = self.cursor;
            self.cursor += 2;
            self.token(TokenKind::TemplateEnd, "}}", start, start + 2);
        } else if rest.starts_with("{{") {
            self.open_template();
        } else if self.byte() == b'|' {
            let start = self.cursor;
            self.cursor += 1;
            self.token(TokenKind::IntLinkSep, "|", start, start + 1);
        } else {
            // template contents are raw text
            self.pending_mark();
            let c = rest.chars().next().unwrap();
            self.pending.push(c);
            self.cursor += c.len_utf8();
        }
    }

    // Headings

    fn lex_heading_line(&mut self) -> Result<bool, Error> {
        let start = self.cursor;
        let mut content_end = self.line_end();
        if content_end > start && self.src.as_bytes()[content_end - 1] == b'\r' {
            content_end -= 1;
        }
        let line = &self.src[start..content_end];

        if line.bytes().all(|b| b == b'=') {
            // a line of nothing but `=` splits into delimiters around a
            // leftover text middle
            let n = line.len();
            let k = (n - 1) / 2;
            if k == 0 {
                return Ok(false);
            }
            self.break_blocks();
            self.token(TokenKind::SectionStart, &line[..k], start, start + k);
            self.token(TokenKind::Text, &line[k..n - k], start + k, start + n - k);
            self.token(TokenKind::SectionEnd, &line[n - k..], start + n - k, start + n);
            self.cursor = content_end;
            return Ok(true);
        }

        self.break_blocks();
        let run = line.bytes().take_while(|&b| b == b'=').count();
        let k = run.min(6);
        self.token(TokenKind::SectionStart, &line[..k], start, start + k);
        self.cursor += k;
        self.contexts.push(Context::Section);
        Ok(true)
    }

    fn lex_heading(&mut self) -> Result<(), Error> {
        let idx = self
            .contexts
            .iter()
            .rposition(|c| matches!(c, Context::Section))
            .unwrap();
        match self.byte() {
            b'=' => {
                self.close_above(idx);
                self.contexts.pop();
                let start = self.cursor;
                let run = self.rest().bytes().take_while(|&b| b == b'=').count();
                self.cursor += run;
                self.token(
                    TokenKind::SectionEnd,
                    &self.src[start..start + run],
                    start,
                    start + run,
                );
            }
            b'\n' | b'\r' => {
                // unterminated heading; the newline is re-lexed outside
                self.close_above(idx);
                self.contexts.pop();
                self.token(TokenKind::SectionEnd, "", self.cursor, self.cursor);
            }
            _ => {
                if !self.lex_inline()? {
                    self.text_char();
                }
            }
        }
        Ok(())
    }

    // Horizontal rules and keywords

    fn dash_run(&self) -> usize {
        self.rest().bytes().take_while(|&b| b == b'-').count()
    }

    fn lex_hline(&mut self) {
        self.break_blocks();
        let start = self.cursor;
        let run = self.dash_run();
        self.cursor += run;
        self.token(TokenKind::Hline, &self.src[start..start + run], start, start + run);
    }

    fn lex_keyword(&mut self) -> bool {
        if !self.in_paragraph_flow() {
            return false;
        }
        let rest = self.rest();
        let len = if rest.starts_with("__TOC__") {
            7
        } else if rest.starts_with("__NOTOC__") {
            9
        } else {
            return false;
        };
        self.break_blocks();
        let start = self.cursor;
        self.cursor += len;
        self.token(TokenKind::Keyword, &rest[..len], start, start + len);
        true
    }

    // Character entities and signatures

    fn lex_entity(&mut self) -> bool {
        let bytes = self.src.as_bytes();
        let start = self.cursor;
        let mut i = start + 1;
        while i < bytes.len()
            && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_' || bytes[i] == b'-')
        {
            i += 1;
        }
        if i == start + 1 || bytes.get(i) != Some(&b';') {
            return false;
        }
        self.ensure_paragraph();
        self.token(TokenKind::CharEnt, &self.src[start + 1..i], start, i + 1);
        self.cursor = i + 1;
        true
    }

    fn lex_signature(&mut self) {
        self.ensure_paragraph();
        let start = self.cursor;
        let run = self.rest().bytes().take_while(|&b| b == b'~').count();
        let (kind, n) = if run >= 5 {
            (TokenKind::SignatureDate, 5)
        } else if run == 4 {
            (TokenKind::SignatureFull, 4)
        } else {
            (TokenKind::SignatureName, 3)
        };
        self.cursor += n;
        self.token(kind, &self.src[start..start + n], start, start + n);
    }

    // Lists

    fn lex_list(&mut self) -> Result<(), Error> {
        self.break_blocks();
        let bytes = self.src.as_bytes();
        let mut open: Vec<u8> = Vec::new();

        loop {
            let line_start = self.cursor;
            let mut prefix_end = self.cursor;
            while prefix_end < bytes.len()
                && matches!(bytes[prefix_end], b'*' | b'#' | b';' | b':')
            {
                prefix_end += 1;
            }
            let prefix = &bytes[line_start..prefix_end];

            // how many levels of the previous line this one continues
            let mut common = 0;
            while common < open.len() && common < prefix.len() {
                let prev = open[common];
                let cur = prefix[common];
                // a new `;` term always starts a fresh list, while `:` may
                // continue a term’s list as its definition
                let compatible =
                    (prev == cur && cur != b';') || ((prev == b';' || prev == b':') && cur == b':');
                if !compatible {
                    break;
                }
                common += 1;
            }

            while open.len() > common {
                let sym = open.pop().unwrap();
                self.close_item(sym, line_start);
                self.close_list(sym, line_start);
            }

            if !open.is_empty() && prefix.len() == open.len() {
                // next item of the innermost list
                let prev = *open.last().unwrap();
                let cur = prefix[open.len() - 1];
                self.close_item(prev, line_start);
                *open.last_mut().unwrap() = cur;
                self.open_item(cur, line_start);
            }

            for lvl in common..prefix.len() {
                let sym = prefix[lvl];
                self.open_list(sym, line_start);
                self.open_item(sym, line_start);
                open.push(sym);
            }

            // item content is the rest of the line, re-lexed as flow
            self.cursor = prefix_end;
            while self.cursor < bytes.len() && matches!(bytes[self.cursor], b' ' | b'\t') {
                self.cursor += 1;
            }
            let content_start = self.cursor;
            let content_end = memchr::memchr(b'\n', &bytes[content_start..])
                .map_or(self.src.len(), |i| content_start + i + 1);
            if content_end > content_start {
                let tokens = self.sub_lex(
                    &self.src[content_start..content_end],
                    self.base + content_start,
                )?;
                self.flush_pending(content_start);
                self.tokens.extend(tokens);
            }
            self.cursor = content_end;

            if self.cursor >= bytes.len()
                || !matches!(bytes[self.cursor], b'*' | b'#' | b';' | b':')
            {
                break;
            }
        }

        while let Some(sym) = open.pop() {
            self.close_item(sym, self.cursor);
            self.close_list(sym, self.cursor);
        }
        Ok(())
    }

    /// (list start, list end, item start, item end) for a list symbol.
    fn list_kinds(sym: u8) -> (TokenKind, TokenKind, TokenKind, TokenKind) {
        use TokenKind::*;
        match sym {
            b'*' => (UlStart, UlEnd, LiStart, LiEnd),
            b'#' => (OlStart, OlEnd, LiStart, LiEnd),
            b';' => (DlStart, DlEnd, DtStart, DtEnd),
            _ => (DlStart, DlEnd, DdStart, DdEnd),
        }
    }

    fn open_list(&mut self, sym: u8, pos: usize) {
        let (start, ..) = Self::list_kinds(sym);
        self.token(start, "", pos, pos);
    }

    fn close_list(&mut self, sym: u8, pos: usize) {
        let (_, end, ..) = Self::list_kinds(sym);
        self.token(end, "", pos, pos);
    }

    fn open_item(&mut self, sym: u8, pos: usize) {
        let (.., start, _) = Self::list_kinds(sym);
        self.token(start, (sym as char).to_string(), pos, pos);
    }

    fn close_item(&mut self, sym: u8, pos: usize) {
        let (.., end) = Self::list_kinds(sym);
        self.token(end, "", pos, pos);
    }

    /// Re-lexes a slice of the source as its own flow, dropping the inner
    /// paragraph bookkeeping so the tokens can be spliced into this stream.
    fn sub_lex(&mut self, content: &'src str, base: usize) -> Result<Vec<Token>, Error> {
        log::trace!("sub-lexing {} bytes at {base}", content.len());
        let sub = Lexer::new(content, base, self.depth + 1);
        let mut tokens = sub.tokenize()?;
        debug_assert!(matches!(tokens.last(), Some(t) if t.kind == TokenKind::Eof));
        tokens.pop();
        if tokens.last().is_some_and(|t| t.kind == TokenKind::ParaEnd) {
            tokens.pop();
        }
        if tokens.first().is_some_and(|t| t.kind == TokenKind::ParaStart) {
            tokens.remove(0);
        }
        Ok(tokens)
    }

    // Preformatted text

    /// Whether the line at the cursor is indented and has visible content.
    fn indent_pre_line(&self) -> bool {
        let line = &self.src[self.cursor..self.line_end()];
        line.starts_with(' ') && line.bytes().any(|b| !matches!(b, b' ' | b'\t' | b'\r'))
    }

    fn open_indent_pre(&mut self) {
        self.break_blocks();
        self.token(TokenKind::PreStart, "", self.cursor, self.cursor);
        self.contexts.push(Context::IndentPre);
    }

    fn lex_indent_pre(&mut self) -> Result<(), Error> {
        if self.byte() == b'\n' {
            self.pending_mark();
            self.pending.push('\n');
            self.cursor += 1;
            // the block continues over consecutive indented lines
            if !(self.cursor < self.src.len() && self.byte() == b' ' && self.indent_pre_line()) {
                let idx = self
                    .contexts
                    .iter()
                    .rposition(|c| matches!(c, Context::IndentPre))
                    .unwrap();
                self.close_above(idx);
                self.contexts.pop();
                self.token(TokenKind::PreEnd, "", self.cursor, self.cursor);
            }
            Ok(())
        } else if self.lex_inline()? {
            Ok(())
        } else {
            self.text_char();
            Ok(())
        }
    }

    // Tables

    fn open_table(&mut self) {
        self.break_blocks();
        let start = self.cursor;
        self.cursor += 2;
        self.token(TokenKind::TableStart, "{|", start, start + 2);
        self.contexts.push(Context::Table {
            row: false,
            cell: None,
        });
        self.table_line_options();
    }

    /// Emits the rest of the line as an options token and consumes the line
    /// terminator.
    fn table_line_options(&mut self) {
        let start = self.cursor;
        let end = self.line_end();
        let text = self.src[start..end].trim();
        if !text.is_empty() {
            self.token(TokenKind::AttrValue, text, start, end);
        }
        self.cursor = (end + 1).min(self.src.len());
    }

    fn table_cell(&self) -> Option<bool> {
        self.contexts.iter().rev().find_map(|c| match c {
            Context::Table { cell, .. } => Some(*cell),
            _ => None,
        })?
    }

    fn end_cell(&mut self) {
        let heading = match self
            .contexts
            .iter_mut()
            .rev()
            .find(|c| matches!(c, Context::Table { .. }))
        {
            Some(Context::Table { cell, .. }) => cell.take(),
            _ => None,
        };
        if let Some(heading) = heading {
            let kind = if heading {
                TokenKind::HeadEnd
            } else {
                TokenKind::CellEnd
            };
            self.token(kind, "", self.cursor, self.cursor);
        }
    }

    fn end_row(&mut self) {
        let was_open = match self
            .contexts
            .iter_mut()
            .rev()
            .find(|c| matches!(c, Context::Table { .. }))
        {
            Some(Context::Table { row, .. }) => core::mem::replace(row, false),
            _ => false,
        };
        if was_open {
            self.token(TokenKind::RowEnd, "", self.cursor, self.cursor);
        }
    }

    /// Opens an implicit row for a cell that appears before any `|-`.
    fn begin_row(&mut self) {
        let needed = match self
            .contexts
            .iter_mut()
            .rev()
            .find(|c| matches!(c, Context::Table { .. }))
        {
            Some(Context::Table { row, .. }) => !core::mem::replace(row, true),
            _ => false,
        };
        if needed {
            self.token(TokenKind::RowStart, "", self.cursor, self.cursor);
        }
    }

    fn begin_cell(&mut self, heading: bool, width: usize) {
        self.begin_row();
        let start = self.cursor;
        self.cursor += width;
        let kind = if heading {
            TokenKind::HeadStart
        } else {
            TokenKind::CellStart
        };
        self.token(kind, &self.src[start..start + width], start, start + width);
        if let Some(Context::Table { cell, .. }) = self
            .contexts
            .iter_mut()
            .rev()
            .find(|c| matches!(c, Context::Table { .. }))
        {
            *cell = Some(heading);
        }
        self.cell_attributes();
    }

    /// A single `|` on the cell’s first line with `=` before it separates
    /// cell attributes from content.
    fn cell_attributes(&mut self) {
        let line = &self.src[self.cursor..self.line_end()];
        let Some(i) = line.find('|') else { return };
        if line.as_bytes().get(i + 1) == Some(&b'|') {
            return;
        }
        let seg = &line[..i];
        if seg.contains('=') && !seg.contains('[') && !seg.contains('{') {
            let start = self.cursor;
            self.token(TokenKind::AttrValue, seg.trim(), start, start + i + 1);
            self.cursor += i + 1;
        }
    }

    fn lex_table(&mut self) -> Result<(), Error> {
        let idx = self
            .contexts
            .iter()
            .rposition(|c| matches!(c, Context::Table { .. }))
            .unwrap();

        if self.at_sol() {
            let rest = self.rest();
            if rest.starts_with("|}") {
                self.close_above(idx);
                self.end_cell();
                self.end_row();
                self.contexts.pop();
                let start = self.cursor;
                self.cursor += 2;
                self.token(TokenKind::TableEnd, "|}", start, start + 2);
                return Ok(());
            }
            if rest.starts_with("|-") {
                self.close_above(idx);
                self.end_cell();
                self.end_row();
                let start = self.cursor;
                let run = 1 + self.src[start + 1..]
                    .bytes()
                    .take_while(|&b| b == b'-')
                    .count();
                self.cursor += run;
                self.token(
                    TokenKind::RowStart,
                    &self.src[start..start + run],
                    start,
                    start + run,
                );
                if let Some(Context::Table { row, .. }) = self
                    .contexts
                    .iter_mut()
                    .rev()
                    .find(|c| matches!(c, Context::Table { .. }))
                {
                    *row = true;
                }
                self.table_line_options();
                return Ok(());
            }
            if self.byte() == b'|' || self.byte() == b'!' {
                let heading = self.byte() == b'!';
                let width = if rest.starts_with("||") || rest.starts_with("!!") {
                    2
                } else {
                    1
                };
                self.close_above(idx);
                self.end_cell();
                self.begin_cell(heading, width);
                return Ok(());
            }
        }

        let rest = self.rest();
        if rest.starts_with("||") && self.table_cell() == Some(false) {
            self.close_above(idx);
            self.end_cell();
            self.begin_cell(false, 2);
        } else if rest.starts_with("!!") && self.table_cell() == Some(true) {
            self.close_above(idx);
            self.end_cell();
            self.begin_cell(true, 2);
        } else if !self.lex_inline()? {
            self.text_char();
        }
        Ok(())
    }

    // Tags

    /// Scans a `<...>` tag at the cursor without consuming it. Returns None
    /// for anything that is not a well-formed tag.
    fn scan_tag(&self) -> Option<TagScan> {
        let bytes = self.src.as_bytes();
        let mut i = self.cursor + 1;
        let closing = bytes.get(i) == Some(&b'/');
        if closing {
            i += 1;
        }
        let name_start = i;
        while i < bytes.len() && bytes[i].is_ascii_alphanumeric() {
            i += 1;
        }
        if i == name_start || !bytes[name_start].is_ascii_alphabetic() {
            return None;
        }
        let name = self.src[name_start..i].to_ascii_lowercase();

        let mut attrs = Vec::new();
        let mut self_closing = false;
        loop {
            while i < bytes.len() && matches!(bytes[i], b' ' | b'\t') {
                i += 1;
            }
            match bytes.get(i) {
                None => return None,
                Some(b'>') => {
                    i += 1;
                    break;
                }
                Some(b'/') if bytes.get(i + 1) == Some(&b'>') => {
                    self_closing = true;
                    i += 2;
                    break;
                }
                Some(&b) if b.is_ascii_alphabetic() && !closing => {
                    let attr_start = i;
                    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'-')
                    {
                        i += 1;
                    }
                    let name_span = Span::new(attr_start, i);
                    let mut value = None;
                    if bytes.get(i) == Some(&b'=') {
                        i += 1;
                        match bytes.get(i) {
                            Some(&q @ (b'\'' | b'"')) => {
                                i += 1;
                                let value_start = i;
                                while i < bytes.len() && bytes[i] != q && bytes[i] != b'\n' {
                                    i += 1;
                                }
                                if bytes.get(i) != Some(&q) {
                                    return None;
                                }
                                value = Some(Span::new(value_start, i));
                                i += 1;
                            }
                            _ => {
                                let value_start = i;
                                while i < bytes.len()
                                    && !matches!(bytes[i], b' ' | b'\t' | b'>' | b'/' | b'\n')
                                {
                                    i += 1;
                                }
                                if i == value_start {
                                    return None;
                                }
                                value = Some(Span::new(value_start, i));
                            }
                        }
                    }
                    attrs.push((name_span, value));
                }
                _ => return None,
            }
        }

        Some(TagScan {
            closing,
            name,
            self_closing,
            attrs,
            end: i,
        })
    }

    /// Finds the matching close tag for a raw-text element. Returns the raw
    /// content, the close tag start, and the position after it. Unterminated
    /// elements run to the end of input.
    fn raw_content(&self, name: &str) -> (&'src str, usize, usize) {
        let bytes = self.src.as_bytes();
        let mut i = self.cursor;
        while let Some(off) = memchr::memchr(b'<', &bytes[i..]) {
            let at = i + off;
            let close_end = at + 2 + name.len() + 1;
            if close_end <= bytes.len()
                && bytes[at + 1] == b'/'
                && bytes[at + 2..close_end - 1].eq_ignore_ascii_case(name.as_bytes())
                && bytes[close_end - 1] == b'>'
            {
                return (&self.src[self.cursor..at], at, close_end);
            }
            i = at + 1;
        }
        (&self.src[self.cursor..], self.src.len(), self.src.len())
    }

    fn lex_angle(&mut self) -> Result<bool, Error> {
        let Some(tag) = self.scan_tag() else {
            return Ok(false);
        };
        let start = self.cursor;

        if tag.closing {
            let Some(idx) = self
                .contexts
                .iter()
                .rposition(|c| matches!(c, Context::Element { name } if *name == tag.name))
            else {
                return Ok(false);
            };
            self.close_above(idx);
            self.contexts.pop();
            self.cursor = tag.end;
            self.token(TokenKind::TagEnd, tag.name, start, tag.end);
            return Ok(true);
        }

        match tag.name.as_str() {
            // nowiki suppresses markup; its content joins the surrounding
            // text run
            "nowiki" => {
                self.ensure_paragraph();
                self.pending_mark();
                self.cursor = tag.end;
                if !tag.self_closing {
                    let (content, _, after) = self.raw_content("nowiki");
                    self.pending.push_str(content);
                    self.cursor = after;
                }
                Ok(true)
            }
            "pre" | "paste" if !tag.self_closing => {
                if self.in_paragraph_flow() {
                    self.break_blocks();
                }
                let (start_kind, end_kind) = if tag.name == "pre" {
                    (TokenKind::PreStart, TokenKind::PreEnd)
                } else {
                    (TokenKind::PasteStart, TokenKind::PasteEnd)
                };
                self.token(start_kind, &self.src[start..tag.end], start, tag.end);
                self.cursor = tag.end;
                let (content, close_start, after) = self.raw_content(&tag.name);
                if !content.is_empty() {
                    self.token(TokenKind::Text, content, tag.end, close_start);
                }
                self.token(
                    end_kind,
                    &self.src[close_start..after],
                    close_start,
                    after,
                );
                self.cursor = after;
                Ok(true)
            }
            // inline raw-text elements
            "code" | "math" if !tag.self_closing => {
                self.ensure_paragraph();
                self.token(TokenKind::TagStart, tag.name.clone(), start, tag.end);
                self.cursor = tag.end;
                let (content, close_start, after) = self.raw_content(&tag.name);
                if !content.is_empty() {
                    self.token(TokenKind::Text, content, tag.end, close_start);
                }
                self.token(TokenKind::TagEnd, tag.name, close_start, after);
                self.cursor = after;
                Ok(true)
            }
            name if ALLOWED_TAGS.contains(name) => {
                self.ensure_paragraph();
                self.token(TokenKind::TagStart, tag.name.clone(), start, tag.end);
                for (name_span, value) in &tag.attrs {
                    self.token(
                        TokenKind::AttrName,
                        &self.src[name_span.into_range()],
                        name_span.start,
                        name_span.end,
                    );
                    if let Some(value) = value {
                        self.token(
                            TokenKind::AttrValue,
                            &self.src[value.into_range()],
                            value.start,
                            value.end,
                        );
                    }
                }
                self.cursor = tag.end;
                if tag.self_closing {
                    self.token(TokenKind::TagEnd, tag.name, tag.end, tag.end);
                } else {
                    self.contexts.push(Context::Element { name: tag.name });
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TokenKind::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).unwrap().iter().map(|t| t.kind).collect()
    }

    #[test]
    fn plain_paragraph() {
        let tokens = tokenize("text").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::new(ParaStart, "", Span::new(0, 0)),
                Token::new(Text, "text", Span::new(0, 4)),
                Token::new(ParaEnd, "", Span::new(4, 4)),
                Token::new(Eof, "", Span::new(4, 4)),
            ]
        );
    }

    #[test]
    fn blank_line_splits_paragraphs() {
        let tokens = tokenize("one\n\ntwo").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::new(ParaStart, "", Span::new(0, 0)),
                Token::new(Text, "one\n\n", Span::new(0, 5)),
                Token::new(ParaEnd, "", Span::new(5, 5)),
                Token::new(ParaStart, "", Span::new(5, 5)),
                Token::new(Text, "two", Span::new(5, 8)),
                Token::new(ParaEnd, "", Span::new(8, 8)),
                Token::new(Eof, "", Span::new(8, 8)),
            ]
        );
    }

    #[test]
    fn unterminated_bold_is_balanced() {
        assert_eq!(
            kinds("'''b"),
            vec![ParaStart, BoldStart, Text, BoldEnd, ParaEnd, Eof]
        );
    }

    #[test]
    fn blank_line_inside_italics_does_not_split() {
        assert_eq!(
            kinds("''italic\n\n"),
            vec![ParaStart, ItalicStart, Text, ItalicEnd, ParaEnd, Eof]
        );
    }

    #[test]
    fn heading() {
        let tokens = tokenize("== h ==\n").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::new(SectionStart, "==", Span::new(0, 2)),
                Token::new(Text, " h ", Span::new(2, 5)),
                Token::new(SectionEnd, "==", Span::new(5, 7)),
                Token::new(Eof, "", Span::new(8, 8)),
            ]
        );
    }

    #[test]
    fn equals_only_line_splits_into_delimiters() {
        let tokens = tokenize("====").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::new(SectionStart, "=", Span::new(0, 1)),
                Token::new(Text, "==", Span::new(1, 3)),
                Token::new(SectionEnd, "=", Span::new(3, 4)),
                Token::new(Eof, "", Span::new(4, 4)),
            ]
        );
    }

    #[test]
    fn lone_equals_is_text() {
        assert_eq!(kinds("="), vec![ParaStart, Text, ParaEnd, Eof]);
        assert_eq!(kinds("=="), vec![ParaStart, Text, ParaEnd, Eof]);
    }

    #[test]
    fn bulleted_list() {
        let tokens = tokenize("*a\n").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::new(UlStart, "", Span::new(0, 0)),
                Token::new(LiStart, "*", Span::new(0, 0)),
                Token::new(Text, "a\n", Span::new(1, 3)),
                Token::new(LiEnd, "", Span::new(3, 3)),
                Token::new(UlEnd, "", Span::new(3, 3)),
                Token::new(Eof, "", Span::new(3, 3)),
            ]
        );
    }

    #[test]
    fn consecutive_term_lines_start_fresh_lists() {
        assert_eq!(
            kinds(";a\n;b\n"),
            vec![
                DlStart, DtStart, Text, DtEnd, DlEnd, DlStart, DtStart, Text, DtEnd, DlEnd, Eof
            ]
        );
    }

    #[test]
    fn definition_continues_term_list() {
        assert_eq!(
            kinds(";a\n:b\n"),
            vec![DlStart, DtStart, Text, DtEnd, DdStart, Text, DdEnd, DlEnd, Eof]
        );
    }

    #[test]
    fn nowiki_joins_surrounding_text() {
        let tokens = tokenize("a<nowiki>''b''</nowiki>c").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::new(ParaStart, "", Span::new(0, 0)),
                Token::new(Text, "a''b''c", Span::new(0, 24)),
                Token::new(ParaEnd, "", Span::new(24, 24)),
                Token::new(Eof, "", Span::new(24, 24)),
            ]
        );
    }

    #[test]
    fn multibyte_text_near_a_raw_close_tag() {
        let tokens = tokenize("<pre>x</pré></pre>").unwrap();
        assert_eq!(tokens[1], Token::new(Text, "x</pré>", Span::new(5, 13)));
        assert_eq!(
            kinds("<pre>x</pré></pre>"),
            vec![PreStart, Text, PreEnd, Eof]
        );
    }

    #[test]
    fn bare_url() {
        let tokens = tokenize("http://example.com rocks").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::new(ParaStart, "", Span::new(0, 0)),
                Token::new(LinkStart, "", Span::new(0, 0)),
                Token::new(Text, "http://example.com", Span::new(0, 18)),
                Token::new(LinkEnd, "", Span::new(18, 18)),
                Token::new(Text, " rocks", Span::new(18, 24)),
                Token::new(ParaEnd, "", Span::new(24, 24)),
                Token::new(Eof, "", Span::new(24, 24)),
            ]
        );
    }

    #[test]
    fn bracketed_link_with_caption() {
        assert_eq!(
            kinds("[http://example.com caption]"),
            vec![ParaStart, LinkStart, Text, LinkSep, Text, LinkEnd, ParaEnd, Eof]
        );
    }

    #[test]
    fn unterminated_link_closes_at_newline() {
        assert_eq!(
            kinds("[http://example.com cap\ntext"),
            vec![ParaStart, LinkStart, Text, LinkSep, Text, LinkEnd, Text, ParaEnd, Eof]
        );
    }

    #[test]
    fn internal_link_with_resource_prefix() {
        assert_eq!(
            kinds("[[resource:example|option]]"),
            vec![
                ParaStart, IntLinkStart, Text, ResourceSep, Text, IntLinkSep, Text, IntLinkEnd,
                ParaEnd, Eof
            ]
        );
    }

    #[test]
    fn empty_internal_link_is_text() {
        assert_eq!(kinds("[[]]"), vec![ParaStart, Text, ParaEnd, Eof]);
    }

    #[test]
    fn table() {
        assert_eq!(
            kinds("{|\n|a||b\n|}"),
            vec![
                TableStart, RowStart, CellStart, Text, CellEnd, CellStart, Text, CellEnd, RowEnd,
                TableEnd, Eof
            ]
        );
    }

    #[test]
    fn table_row_options() {
        assert_eq!(
            kinds("{| border=1\n|- align='left'\n|a\n|}"),
            vec![
                TableStart, AttrValue, RowStart, AttrValue, CellStart, Text, CellEnd, RowEnd,
                TableEnd, Eof
            ]
        );
    }

    #[test]
    fn signatures() {
        assert_eq!(
            kinds("~~~ ~~~~ ~~~~~"),
            vec![
                ParaStart,
                SignatureName,
                Text,
                SignatureFull,
                Text,
                SignatureDate,
                ParaEnd,
                Eof
            ]
        );
    }

    #[test]
    fn entity() {
        let tokens = tokenize("&amp;").unwrap();
        assert_eq!(tokens[1], Token::new(CharEnt, "amp", Span::new(0, 5)));
    }

    #[test]
    fn ambiguous_ampersand_is_text() {
        assert_eq!(kinds("&amp x;"), vec![ParaStart, Text, ParaEnd, Eof]);
    }

    #[test]
    fn keyword_breaks_paragraph() {
        assert_eq!(
            kinds("text\n__TOC__\ntext"),
            vec![ParaStart, Text, ParaEnd, Keyword, ParaStart, Text, ParaEnd, Eof]
        );
    }

    #[test]
    fn hline() {
        let tokens = tokenize("----\ntext").unwrap();
        assert_eq!(tokens[0], Token::new(Hline, "----", Span::new(0, 4)));
        assert_eq!(tokens[2].text, "\ntext");
    }

    #[test]
    fn indent_pre() {
        assert_eq!(
            kinds(" code\ntext"),
            vec![PreStart, Text, PreEnd, ParaStart, Text, ParaEnd, Eof]
        );
    }

    #[test]
    fn blank_indented_line_is_not_pre() {
        assert_eq!(kinds("  \n"), vec![ParaStart, Text, ParaEnd, Eof]);
    }

    #[test]
    fn element_with_attribute() {
        assert_eq!(
            kinds("<span class='x'>text</span>"),
            vec![ParaStart, TagStart, AttrName, AttrValue, Text, TagEnd, ParaEnd, Eof]
        );
    }

    #[test]
    fn unknown_tag_is_text() {
        assert_eq!(kinds("<script>x</script>"), vec![ParaStart, Text, ParaEnd, Eof]);
    }

    #[test]
    fn template_with_parameters() {
        assert_eq!(
            kinds("{{name|a|b}}"),
            vec![
                ParaStart, TemplateStart, Text, IntLinkSep, Text, IntLinkSep, Text, TemplateEnd,
                ParaEnd, Eof
            ]
        );
    }

    #[test]
    fn nested_template() {
        assert_eq!(
            kinds("{{a|{{b}}}}"),
            vec![
                ParaStart, TemplateStart, Text, IntLinkSep, TemplateStart, Text, TemplateEnd,
                TemplateEnd, ParaEnd, Eof
            ]
        );
    }

    #[test]
    fn nesting_depth_is_bounded() {
        let input = "* ".repeat(64) + "x";
        assert!(matches!(
            tokenize(&input),
            Err(Error::NestingTooDeep(MAX_DEPTH))
        ));
    }

    #[test]
    fn structural_token_texts_reproduce_the_source() {
        for input in [
            "text",
            "'''bold'' mixed",
            "== h ==",
            "====",
            "*a\n*b\n#c\n",
            ";term\n:def\n",
            "----",
            "[http://example.com cap]",
            "[[a|b]]",
            "{{t|p}}",
            "~~~~",
        ] {
            let rebuilt: String = tokenize(input)
                .unwrap()
                .iter()
                .map(|t| t.text.as_str())
                .collect();
            assert_eq!(rebuilt, input, "for {input:?}");
        }
    }
}
