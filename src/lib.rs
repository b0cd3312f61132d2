//! A wikitext engine: a context-sensitive lexer producing a balanced token
//! stream, a stack parser producing a document tree with source spans, and a
//! set of tree walkers for rendering.
//!
//! The usual entry point is [`wiki_to_html`]:
//!
//! ```
//! use mediacloth::html::Params;
//!
//! let html = mediacloth::wiki_to_html("'''hello'''", Params::default()).unwrap();
//! assert_eq!(html, "<p><b>hello</b></p>");
//! ```
//!
//! For custom rendering, [`parser::parse`] returns the tree and
//! [`walker::Walker`] walks it.

pub mod ast;
pub mod codemap;
pub mod html;
pub mod inspect;
pub mod lexer;
pub mod parser;
pub mod sanitizer;
pub mod signed;
mod tags;
pub mod token;
pub mod walker;

/// Errors produced while lexing or rendering.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("markup nesting exceeds the maximum depth of {0}")]
    NestingTooDeep(usize),
    #[error(transparent)]
    Fmt(#[from] core::fmt::Error),
}

/// Converts wikitext to an XHTML fragment using the default link and
/// template handlers.
pub fn wiki_to_html(input: &str, params: html::Params) -> Result<String, Error> {
    let ast = parser::parse(input)?;
    let mut generator = html::HtmlGenerator::new(params);
    Ok(generator.generate(&ast)?.to_owned())
}
