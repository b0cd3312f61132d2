//! The allow-list of XHTML tags that may pass through to rendered output.

/// Tags that are recognised as elements by the lexer and passed through by
/// the sanitizer. Everything else is escaped.
pub(crate) static ALLOWED_TAGS: phf::Set<&'static str> = phf::phf_set! {
    "b", "big", "blockquote", "br", "center", "cite", "code", "dd", "del",
    "div", "dl", "dt", "em", "font", "h1", "h2", "h3", "h4", "h5", "h6",
    "hr", "i", "ins", "li", "ol", "p", "rb", "rp", "rt", "ruby", "s",
    "small", "span", "strike", "strong", "sub", "sup", "table", "td", "th",
    "tr", "tt", "u", "ul", "var",
};
