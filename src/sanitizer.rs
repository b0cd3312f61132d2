//! Escaping of disallowed HTML tags in raw wiki source.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::tags::ALLOWED_TAGS;

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(/?)([^\s>]+)([^>]*)>").unwrap());

/// Escapes every tag whose name is not on the allow-list, so that a page
/// can never inject markup the generator would not itself produce. Allowed
/// tags pass through for the lexer to handle.
pub fn sanitize(input: &str) -> Cow<'_, str> {
    TAG.replace_all(input, |caps: &Captures<'_>| {
        let name = caps[2].trim_end_matches('/').to_ascii_lowercase();
        if ALLOWED_TAGS.contains(name.as_str()) {
            caps[0].to_owned()
        } else {
            format!("&lt;{}{}{}&gt;", &caps[1], &caps[2], &caps[3])
        }
    })
}
