//! Expansion of `~~~` signatures in wiki source.

use crate::Error;
use crate::ast::{Formatting, Node};
use crate::codemap::Span;
use crate::html::Params;
use crate::parser;
use crate::walker::Walker;

/// Replaces every signature in `input` with its expanded wiki markup and
/// returns the rewritten source. Everything else, including signatures
/// escaped with `<nowiki>`, is left untouched.
pub fn sign(input: &str, params: &Params) -> Result<String, Error> {
    let ast = parser::parse(input)?;
    let mut signatures = Signatures {
        params,
        replacements: Vec::new(),
    };
    match signatures.visit_node(&ast) {
        Ok(()) => {}
        Err(never) => match never {},
    }

    let mut out = String::with_capacity(input.len());
    let mut cursor = 0;
    for (span, expansion) in signatures.replacements {
        out.push_str(&input[cursor..span.start]);
        out.push_str(&expansion);
        cursor = span.end;
    }
    out.push_str(&input[cursor..]);
    Ok(out)
}

/// Collects the source span and expansion of each signature, in document
/// order.
struct Signatures<'a> {
    params: &'a Params,
    replacements: Vec<(Span, String)>,
}

impl<'ast> Walker<'ast, core::convert::Infallible> for Signatures<'_> {
    fn visit_text(
        &mut self,
        node: &'ast Node,
        formatting: Formatting,
    ) -> Result<(), core::convert::Infallible> {
        let expansion = match formatting {
            Formatting::SignatureName => self.params.signature_name(),
            Formatting::SignatureDate => self.params.formatted_time(),
            Formatting::SignatureFull => {
                format!(
                    "{} {}",
                    self.params.signature_name(),
                    self.params.formatted_time()
                )
            }
            _ => return Ok(()),
        };
        self.replacements.push((node.span(), expansion));
        Ok(())
    }
}
