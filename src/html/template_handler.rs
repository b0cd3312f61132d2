//! Expansion of `{{template}}` inclusions.

/// Expands template inclusions during HTML generation. `parameters` holds
/// the rendered HTML of each positional parameter. The returned markup is
/// inserted verbatim.
pub trait TemplateHandler {
    fn included(&mut self, name: &str, parameters: &[String]) -> String {
        let mut out = format!("{{{{{name}");
        for parameter in parameters {
            out.push('|');
            out.push_str(parameter);
        }
        out.push_str("}}");
        out
    }
}

/// The stock handler, which leaves inclusions unexpanded.
#[derive(Debug, Default)]
pub struct DefaultTemplateHandler;

impl TemplateHandler for DefaultTemplateHandler {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unexpanded_inclusions_round_trip() {
        let mut handler = DefaultTemplateHandler;
        assert_eq!(handler.included("stub", &[]), "{{stub}}");
        assert_eq!(
            handler.included("cite", &["a".to_owned(), "b".to_owned()]),
            "{{cite|a|b}}"
        );
    }
}
