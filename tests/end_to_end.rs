//! Public-API checks over the whole pipeline.

use mediacloth::html::Params;
use mediacloth::token::TokenKind;
use mediacloth::{Error, lexer, parser, sanitizer, signed, wiki_to_html};
use time::macros::datetime;

fn fixed_params() -> Params {
    Params {
        author: "Creator".to_owned(),
        time: datetime!(2000-01-01 01:01:01 UTC),
    }
}

#[test]
fn tokens_are_balanced_and_end_with_eof() {
    let _ = env_logger::try_init();
    let inputs = [
        "plain",
        "'''unterminated",
        "== h\n",
        "[http://example.com cap\nmore",
        "{|\n|cell",
        "{{tpl|p",
        "* item\n** nested\n",
        "<pre>x</pré></pre>",
        "<code>é</codé>",
    ];
    for input in inputs {
        let tokens = lexer::tokenize(input).unwrap();
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));

        let mut depth = 0_isize;
        for token in &tokens {
            use TokenKind::*;
            match token.kind {
                ParaStart | BoldStart | ItalicStart | SectionStart | LinkStart
                | IntLinkStart | UlStart | OlStart | DlStart | LiStart | DtStart | DdStart
                | TableStart | RowStart | CellStart | HeadStart | TagStart | PasteStart
                | TemplateStart | PreStart => depth += 1,
                ParaEnd | BoldEnd | ItalicEnd | SectionEnd | LinkEnd | IntLinkEnd | UlEnd
                | OlEnd | DlEnd | LiEnd | DtEnd | DdEnd | TableEnd | RowEnd | CellEnd
                | HeadEnd | TagEnd | PasteEnd | TemplateEnd | PreEnd => depth -= 1,
                _ => {}
            }
            assert!(depth >= 0, "premature close in {input:?}");
        }
        assert_eq!(depth, 0, "unbalanced stream for {input:?}");
    }
}

#[test]
fn token_text_is_lossless_for_plain_markup() {
    let inputs = [
        "'''bold''' and ''italic''",
        "[[page|caption]] with [http://example.com text]",
        "== heading ==",
        "{{tpl|a|b}}",
    ];
    for input in inputs {
        let tokens = lexer::tokenize(input).unwrap();
        let rebuilt: String = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(rebuilt, input);
    }
}

#[test]
fn pathological_nesting_is_an_error_not_a_crash() {
    let input = format!("{}x", "* ".repeat(64));
    assert!(matches!(
        parser::parse(&input),
        Err(Error::NestingTooDeep(_))
    ));
}

#[test]
fn document_renders_through_the_convenience_entry_point() {
    let html = wiki_to_html("== t ==\n* a\n", fixed_params()).unwrap();
    assert_eq!(
        html,
        "<h2><a name=\"t\"></a> t </h2>\n<ul><li>a\n</li></ul>"
    );
}

#[test]
fn sanitize_and_sign_compose_with_rendering() {
    let raw = "<marquee>hi</marquee> ~~~";
    let clean = sanitizer::sanitize(raw);
    let signed = signed::sign(&clean, &fixed_params()).unwrap();
    assert_eq!(
        signed,
        "&lt;marquee&gt;hi&lt;/marquee&gt; [[User:Creator|Creator]]"
    );
    let html = wiki_to_html(&signed, fixed_params()).unwrap();
    assert_eq!(
        html,
        "<p>&lt;marquee&gt;hi&lt;/marquee&gt; \
         <a href=\"/wiki/User:Creator\">Creator</a></p>"
    );
}
