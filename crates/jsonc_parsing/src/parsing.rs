//! Tolerant parser for JSON with JavaScript-style extensions (JSONC).
//!
//! Built on [`jsonc_lexing`]'s scanner, this crate drives the grammar once
//! (in [`visit`]) and offers four ways to consume the walk: materialize a
//! dynamic [`Value`], materialize a concrete syntax [`Tree`] that preserves
//! offsets and comments, push events to a caller-supplied [`Visitor`], or
//! answer "what is at this text offset" via [`get_location`] without a full
//! parse. None of these abort on malformed input — recoverable problems are
//! collected as [`ParseError`]s (or [`Location`] just does its best) and the
//! walk continues at the next token.

mod error;
mod location;
mod node;
mod options;
mod parse;
mod path;
mod strip_comments;
mod value;
mod visit;

pub use crate::error::{print_parse_error_code, ParseError, ParseErrorCode};
pub use crate::location::{get_location, Location, PreviousNode};
pub use crate::node::{
    find_node_at_location, find_node_at_offset, get_node_path, get_node_value, LiteralValue, NodeId, NodeKind,
    NodeRef, Tree,
};
pub use crate::options::ParseOptions;
pub use crate::parse::{parse, parse_tree};
pub use crate::path::{path_matches, PatternSegment, PathSegment};
pub use crate::strip_comments::strip_comments;
pub use crate::value::Value;
pub use crate::visit::{visit, Visitor};

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    // Integration-style tests exercising the public surface end to end,
    // rather than one function at a time.

    /// Strips the common leading indentation from a test fixture written as
    /// an indented multi-line raw string literal.
    fn dedent(text: &str) -> String {
        let mut text = textwrap::dedent(text).trim().to_string();
        text.push('\n');
        text
    }

    #[test]
    fn parses_an_indented_config_style_fixture() {
        let text = dedent(
            r#"
            {
                // top-level settings
                "editor": {
                    "tabSize": 2,
                    "trailingComma": true,
                },
            }
            "#,
        );

        let mut errors = Vec::new();
        let value = parse(&text, &mut errors, ParseOptions { allow_trailing_comma: true, ..ParseOptions::default() });

        assert_eq!(
            value.get("editor").and_then(|e| e.get("tabSize")).and_then(|v| v.as_f64()),
            Some(2.0)
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn comment_in_value_parses_cleanly() {
        let mut errors = Vec::new();
        let value = parse(r#"{ "foo": /*hello*/true }"#, &mut errors, ParseOptions::default());
        assert_eq!(value, Value::Object(vec![("foo".to_string(), Value::Bool(true))]));
        assert!(errors.is_empty());
    }

    #[test]
    fn trailing_comma_reported_when_disallowed() {
        let mut errors = Vec::new();
        let value = parse("[1,2,]", &mut errors, ParseOptions { allow_trailing_comma: false, ..ParseOptions::default() });
        assert_eq!(value, Value::Array(vec![Value::Number(1.0), Value::Number(2.0)]));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ParseErrorCode::ValueExpected);
        assert_eq!(errors[0].offset, 5);
    }

    #[test]
    fn location_at_property_key_midway_through_typing() {
        let text = r#"{ "foo": {"bar": 1, "car": 5 } }"#;
        let offset = text.find("car").unwrap() + 2; // the `|` sits between 'a' and 'r'

        let loc = get_location(text, offset);

        assert_eq!(loc.path, vec![PathSegment::Key("foo".into()), PathSegment::Key("car".into())]);
        assert!(loc.is_at_property_key);
        assert_eq!(loc.previous_node.as_ref().map(|n| n.kind), Some(NodeKind::Property));
    }

    #[test]
    fn tree_and_value_agree() {
        let text = r#"{"a": [1, "two", null, {"b": false}]}"#;
        let mut errors = Vec::new();
        let tree = parse_tree(text, &mut errors, ParseOptions::default());
        let value = get_node_value(tree.root().unwrap());

        let mut errors2 = Vec::new();
        assert_eq!(value, parse(text, &mut errors2, ParseOptions::default()));
    }

    #[test]
    fn strip_comments_then_parse_has_no_comment_related_state() {
        let text = r#"{
            // leading
            "a": 1 /* trailing */
        }"#;
        let stripped = strip_comments(text, ' ');
        assert!(!stripped.contains("leading"));
        assert!(!stripped.contains("trailing"));

        let mut errors = Vec::new();
        let value = parse(&stripped, &mut errors, ParseOptions::default());
        assert_eq!(value, Value::Object(vec![("a".to_string(), Value::Number(1.0))]));
        assert!(errors.is_empty());
    }

    #[test]
    fn print_parse_error_code_is_stable() {
        assert_eq!(print_parse_error_code(ParseErrorCode::ValueExpected), "ValueExpected");
    }
}
