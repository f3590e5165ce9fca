//! Tolerant scanner, parser, formatter and modifier for JSON with
//! JavaScript-style extensions (JSONC): line/block comments and optional
//! trailing commas. This crate is a thin facade over four lower-level
//! crates, each doing one job:
//!
//! - [`jsonc_lexing`]: the byte-offset [`Scanner`](jsonc_lexing::Scanner).
//! - [`jsonc_parsing`]: [`parse`], [`parse_tree`], [`visit`], [`get_location`],
//!   and the tree-query helpers.
//! - [`jsonc_formatting`]: [`format`], the comment-aware whitespace
//!   normalizer.
//! - [`jsonc_modifying`]: [`modify`], path-addressed insert/replace/remove.
//!
//! A caller who only needs one layer can depend on that crate directly;
//! most consumers just add this one.
//!
//! ```
//! use jsonc::{parse, ParseOptions};
//!
//! let mut errors = Vec::new();
//! let value = parse(r#"{ "answer": 42 /* trailing */ }"#, &mut errors, ParseOptions::default());
//! assert_eq!(value.get("answer").and_then(|v| v.as_f64()), Some(42.0));
//! assert!(errors.is_empty());
//! ```

pub use jsonc_lexing::{create_scanner, ScanErrorCode, Scanner, TokenKind};

pub use jsonc_parsing::{
    find_node_at_location, find_node_at_offset, get_location, get_node_path, get_node_value, parse, parse_tree,
    path_matches, print_parse_error_code, strip_comments, visit, LiteralValue, Location, NodeId, NodeKind, NodeRef,
    ParseError, ParseErrorCode, ParseOptions, PatternSegment, PathSegment, PreviousNode, Tree, Value, Visitor,
};

pub use jsonc_formatting::{apply_edits, format, Edit, FormattingOptions, Range};

pub use jsonc_modifying::{modify, ModificationOptions, ModifyError, ModifyValue};

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tokens_via_facade() {
        let mut scanner = create_scanner("{}", false);
        assert_eq!(scanner.scan(), TokenKind::OpenBrace);
        assert_eq!(scanner.scan(), TokenKind::CloseBrace);
        assert_eq!(scanner.scan(), TokenKind::Eof);
    }

    #[test]
    fn round_trip_parse_format_modify() {
        let mut errors = Vec::new();
        let text = "{\n  \"x\": \"y\"\n}";
        let value = parse(text, &mut errors, ParseOptions::default());
        assert_eq!(value.get("x").and_then(|v| v.as_str()), Some("y"));

        let options = ModificationOptions {
            formatting_options: FormattingOptions { tab_size: 2, insert_spaces: true, eol: Some("\n".to_string()), ..Default::default() },
            ..Default::default()
        };
        let edits = modify(text, &[PathSegment::Key("foo".to_string())], ModifyValue::Set(Value::String("bar".to_string())), &options)
            .expect("path should resolve");
        let updated = apply_edits(text, &edits);

        let mut errors = Vec::new();
        let value = parse(&updated, &mut errors, ParseOptions::default());
        assert_eq!(value.get("foo").and_then(|v| v.as_str()), Some("bar"));
    }

    #[test]
    fn get_location_resolves_property_path() {
        let text = r#"{ "foo": {"bar": 1} }"#;
        let offset = text.find("bar").unwrap();
        let loc = get_location(text, offset);
        assert_eq!(loc.path, vec![PathSegment::Key("foo".into()), PathSegment::Key("bar".into())]);
    }
}
