use jsonc_lexing::{create_scanner, ScanErrorCode, Scanner, TokenKind};

use crate::error::{scan_error_code, ParseError, ParseErrorCode};
use crate::node::LiteralValue;
use crate::options::ParseOptions;
use crate::path::PathSegment;

/// Callback-driven view of a parse pass. Every method has a
/// no-op default, so a visitor only needs to implement what it cares about.
/// `on_object_begin`/`on_array_begin` return `false` to skip the container's
/// subtree entirely — no further callback fires for anything nested inside
/// it, though the closing `on_object_end`/`on_array_end` still does.
///
/// `on_object_begin`/`on_array_begin` also receive a path supplier: a thunk
/// that, when invoked, allocates and returns the path to the container being
/// opened. Most visitors never call it, so it stays lazy rather than being
/// computed (and cloned) on every container.
pub trait Visitor {
    fn on_object_begin(&mut self, _offset: usize, _length: usize, _path: &dyn Fn() -> Vec<PathSegment>) -> bool {
        true
    }
    fn on_object_property(&mut self, _key: &str, _offset: usize, _length: usize) -> bool {
        true
    }
    fn on_object_end(&mut self, _offset: usize, _length: usize) {}
    fn on_array_begin(&mut self, _offset: usize, _length: usize, _path: &dyn Fn() -> Vec<PathSegment>) -> bool {
        true
    }
    fn on_array_end(&mut self, _offset: usize, _length: usize) {}
    fn on_literal_value(&mut self, _value: LiteralValue, _offset: usize, _length: usize) {}
    fn on_separator(&mut self, _ch: char, _offset: usize, _length: usize) {}
    fn on_comment(&mut self, _offset: usize, _length: usize) {}
    fn on_error(&mut self, _error: ParseError) {}
}

/// Drives `visitor` over `text`. This is the single grammar walk that
/// [`crate::parse`] and [`crate::parse_tree`] are both built on.
pub fn visit<V: Visitor>(text: &str, visitor: &mut V, options: ParseOptions) {
    let mut scanner = create_scanner(text, false);
    let mut path: Vec<PathSegment> = Vec::new();

    let kind = advance(&mut scanner, &options, visitor);

    if kind == TokenKind::Eof {
        if !options.allow_empty_content {
            visitor.on_error(ParseError::new(ParseErrorCode::ValueExpected, 0, 0, 0, 0));
        }
        return;
    }

    parse_value(&mut scanner, kind, &options, visitor, &mut path);

    let trailing = advance(&mut scanner, &options, visitor);
    if trailing != TokenKind::Eof {
        visitor.on_error(token_error(&scanner, ParseErrorCode::EndOfFileExpected));
    }
}

fn token_error(scanner: &Scanner, code: ParseErrorCode) -> ParseError {
    ParseError::new(
        code,
        scanner.token_offset(),
        scanner.token_length(),
        scanner.token_start_line(),
        scanner.token_start_character(),
    )
}

fn report_scan_error<V: Visitor>(scanner: &Scanner, visitor: &mut V) {
    if let Some(code) = scan_error_code(scanner.token_error()) {
        visitor.on_error(token_error(scanner, code));
    }
}

/// Scans to the next non-trivia token, surfacing comments (or rejecting
/// them, per `options.disallow_comments`) as it goes.
fn advance<V: Visitor>(scanner: &mut Scanner, options: &ParseOptions, visitor: &mut V) -> TokenKind {
    loop {
        let kind = scanner.scan();

        match kind {
            TokenKind::Trivia | TokenKind::LineBreakTrivia => continue,
            TokenKind::LineCommentTrivia | TokenKind::BlockCommentTrivia => {
                if scanner.token_error() == ScanErrorCode::UnexpectedEndOfComment {
                    visitor.on_error(token_error(scanner, ParseErrorCode::UnexpectedEndOfComment));
                }

                if options.disallow_comments {
                    visitor.on_error(token_error(scanner, ParseErrorCode::InvalidCommentToken));
                } else {
                    visitor.on_comment(scanner.token_offset(), scanner.token_length());
                }

                continue;
            }
            _ => return kind,
        }
    }
}

/// Advances past a container's contents without invoking any visitor
/// callback, used when `on_object_begin`/`on_array_begin` returned `false`.
/// Depth tracking alone is enough to find the matching close token: strings
/// and comments are already whole tokens, so a literal `{`/`[` inside one
/// never appears as a separate `OpenBrace`/`OpenBracket` token.
fn skip_container(scanner: &mut Scanner) {
    let mut depth = 1usize;

    loop {
        match scanner.scan() {
            TokenKind::OpenBrace | TokenKind::OpenBracket => depth += 1,
            TokenKind::CloseBrace | TokenKind::CloseBracket => {
                depth -= 1;
                if depth == 0 {
                    return;
                }
            }
            TokenKind::Eof => return,
            _ => {}
        }
    }
}

fn parse_value<V: Visitor>(
    scanner: &mut Scanner,
    kind: TokenKind,
    options: &ParseOptions,
    visitor: &mut V,
    path: &mut Vec<PathSegment>,
) {
    match kind {
        TokenKind::OpenBrace => parse_object(scanner, options, visitor, path),
        TokenKind::OpenBracket => parse_array(scanner, options, visitor, path),
        TokenKind::StringLiteral => {
            report_scan_error(scanner, visitor);
            let value = LiteralValue::String(scanner.token_value().to_string());
            visitor.on_literal_value(value, scanner.token_offset(), scanner.token_length());
        }
        TokenKind::NumericLiteral => {
            report_scan_error(scanner, visitor);
            let n: f64 = scanner.token_value().parse().unwrap_or(0.0);
            visitor.on_literal_value(LiteralValue::Number(n), scanner.token_offset(), scanner.token_length());
        }
        TokenKind::TrueKeyword => {
            visitor.on_literal_value(LiteralValue::Bool(true), scanner.token_offset(), scanner.token_length());
        }
        TokenKind::FalseKeyword => {
            visitor.on_literal_value(LiteralValue::Bool(false), scanner.token_offset(), scanner.token_length());
        }
        TokenKind::NullKeyword => {
            visitor.on_literal_value(LiteralValue::Null, scanner.token_offset(), scanner.token_length());
        }
        _ => {
            // The bad token has already been consumed by the scanner; the
            // caller's next `advance()` naturally resumes after it.
            visitor.on_error(token_error(scanner, ParseErrorCode::ValueExpected));
        }
    }
}

fn parse_object<V: Visitor>(
    scanner: &mut Scanner,
    options: &ParseOptions,
    visitor: &mut V,
    path: &mut Vec<PathSegment>,
) {
    let descend = visitor.on_object_begin(scanner.token_offset(), scanner.token_length(), &|| path.clone());

    if !descend {
        skip_container(scanner);
        visitor.on_object_end(scanner.token_offset(), scanner.token_length());
        return;
    }

    let mut expect_comma = false;
    let mut last_was_comma = false;

    loop {
        let kind = advance(scanner, options, visitor);

        match kind {
            TokenKind::CloseBrace => {
                if last_was_comma && !options.allow_trailing_comma {
                    visitor.on_error(token_error(scanner, ParseErrorCode::ValueExpected));
                }
                visitor.on_object_end(scanner.token_offset(), scanner.token_length());
                return;
            }
            TokenKind::Eof => {
                visitor.on_error(token_error(scanner, ParseErrorCode::CloseBraceExpected));
                visitor.on_object_end(scanner.token_offset(), 0);
                return;
            }
            TokenKind::Comma => {
                if !expect_comma {
                    visitor.on_error(token_error(scanner, ParseErrorCode::PropertyNameExpected));
                }
                visitor.on_separator(',', scanner.token_offset(), scanner.token_length());
                expect_comma = false;
                last_was_comma = true;
            }
            TokenKind::StringLiteral => {
                last_was_comma = false;

                if expect_comma {
                    visitor.on_error(token_error(scanner, ParseErrorCode::CommaExpected));
                }

                report_scan_error(scanner, visitor);
                let key = scanner.token_value().to_string();
                let key_offset = scanner.token_offset();
                let key_length = scanner.token_length();
                let prop_descend = visitor.on_object_property(&key, key_offset, key_length);

                path.push(PathSegment::Key(key));

                let next = advance(scanner, options, visitor);

                if next == TokenKind::Colon {
                    visitor.on_separator(':', scanner.token_offset(), scanner.token_length());

                    let value_kind = advance(scanner, options, visitor);

                    if value_kind == TokenKind::Eof {
                        visitor.on_error(token_error(scanner, ParseErrorCode::ValueExpected));
                    } else if prop_descend {
                        parse_value(scanner, value_kind, options, visitor, path);
                    } else if matches!(value_kind, TokenKind::OpenBrace | TokenKind::OpenBracket) {
                        skip_container(scanner);
                    }
                } else {
                    visitor.on_error(token_error(scanner, ParseErrorCode::ColonExpected));
                    // No colon: whatever is here might still be the intended
                    // value, so try to parse it anyway to stay in sync.
                    if prop_descend {
                        parse_value(scanner, next, options, visitor, path);
                    }
                }

                path.pop();
                expect_comma = true;
            }
            _ => {
                last_was_comma = false;
                visitor.on_error(token_error(scanner, ParseErrorCode::PropertyNameExpected));
                expect_comma = true;
            }
        }
    }
}

fn parse_array<V: Visitor>(
    scanner: &mut Scanner,
    options: &ParseOptions,
    visitor: &mut V,
    path: &mut Vec<PathSegment>,
) {
    let descend = visitor.on_array_begin(scanner.token_offset(), scanner.token_length(), &|| path.clone());

    if !descend {
        skip_container(scanner);
        visitor.on_array_end(scanner.token_offset(), scanner.token_length());
        return;
    }

    let mut expect_comma = false;
    let mut last_was_comma = false;
    let mut index = 0usize;

    loop {
        let kind = advance(scanner, options, visitor);

        match kind {
            TokenKind::CloseBracket => {
                if last_was_comma && !options.allow_trailing_comma {
                    visitor.on_error(token_error(scanner, ParseErrorCode::ValueExpected));
                }
                visitor.on_array_end(scanner.token_offset(), scanner.token_length());
                return;
            }
            TokenKind::Eof => {
                visitor.on_error(token_error(scanner, ParseErrorCode::CloseBracketExpected));
                visitor.on_array_end(scanner.token_offset(), 0);
                return;
            }
            TokenKind::Comma => {
                if !expect_comma {
                    visitor.on_error(token_error(scanner, ParseErrorCode::ValueExpected));
                }
                visitor.on_separator(',', scanner.token_offset(), scanner.token_length());
                expect_comma = false;
                last_was_comma = true;
            }
            _ => {
                last_was_comma = false;
                if expect_comma {
                    visitor.on_error(token_error(scanner, ParseErrorCode::CommaExpected));
                }
                path.push(PathSegment::Index(index));
                parse_value(scanner, kind, options, visitor, path);
                path.pop();
                index += 1;
                expect_comma = true;
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::options::ParseOptions;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
        paths_at_begin: Vec<Vec<PathSegment>>,
    }

    impl Visitor for Recorder {
        fn on_object_begin(&mut self, _offset: usize, _length: usize, path: &dyn Fn() -> Vec<PathSegment>) -> bool {
            self.events.push("object_begin".to_string());
            self.paths_at_begin.push(path());
            true
        }
        fn on_object_property(&mut self, key: &str, _offset: usize, _length: usize) -> bool {
            self.events.push(format!("property:{key}"));
            true
        }
        fn on_object_end(&mut self, _offset: usize, _length: usize) {
            self.events.push("object_end".to_string());
        }
        fn on_array_begin(&mut self, _offset: usize, _length: usize, path: &dyn Fn() -> Vec<PathSegment>) -> bool {
            self.events.push("array_begin".to_string());
            self.paths_at_begin.push(path());
            true
        }
        fn on_array_end(&mut self, _offset: usize, _length: usize) {
            self.events.push("array_end".to_string());
        }
        fn on_literal_value(&mut self, value: LiteralValue, _offset: usize, _length: usize) {
            self.events.push(format!("literal:{value:?}"));
        }
        fn on_separator(&mut self, ch: char, _offset: usize, _length: usize) {
            self.events.push(format!("separator:{ch}"));
        }
    }

    #[test]
    fn visits_in_document_order() {
        let mut recorder = Recorder::default();
        visit(r#"{"a": [1, 2], "b": true}"#, &mut recorder, ParseOptions::default());

        assert_eq!(
            recorder.events,
            vec![
                "object_begin",
                "property:a",
                "separator::",
                "array_begin",
                "literal:Number(1.0)",
                "separator:,",
                "literal:Number(2.0)",
                "array_end",
                "separator:,",
                "property:b",
                "separator::",
                "literal:Bool(true)",
                "object_end",
            ]
        );
    }

    #[test]
    fn path_supplier_reflects_nesting() {
        let mut recorder = Recorder::default();
        visit(r#"{"a": {"b": [1]}}"#, &mut recorder, ParseOptions::default());

        assert_eq!(recorder.paths_at_begin[0], Vec::<PathSegment>::new());
        assert_eq!(recorder.paths_at_begin[1], vec![PathSegment::Key("a".into())]);
        assert_eq!(
            recorder.paths_at_begin[2],
            vec![PathSegment::Key("a".into()), PathSegment::Key("b".into())]
        );
    }

    #[test]
    fn skip_subtree_still_fires_end() {
        struct Skipper {
            entered: RefCell<usize>,
        }
        impl Visitor for Skipper {
            fn on_object_begin(&mut self, _o: usize, _l: usize, _p: &dyn Fn() -> Vec<PathSegment>) -> bool {
                *self.entered.borrow_mut() += 1;
                false
            }
            fn on_literal_value(&mut self, _v: LiteralValue, _o: usize, _l: usize) {
                panic!("should not visit skipped subtree contents");
            }
        }

        let mut skipper = Skipper { entered: RefCell::new(0) };
        visit(r#"{"a": 1}"#, &mut skipper, ParseOptions::default());
        assert_eq!(*skipper.entered.borrow(), 1);
    }
}
