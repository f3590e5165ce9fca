use jsonc_lexing::{create_scanner, Scanner, TokenKind};

use crate::node::{LiteralValue, NodeKind};
use crate::path::{path_matches, PatternSegment, PathSegment};

/// A snapshot of the most recently completed node before the offset
/// [`get_location`] was asked about. Owned rather than borrowed, since the
/// scan that produces it doesn't build a tree to borrow from.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviousNode {
    pub kind: NodeKind,
    pub offset: usize,
    pub length: usize,
    pub value: Option<LiteralValue>,
}

/// Where a text offset falls within a document, without a full parse. Used
/// to drive completion/hover in an editor: "what property am I inside of
/// right now".
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub previous_node: Option<PreviousNode>,
    pub path: Vec<PathSegment>,
    pub is_at_property_key: bool,
}

impl Location {
    pub fn matches(&self, pattern: &[PatternSegment]) -> bool {
        path_matches(&self.path, pattern)
    }
}

struct Ctx<'a> {
    scanner: Scanner<'a>,
    target: usize,
    path: Vec<PathSegment>,
    previous: Option<PreviousNode>,
    is_at_key: bool,
    found: bool,
    /// End offset of the value most recently consumed by `walk_value`
    /// without hitting `target`. Lets a property's span be extended to
    /// cover its value without re-deriving it from `previous`, which a
    /// nested property completing inside that value would have overwritten.
    last_value_end: usize,
}

/// Scans `text` up to `offset`, tracking the container path and the most
/// recently completed node along the way. This is a best-effort walk over
/// possibly-incomplete input (a document still being typed), not a full
/// parse: it tolerates missing colons/commas/brackets without reporting
/// errors, since there is no caller-facing error sink for this operation.
pub fn get_location(text: &str, offset: usize) -> Location {
    let mut ctx = Ctx {
        scanner: create_scanner(text, true),
        target: offset,
        path: Vec::new(),
        previous: None,
        is_at_key: false,
        found: false,
        last_value_end: 0,
    };

    ctx.scanner.scan();
    walk_value(&mut ctx);

    Location {
        previous_node: ctx.previous,
        path: ctx.path,
        is_at_property_key: ctx.is_at_key,
    }
}

fn literal_kind(kind: TokenKind) -> NodeKind {
    match kind {
        TokenKind::StringLiteral => NodeKind::String,
        TokenKind::NumericLiteral => NodeKind::Number,
        TokenKind::TrueKeyword | TokenKind::FalseKeyword => NodeKind::Boolean,
        _ => NodeKind::Null,
    }
}

fn literal_value(kind: TokenKind, text: &str) -> Option<LiteralValue> {
    match kind {
        TokenKind::StringLiteral => Some(LiteralValue::String(text.to_string())),
        TokenKind::NumericLiteral => Some(LiteralValue::Number(text.parse().unwrap_or(0.0))),
        TokenKind::TrueKeyword => Some(LiteralValue::Bool(true)),
        TokenKind::FalseKeyword => Some(LiteralValue::Bool(false)),
        TokenKind::NullKeyword => Some(LiteralValue::Null),
        _ => None,
    }
}

fn walk_value(ctx: &mut Ctx) {
    if ctx.found {
        return;
    }

    match ctx.scanner.token() {
        TokenKind::OpenBrace => walk_object(ctx),
        TokenKind::OpenBracket => walk_array(ctx),
        TokenKind::StringLiteral
        | TokenKind::NumericLiteral
        | TokenKind::TrueKeyword
        | TokenKind::FalseKeyword
        | TokenKind::NullKeyword => {
            let start = ctx.scanner.token_offset();
            let end = start + ctx.scanner.token_length();
            let kind = ctx.scanner.token();
            let value = literal_value(kind, ctx.scanner.token_value());

            if ctx.target <= end {
                ctx.found = true;
                return;
            }

            ctx.previous = Some(PreviousNode {
                kind: literal_kind(kind),
                offset: start,
                length: end - start,
                value,
            });
            ctx.last_value_end = end;
            ctx.scanner.scan();
        }
        TokenKind::Eof => ctx.found = true,
        _ => {
            // Garbage standing in for a value: consume it and move on.
            let end = ctx.scanner.token_offset() + ctx.scanner.token_length();
            if ctx.target <= end {
                ctx.found = true;
                return;
            }
            ctx.last_value_end = end;
            ctx.scanner.scan();
        }
    }
}

fn walk_object(ctx: &mut Ctx) {
    let open_end = ctx.scanner.token_offset() + ctx.scanner.token_length();
    if ctx.target <= open_end {
        ctx.found = true;
        return;
    }
    ctx.scanner.scan(); // consume `{`

    loop {
        if ctx.found {
            return;
        }

        match ctx.scanner.token() {
            TokenKind::CloseBrace => {
                let end = ctx.scanner.token_offset() + ctx.scanner.token_length();
                if ctx.target <= end {
                    ctx.found = true;
                    return;
                }
                ctx.previous = Some(PreviousNode {
                    kind: NodeKind::Object,
                    offset: ctx.scanner.token_offset(),
                    length: ctx.scanner.token_length(),
                    value: None,
                });
                ctx.last_value_end = end;
                ctx.scanner.scan();
                return;
            }
            TokenKind::Eof => {
                ctx.found = true;
                return;
            }
            TokenKind::StringLiteral => {
                let key_start = ctx.scanner.token_offset();
                let key_end = key_start + ctx.scanner.token_length();
                let key_value = ctx.scanner.token_value().to_string();

                if ctx.target <= key_end {
                    ctx.path.push(PathSegment::Key(key_value));
                    ctx.is_at_key = true;
                    ctx.found = true;
                    return;
                }

                ctx.path.push(PathSegment::Key(key_value.clone()));
                ctx.is_at_key = false;
                ctx.scanner.scan(); // consume key

                let mut property_end = key_end;

                if ctx.scanner.token() == TokenKind::Colon {
                    let colon_end = ctx.scanner.token_offset() + ctx.scanner.token_length();
                    if ctx.target <= colon_end {
                        ctx.found = true;
                        return;
                    }
                    ctx.scanner.scan(); // consume `:`

                    if !matches!(ctx.scanner.token(), TokenKind::CloseBrace | TokenKind::Eof) {
                        walk_value(ctx);
                        if ctx.found {
                            return;
                        }
                        property_end = ctx.last_value_end;
                    }
                }

                ctx.previous = Some(PreviousNode {
                    kind: NodeKind::Property,
                    offset: key_start,
                    length: property_end - key_start,
                    value: Some(LiteralValue::String(key_value)),
                });
                ctx.path.pop();

                match ctx.scanner.token() {
                    TokenKind::Comma => {
                        let end = ctx.scanner.token_offset() + ctx.scanner.token_length();
                        if ctx.target <= end {
                            ctx.is_at_key = true;
                            ctx.found = true;
                            return;
                        }
                        ctx.scanner.scan();
                    }
                    TokenKind::CloseBrace | TokenKind::Eof => {}
                    _ => {
                        // Missing comma: tolerate and keep looking for the
                        // next key.
                    }
                }
            }
            _ => {
                let end = ctx.scanner.token_offset() + ctx.scanner.token_length();
                if ctx.target <= end {
                    ctx.found = true;
                    return;
                }
                ctx.scanner.scan();
            }
        }
    }
}

fn walk_array(ctx: &mut Ctx) {
    let open_end = ctx.scanner.token_offset() + ctx.scanner.token_length();
    if ctx.target <= open_end {
        ctx.path.push(PathSegment::Index(0));
        ctx.found = true;
        return;
    }
    ctx.scanner.scan(); // consume `[`

    let mut index = 0usize;

    loop {
        if ctx.found {
            return;
        }

        match ctx.scanner.token() {
            TokenKind::CloseBracket => {
                let end = ctx.scanner.token_offset() + ctx.scanner.token_length();
                if ctx.target <= end {
                    ctx.found = true;
                    return;
                }
                ctx.previous = Some(PreviousNode {
                    kind: NodeKind::Array,
                    offset: ctx.scanner.token_offset(),
                    length: ctx.scanner.token_length(),
                    value: None,
                });
                ctx.last_value_end = end;
                ctx.scanner.scan();
                return;
            }
            TokenKind::Eof => {
                ctx.found = true;
                return;
            }
            TokenKind::Comma => {
                index += 1;
                let end = ctx.scanner.token_offset() + ctx.scanner.token_length();
                if ctx.target <= end {
                    ctx.path.push(PathSegment::Index(index));
                    ctx.found = true;
                    return;
                }
                ctx.scanner.scan();
            }
            _ => {
                ctx.path.push(PathSegment::Index(index));
                walk_value(ctx);
                if ctx.found {
                    return;
                }
                ctx.path.pop();
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partially_typed_nested_key() {
        // Cursor lands inside a key that is itself being typed, one sibling
        // property into a nested object.
        let text = r#"{ "foo": {"bar": 1, "car": 5 } }"#;
        let offset = text.find("car").unwrap() + 1; // inside "car", after 'c'

        let loc = get_location(text, offset);

        assert_eq!(
            loc.path,
            vec![PathSegment::Key("foo".into()), PathSegment::Key("car".into())]
        );
        assert!(loc.is_at_property_key);
        assert_eq!(loc.previous_node.as_ref().map(|n| n.kind), Some(NodeKind::Property));
    }

    #[test]
    fn cursor_in_array_element() {
        let text = r#"{"items": [1, 2, 3]}"#;
        let offset = text.find('2').unwrap();

        let loc = get_location(text, offset);

        assert_eq!(
            loc.path,
            vec![PathSegment::Key("items".into()), PathSegment::Index(1)]
        );
        assert!(!loc.is_at_property_key);
    }

    #[test]
    fn cursor_right_after_colon_expects_value() {
        let text = r#"{"a": }"#;
        let offset = text.find(':').unwrap() + 1;

        let loc = get_location(text, offset);

        assert_eq!(loc.path, vec![PathSegment::Key("a".into())]);
    }
}
