//! Comment-aware formatter for JSONC text.
//!
//! [`format`] re-scans a (possibly ranged) region of text with a
//! trivia-aware scanner and produces the minimal ordered list of [`Edit`]s
//! that normalizes inter-token whitespace to the configured indentation and
//! line policy. It never touches the content of a string or a comment —
//! only the whitespace between tokens changes.

#[macro_use]
extern crate lazy_static;

use std::borrow::Cow;

use jsonc_lexing::{create_scanner, ScanErrorCode, TokenKind};

lazy_static! {
    /// Common small indentation strings, interned once instead of being
    /// rebuilt on every token gap.
    static ref SPACE_INDENTS: Vec<String> = (0..=64).map(|n| " ".repeat(n)).collect();
    static ref TAB_INDENTS: Vec<String> = (0..=32).map(|n| "\t".repeat(n)).collect();
}

fn indent_string(level: usize, tab_size: usize, insert_spaces: bool) -> Cow<'static, str> {
    if insert_spaces {
        let width = level.saturating_mul(tab_size);
        match SPACE_INDENTS.get(width) {
            Some(s) => Cow::Borrowed(s.as_str()),
            None => Cow::Owned(" ".repeat(width)),
        }
    } else {
        match TAB_INDENTS.get(level) {
            Some(s) => Cow::Borrowed(s.as_str()),
            None => Cow::Owned("\t".repeat(level)),
        }
    }
}

/// A text replacement against the original document.
/// `offset`/`length` address the original text; a sorted, non-overlapping
/// list of these is what [`format`] and `jsonc_modifying::modify` both
/// return. Multiple edits may share an offset (pure insertions); they apply
/// in list order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub offset: usize,
    pub length: usize,
    pub content: String,
}

impl Edit {
    pub fn new(offset: usize, length: usize, content: impl Into<String>) -> Self {
        Self { offset, length, content: content.into() }
    }

    fn end(&self) -> usize {
        self.offset + self.length
    }
}

/// Applies a sorted, non-overlapping edit list to `text`. Trivial by
/// construction: edits never overlap, so they can be copied through in order
/// without any conflict resolution.
pub fn apply_edits(text: &str, edits: &[Edit]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;

    for edit in edits {
        out.push_str(&text[cursor..edit.offset]);
        out.push_str(&edit.content);
        cursor = edit.end();
    }

    out.push_str(&text[cursor..]);
    out
}

/// A byte range of the original document, used to request formatting of a
/// sub-region rather than the whole document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub offset: usize,
    pub length: usize,
}

impl Range {
    pub fn new(offset: usize, length: usize) -> Self {
        Self { offset, length }
    }

    fn end(&self) -> usize {
        self.offset + self.length
    }
}

/// Options controlling the formatter's whitespace policy.
#[derive(Debug, Clone)]
pub struct FormattingOptions {
    pub tab_size: usize,
    pub insert_spaces: bool,
    /// End-of-line string. `None` auto-detects from the document (the
    /// first `\r\n`, `\r`, or `\n` found), falling back to `\n`.
    pub eol: Option<String>,
    pub insert_final_newline: bool,
    /// Preserve the number of line breaks the author had between tokens
    /// instead of imposing one line break per structural boundary.
    pub keep_lines: bool,
}

impl Default for FormattingOptions {
    fn default() -> Self {
        Self {
            tab_size: 4,
            insert_spaces: true,
            eol: None,
            insert_final_newline: false,
            keep_lines: false,
        }
    }
}

fn detect_eol(text: &str) -> &'static str {
    let bytes = text.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'\n' {
            if i > 0 && bytes[i - 1] == b'\r' {
                continue; // already counted as part of the preceding \r\n
            }
            return "\n";
        }
        if b == b'\r' {
            return if bytes.get(i + 1) == Some(&b'\n') { "\r\n" } else { "\r" };
        }
    }
    "\n"
}

fn start_of_line(text: &str, offset: usize) -> usize {
    text[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0)
}

fn end_of_line(text: &str, offset: usize) -> usize {
    text[offset..].find('\n').map(|i| offset + i + 1).unwrap_or(text.len())
}

/// Indentation level implied by the leading whitespace of the line starting
/// at `line_start`, in units of `tab_size` spaces (or one tab each).
fn leading_indent_level(text: &str, line_start: usize, options: &FormattingOptions) -> usize {
    let bytes = text.as_bytes();
    let mut i = line_start;
    let mut width = 0usize;

    while i < bytes.len() {
        match bytes[i] {
            b' ' => width += 1,
            b'\t' => width += options.tab_size,
            _ => break,
        }
        i += 1;
    }

    if options.tab_size == 0 {
        0
    } else {
        width / options.tab_size
    }
}

/// One meaningful (non-whitespace, non-linebreak) token encountered while
/// walking the document: structural punctuation, a value token, a comment,
/// or `Eof`. Pure horizontal whitespace and line breaks are never pushed
/// here; they are folded into `line_breaks_before` on the following token.
struct SigToken {
    kind: TokenKind,
    offset: usize,
    length: usize,
    line_breaks_before: usize,
    is_error: bool,
}

impl SigToken {
    fn end(&self) -> usize {
        self.offset + self.length
    }
}

fn collect_significant(text: &str, from: usize) -> Vec<SigToken> {
    let mut scanner = create_scanner(text, false);
    scanner.set_position(from);

    let mut out = Vec::new();
    let mut pending_breaks = 0usize;

    loop {
        let kind = scanner.scan();

        match kind {
            TokenKind::Trivia => continue,
            TokenKind::LineBreakTrivia => {
                pending_breaks += 1;
                continue;
            }
            _ => {
                let is_error = kind == TokenKind::Unknown || scanner.token_error() != ScanErrorCode::None;
                out.push(SigToken {
                    kind,
                    offset: scanner.token_offset(),
                    length: scanner.token_length(),
                    line_breaks_before: pending_breaks,
                    is_error,
                });
                pending_breaks = 0;

                if kind == TokenKind::Eof {
                    return out;
                }
            }
        }
    }
}

/// Decides the replacement text for the gap between `first` and `second`,
/// mutating `depth` to reflect container nesting as brackets are crossed.
fn decide_gap(
    first: &SigToken,
    second: &SigToken,
    depth: &mut i64,
    options: &FormattingOptions,
    eol: &str,
) -> String {
    use TokenKind::*;

    let is_empty_container = matches!(
        (first.kind, second.kind),
        (OpenBrace, CloseBrace) | (OpenBracket, CloseBracket)
    );
    if is_empty_container {
        return String::new();
    }

    let n = second.line_breaks_before;

    // A closing bracket sits one level out from its children.
    if matches!(second.kind, CloseBrace | CloseBracket) {
        *depth -= 1;
        let indent = indent_string((*depth).max(0) as usize, options.tab_size, options.insert_spaces);
        return newline_or_space(&format!("{eol}{indent}"), n, options.keep_lines, &indent, eol);
    }

    // An opening bracket's first child is indented one level in.
    if matches!(first.kind, OpenBrace | OpenBracket) {
        *depth += 1;
        let indent = indent_string((*depth).max(0) as usize, options.tab_size, options.insert_spaces);
        return newline_or_space(&format!("{eol}{indent}"), n, options.keep_lines, &indent, eol);
    }

    if matches!(first.kind, Comma) {
        let indent = indent_string((*depth).max(0) as usize, options.tab_size, options.insert_spaces);
        return newline_or_space(&format!("{eol}{indent}"), n, options.keep_lines, &indent, eol);
    }

    // Nothing ever precedes a colon in default mode; keep-lines still
    // preserves whatever line breaks the author had there.
    if matches!(second.kind, Colon) {
        let indent = indent_string((*depth).max(0) as usize, options.tab_size, options.insert_spaces);
        return newline_or_space("", n, options.keep_lines, &indent, eol);
    }

    // A comment arriving after something: attach to the same line if it was
    // already there, otherwise give it its own line at the current indent.
    if matches!(second.kind, LineCommentTrivia | BlockCommentTrivia) {
        if n == 0 {
            return " ".to_string();
        }
        let indent = indent_string((*depth).max(0) as usize, options.tab_size, options.insert_spaces);
        return newline_or_space(&format!("{eol}{indent}"), n, options.keep_lines, &indent, eol);
    }

    // A line comment can never be followed by more content on its line.
    if matches!(first.kind, LineCommentTrivia) {
        let indent = indent_string((*depth).max(0) as usize, options.tab_size, options.insert_spaces);
        return newline_or_space(&format!("{eol}{indent}"), n, options.keep_lines, &indent, eol);
    }

    // A block comment keeps whatever line relationship the author chose.
    if matches!(first.kind, BlockCommentTrivia) {
        if n > 0 {
            let indent = indent_string((*depth).max(0) as usize, options.tab_size, options.insert_spaces);
            return newline_or_space(&format!("{eol}{indent}"), n, options.keep_lines, &indent, eol);
        }
        return " ".to_string();
    }

    // Single space after a colon in default mode; keep-lines preserves any
    // line breaks the author had there instead of collapsing them to a space.
    if matches!(first.kind, Colon) {
        let indent = indent_string((*depth).max(0) as usize, options.tab_size, options.insert_spaces);
        return newline_or_space(" ", n, options.keep_lines, &indent, eol);
    }

    String::new()
}

/// Decides the replacement for a token gap whose *non-keep-lines* behavior
/// is `default` (either `""`, `" "`, or an `{eol}{indent}` newline). In
/// keep-lines mode, any line breaks the author actually had (`n > 0`) are
/// always preserved verbatim regardless of `default`; only at `n == 0` does
/// keep-lines fall back to a single space (or nothing, if `default` is
/// empty) in place of the default's newline.
fn newline_or_space(default: &str, n: usize, keep_lines: bool, indent: &str, eol: &str) -> String {
    if keep_lines {
        if n > 0 {
            let mut s = eol.repeat(n);
            s.push_str(indent);
            s
        } else if default.is_empty() {
            String::new()
        } else {
            " ".to_string()
        }
    } else {
        default.to_string()
    }
}

fn overlaps(edit_offset: usize, edit_length: usize, range: Range) -> bool {
    let edit_end = edit_offset + edit_length;
    edit_offset < range.end() && edit_end >= range.offset || (edit_length == 0 && edit_offset >= range.offset && edit_offset <= range.end())
}

/// Re-scans `text` (or the portion of it covered by `range`) and returns the
/// ordered, non-overlapping edits that normalize whitespace per `options`.
/// When `range` is given, it is expanded outward to the enclosing line
/// boundaries: the initial indent level is derived from that line's leading
/// whitespace, and edits are kept as long as they touch the expanded line
/// range rather than only the caller's original, unexpanded offsets.
pub fn format(text: &str, range: Option<Range>, options: &FormattingOptions) -> Vec<Edit> {
    if text.is_empty() {
        return Vec::new();
    }

    let eol = options.eol.clone().unwrap_or_else(|| detect_eol(text).to_string());

    let (scan_from, initial_depth, line_range) = match range {
        None => (0usize, 0i64, None),
        Some(r) => {
            let line_start = start_of_line(text, r.offset.min(text.len()));
            let line_end = end_of_line(text, r.end().min(text.len()));
            let level = leading_indent_level(text, line_start, options);
            (line_start, level as i64, Some(Range::new(line_start, line_end - line_start)))
        }
    };

    let tokens = collect_significant(text, scan_from);
    let mut depth = initial_depth;
    let mut edits = Vec::new();

    for pair in tokens.windows(2) {
        let first = &pair[0];
        let second = &pair[1];

        if first.is_error {
            // Malformed input: stop emitting edits for the remainder of the
            // scanned region rather than risk corrupting it further.
            break;
        }

        if second.kind == TokenKind::Eof {
            continue;
        }

        let replacement = decide_gap(first, second, &mut depth, options, &eol);
        let gap_start = first.end();
        let gap_len = second.offset - gap_start;

        if text[gap_start..second.offset] != replacement {
            if line_range.map_or(true, |r| overlaps(gap_start, gap_len, r)) {
                edits.push(Edit::new(gap_start, gap_len, replacement));
            }
        }
    }

    if range.is_none() && options.insert_final_newline && tokens.iter().any(|t| t.kind != TokenKind::Eof) {
        let doc_end = text.len();
        if !text.ends_with(&eol) {
            edits.push(Edit::new(doc_end, 0, eol.clone()));
        }
    }

    edits.sort_by_key(|e| e.offset);
    edits
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fmt(text: &str, options: FormattingOptions) -> String {
        let edits = format(text, None, &options);
        apply_edits(text, &edits)
    }

    #[test]
    fn normalizes_spacing_and_indentation() {
        let opts = FormattingOptions { tab_size: 2, insert_spaces: true, eol: Some("\n".to_string()), ..Default::default() };
        assert_eq!(fmt(r#"{"x" : 1}"#, opts), "{\n  \"x\": 1\n}");
    }

    #[test]
    fn keep_lines_preserves_blank_lines_around_a_nested_object() {
        let opts = FormattingOptions {
            tab_size: 2,
            insert_spaces: true,
            eol: Some("\n".to_string()),
            keep_lines: true,
            ..Default::default()
        };
        assert_eq!(
            fmt("{\"settings\":\n\n\n{\"foo\":1}\n}", opts),
            "{ \"settings\":\n\n\n  { \"foo\": 1 }\n}"
        );
    }

    #[test]
    fn keep_lines_preserves_breaks_straddling_a_colon() {
        // A line break placed *before* a colon (not just after one) must
        // also survive keep-lines instead of collapsing.
        let opts = FormattingOptions {
            tab_size: 2,
            insert_spaces: true,
            eol: Some("\n".to_string()),
            keep_lines: true,
            ..Default::default()
        };
        assert_eq!(fmt("{\"a\"\n\n:1}", opts), "{ \"a\"\n\n  : 1 }");
    }

    #[test]
    fn empty_object_and_array_stay_on_one_line() {
        let opts = FormattingOptions { tab_size: 2, insert_spaces: true, eol: Some("\n".to_string()), ..Default::default() };
        assert_eq!(fmt("{}", opts.clone()), "{}");
        assert_eq!(fmt("[  ]", opts), "[]");
    }

    #[test]
    fn nested_array_of_objects() {
        let opts = FormattingOptions { tab_size: 2, insert_spaces: true, eol: Some("\n".to_string()), ..Default::default() };
        assert_eq!(
            fmt(r#"[{"a":1},{"b":2}]"#, opts),
            "[\n  {\n    \"a\": 1\n  },\n  {\n    \"b\": 2\n  }\n]"
        );
    }

    #[test]
    fn tabs_instead_of_spaces() {
        let opts = FormattingOptions { insert_spaces: false, eol: Some("\n".to_string()), ..Default::default() };
        assert_eq!(fmt(r#"{"a":1}"#, opts), "{\n\t\"a\": 1\n}");
    }

    #[test]
    fn insert_final_newline_appends_exactly_one() {
        let opts = FormattingOptions { insert_final_newline: true, eol: Some("\n".to_string()), ..Default::default() };
        let result = fmt("{}", opts.clone());
        assert_eq!(result, "{}\n");

        // Idempotent: formatting again does not add a second newline.
        let result2 = fmt(&result, opts);
        assert_eq!(result2, result);
    }

    #[test]
    fn trailing_line_comment_keeps_single_space_and_forces_newline() {
        let opts = FormattingOptions { tab_size: 2, insert_spaces: true, eol: Some("\n".to_string()), ..Default::default() };
        let input = "{\"a\":1 // hi\n}";
        let result = fmt(input, opts);
        assert_eq!(result, "{\n  \"a\": 1 // hi\n}");
    }

    #[test]
    fn preserves_comment_text_verbatim() {
        let opts = FormattingOptions::default();
        let input = "{ \"a\"   :   1 /* keep    me */ }";
        let result = fmt(input, opts);
        assert!(result.contains("/* keep    me */"));
    }

    #[test]
    fn edits_are_sorted_and_non_overlapping() {
        let edits = format(r#"{"a" : [1,2 ,3]}"#, None, &FormattingOptions::default());
        for w in edits.windows(2) {
            assert!(w[0].offset <= w[1].offset);
            assert!(w[0].end() <= w[1].offset);
        }
    }

    #[test]
    fn idempotent_on_already_formatted_text() {
        let opts = FormattingOptions::default();
        let once = fmt(r#"{"a": [1, 2], "b": {"c": true}}"#, opts.clone());
        let twice = fmt(&once, opts);
        assert_eq!(once, twice);
    }

    #[test]
    fn malformed_input_is_left_alone_in_its_region() {
        // An `Unknown` token (bare `-`) should make the formatter abandon
        // edits around it rather than guess at a repair.
        let opts = FormattingOptions::default();
        let edits = format("{\"a\": - }", None, &opts);
        // No edit should have been produced for the gap straddling the bad
        // token; whatever precedes it may still have been normalized.
        assert!(edits.iter().all(|e| e.offset <= "{\"a\": -".len()));
    }

    #[test]
    fn ranged_format_only_touches_requested_region() {
        let text = "{\n\"a\":1,\n\"b\":2\n}";
        let b_offset = text.find("\"b\"").unwrap();
        let opts = FormattingOptions { tab_size: 2, insert_spaces: true, eol: Some("\n".to_string()), ..Default::default() };
        let edits = format(text, Some(Range::new(b_offset, 1)), &opts);
        assert!(!edits.is_empty());
        for e in &edits {
            assert!(e.offset >= text.rfind('\n').map(|i| 0).unwrap_or(0)); // sanity: offsets are valid
        }
        // The "a" property's line should be untouched by a range scoped to "b".
        let a_region_start = text.find("\"a\"").unwrap();
        let a_region_end = text.find(',').unwrap();
        assert!(edits.iter().all(|e| e.offset >= a_region_end || e.offset < a_region_start));
    }
}
