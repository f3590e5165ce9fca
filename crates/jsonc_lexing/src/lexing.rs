//
// Byte-offset scanner for JSON with JavaScript-style extensions (JSONC):
// line/block comments and otherwise-standard JSON lexical rules.
//
// Offsets, token lengths and columns are UTF-8 byte offsets into the input
// text. This is a documented divergence from the UTF-16 code unit offsets
// used by the scanner this crate's behavior is modeled on; every offset
// produced here is internally consistent under that choice, which is all
// callers need (see DESIGN.md).
//
// - OpenBrace / CloseBrace / OpenBracket / CloseBracket
// - Comma / Colon
// - NullKeyword / TrueKeyword / FalseKeyword
// - StringLiteral / NumericLiteral
// - LineCommentTrivia / BlockCommentTrivia
// - LineBreakTrivia / Trivia (horizontal whitespace)
// - Unknown
// - Eof
//

use std::borrow::Cow;

const TAB: u8 = 0x09;
const NEWLINE: u8 = 0x0A;
const CARRIAGE_RETURN: u8 = 0x0D;
const SPACE: u8 = 0x20;
const DOUBLE_QUOTE: u8 = b'"';
const BACKSLASH: u8 = b'\\';
const SLASH: u8 = b'/';
const ASTERISK: u8 = b'*';
const OPEN_BRACE: u8 = b'{';
const CLOSE_BRACE: u8 = b'}';
const OPEN_BRACKET: u8 = b'[';
const CLOSE_BRACKET: u8 = b']';
const COLON: u8 = b':';
const COMMA: u8 = b',';
const MINUS: u8 = b'-';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    OpenBrace,
    CloseBrace,
    OpenBracket,
    CloseBracket,
    Comma,
    Colon,
    NullKeyword,
    TrueKeyword,
    FalseKeyword,
    StringLiteral,
    NumericLiteral,
    LineCommentTrivia,
    BlockCommentTrivia,
    LineBreakTrivia,
    /// Horizontal whitespace (spaces and tabs).
    Trivia,
    Unknown,
    Eof,
}

impl TokenKind {
    /// Whitespace, line breaks and comments carry no semantic content.
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Trivia
                | TokenKind::LineBreakTrivia
                | TokenKind::LineCommentTrivia
                | TokenKind::BlockCommentTrivia
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanErrorCode {
    None,
    UnexpectedEndOfComment,
    UnexpectedEndOfString,
    UnexpectedEndOfNumber,
    InvalidUnicode,
    InvalidEscapeCharacter,
    InvalidCharacter,
}

impl Default for ScanErrorCode {
    fn default() -> Self {
        ScanErrorCode::None
    }
}

/// Byte-offset, line-tracking scanner over a JSONC text buffer.
///
/// A scanner is a mutable cursor owned by a single caller; it is not `Sync`
/// or meant to be shared. Call [`Scanner::scan`] to advance and read the
/// `token_*` getters to inspect what was found. Calling `scan()` past the
/// end of input keeps returning [`TokenKind::Eof`] forever.
pub struct Scanner<'a> {
    text: &'a str,
    bytes: &'a [u8],
    ignore_trivia: bool,

    pos: usize,
    line: usize,
    line_start: usize,

    token: TokenKind,
    token_offset: usize,
    token_length: usize,
    token_value: Cow<'a, str>,
    token_error: ScanErrorCode,
    token_start_line: usize,
    token_start_character: usize,

    /// Decoded content produced by `scan_string`, consumed by `decode_value`
    /// on the same `scan()` call that produced it.
    pending_string_value: Option<Cow<'a, str>>,
}

/// Creates a scanner over `text`. When `ignore_trivia` is set, [`Scanner::scan`]
/// silently skips whitespace, line breaks and comments and returns the next
/// meaningful token.
pub fn create_scanner(text: &str, ignore_trivia: bool) -> Scanner<'_> {
    Scanner::new(text, ignore_trivia)
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str, ignore_trivia: bool) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
            ignore_trivia,
            pos: 0,
            line: 0,
            line_start: 0,
            token: TokenKind::Unknown,
            token_offset: 0,
            token_length: 0,
            token_value: Cow::Borrowed(""),
            token_error: ScanErrorCode::None,
            token_start_line: 0,
            token_start_character: 0,
            pending_string_value: None,
        }
    }

    /// Resets the scan cursor. The next call to [`Scanner::scan`] starts
    /// reading from `pos`; line tracking is recomputed from scratch, since a
    /// jump can land anywhere in the document.
    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos;
        self.line = 0;
        self.line_start = 0;

        for (i, b) in self.bytes.iter().enumerate() {
            if i >= pos {
                break;
            }
            if *b == NEWLINE {
                self.line += 1;
                self.line_start = i + 1;
            }
        }
    }

    pub fn token(&self) -> TokenKind {
        self.token
    }

    pub fn token_offset(&self) -> usize {
        self.token_offset
    }

    pub fn token_length(&self) -> usize {
        self.token_length
    }

    /// Decoded string content for [`TokenKind::StringLiteral`], the raw
    /// lexeme for other non-trivial tokens, empty otherwise.
    pub fn token_value(&self) -> &str {
        &self.token_value
    }

    pub fn token_start_line(&self) -> usize {
        self.token_start_line
    }

    pub fn token_start_character(&self) -> usize {
        self.token_start_character
    }

    pub fn token_error(&self) -> ScanErrorCode {
        self.token_error
    }

    /// Advances past the current token and returns the kind of the next one.
    /// With `ignore_trivia` set, this never returns a trivia kind.
    pub fn scan(&mut self) -> TokenKind {
        loop {
            let kind = self.scan_one();

            if !(self.ignore_trivia && kind.is_trivia()) {
                return kind;
            }
        }
    }

    fn scan_one(&mut self) -> TokenKind {
        let start = self.pos;
        let start_line = self.line;
        let start_character = start - self.line_start;

        self.token_error = ScanErrorCode::None;

        let (kind, end) = self.read_token(start);

        self.token = kind;
        self.token_offset = start;
        self.token_length = end - start;
        self.token_start_line = start_line;
        self.token_start_character = start_character;
        self.token_value = self.decode_value(kind, start, end);
        self.pos = end;

        kind
    }

    fn decode_value(&mut self, kind: TokenKind, start: usize, end: usize) -> Cow<'a, str> {
        // Whitespace, line breaks and EOF carry no information beyond their
        // kind and span. Comments are technically a trivia *kind* but their
        // content is what callers like `visit`'s `onComment` and
        // `strip_comments` actually need, so they keep their raw lexeme.
        match kind {
            TokenKind::Trivia | TokenKind::LineBreakTrivia | TokenKind::Eof => Cow::Borrowed(""),
            TokenKind::StringLiteral => {
                self.pending_string_value.take().unwrap_or(Cow::Borrowed(""))
            }
            _ => Cow::Borrowed(&self.text[start..end]),
        }
    }

    /// Reads one token starting at `start`, returning its kind and end offset.
    /// Also responsible for advancing `self.line`/`self.line_start` when the
    /// token spans embedded line breaks (block comments, multi-line strings).
    fn read_token(&mut self, start: usize) -> (TokenKind, usize) {
        let len = self.bytes.len();

        if start >= len {
            return (TokenKind::Eof, start);
        }

        let c = self.bytes[start];

        if c == OPEN_BRACE {
            return (TokenKind::OpenBrace, start + 1);
        }
        if c == CLOSE_BRACE {
            return (TokenKind::CloseBrace, start + 1);
        }
        if c == OPEN_BRACKET {
            return (TokenKind::OpenBracket, start + 1);
        }
        if c == CLOSE_BRACKET {
            return (TokenKind::CloseBracket, start + 1);
        }
        if c == COMMA {
            return (TokenKind::Comma, start + 1);
        }
        if c == COLON {
            return (TokenKind::Colon, start + 1);
        }

        if c == SPACE || c == TAB {
            let mut i = start;
            while i < len && (self.bytes[i] == SPACE || self.bytes[i] == TAB) {
                i += 1;
            }
            return (TokenKind::Trivia, i);
        }

        if let Some(break_len) = scan_line_break(self.bytes, start) {
            let end = start + break_len;
            self.line += 1;
            self.line_start = end;
            return (TokenKind::LineBreakTrivia, end);
        }

        if c == DOUBLE_QUOTE {
            let (end, value, error) = scan_string(self.bytes, self.text, start);
            self.token_error = error;
            self.pending_string_value = Some(value);
            return (TokenKind::StringLiteral, end);
        }

        if c == SLASH && self.bytes.get(start + 1) == Some(&SLASH) {
            let mut i = start + 2;
            while i < len && scan_line_break(self.bytes, i).is_none() {
                i += 1;
            }
            return (TokenKind::LineCommentTrivia, i);
        }

        if c == SLASH && self.bytes.get(start + 1) == Some(&ASTERISK) {
            return self.scan_block_comment(start);
        }

        if c.is_ascii_digit() || (c == MINUS && self.bytes.get(start + 1).is_some_and(u8::is_ascii_digit)) {
            let (end, error) = scan_number(self.bytes, start);
            self.token_error = error;
            return (TokenKind::NumericLiteral, end);
        }

        if is_word_start(c) {
            let mut i = start + 1;
            while i < len && is_word_part(self.bytes[i]) {
                i += 1;
            }

            return match &self.text[start..i] {
                "true" => (TokenKind::TrueKeyword, i),
                "false" => (TokenKind::FalseKeyword, i),
                "null" => (TokenKind::NullKeyword, i),
                _ => (TokenKind::Unknown, i),
            };
        }

        // Any other single character (including a bare `-`, a bare `/`, and
        // any non-ASCII character not part of a string or comment) is an
        // Unknown token of exactly one code point.
        let char_len = self.text[start..].chars().next().map_or(1, char::len_utf8);
        (TokenKind::Unknown, start + char_len)
    }

    fn scan_block_comment(&mut self, start: usize) -> (TokenKind, usize) {
        let len = self.bytes.len();
        let mut i = start + 2;

        loop {
            if i >= len {
                self.token_error = ScanErrorCode::UnexpectedEndOfComment;
                return (TokenKind::BlockCommentTrivia, i);
            }

            if let Some(break_len) = scan_line_break(self.bytes, i) {
                i += break_len;
                self.line += 1;
                self.line_start = i;
                continue;
            }

            if self.bytes[i] == ASTERISK && self.bytes.get(i + 1) == Some(&SLASH) {
                return (TokenKind::BlockCommentTrivia, i + 2);
            }

            i += 1;
        }
    }
}

fn scan_line_break(bytes: &[u8], pos: usize) -> Option<usize> {
    match bytes.get(pos) {
        Some(&NEWLINE) => Some(1),
        Some(&CARRIAGE_RETURN) => {
            if bytes.get(pos + 1) == Some(&NEWLINE) {
                Some(2)
            } else {
                Some(1)
            }
        }
        _ => None,
    }
}

fn is_word_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_' || c == b'$'
}

fn is_word_part(c: u8) -> bool {
    is_word_start(c) || c.is_ascii_digit()
}

/// Matches `-?(0|[1-9][0-9]*)(\.[0-9]+)?([eE][+-]?[0-9]+)?`, with the
/// following recovery behavior:
///
/// - A leading `0` directly followed by another digit stops the token after
///   the `0`; the remaining digits are scanned as a separate token on the
///   next call.
/// - A `.` not followed by at least one digit, or an `e`/`E` (with optional
///   sign) not followed by at least one digit, ends the token where the
///   scan got stuck and reports [`ScanErrorCode::UnexpectedEndOfNumber`].
///
/// The caller has already checked that `bytes[start]` is a digit, or `-`
/// followed by a digit.
fn scan_number(bytes: &[u8], start: usize) -> (usize, ScanErrorCode) {
    let len = bytes.len();
    let mut i = start;

    if bytes[i] == MINUS {
        i += 1;
    }

    if bytes[i] == b'0' {
        i += 1;

        if i < len && bytes[i].is_ascii_digit() {
            return (i, ScanErrorCode::None);
        }
    } else {
        i += 1;
        while i < len && bytes[i].is_ascii_digit() {
            i += 1;
        }
    }

    if i < len && bytes[i] == b'.' {
        i += 1;

        if i >= len || !bytes[i].is_ascii_digit() {
            return (i, ScanErrorCode::UnexpectedEndOfNumber);
        }

        while i < len && bytes[i].is_ascii_digit() {
            i += 1;
        }
    }

    if i < len && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;

        if i < len && (bytes[i] == b'+' || bytes[i] == MINUS) {
            i += 1;
        }

        if i >= len || !bytes[i].is_ascii_digit() {
            return (i, ScanErrorCode::UnexpectedEndOfNumber);
        }

        while i < len && bytes[i].is_ascii_digit() {
            i += 1;
        }
    }

    (i, ScanErrorCode::None)
}

/// Scans a double-quoted string starting at `bytes[start] == '"'`, decoding
/// escapes as it goes. Returns the token's end offset (past the closing
/// quote, or at the point scanning gave up), the decoded content, and a
/// scan error if one occurred.
fn scan_string<'a>(bytes: &[u8], text: &'a str, start: usize) -> (usize, Cow<'a, str>, ScanErrorCode) {
    let len = bytes.len();
    let mut i = start + 1;
    let mut plain_start = i;
    let mut owned: Option<String> = None;
    let mut error = ScanErrorCode::None;
    let content_end;
    let token_end;

    loop {
        if i >= len {
            if let Some(s) = owned.as_mut() {
                s.push_str(&text[plain_start..i]);
            }
            error = ScanErrorCode::UnexpectedEndOfString;
            content_end = i;
            token_end = i;
            break;
        }

        let c = bytes[i];

        if c == DOUBLE_QUOTE {
            if let Some(s) = owned.as_mut() {
                s.push_str(&text[plain_start..i]);
            }
            content_end = i;
            token_end = i + 1;
            break;
        }

        if c == NEWLINE || c == CARRIAGE_RETURN {
            if let Some(s) = owned.as_mut() {
                s.push_str(&text[plain_start..i]);
            }
            error = ScanErrorCode::UnexpectedEndOfString;
            content_end = i;
            token_end = i; // the line break itself is not consumed
            break;
        }

        if c == BACKSLASH {
            {
                let buf = owned.get_or_insert_with(String::new);
                buf.push_str(&text[plain_start..i]);
            }

            i += 1;

            if i >= len {
                error = ScanErrorCode::UnexpectedEndOfString;
                content_end = i;
                token_end = i;
                break;
            }

            match bytes[i] {
                b'"' => {
                    owned.as_mut().unwrap().push('"');
                    i += 1;
                }
                b'\\' => {
                    owned.as_mut().unwrap().push('\\');
                    i += 1;
                }
                b'/' => {
                    owned.as_mut().unwrap().push('/');
                    i += 1;
                }
                b'b' => {
                    owned.as_mut().unwrap().push('\u{8}');
                    i += 1;
                }
                b'f' => {
                    owned.as_mut().unwrap().push('\u{c}');
                    i += 1;
                }
                b'n' => {
                    owned.as_mut().unwrap().push('\n');
                    i += 1;
                }
                b'r' => {
                    owned.as_mut().unwrap().push('\r');
                    i += 1;
                }
                b't' => {
                    owned.as_mut().unwrap().push('\t');
                    i += 1;
                }
                b'u' => {
                    i += 1;

                    let hex_ok = i + 4 <= len && bytes[i..i + 4].iter().all(u8::is_ascii_hexdigit);

                    if hex_ok {
                        let code =
                            u32::from_str_radix(std::str::from_utf8(&bytes[i..i + 4]).unwrap(), 16)
                                .unwrap();
                        owned
                            .as_mut()
                            .unwrap()
                            .push(char::from_u32(code).unwrap_or('\u{FFFD}'));
                        i += 4;
                    } else {
                        if error == ScanErrorCode::None {
                            error = ScanErrorCode::InvalidUnicode;
                        }
                        while i < len && bytes[i].is_ascii_hexdigit() {
                            i += 1;
                        }
                    }
                }
                _ => {
                    // \v and anything else not in the supported escape set.
                    if error == ScanErrorCode::None {
                        error = ScanErrorCode::InvalidEscapeCharacter;
                    }
                    i += 1;
                }
            }

            plain_start = i;
            continue;
        }

        if c < 0x20 {
            {
                let buf = owned.get_or_insert_with(String::new);
                buf.push_str(&text[plain_start..i]);
                buf.push(c as char);
            }
            if error == ScanErrorCode::None {
                error = ScanErrorCode::InvalidCharacter;
            }
            i += 1;
            plain_start = i;
            continue;
        }

        i += 1;
    }

    let value = match owned {
        Some(s) => Cow::Owned(s),
        None => Cow::Borrowed(&text[plain_start..content_end]),
    };

    (token_end, value, error)
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Strips the common leading indentation from a test fixture written as
    /// an indented multi-line raw string literal.
    fn dedent(text: &str) -> String {
        let mut text = textwrap::dedent(text).trim().to_string();
        text.push('\n');
        text
    }

    fn tokens(text: &str) -> Vec<(TokenKind, usize, usize)> {
        let mut scanner = create_scanner(text, false);
        let mut out = vec![];

        loop {
            let kind = scanner.scan();
            out.push((kind, scanner.token_offset(), scanner.token_length()));

            if kind == TokenKind::Eof {
                break;
            }
        }

        out
    }

    #[test]
    fn braces_produce_open_close_eof_tokens() {
        assert_eq!(
            tokens("{}"),
            vec![
                (TokenKind::OpenBrace, 0, 1),
                (TokenKind::CloseBrace, 1, 1),
                (TokenKind::Eof, 2, 0),
            ]
        );
    }

    #[test]
    fn token_coverage_invariant() {
        // Invariant 1: concatenation of lexemes equals the input, and
        // invariant 2: consecutive tokens are contiguous.
        let text = r#"{ "foo": [1, -0.5e10, true, null], /* x */ "bar" // y
        }"#;
        let mut scanner = create_scanner(text, false);
        let mut reconstructed = String::new();
        let mut prev_end: Option<usize> = None;

        loop {
            let kind = scanner.scan();
            let offset = scanner.token_offset();

            if let Some(prev_end) = prev_end {
                assert_eq!(prev_end, offset);
            }

            reconstructed.push_str(&text[offset..offset + scanner.token_length()]);
            prev_end = Some(offset + scanner.token_length());

            if kind == TokenKind::Eof {
                assert_eq!(scanner.token_length(), 0);
                break;
            }
        }

        assert_eq!(reconstructed, text);
    }

    #[test]
    fn decodes_string_escapes() {
        let mut scanner = create_scanner(r#""a\nb\tcA\"d""#, false);
        assert_eq!(scanner.scan(), TokenKind::StringLiteral);
        assert_eq!(scanner.token_value(), "a\nb\tcA\"d");
        assert_eq!(scanner.token_error(), ScanErrorCode::None);
    }

    #[test]
    fn invalid_escape_character() {
        let mut scanner = create_scanner(r#""a\vb""#, false);
        assert_eq!(scanner.scan(), TokenKind::StringLiteral);
        assert_eq!(scanner.token_error(), ScanErrorCode::InvalidEscapeCharacter);
    }

    #[test]
    fn unterminated_string_at_line_break() {
        let mut scanner = create_scanner("\"abc\ndef\"", false);
        assert_eq!(scanner.scan(), TokenKind::StringLiteral);
        assert_eq!(scanner.token_error(), ScanErrorCode::UnexpectedEndOfString);
        assert_eq!(scanner.token_value(), "abc");
        // The line break itself was not consumed.
        assert_eq!(scanner.scan(), TokenKind::LineBreakTrivia);
    }

    #[test]
    fn leading_zero_splits_into_two_tokens() {
        let mut scanner = create_scanner("012", false);
        assert_eq!(scanner.scan(), TokenKind::NumericLiteral);
        assert_eq!(scanner.token_value(), "0");
        assert_eq!(scanner.scan(), TokenKind::NumericLiteral);
        assert_eq!(scanner.token_value(), "12");
    }

    #[test]
    fn bare_minus_is_unknown() {
        let mut scanner = create_scanner("- 1", false);
        assert_eq!(scanner.scan(), TokenKind::Unknown);
        assert_eq!(scanner.token_value(), "-");
    }

    #[test]
    fn bare_dot_then_number() {
        let mut scanner = create_scanner(".0", false);
        assert_eq!(scanner.scan(), TokenKind::Unknown);
        assert_eq!(scanner.token_value(), ".");
        assert_eq!(scanner.scan(), TokenKind::NumericLiteral);
        assert_eq!(scanner.token_value(), "0");
    }

    #[test]
    fn incomplete_number_after_dot() {
        let mut scanner = create_scanner("1.", false);
        assert_eq!(scanner.scan(), TokenKind::NumericLiteral);
        assert_eq!(scanner.token_error(), ScanErrorCode::UnexpectedEndOfNumber);
    }

    #[test]
    fn keywords_are_case_sensitive() {
        let mut scanner = create_scanner("True false", false);
        assert_eq!(scanner.scan(), TokenKind::Unknown);
        assert_eq!(scanner.token_value(), "True");
        scanner.scan(); // whitespace
        assert_eq!(scanner.scan(), TokenKind::FalseKeyword);
    }

    #[test]
    fn line_and_block_comments() {
        let mut scanner = create_scanner("// hi\n/* a\nb */true", false);
        assert_eq!(scanner.scan(), TokenKind::LineCommentTrivia);
        assert_eq!(scanner.token_value(), "// hi");
        assert_eq!(scanner.scan(), TokenKind::LineBreakTrivia);
        assert_eq!(scanner.scan(), TokenKind::BlockCommentTrivia);
        assert_eq!(scanner.token_start_line(), 1);
        assert_eq!(scanner.scan(), TokenKind::TrueKeyword);
        assert_eq!(scanner.token_start_line(), 2);
        assert_eq!(scanner.token_start_character(), 4);
    }

    #[test]
    fn unterminated_block_comment() {
        let mut scanner = create_scanner("/* never closes", false);
        assert_eq!(scanner.scan(), TokenKind::BlockCommentTrivia);
        assert_eq!(scanner.token_error(), ScanErrorCode::UnexpectedEndOfComment);
    }

    #[test]
    fn ignore_trivia_skips_whitespace_and_comments() {
        let mut scanner = create_scanner(" // hi\n  true  ", true);
        assert_eq!(scanner.scan(), TokenKind::TrueKeyword);
        assert_eq!(scanner.scan(), TokenKind::Eof);
    }

    #[test]
    fn lone_slash_is_unknown() {
        let mut scanner = create_scanner("/x", false);
        assert_eq!(scanner.scan(), TokenKind::Unknown);
        assert_eq!(scanner.token_value(), "/");
    }

    #[test]
    fn indented_fixture_tokenizes_like_its_dedented_form() {
        // Written indented for readability; `dedent` strips the common
        // leading whitespace before tokenizing.
        let text = dedent(
            r#"
            {
                "name": "jsonc",
                // a trailing remark
                "tags": ["parser", "formatter"]
            }
            "#,
        );

        assert_eq!(tokens(&text).first().unwrap().0, TokenKind::OpenBrace);
        assert!(tokens(&text).iter().any(|(k, ..)| *k == TokenKind::LineCommentTrivia));
    }

    #[test]
    fn eof_repeats_forever() {
        let mut scanner = create_scanner("", false);
        for _ in 0..3 {
            assert_eq!(scanner.scan(), TokenKind::Eof);
            assert_eq!(scanner.token_length(), 0);
        }
    }
}
