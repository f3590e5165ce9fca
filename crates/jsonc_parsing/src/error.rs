use std::fmt;

use jsonc_lexing::ScanErrorCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorCode {
    InvalidSymbol,
    InvalidNumberFormat,
    PropertyNameExpected,
    ValueExpected,
    ColonExpected,
    CommaExpected,
    CloseBraceExpected,
    CloseBracketExpected,
    EndOfFileExpected,
    InvalidCommentToken,
    UnexpectedEndOfComment,
    UnexpectedEndOfString,
    UnexpectedEndOfNumber,
    InvalidUnicode,
    InvalidEscapeCharacter,
    InvalidCharacter,
}

impl ParseErrorCode {
    /// A stable, human-readable name for this error code — the name, not a
    /// sentence, so editor UIs can show it directly next to a squiggle.
    pub fn name(self) -> &'static str {
        match self {
            ParseErrorCode::InvalidSymbol => "InvalidSymbol",
            ParseErrorCode::InvalidNumberFormat => "InvalidNumberFormat",
            ParseErrorCode::PropertyNameExpected => "PropertyNameExpected",
            ParseErrorCode::ValueExpected => "ValueExpected",
            ParseErrorCode::ColonExpected => "ColonExpected",
            ParseErrorCode::CommaExpected => "CommaExpected",
            ParseErrorCode::CloseBraceExpected => "CloseBraceExpected",
            ParseErrorCode::CloseBracketExpected => "CloseBracketExpected",
            ParseErrorCode::EndOfFileExpected => "EndOfFileExpected",
            ParseErrorCode::InvalidCommentToken => "InvalidCommentToken",
            ParseErrorCode::UnexpectedEndOfComment => "UnexpectedEndOfComment",
            ParseErrorCode::UnexpectedEndOfString => "UnexpectedEndOfString",
            ParseErrorCode::UnexpectedEndOfNumber => "UnexpectedEndOfNumber",
            ParseErrorCode::InvalidUnicode => "InvalidUnicode",
            ParseErrorCode::InvalidEscapeCharacter => "InvalidEscapeCharacter",
            ParseErrorCode::InvalidCharacter => "InvalidCharacter",
        }
    }
}

impl fmt::Display for ParseErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Human-readable name for a [`ParseErrorCode`], e.g. `"PropertyNameExpected"`.
pub fn print_parse_error_code(code: ParseErrorCode) -> &'static str {
    code.name()
}

/// A recoverable parse error, with enough context for an editor to render a
/// squiggle without re-parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseError {
    pub code: ParseErrorCode,
    pub offset: usize,
    pub length: usize,
    pub start_line: usize,
    pub start_character: usize,
}

impl ParseError {
    pub fn new(
        code: ParseErrorCode,
        offset: usize,
        length: usize,
        start_line: usize,
        start_character: usize,
    ) -> Self {
        Self {
            code,
            offset,
            length,
            start_line,
            start_character,
        }
    }
}

/// Translates a scan error into the matching parse error code. `None` has no
/// matching parse error code since it denotes the absence of a scan error.
pub fn scan_error_code(error: ScanErrorCode) -> Option<ParseErrorCode> {
    match error {
        ScanErrorCode::None => None,
        ScanErrorCode::UnexpectedEndOfComment => Some(ParseErrorCode::UnexpectedEndOfComment),
        ScanErrorCode::UnexpectedEndOfString => Some(ParseErrorCode::UnexpectedEndOfString),
        ScanErrorCode::UnexpectedEndOfNumber => Some(ParseErrorCode::UnexpectedEndOfNumber),
        ScanErrorCode::InvalidUnicode => Some(ParseErrorCode::InvalidUnicode),
        ScanErrorCode::InvalidEscapeCharacter => Some(ParseErrorCode::InvalidEscapeCharacter),
        ScanErrorCode::InvalidCharacter => Some(ParseErrorCode::InvalidCharacter),
    }
}
