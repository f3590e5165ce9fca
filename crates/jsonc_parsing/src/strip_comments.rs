use jsonc_lexing::{create_scanner, TokenKind};

/// Replaces every comment in `text` with `replace_ch`, preserving embedded
/// line breaks so line numbers in the result still line up with the input
/// so the result is easy to re-scan. Everything outside comments is copied
/// through unchanged.
pub fn strip_comments(text: &str, replace_ch: char) -> String {
    let mut scanner = create_scanner(text, false);
    let mut out = String::with_capacity(text.len());
    let mut copied_up_to = 0usize;

    loop {
        let kind = scanner.scan();
        let start = scanner.token_offset();
        let end = start + scanner.token_length();

        if matches!(kind, TokenKind::LineCommentTrivia | TokenKind::BlockCommentTrivia) {
            out.push_str(&text[copied_up_to..start]);
            for ch in text[start..end].chars() {
                if ch == '\n' || ch == '\r' {
                    out.push(ch);
                } else {
                    out.push(replace_ch);
                }
            }
            copied_up_to = end;
        }

        if kind == TokenKind::Eof {
            out.push_str(&text[copied_up_to..start]);
            break;
        }
    }

    out
}
