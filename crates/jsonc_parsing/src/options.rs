/// Options controlling how tolerant a parse pass is.
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    /// Report comments as [`crate::ParseErrorCode::InvalidCommentToken`]
    /// instead of accepting them.
    pub disallow_comments: bool,
    /// Accept a trailing comma before a closing `}`/`]` without error.
    pub allow_trailing_comma: bool,
    /// Accept a document that is empty or contains only whitespace/comments
    /// as `Value::Null` / an empty tree, instead of reporting
    /// [`crate::ParseErrorCode::ValueExpected`].
    pub allow_empty_content: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            disallow_comments: false,
            allow_trailing_comma: false,
            allow_empty_content: false,
        }
    }
}
