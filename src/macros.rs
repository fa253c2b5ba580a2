//! Utility macros for the lexer.
//!
//! - `MK_TOKEN!` - Creates a Token instance
//! - `MK_DEFAULT_HANDLER!` - Creates a lexer handler for fixed punctuation

/// Creates a Token instance.
///
/// # Arguments
///
/// * `$kind` - The TokenKind
/// * `$value` - The token's lexeme, or its decoded name for identifiers
/// * `$literal` - The decoded constant, if the token carries one
/// * `$span` - The source span
///
/// # Example
///
/// ```ignore
/// let token = MK_TOKEN!(TokenKind::IntConst, "42".to_string(), Some(Constant::Int(42)), span);
/// ```
#[macro_export]
macro_rules! MK_TOKEN {
    ($kind:expr, $value:expr, $literal:expr, $span:expr) => {
        Token {
            kind: $kind,
            value: $value,
            literal: $literal,
            span: $span,
        }
    };
}

/// Creates a lexer handler for a single fixed punctuation token.
///
/// The handler emits a token of `$kind` with `$value` as its lexeme and moves the
/// lexer past it.
///
/// # Example
///
/// ```ignore
/// RegexPattern {
///     regex: Regex::new("^;").unwrap(),
///     handler: MK_DEFAULT_HANDLER!(TokenKind::Semicolon, ";"),
/// }
/// ```
#[macro_export]
macro_rules! MK_DEFAULT_HANDLER {
    ($kind:expr, $value:literal) => {
        |lexer: &mut Lexer, _matched: &str| -> Result<(), Error> {
            lexer.emit($kind, String::from($value), None, $value.len());
            Ok(())
        }
    };
}
