use std::rc::Rc;

use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    errors::errors::{Error, ErrorImpl},
    types::types::{Constant, StorageType, FILL_STRING},
    Position, Span, MK_DEFAULT_HANDLER, MK_TOKEN,
};

use super::tokens::{Token, TokenKind, RESERVED_LOOKUP};

pub type RegexHandler = fn(&mut Lexer, &str) -> Result<(), Error>;

/// What to do with a character no pattern recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LexPolicy {
    /// Log a warning and skip the character.
    #[default]
    Skip,
    /// Stop with an `UnrecognisedToken` error.
    Fail,
}

pub struct RegexPattern {
    regex: Regex,
    handler: RegexHandler,
}

lazy_static! {
    /// Every pattern is anchored; the first one matching at the current offset wins,
    /// so the order below is significant.
    static ref PATTERNS: Vec<RegexPattern> = vec![
        RegexPattern { regex: Regex::new(r"^\n+").unwrap(), handler: newline_handler },
        RegexPattern { regex: Regex::new(r"^[ \t\r\x0C]+").unwrap(), handler: skip_handler },
        RegexPattern { regex: Regex::new(r"^(netcdf|NETCDF|netCDF)[ \t]+[^{]*").unwrap(), handler: netcdf_handler },
        RegexPattern { regex: Regex::new(r"^(?i:dimensions|variables|data):").unwrap(), handler: section_handler },
        RegexPattern { regex: Regex::new(r#"^"([^"\\]|\\.)*""#).unwrap(), handler: string_handler },
        RegexPattern { regex: Regex::new(r#"^""#).unwrap(), handler: unterminated_string_handler },
        RegexPattern { regex: Regex::new(r"^//[^\n]*").unwrap(), handler: skip_handler },
        RegexPattern {
            regex: Regex::new(
                r##"^(?:[a-zA-Z_]|[\x{80}-\x{5BF}\x{800}-\x{10FFFF}]|\\[0-9])(?:[a-zA-Z0-9_.@+\-]|[\x{80}-\x{5BF}\x{800}-\x{10FFFF}]|\\[ !"#$%&'()*,:;<=>?\[\\\]^`{|}~])*"##,
            )
            .unwrap(),
            handler: identifier_handler,
        },
        RegexPattern {
            regex: Regex::new(r"^(?:[+-]?[0-9]*\.[0-9]*(?:[eE][+-]?[0-9]+)?[Ff]|[+-]?[0-9]*[eE][+-]?[0-9]+[Ff])").unwrap(),
            handler: float_handler,
        },
        RegexPattern {
            regex: Regex::new(r"^(?:[+-]?[0-9]*\.[0-9]*(?:[eE][+-]?[0-9]+)?[LlDd]?|[+-]?[0-9]*[eE][+-]?[0-9]+[LlDd]?)").unwrap(),
            handler: double_handler,
        },
        RegexPattern { regex: Regex::new(r"^[+-]?(?:0[xX][0-9a-fA-F]+|[0-9]+)[sS]").unwrap(), handler: short_handler },
        RegexPattern {
            regex: Regex::new(r"^(?:[+-]?[0-9]+[Bb]|'[^\\]'|'\\[0-7][0-7]?[0-7]?'|'\\[xX][0-9a-fA-F][0-9a-fA-F]?'|'\\.')").unwrap(),
            handler: byte_handler,
        },
        RegexPattern { regex: Regex::new(r"^0[xX]?[0-9a-fA-F]+[lL]?").unwrap(), handler: radix_integer_handler },
        RegexPattern { regex: Regex::new(r"^[+-]?(?:[1-9][0-9]*|0)[lL]?").unwrap(), handler: decimal_integer_handler },
        RegexPattern { regex: Regex::new(r"^=").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Equals, "=") },
        RegexPattern { regex: Regex::new(r"^\{").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::OpenCurly, "{") },
        RegexPattern { regex: Regex::new(r"^\}").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::CloseCurly, "}") },
        RegexPattern { regex: Regex::new(r"^\(").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::OpenParen, "(") },
        RegexPattern { regex: Regex::new(r"^\)").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::CloseParen, ")") },
        RegexPattern { regex: Regex::new(r"^,").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Comma, ",") },
        RegexPattern { regex: Regex::new(r"^:").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Colon, ":") },
        RegexPattern { regex: Regex::new(r"^;").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Semicolon, ";") },
    ];
}

pub struct Lexer {
    tokens: Vec<Token>,
    source: String,
    pos: usize,
    line: u32,
    file: Rc<String>,
    policy: LexPolicy,
}

impl Lexer {
    pub fn new(source: String, file: Option<String>, policy: LexPolicy) -> Lexer {
        let file_name = if let Some(file) = file {
            Rc::new(file)
        } else {
            Rc::new(String::from("<source>"))
        };

        Lexer {
            tokens: vec![],
            source,
            pos: 0,
            line: 1,
            file: file_name,
            policy,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.pos as u32, self.line, Rc::clone(&self.file))
    }

    /// Pushes a token covering the next `len` bytes and moves past them.
    pub fn emit(&mut self, kind: TokenKind, value: String, literal: Option<Constant>, len: usize) {
        let span = Span {
            start: self.position(),
            end: Position::new((self.pos + len) as u32, self.line, Rc::clone(&self.file)),
        };

        let token = MK_TOKEN!(kind, value, literal, span);
        token.debug();
        self.tokens.push(token);
        self.advance_n(len);
    }

    pub fn advance_n(&mut self, n: usize) {
        self.pos += n;
    }

    pub fn remainder(&self) -> &str {
        &self.source[self.pos..]
    }

    pub fn at_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn count_lines(&mut self, text: &str) {
        self.line += text.matches('\n').count() as u32;
    }

    fn error(&self, error: ErrorImpl) -> Error {
        Error::new(error, self.position())
    }

    fn number_error(&self, matched: &str) -> Error {
        self.error(ErrorImpl::NumberParseError {
            token: matched.to_string(),
        })
    }

    fn unrecognised(&mut self) -> Result<(), Error> {
        let ch = self.remainder().chars().next().unwrap_or('\0');

        match self.policy {
            LexPolicy::Fail => Err(self.error(ErrorImpl::UnrecognisedToken {
                token: ch.to_string(),
            })),
            LexPolicy::Skip => {
                tracing::warn!("Illegal character {:?} at line {}", ch, self.line);
                self.advance_n(ch.len_utf8());
                Ok(())
            }
        }
    }
}

fn newline_handler(lexer: &mut Lexer, matched: &str) -> Result<(), Error> {
    lexer.line += matched.len() as u32;
    lexer.advance_n(matched.len());
    Ok(())
}

fn skip_handler(lexer: &mut Lexer, matched: &str) -> Result<(), Error> {
    lexer.advance_n(matched.len());
    Ok(())
}

fn netcdf_handler(lexer: &mut Lexer, matched: &str) -> Result<(), Error> {
    let Some(name) = matched.split_whitespace().nth(1) else {
        return Err(lexer.error(ErrorImpl::MissingDatasetName));
    };

    lexer.emit(TokenKind::Netcdf, deescape(name), None, matched.len());
    lexer.count_lines(matched);
    Ok(())
}

fn section_handler(lexer: &mut Lexer, matched: &str) -> Result<(), Error> {
    let section = matched.trim_end_matches(':').to_ascii_lowercase();
    let kind = match section.as_str() {
        "dimensions" => TokenKind::Dimensions,
        "variables" => TokenKind::Variables,
        _ => TokenKind::Data,
    };

    lexer.emit(kind, section, None, matched.len());
    Ok(())
}

fn string_handler(lexer: &mut Lexer, matched: &str) -> Result<(), Error> {
    let text = unescape(&matched[1..matched.len() - 1]);

    lexer.emit(
        TokenKind::TermString,
        matched.to_string(),
        Some(Constant::Text(text)),
        matched.len(),
    );
    lexer.count_lines(matched);
    Ok(())
}

fn unterminated_string_handler(lexer: &mut Lexer, _matched: &str) -> Result<(), Error> {
    Err(lexer.error(ErrorImpl::UnterminatedString))
}

fn identifier_handler(lexer: &mut Lexer, matched: &str) -> Result<(), Error> {
    if matched == FILL_STRING {
        lexer.emit(TokenKind::FillValue, matched.to_string(), None, matched.len());
        return Ok(());
    }

    let lowered = matched.to_ascii_lowercase();
    if let Some(kind) = RESERVED_LOOKUP.get(lowered.as_str()) {
        lexer.emit(*kind, lowered, None, matched.len());
    } else {
        lexer.emit(TokenKind::Identifier, deescape(matched), None, matched.len());
    }

    Ok(())
}

fn float_handler(lexer: &mut Lexer, matched: &str) -> Result<(), Error> {
    let body = &matched[..matched.len() - 1];
    let value = body
        .parse::<f32>()
        .map_err(|_| lexer.number_error(matched))?;

    lexer.emit(
        TokenKind::FloatConst,
        matched.to_string(),
        Some(Constant::Float(value)),
        matched.len(),
    );
    Ok(())
}

fn double_handler(lexer: &mut Lexer, matched: &str) -> Result<(), Error> {
    let body = strip_suffix(matched, &['l', 'L', 'd', 'D']);
    let value = body
        .parse::<f64>()
        .map_err(|_| lexer.number_error(matched))?;

    lexer.emit(
        TokenKind::DoubleConst,
        matched.to_string(),
        Some(Constant::Double(value)),
        matched.len(),
    );
    Ok(())
}

fn short_handler(lexer: &mut Lexer, matched: &str) -> Result<(), Error> {
    let body = &matched[..matched.len() - 1];
    let value = parse_c_integer(body).ok_or_else(|| lexer.number_error(matched))?;
    let value = check_range(lexer, StorageType::Short, value, matched)?;

    lexer.emit(
        TokenKind::ShortConst,
        matched.to_string(),
        Some(Constant::Short(value as i16)),
        matched.len(),
    );
    Ok(())
}

fn byte_handler(lexer: &mut Lexer, matched: &str) -> Result<(), Error> {
    let value = if matched.starts_with('\'') {
        let body = &matched[1..matched.len() - 1];
        // `\x` needs at least one hex digit.
        if body.eq_ignore_ascii_case("\\x") {
            return Err(lexer.number_error(matched));
        }
        let decoded = unescape(body);
        let mut chars = decoded.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) => ch as i128,
            _ => return Err(lexer.number_error(matched)),
        }
    } else {
        // A leading zero does not mean octal here.
        matched[..matched.len() - 1]
            .parse::<i128>()
            .map_err(|_| lexer.number_error(matched))?
    };
    let value = check_range(lexer, StorageType::Byte, value, matched)?;

    lexer.emit(
        TokenKind::ByteConst,
        matched.to_string(),
        Some(Constant::Byte(value as i8)),
        matched.len(),
    );
    Ok(())
}

fn radix_integer_handler(lexer: &mut Lexer, matched: &str) -> Result<(), Error> {
    let body = strip_suffix(matched, &['l', 'L']);

    match parse_c_integer(body) {
        Some(value) => emit_integer(lexer, matched, value as f64, i32::try_from(value).ok()),
        None => {
            let value = parse_radix_f64(body).ok_or_else(|| lexer.number_error(matched))?;
            emit_integer(lexer, matched, value, None);
        }
    }

    Ok(())
}

fn decimal_integer_handler(lexer: &mut Lexer, matched: &str) -> Result<(), Error> {
    let body = strip_suffix(matched, &['l', 'L']);

    match body.parse::<i128>() {
        Ok(value) => emit_integer(lexer, matched, value as f64, i32::try_from(value).ok()),
        Err(_) => {
            let value = body
                .parse::<f64>()
                .map_err(|_| lexer.number_error(matched))?;
            emit_integer(lexer, matched, value, None);
        }
    }

    Ok(())
}

/// Legacy behaviour kept for compatibility: an integer outside the signed 32-bit
/// range becomes a double constant instead of failing. `int` is `None` when the
/// value does not fit.
fn emit_integer(lexer: &mut Lexer, matched: &str, value: f64, int: Option<i32>) {
    match int {
        Some(int) => lexer.emit(
            TokenKind::IntConst,
            matched.to_string(),
            Some(Constant::Int(int)),
            matched.len(),
        ),
        _ => lexer.emit(
            TokenKind::DoubleConst,
            matched.to_string(),
            Some(Constant::Double(value)),
            matched.len(),
        ),
    }
}

fn check_range(
    lexer: &Lexer,
    storage_type: StorageType,
    value: i128,
    matched: &str,
) -> Result<i64, Error> {
    let (min, max) = storage_type.range().unwrap_or((i64::MIN, i64::MAX));

    match i64::try_from(value) {
        Ok(value) if (min..=max).contains(&value) => Ok(value),
        _ => Err(lexer.error(ErrorImpl::NumberOutOfRange {
            token: matched.to_string(),
            type_: storage_type.name().to_string(),
            min,
            max,
        })),
    }
}

fn strip_suffix<'a>(text: &'a str, suffixes: &[char]) -> &'a str {
    text.strip_suffix(suffixes).unwrap_or(text)
}

/// Parses an integer with C literal rules: `0x` prefix for hex, a leading `0` for
/// octal, decimal otherwise.
fn parse_c_integer(text: &str) -> Option<i128> {
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let magnitude = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        i128::from_str_radix(hex, 16).ok()?
    } else if digits.len() > 1 && digits.starts_with('0') {
        i128::from_str_radix(&digits[1..], 8).ok()?
    } else {
        digits.parse::<i128>().ok()?
    };

    Some(if negative { -magnitude } else { magnitude })
}

/// Accumulates a hex or octal literal too wide for `i128` as a double.
fn parse_radix_f64(text: &str) -> Option<f64> {
    let (radix, digits) = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => (16, hex),
        None => (8, text.strip_prefix('0')?),
    };
    if digits.is_empty() {
        return None;
    }

    digits.chars().try_fold(0.0_f64, |value, ch| {
        ch.to_digit(radix)
            .map(|digit| value * radix as f64 + digit as f64)
    })
}

/// Decodes C escape sequences. Unknown escapes yield the escaped character.
fn unescape(text: &str) -> String {
    let mut result = String::new();
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }

        let Some(next_ch) = chars.next() else {
            result.push(ch); // Keep the lone backslash
            break;
        };

        match next_ch {
            'n' => result.push('\n'),
            't' => result.push('\t'),
            'r' => result.push('\r'),
            'b' => result.push('\x08'),
            'f' => result.push('\x0C'),
            'v' => result.push('\x0B'),
            'a' => result.push('\x07'),
            '0'..='7' => {
                let mut value = next_ch.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(digit) => {
                            value = value * 8 + digit;
                            chars.next();
                        }
                        None => break,
                    }
                }
                result.extend(char::from_u32(value));
            }
            'x' | 'X' => {
                let mut hex = String::new();
                while hex.len() < 2 {
                    match chars.peek() {
                        Some(c) if c.is_ascii_hexdigit() => {
                            hex.push(*c);
                            chars.next();
                        }
                        _ => break,
                    }
                }

                match u32::from_str_radix(&hex, 16) {
                    Ok(value) => result.extend(char::from_u32(value)),
                    Err(_) => result.push(next_ch),
                }
            }
            other => result.push(other),
        }
    }

    result
}

/// Removes the backslashes that escape special characters in a name.
fn deescape(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut chars = name.chars();

    while let Some(ch) = chars.next() {
        if ch == '\\' {
            result.extend(chars.next());
        } else {
            result.push(ch);
        }
    }

    result
}

pub fn tokenize(source: String, file: Option<String>) -> Result<Vec<Token>, Error> {
    tokenize_with(source, file, LexPolicy::default())
}

pub fn tokenize_with(
    source: String,
    file: Option<String>,
    policy: LexPolicy,
) -> Result<Vec<Token>, Error> {
    let mut lex = Lexer::new(source, file, policy);

    while !lex.at_eof() {
        let matched = PATTERNS.iter().find_map(|pattern| {
            pattern
                .regex
                .find(lex.remainder())
                .map(|found| (pattern.handler, found.as_str().to_string()))
        });

        match matched {
            Some((handler, text)) => handler(&mut lex, &text)?,
            None => lex.unrecognised()?,
        }
    }

    let position = lex.position();
    lex.tokens.push(MK_TOKEN!(
        TokenKind::EOF,
        String::from("EOF"),
        None,
        Span {
            start: position.clone(),
            end: position
        }
    ));
    Ok(lex.tokens)
}
