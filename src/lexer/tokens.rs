use lazy_static::lazy_static;
use std::{collections::HashMap, fmt::Display};

use crate::{types::types::Constant, Span};

lazy_static! {
    /// CDL keywords, matched case-insensitively against identifier lexemes.
    pub static ref RESERVED_LOOKUP: HashMap<&'static str, TokenKind> = {
        let mut map = HashMap::new();
        map.insert("byte", TokenKind::Byte);
        map.insert("char", TokenKind::Char);
        map.insert("short", TokenKind::Short);
        map.insert("int", TokenKind::Int);
        map.insert("integer", TokenKind::Int);
        map.insert("long", TokenKind::Int);
        map.insert("float", TokenKind::Float);
        map.insert("real", TokenKind::Float);
        map.insert("double", TokenKind::Double);
        map.insert("unlimited", TokenKind::Unlimited);
        map
    };
}

pub const TYPE_KEYWORDS: [TokenKind; 6] = [
    TokenKind::Byte,
    TokenKind::Char,
    TokenKind::Short,
    TokenKind::Int,
    TokenKind::Float,
    TokenKind::Double,
];

pub const CONSTANT_KINDS: [TokenKind; 6] = [
    TokenKind::ByteConst,
    TokenKind::ShortConst,
    TokenKind::IntConst,
    TokenKind::FloatConst,
    TokenKind::DoubleConst,
    TokenKind::TermString,
];

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    EOF,

    /// `netcdf <name>`; the token value is the dataset name.
    Netcdf,
    Dimensions,
    Variables,
    Data,

    Identifier,
    /// The `_` placeholder in a data list.
    FillValue,

    TermString,
    ByteConst,
    ShortConst,
    IntConst,
    FloatConst,
    DoubleConst,

    OpenCurly,
    CloseCurly,
    OpenParen,
    CloseParen,
    Equals,
    Comma,
    Colon,
    Semicolon,

    // Reserved
    Byte,
    Char,
    Short,
    Int,
    Float,
    Double,
    Unlimited,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub literal: Option<Constant>,
    pub span: Span,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Token {{\nkind: {},\nvalue: {}}}", self.kind, self.value)
    }
}

impl Token {
    pub fn is_one_of_many(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.kind)
    }

    pub fn debug(&self) {
        match &self.literal {
            Some(literal) => tracing::trace!("{} ({})", self.kind, literal),
            None if self.is_one_of_many(&[TokenKind::Identifier, TokenKind::Netcdf]) => {
                tracing::trace!("{} ({})", self.kind, self.value)
            }
            None => tracing::trace!("{} ()", self.kind),
        }
    }
}
