use std::collections::HashMap;

use crate::{
    backend::Backend,
    errors::errors::Error,
    lexer::tokens::{TokenKind, TYPE_KEYWORDS},
};

use super::{
    decl::{parse_attr_decl, parse_global_attr_decl, parse_var_decl},
    parser::Parser,
};

pub type DeclHandler<B> = fn(&mut Parser<B>) -> Result<(), Error>;

pub fn create_decl_lookups<B: Backend>(parser: &mut Parser<B>) {
    for kind in TYPE_KEYWORDS {
        parser.decl(kind, parse_var_decl);
    }

    parser.decl(TokenKind::Identifier, parse_attr_decl);
    parser.decl(TokenKind::Colon, parse_global_attr_decl);
}

/// Variables-section handlers keyed on the token that starts the statement.
pub type DeclLookup<B> = HashMap<TokenKind, DeclHandler<B>>;
