//! Parser state and the parse entry point.
//!
//! The parser walks the token vector once. Declarations in the variables section
//! are dispatched through a lookup table keyed on the leading token kind; every
//! recognised declaration is handed to the [`Builder`] immediately.

use std::{collections::HashMap, rc::Rc};

use crate::{
    backend::Backend,
    builder::builder::Builder,
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::{Token, TokenKind},
    Position, Span,
};

use super::{
    decl::parse_dataset,
    lookups::{create_decl_lookups, DeclHandler, DeclLookup},
};

pub struct Parser<B: Backend> {
    /// The list of tokens to parse, always ending in `EOF`
    tokens: Vec<Token>,
    /// Current position in the token stream
    pos: usize,
    /// The name of the source file being parsed
    file: Rc<String>,
    /// Handlers for the statements of the variables section
    decl_lookup: DeclLookup<B>,
    builder: Builder<B>,
}

impl<B: Backend> Parser<B> {
    pub fn new(mut tokens: Vec<Token>, file: Rc<String>, builder: Builder<B>) -> Self {
        if tokens.last().map(|token| token.kind) != Some(TokenKind::EOF) {
            let end = tokens
                .last()
                .map(|token| token.span.end.clone())
                .unwrap_or_else(|| Position::new(0, 1, Rc::clone(&file)));

            tokens.push(Token {
                kind: TokenKind::EOF,
                value: String::from("EOF"),
                literal: None,
                span: Span {
                    start: end.clone(),
                    end,
                },
            });
        }

        Parser {
            tokens,
            pos: 0,
            file,
            decl_lookup: HashMap::new(),
            builder,
        }
    }

    /// Returns the current token without advancing. Past the end this is `EOF`.
    pub fn current_token(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    pub fn current_token_kind(&self) -> TokenKind {
        self.current_token().kind
    }

    /// Advances to the next token and returns the previous one.
    pub fn advance(&mut self) -> Token {
        let token = self.current_token().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    /// Expects a token of the specified kind, with optional custom error.
    pub fn expect_error(
        &mut self,
        expected_kind: TokenKind,
        error: Option<Error>,
    ) -> Result<Token, Error> {
        let token = self.current_token();
        if token.kind != expected_kind {
            match error {
                Some(error) => Err(error),
                None => Err(Error::new(
                    ErrorImpl::UnexpectedToken {
                        token: token.value.clone(),
                        kind: token.kind.to_string(),
                    },
                    token.span.start.clone(),
                )),
            }
        } else {
            Ok(self.advance())
        }
    }

    pub fn expect(&mut self, expected_kind: TokenKind) -> Result<Token, Error> {
        self.expect_error(expected_kind, None)
    }

    /// An `UnexpectedTokenDetailed` error at the current token.
    pub fn unexpected(&self, message: &str) -> Error {
        let token = self.current_token();
        Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: token.value.clone(),
                message: String::from(message),
            },
            token.span.start.clone(),
        )
    }

    pub fn get_decl_lookup(&self) -> &DeclLookup<B> {
        &self.decl_lookup
    }

    /// Registers a declaration handler for a leading token kind.
    pub fn decl(&mut self, kind: TokenKind, decl_fn: DeclHandler<B>) {
        self.decl_lookup.insert(kind, decl_fn);
    }

    pub fn builder_mut(&mut self) -> &mut Builder<B> {
        &mut self.builder
    }

    /// Returns the position of the current token.
    pub fn get_position(&self) -> Position {
        self.current_token().span.start.clone()
    }

    pub fn get_file(&self) -> Rc<String> {
        Rc::clone(&self.file)
    }
}

/// Attaches a source position to a builder error.
pub fn located<T>(result: Result<T, ErrorImpl>, position: &Position) -> Result<T, Error> {
    result.map_err(|error| Error::new(error, position.clone()))
}

/// Parses a token stream, building the dataset it describes.
///
/// On success the dataset has been closed and is returned. On any error the
/// dataset is closed and dropped, and the error is logged and returned.
pub fn parse<B: Backend>(
    tokens: Vec<Token>,
    file: Rc<String>,
    builder: Builder<B>,
) -> Result<B::Dataset, Error> {
    let mut parser = Parser::new(tokens, file, builder);
    create_decl_lookups(&mut parser);

    match parse_dataset(&mut parser) {
        Ok(dataset) => Ok(dataset),
        Err(error) => {
            tracing::error!("{}: {}", parser.get_file(), error);
            parser.builder_mut().abort();
            Err(error)
        }
    }
}
