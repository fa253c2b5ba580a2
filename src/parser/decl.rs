use crate::{
    backend::{AttributeOwner, Backend, BackendError},
    builder::builder::DimensionLength,
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::{TokenKind, CONSTANT_KINDS},
    types::types::{storage_type_of, Constant, Datum},
    Position,
};

use super::parser::{located, Parser};

/// `netcdf <name> { dimensions variables data }`
pub fn parse_dataset<B: Backend>(parser: &mut Parser<B>) -> Result<B::Dataset, Error> {
    let error = parser.unexpected("expected `netcdf <name>` header");
    let header = parser.expect_error(TokenKind::Netcdf, Some(error))?;
    located(
        parser.builder_mut().begin_dataset(&header.value),
        &header.span.start,
    )?;

    parser.expect(TokenKind::OpenCurly)?;
    parse_dimensions_section(parser)?;
    parse_variables_section(parser)?;
    parse_data_section(parser)?;
    parser.expect(TokenKind::CloseCurly)?;

    let error = parser.unexpected("expected end of input after `}`");
    parser.expect_error(TokenKind::EOF, Some(error))?;

    let position = parser.get_position();
    located(parser.builder_mut().end_dataset(), &position)?
        .ok_or_else(|| Error::new(ErrorImpl::Backend(BackendError::Closed), position))
}

fn parse_dimensions_section<B: Backend>(parser: &mut Parser<B>) -> Result<(), Error> {
    if parser.current_token_kind() != TokenKind::Dimensions {
        return Ok(());
    }
    parser.advance();

    loop {
        parse_dim_decl(parser)?;
        while parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
            parse_dim_decl(parser)?;
        }
        parser.expect(TokenKind::Semicolon)?;

        if parser.current_token_kind() != TokenKind::Identifier {
            return Ok(());
        }
    }
}

fn parse_dim_decl<B: Backend>(parser: &mut Parser<B>) -> Result<(), Error> {
    let error = parser.unexpected("expected a dimension name");
    let name = parser.expect_error(TokenKind::Identifier, Some(error))?;
    parser.expect(TokenKind::Equals)?;

    let token = parser.current_token();
    let length = match (token.kind, &token.literal) {
        (TokenKind::Unlimited, _) => DimensionLength::Unlimited,
        (TokenKind::IntConst, Some(Constant::Int(value))) => DimensionLength::Fixed(*value as f64),
        (TokenKind::DoubleConst, Some(Constant::Double(value))) => DimensionLength::Fixed(*value),
        _ => return Err(parser.unexpected("expected a dimension length or `unlimited`")),
    };
    parser.advance();

    located(
        parser.builder_mut().declare_dimension(&name.value, length),
        &name.span.start,
    )
}

fn parse_variables_section<B: Backend>(parser: &mut Parser<B>) -> Result<(), Error> {
    match parser.current_token_kind() {
        TokenKind::Variables => {
            parser.advance();
            loop {
                parse_decl(parser)?;
                parser.expect(TokenKind::Semicolon)?;

                if !parser
                    .get_decl_lookup()
                    .contains_key(&parser.current_token_kind())
                {
                    return Ok(());
                }
            }
        }
        // Global attributes may appear without a `variables:` marker.
        TokenKind::Colon => loop {
            parse_global_attr_decl(parser)?;
            parser.expect(TokenKind::Semicolon)?;

            if parser.current_token_kind() != TokenKind::Colon {
                return Ok(());
            }
        },
        _ => Ok(()),
    }
}

pub fn parse_decl<B: Backend>(parser: &mut Parser<B>) -> Result<(), Error> {
    let handler = parser
        .get_decl_lookup()
        .get(&parser.current_token_kind())
        .copied();

    match handler {
        Some(handler) => handler(parser),
        None => Err(parser.unexpected("expected a variable or attribute declaration")),
    }
}

/// `type name(dims), name2 ...`
pub fn parse_var_decl<B: Backend>(parser: &mut Parser<B>) -> Result<(), Error> {
    let keyword = parser.advance();
    let storage_type = located(storage_type_of(&keyword.value), &keyword.span.start)?;
    parser.builder_mut().set_storage_type(storage_type);

    parse_var_spec(parser)?;
    while parser.current_token_kind() == TokenKind::Comma {
        parser.advance();
        parse_var_spec(parser)?;
    }

    Ok(())
}

fn parse_var_spec<B: Backend>(parser: &mut Parser<B>) -> Result<(), Error> {
    let error = parser.unexpected("expected a variable name");
    let name = parser.expect_error(TokenKind::Identifier, Some(error))?;

    let mut dimensions: Vec<(String, Position)> = vec![];
    if parser.current_token_kind() == TokenKind::OpenParen {
        parser.advance();
        loop {
            let error = parser.unexpected("expected a dimension name");
            let dimension = parser.expect_error(TokenKind::Identifier, Some(error))?;
            dimensions.push((dimension.value, dimension.span.start));

            if parser.current_token_kind() != TokenKind::Comma {
                break;
            }
            parser.advance();
        }
        parser.expect(TokenKind::CloseParen)?;
    }

    let names = dimensions.iter().map(|(name, _)| name.clone()).collect();
    parser
        .builder_mut()
        .declare_variable(&name.value, names)
        .map_err(|error| {
            // Point at the offending dimension where there is one.
            let position = match &error {
                ErrorImpl::DimensionNotDeclared { dimension }
                | ErrorImpl::UnlimitedDimensionNotFirst { dimension, .. } => dimensions
                    .iter()
                    .find(|(name, _)| name == dimension)
                    .map(|(_, position)| position.clone()),
                _ => None,
            };

            Error::new(error, position.unwrap_or(name.span.start))
        })
}

/// `variable:attribute = constants`
pub fn parse_attr_decl<B: Backend>(parser: &mut Parser<B>) -> Result<(), Error> {
    let variable = parser.advance();
    parser.expect(TokenKind::Colon)?;

    parse_attribute(parser, AttributeOwner::Variable(variable.value))
}

/// `:attribute = constants`
pub fn parse_global_attr_decl<B: Backend>(parser: &mut Parser<B>) -> Result<(), Error> {
    parser.expect(TokenKind::Colon)?;

    parse_attribute(parser, AttributeOwner::Global)
}

fn parse_attribute<B: Backend>(parser: &mut Parser<B>, owner: AttributeOwner) -> Result<(), Error> {
    let error = parser.unexpected("expected an attribute name");
    let name = parser.expect_error(TokenKind::Identifier, Some(error))?;
    parser.expect(TokenKind::Equals)?;

    let mut values = vec![parse_constant(parser)?];
    while parser.current_token_kind() == TokenKind::Comma {
        parser.advance();
        values.push(parse_constant(parser)?);
    }

    located(
        parser.builder_mut().set_attribute(owner, &name.value, &values),
        &name.span.start,
    )
}

fn parse_constant<B: Backend>(parser: &mut Parser<B>) -> Result<Constant, Error> {
    if !parser.current_token().is_one_of_many(&CONSTANT_KINDS) {
        return Err(parser.unexpected("expected a constant"));
    }

    let token = parser.advance();
    match token.literal {
        Some(literal) => Ok(literal),
        None => Err(Error::new(
            ErrorImpl::NumberParseError { token: token.value },
            token.span.start,
        )),
    }
}

fn parse_data_section<B: Backend>(parser: &mut Parser<B>) -> Result<(), Error> {
    if parser.current_token_kind() != TokenKind::Data {
        return Ok(());
    }
    parser.advance();

    while parser.current_token_kind() == TokenKind::Identifier {
        parse_data_decl(parser)?;
    }

    Ok(())
}

/// `variable = values ;`
fn parse_data_decl<B: Backend>(parser: &mut Parser<B>) -> Result<(), Error> {
    let name = parser.advance();
    parser.expect(TokenKind::Equals)?;

    let mut data = vec![parse_datum(parser)?];
    while parser.current_token_kind() == TokenKind::Comma {
        parser.advance();
        data.push(parse_datum(parser)?);
    }
    parser.expect(TokenKind::Semicolon)?;

    located(
        parser.builder_mut().write_data(&name.value, &data),
        &name.span.start,
    )
}

fn parse_datum<B: Backend>(parser: &mut Parser<B>) -> Result<Datum, Error> {
    if parser.current_token_kind() == TokenKind::FillValue {
        parser.advance();
        return Ok(Datum::Fill);
    }

    parse_constant(parser).map(Datum::Const)
}
