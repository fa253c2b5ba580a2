#![allow(clippy::module_inception)]

//! A compiler front end for CDL, the textual notation for netCDF-3 datasets.
//!
//! Source text is tokenized, parsed against the CDL grammar and turned into a
//! sequence of dimension, variable, attribute and data operations applied to a
//! [`backend::Backend`] as each declaration is recognised.

use std::{
    fmt::Write,
    path::{Path, PathBuf},
    rc::Rc,
};

use crate::{
    backend::{Backend, Format},
    builder::builder::Builder,
    errors::errors::{Error, ErrorTip},
    lexer::lexer::{tokenize_with, LexPolicy},
};

pub mod backend;
pub mod builder;
pub mod errors;
pub mod lexer;
pub mod macros;
pub mod parser;
pub mod types;

extern crate regex;

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    /// Byte offset into the source text.
    pub offset: u32,
    /// 1-based line number.
    pub line: u32,
    pub file: Rc<String>,
}

impl Position {
    pub fn new(offset: u32, line: u32, file: Rc<String>) -> Self {
        Position { offset, line, file }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

/// Options for a single parse.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Where the backend should create the dataset.
    pub output: PathBuf,
    pub format: Format,
    pub lex_policy: LexPolicy,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            output: PathBuf::from("dataset.nc"),
            format: Format::default(),
            lex_policy: LexPolicy::default(),
        }
    }
}

impl ParseOptions {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        ParseOptions {
            output: output.into(),
            ..Default::default()
        }
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn with_lex_policy(mut self, lex_policy: LexPolicy) -> Self {
        self.lex_policy = lex_policy;
        self
    }
}

/// Parses CDL source text into a new dataset created by `backend`.
///
/// On success the returned dataset has been closed. On failure any dataset opened
/// along the way is closed and dropped.
pub fn parse_text<B: Backend>(
    source: &str,
    backend: B,
    options: &ParseOptions,
) -> Result<B::Dataset, Error> {
    parse_text_with_name(source, None, backend, options)
}

/// Like [`parse_text`], naming the source in diagnostics.
///
/// The whole source is tokenized before the backend is asked to create the
/// dataset, so a lexical error never reaches the backend.
pub fn parse_text_with_name<B: Backend>(
    source: &str,
    file: Option<String>,
    backend: B,
    options: &ParseOptions,
) -> Result<B::Dataset, Error> {
    let tokens = tokenize_with(source.to_string(), file, options.lex_policy)?;
    let file = tokens
        .last()
        .map(|token| Rc::clone(&token.span.start.file))
        .unwrap_or_else(|| Rc::new(String::from("<source>")));

    let builder = Builder::new(backend, options.output.clone(), options.format);
    parser::parser::parse(tokens, file, builder)
}

/// The dataset path used when none is given: the CDL path with its extension
/// replaced by `.nc`.
pub fn default_output_path(cdl_file: &Path) -> PathBuf {
    cdl_file.with_extension("nc")
}

/// Finds the line holding byte `position`. Returns the 1-based line number, the line
/// text and the offset of `position` within it.
pub fn get_line_at_position(content: &str, position: u32) -> Option<(usize, String, usize)> {
    let pos = position as usize;
    let mut start = 0;
    let mut line_number = 1;
    let mut last = None;

    for line in content.split_inclusive('\n') {
        let end = start + line.len();

        if (start..end).contains(&pos) {
            return Some((line_number, line.to_string(), pos - start));
        }

        last = Some((line_number, line.to_string(), line.trim_end_matches('\n').len()));
        start = end;
        line_number += 1;
    }

    if pos == content.len() {
        last
    } else {
        None
    }
}

/// Renders an error with the offending source line.
pub fn format_error(error: &Error, source: &str) -> String {
    /*
        Error: message
        -> final.cdl
           |
        20 | int v(y) ;
           | ------^
    */

    let mut out = String::new();
    let position = error.get_position();

    match error.get_tip() {
        ErrorTip::None => {
            let _ = writeln!(out, "Error: {} ({})", error.get_error_name(), error.get_error());
        }
        tip => {
            let _ = writeln!(out, "Error: {} ({})", error.get_error_name(), tip);
        }
    }
    let _ = writeln!(out, "-> {}", position.file);

    let Some((line, line_text, line_pos)) = get_line_at_position(source, position.offset) else {
        return out;
    };

    let line_string = line.to_string();
    let padding = line_string.len() + 2;

    let _ = writeln!(out, "{:>padding$}", "|");

    let (line_text_removed, removed_whitespace) = remove_starting_whitespace(&line_text);
    let _ = writeln!(out, "{} | {}", line_string, line_text_removed.trim_end());

    let arrows = line_pos.saturating_sub(removed_whitespace) + 1;

    let _ = writeln!(out, "{:>padding$} {:->arrows$}", "|", "^");
    out
}

pub fn display_error(error: &Error, source: &str) {
    eprint!("{}", format_error(error, source));
}

fn remove_starting_whitespace(string: &str) -> (String, usize) {
    let start = string
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .count();

    (String::from(&string[start..]), start)
}

#[cfg(test)]
mod tests {
    use std::{path::Path, rc::Rc};

    use crate::{
        errors::errors::{Error, ErrorImpl},
        Position,
    };

    #[test]
    fn test_get_line_at_position() {
        let content = "Hello, world!\nThis is a test\n\nTesting { }\n";

        let (line_number, line, line_pos) = super::get_line_at_position(content, 10).unwrap();
        assert_eq!(line_number, 1);
        assert_eq!(line, "Hello, world!\n");
        assert_eq!(line_pos, 10);

        let (line_number, line, line_pos) = super::get_line_at_position(content, 38).unwrap();
        assert_eq!(line_number, 4);
        assert_eq!(line, "Testing { }\n");
        assert_eq!(line_pos, 8);

        assert!(super::get_line_at_position(content, 400).is_none());
    }

    #[test]
    fn test_get_line_at_end_of_input() {
        let content = "netcdf x {";

        let (line_number, _, line_pos) = super::get_line_at_position(content, 10).unwrap();
        assert_eq!(line_number, 1);
        assert_eq!(line_pos, 10);
    }

    #[test]
    fn test_format_error_points_at_column() {
        let source = "netcdf x {\n  variables:\n    int v(y) ;\n}\n";
        let error = Error::new(
            ErrorImpl::DimensionNotDeclared {
                dimension: "y".to_string(),
            },
            Position::new(34, 3, Rc::new("x.cdl".to_string())),
        );

        let rendered = super::format_error(&error, source);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "Error: DimensionNotDeclared (Dimension `y` not declared)");
        assert_eq!(lines[1], "-> x.cdl");
        assert_eq!(lines[3], "3 | int v(y) ;");
        assert_eq!(lines[4], "  | ------^");
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            super::default_output_path(Path::new("data/basics.cdl")),
            Path::new("data/basics.nc")
        );
        assert_eq!(
            super::default_output_path(Path::new("plain")),
            Path::new("plain.nc")
        );
    }
}
