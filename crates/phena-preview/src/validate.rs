//! Syntax check for sketch source
//!
//! The sketch ends up as the body of a function in the preview page, so it is
//! parsed the same way: wrapped in a function declaration and handed to the
//! oxc parser as a classic script. Early errors the parser does not report
//! (redeclared bindings, stray `break`, strict-mode restrictions) come from
//! the semantic checker. Nothing is executed.

use oxc_allocator::Allocator;
use oxc_ast::ast::Statement;
use oxc_parser::Parser;
use oxc_semantic::SemanticBuilder;
use oxc_span::SourceType;
use std::fmt;
use thiserror::Error;

const WRAPPER_PREFIX: &str = "function __phena_sketch__() {\n";
const WRAPPER_SUFFIX: &str = "\n}";

/// A sketch that does not parse as a function body
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    /// Parser message, passed through as opaque diagnostic text
    pub message: String,
    /// Location in the sketch, if the parser reported one
    pub location: Option<Location>,
}

/// 1-based line and column (in characters) within the sketch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(Location { line, column }) => {
                write!(f, "{} (line {}, column {})", self.message, line, column)
            }
            None => f.write_str(&self.message),
        }
    }
}

/// Check that `source` is a syntactically valid function body
pub fn validate_sketch(source: &str) -> Result<(), SyntaxError> {
    let wrapped = format!("{WRAPPER_PREFIX}{source}{WRAPPER_SUFFIX}");
    let allocator = Allocator::default();
    let source_type = SourceType::default().with_module(false);
    let ret = Parser::new(&allocator, &wrapped, source_type).parse();

    if let Some(error) = ret.errors.first() {
        return Err(SyntaxError::from_diagnostic(source, error));
    }

    if ret.panicked {
        return Err(SyntaxError {
            message: "Unexpected end of sketch".to_string(),
            location: None,
        });
    }

    // A `}` in the sketch can close the wrapper early and leave more code at top level
    if !matches!(&ret.program.body[..], [Statement::FunctionDeclaration(_)]) {
        let close = unbalanced_close(source);
        return Err(SyntaxError {
            message: "Unexpected token '}'".to_string(),
            location: close.map(|o| locate(source, o + WRAPPER_PREFIX.len())),
        });
    }

    let checked = SemanticBuilder::new()
        .with_check_syntax_error(true)
        .build(&ret.program);
    match checked.errors.first() {
        Some(error) => Err(SyntaxError::from_diagnostic(source, error)),
        None => Ok(()),
    }
}

impl SyntaxError {
    /// Convert an oxc diagnostic on the wrapped text
    fn from_diagnostic(source: &str, error: &oxc_diagnostics::OxcDiagnostic) -> Self {
        let offset = error
            .labels
            .as_ref()
            .and_then(|labels| labels.first())
            .map(|label| label.offset());
        Self {
            message: error.message.to_string(),
            location: offset.map(|o| locate(source, o)),
        }
    }
}

/// Map an offset in the wrapped text to a sketch location
fn locate(source: &str, wrapped_offset: usize) -> Location {
    let mut offset = wrapped_offset
        .saturating_sub(WRAPPER_PREFIX.len())
        .min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }

    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let column = before[line_start..].chars().count() + 1;
    Location { line, column }
}

/// Byte offset of the first `}` that closes more braces than were opened
///
/// Only used to point at the likely culprit once the parser has accepted the
/// wrapped text but produced extra top-level items, so strings and comments
/// are not tracked.
fn unbalanced_close(source: &str) -> Option<usize> {
    let mut depth: usize = 0;
    for (i, b) in source.bytes().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' if depth == 0 => return Some(i),
            b'}' => depth -= 1,
            _ => {}
        }
    }
    None
}
