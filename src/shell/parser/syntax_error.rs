use std::fmt;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceCode};
use thiserror::Error;

use super::lexer::token::span::Span;
use crate::P;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    UnterminatedQuote(char, Span),
    EmptyCommand(Span),
    MissingCommand(Span),
    MissingRedirectTarget(String, Span),
}

impl fmt::Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::UnterminatedQuote(quote, _) => write!(f, "unterminated quote {quote}"),
            Self::EmptyCommand(_) => write!(f, "syntax error near unexpected token `|'"),
            Self::MissingCommand(_) => write!(f, "syntax error: redirection without a command"),
            Self::MissingRedirectTarget(op, _) => {
                write!(f, "syntax error: `{op}' expects a file name")
            }
        }
    }
}

#[derive(Debug, Error)]
pub struct SyntaxError {
    pub error: SyntaxErrorKind,
    pub src: NamedSource<String>,
}

impl Diagnostic for SyntaxError {
    fn labels(&self) -> Option<P<dyn Iterator<Item = LabeledSpan> + '_>> {
        use SyntaxErrorKind::*;
        let label = match &self.error {
            UnterminatedQuote(_, span) => {
                LabeledSpan::new_with_span(Some(String::from("Quote opened here")), *span)
            }
            EmptyCommand(span) => LabeledSpan::new_with_span(
                Some(String::from("Expected a command around this pipe")),
                *span,
            ),
            MissingCommand(span) => LabeledSpan::new_with_span(
                Some(String::from("Expected a command before this redirection")),
                *span,
            ),
            MissingRedirectTarget(_, span) => LabeledSpan::new_with_span(
                Some(String::from("Expected file name after here")),
                *span,
            ),
        };
        Some(P::new(vec![label].into_iter()))
    }

    fn code<'a>(&'a self) -> Option<P<dyn fmt::Display + 'a>> {
        Some(P::new("Syntax Error"))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.src as &dyn SourceCode)
    }
}

impl SyntaxError {
    pub fn new(error: SyntaxErrorKind, src: String, name: String) -> Self {
        SyntaxError {
            error,
            src: NamedSource::new(name, src),
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        self.error.fmt(f)
    }
}
