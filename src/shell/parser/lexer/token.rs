pub mod span;

use span::Span;

use crate::shell::parser::ast::{RedirectMode, Stream};

/// A single argument produced by the lexer with all quoting and escaping
/// already resolved.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Word {
    pub text: String,
    pub span: Span,
    /// Set when any quote or backslash contributed to the word.
    /// Quoted words are never treated as operators.
    pub quoted: bool,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Operator {
    /// |
    Pipe,
    /// <, 0<, >, 1>, >>, 1>>, 2>, 2>>
    Redirect(Stream, RedirectMode),
}

impl Word {
    pub fn new(text: impl Into<String>, span: Span, quoted: bool) -> Self {
        Self {
            text: text.into(),
            span,
            quoted,
        }
    }

    pub fn operator(&self) -> Option<Operator> {
        if self.quoted {
            return None;
        }

        use RedirectMode::*;
        use Stream::*;
        let op = match self.text.as_str() {
            "|" => Operator::Pipe,
            "<" | "0<" => Operator::Redirect(Stdin, Read),
            ">" | "1>" => Operator::Redirect(Stdout, Truncate),
            ">>" | "1>>" => Operator::Redirect(Stdout, Append),
            "2>" => Operator::Redirect(Stderr, Truncate),
            "2>>" => Operator::Redirect(Stderr, Append),
            _ => return None,
        };
        Some(op)
    }

    #[inline]
    pub fn is_pipe(&self) -> bool {
        matches!(self.operator(), Some(Operator::Pipe))
    }
}
