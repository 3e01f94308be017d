use std::path::PathBuf;

pub mod ast;
pub mod lexer;
pub mod shell_error;
pub mod syntax_error;

use ast::{Pipeline, Redirect, Stage};
use lexer::{
    token::{Operator, Word},
    Lexer,
};
use syntax_error::{SyntaxError, SyntaxErrorKind};

pub type Result<T> = std::result::Result<T, SyntaxErrorKind>;

/// Turns one line of input into a [`Pipeline`].
pub struct Parser {
    name: String,
    src: String,
}

impl Parser {
    pub fn new(name: String, src: String) -> Self {
        Self { name, src }
    }

    #[inline(always)]
    fn src(&self) -> &str {
        &self.src
    }

    /// A blank line parses to an empty pipeline.
    pub fn parse(self) -> std::result::Result<Pipeline, SyntaxError> {
        match self.parse_pipeline() {
            Ok(pipeline) => Ok(pipeline),
            Err(error) => Err(SyntaxError::new(error, self.src, self.name)),
        }
    }

    fn parse_pipeline(&self) -> Result<Pipeline> {
        let words = Lexer::new(self.src()).tokenize()?;
        if words.is_empty() {
            return Ok(Pipeline::default());
        }

        let stages = split_stages(&words)?
            .into_iter()
            .map(parse_stage)
            .collect::<Result<Vec<_>>>()?;

        Ok(Pipeline { stages })
    }
}

fn split_stages(words: &[Word]) -> Result<Vec<&[Word]>> {
    let mut segments = Vec::new();
    let mut start = 0;
    for (i, word) in words.iter().enumerate() {
        if word.is_pipe() {
            if i == start {
                return Err(SyntaxErrorKind::EmptyCommand(word.span));
            }
            segments.push(&words[start..i]);
            start = i + 1;
        }
    }

    match words.get(start..) {
        Some(rest) if !rest.is_empty() => segments.push(rest),
        _ => {
            let last = &words[words.len() - 1];
            return Err(SyntaxErrorKind::EmptyCommand(last.span));
        }
    }
    Ok(segments)
}

/// Pulls every redirection out of a stage. The first operator marks the end of
/// the argument list and for each stream the last redirection wins.
fn parse_stage(words: &[Word]) -> Result<Stage> {
    let first = &words[0];
    let mut stage = Stage {
        args: Vec::new(),
        stdin: None,
        stdout: None,
        stderr: None,
    };

    let mut boundary = words.len();
    let mut i = 0;
    while i < words.len() {
        let word = &words[i];
        match word.operator() {
            Some(Operator::Redirect(stream, mode)) => {
                boundary = boundary.min(i);
                let target = match words.get(i + 1) {
                    Some(target) if target.operator().is_none() => target,
                    _ => {
                        return Err(SyntaxErrorKind::MissingRedirectTarget(
                            word.text.clone(),
                            word.span,
                        ))
                    }
                };
                stage.set_redirect(Redirect {
                    stream,
                    mode,
                    path: PathBuf::from(&target.text),
                });
                i += 2;
            }
            _ => i += 1,
        }
    }

    if boundary == 0 {
        return Err(SyntaxErrorKind::MissingCommand(first.span));
    }

    stage.args = words[..boundary]
        .iter()
        .map(|word| word.text.clone())
        .collect();
    Ok(stage)
}
