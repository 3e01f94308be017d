pub mod token;

use std::{iter::Peekable, mem, str::CharIndices};

use token::{span::Span, Word};

use super::syntax_error::SyntaxErrorKind;

/// Characters a backslash may escape inside double quotes.
/// Before anything else the backslash is kept literally.
const DOUBLE_QUOTE_ESCAPES: &[char] = &['"', '\\', '$', '`'];

#[derive(Debug, Clone, Copy)]
enum Quote {
    None,
    Single(usize),
    Double(usize),
}

pub struct Lexer<'a> {
    src: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            chars: src.char_indices().peekable(),
        }
    }

    /// Splits the source into words. Only an unterminated quote is an error.
    pub fn tokenize(mut self) -> Result<Vec<Word>, SyntaxErrorKind> {
        let mut words = Vec::new();
        let mut text = String::new();
        let mut start: Option<usize> = None;
        let mut quoted = false;
        let mut quote = Quote::None;

        while let Some((index, ch)) = self.chars.next() {
            match quote {
                Quote::Single(_) => {
                    if ch == '\'' {
                        quote = Quote::None;
                    } else {
                        text.push(ch);
                    }
                }
                Quote::Double(_) => match ch {
                    '"' => quote = Quote::None,
                    '\\' => match self.chars.peek() {
                        Some(&(_, next)) if DOUBLE_QUOTE_ESCAPES.contains(&next) => {
                            text.push(next);
                            self.chars.next();
                        }
                        _ => text.push('\\'),
                    },
                    _ => text.push(ch),
                },
                Quote::None => match ch {
                    ' ' | '\t' | '\n' | '\r' => {
                        if let Some(start) = start.take() {
                            words.push(Word::new(
                                mem::take(&mut text),
                                Span::new(start, index),
                                quoted,
                            ));
                            quoted = false;
                        }
                    }
                    '\\' => {
                        start.get_or_insert(index);
                        quoted = true;
                        match self.chars.next() {
                            Some((_, next)) => text.push(next),
                            // a lone trailing backslash stays literal
                            None => text.push('\\'),
                        }
                    }
                    '\'' => {
                        start.get_or_insert(index);
                        quoted = true;
                        quote = Quote::Single(index);
                    }
                    '"' => {
                        start.get_or_insert(index);
                        quoted = true;
                        quote = Quote::Double(index);
                    }
                    _ => {
                        start.get_or_insert(index);
                        text.push(ch);
                    }
                },
            }
        }

        match quote {
            Quote::Single(at) => {
                return Err(SyntaxErrorKind::UnterminatedQuote(
                    '\'',
                    Span::new(at, self.src.len()),
                ))
            }
            Quote::Double(at) => {
                return Err(SyntaxErrorKind::UnterminatedQuote(
                    '"',
                    Span::new(at, self.src.len()),
                ))
            }
            Quote::None => (),
        }

        if let Some(start) = start {
            words.push(Word::new(text, Span::new(start, self.src.len()), quoted));
        }

        Ok(words)
    }
}
