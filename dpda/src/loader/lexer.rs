use crate::loader::{Span, Spanned};

#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug)]
pub enum Token<'a> {
    LPar,
    RPar,

    LBracket,
    RBracket,

    Comma,
    Colon,
    Arrow,

    Comment(&'a str),

    Ident(&'a str),
    LineEnd,
}

impl<'a> std::fmt::Display for Token<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::LPar => write!(f, "'('"),
            Token::RPar => write!(f, "')'"),
            Token::LBracket => write!(f, "'['"),
            Token::RBracket => write!(f, "']'"),
            Token::Comma => write!(f, "','"),
            Token::Colon => write!(f, "':'"),
            Token::Arrow => write!(f, "'->'"),
            Token::Comment(_) => write!(f, "<comment>"),
            Token::Ident(ident) if f.alternate() => write!(f, "{ident:?}"),
            Token::Ident(_) => write!(f, "ident"),
            Token::LineEnd => write!(f, "eol"),
        }
    }
}

/// Splits a definition into tokens. Identifiers are any run of characters
/// that are not whitespace or punctuation, so digits and symbols like `$`
/// can name states and letters. A `#` only starts a comment when it is the
/// first character on its line.
#[derive(Clone, Copy, Debug)]
pub struct Lexer<'a> {
    input: &'a str,
    position: usize,
    line_start: bool,
}

#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug)]
pub enum Error {
    InvalidChar(char),
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            position: 0,
            line_start: true,
        }
    }

    fn consume(&mut self) -> Option<char> {
        let next = self.input.get(self.position..)?.chars().next()?;
        self.position += next.len_utf8();
        Some(next)
    }

    fn peek(&mut self) -> Option<char> {
        self.input.get(self.position..)?.chars().next()
    }

    fn peek_second(&mut self) -> Option<char> {
        let mut chars = self.input.get(self.position..)?.chars();
        chars.next()?;
        chars.next()
    }
}

fn punctuation(c: char) -> bool {
    matches!(c, '(' | ')' | '[' | ']' | ',' | ':')
}

impl<'a> std::iter::Iterator for Lexer<'a> {
    type Item = Spanned<Result<Token<'a>, Error>>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(c) = self.peek()
            && c.is_whitespace()
        {
            let start = self.position;
            self.consume();
            if c == '\n' {
                self.line_start = true;
                return Some(Spanned(Ok(Token::LineEnd), Span(start, self.position)));
            }
        }
        let start = self.position;
        let line_start = std::mem::replace(&mut self.line_start, false);

        let res = match self.consume()? {
            '(' => Ok(Token::LPar),
            ')' => Ok(Token::RPar),
            '[' => Ok(Token::LBracket),
            ']' => Ok(Token::RBracket),
            ',' => Ok(Token::Comma),
            ':' => Ok(Token::Colon),
            '-' if self.peek() == Some('>') => {
                self.consume();
                Ok(Token::Arrow)
            }
            '#' if line_start => {
                while let Some(c) = self.peek()
                    && c != '\n'
                {
                    self.consume();
                }
                Ok(Token::Comment(&self.input[start + 1..self.position]))
            }
            c if c.is_control() => Err(Error::InvalidChar(c)),
            _ => {
                while let Some(c) = self.peek()
                    && !c.is_whitespace()
                    && !c.is_control()
                    && !punctuation(c)
                    && !(c == '-' && self.peek_second() == Some('>'))
                {
                    self.consume();
                }
                Ok(Token::Ident(&self.input[start..self.position]))
            }
        };
        let span = Span(start, self.position);
        Some(Spanned(res, span))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(src: &str) -> Vec<Token<'_>> {
        Lexer::new(src)
            .map(|Spanned(tok, _)| tok.expect("lexer error"))
            .collect()
    }

    #[test]
    fn transition_line() {
        use Token as T;
        assert_eq!(
            tokens("(0, STACK_END) -> q1 [STACK_END, 0]"),
            [
                T::LPar,
                T::Ident("0"),
                T::Comma,
                T::Ident("STACK_END"),
                T::RPar,
                T::Arrow,
                T::Ident("q1"),
                T::LBracket,
                T::Ident("STACK_END"),
                T::Comma,
                T::Ident("0"),
                T::RBracket,
            ]
        );
    }

    #[test]
    fn comments_only_at_line_start() {
        use Token as T;
        assert_eq!(
            tokens("  # note\nalphabet: #, -\n"),
            [
                T::Comment(" note"),
                T::LineEnd,
                T::Ident("alphabet"),
                T::Colon,
                T::Ident("#"),
                T::Comma,
                T::Ident("-"),
                T::LineEnd,
            ]
        );
    }

    #[test]
    fn arrow_splits_identifiers() {
        use Token as T;
        assert_eq!(
            tokens("q0->q1"),
            [T::Ident("q0"), T::Arrow, T::Ident("q1")]
        );
    }

    #[test]
    fn spans_are_byte_offsets() {
        let spans: Vec<_> = Lexer::new("ä: b").map(|Spanned(_, span)| span).collect();
        assert_eq!(spans, [Span(0, 2), Span(2, 3), Span(4, 5)]);
    }

    #[test]
    fn control_characters_are_rejected() {
        let first = Lexer::new("\u{7}").next().map(|Spanned(tok, _)| tok);
        assert_eq!(first, Some(Err(Error::InvalidChar('\u{7}'))));
    }
}
