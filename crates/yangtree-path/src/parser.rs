//! Instance path parser.

use crate::types::{NodeTest, Path, Predicate, Segment};
use crate::PathError;

/// Recursive-descent parser over the restricted path grammar.
pub(crate) struct PathParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> PathParser<'a> {
    pub(crate) fn parse(input: &'a str) -> Result<Path, PathError> {
        if input.is_empty() {
            return Err(PathError::Empty);
        }
        let mut parser = Self { input, pos: 0 };
        parser.parse_path()
    }

    fn parse_path(&mut self) -> Result<Path, PathError> {
        if self.peek() != Some('/') {
            return Err(PathError::NotAbsolute);
        }

        let mut segments = Vec::new();
        while self.peek() == Some('/') {
            self.advance();
            segments.push(self.parse_segment()?);
        }

        match self.peek() {
            None => Ok(Path::new(segments)),
            Some(ch) => Err(PathError::UnexpectedChar { ch, pos: self.pos }),
        }
    }

    fn parse_segment(&mut self) -> Result<Segment, PathError> {
        let (module, node) = if self.peek() == Some('*') {
            self.advance();
            (None, NodeTest::Wildcard)
        } else {
            let first = self.parse_identifier()?;
            if self.peek() == Some(':') {
                self.advance();
                if self.peek() == Some('*') {
                    self.advance();
                    (Some(first), NodeTest::Wildcard)
                } else {
                    let name = self.parse_identifier()?;
                    (Some(first), NodeTest::Name(name))
                }
            } else {
                (None, NodeTest::Name(first))
            }
        };

        let mut predicates = Vec::new();
        while self.peek() == Some('[') {
            predicates.push(self.parse_predicate()?);
        }

        Ok(Segment {
            module,
            node,
            predicates,
        })
    }

    fn parse_predicate(&mut self) -> Result<Predicate, PathError> {
        self.expect('[')?;
        self.skip_whitespace();

        let predicate = match self.peek() {
            Some(c) if c.is_ascii_digit() => {
                let start = self.pos;
                while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    self.advance();
                }
                let digits = &self.input[start..self.pos];
                match digits.parse::<usize>() {
                    Ok(n) if n > 0 => Predicate::Position(n),
                    _ => return Err(PathError::InvalidPosition(digits.to_string())),
                }
            }
            Some('.') => {
                self.advance();
                self.skip_whitespace();
                self.expect('=')?;
                self.skip_whitespace();
                Predicate::Value(self.parse_literal()?)
            }
            Some(_) => {
                let mut name = self.parse_identifier()?;
                // Prefixed key names are accepted; keys always live in the list's module.
                if self.peek() == Some(':') {
                    self.advance();
                    name = self.parse_identifier()?;
                }
                self.skip_whitespace();
                self.expect('=')?;
                self.skip_whitespace();
                let value = self.parse_literal()?;
                Predicate::Key { name, value }
            }
            None => return Err(PathError::UnexpectedEnd),
        };

        self.skip_whitespace();
        self.expect(']')?;
        Ok(predicate)
    }

    fn parse_identifier(&mut self) -> Result<String, PathError> {
        let start = self.pos;
        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => self.advance(),
            Some(ch) => return Err(PathError::UnexpectedChar { ch, pos: self.pos }),
            None => return Err(PathError::UnexpectedEnd),
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        {
            self.advance();
        }
        Ok(self.input[start..self.pos].to_string())
    }

    /// A quoted literal or `concat(literal, ...)`.
    fn parse_literal(&mut self) -> Result<String, PathError> {
        if !self.input[self.pos..].starts_with("concat(") {
            return self.parse_quoted();
        }
        self.pos += "concat(".len();

        let mut value = String::new();
        loop {
            self.skip_whitespace();
            value.push_str(&self.parse_quoted()?);
            self.skip_whitespace();
            match self.peek() {
                Some(',') => self.advance(),
                Some(')') => {
                    self.advance();
                    return Ok(value);
                }
                Some(ch) => return Err(PathError::UnexpectedChar { ch, pos: self.pos }),
                None => return Err(PathError::UnexpectedEnd),
            }
        }
    }

    fn parse_quoted(&mut self) -> Result<String, PathError> {
        let start = self.pos;
        let quote = match self.peek() {
            Some(q @ ('\'' | '"')) => q,
            Some(ch) => return Err(PathError::UnexpectedChar { ch, pos: self.pos }),
            None => return Err(PathError::UnexpectedEnd),
        };
        self.advance();

        let rest = &self.input[self.pos..];
        match rest.find(quote) {
            Some(end) => {
                let value = rest[..end].to_string();
                self.pos += end + quote.len_utf8();
                Ok(value)
            }
            None => Err(PathError::UnclosedLiteral(start)),
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), PathError> {
        match self.peek() {
            Some(ch) if ch == expected => {
                self.advance();
                Ok(())
            }
            Some(ch) => Err(PathError::UnexpectedChar { ch, pos: self.pos }),
            None => Err(PathError::UnexpectedEnd),
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.advance();
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.peek() {
            self.pos += ch.len_utf8();
        }
    }
}
