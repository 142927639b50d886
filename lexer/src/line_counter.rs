
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position<'a> {
    pub file: &'a str,
    pub line: usize,
    pub column: usize,
}

impl<'a> Position<'a> {
    pub fn new(file: &'a str, line: usize, column: usize) -> Self {
        Position {file, line, column}
    }

    pub fn start(file: &'a str) -> Self {
        Position::new(file, 1, 1)
    }
}

impl fmt::Display for Position<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/*
 * Walks the characters of a source string, pairing each one with the
 * (line, column) it starts at.
 */
pub struct CountingIter<'a> {
    chars: std::str::Chars<'a>,
    line: usize,
    column: usize,
}

impl<'a> CountingIter<'a> {
    pub fn new(s: &'a str) -> CountingIter<'a> {
        CountingIter {
            chars: s.chars(),
            line: 1,
            column: 1,
        }
    }
}

impl Iterator for CountingIter<'_> {
    type Item = (char, (usize, usize));

    fn next(&mut self) -> Option<Self::Item> {
        let c = self.chars.next()?;
        let res = (c, (self.line, self.column));

        // Prepare the position of the next character.
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(res)
    }
}
