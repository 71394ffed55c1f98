use spire_core::Span;

/// Where a token began; turned into a [`Span`] once the token is scanned.
#[derive(Debug, Clone, Copy)]
pub struct Mark {
    offset: usize,
    line: u32,
    col: u32,
}

/// Character cursor over a schedule file.
pub struct Cursor<'src> {
    source: &'src str,
    offset: usize,
    line: u32,
    col: u32,
}

impl<'src> Cursor<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            offset: 0,
            line: 1,
            col: 1,
        }
    }

    pub fn mark(&self) -> Mark {
        Mark {
            offset: self.offset,
            line: self.line,
            col: self.col,
        }
    }

    /// Span from `mark` to the cursor. Tokens never cross a line, so the
    /// length is a byte count on the mark's line.
    pub fn span_since(&self, mark: Mark) -> Span {
        Span::new(mark.line, mark.col, (self.offset - mark.offset) as u32)
    }

    pub fn text_since(&self, mark: Mark) -> &'src str {
        &self.source[mark.offset..self.offset]
    }

    fn rest(&self) -> &'src str {
        &self.source[self.offset..]
    }

    pub fn first(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    pub fn bump(&mut self) -> Option<char> {
        let c = self.first()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += c.len_utf8() as u32;
        }
        Some(c)
    }

    pub fn bump_if(&mut self, expected: char) -> bool {
        let matched = self.first() == Some(expected);
        if matched {
            self.bump();
        }
        matched
    }

    pub fn bump_while(&mut self, pred: impl Fn(char) -> bool) {
        while self.first().is_some_and(&pred) {
            self.bump();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_since_mark() {
        let mut cursor = Cursor::new("fs:phong");
        let start = cursor.mark();
        cursor.bump_while(|c| c.is_ascii_alphabetic());
        assert_eq!(cursor.text_since(start), "fs");
        assert_eq!(cursor.span_since(start), Span::new(1, 1, 2));
        assert!(cursor.bump_if(':'));
        assert!(!cursor.bump_if(':'));
        assert_eq!(cursor.first(), Some('p'));
        assert_eq!(cursor.second(), Some('h'));
    }

    #[test]
    fn newlines_reset_the_column() {
        let mut cursor = Cursor::new("a\n  b");
        cursor.bump_while(char::is_whitespace);
        assert_eq!(cursor.first(), Some('a'));
        cursor.bump();
        cursor.bump_while(char::is_whitespace);
        assert_eq!(cursor.span_since(cursor.mark()), Span::new(2, 3, 0));
    }
}
