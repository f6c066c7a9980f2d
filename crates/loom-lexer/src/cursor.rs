/// Character iterator over a source string that tracks its byte offset.
///
/// Every position the cursor reports is a byte offset into the original UTF-8
/// text, which is what token spans and the syntax tree use.
pub(crate) struct Cursor<'src> {
    source: &'src str,
    pos: u32,
    chars: std::str::Chars<'src>,
}

impl<'src> Cursor<'src> {
    pub(crate) fn new(source: &'src str) -> Self {
        Self {
            source,
            pos: 0,
            chars: source.chars(),
        }
    }

    /// Current character, not consumed.
    pub(crate) fn peek(&self) -> Option<char> {
        self.chars.clone().next()
    }

    /// Character after the current one, not consumed.
    pub(crate) fn peek_next(&self) -> Option<char> {
        let mut iter = self.chars.clone();
        iter.next();
        iter.next()
    }

    /// Consume the current character.
    pub(crate) fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.pos += c.len_utf8() as u32;
        Some(c)
    }

    /// Consume the current character if it equals `expected`.
    pub(crate) fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn pos(&self) -> u32 {
        self.pos
    }

    pub(crate) fn is_eof(&self) -> bool {
        self.peek().is_none()
    }

    /// Advance while the predicate holds for the current character.
    pub(crate) fn eat_while(&mut self, predicate: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if !predicate(c) {
                break;
            }
            self.advance();
        }
    }

    /// Source text between two byte offsets.
    pub(crate) fn slice(&self, start: u32, end: u32) -> &'src str {
        &self.source[start as usize..end as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peek_does_not_consume() {
        let cursor = Cursor::new("ab");
        assert_eq!(cursor.peek(), Some('a'));
        assert_eq!(cursor.peek_next(), Some('b'));
        assert_eq!(cursor.pos(), 0);
    }

    #[test]
    fn advance_tracks_multibyte_utf8() {
        let mut cursor = Cursor::new("\u{00E9}a");
        assert_eq!(cursor.advance(), Some('\u{00E9}'));
        assert_eq!(cursor.pos(), 2);
        assert_eq!(cursor.advance(), Some('a'));
        assert_eq!(cursor.advance(), None);
        assert!(cursor.is_eof());
    }

    #[test]
    fn eat_only_matches_expected() {
        let mut cursor = Cursor::new("=>");
        assert!(!cursor.eat('>'));
        assert!(cursor.eat('='));
        assert!(cursor.eat('>'));
        assert_eq!(cursor.pos(), 2);
    }

    #[test]
    fn eat_while_and_slice() {
        let mut cursor = Cursor::new("abc123");
        cursor.eat_while(|c| c.is_alphabetic());
        assert_eq!(cursor.pos(), 3);
        assert_eq!(cursor.slice(0, 3), "abc");
    }
}
