//! Lenient extraction of `[y, x]` pairs from free-form model output.
//!
//! The model is asked for JSON but nothing guarantees it: answers arrive
//! wrapped in markdown fences, interleaved with prose, or truncated. The
//! scanner below ignores all of that and only recognises the bracketed pair
//! shape `[ <number> , <number> ]`, where a number is `digits` or
//! `digits.digits` and whitespace may surround the numbers.

use serde::{Deserialize, Serialize};

/// Point in normalized image space (0-1000), as reported by the model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPoint {
    pub y: f64,
    pub x: f64,
}

/// Extract every `[y, x]` pair from `text`, in order of appearance.
///
/// Matches are leftmost and non-overlapping. A pair whose literals do not
/// parse as `f64` is skipped.
pub fn parse_points(text: &str) -> Vec<NormalizedPoint> {
    let mut points = Vec::new();
    let mut start = 0;

    while let Some(offset) = text[start..].find('[') {
        let open = start + offset;
        match match_pair(text, open) {
            Some((y_lit, x_lit, end)) => {
                if let (Ok(y), Ok(x)) = (y_lit.parse::<f64>(), x_lit.parse::<f64>()) {
                    points.push(NormalizedPoint { y, x });
                }
                start = end;
            }
            None => start = open + 1,
        }
    }

    points
}

/// Try to match a pair starting at the `[` at byte offset `open`.
/// Returns both number literals and the byte offset just past `]`.
fn match_pair(text: &str, open: usize) -> Option<(&str, &str, usize)> {
    let mut cursor = Cursor::new(text, open);

    cursor.expect('[')?;
    cursor.skip_whitespace();
    let y = cursor.number()?;
    cursor.skip_whitespace();
    cursor.expect(',')?;
    cursor.skip_whitespace();
    let x = cursor.number()?;
    cursor.skip_whitespace();
    cursor.expect(']')?;

    Some((y, x, cursor.pos))
}

struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str, pos: usize) -> Self {
        Self { text, pos }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn expect(&mut self, c: char) -> Option<()> {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            Some(())
        } else {
            None
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn digits(&mut self) -> usize {
        let begin = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
        }
        self.pos - begin
    }

    /// `digits` optionally followed by `.digits`. A dot not followed by a
    /// digit is left unconsumed.
    fn number(&mut self) -> Option<&'a str> {
        let begin = self.pos;
        if self.digits() == 0 {
            return None;
        }

        if self.peek() == Some('.') {
            let dot = self.pos;
            self.pos += 1;
            if self.digits() == 0 {
                self.pos = dot;
            }
        }

        Some(&self.text[begin..self.pos])
    }
}
