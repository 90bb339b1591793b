use std::iter::Peekable;
use std::str::Chars;

use super::types::Coord;

/// Scanner over a command's argument text.
///
/// Arguments are separated by commas and/or whitespace. A malformed field yields `None`
/// and leaves the scanner where it stopped, so callers can keep their previous value.
pub struct ArgScanner<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> ArgScanner<'a> {
    pub fn new(args: &'a str) -> Self {
        Self { chars: args.chars().peekable() }
    }

    fn skip_separators(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c == ',' || c.is_ascii_whitespace() {
                self.chars.next();
            } else {
                break;
            }
        }
    }

    /// True when the next field (after separators) looks like a number
    pub fn starts_number(&mut self) -> bool {
        self.skip_separators();
        matches!(self.chars.peek(), Some(&c) if c.is_ascii_digit() || c == '-' || c == '+' || c == '.')
    }

    /// True when only separators remain
    pub fn is_exhausted(&mut self) -> bool {
        self.skip_separators();
        self.chars.peek().is_none()
    }

    fn extract_number(&mut self) -> Option<f64> {
        self.skip_separators();
        let mut s = String::new();
        if let Some(&c) = self.chars.peek() {
            if c == '-' || c == '+' {
                s.push(c);
                self.chars.next();
            }
        }
        let mut seen_point = false;
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() || (c == '.' && !seen_point) {
                seen_point |= c == '.';
                s.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        s.parse::<f64>().ok()
    }

    /// Integer field; decimals truncate toward zero and values saturate to `i32`
    pub fn next_int(&mut self) -> Option<i32> {
        self.extract_number().map(|v| v.trunc() as i32)
    }

    pub fn next_float(&mut self) -> Option<f32> {
        self.extract_number().map(|v| v as f32)
    }

    /// Every leading integer field, stopping at the first malformed one
    pub fn ints(&mut self) -> Vec<i32> {
        let mut out = Vec::new();
        while let Some(v) = self.next_int() {
            out.push(v);
        }
        out
    }

    /// Every leading float field, stopping at the first malformed one
    pub fn floats(&mut self) -> Vec<f32> {
        let mut out = Vec::new();
        while let Some(v) = self.next_float() {
            out.push(v);
        }
        out
    }

    /// Coordinate pairs of a flat `x,y,x,y...` run; an unpaired trailing value is dropped
    pub fn points(&mut self) -> Vec<Coord> {
        let mut out = Vec::new();
        while self.starts_number() {
            let Some(x) = self.next_int() else { break };
            let Some(y) = self.next_int() else { break };
            out.push(Coord::new(x, y));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_accept_commas_and_spaces() {
        let mut args = ArgScanner::new("10,20 30 40,-5,6");
        assert_eq!(
            args.points(),
            vec![Coord::new(10, 20), Coord::new(30, 40), Coord::new(-5, 6)]
        );
    }

    #[test]
    fn odd_trailing_coordinate_is_dropped() {
        let mut args = ArgScanner::new("1,2,3");
        assert_eq!(args.points(), vec![Coord::new(1, 2)]);
    }

    #[test]
    fn decimals_truncate_toward_zero() {
        let mut args = ArgScanner::new("12.9,-3.7");
        assert_eq!(args.next_int(), Some(12));
        assert_eq!(args.next_int(), Some(-3));
    }

    #[test]
    fn malformed_field_yields_none() {
        let mut args = ArgScanner::new("x12");
        assert_eq!(args.next_int(), None);
        let mut args = ArgScanner::new("");
        assert_eq!(args.next_float(), None);
        assert!(args.is_exhausted());
    }

    #[test]
    fn floats_stop_at_garbage() {
        let mut args = ArgScanner::new("1.5, .75 ,z 3");
        assert_eq!(args.floats(), vec![1.5, 0.75]);
    }
}
