// ── Natural ordering ──
//
// Labels like "Gi0/2" and "Gi0/10" compare digit runs numerically, so
// listings come out in the order an operator expects.

use std::cmp::Ordering;
use std::iter::Peekable;
use std::str::Chars;

/// Compare two strings, treating each run of ASCII digits as a number.
/// Equal numbers with different zero padding fall back to plain comparison.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (mut left, mut right) = (a.chars().peekable(), b.chars().peekable());
    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let (ln, rn) = (digit_run(&mut left), digit_run(&mut right));
                let ord = ln
                    .len()
                    .cmp(&rn.len())
                    .then_with(|| ln.cmp(&rn));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(l), Some(r)) => {
                if l != r {
                    return l.cmp(&r);
                }
                left.next();
                right.next();
            }
        }
    }
}

/// Consume a digit run and return it without leading zeros.
fn digit_run(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.next_if(char::is_ascii_digit) {
        if !(run.is_empty() && c == '0') {
            run.push(c);
        }
    }
    run
}

/// A string that sorts with [`natural_cmp`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NaturalOrd(pub String);

impl From<String> for NaturalOrd {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for NaturalOrd {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl Ord for NaturalOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        natural_cmp(&self.0, &other.0)
    }
}

impl PartialOrd for NaturalOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
