//! Conversions between A1-style references and 0-based (row, col) indexes.

use regex::Regex;
use std::sync::LazyLock;

static REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$?([A-Z]{1,3})\$?([1-9][0-9]*)$").expect("Hardcode regex pattern"));

/// `(0, 4)` becomes `"E1"`.
pub fn index_to_reference(row: usize, col: usize) -> String {
    format!("{}{}", index_to_col(col), row + 1)
}

/// Parses `"E1"` (or `"$E$1"`, any case) into `(0, 4)`.
pub fn reference_to_index(reference: &str) -> Option<(usize, usize)> {
    let reference = reference.trim().to_ascii_uppercase();
    let captures = REFERENCE.captures(&reference)?;
    let col = col_to_index(captures.get(1)?.as_str())?;
    let row = row_to_index(captures.get(2)?.as_str())?;
    Some((row, col))
}

/// Column letters to a 0-based index: `A` is 0, `AA` is 26.
pub fn col_to_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    letters.chars().try_fold(0usize, |index, letter| {
        letter
            .is_ascii_uppercase()
            .then(|| index * 26 + (letter as usize - 'A' as usize + 1))
    })
    .map(|index| index - 1)
}

/// 1-based row label to a 0-based index.
pub fn row_to_index(digits: &str) -> Option<usize> {
    digits.parse::<usize>().ok().filter(|row| *row > 0).map(|row| row - 1)
}

fn index_to_col(col: usize) -> String {
    let mut letters = Vec::new();
    let mut rest = col + 1;
    while rest > 0 {
        let digit = (rest - 1) % 26;
        letters.push((b'A' + digit as u8) as char);
        rest = (rest - 1) / 26;
    }
    letters.iter().rev().collect()
}
