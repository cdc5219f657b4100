//! Positional character coercion for OCR glyph confusions.
//!
//! Each of the 7 plate slots expects a letter, a digit, or either. A glyph in
//! the wrong class is swapped for its look-alike when the table has one, and
//! left alone otherwise. One pass, no backtracking.

use super::PLATE_LEN;

/// Character class a plate slot expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Letter,
    Digit,
    Any,
}

/// Expected class per index. Index 4 is free: Mercosul takes a letter there,
/// Legacy a digit.
pub const SLOTS: [Slot; PLATE_LEN] = [
    Slot::Letter,
    Slot::Letter,
    Slot::Letter,
    Slot::Digit,
    Slot::Any,
    Slot::Digit,
    Slot::Digit,
];

/// A pair of look-alike maps used to push glyphs toward a slot's class.
#[derive(Debug)]
pub struct ConfusionTable {
    pub name: &'static str,
    pub digit_to_letter: &'static [(char, char)],
    pub letter_to_digit: &'static [(char, char)],
}

/// Table used by the per-line extractor.
pub const LINE_TABLE: ConfusionTable = ConfusionTable {
    name: "line",
    digit_to_letter: &[
        ('0', 'O'),
        ('1', 'I'),
        ('2', 'Z'),
        ('5', 'S'),
        ('6', 'G'),
        ('8', 'B'),
    ],
    letter_to_digit: &[
        ('O', '0'),
        ('I', '1'),
        ('L', '1'),
        ('S', '5'),
        ('Z', '2'),
        ('B', '8'),
        ('G', '6'),
    ],
};

/// Table used by the last pass of whole-text recovery. It diverges from
/// [`LINE_TABLE`]: no `2`/`6` to letters, and `Q` maps to `0`.
pub const FULL_TEXT_TABLE: ConfusionTable = ConfusionTable {
    name: "full_text",
    digit_to_letter: &[('0', 'O'), ('1', 'I'), ('5', 'S'), ('8', 'B')],
    letter_to_digit: &[
        ('O', '0'),
        ('Q', '0'),
        ('I', '1'),
        ('S', '5'),
        ('B', '8'),
        ('Z', '2'),
    ],
};

impl ConfusionTable {
    fn lookup(map: &[(char, char)], c: char) -> Option<char> {
        map.iter().find(|(from, _)| *from == c).map(|(_, to)| *to)
    }

    /// Coerce one character toward the class of `slot`.
    pub fn coerce_char(&self, slot: Slot, c: char) -> char {
        match slot {
            Slot::Letter if c.is_ascii_digit() => {
                Self::lookup(self.digit_to_letter, c).unwrap_or(c)
            }
            Slot::Digit if c.is_ascii_uppercase() => {
                Self::lookup(self.letter_to_digit, c).unwrap_or(c)
            }
            _ => c,
        }
    }

    /// Coerce the first [`PLATE_LEN`] characters by slot; anything past that
    /// is kept as-is.
    pub fn coerce(&self, text: &str) -> String {
        text.chars()
            .enumerate()
            .map(|(i, c)| match SLOTS.get(i) {
                Some(slot) => self.coerce_char(*slot, c),
                None => c,
            })
            .collect()
    }
}

/// Global substitution used by the cleanup pass: letters that look like
/// digits become digits everywhere in the text.
pub fn cleanup_substitution(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'O' => '0',
            'I' => '1',
            'S' => '5',
            'Z' => '2',
            other => other,
        })
        .collect()
}
