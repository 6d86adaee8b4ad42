// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;
use core::ops::Range;

/// A run of non-whitespace characters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Word {
    /// Byte range of the word in its text.
    pub range: Range<usize>,
    /// The whitespace following the word contains a line break.
    pub has_newline: bool,
}

/// Whether `c` forces a line break.
pub fn is_newline(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Splits `text` at whitespace.
pub fn split_words(text: &str) -> Vec<Word> {
    let mut words: Vec<Word> = Vec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            if let Some(start) = start.take() {
                words.push(Word {
                    range: start..i,
                    has_newline: false,
                });
            }
            if is_newline(c) {
                if let Some(last) = words.last_mut() {
                    last.has_newline = true;
                }
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(start) = start {
        words.push(Word {
            range: start..text.len(),
            has_newline: false,
        });
    }
    words
}
