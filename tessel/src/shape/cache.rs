// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::string::String;
use alloc::vec::Vec;

use hashbrown::HashMap;
use hashbrown::hash_map::Entry;

use super::words::{Word, split_words};
use crate::CacheStats;
use crate::font::{Font, FontId, ShapedGlyph};

/// The djb2 string hash: `h = h * 33 + byte`, seeded with 5381.
pub fn djb2(text: &str) -> u64 {
    text.bytes()
        .fold(5381_u64, |h, b| h.wrapping_mul(33).wrapping_add(u64::from(b)))
}

/// A string shaped with one font, together with a copy of the string.
///
/// Word boundaries and the tallest glyph bearing are derived on first use.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapedText {
    text: String,
    hash: u64,
    glyphs: Vec<ShapedGlyph>,
    words: Option<Vec<Word>>,
    highest_bearing: Option<f32>,
}

impl ShapedText {
    fn new(font: &Font, text: &str, hash: u64) -> Self {
        Self {
            text: text.into(),
            hash,
            glyphs: font.face.shape(text),
            words: None,
            highest_bearing: None,
        }
    }

    /// The shaped string.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The [`djb2`] hash of the string.
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// Glyphs in visual order.
    pub fn glyphs(&self) -> &[ShapedGlyph] {
        &self.glyphs
    }

    /// Whitespace-separated words of the string.
    pub fn words(&mut self) -> &[Word] {
        self.words.get_or_insert_with(|| split_words(&self.text))
    }

    /// Largest bearing of the string's glyphs, once it has been rendered.
    pub fn highest_bearing(&self) -> Option<f32> {
        self.highest_bearing
    }

    pub(crate) fn set_highest_bearing(&mut self, bearing: f32) {
        self.highest_bearing = Some(bearing);
    }

    fn reshape(&mut self, font: &Font) {
        self.glyphs = font.face.shape(&self.text);
        self.highest_bearing = None;
    }
}

/// Shaping results keyed by font and string hash.
#[derive(Clone, Debug, Default)]
pub struct ShapingCache {
    entries: HashMap<(FontId, u64), ShapedText>,
    hits: u64,
    misses: u64,
}

impl ShapingCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a shaped string without shaping it.
    pub fn get(&self, font: FontId, text: &str) -> Option<&ShapedText> {
        self.entries
            .get(&(font, djb2(text)))
            .filter(|shaped| shaped.text == text)
    }

    /// Number of cached strings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lookup counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.entries.len(),
        }
    }

    /// Returns the shaped string, shaping it with `font` on a miss.
    ///
    /// An entry whose hash matches but whose string differs is replaced.
    pub(crate) fn get_shaped(&mut self, font: &Font, text: &str) -> &mut ShapedText {
        let hash = djb2(text);
        match self.entries.entry((font.id, hash)) {
            Entry::Occupied(entry) => {
                let shaped = entry.into_mut();
                if shaped.text == text {
                    self.hits += 1;
                } else {
                    log::debug!(
                        "shaping cache collision on {hash:#x}: {:?} replaced by {text:?}",
                        shaped.text
                    );
                    self.misses += 1;
                    *shaped = ShapedText::new(font, text, hash);
                }
                shaped
            }
            Entry::Vacant(entry) => {
                self.misses += 1;
                entry.insert(ShapedText::new(font, text, hash))
            }
        }
    }

    /// Shapes every cached string of `font` again, after its size changed.
    pub(crate) fn reload_font(&mut self, font: &Font) {
        let mut count = 0_usize;
        for ((owner, _), shaped) in &mut self.entries {
            if *owner == font.id {
                shaped.reshape(font);
                count += 1;
            }
        }
        log::debug!("reshaped {count} strings of font {}", font.id.to_raw());
    }

    /// Drops every string of a font.
    pub(crate) fn remove_font(&mut self, font: FontId) {
        self.entries.retain(|(owner, _), _| *owner != font);
    }

    #[cfg(test)]
    pub(crate) fn insert_raw(&mut self, font: &Font, key_hash: u64, text: &str) {
        self.entries
            .insert((font.id, key_hash), ShapedText::new(font, text, key_hash));
    }
}
