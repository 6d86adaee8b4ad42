// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::utils::{MockFace, context};
use crate::font::{Font, FontId};
use crate::glyph::FontAtlas;
use crate::shape::{ShapingCache, djb2};
use crate::FontConfig;

fn font(raw: u32, size: u32) -> Font {
    Font::new(
        FontId::from_raw(raw),
        Box::new(MockFace::new(size)),
        FontAtlas::new(&FontConfig::default()),
        4,
    )
}

#[test]
fn shaped_text_is_cached() {
    let (mut cx, font) = context();
    let before = cx.shaping_stats();
    let clusters: Vec<u32> = cx
        .get_shaped(font, "hello")
        .unwrap()
        .glyphs()
        .iter()
        .map(|g| g.cluster)
        .collect();
    assert_eq!(clusters, [0, 1, 2, 3, 4]);
    let shaped = cx.get_shaped(font, "hello").unwrap();
    assert_eq!(shaped.text(), "hello");
    assert_eq!(shaped.hash(), djb2("hello"));

    let after = cx.shaping_stats();
    assert_eq!(after.misses, before.misses + 1);
    assert_eq!(after.hits, before.hits + 1);
}

#[test]
fn hash_collision_is_reshaped() {
    let font = font(0, 10);
    let mut cache = ShapingCache::new();
    cache.insert_raw(&font, djb2("hello"), "other");

    let shaped = cache.get_shaped(&font, "hello");
    assert_eq!(shaped.text(), "hello");
    assert_eq!(shaped.glyphs()[0].glyph_id, 'h' as u32);
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.stats().misses, 1);
    assert!(cache.get(font.id(), "hello").is_some());
}

#[test]
fn entries_are_per_font() {
    let (small, large) = (font(0, 10), font(1, 20));
    let mut cache = ShapingCache::new();
    assert_eq!(cache.get_shaped(&small, "a").glyphs()[0].x_advance, 10.0);
    assert_eq!(cache.get_shaped(&large, "a").glyphs()[0].x_advance, 20.0);
    assert_eq!(cache.len(), 2);

    cache.remove_font(small.id());
    assert!(cache.get(small.id(), "a").is_none());
    assert!(cache.get(large.id(), "a").is_some());
}

#[test]
fn words_are_derived_lazily() {
    let font = font(0, 10);
    let mut cache = ShapingCache::new();
    let shaped = cache.get_shaped(&font, "one two\nthree");
    let words: Vec<_> = shaped
        .words()
        .iter()
        .map(|w| (w.range.clone(), w.has_newline))
        .collect();
    assert_eq!(words, [(0..3, false), (4..7, true), (8..13, false)]);
}

#[test]
fn size_change_reshapes() {
    let (mut cx, font) = context();
    cx.get_shaped(font, "ab").unwrap();
    cx.set_font_size(font, 20).unwrap();
    let shaped = cx.shaping_cache().get(font, "ab").unwrap();
    assert_eq!(shaped.glyphs()[1].x_advance, 20.0);
    assert_eq!(shaped.highest_bearing(), None);
}
