// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::sync::atomic::Ordering;

use super::utils::{
    BITMAP_GLYPH, BROKEN_GLYPH, COLOR_GLYPH, MockFace, context, context_with, small_atlas,
};
use crate::atlas::UvRect;
use crate::{Config, Error, GlyphKind};

const A: u32 = 'a' as u32;

#[test]
fn get_glyph_is_idempotent() {
    let face = MockFace::new(10);
    let counter = face.counter();
    let (mut cx, font) = context_with(Config::default(), face);

    let first = cx.get_glyph(font, A).unwrap();
    let calls = counter.load(Ordering::Relaxed);
    let before = cx.glyph_stats();
    let second = cx.get_glyph(font, A).unwrap();
    assert_eq!(first, second);
    assert_eq!(counter.load(Ordering::Relaxed), calls, "cache hit rasterized");

    let after = cx.glyph_stats();
    assert_eq!(after.hits, before.hits + 1);
    assert_eq!(after.misses, before.misses);
    assert_eq!(after.entries, cx.glyph_cache().len());
}

#[test]
fn plain_glyph_metrics_and_uv() {
    let (mut cx, font) = context();
    let glyph = cx.get_glyph(font, A).unwrap();
    assert_eq!(glyph.kind, GlyphKind::Mask);
    assert_eq!((glyph.width, glyph.height), (4.0, 6.0));
    assert_eq!((glyph.bearing_x, glyph.bearing_y), (1.0, 6.0));
    assert_eq!(glyph.advance, 10.0);
    // The cell is padded by one pixel; the UVs cover only the glyph.
    assert_eq!(glyph.uv, UvRect::from_pixels(1, 1, 4, 6, 1024, 1024));

    let atlas = cx.font(font).unwrap().atlas().image();
    assert_eq!(atlas.pixel(1, 1), [255; 4]);
    assert_eq!(atlas.pixel(0, 0), [0; 4]);
    assert_eq!(atlas.pixel(5, 1), [0; 4]);
}

#[test]
fn space_takes_no_atlas_space() {
    let (mut cx, font) = context();
    let space = cx.get_glyph(font, ' ' as u32).unwrap();
    assert_eq!(space.width, 0.0);
    assert_eq!(space.advance, 10.0);
    assert_eq!(space.uv, UvRect::default());
    // The next glyph still lands in the corner.
    let a = cx.get_glyph(font, A).unwrap();
    assert_eq!(a.uv, UvRect::from_pixels(1, 1, 4, 6, 1024, 1024));
}

#[test]
fn broken_glyph_is_an_error() {
    let (mut cx, font) = context();
    assert_eq!(
        cx.get_glyph(font, BROKEN_GLYPH),
        Err(Error::GlyphLoad {
            font,
            glyph: BROKEN_GLYPH
        })
    );
    assert!(cx.glyph_cache().get(font, BROKEN_GLYPH).is_none());
}

#[test]
fn color_layers_are_composited() {
    let (mut cx, font) = context();
    let glyph = cx.get_glyph(font, COLOR_GLYPH).unwrap();
    assert_eq!(glyph.kind, GlyphKind::Color);
    assert_eq!((glyph.width, glyph.height), (6.0, 6.0));
    assert_eq!((glyph.bearing_x, glyph.bearing_y), (0.0, 6.0));
    assert_eq!((glyph.ascender, glyph.descender), (6.0, 0.0));
    assert_eq!(glyph.uv, UvRect::from_pixels(0, 0, 6, 6, 1024, 1024));

    let atlas = cx.font(font).unwrap().atlas().image();
    // Palette entry 0 is red; the foreground layer falls back to black.
    assert_eq!(atlas.pixel(0, 0), [255, 0, 0, 255]);
    assert_eq!(atlas.pixel(2, 4), [0, 0, 0, 255]);
}

#[test]
fn bitmap_glyph_is_swizzled() {
    let (mut cx, font) = context();
    let glyph = cx.get_glyph(font, BITMAP_GLYPH).unwrap();
    assert_eq!(glyph.kind, GlyphKind::Color);
    assert_eq!((glyph.width, glyph.height), (3.0, 3.0));
    let atlas = cx.font(font).unwrap().atlas().image();
    assert_eq!(atlas.pixel(1, 1), [255, 0, 0, 255]);
}

#[test]
fn strike_metrics_are_scaled() {
    let (mut cx, font) = context_with(Config::default(), MockFace::new(10).with_strike(20));
    let glyph = cx.get_glyph(font, A).unwrap();
    // Rendered at 20px: 8x12, reported at 10px.
    assert_eq!((glyph.width, glyph.height), (4.0, 6.0));
    assert_eq!(glyph.advance, 10.0);
    assert_eq!(glyph.uv, UvRect::from_pixels(1, 1, 8, 12, 1024, 1024));
}

#[test]
fn atlas_growth_refreshes_cached_uvs() {
    // 6x8 cells: two per row, two rows before the atlas has to grow.
    let (mut cx, font) = context_with(small_atlas(16, 16, 64), MockFace::new(10));
    let ids = ['a', 'b', 'c', 'd'].map(|c| c as u32);
    for id in ids {
        cx.get_glyph(font, id).unwrap();
    }
    let generation = cx.font(font).unwrap().atlas().image().generation();
    assert_eq!(
        cx.glyph_cache().get(font, A).unwrap().uv,
        UvRect::from_pixels(1, 1, 4, 6, 16, 16)
    );

    let e = cx.get_glyph(font, 'e' as u32).unwrap();
    let image = cx.font(font).unwrap().atlas().image();
    assert_eq!((image.width(), image.height()), (32, 32));
    assert_ne!(image.generation(), generation);
    assert_eq!(e.uv, UvRect::from_pixels(1, 17, 4, 6, 32, 32));
    assert_eq!(
        cx.glyph_cache().get(font, A).unwrap().uv,
        UvRect::from_pixels(1, 1, 4, 6, 32, 32)
    );
    // Earlier pixels were kept.
    assert_eq!(image.pixel(1, 1), [255; 4]);
}

#[test]
fn color_overflow_is_reported() {
    let (mut cx, font) = context_with(small_atlas(16, 4, 64), MockFace::new(10));
    assert_eq!(
        cx.get_glyph(font, COLOR_GLYPH),
        Err(Error::AtlasFull {
            width: 6,
            height: 6
        })
    );
}
