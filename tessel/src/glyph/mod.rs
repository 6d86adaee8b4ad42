// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Glyph rendering and caching.
//!
//! Each font owns a [`FontAtlas`]. The [`GlyphCache`] renders glyphs into it
//! on first use and remembers their metrics and texture coordinates. Plain
//! glyphs become premultiplied white masks so the batch renderer can tint them;
//! color glyphs (layered or bitmap) keep their own colors.

mod atlas;
mod cache;
mod compose;

pub use atlas::FontAtlas;
pub use cache::{Glyph, GlyphCache, GlyphKind};
