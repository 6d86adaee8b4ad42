// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Single-line and paragraph text layout.
//!
//! Layout walks cached shaping results, loads glyphs on demand and hands one
//! [`GlyphQuad`] per visible glyph to a [`GlyphSink`], usually the batch
//! renderer. Positions are in pixels with `y` pointing down; the position
//! passed to a render call is the top-left corner of the text.

mod paragraph;
mod render;

use alloc::vec::Vec;

use peniko::Color;

use crate::atlas::UvRect;
use crate::font::{Font, FontId};
use crate::glyph::{Glyph, GlyphCache, GlyphKind};
use crate::shape::{ShapedText, ShapingCache};
use crate::{Error, Result};

/// A glyph positioned for drawing.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GlyphQuad {
    /// Font whose atlas holds the glyph.
    pub font: FontId,
    /// Glyph index.
    pub glyph_id: u32,
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Quad width.
    pub width: f32,
    /// Quad height.
    pub height: f32,
    /// Texture coordinates in the font's atlas.
    pub uv: UvRect,
    /// Text color.
    pub color: Color,
    /// The atlas cell carries its own colors and should not be tinted.
    pub colored: bool,
}

/// Receiver of laid out glyphs.
pub trait GlyphSink {
    /// Accepts one glyph.
    fn push(&mut self, quad: GlyphQuad);
}

impl GlyphSink for Vec<GlyphQuad> {
    fn push(&mut self, quad: GlyphQuad) {
        Self::push(self, quad);
    }
}

/// Extent of laid out text.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct TextProps {
    /// Width of the widest line.
    pub width: f32,
    /// Total height.
    pub height: f32,
    /// Top-left corner of the laid out text.
    pub anchor: [f32; 2],
}

/// Horizontal alignment of paragraph lines.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Alignment {
    /// Lines start at the paragraph position.
    #[default]
    Left,
    /// Lines are centered in the wrap width.
    Center,
    /// Lines end at the wrap width.
    Right,
}

/// Paragraph layout options.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ParagraphProps {
    /// Width after which lines wrap, measured from the paragraph position.
    ///
    /// Without one, lines only break at explicit line breaks and alignment
    /// is relative to the widest line.
    pub wrap: Option<f32>,
    /// Line alignment.
    pub align: Alignment,
}

/// The state layout needs for one font, split so each part can be borrowed on its own.
pub(crate) struct TextContext<'a> {
    pub(crate) font: &'a mut Font,
    pub(crate) glyphs: &'a mut GlyphCache,
    pub(crate) shaping: &'a mut ShapingCache,
}

/// Loads a glyph, treating glyphs the face cannot render as invisible.
fn visible_glyph(glyphs: &mut GlyphCache, font: &mut Font, id: u32) -> Result<Option<Glyph>> {
    match glyphs.get_glyph(font, id) {
        Ok(glyph) => Ok(Some(glyph)),
        Err(err @ Error::GlyphLoad { .. }) => {
            log::warn!("skipping glyph: {err}");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// Distance from the top of the text to its first baseline.
fn highest_bearing(
    glyphs: &mut GlyphCache,
    font: &mut Font,
    shaped: &mut ShapedText,
) -> Result<f32> {
    if let Some(bearing) = shaped.highest_bearing() {
        return Ok(bearing);
    }
    let mut highest = 0.0_f32;
    for g in shaped.glyphs() {
        if g.glyph_id == 0 {
            continue;
        }
        if let Some(glyph) = visible_glyph(glyphs, font, g.glyph_id)? {
            highest = highest.max(glyph.bearing_y);
        }
    }
    shaped.set_highest_bearing(highest);
    Ok(highest)
}

fn quad(glyph: &Glyph, pen: [f32; 2], color: Color) -> GlyphQuad {
    GlyphQuad {
        font: glyph.font,
        glyph_id: glyph.id,
        x: pen[0] + glyph.bearing_x,
        y: pen[1] - glyph.bearing_y,
        width: glyph.width,
        height: glyph.height,
        uv: glyph.uv,
        color,
        colored: glyph.kind == GlyphKind::Color,
    }
}
