// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Loaded fonts and the engine traits they are built on.
//!
//! A [`Font`] pairs a [`FontFace`] with its private glyph atlas and the values
//! derived from its pixel size. Faces are loaded from font data with
//! [`SkrifaFace`], or supplied by the application through the [`GlyphSource`]
//! and [`TextShaper`] traits.

mod skrifa_face;

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use smallvec::SmallVec;

use crate::glyph::FontAtlas;

pub use skrifa_face::SkrifaFace;

/// Identifier of a loaded font.
///
/// Ids are never reused within a [`Context`](crate::Context).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FontId(u32);

impl FontId {
    /// Creates an id from its raw value.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw value.
    pub const fn to_raw(self) -> u32 {
        self.0
    }
}

/// Vertical metrics of a face at its current pixel size.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct FontMetrics {
    /// Distance from the baseline to the top of the tallest glyphs.
    pub ascender: f32,
    /// Distance from the baseline to the bottom of the lowest glyphs; usually negative.
    pub descender: f32,
    /// Baseline-to-baseline distance.
    pub line_height: f32,
}

/// Pixel layout of a [`RasterGlyph`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RasterFormat {
    /// One coverage byte per pixel.
    Mask,
    /// Four bytes per pixel in premultiplied BGRA order.
    Bgra,
}

/// A glyph rendered by a [`GlyphSource`].
///
/// Positions are in pixels at the raster size: the strike size when one is
/// selected, the pixel size otherwise. `y` grows upwards.
#[derive(Clone, Debug, PartialEq)]
pub struct RasterGlyph {
    /// Bitmap width.
    pub width: u32,
    /// Bitmap height.
    pub height: u32,
    /// Offset from the pen to the left edge of the bitmap.
    pub left: f32,
    /// Offset from the baseline up to the top edge of the bitmap.
    pub top: f32,
    /// Top of the glyph's ink above the baseline.
    pub ascender: f32,
    /// Bottom of the glyph's ink relative to the baseline.
    pub descender: f32,
    /// Pixel layout of `data`.
    pub format: RasterFormat,
    /// Row-major pixels without padding.
    pub data: Vec<u8>,
}

/// One layer of a color glyph.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ColorLayer {
    /// Glyph whose coverage forms the layer.
    pub glyph: u32,
    /// Entry of the color palette; `0xFFFF` means the foreground color.
    pub palette_index: u16,
}

/// Layers of a color glyph; most glyphs have only a few.
pub type ColorLayers = SmallVec<[ColorLayer; 8]>;

/// Font-outline engine: renders glyphs and exposes color data.
pub trait GlyphSource {
    /// Current pixel size.
    fn pixel_size(&self) -> u32;

    /// Changes the pixel size, selecting the closest bitmap strike if the face has any.
    fn set_pixel_size(&mut self, size: u32);

    /// Pixel size of the selected bitmap strike.
    fn strike_size(&self) -> Option<u32>;

    /// Vertical metrics at the current pixel size.
    fn metrics(&self) -> FontMetrics;

    /// Horizontal advance of a glyph at the raster size.
    fn advance(&self, glyph: u32) -> f32;

    /// Renders a glyph, or returns `None` if the face cannot.
    ///
    /// Color bitmap glyphs are returned as [`RasterFormat::Bgra`].
    fn rasterize(&self, glyph: u32) -> Option<RasterGlyph>;

    /// Layers of a color glyph, empty for ordinary glyphs.
    fn color_layers(&self, glyph: u32) -> ColorLayers;

    /// Straight-alpha RGBA of an entry of the default palette.
    fn palette_color(&self, index: u16) -> Option<[u8; 4]>;
}

/// A positioned glyph produced by shaping.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ShapedGlyph {
    /// Glyph index in the face; `0` for characters the face does not map.
    pub glyph_id: u32,
    /// Byte offset of the first character of the glyph's cluster.
    pub cluster: u32,
    /// Horizontal advance in pixels.
    pub x_advance: f32,
    /// Vertical advance in pixels.
    pub y_advance: f32,
    /// Horizontal offset in pixels.
    pub x_offset: f32,
    /// Vertical offset in pixels, `y` up.
    pub y_offset: f32,
}

/// Text-shaping engine.
pub trait TextShaper {
    /// Shapes `text` at the current pixel size.
    fn shape(&self, text: &str) -> Vec<ShapedGlyph>;
}

/// A face usable by a [`Context`](crate::Context).
pub trait FontFace: GlyphSource + TextShaper + fmt::Debug + Send {}

impl<T: GlyphSource + TextShaper + fmt::Debug + Send> FontFace for T {}

/// A font loaded into a [`Context`](crate::Context).
#[derive(Debug)]
pub struct Font {
    pub(crate) id: FontId,
    pub(crate) face: Box<dyn FontFace>,
    pub(crate) atlas: FontAtlas,
    pub(crate) space_width: f32,
    pub(crate) line_height: f32,
    pub(crate) tab_width: u32,
}

impl Font {
    pub(crate) fn new(id: FontId, face: Box<dyn FontFace>, atlas: FontAtlas, tab_width: u32) -> Self {
        let line_height = face.metrics().line_height;
        Self {
            id,
            face,
            atlas,
            space_width: 0.0,
            line_height,
            tab_width,
        }
    }

    /// The id of this font.
    pub fn id(&self) -> FontId {
        self.id
    }

    /// Current pixel size.
    pub fn size(&self) -> u32 {
        self.face.pixel_size()
    }

    /// Width of a space, used for tabs and paragraph layout.
    pub fn space_width(&self) -> f32 {
        self.space_width
    }

    /// Natural line height at the current size.
    pub fn line_height(&self) -> f32 {
        self.line_height
    }

    /// A tab advances by this many space widths.
    pub fn tab_width(&self) -> u32 {
        self.tab_width
    }

    /// The engine behind this font.
    pub fn face(&self) -> &dyn FontFace {
        self.face.as_ref()
    }

    /// The glyph atlas of this font.
    pub fn atlas(&self) -> &FontAtlas {
        &self.atlas
    }

    /// Mutable access to the atlas, for draining pending uploads.
    pub fn atlas_mut(&mut self) -> &mut FontAtlas {
        &mut self.atlas
    }

    /// Factor applied to raster metrics when a bitmap strike differs from the pixel size.
    pub(crate) fn strike_scale(&self) -> f32 {
        match self.face.strike_size() {
            Some(strike) if strike > 0 => self.face.pixel_size() as f32 / strike as f32,
            _ => 1.0,
        }
    }
}
