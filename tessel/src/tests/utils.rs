// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::font::{
    ColorLayer, ColorLayers, FontMetrics, GlyphSource, RasterFormat, RasterGlyph, ShapedGlyph,
    TextShaper,
};
use crate::{Config, Context, FontConfig, FontId};

/// Uppercase `C` is a two-layer color glyph.
pub(crate) const COLOR_GLYPH: u32 = 'C' as u32;
/// Uppercase `B` is a BGRA bitmap glyph.
pub(crate) const BITMAP_GLYPH: u32 = 'B' as u32;
/// `~` cannot be rendered.
pub(crate) const BROKEN_GLYPH: u32 = '~' as u32;

const BASE_LAYER: u32 = 200;
const DOT_LAYER: u32 = 201;

/// A deterministic face with monospaced glyphs.
///
/// Every printable ASCII character maps to the glyph with its own code and
/// advances by the pixel size. Other characters map to glyph 0. Masks are
/// `2/5` of the raster size wide and `3/5` tall and sit on the baseline,
/// except `g` which drops below it.
#[derive(Clone, Debug)]
pub(crate) struct MockFace {
    size: u32,
    strike: Option<u32>,
    rasterized: Arc<AtomicUsize>,
}

impl MockFace {
    pub(crate) fn new(size: u32) -> Self {
        Self {
            size,
            strike: None,
            rasterized: Arc::default(),
        }
    }

    pub(crate) fn with_strike(mut self, strike: u32) -> Self {
        self.strike = Some(strike);
        self
    }

    /// Shared counter of `rasterize` calls.
    pub(crate) fn counter(&self) -> Arc<AtomicUsize> {
        self.rasterized.clone()
    }

    fn raster_size(&self) -> u32 {
        self.strike.unwrap_or(self.size)
    }

    fn mask(width: u32, height: u32, left: f32, top: f32) -> RasterGlyph {
        RasterGlyph {
            width,
            height,
            left,
            top,
            ascender: top,
            descender: top - height as f32,
            format: RasterFormat::Mask,
            data: vec![255; (width * height) as usize],
        }
    }
}

pub(crate) fn glyph_id(c: char) -> u32 {
    if c == ' ' || c.is_ascii_graphic() {
        c as u32
    } else {
        0
    }
}

impl GlyphSource for MockFace {
    fn pixel_size(&self) -> u32 {
        self.size
    }

    fn set_pixel_size(&mut self, size: u32) {
        self.size = size;
    }

    fn strike_size(&self) -> Option<u32> {
        self.strike
    }

    fn metrics(&self) -> FontMetrics {
        let size = self.size as f32;
        FontMetrics {
            ascender: 0.8 * size,
            descender: -0.2 * size,
            line_height: 1.2 * size,
        }
    }

    fn advance(&self, glyph: u32) -> f32 {
        if glyph == 0 {
            0.0
        } else {
            self.raster_size() as f32
        }
    }

    fn rasterize(&self, glyph: u32) -> Option<RasterGlyph> {
        self.rasterized.fetch_add(1, Ordering::Relaxed);
        let raster = self.raster_size();
        match glyph {
            0 | BROKEN_GLYPH => None,
            32 => Some(Self::mask(0, 0, 0.0, 0.0)),
            BASE_LAYER => Some(Self::mask(6, 6, 0.0, 6.0)),
            DOT_LAYER => Some(Self::mask(2, 2, 2.0, 2.0)),
            BITMAP_GLYPH => Some(RasterGlyph {
                format: RasterFormat::Bgra,
                data: [0, 0, 255, 255].repeat(9),
                ..Self::mask(3, 3, 0.0, 3.0)
            }),
            _ => {
                let (w, h) = (raster * 2 / 5, raster * 3 / 5);
                let top = if glyph == 'g' as u32 {
                    h as f32 - 2.0
                } else {
                    h as f32
                };
                Some(Self::mask(w, h, 1.0, top))
            }
        }
    }

    fn color_layers(&self, glyph: u32) -> ColorLayers {
        let mut layers = ColorLayers::new();
        if glyph == COLOR_GLYPH {
            layers.push(ColorLayer {
                glyph: BASE_LAYER,
                palette_index: 0,
            });
            layers.push(ColorLayer {
                glyph: DOT_LAYER,
                palette_index: 0xFFFF,
            });
        }
        layers
    }

    fn palette_color(&self, index: u16) -> Option<[u8; 4]> {
        (index == 0).then_some([255, 0, 0, 255])
    }
}

impl TextShaper for MockFace {
    fn shape(&self, text: &str) -> Vec<ShapedGlyph> {
        text.char_indices()
            .map(|(i, c)| {
                let glyph_id = glyph_id(c);
                ShapedGlyph {
                    glyph_id,
                    cluster: u32::try_from(i).unwrap(),
                    x_advance: if glyph_id == 0 { 0.0 } else { self.size as f32 },
                    ..ShapedGlyph::default()
                }
            })
            .collect()
    }
}

/// A context with one mock font.
pub(crate) fn context_with(config: Config, face: MockFace) -> (Context, FontId) {
    let mut cx = Context::new(config);
    let font = cx.add_font(Box::new(face)).unwrap();
    (cx, font)
}

/// A context with a 10px mock font.
pub(crate) fn context() -> (Context, FontId) {
    context_with(Config::default(), MockFace::new(10))
}

/// A configuration with a tiny glyph atlas.
pub(crate) fn small_atlas(width: u32, height: u32, max: u32) -> Config {
    Config {
        font: FontConfig {
            atlas_width: width,
            atlas_height: height,
            max_atlas_dim: max,
            ..FontConfig::default()
        },
        ..Config::default()
    }
}
