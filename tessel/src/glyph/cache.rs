// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;

use hashbrown::HashMap;

use super::compose::{
    CELL_PADDING, DEFAULT_LAYER_COLOR, Layer, composite_layers, layer_bounds, padded_cell,
};
use crate::atlas::UvRect;
use crate::font::{ColorLayer, Font, FontId, RasterFormat, RasterGlyph};
use crate::{CacheStats, Error, Result};

/// How a glyph's atlas cell should be drawn.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GlyphKind {
    /// Premultiplied white coverage, tinted by the text color.
    Mask,
    /// Final colors from a palette or bitmap; not tinted.
    Color,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Region {
    pub(crate) x: u32,
    pub(crate) y: u32,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

/// Metrics and atlas location of one glyph of one font at its current size.
///
/// Sizes are in pixels at the font's pixel size. The texture coordinates stay
/// valid until the font's atlas grows or the font size changes; the cache
/// updates its entries in both cases, so look glyphs up again instead of
/// keeping copies across frames.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Glyph {
    /// Font the glyph belongs to.
    pub font: FontId,
    /// Glyph index in the face.
    pub id: u32,
    /// How the atlas cell should be drawn.
    pub kind: GlyphKind,
    /// Width of the drawn quad.
    pub width: f32,
    /// Height of the drawn quad.
    pub height: f32,
    /// Offset from the pen to the left edge of the quad.
    pub bearing_x: f32,
    /// Offset from the baseline up to the top edge of the quad.
    pub bearing_y: f32,
    /// Horizontal advance.
    pub advance: f32,
    /// Top of the glyph's ink above the baseline.
    pub ascender: f32,
    /// Bottom of the glyph's ink relative to the baseline.
    pub descender: f32,
    /// Texture coordinates of the glyph in its font's atlas.
    pub uv: UvRect,
    pub(crate) region: Region,
}

/// Rendered glyphs keyed by font and glyph index.
#[derive(Clone, Debug, Default)]
pub struct GlyphCache {
    entries: HashMap<(FontId, u32), Glyph>,
    hits: u64,
    misses: u64,
}

impl GlyphCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a glyph without loading it.
    pub fn get(&self, font: FontId, glyph: u32) -> Option<&Glyph> {
        self.entries.get(&(font, glyph))
    }

    /// Number of cached glyphs.
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

    /// Returns the cached glyph, rendering it into the font's atlas on a miss.
    pub(crate) fn get_glyph(&mut self, font: &mut Font, glyph: u32) -> Result<Glyph> {
        let key = (font.id, glyph);
        if let Some(cached) = self.entries.get(&key) {
            self.hits += 1;
            return Ok(*cached);
        }
        self.misses += 1;
        let (loaded, grown) = load_glyph(font, glyph)?;
        self.entries.insert(key, loaded);
        if grown {
            self.refresh_uvs(font);
        }
        Ok(self.entries.get(&key).copied().unwrap_or(loaded))
    }

    /// Renders every cached glyph of `font` again, after its size changed
    /// and its atlas was reset.
    ///
    /// Glyphs that no longer load are dropped.
    pub(crate) fn reload_font(&mut self, font: &mut Font) {
        let mut ids: Vec<u32> = self
            .entries
            .keys()
            .filter(|(owner, _)| *owner == font.id)
            .map(|(_, glyph)| *glyph)
            .collect();
        ids.sort_unstable();
        log::debug!("reloading {} glyphs of font {}", ids.len(), font.id.to_raw());

        let mut grown = false;
        for id in ids {
            match load_glyph(font, id) {
                Ok((glyph, g)) => {
                    grown |= g;
                    self.entries.insert((font.id, id), glyph);
                }
                Err(err) => {
                    log::warn!("dropping glyph after reload: {err}");
                    self.entries.remove(&(font.id, id));
                }
            }
        }
        if grown {
            self.refresh_uvs(font);
        }
    }

    /// Drops every glyph of a font.
    pub(crate) fn remove_font(&mut self, font: FontId) {
        self.entries.retain(|(owner, _), _| *owner != font);
    }

    fn refresh_uvs(&mut self, font: &Font) {
        for ((owner, _), glyph) in &mut self.entries {
            if *owner == font.id && glyph.region.width > 0 {
                let r = glyph.region;
                glyph.uv = font.atlas.uv(r.x, r.y, r.width, r.height);
            }
        }
    }
}

/// Renders a glyph into the font's atlas.
///
/// Returns whether the atlas had to grow.
fn load_glyph(font: &mut Font, id: u32) -> Result<(Glyph, bool)> {
    let scale = font.strike_scale();
    let raster = font.face.rasterize(id);
    if let Some(bitmap) = raster.as_ref().filter(|r| r.format == RasterFormat::Bgra) {
        return place_bitmap(font, id, bitmap, scale, GlyphKind::Color);
    }
    let layers = font.face.color_layers(id);
    if !layers.is_empty() {
        return load_color(font, id, &layers, scale).map(|glyph| (glyph, false));
    }
    match raster {
        Some(raster) => place_bitmap(font, id, &raster, scale, GlyphKind::Mask),
        None => Err(Error::GlyphLoad {
            font: font.id,
            glyph: id,
        }),
    }
}

fn place_bitmap(
    font: &mut Font,
    id: u32,
    raster: &RasterGlyph,
    scale: f32,
    kind: GlyphKind,
) -> Result<(Glyph, bool)> {
    let advance = font.face.advance(id) * scale;
    let mut glyph = Glyph {
        font: font.id,
        id,
        kind,
        width: raster.width as f32 * scale,
        height: raster.height as f32 * scale,
        bearing_x: raster.left * scale,
        bearing_y: raster.top * scale,
        advance,
        ascender: raster.ascender * scale,
        descender: raster.descender * scale,
        uv: UvRect::default(),
        region: Region::default(),
    };
    if raster.width == 0 || raster.height == 0 {
        return Ok((glyph, false));
    }

    let cell = padded_cell(raster);
    let placement = font
        .atlas
        .insert(cell.width, cell.height, &cell.data, true)?;
    glyph.region = Region {
        x: placement.x + CELL_PADDING,
        y: placement.y + CELL_PADDING,
        width: raster.width,
        height: raster.height,
    };
    let r = glyph.region;
    glyph.uv = font.atlas.uv(r.x, r.y, r.width, r.height);
    Ok((glyph, placement.grown))
}

fn load_color(font: &mut Font, id: u32, layers: &[ColorLayer], scale: f32) -> Result<Glyph> {
    let rendered: Vec<Layer> = layers
        .iter()
        .filter_map(|layer| {
            let raster = font.face.rasterize(layer.glyph)?;
            let color = if layer.palette_index == 0xFFFF {
                DEFAULT_LAYER_COLOR
            } else {
                font.face
                    .palette_color(layer.palette_index)
                    .unwrap_or(DEFAULT_LAYER_COLOR)
            };
            Some(Layer { raster, color })
        })
        .collect();
    let err = Error::GlyphLoad {
        font: font.id,
        glyph: id,
    };
    let bounds = layer_bounds(&rendered).ok_or(err)?;
    let side = font
        .face
        .strike_size()
        .unwrap_or_else(|| bounds.width().max(bounds.height()))
        .max(1);
    let cell = composite_layers(&rendered, bounds, side);
    let placement = font
        .atlas
        .insert(cell.width, cell.height, &cell.data, false)?;

    let region = Region {
        x: placement.x,
        y: placement.y,
        width: cell.width,
        height: cell.height,
    };
    let bearing_y = -(bounds.min_y as f32) * scale;
    let height = cell.height as f32 * scale;
    Ok(Glyph {
        font: font.id,
        id,
        kind: GlyphKind::Color,
        width: cell.width as f32 * scale,
        height,
        bearing_x: bounds.min_x as f32 * scale,
        bearing_y,
        advance: font.face.advance(id) * scale,
        ascender: bearing_y,
        descender: bearing_y - height,
        uv: font.atlas.uv(region.x, region.y, region.width, region.height),
        region,
    })
}
