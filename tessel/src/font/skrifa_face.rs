// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use harfrust::FontRef as ShaperFontRef;
use peniko::kurbo::{BezPath, Shape};
use peniko::{Blob, Fill};
use skrifa::bitmap::BitmapData;
use skrifa::instance::{LocationRef, Size};
use skrifa::outline::{DrawSettings, OutlinePen};
use skrifa::raw::TableProvider;
use skrifa::{FontRef, GlyphId, MetadataProvider};

use super::{
    ColorLayer, ColorLayers, FontMetrics, GlyphSource, RasterFormat, RasterGlyph, ShapedGlyph,
    TextShaper,
};
use crate::vector::path::PathBuilder;
use crate::vector::raster::rasterize_mask;
use crate::{Error, Result};

const OUTLINE_TILE_SIZE: u32 = 16;
const FLATTEN_TOLERANCE: f64 = 0.1;

/// A face read with skrifa and shaped with harfrust.
pub struct SkrifaFace {
    data: Blob<u8>,
    index: u32,
    shaper_data: harfrust::ShaperData,
    units_per_em: f32,
    size: u32,
    strike: Option<u32>,
}

impl SkrifaFace {
    /// Parses the face at `index` of a font file or collection.
    pub fn new(data: Blob<u8>, index: u32, size: u32) -> Result<Self> {
        let font = FontRef::from_index(data.as_ref(), index).map_err(|_| Error::FontLoad {
            reason: "font data could not be parsed",
        })?;
        let shaper_font =
            ShaperFontRef::from_index(data.as_ref(), index).map_err(|_| Error::FontLoad {
                reason: "font data is not usable for shaping",
            })?;
        let units_per_em = f32::from(
            font.metrics(Size::unscaled(), LocationRef::default())
                .units_per_em,
        );
        if units_per_em <= 0.0 {
            return Err(Error::FontLoad {
                reason: "font has no units per em",
            });
        }
        let strike = select_strike(&font, size);
        let shaper_data = harfrust::ShaperData::new(&shaper_font);
        Ok(Self {
            data,
            index,
            shaper_data,
            units_per_em,
            size,
            strike,
        })
    }

    /// Parses font data held in memory.
    pub fn from_vec(data: Vec<u8>, index: u32, size: u32) -> Result<Self> {
        Self::new(Blob::new(Arc::new(data)), index, size)
    }

    fn font(&self) -> Option<FontRef<'_>> {
        FontRef::from_index(self.data.as_ref(), self.index).ok()
    }

    fn raster_size(&self) -> Size {
        Size::new(self.strike.unwrap_or(self.size) as f32)
    }

    fn bitmap_glyph(&self, font: &FontRef<'_>, glyph: GlyphId) -> Option<RasterGlyph> {
        self.strike?;
        let bitmap = font
            .bitmap_strikes()
            .glyph_for_size(self.raster_size(), glyph)?;
        let BitmapData::Bgra(data) = bitmap.data else {
            return None;
        };
        Some(RasterGlyph {
            width: bitmap.width,
            height: bitmap.height,
            left: bitmap.inner_bearing_x,
            top: bitmap.inner_bearing_y,
            ascender: bitmap.inner_bearing_y,
            descender: bitmap.inner_bearing_y - bitmap.height as f32,
            format: RasterFormat::Bgra,
            data: data.to_vec(),
        })
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "strike sizes are small integers stored as f32"
)]
fn select_strike(font: &FontRef<'_>, size: u32) -> Option<u32> {
    let target = size as f32;
    font.bitmap_strikes()
        .iter()
        .map(|strike| strike.ppem())
        .min_by(|a, b| (a - target).abs().total_cmp(&(b - target).abs()))
        .map(|ppem| ppem.round() as u32)
}

impl GlyphSource for SkrifaFace {
    fn pixel_size(&self) -> u32 {
        self.size
    }

    fn set_pixel_size(&mut self, size: u32) {
        self.size = size;
        self.strike = self.font().and_then(|font| select_strike(&font, size));
    }

    fn strike_size(&self) -> Option<u32> {
        self.strike
    }

    fn metrics(&self) -> FontMetrics {
        let Some(font) = self.font() else {
            return FontMetrics::default();
        };
        let metrics = font.metrics(Size::new(self.size as f32), LocationRef::default());
        FontMetrics {
            ascender: metrics.ascent,
            descender: metrics.descent,
            line_height: metrics.ascent - metrics.descent + metrics.leading,
        }
    }

    fn advance(&self, glyph: u32) -> f32 {
        self.font()
            .and_then(|font| {
                font.glyph_metrics(self.raster_size(), LocationRef::default())
                    .advance_width(GlyphId::new(glyph))
            })
            .unwrap_or(0.0)
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "outline bounds are stored as f32 metrics"
    )]
    fn rasterize(&self, glyph: u32) -> Option<RasterGlyph> {
        let font = self.font()?;
        let glyph = GlyphId::new(glyph);
        if let Some(bitmap) = self.bitmap_glyph(&font, glyph) {
            return Some(bitmap);
        }

        let outline = font.outline_glyphs().get(glyph)?;
        let mut pen = FlippedPath::default();
        outline
            .draw(
                DrawSettings::unhinted(self.raster_size(), LocationRef::default()),
                &mut pen,
            )
            .ok()?;
        let mut builder = PathBuilder::new();
        builder.bez_path(&pen.0, FLATTEN_TOLERANCE);
        let segments = builder.finish();
        let Some(mask) = rasterize_mask(&segments, Fill::NonZero, OUTLINE_TILE_SIZE).ok()? else {
            return Some(RasterGlyph {
                width: 0,
                height: 0,
                left: 0.0,
                top: 0.0,
                ascender: 0.0,
                descender: 0.0,
                format: RasterFormat::Mask,
                data: Vec::new(),
            });
        };
        let ink = pen.0.bounding_box();
        Some(RasterGlyph {
            width: mask.width,
            height: mask.height,
            left: mask.origin[0],
            top: -mask.origin[1],
            ascender: -ink.y0 as f32,
            descender: -ink.y1 as f32,
            format: RasterFormat::Mask,
            data: mask.data,
        })
    }

    fn color_layers(&self, glyph: u32) -> ColorLayers {
        let mut layers = ColorLayers::new();
        let Some(font) = self.font() else {
            return layers;
        };
        let Ok(colr) = font.colr() else {
            return layers;
        };
        let Ok(Some(range)) = colr.v0_base_glyph(GlyphId::new(glyph)) else {
            return layers;
        };
        for index in range {
            if let Ok((layer, palette_index)) = colr.v0_layer(index) {
                layers.push(ColorLayer {
                    glyph: layer.to_u32(),
                    palette_index,
                });
            }
        }
        layers
    }

    fn palette_color(&self, index: u16) -> Option<[u8; 4]> {
        let font = self.font()?;
        let cpal = font.cpal().ok()?;
        let first = cpal.color_record_indices().first()?.get();
        let records = cpal.color_records_array()?.ok()?;
        let record = records.get(usize::from(first) + usize::from(index))?;
        Some([record.red(), record.green(), record.blue(), record.alpha()])
    }
}

impl TextShaper for SkrifaFace {
    fn shape(&self, text: &str) -> Vec<ShapedGlyph> {
        let Ok(font) = ShaperFontRef::from_index(self.data.as_ref(), self.index) else {
            return Vec::new();
        };
        let shaper = self
            .shaper_data
            .shaper(&font)
            .point_size(Some(self.size as f32))
            .build();
        let mut buffer = harfrust::UnicodeBuffer::new();
        buffer.push_str(text);
        buffer.guess_segment_properties();
        let shaped = shaper.shape(buffer, &[]);
        let scale = self.size as f32 / self.units_per_em;
        shaped
            .glyph_infos()
            .iter()
            .zip(shaped.glyph_positions())
            .map(|(info, pos)| ShapedGlyph {
                glyph_id: info.glyph_id,
                cluster: info.cluster,
                x_advance: pos.x_advance as f32 * scale,
                y_advance: pos.y_advance as f32 * scale,
                x_offset: pos.x_offset as f32 * scale,
                y_offset: pos.y_offset as f32 * scale,
            })
            .collect()
    }
}

impl fmt::Debug for SkrifaFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkrifaFace")
            .field("index", &self.index)
            .field("size", &self.size)
            .field("strike", &self.strike)
            .finish_non_exhaustive()
    }
}

/// Collects an outline with `y` pointing down.
#[derive(Default)]
struct FlippedPath(BezPath);

impl OutlinePen for FlippedPath {
    fn move_to(&mut self, x: f32, y: f32) {
        self.0.move_to((x, -y));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.0.line_to((x, -y));
    }

    fn quad_to(&mut self, cx0: f32, cy0: f32, x: f32, y: f32) {
        self.0.quad_to((cx0, -cy0), (x, -y));
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        self.0.curve_to((cx0, -cy0), (cx1, -cy1), (x, -y));
    }

    fn close(&mut self) {
        self.0.close_path();
    }
}
