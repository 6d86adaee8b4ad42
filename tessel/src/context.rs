// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The object owning every font, cache and atlas.

use alloc::boxed::Box;
use alloc::vec::Vec;

use hashbrown::HashMap;
use peniko::{Blob, Color};

use crate::config::Config;
use crate::font::{Font, FontFace, FontId, SkrifaFace};
use crate::glyph::{FontAtlas, Glyph, GlyphCache};
use crate::shape::{ShapedText, ShapingCache};
use crate::text::{GlyphSink, ParagraphProps, TextContext, TextProps};
use crate::vector::VectorGraphics;
use crate::{Error, Result};

/// Lookup counters of a cache.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that had to render or shape.
    pub misses: u64,
    /// Current number of entries.
    pub entries: usize,
}

/// Fonts, glyph and shaping caches, and vector state.
///
/// All operations run on the calling thread. Atlas pixels change in place;
/// the batch renderer drains their pending uploads after layout.
#[derive(Debug)]
pub struct Context {
    fonts: HashMap<FontId, Font>,
    next_font: u32,
    glyphs: GlyphCache,
    shaping: ShapingCache,
    vector: VectorGraphics,
    config: Config,
}

impl Default for Context {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Context {
    /// Creates an empty context.
    pub fn new(config: Config) -> Self {
        Self {
            fonts: HashMap::new(),
            next_font: 0,
            glyphs: GlyphCache::new(),
            shaping: ShapingCache::new(),
            vector: VectorGraphics::new(config.vector),
            config,
        }
    }

    /// The configuration this context was created with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Loads the face at `index` of a font file at `size` pixels.
    pub fn load_font(&mut self, data: Blob<u8>, index: u32, size: u32) -> Result<FontId> {
        let face = SkrifaFace::new(data, index, size).inspect_err(|err| {
            log::warn!("{err}");
        })?;
        self.add_font(Box::new(face))
    }

    /// Like [`Context::load_font`], for font data in a vector.
    pub fn load_font_from_vec(&mut self, data: Vec<u8>, index: u32, size: u32) -> Result<FontId> {
        let face = SkrifaFace::from_vec(data, index, size).inspect_err(|err| {
            log::warn!("{err}");
        })?;
        self.add_font(Box::new(face))
    }

    /// Adds a font backed by a custom engine, at the engine's current pixel size.
    pub fn add_font(&mut self, face: Box<dyn FontFace>) -> Result<FontId> {
        let id = FontId::from_raw(self.next_font);
        self.next_font += 1;
        let atlas = FontAtlas::new(&self.config.font);
        let tab_width = self.config.font.tab_width;
        let font = self
            .fonts
            .entry(id)
            .or_insert_with(|| Font::new(id, face, atlas, tab_width));
        match measure_space(font, &mut self.glyphs, &mut self.shaping) {
            Ok(width) => font.space_width = width,
            Err(err) => {
                self.remove_font(id)?;
                return Err(err);
            }
        }
        log::debug!(
            "added font {} at {}px, space width {}",
            id.to_raw(),
            font.size(),
            font.space_width
        );
        Ok(id)
    }

    /// Changes the pixel size of a font.
    ///
    /// The font's atlas is cleared, every cached glyph and shaping result of
    /// the font is rebuilt, and the space width and line height are measured
    /// again. Glyph texture coordinates from before the call are stale.
    pub fn set_font_size(&mut self, id: FontId, size: u32) -> Result<()> {
        let font = self.fonts.get_mut(&id).ok_or(Error::InvalidFont(id))?;
        if font.size() == size {
            return Ok(());
        }
        log::debug!("font {} changes size {} -> {size}", id.to_raw(), font.size());
        font.face.set_pixel_size(size);
        font.atlas.reset(&self.config.font);
        font.line_height = font.face.metrics().line_height;
        self.shaping.reload_font(font);
        self.glyphs.reload_font(font);
        font.space_width = measure_space(font, &mut self.glyphs, &mut self.shaping)?;
        Ok(())
    }

    /// Unloads a font together with its cache entries and atlas.
    pub fn remove_font(&mut self, id: FontId) -> Result<()> {
        self.fonts.remove(&id).ok_or(Error::InvalidFont(id))?;
        self.glyphs.remove_font(id);
        self.shaping.remove_font(id);
        Ok(())
    }

    /// A loaded font.
    pub fn font(&self, id: FontId) -> Option<&Font> {
        self.fonts.get(&id)
    }

    /// A loaded font, for draining its atlas uploads.
    pub fn font_mut(&mut self, id: FontId) -> Option<&mut Font> {
        self.fonts.get_mut(&id)
    }

    /// Ids of all loaded fonts, in load order.
    pub fn font_ids(&self) -> Vec<FontId> {
        let mut ids: Vec<FontId> = self.fonts.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Returns a glyph, rendering it into the font's atlas on first use.
    pub fn get_glyph(&mut self, font: FontId, glyph: u32) -> Result<Glyph> {
        let font = self.fonts.get_mut(&font).ok_or(Error::InvalidFont(font))?;
        self.glyphs.get_glyph(font, glyph)
    }

    /// Returns `text` shaped with a font, shaping it on first use.
    pub fn get_shaped(&mut self, font: FontId, text: &str) -> Result<&ShapedText> {
        let font = self.fonts.get(&font).ok_or(Error::InvalidFont(font))?;
        Ok(self.shaping.get_shaped(font, text))
    }

    /// Lays out a single block of text with its top-left corner at `pos`.
    ///
    /// Only explicit line breaks start new lines.
    pub fn render_text(
        &mut self,
        font: FontId,
        text: &str,
        pos: [f32; 2],
        color: Color,
        line_height: f32,
        sink: &mut dyn GlyphSink,
    ) -> Result<TextProps> {
        self.text_context(font)?
            .render_text(text, pos, color, line_height, Some(sink))
    }

    /// Lays out a wrapped and aligned paragraph with its top-left corner at `pos`.
    pub fn render_paragraph(
        &mut self,
        font: FontId,
        text: &str,
        pos: [f32; 2],
        color: Color,
        line_height: f32,
        props: ParagraphProps,
        sink: &mut dyn GlyphSink,
    ) -> Result<TextProps> {
        self.text_context(font)?
            .render_paragraph(text, pos, color, line_height, props, Some(sink))
    }

    /// Measures `text` as [`Context::render_text`] would lay it out.
    pub fn text_props(&mut self, font: FontId, text: &str, line_height: f32) -> Result<TextProps> {
        self.text_context(font)?
            .render_text(text, [0.0, 0.0], Color::BLACK, line_height, None)
    }

    /// Width of the widest line of `text`.
    pub fn text_width(&mut self, font: FontId, text: &str) -> Result<f32> {
        Ok(self.text_props(font, text, 0.0)?.width)
    }

    /// Height of `text`.
    pub fn text_height(&mut self, font: FontId, text: &str, line_height: f32) -> Result<f32> {
        Ok(self.text_props(font, text, line_height)?.height)
    }

    /// Measures `text` as [`Context::render_paragraph`] would lay it out.
    pub fn paragraph_props(
        &mut self,
        font: FontId,
        text: &str,
        line_height: f32,
        props: ParagraphProps,
    ) -> Result<TextProps> {
        self.text_context(font)?.render_paragraph(
            text,
            [0.0, 0.0],
            Color::BLACK,
            line_height,
            props,
            None,
        )
    }

    /// The glyph cache.
    pub fn glyph_cache(&self) -> &GlyphCache {
        &self.glyphs
    }

    /// The shaping cache.
    pub fn shaping_cache(&self) -> &ShapingCache {
        &self.shaping
    }

    /// Counters of the glyph cache.
    pub fn glyph_stats(&self) -> CacheStats {
        self.glyphs.stats()
    }

    /// Counters of the shaping cache.
    pub fn shaping_stats(&self) -> CacheStats {
        self.shaping.stats()
    }

    /// Vector paths and their atlas.
    pub fn vector(&self) -> &VectorGraphics {
        &self.vector
    }

    /// Mutable vector state.
    pub fn vector_mut(&mut self) -> &mut VectorGraphics {
        &mut self.vector
    }

    fn text_context(&mut self, font: FontId) -> Result<TextContext<'_>> {
        let font = self.fonts.get_mut(&font).ok_or(Error::InvalidFont(font))?;
        Ok(TextContext {
            font,
            glyphs: &mut self.glyphs,
            shaping: &mut self.shaping,
        })
    }
}

fn measure_space(font: &mut Font, glyphs: &mut GlyphCache, shaping: &mut ShapingCache) -> Result<f32> {
    let mut cx = TextContext {
        font,
        glyphs,
        shaping,
    };
    Ok(cx
        .render_text(" ", [0.0, 0.0], Color::BLACK, 0.0, None)?
        .width)
}
