// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use peniko::Color;

use super::{GlyphSink, TextContext, TextProps, highest_bearing, quad, visible_glyph};
use crate::Result;
use crate::shape::is_newline;

impl TextContext<'_> {
    /// Lays out `text` on lines separated only by explicit line breaks.
    ///
    /// Line breaks move down by `line_height` or the font's own line height,
    /// whichever is larger. Without a sink the text is only measured.
    pub(crate) fn render_text(
        &mut self,
        text: &str,
        pos: [f32; 2],
        color: Color,
        line_height: f32,
        mut sink: Option<&mut dyn GlyphSink>,
    ) -> Result<TextProps> {
        let Self {
            font,
            glyphs,
            shaping,
        } = self;
        let shaped = shaping.get_shaped(font, text);
        let baseline = highest_bearing(glyphs, font, shaped)?;
        let advance = line_height.max(font.line_height);
        let tab = font.tab_width as f32 * font.space_width;

        let (mut x, mut y) = (pos[0], pos[1]);
        let mut width = 0.0_f32;
        let mut tallest = 0.0_f32;
        for g in shaped.glyphs() {
            let c = text.get(g.cluster as usize..).and_then(|s| s.chars().next());
            if c.is_some_and(is_newline) {
                width = width.max(x - pos[0]);
                x = pos[0];
                y += advance;
                continue;
            }
            if c == Some('\t') {
                x += tab;
                continue;
            }
            if g.glyph_id == 0 {
                continue;
            }
            let Some(glyph) = visible_glyph(glyphs, font, g.glyph_id)? else {
                x += g.x_advance;
                continue;
            };
            if let Some(sink) = sink.as_mut().filter(|_| glyph.width > 0.0) {
                let pen = [x + g.x_offset, y + baseline - g.y_offset];
                sink.push(quad(&glyph, pen, color));
            }
            tallest = tallest.max(glyph.height);
            x += g.x_advance;
            y -= g.y_advance;
        }
        width = width.max(x - pos[0]);

        Ok(TextProps {
            width,
            height: y - pos[1] + tallest,
            anchor: pos,
        })
    }
}
