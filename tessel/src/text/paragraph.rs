// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;

use peniko::Color;

use super::{
    Alignment, GlyphSink, ParagraphProps, TextContext, TextProps, highest_bearing, quad,
    visible_glyph,
};
use crate::Result;
use crate::shape::Word;

/// Assignment of words to lines.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct LineBreaks {
    /// Line index of each word.
    pub(crate) line_of: Vec<usize>,
    /// Width of each line, including the spaces between its words.
    pub(crate) widths: Vec<f32>,
}

/// Greedily breaks words into lines.
///
/// A word moves to the next line when the words before it on the current
/// line, each followed by a space, already exceed `wrap`, or when the
/// previous word ended with a line break.
pub(crate) fn break_lines(
    words: &[Word],
    word_widths: &[f32],
    space_width: f32,
    wrap: Option<f32>,
) -> LineBreaks {
    let mut breaks = LineBreaks::default();
    let mut run = 0.0_f32;
    for (i, &width) in word_widths.iter().enumerate() {
        if i == 0 {
            breaks.widths.push(0.0);
        } else {
            let forced = words[i - 1].has_newline;
            if forced || wrap.is_some_and(|wrap| run > wrap) {
                breaks.widths.push(0.0);
                run = 0.0;
            } else if let Some(line) = breaks.widths.last_mut() {
                *line += space_width;
            }
        }
        if let Some(line) = breaks.widths.last_mut() {
            *line += width;
        }
        run += width + space_width;
        breaks.line_of.push(breaks.widths.len() - 1);
    }
    breaks
}

/// Horizontal offset of a line of `line_width` within `column`.
pub(crate) fn align_offset(align: Alignment, column: f32, line_width: f32) -> f32 {
    match align {
        Alignment::Left => 0.0,
        Alignment::Center => (column - line_width) / 2.0,
        Alignment::Right => column - line_width,
    }
}

impl TextContext<'_> {
    /// Lays out `text` as a wrapped and aligned paragraph.
    ///
    /// Leading and trailing whitespace is dropped. Words are measured on their
    /// own, assigned to lines with [`break_lines`], and the glyphs of the whole
    /// text are then placed line by line. Each whitespace run between two words
    /// of a line advances by one space width, matching the measured line
    /// widths. Whitespace at a line break takes no room.
    pub(crate) fn render_paragraph(
        &mut self,
        text: &str,
        pos: [f32; 2],
        color: Color,
        line_height: f32,
        props: ParagraphProps,
        mut sink: Option<&mut dyn GlyphSink>,
    ) -> Result<TextProps> {
        let text = text.trim();
        let words = self.shaping.get_shaped(self.font, text).words().to_vec();
        if words.is_empty() {
            return Ok(TextProps {
                width: 0.0,
                height: 0.0,
                anchor: pos,
            });
        }

        let mut word_widths = Vec::with_capacity(words.len());
        for word in &words {
            let measured = self.render_text(
                &text[word.range.clone()],
                [0.0, 0.0],
                color,
                line_height,
                None,
            )?;
            word_widths.push(measured.width);
        }
        let lines = break_lines(&words, &word_widths, self.font.space_width, props.wrap);
        let widest = lines.widths.iter().copied().fold(0.0_f32, f32::max);
        let column = props.wrap.unwrap_or(widest);
        let starts: Vec<f32> = lines
            .widths
            .iter()
            .map(|&w| pos[0] + align_offset(props.align, column, w))
            .collect();
        let last_line = lines.widths.len() - 1;

        let Self {
            font,
            glyphs,
            shaping,
        } = self;
        let advance = line_height.max(font.line_height);
        let shaped = shaping.get_shaped(font, text);
        let baseline = highest_bearing(glyphs, font, shaped)?;

        let mut word = 0;
        let mut gap_after = None;
        let mut line = 0;
        let (mut x, mut y) = (starts[0], pos[1]);
        let mut ascent = 0.0_f32;
        let mut descent = 0.0_f32;
        for g in shaped.glyphs() {
            let cluster = g.cluster as usize;
            while word + 1 < words.len() && cluster >= words[word + 1].range.start {
                word += 1;
            }
            if lines.line_of[word] != line {
                line = lines.line_of[word];
                x = starts[line];
                y = pos[1] + line as f32 * advance;
            }

            let c = text.get(cluster..).and_then(|s| s.chars().next());
            if c.is_some_and(char::is_whitespace) {
                let breaks_after = word + 1 < words.len() && lines.line_of[word + 1] != line;
                if !breaks_after && gap_after != Some(word) {
                    x += font.space_width;
                    gap_after = Some(word);
                }
                continue;
            }
            if g.glyph_id == 0 {
                continue;
            }
            let Some(glyph) = visible_glyph(glyphs, font, g.glyph_id)? else {
                x += g.x_advance;
                continue;
            };
            if line == last_line {
                ascent = ascent.max(glyph.ascender);
                descent = descent.min(glyph.descender);
            }
            if let Some(sink) = sink.as_mut().filter(|_| glyph.width > 0.0) {
                let pen = [x + g.x_offset, y + baseline - g.y_offset];
                sink.push(quad(&glyph, pen, color));
            }
            x += g.x_advance;
        }

        let left = starts.iter().copied().fold(f32::INFINITY, f32::min);
        Ok(TextProps {
            width: widest,
            height: last_line as f32 * advance + ascent + descent.abs(),
            anchor: [left, pos[1]],
        })
    }
}
