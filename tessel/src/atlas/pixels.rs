// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec;
use alloc::vec::Vec;

/// A rectangle of an atlas that changed since the batch renderer last copied it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PendingUpload {
    /// Left edge in pixels.
    pub x: u32,
    /// Top edge in pixels.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// CPU-side RGBA8 storage for an atlas texture.
///
/// Writes are recorded as [`PendingUpload`] rectangles which the application
/// drains with [`AtlasImage::take_pending_uploads`] and copies into its GPU
/// texture. When the image is resized the generation counter changes and the
/// whole texture must be recreated.
#[derive(Clone)]
pub struct AtlasImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
    pending: Vec<PendingUpload>,
    generation: u32,
}

impl AtlasImage {
    /// Creates a transparent image.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
            pending: Vec::new(),
            generation: 0,
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Premultiplied RGBA8 pixels, row-major without padding.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Changes whenever the image is resized or cleared.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Returns the RGBA value at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.index(x, y);
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    /// Takes all rectangles written since the last call.
    pub fn take_pending_uploads(&mut self) -> Vec<PendingUpload> {
        core::mem::take(&mut self.pending)
    }

    /// Copies a tightly packed `width` by `height` RGBA block to `(x, y)`.
    ///
    /// Parts of the block outside the image are dropped.
    pub fn write(&mut self, x: u32, y: u32, width: u32, height: u32, rgba: &[u8]) {
        let w = width.min(self.width.saturating_sub(x));
        let h = height.min(self.height.saturating_sub(y));
        if w == 0 || h == 0 {
            return;
        }
        let row_len = w as usize * 4;
        for row in 0..h {
            let src = (row * width) as usize * 4;
            let dst = self.index(x, y + row);
            self.data[dst..dst + row_len].copy_from_slice(&rgba[src..src + row_len]);
        }
        self.mark(x, y, w, h);
    }

    /// Fills a rectangle with a single RGBA value.
    pub fn fill(&mut self, x: u32, y: u32, width: u32, height: u32, rgba: [u8; 4]) {
        let w = width.min(self.width.saturating_sub(x));
        let h = height.min(self.height.saturating_sub(y));
        if w == 0 || h == 0 {
            return;
        }
        for row in 0..h {
            let dst = self.index(x, y + row);
            for px in self.data[dst..dst + w as usize * 4].chunks_exact_mut(4) {
                px.copy_from_slice(&rgba);
            }
        }
        self.mark(x, y, w, h);
    }

    /// Resizes the image to `width` by `height`, keeping the overlapping top-left contents.
    pub fn resize(&mut self, width: u32, height: u32) {
        let mut data = vec![0; width as usize * height as usize * 4];
        let copy_w = width.min(self.width) as usize * 4;
        for row in 0..height.min(self.height) {
            let src = self.index(0, row);
            let dst = (row * width) as usize * 4;
            data[dst..dst + copy_w].copy_from_slice(&self.data[src..src + copy_w]);
        }
        self.data = data;
        self.width = width;
        self.height = height;
        self.bump_generation();
    }

    /// Makes every pixel transparent.
    pub fn clear(&mut self) {
        self.data.fill(0);
        self.bump_generation();
    }

    fn bump_generation(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.pending.clear();
        self.pending.push(PendingUpload {
            x: 0,
            y: 0,
            width: self.width,
            height: self.height,
        });
    }

    fn mark(&mut self, x: u32, y: u32, width: u32, height: u32) {
        self.pending.push(PendingUpload {
            x,
            y,
            width,
            height,
        });
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }
}

impl core::fmt::Debug for AtlasImage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AtlasImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("pending", &self.pending.len())
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::{AtlasImage, PendingUpload};

    #[test]
    fn write_clips_and_records() {
        let mut image = AtlasImage::new(4, 4);
        let block = [255_u8; 3 * 3 * 4];
        image.write(2, 2, 3, 3, &block);
        assert_eq!(image.pixel(3, 3), [255; 4]);
        assert_eq!(image.pixel(1, 1), [0; 4]);
        assert_eq!(
            image.take_pending_uploads(),
            [PendingUpload {
                x: 2,
                y: 2,
                width: 2,
                height: 2
            }]
        );
        assert!(image.take_pending_uploads().is_empty());
    }

    #[test]
    fn resize_keeps_contents() {
        let mut image = AtlasImage::new(2, 2);
        image.fill(1, 1, 1, 1, [1, 2, 3, 4]);
        let generation = image.generation();
        image.resize(4, 4);
        assert_ne!(image.generation(), generation);
        assert_eq!(image.pixel(1, 1), [1, 2, 3, 4]);
        assert_eq!(image.pixel(3, 3), [0; 4]);
        assert_eq!(image.take_pending_uploads().len(), 1);
    }
}
