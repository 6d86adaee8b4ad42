// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Skyline rectangle packer.

use alloc::vec::Vec;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Breakpoint {
    x: u32,
    y: u32,
}

/// Allocates sub-rectangles of a fixed-size texture.
///
/// The packer tracks a skyline: an ordered list of breakpoints where each
/// breakpoint starts a horizontal span whose free space begins at `y`. A span
/// extends until the next breakpoint or the right edge of the atlas.
#[derive(Clone, Debug)]
pub struct Packer {
    width: u32,
    height: u32,
    skyline: Vec<Breakpoint>,
    used_area: u64,
}

impl Packer {
    /// Creates an empty packer for a `width` by `height` texture.
    pub fn new(width: u32, height: u32) -> Self {
        let mut packer = Self {
            width,
            height,
            skyline: Vec::new(),
            used_area: 0,
        };
        packer.reset();
        packer
    }

    /// Returns the packer dimensions.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Total area of all placed rectangles.
    pub fn used_area(&self) -> u64 {
        self.used_area
    }

    /// Forgets every placement.
    pub fn reset(&mut self) {
        self.skyline.clear();
        self.skyline.push(Breakpoint { x: 0, y: 0 });
        self.used_area = 0;
    }

    /// Places a `width` by `height` rectangle and returns its top-left corner.
    ///
    /// Picks the lowest position the rectangle fits at, preferring the leftmost
    /// one on ties. Returns `None` for empty rectangles or when nothing fits.
    pub fn push_rect(&mut self, width: u32, height: u32) -> Option<(u32, u32)> {
        if width == 0 || height == 0 || width > self.width || height > self.height {
            return None;
        }

        let mut best: Option<(usize, usize, u32, u32)> = None;
        for start in 0..self.skyline.len() {
            let x = self.skyline[start].x;
            if x + width > self.width {
                break;
            }
            let right = x + width;
            let mut y = 0;
            let mut end = start;
            while end < self.skyline.len() && self.skyline[end].x < right {
                y = y.max(self.skyline[end].y);
                end += 1;
            }
            if y + height > self.height {
                continue;
            }
            let better = match best {
                None => true,
                Some((_, _, bx, by)) => y < by || (y == by && x < bx),
            };
            if better {
                best = Some((start, end, x, y));
            }
        }

        let (start, end, x, y) = best?;
        let right = x + width;
        let next_x = self.skyline.get(end).map_or(self.width, |bp| bp.x);
        // Height of the last span the rectangle covers; exposed again to its right.
        let floor = self.skyline[end - 1].y;

        let splice = [Breakpoint { x, y: y + height }, Breakpoint { x: right, y: floor }];
        let count = if right < next_x { 2 } else { 1 };
        self.skyline.splice(start..end, splice[..count].iter().copied());
        self.merge_spans();
        self.used_area += u64::from(width) * u64::from(height);
        Some((x, y))
    }

    fn merge_spans(&mut self) {
        self.skyline.dedup_by(|next, prev| next.y == prev.y);
    }
}
