// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Enumeration of tile jobs for dirty atlas items.

use bytemuck::{Pod, Zeroable};

use super::atlas::VectorAtlas;
use super::tiles::{PathTileMeta, TILE_EMPTY, TileLists};

/// One unit of rasterization work: a tile of a path mapped into the atlas.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct TileJob {
    /// Atlas x of the tile's top-left pixel.
    pub base_x: u32,
    /// Atlas y of the tile's top-left pixel.
    pub base_y: u32,
    /// Pixels to write horizontally, clipped to the item content.
    pub rect_w: u32,
    /// Pixels to write vertically, clipped to the item content.
    pub rect_h: u32,
    /// Path the tile belongs to.
    pub path_id: u32,
    /// Tile column.
    pub tile_x: u32,
    /// Tile row.
    pub tile_y: u32,
}

/// An atlas rectangle to make transparent before jobs run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ClearRect {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

/// Work produced by one call to [`collect_dirty_jobs`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct JobList {
    /// Regions of the dirty items; empty tiles are never written, so they are cleared first.
    pub clears: Vec<ClearRect>,
    /// Jobs for every non-empty tile of the dirty items.
    pub jobs: Vec<TileJob>,
    /// Version of the kernel inputs the jobs were enumerated against.
    pub generation: u64,
}

impl JobList {
    /// Whether there is nothing to do.
    pub fn is_empty(&self) -> bool {
        self.clears.is_empty() && self.jobs.is_empty()
    }
}

/// Emits jobs for every dirty item whose path has a built tile index.
///
/// Items are visited in ascending path order. Their dirty flag is cleared once
/// their jobs are enumerated, before any job has run. Items whose path has no
/// built index stay dirty.
pub fn collect_dirty_jobs(
    atlas: &mut VectorAtlas,
    metas: &[PathTileMeta],
    lists: TileLists<'_>,
) -> JobList {
    let mut list = JobList::default();
    for key in atlas.dirty_keys() {
        let Some(meta) = metas.get(key as usize).filter(|m| m.is_built()) else {
            continue;
        };
        let Some(item) = atlas.item(key).copied() else {
            continue;
        };
        list.clears.push(ClearRect {
            x: item.atlas_x,
            y: item.atlas_y,
            width: item.capacity_w,
            height: item.capacity_h,
        });
        list.jobs.reserve(meta.total_ranges as usize);
        for ty in 0..meta.tiles_y {
            let top = ty * meta.tile_size;
            if top >= item.content_h {
                break;
            }
            for tx in 0..meta.tiles_x {
                let left = tx * meta.tile_size;
                if left >= item.content_w {
                    break;
                }
                if lists.tile(meta, tx, ty).flags == TILE_EMPTY {
                    continue;
                }
                list.jobs.push(TileJob {
                    base_x: item.atlas_x + left,
                    base_y: item.atlas_y + top,
                    rect_w: meta.tile_size.min(item.content_w - left),
                    rect_h: meta.tile_size.min(item.content_h - top),
                    path_id: key,
                    tile_x: tx,
                    tile_y: ty,
                });
            }
        }
        atlas.clear_dirty(key);
    }
    log::trace!(
        "collected {} tile jobs for {} items",
        list.jobs.len(),
        list.clears.len()
    );
    list
}
