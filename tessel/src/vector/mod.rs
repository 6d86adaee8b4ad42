// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tiled rasterization of vector paths into a cached atlas.
//!
//! Paths are appended once to [`VectorGraphics`], which builds a per-path tile
//! grid and a CSR index from tiles to segments. Requesting an atlas item marks it
//! dirty; each frame, [`VectorGraphics::collect_dirty_jobs`] turns the dirty items
//! into [`TileJob`]s which a [`ComputeBackend`] executes after the buffers have
//! been uploaded.

pub mod atlas;
pub mod backend;
pub mod bounds;
pub mod classify;
pub mod dispatch;
pub mod path;
pub mod raster;
pub mod stroke;
pub mod tiles;

use alloc::vec::Vec;

use peniko::Color;

pub use atlas::{CachedVectorGraphicItem, VectorAtlas};
pub use backend::{ComputeBackend, CpuBackend};
pub use dispatch::{ClearRect, JobList, TileJob};
pub use path::{Paint, PaintId, PathBuilder, PathHeader, PathId, PathStyle, Segment, StrokeStyle};
pub use raster::TileBuffers;
pub use tiles::{PathTileMeta, TileIndex, TileRange};

use crate::atlas::AtlasImage;
use crate::config::VectorConfig;
use crate::{Error, Result};

/// Owner of all vector state: segments, paths, paints, tile index and atlas.
#[derive(Debug)]
pub struct VectorGraphics {
    segments: Vec<Segment>,
    paths: Vec<PathHeader>,
    paints: Vec<Paint>,
    metas: Vec<PathTileMeta>,
    index: TileIndex,
    atlas: VectorAtlas,
    config: VectorConfig,
    generation: u64,
    needs_upload: bool,
}

impl VectorGraphics {
    /// Creates empty state with an atlas sized by `config`.
    pub fn new(config: VectorConfig) -> Self {
        Self {
            segments: Vec::new(),
            paths: Vec::new(),
            paints: Vec::new(),
            metas: Vec::new(),
            index: TileIndex::new(),
            atlas: VectorAtlas::new(config.atlas_width, config.atlas_height, config.gutter),
            config,
            generation: 0,
            needs_upload: false,
        }
    }

    /// The configuration this state was created with.
    pub fn config(&self) -> &VectorConfig {
        &self.config
    }

    /// Registers a solid paint.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "paint ids are stored as u32 on the GPU"
    )]
    pub fn add_paint(&mut self, color: Color) -> PaintId {
        self.paints.push(Paint::solid(color));
        self.touch();
        (self.paints.len() - 1) as PaintId
    }

    /// Appends a path and builds its tile index.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "segment and path counts are stored as u32 on the GPU"
    )]
    pub fn add_path(&mut self, builder: PathBuilder, style: &PathStyle) -> Result<PathId> {
        let header = self.append_segments(builder, style)?;
        let meta = tiles::build_tiles(
            &mut self.index,
            &header,
            &self.segments,
            self.config.tile_size,
        )?;
        self.paths.push(header);
        self.metas.push(meta);
        self.touch();
        Ok((self.paths.len() - 1) as PathId)
    }

    /// Replaces the geometry and style of a path and rebuilds its tiles.
    ///
    /// The new segments and tile ranges are appended; the old ones stay in the
    /// buffers until [`VectorGraphics::clear`]. A cached item of the path is
    /// placed again for the new bounds and marked dirty. If the new content no
    /// longer fits the atlas, the item loses its placement and the error is
    /// returned.
    pub fn replace_path(
        &mut self,
        id: PathId,
        builder: PathBuilder,
        style: &PathStyle,
    ) -> Result<()> {
        if id as usize >= self.paths.len() {
            return Err(Error::InvalidPath(id));
        }
        let header = self.append_segments(builder, style)?;
        let meta = tiles::build_tiles(
            &mut self.index,
            &header,
            &self.segments,
            self.config.tile_size,
        )?;
        self.paths[id as usize] = header;
        self.metas[id as usize] = meta;
        self.touch();
        if self.atlas.item(id).is_some() {
            if let Err(err) = self.cache_vector_item(id) {
                self.atlas.evict(id);
                return Err(err);
            }
        }
        Ok(())
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "segment counts are stored as u32 on the GPU"
    )]
    fn append_segments(&mut self, builder: PathBuilder, style: &PathStyle) -> Result<PathHeader> {
        let new = builder.finish();
        self.segments.try_reserve(new.len())?;
        let start = self.segments.len() as u32;
        self.segments.extend_from_slice(&new);
        Ok(style.header(start, new.len() as u32))
    }

    /// The header of a path.
    pub fn path(&self, id: PathId) -> Option<&PathHeader> {
        self.paths.get(id as usize)
    }

    /// The tile grid of a path.
    pub fn meta(&self, id: PathId) -> Option<&PathTileMeta> {
        self.metas.get(id as usize)
    }

    /// Number of paths.
    pub fn path_count(&self) -> usize {
        self.paths.len()
    }

    /// The shared CSR buffers.
    pub fn tile_index(&self) -> &TileIndex {
        &self.index
    }

    /// Places a path in the atlas and marks it for rasterization.
    ///
    /// The content covers the padded bounding box of the path, so its top-left
    /// pixel lines up with tile `(0, 0)`. Paths without geometry get a single
    /// transparent pixel.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "content sizes are bounded by the atlas size"
    )]
    pub fn cache_vector_item(&mut self, id: PathId) -> Result<&CachedVectorGraphicItem> {
        let header = self.paths.get(id as usize).ok_or(Error::InvalidPath(id))?;
        let meta = &self.metas[id as usize];
        let (width, height) = match path::padded_bounds(header, &self.segments) {
            Some([x0, y0, x1, y1]) => (
                ((x1 - x0).ceil() as u32).max(1),
                ((y1 - y0).ceil() as u32).max(1),
            ),
            None => (1, 1),
        };
        self.atlas
            .cache_item(id, width, height, meta.origin, header.padding())
    }

    /// The cached item of a path.
    pub fn item(&self, id: PathId) -> Option<&CachedVectorGraphicItem> {
        self.atlas.item(id)
    }

    /// Requests rasterization of a cached item again.
    pub fn mark_dirty(&mut self, id: PathId) -> bool {
        self.atlas.mark_dirty(id)
    }

    /// The vector atlas.
    pub fn atlas(&self) -> &VectorAtlas {
        &self.atlas
    }

    /// Pixels of the vector atlas.
    pub fn image(&self) -> &AtlasImage {
        self.atlas.image()
    }

    /// Mutable pixels of the vector atlas, for draining pending uploads.
    pub fn image_mut(&mut self) -> &mut AtlasImage {
        self.atlas.image_mut()
    }

    /// Views the kernel inputs.
    pub fn buffers(&self) -> TileBuffers<'_> {
        TileBuffers {
            segments: &self.segments,
            paths: &self.paths,
            paints: &self.paints,
            metas: &self.metas,
            ranges: &self.index.ranges,
            indices: &self.index.indices,
        }
    }

    /// Whether buffers changed since the last successful upload.
    pub fn needs_upload(&self) -> bool {
        self.needs_upload
    }

    /// Version of the kernel inputs, bumped by every change to paths or paints.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn touch(&mut self) {
        self.generation += 1;
        self.needs_upload = true;
    }

    /// Emits jobs for every dirty item and clears their dirty flags.
    pub fn collect_dirty_jobs(&mut self) -> JobList {
        let mut list =
            dispatch::collect_dirty_jobs(&mut self.atlas, &self.metas, self.index.lists());
        list.generation = self.generation;
        list
    }

    /// Uploads the kernel inputs to `backend`.
    pub fn upload(&mut self, backend: &mut dyn ComputeBackend) -> Result<()> {
        backend.upload(&self.buffers())?;
        self.needs_upload = false;
        Ok(())
    }

    /// Runs `jobs` on `backend`, writing into the vector atlas.
    ///
    /// Fails with [`Error::StaleBuffers`] when paths or paints changed since the
    /// last [`upload`](Self::upload) or since `jobs` were collected.
    pub fn dispatch(&mut self, backend: &mut dyn ComputeBackend, jobs: &JobList) -> Result<()> {
        if self.needs_upload || jobs.generation != self.generation {
            return Err(Error::StaleBuffers);
        }
        if jobs.is_empty() {
            return Ok(());
        }
        backend.dispatch(jobs, self.atlas.image_mut())
    }

    /// Uploads if needed, then rasterizes every dirty item.
    ///
    /// Returns the number of tile jobs that ran.
    pub fn render(&mut self, backend: &mut dyn ComputeBackend) -> Result<usize> {
        if self.needs_upload {
            self.upload(backend)?;
        }
        let jobs = self.collect_dirty_jobs();
        self.dispatch(backend, &jobs)?;
        Ok(jobs.jobs.len())
    }

    /// Drops every path, paint and item.
    pub fn clear(&mut self) {
        self.segments.clear();
        self.paths.clear();
        self.paints.clear();
        self.metas.clear();
        self.index.clear();
        self.atlas.clear();
        self.touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::UvRect;
    use peniko::Fill;
    use peniko::color::palette::css;

    fn config() -> VectorConfig {
        VectorConfig {
            atlas_width: 128,
            atlas_height: 128,
            gutter: 1,
            tile_size: 8,
            threads: 1,
        }
    }

    fn square(vg: &mut VectorGraphics, size: f32) -> PathId {
        let paint = vg.add_paint(css::WHITE);
        let mut builder = PathBuilder::new();
        builder.rect(0.0, 0.0, size, size);
        vg.add_path(builder, &PathStyle::fill(paint, Fill::NonZero))
            .unwrap()
    }

    #[test]
    fn dispatch_requires_upload() {
        let mut vg = VectorGraphics::new(config());
        let id = square(&mut vg, 20.0);
        vg.cache_vector_item(id).unwrap();
        let jobs = vg.collect_dirty_jobs();
        let mut backend = CpuBackend::new(1);
        assert_eq!(vg.dispatch(&mut backend, &jobs), Err(Error::StaleBuffers));
        vg.upload(&mut backend).unwrap();
        assert!(!vg.needs_upload());
        vg.dispatch(&mut backend, &jobs).unwrap();
    }

    #[test]
    fn item_content_matches_padded_bounds() {
        let mut vg = VectorGraphics::new(config());
        let id = square(&mut vg, 20.0);
        let item = *vg.cache_vector_item(id).unwrap();
        assert_eq!((item.content_w, item.content_h), (22, 22));
        assert_eq!(item.origin, [-1.0, -1.0]);
        assert_eq!(item.pad, 1.0);
        assert!(matches!(
            vg.cache_vector_item(7),
            Err(Error::InvalidPath(7))
        ));
    }

    #[test]
    fn rendered_square_is_opaque_inside() {
        let mut vg = VectorGraphics::new(config());
        let id = square(&mut vg, 20.0);
        let item = *vg.cache_vector_item(id).unwrap();
        let mut backend = CpuBackend::new(1);
        let ran = vg.render(&mut backend).unwrap();
        assert!(ran > 0);
        let image = vg.image();
        // Path point (10, 10) sits at content pixel (11, 11).
        assert_eq!(image.pixel(item.atlas_x + 11, item.atlas_y + 11), [255; 4]);
        // The padding ring is outside the square.
        assert_eq!(image.pixel(item.atlas_x, item.atlas_y)[3], 0);
        assert_eq!(vg.render(&mut backend).unwrap(), 0);
    }

    #[test]
    fn threaded_backend_matches_inline() {
        let mut images = Vec::new();
        for threads in [1, 4] {
            let mut vg = VectorGraphics::new(config());
            let paint = vg.add_paint(css::ORANGE);
            let stroke = vg.add_paint(css::BLUE);
            let mut builder = PathBuilder::new();
            builder.polygon(&[[0.0, 0.0], [40.0, 5.0], [20.0, 35.0]]);
            let style = PathStyle {
                stroke: Some(StrokeStyle::new(stroke, 3.0)),
                ..PathStyle::fill(paint, Fill::EvenOdd)
            };
            let id = vg.add_path(builder, &style).unwrap();
            vg.cache_vector_item(id).unwrap();
            vg.render(&mut CpuBackend::new(threads)).unwrap();
            images.push(vg.image().data().to_vec());
        }
        assert_eq!(images[0], images[1]);
    }

    #[test]
    fn replaced_path_is_dirty_and_reuploaded() {
        let mut vg = VectorGraphics::new(config());
        let id = square(&mut vg, 10.0);
        vg.cache_vector_item(id).unwrap();
        let mut backend = CpuBackend::new(1);
        vg.render(&mut backend).unwrap();
        assert!(!vg.item(id).unwrap().dirty);

        let mut builder = PathBuilder::new();
        builder.rect(0.0, 0.0, 5.0, 5.0);
        vg.replace_path(id, builder, &PathStyle::fill(0, Fill::NonZero))
            .unwrap();
        assert!(vg.item(id).unwrap().dirty);
        assert!(vg.needs_upload());
        assert_eq!(vg.meta(id).unwrap().total_ranges, 1);
        assert!(vg.render(&mut backend).unwrap() > 0);

        assert_eq!(
            vg.replace_path(9, PathBuilder::new(), &PathStyle::default()),
            Err(Error::InvalidPath(9))
        );
    }

    #[test]
    fn jobs_collected_before_a_replacement_are_stale() {
        let mut vg = VectorGraphics::new(config());
        let id = square(&mut vg, 100.0);
        vg.cache_vector_item(id).unwrap();
        let mut backend = CpuBackend::new(2);
        vg.upload(&mut backend).unwrap();
        let jobs = vg.collect_dirty_jobs();
        assert!(!jobs.jobs.is_empty());

        let mut builder = PathBuilder::new();
        builder.rect(0.0, 0.0, 4.0, 4.0);
        vg.replace_path(id, builder, &PathStyle::fill(0, Fill::NonZero))
            .unwrap();
        vg.upload(&mut backend).unwrap();
        assert_eq!(vg.dispatch(&mut backend, &jobs), Err(Error::StaleBuffers));

        let fresh = vg.collect_dirty_jobs();
        assert_eq!(fresh.generation, vg.generation());
        vg.dispatch(&mut backend, &fresh).unwrap();
    }

    #[test]
    fn replaced_path_is_placed_for_its_new_bounds() {
        let mut vg = VectorGraphics::new(config());
        let id = square(&mut vg, 10.0);
        vg.cache_vector_item(id).unwrap();
        let mut backend = CpuBackend::new(1);
        vg.render(&mut backend).unwrap();
        assert_eq!(vg.item(id).unwrap().content_w, 12);

        let mut builder = PathBuilder::new();
        builder.rect(0.0, 0.0, 40.0, 40.0);
        vg.replace_path(id, builder, &PathStyle::fill(0, Fill::NonZero))
            .unwrap();
        let item = *vg.item(id).unwrap();
        assert_eq!((item.content_w, item.content_h), (42, 42));
        assert!(item.dirty && item.in_atlas);
        assert_eq!(
            item.uv,
            UvRect::inset(item.atlas_x, item.atlas_y, 42, 42, 128, 128)
        );

        vg.render(&mut backend).unwrap();
        // Path point (39.5, 39.5) is inside the new square.
        assert_eq!(vg.image().pixel(item.atlas_x + 40, item.atlas_y + 40), [255; 4]);
    }

    #[test]
    fn replacement_too_large_for_the_atlas_is_evicted() {
        let mut vg = VectorGraphics::new(config());
        let id = square(&mut vg, 10.0);
        vg.cache_vector_item(id).unwrap();

        let mut builder = PathBuilder::new();
        builder.rect(0.0, 0.0, 200.0, 200.0);
        let err = vg
            .replace_path(id, builder, &PathStyle::fill(0, Fill::NonZero))
            .unwrap_err();
        assert!(matches!(err, Error::AtlasFull { .. }));
        assert!(!vg.item(id).unwrap().in_atlas);
        assert!(vg.collect_dirty_jobs().is_empty());
    }
}
