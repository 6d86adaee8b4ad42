// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Execution of tile jobs.

use crate::atlas::AtlasImage;
use crate::{Error, Result};

use super::dispatch::{JobList, TileJob};
use super::path::{Paint, PathHeader, Segment};
use super::raster::{TileBuffers, rasterize_job};
use super::tiles::{PathTileMeta, TileRange};

/// Something that can run the tile kernel, such as a GPU compute queue.
///
/// [`upload`](ComputeBackend::upload) must complete before jobs referencing
/// the uploaded buffers are dispatched.
pub trait ComputeBackend {
    /// Copies the kernel inputs into backend-owned storage.
    fn upload(&mut self, buffers: &TileBuffers<'_>) -> Result<()>;

    /// Runs every job of `jobs` against the last upload, writing into `target`.
    fn dispatch(&mut self, jobs: &JobList, target: &mut AtlasImage) -> Result<()>;
}

/// Kernel inputs owned by the CPU backend.
#[derive(Clone, Debug, Default)]
struct Uploaded {
    segments: Vec<Segment>,
    paths: Vec<PathHeader>,
    paints: Vec<Paint>,
    metas: Vec<PathTileMeta>,
    ranges: Vec<TileRange>,
    indices: Vec<u32>,
}

impl Uploaded {
    fn buffers(&self) -> TileBuffers<'_> {
        TileBuffers {
            segments: &self.segments,
            paths: &self.paths,
            paints: &self.paints,
            metas: &self.metas,
            ranges: &self.ranges,
            indices: &self.indices,
        }
    }
}

/// Runs the kernel on the CPU, optionally across scoped worker threads.
#[derive(Clone, Debug, Default)]
pub struct CpuBackend {
    threads: usize,
    uploaded: Option<Uploaded>,
    uploaded_bytes: usize,
}

impl CpuBackend {
    /// Creates a backend using up to `threads` workers; `0` and `1` run inline.
    pub fn new(threads: usize) -> Self {
        Self {
            threads,
            uploaded: None,
            uploaded_bytes: 0,
        }
    }

    /// Size of the last upload in bytes.
    pub fn uploaded_bytes(&self) -> usize {
        self.uploaded_bytes
    }

    fn run(jobs: &[TileJob], buffers: &TileBuffers<'_>) -> Vec<Vec<u8>> {
        jobs.iter()
            .map(|job| {
                let mut block = vec![0; job.rect_w as usize * job.rect_h as usize * 4];
                rasterize_job(job, buffers, &mut block);
                block
            })
            .collect()
    }
}

impl ComputeBackend for CpuBackend {
    fn upload(&mut self, buffers: &TileBuffers<'_>) -> Result<()> {
        let bytes = bytemuck::cast_slice::<_, u8>(buffers.segments).len()
            + bytemuck::cast_slice::<_, u8>(buffers.paths).len()
            + bytemuck::cast_slice::<_, u8>(buffers.paints).len()
            + bytemuck::cast_slice::<_, u8>(buffers.metas).len()
            + bytemuck::cast_slice::<_, u8>(buffers.ranges).len()
            + bytemuck::cast_slice::<_, u8>(buffers.indices).len();
        self.uploaded = Some(Uploaded {
            segments: buffers.segments.to_vec(),
            paths: buffers.paths.to_vec(),
            paints: buffers.paints.to_vec(),
            metas: buffers.metas.to_vec(),
            ranges: buffers.ranges.to_vec(),
            indices: buffers.indices.to_vec(),
        });
        self.uploaded_bytes = bytes;
        log::debug!("uploaded {bytes} bytes of tile data");
        Ok(())
    }

    fn dispatch(&mut self, jobs: &JobList, target: &mut AtlasImage) -> Result<()> {
        let uploaded = self.uploaded.as_ref().ok_or(Error::StaleBuffers)?;
        let buffers = uploaded.buffers();

        for clear in &jobs.clears {
            target.fill(clear.x, clear.y, clear.width, clear.height, [0; 4]);
        }

        let blocks = if self.threads > 1 && jobs.jobs.len() > 1 {
            let chunk = jobs.jobs.len().div_ceil(self.threads);
            std::thread::scope(|scope| {
                let handles: Vec<_> = jobs
                    .jobs
                    .chunks(chunk)
                    .map(|part| scope.spawn(move || Self::run(part, &buffers)))
                    .collect();
                let mut blocks = Vec::with_capacity(jobs.jobs.len());
                for handle in handles {
                    match handle.join() {
                        Ok(part) => blocks.extend(part),
                        Err(panic) => std::panic::resume_unwind(panic),
                    }
                }
                blocks
            })
        } else {
            Self::run(&jobs.jobs, &buffers)
        };

        for (job, block) in jobs.jobs.iter().zip(&blocks) {
            target.write(job.base_x, job.base_y, job.rect_w, job.rect_h, block);
        }
        log::trace!("rasterized {} tiles", jobs.jobs.len());
        Ok(())
    }
}
