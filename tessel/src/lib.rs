// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Glyph, shaping and vector caches backed by texture atlases.
//!
//! A [`Context`] owns every loaded [`Font`], a [`GlyphCache`] and a
//! [`ShapingCache`] shared by those fonts, and the [`VectorGraphics`] state
//! for tiled path rasterization. Text layout produces [`GlyphQuad`]s that point
//! into per-font atlases; vector paths are rasterized tile by tile into a
//! shared atlas by a [`ComputeBackend`].
//!
//! ```
//! use tessel::peniko::Color;
//! use tessel::peniko::Fill;
//! use tessel::vector::{CpuBackend, PathBuilder, PathStyle};
//! use tessel::{Config, Context};
//!
//! let mut cx = Context::new(Config::default());
//! let vg = cx.vector_mut();
//! let paint = vg.add_paint(Color::from_rgb8(200, 40, 40));
//! let mut path = PathBuilder::new();
//! path.rect(0.0, 0.0, 32.0, 32.0);
//! let id = vg.add_path(path, &PathStyle::fill(paint, Fill::NonZero)).unwrap();
//! let uv = vg.cache_vector_item(id).unwrap().uv;
//!
//! let mut backend = CpuBackend::new(1);
//! let jobs = vg.render(&mut backend).unwrap();
//! assert!(jobs > 0);
//! assert!(uv.u1 > uv.u0);
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

pub use peniko;

pub mod atlas;
pub mod config;
pub mod font;
pub mod glyph;
pub mod shape;
pub mod text;
pub mod vector;

mod context;
mod error;

#[cfg(test)]
mod tests;

pub use config::{Config, FontConfig, TextureFilter, VectorConfig};
pub use context::{CacheStats, Context};
pub use error::{Error, Result};
pub use font::{Font, FontFace, FontId, GlyphSource, SkrifaFace, TextShaper};
pub use glyph::{Glyph, GlyphCache, GlyphKind};
pub use shape::{ShapedText, ShapingCache};
pub use text::{Alignment, GlyphQuad, GlyphSink, ParagraphProps, TextProps};
pub use vector::{ComputeBackend, CpuBackend, VectorGraphics};
