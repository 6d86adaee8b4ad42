// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::FontId;

/// Result type used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Error type for cache, atlas and rasterization operations.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The font data could not be parsed.
    FontLoad {
        /// Human readable reason reported by the font engine.
        reason: &'static str,
    },
    /// A glyph could not be loaded or rasterized.
    GlyphLoad {
        /// The font the glyph was requested from.
        font: FontId,
        /// The glyph index.
        glyph: u32,
    },
    /// An atlas has no room left for a rectangle of the given size.
    AtlasFull {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
    },
    /// The font id does not refer to a loaded font.
    InvalidFont(FontId),
    /// The path id does not refer to a known path.
    InvalidPath(u32),
    /// A scratch buffer could not be allocated.
    Allocation {
        /// Number of elements that were requested.
        requested: usize,
    },
    /// Jobs were dispatched while tile buffers had not been uploaded.
    StaleBuffers,
}

impl Error {
    pub(crate) fn atlas_full(width: u32, height: u32) -> Self {
        Self::AtlasFull { width, height }
    }
}

impl From<std::collections::TryReserveError> for Error {
    fn from(_: std::collections::TryReserveError) -> Self {
        Self::Allocation {
            requested: usize::MAX,
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::FontLoad { reason } => write!(f, "failed to load font: {reason}"),
            Self::GlyphLoad { font, glyph } => {
                write!(f, "failed to load glyph {glyph} of font {}", font.to_raw())
            }
            Self::AtlasFull { width, height } => {
                write!(f, "atlas has no room for a {width}x{height} rectangle")
            }
            Self::InvalidFont(id) => write!(f, "font {} is not loaded", id.to_raw()),
            Self::InvalidPath(id) => write!(f, "path {id} does not exist"),
            Self::Allocation { requested } => {
                write!(f, "allocation of {requested} elements failed")
            }
            Self::StaleBuffers => {
                write!(f, "tile buffers must be uploaded before dispatching jobs")
            }
        }
    }
}

impl core::error::Error for Error {}
