// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cached shaping results.

mod cache;
mod words;

pub use cache::{ShapedText, ShapingCache, djb2};
pub use words::{Word, is_newline, split_words};
