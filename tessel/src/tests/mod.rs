// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

mod test_glyphs;
mod test_shaping;
mod utils;
