// Copyright 2024 pgraph contributors
// Licensed under the MIT license (http://opensource.org/licenses/MIT)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Small shared type aliases, in the same spirit as `bio::utils`.

/// A borrowed view over a packed sequence's bytes.
pub type TextSlice<'a> = &'a [u8];
