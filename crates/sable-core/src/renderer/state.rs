// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The render-state word and view clear flags.

use crate::sable_bitflags;
use serde::{Deserialize, Serialize};

sable_bitflags! {
    /// A bitmask of fixed-function state applied to a draw.
    ///
    /// The pipeline keeps one persistent word that scripted operations toggle; each draw
    /// submits the union of that word and the material's own flags.
    pub struct RenderState: u64 {
        /// No state bits.
        const NONE = 0;
        /// Write the RGB channels.
        const WRITE_RGB = 1 << 0;
        /// Write the alpha channel.
        const WRITE_ALPHA = 1 << 1;
        /// Write depth.
        const WRITE_Z = 1 << 2;
        /// Depth test with a "less" comparison.
        const DEPTH_TEST_LESS = 1 << 3;
        /// Cull clockwise faces.
        const CULL_CW = 1 << 4;
        /// Cull counter-clockwise faces.
        const CULL_CCW = 1 << 5;
        /// Additive blending.
        const BLEND_ADD = 1 << 6;
        /// Source-alpha blending.
        const BLEND_ALPHA = 1 << 7;
        /// Multiplicative blending.
        const BLEND_MULTIPLY = 1 << 8;
        /// Every blend bit.
        const BLEND_MASK =
            Self::BLEND_ADD.bits() | Self::BLEND_ALPHA.bits() | Self::BLEND_MULTIPLY.bits();
        /// Line list topology.
        const PT_LINES = 1 << 9;
        /// Point list topology.
        const PT_POINTS = 1 << 10;
        /// Multisampling.
        const MSAA = 1 << 11;
        /// The state a frame starts with: color, alpha and depth writes with MSAA.
        const FRAME_DEFAULT = Self::WRITE_RGB.bits()
            | Self::WRITE_ALPHA.bits()
            | Self::WRITE_Z.bits()
            | Self::MSAA.bits();
    }
}

/// Blend equations a script can enable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlendMode {
    /// `src + dst`.
    Add,
    /// `src * a + dst * (1 - a)`.
    Alpha,
    /// `src * dst`.
    Multiply,
}

impl BlendMode {
    /// The state bit selecting this equation.
    pub const fn state(self) -> RenderState {
        match self {
            BlendMode::Add => RenderState::BLEND_ADD,
            BlendMode::Alpha => RenderState::BLEND_ALPHA,
            BlendMode::Multiply => RenderState::BLEND_MULTIPLY,
        }
    }
}

sable_bitflags! {
    /// Which buffers a view clear touches.
    pub struct ClearFlags: u16 {
        /// Clear nothing.
        const NONE = 0;
        /// Clear color.
        const COLOR = 1 << 0;
        /// Clear depth.
        const DEPTH = 1 << 1;
        /// Clear stencil.
        const STENCIL = 1 << 2;
        /// Color, depth and stencil.
        const ALL = Self::COLOR.bits() | Self::DEPTH.bits() | Self::STENCIL.bits();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disable_blending_clears_every_blend_bit() {
        let mut state = RenderState::FRAME_DEFAULT | BlendMode::Add.state();
        assert!(state.intersects(RenderState::BLEND_MASK));
        state.set(RenderState::BLEND_MASK, false);
        assert!(!state.intersects(RenderState::BLEND_MASK));
        assert!(state.contains(RenderState::WRITE_RGB | RenderState::WRITE_Z));
    }

    #[test]
    fn test_clear_flags() {
        assert!(ClearFlags::ALL.contains(ClearFlags::DEPTH));
        assert!(!ClearFlags::DEPTH.contains(ClearFlags::COLOR));
    }
}
