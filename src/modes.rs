//! Render-mode flags and the backend variant they select.

use bitflags::bitflags;

use crate::error::RegionError;

/// Texture unit the two-pass variant renders its intermediate texture
/// through.
pub const TWO_PASS_DEFAULT_TEXTURE_UNIT: u32 = 0;

bitflags! {
    /// How a region is rendered. Fixed when the region is created.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RenderModes: u32 {
        /// View-based antialiasing: a two-pass render through an offscreen
        /// framebuffer. Without it, regions render in one pass.
        const VBAA_RENDERING = 1 << 0;
        /// Non-uniform curve weights in `[0.0, 1.9]` instead of a uniform
        /// weight of `1.0`.
        const VARIABLE_CURVE_WEIGHT = 1 << 1;
    }
}

/// The backend family a set of render modes calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionVariant {
    /// One pass straight into the bound framebuffer.
    SinglePass,
    /// Two passes, compositing through `texture_unit`.
    TwoPass {
        /// Texture unit used for the second pass.
        texture_unit: u32,
    },
}

impl RenderModes {
    /// Parse a raw bit-field.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::UnknownRenderModes`] if any bit outside the
    /// defined flags is set.
    pub fn from_raw(bits: u32) -> Result<Self, RegionError> {
        Self::from_bits(bits).ok_or(RegionError::UnknownRenderModes(bits))
    }

    /// Whether two-pass antialiasing is requested.
    #[must_use]
    pub fn is_vbaa(self) -> bool {
        self.contains(Self::VBAA_RENDERING)
    }

    /// Whether non-uniform curve weights are requested.
    #[must_use]
    pub fn is_non_uniform_weight(self) -> bool {
        self.contains(Self::VARIABLE_CURVE_WEIGHT)
    }

    /// The backend variant these modes select.
    #[must_use]
    pub fn variant(self) -> RegionVariant {
        if self.is_vbaa() {
            RegionVariant::TwoPass {
                texture_unit: TWO_PASS_DEFAULT_TEXTURE_UNIT,
            }
        } else {
            RegionVariant::SinglePass
        }
    }
}
