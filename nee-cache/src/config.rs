use crate::gpu::{Frame, NeeCachePassParams};
use crate::{Error, Result};

#[derive(Clone, Debug, PartialEq)]
pub struct NeeCacheConfig {
    /// Master switch; when disabled, the pass forwards the prior indirect
    /// estimate as-is
    pub enabled: bool,

    /// Whether the pass contributes at the primary hit
    pub enable_on_first_bounce: bool,

    /// Whether insertions go into a freshly jittered cell instead of the one
    /// that's been sampled from
    pub spatial_reuse: bool,

    /// Whether training pixels merge their contribution into the training
    /// vertices
    pub training: bool,

    /// Maximum luminance of the prior specular estimate
    pub firefly_threshold: f32,

    pub occlude_alpha_blended: bool,
    pub occlude_dynamic: bool,

    /// Edge length of a cache cell, in world units
    pub cell_size: f32,
}

impl NeeCacheConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.firefly_threshold.is_finite() && self.firefly_threshold > 0.0)
        {
            return Err(Error::InvalidConfig {
                field: "firefly_threshold",
                reason: "must be a positive number",
            });
        }

        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(Error::InvalidConfig {
                field: "cell_size",
                reason: "must be a positive number",
            });
        }

        Ok(())
    }

    pub(crate) fn serialize(&self, frame: Frame) -> NeeCachePassParams {
        let flags = [
            (self.enabled, NeeCachePassParams::FLAG_ENABLED),
            (
                self.enable_on_first_bounce,
                NeeCachePassParams::FLAG_ENABLE_ON_FIRST_BOUNCE,
            ),
            (self.spatial_reuse, NeeCachePassParams::FLAG_SPATIAL_REUSE),
            (self.training, NeeCachePassParams::FLAG_TRAINING),
            (
                self.occlude_alpha_blended,
                NeeCachePassParams::FLAG_OCCLUDE_ALPHA_BLENDED,
            ),
            (self.occlude_dynamic, NeeCachePassParams::FLAG_OCCLUDE_DYNAMIC),
        ]
        .into_iter()
        .filter(|(enabled, _)| *enabled)
        .fold(0, |flags, (_, flag)| flags | flag);

        NeeCachePassParams {
            frame: frame.get(),
            flags,
            firefly_threshold: self.firefly_threshold,
            cell_size: self.cell_size,
        }
    }
}

impl Default for NeeCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            enable_on_first_bounce: true,
            spatial_reuse: true,
            training: false,
            firefly_threshold: 10.0,
            occlude_alpha_blended: false,
            occlude_dynamic: true,
            cell_size: 0.5,
        }
    }
}
