use glam::Vec3;

use crate::{GBufferEntry, Ray};

#[derive(Clone, Copy, Default)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct Hit {
    pub origin: Vec3,
    pub dir: Vec3,
    pub point: Vec3,
    pub gbuffer: GBufferEntry,
}

impl Hit {
    /// How far to move a hit point away from its surface to avoid
    /// self-intersection when casting shadow rays
    pub const NUDGE_OFFSET: f32 = 0.01;

    pub fn new(ray: Ray, gbuffer: GBufferEntry) -> Self {
        Self {
            origin: ray.origin(),
            dir: ray.dir(),
            point: ray.at(gbuffer.depth - Self::NUDGE_OFFSET),
            gbuffer,
        }
    }

    pub fn is_some(&self) -> bool {
        self.gbuffer.is_some()
    }

    pub fn is_none(&self) -> bool {
        !self.is_some()
    }

    /// Direction from the hit point towards the viewer.
    pub fn view(&self) -> Vec3 {
        -self.dir
    }
}
