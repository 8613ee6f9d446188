use bytemuck::{Pod, Zeroable};

use crate::{Frame, ObjectMask};

#[repr(C)]
#[derive(Copy, Clone, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct NeeCachePassParams {
    pub frame: u32,
    pub flags: u32,
    pub firefly_threshold: f32,
    pub cell_size: f32,
}

impl NeeCachePassParams {
    pub const FLAG_ENABLED: u32 = 1 << 0;
    pub const FLAG_ENABLE_ON_FIRST_BOUNCE: u32 = 1 << 1;
    pub const FLAG_SPATIAL_REUSE: u32 = 1 << 2;
    pub const FLAG_TRAINING: u32 = 1 << 3;
    pub const FLAG_OCCLUDE_ALPHA_BLENDED: u32 = 1 << 4;
    pub const FLAG_OCCLUDE_DYNAMIC: u32 = 1 << 5;

    pub fn frame(&self) -> Frame {
        Frame::new(self.frame)
    }

    pub fn is_enabled(&self) -> bool {
        self.has(Self::FLAG_ENABLED)
    }

    pub fn is_enabled_on_first_bounce(&self) -> bool {
        self.has(Self::FLAG_ENABLE_ON_FIRST_BOUNCE)
    }

    pub fn has_spatial_reuse(&self) -> bool {
        self.has(Self::FLAG_SPATIAL_REUSE)
    }

    pub fn is_training(&self) -> bool {
        self.has(Self::FLAG_TRAINING)
    }

    /// Returns which scene categories should occlude shadow rays; opaque
    /// geometry always does.
    pub fn object_mask(&self) -> ObjectMask {
        let mut mask = ObjectMask::OPAQUE;

        if self.has(Self::FLAG_OCCLUDE_ALPHA_BLENDED) {
            mask |= ObjectMask::ALPHA_BLENDED;
        }

        if self.has(Self::FLAG_OCCLUDE_DYNAMIC) {
            mask |= ObjectMask::DYNAMIC;
        }

        mask
    }

    fn has(&self, flag: u32) -> bool {
        self.flags & flag > 0
    }
}
