use bitflags::bitflags;

use crate::{Hit, LightSample};

bitflags! {
    /// Scene categories that can occlude shadow rays.
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
    pub struct ObjectMask: u32 {
        const OPAQUE = 1 << 0;
        const ALPHA_BLENDED = 1 << 1;
        const DYNAMIC = 1 << 2;
    }
}

/// Answers whether a light sample is visible from a hit point.
///
/// Implemented by whoever owns the acceleration structures - the pass itself
/// only decides what to ask for.
pub trait Visibility {
    fn is_visible(
        &self,
        hit: &Hit,
        sample: &LightSample,
        mask: ObjectMask,
        has_displacement: bool,
    ) -> bool;
}

impl<F> Visibility for F
where
    F: Fn(&Hit, &LightSample, ObjectMask, bool) -> bool,
{
    fn is_visible(
        &self,
        hit: &Hit,
        sample: &LightSample,
        mask: ObjectMask,
        has_displacement: bool,
    ) -> bool {
        self(hit, sample, mask, has_displacement)
    }
}
