use glam::Vec3;

use crate::{LogLuv, Storage, Vec3Ext};

/// Training paths of the radiance-cache network.
pub struct TrainingPath;

impl TrainingPath {
    /// Maximum number of vertices along a path.
    pub const MAX_BOUNCES: usize = 8;

    /// Training-pixel index of pixels that don't take part in training.
    pub const NONE: u32 = u32::MAX;
}

/// Radiance accumulated along the training paths of the radiance-cache
/// network, one LogLuv-encoded slot per (training pixel, bounce).
///
/// Several passes add into the same slots during a frame, without any
/// synchronization - see [`Storage`].
pub struct TrainingVertices<'a, S>
where
    S: Storage<u32> + ?Sized,
{
    storage: &'a mut S,
}

impl<'a, S> TrainingVertices<'a, S>
where
    S: Storage<u32> + ?Sized,
{
    pub fn new(storage: &'a mut S) -> Self {
        Self { storage }
    }

    pub fn read(&self, pixel_idx: u32, bounce: usize) -> Vec3 {
        match self.slot(pixel_idx, bounce) {
            Some(slot) => LogLuv::decode(self.storage.load(slot)),
            None => Vec3::ZERO,
        }
    }

    /// Adds `radiance` into given slot; non-finite and negative components
    /// are treated as zero.
    pub fn merge(&mut self, pixel_idx: u32, bounce: usize, radiance: Vec3) {
        let Some(slot) = self.slot(pixel_idx, bounce) else {
            return;
        };

        let radiance = radiance.sanitize();

        if radiance == Vec3::ZERO {
            return;
        }

        let current = LogLuv::decode(self.storage.load(slot));

        self.storage.store(slot, LogLuv::encode(current + radiance));
    }

    fn slot(&self, pixel_idx: u32, bounce: usize) -> Option<usize> {
        if pixel_idx == TrainingPath::NONE {
            return None;
        }

        if bounce >= TrainingPath::MAX_BOUNCES {
            return None;
        }

        let slot = pixel_idx as usize * TrainingPath::MAX_BOUNCES + bounce;

        if slot < self.storage.len() {
            Some(slot)
        } else {
            None
        }
    }
}
