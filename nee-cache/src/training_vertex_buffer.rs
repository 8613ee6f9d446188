use derivative::Derivative;
use glam::Vec3;

use crate::gpu::{TrainingPath, TrainingVertices};
use crate::{SharedBuffer, SharedView};

/// Radiance gathered along the training paths, one slot per training pixel
/// and bounce.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct TrainingVertexBuffer {
    #[derivative(Debug = "ignore")]
    slots: SharedBuffer<u32>,
    pixel_count: u32,
}

impl TrainingVertexBuffer {
    pub fn new(pixel_count: u32) -> Self {
        let slots = SharedBuffer::new(
            "training_vertices",
            pixel_count as usize * TrainingPath::MAX_BOUNCES,
        );

        Self { slots, pixel_count }
    }

    pub fn pixel_count(&self) -> u32 {
        self.pixel_count
    }

    pub fn view(&self) -> SharedView<'_, u32> {
        self.slots.view()
    }

    pub fn read(&self, pixel_idx: u32, bounce: usize) -> Vec3 {
        let mut view = self.view();

        TrainingVertices::new(&mut view).read(pixel_idx, bounce)
    }

    pub fn merge(&self, pixel_idx: u32, bounce: usize, radiance: Vec3) {
        let mut view = self.view();

        TrainingVertices::new(&mut view).merge(pixel_idx, bounce, radiance);
    }

    /// Zeroes all slots; happens once per frame, before any pass contributes
    /// to them.
    pub fn reset(&self) {
        self.slots.clear();
    }
}
