use derivative::Derivative;
use glam::{Vec3, Vec4};
use rayon::prelude::*;

use crate::gpu::{NeeCache, NeeCandidate, NeeCell};
use crate::{Error, Result, SharedBuffer, SharedView};

/// Storage of the NEE cache, shared by all pixels of the pass.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct NeeCacheBuffer {
    #[derivative(Debug = "ignore")]
    cells: SharedBuffer<Vec4>,
    cell_count: u32,
    cell_size: f32,
}

impl NeeCacheBuffer {
    pub fn new(cell_count: u32, cell_size: f32) -> Result<Self> {
        if cell_count == 0 {
            return Err(Error::NoCells);
        }

        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(Error::InvalidConfig {
                field: "cell_size",
                reason: "must be a positive number",
            });
        }

        let cells = SharedBuffer::new(
            "nee_cache_cells",
            cell_count as usize * NeeCell::STRIDE,
        );

        Ok(Self {
            cells,
            cell_count,
            cell_size,
        })
    }

    pub fn cell_count(&self) -> u32 {
        self.cell_count
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn view(&self) -> SharedView<'_, Vec4> {
        self.cells.view()
    }

    /// Runs `f` with a cache view of its own; can be called from many threads
    /// at once.
    pub fn with_cache<T>(
        &self,
        f: impl FnOnce(&mut NeeCache<SharedView<'_, Vec4>>) -> T,
    ) -> T {
        let mut view = self.view();

        f(&mut NeeCache::new(&mut view, self.cell_size))
    }

    pub fn cell_id(&self, point: Vec3, normal: Vec3, jitter: u32) -> u32 {
        self.with_cache(|cache| cache.cell_id(point, normal, jitter))
    }

    pub fn cell(&self, id: u32) -> NeeCell {
        self.with_cache(|cache| cache.read(id))
    }

    /// Seeds a cell with given candidate; see [`NeeCache::push()`].
    pub fn push(&self, id: u32, candidate: NeeCandidate) -> bool {
        self.with_cache(|cache| cache.push(id, candidate))
    }

    pub fn clear(&self) {
        log::debug!("Clearing NEE cache");

        self.cells.clear();
    }

    /// Ages all cells, multiplying their weights by `factor` and forgetting
    /// candidates whose weight drops below `min_weight`.
    pub fn decay(&self, factor: f32, min_weight: f32) -> Result<()> {
        if !(factor >= 0.0 && factor <= 1.0) {
            return Err(Error::InvalidConfig {
                field: "factor",
                reason: "must be in range <0.0, 1.0>",
            });
        }

        if !(min_weight >= 0.0 && min_weight.is_finite()) {
            return Err(Error::InvalidConfig {
                field: "min_weight",
                reason: "must be a non-negative number",
            });
        }

        (0..self.cell_count).into_par_iter().for_each(|id| {
            self.with_cache(|cache| cache.decay(id, factor, min_weight));
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::gpu::NeeRegion;

    use super::*;

    #[test]
    fn new() {
        assert!(matches!(NeeCacheBuffer::new(0, 1.0), Err(Error::NoCells)));

        assert!(matches!(
            NeeCacheBuffer::new(4, -1.0),
            Err(Error::InvalidConfig { .. })
        ));

        let target = NeeCacheBuffer::new(4, 1.0).unwrap();

        assert_eq!(4, target.cell_count());
        assert!((0..4).all(|id| target.cell(id).is_empty()));
    }

    #[test]
    fn push_decay_and_clear() {
        let target = NeeCacheBuffer::new(4, 1.0).unwrap();
        let region = NeeRegion::new(1, 0, 2);

        assert!(target.push(2, NeeCandidate::new(region, 4.0)));
        assert!(!target.push(4, NeeCandidate::new(region, 4.0)));

        target.decay(0.5, 0.0).unwrap();

        let cell = target.cell(2);

        assert_eq!(1, cell.count);
        assert_eq!(2.0, cell.candidates[0].weight);
        assert_eq!(2.0, cell.total_weight);

        target.decay(0.5, 1.5).unwrap();

        assert!(target.cell(2).is_empty());

        target.push(2, NeeCandidate::new(region, 4.0));
        target.clear();

        assert!(target.cell(2).is_empty());
        assert!(target.decay(2.0, 0.0).is_err());
    }
}
