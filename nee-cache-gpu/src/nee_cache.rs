mod candidate;
mod cell;

use glam::{vec3, vec4, Vec3, Vec4};
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

pub use self::candidate::*;
pub use self::cell::*;
use crate::{hash, F32Ext, Normal, Storage};

/// Spatial hash grid of emissive regions worth sampling from given point.
///
/// Cells are addressed by quantized position, dominant normal axis and a
/// small jitter value (see [`NeeCell::JITTER_RANGE`]). Jitter shifts the
/// point by a quarter of a cell along each axis before quantizing it, so that
/// lookups and insertions near a cell's boundary spill into the neighbouring
/// cells; this blends the learned importance across space without an explicit
/// blur pass.
///
/// Many invocations read and write the same cells at once, with no
/// synchronization - see [`Storage`].
pub struct NeeCache<'a, S>
where
    S: Storage<Vec4> + ?Sized,
{
    storage: &'a mut S,
    cell_size: f32,
}

impl<'a, S> NeeCache<'a, S>
where
    S: Storage<Vec4> + ?Sized,
{
    const JITTER_OFFSET: f32 = 0.25;

    pub fn new(storage: &'a mut S, cell_size: f32) -> Self {
        Self { storage, cell_size }
    }

    pub fn cell_count(&self) -> u32 {
        (self.storage.len() / NeeCell::STRIDE) as u32
    }

    pub fn cell_id(&self, point: Vec3, normal: Vec3, jitter: u32) -> u32 {
        let cell_count = self.cell_count();

        if cell_count == 0 {
            return 0;
        }

        let offset = vec3(
            if jitter & 1 == 0 { -1.0 } else { 1.0 },
            if jitter & 2 == 0 { -1.0 } else { 1.0 },
            if jitter & 4 == 0 { -1.0 } else { 1.0 },
        ) * Self::JITTER_OFFSET;

        let pos = (point / self.cell_size + offset).floor().as_ivec3();

        let key = hash(Normal::dominant_axis(normal));
        let key = hash(pos.z as u32 ^ key);
        let key = hash(pos.y as u32 ^ key);
        let key = hash(pos.x as u32 ^ key);

        key % cell_count
    }

    pub fn lookup(&self, point: Vec3, normal: Vec3, jitter: u32) -> NeeCell {
        self.read(self.cell_id(point, normal, jitter))
    }

    pub fn read(&self, id: u32) -> NeeCell {
        let mut cell = NeeCell::empty(id);

        if id >= self.cell_count() {
            return cell;
        }

        let base = Self::base(id);
        let header = self.storage.load(base);

        cell.count = header.x.to_bits().min(NeeCell::CAPACITY as u32);
        cell.total_weight = header.y;

        let mut idx = 0;

        while idx < cell.len() {
            cell.candidates[idx] =
                NeeCandidate::unpack(self.storage.load(base + 1 + idx));

            idx += 1;
        }

        cell
    }

    /// Feeds radiance observed through given region back into the cell.
    ///
    /// A region that's already known to the cell gets its weight blended
    /// towards `luminance`; an unknown region takes a free slot or, when the
    /// cell is full, evicts the weakest candidate (but only if it's weaker
    /// than what's been just observed).
    ///
    /// Returns whether the cell has been modified.
    pub fn insert(
        &mut self,
        id: u32,
        region: NeeRegion,
        luminance: f32,
    ) -> bool {
        if !(luminance > 0.0) || !luminance.is_finite() {
            return false;
        }

        self.update(id, region, |weight| match weight {
            Some(weight) => weight + (luminance - weight) * NeeCell::BLEND,
            None => luminance,
        })
    }

    /// Puts candidate into the cell as-is, overwriting the weight of its
    /// region if the cell already knows it.
    ///
    /// This is the primitive used by the population pass; the shading pass
    /// goes through [`Self::insert()`] instead.
    pub fn push(&mut self, id: u32, candidate: NeeCandidate) -> bool {
        let weight = candidate.clamped_weight();

        if weight == 0.0 {
            return false;
        }

        self.update(id, candidate.region, |_| weight)
    }

    /// Multiplies all weights in the cell by `factor`, dropping candidates
    /// that fall below `min_weight`, and recomputes the cell's total weight.
    pub fn decay(&mut self, id: u32, factor: f32, min_weight: f32) {
        if id >= self.cell_count() {
            return;
        }

        let cell = self.read(id);
        let base = Self::base(id);
        let mut count = 0;
        let mut total = 0.0;
        let mut idx = 0;

        while idx < cell.len() {
            let mut candidate = cell.candidates[idx];

            candidate.weight = candidate.clamped_weight() * factor;

            if candidate.weight >= min_weight && candidate.weight > 0.0 {
                self.storage.store(base + 1 + count, candidate.pack());
                total += candidate.weight;
                count += 1;
            }

            idx += 1;
        }

        self.write_header(base, count as u32, total);
    }

    pub fn clear(&mut self, id: u32) {
        if id < self.cell_count() {
            self.write_header(Self::base(id), 0, 0.0);
        }
    }

    fn update(
        &mut self,
        id: u32,
        region: NeeRegion,
        f: impl FnOnce(Option<f32>) -> f32,
    ) -> bool {
        if id >= self.cell_count() {
            return false;
        }

        let cell = self.read(id);
        let base = Self::base(id);
        let mut count = cell.len();
        let mut total = cell.total_weight.sanitize();
        let mut weakest = None;
        let mut idx = 0;

        while idx < count {
            let candidate = cell.candidates[idx];
            let weight = candidate.clamped_weight();

            if candidate.region == region {
                let new_weight = f(Some(weight));

                self.storage.store(
                    base + 1 + idx,
                    NeeCandidate::new(region, new_weight).pack(),
                );

                self.write_header(
                    base,
                    count as u32,
                    total + new_weight - weight,
                );

                return true;
            }

            let is_weakest = match weakest {
                Some((_, weakest_weight)) => weight < weakest_weight,
                None => true,
            };

            if is_weakest {
                weakest = Some((idx, weight));
            }

            idx += 1;
        }

        let new_weight = f(None);

        let slot = if count < NeeCell::CAPACITY {
            count += 1;
            count - 1
        } else {
            let Some((idx, weight)) = weakest else {
                return false;
            };

            if new_weight <= weight {
                return false;
            }

            total -= weight;
            idx
        };

        self.storage.store(
            base + 1 + slot,
            NeeCandidate::new(region, new_weight).pack(),
        );

        self.write_header(base, count as u32, total + new_weight);

        true
    }

    fn write_header(&mut self, base: usize, count: u32, total: f32) {
        self.storage.store(
            base,
            vec4(f32::from_bits(count), total.max(0.0), 0.0, 0.0),
        );
    }

    fn base(id: u32) -> usize {
        id as usize * NeeCell::STRIDE
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn buffer(cells: usize) -> Vec<Vec4> {
        vec![Vec4::ZERO; cells * NeeCell::STRIDE]
    }

    fn region(id: u32) -> NeeRegion {
        NeeRegion::new(id, 0, 1)
    }

    #[test]
    fn cell_id() {
        let mut buffer = buffer(64);
        let target = NeeCache::new(buffer.as_mut_slice(), 1.0);

        let a = target.cell_id(vec3(0.5, 0.5, 0.5), Vec3::Y, 0);
        let b = target.cell_id(vec3(0.5, 0.5, 0.5), Vec3::Y, 0);
        let c = target.cell_id(vec3(0.6, 0.4, 0.5), Vec3::Y, 0);

        assert_eq!(a, b);
        assert_eq!(a, c);
        assert!(a < 64);

        // Close to the cell's corner, jitter reaches into the neighbours
        let ids: Vec<_> = (0..NeeCell::JITTER_RANGE)
            .map(|jitter| target.cell_id(vec3(0.1, 0.1, 0.1), Vec3::Y, jitter))
            .collect();

        assert!(ids.iter().any(|id| *id != ids[0]));

        // ... while in the cell's center all jitters agree
        for jitter in 0..NeeCell::JITTER_RANGE {
            assert_eq!(a, target.cell_id(vec3(0.5, 0.5, 0.5), Vec3::Y, jitter));
        }
    }

    #[test]
    fn cell_id_without_cells() {
        let mut buffer = buffer(0);
        let target = NeeCache::new(buffer.as_mut_slice(), 1.0);

        assert_eq!(0, target.cell_id(Vec3::ONE, Vec3::Y, 3));
        assert!(target.lookup(Vec3::ONE, Vec3::Y, 3).is_empty());
    }

    #[test]
    fn insert() {
        let mut buffer = buffer(4);
        let mut target = NeeCache::new(buffer.as_mut_slice(), 1.0);

        assert!(target.insert(1, region(10), 2.0));
        assert!(target.insert(1, region(11), 4.0));

        let cell = target.read(1);

        assert_eq!(2, cell.count);
        assert_relative_eq!(6.0, cell.total_weight);
        assert_eq!(region(10), cell.candidates[0].region);
        assert_eq!(2.0, cell.candidates[0].weight);

        // Known region gets blended towards the observed value
        assert!(target.insert(1, region(10), 10.0));

        let cell = target.read(1);

        assert_eq!(2, cell.count);
        assert_relative_eq!(3.0, cell.candidates[0].weight);
        assert_relative_eq!(7.0, cell.total_weight);

        // Other cells stay untouched
        assert!(target.read(0).is_empty());
        assert!(target.read(2).is_empty());
    }

    #[test]
    fn insert_ignores_nonsense() {
        let mut buffer = buffer(1);
        let mut target = NeeCache::new(buffer.as_mut_slice(), 1.0);

        assert!(!target.insert(0, region(1), 0.0));
        assert!(!target.insert(0, region(1), -1.0));
        assert!(!target.insert(0, region(1), f32::NAN));
        assert!(!target.insert(0, region(1), f32::INFINITY));
        assert!(!target.insert(1, region(1), 1.0));
        assert!(target.read(0).is_empty());
    }

    #[test]
    fn insert_into_full_cell() {
        let mut buffer = buffer(1);
        let mut target = NeeCache::new(buffer.as_mut_slice(), 1.0);

        for id in 0..NeeCell::CAPACITY as u32 {
            assert!(target.insert(0, region(id), 1.0 + id as f32));
        }

        // Weaker than everything, so ignored
        assert!(!target.insert(0, region(100), 0.5));

        // Stronger than the weakest one (region 0), so replaces it
        assert!(target.insert(0, region(101), 5.0));

        let cell = target.read(0);
        let expected: f32 = (2..=16).map(|w| w as f32).sum::<f32>() + 5.0;

        assert_eq!(NeeCell::CAPACITY, cell.len());
        assert_eq!(region(101), cell.candidates[0].region);
        assert_relative_eq!(expected, cell.total_weight);
    }

    #[test]
    fn push() {
        let mut buffer = buffer(1);
        let mut target = NeeCache::new(buffer.as_mut_slice(), 1.0);

        assert!(target.push(0, NeeCandidate::new(region(1), 3.0)));
        assert!(target.push(0, NeeCandidate::new(region(1), 1.0)));
        assert!(!target.push(0, NeeCandidate::new(region(2), 0.0)));

        let cell = target.read(0);

        assert_eq!(1, cell.count);
        assert_eq!(1.0, cell.candidates[0].weight);
        assert_relative_eq!(1.0, cell.total_weight);
    }

    #[test]
    fn decay() {
        let mut buffer = buffer(1);
        let mut target = NeeCache::new(buffer.as_mut_slice(), 1.0);

        target.push(0, NeeCandidate::new(region(1), 1.0));
        target.push(0, NeeCandidate::new(region(2), 8.0));
        target.push(0, NeeCandidate::new(region(3), 4.0));
        target.decay(0, 0.5, 1.0);

        let cell = target.read(0);

        assert_eq!(2, cell.count);
        assert_eq!(region(2), cell.candidates[0].region);
        assert_eq!(4.0, cell.candidates[0].weight);
        assert_eq!(region(3), cell.candidates[1].region);
        assert_eq!(2.0, cell.candidates[1].weight);
        assert_relative_eq!(6.0, cell.total_weight);

        target.clear(0);

        assert!(target.read(0).is_empty());
    }
}
