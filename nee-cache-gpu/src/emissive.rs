use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3, Vec4, Vec4Swizzles};
use spirv_std::arch::IndexUnchecked;
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

/// Triangle that emits light from its front face.
#[repr(C)]
#[derive(Clone, Copy, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct EmissiveTriangle {
    /// x - vertex 0 x
    /// y - vertex 0 y
    /// z - vertex 0 z
    /// w - radiance r
    pub d0: Vec4,

    /// x - vertex 1 x
    /// y - vertex 1 y
    /// z - vertex 1 z
    /// w - radiance g
    pub d1: Vec4,

    /// x - vertex 2 x
    /// y - vertex 2 y
    /// z - vertex 2 z
    /// w - radiance b
    pub d2: Vec4,
}

impl EmissiveTriangle {
    pub fn new(positions: [Vec3; 3], radiance: Vec3) -> Self {
        Self {
            d0: positions[0].extend(radiance.x),
            d1: positions[1].extend(radiance.y),
            d2: positions[2].extend(radiance.z),
        }
    }

    pub fn positions(&self) -> [Vec3; 3] {
        [self.d0.xyz(), self.d1.xyz(), self.d2.xyz()]
    }

    pub fn radiance(&self) -> Vec3 {
        Vec3::new(self.d0.w, self.d1.w, self.d2.w)
    }

    fn cross(&self) -> Vec3 {
        let [p0, p1, p2] = self.positions();

        (p1 - p0).cross(p2 - p0)
    }

    pub fn area(&self) -> f32 {
        0.5 * self.cross().length()
    }

    /// Returns the geometric normal of the emitting face.
    pub fn normal(&self) -> Vec3 {
        self.cross().normalize_or_zero()
    }

    /// Maps a point from the unit square onto this triangle, uniformly with
    /// respect to its area.
    pub fn sample_point(&self, uv: Vec2) -> Vec3 {
        let [p0, p1, p2] = self.positions();
        let su = uv.x.sqrt();
        let b0 = 1.0 - su;
        let b1 = uv.y * su;

        p0 * b0 + p1 * b1 + p2 * (1.0 - b0 - b1)
    }
}

/// Emissive surface (e.g. an instance of an emissive mesh), described as a
/// contiguous range of emissive triangles.
#[repr(C)]
#[derive(Clone, Copy, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct EmissiveSurface {
    /// x - (as u32) index of the first triangle
    /// y - (as u32) number of triangles
    /// z - intensity multiplier
    /// w - unused
    pub d0: Vec4,
}

impl EmissiveSurface {
    pub fn new(
        first_triangle: u32,
        triangle_count: u32,
        intensity: f32,
    ) -> Self {
        Self {
            d0: Vec4::new(
                f32::from_bits(first_triangle),
                f32::from_bits(triangle_count),
                intensity,
                0.0,
            ),
        }
    }

    pub fn first_triangle(&self) -> u32 {
        self.d0.x.to_bits()
    }

    pub fn triangle_count(&self) -> u32 {
        self.d0.y.to_bits()
    }

    pub fn intensity(&self) -> f32 {
        self.d0.z
    }
}

#[derive(Clone, Copy)]
pub struct EmissiveSurfacesView<'a> {
    items: &'a [EmissiveSurface],
}

impl<'a> EmissiveSurfacesView<'a> {
    pub fn new(items: &'a [EmissiveSurface]) -> Self {
        Self { items }
    }

    /// Returns the surface, or `None` if given id is out of range (e.g. the
    /// cache still refers to a surface that's been removed since).
    pub fn get(&self, id: u32) -> Option<EmissiveSurface> {
        if (id as usize) < self.items.len() {
            Some(unsafe { *self.items.index_unchecked(id as usize) })
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

#[derive(Clone, Copy)]
pub struct EmissiveTrianglesView<'a> {
    items: &'a [EmissiveTriangle],
}

impl<'a> EmissiveTrianglesView<'a> {
    pub fn new(items: &'a [EmissiveTriangle]) -> Self {
        Self { items }
    }

    pub fn get(&self, id: u32) -> Option<EmissiveTriangle> {
        if (id as usize) < self.items.len() {
            Some(unsafe { *self.items.index_unchecked(id as usize) })
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}
