use glam::{vec2, Vec3};
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

use crate::{
    EmissiveSurfacesView, EmissiveTrianglesView, F32Ext, NeeCandidate, Ray,
    WhiteNoise, NEE_EPSILON,
};

/// Point on an emissive surface, as seen from a particular shading point.
#[derive(Clone, Copy, Default)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct LightSample {
    pub position: Vec3,
    pub normal: Vec3,
    pub radiance: Vec3,

    /// Density of having picked this point, with respect to the solid angle
    /// subtended at the shading point
    pub pdf: f32,

    pub distance: f32,

    /// Width of the ray cone at the light, for texture filtering
    pub footprint: f32,
}

impl LightSample {
    /// Picks a uniformly random point on the candidate's triangles and
    /// converts the candidate's selection probability (`object_pdf`) into a
    /// solid-angle density at `point`.
    ///
    /// Always consumes exactly three samples from `wnoise`.
    pub fn build(
        candidate: NeeCandidate,
        object_pdf: f32,
        surfaces: EmissiveSurfacesView,
        triangles: EmissiveTrianglesView,
        point: Vec3,
        cone_footprint: f32,
        lobe_angle: f32,
        wnoise: &mut WhiteNoise,
    ) -> Self {
        let primitive_sample = wnoise.sample();
        let uv = vec2(wnoise.sample(), wnoise.sample());

        let region = candidate.region;
        let count = region.primitive_count;

        if count == 0 || !(object_pdf > 0.0) {
            return Default::default();
        }

        let Some(surface) = surfaces.get(region.surface_id) else {
            return Default::default();
        };

        // Regions come from unsynchronized cache reads and can be garbage
        let picked = ((primitive_sample * count as f32) as u32).min(count - 1);

        let Some(primitive) = region.primitive_offset.checked_add(picked) else {
            return Default::default();
        };

        if primitive >= surface.triangle_count() {
            return Default::default();
        }

        let Some(triangle) = surface
            .first_triangle()
            .checked_add(primitive)
            .and_then(|id| triangles.get(id))
        else {
            return Default::default();
        };

        let position = triangle.sample_point(uv);
        let normal = triangle.normal();
        let area = triangle.area();
        let to_light = position - point;
        let distance = to_light.length();

        if area < NEE_EPSILON || distance < NEE_EPSILON {
            return Default::default();
        }

        let mut sample = Self {
            position,
            normal,
            distance,
            footprint: cone_footprint + distance * lobe_angle,
            ..Default::default()
        };

        // Emission is one-sided, so a light seen from behind contributes
        // nothing
        let cos_light = -normal.dot(to_light / distance);

        if cos_light <= NEE_EPSILON {
            return sample;
        }

        sample.radiance = triangle.radiance() * surface.intensity();

        sample.pdf = object_pdf / (count as f32) / area * distance.sqr()
            / cos_light;

        sample
    }

    /// Returns whether this sample can contribute anything.
    pub fn is_some(&self) -> bool {
        self.pdf > 0.0
            && self.pdf.is_finite()
            && self.radiance.max_element() > 0.0
    }

    /// Returns direction from `point` towards this sample.
    pub fn dir(&self, point: Vec3) -> Vec3 {
        (self.position - point).normalize_or_zero()
    }

    /// Returns ray from `point` towards this sample, stopping just short of
    /// the light itself.
    pub fn shadow_ray(&self, point: Vec3) -> Ray {
        let dir = self.dir(point);
        let len = (self.position - point).length();

        Ray::new(point, dir).with_len((len - 0.001).max(0.0))
    }
}
