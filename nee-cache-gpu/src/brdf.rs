use core::f32::consts::PI;

use glam::Vec3;
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

use crate::{F32Ext, GBufferEntry, Vec3Ext};

#[derive(Clone, Copy)]
pub struct DiffuseBrdf<'a> {
    gbuffer: &'a GBufferEntry,
}

impl<'a> DiffuseBrdf<'a> {
    pub fn new(gbuffer: &'a GBufferEntry) -> Self {
        Self { gbuffer }
    }

    pub fn eval(self, l: Vec3, v: Vec3, n: Vec3, n_o_l: f32) -> Vec3 {
        let h = (l + v).normalize();
        let n_o_v = n.dot(v).max(0.0001);
        let l_o_h = l.dot(h).saturate();

        self.gbuffer.base_color
            * fd_burley(self.gbuffer.clamped_roughness(), n_o_v, n_o_l, l_o_h)
            * (1.0 - self.gbuffer.metallic)
    }

    /// Returns solid-angle density of cosine-weighted hemisphere sampling.
    pub fn pdf(self, n_o_l: f32) -> f32 {
        n_o_l.max(0.0) / PI
    }
}

#[derive(Clone, Copy)]
pub struct SpecularBrdf<'a> {
    gbuffer: &'a GBufferEntry,
}

impl<'a> SpecularBrdf<'a> {
    /// Below this roughness the lobe is treated as a perfect mirror whose
    /// density towards any particular direction can't be evaluated.
    pub const DELTA_ROUGHNESS: f32 = 0.02;

    pub fn new(gbuffer: &'a GBufferEntry) -> Self {
        Self { gbuffer }
    }

    pub fn eval(self, n_o_v: f32, n_o_l: f32, n_o_h: f32, l_o_h: f32) -> Vec3 {
        let f0 = 0.16
            * self.gbuffer.reflectance
            * self.gbuffer.reflectance
            * (1.0 - self.gbuffer.metallic)
            + self.gbuffer.base_color * self.gbuffer.metallic;

        let d = d_ggx(self.gbuffer.clamped_roughness(), n_o_h);

        let v = v_smith_ggx_correlated(
            self.gbuffer.clamped_roughness(),
            n_o_v,
            n_o_l,
        );

        let f = fresnel(f0, l_o_h);

        d * v * f
    }

    /// Returns solid-angle density of sampling the visible normals of the GGX
    /// distribution.
    pub fn pdf(self, n_o_v: f32, n_o_h: f32) -> f32 {
        if self.gbuffer.roughness < Self::DELTA_ROUGHNESS || n_o_v <= 0.0 {
            return 0.0;
        }

        let roughness = self.gbuffer.clamped_roughness();

        d_ggx(roughness, n_o_h) * g1_smith_ggx(roughness, n_o_v)
            / (4.0 * n_o_v)
    }
}

/// Diffuse + specular BRDF, sampled half-and-half by the path tracer.
#[derive(Clone, Copy)]
pub struct LayeredBrdf<'a> {
    gbuffer: &'a GBufferEntry,
}

impl<'a> LayeredBrdf<'a> {
    pub fn new(gbuffer: &'a GBufferEntry) -> Self {
        Self { gbuffer }
    }

    /// Returns density with which the path tracer would have picked direction
    /// `l` when sampling this BRDF itself.
    pub fn pdf(self, l: Vec3, v: Vec3) -> f32 {
        let n = self.gbuffer.normal;
        let h = (l + v).normalize();
        let n_o_l = n.dot(l);
        let n_o_v = n.dot(v);

        if n_o_l <= 0.0 || n_o_v <= 0.0 {
            return 0.0;
        }

        let diffuse = DiffuseBrdf::new(self.gbuffer).pdf(n_o_l);

        let specular = SpecularBrdf::new(self.gbuffer)
            .pdf(n_o_v, n.dot(h).saturate());

        0.5 * diffuse + 0.5 * specular
    }

    /// Returns radiance reflected towards `v` from light of given `radiance`
    /// arriving from direction `l`, split into its diffuse and specular parts.
    pub fn shade(self, l: Vec3, v: Vec3, radiance: Vec3) -> BrdfValue {
        let n = self.gbuffer.normal;
        let n_o_l = n.dot(l);

        if n_o_l <= 0.0 {
            return Default::default();
        }

        let h = (l + v).normalize();
        let n_o_v = n.dot(v).max(0.0001);
        let n_o_h = n.dot(h).saturate();
        let l_o_h = l.dot(h).saturate();

        let diffuse = DiffuseBrdf::new(self.gbuffer).eval(l, v, n, n_o_l);

        let specular =
            SpecularBrdf::new(self.gbuffer).eval(n_o_v, n_o_l, n_o_h, l_o_h);

        BrdfValue {
            diffuse: diffuse * radiance * n_o_l,
            specular: specular * radiance * n_o_l,
        }
    }

    /// Returns a scalar describing how much this surface cares about light
    /// arriving from direction `l`; used as the target function when
    /// resampling.
    pub fn importance(self, l: Vec3, v: Vec3) -> f32 {
        let value = self.shade(l, v, Vec3::ONE);

        value.diffuse.luma() + value.specular.luma()
    }
}

#[derive(Clone, Copy, Default, PartialEq)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct BrdfValue {
    pub diffuse: Vec3,
    pub specular: Vec3,
}

impl BrdfValue {
    pub fn sum(&self) -> Vec3 {
        self.diffuse + self.specular
    }

    pub fn is_zero(&self) -> bool {
        self.diffuse == Vec3::ZERO && self.specular == Vec3::ZERO
    }
}

fn fd_burley(roughness: f32, n_o_v: f32, n_o_l: f32, l_o_h: f32) -> f32 {
    let f90 = 0.5 + 2.0 * roughness * l_o_h * l_o_h;
    let light_scatter = f_schlick(1.0, f90, n_o_l);
    let view_scatter = f_schlick(1.0, f90, n_o_v);

    light_scatter * view_scatter * (1.0 / PI)
}

fn d_ggx(roughness: f32, n_o_h: f32) -> f32 {
    let one_minus_noh_squared = 1.0 - n_o_h * n_o_h;
    let a = n_o_h * roughness;
    let k = roughness / (one_minus_noh_squared + a * a);

    k * k * (1.0 / PI)
}

fn g1_smith_ggx(roughness: f32, n_o_v: f32) -> f32 {
    let a2 = roughness * roughness;

    2.0 * n_o_v / (n_o_v + (a2 + (1.0 - a2) * n_o_v * n_o_v).sqrt())
}

fn v_smith_ggx_correlated(roughness: f32, n_o_v: f32, n_o_l: f32) -> f32 {
    let a2 = roughness * roughness;
    let lambda_v = n_o_l * ((n_o_v - a2 * n_o_v) * n_o_v + a2).sqrt();
    let lambda_l = n_o_v * ((n_o_l - a2 * n_o_l) * n_o_l + a2).sqrt();

    0.5 / (lambda_v + lambda_l)
}

fn fresnel(f0: Vec3, l_o_h: f32) -> Vec3 {
    let f90 = f0.dot(Vec3::splat(50.0 * 0.33)).saturate();

    f0 + (f90 - f0) * (1.0 - l_o_h).max(0.001).powf(5.0)
}

fn f_schlick(f0: f32, f90: f32, v_o_h: f32) -> f32 {
    f0 + (f90 - f0) * (1.0 - v_o_h).max(0.001).powf(5.0)
}
