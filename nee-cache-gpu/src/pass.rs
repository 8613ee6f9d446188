use glam::{vec4, UVec2, Vec3, Vec4, Vec4Swizzles};

use crate::{
    EmissiveSurfacesView, EmissiveTrianglesView, GBufferEntry, GiFlags,
    GiReservoir, GiSample, Hit, LayeredBrdf, LightSample, Mis, NeeCache,
    NeeCachePassParams, NeeCell, NoiseStream, Ray, Storage, TrainingPath,
    TrainingVertices, Vec3Ext, Visibility, WhiteNoise,
};

/// Everything the pass needs to know about a single pixel.
#[derive(Clone, Copy, Default)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct PixelInputs {
    pub screen_pos: UVec2,

    /// Packed [`GBufferEntry`] of the primary hit
    pub gbuffer: Vec4,

    /// Camera ray that produced the primary hit
    pub ray: Ray,

    /// Spread angle of the camera's ray cone, in radians per unit of
    /// distance
    pub cone_spread: f32,

    pub prior: PriorIndirect,

    /// Index of this pixel within the training paths or
    /// [`TrainingPath::NONE`]
    pub training_pixel: u32,
}

/// Indirect lighting estimated by the path tracer before this pass runs.
#[derive(Clone, Copy, Default)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct PriorIndirect {
    pub radiance: Vec3,
    pub hit_distance: f32,

    /// Whether the path's first bounce has been sampled from the specular
    /// lobe (as opposed to the diffuse one)
    pub is_specular: bool,
}

/// Diffuse and specular indirect lighting (`xyz`) along with the hit distance
/// (`w`), as consumed by the denoiser.
#[derive(Clone, Copy, PartialEq)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct PixelOutputs {
    pub diffuse: Vec4,
    pub specular: Vec4,
    pub outcome: NeeOutcome,
}

/// How processing of a pixel ended.
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub enum NeeOutcome {
    /// Primary ray hit nothing
    Miss,

    /// Cache is turned off; prior estimate is passed through
    Disabled,

    /// Cell had nothing to sample from
    NoCandidates,

    /// Sampled light contributes nothing, e.g. because it faces away from
    /// the surface
    ZeroRadiance,

    Occluded,
    Visible,
}

/// Next-event estimation driven by the NEE cache, run once per pixel of the
/// primary hit.
///
/// Picks a light from the cache cell around the hit point, adds its
/// MIS-weighted contribution on top of the path tracer's indirect estimate,
/// and feeds what's been observed back into the cache, the GI reservoir and
/// the training paths.
pub struct NeeCachePass<'a> {
    pub params: &'a NeeCachePassParams,
    pub surfaces: EmissiveSurfacesView<'a>,
    pub triangles: EmissiveTrianglesView<'a>,
}

impl<'a> NeeCachePass<'a> {
    /// Weight applied to candidates streamed into the GI reservoir.
    pub const RESERVOIR_MIX_PROBABILITY: f32 = 0.5;

    /// One in this many pixels writes back into the cache.
    pub const INSERTION_PERIOD: u32 = 4;

    /// Hit distance reported for outputs that haven't seen any hit.
    pub const EMPTY_HIT_DISTANCE: f32 = 0.0;

    pub fn new(
        params: &'a NeeCachePassParams,
        surfaces: EmissiveSurfacesView<'a>,
        triangles: EmissiveTrianglesView<'a>,
    ) -> Self {
        Self {
            params,
            surfaces,
            triangles,
        }
    }

    /// Processes a single pixel.
    ///
    /// `reservoir` is the pixel's GI reservoir for the current frame: cleared
    /// on a miss, updated when a light turns out to be visible, left as-is
    /// otherwise. Reusing last frame's reservoir here would resample across
    /// frames, which is up to the passes that consume it.
    pub fn run<C, T, V>(
        &self,
        cache: &mut NeeCache<C>,
        training: &mut TrainingVertices<T>,
        visibility: &V,
        inputs: &PixelInputs,
        reservoir: &mut GiReservoir,
    ) -> PixelOutputs
    where
        C: Storage<Vec4> + ?Sized,
        T: Storage<u32> + ?Sized,
        V: Visibility + ?Sized,
    {
        let empty = vec4(0.0, 0.0, 0.0, Self::EMPTY_HIT_DISTANCE);
        let hit = Hit::new(inputs.ray, GBufferEntry::unpack(inputs.gbuffer));

        if hit.is_none() {
            *reservoir = Default::default();

            return PixelOutputs {
                diffuse: empty,
                specular: empty,
                outcome: NeeOutcome::Miss,
            };
        }

        let prior = inputs.prior;
        let prior_value = prior.radiance.extend(prior.hit_distance);

        let mut out = if prior.is_specular {
            PixelOutputs {
                diffuse: empty,
                specular: prior_value,
                outcome: NeeOutcome::Disabled,
            }
        } else {
            PixelOutputs {
                diffuse: prior_value,
                specular: empty,
                outcome: NeeOutcome::Disabled,
            }
        };

        let is_enabled = self.params.is_enabled()
            && self.params.is_enabled_on_first_bounce();

        if !is_enabled {
            return out;
        }

        let firefly_threshold = self.params.firefly_threshold;

        if firefly_threshold > 0.0 {
            out.specular = out
                .specular
                .xyz()
                .clamp_luma(firefly_threshold)
                .extend(out.specular.w);
        }

        // ---

        let mut wnoise = WhiteNoise::new(
            self.params.frame(),
            inputs.screen_pos,
            NoiseStream::NEE_CACHE,
        );

        let normal = hit.gbuffer.normal;
        let jitter = wnoise.sample_below(NeeCell::JITTER_RANGE);
        let cell = cache.lookup(hit.point, normal, jitter);

        let Some((candidate, object_pdf)) = cell.sample(wnoise.sample()) else {
            out.outcome = NeeOutcome::NoCandidates;
            return out;
        };

        let sample = LightSample::build(
            candidate,
            object_pdf,
            self.surfaces,
            self.triangles,
            hit.point,
            inputs.cone_spread * hit.gbuffer.depth,
            hit.gbuffer.lobe_angle(),
            &mut wnoise,
        );

        if !sample.is_some() {
            out.outcome = NeeOutcome::ZeroRadiance;
            return out;
        }

        let l = sample.dir(hit.point);
        let v = hit.view();
        let brdf = LayeredBrdf::new(&hit.gbuffer);
        let mis = Mis::balance(sample.pdf, brdf.pdf(l, v));
        let shaded = brdf.shade(l, v, sample.radiance * (mis / sample.pdf));
        let contribution = shaded.sum();

        if shaded.is_zero() || !contribution.is_finite() {
            out.outcome = NeeOutcome::ZeroRadiance;
            return out;
        }

        let is_visible = visibility.is_visible(
            &hit,
            &sample,
            self.params.object_mask(),
            hit.gbuffer.has_displacement(),
        );

        if !is_visible {
            out.outcome = NeeOutcome::Occluded;
            return out;
        }

        out.outcome = NeeOutcome::Visible;
        out.diffuse =
            accumulate(out.diffuse, shaded.diffuse, sample.distance);

        out.specular =
            accumulate(out.specular, shaded.specular, sample.distance);

        // ---

        let is_training = self.params.is_training()
            && inputs.training_pixel != TrainingPath::NONE;

        let is_inserting = inputs
            .screen_pos
            .x
            .wrapping_add(inputs.screen_pos.y)
            .wrapping_add(self.params.frame)
            % Self::INSERTION_PERIOD
            == 0;

        if is_inserting || is_training {
            let cell_id = if self.params.has_spatial_reuse() {
                let jitter = wnoise.sample_below(NeeCell::JITTER_RANGE);

                cache.cell_id(hit.point, normal, jitter)
            } else {
                cell.id
            };

            cache.insert(cell_id, candidate.region, contribution.luma());
        }

        // ---

        let gi_sample = GiSample {
            position: sample.position,
            normal: sample.normal,
            radiance: GiSample::clamp_radiance(sample.radiance / sample.pdf),
        };

        let mut rnoise = WhiteNoise::new(
            self.params.frame(),
            inputs.screen_pos,
            NoiseStream::RESERVOIR,
        );

        let is_accepted = reservoir.update(
            gi_sample,
            gi_sample.target_pdf(&hit),
            Self::RESERVOIR_MIX_PROBABILITY,
            rnoise.sample(),
        );

        if is_accepted {
            reservoir.flags = GiFlags {
                is_valid: true,
                ..Default::default()
            };
        }

        // ---

        if is_training {
            training.merge(inputs.training_pixel, 0, contribution);
        }

        out
    }
}

fn accumulate(value: Vec4, radiance: Vec3, distance: f32) -> Vec4 {
    let hit_distance = if value.w == NeeCachePass::EMPTY_HIT_DISTANCE {
        distance
    } else {
        value.w
    };

    (value.xyz() + radiance).extend(hit_distance)
}
