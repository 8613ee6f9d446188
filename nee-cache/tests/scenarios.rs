use approx::assert_relative_eq;
use glam::{uvec2, vec3, vec4, UVec2, Vec3, Vec4, Vec4Swizzles};
use nee_cache::gpu::{
    BrdfValue, EmissiveSurface, EmissiveSurfacesView, EmissiveTriangle,
    EmissiveTrianglesView, Frame, GBufferEntry, GiReservoir, GiSample, Hit,
    LayeredBrdf, LightSample, Mis, NeeCandidate, NeeCell, NeeRegion,
    NoiseStream, ObjectMask, PixelInputs, PriorIndirect, Ray, Reservoir,
    Storage, TrainingPath, WhiteNoise,
};
use nee_cache::{
    FrameInputs, FrameOutputs, FrameStats, NeeCacheConfig, Renderer,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SIZE: UVec2 = UVec2::new(16, 8);
const CELL_COUNT: u32 = 64;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

struct Scene {
    renderer: Renderer,
    pixels: Vec<PixelInputs>,
    surfaces: Vec<EmissiveSurface>,
    triangles: Vec<EmissiveTriangle>,
    diffuse: Vec<Vec4>,
    specular: Vec<Vec4>,
    reservoirs: Vec<Vec4>,
}

impl Scene {
    fn new(config: NeeCacheConfig, depth: f32) -> Self {
        init();

        let pixel_count = (SIZE.x * SIZE.y) as usize;

        let gbuffer = GBufferEntry {
            base_color: vec3(0.8, 0.7, 0.6),
            normal: Vec3::Z,
            metallic: 0.0,
            roughness: 0.6,
            reflectance: 0.5,
            depth,
            flags: 0,
        }
        .pack();

        let pixels = (0..SIZE.y)
            .flat_map(|y| (0..SIZE.x).map(move |x| (x, y)))
            .map(|(x, y)| PixelInputs {
                screen_pos: UVec2::ZERO,
                gbuffer,
                ray: Ray::new(
                    vec3(x as f32 * 0.1, y as f32 * 0.1, 2.0),
                    -Vec3::Z,
                ),
                cone_spread: 0.001,
                prior: PriorIndirect {
                    radiance: vec3(0.2, 0.3, 0.1),
                    hit_distance: 5.0,
                    is_specular: false,
                },
                training_pixel: TrainingPath::NONE,
            })
            .collect();

        Self {
            renderer: Renderer::new(config, CELL_COUNT, 0).unwrap(),
            pixels,
            surfaces: vec![EmissiveSurface::new(0, 1, 1.0)],
            triangles: vec![EmissiveTriangle::new(
                [
                    vec3(-5.0, -5.0, 3.0),
                    vec3(0.0, 5.0, 3.0),
                    vec3(5.0, -5.0, 3.0),
                ],
                vec3(2.0, 2.0, 2.0),
            )],
            diffuse: vec![Vec4::ZERO; pixel_count],
            specular: vec![Vec4::ZERO; pixel_count],
            reservoirs: vec![Vec4::ZERO; pixel_count * GiReservoir::STRIDE],
        }
    }

    fn candidate() -> NeeCandidate {
        NeeCandidate::new(NeeRegion::new(0, 0, 1), 1.0)
    }

    /// Puts the light into every cell, so that whichever cell a pixel looks
    /// up, it finds exactly one candidate.
    fn with_light(self) -> Self {
        for id in 0..CELL_COUNT {
            assert!(self.renderer.cache().push(id, Self::candidate()));
        }

        self
    }

    fn render(&mut self, is_visible: bool) -> FrameStats {
        let inputs = FrameInputs {
            size: SIZE,
            pixels: &self.pixels,
            surfaces: &self.surfaces,
            triangles: &self.triangles,
        };

        let mut outputs = FrameOutputs {
            diffuse: &mut self.diffuse,
            specular: &mut self.specular,
            reservoirs: &mut self.reservoirs,
        };

        let visibility =
            move |_: &Hit, _: &LightSample, mask: ObjectMask, _: bool| {
                assert!(mask.contains(ObjectMask::OPAQUE));
                is_visible
            };

        self.renderer
            .render(&inputs, &mut outputs, &visibility)
            .unwrap()
    }

    fn cache_snapshot(&self) -> Vec<Vec4> {
        let view = self.renderer.cache().view();

        (0..Storage::len(&view)).map(|idx| view.load(idx)).collect()
    }

    fn reservoir(&self, idx: usize) -> GiReservoir {
        GiReservoir::read(&self.reservoirs, idx)
    }

    fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    /// Contribution the pass is expected to add for given pixel, computed
    /// step by step from the same noise stream.
    fn expected_contribution(
        &self,
        frame: Frame,
        idx: usize,
    ) -> (BrdfValue, f32) {
        let pixel = self.pixels[idx];
        let screen_pos = uvec2(idx as u32 % SIZE.x, idx as u32 / SIZE.x);
        let hit = Hit::new(pixel.ray, GBufferEntry::unpack(pixel.gbuffer));

        let mut wnoise =
            WhiteNoise::new(frame, screen_pos, NoiseStream::NEE_CACHE);

        // Jitter, then the candidate (there's only one, picked with pdf=1)
        wnoise.sample_below(NeeCell::JITTER_RANGE);
        wnoise.sample();

        let sample = LightSample::build(
            Self::candidate(),
            1.0,
            EmissiveSurfacesView::new(&self.surfaces),
            EmissiveTrianglesView::new(&self.triangles),
            hit.point,
            pixel.cone_spread * hit.gbuffer.depth,
            hit.gbuffer.lobe_angle(),
            &mut wnoise,
        );

        let l = sample.dir(hit.point);
        let v = hit.view();
        let brdf = LayeredBrdf::new(&hit.gbuffer);
        let mis = Mis::balance(sample.pdf, brdf.pdf(l, v));

        (
            brdf.shade(l, v, sample.radiance * (mis / sample.pdf)),
            sample.distance,
        )
    }
}

fn filled_reservoir() -> GiReservoir {
    let mut reservoir = GiReservoir::default();

    reservoir.reservoir = Reservoir {
        sample: GiSample {
            position: vec3(1.0, 2.0, 3.0),
            normal: Vec3::Z,
            radiance: vec3(0.5, 0.5, 0.5),
        },
        m: 5,
        w: 0.5,
    };

    reservoir.flags.is_valid = true;
    reservoir
}

#[test]
fn surface_miss() {
    let mut scene = Scene::new(NeeCacheConfig::default(), 0.0).with_light();
    let cache = scene.cache_snapshot();

    for idx in 0..scene.pixel_count() {
        filled_reservoir().write(&mut scene.reservoirs, idx);
    }

    let stats = scene.render(true);

    assert_eq!(scene.pixel_count(), stats.miss);
    assert!(scene.diffuse.iter().all(|out| *out == Vec4::ZERO));
    assert!(scene.specular.iter().all(|out| *out == Vec4::ZERO));
    assert_eq!(cache, scene.cache_snapshot());

    for idx in 0..scene.pixel_count() {
        assert!(scene.reservoir(idx).is_empty());
    }
}

#[test]
fn cache_disabled() {
    let config = NeeCacheConfig {
        enabled: false,
        ..Default::default()
    };

    let mut scene = Scene::new(config, 2.0).with_light();
    let cache = scene.cache_snapshot();

    for idx in 0..scene.pixel_count() {
        filled_reservoir().write(&mut scene.reservoirs, idx);
    }

    let stats = scene.render(true);

    assert_eq!(scene.pixel_count(), stats.disabled);

    for idx in 0..scene.pixel_count() {
        assert_eq!(vec4(0.2, 0.3, 0.1, 5.0), scene.diffuse[idx]);
        assert_eq!(Vec4::ZERO, scene.specular[idx]);
    }

    assert_eq!(cache, scene.cache_snapshot());

    for idx in 0..scene.pixel_count() {
        let reservoir = scene.reservoir(idx);

        assert_eq!(5, reservoir.m);
        assert_eq!(0.5, reservoir.w);
        assert_eq!(vec3(1.0, 2.0, 3.0), reservoir.sample.position);
        assert!(reservoir.flags.is_valid);
    }
}

#[test]
fn visible_light() {
    let mut scene = Scene::new(NeeCacheConfig::default(), 2.0).with_light();
    let frame = scene.renderer.frame();
    let stats = scene.render(true);

    assert_eq!(scene.pixel_count(), stats.visible);

    for idx in 0..scene.pixel_count() {
        let (expected, distance) = scene.expected_contribution(frame, idx);
        let diffuse = scene.diffuse[idx];
        let specular = scene.specular[idx];

        assert!(expected.diffuse.x > 0.0);
        assert!(expected.specular.x > 0.0);

        for (actual, expected) in [
            (diffuse.xyz(), vec3(0.2, 0.3, 0.1) + expected.diffuse),
            (specular.xyz(), expected.specular),
        ] {
            assert_relative_eq!(actual.x, expected.x, max_relative = 1e-5);
            assert_relative_eq!(actual.y, expected.y, max_relative = 1e-5);
            assert_relative_eq!(actual.z, expected.z, max_relative = 1e-5);
        }

        // Diffuse output already had a hit distance, specular one takes the
        // light's
        assert_eq!(5.0, diffuse.w);
        assert_eq!(distance, specular.w);

        let reservoir = scene.reservoir(idx);

        assert_eq!(1, reservoir.m);
        assert!(reservoir.carried().is_some());
    }

    assert_eq!(Frame::new(1), scene.renderer.frame());
}

#[test]
fn reservoirs_belong_to_a_single_frame() {
    let mut scene = Scene::new(NeeCacheConfig::default(), 2.0).with_light();

    for _ in 0..2 {
        scene.reservoirs.fill(Vec4::ZERO);

        let stats = scene.render(true);

        assert_eq!(scene.pixel_count(), stats.visible);
    }

    for idx in 0..scene.pixel_count() {
        let reservoir = scene.reservoir(idx);

        assert_eq!(1, reservoir.m);
        assert!(reservoir.carried().is_some());
    }

    assert_eq!(Frame::new(2), scene.renderer.frame());
}

#[test]
fn occluded_light() {
    let mut scene = Scene::new(NeeCacheConfig::default(), 2.0).with_light();
    let cache = scene.cache_snapshot();
    let stats = scene.render(false);

    assert_eq!(scene.pixel_count(), stats.occluded);

    for idx in 0..scene.pixel_count() {
        assert_eq!(vec4(0.2, 0.3, 0.1, 5.0), scene.diffuse[idx]);
        assert_eq!(Vec4::ZERO, scene.specular[idx]);
        assert!(scene.reservoir(idx).is_empty());
    }

    assert_eq!(cache, scene.cache_snapshot());
}

#[test]
fn empty_cache() {
    let mut scene = Scene::new(NeeCacheConfig::default(), 2.0);
    let stats = scene.render(true);

    assert_eq!(scene.pixel_count(), stats.no_candidates);

    for idx in 0..scene.pixel_count() {
        assert_eq!(vec4(0.2, 0.3, 0.1, 5.0), scene.diffuse[idx]);
        assert!(scene.reservoir(idx).is_empty());
    }
}

#[test]
fn cache_stays_consistent_under_contention() {
    let config = NeeCacheConfig {
        training: true,
        ..Default::default()
    };

    let mut scene = Scene::new(config, 2.0).with_light();

    // Make every pixel insert, all of them into a handful of cells
    for pixel in &mut scene.pixels {
        pixel.training_pixel = 0;
    }

    for _ in 0..8 {
        let stats = scene.render(true);

        assert_eq!(scene.pixel_count(), stats.total());
        assert_eq!(scene.pixel_count(), stats.visible);
    }

    for id in 0..CELL_COUNT {
        let cell = scene.renderer.cache().cell(id);

        assert!(cell.len() <= NeeCell::CAPACITY);
        assert!(cell.total_weight.is_finite() && cell.total_weight >= 0.0);

        for candidate in &cell.candidates[..cell.len()] {
            assert!(candidate.weight.is_finite() && candidate.weight >= 0.0);
        }
    }
}

#[test]
fn sampling_frequencies_follow_weights() {
    let mut rng = StdRng::seed_from_u64(1234);

    for weights in [
        vec![1.0, 2.0, 3.0, 4.0, 0.0],
        vec![1.0e6, 1.0e-3, 0.5],
        vec![1.0e-30, 3.0e-30],
    ] {
        let mut cell = NeeCell::empty(0);

        for (idx, weight) in weights.iter().enumerate() {
            cell.candidates[idx] =
                NeeCandidate::new(NeeRegion::new(idx as u32, 0, 1), *weight);
        }

        cell.count = weights.len() as u32;
        cell.total_weight = weights.iter().sum();

        let total: f32 = weights.iter().sum();
        let draws = 100_000;
        let mut hits = vec![0; weights.len()];

        for _ in 0..draws {
            let (candidate, pdf) = cell.sample(rng.gen()).unwrap();
            let idx = candidate.region.surface_id as usize;

            assert_relative_eq!(
                pdf,
                weights[idx] / total,
                max_relative = 0.001
            );

            hits[idx] += 1;
        }

        for (weight, hits) in weights.iter().zip(hits) {
            let expected = weight / total;
            let actual = hits as f32 / draws as f32;

            assert!(
                (expected - actual).abs() < 0.01,
                "weights={weights:?}, expected={expected}, actual={actual}"
            );
        }
    }
}
