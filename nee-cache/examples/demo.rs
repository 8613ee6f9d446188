//! Renders a few frames of a floor lit by two area lights, one of them
//! partially hidden behind a blocker, and logs how the cache evolves.
//!
//! Run with `RUST_LOG=debug cargo run --example demo`.

use glam::{uvec2, vec3, UVec2, Vec3, Vec4, Vec4Swizzles};
use nee_cache::gpu::{
    EmissiveSurface, EmissiveTriangle, GBufferEntry, GiReservoir, Hit,
    LightSample, NeeCandidate, NeeCell, NeeRegion, ObjectMask, PixelInputs,
    PriorIndirect, Ray, TrainingPath,
};
use nee_cache::{FrameInputs, FrameOutputs, NeeCacheConfig, Renderer};

const SIZE: UVec2 = UVec2::new(64, 48);
const CELL_COUNT: u32 = 4096;
const FRAMES: u32 = 16;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = NeeCacheConfig {
        training: true,
        ..Default::default()
    };

    let mut renderer = Renderer::new(config, CELL_COUNT, SIZE.x)?;
    let pixels = pixels();
    let (surfaces, triangles) = lights();

    // Population: every cell a pixel can land in starts out knowing about
    // both lights with an even weight; the pass refines them from there.
    for pixel in &pixels {
        let hit = Hit::new(pixel.ray, GBufferEntry::unpack(pixel.gbuffer));

        for jitter in 0..NeeCell::JITTER_RANGE {
            let id = renderer.cache().cell_id(
                hit.point,
                hit.gbuffer.normal,
                jitter,
            );

            if renderer.cache().cell(id).is_empty() {
                for (surface_id, surface) in surfaces.iter().enumerate() {
                    renderer.cache().push(
                        id,
                        NeeCandidate::new(
                            NeeRegion::new(
                                surface_id as u32,
                                0,
                                surface.triangle_count(),
                            ),
                            1.0,
                        ),
                    );
                }
            }
        }
    }

    let pixel_count = pixels.len();
    let mut diffuse = vec![Vec4::ZERO; pixel_count];
    let mut specular = vec![Vec4::ZERO; pixel_count];
    let mut reservoirs = vec![Vec4::ZERO; pixel_count * GiReservoir::STRIDE];

    for _ in 0..FRAMES {
        renderer.training().reset();
        reservoirs.fill(Vec4::ZERO);

        let stats = renderer.render(
            &FrameInputs {
                size: SIZE,
                pixels: &pixels,
                surfaces: &surfaces,
                triangles: &triangles,
            },
            &mut FrameOutputs {
                diffuse: &mut diffuse,
                specular: &mut specular,
                reservoirs: &mut reservoirs,
            },
            &is_visible,
        )?;

        let mean = diffuse
            .iter()
            .chain(specular.iter())
            .map(|out| out.xyz())
            .sum::<Vec3>()
            / pixel_count as f32;

        let valid = (0..pixel_count)
            .filter(|&idx| GiReservoir::read(&reservoirs, idx).flags.is_valid)
            .count();

        log::info!(
            "Frame {}: visible={}, occluded={}, mean={mean:.3}, \
             valid reservoirs={valid}",
            renderer.frame().get() - 1,
            stats.visible,
            stats.occluded,
        );

        renderer.cache().decay(0.95, 0.01)?;
    }

    let probe = renderer.cache().cell_id(Vec3::ZERO, Vec3::Z, 0);

    let cell = renderer.cache().cell(probe);

    for candidate in &cell.candidates[..cell.len()] {
        log::info!(
            "Cell {probe}: surface={}, weight={:.3}",
            candidate.region.surface_id,
            candidate.weight,
        );
    }

    log::info!(
        "Training radiance at the first pixel: {:.3}",
        renderer.training().read(0, 0),
    );

    Ok(())
}

/// A rough floor at z=0, seen from above by an orthographic camera.
fn pixels() -> Vec<PixelInputs> {
    let gbuffer = GBufferEntry {
        base_color: vec3(0.8, 0.8, 0.8),
        normal: Vec3::Z,
        metallic: 0.0,
        roughness: 0.4,
        reflectance: 0.5,
        depth: 4.0,
        flags: 0,
    }
    .pack();

    (0..SIZE.y)
        .flat_map(|y| (0..SIZE.x).map(move |x| uvec2(x, y)))
        .map(|pos| {
            let uv = pos.as_vec2() / SIZE.as_vec2() * 2.0 - 1.0;

            PixelInputs {
                screen_pos: pos,
                gbuffer,
                ray: Ray::new(vec3(uv.x * 4.0, uv.y * 3.0, 4.0), -Vec3::Z),
                cone_spread: 0.002,
                prior: PriorIndirect {
                    radiance: vec3(0.05, 0.05, 0.05),
                    hit_distance: 2.0,
                    is_specular: false,
                },
                training_pixel: if pos.y == 0 {
                    pos.x
                } else {
                    TrainingPath::NONE
                },
            }
        })
        .collect()
}

/// A warm quad on the left and a cold quad on the right, both facing down.
fn lights() -> (Vec<EmissiveSurface>, Vec<EmissiveTriangle>) {
    let quad = |center: Vec3, radiance: Vec3| {
        let [a, b, c, d] = [
            center + vec3(-0.5, -0.5, 0.0),
            center + vec3(-0.5, 0.5, 0.0),
            center + vec3(0.5, 0.5, 0.0),
            center + vec3(0.5, -0.5, 0.0),
        ];

        [
            EmissiveTriangle::new([a, b, c], radiance),
            EmissiveTriangle::new([a, c, d], radiance),
        ]
    };

    let surfaces = vec![
        EmissiveSurface::new(0, 2, 1.0),
        EmissiveSurface::new(2, 2, 1.0),
    ];

    let triangles = quad(vec3(-2.0, 0.0, 3.0), vec3(8.0, 6.0, 4.0))
        .into_iter()
        .chain(quad(vec3(2.0, 0.0, 3.0), vec3(3.0, 4.0, 8.0)))
        .collect();

    (surfaces, triangles)
}

/// Blocker: a 2x2 opaque square hanging at z=1.5 under the right light.
fn is_visible(
    hit: &Hit,
    sample: &LightSample,
    _: ObjectMask,
    _: bool,
) -> bool {
    let from = hit.point;
    let to = sample.position;

    if (from.z - 1.5).signum() == (to.z - 1.5).signum() {
        return true;
    }

    let t = (1.5 - from.z) / (to.z - from.z);
    let at = from + (to - from) * t;

    !((1.0..=3.0).contains(&at.x) && (-1.0..=1.0).contains(&at.y))
}
