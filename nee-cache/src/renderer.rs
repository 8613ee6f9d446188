use glam::{uvec2, UVec2, Vec4};
use rayon::prelude::*;

use crate::gpu::{
    EmissiveSurface, EmissiveSurfacesView, EmissiveTriangle,
    EmissiveTrianglesView, Frame, GiReservoir, NeeCache, NeeCachePass,
    NeeOutcome, PixelInputs, TrainingVertices, Visibility,
};
use crate::{
    measure, Error, NeeCacheBuffer, NeeCacheConfig, Result,
    TrainingVertexBuffer,
};

/// Pixels are processed in square tiles of this size; each task owns a band
/// of `TILE_SIZE` rows and walks it tile by tile.
pub const TILE_SIZE: usize = 8;

pub struct FrameInputs<'a> {
    pub size: UVec2,

    /// Per-pixel inputs, row by row; `screen_pos` is filled in by the
    /// renderer
    pub pixels: &'a [PixelInputs],

    pub surfaces: &'a [EmissiveSurface],
    pub triangles: &'a [EmissiveTriangle],
}

pub struct FrameOutputs<'a> {
    pub diffuse: &'a mut [Vec4],
    pub specular: &'a mut [Vec4],

    /// Packed [`GiReservoir`]s - read before and written after each pixel.
    ///
    /// Reservoirs belong to a single frame: the caller hands in freshly
    /// initialized (e.g. zeroed) ones every frame, since the pass streams
    /// its sample into whatever it finds here.
    pub reservoirs: &'a mut [Vec4],
}

/// Number of pixels that ended up with each [`NeeOutcome`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub miss: usize,
    pub disabled: usize,
    pub no_candidates: usize,
    pub zero_radiance: usize,
    pub occluded: usize,
    pub visible: usize,
}

impl FrameStats {
    fn record(&mut self, outcome: NeeOutcome) {
        let counter = match outcome {
            NeeOutcome::Miss => &mut self.miss,
            NeeOutcome::Disabled => &mut self.disabled,
            NeeOutcome::NoCandidates => &mut self.no_candidates,
            NeeOutcome::ZeroRadiance => &mut self.zero_radiance,
            NeeOutcome::Occluded => &mut self.occluded,
            NeeOutcome::Visible => &mut self.visible,
        };

        *counter += 1;
    }

    fn merge(self, rhs: Self) -> Self {
        Self {
            miss: self.miss + rhs.miss,
            disabled: self.disabled + rhs.disabled,
            no_candidates: self.no_candidates + rhs.no_candidates,
            zero_radiance: self.zero_radiance + rhs.zero_radiance,
            occluded: self.occluded + rhs.occluded,
            visible: self.visible + rhs.visible,
        }
    }

    pub fn total(&self) -> usize {
        self.miss
            + self.disabled
            + self.no_candidates
            + self.zero_radiance
            + self.occluded
            + self.visible
    }
}

#[derive(Debug)]
pub struct Renderer {
    config: NeeCacheConfig,
    cache: NeeCacheBuffer,
    training: TrainingVertexBuffer,
    frame: Frame,
}

impl Renderer {
    pub fn new(
        config: NeeCacheConfig,
        cell_count: u32,
        training_pixels: u32,
    ) -> Result<Self> {
        config.validate()?;

        log::info!(
            "Initializing; cell_count={cell_count}, \
             training_pixels={training_pixels}"
        );

        let cache = NeeCacheBuffer::new(cell_count, config.cell_size)?;
        let training = TrainingVertexBuffer::new(training_pixels);

        Ok(Self {
            config,
            cache,
            training,
            frame: Frame::default(),
        })
    }

    pub fn config(&self) -> &NeeCacheConfig {
        &self.config
    }

    /// Changes configuration, starting from the next frame.
    ///
    /// Cell size can't be changed this way, since cells already present in
    /// the cache would get reinterpreted.
    pub fn set_config(&mut self, config: NeeCacheConfig) -> Result<()> {
        config.validate()?;

        if config.cell_size != self.cache.cell_size() {
            return Err(Error::InvalidConfig {
                field: "cell_size",
                reason: "cannot be changed after creating the renderer",
            });
        }

        self.config = config;

        Ok(())
    }

    pub fn cache(&self) -> &NeeCacheBuffer {
        &self.cache
    }

    pub fn training(&self) -> &TrainingVertexBuffer {
        &self.training
    }

    pub fn frame(&self) -> Frame {
        self.frame
    }

    /// Runs the pass over all pixels of the frame and advances to the next
    /// one.
    pub fn render<V>(
        &mut self,
        inputs: &FrameInputs,
        outputs: &mut FrameOutputs,
        visibility: &V,
    ) -> Result<FrameStats>
    where
        V: Visibility + Sync + ?Sized,
    {
        let width = inputs.size.x as usize;
        let pixel_count = width * inputs.size.y as usize;

        check_len("pixels", pixel_count, inputs.pixels.len())?;
        check_len("diffuse", pixel_count, outputs.diffuse.len())?;
        check_len("specular", pixel_count, outputs.specular.len())?;

        check_len(
            "reservoirs",
            pixel_count * GiReservoir::STRIDE,
            outputs.reservoirs.len(),
        )?;

        if pixel_count == 0 {
            return Ok(Default::default());
        }

        let params = self.config.serialize(self.frame);

        let pass = NeeCachePass::new(
            &params,
            EmissiveSurfacesView::new(inputs.surfaces),
            EmissiveTrianglesView::new(inputs.triangles),
        );

        let cache = &self.cache;
        let training = &self.training;
        let band_len = TILE_SIZE * width;

        let stats = measure("render", || {
            outputs
                .diffuse
                .par_chunks_mut(band_len)
                .zip(outputs.specular.par_chunks_mut(band_len))
                .zip(
                    outputs
                        .reservoirs
                        .par_chunks_mut(band_len * GiReservoir::STRIDE),
                )
                .enumerate()
                .map(|(band_idx, ((diffuse, specular), reservoirs))| {
                    let mut stats = FrameStats::default();
                    let mut cache_view = cache.view();
                    let mut training_view = training.view();

                    let mut cache =
                        NeeCache::new(&mut cache_view, params.cell_size);

                    let mut training =
                        TrainingVertices::new(&mut training_view);
                    let rows = diffuse.len() / width;

                    for tile_x in (0..width).step_by(TILE_SIZE) {
                        for y in 0..rows {
                            for x in tile_x..(tile_x + TILE_SIZE).min(width) {
                                let screen_y = band_idx * TILE_SIZE + y;
                                let idx = y * width + x;

                                let mut pixel =
                                    inputs.pixels[screen_y * width + x];

                                pixel.screen_pos =
                                    uvec2(x as u32, screen_y as u32);

                                let mut reservoir =
                                    GiReservoir::read(reservoirs, idx);

                                let out = pass.run(
                                    &mut cache,
                                    &mut training,
                                    visibility,
                                    &pixel,
                                    &mut reservoir,
                                );

                                reservoir.write(reservoirs, idx);
                                diffuse[idx] = out.diffuse;
                                specular[idx] = out.specular;
                                stats.record(out.outcome);
                            }
                        }
                    }

                    stats
                })
                .reduce(FrameStats::default, FrameStats::merge)
        });

        log::debug!("Frame {} rendered; {stats:?}", self.frame.get());

        self.frame = self.frame.next();

        Ok(stats)
    }
}

fn check_len(name: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::BufferSizeMismatch {
            name,
            expected,
            actual,
        })
    }
}
