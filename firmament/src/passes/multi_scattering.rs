use log::debug;

use crate::{
    gpu, shaders, DirectionSet, ExecutionContext, Lut2d, Result, Settings,
    Stage,
};

#[derive(Debug)]
pub struct MultiScatteringPass {
    lut: Lut2d,
}

impl MultiScatteringPass {
    pub const LABEL: &'static str = Stage::MultiScattering.label();

    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self {
            lut: Lut2d::new(Self::LABEL, settings.multi_scattering.resolution)?,
        })
    }

    pub fn lut(&self) -> &Lut2d {
        &self.lut
    }

    pub fn resize(&mut self, settings: &Settings) -> Result<bool> {
        self.lut.resize(settings.multi_scattering.resolution)
    }

    pub fn params(settings: &Settings) -> gpu::MultiScatteringPassParams {
        gpu::MultiScatteringPassParams {
            ground_albedo: settings.multi_scattering.ground_albedo,
            steps: settings.multi_scattering.steps,
        }
    }

    /// Recomputes the table.
    ///
    /// Note that this runs even if multiple scattering is disabled, because
    /// the flag gets checked by the per-frame stages; this way toggling it
    /// doesn't need any recomputation.
    pub fn run(
        &mut self,
        ctx: &mut dyn ExecutionContext,
        atmosphere: &gpu::AtmosphereProperties,
        settings: &Settings,
        transmittance: &Lut2d,
        directions: &DirectionSet,
    ) -> Result<()> {
        debug!(
            "Running pass: {}; directions={}",
            Self::LABEL,
            directions.count()
        );

        let params = Self::params(settings);
        let size = self.lut.size();
        let transmittance =
            gpu::TransmittanceLutView::new(transmittance.view());

        let data = ctx.dispatch_2d(Self::LABEL, size, &|global_id| {
            shaders::multi_scattering::main(
                global_id,
                size,
                atmosphere,
                &params,
                transmittance,
                directions.directions(),
            )
        })?;

        self.lut.replace(data)
    }
}
