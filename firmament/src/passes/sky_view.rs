use log::debug;

use crate::{
    gpu, shaders, ExecutionContext, Lut2d, Result, Settings, Stage, Sun,
};

#[derive(Debug)]
pub struct SkyViewPass {
    lut: Lut2d,
}

impl SkyViewPass {
    pub const LABEL: &'static str = Stage::SkyView.label();

    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self {
            lut: Lut2d::new(Self::LABEL, settings.sky_view.resolution)?,
        })
    }

    pub fn lut(&self) -> &Lut2d {
        &self.lut
    }

    pub fn resize(&mut self, settings: &Settings) -> Result<bool> {
        self.lut.resize(settings.sky_view.resolution)
    }

    pub fn params(
        settings: &Settings,
        sun: &Sun,
        eye_height: f32,
    ) -> gpu::SkyViewPassParams {
        gpu::SkyViewPassParams {
            eye_height,
            sun_direction: sun.direction(),
            sun_radiance: sun.radiance(),
            low_res_steps: settings.sky_view.low_res_steps,
            high_res_steps: settings.sky_view.high_res_steps,
            high_res_band: settings.sky_view.high_res_band_deg.to_radians(),
            multi_scattering_enabled: settings.multi_scattering.enabled as u32,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn run(
        &mut self,
        ctx: &mut dyn ExecutionContext,
        atmosphere: &gpu::AtmosphereProperties,
        settings: &Settings,
        sun: &Sun,
        eye_height: f32,
        transmittance: &Lut2d,
        multi_scattering: &Lut2d,
    ) -> Result<()> {
        debug!("Running pass: {}; eye_height={eye_height}", Self::LABEL);

        let params = Self::params(settings, sun, eye_height);
        let size = self.lut.size();
        let transmittance =
            gpu::TransmittanceLutView::new(transmittance.view());

        let multi_scattering =
            gpu::MultiScatteringLutView::new(multi_scattering.view());

        let data = ctx.dispatch_2d(Self::LABEL, size, &|global_id| {
            shaders::sky_view::main(
                global_id,
                size,
                atmosphere,
                &params,
                transmittance,
                multi_scattering,
            )
        })?;

        self.lut.replace(data)
    }
}
