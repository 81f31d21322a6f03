use log::debug;

use crate::{
    gpu, shaders, Camera, ExecutionContext, Lut2d, Lut3d, Result, Settings,
    ShadowMap, Stage, Sun,
};

#[derive(Debug)]
pub struct AerialPerspectivePass {
    lut: Lut3d,
}

impl AerialPerspectivePass {
    pub const LABEL: &'static str = Stage::AerialPerspective.label();

    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self {
            lut: Lut3d::new(
                Self::LABEL,
                settings.aerial_perspective.resolution,
            )?,
        })
    }

    pub fn lut(&self) -> &Lut3d {
        &self.lut
    }

    pub fn resize(&mut self, settings: &Settings) -> Result<bool> {
        self.lut.resize(settings.aerial_perspective.resolution)
    }

    pub fn params(
        settings: &Settings,
        sun: &Sun,
        camera: &Camera,
        has_shadow: bool,
    ) -> gpu::AerialPerspectivePassParams {
        let ap = &settings.aerial_perspective;

        gpu::AerialPerspectivePassParams {
            frustum: camera.frustum(),
            camera_position: camera.position(),
            world_scale: settings.world_scale,
            sun_direction: sun.direction(),
            sun_radiance: sun.radiance(),
            max_distance: ap.max_distance,
            steps_per_slice: ap.steps_per_slice,
            distribution: ap.distribution as u32,
            multi_scattering_enabled: settings.multi_scattering.enabled as u32,
            shadow_enabled: (settings.shadow_enabled && has_shadow) as u32,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn run(
        &mut self,
        ctx: &mut dyn ExecutionContext,
        atmosphere: &gpu::AtmosphereProperties,
        settings: &Settings,
        sun: &Sun,
        camera: &Camera,
        shadow: Option<&ShadowMap>,
        transmittance: &Lut2d,
        multi_scattering: &Lut2d,
    ) -> Result<()> {
        debug!("Running pass: {}", Self::LABEL);

        let params = Self::params(settings, sun, camera, shadow.is_some());
        let size = self.lut.size();
        let shadow = shadow.map(|shadow| shadow.view());
        let transmittance =
            gpu::TransmittanceLutView::new(transmittance.view());

        let multi_scattering =
            gpu::MultiScatteringLutView::new(multi_scattering.view());

        let data =
            ctx.dispatch_3d_columns(Self::LABEL, size, &|column, out| {
                shaders::aerial_perspective::main(
                    column,
                    size,
                    atmosphere,
                    &params,
                    transmittance,
                    multi_scattering,
                    shadow,
                    out,
                )
            })?;

        self.lut.replace(data)
    }
}
