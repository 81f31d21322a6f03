use log::debug;

use crate::{
    gpu, shaders, ExecutionContext, Lut2d, Result, Settings, Stage,
};

#[derive(Debug)]
pub struct TransmittancePass {
    lut: Lut2d,
}

impl TransmittancePass {
    pub const LABEL: &'static str = Stage::Transmittance.label();

    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self {
            lut: Lut2d::new(Self::LABEL, settings.transmittance.resolution)?,
        })
    }

    pub fn lut(&self) -> &Lut2d {
        &self.lut
    }

    pub fn resize(&mut self, settings: &Settings) -> Result<bool> {
        self.lut.resize(settings.transmittance.resolution)
    }

    pub fn params(settings: &Settings) -> gpu::TransmittancePassParams {
        gpu::TransmittancePassParams {
            steps: settings.transmittance.steps,
        }
    }

    pub fn run(
        &mut self,
        ctx: &mut dyn ExecutionContext,
        atmosphere: &gpu::AtmosphereProperties,
        settings: &Settings,
    ) -> Result<()> {
        debug!("Running pass: {}", Self::LABEL);

        let params = Self::params(settings);
        let size = self.lut.size();

        let data = ctx.dispatch_2d(Self::LABEL, size, &|global_id| {
            shaders::transmittance::main(global_id, size, atmosphere, &params)
        })?;

        self.lut.replace(data)
    }
}
