use crate::{Engine, LutTexture};

/// Lookup tables uploaded into textures, for renderers that sample them on
/// the GPU.
#[derive(Debug)]
pub struct GpuLuts {
    pub transmittance: LutTexture,
    pub multi_scattering: LutTexture,
    pub sky_view: LutTexture,
    pub aerial_perspective: LutTexture,
}

impl GpuLuts {
    pub fn new(device: &wgpu::Device, engine: &Engine) -> Self {
        let d2 = wgpu::TextureDimension::D2;
        let d3 = wgpu::TextureDimension::D3;

        Self {
            transmittance: LutTexture::new(
                device,
                "firmament_transmittance",
                engine.transmittance_lut().size().extend(1),
                d2,
            ),
            multi_scattering: LutTexture::new(
                device,
                "firmament_multi_scattering",
                engine.multi_scattering_lut().size().extend(1),
                d2,
            ),
            sky_view: LutTexture::new(
                device,
                "firmament_sky_view",
                engine.sky_view_lut().size().extend(1),
                d2,
            ),
            aerial_perspective: LutTexture::new(
                device,
                "firmament_aerial_perspective",
                engine.aerial_perspective_lut().size(),
                d3,
            ),
        }
    }

    /// Uploads tables that have changed since the last call.
    pub fn write(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        engine: &Engine,
    ) {
        for (tex, lut) in [
            (&mut self.transmittance, engine.transmittance_lut()),
            (&mut self.multi_scattering, engine.multi_scattering_lut()),
            (&mut self.sky_view, engine.sky_view_lut()),
        ] {
            tex.write(
                device,
                queue,
                lut.size().extend(1),
                lut.version(),
                lut.data(),
            );
        }

        let lut = engine.aerial_perspective_lut();

        self.aerial_perspective.write(
            device,
            queue,
            lut.size(),
            lut.version(),
            lut.data(),
        );
    }
}
