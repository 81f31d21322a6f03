//! Precomputed atmospheric scattering.
//!
//! [`Engine`] owns four lookup tables (transmittance, multiple scattering, sky
//! view and aerial perspective) and keeps them up to date with the settings
//! and the camera, recomputing only what's actually been invalidated.

#![allow(clippy::len_without_is_empty)]

mod buffers;
mod camera;
mod context;
mod error;
mod gpu_luts;
mod graph;
mod lut;
mod noise;
mod passes;
mod settings;
mod shadow;
mod sun;
mod utils;

use derivative::Derivative;
use glam::{UVec2, UVec3, Vec3, Vec4};
use log::{debug, info};

pub use firmament_gpu as gpu;
pub use firmament_shaders as shaders;

pub use self::buffers::*;
pub use self::camera::*;
pub use self::context::*;
pub use self::error::*;
pub use self::gpu_luts::*;
pub use self::graph::*;
pub use self::lut::*;
pub use self::noise::*;
pub(crate) use self::passes::*;
pub use self::settings::*;
pub use self::shadow::*;
pub use self::sun::*;
pub use self::utils::SampleElimination;

/// Everything that changes from one frame to another.
#[derive(Clone, Copy, Debug)]
pub struct Frame<'a> {
    pub camera: &'a Camera,
    pub shadow: Option<&'a ShadowMap>,
}

impl<'a> Frame<'a> {
    pub fn new(camera: &'a Camera) -> Self {
        Self {
            camera,
            shadow: None,
        }
    }

    pub fn with_shadow(mut self, shadow: &'a ShadowMap) -> Self {
        self.shadow = Some(shadow);
        self
    }
}

#[derive(Derivative)]
#[derivative(Debug)]
pub struct Engine {
    settings: Settings,

    /// Atmosphere in standard units, i.e. the one all kernels work with.
    atmosphere: gpu::AtmosphereProperties,

    sun: Sun,
    graph: DirtyGraph,
    directions: DirectionSet,

    #[derivative(Debug = "ignore")]
    blue_noise: BlueNoise,

    passes: Passes,

    /// Observer's height (in meters) used by the most recent frame.
    eye_height: f32,
}

impl Engine {
    pub fn new(settings: Settings) -> Result<Self> {
        info!("Initializing");

        let settings = settings.sanitized();
        let ms = &settings.multi_scattering;

        Ok(Self {
            atmosphere: settings.atmosphere.to_std_unit(),
            sun: Sun::from_settings(&settings.sun),
            graph: DirtyGraph::new(),
            directions: DirectionSet::generate(ms.direction_count, ms.seed),
            blue_noise: BlueNoise::generate(ms.seed),
            passes: Passes::new(&settings)?,
            eye_height: 0.0,
            settings,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns atmosphere in standard units.
    pub fn atmosphere(&self) -> &gpu::AtmosphereProperties {
        &self.atmosphere
    }

    pub fn sun(&self) -> &Sun {
        &self.sun
    }

    pub fn dirty(&self) -> Dirty {
        self.graph.dirty()
    }

    pub fn directions(&self) -> &DirectionSet {
        &self.directions
    }

    pub fn blue_noise(&self) -> &BlueNoise {
        &self.blue_noise
    }

    /// Replaces settings, invalidating whatever the difference affects.
    ///
    /// Resolutions and step counts are clamped to at least one; tables whose
    /// resolution has changed get reallocated right away.
    pub fn set_settings(&mut self, settings: Settings) -> Result<()> {
        let settings = settings.sanitized();
        let changes = self.settings.changes(&settings);

        if changes.is_empty() {
            return Ok(());
        }

        debug!("Settings changed: {changes:?}");

        // Tables reallocated before a failing one have to be recomputed too
        for &change in &changes {
            self.graph.mark(change);
        }

        if let Err(err) = self.passes.resize(&settings) {
            self.sync_resolutions();

            return Err(err);
        }

        if changes.contains(&Change::DirectionSet) {
            let ms = &settings.multi_scattering;

            self.directions =
                DirectionSet::generate(ms.direction_count, ms.seed);

            if ms.seed != self.settings.multi_scattering.seed {
                self.blue_noise = BlueNoise::generate(ms.seed);
            }
        }

        self.atmosphere = settings.atmosphere.to_std_unit();
        self.sun = Sun::from_settings(&settings.sun);
        self.settings = settings;

        Ok(())
    }

    /// Brings resolutions kept in settings in line with the tables' actual
    /// sizes, after some of the tables have failed to reallocate.
    fn sync_resolutions(&mut self) {
        let Passes {
            transmittance,
            multi_scattering,
            sky_view,
            aerial_perspective,
        } = &self.passes;

        self.settings.transmittance.resolution = transmittance.lut().size();
        self.settings.multi_scattering.resolution =
            multi_scattering.lut().size();
        self.settings.sky_view.resolution = sky_view.lut().size();
        self.settings.aerial_perspective.resolution =
            aerial_perspective.lut().size();
    }

    /// Modifies settings in place; see [`Self::set_settings()`].
    pub fn update(&mut self, f: impl FnOnce(&mut Settings)) -> Result<()> {
        let mut settings = self.settings.clone();

        f(&mut settings);

        self.set_settings(settings)
    }

    /// Replaces atmosphere, given in editor units.
    pub fn set_atmosphere(
        &mut self,
        atmosphere: gpu::AtmosphereProperties,
    ) -> Result<()> {
        self.update(|settings| settings.atmosphere = atmosphere)
    }

    pub fn set_sun_angle(&mut self, angle_deg: f32) -> Result<()> {
        self.update(|settings| settings.sun.angle_deg = angle_deg)
    }

    pub fn set_transmittance_resolution(&mut self, size: UVec2) -> Result<()> {
        self.update(|settings| settings.transmittance.resolution = size)
    }

    pub fn set_multi_scattering_resolution(
        &mut self,
        size: UVec2,
    ) -> Result<()> {
        self.update(|settings| settings.multi_scattering.resolution = size)
    }

    pub fn set_sky_view_resolution(&mut self, size: UVec2) -> Result<()> {
        self.update(|settings| settings.sky_view.resolution = size)
    }

    pub fn set_aerial_perspective_resolution(
        &mut self,
        size: UVec3,
    ) -> Result<()> {
        self.update(|settings| settings.aerial_perspective.resolution = size)
    }

    /// Brings all tables up to date with given frame; returns stages that
    /// have been run, in the order they've been run.
    pub fn render(
        &mut self,
        ctx: &mut dyn ExecutionContext,
        frame: &Frame,
    ) -> Result<Vec<Stage>> {
        self.eye_height = frame.camera.position().y * self.settings.world_scale;

        let dirty = self.graph.dirty();
        let schedule = self.graph.resolve_dirty();

        if let Err(err) = self.run(ctx, frame, &schedule) {
            // Stages that didn't manage to finish must run again next time
            self.graph.restore(dirty);

            return Err(err);
        }

        Ok(schedule)
    }

    fn run(
        &mut self,
        ctx: &mut dyn ExecutionContext,
        frame: &Frame,
        schedule: &[Stage],
    ) -> Result<()> {
        let Passes {
            transmittance,
            multi_scattering,
            sky_view,
            aerial_perspective,
        } = &mut self.passes;

        let atmosphere = &self.atmosphere;
        let settings = &self.settings;

        for stage in schedule {
            match stage {
                Stage::Transmittance => {
                    transmittance.run(ctx, atmosphere, settings)?;
                }

                Stage::MultiScattering => {
                    multi_scattering.run(
                        ctx,
                        atmosphere,
                        settings,
                        transmittance.lut(),
                        &self.directions,
                    )?;
                }

                Stage::SkyView => {
                    sky_view.run(
                        ctx,
                        atmosphere,
                        settings,
                        &self.sun,
                        self.eye_height,
                        transmittance.lut(),
                        multi_scattering.lut(),
                    )?;
                }

                Stage::AerialPerspective => {
                    aerial_perspective.run(
                        ctx,
                        atmosphere,
                        settings,
                        &self.sun,
                        frame.camera,
                        frame.shadow,
                        transmittance.lut(),
                        multi_scattering.lut(),
                    )?;
                }
            }
        }

        Ok(())
    }

    pub fn transmittance_lut(&self) -> &Lut2d {
        self.passes.transmittance.lut()
    }

    pub fn multi_scattering_lut(&self) -> &Lut2d {
        self.passes.multi_scattering.lut()
    }

    pub fn sky_view_lut(&self) -> &Lut2d {
        self.passes.sky_view.lut()
    }

    pub fn aerial_perspective_lut(&self) -> &Lut3d {
        self.passes.aerial_perspective.lut()
    }

    pub fn transmittance(&self) -> gpu::TransmittanceLutView<'_> {
        gpu::TransmittanceLutView::new(self.transmittance_lut().view())
    }

    pub fn multi_scattering(&self) -> gpu::MultiScatteringLutView<'_> {
        gpu::MultiScatteringLutView::new(self.multi_scattering_lut().view())
    }

    pub fn sky_view(&self) -> gpu::SkyViewLutView<'_> {
        gpu::SkyViewLutView::new(self.sky_view_lut().view())
    }

    pub fn aerial_perspective(&self) -> gpu::AerialPerspectiveLutView<'_> {
        let ap = &self.settings.aerial_perspective;

        gpu::AerialPerspectiveLutView::new(
            self.aerial_perspective_lut().view(),
            ap.max_distance,
            ap.distribution,
        )
    }

    /// Returns sky radiance visible along given direction, as seen from the
    /// most recently rendered camera.
    pub fn sample_sky(&self, view_dir: Vec3) -> Vec3 {
        self.sky_view()
            .sample_direction(&self.atmosphere, view_dir, self.eye_height)
    }

    /// Returns in-scattered radiance and transmittance between the camera and
    /// a surface visible at given pixel of a `output_size`-sized screen, lying
    /// `distance` world units away from the camera.
    ///
    /// The looked-up slice is dithered with blue noise, which hides banding
    /// between slices.
    pub fn sample_aerial_perspective(
        &self,
        pixel: UVec2,
        output_size: UVec2,
        distance: f32,
    ) -> Vec4 {
        let output_size = output_size.max(UVec2::ONE);
        let screen_uv = (pixel.as_vec2() + 0.5) / output_size.as_vec2();

        let jitter = self.blue_noise.jitter(
            pixel,
            output_size,
            self.settings.aerial_perspective.jitter_radius,
        );

        self.aerial_perspective().sample_jittered(
            screen_uv,
            distance * self.settings.world_scale,
            jitter,
        )
    }

    /// Returns radiance of sun's disk, as seen from the most recently
    /// rendered camera.
    pub fn sun_disk_radiance(&self) -> Vec3 {
        self.sun.disk_radiance(
            &self.atmosphere,
            self.transmittance(),
            self.eye_height,
        )
    }
}

#[cfg(test)]
mod tests {
    use glam::{uvec2, uvec3, vec3};

    use super::*;

    fn settings() -> Settings {
        let mut settings = Settings::default();

        settings.transmittance.resolution = uvec2(32, 16);
        settings.transmittance.steps = 20;
        settings.multi_scattering.resolution = uvec2(8, 8);
        settings.multi_scattering.direction_count = 16;
        settings.multi_scattering.steps = 20;
        settings.sky_view.resolution = uvec2(16, 16);
        settings.sky_view.low_res_steps = 16;
        settings.sky_view.high_res_steps = 16;
        settings.aerial_perspective.resolution = uvec3(4, 4, 8);
        settings.aerial_perspective.steps_per_slice = 2;
        settings
    }

    fn camera(height: f32) -> Camera {
        Camera::perspective(vec3(0.0, height, 0.0), Vec3::X, 60.0, 1.0)
    }

    fn labels(ctx: &mut CpuContext) -> Vec<&'static str> {
        ctx.take_submissions()
            .into_iter()
            .map(|submission| submission.label)
            .collect()
    }

    #[test]
    fn first_frame_runs_every_stage() {
        let mut target = Engine::new(settings()).unwrap();
        let mut ctx = CpuContext::new();
        let camera = camera(1.0);

        let schedule = target.render(&mut ctx, &Frame::new(&camera)).unwrap();

        assert_eq!(Stage::ALL.to_vec(), schedule);

        assert_eq!(
            vec![
                "transmittance",
                "multi_scattering",
                "sky_view",
                "aerial_perspective"
            ],
            labels(&mut ctx)
        );

        assert_eq!(Dirty::empty(), target.dirty());
    }

    #[test]
    fn moving_camera_keeps_cached_tables() {
        let mut target = Engine::new(settings()).unwrap();
        let mut ctx = CpuContext::new();

        let camera_a = camera(1.0);
        let camera_b = camera(5.0);

        target.render(&mut ctx, &Frame::new(&camera_a)).unwrap();
        ctx.take_submissions();

        let transmittance = target.transmittance_lut().snapshot();
        let multi_scattering = target.multi_scattering_lut().snapshot();
        let sky_view = target.sky_view_lut().snapshot();
        let aerial_perspective = target.aerial_perspective_lut().snapshot();
        let transmittance_version = target.transmittance_lut().version();

        target.render(&mut ctx, &Frame::new(&camera_b)).unwrap();

        assert_eq!(vec!["sky_view", "aerial_perspective"], labels(&mut ctx));

        assert_eq!(transmittance_version, target.transmittance_lut().version());
        assert_eq!(&*transmittance, target.transmittance_lut().data());
        assert_eq!(&*multi_scattering, target.multi_scattering_lut().data());
        assert_ne!(&*sky_view, target.sky_view_lut().data());

        assert_ne!(
            &*aerial_perspective,
            target.aerial_perspective_lut().data()
        );
    }

    #[test]
    fn settings_invalidate_their_stages() {
        let mut target = Engine::new(settings()).unwrap();
        let mut ctx = CpuContext::new();
        let camera = camera(1.0);
        let frame = Frame::new(&camera);

        target.render(&mut ctx, &frame).unwrap();
        ctx.take_submissions();

        // Sun is consumed only by the per-frame stages
        target.set_sun_angle(45.0).unwrap();
        target.render(&mut ctx, &frame).unwrap();

        assert_eq!(vec!["sky_view", "aerial_perspective"], labels(&mut ctx));

        // Ground albedo is consumed only by the multiple-scattering stage
        target
            .update(|settings| {
                settings.multi_scattering.ground_albedo = Vec3::splat(0.5);
            })
            .unwrap();

        target.render(&mut ctx, &frame).unwrap();

        assert_eq!(
            vec!["multi_scattering", "sky_view", "aerial_perspective"],
            labels(&mut ctx)
        );

        // Atmosphere invalidates everything
        let mut atmosphere = gpu::AtmosphereProperties::EARTH;

        atmosphere.scatter_mie *= 2.0;

        target.set_atmosphere(atmosphere).unwrap();
        target.render(&mut ctx, &frame).unwrap();

        assert_eq!(
            vec![
                "transmittance",
                "multi_scattering",
                "sky_view",
                "aerial_perspective"
            ],
            labels(&mut ctx)
        );

        // Setting the same values again doesn't invalidate anything
        target.set_atmosphere(atmosphere).unwrap();

        assert_eq!(Dirty::empty(), target.dirty());
    }

    #[test]
    fn direction_set_follows_settings() {
        let mut target = Engine::new(settings()).unwrap();

        assert_eq!(16, target.directions().count());

        target
            .update(|settings| {
                settings.multi_scattering.direction_count = 8;
            })
            .unwrap();

        assert_eq!(8, target.directions().count());
        assert_eq!(Dirty::MULTI_SCATTERING, target.dirty());
    }

    #[test]
    fn resolutions_are_clamped() {
        let mut target = Engine::new(settings()).unwrap();
        let mut ctx = CpuContext::new();
        let camera = camera(1.0);

        target.set_transmittance_resolution(uvec2(0, 0)).unwrap();
        target.set_multi_scattering_resolution(uvec2(4, 0)).unwrap();
        target.set_sky_view_resolution(uvec2(0, 4)).unwrap();

        target
            .set_aerial_perspective_resolution(uvec3(0, 2, 0))
            .unwrap();

        assert_eq!(uvec2(1, 1), target.transmittance_lut().size());
        assert_eq!(uvec2(4, 1), target.multi_scattering_lut().size());
        assert_eq!(uvec2(1, 4), target.sky_view_lut().size());
        assert_eq!(uvec3(1, 2, 1), target.aerial_perspective_lut().size());
        assert_eq!(uvec2(1, 1), target.settings().transmittance.resolution);

        target.render(&mut ctx, &Frame::new(&camera)).unwrap();

        assert_eq!(2, target.aerial_perspective_lut().data().len());
    }

    #[test]
    fn red_is_transmitted_more_than_blue() {
        let mut settings = settings();

        settings.transmittance.resolution = uvec2(256, 256);
        settings.transmittance.steps = 40;
        settings.multi_scattering.resolution = uvec2(256, 256);
        settings.multi_scattering.direction_count = 4;
        settings.multi_scattering.steps = 4;

        let mut target = Engine::new(settings).unwrap();
        let camera = camera(1.0);

        target
            .render(&mut CpuContext::new(), &Frame::new(&camera))
            .unwrap();

        let atmosphere = *target.atmosphere();
        let r = atmosphere.planet_radius + 100.0;

        for mu in [1.0, 0.2, 0.05] {
            let actual = target.transmittance().sample(&atmosphere, r, mu);

            assert!(actual.x > actual.z, "mu={mu}, actual={actual}");
        }

        let lut = target.multi_scattering_lut();

        assert_eq!(uvec2(256, 256), lut.size());

        assert!(lut
            .data()
            .iter()
            .all(|texel| texel.is_finite() && texel.cmpge(Vec4::ZERO).all()));

        assert!(lut.data().iter().any(|texel| texel.x > 0.0));
    }

    #[test]
    fn failed_resize_keeps_tables_consistent() {
        let mut target = Engine::new(settings()).unwrap();
        let mut ctx = CpuContext::new();
        let camera = camera(1.0);
        let frame = Frame::new(&camera);

        target.render(&mut ctx, &frame).unwrap();
        ctx.take_submissions();

        // Transmittance gets reallocated, but aerial perspective doesn't fit
        // into memory
        let err = target
            .update(|settings| {
                settings.transmittance.resolution = uvec2(8, 8);
                settings.aerial_perspective.resolution = UVec3::splat(u32::MAX);
            })
            .unwrap_err();

        assert!(matches!(err, Error::Allocation { .. }));
        assert!(target.dirty().contains(Dirty::TRANSMITTANCE));

        assert_eq!(uvec2(8, 8), target.transmittance_lut().size());
        assert_eq!(uvec2(8, 8), target.settings().transmittance.resolution);

        assert_eq!(
            uvec3(4, 4, 8),
            target.settings().aerial_perspective.resolution
        );

        assert_eq!(uvec3(4, 4, 8), target.aerial_perspective_lut().size());

        let schedule = target.render(&mut ctx, &frame).unwrap();

        assert_eq!(Stage::ALL.to_vec(), schedule);

        assert!(target
            .transmittance_lut()
            .data()
            .iter()
            .any(|texel| texel.x > 0.0));

        // Once the resolution fits, aerial perspective gets reallocated too
        target
            .update(|settings| {
                settings.aerial_perspective.resolution = uvec3(2, 2, 4);
            })
            .unwrap();

        assert_eq!(uvec3(2, 2, 4), target.aerial_perspective_lut().size());
    }

    #[test]
    fn blue_noise_follows_seed() {
        fn values(engine: &Engine) -> Vec<f32> {
            let size = BlueNoise::SIZE;

            (0..size)
                .flat_map(|y| (0..size).map(move |x| uvec2(x, y)))
                .map(|pixel| engine.blue_noise().get(pixel))
                .collect()
        }

        let mut target = Engine::new(settings()).unwrap();
        let old = values(&target);

        target
            .update(|settings| {
                settings.multi_scattering.seed = 7;
            })
            .unwrap();

        let expected = {
            let mut settings = settings();

            settings.multi_scattering.seed = 7;

            Engine::new(settings).unwrap()
        };

        assert_eq!(values(&expected), values(&target));
        assert_ne!(old, values(&target));
    }

    #[test]
    fn single_texel_shadow_map() {
        let mut target = Engine::new(settings()).unwrap();
        let camera = camera(1.0);
        let view_proj = ShadowMap::light_view_proj(target.sun().direction());
        let shadow = ShadowMap::empty(uvec2(0, 0), view_proj);

        assert_eq!(uvec2(1, 1), shadow.size());

        target
            .render(
                &mut CpuContext::new(),
                &Frame::new(&camera).with_shadow(&shadow),
            )
            .unwrap();

        assert!(target
            .aerial_perspective_lut()
            .data()
            .iter()
            .all(|texel| texel.is_finite()));
    }

    #[test]
    fn transmittance_decreases_with_path_length() {
        let mut target = Engine::new(settings()).unwrap();
        let camera = camera(1.0);

        target
            .render(&mut CpuContext::new(), &Frame::new(&camera))
            .unwrap();

        let atmosphere = *target.atmosphere();
        let transmittance = target.transmittance();

        for height in [100.0, 5_000.0, 30_000.0] {
            let r = atmosphere.planet_radius + height;

            // Lower angles make for longer paths through the atmosphere
            let values: Vec<_> = [1.0, 0.6, 0.3, 0.1, 0.0]
                .into_iter()
                .map(|mu| transmittance.sample(&atmosphere, r, mu))
                .collect();

            for pair in values.windows(2) {
                assert!(
                    pair[1].cmple(pair[0]).all(),
                    "height={height}, values={values:?}"
                );
            }
        }

        // Near the outer boundary there's (almost) nothing left to pass
        // through
        for mu in [1.0, 0.5, 0.1] {
            let r = atmosphere.atmosphere_radius;
            let actual = transmittance.sample(&atmosphere, r, mu);

            assert!(actual.cmpgt(Vec3::splat(0.99)).all(), "mu={mu}");
        }
    }

    #[test]
    fn zero_scattering_makes_for_black_sky() {
        let mut settings = settings();

        settings.atmosphere.scatter_rayleigh = Vec3::ZERO;
        settings.atmosphere.scatter_mie = 0.0;

        let mut target = Engine::new(settings).unwrap();
        let camera = camera(1.0);

        target
            .render(&mut CpuContext::new(), &Frame::new(&camera))
            .unwrap();

        for texel in target.sky_view_lut().data() {
            assert_eq!(Vec3::ZERO, texel.truncate());
        }

        // Sun itself remains visible
        assert!(target.sun_disk_radiance().cmpgt(Vec3::ZERO).all());
    }

    #[test]
    fn aerial_perspective_transmittance() {
        let mut target = Engine::new(settings()).unwrap();
        let camera = camera(1.0);

        target
            .render(&mut CpuContext::new(), &Frame::new(&camera))
            .unwrap();

        let lut = target.aerial_perspective_lut();
        let view = lut.view();
        let size = lut.size();

        for y in 0..size.y {
            for x in 0..size.x {
                let mut prev = 1.0;

                for z in 0..size.z {
                    let t = view.get(uvec3(x, y, z)).w;

                    assert!((0.0..=1.0).contains(&t));
                    assert!(t <= prev);

                    prev = t;
                }
            }
        }

        let sample = target.sample_aerial_perspective(
            uvec2(10, 20),
            uvec2(64, 48),
            2.0,
        );

        assert!(sample.w > 0.0 && sample.w <= 1.0);
        assert!(sample.truncate().cmpge(Vec3::ZERO).all());
    }

    #[test]
    fn sky_and_sun() {
        let mut target = Engine::new(settings()).unwrap();
        let camera = camera(1.0);

        target
            .render(&mut CpuContext::new(), &Frame::new(&camera))
            .unwrap();

        let up = target.sample_sky(Vec3::Y);

        assert!(up.z > up.x, "up={up}");
        assert!(target.sun_disk_radiance().cmpgt(Vec3::ZERO).all());

        // Once the sun sets, its disk gets hidden behind the planet
        target.set_sun_angle(-10.0).unwrap();

        assert_eq!(Vec3::ZERO, target.sun_disk_radiance());
    }
}
