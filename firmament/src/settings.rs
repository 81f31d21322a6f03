//! User-facing configuration, persisted as RON.

use std::fs;
use std::io;
use std::path::Path;

use glam::{uvec2, uvec3, UVec2, UVec3, Vec3};
use log::info;
use serde::{Deserialize, Serialize};

use crate::{gpu, lut, Change, Error, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Atmosphere, in editor units (see [`gpu::AtmosphereProperties`]).
    pub atmosphere: gpu::AtmosphereProperties,
    pub sun: SunSettings,
    pub transmittance: TransmittanceSettings,
    pub multi_scattering: MultiScatteringSettings,
    pub sky_view: SkyViewSettings,
    pub aerial_perspective: AerialPerspectiveSettings,
    pub shadow_enabled: bool,

    /// How many atmosphere meters make up a single world unit.
    pub world_scale: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SunSettings {
    /// Sun's altitude above the horizon, in degrees.
    pub angle_deg: f32,
    pub intensity: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransmittanceSettings {
    pub resolution: UVec2,
    pub steps: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiScatteringSettings {
    pub enabled: bool,
    pub resolution: UVec2,
    pub direction_count: u32,
    pub steps: u32,
    pub ground_albedo: Vec3,

    /// Seed of the pool the sampled directions are picked from.
    pub seed: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkyViewSettings {
    pub resolution: UVec2,
    pub low_res_steps: u32,
    pub high_res_steps: u32,

    /// Angular distance from the horizon (in degrees) within which rays are
    /// marched with `high_res_steps`.
    pub high_res_band_deg: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AerialPerspectiveSettings {
    pub resolution: UVec3,

    /// Distance covered by the volume, in meters.
    pub max_distance: f32,
    pub steps_per_slice: u32,
    pub distribution: gpu::SliceDistribution,

    /// Maximum offset (in slices) applied when sampling the volume.
    pub jitter_radius: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            atmosphere: Default::default(),
            sun: Default::default(),
            transmittance: Default::default(),
            multi_scattering: Default::default(),
            sky_view: Default::default(),
            aerial_perspective: Default::default(),
            shadow_enabled: true,
            world_scale: 200.0,
        }
    }
}

impl Default for SunSettings {
    fn default() -> Self {
        Self {
            angle_deg: 18.0,
            intensity: 10.0,
        }
    }
}

impl Default for TransmittanceSettings {
    fn default() -> Self {
        Self {
            resolution: uvec2(256, 256),
            steps: 40,
        }
    }
}

impl Default for MultiScatteringSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            resolution: uvec2(256, 256),
            direction_count: 64,
            steps: 256,
            ground_albedo: Vec3::splat(0.3),
            seed: 0,
        }
    }
}

impl Default for SkyViewSettings {
    fn default() -> Self {
        Self {
            resolution: uvec2(128, 128),
            low_res_steps: 128,
            high_res_steps: 128,
            high_res_band_deg: 20.0,
        }
    }
}

impl Default for AerialPerspectiveSettings {
    fn default() -> Self {
        Self {
            resolution: uvec3(128, 128, 64),
            max_distance: 1000.0,
            steps_per_slice: 16,
            distribution: Default::default(),
            jitter_radius: 0.5,
        }
    }
}

impl Settings {
    pub const FILE_NAME: &'static str = "firmament.ron";

    /// Loads settings from given file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            fs::read_to_string(path).map_err(|source| Error::ReadSettings {
                path: path.to_owned(),
                source,
            })?;

        let this = ron::from_str(&contents).map_err(|source| {
            Error::ParseSettings {
                path: path.to_owned(),
                source,
            }
        })?;

        info!("Loaded settings from `{}`", path.display());

        Ok(this)
    }

    /// Saves settings into given file, creating its parent directories if
    /// needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        let write_err = |source: io::Error| Error::WriteSettings {
            path: path.to_owned(),
            source,
        };

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(write_err)?;
        }

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .enumerate_arrays(false);

        let contents = ron::ser::to_string_pretty(self, pretty)
            .map_err(Error::SerializeSettings)?;

        fs::write(path, contents).map_err(write_err)?;

        Ok(())
    }

    /// Loads settings from `firmament.ron` located in given directory, creating
    /// that file with default settings if it doesn't exist yet.
    pub fn load_or_create(dir: &Path) -> Result<Self> {
        let path = dir.join(Self::FILE_NAME);

        if path.exists() {
            Self::load(&path)
        } else {
            let this = Self::default();

            this.save(&path)?;

            info!("Created default settings at `{}`", path.display());

            Ok(this)
        }
    }

    /// Returns a copy of these settings with resolutions and step counts
    /// clamped to at least one.
    pub fn sanitized(mut self) -> Self {
        let clamp2 =
            |size: UVec2| lut::clamp_resolution(size.extend(1)).truncate();

        self.transmittance.resolution = clamp2(self.transmittance.resolution);
        self.transmittance.steps = self.transmittance.steps.max(1);

        self.multi_scattering.resolution =
            clamp2(self.multi_scattering.resolution);

        self.multi_scattering.direction_count =
            self.multi_scattering.direction_count.max(1);

        self.multi_scattering.steps = self.multi_scattering.steps.max(1);
        self.sky_view.resolution = clamp2(self.sky_view.resolution);
        self.sky_view.low_res_steps = self.sky_view.low_res_steps.max(1);
        self.sky_view.high_res_steps = self.sky_view.high_res_steps.max(1);

        self.aerial_perspective.resolution =
            lut::clamp_resolution(self.aerial_perspective.resolution);

        self.aerial_perspective.steps_per_slice =
            self.aerial_perspective.steps_per_slice.max(1);

        self
    }

    /// Returns edits that turn `self` into `other`.
    pub fn changes(&self, other: &Self) -> Vec<Change> {
        let mut changes = Vec::new();

        let mut check = |changed: bool, change: Change| {
            if changed {
                changes.push(change);
            }
        };

        check(self.atmosphere != other.atmosphere, Change::Atmosphere);
        check(self.sun != other.sun, Change::Sun);

        check(
            self.transmittance.resolution != other.transmittance.resolution,
            Change::TransmittanceResolution,
        );

        check(
            self.transmittance.steps != other.transmittance.steps,
            Change::TransmittanceSteps,
        );

        let (ms, other_ms) = (&self.multi_scattering, &other.multi_scattering);

        check(
            ms.enabled != other_ms.enabled,
            Change::MultiScatteringEnabled,
        );

        check(
            ms.resolution != other_ms.resolution,
            Change::MultiScatteringResolution,
        );

        check(ms.steps != other_ms.steps, Change::MultiScatteringSteps);

        check(
            ms.ground_albedo != other_ms.ground_albedo,
            Change::GroundAlbedo,
        );

        check(
            ms.direction_count != other_ms.direction_count
                || ms.seed != other_ms.seed,
            Change::DirectionSet,
        );

        check(
            self.sky_view.resolution != other.sky_view.resolution,
            Change::SkyViewResolution,
        );

        check(
            self.sky_view.low_res_steps != other.sky_view.low_res_steps
                || self.sky_view.high_res_steps
                    != other.sky_view.high_res_steps
                || self.sky_view.high_res_band_deg
                    != other.sky_view.high_res_band_deg,
            Change::SkyViewSteps,
        );

        let (ap, other_ap) =
            (&self.aerial_perspective, &other.aerial_perspective);

        check(
            ap.resolution != other_ap.resolution,
            Change::AerialPerspectiveResolution,
        );

        check(
            ap.max_distance != other_ap.max_distance
                || ap.steps_per_slice != other_ap.steps_per_slice
                || ap.distribution != other_ap.distribution,
            Change::AerialPerspectiveMarching,
        );

        check(
            ap.jitter_radius != other_ap.jitter_radius,
            Change::AerialPerspectiveJitter,
        );

        check(
            self.shadow_enabled != other.shadow_enabled,
            Change::ShadowEnabled,
        );

        check(self.world_scale != other.world_scale, Change::WorldScale);

        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let target = Settings::default();

        assert_eq!(gpu::AtmosphereProperties::EARTH, target.atmosphere);
        assert!(target.shadow_enabled);
        assert_eq!(200.0, target.world_scale);
        assert_eq!(64, target.multi_scattering.direction_count);
    }

    #[test]
    fn round_trip() {
        let mut settings = Settings::default();

        settings.sun.angle_deg = 5.0;
        settings.aerial_perspective.distribution =
            gpu::SliceDistribution::Exponential;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(Settings::FILE_NAME);

        settings.save(&path).unwrap();

        assert_eq!(settings, Settings::load(&path).unwrap());
    }

    #[test]
    fn load_or_create() {
        let dir = tempfile::tempdir().unwrap();
        let created = Settings::load_or_create(dir.path()).unwrap();

        assert_eq!(Settings::default(), created);
        assert!(dir.path().join(Settings::FILE_NAME).exists());

        let mut modified = created.clone();

        modified.world_scale = 50.0;
        modified.save(&dir.path().join(Settings::FILE_NAME)).unwrap();

        assert_eq!(modified, Settings::load_or_create(dir.path()).unwrap());
    }

    #[test]
    fn missing_fields_use_defaults() {
        let target: Settings =
            ron::from_str("(sun: (angle_deg: 45.0), shadow_enabled: false)")
                .unwrap();

        assert_eq!(45.0, target.sun.angle_deg);
        assert_eq!(10.0, target.sun.intensity);
        assert!(!target.shadow_enabled);
        assert_eq!(TransmittanceSettings::default(), target.transmittance);
    }

    #[test]
    fn invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(Settings::FILE_NAME);

        fs::write(&path, "{{ nope }}").unwrap();

        assert!(matches!(
            Settings::load(&path),
            Err(Error::ParseSettings { .. })
        ));

        assert!(matches!(
            Settings::load(&dir.path().join("missing.ron")),
            Err(Error::ReadSettings { .. })
        ));
    }

    #[test]
    fn sanitized() {
        let mut target = Settings::default();

        target.transmittance.resolution = uvec2(0, 16);
        target.aerial_perspective.resolution = uvec3(8, 0, 0);
        target.multi_scattering.steps = 0;

        let target = target.sanitized();

        assert_eq!(uvec2(1, 16), target.transmittance.resolution);
        assert_eq!(uvec3(8, 1, 1), target.aerial_perspective.resolution);
        assert_eq!(1, target.multi_scattering.steps);
    }

    #[test]
    fn changes() {
        let old = Settings::default();
        let mut new = old.clone();

        assert!(old.changes(&new).is_empty());

        new.atmosphere.scatter_mie = 1.0;
        new.multi_scattering.seed = 1;
        new.sun.angle_deg = 1.0;

        assert_eq!(
            vec![Change::Atmosphere, Change::Sun, Change::DirectionSet],
            old.changes(&new)
        );
    }
}
