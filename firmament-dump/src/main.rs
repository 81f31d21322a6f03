//! Renders a single frame on the CPU and dumps all lookup tables as PNGs.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use firmament::{Camera, CpuContext, Engine, Frame, Settings};
use glam::{vec3, UVec2, Vec3, Vec4};
use log::info;

#[derive(Parser, Debug)]
#[command(name = "firmament-dump", about = "Dumps atmosphere lookup tables")]
struct Args {
    /// Directory containing `firmament.ron`; created with default settings if
    /// it doesn't exist yet.
    #[arg(long, default_value = ".")]
    settings: PathBuf,

    /// Directory the images get written into.
    #[arg(long, default_value = "out")]
    output: PathBuf,

    /// Sun's altitude above the horizon, in degrees (overrides settings).
    #[arg(long)]
    sun_angle: Option<f32>,

    /// Observer's height above the ground, in meters.
    #[arg(long, default_value_t = 200.0)]
    eye_height: f32,

    /// Multiplier applied to radiance before tonemapping.
    #[arg(long, default_value_t = 1.0)]
    exposure: f32,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .init();

    let args = Args::parse();

    let mut settings = Settings::load_or_create(&args.settings)
        .context("Couldn't load settings")?;

    if let Some(angle) = args.sun_angle {
        settings.sun.angle_deg = angle;
    }

    let world_scale = settings.world_scale.max(f32::EPSILON);
    let mut engine = Engine::new(settings)?;
    let mut ctx = CpuContext::new();

    let camera = Camera::perspective(
        vec3(0.0, args.eye_height / world_scale, 0.0),
        Vec3::X,
        60.0,
        16.0 / 9.0,
    );

    let stages = engine.render(&mut ctx, &Frame::new(&camera))?;

    info!("Rendered stages: {stages:?}");

    fs::create_dir_all(&args.output).with_context(|| {
        format!("Couldn't create `{}`", args.output.display())
    })?;

    let lut = engine.transmittance_lut();

    write(&args.output, "transmittance", lut.size(), lut.data(), |texel| {
        texel.truncate()
    })?;

    let lut = engine.multi_scattering_lut();

    // Multiple scattering is tiny compared to everything else, so it gets
    // brightened a bit more
    write(&args.output, "multi_scattering", lut.size(), lut.data(), |texel| {
        tonemap(texel.truncate() * 50.0, args.exposure)
    })?;

    let lut = engine.sky_view_lut();

    write(&args.output, "sky_view", lut.size(), lut.data(), |texel| {
        tonemap(texel.truncate(), args.exposure)
    })?;

    let lut = engine.aerial_perspective_lut();
    let size = lut.size();

    for z in 0..size.z {
        write(
            &args.output,
            &format!("aerial_perspective_slice_{z}"),
            size.truncate(),
            &lut.slice(z),
            |texel| tonemap(texel.truncate(), args.exposure),
        )?;
    }

    info!("Images written into `{}`", args.output.display());

    Ok(())
}

fn tonemap(color: Vec3, exposure: f32) -> Vec3 {
    Vec3::ONE - (-color * exposure).exp()
}

fn write(
    dir: &Path,
    name: &str,
    size: UVec2,
    data: &[Vec4],
    color: impl Fn(Vec4) -> Vec3,
) -> Result<()> {
    let path = dir.join(format!("{name}.png"));

    let img = image::RgbImage::from_fn(size.x, size.y, |x, y| {
        let texel = data[(y * size.x + x) as usize];
        let color = color(texel).clamp(Vec3::ZERO, Vec3::ONE).powf(1.0 / 2.2);
        let color = (color * 255.0).round();

        image::Rgb([color.x as u8, color.y as u8, color.z as u8])
    });

    img.save(&path)
        .with_context(|| format!("Couldn't write `{}`", path.display()))?;

    Ok(())
}
