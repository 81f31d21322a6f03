use std::mem;

use glam::{UVec3, Vec4};
use log::debug;

use super::Bindable;

const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

/// GPU-side copy of a lookup table.
#[derive(Debug)]
pub struct LutTexture {
    label: String,
    size: UVec3,
    dimension: wgpu::TextureDimension,
    tex: wgpu::Texture,
    tex_view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    version: Option<u64>,
}

impl LutTexture {
    pub fn new(
        device: &wgpu::Device,
        label: impl AsRef<str>,
        size: UVec3,
        dimension: wgpu::TextureDimension,
    ) -> Self {
        let label = label.as_ref();

        debug!("Allocating texture `{label}`; size={size}");

        assert!(size.x > 0);
        assert!(size.y > 0);
        assert!(size.z > 0);

        let tex = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&format!("{label}_tex")),
            size: extent(size),
            mip_level_count: 1,
            sample_count: 1,
            dimension,
            format: FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let tex_view = tex.create_view(&Default::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{label}_sampler")),
            ..Default::default()
        });

        Self {
            label: label.to_owned(),
            size,
            dimension,
            tex,
            tex_view,
            sampler,
            version: None,
        }
    }

    pub fn size(&self) -> UVec3 {
        self.size
    }

    /// Uploads given texels, unless the same version has been uploaded
    /// already; reallocates the texture first if its size doesn't match.
    pub fn write(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        size: UVec3,
        version: u64,
        data: &[Vec4],
    ) {
        match Upload::plan(self.size, self.version, size, version) {
            Upload::Skip => return,
            Upload::Write => (),
            Upload::Reallocate => {
                *self = Self::new(device, &self.label, size, self.dimension);
            }
        }

        let bytes_per_row = size.x * mem::size_of::<Vec4>() as u32;

        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.tex,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(data),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(size.y),
            },
            extent(size),
        );

        self.version = Some(version);
    }

    pub fn readable(&self) -> ReadableLutTexture {
        ReadableLutTexture { parent: self }
    }
}

/// What [`LutTexture::write()`] has to do to bring the texture up to date.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Upload {
    /// Texture already holds this version.
    Skip,

    /// Texture has the right size, but holds stale texels.
    Write,

    /// Texture has to be allocated again before its texels get written.
    Reallocate,
}

impl Upload {
    fn plan(
        current_size: UVec3,
        current_version: Option<u64>,
        size: UVec3,
        version: u64,
    ) -> Self {
        if size != current_size {
            Self::Reallocate
        } else if current_version == Some(version) {
            Self::Skip
        } else {
            Self::Write
        }
    }
}

fn extent(size: UVec3) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: size.x,
        height: size.y,
        depth_or_array_layers: size.z,
    }
}

pub struct ReadableLutTexture<'a> {
    parent: &'a LutTexture,
}

impl Bindable for ReadableLutTexture<'_> {
    fn bind(
        &self,
        binding: u32,
    ) -> Vec<(wgpu::BindGroupLayoutEntry, wgpu::BindingResource)> {
        let view_dimension = match self.parent.dimension {
            wgpu::TextureDimension::D3 => wgpu::TextureViewDimension::D3,
            _ => wgpu::TextureViewDimension::D2,
        };

        let tex_layout = wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT
                | wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Texture {
                multisampled: false,
                view_dimension,
                sample_type: wgpu::TextureSampleType::Float {
                    filterable: false,
                },
            },
            count: None,
        };

        let sampler_layout = wgpu::BindGroupLayoutEntry {
            binding: binding + 1,
            visibility: wgpu::ShaderStages::FRAGMENT
                | wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Sampler(
                wgpu::SamplerBindingType::NonFiltering,
            ),
            count: None,
        };

        let tex_resource =
            wgpu::BindingResource::TextureView(&self.parent.tex_view);

        let sampler_resource =
            wgpu::BindingResource::Sampler(&self.parent.sampler);

        vec![
            (tex_layout, tex_resource),
            (sampler_layout, sampler_resource),
        ]
    }
}
