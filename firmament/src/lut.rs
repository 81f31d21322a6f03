use std::sync::Arc;

use derivative::Derivative;
use glam::{uvec3, UVec2, UVec3, Vec4};
use log::debug;

use crate::{gpu, Error, Result};

/// Allocates a zeroed buffer for `size` texels, reporting failures (including
/// size overflows) instead of aborting.
pub fn allocate(label: &'static str, size: UVec3) -> Result<Vec<Vec4>> {
    let err = || Error::Allocation { label, size };

    let len = (size.x as usize)
        .checked_mul(size.y as usize)
        .and_then(|len| len.checked_mul(size.z as usize))
        .ok_or_else(err)?;

    let mut data = Vec::new();

    data.try_reserve_exact(len).map_err(|_| err())?;
    data.resize(len, Vec4::ZERO);

    Ok(data)
}

/// Two-dimensional lookup table, produced by a single stage.
///
/// Contents are kept behind an [`Arc`], so whoever took a [`Self::snapshot()`]
/// keeps reading the old texels even after the table gets recomputed or
/// resized.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct Lut2d {
    label: &'static str,
    size: UVec2,

    #[derivative(Debug = "ignore")]
    data: Arc<[Vec4]>,

    version: u64,
}

impl Lut2d {
    pub fn new(label: &'static str, size: UVec2) -> Result<Self> {
        debug!("Allocating LUT `{label}`; size={size}");

        let data = allocate(label, size.extend(1))?;

        Ok(Self {
            label,
            size,
            data: data.into(),
            version: 0,
        })
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }

    /// Number incremented each time this table's contents change.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn data(&self) -> &[Vec4] {
        &self.data
    }

    pub fn snapshot(&self) -> Arc<[Vec4]> {
        self.data.clone()
    }

    pub fn view(&self) -> gpu::Lut2dView<'_> {
        gpu::Lut2dView::new(&self.data, self.size)
    }

    /// Discards current contents and reallocates this table, if its size
    /// differs from the given one; returns whether that happened.
    pub fn resize(&mut self, size: UVec2) -> Result<bool> {
        if size == self.size {
            return Ok(false);
        }

        let version = self.version;

        *self = Self::new(self.label, size)?;
        self.version = version + 1;

        Ok(true)
    }

    pub(crate) fn replace(&mut self, data: Vec<Vec4>) -> Result<()> {
        check_len(self.label, self.size.extend(1), &data)?;

        self.data = data.into();
        self.version += 1;

        Ok(())
    }
}

/// Three-dimensional counterpart of [`Lut2d`].
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct Lut3d {
    label: &'static str,
    size: UVec3,

    #[derivative(Debug = "ignore")]
    data: Arc<[Vec4]>,

    version: u64,
}

impl Lut3d {
    pub fn new(label: &'static str, size: UVec3) -> Result<Self> {
        debug!("Allocating LUT `{label}`; size={size}");

        let data = allocate(label, size)?;

        Ok(Self {
            label,
            size,
            data: data.into(),
            version: 0,
        })
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn size(&self) -> UVec3 {
        self.size
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn data(&self) -> &[Vec4] {
        &self.data
    }

    pub fn snapshot(&self) -> Arc<[Vec4]> {
        self.data.clone()
    }

    pub fn view(&self) -> gpu::Lut3dView<'_> {
        gpu::Lut3dView::new(&self.data, self.size)
    }

    /// Returns a copy of given depth slice.
    pub fn slice(&self, z: u32) -> Vec<Vec4> {
        let len = self.size.x as usize * self.size.y as usize;
        let offset = z.min(self.size.z - 1) as usize * len;

        self.data[offset..offset + len].to_vec()
    }

    pub fn resize(&mut self, size: UVec3) -> Result<bool> {
        if size == self.size {
            return Ok(false);
        }

        let version = self.version;

        *self = Self::new(self.label, size)?;
        self.version = version + 1;

        Ok(true)
    }

    pub(crate) fn replace(&mut self, data: Vec<Vec4>) -> Result<()> {
        check_len(self.label, self.size, &data)?;

        self.data = data.into();
        self.version += 1;

        Ok(())
    }
}

fn check_len(label: &'static str, size: UVec3, data: &[Vec4]) -> Result<()> {
    let expected = size.x as usize * size.y as usize * size.z as usize;

    if data.len() == expected {
        Ok(())
    } else {
        Err(Error::DispatchSize {
            label,
            expected,
            actual: data.len(),
        })
    }
}

/// Clamps each of resolution's dimensions to at least one texel.
pub fn clamp_resolution(size: UVec3) -> UVec3 {
    size.max(uvec3(1, 1, 1))
}
