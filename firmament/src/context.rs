use glam::{uvec2, UVec2, UVec3, Vec4};
use log::debug;
use rayon::prelude::*;

use crate::{lut, utils, Result};

pub type Kernel2d<'a> = dyn Fn(UVec2) -> Vec4 + Sync + 'a;
pub type ColumnKernel<'a> = dyn Fn(UVec2, &mut [Vec4]) + Sync + 'a;

/// Something that's able to run stages' kernels.
///
/// Dispatches are executed in the order they're submitted and each of them is
/// complete by the time it returns, so a stage can freely read whatever the
/// previous stages have produced.
pub trait ExecutionContext {
    /// Runs `kernel` for each texel of a `size`-sized table; returns texels
    /// laid out row by row.
    fn dispatch_2d(
        &mut self,
        label: &'static str,
        size: UVec2,
        kernel: &Kernel2d<'_>,
    ) -> Result<Vec<Vec4>>;

    /// Runs `kernel` for each `(x, y)` column of a `size`-sized volume, giving
    /// it a buffer of `size.z` texels to fill; returns texels laid out slice by
    /// slice, the same way [`firmament_gpu::Lut3dView`] expects them.
    fn dispatch_3d_columns(
        &mut self,
        label: &'static str,
        size: UVec3,
        kernel: &ColumnKernel<'_>,
    ) -> Result<Vec<Vec4>>;
}

/// Dispatch recorded by [`CpuContext`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submission {
    pub label: &'static str,
    pub size: UVec3,
}

/// Execution context running kernels on the CPU.
#[derive(Debug, Default)]
pub struct CpuContext {
    serial: bool,
    submissions: Vec<Submission>,
}

impl CpuContext {
    pub fn new() -> Self {
        Default::default()
    }

    /// Runs kernels on the current thread instead of rayon's pool.
    pub fn serial() -> Self {
        Self {
            serial: true,
            ..Default::default()
        }
    }

    /// Returns all dispatches submitted so far, oldest first.
    pub fn submissions(&self) -> &[Submission] {
        &self.submissions
    }

    pub fn take_submissions(&mut self) -> Vec<Submission> {
        std::mem::take(&mut self.submissions)
    }

    fn submit(&mut self, label: &'static str, size: UVec3) {
        debug!("Dispatching `{label}`; size={size}");

        self.submissions.push(Submission { label, size });
    }
}

impl ExecutionContext for CpuContext {
    fn dispatch_2d(
        &mut self,
        label: &'static str,
        size: UVec2,
        kernel: &Kernel2d<'_>,
    ) -> Result<Vec<Vec4>> {
        self.submit(label, size.extend(1));

        let mut out = lut::allocate(label, size.extend(1))?;
        let width = size.x.max(1) as usize;

        let eval = |(idx, texel): (usize, &mut Vec4)| {
            *texel = kernel(uvec2((idx % width) as u32, (idx / width) as u32));
        };

        utils::measure(label, || {
            if self.serial {
                out.iter_mut().enumerate().for_each(eval);
            } else {
                out.par_iter_mut().enumerate().for_each(eval);
            }
        });

        Ok(out)
    }

    fn dispatch_3d_columns(
        &mut self,
        label: &'static str,
        size: UVec3,
        kernel: &ColumnKernel<'_>,
    ) -> Result<Vec<Vec4>> {
        self.submit(label, size);

        // Kernels fill whole columns at once, so we first gather texels
        // column by column and then transpose them into the slice-by-slice
        // layout
        let mut columns = lut::allocate(label, size)?;
        let mut out = lut::allocate(label, size)?;

        if columns.is_empty() {
            return Ok(out);
        }

        let width = size.x as usize;
        let depth = size.z as usize;

        let eval = |(idx, column): (usize, &mut [Vec4])| {
            kernel(uvec2((idx % width) as u32, (idx / width) as u32), column);
        };

        utils::measure(label, || {
            if self.serial {
                columns.chunks_mut(depth).enumerate().for_each(eval);
            } else {
                columns.par_chunks_mut(depth).enumerate().for_each(eval);
            }
        });

        let slice_len = width * size.y as usize;

        for (column_idx, column) in columns.chunks(depth).enumerate() {
            for (z, texel) in column.iter().enumerate() {
                out[z * slice_len + column_idx] = *texel;
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use glam::{uvec3, vec4};

    use super::*;

    #[test]
    fn dispatch_2d() {
        for mut target in [CpuContext::new(), CpuContext::serial()] {
            let actual = target
                .dispatch_2d("test", uvec2(3, 2), &|id| {
                    vec4(id.x as f32, id.y as f32, 0.0, 1.0)
                })
                .unwrap();

            assert_eq!(6, actual.len());
            assert_eq!(vec4(2.0, 0.0, 0.0, 1.0), actual[2]);
            assert_eq!(vec4(0.0, 1.0, 0.0, 1.0), actual[3]);

            assert_eq!(
                &[Submission {
                    label: "test",
                    size: uvec3(3, 2, 1),
                }],
                target.submissions()
            );
        }
    }

    #[test]
    fn dispatch_3d_columns() {
        let mut target = CpuContext::new();
        let size = uvec3(2, 3, 4);

        let actual = target
            .dispatch_3d_columns("test", size, &|id, out| {
                for (z, texel) in out.iter_mut().enumerate() {
                    *texel = vec4(id.x as f32, id.y as f32, z as f32, 0.0);
                }
            })
            .unwrap();

        let view = firmament_gpu::Lut3dView::new(&actual, size);

        for z in 0..4 {
            for y in 0..3 {
                for x in 0..2 {
                    assert_eq!(
                        vec4(x as f32, y as f32, z as f32, 0.0),
                        view.get(uvec3(x, y, z))
                    );
                }
            }
        }

        assert_eq!(1, target.take_submissions().len());
        assert!(target.submissions().is_empty());
    }
}
