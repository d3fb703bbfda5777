// gpu/channel.rs — persistent pixel-upload texture.
//
// One `TextureChannel` is created per pipeline and holds exactly one
// `Rgba8Unorm` texture for its entire lifetime. Frames overwrite its
// *contents* every call; the handle itself is never reallocated, so
// the steady-state loop performs zero GPU texture allocations.
//
// The usage flags are the classification that routes uploads down the
// pixel-transfer path: `TEXTURE_BINDING | COPY_DST` marks the texture
// as a shader-sampled upload target, as opposed to a storage texture
// or a generic compute buffer.
//
// UPLOAD AND ROW ALIGNMENT
// ─────────────────────────
// `copy_buffer_to_texture` requires `bytes_per_row` to be a multiple
// of 256. The surface is tightly packed at `width * 4` bytes per row,
// so each upload stages the rows into a 256-aligned scratch buffer
// first. One staging write per frame is bandwidth-bound and cheap
// next to the dispatch it feeds.

use wgpu::util::DeviceExt;

use crate::error::PipelineError;
use crate::gpu::device::GpuDevice;

/// wgpu's required alignment for `bytes_per_row` in buffer↔texture
/// copies.
const COPY_ALIGNMENT: u32 = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

/// Bytes per RGBA8 pixel.
const BYTES_PER_PIXEL: u32 = 4;

/// A persistent GPU texture receiving the composited surface each
/// frame.
#[derive(Debug)]
pub struct TextureChannel {
    /// The long-lived `Rgba8Unorm` texture. Exactly one per channel.
    texture: wgpu::Texture,
    /// Full-texture view bound as the luminance program's input.
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl TextureChannel {
    /// Allocate the channel's texture, shape `[height, width]`.
    ///
    /// # Errors
    /// `SurfaceTooLarge` if either dimension exceeds the device's
    /// 2D texture limit — fail fast rather than upload a truncated
    /// surface.
    pub fn new(gpu: &GpuDevice, width: u32, height: u32) -> Result<Self, PipelineError> {
        let max = gpu.max_texture_dimension_2d;
        if width > max || height > max {
            return Err(PipelineError::SurfaceTooLarge { width, height, max });
        }

        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("TextureChannel"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            // Rgba8Unorm: channels normalized to [0, 1] in shaders;
            // the luminance kernel scales back to [0, 255].
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Ok(TextureChannel { texture, view, width, height })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The view the luminance program binds as its input texture.
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Push the full surface into the texture, overwriting prior
    /// contents. No partial/ROI updates.
    ///
    /// `pixels` must be the tightly packed RGBA surface, length
    /// `width * height * 4`.
    ///
    /// # Panics
    /// Panics if the slice length does not match the channel shape —
    /// that is a caller bug, not a runtime condition.
    pub fn upload(&self, gpu: &GpuDevice, pixels: &[u8]) {
        let expected = (self.width * self.height * BYTES_PER_PIXEL) as usize;
        assert_eq!(
            pixels.len(),
            expected,
            "surface byte length ({}) must match channel shape ({expected})",
            pixels.len(),
        );

        let unpadded_bytes_per_row = self.width * BYTES_PER_PIXEL;
        let aligned_bytes_per_row = align_to(unpadded_bytes_per_row, COPY_ALIGNMENT);

        // Stage rows at the aligned pitch.
        let mut staging = vec![0u8; (aligned_bytes_per_row * self.height) as usize];
        for y in 0..self.height as usize {
            let src_start = y * unpadded_bytes_per_row as usize;
            let dst_start = y * aligned_bytes_per_row as usize;
            staging[dst_start..dst_start + unpadded_bytes_per_row as usize]
                .copy_from_slice(
                    &pixels[src_start..src_start + unpadded_bytes_per_row as usize],
                );
        }

        let staging_buf = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("TextureChannel::staging"),
                contents: &staging,
                usage: wgpu::BufferUsages::COPY_SRC,
            });

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("TextureChannel::upload"),
            });

        encoder.copy_buffer_to_texture(
            wgpu::ImageCopyBuffer {
                buffer: &staging_buf,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(aligned_bytes_per_row),
                    rows_per_image: Some(self.height),
                },
            },
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );

        gpu.queue.submit(std::iter::once(encoder.finish()));
    }
}

/// Round `value` up to the next multiple of `alignment`.
#[inline]
pub(crate) fn align_to(value: u32, alignment: u32) -> u32 {
    (value + alignment - 1) / alignment * alignment
}
