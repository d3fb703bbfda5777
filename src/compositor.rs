// compositor.rs — Orient and draw an input frame onto the fixed surface.
//
// The compositor owns a fixed-size RGBA draw surface, allocated once at
// construction and mutated in place on every call:
//
//   1. Clear the whole surface (no inter-frame residue).
//   2. If the frame's dimensions are the target's swapped
//      (width == target height, height == target width), the capture
//      is rotated 90° relative to the target: composite it rotated
//      about the surface center. This is the off-screen-canvas
//      translate-to-center → rotate(90°) → draw-centered sequence,
//      collapsed to its closed-form pixel mapping.
//   3. Otherwise blit the frame unscaled at the origin. Exact-size
//      frames fill the surface; anything else is clipped or leaves
//      cleared margins. That is accepted behavior, not an error —
//      only a zero-dimension frame fails.
//
// ROTATION MAPPING
// ─────────────────
// With y-down raster coordinates, rotating the draw transform by +90°
// about the surface center and drawing the frame centered places frame
// pixel (col, row) at surface pixel (sw - 1 - row, col). Inverted per
// destination pixel (so every surface pixel is written exactly once):
//
//   dst(x, y) = frame(col = y, row = sw - 1 - x)
//
// In the swapped-dimensions case this covers the surface exactly, with
// no resampling: a pure index permutation.
//
// The surface is exclusively owned; `compose` takes `&mut self`, so
// two callers cannot race on it.

use crate::error::PipelineError;
use crate::frame::RgbaFrame;

/// Owns the fixed-size RGBA draw surface and composites frames onto it.
#[derive(Debug)]
pub struct FrameCompositor {
    /// Surface pixel bytes, length = width * height * 4. Cleared and
    /// redrawn on every `compose`; never resized after construction.
    surface: Vec<u8>,
    width: usize,
    height: usize,
}

impl FrameCompositor {
    /// Allocate a compositor with a zeroed `width`×`height` surface.
    pub fn new(width: usize, height: usize) -> Self {
        FrameCompositor {
            surface: vec![0u8; width * height * 4],
            width,
            height,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// The surface bytes in row-major RGBA order (length = w * h * 4).
    /// This is what `TextureChannel::upload` consumes.
    pub fn pixels(&self) -> &[u8] {
        &self.surface
    }

    /// Clear the surface and draw `frame` onto it, orienting rotated
    /// captures.
    ///
    /// # Errors
    /// `EmptyFrame` if either frame dimension is zero. The surface is
    /// left cleared in that case.
    pub fn compose(&mut self, frame: &RgbaFrame) -> Result<(), PipelineError> {
        self.surface.fill(0);

        if frame.width() == 0 || frame.height() == 0 {
            return Err(PipelineError::EmptyFrame {
                width: frame.width() as u32,
                height: frame.height() as u32,
            });
        }

        let rotated = frame.width() == self.height && frame.height() == self.width;
        if rotated {
            self.blit_rotated(frame);
        } else {
            self.blit_at_origin(frame);
        }
        Ok(())
    }

    /// Straight draw at the origin. Copies the overlap region row by
    /// row; frame content beyond the surface is clipped, surface area
    /// beyond the frame stays cleared.
    fn blit_at_origin(&mut self, frame: &RgbaFrame) {
        let copy_w = frame.width().min(self.width);
        let copy_h = frame.height().min(self.height);
        for y in 0..copy_h {
            let dst_start = y * self.width * 4;
            self.surface[dst_start..dst_start + copy_w * 4]
                .copy_from_slice(&frame.row(y)[..copy_w * 4]);
        }
    }

    /// Rotated draw: frame dimensions are the surface's swapped, so the
    /// inverse 90° mapping addresses every frame pixel exactly once.
    fn blit_rotated(&mut self, frame: &RgbaFrame) {
        for y in 0..self.height {
            for x in 0..self.width {
                let px = frame.get(y, self.width - 1 - x);
                let dst = (y * self.width + x) * 4;
                self.surface[dst..dst + 4].copy_from_slice(&px);
            }
        }
    }
}
