// lumapipe: GPU-accelerated frame-to-luminance preprocessing.
//
// Converts a color RGBA frame of arbitrary size into a single-channel
// float32 luminance buffer at a fixed target resolution, entirely on
// the GPU apart from the initial orientation/compositing step:
//
//   RgbaFrame → FrameCompositor (orient + draw onto fixed surface)
//             → TextureChannel  (upload surface to persistent texture)
//             → ProgramExecutor (one luminance compute dispatch)
//             → OutputTensor    (float32 [height, width], values 0..255)
//
// The top-level entry point is `pipeline::LumaPipeline`.

pub mod compositor;
pub mod error;
pub mod frame;
pub mod gpu;
pub mod pipeline;
