// pipeline.rs — the frame → luminance-tensor pipeline.
//
// Ties the stages together in the order a caller sees them:
//
//   process(frame):
//     1. compositor.compose(frame)   — orient + draw onto the surface
//     2. channel.upload(surface)     — push pixels into the texture
//     3. executor.run(program)       — one dispatch, fresh OutputTensor
//
// Each step blocks until its GPU-side effect is ordered before the
// next (wgpu queue submission order), and every failure aborts the
// call and propagates. There is no processing state between calls —
// just the three long-lived handles (surface, texture, program), all
// fixed to the target shape at construction.

use crate::compositor::FrameCompositor;
use crate::error::PipelineError;
use crate::frame::RgbaFrame;
use crate::gpu::channel::TextureChannel;
use crate::gpu::device::GpuDevice;
use crate::gpu::executor::{OutputTensor, ProgramExecutor};
use crate::gpu::program::LuminanceProgram;

/// GPU-accelerated frame-to-luminance preprocessor for one fixed
/// target resolution.
///
/// Create once, then call [`process`](LumaPipeline::process) per
/// frame. Takes `&mut self`: the draw surface and texture are
/// exclusively owned and must not be shared between callers.
#[derive(Debug)]
pub struct LumaPipeline {
    gpu: GpuDevice,
    compositor: FrameCompositor,
    channel: TextureChannel,
    program: LuminanceProgram,
    width: u32,
    height: u32,
}

impl LumaPipeline {
    /// Construct a pipeline for a `width`×`height` target, creating
    /// its own GPU context.
    ///
    /// # Errors
    /// - `EmptyTarget` for zero dimensions.
    /// - Any capability error from GPU context creation
    ///   (`NoSuitableAdapter`, `MissingCapability`, ...).
    /// - `SurfaceTooLarge` if the target exceeds the texture limit.
    /// - `ShaderCompile` if the luminance kernel fails validation.
    pub fn new(width: u32, height: u32) -> Result<Self, PipelineError> {
        if width == 0 || height == 0 {
            return Err(PipelineError::EmptyTarget { width, height });
        }
        let gpu = GpuDevice::new()?;
        Self::with_device(gpu, width, height)
    }

    /// Construct a pipeline on an existing GPU context. Lets several
    /// pipelines at different resolutions share one device.
    pub fn with_device(
        gpu: GpuDevice,
        width: u32,
        height: u32,
    ) -> Result<Self, PipelineError> {
        if width == 0 || height == 0 {
            return Err(PipelineError::EmptyTarget { width, height });
        }
        let compositor = FrameCompositor::new(width as usize, height as usize);
        let channel = TextureChannel::new(&gpu, width, height)?;
        let program = LuminanceProgram::new(&gpu, width, height)?;
        eprintln!(
            "[lumapipe] pipeline ready: {width}×{height}, {} dialect, adapter {}",
            match program.dialect() {
                crate::gpu::program::SamplingDialect::Sampled => "sampled",
                crate::gpu::program::SamplingDialect::TexelFetch => "texel-fetch",
            },
            gpu.adapter_info,
        );
        Ok(LumaPipeline {
            gpu,
            compositor,
            channel,
            program,
            width,
            height,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The pipeline's GPU context, for readback and on-device
    /// consumers of the returned tensors.
    pub fn gpu(&self) -> &GpuDevice {
        &self.gpu
    }

    /// Process one frame into a luminance tensor of shape
    /// `[height, width]`, dtype f32, values in [0, 255].
    ///
    /// Stateless per call apart from overwriting the surface and
    /// texture contents; each call returns a fresh tensor and leaves
    /// previous ones untouched.
    ///
    /// # Errors
    /// `EmptyFrame` from composition, `Execution` from the dispatch.
    /// No retries, no partial results.
    pub fn process(&mut self, frame: &RgbaFrame) -> Result<OutputTensor, PipelineError> {
        self.compositor.compose(frame)?;
        self.channel.upload(&self.gpu, self.compositor.pixels());
        ProgramExecutor::run(&self.gpu, &self.program, &self.channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_target_fails_before_touching_the_gpu() {
        // Checked ahead of device creation so this holds on GPU-less
        // machines too.
        let err = LumaPipeline::new(0, 150).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyTarget { width: 0, height: 150 }));
        let err = LumaPipeline::new(100, 0).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyTarget { .. }));
    }

    // ---- GPU end-to-end tests (subprocess isolation) ----------------------
    //
    // Some driver stacks crash during process exit after a device has
    // been created (dzn on WSL2 is the known offender). Each GPU test
    // runs its real assertions in a child `cargo test` process that
    // prints "GPU_TEST_OK" on success; the outer wrapper only checks
    // the output, not the exit status.

    fn run_gpu_test_in_subprocess(test_name: &str) -> String {
        let output = std::process::Command::new("cargo")
            .args(["test", "--lib", "--", test_name, "--exact", "--ignored", "--nocapture"])
            .output()
            .unwrap_or_else(|e| panic!("failed to spawn subprocess for {test_name}: {e}"));
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        print!("{stdout}");
        eprint!("{stderr}");
        stdout + &stderr
    }

    // Inner tests ───────────────────────────────────────────────────────────

    #[test]
    #[ignore = "GPU integration: run via outer subprocess wrapper"]
    fn inner_solid_gray_worked_example() {
        // 100×150 target, solid gray (128,128,128) frame at exact size:
        // every output element ≈ 128.
        let mut pipeline = LumaPipeline::new(100, 150).expect("need a GPU");
        let frame = RgbaFrame::solid(100, 150, [128, 128, 128, 255]);
        let tensor = pipeline.process(&frame).unwrap();
        assert_eq!(tensor.shape(), [150, 100]);

        let values = tensor.read_to_vec(pipeline.gpu());
        assert_eq!(values.len(), 150 * 100);
        for &v in &values {
            assert!((v - 128.0).abs() <= 1.0, "expected ≈128, got {v}");
        }
        println!("GPU_TEST_OK");
    }

    #[test]
    #[ignore = "GPU integration: run via outer subprocess wrapper"]
    fn inner_rotated_gray_shapes() {
        // 150×100 frame into a 100×150 target: the rotated path. Color
        // is uniform so rotation cannot change values — this validates
        // shape and orientation handling independent of color logic.
        let mut pipeline = LumaPipeline::new(100, 150).expect("need a GPU");
        let frame = RgbaFrame::solid(150, 100, [128, 128, 128, 255]);
        let tensor = pipeline.process(&frame).unwrap();
        assert_eq!(tensor.shape(), [150, 100]);
        for &v in &tensor.read_to_vec(pipeline.gpu()) {
            assert!((v - 128.0).abs() <= 1.0);
        }
        println!("GPU_TEST_OK");
    }

    #[test]
    #[ignore = "GPU integration: run via outer subprocess wrapper"]
    fn inner_luminance_formula() {
        // Solid (200, 50, 10): Y = 0.299*200 + 0.587*50 + 0.114*10 = 90.29.
        // Alpha 0 on purpose — it must not affect the result.
        let mut pipeline = LumaPipeline::new(32, 24).expect("need a GPU");
        let frame = RgbaFrame::solid(32, 24, [200, 50, 10, 0]);
        let tensor = pipeline.process(&frame).unwrap();
        let expected = 0.299 * 200.0 + 0.587 * 50.0 + 0.114 * 10.0;
        for &v in &tensor.read_to_vec(pipeline.gpu()) {
            assert!((v - expected).abs() <= 1.0, "expected ≈{expected}, got {v}");
        }
        println!("GPU_TEST_OK");
    }

    #[test]
    #[ignore = "GPU integration: run via outer subprocess wrapper"]
    fn inner_rotation_is_correctness_preserving() {
        // A swapped-size frame through the rotated path must match the
        // pre-rotated frame through the straight path, per element.
        let (w, h) = (40u32, 30u32);
        let mut frame = RgbaFrame::new(h as usize, w as usize); // 30×40, swapped
        for y in 0..w as usize {
            for x in 0..h as usize {
                frame.set(x, y, [(x * 8) as u8, (y * 6) as u8, 77, 255]);
            }
        }

        let mut pipeline = LumaPipeline::new(w, h).expect("need a GPU");
        let rotated_path = pipeline.process(&frame).unwrap().read_to_vec(pipeline.gpu());
        let straight_path = pipeline
            .process(&frame.rotated_cw())
            .unwrap()
            .read_to_vec(pipeline.gpu());

        assert_eq!(rotated_path.len(), straight_path.len());
        for (i, (a, b)) in rotated_path.iter().zip(straight_path.iter()).enumerate() {
            assert!((a - b).abs() <= 1.0, "element {i}: rotated={a} straight={b}");
        }
        println!("GPU_TEST_OK");
    }

    #[test]
    #[ignore = "GPU integration: run via outer subprocess wrapper"]
    fn inner_repeated_processing_is_stable() {
        // Same frame N times → N outputs identical within tolerance,
        // through the same long-lived surface/texture/program handles.
        let mut pipeline = LumaPipeline::new(64, 48).expect("need a GPU");
        let frame = RgbaFrame::solid(64, 48, [90, 180, 20, 255]);

        let first = pipeline.process(&frame).unwrap().read_to_vec(pipeline.gpu());
        for _ in 0..4 {
            let next = pipeline.process(&frame).unwrap().read_to_vec(pipeline.gpu());
            for (a, b) in first.iter().zip(next.iter()) {
                assert!((a - b).abs() <= 0.5);
            }
        }
        println!("GPU_TEST_OK");
    }

    #[test]
    #[ignore = "GPU integration: run via outer subprocess wrapper"]
    fn inner_mismatched_frame_is_clipped_not_rejected() {
        // 10×10 frame into 64×48: unscaled at the origin, margins are
        // cleared (luminance 0).
        let mut pipeline = LumaPipeline::new(64, 48).expect("need a GPU");
        let frame = RgbaFrame::solid(10, 10, [255, 255, 255, 255]);
        let values = pipeline.process(&frame).unwrap().read_to_vec(pipeline.gpu());
        // Inside the blit: white ≈ 255.
        assert!((values[0] - 255.0).abs() <= 1.0);
        // Well outside: cleared.
        let far = 47 * 64 + 63;
        assert!(values[far].abs() <= 1.0);
        println!("GPU_TEST_OK");
    }

    #[test]
    #[ignore = "GPU integration: run via outer subprocess wrapper"]
    fn inner_empty_frame_propagates() {
        let mut pipeline = LumaPipeline::new(16, 16).expect("need a GPU");
        let err = pipeline.process(&RgbaFrame::new(16, 0)).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyFrame { .. }));
        // The pipeline stays usable after the failed call.
        let frame = RgbaFrame::solid(16, 16, [128, 128, 128, 255]);
        let tensor = pipeline.process(&frame).unwrap();
        assert_eq!(tensor.shape(), [16, 16]);
        println!("GPU_TEST_OK");
    }

    // Outer wrappers ────────────────────────────────────────────────────────

    #[test]
    #[ignore = "requires a GPU"]
    fn test_solid_gray_worked_example() {
        let out = run_gpu_test_in_subprocess("pipeline::tests::inner_solid_gray_worked_example");
        assert!(out.contains("GPU_TEST_OK"), "inner test failed:\n{out}");
    }

    #[test]
    #[ignore = "requires a GPU"]
    fn test_rotated_gray_shapes() {
        let out = run_gpu_test_in_subprocess("pipeline::tests::inner_rotated_gray_shapes");
        assert!(out.contains("GPU_TEST_OK"), "inner test failed:\n{out}");
    }

    #[test]
    #[ignore = "requires a GPU"]
    fn test_luminance_formula() {
        let out = run_gpu_test_in_subprocess("pipeline::tests::inner_luminance_formula");
        assert!(out.contains("GPU_TEST_OK"), "inner test failed:\n{out}");
    }

    #[test]
    #[ignore = "requires a GPU"]
    fn test_rotation_is_correctness_preserving() {
        let out =
            run_gpu_test_in_subprocess("pipeline::tests::inner_rotation_is_correctness_preserving");
        assert!(out.contains("GPU_TEST_OK"), "inner test failed:\n{out}");
    }

    #[test]
    #[ignore = "requires a GPU"]
    fn test_repeated_processing_is_stable() {
        let out =
            run_gpu_test_in_subprocess("pipeline::tests::inner_repeated_processing_is_stable");
        assert!(out.contains("GPU_TEST_OK"), "inner test failed:\n{out}");
    }

    #[test]
    #[ignore = "requires a GPU"]
    fn test_mismatched_frame_is_clipped_not_rejected() {
        let out = run_gpu_test_in_subprocess(
            "pipeline::tests::inner_mismatched_frame_is_clipped_not_rejected",
        );
        assert!(out.contains("GPU_TEST_OK"), "inner test failed:\n{out}");
    }

    #[test]
    #[ignore = "requires a GPU"]
    fn test_empty_frame_propagates() {
        let out = run_gpu_test_in_subprocess("pipeline::tests::inner_empty_frame_propagates");
        assert!(out.contains("GPU_TEST_OK"), "inner test failed:\n{out}");
    }
}
