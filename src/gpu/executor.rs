// gpu/executor.rs — run the luminance program, wrap the output.
//
// `ProgramExecutor::run` is the per-frame hot path: allocate a fresh
// float32 output buffer, bind it with the channel texture, dispatch
// the program over the target grid, submit. The buffer is handed to
// the caller as an `OutputTensor` — a typed view over the GPU memory
// the dispatch filled, no copy involved. Each call produces a new
// tensor; earlier tensors stay valid until their owner drops them.
//
// `OutputTensor::read_to_vec` is the synchronous readback used by
// tests, demos and CPU-side consumers. It stalls the GPU — never call
// it if the downstream consumer can read the buffer on-device.

use std::fmt;

use crate::error::PipelineError;
use crate::gpu::channel::TextureChannel;
use crate::gpu::device::GpuDevice;
use crate::gpu::program::LuminanceProgram;

/// Element type of an output tensor. Only f32 today; kept as an enum
/// so the wire shape of `OutputTensor` doesn't change if that does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dtype {
    F32,
}

impl Dtype {
    pub fn size_of(self) -> usize {
        match self {
            Dtype::F32 => 4,
        }
    }
}

/// A single-channel luminance tensor resident on the GPU.
///
/// Shape is `[height, width]`, dtype f32, values in [0, 255]. Owns
/// its buffer; dropping the tensor releases the GPU memory.
pub struct OutputTensor {
    buffer: wgpu::Buffer,
    shape: [u32; 2],
}

impl OutputTensor {
    /// `[height, width]`.
    pub fn shape(&self) -> [u32; 2] {
        self.shape
    }

    pub fn dtype(&self) -> Dtype {
        Dtype::F32
    }

    /// Number of elements (height * width).
    pub fn len(&self) -> usize {
        (self.shape[0] * self.shape[1]) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The backing GPU buffer, for on-device consumers.
    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// Read the tensor back to CPU memory in row-major order.
    ///
    /// **Expensive and synchronous** — stalls the GPU pipeline until
    /// the copy completes. For tests, demos, and CPU consumers only.
    pub fn read_to_vec(&self, gpu: &GpuDevice) -> Vec<f32> {
        let size = (self.len() * self.dtype().size_of()) as u64;
        let readback = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("OutputTensor::readback"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("OutputTensor::readback"),
            });
        encoder.copy_buffer_to_buffer(&self.buffer, 0, &readback, 0, size);
        gpu.queue.submit(std::iter::once(encoder.finish()));

        let slice = readback.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |r| {
            tx.send(r).expect("readback channel closed");
        });
        gpu.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .expect("readback map callback never fired")
            .expect("readback map failed");

        let mapped = slice.get_mapped_range();
        let out: Vec<f32> = bytemuck::cast_slice(&mapped).to_vec();
        drop(mapped);
        readback.unmap();
        out
    }
}

impl fmt::Debug for OutputTensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "OutputTensor {{ shape: [{}, {}], dtype: {:?} }}",
            self.shape[0], self.shape[1], self.dtype()
        )
    }
}

/// Executes the luminance program against the texture channel.
///
/// Stateless between calls; it exists as a type so the dispatch logic
/// has one owner and one test surface.
pub struct ProgramExecutor;

impl ProgramExecutor {
    /// Run `program` against `channel`'s current contents.
    ///
    /// # Errors
    /// `Execution` if the driver/validation layer rejects the
    /// dispatch. No partial result is returned.
    pub fn run(
        gpu: &GpuDevice,
        program: &LuminanceProgram,
        channel: &TextureChannel,
    ) -> Result<OutputTensor, PipelineError> {
        let [height, width] = program.output_shape();
        let size = (width as u64) * (height as u64) * Dtype::F32.size_of() as u64;

        gpu.device.push_error_scope(wgpu::ErrorFilter::Validation);

        // Fresh output buffer per call (zero-filled by wgpu). The
        // caller owns it through the returned tensor.
        let out_buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("OutputTensor"),
            size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let bind_group = program.bind(gpu, channel, &out_buffer);

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("ProgramExecutor::run"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("luminance_main"),
                timestamp_writes: None,
            });
            pass.set_pipeline(program.pipeline());
            pass.set_bind_group(0, &bind_group, &[]);
            let (dx, dy) = gpu.dispatch_size(width, height);
            pass.dispatch_workgroups(dx, dy, 1);
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));

        if let Some(err) = pollster::block_on(gpu.device.pop_error_scope()) {
            return Err(PipelineError::Execution(err.to_string()));
        }

        Ok(OutputTensor {
            buffer: out_buffer,
            shape: [height, width],
        })
    }
}
