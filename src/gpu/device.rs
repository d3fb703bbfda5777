// gpu/device.rs — wgpu device abstraction.
//
// Responsibilities:
//   - Enumerate adapters and select the first real GPU, falling back
//     to whatever exists (software renderers are a last resort, never
//     a silent preference).
//   - Fail fast at construction when a capability the pipeline cannot
//     work without is missing (compute shaders).
//   - Provide `WorkgroupSize` and the dispatch math used when
//     launching the luminance kernel.
//
// ADAPTER SELECTION:
// wgpu's default `request_adapter` uses power-preference heuristics
// that may grab llvmpipe/softpipe where the software renderer appears
// as a valid Vulkan device. We enumerate explicitly and prefer real
// hardware, logging what was chosen.
//
// One `GpuDevice` is held per pipeline (or shared by constructing the
// pipeline via `LumaPipeline::with_device`). There is no process-wide
// GPU state: independent pipelines at different resolutions coexist.

use std::fmt;

use crate::error::PipelineError;

/// A workgroup size configuration for the 2D luminance dispatch.
///
/// Baked into the WGSL source at program build time via the
/// `{{WG_X}}` / `{{WG_Y}}` template tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkgroupSize {
    pub x: u32,
    pub y: u32,
}

impl WorkgroupSize {
    /// Total invocations per workgroup (x * y).
    pub fn total(&self) -> u32 {
        self.x * self.y
    }

    /// Default for the luminance kernel: 16×8 = 128 invocations.
    /// Aligns with 32-wide warps (4 warps) and 64-wide wavefronts
    /// (2 waves); the 16-wide x dimension matches row-major locality.
    fn default_2d() -> Self {
        WorkgroupSize { x: 16, y: 8 }
    }
}

impl fmt::Display for WorkgroupSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}×{} ({} invocations)", self.x, self.y, self.total())
    }
}

/// Cached adapter information for logging and dialect selection.
#[derive(Debug, Clone)]
pub struct AdapterInfo {
    pub name: String,
    pub vendor: u32,
    pub device: u32,
    pub device_type: wgpu::DeviceType,
    pub backend: wgpu::Backend,
}

impl fmt::Display for AdapterInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({:?}, {:?})",
            self.name, self.backend, self.device_type
        )
    }
}

/// The core GPU context: adapter, device, queue.
///
/// Expensive to create (instance + device initialization); create once
/// and keep it for the pipeline's lifetime.
///
/// # Field drop order
/// Rust drops struct fields in declaration order. `_instance` is
/// declared last so the `wgpu::Instance` outlives `device` and
/// `queue`; some drivers crash if the instance is destroyed while
/// device-level objects still reference it.
#[derive(Debug)]
pub struct GpuDevice {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub adapter_info: AdapterInfo,
    pub workgroup_size: WorkgroupSize,
    /// Maximum 2D texture dimension the device accepted; the texture
    /// channel validates the target surface against it.
    pub max_texture_dimension_2d: u32,
    /// Keeps the `wgpu::Instance` alive until `device` and `queue`
    /// are dropped. Never accessed directly.
    _instance: wgpu::Instance,
}

impl GpuDevice {
    /// Create a `GpuDevice` on the best available adapter.
    ///
    /// # Errors
    /// - `NoSuitableAdapter` if no adapter is visible at all.
    /// - `MissingCapability` if the adapter cannot run compute
    ///   shaders (the pipeline has no host-side fallback).
    /// - `DeviceRequest` if the device request fails.
    pub fn new() -> Result<Self, PipelineError> {
        pollster::block_on(Self::init_async())
    }

    async fn init_async() -> Result<Self, PipelineError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY | wgpu::Backends::GL,
            ..Default::default()
        });

        let all_adapters: Vec<wgpu::Adapter> = instance
            .enumerate_adapters(wgpu::Backends::all())
            .into_iter()
            .collect();

        if all_adapters.is_empty() {
            return Err(PipelineError::NoSuitableAdapter);
        }

        for a in &all_adapters {
            let info = a.get_info();
            eprintln!(
                "[lumapipe] adapter: {} ({:?}, {:?})",
                info.name, info.backend, info.device_type
            );
        }

        // Tier 1: real hardware. Tier 2: take whatever exists — the
        // adapter name is logged above so a software fallback is
        // visible, not silent.
        let adapter = all_adapters
            .into_iter()
            .find(|a| {
                matches!(
                    a.get_info().device_type,
                    wgpu::DeviceType::DiscreteGpu
                        | wgpu::DeviceType::IntegratedGpu
                        | wgpu::DeviceType::VirtualGpu
                        | wgpu::DeviceType::Other
                )
            })
            .or_else(|| {
                instance
                    .enumerate_adapters(wgpu::Backends::all())
                    .into_iter()
                    .next()
            })
            .ok_or(PipelineError::NoSuitableAdapter)?;

        // The luminance reduction is a compute dispatch; an adapter
        // that cannot run compute shaders (old GL downlevel targets)
        // is a fatal construction-time condition, not a degrade case.
        let downlevel = adapter.get_downlevel_capabilities();
        if !downlevel.flags.contains(wgpu::DownlevelFlags::COMPUTE_SHADERS) {
            return Err(PipelineError::MissingCapability {
                what: "compute shaders",
            });
        }

        let raw_info = adapter.get_info();
        let adapter_info = AdapterInfo {
            name: raw_info.name.clone(),
            vendor: raw_info.vendor,
            device: raw_info.device,
            device_type: raw_info.device_type,
            backend: raw_info.backend,
        };

        let limits = wgpu::Limits::default().using_resolution(adapter.limits());
        let max_texture_dimension_2d = limits.max_texture_dimension_2d;

        let (device, queue): (wgpu::Device, wgpu::Queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("lumapipe"),
                    required_features: wgpu::Features::empty(),
                    required_limits: limits,
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await
            .map_err(PipelineError::DeviceRequest)?;

        Ok(GpuDevice {
            device,
            queue,
            adapter_info,
            workgroup_size: WorkgroupSize::default_2d(),
            max_texture_dimension_2d,
            _instance: instance,
        })
    }

    /// Number of workgroups needed to cover a `width`×`height` grid
    /// with the active workgroup size. Ceiling division, so every
    /// output element is covered; the shader guards the overhang:
    ///
    /// ```wgsl
    /// if col >= WIDTH || row >= HEIGHT { return; }
    /// ```
    pub fn dispatch_size(&self, width: u32, height: u32) -> (u32, u32) {
        let dx = (width + self.workgroup_size.x - 1) / self.workgroup_size.x;
        let dy = (height + self.workgroup_size.y - 1) / self.workgroup_size.y;
        (dx, dy)
    }
}

impl fmt::Display for GpuDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GpuDevice {{ adapter: {}, workgroup: {} }}",
            self.adapter_info, self.workgroup_size
        )
    }
}
