// gpu/program.rs — the immutable luminance compute program.
//
// Built once at pipeline construction and never mutated: a compiled
// compute pipeline whose WGSL source is parameterized by the target
// width/height (baked in as constants via template substitution — the
// dimensions are fixed for the program's lifetime, so there is no
// per-frame uniform traffic).
//
// SAMPLING DIALECTS
// ──────────────────
// The texture read is written two ways and selected once at build
// time from the adapter backend, never re-evaluated per frame:
//
//   Sampled    — `textureSampleLevel` through a non-filtering nearest
//                sampler. The native path.
//   TexelFetch — `textureLoad` at integer texel coordinates. Used on
//                the GL backend, where sampling from compute stages
//                is unreliable across drivers.
//
// The input texture has exactly the output's shape and the uv carries
// a half-texel offset, so both dialects read the texel at (col, row):
// this is a syntax selection only, the semantics are identical.

use crate::error::PipelineError;
use crate::gpu::channel::TextureChannel;
use crate::gpu::device::{GpuDevice, WorkgroupSize};

/// Which WGSL texture-read syntax the program was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingDialect {
    /// `textureSampleLevel` + non-filtering nearest sampler.
    Sampled,
    /// `textureLoad` texel fetch, no sampler binding.
    TexelFetch,
}

impl SamplingDialect {
    /// Select the dialect for the active backend.
    pub fn for_backend(backend: wgpu::Backend) -> Self {
        match backend {
            wgpu::Backend::Gl => SamplingDialect::TexelFetch,
            _ => SamplingDialect::Sampled,
        }
    }
}

/// Build the WGSL source for the given target shape and dialect.
///
/// Pure function of its inputs; exposed at crate level so template
/// substitution is testable without a device.
pub(crate) fn build_shader_source(
    width: u32,
    height: u32,
    workgroup: WorkgroupSize,
    dialect: SamplingDialect,
) -> String {
    let template = include_str!("../shaders/luminance.wgsl");

    let (sampler_decl, sample_expr) = match dialect {
        SamplingDialect::Sampled => (
            "@group(0) @binding(1) var src_samp: sampler;",
            "textureSampleLevel(src_tex, src_samp, uv, 0.0)",
        ),
        SamplingDialect::TexelFetch => (
            "",
            "textureLoad(src_tex, vec2<i32>(i32(col), i32(row)), 0)",
        ),
    };

    template
        .replace("{{WIDTH}}", &width.to_string())
        .replace("{{HEIGHT}}", &height.to_string())
        .replace("{{WG_X}}", &workgroup.x.to_string())
        .replace("{{WG_Y}}", &workgroup.y.to_string())
        .replace("{{SAMPLER_DECL}}", sampler_decl)
        .replace("{{SAMPLE_EXPR}}", sample_expr)
}

/// The precompiled luminance program: pipeline, bind group layout,
/// dialect, and declared output shape. Immutable after construction.
#[derive(Debug)]
pub struct LuminanceProgram {
    pipeline: wgpu::ComputePipeline,
    bgl: wgpu::BindGroupLayout,
    /// Present only in the Sampled dialect.
    sampler: Option<wgpu::Sampler>,
    dialect: SamplingDialect,
    width: u32,
    height: u32,
}

impl LuminanceProgram {
    /// Compile the luminance kernel for a `width`×`height` target.
    ///
    /// # Errors
    /// `ShaderCompile` if the generated WGSL fails validation. There
    /// is no fallback shader.
    pub fn new(gpu: &GpuDevice, width: u32, height: u32) -> Result<Self, PipelineError> {
        let dialect = SamplingDialect::for_backend(gpu.adapter_info.backend);
        let source = build_shader_source(width, height, gpu.workgroup_size, dialect);

        // Shader and pipeline creation inside a validation scope so a
        // bad module surfaces as an error instead of a later panic.
        gpu.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = gpu
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("luminance.wgsl"),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });

        let mut bgl_entries = vec![
            // 0 — input texture.
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: false },
                },
                count: None,
            },
        ];
        if dialect == SamplingDialect::Sampled {
            // 1 — non-filtering sampler.
            bgl_entries.push(wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering),
                count: None,
            });
        }
        // 2 — output luminance buffer.
        bgl_entries.push(wgpu::BindGroupLayoutEntry {
            binding: 2,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: false },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        });

        let bgl = gpu
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("LuminanceProgram BGL"),
                entries: &bgl_entries,
            });

        let pipeline_layout =
            gpu.device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("LuminanceProgram pipeline layout"),
                    bind_group_layouts: &[&bgl],
                    push_constant_ranges: &[],
                });

        let pipeline =
            gpu.device
                .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                    label: Some("luminance_main"),
                    layout: Some(&pipeline_layout),
                    module: &shader,
                    entry_point: "luminance_main",
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                    cache: None,
                });

        if let Some(err) = pollster::block_on(gpu.device.pop_error_scope()) {
            return Err(PipelineError::ShaderCompile(err.to_string()));
        }

        let sampler = match dialect {
            SamplingDialect::Sampled => Some(gpu.device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("LuminanceProgram sampler"),
                address_mode_u: wgpu::AddressMode::ClampToEdge,
                address_mode_v: wgpu::AddressMode::ClampToEdge,
                mag_filter: wgpu::FilterMode::Nearest,
                min_filter: wgpu::FilterMode::Nearest,
                ..Default::default()
            })),
            SamplingDialect::TexelFetch => None,
        };

        Ok(LuminanceProgram {
            pipeline,
            bgl,
            sampler,
            dialect,
            width,
            height,
        })
    }

    /// Declared output shape, `[height, width]`.
    pub fn output_shape(&self) -> [u32; 2] {
        [self.height, self.width]
    }

    pub fn dialect(&self) -> SamplingDialect {
        self.dialect
    }

    pub fn pipeline(&self) -> &wgpu::ComputePipeline {
        &self.pipeline
    }

    /// Bind the channel texture and the output buffer for one
    /// dispatch, honoring the dialect's binding set.
    pub fn bind(
        &self,
        gpu: &GpuDevice,
        channel: &TextureChannel,
        out_buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        let mut entries = vec![wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::TextureView(channel.view()),
        }];
        if let Some(sampler) = &self.sampler {
            entries.push(wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            });
        }
        entries.push(wgpu::BindGroupEntry {
            binding: 2,
            resource: out_buffer.as_entire_binding(),
        });

        gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("LuminanceProgram BG"),
            layout: &self.bgl,
            entries: &entries,
        })
    }
}
