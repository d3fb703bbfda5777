// gpu/mod.rs — wgpu compute layer.
//
// Three long-lived pieces, all created once per pipeline:
//
//   device   — adapter selection, device/queue, workgroup sizing.
//   channel  — the persistent RGBA texture the composited surface is
//              uploaded into every frame.
//   program  — the immutable, precompiled luminance compute pipeline.
//
// executor ties them together per frame: one dispatch over the texture
// produces a fresh float32 output buffer, wrapped as an OutputTensor.
//
// Everything here treats each step as blocking from the caller's point
// of view — wgpu's queue ordering guarantees the upload is visible to
// the dispatch submitted after it.

pub mod channel;
pub mod device;
pub mod executor;
pub mod program;
