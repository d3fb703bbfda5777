// demos/photo_luma.rs — run a photo through the luminance pipeline.
//
// Usage:
//   cargo run --example photo_luma -- <input.{png,jpg}> <width> <height> [out.png]
//
// Loads the photo, processes it at the requested target resolution,
// and writes the luminance buffer back out as an 8-bit grayscale PNG
// (default out.png). If the photo's dimensions are the target's
// swapped, the pipeline composites it rotated — try it with a
// landscape photo and a portrait target.

use lumapipe::frame::RgbaFrame;
use lumapipe::pipeline::LumaPipeline;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 4 {
        eprintln!("usage: {} <input.png> <width> <height> [out.png]", args[0]);
        std::process::exit(2);
    }
    let path = &args[1];
    let width: u32 = args[2].parse()?;
    let height: u32 = args[3].parse()?;
    let out_path = args.get(4).map(String::as_str).unwrap_or("out.png");

    let img = image::open(path)?.to_rgba8();
    let (iw, ih) = img.dimensions();
    let frame = RgbaFrame::from_vec(iw as usize, ih as usize, img.into_raw());
    eprintln!("[photo_luma] input {iw}×{ih}, target {width}×{height}");

    let mut pipeline = LumaPipeline::new(width, height)?;
    let start = std::time::Instant::now();
    let tensor = pipeline.process(&frame)?;
    let values = tensor.read_to_vec(pipeline.gpu());
    eprintln!(
        "[photo_luma] processed + readback in {:.2} ms, shape {:?}",
        start.elapsed().as_secs_f64() * 1e3,
        tensor.shape(),
    );

    let bytes: Vec<u8> = values
        .iter()
        .map(|&v| v.clamp(0.0, 255.0).round() as u8)
        .collect();
    image::GrayImage::from_raw(width, height, bytes)
        .expect("buffer length matches shape")
        .save(out_path)?;
    eprintln!("[photo_luma] wrote {out_path}");
    Ok(())
}
