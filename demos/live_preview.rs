// demos/live_preview.rs — preview the luminance output in a window.
//
// Usage:
//   cargo run --example live_preview -- <input.{png,jpg}> <width> <height>
//
// Processes the photo every frame (exercising the persistent
// texture/surface reuse path) and displays the result with minifb
// until Escape is pressed. The per-frame time printed in the title
// bar is the full compose → upload → dispatch → readback loop.

use minifb::{Key, Window, WindowOptions};

use lumapipe::frame::RgbaFrame;
use lumapipe::pipeline::LumaPipeline;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 4 {
        eprintln!("usage: {} <input.png> <width> <height>", args[0]);
        std::process::exit(2);
    }
    let width: u32 = args[2].parse()?;
    let height: u32 = args[3].parse()?;

    let img = image::open(&args[1])?.to_rgba8();
    let (iw, ih) = img.dimensions();
    let frame = RgbaFrame::from_vec(iw as usize, ih as usize, img.into_raw());

    let mut pipeline = LumaPipeline::new(width, height)?;
    let mut window = Window::new(
        "lumapipe preview",
        width as usize,
        height as usize,
        WindowOptions::default(),
    )?;
    window.set_target_fps(30);

    let mut display = vec![0u32; (width * height) as usize];
    while window.is_open() && !window.is_key_down(Key::Escape) {
        let start = std::time::Instant::now();
        let tensor = pipeline.process(&frame)?;
        let values = tensor.read_to_vec(pipeline.gpu());
        let ms = start.elapsed().as_secs_f64() * 1e3;

        for (dst, &v) in display.iter_mut().zip(values.iter()) {
            let g = v.clamp(0.0, 255.0) as u32;
            *dst = (g << 16) | (g << 8) | g;
        }
        window.set_title(&format!("lumapipe preview — {ms:.2} ms/frame"));
        window.update_with_buffer(&display, width as usize, height as usize)?;
    }
    Ok(())
}
