//! Headless capture: PNG screenshots of finished frames.

use std::error::Error;
use std::fs;
use std::io::Write;
use std::path::Path;

use commodore_denise_ocs::{FB_HEIGHT, FB_WIDTH};

use crate::{Amiga, DmaClients};

/// Encode an ARGB32 framebuffer as PNG into `out`.
pub fn write_png<W: Write>(out: W, fb: &[u32]) -> Result<(), Box<dyn Error>> {
    let mut encoder = png::Encoder::new(out, FB_WIDTH, FB_HEIGHT);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;

    // ARGB32 -> RGBA bytes
    let mut rgba = Vec::with_capacity(fb.len() * 4);
    for &pixel in fb {
        rgba.push(((pixel >> 16) & 0xFF) as u8);
        rgba.push(((pixel >> 8) & 0xFF) as u8);
        rgba.push((pixel & 0xFF) as u8);
        rgba.push(0xFF);
    }
    writer.write_image_data(&rgba)?;
    Ok(())
}

/// Save the current framebuffer as a PNG file.
pub fn save_screenshot<C: DmaClients>(amiga: &Amiga<C>, path: &Path) -> Result<(), Box<dyn Error>> {
    let file = fs::File::create(path)?;
    write_png(std::io::BufWriter::new(file), amiga.framebuffer())
}

/// Run `num_frames` frames and dump each one as a numbered PNG.
pub fn record<C: DmaClients>(
    amiga: &mut Amiga<C>,
    dir: &Path,
    num_frames: u32,
) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(dir)?;
    for i in 1..=num_frames {
        amiga.run_frame();
        save_screenshot(amiga, &dir.join(format!("{i:06}.png")))?;
    }
    Ok(())
}
