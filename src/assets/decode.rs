use std::{path::Path, sync::Arc};

use anyhow::Context;

use crate::foundation::{
    core::Canvas,
    error::{MemeError, MemeResult},
};

#[derive(Clone, Debug)]
pub struct PreparedImage {
    pub width: u32,
    pub height: u32,
    /// Premultiplied RGBA8, row-major, tightly packed.
    pub rgba8_premul: Arc<Vec<u8>>,
}

/// Decode `bytes` and stretch the result to exactly `canvas`.
pub fn decode_image(bytes: &[u8], canvas: Canvas) -> MemeResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let dyn_img = if dyn_img.width() == canvas.width && dyn_img.height() == canvas.height {
        dyn_img
    } else {
        dyn_img.resize_exact(
            canvas.width,
            canvas.height,
            image::imageops::FilterType::Triangle,
        )
    };
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

pub fn load_image(path: &Path, canvas: Canvas) -> MemeResult<PreparedImage> {
    if !path.is_file() {
        return Err(MemeError::validation(format!(
            "source image '{}' does not exist",
            path.display()
        )));
    }
    let bytes =
        std::fs::read(path).with_context(|| format!("read source image '{}'", path.display()))?;
    decode_image(&bytes, canvas)
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
