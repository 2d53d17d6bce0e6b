use std::{
    cell::RefCell,
    fs::File,
    io::{self, BufWriter, Write},
    rc::Rc,
};

use anyhow::Context as _;
use image::codecs::gif::{GifEncoder, Repeat};

use crate::{
    encode::sink::{FrameSink, SinkConfig},
    foundation::error::{MemeError, MemeResult},
    render::{composite::flatten_to_opaque_rgba8, surface::FrameRGBA},
};

/// Quantizer speed handed to the GIF encoder; 1 is best quality, 30 fastest.
const GIF_SPEED: i32 = 10;

type IoErrorSlot = Rc<RefCell<Option<io::Error>>>;

/// Writer that remembers its first I/O error, including the flush it performs on drop.
///
/// The GIF encoder writes its trailer while dropping and discards any error from it, so the
/// sink reads the failure back from the shared slot instead.
struct CheckedWriter<W: Write> {
    inner: W,
    error: IoErrorSlot,
}

impl<W: Write> CheckedWriter<W> {
    fn new(inner: W) -> (Self, IoErrorSlot) {
        let error = IoErrorSlot::default();
        (
            Self {
                inner,
                error: Rc::clone(&error),
            },
            error,
        )
    }

    fn record(&self, err: &io::Error) {
        let mut slot = self.error.borrow_mut();
        if slot.is_none() {
            *slot = Some(io::Error::new(err.kind(), err.to_string()));
        }
    }
}

impl<W: Write> Write for CheckedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let res = self.inner.write(buf);
        if let Err(err) = &res {
            self.record(err);
        }
        res
    }

    fn flush(&mut self) -> io::Result<()> {
        let res = self.inner.flush();
        if let Err(err) = &res {
            self.record(err);
        }
        res
    }
}

impl<W: Write> Drop for CheckedWriter<W> {
    fn drop(&mut self) {
        if let Err(err) = self.inner.flush() {
            self.record(&err);
        }
    }
}

/// Looping GIF written frame by frame.
pub struct GifSink {
    cfg: SinkConfig,
    encoder: GifEncoder<CheckedWriter<BufWriter<File>>>,
    io_error: IoErrorSlot,
    scratch: Vec<u8>,
    frames: u32,
}

impl GifSink {
    pub fn new(cfg: SinkConfig) -> MemeResult<Self> {
        cfg.validate()?;
        cfg.prepare_output()?;

        let file = File::create(&cfg.out_path)
            .with_context(|| format!("create '{}'", cfg.out_path.display()))?;
        let (writer, io_error) = CheckedWriter::new(BufWriter::new(file));
        let mut encoder = GifEncoder::new_with_speed(writer, GIF_SPEED);
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| MemeError::encoding(format!("gif: set repeat: {e}")))?;

        Ok(Self {
            scratch: vec![0u8; cfg.canvas.pixel_len()],
            cfg,
            encoder,
            io_error,
            frames: 0,
        })
    }
}

impl FrameSink for GifSink {
    fn encode_frame(&mut self, frame: &FrameRGBA) -> MemeResult<()> {
        self.cfg.check_frame(frame)?;
        flatten_to_opaque_rgba8(
            &mut self.scratch,
            &frame.data,
            frame.premultiplied,
            self.cfg.bg_rgba,
        )?;

        let img = image::RgbaImage::from_raw(
            self.cfg.canvas.width,
            self.cfg.canvas.height,
            self.scratch.clone(),
        )
        .ok_or_else(|| MemeError::encoding("gif: frame buffer does not match canvas"))?;
        let delay = image::Delay::from_numer_denom_ms(self.cfg.frame_delay_ms, 1);

        self.encoder
            .encode_frame(image::Frame::from_parts(img, 0, 0, delay))
            .map_err(|e| MemeError::encoding(format!("gif: frame {}: {e}", self.frames)))?;
        self.frames += 1;
        Ok(())
    }

    fn finish(self: Box<Self>) -> MemeResult<()> {
        if self.frames == 0 {
            return Err(MemeError::encoding("gif: no frames were encoded"));
        }
        let path = self.cfg.out_path.clone();
        let io_error = Rc::clone(&self.io_error);
        // Dropping the encoder writes the trailer and flushes the file.
        drop(self);
        if let Some(err) = io_error.borrow_mut().take() {
            return Err(MemeError::encoding(format!(
                "gif: write '{}': {err}",
                path.display()
            )));
        }

        let len = std::fs::metadata(&path)
            .with_context(|| format!("stat '{}'", path.display()))?
            .len();
        if len == 0 {
            return Err(MemeError::encoding(format!(
                "gif: '{}' is empty after encoding",
                path.display()
            )));
        }
        tracing::debug!(path = %path.display(), bytes = len, "gif written");
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/gif.rs"]
mod tests;
