use std::process::{Child, ChildStdin, Command, Stdio};

use crate::{
    encode::sink::{FrameSink, SinkConfig},
    foundation::error::{MemeError, MemeResult},
    render::{composite::flatten_to_opaque_rgba8, surface::FrameRGBA},
};

pub fn is_ffmpeg_on_path() -> bool {
    std::process::Command::new("ffmpeg")
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Frame rate implied by a per-frame delay, as an ffmpeg rational.
pub fn frame_rate_arg(frame_delay_ms: u32) -> String {
    format!("1000/{}", frame_delay_ms.max(1))
}

/// MP4 (libx264, yuv420p) written by piping raw RGBA into the system `ffmpeg`.
pub struct FfmpegSink {
    cfg: SinkConfig,
    /// `None` once `finish` has reaped the process.
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    scratch: Vec<u8>,
}

impl FfmpegSink {
    pub fn new(cfg: SinkConfig) -> MemeResult<Self> {
        cfg.validate()?;
        cfg.prepare_output()?;

        if !is_ffmpeg_on_path() {
            return Err(MemeError::encoding(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        if cfg.overwrite {
            cmd.arg("-y");
        } else {
            cmd.arg("-n");
        }

        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.canvas.width, cfg.canvas.height),
            "-r",
            &frame_rate_arg(cfg.frame_delay_ms),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ])
        .arg(&cfg.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            MemeError::encoding(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| MemeError::encoding("failed to open ffmpeg stdin (unexpected)"))?;

        Ok(Self {
            scratch: vec![0u8; cfg.canvas.pixel_len()],
            cfg,
            child: Some(child),
            stdin: Some(stdin),
        })
    }
}

impl FrameSink for FfmpegSink {
    fn encode_frame(&mut self, frame: &FrameRGBA) -> MemeResult<()> {
        self.cfg.check_frame(frame)?;
        flatten_to_opaque_rgba8(
            &mut self.scratch,
            &frame.data,
            frame.premultiplied,
            self.cfg.bg_rgba,
        )?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(MemeError::encoding("ffmpeg encoder is already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(&self.scratch).map_err(|e| {
            MemeError::encoding(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;

        Ok(())
    }

    fn finish(self: Box<Self>) -> MemeResult<()> {
        let mut this = *self;
        drop(this.stdin.take());

        let Some(child) = this.child.take() else {
            return Err(MemeError::encoding("ffmpeg encoder is already finalized"));
        };
        let output = child.wait_with_output().map_err(|e| {
            MemeError::encoding(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MemeError::encoding(format!(
                "ffmpeg exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

impl Drop for FfmpegSink {
    /// A sink abandoned mid-stream kills its ffmpeg process and reaps it.
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            match child.wait() {
                Ok(status) => tracing::debug!(%status, "abandoned ffmpeg process reaped"),
                Err(err) => tracing::warn!(error = %err, "failed to reap abandoned ffmpeg process"),
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
