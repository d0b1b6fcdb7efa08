//! ffmpeg subprocess encoder
//!
//! Raw RGB24 frames are piped to `ffmpeg` on stdin; ffmpeg picks the
//! container from the output file extension.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

use image::DynamicImage;

use super::{frame_dimensions, VideoEncoder, VideoSettings};
use crate::config;
use crate::error::{ProjectError, Result};

/// Pads odd frame sizes up to even ones; 4:2:0 encoders reject odd sizes
const EVEN_PAD_FILTER: &str = "pad=ceil(iw/2)*2:ceil(ih/2)*2";

/// Encoder that drives the system `ffmpeg` binary
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    binary: PathBuf,
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self::new(config::DEFAULT_FFMPEG_BINARY)
    }
}

impl FfmpegEncoder {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Use `PROJECT_UTIL_FFMPEG`, defaulting to `ffmpeg` on `PATH`
    pub fn from_env() -> Self {
        Self::new(config::var_or(config::FFMPEG_BINARY, config::DEFAULT_FFMPEG_BINARY))
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Map a codec identifier to ffmpeg arguments.
    ///
    /// Four-character codes select an encoder and, where players care, the
    /// stream tag; anything else is passed through as an encoder name.
    pub fn codec_args(codec: &str) -> Vec<String> {
        let (encoder, tag) = match codec.to_ascii_lowercase().as_str() {
            "avc1" | "h264" => ("libx264", Some("avc1")),
            "hvc1" => ("libx265", Some("hvc1")),
            "hev1" | "hevc" | "h265" => ("libx265", Some("hev1")),
            "mp4v" => ("mpeg4", Some("mp4v")),
            "vp09" | "vp9" => ("libvpx-vp9", None),
            _ => (codec, None),
        };

        let mut args = vec!["-c:v".to_string(), encoder.to_string()];
        if let Some(tag) = tag {
            args.push("-tag:v".to_string());
            args.push(tag.to_string());
        }
        args
    }

    fn command(&self, size: (u32, u32), output: &Path, settings: &VideoSettings) -> Command {
        let mut command = Command::new(&self.binary);
        command
            .args(["-y", "-loglevel", "error"])
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24"])
            .arg("-s")
            .arg(format!("{}x{}", size.0, size.1))
            .arg("-r")
            .arg(settings.fps.to_string())
            .args(["-i", "-"])
            .args(["-vf", EVEN_PAD_FILTER])
            .args(Self::codec_args(&settings.codec))
            .args(["-pix_fmt", "yuv420p"])
            .arg(output)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        command
    }
}

impl VideoEncoder for FfmpegEncoder {
    fn encode(&self, frames: &[DynamicImage], output: &Path, settings: &VideoSettings) -> Result<()> {
        settings.validate()?;
        let size = frame_dimensions(frames, &output.display().to_string())?;

        log::info!(
            "Encoding {} frames ({}x{}) at {} fps with {} into {}",
            frames.len(),
            size.0,
            size.1,
            settings.fps,
            settings.codec,
            output.display()
        );

        let mut child = self
            .command(size, output, settings)
            .spawn()
            .map_err(|e| ProjectError::VideoEncoding {
                reason: format!("cannot start {}: {}", self.binary.display(), e),
            })?;

        // Drain stderr while frames are written so a chatty ffmpeg cannot
        // block on a full pipe
        let stderr = child.stderr.take().map(|mut pipe| {
            thread::spawn(move || {
                let mut text = String::new();
                let _ = pipe.read_to_string(&mut text);
                text
            })
        });

        if let Some(mut stdin) = child.stdin.take() {
            for frame in frames {
                if let Err(e) = stdin.write_all(frame.to_rgb8().as_raw()) {
                    // ffmpeg exited early; its stderr explains why
                    log::warn!("ffmpeg stopped reading frames: {}", e);
                    break;
                }
            }
        }

        let status = child.wait().map_err(|e| ProjectError::VideoEncoding {
            reason: format!("ffmpeg did not finish: {}", e),
        })?;
        let stderr = stderr
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();

        if !status.success() {
            return Err(ProjectError::VideoEncoding {
                reason: format!("ffmpeg exited with {}: {}", status, stderr.trim()),
            });
        }

        Ok(())
    }
}
