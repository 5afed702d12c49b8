//! Still-image videos through the `ffmpeg` / `ffprobe` binaries

use std::{
    ffi::{OsStr, OsString},
    path::Path,
    process::{Command, Stdio},
};

use log::{debug, info, warn};

use crate::{
    config::RenderConfig,
    pipeline::{collaborators::Renderer, error::RenderError},
};

pub struct FfmpegRenderer {
    config: RenderConfig,
}

impl FfmpegRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Full ffmpeg argument list for one render.
    ///
    /// The output may carry a temporary extension, so the container is
    /// always given explicitly.
    pub fn render_args(&self, audio: &Path, image: Option<&Path>, dest: &Path) -> Vec<OsString> {
        let c = &self.config;
        let (w, h) = (c.width, c.height);
        let mut args: Vec<OsString> = vec![];
        let mut push = |values: &[&OsStr]| args.extend(values.iter().map(|v| v.to_os_string()));

        push(&[os("-hide_banner"), os("-loglevel"), os("error")]);
        let background = format!("color=c=black:s={w}x{h}:r=2");
        match image {
            Some(image) => push(&[os("-loop"), os("1"), os("-i"), image.as_os_str()]),
            None => push(&[os("-f"), os("lavfi"), os("-i"), os(&background)]),
        }
        push(&[os("-i"), audio.as_os_str()]);

        let crf = c.crf.to_string();
        let filter = format!(
            "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2"
        );
        push(&[
            os("-map"),
            os("0:v"),
            os("-map"),
            os("1:a"),
            os("-c:v"),
            os("libx264"),
            os("-tune"),
            os("stillimage"),
            os("-preset"),
            os(&c.preset),
            os("-crf"),
            os(&crf),
            os("-c:a"),
            os("aac"),
            os("-b:a"),
            os(&c.audio_bitrate),
            os("-pix_fmt"),
            os("yuv420p"),
            os("-vf"),
            os(&filter),
            os("-shortest"),
            os("-movflags"),
            os("+faststart"),
            os("-f"),
            os("mp4"),
            os("-y"),
            dest.as_os_str(),
        ]);
        args
    }
}

fn os(value: &str) -> &OsStr {
    OsStr::new(value)
}

impl Renderer for FfmpegRenderer {
    fn render(&self, audio: &Path, image: Option<&Path>, dest: &Path) -> Result<(), RenderError> {
        if let Some(duration) = self.duration(&audio.to_string_lossy()) {
            info!("rendering {} ({duration:.0}s of audio)", dest.display());
        }
        let args = self.render_args(audio, image, dest);
        debug!("{} {:?}", self.config.ffmpeg.display(), args);

        let output = Command::new(&self.config.ffmpeg)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| RenderError::Spawn {
                program: self.config.ffmpeg.clone(),
                source,
            })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RenderError::Failed {
                status: output.status.to_string(),
                stderr: last_lines(&stderr, 5),
            });
        }
        Ok(())
    }

    fn duration(&self, source: &str) -> Option<f64> {
        let output = Command::new(&self.config.ffprobe)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
                source,
            ])
            .stdin(Stdio::null())
            .output();
        match output {
            Ok(out) if out.status.success() => String::from_utf8_lossy(&out.stdout).trim().parse().ok(),
            Ok(out) => {
                debug!("ffprobe failed on {source}: {}", out.status);
                None
            }
            Err(e) => {
                warn!("could not run {}: {e}", self.config.ffprobe.display());
                None
            }
        }
    }
}

fn last_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    lines[lines.len().saturating_sub(n)..].join("\n")
}
