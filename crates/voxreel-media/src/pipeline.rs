//! Media pipeline builder: turns clip lists, audio paths and timing
//! parameters into ready-to-run command descriptors.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::command::CommandDescriptor;
use crate::concat::{
    effective_duration, fill_within_limit, plan_fill, write_concat_list, MediaSegment,
};
use crate::error::{MediaError, MediaResult};
use crate::filters::{blend_graph, concat_video_graph, subtitle_filter, FrameSpec};
use crate::probe::DurationProbe;

/// Name of the concat-demuxer list written next to a WAV concat output.
pub const CONCAT_LIST_NAME: &str = "concat.txt";

/// Builds FFmpeg command descriptors. Apart from probing clip durations and
/// writing concat list files, nothing here touches the outside world.
#[derive(Clone)]
pub struct MediaPipelineBuilder {
    ffmpeg: String,
    probe: Arc<dyn DurationProbe>,
    frame: FrameSpec,
}

impl MediaPipelineBuilder {
    pub fn new(ffmpeg: impl Into<String>, probe: Arc<dyn DurationProbe>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            probe,
            frame: FrameSpec::default(),
        }
    }

    /// Override the rendered frame geometry.
    pub fn with_frame(mut self, frame: FrameSpec) -> Self {
        self.frame = frame;
        self
    }

    pub fn frame(&self) -> FrameSpec {
        self.frame
    }

    fn ffmpeg(&self) -> CommandDescriptor {
        CommandDescriptor::new(self.ffmpeg.clone())
    }

    /// Probe every clip and compute its effective (tail-trimmed) duration.
    pub async fn measure(&self, clips: &[PathBuf], tail_trim: f64) -> MediaResult<Vec<MediaSegment>> {
        let mut segments = Vec::with_capacity(clips.len());
        for clip in clips {
            let real = self.probe.duration(clip).await?;
            let effective = effective_duration(real, tail_trim);
            debug!(clip = %clip.display(), real, effective, "Probed clip");
            segments.push(MediaSegment {
                path: clip.clone(),
                effective_duration: effective,
            });
        }
        Ok(segments)
    }

    /// Concatenate `clips` (video only) into exactly `target` seconds.
    ///
    /// Negative `tail_trim` is treated as zero. Clips are packed greedily in
    /// order; with `looped` the list is cycled until `target` is covered.
    pub async fn concat_to_duration(
        &self,
        clips: &[PathBuf],
        output: &Path,
        target: f64,
        tail_trim: f64,
        looped: bool,
    ) -> MediaResult<CommandDescriptor> {
        if clips.is_empty() {
            return Err(MediaError::empty_input("video clips"));
        }
        if !(target > 0.0) || !target.is_finite() {
            return Err(MediaError::InvalidDuration(target));
        }
        let tail_trim = tail_trim.max(0.0);

        let segments = self.measure(clips, tail_trim).await?;
        if looped && !fill_within_limit(&segments, target) {
            return Err(MediaError::InvalidDuration(target));
        }
        let sequence = plan_fill(&segments, target, looped);
        if sequence.is_empty() {
            return Err(MediaError::empty_input("concat sequence"));
        }

        let planned: f64 = sequence.iter().map(|s| s.effective_duration).sum();
        info!(
            clips = clips.len(),
            segments = sequence.len(),
            planned_secs = planned,
            target_secs = target,
            looped,
            "Planned clip sequence"
        );

        let mut cmd = self.ffmpeg().arg("-y");
        for seg in &sequence {
            cmd = cmd.arg("-i").path_arg(&seg.path);
        }

        let fps = self.frame.fps.to_string();
        Ok(cmd
            .arg("-filter_complex")
            .arg(concat_video_graph(&sequence, self.frame))
            .args(["-map", "[vout]", "-an"])
            .args(["-r", fps.as_str()])
            .arg("-t")
            .arg(format!("{:.3}", target))
            .args(["-c:v", "libx264", "-preset", "veryfast", "-crf", "20"])
            .args(["-movflags", "+faststart"])
            .path_arg(output)
            .inputs(clips)
            .output(output))
    }

    /// Losslessly concatenate WAV files into `<dir>/<filename>`.
    ///
    /// Writes the concat list to `<dir>/concat.txt` before returning.
    pub async fn concat_wav(
        &self,
        wavs: &[PathBuf],
        dir: &Path,
        filename: &str,
    ) -> MediaResult<CommandDescriptor> {
        if wavs.is_empty() {
            return Err(MediaError::empty_input("wav paths"));
        }
        let filename = if filename.is_empty() {
            "audio.wav"
        } else {
            filename
        };

        let list = dir.join(CONCAT_LIST_NAME);
        write_concat_list(&list, wavs).await?;
        let output = dir.join(filename);

        Ok(self
            .ffmpeg()
            .args(["-y", "-hide_banner", "-loglevel", "error"])
            .args(["-f", "concat", "-safe", "0"])
            .arg("-i")
            .path_arg(&list)
            .args(["-c:a", "copy"])
            .path_arg(&output)
            .inputs(wavs)
            .output(&output))
    }

    /// Mix `background` under `foreground` at `volume`, ending with the
    /// foreground. With `looped` the background repeats indefinitely.
    pub fn blend_audio(
        &self,
        foreground: &Path,
        background: &Path,
        output: Option<&Path>,
        volume: f64,
        looped: bool,
    ) -> CommandDescriptor {
        let output = output.unwrap_or_else(|| Path::new("out.m4a"));

        let mut cmd = self.ffmpeg().arg("-y").arg("-i").path_arg(foreground);
        if looped {
            cmd = cmd.args(["-stream_loop", "-1"]);
        }
        cmd.arg("-i")
            .path_arg(background)
            .arg("-filter_complex")
            .arg(blend_graph(volume))
            .args(["-map", "[aout]", "-c:a", "aac", "-b:a", "192k"])
            .path_arg(output)
            .input(foreground)
            .input(background)
            .output(output)
    }

    /// Remux the first video stream of `video` with the first audio stream
    /// of `audio`, stopping at the shorter one.
    pub fn merge(
        &self,
        video: &Path,
        audio: &Path,
        output: Option<&Path>,
    ) -> MediaResult<CommandDescriptor> {
        if video.as_os_str().is_empty() {
            return Err(MediaError::invalid_argument("video path is empty"));
        }
        if audio.as_os_str().is_empty() {
            return Err(MediaError::invalid_argument("audio path is empty"));
        }
        let output = output.unwrap_or_else(|| Path::new("final.mp4"));

        Ok(self
            .ffmpeg()
            .arg("-y")
            .arg("-i")
            .path_arg(video)
            .arg("-i")
            .path_arg(audio)
            .args(["-map", "0:v:0", "-map", "1:a:0"])
            .args(["-c:v", "copy", "-c:a", "copy"])
            .arg("-shortest")
            .args(["-movflags", "+faststart"])
            .path_arg(output)
            .input(video)
            .input(audio)
            .output(output))
    }

    /// Burn `subtitles` into `video` with the fixed house style.
    pub fn burn_subtitle(
        &self,
        video: &Path,
        subtitles: &Path,
        output: Option<&Path>,
    ) -> MediaResult<CommandDescriptor> {
        if video.as_os_str().is_empty() || subtitles.as_os_str().is_empty() {
            return Err(MediaError::invalid_argument("video path or subtitle path is empty"));
        }
        let output = output.unwrap_or_else(|| Path::new("final_with_sub.mp4"));

        Ok(self
            .ffmpeg()
            .arg("-y")
            .arg("-i")
            .path_arg(video)
            .arg("-vf")
            .arg(subtitle_filter(subtitles))
            .args(["-c:v", "libx264", "-preset", "veryfast", "-crf", "20"])
            .args(["-c:a", "copy", "-movflags", "+faststart"])
            .path_arg(output)
            .input(video)
            .input(subtitles)
            .output(output))
    }
}
