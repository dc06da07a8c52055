//! FFmpeg filter graph definitions.

use std::fmt::Write;
use std::path::Path;

use crate::concat::MediaSegment;

/// Subtitle style burned into rendered videos.
pub const SUBTITLE_FORCE_STYLE: &str = "FontName=Arial,FontSize=18,Outline=2";

/// Background volume used when a mixdown asks for a non-positive one.
pub const DEFAULT_BLEND_VOLUME: f64 = 0.18;

/// Output frame geometry for rendered videos.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSpec {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for FrameSpec {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fps: 30,
        }
    }
}

/// Build the filter graph that trims, normalizes and concatenates `segments`.
///
/// Input `i` of the command must be `segments[i]`. Audio is dropped; the
/// result is labelled `[vout]`.
pub fn concat_video_graph(segments: &[MediaSegment], frame: FrameSpec) -> String {
    let FrameSpec { width, height, fps } = frame;
    let mut graph = String::new();

    for (i, seg) in segments.iter().enumerate() {
        let _ = write!(
            graph,
            "[{i}:v]trim=0:{eff:.3},setpts=PTS-STARTPTS,\
             scale={width}:{height}:force_original_aspect_ratio=decrease,\
             pad={width}:{height}:(ow-iw)/2:(oh-ih)/2,setsar=1,fps={fps}[v{i}];",
            eff = seg.effective_duration,
        );
    }

    for i in 0..segments.len() {
        let _ = write!(graph, "[v{i}]");
    }

    let _ = write!(
        graph,
        "concat=n={}:v=1:a=0,format=yuv420p[vout]",
        segments.len()
    );
    graph
}

/// Two-input audio blend: input 1 attenuated to `volume` and mixed under
/// input 0, ending with input 0.
pub fn blend_graph(volume: f64) -> String {
    let volume = if volume > 0.0 {
        volume
    } else {
        DEFAULT_BLEND_VOLUME
    };
    format!(
        "[1:a]volume={:.3}[a1];[0:a][a1]amix=inputs=2:duration=first:dropout_transition=2[aout]",
        volume
    )
}

/// Subtitle burn-in filter for `subtitle_path`.
pub fn subtitle_filter(subtitle_path: &Path) -> String {
    format!(
        "subtitles='{}':force_style='{}'",
        escape_single_quotes(&subtitle_path.to_string_lossy()),
        SUBTITLE_FORCE_STYLE
    )
}

/// Escape single quotes by closing the quote, emitting `\'`, and reopening.
pub fn escape_single_quotes(s: &str) -> String {
    s.replace('\'', r"'\''")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn seg(path: &str, eff: f64) -> MediaSegment {
        MediaSegment {
            path: PathBuf::from(path),
            effective_duration: eff,
        }
    }

    #[test]
    fn test_concat_video_graph() {
        let graph = concat_video_graph(&[seg("a.mp4", 10.0), seg("b.mp4", 6.25)], FrameSpec::default());

        assert!(graph.starts_with("[0:v]trim=0:10.000,setpts=PTS-STARTPTS,scale=1920:1080"));
        assert!(graph.contains("[1:v]trim=0:6.250,"));
        assert!(graph.contains("setsar=1,fps=30[v1];"));
        assert!(graph.ends_with("[v0][v1]concat=n=2:v=1:a=0,format=yuv420p[vout]"));
    }

    #[test]
    fn test_blend_graph_default_volume() {
        assert!(blend_graph(0.0).starts_with("[1:a]volume=0.180[a1];"));
        assert!(blend_graph(-1.0).starts_with("[1:a]volume=0.180[a1];"));
        assert!(blend_graph(0.5).contains("volume=0.500"));
        assert!(blend_graph(0.5).ends_with("amix=inputs=2:duration=first:dropout_transition=2[aout]"));
    }

    #[test]
    fn test_subtitle_filter() {
        assert_eq!(
            subtitle_filter(Path::new("/s/sub.srt")),
            "subtitles='/s/sub.srt':force_style='FontName=Arial,FontSize=18,Outline=2'"
        );
    }

    #[test]
    fn test_escape_single_quotes() {
        assert_eq!(escape_single_quotes("/a/o'brien.wav"), r"/a/o'\''brien.wav");
        assert_eq!(escape_single_quotes("/a/x.wav"), "/a/x.wav");
    }
}
