//! Duration-fill planning and concat-demuxer list files.

use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{MediaError, MediaResult};
use crate::filters::escape_single_quotes;

/// Shortest segment a clip can contribute, whatever the tail trim.
pub const MIN_SEGMENT_SECS: f64 = 0.05;

/// Most segments a looped fill may produce. Every segment becomes its own
/// ffmpeg input.
pub const MAX_FILL_SEGMENTS: usize = 1024;

/// Whether a looped fill of `target` stays within [`MAX_FILL_SEGMENTS`].
pub fn fill_within_limit(segments: &[MediaSegment], target: f64) -> bool {
    let pass: f64 = segments
        .iter()
        .map(|s| s.effective_duration.max(MIN_SEGMENT_SECS))
        .sum();
    if segments.is_empty() || pass <= 0.0 {
        return true;
    }
    let passes = (target / pass).ceil();
    passes * segments.len() as f64 <= MAX_FILL_SEGMENTS as f64
}

/// A clip annotated with its post-trim duration.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaSegment {
    pub path: PathBuf,
    pub effective_duration: f64,
}

/// Real duration minus the tail trim, floored at [`MIN_SEGMENT_SECS`].
pub fn effective_duration(real: f64, tail_trim: f64) -> f64 {
    (real - tail_trim.max(0.0)).max(MIN_SEGMENT_SECS)
}

/// Greedy, order-preserving fill of `target` seconds from `segments`.
///
/// Segments are taken in order until the running sum reaches `target`. With
/// `looped` the list is cycled until the target is met; without it a single
/// pass may fall short. Every segment is at least [`MIN_SEGMENT_SECS`] long
/// (enforced by [`effective_duration`]), so the loop terminates.
pub fn plan_fill(segments: &[MediaSegment], target: f64, looped: bool) -> Vec<MediaSegment> {
    let mut sequence = Vec::new();
    if segments.is_empty() || target <= 0.0 {
        return sequence;
    }

    let mut sum = 0.0;
    loop {
        for seg in segments {
            if sum >= target {
                return sequence;
            }
            sequence.push(seg.clone());
            sum += seg.effective_duration.max(MIN_SEGMENT_SECS);
        }
        if !looped || sum >= target {
            return sequence;
        }
    }
}

/// One `file '<path>'` line of a concat-demuxer list.
pub fn concat_list_line(path: &Path) -> String {
    format!("file '{}'\n", escape_single_quotes(&path.to_string_lossy()))
}

/// Write a concat-demuxer list with one absolute path per line.
pub async fn write_concat_list(list_path: &Path, inputs: &[PathBuf]) -> MediaResult<()> {
    if inputs.is_empty() {
        return Err(MediaError::empty_input("concat list inputs"));
    }

    if let Some(parent) = list_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut body = String::new();
    for input in inputs {
        body.push_str(&concat_list_line(&absolute(input)?));
    }

    let mut file = fs::File::create(list_path).await?;
    file.write_all(body.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

fn absolute(path: &Path) -> MediaResult<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(std::env::current_dir()?.join(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn segs(durations: &[f64]) -> Vec<MediaSegment> {
        durations
            .iter()
            .enumerate()
            .map(|(i, d)| MediaSegment {
                path: PathBuf::from(format!("/clips/{}.mp4", i)),
                effective_duration: *d,
            })
            .collect()
    }

    fn paths(seq: &[MediaSegment]) -> Vec<String> {
        seq.iter().map(|s| s.path.to_string_lossy().to_string()).collect()
    }

    #[test]
    fn test_effective_duration() {
        assert_eq!(effective_duration(12.0, 2.0), 10.0);
        assert_eq!(effective_duration(1.0, 5.0), MIN_SEGMENT_SECS);
        assert_eq!(effective_duration(8.0, -3.0), 8.0);
    }

    #[test]
    fn test_single_pass_overshoots_once() {
        // Real [12, 8, 15] with a 2s tail trim.
        let clips: Vec<_> = [12.0, 8.0, 15.0]
            .iter()
            .map(|d| effective_duration(*d, 2.0))
            .collect();
        assert_eq!(clips, vec![10.0, 6.0, 13.0]);

        let seq = plan_fill(&segs(&clips), 20.0, false);
        assert_eq!(paths(&seq), ["/clips/0.mp4", "/clips/1.mp4", "/clips/2.mp4"]);
    }

    #[test]
    fn test_stops_as_soon_as_target_reached() {
        let seq = plan_fill(&segs(&[10.0, 10.0, 10.0]), 20.0, false);
        assert_eq!(seq.len(), 2);
    }

    #[test]
    fn test_short_without_loop_is_accepted() {
        let seq = plan_fill(&segs(&[3.0, 4.0]), 60.0, false);
        assert_eq!(seq.len(), 2);
    }

    #[test]
    fn test_loop_repeats_single_clip() {
        let seq = plan_fill(&segs(&[5.0]), 17.0, true);
        assert_eq!(seq.len(), 4);
        assert!(seq.iter().all(|s| s.path == PathBuf::from("/clips/0.mp4")));
    }

    #[test]
    fn test_loop_keeps_cycle_order() {
        let seq = plan_fill(&segs(&[4.0, 3.0]), 15.0, true);
        assert_eq!(
            paths(&seq),
            ["/clips/0.mp4", "/clips/1.mp4", "/clips/0.mp4", "/clips/1.mp4", "/clips/0.mp4"]
        );
    }

    #[test]
    fn test_fill_limit() {
        assert!(fill_within_limit(&segs(&[5.0]), 17.0));
        assert!(fill_within_limit(&segs(&[1.0, 1.0]), 1024.0));
        assert!(!fill_within_limit(&segs(&[1.0, 1.0]), 1026.0));
        assert!(!fill_within_limit(&segs(&[10.0]), 1e9));
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(plan_fill(&[], 10.0, true).is_empty());
        assert!(plan_fill(&segs(&[1.0]), 0.0, true).is_empty());
    }

    #[test]
    fn test_concat_list_line_escapes_quotes() {
        assert_eq!(concat_list_line(Path::new("/a/x.wav")), "file '/a/x.wav'\n");
        assert_eq!(
            concat_list_line(Path::new("/a/o'brien.wav")),
            "file '/a/o'\\''brien.wav'\n"
        );
    }

    #[tokio::test]
    async fn test_write_concat_list() {
        let dir = TempDir::new().unwrap();
        let list = dir.path().join("nested").join("concat.txt");

        write_concat_list(
            &list,
            &[PathBuf::from("/a/x.wav"), PathBuf::from("/a/o'brien.wav")],
        )
        .await
        .unwrap();

        let body = fs::read_to_string(&list).await.unwrap();
        assert_eq!(body, "file '/a/x.wav'\nfile '/a/o'\\''brien.wav'\n");
    }

    #[tokio::test]
    async fn test_write_concat_list_rejects_empty() {
        let dir = TempDir::new().unwrap();
        let err = write_concat_list(&dir.path().join("concat.txt"), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::EmptyInput(_)));
    }
}
