//! End-to-end dispatch tests with fake providers and `true` standing in for
//! every external tool.

#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use voxreel_media::{DurationProbe, MediaResult};
use voxreel_models::{
    BurnSubtitlePayload, ConcatPayload, GenScriptPayload, GenSubtitlePayload, MergePayload,
    MixdownPayload, RenderPayload, Task, TaskRequest, TaskType, TtsAllPayload, TtsSinglePayload,
};
use voxreel_queue::{PoolConfig, TaskHandler, WorkerPool};
use voxreel_storage::AssetDir;
use voxreel_worker::{
    ScriptGenerator, SpeechSynthesizer, TaskContext, TaskDispatcher, WorkerConfig, WorkerError,
    WorkerResult,
};

/// Returns canned segments and remembers the model it was asked for.
struct FakeScripts {
    segments: Vec<String>,
    models: Mutex<Vec<String>>,
}

#[async_trait]
impl ScriptGenerator for FakeScripts {
    async fn generate_script(
        &self,
        model: &str,
        _content: &str,
        system_prompt: &str,
    ) -> WorkerResult<Vec<String>> {
        assert!(!system_prompt.is_empty());
        self.models.lock().unwrap().push(model.to_string());
        Ok(self.segments.clone())
    }
}

/// "Synthesizes" the text itself as audio bytes.
#[derive(Default)]
struct FakeSpeech {
    calls: AtomicUsize,
}

#[async_trait]
impl SpeechSynthesizer for FakeSpeech {
    async fn synthesize(&self, text: &str) -> WorkerResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("wav:{}", text).into_bytes())
    }
}

struct FixedProbe(f64);

#[async_trait]
impl DurationProbe for FixedProbe {
    async fn duration(&self, _path: &Path) -> MediaResult<f64> {
        Ok(self.0)
    }
}

struct Harness {
    _dir: TempDir,
    root: PathBuf,
    scripts: Arc<FakeScripts>,
    speech: Arc<FakeSpeech>,
    dispatcher: TaskDispatcher,
}

fn harness_with(ffmpeg: &str) -> Harness {
    let dir = TempDir::new().expect("tempdir");
    let root = dir.path().to_path_buf();
    let config = WorkerConfig {
        store_dir: root.clone(),
        pool: PoolConfig::new(2, 4),
        ffmpeg_bin: ffmpeg.to_string(),
        whisper_bin: "true".to_string(),
        whisper_model: PathBuf::from("ggml-base.bin"),
        gemini_model: "default-model".to_string(),
        ..WorkerConfig::default()
    };
    let scripts = Arc::new(FakeScripts {
        segments: vec!["first line".to_string(), "second line".to_string()],
        models: Mutex::new(Vec::new()),
    });
    let speech = Arc::new(FakeSpeech::default());
    let ctx = TaskContext::new(
        config,
        scripts.clone(),
        speech.clone(),
        Arc::new(FixedProbe(20.0)),
        CancellationToken::new(),
    );

    Harness {
        _dir: dir,
        root,
        scripts,
        speech,
        dispatcher: TaskDispatcher::new(Arc::new(ctx)),
    }
}

fn harness() -> Harness {
    harness_with("true")
}

fn script_request(subject: &str) -> TaskRequest {
    TaskRequest::GenScript(GenScriptPayload {
        raw_text: "some long source text".to_string(),
        subject: subject.to_string(),
        segments: 2,
        min_chars: 5,
        max_chars: 50,
        ..Default::default()
    })
}

async fn with_script(h: &Harness, subject: &str) {
    h.dispatcher
        .dispatch(script_request(subject))
        .await
        .expect("script");
}

async fn with_audio(h: &Harness, subject: &str) {
    with_script(h, subject).await;
    h.dispatcher
        .dispatch(TaskRequest::GenTtsAll(TtsAllPayload {
            folder: subject.to_string(),
        }))
        .await
        .expect("tts");
}

#[tokio::test]
async fn test_script_creates_numbered_journal() {
    let h = harness();
    with_script(&h, "demo").await;

    let records = h.dispatcher.context().store.list("demo").await.unwrap();
    let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["0000", "0001"]);
    assert_eq!(records[1].text, "second line");
    assert!(records.iter().all(|r| !r.has_audio()));
    assert!(h.root.join("demo").join("audio").is_dir());
    assert_eq!(*h.scripts.models.lock().unwrap(), ["default-model"]);
}

#[tokio::test]
async fn test_script_model_override() {
    let h = harness();
    let mut request = script_request("demo");
    if let TaskRequest::GenScript(p) = &mut request {
        p.model = Some("other-model".to_string());
    }
    h.dispatcher.dispatch(request).await.unwrap();
    assert_eq!(*h.scripts.models.lock().unwrap(), ["other-model"]);
}

#[tokio::test]
async fn test_rerunning_script_hits_duplicate_ids() {
    let h = harness();
    with_script(&h, "demo").await;
    let err = h.dispatcher.dispatch(script_request("demo")).await.unwrap_err();
    assert!(matches!(err, WorkerError::Storage(_)));
}

#[tokio::test]
async fn test_tts_all_saves_audio_and_skips_on_rerun() {
    let h = harness();
    with_audio(&h, "demo").await;

    let store = &h.dispatcher.context().store;
    let records = store.list("demo").await.unwrap();
    assert_eq!(records[0].audio_id, "0000");
    assert_eq!(records[1].audio_id, "0001");
    let wav = std::fs::read(h.root.join("demo/audio/0001.wav")).unwrap();
    assert_eq!(wav, b"wav:second line");
    assert_eq!(h.speech.calls.load(Ordering::SeqCst), 2);

    // Lose one file: only that record is synthesized again.
    std::fs::remove_file(h.root.join("demo/audio/0000.wav")).unwrap();
    h.dispatcher
        .dispatch(TaskRequest::GenTtsAll(TtsAllPayload {
            folder: "demo".to_string(),
        }))
        .await
        .unwrap();
    assert_eq!(h.speech.calls.load(Ordering::SeqCst), 3);
    assert!(store
        .asset_exists("demo", AssetDir::Audio, "0000", ".wav")
        .await
        .unwrap());
}

#[tokio::test]
async fn test_tts_all_requires_folder() {
    let h = harness();
    let err = h
        .dispatcher
        .dispatch(TaskRequest::GenTtsAll(TtsAllPayload::default()))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkerError::InvalidPayload(_)));
}

#[tokio::test]
async fn test_tts_single_replaces_audio() {
    let h = harness();
    with_audio(&h, "demo").await;

    h.dispatcher
        .dispatch(TaskRequest::GenTtsSingle(TtsSinglePayload {
            folder: "demo".to_string(),
            nar_id: "0000".to_string(),
        }))
        .await
        .unwrap();
    assert_eq!(h.speech.calls.load(Ordering::SeqCst), 3);

    let records = h.dispatcher.context().store.list("demo").await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].audio_id, "0000");
}

#[tokio::test]
async fn test_tts_single_unknown_id() {
    let h = harness();
    with_script(&h, "demo").await;

    let err = h
        .dispatcher
        .dispatch(TaskRequest::GenTtsSingle(TtsSinglePayload {
            folder: "demo".to_string(),
            nar_id: "9999".to_string(),
        }))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkerError::RecordNotFound { ref id, .. } if id == "9999"));
}

#[tokio::test]
async fn test_concat_requires_audio_for_every_record() {
    let h = harness();
    with_script(&h, "demo").await;

    let err = h
        .dispatcher
        .dispatch(TaskRequest::ConcatWav(ConcatPayload {
            folder: "demo".to_string(),
        }))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkerError::MissingAudio { ref id, .. } if id == "0000"));
}

#[tokio::test]
async fn test_concat_writes_list_in_journal_order() {
    let h = harness();
    with_audio(&h, "demo").await;

    h.dispatcher
        .dispatch(TaskRequest::ConcatWav(ConcatPayload {
            folder: "demo".to_string(),
        }))
        .await
        .unwrap();

    let list = std::fs::read_to_string(h.root.join("demo/concat.txt")).unwrap();
    let lines: Vec<_> = list.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with("audio/0000.wav'"));
    assert!(lines[1].ends_with("audio/0001.wav'"));
}

#[tokio::test]
async fn test_render_without_clips() {
    let h = harness();
    with_script(&h, "demo").await;

    let err = h
        .dispatcher
        .dispatch(TaskRequest::Render(RenderPayload {
            folder: "demo".to_string(),
            dur: 15.0,
            ..Default::default()
        }))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkerError::NoClips(_)));
}

/// Shell script standing in for ffmpeg that writes its arguments, one per
/// line, to `args.txt` next to itself.
fn recording_tool(dir: &Path) -> (String, PathBuf) {
    use std::os::unix::fs::PermissionsExt;

    let log = dir.join("args.txt");
    let script = dir.join("ffmpeg.sh");
    std::fs::write(
        &script,
        format!("#!/bin/sh\nprintf '%s\\n' \"$@\" > '{}'\n", log.display()),
    )
    .unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    (script.to_string_lossy().into_owned(), log)
}

fn recorded_args(log: &Path) -> Vec<String> {
    std::fs::read_to_string(log)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

fn inputs(args: &[String]) -> Vec<&str> {
    args.windows(2)
        .filter(|w| w[0] == "-i")
        .map(|w| w[1].as_str())
        .collect()
}

fn value_after<'a>(args: &'a [String], flag: &str) -> &'a str {
    let i = args.iter().position(|a| a == flag).expect("flag present");
    &args[i + 1]
}

async fn with_clips(h: &Harness, subject: &str) {
    with_script(h, subject).await;
    let asset = h.root.join(subject).join("asset");
    std::fs::create_dir_all(&asset).unwrap();
    std::fs::write(asset.join("b.MP4"), b"").unwrap();
    std::fs::write(asset.join("a.mp4"), b"").unwrap();
    std::fs::write(asset.join("notes.txt"), b"").unwrap();
}

#[tokio::test]
async fn test_render_uses_sorted_clips_default_tail_cut_and_output() {
    let tools = TempDir::new().unwrap();
    let (ffmpeg, log) = recording_tool(tools.path());
    let h = harness_with(&ffmpeg);
    with_clips(&h, "demo").await;

    h.dispatcher
        .dispatch(TaskRequest::Render(RenderPayload {
            folder: "demo".to_string(),
            dur: 15.0,
            ..Default::default()
        }))
        .await
        .unwrap();

    let args = recorded_args(&log);
    let a = h.root.join("demo/asset/a.mp4").to_string_lossy().into_owned();
    let b = h.root.join("demo/asset/b.MP4").to_string_lossy().into_owned();
    assert_eq!(inputs(&args), [a.as_str(), b.as_str()]);

    // 20s clips minus the 10s default tail cut.
    let graph = value_after(&args, "-filter_complex");
    assert!(graph.contains("[0:v]trim=0:10.000,"));
    assert!(graph.contains("[1:v]trim=0:10.000,"));
    assert_eq!(value_after(&args, "-t"), "15.000");
    assert_eq!(
        args.last().unwrap(),
        &h.root.join("demo/out.mp4").to_string_lossy().into_owned()
    );
}

#[tokio::test]
async fn test_render_explicit_zero_tail_cut_and_named_output() {
    let tools = TempDir::new().unwrap();
    let (ffmpeg, log) = recording_tool(tools.path());
    let h = harness_with(&ffmpeg);
    with_clips(&h, "demo").await;

    h.dispatcher
        .dispatch(TaskRequest::Render(RenderPayload {
            folder: "demo".to_string(),
            dur: 15.0,
            tail_cut: Some(0.0),
            out: Some("final.mp4".to_string()),
            ..Default::default()
        }))
        .await
        .unwrap();

    let args = recorded_args(&log);
    // One untrimmed 20s clip already covers the target.
    assert_eq!(inputs(&args).len(), 1);
    assert!(value_after(&args, "-filter_complex").contains("[0:v]trim=0:20.000,"));
    assert_eq!(
        args.last().unwrap(),
        &h.root.join("demo/final.mp4").to_string_lossy().into_owned()
    );
}

#[tokio::test]
async fn test_concat_output_named_after_subject() {
    let tools = TempDir::new().unwrap();
    let (ffmpeg, log) = recording_tool(tools.path());
    let h = harness_with(&ffmpeg);
    with_audio(&h, "demo").await;

    h.dispatcher
        .dispatch(TaskRequest::ConcatWav(ConcatPayload {
            folder: "demo".to_string(),
        }))
        .await
        .unwrap();

    let args = recorded_args(&log);
    assert_eq!(
        value_after(&args, "-i"),
        h.root.join("demo/concat.txt").to_string_lossy()
    );
    assert_eq!(
        args.last().unwrap(),
        &h.root.join("demo/demo.wav").to_string_lossy().into_owned()
    );
}

#[tokio::test]
async fn test_render_rejects_nested_output() {
    let h = harness();
    with_script(&h, "demo").await;
    let asset = h.root.join("demo/asset");
    std::fs::create_dir_all(&asset).unwrap();
    std::fs::write(asset.join("a.mp4"), b"").unwrap();

    let err = h
        .dispatcher
        .dispatch(TaskRequest::Render(RenderPayload {
            folder: "demo".to_string(),
            dur: 15.0,
            out: Some("../escape.mp4".to_string()),
            ..Default::default()
        }))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkerError::InvalidPayload(_)));
}

#[tokio::test]
async fn test_mixdown_requires_both_inputs() {
    let h = harness();
    let err = h
        .dispatcher
        .dispatch(TaskRequest::Mixdown(MixdownPayload {
            audio_path: "voice.wav".to_string(),
            ..Default::default()
        }))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkerError::InvalidPayload(ref m) if m.contains("BGMPath")));

    h.dispatcher
        .dispatch(TaskRequest::Mixdown(MixdownPayload {
            audio_path: "voice.wav".to_string(),
            bgm_path: "bgm.mp3".to_string(),
            looped: true,
            ..Default::default()
        }))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_merge_and_subtitle_tasks_run() {
    let h = harness();

    h.dispatcher
        .dispatch(TaskRequest::Merge(MergePayload {
            video_path: "out.mp4".to_string(),
            audio_path: "out.m4a".to_string(),
            out_path: String::new(),
        }))
        .await
        .unwrap();

    h.dispatcher
        .dispatch(TaskRequest::GenSubtitle(GenSubtitlePayload {
            audio_path: "voice.wav".to_string(),
            output_path: "voice.srt".to_string(),
            lang: "zh".to_string(),
        }))
        .await
        .unwrap();

    h.dispatcher
        .dispatch(TaskRequest::BurnSubtitle(BurnSubtitlePayload {
            video_path: "final.mp4".to_string(),
            subtitle_path: "voice.srt".to_string(),
            output_path: String::new(),
        }))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_merge_rejects_empty_video() {
    let h = harness();
    let err = h
        .dispatcher
        .dispatch(TaskRequest::Merge(MergePayload {
            audio_path: "out.m4a".to_string(),
            ..Default::default()
        }))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkerError::Media(_)));
}

#[tokio::test]
async fn test_tool_failure_is_not_interrupted() {
    let h = harness_with("false");
    let err = h
        .dispatcher
        .dispatch(TaskRequest::Merge(MergePayload {
            video_path: "out.mp4".to_string(),
            audio_path: "out.m4a".to_string(),
            out_path: String::new(),
        }))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkerError::Media(_)));
    assert!(!err.is_interrupted());
}

#[tokio::test]
async fn test_handle_rejects_malformed_payload() {
    let h = harness();
    let task = Task::new(TaskType::Render, b"{\"folder\": 3}".to_vec());
    let err = h.dispatcher.handle(&task).await.unwrap_err();
    assert!(matches!(err, WorkerError::Model(_)));
}

#[tokio::test]
async fn test_pool_runs_submitted_tasks() {
    let h = harness();
    let pool = WorkerPool::new(PoolConfig::new(2, 4), Arc::new(h.dispatcher.clone()));
    let cancel = CancellationToken::new();

    pool.submit_request(&cancel, &script_request("pooled"))
        .await
        .expect("submit script");
    pool.shutdown().await;

    let records = h.dispatcher.context().store.list("pooled").await.unwrap();
    assert_eq!(records.len(), 2);

    let err = pool
        .submit(&cancel, TaskType::GenTtsAll, &json!({ "folder": "pooled" }))
        .await
        .unwrap_err();
    assert!(matches!(err, voxreel_queue::QueueError::Closed));
}
