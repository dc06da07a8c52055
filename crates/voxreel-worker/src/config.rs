//! Worker configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use voxreel_queue::PoolConfig;

use crate::providers::gemini::DEFAULT_GEMINI_BASE_URL;
use crate::providers::volc::{DEFAULT_TTS_CLUSTER, DEFAULT_TTS_ENDPOINT};

/// Worker configuration.
#[derive(Clone)]
pub struct WorkerConfig {
    /// Root directory of the narration store
    pub store_dir: PathBuf,
    /// Worker count and queue capacity
    pub pool: PoolConfig,
    /// Deadline for every external command
    pub command_timeout: Duration,
    /// Deadline for audio mixdowns
    pub mixdown_timeout: Duration,
    pub ffmpeg_bin: String,
    pub ffprobe_bin: String,
    pub whisper_bin: String,
    /// whisper.cpp model file
    pub whisper_model: PathBuf,
    pub gemini_api_key: String,
    /// Model used when a script request names none
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub tts_api_key: String,
    pub tts_voice_type: String,
    pub tts_endpoint: String,
    pub tts_cluster: String,
    /// Tail cut applied by renders that do not specify one
    pub default_tail_cut_secs: f64,
    /// Prometheus listener address; no exporter when unset
    pub metrics_addr: Option<SocketAddr>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from("./store"),
            pool: PoolConfig::default(),
            command_timeout: Duration::from_secs(3600), // 1 hour
            mixdown_timeout: Duration::from_secs(600),  // 10 minutes
            ffmpeg_bin: "ffmpeg".to_string(),
            ffprobe_bin: "ffprobe".to_string(),
            whisper_bin: "whisper-cli".to_string(),
            whisper_model: PathBuf::new(),
            gemini_api_key: String::new(),
            gemini_model: "gemini-3-flash-preview".to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            tts_api_key: String::new(),
            tts_voice_type: String::new(),
            tts_endpoint: DEFAULT_TTS_ENDPOINT.to_string(),
            tts_cluster: DEFAULT_TTS_CLUSTER.to_string(),
            default_tail_cut_secs: 10.0,
            metrics_addr: None,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            store_dir: env_string("STORE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.store_dir),
            pool: PoolConfig::from_env(),
            command_timeout: Duration::from_secs(env_parse("COMMAND_TIMEOUT_SECS").unwrap_or(3600)),
            mixdown_timeout: Duration::from_secs(env_parse("MIXDOWN_TIMEOUT_SECS").unwrap_or(600)),
            ffmpeg_bin: env_string("FFMPEG_BIN").unwrap_or(defaults.ffmpeg_bin),
            ffprobe_bin: env_string("FFPROBE_BIN").unwrap_or(defaults.ffprobe_bin),
            whisper_bin: env_string("WHISPER_BIN").unwrap_or(defaults.whisper_bin),
            whisper_model: env_string("WHISPER_MODEL")
                .map(PathBuf::from)
                .unwrap_or(defaults.whisper_model),
            gemini_api_key: env_string("GEMINI_API_KEY").unwrap_or_default(),
            gemini_model: env_string("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            gemini_base_url: env_string("GEMINI_BASE_URL").unwrap_or(defaults.gemini_base_url),
            tts_api_key: env_string("TTS_API_KEY").unwrap_or_default(),
            tts_voice_type: env_string("TTS_VOICE_TYPE").unwrap_or_default(),
            tts_endpoint: env_string("TTS_ENDPOINT").unwrap_or(defaults.tts_endpoint),
            tts_cluster: env_string("TTS_CLUSTER").unwrap_or(defaults.tts_cluster),
            default_tail_cut_secs: env_parse("DEFAULT_TAIL_CUT_SECS")
                .filter(|v: &f64| v.is_finite() && *v >= 0.0)
                .unwrap_or(defaults.default_tail_cut_secs),
            metrics_addr: env_parse("METRICS_ADDR"),
        }
    }
}

// API keys stay out of logs.
impl std::fmt::Debug for WorkerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerConfig")
            .field("store_dir", &self.store_dir)
            .field("pool", &self.pool)
            .field("command_timeout", &self.command_timeout)
            .field("mixdown_timeout", &self.mixdown_timeout)
            .field("ffmpeg_bin", &self.ffmpeg_bin)
            .field("ffprobe_bin", &self.ffprobe_bin)
            .field("whisper_bin", &self.whisper_bin)
            .field("whisper_model", &self.whisper_model)
            .field("gemini_api_key", &redact(&self.gemini_api_key))
            .field("gemini_model", &self.gemini_model)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("tts_api_key", &redact(&self.tts_api_key))
            .field("tts_voice_type", &self.tts_voice_type)
            .field("tts_endpoint", &self.tts_endpoint)
            .field("tts_cluster", &self.tts_cluster)
            .field("default_tail_cut_secs", &self.default_tail_cut_secs)
            .field("metrics_addr", &self.metrics_addr)
            .finish()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|s| s.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorkerConfig::default();
        assert_eq!(config.command_timeout, Duration::from_secs(3600));
        assert_eq!(config.mixdown_timeout, Duration::from_secs(600));
        assert_eq!(config.default_tail_cut_secs, 10.0);
        assert_eq!(config.pool, PoolConfig::new(5, 40));
        assert!(config.metrics_addr.is_none());
    }

    #[test]
    fn test_debug_redacts_keys() {
        let config = WorkerConfig {
            gemini_api_key: "g-secret".to_string(),
            tts_api_key: "t-secret".to_string(),
            ..WorkerConfig::default()
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
