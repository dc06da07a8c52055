//! Volcengine TTS client.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::SpeechSynthesizer;
use crate::error::{WorkerError, WorkerResult};

pub const DEFAULT_TTS_ENDPOINT: &str = "https://openspeech.bytedance.com/api/v1/tts";
pub const DEFAULT_TTS_CLUSTER: &str = "volcano_icl";
const DEFAULT_UID: &str = "voxreel";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Response code the service uses for success.
const CODE_OK: i64 = 3000;

/// Volcengine TTS client configuration.
#[derive(Debug, Clone)]
pub struct VolcTtsConfig {
    pub endpoint: String,
    pub api_key: String,
    pub cluster: String,
    pub uid: String,
    pub voice_type: String,
    /// Audio container; the rest of the pipeline expects `wav`
    pub encoding: String,
    pub speed_ratio: f64,
}

impl Default for VolcTtsConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_TTS_ENDPOINT.to_string(),
            api_key: String::new(),
            cluster: DEFAULT_TTS_CLUSTER.to_string(),
            uid: DEFAULT_UID.to_string(),
            voice_type: String::new(),
            encoding: "wav".to_string(),
            speed_ratio: 1.0,
        }
    }
}

#[derive(Debug, Serialize)]
struct SynthesizeRequest<'a> {
    app: App<'a>,
    user: User<'a>,
    audio: Audio<'a>,
    request: RequestBody<'a>,
}

#[derive(Debug, Serialize)]
struct App<'a> {
    cluster: &'a str,
}

#[derive(Debug, Serialize)]
struct User<'a> {
    uid: &'a str,
}

#[derive(Debug, Serialize)]
struct Audio<'a> {
    voice_type: &'a str,
    encoding: &'a str,
    speed_ratio: f64,
}

#[derive(Debug, Serialize)]
struct RequestBody<'a> {
    reqid: String,
    text: &'a str,
    operation: &'static str,
}

#[derive(Debug, Deserialize)]
struct SynthesizeResponse {
    #[serde(default)]
    reqid: String,
    code: i64,
    #[serde(default, alias = "Message")]
    message: String,
    #[serde(default)]
    data: String,
}

/// Volcengine TTS client.
pub struct VolcTtsClient {
    config: VolcTtsConfig,
    client: Client,
}

impl VolcTtsClient {
    pub fn new(config: VolcTtsConfig) -> WorkerResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(WorkerError::config_error("TTS_API_KEY not set"));
        }
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl SpeechSynthesizer for VolcTtsClient {
    async fn synthesize(&self, text: &str) -> WorkerResult<Vec<u8>> {
        let reqid = uuid::Uuid::new_v4().to_string();
        let request = SynthesizeRequest {
            app: App {
                cluster: &self.config.cluster,
            },
            user: User {
                uid: &self.config.uid,
            },
            audio: Audio {
                voice_type: &self.config.voice_type,
                encoding: &self.config.encoding,
                speed_ratio: self.config.speed_ratio,
            },
            request: RequestBody {
                reqid: reqid.clone(),
                text,
                operation: "query",
            },
        };

        debug!(reqid = %reqid, text_len = text.len(), "Requesting speech synthesis");

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("x-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WorkerError::provider_failed(format!("tts http {}", status.as_u16())));
        }

        let body: SynthesizeResponse = response.json().await?;
        if body.code != CODE_OK {
            let message = if body.message.is_empty() {
                format!("tts code={}", body.code)
            } else {
                format!("tts code={} msg={}", body.code, body.message)
            };
            return Err(WorkerError::provider_failed(message));
        }

        let audio = base64::engine::general_purpose::STANDARD
            .decode(body.data.as_bytes())
            .map_err(|e| WorkerError::provider_failed(format!("tts audio is not base64: {}", e)))?;

        debug!(reqid = %body.reqid, bytes = audio.len(), "Speech synthesized");
        Ok(audio)
    }
}
