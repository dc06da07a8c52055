//! Narration video task worker.
//!
//! This crate provides:
//! - Task dispatcher for the nine task types
//! - Gemini script generation and Volcengine speech synthesis clients
//! - Handlers that drive the narration store and the media pipeline
//! - Worker configuration and structured task logging

pub mod config;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod metrics;
pub mod prompt;
pub mod providers;

pub use config::WorkerConfig;
pub use context::TaskContext;
pub use dispatcher::TaskDispatcher;
pub use error::{WorkerError, WorkerResult};
pub use logging::TaskLogger;
pub use prompt::{PromptConfig, PromptRenderer};
pub use providers::{ScriptGenerator, SpeechSynthesizer};
