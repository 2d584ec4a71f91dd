//! Model/asset downloads
//!
//! Ensures the default whisper model and, when the LLM server resolved,
//! the default llama model. Both are best-effort: a failed model download
//! degrades the feature and shows up in the final report, it never aborts
//! the run.

use std::path::PathBuf;

use tracing::warn;

use crate::error::Result;
use crate::{net, paths};

use super::release;

/// Default speech model file name
pub const WHISPER_MODEL: &str = "ggml-base.en.bin";
const WHISPER_MODEL_URL: &str =
    "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-base.en.bin";

/// Default AI post-processing model file name
pub const LLAMA_MODEL: &str = "qwen2.5-3b-instruct-q4_k_m.gguf";
const LLAMA_MODEL_URL: &str =
    "https://huggingface.co/Qwen/Qwen2.5-3B-Instruct-GGUF/resolve/main/qwen2.5-3b-instruct-q4_k_m.gguf?download=true";

fn ensure_model(dir: PathBuf, name: &str, url: &str) -> Result<Option<PathBuf>> {
    let dest = dir.join(name);
    if dest.is_file() {
        return Ok(Some(dest));
    }
    std::fs::create_dir_all(&dir)?;
    let client = net::client();
    match release::download_to(&client, url, &dest, name) {
        Ok(()) => Ok(Some(dest)),
        Err(err) => {
            warn!("model download failed for {name}: {err}");
            Ok(None)
        }
    }
}

/// Ensure the default whisper model; `None` means the download failed
pub fn ensure_whisper_model() -> Result<Option<PathBuf>> {
    ensure_model(paths::models_dir()?, WHISPER_MODEL, WHISPER_MODEL_URL)
}

/// Ensure the default llama model; `None` means the download failed
pub fn ensure_llama_model() -> Result<Option<PathBuf>> {
    ensure_model(paths::llama_models_dir()?, LLAMA_MODEL, LLAMA_MODEL_URL)
}
