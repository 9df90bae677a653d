use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::{EmbedError, EmbedResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub model: ModelConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Path to the ONNX feature-extraction model (overridable via the
    /// IMGEMBED_MODEL env var).
    pub model_path: String,
    /// Square input resolution expected by the model.
    #[serde(default = "default_input_size")]
    pub input_size: u32,
    /// Per-channel mean subtracted after scaling pixels to [0, 1].
    #[serde(default = "default_mean")]
    pub mean: [f32; 3],
    /// Per-channel divisor applied after mean subtraction.
    #[serde(default = "default_std")]
    pub std: [f32; 3],
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_path: "models/resnet50.onnx".to_string(),
            input_size: default_input_size(),
            mean: default_mean(),
            std: default_std(),
        }
    }
}

fn default_input_size() -> u32 {
    224
}

// ImageNet channel statistics, matching the pretrained extractor.
fn default_mean() -> [f32; 3] {
    [0.485, 0.456, 0.406]
}

fn default_std() -> [f32; 3] {
    [0.229, 0.224, 0.225]
}

fn resolve_config_path() -> EmbedResult<PathBuf> {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(parent) = exe.parent() {
            let candidate = parent.join("config.toml");
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "config found next to executable");
                return Ok(candidate);
            }
        }
    }

    let cwd = std::env::current_dir()?;
    let candidate = cwd.join("config.toml");
    if candidate.exists() {
        tracing::debug!(path = %candidate.display(), "config found in working directory");
        return Ok(candidate);
    }

    Err(EmbedError::Config(
        "config.toml not found next to executable or in working directory".into(),
    ))
}

pub fn load_config() -> EmbedResult<AppConfig> {
    let path = resolve_config_path()?;
    let content = std::fs::read_to_string(&path)?;
    let mut config: AppConfig = toml::from_str(&content)?;
    if let Ok(model_path) = std::env::var("IMGEMBED_MODEL") {
        tracing::debug!(path = %model_path, "model path taken from IMGEMBED_MODEL");
        config.model.model_path = model_path;
    }
    tracing::info!(path = %path.display(), model = %config.model.model_path, "config loaded");
    Ok(config)
}

pub fn save_config(config: &AppConfig) -> EmbedResult<()> {
    let path = resolve_config_path()?;
    let content = toml::to_string_pretty(config)?;
    std::fs::write(&path, content)?;
    tracing::info!(path = %path.display(), "config saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_fills_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [model]
            model_path = "weights/encoder.onnx"
            "#,
        )
        .unwrap();

        assert_eq!(config.model.model_path, "weights/encoder.onnx");
        assert_eq!(config.model.input_size, 224);
        assert_eq!(config.model.mean, [0.485, 0.456, 0.406]);
        assert_eq!(config.model.std, [0.229, 0.224, 0.225]);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [model]
            model_path = "weights/clip.onnx"
            input_size = 336
            mean = [0.5, 0.5, 0.5]
            std = [0.5, 0.5, 0.5]
            "#,
        )
        .unwrap();

        assert_eq!(config.model.input_size, 336);
        assert_eq!(config.model.mean, [0.5, 0.5, 0.5]);
    }
}
