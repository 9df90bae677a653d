pub mod config;
pub mod embedding;
pub mod errors;

pub use config::{load_config, save_config, AppConfig, ModelConfig};
pub use embedding::{Embedder, FeatureExtractor, OnnxExtractor};
pub use errors::{EmbedError, EmbedResult};

/// Install the global tracing subscriber. Call once from the process that
/// hosts the embedder; respects RUST_LOG via the env filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
