pub mod embedder;
pub mod extractor;

pub use embedder::Embedder;
pub use extractor::{FeatureExtractor, OnnxExtractor};
