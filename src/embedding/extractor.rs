/// ONNX-backed image feature extraction.
///
/// Loads a pretrained CNN (ResNet-50 by default) and produces one raw
/// feature vector per image, wrapped in the batched tensor layout the
/// embedder consumes.
use ndarray::{Array3, Array4, ArrayD};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;

use crate::config::ModelConfig;
use crate::errors::{EmbedError, EmbedResult};

/// Strategy trait for the image-embedding capability.
///
/// Output shape is `[batch, item, dim]`: one image in, a batch of one
/// holding a single feature vector out. Exclusive access is required
/// because ONNX Runtime sessions run under a mutable borrow.
pub trait FeatureExtractor: Send + Sync {
    fn extract(&mut self, image: &image::DynamicImage) -> EmbedResult<Array3<f32>>;
}

/// Holds the ONNX Runtime session and preprocessing configuration.
pub struct OnnxExtractor {
    session: Session,
    input_size: u32,
    mean: [f32; 3],
    std: [f32; 3],
}

impl OnnxExtractor {
    /// Load the model named in `config`. This is the expensive one-time
    /// step of the embedder lifecycle.
    pub fn load(config: &ModelConfig) -> EmbedResult<Self> {
        if !Path::new(&config.model_path).exists() {
            return Err(EmbedError::Config(format!(
                "embedding model not found: {}",
                config.model_path
            )));
        }

        let session = Session::builder()
            .map_err(|e| EmbedError::Extraction(format!("ort session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| EmbedError::Extraction(format!("ort opt-level: {e}")))?
            .commit_from_file(&config.model_path)
            .map_err(|e| EmbedError::Extraction(format!("ort load model: {e}")))?;

        tracing::info!(path = %config.model_path, input_size = config.input_size, "embedding model loaded");

        Ok(Self {
            session,
            input_size: config.input_size,
            mean: config.mean,
            std: config.std,
        })
    }

    /// Resize + RGB convert + per-channel normalise → NCHW f32 tensor.
    fn preprocess(&self, img: &image::DynamicImage) -> Array4<f32> {
        let sz = self.input_size;
        let resized = img.resize_exact(sz, sz, image::imageops::FilterType::CatmullRom);
        let rgb = resized.to_rgb8();

        let mut tensor = Array4::<f32>::zeros((1, 3, sz as usize, sz as usize));
        for y in 0..sz {
            for x in 0..sz {
                let p = rgb.get_pixel(x, y);
                tensor[[0, 0, y as usize, x as usize]] =
                    (p[0] as f32 / 255.0 - self.mean[0]) / self.std[0];
                tensor[[0, 1, y as usize, x as usize]] =
                    (p[1] as f32 / 255.0 - self.mean[1]) / self.std[1];
                tensor[[0, 2, y as usize, x as usize]] =
                    (p[2] as f32 / 255.0 - self.mean[2]) / self.std[2];
            }
        }
        tensor
    }
}

impl FeatureExtractor for OnnxExtractor {
    fn extract(&mut self, image: &image::DynamicImage) -> EmbedResult<Array3<f32>> {
        let input_tensor = self.preprocess(image);

        // Inference — convert ndarray to ort Tensor, then run
        let input_value = Tensor::from_array(input_tensor)
            .map_err(|e| EmbedError::Extraction(format!("ort tensor: {e}")))?;

        let output_owned = {
            let outputs = self
                .session
                .run(ort::inputs![input_value])
                .map_err(|e| EmbedError::Extraction(format!("ort run: {e}")))?;

            outputs[0]
                .try_extract_array::<f32>()
                .map_err(|e| EmbedError::Extraction(format!("extract tensor: {e}")))?
                .to_owned()
            // `outputs` (and the mutable borrow on session) is dropped here
        };

        batch_of_one(output_owned)
    }
}

/// Collapse a model output of shape `[1, D]` (or `[1, D, 1, 1]` for models
/// that keep their pooling axes) into the `[batch, item, dim]` layout.
fn batch_of_one(output: ArrayD<f32>) -> EmbedResult<Array3<f32>> {
    let shape = output.shape().to_vec();
    let batch = shape.first().copied().unwrap_or(0);
    if batch == 0 || output.is_empty() {
        return Err(EmbedError::Extraction(format!(
            "unexpected output shape: {:?}",
            shape
        )));
    }

    let dim = output.len() / batch;
    let flat: Vec<f32> = output.iter().copied().collect();
    Array3::from_shape_vec((batch, 1, dim), flat)
        .map_err(|e| EmbedError::Extraction(format!("reshape output: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::IxDyn;

    #[test]
    fn batch_of_one_collapses_pooling_axes() {
        let output = ArrayD::from_shape_vec(IxDyn(&[1, 4, 1, 1]), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let nested = batch_of_one(output).unwrap();
        assert_eq!(nested.shape(), &[1, 1, 4]);
        assert_eq!(nested[[0, 0, 2]], 3.0);
    }

    #[test]
    fn batch_of_one_keeps_flat_output() {
        let output = ArrayD::from_shape_vec(IxDyn(&[1, 3]), vec![0.5, 0.25, 0.125]).unwrap();
        let nested = batch_of_one(output).unwrap();
        assert_eq!(nested.shape(), &[1, 1, 3]);
        assert_eq!(nested[[0, 0, 0]], 0.5);
    }

    #[test]
    fn batch_of_one_rejects_empty_output() {
        let output = ArrayD::from_shape_vec(IxDyn(&[0, 3]), vec![]).unwrap();
        assert!(matches!(
            batch_of_one(output),
            Err(EmbedError::Extraction(_))
        ));
    }

    #[test]
    fn missing_model_file_is_config_error() {
        let config = ModelConfig {
            model_path: "does/not/exist.onnx".to_string(),
            ..ModelConfig::default()
        };
        assert!(matches!(
            OnnxExtractor::load(&config),
            Err(EmbedError::Config(_))
        ));
    }
}
