pub mod cosplay_cnn;

use candle::{Device, Tensor};

use crate::preprocess::InputSize;

/// An inference engine mapping a `[1, 3, H, W]` image tensor to one score per class.
///
/// Implementations are loaded once and shared read-only across request workers.
pub trait ImageClassifier: Send + Sync {
    fn input_size(&self) -> InputSize;

    fn num_classes(&self) -> usize;

    fn device(&self) -> &Device;

    fn forward(&self, input: &Tensor) -> anyhow::Result<Vec<f32>>;
}
