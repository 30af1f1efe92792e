// Inference adapter: image bytes in, ranked class names out
use std::sync::Arc;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::PredictError;
use crate::labels::ClassNames;
use crate::models::ImageClassifier;
use crate::preprocess;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub character: String,
    pub confidence: f32,
}

/// Response payload of a classification: the best match first, then the top-k ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub character: String,
    pub confidence: f32,
    pub predictions: Vec<Candidate>,
}

#[derive(Clone)]
pub struct Predictor {
    model: Arc<dyn ImageClassifier>,
    class_names: Arc<ClassNames>,
    top_k: usize,
}

impl Predictor {
    /// Pairs a model with its label vocabulary.
    ///
    /// The label count must equal the model's output width, otherwise label
    /// lookup would be undefined.
    pub fn new(
        model: Arc<dyn ImageClassifier>,
        class_names: Arc<ClassNames>,
        top_k: usize,
    ) -> anyhow::Result<Self> {
        if class_names.len() != model.num_classes() {
            anyhow::bail!(
                "{} class names loaded but the model predicts {} classes",
                class_names.len(),
                model.num_classes()
            );
        }
        let top_k = top_k.clamp(1, class_names.len());
        Ok(Self {
            model,
            class_names,
            top_k,
        })
    }

    pub fn class_names(&self) -> &ClassNames {
        &self.class_names
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn predict(&self, bytes: &[u8]) -> Result<Prediction, PredictError> {
        let image = preprocess::decode(bytes)?;
        self.predict_image(&image)
    }

    pub fn predict_image(&self, image: &DynamicImage) -> Result<Prediction, PredictError> {
        let input = preprocess::to_input_tensor(image, self.model.input_size(), self.model.device())?;
        let scores = self.model.forward(&input)?;
        self.rank(&scores)
    }

    /// Maps a score vector onto class names, best first. Ties keep index order.
    ///
    /// NaN or infinite scores are an inference failure rather than a ranking.
    pub fn rank(&self, scores: &[f32]) -> Result<Prediction, PredictError> {
        if scores.len() != self.class_names.len() {
            return Err(PredictError::ScoreCount {
                expected: self.class_names.len(),
                actual: scores.len(),
            });
        }
        if let Some(index) = scores.iter().position(|score| !score.is_finite()) {
            return Err(PredictError::Inference(anyhow::anyhow!(
                "model produced a non-finite score ({}) for class {}",
                scores[index],
                index
            )));
        }

        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

        let predictions: Vec<Candidate> = order
            .into_iter()
            .take(self.top_k)
            .map(|index| Candidate {
                character: self.class_names[index].to_string(),
                confidence: scores[index],
            })
            .collect();
        let best = &predictions[0];
        Ok(Prediction {
            character: best.character.clone(),
            confidence: best.confidence,
            predictions,
        })
    }
}
