// Convolutional cosplay classifier
use std::path::Path;

use anyhow::Context;
use candle::{DType, Device, Module, Tensor, D};
use candle_nn::{conv2d, linear, Conv2d, Conv2dConfig, Linear, VarBuilder};

use super::ImageClassifier;
use crate::preprocess::InputSize;

pub const INPUT_SIZE: InputSize = InputSize::square(224);

const CONV1_FILTERS: usize = 32;
const CONV2_FILTERS: usize = 64;
const KERNEL_SIZE: usize = 3;
const HIDDEN_UNITS: usize = 128;

/// Side length of the feature map after two (conv k3, max-pool 2) stages.
const fn feature_side(input: usize) -> usize {
    ((input - (KERNEL_SIZE - 1)) / 2 - (KERNEL_SIZE - 1)) / 2
}

pub struct CosplayCnn {
    conv1: Conv2d,
    conv2: Conv2d,
    fc1: Linear,
    fc2: Linear,
    num_classes: usize,
    device: Device,
}

impl CosplayCnn {
    /// Builds the network from `vb`, expecting `conv1`, `conv2`, `fc1` and `fc2` weights.
    pub fn new(vb: VarBuilder, num_classes: usize) -> candle::Result<Self> {
        let device = vb.device().clone();
        let cfg = Conv2dConfig::default();
        let conv1 = conv2d(3, CONV1_FILTERS, KERNEL_SIZE, cfg, vb.pp("conv1"))?;
        let conv2 = conv2d(CONV1_FILTERS, CONV2_FILTERS, KERNEL_SIZE, cfg, vb.pp("conv2"))?;

        let side = feature_side(INPUT_SIZE.height);
        let fc1 = linear(CONV2_FILTERS * side * side, HIDDEN_UNITS, vb.pp("fc1"))?;
        let fc2 = linear(HIDDEN_UNITS, num_classes, vb.pp("fc2"))?;
        Ok(Self {
            conv1,
            conv2,
            fc1,
            fc2,
            num_classes,
            device,
        })
    }

    /// Memory-maps trained weights from a safetensors file.
    ///
    /// Fails if any tensor is missing or its shape disagrees with the network,
    /// including an output layer that is not `num_classes` wide.
    pub fn load(weights: impl AsRef<Path>, num_classes: usize, device: Device) -> anyhow::Result<Self> {
        let weights = weights.as_ref();
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights], DType::F32, &device)? };
        let model = Self::new(vb, num_classes)
            .with_context(|| format!("incompatible weights in {}", weights.display()))?;
        log::info!(
            "loaded classifier weights from {} ({} classes)",
            weights.display(),
            num_classes
        );
        Ok(model)
    }
}

impl Module for CosplayCnn {
    fn forward(&self, xs: &Tensor) -> candle::Result<Tensor> {
        let xs = self.conv1.forward(xs)?.relu()?.max_pool2d(2)?;
        let xs = self.conv2.forward(&xs)?.relu()?.max_pool2d(2)?;
        let xs = xs.flatten_from(1)?;
        let xs = self.fc1.forward(&xs)?.relu()?;
        let xs = self.fc2.forward(&xs)?;
        candle_nn::ops::softmax(&xs, D::Minus1)
    }
}

impl ImageClassifier for CosplayCnn {
    fn input_size(&self) -> InputSize {
        INPUT_SIZE
    }

    fn num_classes(&self) -> usize {
        self.num_classes
    }

    fn device(&self) -> &Device {
        &self.device
    }

    fn forward(&self, input: &Tensor) -> anyhow::Result<Vec<f32>> {
        let scores = Module::forward(self, input)?.squeeze(0)?.to_vec1::<f32>()?;
        Ok(scores)
    }
}
