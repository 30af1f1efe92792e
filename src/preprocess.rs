// Image decoding and conversion into the classifier's input tensor
use candle::{Device, Tensor};
use image::{imageops, imageops::FilterType, DynamicImage};

/// Spatial size the classifier was trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputSize {
    pub height: usize,
    pub width: usize,
}

impl InputSize {
    pub const fn square(side: usize) -> Self {
        Self {
            height: side,
            width: side,
        }
    }

    pub fn dims(&self) -> (usize, usize, usize, usize) {
        (1, 3, self.height, self.width)
    }
}

pub fn decode(bytes: &[u8]) -> image::ImageResult<DynamicImage> {
    image::load_from_memory(bytes)
}

/// Converts an image into a `[1, 3, H, W]` f32 tensor with values in `[0, 1]`.
///
/// Alpha is dropped, the image is stretched to `size` with bilinear filtering
/// and each channel is scaled by `1/255`.
pub fn to_input_tensor(
    image: &DynamicImage,
    size: InputSize,
    device: &Device,
) -> candle::Result<Tensor> {
    let mut rgb = image.to_rgb8();
    let (width, height) = (size.width as u32, size.height as u32);
    if rgb.dimensions() != (width, height) {
        rgb = imageops::resize(&rgb, width, height, FilterType::Triangle);
    }

    let plane = size.height * size.width;
    let mut data = vec![0f32; 3 * plane];
    for (x, y, pixel) in rgb.enumerate_pixels() {
        let offset = y as usize * size.width + x as usize;
        data[offset] = pixel[0] as f32 / 255.0;
        data[plane + offset] = pixel[1] as f32 / 255.0;
        data[2 * plane + offset] = pixel[2] as f32 / 255.0;
    }
    Tensor::from_vec(data, size.dims(), device)
}
