use std::fs;
use std::path::Path;
use std::sync::Mutex;

use image::{imageops::FilterType, DynamicImage, GenericImageView};
use tensorflow::{Graph, ImportGraphDefOptions, Session, SessionOptions, SessionRunArgs, Tensor};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("failed to read model file: {0}")]
    Io(#[from] std::io::Error),

    #[error("tensorflow error: {0}")]
    Tensorflow(String),

    #[error("operation '{0}' not found in graph")]
    MissingOperation(String),

    #[error("model returned an empty output")]
    EmptyOutput,
}

// `Status` wraps a raw TF handle; keep only its message so the error can
// cross threads.
impl From<tensorflow::Status> for ClassifierError {
    fn from(status: tensorflow::Status) -> Self {
        ClassifierError::Tensorflow(status.to_string())
    }
}

impl From<std::ffi::NulError> for ClassifierError {
    fn from(err: std::ffi::NulError) -> Self {
        ClassifierError::Tensorflow(err.to_string())
    }
}

/// Highest-probability class reported by a classifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TopPrediction {
    pub class_index: usize,
    pub confidence: f32,
}

impl TopPrediction {
    /// Arg-max over a probability vector. NaN entries never win.
    pub fn from_probabilities(probs: &[f32]) -> Option<Self> {
        probs
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, p)| !p.is_nan())
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(class_index, confidence)| TopPrediction {
                class_index,
                confidence,
            })
    }
}

pub trait Classifier: Send + Sync {
    fn classify(&self, image: &DynamicImage) -> Result<TopPrediction, ClassifierError>;
}

/// Graph wiring for a frozen classification graph.
#[derive(Debug, Clone)]
pub struct ModelSpec {
    pub input_op: String,
    pub output_op: String,
    pub input_size: u32,
}

struct Inner {
    session: Session,
    graph: Graph,
}

/// Runs a frozen TensorFlow graph that takes an NHWC `[1, S, S, 3]` float
/// tensor in `[0, 1]` and emits one probability per class.
pub struct TensorflowClassifier {
    inner: Mutex<Inner>,
    spec: ModelSpec,
}

impl TensorflowClassifier {
    pub fn load(model_path: &Path, spec: ModelSpec) -> Result<Self, ClassifierError> {
        let model_bytes = fs::read(model_path)?;

        let mut graph = Graph::new();
        graph.import_graph_def(&model_bytes, &ImportGraphDefOptions::new())?;

        for op in [&spec.input_op, &spec.output_op] {
            if graph.operation_by_name(op)?.is_none() {
                return Err(ClassifierError::MissingOperation(op.clone()));
            }
        }

        let session = Session::new(&SessionOptions::new(), &graph)?;

        Ok(TensorflowClassifier {
            inner: Mutex::new(Inner { session, graph }),
            spec,
        })
    }

    fn to_tensor(&self, image: &DynamicImage) -> Tensor<f32> {
        let size = u64::from(self.spec.input_size);
        let pixels = preprocess(image, self.spec.input_size);

        let mut tensor = Tensor::new(&[1, size, size, 3]);
        tensor.copy_from_slice(&pixels);
        tensor
    }
}

impl Classifier for TensorflowClassifier {
    fn classify(&self, image: &DynamicImage) -> Result<TopPrediction, ClassifierError> {
        let input_tensor = self.to_tensor(image);

        // A poisoned lock only means another request panicked mid-run; the
        // session itself holds no per-request state.
        let inner = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let input_operation = inner
            .graph
            .operation_by_name(&self.spec.input_op)?
            .ok_or_else(|| ClassifierError::MissingOperation(self.spec.input_op.clone()))?;
        let output_operation = inner
            .graph
            .operation_by_name(&self.spec.output_op)?
            .ok_or_else(|| ClassifierError::MissingOperation(self.spec.output_op.clone()))?;

        let mut args = SessionRunArgs::new();
        args.add_feed(&input_operation, 0, &input_tensor);
        let output_token = args.request_fetch(&output_operation, 0);
        inner.session.run(&mut args)?;
        let output_tensor: Tensor<f32> = args.fetch(output_token)?;

        let top = TopPrediction::from_probabilities(&output_tensor)
            .ok_or(ClassifierError::EmptyOutput)?;
        tracing::debug!(
            class_index = top.class_index,
            confidence = top.confidence,
            "classified image"
        );
        Ok(top)
    }
}

/// Centre-crops to a square, resizes to `size` and flattens to HWC floats
/// scaled into `[0, 1]`. Cropping first keeps the intermediate buffer bounded
/// by the input for any aspect ratio.
pub fn preprocess(image: &DynamicImage, size: u32) -> Vec<f32> {
    let (width, height) = image.dimensions();
    let side = width.min(height);
    if side == 0 {
        return vec![0.0; (size * size * 3) as usize];
    }
    let x_offset = (width - side) / 2;
    let y_offset = (height - side) / 2;

    let square = image.crop_imm(x_offset, y_offset, side, side);
    let resized = square.resize_exact(size, size, FilterType::Triangle).to_rgb8();

    resized
        .pixels()
        .flat_map(|pixel| pixel.0)
        .map(|channel| channel as f32 / 255.0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    #[test]
    fn top_prediction_picks_highest_probability() {
        let top = TopPrediction::from_probabilities(&[0.05, 0.1, 0.7, 0.15]).unwrap();
        assert_eq!(top.class_index, 2);
        assert_eq!(top.confidence, 0.7);
    }

    #[test]
    fn top_prediction_skips_nan_and_rejects_empty() {
        let top = TopPrediction::from_probabilities(&[f32::NAN, 0.2, 0.1]).unwrap();
        assert_eq!(top.class_index, 1);
        assert!(TopPrediction::from_probabilities(&[]).is_none());
    }

    #[test]
    fn preprocess_crops_wide_image_to_square() {
        let image = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(40, 20, Rgb([255, 0, 0])));
        let pixels = preprocess(&image, 8);
        assert_eq!(pixels.len(), 8 * 8 * 3);
        assert!((pixels[0] - 1.0).abs() < 1e-6);
        assert!(pixels[1].abs() < 1e-6);
        assert!(pixels[2].abs() < 1e-6);
    }

    #[test]
    fn preprocess_expands_grayscale_to_three_channels() {
        let image = DynamicImage::ImageLuma8(ImageBuffer::from_pixel(5, 9, image::Luma([128])));
        let pixels = preprocess(&image, 4);
        assert_eq!(pixels.len(), 4 * 4 * 3);
        assert!(pixels.iter().all(|p| (*p - 128.0 / 255.0).abs() < 1e-2));
    }

    #[test]
    fn preprocess_handles_extreme_aspect_ratio() {
        let mut tall = ImageBuffer::from_pixel(1, 20_000, Rgb([0, 0, 255]));
        tall.put_pixel(0, 9_999, Rgb([0, 255, 0]));
        let pixels = preprocess(&DynamicImage::ImageRgb8(tall), 224);
        assert_eq!(pixels.len(), 224 * 224 * 3);
        // only the centre row survives the crop
        assert!(pixels[1] > 0.99);
        assert!(pixels[2] < 0.01);
    }

    #[test]
    fn missing_model_file_is_an_io_error() {
        let spec = ModelSpec {
            input_op: "x".into(),
            output_op: "Identity".into(),
            input_size: 224,
        };
        let err = TensorflowClassifier::load(Path::new("./does/not/exist.pb"), spec)
            .err()
            .unwrap();
        assert!(matches!(err, ClassifierError::Io(_)));
    }
}
