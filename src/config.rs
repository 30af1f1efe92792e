// Command-line and environment configuration
use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "HTTP service recognizing cosplay characters in images", long_about = None)]
pub struct Args {
    /// Classifier weights (safetensors)
    #[arg(long, env = "COSPLAY_MODEL", default_value = "modern_model.safetensors")]
    pub model: PathBuf,

    /// Class names file: numpy array (.npy), JSON array (.json), bincode Vec<String> (.bin) or one label per line
    #[arg(long, env = "COSPLAY_LABELS", default_value = "class_names.npy")]
    pub labels: PathBuf,

    #[arg(long, env = "COSPLAY_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "COSPLAY_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Number of ranked candidates returned with each prediction
    #[arg(long, env = "COSPLAY_TOP_K", default_value_t = 3)]
    pub top_k: usize,

    /// Largest accepted upload, in bytes
    #[arg(long, env = "COSPLAY_MAX_UPLOAD_BYTES", default_value_t = 16 * 1024 * 1024)]
    pub max_upload_bytes: usize,
}
