// Shared state handed to every request handler
use crate::predictor::Predictor;

#[derive(Clone)]
pub struct AppState {
    pub predictor: Predictor,
    pub max_upload_bytes: usize,
}
