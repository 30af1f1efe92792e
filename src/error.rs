// Request-time errors and their HTTP mapping
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PredictError {
    #[error("no image uploaded: expected a multipart field named `file`")]
    MissingFile,

    #[error("upload exceeds the limit of {limit} bytes")]
    TooLarge { limit: usize },

    #[error("malformed multipart body: {0}")]
    Multipart(String),

    #[error("uploaded file is not a readable image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("model returned {actual} scores but {expected} class names are loaded")]
    ScoreCount { expected: usize, actual: usize },

    #[error("inference failed: {0}")]
    Inference(#[from] anyhow::Error),
}

impl ResponseError for PredictError {
    fn status_code(&self) -> StatusCode {
        match self {
            PredictError::MissingFile | PredictError::Multipart(_) | PredictError::Decode(_) => {
                StatusCode::BAD_REQUEST
            }
            PredictError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            PredictError::ScoreCount { .. } | PredictError::Inference(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

impl From<actix_multipart::MultipartError> for PredictError {
    fn from(err: actix_multipart::MultipartError) -> Self {
        PredictError::Multipart(err.to_string())
    }
}

impl From<candle::Error> for PredictError {
    fn from(err: candle::Error) -> Self {
        PredictError::Inference(err.into())
    }
}
