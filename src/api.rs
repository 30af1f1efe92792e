// API routes and handlers
use actix_cors::Cors;
use actix_multipart::Multipart;
use actix_web::{get, post, web, HttpResponse, ResponseError};
use futures_util::TryStreamExt;
use serde::Serialize;

use crate::error::PredictError;
use crate::predictor::Prediction;
use crate::state::AppState;

/// Multipart field names accepted for the uploaded image.
const FILE_FIELDS: [&str; 2] = ["file", "image"];

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    num_classes: usize,
}

/// Any origin, method and header, with credentials. The request origin is
/// echoed back since `*` is not valid alongside credentials.
pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allow_any_method()
        .allow_any_header()
        .supports_credentials()
        .max_age(3600)
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(predict).service(recognize).service(health);
}

#[post("/predict")]
pub async fn predict(
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse, PredictError> {
    classify_upload(&state, payload).await
}

// Route name used by the Express flavour of the service.
#[post("/api/recognize")]
pub async fn recognize(
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse, PredictError> {
    classify_upload(&state, payload).await
}

#[get("/health")]
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        num_classes: state.predictor.class_names().len(),
    })
}

async fn classify_upload(state: &AppState, payload: Multipart) -> Result<HttpResponse, PredictError> {
    let result = run_prediction(state, payload).await;
    match &result {
        Ok(prediction) => log::debug!(
            "predicted {} ({:.3})",
            prediction.character,
            prediction.confidence
        ),
        Err(e) if e.status_code().is_server_error() => log::error!("prediction failed: {}", e),
        Err(e) => log::warn!("rejected upload: {}", e),
    }
    Ok(HttpResponse::Ok().json(result?))
}

async fn run_prediction(
    state: &AppState,
    payload: Multipart,
) -> Result<Prediction, PredictError> {
    let bytes = read_upload(payload, state.max_upload_bytes).await?;

    // decoding and the forward pass are CPU bound
    let predictor = state.predictor.clone();
    web::block(move || predictor.predict(&bytes))
        .await
        .map_err(anyhow::Error::from)?
}

/// Reads the first non-empty `file` (or `image`) field, up to `limit` bytes.
async fn read_upload(mut payload: Multipart, limit: usize) -> Result<Vec<u8>, PredictError> {
    while let Some(mut field) = payload.try_next().await? {
        let is_file = field
            .content_disposition()
            .and_then(|cd| cd.get_name())
            .is_some_and(|name| FILE_FIELDS.contains(&name));

        let mut bytes = Vec::new();
        while let Some(chunk) = field.try_next().await? {
            if !is_file {
                continue;
            }
            if bytes.len() + chunk.len() > limit {
                return Err(PredictError::TooLarge { limit });
            }
            bytes.extend_from_slice(&chunk);
        }

        if is_file && !bytes.is_empty() {
            return Ok(bytes);
        }
    }
    Err(PredictError::MissingFile)
}
