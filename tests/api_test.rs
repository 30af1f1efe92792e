use std::io::Cursor;
use std::sync::Arc;

use actix_web::http::{header, Method, StatusCode};
use actix_web::{test, web, App};
use candle::{Device, Tensor};
use cosplay_classifier::api;
use cosplay_classifier::preprocess::InputSize;
use cosplay_classifier::{AppState, ClassNames, ImageClassifier, Prediction, Predictor};
use image::{DynamicImage, ImageFormat, RgbImage};
use serde_json::Value;

const BOUNDARY: &str = "cosplay-test-boundary";
const ORIGIN: &str = "http://cosplay.example";

/// Stands in for trained weights: scores are fixed, input shape is checked.
struct StubClassifier {
    scores: Vec<f32>,
    device: Device,
}

impl ImageClassifier for StubClassifier {
    fn input_size(&self) -> InputSize {
        InputSize::square(16)
    }

    fn num_classes(&self) -> usize {
        self.scores.len()
    }

    fn device(&self) -> &Device {
        &self.device
    }

    fn forward(&self, input: &Tensor) -> anyhow::Result<Vec<f32>> {
        anyhow::ensure!(input.dims() == [1, 3, 16, 16], "unexpected input {:?}", input.dims());
        Ok(self.scores.clone())
    }
}

/// A model whose forward pass always errors, e.g. a shape mismatch inside the runtime.
struct BrokenClassifier {
    device: Device,
}

impl ImageClassifier for BrokenClassifier {
    fn input_size(&self) -> InputSize {
        InputSize::square(16)
    }

    fn num_classes(&self) -> usize {
        3
    }

    fn device(&self) -> &Device {
        &self.device
    }

    fn forward(&self, _input: &Tensor) -> anyhow::Result<Vec<f32>> {
        anyhow::bail!("shape mismatch in fc1")
    }
}

fn app_state(max_upload_bytes: usize) -> web::Data<AppState> {
    let model = StubClassifier {
        scores: vec![0.1, 0.7, 0.2],
        device: Device::Cpu,
    };
    app_state_with(Arc::new(model), max_upload_bytes)
}

fn app_state_with(model: Arc<dyn ImageClassifier>, max_upload_bytes: usize) -> web::Data<AppState> {
    let class_names =
        ClassNames::new(vec!["Naruto".into(), "Goku".into(), "Luffy".into()]).unwrap();
    let predictor = Predictor::new(model, Arc::new(class_names), 3).unwrap();
    web::Data::new(AppState {
        predictor,
        max_upload_bytes,
    })
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_fn(width, height, |x, y| image::Rgb([x as u8, y as u8, 128]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

fn multipart(field: &str, content: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"upload.png\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload(uri: &str, body: Vec<u8>) -> test::TestRequest {
    test::TestRequest::post()
        .uri(uri)
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        ))
        .insert_header((header::ORIGIN, ORIGIN))
        .set_payload(body)
}

macro_rules! init_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .wrap(api::cors())
                .app_data($state)
                .configure(api::configure),
        )
        .await
    };
}

#[actix_web::test]
async fn predict_reports_top_character() {
    let app = init_app!(app_state(1 << 20));

    let req = upload("/predict", multipart("file", &png(40, 25))).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let allow_origin = resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap();
    assert_eq!(allow_origin.to_str().unwrap(), ORIGIN);

    let prediction: Prediction = test::read_body_json(resp).await;
    assert_eq!(prediction.character, "Goku");
    assert_eq!(prediction.confidence, 0.7);
    let ranked: Vec<&str> = prediction.predictions.iter().map(|c| c.character.as_str()).collect();
    assert_eq!(ranked, ["Goku", "Luffy", "Naruto"]);
}

#[actix_web::test]
async fn repeated_predictions_are_identical() {
    let app = init_app!(app_state(1 << 20));
    let image = png(300, 120);

    let req = upload("/predict", multipart("file", &image)).to_request();
    let first: Value = test::call_and_read_body_json(&app, req).await;
    let req = upload("/predict", multipart("file", &image)).to_request();
    let second: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(first, second);
}

#[actix_web::test]
async fn recognize_route_accepts_image_field() {
    let app = init_app!(app_state(1 << 20));

    let req = upload("/api/recognize", multipart("image", &png(16, 16))).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let prediction: Prediction = test::read_body_json(resp).await;
    assert_eq!(prediction.character, "Goku");
}

#[actix_web::test]
async fn plain_text_upload_is_rejected() {
    let app = init_app!(app_state(1 << 20));

    let req = upload("/predict", multipart("file", b"just some text")).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("not a readable image"));
}

#[actix_web::test]
async fn missing_file_field_is_rejected() {
    let app = init_app!(app_state(1 << 20));

    let req = upload("/predict", multipart("avatar", &png(8, 8))).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = upload("/predict", multipart("file", b"")).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn non_multipart_body_is_rejected() {
    let app = init_app!(app_state(1 << 20));

    let req = test::TestRequest::post()
        .uri("/predict")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload(r#"{"file": "goku.png"}"#)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn truncated_multipart_body_is_rejected() {
    let app = init_app!(app_state(1 << 20));

    let mut body = multipart("file", &png(64, 64));
    body.truncate(body.len() / 2);
    let req = upload("/predict", body).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn model_failure_is_a_server_error() {
    let app = init_app!(app_state_with(
        Arc::new(BrokenClassifier { device: Device::Cpu }),
        1 << 20
    ));

    let req = upload("/predict", multipart("file", &png(20, 20))).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("inference failed"));
    assert!(message.contains("shape mismatch"));
}

#[actix_web::test]
async fn oversized_upload_is_rejected() {
    let app = init_app!(app_state(64));

    let req = upload("/predict", multipart("file", &png(64, 64))).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[actix_web::test]
async fn preflight_allows_any_origin() {
    let app = init_app!(app_state(1 << 20));

    let req = test::TestRequest::default()
        .method(Method::OPTIONS)
        .uri("/predict")
        .insert_header((header::ORIGIN, "https://somewhere.else"))
        .insert_header((header::ACCESS_CONTROL_REQUEST_METHOD, "POST"))
        .insert_header((header::ACCESS_CONTROL_REQUEST_HEADERS, "x-custom-header"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let headers = resp.headers();
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap().to_str().unwrap(),
        "https://somewhere.else"
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap().to_str().unwrap(),
        "true"
    );
}

#[actix_web::test]
async fn health_reports_class_count() {
    let app = init_app!(app_state(1 << 20));

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["num_classes"], 3);
}
