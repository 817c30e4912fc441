//! End-to-end generation against mock renderer and signing services.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use dcard_client::{ServiceClient, ServiceConfig};
use dcard_core::IdentityRecord;
use dcard_crypto::LocalKeyProvider;
use dcard_pipeline::{http_generator, CardConfig, CredentialType, PipelineError};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn record() -> IdentityRecord {
    IdentityRecord::from_value(json!({
        "UIN": "4123456789",
        "fullName": [{"language": "eng", "value": "Juan Dela Cruz"}, {"language": "fil", "value": "Juan"}],
        "fn": "Juan",
        "ln": "Dela Cruz",
        "gen": "Male",
        "dob": "1990/01/15",
        "PCN": "1111-2222-3333-4444"
    }))
    .unwrap()
}

fn mapping_file(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("identity-mapping.json");
    std::fs::write(&path, r#"{"identity": {"name": {"value": "fullName"}}}"#).unwrap();
    path
}

fn client(server: &MockServer) -> ServiceClient {
    ServiceClient::new(ServiceConfig::local_mock(server.address().port(), Some("t0ken")).unwrap()).unwrap()
}

#[tokio::test]
async fn standard_card_is_rendered_and_signed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/templates/RPR_UIN_CARD_TEMPLATE/render"))
        .and(query_param("lang", "eng"))
        .and(body_partial_json(json!({"UIN": "4123456789", "fullName_eng": "Juan Dela Cruz"})))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.7 card".to_vec()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/keymanager/pdf/sign"))
        .and(body_partial_json(json!({"request": {
            "data": STANDARD.encode(b"%PDF-1.7 card"),
            "reason": "Digital card",
            "password": "pin-1234"
        }})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": {"data": STANDARD.encode(b"%PDF-1.7 card signed")},
            "errors": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = CardConfig {
        mapping_path: Some(mapping_file(&dir)),
        ..CardConfig::default()
    };
    let keys = Arc::new(LocalKeyProvider::from_seed(&[7u8; 32]));
    let generator = http_generator(config, keys, client(&server)).unwrap();

    let card = generator
        .generate(&record(), CredentialType::Standard, Some("pin-1234"))
        .await
        .unwrap();
    assert_eq!(card.document, b"%PDF-1.7 card signed");
    let markers: Vec<_> = card.degradations.iter().map(|d| d.marker()).collect();
    assert_eq!(markers, ["APPLICANT_PHOTO_NOT_SET"]);

    let render = &server.received_requests().await.unwrap()[0];
    let attributes: serde_json::Value = serde_json::from_slice(&render.body).unwrap();
    assert!(attributes["QrCode"].as_str().unwrap().starts_with("data:image/png;base64,"));
    assert!(attributes.get("fullName_fil").is_none());
}

#[tokio::test]
async fn qrcode_card_sends_only_code_attributes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/templates/RPR_UIN_CARD_TEMPLATE/render"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF qr".to_vec()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/keymanager/pdf/sign"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": {"data": STANDARD.encode(b"signed")}
        })))
        .mount(&server)
        .await;

    let keys = Arc::new(LocalKeyProvider::from_seed(&[7u8; 32]));
    let generator = http_generator(CardConfig::default(), keys, client(&server)).unwrap();
    generator
        .generate(&record(), CredentialType::parse("QRCODE"), None)
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let render: &Request = requests
        .iter()
        .find(|r| r.url.path().ends_with("/render"))
        .unwrap();
    let attributes: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(&render.body).unwrap();
    let keys: Vec<_> = attributes.keys().map(String::as_str).collect();
    assert_eq!(keys, ["QrCode"]);
}

#[tokio::test]
async fn signing_error_list_fails_the_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/templates/RPR_UIN_CARD_TEMPLATE/render"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF".to_vec()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/keymanager/pdf/sign"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": null,
            "errors": [{"errorCode": "KER-PDF-001", "message": "signing certificate expired"}]
        })))
        .mount(&server)
        .await;

    let keys = Arc::new(LocalKeyProvider::from_seed(&[7u8; 32]));
    let generator = http_generator(CardConfig::default(), keys, client(&server)).unwrap();
    let err = generator
        .generate(&record(), CredentialType::Standard, None)
        .await
        .unwrap_err();
    assert!(
        matches!(&err, PipelineError::RemoteSigning { code, .. } if code == "KER-PDF-001"),
        "{err}"
    );
}

#[test]
fn missing_face_model_is_a_config_error() {
    let config = CardConfig {
        face_model_path: Some("/nonexistent/seeta_fd_frontal_v1.0.bin".into()),
        ..CardConfig::default()
    };
    let keys = Arc::new(LocalKeyProvider::from_seed(&[7u8; 32]));
    let client = ServiceClient::new(ServiceConfig::local_mock(1, None).unwrap()).unwrap();
    assert!(http_generator(config, keys, client).is_err());
}
