use super::*;
use axum::{
    body::{self, Body},
    http::{header, Request},
};
use storage::Storage;
use tower::ServiceExt;

async fn test_app(last_names: &[&str]) -> Router {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let app = build_router(Arc::new(AppState::new(storage)));
    for last_name in last_names {
        let body = format!(
            "firstName=Jeff&lastName={last_name}&address=2387+S.+Fair+Way&city=Madison&telephone=6085551749"
        );
        let response = app
            .clone()
            .oneshot(form_request("/owners/new", &body))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }
    app
}

fn form_request(uri: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(header::CONTENT_LENGTH, body.len())
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn fetch(app: &Router, uri: &str) -> Response {
    let request = Request::get(uri).body(Body::empty()).expect("request");
    app.clone().oneshot(request).await.expect("response")
}

async fn json_body(response: Response) -> serde_json::Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .expect("location header")
}

#[tokio::test]
async fn healthz_reports_ok_when_storage_is_ready() {
    let app = test_app(&[]).await;
    let response = fetch(&app, "/healthz").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(body.as_ref(), b"ok");
}

#[tokio::test]
async fn find_form_renders_blank_owner() {
    let app = test_app(&[]).await;
    let response = fetch(&app, "/owners/find").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["view"], "owners/findOwners");
    assert_eq!(json["model"]["owner"]["lastName"], "");
}

#[tokio::test]
async fn single_search_hit_redirects_to_owner() {
    let app = test_app(&["Franklin", "Davis"]).await;
    let response = fetch(&app, "/owners?lastName=Frank").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/owners/1");
}

#[tokio::test]
async fn search_without_hits_shows_form_with_empty_model() {
    let app = test_app(&["Franklin"]).await;
    let response = fetch(&app, "/owners?lastName=Nobody").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["view"], "owners/findOwners");
    assert_eq!(json["model"], serde_json::json!({}));
}

#[tokio::test]
async fn search_without_last_name_lists_everyone() {
    let app = test_app(&["Franklin", "Davis", "Black"]).await;
    let response = fetch(&app, "/owners").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["view"], "owners/ownersList");
    let selections = json["model"]["selections"].as_array().expect("selections");
    assert_eq!(selections.len(), 3);
}

#[tokio::test]
async fn invalid_creation_form_is_rendered_again() {
    let app = test_app(&[]).await;
    let response = app
        .clone()
        .oneshot(form_request("/owners/new", "firstName=Jean&telephone=abc"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["view"], "owners/createOrUpdateOwnerForm");
    assert_eq!(json["model"]["owner"]["firstName"], "Jean");
    let fields: Vec<_> = json["errors"]
        .as_array()
        .expect("errors")
        .iter()
        .map(|e| e["field"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(fields, vec!["lastName", "address", "city", "telephone"]);

    let listing = json_body(fetch(&app, "/owners").await).await;
    assert_eq!(listing["view"], "owners/findOwners");
}

#[tokio::test]
async fn created_owner_is_shown_on_details_page() {
    let app = test_app(&["Coleman"]).await;
    let response = fetch(&app, "/owners/1").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["view"], "owners/ownerDetails");
    assert_eq!(json["model"]["owner"]["id"], 1);
    assert_eq!(json["model"]["owner"]["lastName"], "Coleman");
}

#[tokio::test]
async fn unknown_owner_is_not_found() {
    let app = test_app(&[]).await;
    for uri in ["/owners/42", "/owners/42/edit"] {
        let response = fetch(&app, uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = json_body(response).await;
        assert_eq!(json["code"], "not_found");
    }
}

#[tokio::test]
async fn edit_form_updates_owner_and_redirects() {
    let app = test_app(&["Estaban"]).await;

    let form = fetch(&app, "/owners/1/edit").await;
    assert_eq!(form.status(), StatusCode::OK);
    let json = json_body(form).await;
    assert_eq!(json["view"], "owners/createOrUpdateOwnerForm");
    assert_eq!(json["model"]["owner"]["lastName"], "Estaban");

    let response = app
        .clone()
        .oneshot(form_request(
            "/owners/1/edit",
            "firstName=Carlos&lastName=Estaban&address=2335+Independence+La.&city=Waunakee&telephone=6085555487",
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/owners/1");

    let details = json_body(fetch(&app, "/owners/1").await).await;
    assert_eq!(details["model"]["owner"]["city"], "Waunakee");
    assert_eq!(details["model"]["owner"]["firstName"], "Carlos");
}

#[tokio::test]
async fn oversized_form_is_rejected() {
    let app = test_app(&[]).await;
    let body = format!("firstName={}", "x".repeat(MAX_FORM_BYTES + 1));
    let response = app
        .oneshot(form_request("/owners/new", &body))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
