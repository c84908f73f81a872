use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use server_api::ControllerError;
use shared::{
    domain::{Owner, OwnerId},
    error::{ApiError, ErrorCode},
    validation::{validate_owner, BindingResult, FieldError},
    view::{Model, RenderContext, View, OWNER_ATTRIBUTE},
};
use storage::{Storage, StorageOptions};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;

use app_state::AppState;
use config::{load_settings, normalize_database_url};

const MAX_FORM_BYTES: usize = 16 * 1024;

type HttpError = (StatusCode, Json<ApiError>);

#[derive(Debug, Deserialize)]
struct FindOwnersQuery {
    #[serde(rename = "lastName")]
    last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OwnerForm {
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    address: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    telephone: String,
}

impl From<OwnerForm> for Owner {
    fn from(form: OwnerForm) -> Self {
        Owner {
            id: None,
            first_name: form.first_name,
            last_name: form.last_name,
            address: form.address,
            city: form.city,
            telephone: form.telephone,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct RenderedView {
    view: String,
    model: Model,
    errors: Vec<FieldError>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings()?;
    let database_url = normalize_database_url(&settings.database_url);
    let options = StorageOptions {
        case_sensitive_last_name: settings.case_sensitive_last_name,
    };
    let storage = Storage::with_options(&database_url, options)
        .await
        .map_err(|error| {
            error!(
                %database_url,
                %error,
                "failed to open SQLite database; verify parent directory exists and permissions are correct"
            );
            error
        })?;

    let app = build_router(Arc::new(AppState::new(storage)));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(
        %addr,
        case_sensitive_last_name = settings.case_sensitive_last_name,
        "server listening"
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/owners", get(process_find_form))
        .route("/owners/find", get(init_find_form))
        .route(
            "/owners/new",
            get(init_creation_form).post(process_creation_form),
        )
        .route("/owners/:owner_id", get(show_owner))
        .route(
            "/owners/:owner_id/edit",
            get(init_update_owner_form).post(process_update_owner_form),
        )
        .layer(RequestBodyLimitLayer::new(MAX_FORM_BYTES))
        .with_state(state)
}

fn render(view: View, model: Model, result: &BindingResult) -> Response {
    match view.redirect_location() {
        Some(location) => Redirect::to(&location).into_response(),
        None => Json(RenderedView {
            view: view.to_string(),
            model,
            errors: result.field_errors().to_vec(),
        })
        .into_response(),
    }
}

fn controller_error(err: ControllerError) -> HttpError {
    let status = match &err {
        ControllerError::OwnerNotFound(_) => StatusCode::NOT_FOUND,
        ControllerError::MissingId | ControllerError::Service(_) => {
            error!(error = %err, "owner request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(err.to_api_error()))
}

async fn healthz(State(state): State<Arc<AppState>>) -> Result<&'static str, HttpError> {
    state.storage().health_check().await.map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError::new(ErrorCode::Internal, e.to_string())),
        )
    })?;
    Ok("ok")
}

async fn init_find_form(State(state): State<Arc<AppState>>) -> Response {
    let mut model = Model::new();
    let view = state.owners.init_find_form(&mut model);
    render(view, model, &BindingResult::new())
}

async fn process_find_form(
    State(state): State<Arc<AppState>>,
    Query(q): Query<FindOwnersQuery>,
) -> Result<Response, HttpError> {
    // A missing lastName searches like an empty one: every owner matches.
    let owner = Owner {
        last_name: q.last_name.unwrap_or_default(),
        ..Owner::default()
    };
    let result = BindingResult::new();
    let mut model = Model::new();
    let view = state
        .owners
        .process_find_form(&owner, &result, Some(&mut model))
        .await
        .map_err(controller_error)?;
    Ok(render(view, model, &result))
}

async fn init_creation_form(State(state): State<Arc<AppState>>) -> Response {
    let mut model = Model::new();
    let view = state.owners.init_creation_form(&mut model);
    render(view, model, &BindingResult::new())
}

async fn process_creation_form(
    State(state): State<Arc<AppState>>,
    Form(form): Form<OwnerForm>,
) -> Result<Response, HttpError> {
    let owner = Owner::from(form);
    let result = validate_owner(&owner);
    let view = state
        .owners
        .process_creation_form(owner.clone(), &result)
        .await
        .map_err(controller_error)?;
    Ok(render(view, resubmitted(owner), &result))
}

async fn show_owner(
    State(state): State<Arc<AppState>>,
    Path(owner_id): Path<i64>,
) -> Result<Response, HttpError> {
    let mut model = Model::new();
    let view = state
        .owners
        .show_owner(OwnerId(owner_id), &mut model)
        .await
        .map_err(controller_error)?;
    Ok(render(view, model, &BindingResult::new()))
}

async fn init_update_owner_form(
    State(state): State<Arc<AppState>>,
    Path(owner_id): Path<i64>,
) -> Result<Response, HttpError> {
    let mut model = Model::new();
    let view = state
        .owners
        .init_update_owner_form(OwnerId(owner_id), &mut model)
        .await
        .map_err(controller_error)?;
    Ok(render(view, model, &BindingResult::new()))
}

async fn process_update_owner_form(
    State(state): State<Arc<AppState>>,
    Path(owner_id): Path<i64>,
    Form(form): Form<OwnerForm>,
) -> Result<Response, HttpError> {
    let owner = Owner {
        id: Some(OwnerId(owner_id)),
        ..Owner::from(form)
    };
    let result = validate_owner(&owner);
    let view = state
        .owners
        .process_update_owner_form(owner.clone(), &result, OwnerId(owner_id))
        .await
        .map_err(controller_error)?;
    Ok(render(view, resubmitted(owner), &result))
}

/// Model for a re-rendered form: the values the user just submitted.
fn resubmitted(owner: Owner) -> Model {
    let mut model = Model::new();
    model.add_attribute(OWNER_ATTRIBUTE, owner.into());
    model
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
