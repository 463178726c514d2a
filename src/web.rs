//! HTTP surface: axum router and handlers.
//!
//! Handlers stay thin; they deserialize the request, call into the
//! resolver/registry/lifecycle layers and map `ServiceError` onto the
//! response through its `IntoResponse` impl.

use crate::backend::Backend;
use crate::error::{ServiceError, ServiceResult};
use crate::i18n::{LanguagePatch, LanguageRegistry, NewLanguage, TranslationMetrics};
use crate::lifecycle::{CreateTranslation, TranslationLifecycle, TranslationPatch};
use crate::resolver::{BatchResolution, Resolution, TranslationResolver};
use crate::store::{Database, Language, Page, Pagination, TranslationContext, TranslationRecord};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    db: Database,
    backend: Backend,
}

impl AppState {
    pub fn new(db: Database, backend: Backend) -> Self {
        Self { db, backend }
    }

    fn resolver(&self) -> TranslationResolver<Backend> {
        TranslationResolver::new(self.db.clone(), self.backend.clone())
    }

    fn registry(&self) -> LanguageRegistry {
        LanguageRegistry::new(self.db.clone())
    }

    fn lifecycle(&self) -> TranslationLifecycle {
        TranslationLifecycle::new(self.db.clone())
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/translate", post(translate))
        .route("/translate/batch", post(translate_batch))
        .route("/languages", get(list_languages).post(create_language))
        .route("/languages/active", get(list_active_languages))
        .route(
            "/languages/:code",
            get(get_language).patch(update_language).delete(delete_language),
        )
        .route("/translations", get(list_translations).post(create_translation))
        .route("/translations/pending", get(pending_translations))
        .route(
            "/translations/:id",
            get(get_translation)
                .patch(update_translation)
                .delete(delete_translation),
        )
        .route("/translations/:id/approve", post(approve_translation))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ==================== Resolution ====================

#[derive(Debug, Deserialize)]
struct TranslateRequest {
    text: String,
    target_language: String,
    source_language: Option<String>,
    context: Option<TranslationContext>,
}

async fn translate(
    State(state): State<AppState>,
    Json(req): Json<TranslateRequest>,
) -> ServiceResult<Json<Resolution>> {
    let resolution = state
        .resolver()
        .translate(
            &req.text,
            &req.target_language,
            req.source_language.as_deref(),
            req.context,
        )
        .await?;
    Ok(Json(resolution))
}

#[derive(Debug, Deserialize)]
struct BatchTranslateRequest {
    texts: Vec<String>,
    target_language: String,
    source_language: Option<String>,
}

async fn translate_batch(
    State(state): State<AppState>,
    Json(req): Json<BatchTranslateRequest>,
) -> ServiceResult<Json<BatchResolution>> {
    let batch = state
        .resolver()
        .translate_batch(
            &req.texts,
            &req.target_language,
            req.source_language.as_deref(),
        )
        .await?;
    Ok(Json(batch))
}

// ==================== Languages ====================

async fn list_languages(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> ServiceResult<Json<Page<Language>>> {
    Ok(Json(state.registry().list_paged(pagination)?))
}

async fn list_active_languages(
    State(state): State<AppState>,
) -> ServiceResult<Json<Vec<Language>>> {
    Ok(Json(state.registry().list_active()?))
}

async fn get_language(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ServiceResult<Json<Language>> {
    Ok(Json(state.registry().get_by_code(&code)?))
}

async fn create_language(
    State(state): State<AppState>,
    Json(req): Json<NewLanguage>,
) -> ServiceResult<(StatusCode, Json<Language>)> {
    let language = state.registry().create(req)?;
    Ok((StatusCode::CREATED, Json(language)))
}

async fn update_language(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(patch): Json<LanguagePatch>,
) -> ServiceResult<Json<Language>> {
    Ok(Json(state.registry().update(&code, patch)?))
}

async fn delete_language(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ServiceResult<StatusCode> {
    let code = code.to_lowercase();
    let has_translations = state.db.count_by_language(&code)? > 0;
    state.registry().delete(&code, has_translations)?;
    Ok(StatusCode::NO_CONTENT)
}

// ==================== Translations ====================

#[derive(Debug, Deserialize)]
struct TranslationListQuery {
    q: Option<String>,
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_per_page")]
    per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

async fn list_translations(
    State(state): State<AppState>,
    Query(query): Query<TranslationListQuery>,
) -> ServiceResult<Json<Page<TranslationRecord>>> {
    let pagination = Pagination {
        page: query.page,
        per_page: query.per_page,
    };
    let page = match query.q.as_deref().map(str::trim) {
        Some(q) if !q.is_empty() => state.db.search_translations(q, pagination)?,
        _ => state.db.find_paginated(pagination)?,
    };
    Ok(Json(page))
}

async fn pending_translations(
    State(state): State<AppState>,
) -> ServiceResult<Json<Vec<TranslationRecord>>> {
    Ok(Json(state.lifecycle().pending_approval()?))
}

/// A record plus its derived quality score, for single-record reads.
#[derive(Debug, Serialize)]
struct TranslationView {
    #[serde(flatten)]
    record: TranslationRecord,
    quality_score: u8,
}

impl From<TranslationRecord> for TranslationView {
    fn from(record: TranslationRecord) -> Self {
        let quality_score = TranslationLifecycle::quality_score(&record);
        Self { record, quality_score }
    }
}

async fn get_translation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ServiceResult<Json<TranslationView>> {
    let record = state
        .db
        .get_translation(id)?
        .ok_or_else(|| ServiceError::NotFound(format!("translation {} not found", id)))?;
    Ok(Json(record.into()))
}

async fn create_translation(
    State(state): State<AppState>,
    Json(req): Json<CreateTranslation>,
) -> ServiceResult<(StatusCode, Json<TranslationRecord>)> {
    let record = state.lifecycle().create(req)?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn update_translation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<TranslationPatch>,
) -> ServiceResult<Json<TranslationRecord>> {
    Ok(Json(state.lifecycle().update(id, patch)?))
}

async fn delete_translation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ServiceResult<StatusCode> {
    state.lifecycle().delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct ApproveRequest {
    approved_by: String,
}

async fn approve_translation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<ApproveRequest>,
) -> ServiceResult<Json<TranslationRecord>> {
    Ok(Json(state.lifecycle().approve(id, &req.approved_by)?))
}

// ==================== Operational ====================

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn metrics() -> Json<crate::i18n::MetricsReport> {
    Json(TranslationMetrics::global().report())
}
