//! HTTP endpoint handlers

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use lostfound_core::item::{Denomination, LossReportId, MemorialCoin};
use lostfound_core::lifecycle::RefundCompletion;
use lostfound_core::persistence::SCHEMA_VERSION;
use lostfound_core::query::{self, Target};
use lostfound_core::{
    BulkCoordinator, BulkOutcome, BundledSubItem, CashBreakdown, FilterSpec, FoundItem,
    FoundItemId, ItemStore, LossReport, NewBundledSubItem, NewFoundItem, NewLossReport,
    NotFoundError, RefundFinalization, Screen, ScreenPage, Transition, ValidationError,
};

use crate::error::ApiError;
use crate::session::Session;
use crate::AppState;

fn parse_screen(name: &str) -> Result<Screen, ApiError> {
    name.parse::<Screen>().map_err(ApiError::NotFound)
}

// ---------------------------------------------------------------------------
// Found items
// ---------------------------------------------------------------------------

/// Register a found item and issue its receipt number
pub async fn intake_item(
    State(state): State<Arc<AppState>>,
    Json(form): Json<NewFoundItem>,
) -> Result<(StatusCode, Json<FoundItem>), ApiError> {
    let item = state.store.intake(form)?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn get_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<FoundItemId>,
) -> Result<Json<FoundItem>, ApiError> {
    state
        .store
        .get(id)?
        .map(Json)
        .ok_or_else(|| NotFoundError::FoundItem(id).into())
}

pub async fn transition_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<FoundItemId>,
    Json(transition): Json<Transition>,
) -> Result<Json<FoundItem>, ApiError> {
    let item = state.store.apply_transition(id, &transition)?;
    Ok(Json(item))
}

/// Cash counts as entered at the desk
#[derive(Debug, Deserialize)]
pub struct CashRequest {
    #[serde(default)]
    pub counts: BTreeMap<Denomination, u32>,
    #[serde(default)]
    pub memorial_coins: Vec<MemorialCoin>,
}

pub async fn record_cash(
    State(state): State<Arc<AppState>>,
    Path(id): Path<FoundItemId>,
    Json(req): Json<CashRequest>,
) -> Result<Json<CashBreakdown>, ApiError> {
    let breakdown = CashBreakdown::new(id, req.counts, req.memorial_coins)?;
    state.store.record_cash(&breakdown)?;
    Ok(Json(breakdown))
}

pub async fn get_cash(
    State(state): State<Arc<AppState>>,
    Path(id): Path<FoundItemId>,
) -> Result<Json<CashBreakdown>, ApiError> {
    state
        .store
        .cash_breakdown(id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("no cash breakdown for found item {}", id)))
}

pub async fn add_bundled_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<FoundItemId>,
    Json(form): Json<NewBundledSubItem>,
) -> Result<(StatusCode, Json<BundledSubItem>), ApiError> {
    let sub = state.store.add_bundled_item(id, form)?;
    Ok((StatusCode::CREATED, Json(sub)))
}

pub async fn list_bundled_items(
    State(state): State<Arc<AppState>>,
    Path(id): Path<FoundItemId>,
) -> Result<Json<Vec<BundledSubItem>>, ApiError> {
    if state.store.get(id)?.is_none() {
        return Err(NotFoundError::FoundItem(id).into());
    }
    Ok(Json(state.store.bundled_items(id)?))
}

// ---------------------------------------------------------------------------
// Screens
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
}

/// Page of the session's saved criteria, or the screen defaults
pub async fn get_screen(
    State(state): State<Arc<AppState>>,
    Session(session): Session,
    Path(screen): Path<String>,
    Query(params): Query<PageQuery>,
) -> Result<Json<ScreenPage>, ApiError> {
    let screen = parse_screen(&screen)?;
    let page = query::fetch_screen(&state.store, &session, screen, params.page.unwrap_or(1))?;
    Ok(Json(page))
}

/// Save criteria for the session and return the first page
pub async fn put_criteria(
    State(state): State<Arc<AppState>>,
    Session(session): Session,
    Path(screen): Path<String>,
    Json(spec): Json<FilterSpec>,
) -> Result<Json<ScreenPage>, ApiError> {
    let screen = parse_screen(&screen)?;
    let page = query::apply_criteria(&state.store, &session, screen, &spec)?;
    Ok(Json(page))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClearedResponse {
    pub cleared: bool,
}

pub async fn clear_criteria(
    State(state): State<Arc<AppState>>,
    Session(session): Session,
    Path(screen): Path<String>,
) -> Result<Json<ClearedResponse>, ApiError> {
    let screen = parse_screen(&screen)?;
    let cleared = state.store.clear_criteria(&session, screen)?;
    Ok(Json(ClearedResponse { cleared }))
}

/// Ids selected on a screen and the action to run on them
///
/// Found item screens take `transition`; the loss report screen takes
/// `resolved_on`.
#[derive(Debug, Deserialize)]
pub struct BulkRequest {
    pub ids: Vec<i64>,
    #[serde(default)]
    pub transition: Option<Transition>,
    #[serde(default)]
    pub resolved_on: Option<NaiveDate>,
}

pub async fn bulk_action(
    State(state): State<Arc<AppState>>,
    Path(screen): Path<String>,
    Json(req): Json<BulkRequest>,
) -> Result<Json<BulkOutcome>, ApiError> {
    let screen = parse_screen(&screen)?;
    let bulk = BulkCoordinator::new(&state.store);
    let outcome = match screen.target() {
        Target::FoundItems => {
            let transition = req.transition.ok_or_else(|| {
                ValidationError::field("transition", "required for this screen")
            })?;
            bulk.apply(&req.ids, &transition)?
        }
        Target::LossReports => {
            let resolved_on = req.resolved_on.ok_or_else(|| {
                ValidationError::field("resolved_on", "required for this screen")
            })?;
            bulk.resolve_loss_reports(&req.ids, resolved_on)?
        }
    };
    Ok(Json(outcome))
}

// ---------------------------------------------------------------------------
// Refunds
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct FinalizeRefundRequest {
    #[serde(default)]
    pub refund_ids: Vec<i64>,
    #[serde(default)]
    pub police_queue_ids: Vec<i64>,
    pub refunded_on: NaiveDate,
    pub handled_by: String,
}

pub async fn finalize_refund(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FinalizeRefundRequest>,
) -> Result<Json<RefundFinalization>, ApiError> {
    let completion = RefundCompletion {
        refunded_on: req.refunded_on,
        handled_by: req.handled_by,
    };
    let result = BulkCoordinator::new(&state.store).finalize_refund(
        &req.refund_ids,
        &req.police_queue_ids,
        &completion,
    )?;
    Ok(Json(result))
}

// ---------------------------------------------------------------------------
// Loss reports
// ---------------------------------------------------------------------------

pub async fn report_loss(
    State(state): State<Arc<AppState>>,
    Json(form): Json<NewLossReport>,
) -> Result<(StatusCode, Json<LossReport>), ApiError> {
    let report = state.store.report_loss(form)?;
    Ok((StatusCode::CREATED, Json(report)))
}

pub async fn get_loss_report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<LossReportId>,
) -> Result<Json<LossReport>, ApiError> {
    state
        .store
        .get_loss_report(id)?
        .map(Json)
        .ok_or_else(|| NotFoundError::LossReport(id).into())
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub ids: Vec<LossReportId>,
    pub resolved_on: NaiveDate,
}

pub async fn resolve_loss_reports(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResolveRequest>,
) -> Result<Json<BulkOutcome>, ApiError> {
    let outcome =
        BulkCoordinator::new(&state.store).resolve_loss_reports(&req.ids, req.resolved_on)?;
    Ok(Json(outcome))
}

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub version: String,
    pub schema_version: u32,
}

pub async fn get_status() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".to_string(),
        version: lostfound_core::version().to_string(),
        schema_version: SCHEMA_VERSION,
    })
}
