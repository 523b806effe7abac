//! Lost & Found Server - desk API server
//!
//! JSON-over-HTTP transport for the lost & found core. Every route maps onto
//! one core operation; state lives in the SQLite item store.

pub mod error;
pub mod http;
pub mod session;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use lostfound_core::{ItemStore, LostFoundConfig, SqliteItemStore};

const PRUNE_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Shared application state
pub struct AppState {
    pub store: SqliteItemStore,
    /// How long saved screen criteria outlive their last save
    pub criteria_retention: chrono::Duration,
}

impl AppState {
    pub fn new(store: SqliteItemStore) -> Self {
        Self {
            store,
            criteria_retention: chrono::Duration::days(30),
        }
    }

    /// Open the database named in the configuration
    pub fn open(config: &LostFoundConfig) -> lostfound_core::Result<Self> {
        let store = SqliteItemStore::open(&config.storage.database_path)?
            .with_intake_config(config.intake.clone());
        tracing::info!("Opened item store at {:?}", config.storage.database_path);
        let state = Self {
            store,
            criteria_retention: chrono::Duration::days(i64::from(
                config.storage.criteria_retention_days,
            )),
        };
        state.prune_stale_criteria()?;
        Ok(state)
    }

    pub fn in_memory() -> lostfound_core::Result<Self> {
        Ok(Self::new(SqliteItemStore::open_in_memory()?))
    }

    /// Drop criteria saved longer ago than the retention period
    pub fn prune_stale_criteria(&self) -> lostfound_core::Result<usize> {
        let cutoff = chrono::Utc::now().naive_utc() - self.criteria_retention;
        self.store.prune_criteria(cutoff)
    }
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Found items
        .route("/items", post(http::intake_item))
        .route("/items/{id}", get(http::get_item))
        .route("/items/{id}/transition", post(http::transition_item))
        .route("/items/{id}/cash", put(http::record_cash).get(http::get_cash))
        .route(
            "/items/{id}/bundled",
            post(http::add_bundled_item).get(http::list_bundled_items),
        )
        // Screens
        .route("/screens/{screen}", get(http::get_screen))
        .route(
            "/screens/{screen}/criteria",
            put(http::put_criteria).delete(http::clear_criteria),
        )
        .route("/screens/{screen}/bulk", post(http::bulk_action))
        // Refunds
        .route("/refunds/finalize", post(http::finalize_refund))
        // Loss reports
        .route("/loss-reports", post(http::report_loss))
        .route("/loss-reports/resolve", post(http::resolve_loss_reports))
        .route("/loss-reports/{id}", get(http::get_loss_report))
        // System
        .route("/status", get(http::get_status))
        // Middleware
        .layer(middleware::from_fn(session::ensure_session))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the server
pub async fn serve(addr: &str, state: Arc<AppState>) -> Result<(), Box<dyn std::error::Error>> {
    let pruning = Arc::clone(&state);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(PRUNE_INTERVAL);
        loop {
            ticker.tick().await;
            if let Err(e) = pruning.prune_stale_criteria() {
                tracing::warn!("Pruning saved criteria failed: {}", e);
            }
        }
    });

    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Lost & found server listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::session::SESSION_HEADER;

    fn app() -> Router {
        create_router(Arc::new(AppState::in_memory().unwrap()))
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        session: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Option<String>, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(session) = session {
            builder = builder.header(SESSION_HEADER, session);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let echoed = response
            .headers()
            .get(SESSION_HEADER)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, echoed, value)
    }

    fn intake_form(feature: &str) -> Value {
        json!({
            "finder_type": "OWNER_FOUND",
            "found_at": "2024-07-01T09:00:00",
            "received_at": "2024-07-01T09:30:00",
            "classification": {"large": "Umbrellas"},
            "feature": feature
        })
    }

    async fn intake(app: &Router, feature: &str) -> i64 {
        let (status, _, body) = send(app, "POST", "/items", None, Some(intake_form(feature))).await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_i64().unwrap()
    }

    #[tokio::test]
    async fn test_status() {
        let (status, _, body) = send(&app(), "GET", "/status", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["schema_version"], lostfound_core::persistence::SCHEMA_VERSION);
    }

    #[tokio::test]
    async fn test_intake_numbers_and_fetches_items() {
        let app = app();
        let (status, _, first) =
            send(&app, "POST", "/items", None, Some(intake_form("black umbrella"))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(first["main_id"], "12400001");
        assert_eq!(first["custody_status"], "STORED");

        let second = intake(&app, "red umbrella").await;
        let (status, _, body) = send(&app, "GET", &format!("/items/{}", second), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["main_id"], "12400002");

        let (status, _, body) = send(&app, "GET", "/items/999", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn test_invalid_intake_lists_fields() {
        let (status, _, body) =
            send(&app(), "POST", "/items", None, Some(intake_form("  "))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "validation");
        let fields: Vec<&str> = body["fields"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["field"].as_str().unwrap())
            .collect();
        assert_eq!(fields, vec!["feature"]);
    }

    #[tokio::test]
    async fn test_illegal_transition_is_conflict() {
        let app = app();
        let id = intake(&app, "wallet").await;
        let sell = json!({"type": "SELL", "payload": {"sold_on": "2024-08-01", "price": 500}});
        let (status, _, body) = send(
            &app,
            "POST",
            &format!("/items/{}/transition", id),
            None,
            Some(sell),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "invalid_transition");

        let file = json!({"type": "FILE_POLICE", "payload": {"filed_on": "2024-07-02"}});
        let (status, _, body) = send(
            &app,
            "POST",
            &format!("/items/{}/transition", id),
            None,
            Some(file),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["custody_status"], "POLICE_FILED");
    }

    #[tokio::test]
    async fn test_session_is_minted_and_echoed() {
        let app = app();
        let (_, minted, _) = send(&app, "GET", "/screens/items", None, None).await;
        let minted = minted.unwrap();
        assert_eq!(minted.len(), 36);

        let (_, echoed, _) = send(&app, "GET", "/screens/items", Some("desk-1"), None).await;
        assert_eq!(echoed.as_deref(), Some("desk-1"));
    }

    #[tokio::test]
    async fn test_saved_criteria_are_per_session() {
        let app = app();
        intake(&app, "black umbrella").await;
        intake(&app, "leather wallet").await;

        let spec = json!({
            "clauses": [{"op": "text_contains", "field": "feature", "pattern": "umbrella"}]
        });
        let (status, _, page) =
            send(&app, "PUT", "/screens/items/criteria", Some("s1"), Some(spec)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["target"], "found_items");
        assert_eq!(page["total"], 1);

        let (_, _, again) = send(&app, "GET", "/screens/items?page=1", Some("s1"), None).await;
        assert_eq!(again, page);

        let (_, _, other) = send(&app, "GET", "/screens/items", Some("s2"), None).await;
        assert_eq!(other["total"], 2);

        let (_, _, cleared) =
            send(&app, "DELETE", "/screens/items/criteria", Some("s1"), None).await;
        assert_eq!(cleared["cleared"], true);
        let (_, _, reset) = send(&app, "GET", "/screens/items", Some("s1"), None).await;
        assert_eq!(reset["total"], 2);
    }

    #[tokio::test]
    async fn test_stale_criteria_fall_back_to_defaults() {
        let mut state = AppState::in_memory().unwrap();
        state.criteria_retention = chrono::Duration::days(-1);
        let state = Arc::new(state);
        let app = create_router(Arc::clone(&state));
        intake(&app, "black umbrella").await;
        intake(&app, "leather wallet").await;

        let spec = json!({
            "clauses": [{"op": "text_contains", "field": "feature", "pattern": "umbrella"}]
        });
        send(&app, "PUT", "/screens/items/criteria", Some("s1"), Some(spec)).await;
        assert_eq!(state.prune_stale_criteria().unwrap(), 1);

        let (_, _, page) = send(&app, "GET", "/screens/items", Some("s1"), None).await;
        assert_eq!(page["total"], 2);
    }

    #[tokio::test]
    async fn test_unknown_screen_and_bad_page() {
        let app = app();
        let (status, _, _) = send(&app, "GET", "/screens/lobby", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _, body) = send(&app, "GET", "/screens/items?page=0", None, None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["fields"][0]["field"], "page");
    }

    #[tokio::test]
    async fn test_bulk_isolates_missing_ids() {
        let app = app();
        let id = intake(&app, "scarf").await;
        let req = json!({
            "ids": [id, 999],
            "transition": {"type": "FILE_POLICE", "payload": {"filed_on": "2024-07-02"}}
        });
        let (status, _, outcome) =
            send(&app, "POST", "/screens/police_filing/bulk", None, Some(req)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(outcome["succeeded"], json!([id]));
        assert_eq!(outcome["failed"][0]["id"], 999);
        assert_eq!(outcome["failed"][0]["kind"], "NOT_FOUND");

        let (status, _, _) = send(
            &app,
            "POST",
            "/screens/police_filing/bulk",
            None,
            Some(json!({"ids": [id]})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_finalize_refund() {
        let app = app();
        let a = intake(&app, "ring").await;
        let b = intake(&app, "watch").await;
        let c = intake(&app, "earring").await;

        let schedule = json!({
            "type": "SCHEDULE_REFUND",
            "payload": {"receipt_number": "R-1", "expected_on": "2024-07-31"}
        });
        let (status, _, _) = send(
            &app,
            "POST",
            &format!("/items/{}/transition", a),
            None,
            Some(schedule),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let req = json!({
            "refund_ids": [a],
            "police_queue_ids": [b, c],
            "refunded_on": "2024-07-20",
            "handled_by": "Desk"
        });
        let (status, _, result) = send(&app, "POST", "/refunds/finalize", None, Some(req)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(result["refunded"]["succeeded"], json!([a]));
        assert_eq!(result["police_queue"]["succeeded"], json!([b, c]));

        let (_, _, item) = send(&app, "GET", &format!("/items/{}", a), None, None).await;
        assert_eq!(item["refund_status"], "REFUNDED");
        for id in [b, c] {
            let (_, _, item) = send(&app, "GET", &format!("/items/{}", id), None, None).await;
            assert_eq!(item["refund_status"], "PROCESSED");
        }
    }

    #[tokio::test]
    async fn test_cash_and_bundled_items() {
        let app = app();
        let id = intake(&app, "coin purse").await;

        let cash = json!({"counts": {"YEN1000": 2, "YEN100": 3}});
        let (status, _, body) =
            send(&app, "PUT", &format!("/items/{}/cash", id), None, Some(cash)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 2300);

        let (_, _, body) = send(&app, "GET", &format!("/items/{}/cash", id), None, None).await;
        assert_eq!(body["total"], 2300);

        let sub = json!({"classification": {"large": "Cards"}, "feature": "point card"});
        let (status, _, _) =
            send(&app, "POST", &format!("/items/{}/bundled", id), None, Some(sub)).await;
        assert_eq!(status, StatusCode::CREATED);
        let (_, _, list) = send(&app, "GET", &format!("/items/{}/bundled", id), None, None).await;
        assert_eq!(list.as_array().unwrap().len(), 1);

        let (status, _, _) = send(&app, "GET", "/items/999/bundled", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_loss_reports() {
        let app = app();
        let form = json!({
            "reported_at": "2024-07-01T10:00:00",
            "reporter": {"name": "Ueda", "phone": "080"},
            "classification": {"large": "Bags"}
        });
        let (status, _, report) = send(&app, "POST", "/loss-reports", None, Some(form)).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = report["id"].as_i64().unwrap();

        let req = json!({"ids": [id], "resolved_on": "2024-07-03"});
        let (status, _, outcome) =
            send(&app, "POST", "/loss-reports/resolve", None, Some(req)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(outcome["succeeded"], json!([id]));

        let (_, _, report) =
            send(&app, "GET", &format!("/loss-reports/{}", id), None, None).await;
        assert_eq!(report["status"], "RESOLVED");
    }
}
