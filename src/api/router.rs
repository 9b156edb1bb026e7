//! HTTP route table.
//!
//! Returns a composable `Router` with every dashboard operation
//! mounted under `/api/`. All routes are read-only GETs; request
//! logging and permissive CORS are applied as tower layers.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::state::AppState;

/// Build the dashboard API router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/health", get(endpoints::health::check))
        // Agenda
        .route("/day-agenda", get(endpoints::agenda::day_agenda))
        .route("/week-agenda", get(endpoints::agenda::week_agenda))
        .route("/professionals", get(endpoints::agenda::professionals))
        .route("/day-summary", get(endpoints::agenda::day_summary))
        .route("/monthly-stats", get(endpoints::agenda::monthly_stats))
        .route("/upcoming", get(endpoints::agenda::upcoming))
        .route("/wait-times", get(endpoints::agenda::wait_times))
        .route("/search-agenda", get(endpoints::agenda::search_agenda))
        .route("/calendar-grid", get(endpoints::calendar::calendar_grid))
        // Ledger
        .route("/monthly-ledger", get(endpoints::ledger::monthly_ledger))
        .route("/account-balances", get(endpoints::ledger::account_balances))
        .route("/daily-flow", get(endpoints::ledger::daily_flow))
        .route("/pending-entries", get(endpoints::ledger::pending_entries))
        .route("/recurring-charges", get(endpoints::ledger::recurring_charges))
        .route("/recent-entries", get(endpoints::ledger::recent_entries))
        .route("/top-clients", get(endpoints::ledger::top_clients))
        .route("/top-expenses", get(endpoints::ledger::top_expenses))
        // Documents
        .route("/documents/:id", get(endpoints::documents::fetch))
        .with_state(state);

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use chrono::Duration;
    use rusqlite::Connection;
    use tower::ServiceExt;

    use crate::grid::GridConfig;

    fn seed_agenda(conn: &Connection) {
        conn.execute_batch(
            "INSERT INTO patients (id, name) VALUES (1, 'Ana Souza'), (2, 'Bruno Lima');
             INSERT INTO professionals (id, name) VALUES (10, 'Dra. Costa');
             INSERT INTO appointments
                (id, date, start_time, duration_minutes, status_code, patient_id, professional_id)
             VALUES
                (1, '2024-03-04', '09:00', 30, 4, 1, 10),
                (2, '2024-03-04', '09:15', 15, 2, 2, 10),
                (3, '2024-03-06', '10:00', 30, 1, 1, 10);",
        )
        .unwrap();
    }

    fn seed_ledger(conn: &Connection) {
        // Ledger endpoints aggregate trailing windows from the current
        // date, so fixture rows are dated relative to it.
        let recent = (chrono::Local::now().date_naive() - Duration::days(10))
            .format("%Y-%m-%d")
            .to_string();
        conn.execute_batch(&format!(
            "INSERT INTO accounts (id, name, kind) VALUES (1, 'Caixa', 'cash');
             INSERT INTO counterparties (id, name) VALUES (1, 'Ana Souza'), (2, 'Bruno Lima');
             INSERT INTO ledger_entries
                (id, date, amount, direction, realized, eliminated, account_id, counterparty_id, description)
             VALUES
                (1, '{recent}', '100.00', 'C', 1, 0, 1, 1, NULL),
                (2, '{recent}', '40.00', 'D', 1, 0, 1, NULL, 'Luz'),
                (3, '{recent}', '300.00', 'C', 1, 0, 1, 2, NULL),
                (4, '{recent}', '75.00', 'C', 0, 0, 1, 1, NULL),
                (5, '{recent}', '55.00', 'D', 0, 0, 1, 2, 'Aluguel');",
        ))
        .unwrap();
    }

    fn test_router() -> (tempfile::TempDir, Router) {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("clinic.db");
        let conn = crate::db::open_database(&db_path).unwrap();
        seed_agenda(&conn);
        seed_ledger(&conn);
        drop(conn);

        let state = Arc::new(AppState {
            db_path,
            shards_dir: dir.path().join("blobs"),
            grid: GridConfig::default(),
        });
        (dir, build_router(state))
    }

    async fn get_json(
        router: &Router,
        uri: &str,
    ) -> (StatusCode, serde_json::Value) {
        let response = router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (_dir, router) = test_router();
        let (status, json) = get_json(&router, "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn day_agenda_returns_ordered_events() {
        let (_dir, router) = test_router();
        let (status, json) = get_json(&router, "/api/day-agenda?date=2024-03-04").await;
        assert_eq!(status, StatusCode::OK);
        let events = json.as_array().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0]["patient"], "Ana Souza");
        assert_eq!(events[0]["category"], "completed");
    }

    #[tokio::test]
    async fn empty_day_is_an_empty_array() {
        let (_dir, router) = test_router();
        let (status, json) = get_json(&router, "/api/day-agenda?date=2024-07-01").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!([]));
    }

    #[tokio::test]
    async fn day_agenda_rejects_malformed_date() {
        let (_dir, router) = test_router();
        let (status, json) = get_json(&router, "/api/day-agenda?date=someday").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn day_summary_counts_categories() {
        let (_dir, router) = test_router();
        let (status, json) = get_json(&router, "/api/day-summary?date=2024-03-04").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["total"], 2);
        assert_eq!(json["completed"], 1);
        assert_eq!(json["queued"], 1);
        assert_eq!(json["cancelled"], 0);
    }

    #[tokio::test]
    async fn week_agenda_includes_window() {
        let (_dir, router) = test_router();
        let (status, json) = get_json(&router, "/api/week-agenda?date=2024-03-06").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["window"]["start"], "2024-03-04");
        assert_eq!(json["window"]["end"], "2024-03-09");
        assert_eq!(json["events"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn search_agenda_requires_bounds() {
        let (_dir, router) = test_router();
        let (status, json) = get_json(&router, "/api/search-agenda").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "MISSING_PARAMETER");

        let (status, json) =
            get_json(&router, "/api/search-agenda?start=2024-03-01").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"]["message"].as_str().unwrap().contains("end"));
    }

    #[tokio::test]
    async fn search_agenda_filters_by_status() {
        let (_dir, router) = test_router();
        let (status, json) = get_json(
            &router,
            "/api/search-agenda?start=2024-03-01&end=2024-03-31&status=1",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let events = json.as_array().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["category"], "scheduled");
    }

    #[tokio::test]
    async fn professionals_listed() {
        let (_dir, router) = test_router();
        let (status, json) = get_json(&router, "/api/professionals").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json[0]["name"], "Dra. Costa");
    }

    #[tokio::test]
    async fn calendar_grid_two_weeks_has_twelve_buckets() {
        let (_dir, router) = test_router();
        let (status, json) =
            get_json(&router, "/api/calendar-grid?date=2024-03-06&weeks=2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["days"].as_object().unwrap().len(), 12);
        // Seeded events land in their buckets
        assert_eq!(json["days"]["2024-03-04"].as_array().unwrap().len(), 2);
        assert_eq!(json["details"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn calendar_grid_rejects_bad_week_count() {
        let (_dir, router) = test_router();
        let (status, _) = get_json(&router, "/api/calendar-grid?weeks=3").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn monthly_ledger_and_balances() {
        let (_dir, router) = test_router();
        let (status, json) = get_json(&router, "/api/monthly-ledger").await;
        assert_eq!(status, StatusCode::OK);
        assert!(!json.as_array().unwrap().is_empty());

        let (status, json) = get_json(&router, "/api/account-balances").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json[0]["name"], "Caixa");
        assert_eq!(json[0]["balance"], "360.00");
    }

    #[tokio::test]
    async fn pending_entries_partitioned_by_direction() {
        let (_dir, router) = test_router();
        let (status, json) = get_json(&router, "/api/pending-entries").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["receivable"].as_array().unwrap().len(), 1);
        assert_eq!(json["payable"].as_array().unwrap().len(), 1);
        assert_eq!(json["other"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn top_clients_sorted_by_total() {
        let (_dir, router) = test_router();
        let (status, json) = get_json(&router, "/api/top-clients").await;
        assert_eq!(status, StatusCode::OK);
        let rows = json.as_array().unwrap();
        assert_eq!(rows[0]["name"], "Bruno Lima");
        assert_eq!(rows[0]["total"], "300.00");
        assert_eq!(rows[1]["name"], "Ana Souza");
    }

    #[tokio::test]
    async fn recent_entries_respects_limit() {
        let (_dir, router) = test_router();
        let (status, json) = get_json(&router, "/api/recent-entries?limit=2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn missing_document_shard_is_a_hidden_store_error() {
        let (_dir, router) = test_router();
        let (status, json) = get_json(&router, "/api/documents/42").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"]["code"], "STORE_ERROR");
        assert!(!json["error"]["message"]
            .as_str()
            .unwrap()
            .contains("clinic_blob"));
    }

    #[tokio::test]
    async fn missing_document_row_is_not_found() {
        let (dir, router) = test_router();
        let shards = dir.path().join("blobs");
        std::fs::create_dir_all(&shards).unwrap();
        let shard = Connection::open(shards.join("clinic_blob1.db")).unwrap();
        shard
            .execute_batch("CREATE TABLE documents (id INTEGER PRIMARY KEY, content BLOB NOT NULL)")
            .unwrap();
        drop(shard);

        let (status, json) = get_json(&router, "/api/documents/42").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn document_bytes_round_trip() {
        let (dir, router) = test_router();
        let shards = dir.path().join("blobs");
        std::fs::create_dir_all(&shards).unwrap();
        let shard = Connection::open(shards.join("clinic_blob2.db")).unwrap();
        shard
            .execute_batch(
                "CREATE TABLE documents (id INTEGER PRIMARY KEY, content BLOB NOT NULL);
                 INSERT INTO documents (id, content) VALUES (5001, X'255044462D312E34');",
            )
            .unwrap();
        drop(shard);

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/documents/5001")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"],
            "application/pdf"
        );
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"%PDF-1.4");
    }
}
