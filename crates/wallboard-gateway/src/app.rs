use axum::{
    routing::{get, post, put},
    Router,
};
use dashmap::DashMap;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use wallboard_core::WallboardConfig;
use wallboard_scheduler::EngineClient;
use wallboard_store::{ChangeBus, SqliteSource};

/// Central shared state — passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    pub config: WallboardConfig,
    pub store: Arc<SqliteSource>,
    pub bus: ChangeBus,
    pub engine: EngineClient,
    /// Set once by the engine's access-denied callback; never cleared.
    pub access_denied: Arc<AtomicBool>,
    /// Active WS display connections: conn_id -> connected-at.
    pub ws_clients: DashMap<String, chrono::DateTime<chrono::Utc>>,
}

impl AppState {
    pub fn new(
        config: WallboardConfig,
        store: Arc<SqliteSource>,
        bus: ChangeBus,
        engine: EngineClient,
        access_denied: Arc<AtomicBool>,
    ) -> Self {
        Self {
            config,
            store,
            bus,
            engine,
            access_denied,
            ws_clients: DashMap::new(),
        }
    }

    pub fn is_access_denied(&self) -> bool {
        self.access_denied.load(Ordering::SeqCst)
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route("/ws", get(crate::ws::connection::ws_handler))
        .route("/v1/wallboard", get(crate::http::wallboard::frame_handler))
        .route(
            "/v1/wallboard/scroll",
            get(crate::http::wallboard::scroll_handler),
        )
        .route(
            "/v1/wallboard/extent",
            post(crate::http::wallboard::extent_handler),
        )
        .route("/v1/preset", put(crate::http::wallboard::preset_handler))
        .route(
            "/v1/announcements",
            post(crate::http::announcements::create_handler),
        )
        .route(
            "/webhooks/changes",
            post(crate::http::webhooks::changes_handler),
        )
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;
    use wallboard_core::config::WebhookAuthMode;
    use wallboard_core::{Preset, Resource};
    use wallboard_scheduler::{EngineHandle, WallboardEngine};
    use wallboard_store::WallboardSource;

    struct Harness {
        state: Arc<AppState>,
        handle: EngineHandle,
    }

    fn harness(config: WallboardConfig) -> Harness {
        let bus = ChangeBus::new();
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let store = Arc::new(SqliteSource::new(conn).unwrap().with_bus(bus.clone()));
        let source: Arc<dyn WallboardSource> = store.clone();
        let handle = WallboardEngine::new(
            source,
            &bus,
            config.engine.clone(),
            &config.preset,
            config.display.offset(),
        )
        .mount();
        let state = Arc::new(AppState::new(
            config,
            store,
            bus,
            handle.client(),
            Arc::new(AtomicBool::new(false)),
        ));
        Harness { state, handle }
    }

    async fn call(state: &Arc<AppState>, req: Request<Body>) -> (StatusCode, Value) {
        let resp = build_router(Arc::clone(state)).oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn json_req(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_reports_display_status() {
        let h = harness(WallboardConfig::default());
        let (status, body) = call(&h.state, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["ws_clients"], 0);
        assert!(body["display"].is_string());
        h.handle.unmount().await;
    }

    #[tokio::test]
    async fn display_token_is_enforced() {
        let mut config = WallboardConfig::default();
        config.gateway.display_token = Some("wall-1".to_string());
        let h = harness(config);

        let (status, body) = call(&h.state, get("/v1/wallboard")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHORIZED");

        let (status, _) = call(&h.state, get("/v1/wallboard?token=nope")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = call(&h.state, get("/v1/wallboard?token=wall-1")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["panel_order"].is_array());

        let req = Request::builder()
            .uri("/v1/wallboard/scroll")
            .header("authorization", "Bearer wall-1")
            .body(Body::empty())
            .unwrap();
        let (status, body) = call(&h.state, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["offset"], 0.0);
        h.handle.unmount().await;
    }

    #[tokio::test]
    async fn denied_display_answers_forbidden() {
        let h = harness(WallboardConfig::default());
        h.state.access_denied.store(true, Ordering::SeqCst);
        let (status, body) = call(&h.state, get("/v1/wallboard")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "ACCESS_DENIED");
        h.handle.unmount().await;
    }

    #[tokio::test]
    async fn preset_is_normalised_and_applied() {
        let h = harness(WallboardConfig::default());
        let preset = Preset {
            calendar_only: true,
            ..Preset::default()
        };
        let (status, body) = call(
            &h.state,
            json_req("PUT", "/v1/preset", serde_json::to_value(&preset).unwrap()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["panel_order"], serde_json::json!(["calendar"]));

        let mut frames = h.state.engine.subscribe_frames();
        let frame = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            frames.wait_for(|f| f.panel_order == vec![wallboard_core::PanelKey::Calendar]),
        )
        .await
        .unwrap()
        .unwrap()
        .clone();
        assert_eq!(frame.panel, wallboard_core::PanelKey::Calendar);
        h.handle.unmount().await;
    }

    #[tokio::test]
    async fn extent_rejects_negative_values() {
        let h = harness(WallboardConfig::default());
        let (status, _) = call(
            &h.state,
            json_req(
                "POST",
                "/v1/wallboard/extent",
                serde_json::json!({"panel": "crew", "extent": -4.0}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(
            &h.state,
            json_req(
                "POST",
                "/v1/wallboard/extent",
                serde_json::json!({"panel": "crew", "extent": 240.0}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        h.handle.unmount().await;
    }

    #[tokio::test]
    async fn announcement_is_stored_and_published() {
        let h = harness(WallboardConfig::default());
        let mut changes = h.state.bus.subscribe(Resource::Announcements);

        let (status, body) = call(
            &h.state,
            json_req(
                "POST",
                "/v1/announcements",
                serde_json::json!({"message": "[HIGHLIGHT_JOB:job-1] Doors at 19:00", "level": "warn"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["level"], "warn");
        assert_eq!(body["active"], true);
        assert!(changes.try_recv().is_ok());

        let (status, body) = call(
            &h.state,
            json_req("POST", "/v1/announcements", serde_json::json!({"message": "   "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_REQUEST");
        h.handle.unmount().await;
    }

    #[tokio::test]
    async fn change_webhook_publishes_resources() {
        let h = harness(WallboardConfig::default());
        let notice = serde_json::json!({"resource": "timesheets"});
        let (status, _) = call(&h.state, json_req("POST", "/webhooks/changes", notice.clone())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        h.handle.unmount().await;

        let mut config = WallboardConfig::default();
        config.webhooks.enabled = true;
        config.webhooks.auth_mode = WebhookAuthMode::BearerToken;
        config.webhooks.secret = Some("hook".to_string());
        let h = harness(config);
        let mut changes = h.state.bus.subscribe(Resource::Timesheets);

        let (status, _) = call(&h.state, json_req("POST", "/webhooks/changes", notice.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let authed = |body: Value| {
            Request::builder()
                .method("POST")
                .uri("/webhooks/changes")
                .header("authorization", "Bearer hook")
                .body(Body::from(body.to_string()))
                .unwrap()
        };
        let (status, body) = call(&h.state, authed(notice)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["published"], serde_json::json!(["timesheets"]));
        assert!(changes.try_recv().is_ok());

        let (status, _) = call(&h.state, authed(serde_json::json!({"resource": "invoices"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        h.handle.unmount().await;
    }
}
