//! End-to-end: the real registry client and drawing session against the server.

use std::collections::HashMap;

use super::*;
use crate::geo::{GeoPoint, PlotDraft};
use crate::map::MapConfig;
use crate::map::scene::SceneBackend;
use crate::registry::{NoToken, PlotRegistry, RegistryClient, RegistryConfig, StaticToken, TokenSource};
use crate::session::DrawingSession;
use crate::store::AppStore;

async fn spawn_server(token: Option<&str>) -> String {
    let state = RegistryState::new(token.map(str::to_owned));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app(state)).await.unwrap();
    });
    format!("http://{addr}")
}

fn client(root: &str, tokens: Arc<dyn TokenSource>) -> RegistryClient {
    let config = RegistryConfig { base_url: format!("{root}/api"), ..RegistryConfig::default() };
    RegistryClient::new(&config, tokens).unwrap()
}

fn triangle() -> Vec<GeoPoint> {
    vec![GeoPoint::new(-13.240, 34.300), GeoPoint::new(-13.240, 34.301), GeoPoint::new(-13.241, 34.301)]
}

#[test]
fn config_defaults_and_overrides() {
    let empty = ServerConfig::from_lookup(|_| None);
    assert_eq!(empty, ServerConfig { port: DEFAULT_PORT, token: None });

    let vars: HashMap<&str, &str> = [("PORT", "8080"), ("REGISTRY_TOKEN", "abc")].into_iter().collect();
    let cfg = ServerConfig::from_lookup(|k: &str| vars.get(k).map(|v| (*v).to_owned()));
    assert_eq!(cfg, ServerConfig { port: 8080, token: Some("abc".into()) });
}

#[test]
fn config_ignores_bad_port_and_blank_token() {
    let vars: HashMap<&str, &str> = [("PORT", "http"), ("REGISTRY_TOKEN", " ")].into_iter().collect();
    let cfg = ServerConfig::from_lookup(|k: &str| vars.get(k).map(|v| (*v).to_owned()));
    assert_eq!(cfg, ServerConfig { port: DEFAULT_PORT, token: None });
}

#[tokio::test]
async fn health_reports_plot_count() {
    let root = spawn_server(None).await;
    let body: serde_json::Value = reqwest::get(format!("{root}/health")).await.unwrap().json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["plots"], 0);
}

#[tokio::test]
async fn register_then_fetch_round_trip() {
    let root = spawn_server(None).await;
    let registry = client(&root, Arc::new(NoToken));

    let mut draft = PlotDraft::new("Maize", triangle());
    draft.metadata.insert("ownerRef".into(), serde_json::json!("+265990000001"));
    let first = registry.register(&draft).await.unwrap();
    let second = registry.register(&PlotDraft::new("Beans", triangle())).await.unwrap();

    assert_eq!(first.id, "PL0001");
    assert_eq!(second.id, "PL0002");
    assert_eq!(first.owner_ref.as_deref(), Some("+265990000001"));
    assert_eq!(first.attributes.get("status"), Some(&serde_json::json!("pending")));

    let all = registry.fetch_all().await.unwrap();
    assert_eq!(all, vec![first, second]);
}

#[tokio::test]
async fn draft_with_both_owner_keys_stays_readable() {
    let root = spawn_server(None).await;
    let registry = client(&root, Arc::new(NoToken));

    let mut draft = PlotDraft::new("Groundnuts", triangle());
    draft.metadata.insert("ownerRef".into(), serde_json::json!("u-1"));
    draft.metadata.insert("owner_phone".into(), serde_json::json!("+265990000001"));
    let plot = registry.register(&draft).await.unwrap();
    assert_eq!(plot.owner_ref.as_deref(), Some("u-1"));
    assert!(plot.attributes.get("owner_phone").is_none());

    let all = registry.fetch_all().await.unwrap();
    assert_eq!(all, vec![plot]);
}

#[tokio::test]
async fn blank_name_is_rejected_with_server_message() {
    let root = spawn_server(None).await;
    let err = client(&root, Arc::new(NoToken))
        .register(&PlotDraft::new(" ", triangle()))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "name required");
    assert_eq!(err.status(), Some(400));
}

#[tokio::test]
async fn token_protected_server_rejects_anonymous_and_accepts_bearer() {
    let root = spawn_server(Some("field-officer")).await;

    let anonymous = client(&root, Arc::new(NoToken));
    let err = anonymous.fetch_all().await.unwrap_err();
    assert_eq!(err.to_string(), "unauthorized");
    let err = anonymous.register(&PlotDraft::new("A", triangle())).await.unwrap_err();
    assert_eq!(err.to_string(), "unauthorized");

    let authed = client(&root, Arc::new(StaticToken("field-officer".into())));
    authed.register(&PlotDraft::new("A", triangle())).await.unwrap();
    assert_eq!(authed.fetch_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn drawing_session_registers_through_http() {
    let root = spawn_server(None).await;
    let registry: Arc<dyn PlotRegistry> = Arc::new(client(&root, Arc::new(NoToken)));
    let backend = Arc::new(SceneBackend::with_container("map"));
    let store = AppStore::new();
    let session =
        DrawingSession::start(backend.clone(), "map", registry, store.clone(), &MapConfig::default()).unwrap();

    session.load_plots().await.unwrap();
    assert!(store.plots().is_empty());

    let map = session.surface().map_id();
    for point in triangle() {
        backend.click(map, point);
    }
    let plot = session.finalize("Soya").await.unwrap();
    assert_eq!(plot.id, "PL0001");
    assert_eq!(plot.points, triangle());
    assert_eq!(store.plots(), vec![plot]);
    assert!(session.buffer().is_empty());
}
