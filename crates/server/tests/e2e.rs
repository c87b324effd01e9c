use std::net::SocketAddr;

use axum::Router;
use reqwest::StatusCode as HttpStatusCode;
use serde_json::json;
use tokio::net::TcpListener;
use uuid::Uuid;

use server::auth::{ServerAuthConfig, ServerState};
use server::routes;
use service::storage::engine::Engine;

const TOKEN: &str = "e2e-test-token";

fn cors() -> tower_http::cors::CorsLayer { tower_http::cors::CorsLayer::very_permissive() }

struct TestApp {
    base_url: String,
}

async fn start_server() -> anyhow::Result<TestApp> {
    // Isolated temp snapshot per test run
    let data_file = std::env::temp_dir().join(format!("kvstash_e2e_{}.json", Uuid::new_v4()));
    let engine = Engine::open(&data_file).await;
    let state = ServerState {
        engine,
        auth: ServerAuthConfig { auth_token: TOKEN.into() },
    };

    let app: Router = routes::build_router(state, cors());
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let base_url = format!("http://{}:{}", addr.ip(), addr.port());

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await { eprintln!("server error: {}", e); }
    });

    Ok(TestApp { base_url })
}

fn client() -> reqwest::Client {
    reqwest::Client::new()
}

#[tokio::test]
async fn e2e_public_health() -> anyhow::Result<()> {
    let app = start_server().await?;
    let res = client().get(format!("{}/health", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn e2e_set_get_overwrite_delete_cycle() -> anyhow::Result<()> {
    let app = start_server().await?;
    let c = client();

    // Set
    let res = c.post(format!("{}/set", app.base_url))
        .header("Authorization", TOKEN)
        .json(&json!({"a": {"x": 1}}))
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);

    // Get returns the stored payload
    let res = c.get(format!("{}/get?key=a", app.base_url))
        .header("Authorization", TOKEN)
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body, json!({"x": 1}));

    // Overwrite replaces, does not merge
    let res = c.post(format!("{}/set", app.base_url))
        .header("Authorization", TOKEN)
        .json(&json!({"a": {"x": 2}}))
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let res = c.get(format!("{}/get?key=a", app.base_url))
        .header("Authorization", TOKEN)
        .send().await?;
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body, json!({"x": 2}));

    // Delete, then the key is gone
    let res = c.delete(format!("{}/delete?key=a", app.base_url))
        .header("Authorization", TOKEN)
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let res = c.get(format!("{}/get?key=a", app.base_url))
        .header("Authorization", TOKEN)
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn e2e_batch_set_applies_every_pair() -> anyhow::Result<()> {
    let app = start_server().await?;
    let c = client();

    let res = c.post(format!("{}/set", app.base_url))
        .header("Authorization", TOKEN)
        .json(&json!({"k1": 1, "k2": 2}))
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);

    let res = c.get(format!("{}/get?key=k1", app.base_url))
        .header("Authorization", TOKEN)
        .send().await?;
    assert_eq!(res.json::<serde_json::Value>().await?, json!(1));

    let res = c.get(format!("{}/get?key=k2", app.base_url))
        .header("Authorization", TOKEN)
        .send().await?;
    assert_eq!(res.json::<serde_json::Value>().await?, json!(2));
    Ok(())
}

#[tokio::test]
async fn e2e_store_routes_require_token() -> anyhow::Result<()> {
    let app = start_server().await?;
    let c = client();

    let res = c.post(format!("{}/set", app.base_url))
        .json(&json!({"a": 1}))
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::UNAUTHORIZED);

    let res = c.get(format!("{}/get?key=a", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::UNAUTHORIZED);

    let res = c.delete(format!("{}/deleteAll", app.base_url))
        .header("Authorization", "wrong-token")
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::UNAUTHORIZED);
    Ok(())
}
