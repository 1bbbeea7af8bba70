//! Live server tests over a real TCP listener.

mod common;

use std::net::SocketAddr;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use common::test_config;
use tour_server::config::{Environment, ServerConfig};
use tour_server::{AppServer, Shutdown, Store};

async fn start(config: ServerConfig) -> (SocketAddr, Shutdown, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = AppServer::new(config, Store::new());
    let server_shutdown = shutdown.subscribe();
    let handle = tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    (addr, shutdown, handle)
}

fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

#[tokio::test]
async fn test_serves_api_over_tcp() {
    let (addr, shutdown, handle) = start(test_config(Environment::Development)).await;
    let client = client();

    let res = client
        .post(format!("http://{}/api/v1/tours", addr))
        .json(&json!({
            "name": "The Northern Lights",
            "duration": 3,
            "maxGroupSize": 12,
            "difficulty": "easy",
            "price": 1497,
            "summary": "Enjoy the Northern Lights in one of the best places in the world",
            "imageCover": "tour-9-cover.jpg"
        }))
        .send()
        .await
        .expect("server unreachable");
    assert_eq!(res.status(), 201);

    let res = client
        .get(format!("http://{}/api/v1/tours", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.headers()["x-ratelimit-remaining"], "98");
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["results"], 1);
    assert_eq!(body["data"]["data"][0]["name"], "The Northern Lights");

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not stop")
        .unwrap();
}

#[tokio::test]
async fn test_rate_limit_uses_peer_address_without_proxy_trust() {
    let mut config = test_config(Environment::Production);
    config.listener.trust_proxy = false;
    config.rate_limit.max_requests = 3;
    let (addr, shutdown, handle) = start(config).await;
    let client = client();

    for i in 0..4 {
        let res = client
            .get(format!("http://{}/api/v1/users", addr))
            // Ignored: proxy headers are not trusted.
            .header("x-forwarded-for", format!("10.0.0.{}", i))
            .send()
            .await
            .unwrap();
        if i < 3 {
            assert_eq!(res.status(), 200, "request {} rejected", i + 1);
        } else {
            assert_eq!(res.status(), 429);
        }
    }

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not stop")
        .unwrap();
}

#[tokio::test]
async fn test_shutdown_stops_accepting() {
    let (addr, shutdown, handle) = start(test_config(Environment::Development)).await;
    let client = client();

    let res = client.get(format!("http://{}/", addr)).send().await.unwrap();
    assert_eq!(res.status(), 200);

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not stop")
        .unwrap();

    let fresh = reqwest::Client::builder()
        .no_proxy()
        .pool_max_idle_per_host(0)
        .build()
        .unwrap();
    assert!(fresh.get(format!("http://{}/", addr)).send().await.is_err());
}
