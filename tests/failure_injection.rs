//! Failure injection tests for the gateway.

use axum::http::StatusCode;
use serde_json::Value;
use std::time::Duration;

use api_gateway::resilience::BreakerState;
use api_gateway::routing::ServiceKind;

mod common;

use common::{client, dead_address, dead_instance, spawn_gateway, test_config};

#[tokio::test]
async fn retry_moves_past_dead_instance() {
    let dead = dead_address().await;
    let live = common::start_mock_backend(r#"{"id":"a1"}"#).await;

    let gateway = spawn_gateway(
        test_config(),
        vec![
            dead_instance("account_service", dead),
            live.instance("account_service"),
        ],
    )
    .await;

    let res = client()
        .post(gateway.url("/accounts"))
        .body(r#"{"owner":"x"}"#)
        .send()
        .await
        .expect("Gateway unreachable");

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), r#"{"id":"a1"}"#);
    assert_eq!(live.calls(), 1);
    assert_eq!(
        gateway
            .dispatcher
            .breakers()
            .for_service(ServiceKind::Account)
            .consecutive_failures(),
        0
    );

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn circuit_opens_then_fails_fast() {
    let dead = dead_address().await;
    let gateway = spawn_gateway(test_config(), vec![dead_instance("account_service", dead)]).await;
    let client = client();

    let res = client.post(gateway.url("/accounts/1/deposit")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let body: Value = res.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("account_service"));

    assert_eq!(
        gateway.dispatcher.breakers().for_service(ServiceKind::Account).state(),
        BreakerState::Open
    );

    let res = client.post(gateway.url("/accounts/1/deposit")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = res.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("circuit open"));

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn circuit_recovers_after_cooldown() {
    let healthy = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
    let flag = healthy.clone();
    let backend = common::start_programmable_backend(move || {
        let flag = flag.clone();
        async move {
            if !flag.load(std::sync::atomic::Ordering::SeqCst) {
                // past the 100ms backend deadline
                tokio::time::sleep(Duration::from_millis(300)).await;
            }
            (200, "[]".to_string())
        }
    })
    .await;

    let mut config = test_config();
    config.timeouts.backend_ms = 100;
    config.circuit_breaker.cooldown_ms = 200;
    let gateway = spawn_gateway(config, vec![backend.instance("template_service")]).await;
    let client = client();

    let res = client.get(gateway.url("/templates")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(backend.calls(), 3);

    healthy.store(true, std::sync::atomic::Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(250)).await;

    let res = client.get(gateway.url("/templates")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        gateway.dispatcher.breakers().for_service(ServiceKind::Template).state(),
        BreakerState::Closed
    );

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn admission_limit_rejects_eleventh_request() {
    let slow = common::start_programmable_backend(|| async {
        tokio::time::sleep(Duration::from_millis(500)).await;
        (200, r#"{"ok":true}"#.to_string())
    })
    .await;
    let gateway = spawn_gateway(test_config(), vec![slow.instance("template_service")]).await;
    let client = client();

    let mut in_flight = Vec::new();
    for i in 0..10 {
        let client = client.clone();
        let url = gateway.url(&format!("/templates/t{i}"));
        in_flight.push(tokio::spawn(async move { client.get(&url).send().await }));
    }

    for _ in 0..200 {
        if gateway.dispatcher.admission().in_flight() == 10 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(gateway.dispatcher.admission().in_flight(), 10);

    let res = client.get(gateway.url("/templates/t99")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "too many concurrent requests");

    for task in in_flight {
        let res = task.await.unwrap().unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
    assert_eq!(gateway.dispatcher.admission().in_flight(), 0);
    assert_eq!(slow.calls(), 10);

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn backend_error_status_is_passed_through() {
    let failing = common::start_programmable_backend(|| async {
        (500, r#"{"detail":"boom"}"#.to_string())
    })
    .await;
    let gateway = spawn_gateway(test_config(), vec![failing.instance("account_service")]).await;

    let res = client()
        .get(gateway.url("/accounts/1/transactions"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.text().await.unwrap(), r#"{"detail":"boom"}"#);
    assert_eq!(failing.calls(), 1);

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn malformed_account_response_is_500() {
    let broken = common::start_mock_backend("this is not json").await;
    let gateway = spawn_gateway(test_config(), vec![broken.instance("account_service")]).await;

    let res = client()
        .get(gateway.url("/accounts/1/balance"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().starts_with("error parsing response"));
    assert_eq!(broken.calls(), 1);

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn oversized_backend_response_is_500_without_retry() {
    let chatty = common::start_mock_backend(r#"{"templates":["a","b","c","d","e","f"]}"#).await;
    let mut config = test_config();
    config.listener.max_response_bytes = 16;
    let gateway = spawn_gateway(config, vec![chatty.instance("template_service")]).await;

    let res = client().get(gateway.url("/templates")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "response from template_service exceeds 16 bytes");
    assert_eq!(chatty.calls(), 1);
    assert_eq!(
        gateway.dispatcher.breakers().for_service(ServiceKind::Template).state(),
        BreakerState::Closed
    );

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn unregistered_service_is_503() {
    let accounts = common::start_mock_backend("{}").await;
    let gateway = spawn_gateway(test_config(), vec![accounts.instance("account_service")]).await;

    let res = client().get(gateway.url("/templates")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "no instances registered for template_service");
    assert_eq!(accounts.calls(), 0);

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn graceful_shutdown_stops_server() {
    let accounts = common::start_mock_backend("{}").await;
    let gateway = spawn_gateway(test_config(), vec![accounts.instance("account_service")]).await;

    let res = client().get(gateway.url("/status")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    gateway.shutdown.trigger();
    let result = tokio::time::timeout(Duration::from_secs(5), gateway.handle)
        .await
        .expect("server did not stop");
    assert!(result.unwrap().is_ok());
}
