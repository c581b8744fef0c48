//! Failure injection: unhealthy backends, empty pools and recovery.

use std::time::Duration;

use balancing_proxy::config::Strategy;

mod common;

use common::{closed_port_urls, get, settle, MockBackend, TestBalancer};

#[tokio::test]
async fn only_the_healthy_backend_receives_traffic() {
    let b1 = MockBackend::start("b1").await;
    let b2 = MockBackend::start("b2").await;
    let b3 = MockBackend::start("b3").await;
    b2.set_status(500);
    b3.set_status(503);

    let lb = TestBalancer::start(
        Strategy::RoundRobin,
        vec![b1.url(), b2.url(), b3.url()],
        60,
    )
    .await;
    settle().await;

    let client = reqwest::Client::new();
    for _ in 0..3 {
        let (status, body) = get(&client, &lb.url("/")).await;
        assert_eq!(status, 200);
        assert_eq!(body, "b1");
    }

    assert_eq!(b1.hits(), 3);
    assert_eq!(b2.hits() + b3.hits(), 0);

    lb.stop().await.unwrap();
}

#[tokio::test]
async fn empty_pool_answers_503() {
    for strategy in [Strategy::RoundRobin, Strategy::LeastResponse] {
        let lb = TestBalancer::start(strategy, closed_port_urls(2).await, 60).await;
        settle().await;

        let client = reqwest::Client::new();
        for _ in 0..3 {
            let (status, body) = get(&client, &lb.url("/")).await;
            assert_eq!(status, 503);
            assert_eq!(body, "No healthy backends available");
        }

        lb.stop().await.unwrap();
    }
}

#[tokio::test]
async fn server_error_marks_backend_unhealthy() {
    let b1 = MockBackend::start("b1").await;
    let b2 = MockBackend::start("b2").await;

    let lb = TestBalancer::start(Strategy::RoundRobin, vec![b1.url(), b2.url()], 60).await;
    settle().await;

    b1.set_status(500);

    let client = reqwest::Client::new();
    let (status, body) = get(&client, &lb.url("/")).await;
    assert_eq!(status, 503);
    assert_eq!(body, "Backend unavailable");

    // b1 is now out of rotation until the next probe cycle.
    for _ in 0..3 {
        let (status, body) = get(&client, &lb.url("/")).await;
        assert_eq!(status, 200);
        assert_eq!(body, "b2");
    }
    assert_eq!(b1.hits(), 1);

    lb.stop().await.unwrap();
}

#[tokio::test]
async fn status_outside_success_window_is_a_failure() {
    let backend = MockBackend::start("b1").await;
    let lb = TestBalancer::start(Strategy::LeastResponse, vec![backend.url()], 60).await;
    settle().await;

    backend.set_status(404);

    let client = reqwest::Client::new();
    let (status, _) = get(&client, &lb.url("/missing")).await;
    assert_eq!(status, 503);

    let (status, body) = get(&client, &lb.url("/")).await;
    assert_eq!(status, 503);
    assert_eq!(body, "No healthy backends available");

    lb.stop().await.unwrap();
}

#[tokio::test]
async fn prober_restores_a_recovered_backend() {
    for strategy in [Strategy::RoundRobin, Strategy::LeastResponse] {
        let backend = MockBackend::start("b1").await;
        backend.set_status(503);

        let lb = TestBalancer::start(strategy, vec![backend.url()], 1).await;
        settle().await;

        let client = reqwest::Client::new();
        let (status, _) = get(&client, &lb.url("/")).await;
        assert_eq!(status, 503);

        backend.set_status(200);
        tokio::time::sleep(Duration::from_millis(1500)).await;

        let (status, body) = get(&client, &lb.url("/")).await;
        assert_eq!(status, 200);
        assert_eq!(body, "b1");

        lb.stop().await.unwrap();
    }
}
