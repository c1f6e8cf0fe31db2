//! Integration tests for deferred subscriptions with network scenarios
//!
//! **Purpose**: Test the path from subscription request → queue → worker →
//! APSIS API → queue settlement
//!
//! **Coverage:**
//! - Happy path: subscribe → drain → subscriber created → queue empty
//! - Busy service: queue suspended, items kept
//! - Transient failure: item requeued unchanged
//! - Opt-out: item dropped
//!
//! **Infrastructure:**
//! - WireMock HTTP server (simulates the APSIS API)
//! - In-memory subscription queue
//! - Worker with the real `ApsisClient` as forwarder

#![allow(dead_code)]

#[path = "support.rs"]
mod support;

use std::sync::Arc;

use apsis_core::SubscriptionQueue;
use apsis_domain::{SubscriptionRequest, SubscriptionWorkItem};
use apsis_infra::sync::{
    InMemorySubscriptionQueue, SubscriptionQueueWorker, SubscriptionService, SubscriptionWorkerConfig,
};
use serde_json::json;
use support::{demographic, envelope, service_error, TestApi};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

fn worker(api: &TestApi, queue: &Arc<InMemorySubscriptionQueue>) -> SubscriptionQueueWorker {
    SubscriptionQueueWorker::new(queue.clone(), api.client.clone(), SubscriptionWorkerConfig::default())
}

async fn mount_list_info(api: &TestApi) {
    for (id, name) in [(1, "News"), (2, "Offers")] {
        Mock::given(method("GET"))
            .and(path(format!("/v1/mailinglists/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({"Id": id, "Name": name}))))
            .mount(&api.server)
            .await;
    }
}

async fn mount_create(api: &TestApi, list_id: u32, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path(format!("/v1/subscribers/mailinglist/{list_id}/create")))
        .respond_with(response)
        .mount(&api.server)
        .await;
}

#[tokio::test]
async fn subscribe_then_drain_creates_subscribers() {
    let api = TestApi::start_with(|settings| settings.demographics = vec![demographic("Newsletter", false)]).await;
    mount_list_info(&api).await;

    Mock::given(method("GET"))
        .and(path("/accounts/v2/demographics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({"Demographics": [
            {"Key": "Newsletter", "Index": 1, "Alternatives": ["Yes"]}
        ]}))))
        .mount(&api.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/subscribers/v2/email"))
        .respond_with(ResponseTemplate::new(400).set_body_json(service_error(-2, "There is no subscriber with email a@b.com")))
        .mount(&api.server)
        .await;
    for list_id in [1, 2] {
        Mock::given(method("POST"))
            .and(path(format!("/v1/subscribers/mailinglist/{list_id}/create")))
            .and(body_json(json!({
                "Email": "a@b.com",
                "Name": "Ada",
                "DemDataFields": [{"Key": "Newsletter", "Value": "Yes"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!(77))))
            .expect(1)
            .mount(&api.server)
            .await;
    }

    let queue = Arc::new(InMemorySubscriptionQueue::new());
    let service = SubscriptionService::new(api.client.clone(), queue.clone());
    let request = SubscriptionRequest {
        email: "a@b.com".into(),
        name: "Ada".into(),
        list_ids: vec!["1".into(), "2".into()],
        demographic_choices: vec![("Newsletter".into(), Some("on".into()))],
    };

    let queued = service.subscribe(&request).await.unwrap();
    assert_eq!(queued.len(), 2);

    let summary = worker(&api, &queue).drain().await.unwrap();
    assert_eq!(summary.succeeded, 2);
    assert!(queue.is_empty().await.unwrap());
}

#[tokio::test]
async fn busy_service_suspends_queue_and_keeps_items() {
    let api = TestApi::start().await;
    mount_list_info(&api).await;
    mount_create(&api, 1, ResponseTemplate::new(503).set_body_json(service_error(-5, "Service is busy"))).await;

    let queue = Arc::new(InMemorySubscriptionQueue::new());
    queue.enqueue(SubscriptionWorkItem::new("a@b.com", "1", "Ada", Vec::new())).await.unwrap();
    queue.enqueue(SubscriptionWorkItem::new("c@d.com", "1", "Cy", Vec::new())).await.unwrap();

    let summary = worker(&api, &queue).drain().await.unwrap();
    assert!(summary.suspended);
    assert_eq!(summary.released, 1);
    assert!(queue.is_suspended().await.unwrap());
    assert_eq!(queue.len().await.unwrap(), 2);
    assert_eq!(queue.suspension_reason().as_deref(), Some("Service is busy"));
}

#[tokio::test]
async fn server_error_requeues_equal_item() {
    let api = TestApi::start().await;
    mount_list_info(&api).await;
    mount_create(&api, 1, ResponseTemplate::new(500).set_body_json(service_error(-1, "Internal error"))).await;

    let queue = Arc::new(InMemorySubscriptionQueue::new());
    let item = SubscriptionWorkItem::new("a@b.com", "1", "A", Vec::new());
    queue.enqueue(item.clone()).await.unwrap();

    let summary = worker(&api, &queue).process_batch().await.unwrap();
    assert_eq!(summary.requeued, 1);

    let pending = queue.pending();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].item, item);
    assert!(!queue.is_suspended().await.unwrap());
}

#[tokio::test]
async fn opted_out_item_is_dropped() {
    let api = TestApi::start().await;
    mount_list_info(&api).await;
    mount_create(
        &api,
        2,
        ResponseTemplate::new(400).set_body_json(service_error(-2, "Subscriber a@b.com exists on the Opt-out List")),
    )
    .await;

    let queue = Arc::new(InMemorySubscriptionQueue::new());
    queue.enqueue(SubscriptionWorkItem::new("a@b.com", "2", "Ada", Vec::new())).await.unwrap();

    let summary = worker(&api, &queue).process_batch().await.unwrap();
    assert_eq!(summary.dropped, 1);
    assert!(queue.is_empty().await.unwrap());
}

#[tokio::test]
async fn already_subscribed_lists_are_not_queued() {
    let api = TestApi::start().await;

    Mock::given(method("POST"))
        .and(path("/subscribers/v2/email"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!(77))))
        .mount(&api.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/subscribers/77/mailinglists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({"Mailinglists": [{"Id": 1}]}))))
        .mount(&api.server)
        .await;

    let queue = Arc::new(InMemorySubscriptionQueue::new());
    let service = SubscriptionService::new(api.client.clone(), queue.clone());
    let request = SubscriptionRequest {
        email: "a@b.com".into(),
        name: "Ada".into(),
        list_ids: vec!["1".into(), "2".into()],
        demographic_choices: Vec::new(),
    };

    let queued = service.subscribe(&request).await.unwrap();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].item.list_id, "2");
}
