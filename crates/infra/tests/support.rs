//! Shared fixtures for APSIS integration tests.

use std::sync::Arc;
use std::time::Duration;

use apsis_common::MockClock;
use apsis_core::ExceptionMapper;
use apsis_domain::{ApiSettings, DemographicSetting};
use apsis_infra::http::HttpClient;
use apsis_infra::integrations::apsis::{ApsisClient, CacheStoreConfig, MemoryCacheStore, RequestClient, ResponseCache};
use serde_json::{json, Value};
use wiremock::MockServer;

pub const API_KEY: &str = "test-key";

/// Mock APSIS server plus a client wired to it with a controllable clock.
pub struct TestApi {
    pub server: MockServer,
    pub client: Arc<ApsisClient>,
    pub clock: MockClock,
    pub store: Arc<MemoryCacheStore<MockClock>>,
}

impl TestApi {
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    /// Start a server and adjust the settings pointing at it.
    pub async fn start_with(customize: impl FnOnce(&mut ApiSettings)) -> Self {
        let server = MockServer::start().await;
        let mut settings = settings_for(&server);
        customize(&mut settings);

        let clock = MockClock::new();
        let store = Arc::new(MemoryCacheStore::with_clock(
            &CacheStoreConfig::with_retention(Duration::from_secs(3600)),
            clock.clone(),
        ));
        let cache = ResponseCache::with_clock(store.clone(), Arc::new(clock.clone()));
        let http = HttpClient::builder().timeout(Duration::from_secs(5)).build().expect("http client should build");
        let mapper = Arc::new(ExceptionMapper::with_default_kinds().expect("default kinds should register"));
        let requests = RequestClient::new(http, Arc::new(settings), mapper, cache);

        Self { server, client: Arc::new(ApsisClient::new(requests)), clock, store }
    }
}

/// Plain-HTTP settings for the mock server, allowing lists 1 and 2.
pub fn settings_for(server: &MockServer) -> ApiSettings {
    let host = server.uri().trim_start_matches("http://").to_string();
    ApiSettings {
        ssl: false,
        host,
        api_key: API_KEY.to_string(),
        allowed_mailing_lists: vec!["1".to_string(), "2".to_string()],
        ..ApiSettings::default()
    }
}

pub fn demographic(key: &str, required: bool) -> DemographicSetting {
    DemographicSetting { key: key.to_string(), available: true, required }
}

pub fn envelope(result: Value) -> Value {
    json!({ "Result": result, "Message": null })
}

pub fn service_error(code: i32, message: &str) -> Value {
    json!({ "Code": code, "Message": message })
}
