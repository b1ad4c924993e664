//! Integration tests for the Site Manager endpoints.
//!
//! Each test points a client at a local mock server and checks the request
//! line, query string and body the client produces, and that the response
//! payload comes back unchanged.

use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use unifi_core::client::HttpConfig;
use unifi_core::{ApiError, Error, SiteManagerConfig};
use unifi_sitemanager::{
    DeviceListParams, IspMetricsQuery, MetricInterval, MetricsWindow, PageParams,
    SiteManagerClient,
};
use wiremock::matchers::{body_json, header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Get the path to the test fixtures directory.
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Load the host page fixture from disk.
fn load_hosts_fixture() -> Value {
    let fixture_path = fixtures_dir().join("hosts_page.json");
    let raw = fs::read_to_string(&fixture_path).unwrap_or_else(|e| {
        panic!(
            "Failed to read hosts fixture at {}: {}",
            fixture_path.display(),
            e
        )
    });
    serde_json::from_str(&raw).unwrap()
}

fn client_for(server: &MockServer) -> SiteManagerClient {
    let config = SiteManagerConfig::new("integration-key")
        .unwrap()
        .with_base_url(server.uri());
    SiteManagerClient::builder(config)
        .with_http_config(HttpConfig::default().without_retries())
        .build()
        .unwrap()
}

fn ok(body: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

#[tokio::test]
async fn test_list_hosts_returns_payload_unchanged() {
    let server = MockServer::start().await;
    let fixture = load_hosts_fixture();

    Mock::given(method("GET"))
        .and(path("/v1/hosts"))
        .and(query_param("pageSize", "10"))
        .and(query_param_is_missing("nextToken"))
        .and(header("x-api-key", "integration-key"))
        .and(header("accept", "application/json"))
        .respond_with(ok(fixture.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let hosts = client.list_hosts(&PageParams::default()).await.unwrap();

    assert_eq!(hosts, fixture);
    assert_eq!(hosts["data"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_list_hosts_forwards_next_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/hosts"))
        .and(query_param("pageSize", "100"))
        .and(query_param("nextToken", "page-2"))
        .respond_with(ok(json!({"data": [], "httpStatusCode": 200})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let page = PageParams::new()
        .with_page_size(100)
        .with_next_token("page-2");
    client.list_hosts(&page).await.unwrap();
}

#[tokio::test]
async fn test_get_host_by_id() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/hosts/host-123"))
        .respond_with(ok(json!({"data": {"id": "host-123"}})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let host = client.get_host("host-123").await.unwrap();

    assert_eq!(host["data"]["id"], "host-123");
}

#[tokio::test]
async fn test_list_sites() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/sites"))
        .and(query_param("pageSize", "25"))
        .respond_with(ok(json!({"data": [{"siteId": "site-1"}]})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let sites = client
        .list_sites(&PageParams::new().with_page_size(25))
        .await
        .unwrap();

    assert_eq!(sites["data"][0]["siteId"], "site-1");
}

#[tokio::test]
async fn test_list_devices_with_filters() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/devices"))
        .and(query_param("pageSize", "10"))
        .and(query_param("hostIds", "host1,host2"))
        .and(query_param("time", "2024-03-15T14:30:45.123Z"))
        .respond_with(ok(json!({"data": [{"hostId": "host1", "devices": []}]})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let params = DeviceListParams::new()
        .with_host_ids(["host1", "host2"])
        .with_time("2024-03-15T14:30:45.123Z");
    let devices = client.list_devices(&params).await.unwrap();

    assert_eq!(devices["data"][0]["hostId"], "host1");
}

#[tokio::test]
async fn test_get_isp_metrics_with_duration() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/ea/isp-metrics/1h"))
        .and(query_param("duration", "24h"))
        .and(query_param_is_missing("beginTimestamp"))
        .respond_with(ok(json!({"data": [{"metricType": "1h"}]})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let metrics = client
        .get_isp_metrics(MetricInterval::OneHour, &MetricsWindow::duration("24h"))
        .await
        .unwrap();

    assert_eq!(metrics["data"][0]["metricType"], "1h");
}

#[tokio::test]
async fn test_get_isp_metrics_with_range() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/ea/isp-metrics/5m"))
        .and(query_param("beginTimestamp", "2024-03-15T10:00:00.000Z"))
        .and(query_param("endTimestamp", "2024-03-15T14:00:00.000Z"))
        .respond_with(ok(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let window = MetricsWindow::range("2024-03-15T10:00:00.000Z", "2024-03-15T14:00:00.000Z");
    client
        .get_isp_metrics(MetricInterval::FiveMinutes, &window)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_query_isp_metrics_posts_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/ea/isp-metrics/5m/query"))
        .and(body_json(json!({
            "beginTimestamp": "2024-03-15T10:00:00.000Z",
            "endTimestamp": "2024-03-15T14:00:00.000Z",
            "siteIds": ["site1", "site2"]
        })))
        .respond_with(ok(json!({"data": {"metrics": []}})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let query = IspMetricsQuery::new()
        .with_window(MetricsWindow::range(
            "2024-03-15T10:00:00.000Z",
            "2024-03-15T14:00:00.000Z",
        ))
        .with_site_ids(["site1", "site2"]);
    let result = client
        .query_isp_metrics(MetricInterval::FiveMinutes, &query)
        .await
        .unwrap();

    assert_eq!(result, json!({"data": {"metrics": []}}));
}

#[tokio::test]
async fn test_sd_wan_endpoints() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/ea/sd-wan-configs"))
        .respond_with(ok(json!({"data": [{"id": "cfg-1"}]})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/ea/sd-wan-configs/cfg-1"))
        .respond_with(ok(json!({"data": {"id": "cfg-1", "type": "sdwan"}})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/ea/sd-wan-configs/cfg-1/status"))
        .respond_with(ok(json!({"data": {"id": "cfg-1", "fingerprint": "abc"}})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);

    let configs = client.list_sd_wan_configs().await.unwrap();
    assert_eq!(configs["data"][0]["id"], "cfg-1");

    let config = client.get_sd_wan_config("cfg-1").await.unwrap();
    assert_eq!(config["data"]["type"], "sdwan");

    let status = client.get_sd_wan_config_status("cfg-1").await.unwrap();
    assert_eq!(status["data"]["fingerprint"], "abc");

    // All three calls share one session.
    assert_eq!(client.session_id(), Some(1));
}

#[tokio::test]
async fn test_unauthorized_then_success_refreshes_session() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/sites"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/sites"))
        .respond_with(ok(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let sites = client.list_sites(&PageParams::default()).await.unwrap();

    assert_eq!(sites, json!({"data": []}));
    assert_eq!(client.session_id(), Some(2));
}

#[tokio::test]
async fn test_persistent_forbidden_surfaces_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/hosts/host-123"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.get_host("host-123").await.unwrap_err();

    assert_eq!(err.status(), Some(403));
    assert_eq!(err.to_string(), "API request failed: 403");
    match err {
        Error::Api(ApiError::Http { body, .. }) => assert_eq!(body, "forbidden"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/ea/sd-wan-configs"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.list_sd_wan_configs().await.unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert_eq!(client.session_id(), Some(1));
}

#[tokio::test]
async fn test_invalid_json_response() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/hosts"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.list_hosts(&PageParams::default()).await.unwrap_err();

    assert!(err.to_string().starts_with("Invalid JSON response from API"));
    assert!(err.status().is_none());
}

#[tokio::test]
async fn test_client_reopens_session_after_close() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/hosts"))
        .respond_with(ok(json!({"data": []})))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.list_hosts(&PageParams::default()).await.unwrap();
    client.close();
    client.list_hosts(&PageParams::default()).await.unwrap();

    assert_eq!(client.session_id(), Some(2));
}
