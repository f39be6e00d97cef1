//! Integration tests for the bus clients (wiremock-based)

use std::time::Duration;

use domain::{ArrivalTime, LineId, StopId, VehicleSlot};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use integration_bus::{
    BusApiConfig, BusApiError, BusArrivalClient, KakaoBusClient, KakaoStopDirectory,
    LineValidation, StopDirectoryClient,
};

const ARRIVALS_PATH: &str = "/actions/busesInBusStopJson";

fn stop() -> StopId {
    StopId::new("BS219257").unwrap()
}

fn line(id: &str) -> LineId {
    LineId::new(id).unwrap()
}

const fn sample_buses_json() -> &'static str {
    r#"{
        "busesList": [
            {
                "name": "720",
                "arrivalTime": "125",
                "vehicleNumber": "서울74사1234",
                "currentBusStopName": "안국역",
                "nextBusStopName": "종로2가",
                "vehicleStateMessage": "2번째 전",
                "remainSeat": "-1",
                "collectDateTime": "20240101120000",
                "lastVehicle": "false",
                "busStopCount": "2",
                "arrivalTime2": "600",
                "vehicleNumber2": "서울74사5678",
                "vehicleStateMessage2": "7번째 전",
                "direction": "구파발",
                "typeName": "간선",
                "first": "04:00",
                "last": "22:30",
                "intervals": "8"
            },
            { "name": "9", "arrivalTime": 30 },
            { "name": "100" }
        ]
    }"#
}

async fn mount_buses(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(ARRIVALS_PATH))
        .and(query_param("busStopId", "BS219257"))
        .respond_with(template)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fetch_success_preserves_order() {
    let server = MockServer::start().await;
    mount_buses(
        &server,
        ResponseTemplate::new(200).set_body_string(sample_buses_json()),
    )
    .await;

    let client = KakaoBusClient::new(&BusApiConfig::with_base_url(&server.uri())).unwrap();
    let entries = client.fetch(&stop()).await.unwrap();

    let names: Vec<_> = entries.iter().filter_map(|e| e.line_name()).collect();
    assert_eq!(names, vec!["720", "9", "100"]);

    let records = entries[0].to_records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].slot, VehicleSlot::Current);
    assert_eq!(records[0].arrival, ArrivalTime::Seconds(125));
    assert_eq!(records[1].slot, VehicleSlot::Next);
    assert_eq!(records[1].arrival, ArrivalTime::Seconds(600));
    assert_eq!(records[1].direction.as_deref(), Some("구파발"));
}

#[tokio::test]
async fn test_fetch_empty_list() {
    let server = MockServer::start().await;
    mount_buses(
        &server,
        ResponseTemplate::new(200).set_body_string(r#"{ "busesList": [] }"#),
    )
    .await;

    let client = KakaoBusClient::new(&BusApiConfig::with_base_url(&server.uri())).unwrap();
    let entries = client.fetch(&stop()).await.unwrap();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn test_fetch_server_error() {
    let server = MockServer::start().await;
    mount_buses(&server, ResponseTemplate::new(500)).await;

    let client = KakaoBusClient::new(&BusApiConfig::with_base_url(&server.uri())).unwrap();
    let err = client.fetch(&stop()).await.unwrap_err();
    assert_eq!(err, BusApiError::HttpStatus { status: 500 });
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_fetch_missing_buses_list() {
    let server = MockServer::start().await;
    mount_buses(
        &server,
        ResponseTemplate::new(200).set_body_string(r#"{ "result": "ok" }"#),
    )
    .await;

    let client = KakaoBusClient::new(&BusApiConfig::with_base_url(&server.uri())).unwrap();
    let err = client.fetch(&stop()).await.unwrap_err();
    assert!(matches!(err, BusApiError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_fetch_timeout() {
    let server = MockServer::start().await;
    mount_buses(
        &server,
        ResponseTemplate::new(200)
            .set_body_string(sample_buses_json())
            .set_delay(Duration::from_secs(3)),
    )
    .await;

    let config = BusApiConfig {
        timeout_secs: 1,
        ..BusApiConfig::with_base_url(&server.uri())
    };
    let client = KakaoBusClient::new(&config).unwrap();
    let err = client.fetch(&stop()).await.unwrap_err();
    assert_eq!(err, BusApiError::Timeout { timeout_secs: 1 });
}

#[tokio::test]
async fn test_fetch_connection_refused() {
    // Nothing listens on port 1
    let client = KakaoBusClient::new(&BusApiConfig::with_base_url("http://127.0.0.1:1")).unwrap();
    let err = client.fetch(&stop()).await.unwrap_err();
    assert!(matches!(err, BusApiError::Transport(_)));
}

#[tokio::test]
async fn test_validate_lines() {
    let server = MockServer::start().await;
    mount_buses(
        &server,
        ResponseTemplate::new(200).set_body_string(sample_buses_json()),
    )
    .await;

    let client = KakaoBusClient::new(&BusApiConfig::with_base_url(&server.uri())).unwrap();

    let valid = client.validate(&stop(), &[line("720"), line("9")]).await.unwrap();
    assert_eq!(valid, LineValidation::Valid);

    let invalid = client
        .validate(&stop(), &[line("999"), line("720"), line("1")])
        .await
        .unwrap();
    assert_eq!(invalid.invalid_lines(), &[line("999"), line("1")]);
}

#[tokio::test]
async fn test_validate_unknown_stop() {
    let server = MockServer::start().await;
    mount_buses(
        &server,
        ResponseTemplate::new(200).set_body_string(r#"{ "busesList": [] }"#),
    )
    .await;

    let client = KakaoBusClient::new(&BusApiConfig::with_base_url(&server.uri())).unwrap();
    let result = client.validate(&stop(), &[line("720")]).await.unwrap();
    assert_eq!(result, LineValidation::NoSuchStop);
}

#[tokio::test]
async fn test_search_stops() {
    let server = MockServer::start().await;
    let html = r#"
        <ul>
          <li class="search_item" data-id="BS219257" data-title="광화문">
            <span class="screen_out">버스 정류장 번호</span>01123
            <span class="txt_bar"></span>종로 방면
            <span class="txt_ginfo">서울 종로구</span>
            <span class="bus_type1">간선</span>
          </li>
        </ul>
    "#;

    Mock::given(method("GET"))
        .and(path("/actions/searchView"))
        .and(query_param("q", "광화문"))
        .and(query_param("lvl", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .mount(&server)
        .await;

    let directory = KakaoStopDirectory::new(&BusApiConfig::with_base_url(&server.uri())).unwrap();
    let stops = directory.search_stops("광화문").await.unwrap();

    assert_eq!(stops.len(), 1);
    assert_eq!(stops[0].id, "BS219257");
    assert_eq!(stops[0].title(), "광화문(01123) - 종로 방면");
}

#[tokio::test]
async fn test_search_blank_name_skips_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let directory = KakaoStopDirectory::new(&BusApiConfig::with_base_url(&server.uri())).unwrap();
    assert!(directory.search_stops("   ").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_lines() {
    let server = MockServer::start().await;
    let html = r#"
        <ul>
          <li data-id="1"><strong class="tit_g">720</strong><span class="bus_type1">간선</span></li>
          <li data-id="2"><strong class="tit_g">1020</strong><span class="bus_type2">지선</span></li>
        </ul>
    "#;

    Mock::given(method("GET"))
        .and(path("/actions/busStationInfo"))
        .and(query_param("busStopId", "BS219257"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .mount(&server)
        .await;

    let directory = KakaoStopDirectory::new(&BusApiConfig::with_base_url(&server.uri())).unwrap();
    let lines = directory.list_lines(&stop()).await.unwrap();

    let labels: Vec<_> = lines.iter().map(|l| l.label()).collect();
    assert_eq!(labels, vec!["간선 720", "지선 1020"]);
}

#[tokio::test]
async fn test_list_lines_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/actions/busStationInfo"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let directory = KakaoStopDirectory::new(&BusApiConfig::with_base_url(&server.uri())).unwrap();
    let err = directory.list_lines(&stop()).await.unwrap_err();
    assert_eq!(err, BusApiError::HttpStatus { status: 404 });
}
