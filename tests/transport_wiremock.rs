use sectorhub::config::{Config, LockPolicy};
use sectorhub::scrapers::fetch::{fetch_with_retry, FetchOutcome, ReqwestTransport, RetryPolicy};
use sectorhub::scrapers::price_api::{PriceApiClient, PriceFetchSettings};
use sectorhub::services::data_service::DataService;
use sectorhub::SectorHubError;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transport() -> ReqwestTransport {
    ReqwestTransport::new(Duration::from_secs(5)).unwrap()
}

fn no_wait() -> PriceFetchSettings {
    PriceFetchSettings {
        rate_limit_delay: Duration::ZERO,
        retry_delay: Duration::ZERO,
        max_consecutive_unavailable: 10,
    }
}

fn daily_series(days: &[(&str, &str)]) -> String {
    let entries: Vec<String> = days
        .iter()
        .map(|(date, open)| {
            format!(
                r#""{d}": {{"1. open": "{o}", "2. high": "{o}", "3. low": "{o}", "4. close": "{o}", "5. adjusted close": "{o}", "6. volume": "2500", "7. dividend amount": "0.0000", "8. split coefficient": "1.0000"}}"#,
                d = date,
                o = open
            )
        })
        .collect();
    format!(
        r#"{{"Meta Data": {{"1. Information": "Daily Time Series"}}, "Time Series (Daily)": {{{}}}}}"#,
        entries.join(", ")
    )
}

#[tokio::test]
async fn retries_once_after_service_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/quote/AAPL/profile"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/quote/AAPL/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&server)
        .await;

    let url = format!("{}/quote/AAPL/profile?p=AAPL", server.uri());
    let outcome = fetch_with_retry(&transport(), &url, &RetryPolicy::profile(Duration::ZERO)).await;

    assert_eq!(
        outcome,
        FetchOutcome::Success {
            body: "<html></html>".to_string(),
            retries: 1
        }
    );
}

#[tokio::test]
async fn bad_request_is_retryable_only_for_screener_pages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    let url = format!("{}/equities?page=1", server.uri());
    let screener = fetch_with_retry(&transport(), &url, &RetryPolicy::screener(Duration::ZERO)).await;
    let profile = fetch_with_retry(&transport(), &url, &RetryPolicy::profile(Duration::ZERO)).await;

    assert!(!screener.is_success());
    assert_eq!(screener.retries(), 1);
    assert_eq!(profile.retries(), 0);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn price_client_collects_symbols_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/query"))
        .and(query_param("function", "TIME_SERIES_DAILY_ADJUSTED"))
        .and(query_param("symbol", "AAA"))
        .respond_with(ResponseTemplate::new(200).set_body_string(daily_series(&[("2024-01-03", "11.5"), ("2024-01-02", "11.0")])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/query"))
        .and(query_param("symbol", "NOPE"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"Error Message": "Invalid API call."}"#))
        .mount(&server)
        .await;

    let client = PriceApiClient::new(
        Arc::new(transport()),
        &format!("{}/query", server.uri()),
        "demo",
        no_wait(),
    );
    let table = client
        .fetch_all(&["AAA".to_string(), "NOPE".to_string()], None)
        .await
        .unwrap();

    assert_eq!(table.symbols(), vec!["AAA"]);
    assert_eq!(table.rows()[0].open, 11.5);
}

#[tokio::test]
async fn persistent_503_ends_the_batch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = PriceApiClient::new(
        Arc::new(transport()),
        &format!("{}/query", server.uri()),
        "demo",
        no_wait(),
    );
    let err = client
        .fetch_all(&["AAA".to_string(), "BBB".to_string()], None)
        .await
        .unwrap_err();

    assert!(matches!(err, SectorHubError::ServiceUnavailable { count: 10, .. }));
    assert_eq!(server.received_requests().await.unwrap().len(), 10);
}

#[tokio::test]
async fn full_run_against_mock_sites() {
    let server = MockServer::start().await;
    let page = r#"<html><body><div class="table-responsive"><table><tbody>
        <tr><td><a href="/stocks/AAA">AAA</a></td><td><a href="/stocks/AAA">Aaa Corp</a></td><td>10.00</td><td>2.1</td><td>1,500,000</td></tr>
        <tr><td><a href="/stocks/BBB">BBB</a></td><td><a href="/stocks/BBB">Bbb Corp</a></td><td>5.00</td><td>1.2</td><td>900,000</td></tr>
        </tbody></table></div></body></html>"#;
    Mock::given(method("GET"))
        .and(path("/equities"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page))
        .mount(&server)
        .await;
    let profile = r#"<html><body><p class="D(ib) Va(t)"><span>Sector(s)</span>: <span class="Fw(600)">Energy</span><br/><span>Industry</span>: <span class="Fw(600)">Oil &amp; Gas</span><br/><span>Full Time Employees</span>: <span class="Fw(600)">2,300</span></p></body></html>"#;
    Mock::given(method("GET"))
        .and(path("/quote/AAA/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_string(profile))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/quote/BBB/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_string(profile))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/query"))
        .and(query_param("symbol", "AAA"))
        .respond_with(ResponseTemplate::new(200).set_body_string(daily_series(&[
            ("2024-01-04", "10"),
            ("2024-01-03", "20"),
            ("2024-01-02", "10"),
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/query"))
        .and(query_param("symbol", "BBB"))
        .respond_with(ResponseTemplate::new(200).set_body_string(daily_series(&[
            ("2024-01-04", "10"),
            ("2024-01-03", "5"),
            ("2024-01-02", "5"),
        ])))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = Config::new()
        .with_data_dir(dir.path().to_str().unwrap())
        .with_max_page(2)
        .with_overwrite(true)
        .with_api_key("demo")
        .with_screener_url(&format!("{}/equities?sort=average_daily_volume", server.uri()))
        .with_profile_url(&format!("{}/quote", server.uri()))
        .with_price_api_url(&format!("{}/query", server.uri()))
        .with_delays(Duration::ZERO, Duration::ZERO)
        .with_window(3, 1)
        .with_lock_policy(LockPolicy::Skip);

    let mut service = DataService::new(config).unwrap();
    let analysis = service.run_pipeline().await.unwrap();

    assert_eq!(analysis.series.get("Energy").unwrap(), &[0.0, 50.0, 50.0]);
    assert_eq!(
        analysis.describe_best(3).unwrap(),
        "The best performing sector was Energy, improving by 50.00 percent over the past 3 days."
    );

    let symbols = std::fs::read_to_string(dir.path().join("symbols.csv")).unwrap();
    assert!(symbols.contains("AAA,Aaa Corp,10.0,2.1,1500000,,,,,Energy,Oil & Gas,2300,"));
    assert!(dir.path().join("sector_performances.svg").exists());
}
