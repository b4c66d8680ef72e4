use std::fs;
use tracing::info;

mod test_utils {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Mock FX endpoint answering `/latest/KZT` with the given body.
    pub async fn create_fx_mock_server(
        mock_response: &str,
        expected_hits: impl Into<wiremock::Times>,
    ) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/latest/KZT"))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .expect(expected_hits)
            .mount(&mock_server)
            .await;

        mock_server
    }

    pub fn write_config(
        config_path: &std::path::Path,
        base_url: &str,
        data_path: &std::path::Path,
    ) {
        let config_content = format!(
            r#"
cake_price_kzt: 600000
base_currency: "KZT"
store: "disk"
providers:
  open_er:
    base_url: {}
data_path: "{}"
"#,
            base_url,
            data_path.display()
        );
        std::fs::write(config_path, &config_content).expect("Failed to write config file");
    }
}

#[test_log::test(tokio::test)]
async fn test_full_quote_flow_is_idempotent_within_ttl() {
    let mock_response = r#"{
        "result": "success",
        "rates": { "KZT": 1.0, "USD": 0.0022222222 }
    }"#;
    // The first answer runs the currency and salary segments
    // concurrently; both may miss on USD and race to the first fetch
    // (last write wins). The second answer must be a pure cache hit.
    let mock_server = test_utils::create_fx_mock_server(mock_response, 1..=2).await;

    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    let data_dir = tempfile::tempdir().expect("Failed to create temp dir");
    test_utils::write_config(config_file.path(), &mock_server.uri(), data_dir.path());

    let app = cakerate::build(config_file.path().to_str()).expect("Failed to build app");

    let first = cakerate::answer(&app, "доллар").await;
    info!(%first, "first answer");
    assert!(first.contains("Created •"), "{first}");
    assert!(first.contains("1,333.33 USD"), "{first}");
    // "доллар" also resolves the home country; there is no wage doc yet,
    // so that segment fails in isolation.
    assert!(first.contains("No wage data for USA"), "{first}");

    let second = cakerate::answer(&app, "USD").await;
    assert!(second.contains("Cache •"), "{second}");
    assert!(second.contains("1,333.33 USD"), "{second}");
}

#[test_log::test(tokio::test)]
async fn test_wage_card_flow_with_seeded_doc() {
    let mock_response = r#"{
        "result": "success",
        "rates": { "KZT": 1.0, "USD": 0.00222222222 }
    }"#;
    let mock_server = test_utils::create_fx_mock_server(mock_response, 1).await;

    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    let data_dir = tempfile::tempdir().expect("Failed to create temp dir");
    test_utils::write_config(config_file.path(), &mock_server.uri(), data_dir.path());

    // Seed the wage doc the way the ingestion job would, then release the
    // keyspace before the app opens it.
    {
        let keyspace = fjall::Config::new(data_dir.path().join("cache"))
            .open()
            .expect("Failed to open keyspace");
        let wages =
            cakerate::store::disk::DiskWageStore::new(&keyspace).expect("Failed to open wages");
        wages
            .insert(&cakerate::store::WageRecord {
                iso3: "KAZ".to_string(),
                year: 2024,
                unit: "USD".to_string(),
                country: Some("Kazakhstan".to_string()),
                value: 1000.0,
                cake_salary: None,
                salary_kzt: None,
                source: Some(cakerate::store::WageSource {
                    name: Some("UNECE".to_string()),
                    year: Some(2024),
                    url: None,
                }),
                ingested_at: None,
                updated_at: None,
            })
            .expect("Failed to seed wage doc");
    }

    let app = cakerate::build(config_file.path().to_str()).expect("Failed to build app");

    let reply = cakerate::answer(&app, "Казахстан").await;
    info!(%reply, "wage card reply");

    let parts: Vec<&str> = reply.split("\n\n").collect();
    assert_eq!(parts.len(), 2, "{reply}");
    // KZT is the base currency: answered from the constant, no cache.
    assert!(parts[0].contains("1 cake = 600,000.00 KZT (constant)"));
    assert!(parts[1].contains("Residents of Kazakhstan earn 0.75 cakes a month"));
    assert!(parts[1].contains("450,000 KZT"));
    assert!(parts[1].contains("UNECE, 2024"));
}

#[test_log::test(tokio::test)]
async fn test_unrecognized_input_reprompts_without_io() {
    // Zero expected hits: unrecognized input never reaches the provider.
    let mock_server = test_utils::create_fx_mock_server(r#"{"rates": {}}"#, 0).await;

    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    let data_dir = tempfile::tempdir().expect("Failed to create temp dir");
    test_utils::write_config(config_file.path(), &mock_server.uri(), data_dir.path());

    let app = cakerate::build(config_file.path().to_str()).expect("Failed to build app");

    let reply = cakerate::answer(&app, "абракадабра").await;
    assert!(reply.contains("Could not recognize"), "{reply}");
}

#[test_log::test(tokio::test)]
async fn test_cache_persists_across_restarts() {
    let mock_response = r#"{
        "result": "success",
        "rates": { "KZT": 1.0, "EUR": 0.002 }
    }"#;
    let mock_server = test_utils::create_fx_mock_server(mock_response, 1).await;

    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    let data_dir = tempfile::tempdir().expect("Failed to create temp dir");

    // First run populates the cache, then the provider disappears.
    test_utils::write_config(config_file.path(), &mock_server.uri(), data_dir.path());
    {
        let app = cakerate::build(config_file.path().to_str()).expect("Failed to build app");
        let reply = cakerate::answer(&app, "евро").await;
        assert!(reply.contains("Created •"), "{reply}");
    }
    drop(mock_server);

    // The record is still fresh, so the dead provider is never consulted.
    test_utils::write_config(
        config_file.path(),
        "http://127.0.0.1:9", // nothing listens here
        data_dir.path(),
    );
    let app = cakerate::build(config_file.path().to_str()).expect("Failed to build app");
    let reply = cakerate::answer(&app, "EUR").await;
    assert!(reply.contains("Cache •"), "{reply}");
    assert!(reply.contains("1,200.00 EUR"), "{reply}");
}

/// Hits the real provider; run with `cargo test -- --ignored` when online.
#[test_log::test(tokio::test)]
#[ignore]
async fn test_real_open_er_api() {
    use cakerate::providers::RateProvider;
    use cakerate::providers::open_er::OpenErApiClient;

    let client = OpenErApiClient::new("https://open.er-api.com/v6", "KZT", 600_000.0);
    let amount = client.fetch_rate("USD").await;

    info!(?amount, "real API cake price in USD");
    assert!(amount.is_some_and(|a| a > 0.0));
}

#[test_log::test(tokio::test)]
async fn test_setup_style_default_config_parses() {
    // The default config written by `cakerate setup` must stay loadable.
    let default_config = r#"---
cake_price_kzt: 600000
base_currency: "KZT"
ttl_hours: 24
reference_currency: "USD"
wage_year: 2024
wage_unit: "USD"
store: "disk"

providers:
  open_er:
    base_url: "https://open.er-api.com/v6"
"#;
    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    fs::write(config_file.path(), default_config).expect("Failed to write config");

    let config = cakerate::config::AppConfig::load_from_path(config_file.path())
        .expect("Default config must parse");
    assert_eq!(config.cake_price_kzt, 600_000.0);
    assert_eq!(config.ttl_hours, 24);
}
