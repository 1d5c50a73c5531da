//! Full refresh cycles against a mock World Bank endpoint: ZIP payloads in,
//! published snapshot out.

use std::io::{Cursor, Write};
use std::sync::Arc;

use co2watch::config::Config;
use co2watch::fetch::http_client;
use co2watch::refresh::Refresher;
use co2watch::store::SnapshotStore;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zip::write::{ExtendedFileOptions, FileOptions};
use zip::CompressionMethod;

/// Three countries, five years. The most recent year (2020) is entirely
/// missing from the population table, so a refresh must fall back to 2019.
const POPULATION_CSV: &str = "\
\"Data Source\",\"World Development Indicators\"
\"Last Updated Date\",\"2024-03-28\"


\"Country Name\",\"Country Code\",\"Indicator Name\",\"Indicator Code\",\"2016\",\"2017\",\"2018\",\"2019\",\"2020\",
\"Atlantis\",\"ATL\",\"Population, total\",\"SP.POP.TOTL\",\"900\",\"950\",\"980\",\"1000\",\"\",
\"Borduria\",\"BOR\",\"Population, total\",\"SP.POP.TOTL\",\"48\",\"49\",\"50\",\"50\",\"\",
\"Cagliostro\",\"CAG\",\"Population, total\",\"SP.POP.TOTL\",\"180\",\"190\",\"195\",\"200\",\"\",
";

const EMISSIONS_CSV: &str = "\
\"Data Source\",\"World Development Indicators\"
\"Last Updated Date\",\"2024-03-28\"


\"Country Name\",\"Country Code\",\"Indicator Name\",\"Indicator Code\",\"2016\",\"2017\",\"2018\",\"2019\",\"2020\",
\"Atlantis\",\"ATL\",\"CO2 emissions (kt)\",\"EN.ATM.CO2E.KT\",\"90\",\"95\",\"98\",\"100\",\"105\",
\"Borduria\",\"BOR\",\"CO2 emissions (kt)\",\"EN.ATM.CO2E.KT\",\"350\",\"\",\"380\",\"400\",\"410\",
\"Cagliostro\",\"CAG\",\"CO2 emissions (kt)\",\"EN.ATM.CO2E.KT\",\"25\",\"28\",\"29\",\"30\",\"31\",
";

fn zip_payload(entry_name: &str, csv: &str) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
        let options = FileOptions::<ExtendedFileOptions>::default()
            .compression_method(CompressionMethod::Stored);
        // Metadata entry first, as in the real bundles; the decoder must skip it.
        zip.start_file("Metadata_Country.csv", options.clone())
            .unwrap();
        zip.write_all(b"Country Code,Region\n").unwrap();
        zip.start_file(entry_name, options).unwrap();
        zip.write_all(csv.as_bytes()).unwrap();
        zip.finish().unwrap();
    }
    buf
}

async fn mock_world_bank() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/population"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(zip_payload(
            "API_SP.POP.TOTL_DS2_en_csv_v2_1234.csv",
            POPULATION_CSV,
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/emissions"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(zip_payload(
            "API_EN.ATM.CO2E.KT_DS2_en_csv_v2_5678.csv",
            EMISSIONS_CSV,
        )))
        .mount(&server)
        .await;
    server
}

fn config_for(server: &MockServer) -> Config {
    Config {
        population_url: format!("{}/population", server.uri()),
        emissions_url: format!("{}/emissions", server.uri()),
        missing_value_threshold: 2,
        ..Config::default()
    }
}

fn refresher(config: Config, store: Arc<SnapshotStore>) -> Refresher {
    let client = http_client(config.request_timeout()).unwrap();
    Refresher::new(client, config, store)
}

#[tokio::test]
async fn end_to_end_refresh_publishes_expected_snapshot() {
    let server = mock_world_bank().await;
    let store = Arc::new(SnapshotStore::new());
    refresher(config_for(&server), store.clone()).run_once().await;

    let snapshot = store.get();
    assert!(snapshot.is_initialized());
    // 2020 has three missing population values against a threshold of two.
    assert_eq!(snapshot.reference_year, "2019");

    let year = snapshot.absolute.year_index("2019").unwrap();
    let order: Vec<&str> = snapshot
        .absolute
        .rows
        .iter()
        .map(|r| r.country.as_str())
        .collect();
    assert_eq!(order, vec!["Borduria", "Atlantis", "Cagliostro"]);
    assert_eq!(snapshot.absolute.rows[0].values[year], Some(400.0));

    // Per-capita is sorted by its own reference-year column.
    let per_capita_order: Vec<&str> = snapshot
        .per_capita
        .rows
        .iter()
        .map(|r| r.country.as_str())
        .collect();
    assert_eq!(per_capita_order, vec!["Borduria", "Cagliostro", "Atlantis"]);
    assert_eq!(snapshot.per_capita.rows[0].values[year], Some(8.0));
    let atlantis = snapshot.per_capita.rows[2].values[year].unwrap();
    assert!((atlantis - 0.1).abs() < 1e-12);

    // A reader arriving after publish sees exactly the published snapshot.
    assert!(Arc::ptr_eq(&snapshot, &store.get()));
}

#[tokio::test]
async fn failed_fetch_keeps_the_previous_snapshot() {
    let good = mock_world_bank().await;
    let store = Arc::new(SnapshotStore::new());
    refresher(config_for(&good), store.clone()).run_once().await;
    let before = store.get();
    assert!(before.is_initialized());

    // Same emissions endpoint, but population now answers 500.
    let broken = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/population"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&broken)
        .await;
    let config = Config {
        population_url: format!("{}/population", broken.uri()),
        ..config_for(&good)
    };
    refresher(config, store.clone()).run_once().await;

    // Reference equality: the cycle must not have republished anything.
    assert!(Arc::ptr_eq(&before, &store.get()));
}

#[tokio::test]
async fn failure_before_first_success_leaves_the_sentinel() {
    let broken = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&broken)
        .await;

    let store = Arc::new(SnapshotStore::new());
    let config = Config {
        population_url: format!("{}/population", broken.uri()),
        emissions_url: format!("{}/emissions", broken.uri()),
        ..Config::default()
    };
    refresher(config, store.clone()).run_once().await;

    assert!(!store.get().is_initialized());
}
