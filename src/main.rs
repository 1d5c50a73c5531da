use anyhow::Result;
use chrono::{DateTime, Utc};
use co2watch::{config::Config, fetch, refresh::Refresher, store::SnapshotStore};
use serde::Serialize;
use std::{collections::HashMap, env, sync::Arc};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use warp::Filter;

#[derive(Serialize)]
struct CountryValue {
    country: String,
    value: Option<f64>,
}

#[derive(Serialize)]
struct CountriesResponse {
    initialized: bool,
    reference_year: String,
    last_update: Option<DateTime<Utc>>,
    countries: Vec<CountryValue>,
}

/// Top-N countries from the current snapshot, absolute by default.
/// Query parameters: `num` (row cap, default 15) and `per_capita=on`.
fn countries_reply(store: &SnapshotStore, params: &HashMap<String, String>) -> CountriesResponse {
    let snapshot = store.get();
    let num = params.get("num").and_then(|n| n.parse().ok()).unwrap_or(15);
    let per_capita = params.get("per_capita").map(|v| v == "on").unwrap_or(false);

    let dataset = if per_capita {
        &snapshot.per_capita
    } else {
        &snapshot.absolute
    };
    let year_index = dataset.year_index(&snapshot.reference_year);

    let countries = dataset
        .rows
        .iter()
        .take(num)
        .map(|row| CountryValue {
            country: row.country.clone(),
            value: year_index.and_then(|i| row.values[i]),
        })
        .collect();

    CountriesResponse {
        initialized: snapshot.is_initialized(),
        reference_year: snapshot.reference_year.clone(),
        last_update: snapshot.last_update,
        countries,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) configuration ────────────────────────────────────────────
    let mut config = match env::var("CO2WATCH_CONFIG") {
        Ok(path) => Config::load(&path)?,
        Err(_) => Config::default(),
    };
    if let Ok(port) = env::var("PORT") {
        if let Ok(port) = port.parse() {
            config.port = port;
        }
    }

    // ─── 3) first refresh before serving ─────────────────────────────
    let store = Arc::new(SnapshotStore::new());
    let client = fetch::http_client(config.request_timeout())?;
    let refresher = Arc::new(Refresher::new(client, config.clone(), store.clone()));
    refresher.run_once().await;

    // ─── 4) background refresh loop ──────────────────────────────────
    let background = Arc::clone(&refresher);
    tokio::spawn(async move {
        background.run_forever().await;
    });

    // ─── 5) HTTP API ─────────────────────────────────────────────────
    let health = warp::path("health").and(warp::get()).map(|| {
        warp::reply::json(&serde_json::json!({
            "status": "healthy",
            "service": "co2watch"
        }))
    });

    let countries_store = Arc::clone(&store);
    let countries = warp::path!("api" / "countries")
        .and(warp::get())
        .and(warp::query::<HashMap<String, String>>())
        .map(move |params: HashMap<String, String>| {
            warp::reply::json(&countries_reply(&countries_store, &params))
        });

    let snapshot_store = Arc::clone(&store);
    let snapshot = warp::path!("api" / "snapshot")
        .and(warp::get())
        .map(move || warp::reply::json(&*snapshot_store.get()));

    let routes = health.or(countries).or(snapshot);

    info!(port = config.port, "server starting");
    warp::serve(routes).run(([0, 0, 0, 0], config.port)).await;

    Ok(())
}
