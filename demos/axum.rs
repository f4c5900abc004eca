/* demos/axum.rs */

use axum::{Json, Router, routing::get};
use geoguard::{ClientGeo, Config, GeoGuard, GeoGuardLayer};
use serde_json::json;
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .init();

    // GEOGUARD_CONFIG may hold a JSON document in the `Config` shape.
    let config = match std::env::var("GEOGUARD_CONFIG") {
        Ok(raw) => serde_json::from_str::<Config>(&raw).expect("invalid GEOGUARD_CONFIG"),
        Err(_) => Config::default().with_ip_from_header("X-Forwarded-For"),
    };

    match serde_json::to_string_pretty(&config) {
        Ok(effective) => tracing::info!("effective config:\n{effective}"),
        Err(err) => tracing::warn!(%err, "could not render config"),
    }

    let guard = match GeoGuard::new(config) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("failed to start: {err}");
            std::process::exit(1);
        }
    };

    let app = Router::new()
        .route("/", get(geo_handler))
        .layer(GeoGuardLayer::new(guard));
    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();

    println!("Server starting on http://localhost:3000");
    println!("Test with:");
    println!("  curl -H 'X-Forwarded-For: 1.1.1.1' http://localhost:3000/");
    println!();

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}

/// Echo what the middleware resolved.
async fn geo_handler(geo: ClientGeo) -> Json<serde_json::Value> {
    Json(json!({
        "ip": geo.ip,
        "found": !geo.record.is_empty(),
        "record": geo.record,
    }))
}
