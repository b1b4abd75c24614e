// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Location-Sync headless driver.
//!
//! Signs in (or registers) with `SYNC_EMAIL` / `SYNC_PASSWORD`, reads back
//! the last stored location, then replays a GeoJSON track through the
//! tracking flow so every fix lands in both stores.

use location_sync::{
    config::Config,
    flows::{AuthEvent, LocationEvent},
    services::{FirebaseAuthProvider, IdentityProvider, ReplaySensor, TracingAnalytics},
    AppState,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging()?;

    let config = Config::from_env()?;
    tracing::info!(project = %config.gcp_project_id, "Starting Location-Sync");

    let provider: Arc<dyn IdentityProvider> = match &config.auth_emulator_host {
        Some(host) => Arc::new(FirebaseAuthProvider::for_emulator(
            config.firebase_api_key.clone(),
            host,
        )?),
        None => Arc::new(FirebaseAuthProvider::new(config.firebase_api_key.clone())?),
    };

    let state = AppState::connect(config.clone(), provider, Arc::new(TracingAnalytics)).await?;

    // Authenticate
    let email = std::env::var("SYNC_EMAIL").ok();
    let password = std::env::var("SYNC_PASSWORD").ok();
    let register = std::env::var("SYNC_REGISTER").is_ok_and(|v| v == "1");

    let (auth, mut auth_events) = state.auth_flow();
    let writes = if register {
        auth.register(email.as_deref(), password.as_deref()).await
    } else {
        auth.login(email.as_deref(), password.as_deref()).await
    };

    match auth_events.recv().await {
        Some(AuthEvent::Success(identity)) => {
            tracing::info!(uid = %identity.uid, "Signed in");
        }
        Some(AuthEvent::Failure(failure)) => {
            tracing::error!(error = %failure, "Sign-in failed");
            return Ok(());
        }
        None => return Ok(()),
    }
    writes.wait().await;

    // Track
    let Some(track_path) = &config.track_replay_path else {
        tracing::info!("TRACK_REPLAY_PATH not set, nothing to replay");
        return Ok(());
    };
    let sensor = ReplaySensor::load_from_file(track_path)?.with_interval(Duration::from_millis(200));
    let expected = sensor.filtered_track(config.distance_filter_meters).len();

    let (location, mut location_events) = state.location_flow(Arc::new(sensor));

    location.load_last_location().await;
    match location_events.try_recv() {
        Ok(LocationEvent::Update(fix)) => {
            tracing::info!(lat = fix.latitude, lon = fix.longitude, "Last known location")
        }
        Ok(LocationEvent::Failure(e)) => tracing::info!(error = %e, "No last known location"),
        Err(_) => {}
    }

    location.start_tracking();

    let mut seen = 0;
    while seen < expected {
        let Ok(Some(event)) =
            tokio::time::timeout(Duration::from_secs(5), location_events.recv()).await
        else {
            break;
        };

        match event {
            LocationEvent::Update(fix) => {
                seen += 1;
                tracing::info!(lat = fix.latitude, lon = fix.longitude, "Location update");
            }
            LocationEvent::Failure(e) => tracing::warn!(error = %e, "Location failure"),
        }
    }

    location.stop_tracking();
    // Let in-flight background writes settle.
    tokio::time::sleep(Duration::from_millis(500)).await;
    tracing::info!(seen, expected, "Replay finished");
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("location_sync=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
