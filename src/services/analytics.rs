//! Analytics sink for flow events.

use serde_json::{Map, Value};

pub mod events {
    pub const LOGIN: &str = "login";
    pub const SIGN_UP: &str = "sign_up";
    pub const PERMISSION_LOCATION: &str = "permission_location";
    pub const REQUEST_PERMISSION_LOCATION: &str = "request_permission_location";
    pub const LOCATION: &str = "location";
}

/// Receives named analytics events with a flat JSON parameter map.
pub trait AnalyticsSink: Send + Sync {
    fn log_event(&self, name: &str, params: Map<String, Value>);
}

/// Default sink: emits each event as a structured tracing record.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAnalytics;

impl AnalyticsSink for TracingAnalytics {
    fn log_event(&self, name: &str, params: Map<String, Value>) {
        let params = Value::Object(params);
        tracing::info!(
            target: "location_sync::analytics",
            event = name,
            params = %params,
            "analytics event"
        );
    }
}

/// Build a parameter map from `(key, value)` pairs.
pub fn params<const N: usize>(pairs: [(&str, Value); N]) -> Map<String, Value> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_builds_flat_map() {
        let map = params([
            ("success", Value::Bool(false)),
            ("error", Value::String("Email invalid".to_string())),
        ]);
        assert_eq!(map.len(), 2);
        assert_eq!(map["success"], Value::Bool(false));
        assert!(params([]).is_empty());
    }

    #[test]
    fn test_tracing_sink_accepts_events() {
        let sink: &dyn AnalyticsSink = &TracingAnalytics;
        sink.log_event(events::LOCATION, params([("latitude", Value::from(-22.9))]));
        sink.log_event(events::REQUEST_PERMISSION_LOCATION, params([]));
    }
}
