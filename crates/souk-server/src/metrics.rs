// SPDX-License-Identifier: Apache-2.0

//! In-process request metrics behind `/metrics`. Counters only live as
//! long as the process; there is no export pipeline.

use axum::http::StatusCode;
use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

#[derive(Debug, Default, Clone, Copy)]
struct RouteStats {
    count: u64,
    total_ns: u64,
    max_ns: u64,
}

#[derive(Debug)]
pub struct ApiMetrics {
    started_at: Instant,
    requests: Mutex<HashMap<(String, u16), RouteStats>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMetric {
    pub route: String,
    pub status: u16,
    pub count: u64,
    pub total_ms: f64,
    pub max_ms: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub requests: Vec<RouteMetric>,
}

impl ApiMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            requests: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) async fn observe_request(&self, route: &str, status: StatusCode, latency: Duration) {
        let ns = u64::try_from(latency.as_nanos()).unwrap_or(u64::MAX);
        let mut requests = self.requests.lock().await;
        let stats = requests
            .entry((route.to_string(), status.as_u16()))
            .or_default();
        stats.count += 1;
        stats.total_ns = stats.total_ns.saturating_add(ns);
        stats.max_ns = stats.max_ns.max(ns);
    }

    /// Rows sorted by route then status so the endpoint output is stable.
    pub async fn snapshot(&self) -> MetricsSnapshot {
        let requests = self.requests.lock().await;
        let mut rows: Vec<RouteMetric> = requests
            .iter()
            .map(|((route, status), stats)| RouteMetric {
                route: route.clone(),
                status: *status,
                count: stats.count,
                total_ms: stats.total_ns as f64 / 1_000_000.0,
                max_ms: stats.max_ns as f64 / 1_000_000.0,
            })
            .collect();
        drop(requests);
        rows.sort_by(|a, b| a.route.cmp(&b.route).then(a.status.cmp(&b.status)));
        MetricsSnapshot {
            uptime_secs: self.started_at.elapsed().as_secs(),
            requests: rows,
        }
    }
}

impl Default for ApiMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn snapshot_aggregates_per_route_and_status() {
        let metrics = ApiMetrics::new();
        metrics
            .observe_request("/api/product", StatusCode::OK, Duration::from_millis(4))
            .await;
        metrics
            .observe_request("/api/product", StatusCode::OK, Duration::from_millis(10))
            .await;
        metrics
            .observe_request(
                "/api/product",
                StatusCode::BAD_REQUEST,
                Duration::from_millis(1),
            )
            .await;
        metrics
            .observe_request("/healthz", StatusCode::OK, Duration::from_millis(1))
            .await;

        let snapshot = metrics.snapshot().await;
        assert_eq!(snapshot.requests.len(), 3);
        // Sorted by route, then status.
        assert_eq!(snapshot.requests[0].route, "/api/product");
        assert_eq!(snapshot.requests[0].status, 200);
        assert_eq!(snapshot.requests[0].count, 2);
        assert!(snapshot.requests[0].max_ms >= 10.0);
        assert_eq!(snapshot.requests[1].status, 400);
        assert_eq!(snapshot.requests[2].route, "/healthz");
    }

    #[tokio::test]
    async fn snapshot_serializes_camel_case() {
        let metrics = ApiMetrics::new();
        metrics
            .observe_request("/readyz", StatusCode::OK, Duration::from_millis(2))
            .await;
        let json = serde_json::to_value(metrics.snapshot().await).expect("snapshot json");
        assert!(json.get("uptimeSecs").is_some());
        let row = &json["requests"][0];
        assert!(row.get("totalMs").is_some());
        assert!(row.get("maxMs").is_some());
    }
}
