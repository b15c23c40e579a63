use axum::http::StatusCode;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Default)]
pub(crate) struct RequestMetrics {
    counts: Mutex<HashMap<(String, u16), u64>>,
    latency_ns: Mutex<HashMap<String, Vec<u64>>>,
}

impl RequestMetrics {
    pub(crate) async fn observe_request(&self, route: &str, status: StatusCode, latency: Duration) {
        let mut counts = self.counts.lock().await;
        *counts
            .entry((route.to_string(), status.as_u16()))
            .or_insert(0) += 1;
        drop(counts);
        let mut latency_map = self.latency_ns.lock().await;
        latency_map
            .entry(route.to_string())
            .or_insert_with(Vec::new)
            .push(latency.as_nanos() as u64);
    }

    pub(crate) async fn render_prometheus(&self) -> String {
        let mut out = String::new();
        out.push_str("# TYPE billkhata_http_requests_total counter\n");
        let counts = self.counts.lock().await;
        let mut rows: Vec<(&(String, u16), &u64)> = counts.iter().collect();
        rows.sort_by(|a, b| a.0.cmp(b.0));
        for ((route, status), count) in rows {
            out.push_str(&format!(
                "billkhata_http_requests_total{{route=\"{route}\",status=\"{status}\"}} {count}\n"
            ));
        }
        drop(counts);

        out.push_str("# TYPE billkhata_http_request_latency_seconds summary\n");
        let latency = self.latency_ns.lock().await;
        let mut routes: Vec<&String> = latency.keys().collect();
        routes.sort();
        for route in routes {
            let samples = &latency[route];
            let sum_ns: u64 = samples.iter().sum();
            out.push_str(&format!(
                "billkhata_http_request_latency_seconds_sum{{route=\"{route}\"}} {}\n",
                sum_ns as f64 / 1e9
            ));
            out.push_str(&format!(
                "billkhata_http_request_latency_seconds_count{{route=\"{route}\"}} {}\n",
                samples.len()
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rendered_metrics_carry_route_and_status_labels() {
        let metrics = RequestMetrics::default();
        metrics
            .observe_request("/v1/me", StatusCode::OK, Duration::from_millis(2))
            .await;
        metrics
            .observe_request("/v1/me", StatusCode::OK, Duration::from_millis(3))
            .await;
        metrics
            .observe_request("/v1/me", StatusCode::UNAUTHORIZED, Duration::from_millis(1))
            .await;
        let text = metrics.render_prometheus().await;
        assert!(text.contains("billkhata_http_requests_total{route=\"/v1/me\",status=\"200\"} 2"));
        assert!(text.contains("billkhata_http_requests_total{route=\"/v1/me\",status=\"401\"} 1"));
        assert!(text.contains("billkhata_http_request_latency_seconds_count{route=\"/v1/me\"} 3"));
    }
}
