use base64::engine::general_purpose::STANDARD as BASE64_STD;
use base64::Engine;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tokio::runtime::Builder;

/// Spawn the Prometheus exposition endpoint on its own thread.
///
/// Bind address comes from `METRICS_BIND` (default `127.0.0.1:9484`). When
/// `METRICS_BASIC_AUTH` is set to `USER:PASS`, requests must carry the
/// matching `Authorization: Basic` header.
pub fn serve_prometheus() {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("metrics recorder");

    let expected_auth = std::env::var("METRICS_BASIC_AUTH")
        .ok()
        .map(|raw| format!("Basic {}", BASE64_STD.encode(raw)));

    std::thread::spawn(move || {
        let addr: SocketAddr = std::env::var("METRICS_BIND")
            .unwrap_or_else(|_| "127.0.0.1:9484".into())
            .parse()
            .expect("invalid METRICS_BIND address");

        let service = hyper::service::make_service_fn(move |_| {
            let handle = handle.clone();
            let expected_auth = expected_auth.clone();
            async move {
                Ok::<_, hyper::Error>(hyper::service::service_fn(move |req| {
                    let handle = handle.clone();
                    let expected_auth = expected_auth.clone();
                    async move {
                        if !authorized(&req, expected_auth.as_deref()) {
                            return Ok::<_, hyper::Error>(
                                hyper::Response::builder()
                                    .status(hyper::StatusCode::UNAUTHORIZED)
                                    .body(hyper::Body::from("unauthorized"))
                                    .unwrap(),
                            );
                        }
                        Ok::<_, hyper::Error>(hyper::Response::new(handle.render().into()))
                    }
                }))
            }
        });

        let server = hyper::Server::bind(&addr).serve(service);
        Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("metrics runtime")
            .block_on(server)
            .expect("metrics server");
    });
}

fn authorized(req: &hyper::Request<hyper::Body>, expected: Option<&str>) -> bool {
    match expected {
        None => true,
        Some(expected) => req
            .headers()
            .get(hyper::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .map(|h| h == expected)
            .unwrap_or(false),
    }
}

// ---------------------------------------------------------------------------
// Explorer instruments
// ---------------------------------------------------------------------------

/// Count process (re)starts; call once from the entry point.
pub fn inc_restart() {
    metrics::increment_counter!("restarts_total");
}

/// A debounced search value was accepted into query state.
pub fn inc_search_commit() {
    metrics::increment_counter!("search_commits_total");
}

/// A sanctions-page request was dispatched.
pub fn inc_fetch_dispatched() {
    metrics::increment_counter!("fetch_dispatched_total");
}

/// A response arrived carrying an epoch older than the current one and was
/// dropped unapplied.
pub fn inc_fetch_stale_dropped() {
    metrics::increment_counter!("fetch_stale_dropped_total");
}

/// A dispatched request failed. `kind` is one of the `FetchError` labels.
///
/// The label is leaked once so it can live for the process lifetime; only
/// three distinct kinds exist.
pub fn inc_fetch_failed(kind: &str) {
    let k: &'static str = Box::leak(kind.to_owned().into_boxed_str());
    metrics::increment_counter!("fetch_failed_total", "kind" => k);
}

/// Authoritative result count from the most recently accepted page.
pub fn set_results_total(v: f64) {
    metrics::gauge!("results_total", v);
}

/// Number of authorities in the loaded filter catalog.
pub fn set_catalog_size(v: f64) {
    metrics::gauge!("catalog_size", v);
}
