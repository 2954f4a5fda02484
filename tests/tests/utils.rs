use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::error;
use tracing_subscriber::FmtSubscriber;
use volley::RunConfig;

/// Installs the panic hook, the subscriber and the metrics recorder once per test binary.
#[allow(unused)]
pub fn init() -> &'static PrometheusHandle {
    static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

    HANDLE.get_or_init(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            default_panic(info);
            error!("Panic occurred: {info:?}");
        }));

        FmtSubscriber::builder()
            .with_env_filter("volley=debug,volley_cli=debug,mock_rpc=info")
            .init();

        PrometheusBuilder::new()
            .install_recorder()
            .expect("metrics recorder")
    })
}

/// Starts a mock JSON-RPC target owned by the calling test's runtime and returns its URL.
#[allow(unused)]
pub async fn mock_target(path: &str) -> String {
    let addr = mock_rpc::spawn().await.expect("mock service");
    format!("http://{addr}{path}")
}

#[allow(unused)]
pub fn config(endpoint: &str, concurrency: usize, duration: Duration, rate: u32) -> RunConfig {
    RunConfig::builder(endpoint)
        .concurrency(concurrency)
        .duration(duration)
        .rate(rate)
        .build()
        .expect("valid config")
}
