mod utils;
#[allow(unused)]
use utils::*;

#[cfg(feature = "integration")]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use volley::rpc::RpcError;
    use volley::{Benchmark, CancellationToken, Engine, Registry, SetupStage, VolleyError};
    use volley_cli::benchmarks::basic::{EthBlockNumber, NetVersion};

    fn bundled(name: &str) -> Arc<dyn Benchmark> {
        Registry::global().get(name).expect("bundled benchmark")
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[ntest::timeout(10_000)]
    async fn block_number_saturates_mock() {
        let metrics = init();
        let endpoint = mock_target("/").await;
        let engine = Engine::new(config(&endpoint, 4, Duration::from_secs(1), 0));

        let result = engine
            .run(Arc::new(EthBlockNumber), &CancellationToken::new())
            .await
            .unwrap();

        assert!(result.measurement.count > 0);
        assert!(result.throughput() > 0.0);
        assert!(result.completed >= result.total.count);

        let rendered = metrics.render();
        for gauge in ["mid_count", "mid_dur_ms", "throughput_inv", "throughput"] {
            assert!(
                rendered.contains(&format!("volley_eth_blockNumber_{gauge}")),
                "missing {gauge} in\n{rendered}"
            );
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    #[ntest::timeout(10_000)]
    async fn sequence_runs_in_order_at_rate() {
        init();
        let endpoint = mock_target("/").await;
        let engine = Engine::new(config(&endpoint, 2, Duration::from_secs(2), 20));

        let benchmarks = Registry::global()
            .select(&["net_version", "eth_getBlockByNumber", "net_version"])
            .unwrap();
        let results = engine
            .run_all(&benchmarks, &CancellationToken::new())
            .await
            .unwrap();

        let names: Vec<_> = results.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, ["net_version", "eth_getBlockByNumber"]);
        for (_, result) in &results {
            // 2 workers at 20/s for the 1.6s window.
            assert!(result.measurement.count <= 70, "{result}");
            assert!(result.measurement.count >= 50, "{result}");
        }
    }

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn remote_error_aborts_run() {
        init();
        let endpoint = mock_target("/fail").await;
        let engine = Engine::new(config(&endpoint, 2, Duration::from_secs(30), 0));

        let err = engine
            .run(Arc::new(NetVersion), &CancellationToken::new())
            .await
            .unwrap_err();

        let VolleyError::Operation(source) = err else {
            panic!("expected an operation error, got {err}");
        };
        assert!(matches!(
            source.downcast_ref::<RpcError>(),
            Some(RpcError::Remote { code: -32000, .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[ntest::timeout(10_000)]
    async fn limited_target_caps_throughput() {
        init();
        let endpoint = mock_target("/limited/50").await;
        let engine = Engine::new(config(&endpoint, 4, Duration::from_secs(2), 0));

        let result = engine
            .run(bundled("eth_blockNumber"), &CancellationToken::new())
            .await
            .unwrap();

        assert!(result.throughput() <= 60.0, "{result}");
    }

    #[tokio::test]
    async fn unsupported_scheme_is_a_setup_error() {
        init();
        let engine = Engine::new(config("ws://127.0.0.1:8546", 1, Duration::from_secs(1), 1));

        let err = engine
            .run(bundled("eth_blockNumber"), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            VolleyError::Setup {
                stage: SetupStage::Connect,
                ..
            }
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    #[ntest::timeout(10_000)]
    async fn interrupt_cancels_sequence() {
        init();
        let endpoint = mock_target("/").await;
        let engine = Engine::new(config(&endpoint, 2, Duration::from_secs(60), 0));
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            trigger.cancel();
        });

        let benchmarks = Registry::global()
            .select(&["eth_blockNumber", "net_version"])
            .unwrap();
        let results = engine.run_all(&benchmarks, &cancel).await.unwrap();

        assert!(results.is_empty());
    }
}
