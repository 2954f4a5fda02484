mod utils;
#[allow(unused)]
use utils::*;

#[cfg(feature = "integration")]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::time::Duration;
    use volley::{CancellationToken, Engine, RunConfig, SetupStage, VolleyError};
    use volley_cli::benchmarks::playback::{Playback, DATASET_PARAM, TRANSACTIONS_PARAM};

    fn dataset(name: &str, txns: usize) -> PathBuf {
        let contents: String = (0..txns).map(|n| format!("0x{n:08x}\n")).collect();
        let path = std::env::temp_dir().join(format!(
            "volley-it-{}-{name}.hex",
            std::process::id()
        ));
        std::fs::write(&path, format!("# generated\n{contents}")).unwrap();
        path
    }

    fn playback_config(endpoint: &str, dataset: &Path, limit: usize, rate: u32) -> RunConfig {
        RunConfig::builder(endpoint)
            .concurrency(2)
            .duration(Duration::from_secs(1))
            .rate(rate)
            .param(DATASET_PARAM, dataset.to_string_lossy())
            .param(TRANSACTIONS_PARAM, limit.to_string())
            .build()
            .unwrap()
    }

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn replays_dataset() {
        init();
        let endpoint = mock_target("/").await;
        let path = dataset("replay", 200);
        let engine = Engine::new(playback_config(&endpoint, &path, 0, 20));

        let result = engine
            .run(Arc::new(Playback), &CancellationToken::new())
            .await
            .unwrap();

        assert!(result.measurement.count > 0);
        assert!(result.completed <= 200);
    }

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn running_dry_is_an_error() {
        init();
        let endpoint = mock_target("/").await;
        let path = dataset("dry", 200);
        let engine = Engine::new(playback_config(&endpoint, &path, 6, 0));

        let err = engine
            .run(Arc::new(Playback), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(&err, VolleyError::Operation(e) if e.to_string().starts_with("Exhausted")));
    }

    #[tokio::test]
    async fn missing_dataset_is_a_setup_error() {
        init();
        let endpoint = mock_target("/").await;
        let config = RunConfig::builder(&endpoint).build().unwrap();

        let err = Engine::new(config)
            .run(Arc::new(Playback), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            VolleyError::Setup {
                stage: SetupStage::BulkPrepare,
                ..
            }
        ));
    }
}
