//! Pushing the run's gauges to a Prometheus push gateway.
use reqwest::header::CONTENT_TYPE;
use thiserror::Error;
use tracing::info;
use url::Url;

const TEXT_FORMAT: &str = "text/plain; version=0.0.4";

#[derive(Debug, Error)]
pub enum PushError {
    #[error("metrics: --prometheus-push-job-name required for metrics push mode")]
    MissingJobName,

    #[error("metrics: --prometheus-push-instance-label required for metrics push mode")]
    MissingInstanceLabel,

    #[error("Invalid push gateway address: {0}")]
    InvalidAddr(String),

    #[error("Push to gateway failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Where to push: `<addr>/metrics/job/<job>/instance/<instance>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushTarget {
    url: Url,
}

impl PushTarget {
    /// `None` when no address is given. Job name and instance label are required otherwise.
    pub fn from_flags(
        addr: Option<&str>,
        job: Option<&str>,
        instance: Option<&str>,
    ) -> Result<Option<Self>, PushError> {
        let Some(addr) = addr.filter(|addr| !addr.is_empty()) else {
            return Ok(None);
        };
        let job = job.filter(|s| !s.is_empty()).ok_or(PushError::MissingJobName)?;
        let instance = instance
            .filter(|s| !s.is_empty())
            .ok_or(PushError::MissingInstanceLabel)?;

        let base = if addr.contains("://") {
            addr.to_string()
        } else {
            format!("http://{addr}")
        };
        let mut url = Url::parse(&base).map_err(|err| PushError::InvalidAddr(err.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| PushError::InvalidAddr(addr.to_string()))?
            .pop_if_empty()
            .extend(["metrics", "job", job, "instance", instance]);

        Ok(Some(Self { url }))
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Replaces the group's metrics with `body`, in Prometheus text format.
    pub async fn push(&self, body: String) -> Result<(), PushError> {
        reqwest::Client::new()
            .put(self.url.clone())
            .header(CONTENT_TYPE, TEXT_FORMAT)
            .body(body)
            .send()
            .await?
            .error_for_status()?;
        info!("Pushed metrics to {}", self.url);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_address_means_no_push() {
        assert_eq!(PushTarget::from_flags(None, Some("job"), None).unwrap(), None);
        assert_eq!(PushTarget::from_flags(Some(""), None, None).unwrap(), None);
    }

    #[test]
    fn job_and_instance_are_required() {
        assert!(matches!(
            PushTarget::from_flags(Some("localhost:9091"), None, Some("a")),
            Err(PushError::MissingJobName)
        ));
        assert!(matches!(
            PushTarget::from_flags(Some("localhost:9091"), Some("bench"), None),
            Err(PushError::MissingInstanceLabel)
        ));
    }

    #[test]
    fn grouping_path() {
        let target = PushTarget::from_flags(Some("localhost:9091"), Some("bench"), Some("node/1"))
            .unwrap()
            .unwrap();
        assert_eq!(
            target.url().as_str(),
            "http://localhost:9091/metrics/job/bench/instance/node%2F1"
        );

        let target =
            PushTarget::from_flags(Some("https://push.example.com/"), Some("bench"), Some("a"))
                .unwrap()
                .unwrap();
        assert_eq!(
            target.url().as_str(),
            "https://push.example.com/metrics/job/bench/instance/a"
        );
    }
}
