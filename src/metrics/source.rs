use std::time::Duration;

use anyhow::{Context, Result};

use super::matrix::{MetricsMatrix, parse_throughput_matrix};

pub trait MetricsSource: Send + Sync {
    fn fetch_throughput(&self, cluster_id: &str) -> Result<MetricsMatrix>;
}

pub struct HttpMetricsSource {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpMetricsSource {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(4))
            .build()
            .context("failed to build metrics HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

impl MetricsSource for HttpMetricsSource {
    fn fetch_throughput(&self, cluster_id: &str) -> Result<MetricsMatrix> {
        let url = format!("{}/api/v1/throughput", self.base_url);
        let raw = self
            .client
            .get(&url)
            .query(&[("cluster", cluster_id)])
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.text())
            .with_context(|| format!("throughput fetch from {url} failed"))?;

        parse_throughput_matrix(&raw)
    }
}
