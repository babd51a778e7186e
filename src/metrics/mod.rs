mod matrix;
mod poller;
mod source;

pub use matrix::{MetricsMatrix, MetricsSeries};
pub use poller::{PollEvent, ThroughputPoller, ThroughputTable};
pub use source::{HttpMetricsSource, MetricsSource};
