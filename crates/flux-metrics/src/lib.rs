pub mod backend;
pub mod collector;
pub mod error;
pub mod model;
pub mod telemetry;

pub use backend::{InMemoryMetricsBackend, MetricsBackend};
pub use collector::{CollectorConfig, MetricCollector};
pub use error::MetricsError;
pub use model::{
    aggregation_key, dimension_key, Dimensions, Metric, MetricAggregation, MetricBatch,
    MetricDataQuery, MetricDatum, MetricUnit, Statistic,
};
pub use telemetry::PipelineMetrics;
