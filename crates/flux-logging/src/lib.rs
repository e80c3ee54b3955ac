pub mod aggregator;
pub mod sink;
pub mod structured;
pub mod subscriber;

pub use aggregator::{ArchiveStats, EventAggregator};
pub use sink::{BufferedEventLog, EventLog, TracingEventLog};
pub use structured::{EventEntry, EventLevel};
pub use subscriber::{init_logging, LoggingConfig, LoggingError};
