pub mod api;
pub mod app;

pub use app::{build_event_log, AppState, PipelineEvents};
