// Library exports for the binary and integration tests
pub mod aggregator;
pub mod error;
pub mod event;
pub mod insights;
pub mod loader;
pub mod logging;
pub mod renderer;
pub mod stats;
pub mod timefmt;
pub mod window;

pub use aggregator::{aggregate, aggregate_export, aggregate_value};
pub use error::InputShapeError;
pub use event::ListeningEvent;
pub use stats::StatsSummary;
