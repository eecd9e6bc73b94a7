pub mod connectors;
pub mod context;
pub mod error;
pub mod progress;
pub mod worker;
