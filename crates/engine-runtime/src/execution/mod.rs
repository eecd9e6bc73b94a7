pub mod dispatcher;
pub mod executor;
pub mod pool;
pub mod report;
