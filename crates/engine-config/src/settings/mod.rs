pub mod connection;
pub mod log;
pub mod replication;

pub use connection::ConnectionSettings;
pub use log::LogSettings;
pub use replication::ReplicationSettings;
