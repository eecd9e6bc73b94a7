pub mod job;
pub mod mapping;
pub mod page;
