pub mod insert;
pub mod select;
