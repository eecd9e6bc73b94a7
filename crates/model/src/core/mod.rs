pub mod identifiers;
pub mod naming;
pub mod value;
