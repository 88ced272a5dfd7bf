pub mod analyze;
pub mod extract;
