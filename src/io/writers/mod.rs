pub mod jpeg;
pub mod pdf;
pub mod report;
