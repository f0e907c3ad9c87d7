pub mod error;
pub mod features;
