pub mod features;
pub mod status;
