pub mod analysis;
pub mod risk;
