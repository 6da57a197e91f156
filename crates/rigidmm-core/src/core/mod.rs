pub mod elements;
pub mod forcefield;
pub mod models;
pub mod units;
