pub mod cache;
pub mod driver;
pub mod error;
pub mod team;
