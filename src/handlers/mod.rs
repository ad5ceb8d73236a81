pub mod driver;
pub mod middleware;
pub mod team;
