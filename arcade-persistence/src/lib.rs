pub mod connection;
pub mod entities;
pub mod repositories;

pub use repositories::{CustomerRepository, LeaderboardEntry};
