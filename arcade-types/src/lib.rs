pub mod customer;
pub mod invite;
pub mod messages;
pub mod word;

// Re-export all types
pub use customer::*;
pub use invite::*;
pub use messages::*;
pub use word::*;
