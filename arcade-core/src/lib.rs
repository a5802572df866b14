pub mod reflex;
pub mod scoring;
pub mod word_round;

// Re-export main components
pub use reflex::*;
pub use scoring::*;
pub use word_round::*;
