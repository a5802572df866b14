pub mod customers;
pub mod prelude;
