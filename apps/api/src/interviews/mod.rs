pub mod formatting;
pub mod handlers;
