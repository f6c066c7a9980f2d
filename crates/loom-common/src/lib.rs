pub mod position;
pub mod span;
pub mod token;
