pub mod resolve;
pub mod token;
