pub mod crypto;
pub mod merge;
pub mod token;
