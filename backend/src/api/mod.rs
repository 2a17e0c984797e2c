pub mod navigate;
pub mod search;
