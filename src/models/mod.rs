pub mod audit;
pub mod chat;
