pub mod chat;
pub mod interview;
