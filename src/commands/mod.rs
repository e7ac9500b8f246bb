pub mod auth;
pub mod chat;
pub mod documents;
pub mod lawyers;
pub mod profile;
pub mod settings;
