pub mod auth;
pub mod discover;
pub mod game;
pub mod health;
pub mod message;
pub mod profile;
pub mod sse;
pub mod validation;
