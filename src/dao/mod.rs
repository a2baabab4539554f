/// Relational store abstraction and its backends.
pub mod game_store;
/// Identity provider abstraction and its backends.
pub mod identity;
/// Database model definitions.
pub mod models;
/// Filter-and-order selections over the games table.
pub mod query;
/// Storage abstraction layer for database operations.
pub mod storage;
