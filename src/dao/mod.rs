/// Persisted score entity shared by every backend.
pub mod models;
/// Score store trait and its backends.
pub mod score_store;
/// Storage abstraction layer for database operations.
pub mod storage;
