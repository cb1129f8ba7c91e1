/// Key-value store port and its backends.
pub mod kv_store;
/// Record definitions persisted under each store key.
pub mod models;
/// Typed repository encoding and decoding party records.
pub mod party;
/// Backend-agnostic storage errors.
pub mod storage;
