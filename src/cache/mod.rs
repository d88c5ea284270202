//! In-memory response cache for GET requests
//!
//! Entries are keyed by the request path concatenated with the JSON form of its
//! query parameters. Entries older than the TTL are ignored on read but left in
//! place until a fresh response overwrites them or the cache is cleared.

mod memory;

pub use memory::{CachedResponse, ResponseCache, DEFAULT_TTL};
