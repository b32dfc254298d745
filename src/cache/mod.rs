pub mod memory;

use std::time::Duration;

pub use memory::MemoryCache;

/// Opaque string-keyed cache used opportunistically by read paths. Cache
/// failures must never fail a read, so every operation is infallible at
/// this seam.
pub trait Cache {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String, ttl: Duration);
    fn delete(&self, key: &str);
    fn clear(&self);
}
