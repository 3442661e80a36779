//! Fast, non-cryptographic hash map/set aliases used for the in-memory
//! function-name-to-id index and other hot-path lookups.

pub type FxHashMap<K, V> = std::collections::HashMap<K, V, rustc_hash::FxBuildHasher>;
pub type FxHashSet<T> = std::collections::HashSet<T, rustc_hash::FxBuildHasher>;
