//! HashMap/HashSet aliases using ahash as the hasher.
//!
//! The resolver builds many small maps (extension tables, builtin shim
//! tables, per-package alias lookups) on every resolution; ahash trades
//! DoS resistance for speed, which is the right tradeoff for keys that
//! never originate from untrusted network input.

#[cfg(feature = "ahash")]
pub type AHashMap<K, V> = std::collections::HashMap<K, V, ahash::RandomState>;
#[cfg(feature = "ahash")]
pub type AHashSet<K> = std::collections::HashSet<K, ahash::RandomState>;

#[cfg(not(feature = "ahash"))]
pub type AHashMap<K, V> = std::collections::HashMap<K, V>;
#[cfg(not(feature = "ahash"))]
pub type AHashSet<K> = std::collections::HashSet<K>;
