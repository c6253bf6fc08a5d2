//! Shared utilities and strongly-typed common values for workspace crates.
//!
//! ```rust
//! use scommon::{GenerationOptions, IdSequence, Registry};
//!
//! let ids = IdSequence::new();
//! let mut registry = Registry::new();
//! registry.insert(ids.next_id(), "first");
//!
//! let options = GenerationOptions::default().with_temperature(0.2).enable_streaming();
//! assert_eq!(registry.len(), 1);
//! assert!(options.stream);
//! ```

pub mod future {
    //! Shared async future aliases.
    //!
    //! ```rust
    //! use scommon::BoxFuture;
    //!
    //! fn str_len<'a>(value: &'a str) -> BoxFuture<'a, usize> {
    //!     Box::pin(async move { value.len() })
    //! }
    //!
    //! let _future = str_len("hello");
    //! ```

    use std::future::Future;
    use std::pin::Pin;

    pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
}

pub mod sequence {
    //! Monotonic id allocation shared by registries and subscription tables.
    //!
    //! ```rust
    //! use scommon::IdSequence;
    //!
    //! let ids = IdSequence::new();
    //! assert_eq!(ids.next_id(), 1);
    //! assert_eq!(ids.next_id(), 2);
    //! ```

    use std::sync::atomic::{AtomicU64, Ordering};

    #[derive(Debug, Default)]
    pub struct IdSequence {
        last: AtomicU64,
    }

    impl IdSequence {
        pub fn new() -> Self {
            Self::default()
        }

        /// Ids start at 1 so that 0 never names a live entry.
        pub fn next_id(&self) -> u64 {
            self.last.fetch_add(1, Ordering::Relaxed) + 1
        }
    }
}

pub mod model {
    //! Shared generation settings used by request types.
    //!
    //! ```rust
    //! use scommon::GenerationOptions;
    //!
    //! let options = GenerationOptions::default()
    //!     .with_temperature(0.2)
    //!     .with_max_tokens(2048)
    //!     .enable_streaming();
    //!
    //! assert_eq!(options.temperature, Some(0.2));
    //! assert_eq!(options.max_tokens, Some(2048));
    //! assert!(options.stream);
    //! ```

    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    pub struct GenerationOptions {
        pub temperature: Option<f32>,
        pub max_tokens: Option<u32>,
        pub stream: bool,
    }

    impl GenerationOptions {
        pub fn with_temperature(mut self, temperature: f32) -> Self {
            self.temperature = Some(temperature);
            self
        }

        pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
            self.max_tokens = Some(max_tokens);
            self
        }

        pub fn with_streaming(mut self, stream: bool) -> Self {
            self.stream = stream;
            self
        }

        pub fn enable_streaming(self) -> Self {
            self.with_streaming(true)
        }
    }
}

pub mod registry {
    //! Generic registry map wrapper used by runtime registries.
    //!
    //! ```rust
    //! use scommon::Registry;
    //!
    //! let mut registry = Registry::new();
    //! registry.insert("alpha".to_string(), 1_u32);
    //! registry.insert("beta".to_string(), 2_u32);
    //! registry.retain(|_, value| *value > 1);
    //!
    //! assert_eq!(registry.get("beta"), Some(&2));
    //! assert!(!registry.contains_key("alpha"));
    //! ```

    use std::borrow::Borrow;
    use std::collections::HashMap;
    use std::hash::Hash;

    #[derive(Debug, Clone)]
    pub struct Registry<K, V> {
        items: HashMap<K, V>,
    }

    impl<K, V> Default for Registry<K, V>
    where
        K: Eq + Hash,
    {
        fn default() -> Self {
            Self {
                items: HashMap::new(),
            }
        }
    }

    impl<K, V> Registry<K, V>
    where
        K: Eq + Hash,
    {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert(&mut self, key: K, value: V) -> Option<V> {
            self.items.insert(key, value)
        }

        pub fn get<Q>(&self, key: &Q) -> Option<&V>
        where
            K: Borrow<Q>,
            Q: Eq + Hash + ?Sized,
        {
            self.items.get(key)
        }

        pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
        where
            K: Borrow<Q>,
            Q: Eq + Hash + ?Sized,
        {
            self.items.remove(key)
        }

        pub fn contains_key<Q>(&self, key: &Q) -> bool
        where
            K: Borrow<Q>,
            Q: Eq + Hash + ?Sized,
        {
            self.items.contains_key(key)
        }

        pub fn retain(&mut self, keep: impl FnMut(&K, &mut V) -> bool) {
            self.items.retain(keep);
        }

        /// Removes and returns every entry for which `take` is true.
        pub fn extract_if(&mut self, mut take: impl FnMut(&K, &V) -> bool) -> Vec<(K, V)>
        where
            K: Clone,
        {
            let keys = self
                .items
                .iter()
                .filter(|(key, value)| take(*key, *value))
                .map(|(key, _)| key.clone())
                .collect::<Vec<_>>();

            keys.into_iter()
                .filter_map(|key| self.items.remove_entry(&key))
                .collect()
        }

        pub fn drain(&mut self) -> Vec<(K, V)> {
            self.items.drain().collect()
        }

        pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
            self.items.iter()
        }

        pub fn values(&self) -> impl Iterator<Item = &V> {
            self.items.values()
        }

        pub fn len(&self) -> usize {
            self.items.len()
        }

        pub fn is_empty(&self) -> bool {
            self.items.is_empty()
        }

        pub fn clear(&mut self) {
            self.items.clear();
        }
    }
}

pub use future::BoxFuture;
pub use model::GenerationOptions;
pub use registry::Registry;
pub use sequence::IdSequence;

#[cfg(test)]
mod tests {
    use super::{GenerationOptions, IdSequence, Registry};

    #[test]
    fn id_sequence_is_monotonic_and_starts_at_one() {
        let ids = IdSequence::new();

        assert_eq!(ids.next_id(), 1);
        assert_eq!(ids.next_id(), 2);
        assert_eq!(ids.next_id(), 3);
    }

    #[test]
    fn generation_options_builder_helpers_set_values() {
        let options = GenerationOptions::default()
            .with_temperature(0.3)
            .with_max_tokens(123)
            .enable_streaming();

        assert_eq!(options.temperature, Some(0.3));
        assert_eq!(options.max_tokens, Some(123));
        assert!(options.stream);
    }

    #[test]
    fn generic_registry_basic_lifecycle() {
        let mut registry = Registry::new();
        assert!(registry.is_empty());

        registry.insert("alpha".to_string(), 1_u32);
        assert_eq!(registry.get("alpha"), Some(&1));
        assert!(registry.contains_key("alpha"));
        assert_eq!(registry.len(), 1);

        let removed = registry.remove("alpha");
        assert_eq!(removed, Some(1));
        assert!(registry.is_empty());
    }

    #[test]
    fn extract_if_removes_only_matching_entries() {
        let mut registry = Registry::new();
        registry.insert("old".to_string(), 10_u32);
        registry.insert("fresh".to_string(), 1_u32);
        registry.insert("older".to_string(), 20_u32);

        let mut taken = registry.extract_if(|_, age| *age >= 10);
        taken.sort();

        assert_eq!(
            taken,
            vec![("old".to_string(), 10), ("older".to_string(), 20)]
        );
        assert_eq!(registry.len(), 1);
        assert!(registry.contains_key("fresh"));
    }

    #[test]
    fn drain_empties_registry() {
        let mut registry = Registry::new();
        registry.insert(1_u64, "a");
        registry.insert(2_u64, "b");

        let drained = registry.drain();
        assert_eq!(drained.len(), 2);
        assert!(registry.is_empty());
    }
}
