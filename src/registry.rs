//! Name → instance tables for alphabets and encodings.

use once_cell::sync::Lazy;
use regex::Regex;
use std::{
    collections::BTreeMap,
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};
use thiserror::Error;

static NAME: Lazy<Regex> = Lazy::new(|| match Regex::new(r"^base[0-9][a-zA-Z0-9_]*$") {
    Ok(regex) => regex,
    Err(_) => panic!("Could not build name pattern"),
});

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum Error {
    #[error("Invalid name {name:?}")]
    InvalidName { name: String },
    #[error("Name {name:?} already exists")]
    Duplicate { name: String },
    #[error("Name {name:?} does not exist")]
    NotFound { name: String },
}

/// Names must look like `base2`, `base58btc`, `base32_lower`, ...
pub fn is_valid_name(name: &str) -> bool {
    NAME.is_match(name)
}

/// A thread-safe table of named instances, iterated in name order.
#[derive(Debug, Default)]
pub struct Registry<T> {
    entries: RwLock<BTreeMap<String, T>>,
}

impl<T: Clone> Registry<T> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    pub(crate) fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a T)>) -> Self
    where
        T: 'a,
    {
        let entries = entries.into_iter().map(|(name, value)| (name.to_owned(), value.clone())).collect();
        Self {
            entries: RwLock::new(entries),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, T>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, T>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, name: &str) -> Result<T, Error> {
        self.read().get(name).cloned().ok_or_else(|| Error::NotFound { name: name.to_owned() })
    }

    pub fn has(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    /// Registers `value` under `name`. The duplicate check and the insertion happen under
    /// the same write lock.
    pub fn register(&self, name: &str, value: T) -> Result<(), Error> {
        if !is_valid_name(name) {
            return Err(Error::InvalidName { name: name.to_owned() });
        }
        let mut entries = self.write();
        if entries.contains_key(name) {
            return Err(Error::Duplicate { name: name.to_owned() });
        }
        entries.insert(name.to_owned(), value);
        tracing::debug!(name, "registered");
        Ok(())
    }

    pub fn unregister(&self, name: &str) -> Result<T, Error> {
        let value = self.write().remove(name).ok_or_else(|| Error::NotFound { name: name.to_owned() })?;
        tracing::debug!(name, "unregistered");
        Ok(value)
    }

    /// All entries whose name starts with `prefix`, sorted by name.
    pub fn table(&self, prefix: &str) -> Vec<(String, T)> {
        self.read()
            .iter()
            .filter(|(name, _)| name.starts_with(prefix))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::Arc, thread};

    #[test]
    fn names() {
        assert!(is_valid_name("base2"));
        assert!(is_valid_name("base58btc"));
        assert!(is_valid_name("base16_lower"));
        assert!(!is_valid_name("base"));
        assert!(!is_valid_name("basex"));
        assert!(!is_valid_name("hex"));
        assert!(!is_valid_name("base2-lower"));
    }

    #[test]
    fn register_get_unregister() {
        let registry = Registry::new();
        registry.register("base4", 4).unwrap();
        registry.register("base4x", 40).unwrap();
        registry.register("base8", 8).unwrap();
        assert_eq!(registry.get("base4"), Ok(4));
        assert!(registry.has("base8"));
        assert_eq!(
            registry.register("base4", 5),
            Err(Error::Duplicate {
                name: "base4".to_owned()
            })
        );
        assert_eq!(
            registry.register("four", 4),
            Err(Error::InvalidName {
                name: "four".to_owned()
            })
        );
        assert_eq!(registry.table("base4"), vec![("base4".to_owned(), 4), ("base4x".to_owned(), 40)]);
        assert_eq!(registry.unregister("base4"), Ok(4));
        assert_eq!(
            registry.get("base4"),
            Err(Error::NotFound {
                name: "base4".to_owned()
            })
        );
        assert!(registry.unregister("base4").is_err());
    }

    #[test]
    fn concurrent_registration_is_exclusive() {
        let registry = Arc::new(Registry::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = registry.clone();
                thread::spawn(move || registry.register("base7", i).is_ok())
            })
            .collect();
        let successes = handles.into_iter().filter_map(|handle| handle.join().ok()).filter(|&ok| ok).count();
        assert_eq!(successes, 1);
    }
}
