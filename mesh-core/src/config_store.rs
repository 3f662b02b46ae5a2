//! Versioned, dotted-path key/value configuration store.
//!
//! Programming actual flash/EEPROM is out of scope — this module is the
//! in-memory store a persistence backend would serialize and restore. It
//! tracks its own schema version under a reserved `%version` key; loading a
//! store whose version doesn't match the running firmware's rewrites every
//! key to the firmware's compiled-in defaults.

use heapless::{FnvIndexMap, String};

use crate::error::Error;

/// Maximum number of distinct dotted-path keys. Must be a power of two
/// (a `heapless::FnvIndexMap` requirement).
pub const CAPACITY: usize = 32;

/// Longest dotted-path key or string value this store holds.
pub const MAX_STRING_LEN: usize = 32;

/// The reserved key holding the store's schema version.
pub const VERSION_KEY: &str = "%version";

/// A stored value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i32),
    Addr(crate::addr::Address),
    Text(String<MAX_STRING_LEN>),
}

/// Populates a freshly reset store with a firmware's compiled-in defaults.
pub trait Defaults {
    /// The schema version these defaults correspond to.
    const CURRENT_VERSION: u32;

    /// Writes every default key/value pair into `store`.
    fn populate(store: &mut ConfigStore);
}

/// A dotted-path key/value store over a fixed-capacity map.
pub struct ConfigStore {
    entries: FnvIndexMap<&'static str, Value, CAPACITY>,
}

impl ConfigStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        ConfigStore {
            entries: FnvIndexMap::new(),
        }
    }

    /// Looks up `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Sets `key` to `value`, overwriting any existing entry.
    pub fn set(&mut self, key: &'static str, value: Value) -> Result<(), Error> {
        self.entries.insert(key, value).map(|_| ()).map_err(|_| Error::Eof)
    }

    /// The store's current `%version` value, if set to an integer.
    pub fn version(&self) -> Option<u32> {
        match self.get(VERSION_KEY) {
            Some(Value::Int(v)) if *v >= 0 => Some(*v as u32),
            _ => None,
        }
    }

    /// Loads `stored` (e.g. just read back from flash), rewriting it to
    /// `D`'s defaults if its version doesn't match `D::CURRENT_VERSION`.
    pub fn load_or_default<D: Defaults>(mut stored: ConfigStore) -> ConfigStore {
        if stored.version() == Some(D::CURRENT_VERSION) {
            return stored;
        }

        stored.entries.clear();
        D::populate(&mut stored);
        let _ = stored.set(VERSION_KEY, Value::Int(D::CURRENT_VERSION as i32));
        stored
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestDefaults;

    impl Defaults for TestDefaults {
        const CURRENT_VERSION: u32 = 3;

        fn populate(store: &mut ConfigStore) {
            store.set("radio.channel", Value::Int(5)).unwrap();
            store.set("node.gateway", Value::Bool(false)).unwrap();
        }
    }

    #[test]
    fn fresh_store_gets_defaults_and_version_stamped() {
        let store = ConfigStore::load_or_default::<TestDefaults>(ConfigStore::new());
        assert_eq!(store.version(), Some(3));
        assert_eq!(store.get("radio.channel"), Some(&Value::Int(5)));
    }

    #[test]
    fn stale_version_triggers_rewrite() {
        let mut stale = ConfigStore::new();
        stale.set(VERSION_KEY, Value::Int(1)).unwrap();
        stale.set("radio.channel", Value::Int(99)).unwrap();

        let store = ConfigStore::load_or_default::<TestDefaults>(stale);
        assert_eq!(store.version(), Some(3));
        assert_eq!(store.get("radio.channel"), Some(&Value::Int(5)));
    }

    #[test]
    fn matching_version_is_left_untouched() {
        let mut current = ConfigStore::new();
        current.set(VERSION_KEY, Value::Int(3)).unwrap();
        current.set("radio.channel", Value::Int(7)).unwrap();

        let store = ConfigStore::load_or_default::<TestDefaults>(current);
        assert_eq!(store.get("radio.channel"), Some(&Value::Int(7)));
    }
}
