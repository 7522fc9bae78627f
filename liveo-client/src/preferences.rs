//! Persisted view preferences
//!
//! Display code keeps small per-user settings (which courses are collapsed,
//! the selected course) between sessions. The client never interprets them;
//! it only defines the read/write pair so that a view layer can plug in its
//! own storage.

use parking_lot::RwLock;
use std::collections::HashMap;

/// Opaque string key/value storage
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: String);

    /// Remove `key`, returning the previous value
    fn remove(&self, key: &str) -> Option<String>;
}

/// Process-local [`PreferenceStore`]
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.values.write().insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) -> Option<String> {
        self.values.write().remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_get_set_remove() {
        let prefs = MemoryPreferences::new();
        assert_eq!(prefs.get("hidden:Brown"), None);

        prefs.set("hidden:Brown", "true".to_string());
        assert_eq!(prefs.get("hidden:Brown").as_deref(), Some("true"));

        prefs.set("hidden:Brown", "false".to_string());
        assert_eq!(prefs.len(), 1);

        assert_eq!(prefs.remove("hidden:Brown").as_deref(), Some("false"));
        assert!(prefs.is_empty());
    }

    #[test]
    fn test_usable_as_trait_object() {
        let prefs: Arc<dyn PreferenceStore> = Arc::new(MemoryPreferences::new());
        prefs.set("course", "Blue".to_string());
        assert_eq!(prefs.get("course").as_deref(), Some("Blue"));
    }
}
