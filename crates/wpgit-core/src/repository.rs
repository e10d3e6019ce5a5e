//! Typed access to the managed plugin collection

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::plugin::ManagedPlugin;
use crate::store::{KeyValueStore, MANAGED_PLUGINS_KEY};
use crate::{Error, Result};

type Collection = BTreeMap<String, ManagedPlugin>;

/// The `managed_plugins` map, slug → record.
///
/// Every mutation is a single [`KeyValueStore::update`] call, so the
/// read-modify-write of one record never interleaves with another writer.
#[derive(Clone)]
pub struct PluginRepository {
    store: Arc<dyn KeyValueStore>,
}

impl PluginRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn all(&self) -> Result<Collection> {
        decode(self.store.get(MANAGED_PLUGINS_KEY)?)
    }

    pub fn get(&self, slug: &str) -> Result<Option<ManagedPlugin>> {
        Ok(self.all()?.remove(slug))
    }

    /// The record for `slug` or [`Error::PluginNotFound`].
    pub fn require(&self, slug: &str) -> Result<ManagedPlugin> {
        self.get(slug)?.ok_or_else(|| Error::PluginNotFound {
            slug: slug.to_string(),
        })
    }

    pub fn contains(&self, slug: &str) -> Result<bool> {
        Ok(self.all()?.contains_key(slug))
    }

    /// Add a new record; fails with [`Error::AlreadyManaged`] if the slug exists.
    pub fn insert(&self, plugin: ManagedPlugin) -> Result<()> {
        let mut plugin = Some(plugin);
        self.modify(|plugins| {
            let Some(plugin) = plugin.take() else {
                return Ok(());
            };
            if plugins.contains_key(&plugin.slug) {
                return Err(Error::AlreadyManaged { slug: plugin.slug });
            }
            plugins.insert(plugin.slug.clone(), plugin);
            Ok(())
        })
    }

    /// Mutate the record for `slug` in place and return the saved copy.
    pub fn update(&self, slug: &str, f: impl FnOnce(&mut ManagedPlugin)) -> Result<ManagedPlugin> {
        let mut f = Some(f);
        let mut saved = None;
        self.modify(|plugins| {
            let plugin = plugins.get_mut(slug).ok_or_else(|| Error::PluginNotFound {
                slug: slug.to_string(),
            })?;
            if let Some(f) = f.take() {
                f(plugin);
            }
            saved = Some(plugin.clone());
            Ok(())
        })?;
        saved.ok_or_else(|| Error::PluginNotFound {
            slug: slug.to_string(),
        })
    }

    /// Drop the record for `slug`, returning it.
    pub fn remove(&self, slug: &str) -> Result<ManagedPlugin> {
        let mut removed = None;
        self.modify(|plugins| {
            removed = plugins.remove(slug);
            Ok(())
        })?;
        removed.ok_or_else(|| Error::PluginNotFound {
            slug: slug.to_string(),
        })
    }

    fn modify(&self, mut f: impl FnMut(&mut Collection) -> Result<()>) -> Result<()> {
        self.store.update(MANAGED_PLUGINS_KEY, &mut |current| {
            let mut plugins = decode(current)?;
            f(&mut plugins)?;
            let value = serde_json::to_value(&plugins).map_err(|e| Error::Store {
                key: MANAGED_PLUGINS_KEY.into(),
                message: e.to_string(),
            })?;
            Ok(Some(value))
        })
    }
}

fn decode(value: Option<Value>) -> Result<Collection> {
    match value {
        Some(value) => serde_json::from_value(value).map_err(|e| Error::Store {
            key: MANAGED_PLUGINS_KEY.into(),
            message: e.to_string(),
        }),
        None => Ok(Collection::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::PluginStatus;
    use crate::store::MemoryStore;
    use chrono::Utc;

    fn sample(slug: &str) -> ManagedPlugin {
        ManagedPlugin {
            slug: slug.into(),
            repo_url: format!("https://github.com/acme/{slug}.git"),
            owner: "acme".into(),
            repo: slug.into(),
            branch: "main".into(),
            local_commit: String::new(),
            remote_commit: String::new(),
            last_sync: None,
            auto_sync: false,
            is_private: false,
            wp_plugin_name: String::new(),
            wp_plugin_version: String::new(),
            wp_plugin_file: String::new(),
            status: PluginStatus::UpToDate,
            last_error: None,
            last_commit_message: String::new(),
            last_commit_author: String::new(),
            last_commit_date: None,
            added_at: Utc::now(),
        }
    }

    #[test]
    fn duplicate_insert_conflicts_and_keeps_one_record() {
        let repo = PluginRepository::new(Arc::new(MemoryStore::new()));
        repo.insert(sample("widget")).unwrap();
        let err = repo.insert(sample("widget")).unwrap_err();
        assert!(matches!(err, Error::AlreadyManaged { .. }));
        assert_eq!(repo.all().unwrap().len(), 1);
    }

    #[test]
    fn update_persists_and_returns_record() {
        let repo = PluginRepository::new(Arc::new(MemoryStore::new()));
        repo.insert(sample("widget")).unwrap();
        let saved = repo.update("widget", |p| p.auto_sync = true).unwrap();
        assert!(saved.auto_sync);
        assert!(repo.require("widget").unwrap().auto_sync);
    }

    #[test]
    fn unknown_slug_is_not_found() {
        let repo = PluginRepository::new(Arc::new(MemoryStore::new()));
        assert!(matches!(
            repo.update("ghost", |_| {}),
            Err(Error::PluginNotFound { .. })
        ));
        assert!(matches!(repo.remove("ghost"), Err(Error::PluginNotFound { .. })));
    }
}
