//! Registry of available node kinds.

use crate::core::error::{GraphError, GraphResult};
use crate::core::node::{Category, FilterNode, NodeMetadata};
use indexmap::IndexMap;
use std::sync::Arc;

/// Factory function for creating node instances.
pub type FilterFactory = Arc<dyn Fn() -> Box<dyn FilterNode> + Send + Sync>;

/// Registry entry containing metadata and factory.
#[derive(Clone)]
pub struct RegistryEntry {
    /// Factory function to create instances.
    pub factory: FilterFactory,
    /// Cached metadata (avoids creating an instance just to describe it).
    pub metadata: NodeMetadata,
}

/// Registry for all available node kinds.
///
/// Kinds are keyed by their operation tag, e.g. `"box_blur"`, and keep
/// registration order.
pub struct FilterRegistry {
    /// Entries indexed by operation tag.
    filters: IndexMap<String, RegistryEntry>,
    /// Tags grouped by category.
    categories: IndexMap<Category, Vec<String>>,
}

impl FilterRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            filters: IndexMap::new(),
            categories: IndexMap::new(),
        }
    }

    /// Create a registry pre-populated with the built-in kinds.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::filters::builtin::register_all(&mut registry);
        registry
    }

    /// Register a node kind. A later registration under the same tag
    /// replaces the earlier one.
    pub fn register<F>(&mut self, factory: F)
    where
        F: Fn() -> Box<dyn FilterNode> + Send + Sync + 'static,
    {
        let metadata = factory().metadata();
        let id = metadata.id.clone();
        let category = metadata.category;

        let entry = RegistryEntry {
            factory: Arc::new(factory),
            metadata,
        };

        if let Some(previous) = self.filters.insert(id.clone(), entry) {
            log::debug!("Replacing registered node kind '{}'", id);
            if let Some(ids) = self.categories.get_mut(&previous.metadata.category) {
                ids.retain(|i| *i != id);
            }
        }

        self.categories.entry(category).or_default().push(id);
    }

    /// Create a new instance by tag.
    pub fn create(&self, id: &str) -> Option<Box<dyn FilterNode>> {
        self.filters.get(id).map(|e| (e.factory)())
    }

    /// Create a new instance by tag, failing on an unknown tag.
    pub fn create_node(&self, id: &str) -> GraphResult<Box<dyn FilterNode>> {
        self.create(id)
            .ok_or_else(|| GraphError::UnknownOperation(id.to_string()))
    }

    /// Get metadata for a kind without creating an instance.
    pub fn get_metadata(&self, id: &str) -> Option<&NodeMetadata> {
        self.filters.get(id).map(|e| &e.metadata)
    }

    /// Check if a kind is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.filters.contains_key(id)
    }

    /// All registered tags, in registration order.
    pub fn filter_ids(&self) -> impl Iterator<Item = &str> {
        self.filters.keys().map(|s| s.as_str())
    }

    /// Metadata of every registered kind, in registration order.
    pub fn metadata(&self) -> impl Iterator<Item = &NodeMetadata> {
        self.filters.values().map(|e| &e.metadata)
    }

    /// Tags registered under a category.
    pub fn filters_by_category(&self, category: Category) -> Vec<&str> {
        self.categories
            .get(&category)
            .map(|ids| ids.iter().map(|s| s.as_str()).collect())
            .unwrap_or_default()
    }

    /// Search kinds by tag, name, description or search tags.
    pub fn search(&self, query: &str) -> Vec<&str> {
        let query = query.to_lowercase();

        self.filters
            .iter()
            .filter(|(_, entry)| {
                let meta = &entry.metadata;
                meta.id.to_lowercase().contains(&query)
                    || meta.name.to_lowercase().contains(&query)
                    || meta.description.to_lowercase().contains(&query)
                    || meta.tags.iter().any(|t| t.to_lowercase().contains(&query))
            })
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Unregister a kind.
    pub fn unregister(&mut self, id: &str) -> bool {
        match self.filters.shift_remove(id) {
            Some(entry) => {
                if let Some(ids) = self.categories.get_mut(&entry.metadata.category) {
                    ids.retain(|i| i != id);
                }
                true
            }
            None => false,
        }
    }

    /// Get the total number of registered kinds.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Kinds grouped by category in [`Category::all`] order, each group
    /// sorted by name.
    pub fn grouped_by_category(&self) -> IndexMap<Category, Vec<&NodeMetadata>> {
        let mut grouped: IndexMap<Category, Vec<&NodeMetadata>> = IndexMap::new();

        for category in Category::all() {
            let mut members: Vec<&NodeMetadata> = self
                .filters
                .values()
                .map(|e| &e.metadata)
                .filter(|m| m.category == *category)
                .collect();
            if !members.is_empty() {
                members.sort_by(|a, b| a.name.cmp(&b.name));
                grouped.insert(*category, members);
            }
        }

        grouped
    }
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Builder for creating a customized registry.
pub struct RegistryBuilder {
    registry: FilterRegistry,
    include_builtins: bool,
}

impl RegistryBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            registry: FilterRegistry::new(),
            include_builtins: true,
        }
    }

    /// Include or exclude the built-in kinds.
    pub fn with_builtins(mut self, include: bool) -> Self {
        self.include_builtins = include;
        self
    }

    /// Register a custom kind.
    pub fn register<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn FilterNode> + Send + Sync + 'static,
    {
        self.registry.register(factory);
        self
    }

    /// Build the registry. Custom kinds registered under a built-in tag
    /// take precedence.
    pub fn build(self) -> FilterRegistry {
        if !self.include_builtins {
            return self.registry;
        }
        let mut registry = FilterRegistry::with_builtins();
        for (_, entry) in self.registry.filters {
            let factory = entry.factory;
            registry.register(move || factory());
        }
        registry
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
