use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::handlers::{Handler, MatchMergeHandler, QueryBuilderHandler, WorkflowHandler};

pub const QUERY_AGENT: &str = "query_agent";
pub const MDM_AGENT: &str = "mdm_agent";
pub const WORKFLOW_AGENT: &str = "workflow_agent";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("handler `{0}` is registered more than once")]
    DuplicateHandler(String),
    #[error("handler names must not be empty")]
    EmptyName,
}

#[derive(Clone)]
pub struct HandlerEntry {
    pub name: String,
    pub handler: Arc<dyn Handler>,
}

impl HandlerEntry {
    pub fn new<H>(name: impl Into<String>, handler: H) -> Self
    where
        H: Handler + 'static,
    {
        Self { name: name.into(), handler: Arc::new(handler) }
    }
}

/// Name to handler mapping, fixed at construction. Lookups need no locking since nothing
/// writes to the map afterwards.
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl HandlerRegistry {
    pub fn new(entries: impl IntoIterator<Item = HandlerEntry>) -> Result<Self, RegistryError> {
        let mut handlers = HashMap::new();
        for entry in entries {
            if entry.name.trim().is_empty() {
                return Err(RegistryError::EmptyName);
            }
            if handlers.contains_key(&entry.name) {
                return Err(RegistryError::DuplicateHandler(entry.name));
            }
            handlers.insert(entry.name, entry.handler);
        }
        Ok(Self { handlers })
    }

    /// The agents this service ships with.
    pub fn standard() -> Result<Self, RegistryError> {
        Self::new([
            HandlerEntry::new(QUERY_AGENT, QueryBuilderHandler),
            HandlerEntry::new(MDM_AGENT, MatchMergeHandler),
            HandlerEntry::new(WORKFLOW_AGENT, WorkflowHandler),
        ])
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<dyn Handler>> {
        self.handlers.get(name).cloned()
    }

    /// Sorted `(name, description)` pairs for operator listings.
    pub fn describe(&self) -> Vec<(&str, &'static str)> {
        self.names()
            .into_iter()
            .filter_map(|name| self.handlers.get(name).map(|handler| (name, handler.description())))
            .collect()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{HandlerEntry, HandlerRegistry, RegistryError, MDM_AGENT, QUERY_AGENT};
    use crate::handlers::{Handler, MatchMergeHandler, QueryBuilderHandler, WorkflowHandler};

    #[test]
    fn standard_registry_exposes_three_agents() {
        let registry = HandlerRegistry::standard().expect("standard registry");

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.names(), vec!["mdm_agent", "query_agent", "workflow_agent"]);
        assert!(registry.lookup("unknown_agent").is_none());
        assert!(registry.lookup("Query_Agent").is_none(), "lookup is case-sensitive");
    }

    #[tokio::test]
    async fn lookup_returns_the_registered_handler() {
        let registry = HandlerRegistry::standard().expect("standard registry");

        for name in registry.names() {
            let handler = registry.lookup(name).expect("listed names resolve");
            let result = handler
                .invoke(&serde_json::Map::new())
                .await
                .unwrap_or_else(|error| panic!("{name} failed on an empty payload: {error}"));
            assert!(!result.is_empty(), "{name} returned an empty result");
        }

        let payload = json!({"dialect": "postgresql"});
        let handler = registry.lookup(QUERY_AGENT).expect("query agent registered");
        let result = handler.invoke(payload.as_object().expect("object")).await.expect("sql");
        assert!(result["sql"].as_str().unwrap_or_default().contains("INTERVAL '3 months'"));
    }

    #[test]
    fn describe_pairs_each_agent_with_its_description() {
        let registry = HandlerRegistry::standard().expect("standard registry");

        let described = registry.describe();

        assert_eq!(described.len(), registry.len());
        assert_eq!(described[0], (MDM_AGENT, MatchMergeHandler.description()));
        assert!(described[1].1.starts_with("generate dialect-specific SQL"));
        assert!(described.iter().all(|(_, description)| !description.is_empty()));
    }

    #[test]
    fn duplicate_names_fail_construction() {
        let result = HandlerRegistry::new([
            HandlerEntry::new("query_agent", QueryBuilderHandler),
            HandlerEntry::new("query_agent", WorkflowHandler),
        ]);

        assert!(matches!(
            result,
            Err(RegistryError::DuplicateHandler(ref name)) if name == "query_agent"
        ));
    }

    #[test]
    fn empty_names_fail_construction() {
        let result = HandlerRegistry::new([HandlerEntry::new("  ", MatchMergeHandler)]);

        assert!(matches!(result, Err(RegistryError::EmptyName)));
    }
}
