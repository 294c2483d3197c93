use std::collections::HashMap;
use std::sync::Arc;

use crate::handler::{ResourceHandler, ToolHandler};
use crate::template::{Captures, ResourceTemplate};
use crate::types::{DispatchError, EntryKind, ToolDescriptor};

/// A registered tool: its descriptor plus the async handler bound to it.
/// Owned exclusively by its registry entry; never mutated after
/// registration.
pub struct ToolBinding {
    pub descriptor: ToolDescriptor,
    pub handler: Arc<dyn ToolHandler>,
}

impl std::fmt::Debug for ToolBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolBinding")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Maps tool names to bindings.
///
/// Populated sequentially at server construction and frozen afterwards,
/// so concurrent dispatch reads it without locking.
#[derive(Default)]
pub struct ToolRegistry {
    bindings: HashMap<String, ToolBinding>,
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn register(
        &mut self,
        descriptor: ToolDescriptor,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<(), DispatchError> {
        let name = descriptor.name.clone();
        if self.bindings.contains_key(&name) {
            return Err(DispatchError::DuplicateName(name));
        }
        self.order.push(name.clone());
        self.bindings.insert(name, ToolBinding { descriptor, handler });
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<&ToolBinding, DispatchError> {
        self.bindings.get(name).ok_or_else(|| DispatchError::NotFound {
            kind: EntryKind::Tool,
            name: name.to_string(),
        })
    }

    /// Descriptors in registration order.
    pub fn list(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.order
            .iter()
            .filter_map(|name| self.bindings.get(name))
            .map(|binding| &binding.descriptor)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// A registered resource template and its handler.
pub struct ResourceBinding {
    pub template: ResourceTemplate,
    pub handler: Arc<dyn ResourceHandler>,
}

impl std::fmt::Debug for ResourceBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceBinding")
            .field("template", &self.template)
            .finish_non_exhaustive()
    }
}

/// Resource templates, matched in registration order.
///
/// Templates may structurally overlap; the first registered template
/// whose shape matches a concrete URI wins.
#[derive(Default)]
pub struct ResourceRegistry {
    entries: Vec<ResourceBinding>,
}

impl ResourceRegistry {
    pub fn register(
        &mut self,
        template: &str,
        handler: Arc<dyn ResourceHandler>,
    ) -> Result<(), DispatchError> {
        let template = ResourceTemplate::parse(template)?;
        self.entries.push(ResourceBinding { template, handler });
        Ok(())
    }

    /// Resolve a concrete URI to the first matching binding and its
    /// captures.
    pub fn resolve(&self, uri: &str) -> Result<(&ResourceBinding, Captures), DispatchError> {
        for entry in &self.entries {
            if let Some(captures) = entry.template.match_uri(uri) {
                return Ok((entry, captures));
            }
        }
        Err(DispatchError::NoMatch(uri.to_string()))
    }

    /// Templates in registration order.
    pub fn list(&self) -> impl Iterator<Item = &ResourceTemplate> {
        self.entries.iter().map(|entry| &entry.template)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Produces a prompt's text on demand.
pub type PromptProducer = Box<dyn Fn() -> String + Send + Sync>;

/// Named prompt producers.
///
/// Producers run lazily, only when a prompt is rendered — never at
/// registration.
#[derive(Default)]
pub struct PromptRegistry {
    producers: HashMap<String, PromptProducer>,
    order: Vec<String>,
}

impl PromptRegistry {
    pub fn register(
        &mut self,
        name: impl Into<String>,
        producer: impl Fn() -> String + Send + Sync + 'static,
    ) -> Result<(), DispatchError> {
        let name = name.into();
        if self.producers.contains_key(&name) {
            return Err(DispatchError::DuplicateName(name));
        }
        self.order.push(name.clone());
        self.producers.insert(name, Box::new(producer));
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<&PromptProducer, DispatchError> {
        self.producers.get(name).ok_or_else(|| DispatchError::NotFound {
            kind: EntryKind::Prompt,
            name: name.to_string(),
        })
    }

    /// Render a prompt's text.
    pub fn render(&self, name: &str) -> Result<String, DispatchError> {
        Ok(self.lookup(name)?())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.producers.contains_key(name)
    }

    /// Prompt names in registration order.
    pub fn list(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{FnResourceHandler, FnToolHandler};
    use crate::types::ParamSpec;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn descriptor(name: &str) -> ToolDescriptor {
        ToolDescriptor::new(name, "test tool", vec![ParamSpec::string("message")])
    }

    fn noop_tool() -> Arc<dyn ToolHandler> {
        FnToolHandler::new(|_args: Value| async move { Ok(json!(null)) })
    }

    fn noop_resource() -> Arc<dyn ResourceHandler> {
        FnResourceHandler::new(|_captures: Captures| async move { Ok(json!(null)) })
    }

    #[test]
    fn test_register_then_lookup_returns_same_binding() {
        let mut registry = ToolRegistry::default();
        let handler = noop_tool();
        registry.register(descriptor("echo"), Arc::clone(&handler)).unwrap();

        let binding = registry.lookup("echo").unwrap();
        assert_eq!(binding.descriptor.name, "echo");
        assert!(Arc::ptr_eq(&binding.handler, &handler));
    }

    #[test]
    fn test_duplicate_tool_registration_fails() {
        let mut registry = ToolRegistry::default();
        registry.register(descriptor("echo"), noop_tool()).unwrap();
        let err = registry.register(descriptor("echo"), noop_tool()).unwrap_err();
        assert!(matches!(err, DispatchError::DuplicateName(name) if name == "echo"));
    }

    #[test]
    fn test_lookup_unknown_tool() {
        let registry = ToolRegistry::default();
        let err = registry.lookup("nope").unwrap_err();
        assert_eq!(err.to_string(), "Tool 'nope' not found");
    }

    #[test]
    fn test_list_preserves_registration_order() {
        let mut registry = ToolRegistry::default();
        for name in ["zeta", "alpha", "mid"] {
            registry.register(descriptor(name), noop_tool()).unwrap();
        }
        let names: Vec<_> = registry.list().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_resource_registration_rejects_bad_template() {
        let mut registry = ResourceRegistry::default();
        let err = registry.register("a://{x", noop_resource()).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidTemplate { .. }));
    }

    #[test]
    fn test_resolve_binds_captures() {
        let mut registry = ResourceRegistry::default();
        registry.register("db://{database}/{table}", noop_resource()).unwrap();
        let (binding, captures) = registry.resolve("db://demo/users").unwrap();
        assert_eq!(binding.template.uri_template(), "db://{database}/{table}");
        assert_eq!(captures.get("database"), Some("demo"));
        assert_eq!(captures.get("table"), Some("users"));
    }

    #[test]
    fn test_resolve_no_match() {
        let mut registry = ResourceRegistry::default();
        registry.register("file://{path}", noop_resource()).unwrap();
        let err = registry.resolve("db://demo/users").unwrap_err();
        assert_eq!(err.to_string(), "no resource template matches 'db://demo/users'");
    }

    #[test]
    fn test_overlapping_templates_first_registered_wins() {
        let mut registry = ResourceRegistry::default();
        let first = noop_resource();
        let second = noop_resource();
        registry.register("a://{x}", Arc::clone(&first)).unwrap();
        registry.register("a://fixed", Arc::clone(&second)).unwrap();

        let (binding, captures) = registry.resolve("a://fixed").unwrap();
        assert!(Arc::ptr_eq(&binding.handler, &first));
        assert_eq!(captures.get("x"), Some("fixed"));
    }

    #[test]
    fn test_prompt_register_and_render() {
        let mut registry = PromptRegistry::default();
        registry
            .register("system", || "You are a careful assistant.".to_string())
            .unwrap();
        assert_eq!(registry.render("system").unwrap(), "You are a careful assistant.");
    }

    #[test]
    fn test_prompt_duplicate_fails() {
        let mut registry = PromptRegistry::default();
        registry.register("system", || String::new()).unwrap();
        let err = registry.register("system", || String::new()).unwrap_err();
        assert!(matches!(err, DispatchError::DuplicateName(_)));
    }

    #[test]
    fn test_prompt_unknown_name() {
        let registry = PromptRegistry::default();
        let err = registry.render("nope").unwrap_err();
        assert_eq!(err.to_string(), "Prompt 'nope' not found");
    }

    #[test]
    fn test_prompt_producer_runs_lazily() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let mut registry = PromptRegistry::default();
        registry
            .register("counted", || {
                CALLS.fetch_add(1, Ordering::SeqCst);
                "text".to_string()
            })
            .unwrap();
        assert_eq!(CALLS.load(Ordering::SeqCst), 0);
        registry.render("counted").unwrap();
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_prompt_list_order() {
        let mut registry = PromptRegistry::default();
        registry.register("system", || String::new()).unwrap();
        registry.register("error_help", || String::new()).unwrap();
        let names: Vec<_> = registry.list().collect();
        assert_eq!(names, vec!["system", "error_help"]);
    }
}
