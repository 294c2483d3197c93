use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing;

use crate::handler::{ResourceHandler, ToolHandler};
use crate::registry::{PromptRegistry, ResourceRegistry, ToolRegistry};
use crate::template::ResourceTemplate;
use crate::types::{error_envelope, ok_envelope, DispatchError, Envelope, ToolDescriptor};

/// Owns the three registries and dispatches invocations against them.
///
/// Build once with [`ServerBuilder`]; the registries are frozen after
/// `build()`, so concurrent invocations read them without locking.
/// Individual invocations are independent — the server imposes no
/// serialization between them, and results complete in whatever order
/// the handlers finish.
pub struct Server {
    name: String,
    version: String,
    tools: ToolRegistry,
    resources: ResourceRegistry,
    prompts: PromptRegistry,
    remediation_prompt: Option<String>,
}

impl Server {
    /// Create a new server builder.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Tool descriptors in registration order.
    pub fn list_tools(&self) -> Vec<&ToolDescriptor> {
        self.tools.list().collect()
    }

    /// Resource template strings in registration order.
    pub fn list_resources(&self) -> Vec<&str> {
        self.resources.list().map(ResourceTemplate::uri_template).collect()
    }

    /// Prompt names in registration order.
    pub fn list_prompts(&self) -> Vec<&str> {
        self.prompts.list().collect()
    }

    /// Invoke a tool by name.
    ///
    /// Every outcome — unknown name, argument rejection, handler fault,
    /// handler success — is normalized into an [`Envelope`]; no fault
    /// escapes to the caller. A successful handler return lands in
    /// `data` structurally unmodified, even when it happens to look like
    /// an envelope itself.
    pub async fn invoke_tool(&self, name: &str, args: Value) -> Envelope {
        let binding = match self.tools.lookup(name) {
            Ok(binding) => binding,
            Err(err) => {
                tracing::warn!(tool = name, "unknown tool");
                return error_envelope(err.to_string());
            }
        };

        let bound = match binding.descriptor.bind_arguments(&args) {
            Ok(bound) => bound,
            Err(err) => {
                tracing::debug!(tool = name, error = %err, "argument validation failed");
                return error_envelope(err.to_string());
            }
        };

        tracing::debug!(tool = name, "invoking");
        match binding.handler.call(bound).await {
            Ok(data) => ok_envelope(data),
            Err(err) => {
                tracing::warn!(tool = name, error = %err, "handler failed");
                self.failed(err)
            }
        }
    }

    /// Invoke a tool with a caller-side deadline.
    ///
    /// On expiry the caller receives a failure envelope and the handler
    /// future is dropped; side effects it already performed are not
    /// rolled back.
    pub async fn invoke_tool_with_timeout(
        &self,
        name: &str,
        args: Value,
        timeout: Duration,
    ) -> Envelope {
        match tokio::time::timeout(timeout, self.invoke_tool(name, args)).await {
            Ok(envelope) => envelope,
            Err(_) => {
                tracing::warn!(tool = name, ?timeout, "invocation timed out");
                self.failed(DispatchError::Timeout {
                    name: name.to_string(),
                    timeout,
                })
            }
        }
    }

    /// Fetch a resource by concrete URI.
    ///
    /// Resolves through the resource registry (first registered matching
    /// template wins), invokes the bound handler with the captured
    /// segments, and normalizes exactly like the tool path. Resource
    /// handlers have no parameter schema beyond the template's captures.
    pub async fn fetch_resource(&self, uri: &str) -> Envelope {
        let (binding, captures) = match self.resources.resolve(uri) {
            Ok(hit) => hit,
            Err(err) => {
                tracing::debug!(uri, "no matching resource template");
                return error_envelope(err.to_string());
            }
        };

        tracing::debug!(uri, template = binding.template.uri_template(), "fetching");
        match binding.handler.call(captures).await {
            Ok(data) => ok_envelope(data),
            Err(err) => {
                tracing::warn!(uri, error = %err, "resource handler failed");
                self.failed(err)
            }
        }
    }

    /// Render a registered prompt's text. Unknown names are errors, not
    /// envelopes — prompts are an internal surface.
    pub fn render_prompt(&self, name: &str) -> Result<String, DispatchError> {
        self.prompts.render(name)
    }

    /// Failure envelope for a handler-phase fault, with the configured
    /// remediation prompt attached as `errorHint` when that prompt is
    /// actually registered.
    fn failed(&self, err: DispatchError) -> Envelope {
        let envelope = error_envelope(err.to_string());
        match &self.remediation_prompt {
            Some(prompt) if self.prompts.contains(prompt) => envelope.with_hint(prompt),
            _ => envelope,
        }
    }
}

/// Builder for a [`Server`].
///
/// Registration errors (`DuplicateName`, `InvalidTemplate`) surface
/// synchronously from the registering call — they indicate a programming
/// mistake and are fatal to startup if unhandled.
#[derive(Default)]
pub struct ServerBuilder {
    name: Option<String>,
    version: Option<String>,
    tools: ToolRegistry,
    resources: ResourceRegistry,
    prompts: PromptRegistry,
    remediation_prompt: Option<String>,
}

impl ServerBuilder {
    /// Set server name and version.
    pub fn server_info(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self.version = Some(version.into());
        self
    }

    /// Register a tool descriptor together with its handler.
    pub fn tool(
        mut self,
        descriptor: ToolDescriptor,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<Self, DispatchError> {
        self.tools.register(descriptor, handler)?;
        Ok(self)
    }

    /// Register a resource template with its handler.
    pub fn resource(
        mut self,
        template: &str,
        handler: Arc<dyn ResourceHandler>,
    ) -> Result<Self, DispatchError> {
        self.resources.register(template, handler)?;
        Ok(self)
    }

    /// Register a named prompt producer. Producers run lazily, on render.
    pub fn prompt(
        mut self,
        name: impl Into<String>,
        producer: impl Fn() -> String + Send + Sync + 'static,
    ) -> Result<Self, DispatchError> {
        self.prompts.register(name, producer)?;
        Ok(self)
    }

    /// Name a registered prompt to attach as `errorHint` on handler-fault
    /// envelopes.
    pub fn remediation_prompt(mut self, name: impl Into<String>) -> Self {
        self.remediation_prompt = Some(name.into());
        self
    }

    /// Freeze the registries and build the server.
    pub fn build(self) -> Server {
        let server = Server {
            name: self.name.unwrap_or_else(|| "toolbus".into()),
            version: self.version.unwrap_or_else(|| "0.1.0".into()),
            tools: self.tools,
            resources: self.resources,
            prompts: self.prompts,
            remediation_prompt: self.remediation_prompt,
        };
        tracing::info!(
            server = %server.name,
            version = %server.version,
            tools = server.tools.len(),
            resources = server.resources.len(),
            prompts = server.prompts.len(),
            "server ready"
        );
        server
    }
}
