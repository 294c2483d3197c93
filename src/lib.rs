//! `toolbus` — a tool, resource, and prompt registry with an async
//! dispatch core for agent-facing servers.
//!
//! Register named tools (typed argument schemas + async handlers),
//! resource URI templates (`db://{database}/{table}`), and prompt
//! producers once at startup, then dispatch invocations against the
//! frozen registries from any transport. Every dispatch outcome is
//! normalized into a single [`Envelope`] shape — callers never see a raw
//! fault.
//!
//! # Quick start
//!
//! ```rust
//! use serde_json::{json, Value};
//! use toolbus::{FnToolHandler, ParamSpec, Server, ToolDescriptor};
//!
//! # async fn example() -> Result<(), toolbus::DispatchError> {
//! let server = Server::builder()
//!     .server_info("demo", "0.1.0")
//!     .tool(
//!         ToolDescriptor::new(
//!             "echo",
//!             "Echo back the input message",
//!             vec![ParamSpec::string("message").required()],
//!         ),
//!         FnToolHandler::new(|args: Value| async move {
//!             let message = args["message"].as_str().unwrap_or_default();
//!             Ok(json!(format!("Echo: {message}")))
//!         }),
//!     )?
//!     .build();
//!
//! let envelope = server.invoke_tool("echo", json!({"message": "hi"})).await;
//! assert!(envelope.success);
//! assert_eq!(envelope.data, Some(json!("Echo: hi")));
//! # Ok(())
//! # }
//! ```

pub mod handler;
pub mod loader;
pub mod registry;
pub mod server;
pub mod template;
pub mod transport_http;
pub mod types;
mod validate;

// Re-export the most commonly used items at the crate root.
pub use handler::{FnResourceHandler, FnToolHandler, ResourceHandler, ToolHandler};
pub use loader::{load_tools, parse_tools};
pub use registry::{
    PromptProducer, PromptRegistry, ResourceBinding, ResourceRegistry, ToolBinding, ToolRegistry,
};
pub use server::{Server, ServerBuilder};
pub use template::{Captures, ResourceTemplate};
pub use transport_http::http_router;
pub use types::{
    error_envelope, ok_envelope, DispatchError, EntryKind, Envelope, ParamKind, ParamSpec,
    ToolDescriptor,
};
