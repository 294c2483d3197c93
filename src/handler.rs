use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::template::Captures;
use crate::types::DispatchError;

/// Handler trait for tools. Implement this or use [`FnToolHandler`].
///
/// A handler receives the validated, defaulted argument object and
/// asynchronously produces a result value or fails. Any resource it
/// shares across calls (a connection pool, a file handle) is its own
/// responsibility to guard; the dispatcher imposes no serialization
/// between concurrent invocations.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, args: Value) -> Result<Value, DispatchError>;
}

/// Handler trait for resources. Invoked with the named segments captured
/// during template matching as its only arguments.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    async fn call(&self, captures: Captures) -> Result<Value, DispatchError>;
}

/// Wraps an async closure into a [`ToolHandler`].
pub struct FnToolHandler<F> {
    f: F,
}

impl<F, Fut> FnToolHandler<F>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<Value, DispatchError>> + Send + 'static,
{
    pub fn new(f: F) -> Arc<dyn ToolHandler> {
        Arc::new(Self { f })
    }
}

#[async_trait]
impl<F, Fut> ToolHandler for FnToolHandler<F>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<Value, DispatchError>> + Send + 'static,
{
    async fn call(&self, args: Value) -> Result<Value, DispatchError> {
        (self.f)(args).await
    }
}

/// Wraps an async closure into a [`ResourceHandler`].
pub struct FnResourceHandler<F> {
    f: F,
}

impl<F, Fut> FnResourceHandler<F>
where
    F: Fn(Captures) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<Value, DispatchError>> + Send + 'static,
{
    pub fn new(f: F) -> Arc<dyn ResourceHandler> {
        Arc::new(Self { f })
    }
}

#[async_trait]
impl<F, Fut> ResourceHandler for FnResourceHandler<F>
where
    F: Fn(Captures) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<Value, DispatchError>> + Send + 'static,
{
    async fn call(&self, captures: Captures) -> Result<Value, DispatchError> {
        (self.f)(captures).await
    }
}
