use crate::error::RemoteError;
use async_trait::async_trait;
use serde_json::Value;

/// Connection to the isolated context fragments execute in (a browser page, a worker).
///
/// Scripts are JavaScript function sources such as `(arg) => ...`; implementations
/// call them with `arg` inside the remote context and transfer the result back as
/// JSON. Promises are awaited before the result is transferred.
#[async_trait]
pub trait RemoteAdapter: Send + Sync {
    /// Run `script(arg)` remotely and return its result
    async fn evaluate(&self, script: &str, arg: Value) -> Result<Value, RemoteError>;

    /// Resolve once `predicate(arg)` is truthy in the remote context.
    ///
    /// Implementations poll without a deadline of their own; the runner bounds
    /// every call with a timeout.
    async fn wait_for_function(&self, predicate: &str, arg: Value) -> Result<(), RemoteError>;

    /// Navigate the remote context back to its initial state
    async fn reload(&self) -> Result<(), RemoteError>;
}

#[async_trait]
impl<T: RemoteAdapter + ?Sized> RemoteAdapter for std::sync::Arc<T> {
    async fn evaluate(&self, script: &str, arg: Value) -> Result<Value, RemoteError> {
        (**self).evaluate(script, arg).await
    }

    async fn wait_for_function(&self, predicate: &str, arg: Value) -> Result<(), RemoteError> {
        (**self).wait_for_function(predicate, arg).await
    }

    async fn reload(&self) -> Result<(), RemoteError> {
        (**self).reload().await
    }
}
