use async_trait::async_trait;

/// Fire-and-forget error reporting sink.
#[async_trait]
pub trait ErrorLogPort: Send + Sync {
    /// `location` is the component path, `operation` the failed workflow.
    async fn log_error(&self, location: &str, operation: &str, cause: &str);
}
