/// Where the client currently is and how to move it elsewhere.
pub trait Navigator: Send + Sync {
    /// Current location, or `None` when there is nothing addressable.
    fn location(&self) -> Option<String>;
    fn assign(&self, url: &str);
}

/// No addressable location; navigation is a no-op.
#[derive(Debug, Default, Clone, Copy)]
pub struct Headless;

impl Navigator for Headless {
    fn location(&self) -> Option<String> {
        None
    }

    fn assign(&self, url: &str) {
        tracing::debug!(url, "headless client; navigation skipped");
    }
}
