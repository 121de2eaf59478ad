use std::sync::Arc;

use parking_lot::RwLock;
use relsh_commons::{ExecutionPolicy, PolicySource, ReleaseOptions};

/// Policy source whose flags can be changed while dispatches are in flight.
/// Each dispatch sees whatever was set last.
#[derive(Debug, Clone, Default)]
pub struct SharedPolicy {
    inner: Arc<RwLock<ExecutionPolicy>>,
}

impl SharedPolicy {
    pub fn new(policy: ExecutionPolicy) -> Self {
        Self {
            inner: Arc::new(RwLock::new(policy)),
        }
    }

    pub fn set_dry_run(&self, dry_run: bool) {
        self.inner.write().dry_run = dry_run;
    }

    pub fn set_verbose(&self, verbose: bool) {
        self.inner.write().verbose = verbose;
    }

    pub fn set_options(&self, options: ReleaseOptions) {
        self.inner.write().options = options;
    }

    pub fn replace(&self, policy: ExecutionPolicy) {
        *self.inner.write() = policy;
    }
}

impl PolicySource for SharedPolicy {
    fn snapshot(&self) -> ExecutionPolicy {
        self.inner.read().clone()
    }
}
