//! Execution policy shared between the configuration loader and the
//! dispatcher.
//!
//! The dispatcher never caches a policy: it asks its [`PolicySource`] for a
//! fresh [`ExecutionPolicy`] on every call, so a flag flipped between two
//! dispatches applies to the second one.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Free-form release options. Only `publish_path` is interpreted by the
/// harness; every other key is carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReleaseOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_path: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ReleaseOptions {
    pub fn with_publish_path(mut self, path: impl Into<String>) -> Self {
        self.publish_path = Some(path.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}

/// Read-only snapshot of the execution policy taken at call time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionPolicy {
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub options: ReleaseOptions,
}

impl ExecutionPolicy {
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            ..Self::default()
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_options(mut self, options: ReleaseOptions) -> Self {
        self.options = options;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn options(&self) -> &ReleaseOptions {
        &self.options
    }
}

/// Supplies the policy in effect for the next dispatch.
pub trait PolicySource: Send + Sync {
    fn snapshot(&self) -> ExecutionPolicy;
}

impl<T: PolicySource + ?Sized> PolicySource for Arc<T> {
    fn snapshot(&self) -> ExecutionPolicy {
        (**self).snapshot()
    }
}

/// Policy source that always returns the same snapshot.
#[derive(Debug, Clone, Default)]
pub struct StaticPolicy(ExecutionPolicy);

impl StaticPolicy {
    pub fn new(policy: ExecutionPolicy) -> Self {
        Self(policy)
    }
}

impl From<ExecutionPolicy> for StaticPolicy {
    fn from(policy: ExecutionPolicy) -> Self {
        Self::new(policy)
    }
}

impl PolicySource for StaticPolicy {
    fn snapshot(&self) -> ExecutionPolicy {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn options_keep_unknown_keys() -> anyhow::Result<()> {
        let options: ReleaseOptions = serde_json::from_value(json!({
            "publish_path": "build/out",
            "tag": "next",
        }))?;

        assert_eq!(options.publish_path.as_deref(), Some("build/out"));
        assert_eq!(options.get("tag"), Some(&json!("next")));
        Ok(())
    }

    #[test]
    fn static_policy_returns_snapshot() {
        let source = StaticPolicy::new(ExecutionPolicy::dry_run().with_verbose(true));
        let snapshot = source.snapshot();
        assert!(snapshot.is_dry_run());
        assert!(snapshot.is_verbose());
    }

    #[test]
    fn arc_sources_delegate() {
        let source: Arc<dyn PolicySource> = Arc::new(StaticPolicy::default());
        assert_eq!(source.snapshot(), ExecutionPolicy::default());
    }
}
