//! Policy-aware dispatch of [`Operation`]s.
//!
//! Every call follows the same steps: log the command line, short-circuit
//! under dry-run, otherwise silence the capability according to the
//! verbosity policy while the operation is initiated, restore the previous
//! silence value, then await the initiated work.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use relsh_commons::{ExecutionLog, ExecutionPolicy, PolicySource, TracingLog};

use crate::error::DispatchError;
use crate::executor::ProcessCapability;
use crate::operation::{Operation, Outcome};

/// Sets the capability's silence flag and puts the previous value back when
/// dropped, including on early returns.
struct SilenceGuard<'a> {
    capability: &'a dyn ProcessCapability,
    previous: bool,
}

impl<'a> SilenceGuard<'a> {
    fn engage(capability: &'a dyn ProcessCapability, silent: bool) -> Self {
        let previous = capability.is_silent();
        capability.set_silent(silent);
        Self {
            capability,
            previous,
        }
    }
}

impl Drop for SilenceGuard<'_> {
    fn drop(&mut self) {
        self.capability.set_silent(self.previous);
    }
}

#[derive(Clone)]
pub struct Dispatcher {
    capability: Arc<dyn ProcessCapability>,
    policy: Arc<dyn PolicySource>,
    log: Arc<dyn ExecutionLog>,
}

impl Dispatcher {
    pub fn new(capability: Arc<dyn ProcessCapability>, policy: Arc<dyn PolicySource>) -> Self {
        Self {
            capability,
            policy,
            log: Arc::new(TracingLog),
        }
    }

    pub fn with_log(mut self, log: Arc<dyn ExecutionLog>) -> Self {
        self.log = log;
        self
    }

    pub fn capability(&self) -> &Arc<dyn ProcessCapability> {
        &self.capability
    }

    pub fn log(&self) -> &Arc<dyn ExecutionLog> {
        &self.log
    }

    /// Policy in effect right now.
    pub fn policy(&self) -> ExecutionPolicy {
        self.policy.snapshot()
    }

    /// Resolve a name and its arguments against this dispatcher's capability.
    pub fn resolve<I, S>(&self, name: &str, args: I) -> Operation
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Operation::resolve(name, args, self.capability.as_ref())
    }

    /// Resolve `name` and run it.
    pub async fn run_words<I, S>(&self, name: &str, args: I) -> Result<Outcome, DispatchError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let operation = self.resolve(name, args);
        self.run(operation).await
    }

    /// Run `operation` under the policy the source reports for this call.
    pub async fn run(&self, operation: Operation) -> Result<Outcome, DispatchError> {
        let policy = self.policy.snapshot();
        self.run_with(&policy, operation).await
    }

    /// Run `operation` under an explicit policy.
    pub async fn run_with(
        &self,
        policy: &ExecutionPolicy,
        operation: Operation,
    ) -> Result<Outcome, DispatchError> {
        self.log.execution(&operation.display_line());

        if policy.is_dry_run() {
            return Ok(Outcome::DryRun);
        }

        let pending = {
            let _silence = SilenceGuard::engage(self.capability.as_ref(), !policy.is_verbose());
            self.initiate(operation)
        };
        pending.await
    }

    fn initiate(&self, operation: Operation) -> BoxFuture<'static, Result<Outcome, DispatchError>> {
        let label = operation.display_line();
        match operation {
            Operation::Builtin { builtin, args } => {
                let pending = self.capability.builtin(builtin, &args);
                async move {
                    pending
                        .await
                        .map(Outcome::Value)
                        .map_err(|source| DispatchError::capability(label, source))
                }
                .boxed()
            }
            Operation::CommandLine { words } => {
                let pending = self.capability.exec(&words.join(" "));
                async move {
                    let output = pending
                        .await
                        .map_err(|source| DispatchError::capability(label, source))?;
                    if output.is_success() {
                        Ok(Outcome::Executed(output))
                    } else {
                        Err(DispatchError::Execution {
                            output: output.output,
                            code: output.code,
                        })
                    }
                }
                .boxed()
            }
            Operation::Direct { call, args } => {
                let pending = call.invoke(args);
                async move {
                    pending
                        .await
                        .map(Outcome::Value)
                        .map_err(|source| DispatchError::capability(label, source))
                }
                .boxed()
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("policy", &self.policy.snapshot())
            .finish_non_exhaustive()
    }
}
