use std::fmt;
use std::future::Future;

use anyhow::Result;
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;

use crate::executor::{Builtin, CommandOutput, ProcessCapability};

type BoxedCall = Box<dyn FnOnce(Vec<String>) -> BoxFuture<'static, Result<Value>> + Send>;

/// A caller-provided function the dispatcher invokes in place of a process.
pub struct DirectCall {
    label: String,
    call: BoxedCall,
}

impl DirectCall {
    /// Wrap an async function. `label` is what gets logged as the command.
    pub fn new<F, Fut>(label: impl Into<String>, call: F) -> Self
    where
        F: FnOnce(Vec<String>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        Self {
            label: label.into(),
            call: Box::new(move |args| call(args).boxed()),
        }
    }

    /// Wrap a synchronous function. It runs when the dispatcher initiates the
    /// call; its error is still delivered through the returned future.
    pub fn from_fn<F>(label: impl Into<String>, call: F) -> Self
    where
        F: FnOnce(Vec<String>) -> Result<Value> + Send + 'static,
    {
        Self {
            label: label.into(),
            call: Box::new(move |args| {
                let result = call(args);
                futures::future::ready(result).boxed()
            }),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn invoke(self, args: Vec<String>) -> BoxFuture<'static, Result<Value>> {
        (self.call)(args)
    }
}

impl fmt::Debug for DirectCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectCall")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// How the dispatcher carries out an [`Operation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    Builtin,
    GenericExecute,
    DirectCall,
}

/// A single request to the dispatcher.
#[derive(Debug)]
pub enum Operation {
    /// A built-in implemented by the process capability.
    Builtin { builtin: Builtin, args: Vec<String> },
    /// Words joined with spaces and run as one command line.
    CommandLine { words: Vec<String> },
    /// A function invoked with the arguments.
    Direct { call: DirectCall, args: Vec<String> },
}

impl Operation {
    /// Resolve `name` the way the dispatcher does for string operations:
    /// an exact built-in name of `capability` becomes [`Operation::Builtin`],
    /// anything else is executed as the full joined command line.
    pub fn resolve<C, I, S>(name: &str, args: I, capability: &C) -> Self
    where
        C: ProcessCapability + ?Sized,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        match capability.lookup_builtin(name) {
            Some(builtin) => Self::Builtin { builtin, args },
            None => {
                let words = std::iter::once(name.to_owned()).chain(args).collect();
                Self::CommandLine { words }
            }
        }
    }

    pub fn builtin<I, S>(builtin: Builtin, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Builtin {
            builtin,
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn command_line<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::CommandLine {
            words: words.into_iter().map(Into::into).collect(),
        }
    }

    pub fn direct<I, S>(call: DirectCall, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Direct {
            call,
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn strategy(&self) -> Strategy {
        match self {
            Self::Builtin { .. } => Strategy::Builtin,
            Self::CommandLine { .. } => Strategy::GenericExecute,
            Self::Direct { .. } => Strategy::DirectCall,
        }
    }

    /// Operation name and arguments joined with single spaces.
    pub fn display_line(&self) -> String {
        let (head, args): (&str, &[String]) = match self {
            Self::Builtin { builtin, args } => (builtin.as_str(), args),
            Self::CommandLine { words } => return words.join(" "),
            Self::Direct { call, args } => (call.label(), args),
        };
        std::iter::once(head)
            .chain(args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_line())
    }
}

/// Successful result of a dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Generic execution that exited with code 0.
    Executed(CommandOutput),
    /// Return value of a built-in or direct call.
    Value(Value),
    /// Dry-run stand-in; nothing ran.
    DryRun,
}

impl Outcome {
    pub fn is_dry_run(&self) -> bool {
        matches!(self, Self::DryRun)
    }

    pub fn output(&self) -> Option<&CommandOutput> {
        match self {
            Self::Executed(output) => Some(output),
            Self::Value(_) | Self::DryRun => None,
        }
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Executed(_) | Self::DryRun => None,
        }
    }
}
