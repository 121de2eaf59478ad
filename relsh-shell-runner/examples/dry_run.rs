use std::sync::Arc;

use anyhow::Result;
use relsh_commons::{ExecutionPolicy, StaticPolicy};
use relsh_shell_runner::{Dispatcher, Operation, RecordingProcess, Sequence};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let process = RecordingProcess::new();
    let dispatcher = Dispatcher::new(
        Arc::new(process.clone()),
        Arc::new(StaticPolicy::new(ExecutionPolicy::default().with_verbose(true))),
    );

    Sequence::new()
        .then(dispatcher.resolve("rm", ["-rf", "dist"]))
        .then(dispatcher.resolve("mkdir", ["-p", "dist"]))
        .then(Operation::command_line(["npm", "run", "build"]))
        .run(&dispatcher)
        .await?;

    for call in process.calls() {
        println!("{}", call.line);
    }

    Ok(())
}
