//! builder::queue
//!
//! The operation queue: one channel, one driver task, strict FIFO.
//!
//! Every mutating builder call sends one [`Op`]; the driver applies them
//! in arrival order against the single-writer [`BuilderState`], so an
//! operation starts only after the previous one finished. The first
//! failure becomes the queue's sticky terminal state: later operations
//! are skipped, and every flush probe observes a clone of that error.

use tokio::sync::{mpsc, oneshot};

use crate::content::FileContent;

use super::state::BuilderState;
use super::BuildError;

/// One queued unit of work.
#[derive(Debug)]
pub(crate) enum Op {
    SelectBranch {
        name: String,
    },
    Stage {
        path: String,
        content: FileContent,
    },
    Commit {
        message: String,
    },
    Push {
        ref_name: Option<String>,
    },
    /// Completion probe: reports `Ok` or the first failure once every
    /// previously queued op has settled.
    Flush {
        done: oneshot::Sender<Result<(), BuildError>>,
    },
}

/// Drive queued operations to completion.
///
/// Runs until every sender is dropped. Short-circuits after the first
/// failure: remaining mutating ops are skipped because they depend on
/// partially built state.
pub(crate) async fn drive(mut state: BuilderState, mut ops: mpsc::UnboundedReceiver<Op>) {
    let mut failure: Option<BuildError> = None;

    while let Some(op) = ops.recv().await {
        let result = match op {
            Op::Flush { done } => {
                let settled = match &failure {
                    Some(err) => Err(err.clone()),
                    None => Ok(()),
                };
                let _ = done.send(settled);
                continue;
            }
            _ if failure.is_some() => {
                tracing::debug!(?op, "skipping queued operation after earlier failure");
                continue;
            }
            Op::SelectBranch { name } => state.select_branch(name).await,
            Op::Stage { path, content } => {
                state.stage(path, content);
                Ok(())
            }
            Op::Commit { message } => state.commit(&message).await,
            Op::Push { ref_name } => state.push(ref_name.as_deref()).await,
        };

        if let Err(err) = result {
            tracing::debug!(error = %err, "queued operation failed; short-circuiting");
            failure = Some(err);
        }
    }
}
