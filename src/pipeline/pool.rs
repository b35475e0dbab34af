//! Bounded task pool shared by every pipeline stage.
//!
//! One Tokio task is spawned per item, gated by a semaphore with `workers`
//! permits. Outputs are collected in completion order. A task that panics is
//! logged and counted; its siblings keep running.

use std::future::Future;
use std::sync::Arc;

use indicatif::ProgressBar;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;

use super::PipelineError;

/// Everything a drained pool produced.
#[derive(Debug)]
pub(crate) struct PoolRun<T> {
    pub outputs: Vec<T>,
    pub panicked: usize,
}

/// Runs `task` over every item with at most `workers` in flight.
///
/// `task` receives the dispatch index of the item, which callers use to tag
/// the per-task error buffer. The progress bar advances once per finished
/// task, including panicked ones.
pub(crate) async fn run_bounded<I, T, F, Fut>(
    stage: &'static str,
    items: Vec<I>,
    workers: usize,
    progress: &ProgressBar,
    task: F,
) -> Result<PoolRun<T>, PipelineError>
where
    I: Send + 'static,
    T: Send + 'static,
    F: Fn(usize, I) -> Fut,
    Fut: Future<Output = T> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(workers));
    let mut join_set = JoinSet::new();
    let mut run = PoolRun {
        outputs: Vec::with_capacity(items.len()),
        panicked: 0,
    };

    for (index, item) in items.into_iter().enumerate() {
        // Drain finished tasks while waiting so outputs do not pile up.
        let permit = loop {
            tokio::select! {
                permit = Arc::clone(&semaphore).acquire_owned() => {
                    break permit.map_err(|_| PipelineError::SemaphoreClosed)?;
                }
                Some(joined) = join_set.join_next() => {
                    collect(stage, joined, &mut run, progress);
                }
            }
        };

        let future = task(index, item);
        join_set.spawn(async move {
            let output = future.await;
            drop(permit);
            output
        });
    }

    while let Some(joined) = join_set.join_next().await {
        collect(stage, joined, &mut run, progress);
    }

    Ok(run)
}

fn collect<T>(
    stage: &'static str,
    joined: Result<T, tokio::task::JoinError>,
    run: &mut PoolRun<T>,
    progress: &ProgressBar,
) {
    match joined {
        Ok(output) => run.outputs.push(output),
        Err(error) => {
            warn!(stage, error = %error, "pool task did not complete");
            run.panicked += 1;
        }
    }
    progress.inc(1);
}
