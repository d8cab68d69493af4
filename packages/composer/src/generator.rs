//! Batch generation of computed views on worker threads
//!
//! Jobs are split into one contiguous slice per worker. A worker handles its
//! slice [`CHUNK_SIZE`] jobs at a time. All workers share one [`PathCache`].

use crate::catalog::ComposeJob;
use crate::computed::ComputedView;
use crate::error::ComposeError;
use crate::guards::GuardContext;
use crate::path::{PathCache, ViewIdentity};
use std::sync::Arc;
use std::thread;
use tracing::{debug, info};

pub const CHUNK_SIZE: usize = 20;

/// Outcome for one job
#[derive(Debug)]
pub struct GeneratedView {
    pub identity: ViewIdentity,
    /// `Ok(None)` when the job had no extensions
    pub result: Result<Option<ComputedView>, ComposeError>,
    /// Number of skipped blocks or directives
    pub skipped: usize,
}

/// One worker per [`CHUNK_SIZE`] jobs, at least one, at most `max_workers`
pub fn worker_count(jobs: usize, max_workers: usize) -> usize {
    (jobs / CHUNK_SIZE).max(1).min(max_workers.max(1))
}

/// Generate computed views for every job, results in job order
pub fn generate_all(
    jobs: &[ComposeJob],
    guards: &dyn GuardContext,
    cache: &Arc<PathCache>,
    max_workers: usize,
) -> Vec<GeneratedView> {
    if jobs.is_empty() {
        return Vec::new();
    }

    let workers = worker_count(jobs.len(), max_workers);
    let per_worker = jobs.len() / workers + 1;
    info!(jobs = jobs.len(), workers, "Generating computed views");

    thread::scope(|scope| {
        let handles: Vec<_> = jobs
            .chunks(per_worker)
            .enumerate()
            .map(|(worker, slice)| {
                let cache = Arc::clone(cache);
                scope.spawn(move || {
                    let mut results = Vec::with_capacity(slice.len());
                    for chunk in slice.chunks(CHUNK_SIZE) {
                        debug!(worker, size = chunk.len(), "Processing chunk");
                        results.extend(chunk.iter().map(|job| generate_one(job, guards, &cache)));
                    }
                    results
                })
            })
            .collect();

        handles
            .into_iter()
            .flat_map(|handle| match handle.join() {
                Ok(results) => results,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    })
}

fn generate_one(job: &ComposeJob, guards: &dyn GuardContext, cache: &Arc<PathCache>) -> GeneratedView {
    let generated = ComputedView::generate(&job.base, &job.extensions, guards, Arc::clone(cache));
    let (result, skipped) = match generated {
        Ok(Some((view, composition))) => (Ok(Some(view)), composition.diagnostics.len()),
        Ok(None) => (Ok(None), 0),
        Err(err) => (Err(err), 0),
    };
    GeneratedView {
        identity: job.identity(),
        result,
        skipped,
    }
}
