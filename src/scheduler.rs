//! Shards the proxy pool and runs one sequential worker per shard.

use crate::error::RunError;
use crate::executor::RequestExecutor;
use crate::{ProxyDescriptor, RequestOutcome, WorkerShard};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Split `proxies` into contiguous shards and work out how many may run at
/// once.
///
/// `chunk = max(1, len / requested_workers)`. Shards are taken in steps of
/// `chunk`, so only the final shard can differ in size. The concurrency
/// bound is `min(requested_workers, shards.len())`.
pub fn schedule(proxies: &[ProxyDescriptor], requested_workers: usize) -> (Vec<WorkerShard>, usize) {
    let requested_workers = requested_workers.max(1);
    let chunk_size = (proxies.len() / requested_workers).max(1);

    let shards: Vec<WorkerShard> = proxies
        .chunks(chunk_size)
        .enumerate()
        .map(|(id, chunk)| WorkerShard {
            id,
            proxies: chunk.to_vec(),
        })
        .collect();

    let actual_workers = requested_workers.min(shards.len());
    (shards, actual_workers)
}

/// Per-worker RNG. Seeded runs give worker `i` the seed `seed + i`.
pub fn worker_rng(seed: Option<u64>, worker_id: usize) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(worker_id as u64)),
        None => StdRng::from_entropy(),
    }
}

pub struct WorkerScheduler {
    executor: Arc<RequestExecutor>,
    seed: Option<u64>,
}

impl WorkerScheduler {
    pub fn new(executor: Arc<RequestExecutor>) -> Self {
        Self { executor, seed: None }
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Dispatch every proxy against `target_url`.
    ///
    /// Returns one outcome list per shard, in shard order. Within a shard the
    /// outcomes follow the shard's proxy order. Dropping the returned future
    /// aborts every worker still in flight.
    pub async fn run(
        &self,
        target_url: &str,
        proxies: &[ProxyDescriptor],
        requested_workers: usize,
    ) -> Result<Vec<Vec<RequestOutcome>>, RunError> {
        if proxies.is_empty() {
            return Err(RunError::EmptyPool);
        }

        let (shards, actual_workers) = schedule(proxies, requested_workers);
        info!(
            "Dispatching {} proxies across {} shards ({} concurrent workers)",
            proxies.len(),
            shards.len(),
            actual_workers
        );

        let target: Arc<str> = Arc::from(target_url);
        let limit = Arc::new(Semaphore::new(actual_workers));
        let mut slots: Vec<Vec<RequestOutcome>> = vec![Vec::new(); shards.len()];
        let mut workers = JoinSet::new();

        for shard in shards {
            let permit = Arc::clone(&limit)
                .acquire_owned()
                .await
                .map_err(|_| RunError::PoolClosed)?;
            let executor = Arc::clone(&self.executor);
            let target = Arc::clone(&target);
            let mut rng = worker_rng(self.seed, shard.id);

            workers.spawn(async move {
                let _permit = permit;
                debug!("[Worker-{}] starting with {} proxies", shard.id, shard.proxies.len());

                let mut outcomes = Vec::with_capacity(shard.proxies.len());
                for proxy in &shard.proxies {
                    outcomes.push(executor.execute(&target, proxy, &mut rng).await);
                }

                debug!("[Worker-{}] finished", shard.id);
                (shard.id, outcomes)
            });
        }

        while let Some(joined) = workers.join_next().await {
            let (id, outcomes) = joined?;
            slots[id] = outcomes;
        }

        Ok(slots)
    }
}
