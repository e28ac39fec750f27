//! Concurrent fan-out of code generation, one request per spec item.
//!
//! Each item runs as its own task behind a counting admission gate, so at most
//! `concurrency` requests are in flight. Results land in the slot of the item's
//! index, never in completion order. The first failure closes the gate, aborts
//! the remaining tasks and waits for them to finish before it is returned.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use crate::client::{GenerationClient, GenerationError};
use crate::core::types::{SourceBundle, SpecBatch};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("code generation failed for case #{index} `{name}`")]
    Item {
        index: usize,
        name: String,
        #[source]
        source: GenerationError,
    },
    #[error("code generation task failed: {0}")]
    Task(String),
    #[error("code generation task for case #{index} was cancelled")]
    Cancelled { index: usize },
}

pub struct Dispatcher {
    client: Arc<GenerationClient>,
    concurrency: usize,
}

impl Dispatcher {
    /// `concurrency` is clamped to at least one in-flight request.
    pub fn new(client: Arc<GenerationClient>, concurrency: usize) -> Self {
        Self {
            client,
            concurrency: concurrency.max(1),
        }
    }

    /// Generate code for every item of `batch`, returned in batch order.
    #[instrument(skip_all, fields(cases = batch.items.len(), concurrency = self.concurrency))]
    pub async fn dispatch(
        &self,
        batch: &SpecBatch,
        bundle: Arc<SourceBundle>,
    ) -> Result<Vec<String>, DispatchError> {
        let total = batch.items.len();
        let gate = Arc::new(Semaphore::new(self.concurrency));
        let subject: Arc<str> = Arc::from(batch.subject.as_str());
        let mut tasks = JoinSet::new();

        for (index, item) in batch.items.iter().cloned().enumerate() {
            let gate = Arc::clone(&gate);
            let client = Arc::clone(&self.client);
            let bundle = Arc::clone(&bundle);
            let subject = Arc::clone(&subject);

            tasks.spawn(async move {
                let Ok(_permit) = gate.acquire_owned().await else {
                    return Err(DispatchError::Cancelled { index });
                };
                info!(case = index + 1, total, name = %item.name, "generating test code");
                match client
                    .generate_code(&item, &subject, &bundle.text, &bundle.package)
                    .await
                {
                    Ok(fragment) => Ok((index, fragment)),
                    Err(source) => Err(DispatchError::Item {
                        index,
                        name: item.name,
                        source,
                    }),
                }
            });
        }

        let mut slots: Vec<Option<String>> = vec![None; total];
        let mut failure: Option<DispatchError> = None;

        while let Some(joined) = tasks.join_next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(err) if err.is_cancelled() => continue,
                Err(err) => Err(DispatchError::Task(err.to_string())),
            };
            match outcome {
                Ok((index, fragment)) => {
                    debug!(case = index + 1, bytes = fragment.len(), "case generated");
                    slots[index] = Some(fragment);
                }
                Err(err) if failure.is_none() => {
                    warn!(error = %err, "aborting remaining cases");
                    gate.close();
                    tasks.abort_all();
                    failure = Some(err);
                }
                Err(err) => debug!(error = %err, "ignoring failure after abort"),
            }
        }

        if let Some(err) = failure {
            return Err(err);
        }
        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| slot.ok_or(DispatchError::Cancelled { index }))
            .collect()
    }
}
