//! Batching in front of the engine client.
//!
//! Callers enqueue slots and get a future back; nothing is sent until
//! [`BatchQueue::flush`]. A flush sends one translate and one rescore call
//! concurrently and completes every waiter, or fails every waiter with the
//! same error when either call fails.

use std::mem;
use std::sync::{Arc, Mutex, PoisonError};

use futures::channel::oneshot;
use futures::future::{self, BoxFuture, FutureExt};
use tracing::instrument;

use crate::core::conversion_map::Language;
use crate::core::engine::{CodeEngineClient, RescoringAlternative, TranslationAlternative};
use crate::core::error::{EngineError, VoxError};
use crate::core::input::SlotContext;

type Waiter<T> = oneshot::Sender<Result<T, VoxError>>;

#[derive(Default)]
struct Pending {
    translate: Vec<(SlotContext, Waiter<Vec<TranslationAlternative>>)>,
    rescore: Vec<(SlotContext, Waiter<Option<RescoringAlternative>>)>,
}

impl Pending {
    fn is_empty(&self) -> bool {
        self.translate.is_empty() && self.rescore.is_empty()
    }
}

pub struct BatchQueue {
    client: Arc<CodeEngineClient>,
    language: Language,
    pending: Mutex<Pending>,
}

fn receive<T: Send + 'static>(receiver: oneshot::Receiver<Result<T, VoxError>>) -> BoxFuture<'static, Result<T, VoxError>> {
    receiver
        .map(|received| received.unwrap_or(Err(VoxError::Engine(EngineError::Dropped))))
        .boxed()
}

impl BatchQueue {
    pub fn new(client: Arc<CodeEngineClient>, language: Language) -> Self {
        BatchQueue {
            client,
            language,
            pending: Mutex::new(Pending::default()),
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Alternatives for `context`, available after the next flush.
    pub fn translate(&self, context: SlotContext) -> BoxFuture<'static, Result<Vec<TranslationAlternative>, VoxError>> {
        let (sender, receiver) = oneshot::channel();
        self.lock().translate.push((context, sender));
        receive(receiver)
    }

    /// Rescoring for `context`; `None` when the service returned fewer
    /// results than requested.
    pub fn rescore(&self, context: SlotContext) -> BoxFuture<'static, Result<Option<RescoringAlternative>, VoxError>> {
        let (sender, receiver) = oneshot::channel();
        self.lock().rescore.push((context, sender));
        receive(receiver)
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Send everything queued, including requests queued while a batch is in
    /// flight.
    #[instrument(level = "debug", skip_all, fields(language = %self.language))]
    pub async fn flush(&self) {
        loop {
            let batch = mem::take(&mut *self.lock());
            if batch.is_empty() {
                return;
            }
            self.send(batch).await;
        }
    }

    async fn send(&self, batch: Pending) {
        let (translate_contexts, translate_waiters): (Vec<_>, Vec<_>) = batch.translate.into_iter().unzip();
        let (rescore_contexts, rescore_waiters): (Vec<_>, Vec<_>) = batch.rescore.into_iter().unzip();
        tracing::debug!(
            translate = translate_contexts.len(),
            rescore = rescore_contexts.len(),
            "flushing batch"
        );

        let (translated, rescored) = future::join(
            self.client.translate(self.language, &translate_contexts),
            self.client.rescore(self.language, &rescore_contexts),
        )
        .await;

        match (translated, rescored) {
            (Ok(translated), Ok(rescored)) => {
                let got = translated.len();
                let mut translated = translated.into_iter();
                for waiter in translate_waiters {
                    let result = translated.next().ok_or_else(|| {
                        VoxError::from(EngineError::MismatchedBatch {
                            expected: translate_contexts.len(),
                            got,
                        })
                    });
                    let _ = waiter.send(result);
                }
                let mut rescored = rescored.into_iter();
                for waiter in rescore_waiters {
                    let _ = waiter.send(Ok(rescored.next()));
                }
            }
            (Err(error), _) | (_, Err(error)) => {
                tracing::warn!(%error, "batch failed");
                for waiter in translate_waiters {
                    let _ = waiter.send(Err(error.clone()));
                }
                for waiter in rescore_waiters {
                    let _ = waiter.send(Err(error.clone()));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::testing::ScriptedTransport;
    use crate::core::engine::EngineOptions;
    use futures::executor::block_on;
    use std::collections::HashMap;

    fn queue(transport: Arc<ScriptedTransport>) -> BatchQueue {
        let client = CodeEngineClient::new(transport, HashMap::new(), EngineOptions::default());
        BatchQueue::new(Arc::new(client), Language::JavaScript)
    }

    #[test]
    fn test_flush_sends_one_request_per_kind() {
        let transport = Arc::new(ScriptedTransport {
            alternatives: vec![vec![("a".into(), -1.0)], vec![("b".into(), -2.0)]],
            rescores: vec![-3.0, -4.0],
            ..ScriptedTransport::default()
        });
        let queue = queue(transport.clone());
        let first = queue.translate(SlotContext::new("", "a", 0));
        let second = queue.translate(SlotContext::new("", "b", 0));
        let rescored = queue.rescore(SlotContext::new("", "a", 0));
        assert!(!queue.is_empty());

        block_on(queue.flush());
        assert!(queue.is_empty());

        assert_eq!(block_on(first).unwrap()[0].sentence, "a");
        assert_eq!(block_on(second).unwrap()[0].sentence, "b");
        assert_eq!(block_on(rescored).unwrap().unwrap().score, -3.0);
        assert_eq!(transport.translated.lock().unwrap().len(), 1);
        assert_eq!(transport.rescored.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_failure_reaches_every_waiter() {
        let transport = Arc::new(ScriptedTransport {
            fail: true,
            ..ScriptedTransport::default()
        });
        let queue = queue(transport);
        let translated = queue.translate(SlotContext::new("", "a", 0));
        let rescored = queue.rescore(SlotContext::new("", "a", 0));
        block_on(queue.flush());

        let expected = VoxError::Engine(EngineError::Transport("connection refused".into()));
        assert_eq!(block_on(translated).unwrap_err(), expected);
        assert_eq!(block_on(rescored).unwrap_err(), expected);
    }

    #[test]
    fn test_dropped_queue_fails_waiters() {
        let transport = Arc::new(ScriptedTransport::default());
        let translated = {
            let queue = queue(transport);
            queue.translate(SlotContext::new("", "a", 0))
        };
        assert_eq!(
            block_on(translated).unwrap_err(),
            VoxError::Engine(EngineError::Dropped)
        );
    }

    #[test]
    fn test_empty_flush_sends_nothing() {
        let transport = Arc::new(ScriptedTransport::default());
        let queue = queue(transport.clone());
        block_on(queue.flush());
        assert!(transport.translated.lock().unwrap().is_empty());
    }
}
