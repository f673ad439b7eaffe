//! Bounded concurrent execution of message validators.
//!
//! Subscriptions may attach a validator predicate that gates delivery.
//! Validators are application code and may be arbitrarily slow, so they
//! run outside the router loop under a process-wide concurrency cap.
//! When the cap is saturated the pool rejects synchronously and the
//! message is dropped; queuing would let slow validators build unbounded
//! backlog behind the loop.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, trace};

use crate::floodsub::{Message, RouterEvent};
use crate::identity::PeerId;

/// An application-supplied predicate gating delivery on one subscription.
///
/// Invoked with a clone of the candidate message; resolves to `true` to
/// accept. A validator that has not resolved by its deadline is
/// cancelled (the future is dropped) and counts as a rejection.
pub type ValidatorFn =
    Arc<dyn Fn(Message) -> Pin<Box<dyn Future<Output = bool> + Send>> + Send + Sync>;

/// Capped dispatcher for validator invocations.
pub(crate) struct ValidatorPool {
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl ValidatorPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Number of validator invocations currently in flight.
    #[cfg(test)]
    pub fn in_flight(&self) -> usize {
        self.capacity - self.permits.available_permits()
    }

    /// Dispatch `message` to `validators`, all running concurrently.
    ///
    /// Returns `false` without side effects when admitting every
    /// validator would exceed the cap — the caller must drop the
    /// message. Otherwise the aggregate verdict (every validator
    /// returned `true` within its deadline) is posted to `events` as
    /// [`RouterEvent::Validated`].
    pub fn try_run(
        &self,
        source: Option<PeerId>,
        message: Message,
        validators: Vec<(ValidatorFn, Duration)>,
        events: mpsc::Sender<RouterEvent>,
    ) -> bool {
        debug_assert!(!validators.is_empty());
        let wanted = validators.len() as u32;
        let permits = match self.permits.clone().try_acquire_many_owned(wanted) {
            Ok(permits) => permits,
            Err(_) => {
                debug!(
                    origin = ?message.from,
                    validators = validators.len(),
                    capacity = self.capacity,
                    "validator capacity exhausted, dropping message"
                );
                return false;
            }
        };

        tokio::spawn(async move {
            let mut tasks = JoinSet::new();
            for (validator, deadline) in validators {
                let msg = message.clone();
                tasks.spawn(async move {
                    tokio::time::timeout(deadline, validator(msg))
                        .await
                        .unwrap_or(false)
                });
            }

            let mut accepted = true;
            while let Some(verdict) = tasks.join_next().await {
                // A panicked validator rejects, same as a timeout.
                if !verdict.unwrap_or(false) {
                    accepted = false;
                }
            }
            drop(permits);

            trace!(origin = ?message.from, accepted, "validation complete");
            let _ = events
                .send(RouterEvent::Validated {
                    source,
                    message,
                    accepted,
                })
                .await;
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(seqno: u64) -> Message {
        Message {
            from: PeerId::from_bytes([9u8; 32]),
            seqno: seqno.to_be_bytes().to_vec(),
            data: b"payload".to_vec(),
            topics: vec!["t".to_string()],
        }
    }

    fn accepting() -> ValidatorFn {
        Arc::new(|_msg| Box::pin(async { true }))
    }

    fn rejecting() -> ValidatorFn {
        Arc::new(|_msg| Box::pin(async { false }))
    }

    async fn expect_validated(rx: &mut mpsc::Receiver<RouterEvent>) -> bool {
        match tokio::time::timeout(Duration::from_secs(5), rx.recv()).await {
            Ok(Some(RouterEvent::Validated { accepted, .. })) => accepted,
            other => panic!("expected validation result, got {:?}", other.is_ok()),
        }
    }

    #[tokio::test]
    async fn single_validator_accepts() {
        let pool = ValidatorPool::new(10);
        let (tx, mut rx) = mpsc::channel(8);
        assert!(pool.try_run(
            None,
            message(1),
            vec![(accepting(), Duration::from_millis(150))],
            tx,
        ));
        assert!(expect_validated(&mut rx).await);
    }

    #[tokio::test]
    async fn any_rejection_rejects_the_message() {
        let pool = ValidatorPool::new(10);
        let (tx, mut rx) = mpsc::channel(8);
        assert!(pool.try_run(
            None,
            message(1),
            vec![
                (accepting(), Duration::from_millis(150)),
                (rejecting(), Duration::from_millis(150)),
            ],
            tx,
        ));
        assert!(!expect_validated(&mut rx).await);
    }

    #[tokio::test]
    async fn deadline_expiry_rejects() {
        let pool = ValidatorPool::new(10);
        let slow: ValidatorFn = Arc::new(|_msg| {
            Box::pin(async {
                tokio::time::sleep(Duration::from_millis(100)).await;
                true
            })
        });

        let (tx, mut rx) = mpsc::channel(8);
        assert!(pool.try_run(None, message(1), vec![(slow.clone(), Duration::from_millis(20))], tx));
        assert!(!expect_validated(&mut rx).await);

        let (tx, mut rx) = mpsc::channel(8);
        assert!(pool.try_run(None, message(2), vec![(slow, Duration::from_millis(500))], tx));
        assert!(expect_validated(&mut rx).await);
    }

    #[tokio::test]
    async fn saturation_rejects_synchronously() {
        let pool = ValidatorPool::new(2);
        let (release_tx, release_rx) = tokio::sync::watch::channel(false);
        let blocked: ValidatorFn = Arc::new(move |_msg| {
            let mut release = release_rx.clone();
            Box::pin(async move { release.wait_for(|go| *go).await.is_ok() })
        });

        let (tx, mut rx) = mpsc::channel(8);
        let long = Duration::from_secs(10);
        assert!(pool.try_run(None, message(1), vec![(blocked.clone(), long)], tx.clone()));
        assert!(pool.try_run(None, message(2), vec![(blocked.clone(), long)], tx.clone()));

        // Both permits held by blocked validators: the next dispatch is
        // refused outright, not queued.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(pool.in_flight(), 2);
        assert!(!pool.try_run(None, message(3), vec![(blocked.clone(), long)], tx.clone()));

        release_tx.send(true).unwrap();
        assert!(expect_validated(&mut rx).await);
        assert!(expect_validated(&mut rx).await);

        // Capacity recovered after the blocked validators finished.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(pool.in_flight(), 0);
        assert!(pool.try_run(None, message(4), vec![(accepting(), long)], tx));
        assert!(expect_validated(&mut rx).await);
    }

    #[tokio::test]
    async fn multi_validator_message_needs_permits_for_each() {
        let pool = ValidatorPool::new(3);
        let (release_tx, release_rx) = tokio::sync::watch::channel(false);
        let blocked: ValidatorFn = Arc::new(move |_msg| {
            let mut release = release_rx.clone();
            Box::pin(async move { release.wait_for(|go| *go).await.is_ok() })
        });

        let (tx, mut rx) = mpsc::channel(8);
        let long = Duration::from_secs(10);
        assert!(pool.try_run(
            None,
            message(1),
            vec![(blocked.clone(), long), (blocked.clone(), long)],
            tx.clone(),
        ));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(pool.in_flight(), 2);

        // One permit left; a two-validator message does not fit.
        assert!(!pool.try_run(
            None,
            message(2),
            vec![(blocked.clone(), long), (blocked.clone(), long)],
            tx.clone(),
        ));
        // A one-validator message does.
        assert!(pool.try_run(None, message(3), vec![(blocked, long)], tx));

        release_tx.send(true).unwrap();
        assert!(expect_validated(&mut rx).await);
        assert!(expect_validated(&mut rx).await);
    }
}
