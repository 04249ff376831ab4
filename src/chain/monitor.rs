//! Transaction monitor: one submission, exactly one terminal outcome.
//!
//! State machine per submission:
//!
//! ```text
//! Submitted → { InBlock → Finalized } | DispatchFailed | TimedOut
//! ```
//!
//! Any status update carrying a dispatch error is terminal and resolves
//! `DispatchFailed`. A clean `InBlock` is progress only; the clean terminal
//! is the `Finalized` update the client emits once the configured
//! confirmation depth is reached. A timer started at submission forces
//! `TimedOut` when no terminal status arrives within the window.
//! Returning drops the receiver, which tears the subscription down; later
//! status events are ignored.

use std::time::Duration;
use tokio::time::timeout;

use crate::chain::types::{PendingTx, TransactionOutcome, TxStatus};

/// Consume a submission's status stream until it resolves.
pub async fn await_outcome(pending: PendingTx, window: Duration) -> TransactionOutcome {
    let PendingTx { tx_hash, mut updates } = pending;

    let result = timeout(window, async {
        while let Some(update) = updates.recv().await {
            match update.status {
                TxStatus::Broadcast => {
                    tracing::debug!(tx_hash = %tx_hash, "Transaction broadcast");
                }
                TxStatus::InBlock { block_hash } => {
                    if let Some(info) = update.dispatch_error {
                        return Some(TransactionOutcome::DispatchFailed {
                            info,
                            block_hash,
                            tx_hash: tx_hash.clone(),
                        });
                    }
                    tracing::debug!(
                        tx_hash = %tx_hash,
                        block_hash = %block_hash,
                        "Transaction included, awaiting confirmation depth"
                    );
                }
                TxStatus::Finalized { block_hash } => {
                    return Some(match update.dispatch_error {
                        Some(info) => TransactionOutcome::DispatchFailed {
                            info,
                            block_hash,
                            tx_hash: tx_hash.clone(),
                        },
                        None => TransactionOutcome::Finalized {
                            block_hash,
                            tx_hash: tx_hash.clone(),
                        },
                    });
                }
            }
        }
        None
    })
    .await;

    match result {
        Ok(Some(outcome)) => outcome,
        // Stream ended without a terminal status: the on-chain state is
        // unknown, so resolve like a timeout to keep retries safe.
        Ok(None) => {
            tracing::warn!(tx_hash = %tx_hash, "Status stream closed before a terminal status");
            TransactionOutcome::TimedOut
        }
        Err(_) => {
            tracing::warn!(
                tx_hash = %tx_hash,
                window_secs = window.as_secs(),
                "No terminal status within window"
            );
            TransactionOutcome::TimedOut
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::types::{DispatchInfo, StatusUpdate};
    use tokio::sync::mpsc;

    fn pending(capacity: usize) -> (mpsc::Sender<StatusUpdate>, PendingTx) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            tx,
            PendingTx {
                tx_hash: "0xabc".to_string(),
                updates: rx,
            },
        )
    }

    #[tokio::test]
    async fn test_resolves_finalized() {
        let (tx, pending) = pending(4);
        tx.send(StatusUpdate {
            status: TxStatus::Broadcast,
            dispatch_error: None,
        })
        .await
        .unwrap();
        tx.send(StatusUpdate {
            status: TxStatus::Finalized {
                block_hash: "0xblock".to_string(),
            },
            dispatch_error: None,
        })
        .await
        .unwrap();

        let outcome = await_outcome(pending, Duration::from_secs(5)).await;
        assert_eq!(
            outcome,
            TransactionOutcome::Finalized {
                block_hash: "0xblock".to_string(),
                tx_hash: "0xabc".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_resolves_exactly_once_for_in_block_then_finalized() {
        let (tx, pending) = pending(4);
        tx.send(StatusUpdate {
            status: TxStatus::InBlock {
                block_hash: "0xfirst".to_string(),
            },
            dispatch_error: None,
        })
        .await
        .unwrap();
        tx.send(StatusUpdate {
            status: TxStatus::Finalized {
                block_hash: "0xsecond".to_string(),
            },
            dispatch_error: None,
        })
        .await
        .unwrap();

        // A clean inclusion is progress only; the single resolution happens
        // at the depth-gated Finalized update.
        let outcome = await_outcome(pending, Duration::from_secs(5)).await;
        assert_eq!(
            outcome,
            TransactionOutcome::Finalized {
                block_hash: "0xsecond".to_string(),
                tx_hash: "0xabc".to_string(),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_clean_inclusion_alone_does_not_resolve() {
        let (tx, pending) = pending(4);
        tx.send(StatusUpdate {
            status: TxStatus::InBlock {
                block_hash: "0xincluded".to_string(),
            },
            dispatch_error: None,
        })
        .await
        .unwrap();

        // Included but never confirmed to depth: the window decides.
        let outcome = await_outcome(pending, Duration::from_secs(60)).await;
        assert_eq!(outcome, TransactionOutcome::TimedOut);
        drop(tx);
    }

    #[tokio::test]
    async fn test_dispatch_error_on_inclusion_is_terminal() {
        let (tx, pending) = pending(4);
        let info = DispatchInfo {
            section: "contracts".to_string(),
            name: "Already set".to_string(),
            docs: vec![],
        };
        tx.send(StatusUpdate {
            status: TxStatus::InBlock {
                block_hash: "0xblock".to_string(),
            },
            dispatch_error: Some(info.clone()),
        })
        .await
        .unwrap();
        tx.send(StatusUpdate {
            status: TxStatus::Finalized {
                block_hash: "0xlater".to_string(),
            },
            dispatch_error: None,
        })
        .await
        .unwrap();

        // The rejection resolves immediately; the later event is ignored.
        let outcome = await_outcome(pending, Duration::from_secs(5)).await;
        assert_eq!(
            outcome,
            TransactionOutcome::DispatchFailed {
                info,
                block_hash: "0xblock".to_string(),
                tx_hash: "0xabc".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_resolves_dispatch_failed() {
        let (tx, pending) = pending(4);
        let info = DispatchInfo {
            section: "nfts".to_string(),
            name: "AlreadyExists".to_string(),
            docs: vec![],
        };
        tx.send(StatusUpdate {
            status: TxStatus::InBlock {
                block_hash: "0xblock".to_string(),
            },
            dispatch_error: Some(info.clone()),
        })
        .await
        .unwrap();

        let outcome = await_outcome(pending, Duration::from_secs(5)).await;
        assert_eq!(
            outcome,
            TransactionOutcome::DispatchFailed {
                info,
                block_hash: "0xblock".to_string(),
                tx_hash: "0xabc".to_string(),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_at_window_not_earlier() {
        let (tx, pending) = pending(1);
        let start = tokio::time::Instant::now();
        let outcome = await_outcome(pending, Duration::from_secs(60)).await;
        assert_eq!(outcome, TransactionOutcome::TimedOut);
        assert!(start.elapsed() >= Duration::from_secs(60));
        drop(tx);
    }

    #[tokio::test]
    async fn test_closed_stream_resolves_timed_out() {
        let (tx, pending) = pending(1);
        drop(tx);
        let outcome = await_outcome(pending, Duration::from_secs(5)).await;
        assert_eq!(outcome, TransactionOutcome::TimedOut);
    }
}
