//! Concurrent, request-batching move queue.
//!
//! One background worker drains a thread-safe FIFO of `MoveOrder`s and
//! flushes them as `$batch` calls of up to 20 PATCHes, keeping slow
//! network round-trips off the enumeration path and amortising Graph's
//! per-request limits.
//!
//! Shutdown is cooperative: `done_adding` only stops intake (`put`
//! degrades to a silent no-op), queued and in-flight orders still flush,
//! and `join` resolves once the queue is drained and the worker has
//! exited.  Per-item failures inside a batch (name collisions and the
//! like) are logged and counted; they never abort the batch or the
//! worker.

use crate::graph::batch;
use crate::graph::client::GraphClient;
use crate::graph::types::{BatchRequest, MoveRequest, BATCH_REQUEST_MAX};
use log::{debug, error, info, warn};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::task::JoinHandle;

/// Per-attempt receive timeout, so the worker notices shutdown promptly
/// even under a slow trickle of input.
const RECV_TIMEOUT: Duration = Duration::from_millis(250);

/// One file to relocate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOrder {
    pub file_id: String,
    pub dest_folder_id: String,
}

/// Outcome counters for a queue's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveStats {
    /// Orders that reached a flushed batch.
    pub attempted: u64,
    /// Sub-responses reporting success.
    pub moved: u64,
    /// Sub-responses reporting failure (or whole-batch submit errors).
    pub failed: u64,
    /// Physical `$batch` calls made.
    pub batches: u64,
}

/// Handle to the background move worker.
pub struct BatchMoveQueue {
    tx: mpsc::UnboundedSender<MoveOrder>,
    stop: Arc<AtomicBool>,
    handle: JoinHandle<MoveStats>,
}

impl BatchMoveQueue {
    /// Start the worker task.
    pub fn spawn(client: Arc<GraphClient>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let stop = Arc::new(AtomicBool::new(false));
        let handle = tokio::spawn(worker(client, rx, stop.clone()));
        Self { tx, stop, handle }
    }

    /// Enqueue an order.  Non-blocking; a silent no-op once `done_adding`
    /// has been called.
    pub fn put(&self, order: MoveOrder) {
        if self.stop.load(Ordering::SeqCst) {
            debug!("Dropping move order for {} (queue shut down)", order.file_id);
            return;
        }
        // The worker holds the receiver for the queue's whole life; a send
        // failure can only race the stop flag.
        let _ = self.tx.send(order);
    }

    /// Signal that no further orders will arrive.  Queued orders still
    /// flush.
    pub fn done_adding(&self) {
        debug!("Move queue intake closed");
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Wait until the queue is drained and the worker has exited.
    pub async fn join(self) -> MoveStats {
        drop(self.tx);
        match self.handle.await {
            Ok(stats) => stats,
            Err(e) => {
                error!("Move worker task failed: {}", e);
                MoveStats::default()
            }
        }
    }
}

async fn worker(
    client: Arc<GraphClient>,
    mut rx: mpsc::UnboundedReceiver<MoveOrder>,
    stop: Arc<AtomicBool>,
) -> MoveStats {
    debug!("Move worker started");
    let mut stats = MoveStats::default();

    loop {
        let mut batch_orders: Vec<MoveOrder> = Vec::with_capacity(BATCH_REQUEST_MAX);
        let mut input_done = false;

        while batch_orders.len() < BATCH_REQUEST_MAX {
            if stop.load(Ordering::SeqCst) {
                // Intake is closed: drain whatever is queued, no waiting.
                match rx.try_recv() {
                    Ok(order) => batch_orders.push(order),
                    Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => {
                        input_done = true;
                        break;
                    }
                }
            } else {
                match tokio::time::timeout(RECV_TIMEOUT, rx.recv()).await {
                    Ok(Some(order)) => batch_orders.push(order),
                    Ok(None) => {
                        input_done = true;
                        break;
                    }
                    // Timeout: loop around and re-check the stop flag.
                    Err(_) => {}
                }
            }
        }

        if !batch_orders.is_empty() {
            flush(&client, &batch_orders, &mut stats).await;
        }

        if input_done {
            break;
        }
    }

    info!(
        "Move worker exiting: {} attempted, {} moved, {} failed in {} batches",
        stats.attempted, stats.moved, stats.failed, stats.batches
    );
    stats
}

/// Submit one batch of PATCH-per-item move requests and tally the
/// per-item outcomes.
async fn flush(client: &GraphClient, orders: &[MoveOrder], stats: &mut MoveStats) {
    debug!("Flushing batch of {} move(s)", orders.len());

    let requests: Vec<BatchRequest> = orders
        .iter()
        .enumerate()
        .map(|(i, order)| {
            BatchRequest::json(
                i.to_string(),
                "PATCH",
                format!("/me/drive/items/{}", order.file_id),
                json!(MoveRequest::into_folder(&order.dest_folder_id)),
            )
        })
        .collect();

    stats.attempted += orders.len() as u64;
    stats.batches += 1;

    let responses = match batch::execute(client, &requests).await {
        Ok(responses) => responses,
        Err(e) => {
            // The whole physical call failed; every order in it is lost
            // this run.  Best-effort: keep the worker alive.
            error!("Batch move submit failed ({} orders): {}", orders.len(), e);
            stats.failed += orders.len() as u64;
            return;
        }
    };

    for (i, order) in orders.iter().enumerate() {
        match batch::response_by_id(&responses, &i.to_string()) {
            Some(resp) if resp.status == 200 => stats.moved += 1,
            Some(resp) => {
                stats.failed += 1;
                let graph_code = resp.body["error"]["code"].as_str().unwrap_or("unknown");
                warn!(
                    "Move of {} into {} failed: HTTP {} ({})",
                    order.file_id, order.dest_folder_id, resp.status, graph_code
                );
            }
            None => {
                stats.failed += 1;
                warn!(
                    "Batch response missing entry for move of {}",
                    order.file_id
                );
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::transport::ScriptedTransport;
    use serde_json::json;

    fn client(transport: Arc<ScriptedTransport>) -> Arc<GraphClient> {
        Arc::new(GraphClient::new(
            transport,
            "tok",
            "https://graph.microsoft.com/v1.0",
        ))
    }

    fn order(n: usize) -> MoveOrder {
        MoveOrder {
            file_id: format!("file-{}", n),
            dest_folder_id: "dest".into(),
        }
    }

    /// Batch response with all sub-requests succeeding except those whose
    /// index is listed in `conflicts`.
    fn batch_response(count: usize, conflicts: &[usize]) -> serde_json::Value {
        let responses: Vec<serde_json::Value> = (0..count)
            .map(|i| {
                if conflicts.contains(&i) {
                    json!({
                        "id": i.to_string(),
                        "status": 409,
                        "body": { "error": { "code": "nameAlreadyExists", "message": "dup" } }
                    })
                } else {
                    json!({ "id": i.to_string(), "status": 200, "body": { "id": format!("f{}", i) } })
                }
            })
            .collect();
        json!({ "responses": responses })
    }

    #[tokio::test]
    async fn test_45_orders_flush_as_three_batches() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_ok(batch_response(20, &[]));
        transport.push_ok(batch_response(20, &[]));
        transport.push_ok(batch_response(5, &[]));

        let queue = BatchMoveQueue::spawn(client(transport.clone()));
        // No await between puts and done_adding: the worker first runs
        // with all 45 orders queued and intake already closed.
        for n in 0..45 {
            queue.put(order(n));
        }
        queue.done_adding();

        let stats = queue.join().await;
        assert_eq!(stats.batches, 3);
        assert_eq!(stats.attempted, 45);
        assert_eq!(stats.moved, 45);
        assert_eq!(stats.failed, 0);

        let sizes: Vec<usize> = transport
            .requests()
            .iter()
            .map(|r| r.json.as_ref().unwrap()["requests"].as_array().unwrap().len())
            .collect();
        assert_eq!(sizes, vec![20, 20, 5]);
    }

    #[tokio::test]
    async fn test_name_collision_does_not_abort_batch_or_worker() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_ok(batch_response(20, &[7]));
        transport.push_ok(batch_response(5, &[]));

        let queue = BatchMoveQueue::spawn(client(transport.clone()));
        for n in 0..25 {
            queue.put(order(n));
        }
        queue.done_adding();

        let stats = queue.join().await;
        assert_eq!(stats.batches, 2);
        assert_eq!(stats.attempted, 25);
        assert_eq!(stats.moved, 24);
        assert_eq!(stats.failed, 1);
    }

    #[tokio::test]
    async fn test_put_after_shutdown_is_silently_dropped() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_ok(batch_response(2, &[]));

        let queue = BatchMoveQueue::spawn(client(transport.clone()));
        queue.put(order(0));
        queue.put(order(1));
        queue.done_adding();
        queue.put(order(2));
        queue.put(order(3));

        let stats = queue.join().await;
        assert_eq!(stats.attempted, 2);
        assert_eq!(stats.moved, 2);
    }

    #[tokio::test]
    async fn test_whole_batch_failure_counts_orders_and_continues() {
        let transport = Arc::new(ScriptedTransport::new());
        // First physical call: no response queued => transport error.
        // Nothing else scripted; the worker must still exit cleanly.
        let queue = BatchMoveQueue::spawn(client(transport.clone()));
        for n in 0..3 {
            queue.put(order(n));
        }
        queue.done_adding();

        let stats = queue.join().await;
        assert_eq!(stats.attempted, 3);
        assert_eq!(stats.failed, 3);
        assert_eq!(stats.moved, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_batch_held_until_shutdown() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_ok(batch_response(3, &[]));

        let queue = BatchMoveQueue::spawn(client(transport.clone()));
        for n in 0..3 {
            queue.put(order(n));
        }
        // The worker keeps accumulating across receive timeouts; a
        // partial batch is not flushed while intake is still open.
        tokio::time::sleep(RECV_TIMEOUT * 4).await;
        assert!(transport.requests().is_empty());

        queue.done_adding();
        let stats = queue.join().await;
        assert_eq!(stats.batches, 1);
        assert_eq!(stats.moved, 3);
    }

    #[tokio::test]
    async fn test_join_with_nothing_enqueued() {
        let queue = BatchMoveQueue::spawn(client(Arc::new(ScriptedTransport::new())));
        queue.done_adding();
        let stats = queue.join().await;
        assert_eq!(stats, MoveStats::default());
    }
}
