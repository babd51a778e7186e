use std::collections::HashMap;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use crate::relation::RelationId;

use super::matrix::latest_by_relation;
use super::source::MetricsSource;

pub struct PollEvent {
    pub seq: u64,
    pub result: Result<HashMap<RelationId, f64>, String>,
}

pub struct ThroughputPoller {
    events: Receiver<PollEvent>,
    stop: Option<Sender<()>>,
    ticker: Option<JoinHandle<()>>,
}

impl ThroughputPoller {
    pub fn start(source: Arc<dyn MetricsSource>, cluster_id: String, interval: Duration) -> Self {
        let (event_tx, event_rx) = mpsc::channel();
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let ticker = thread::spawn(move || {
            let mut seq = 0u64;
            loop {
                seq += 1;
                let source = Arc::clone(&source);
                let cluster = cluster_id.clone();
                let events = event_tx.clone();
                thread::spawn(move || {
                    let result = source
                        .fetch_throughput(&cluster)
                        .map(|matrix| latest_by_relation(&matrix))
                        .map_err(|error| format!("{error:#}"));
                    // Receiver may be gone if the poller was torn down while
                    // this fetch was in flight; the result is dropped then.
                    let _ = events.send(PollEvent { seq, result });
                });

                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {}
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        });

        Self {
            events: event_rx,
            stop: Some(stop_tx),
            ticker: Some(ticker),
        }
    }

    pub fn events(&self) -> &Receiver<PollEvent> {
        &self.events
    }
}

impl Drop for ThroughputPoller {
    fn drop(&mut self) {
        self.stop.take();
        if let Some(ticker) = self.ticker.take() {
            let _ = ticker.join();
        }
    }
}

#[derive(Default)]
pub struct ThroughputTable {
    latest: HashMap<RelationId, f64>,
    applied_seq: u64,
    last_error: Option<String>,
}

impl ThroughputTable {
    pub fn apply(&mut self, event: PollEvent) -> bool {
        if event.seq <= self.applied_seq {
            debug!(seq = event.seq, "discarding stale throughput completion");
            return false;
        }
        self.applied_seq = event.seq;

        match event.result {
            Ok(latest) => {
                self.last_error = None;
                let mut changed = false;
                for (relation, value) in latest {
                    if self.latest.insert(relation, value) != Some(value) {
                        changed = true;
                    }
                }
                changed
            }
            Err(error) => {
                warn!("throughput poll failed: {error}");
                self.last_error = Some(error);
                false
            }
        }
    }

    pub fn get(&self, relation: RelationId) -> Option<f64> {
        self.latest.get(&relation).copied()
    }

    pub fn len(&self) -> usize {
        self.latest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latest.is_empty()
    }

    pub fn has_polled(&self) -> bool {
        self.applied_seq > 0
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn reset(&mut self) {
        self.latest.clear();
        self.applied_seq = 0;
        self.last_error = None;
    }
}
