//! Background thread that drains the socket into the world model.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use tracing::{debug, info, trace};

use crate::dispatch::DispatchOutcome;
use crate::network::{Connection, ConnectionError};
use crate::state::GameState;
use crate::world::ConnectionPhase;

/// Owner of the ingestion thread. Stopping is idempotent and also happens on
/// drop; both wait for the thread to exit.
pub struct IngestHandle {
    running: Arc<AtomicBool>,
    wake: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl IngestHandle {
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map_or(false, |handle| !handle.is_finished())
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        let _ = self.wake.try_send(());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                debug!(target: "zappy::ingest", "ingest.thread_panicked");
            }
        }
    }
}

impl Drop for IngestHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

pub fn spawn_ingestion(
    connection: Arc<Mutex<Connection>>,
    state: GameState,
    poll_interval: Duration,
) -> Result<IngestHandle, ConnectionError> {
    let running = Arc::new(AtomicBool::new(true));
    let (wake_tx, wake_rx) = bounded::<()>(1);
    let thread_running = Arc::clone(&running);
    let handle = thread::Builder::new()
        .name("zappy-ingest".to_string())
        .spawn(move || run_ingestion(&connection, &state, &thread_running, &wake_rx, poll_interval))
        .map_err(|source| ConnectionError::Spawn { source })?;
    Ok(IngestHandle {
        running,
        wake: wake_tx,
        handle: Some(handle),
    })
}

fn run_ingestion(
    connection: &Mutex<Connection>,
    state: &GameState,
    running: &AtomicBool,
    wake: &Receiver<()>,
    poll_interval: Duration,
) {
    debug!(target: "zappy::ingest", "ingest.started");
    let mut batch = Vec::new();
    let mut rejected = 0usize;

    while running.load(Ordering::SeqCst) {
        // The connection lock is released before any line touches the world.
        let connected = {
            let mut connection = connection.lock();
            loop {
                let line = connection.recv_line(true);
                if line.is_empty() {
                    break;
                }
                batch.push(line);
            }
            connection.is_connected()
        };

        let mut evicted = 0;
        for line in batch.drain(..) {
            if let DispatchOutcome::Rejected(_) = state.dispatch_line(&line) {
                rejected += 1;
            }
            // A single drain may carry far more lines than the log ceiling.
            evicted += state.evict_messages();
        }
        if evicted > 0 {
            trace!(target: "zappy::ingest", evicted, "messages.evicted");
        }

        if !connected {
            info!(target: "zappy::ingest", rejected, "ingest.connection_lost");
            break;
        }

        match wake.recv_timeout(poll_interval) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    state.set_phase(ConnectionPhase::Disconnected);
    debug!(target: "zappy::ingest", rejected, "ingest.stopped");
}
