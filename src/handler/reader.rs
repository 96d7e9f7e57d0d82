//! Background polling loop, one per open session.

use super::events::ReaderEvent;
use super::{Shared, SharedPort};
use crate::encoding::TextDecoder;
use crate::port::PortError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, trace, warn};

pub(super) struct Reader {
    pub(super) port_name: String,
    pub(super) port: SharedPort,
    pub(super) running: Arc<AtomicBool>,
    pub(super) shared: Arc<Shared>,
    pub(super) decoder: TextDecoder,
    pub(super) poll_interval: Duration,
    pub(super) failure_threshold: Option<u32>,
    /// Dropped when the loop exits; `close` waits on the other end.
    pub(super) done: mpsc::Sender<()>,
}

impl Reader {
    pub(super) fn run(mut self) {
        debug!(
            port = %self.port_name,
            interval = ?self.poll_interval,
            encoding = ?self.decoder.encoding(),
            "reader started"
        );

        let mut failures: u32 = 0;
        while self.is_running() {
            match self.poll() {
                Ok(chunk) => {
                    if failures > 0 {
                        debug!(port = %self.port_name, failures, "reads recovered");
                        failures = 0;
                    }
                    if !chunk.is_empty() {
                        self.deliver(&chunk);
                    }
                }
                Err(error) => {
                    failures = failures.saturating_add(1);
                    self.report(error, failures);
                }
            }
            self.pause();
        }

        debug!(port = %self.port_name, "reader stopped");
        drop(self.done);
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn poll(&self) -> Result<Vec<u8>, PortError> {
        self.port.lock().read_available()
    }

    fn deliver(&mut self, chunk: &[u8]) {
        let text = self.decoder.decode(chunk);
        trace!(port = %self.port_name, bytes = chunk.len(), chars = text.chars().count(), "drained");
        if text.is_empty() {
            return;
        }

        let running = &self.running;
        self.shared
            .data
            .emit_while(text.as_str(), || running.load(Ordering::Acquire));
    }

    /// Faults follow the same stop rule as data: none once `close` has begun.
    fn report(&self, error: PortError, consecutive: u32) {
        warn!(port = %self.port_name, consecutive, %error, "serial read failed");
        let running = || self.is_running();
        self.shared.faults.emit_while(
            &ReaderEvent::TransientReadFailure {
                port: self.port_name.clone(),
                error,
                consecutive,
            },
            running,
        );

        if self.failure_threshold == Some(consecutive) {
            error!(port = %self.port_name, consecutive, "serial device appears to be lost");
            self.shared.faults.emit_while(
                &ReaderEvent::DeviceLost {
                    port: self.port_name.clone(),
                    consecutive,
                },
                running,
            );
        }
    }

    /// Sleep one poll interval; `close` cuts it short by unparking.
    fn pause(&self) {
        let Some(deadline) = Instant::now().checked_add(self.poll_interval) else {
            // Past the end of the clock: sleep until `close` wakes us.
            while self.is_running() {
                thread::park();
            }
            return;
        };
        while self.is_running() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::park_timeout(deadline - now);
        }
    }
}
