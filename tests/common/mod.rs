//! Shared test utilities for handler tests.
//!
//! - Handler construction on top of a `MockSerialPort`
//! - Recorders that collect deliveries and faults from the reader thread
//! - Polling waits with a deadline

#![allow(dead_code)]

use parking_lot::Mutex;
use serial_handler::port::MockSerialPort;
use serial_handler::{HandlerBuilder, SerialPortHandler, SubscriptionId};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Poll interval used by tests; short so they run quickly.
pub const TEST_POLL: Duration = Duration::from_millis(10);

/// Generous upper bound for anything the reader should do "soon".
pub const PATIENCE: Duration = Duration::from_secs(2);

/// Builder for a handler on `device` with the test poll interval.
pub fn builder_on(device: &MockSerialPort) -> HandlerBuilder {
    SerialPortHandler::builder("MOCK0")
        .poll_interval(TEST_POLL)
        .opener(Arc::new(device.clone()))
}

pub fn handler_on(device: &MockSerialPort) -> SerialPortHandler {
    builder_on(device).build().expect("valid test configuration")
}

/// Poll `predicate` until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, predicate: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if predicate() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    predicate()
}

/// Collects text deliveries from a handler.
#[derive(Clone, Default)]
pub struct Deliveries {
    items: Arc<Mutex<Vec<String>>>,
}

impl Deliveries {
    pub fn attach(handler: &SerialPortHandler) -> Self {
        let recorder = Self::default();
        recorder.subscribe_to(handler);
        recorder
    }

    /// Record into this collector from `handler`.
    pub fn subscribe_to(&self, handler: &SerialPortHandler) -> SubscriptionId {
        let items = Arc::clone(&self.items);
        handler.subscribe(move |text| items.lock().push(text.to_string()))
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.items.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn joined(&self) -> String {
        self.items.lock().concat()
    }

    pub fn wait_for(&self, count: usize) -> bool {
        wait_until(PATIENCE, || self.len() >= count)
    }
}

/// One recorded fault: `(device_lost, consecutive, message)`.
pub type FaultRecord = (bool, u32, String);

/// Collects fault events from a handler.
#[derive(Clone, Default)]
pub struct Faults {
    items: Arc<Mutex<Vec<FaultRecord>>>,
}

impl Faults {
    pub fn attach(handler: &SerialPortHandler) -> Self {
        let recorder = Self::default();
        let items = Arc::clone(&recorder.items);
        handler.subscribe_faults(move |event| {
            items.lock().push((
                event.is_device_lost(),
                event.consecutive_failures(),
                event.to_string(),
            ))
        });
        recorder
    }

    pub fn snapshot(&self) -> Vec<FaultRecord> {
        self.items.lock().clone()
    }

    pub fn transient(&self) -> usize {
        self.items.lock().iter().filter(|(lost, _, _)| !lost).count()
    }

    pub fn lost(&self) -> usize {
        self.items.lock().iter().filter(|(lost, _, _)| *lost).count()
    }
}
