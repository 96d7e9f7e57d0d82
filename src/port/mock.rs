//! Mock serial port implementation for testing.
//!
//! Provides a `MockSerialPort` that simulates a device without requiring
//! actual hardware. One `MockSerialPort` is the device; opening it through
//! its `PortOpener` impl hands out a handle that shares the same state, so a
//! test can keep feeding data and inspecting counters while a handler owns
//! the open port.

use super::error::PortError;
use super::traits::{LineConfig, PortOpener, SerialPortAdapter};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

/// What a single availability poll does before reporting the queue length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStep {
    /// Bytes arrive just before this poll.
    Data(Vec<u8>),
    /// The poll fails with an I/O error of this kind.
    Fail(std::io::ErrorKind),
    /// Nothing happens.
    Idle,
}

/// Why an open attempt should be refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenFailure {
    /// The device does not exist.
    Missing,
    /// Another process holds the device.
    Busy,
}

#[derive(Debug, Default)]
struct MockPortState {
    /// Bytes waiting to be read.
    read_queue: VecDeque<u8>,
    /// One entry consumed per availability poll.
    poll_script: VecDeque<PollStep>,
    /// Appended on every poll once the script is exhausted.
    feed: Option<Vec<u8>>,
    /// Log of all bytes written to the port.
    write_log: Vec<Vec<u8>>,
    open_failure: Option<OpenFailure>,
    control_line_failure: bool,
    /// Simulated latency of each availability poll.
    poll_delay: Duration,
    open_handles: usize,
    opens_total: usize,
    polls: usize,
    data_terminal_ready: bool,
    request_to_send: bool,
    last_line: Option<LineConfig>,
}

/// Mock serial port implementation for testing.
///
/// # Example
/// ```
/// use serial_handler::port::{MockSerialPort, SerialPortAdapter};
///
/// let mut port = MockSerialPort::new("MOCK0");
/// port.enqueue_read(b"Hello");
///
/// assert_eq!(port.read_available().unwrap(), b"Hello");
/// assert!(port.read_available().unwrap().is_empty());
///
/// port.write_bytes(b"Response").unwrap();
/// assert_eq!(port.get_write_log(), vec![b"Response".to_vec()]);
/// ```
pub struct MockSerialPort {
    name: String,
    state: Arc<Mutex<MockPortState>>,
    /// Set on handles handed out by `PortOpener::open`.
    handle: bool,
}

impl MockSerialPort {
    /// Create a new mock serial port with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockPortState::default())),
            handle: false,
        }
    }

    /// Enqueue bytes to be returned by subsequent read operations.
    pub fn enqueue_read(&self, data: &[u8]) {
        self.state.lock().read_queue.extend(data);
    }

    /// Append a step to the poll script.
    pub fn script_poll(&self, step: PollStep) {
        self.state.lock().poll_script.push_back(step);
    }

    /// Make every poll past the end of the script receive `data`.
    pub fn set_feed(&self, data: &[u8]) {
        self.state.lock().feed = Some(data.to_vec());
    }

    /// Refuse subsequent open attempts.
    pub fn set_open_failure(&self, failure: Option<OpenFailure>) {
        self.state.lock().open_failure = failure;
    }

    /// Make DTR/RTS writes fail, as on adapters without modem lines.
    pub fn set_control_line_failure(&self, fail: bool) {
        self.state.lock().control_line_failure = fail;
    }

    /// Make each availability poll take `delay`.
    pub fn set_poll_delay(&self, delay: Duration) {
        self.state.lock().poll_delay = delay;
    }

    /// Get a copy of all data written to the port.
    pub fn get_write_log(&self) -> Vec<Vec<u8>> {
        self.state.lock().write_log.clone()
    }

    /// Get the number of bytes available to read.
    pub fn available_bytes(&self) -> usize {
        self.state.lock().read_queue.len()
    }

    /// Handles currently open on this device.
    pub fn open_handles(&self) -> usize {
        self.state.lock().open_handles
    }

    /// Successful opens since creation.
    pub fn opens_total(&self) -> usize {
        self.state.lock().opens_total
    }

    /// Availability polls since creation.
    pub fn poll_count(&self) -> usize {
        self.state.lock().polls
    }

    /// Current DTR level.
    pub fn data_terminal_ready(&self) -> bool {
        self.state.lock().data_terminal_ready
    }

    /// Current RTS level.
    pub fn request_to_send(&self) -> bool {
        self.state.lock().request_to_send
    }

    /// Line parameters passed to the most recent successful open.
    pub fn last_line_config(&self) -> Option<LineConfig> {
        self.state.lock().last_line.clone()
    }
}

impl Clone for MockSerialPort {
    /// Clones share the device state but never count as an open handle.
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            state: Arc::clone(&self.state),
            handle: false,
        }
    }
}

impl Drop for MockSerialPort {
    fn drop(&mut self) {
        if self.handle {
            let mut state = self.state.lock();
            state.open_handles = state.open_handles.saturating_sub(1);
        }
    }
}

impl PortOpener for MockSerialPort {
    fn open(
        &self,
        port_name: &str,
        line: &LineConfig,
    ) -> Result<Box<dyn SerialPortAdapter>, PortError> {
        let mut state = self.state.lock();
        match state.open_failure {
            Some(OpenFailure::Missing) => return Err(PortError::not_found(port_name)),
            Some(OpenFailure::Busy) => return Err(PortError::busy(port_name)),
            None => {}
        }
        // Exclusive access, like the OS driver.
        if state.open_handles > 0 {
            return Err(PortError::busy(port_name));
        }

        state.open_handles += 1;
        state.opens_total += 1;
        state.last_line = Some(line.clone());
        Ok(Box::new(Self {
            name: port_name.to_string(),
            state: Arc::clone(&self.state),
            handle: true,
        }))
    }
}

impl SerialPortAdapter for MockSerialPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        self.state.lock().write_log.push(data.to_vec());
        Ok(data.len())
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        let mut state = self.state.lock();

        let mut bytes_read = 0;
        for byte in buffer.iter_mut() {
            match state.read_queue.pop_front() {
                Some(queued) => {
                    *byte = queued;
                    bytes_read += 1;
                }
                None => break,
            }
        }

        if bytes_read == 0 {
            Err(PortError::Io(std::io::Error::new(
                std::io::ErrorKind::WouldBlock,
                "No data available",
            )))
        } else {
            Ok(bytes_read)
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn bytes_to_read(&self) -> Result<usize, PortError> {
        let delay = {
            let mut state = self.state.lock();
            state.polls += 1;
            state.poll_delay
        };
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        let mut guard = self.state.lock();
        let state = &mut *guard;
        match state.poll_script.pop_front() {
            Some(PollStep::Data(data)) => state.read_queue.extend(data),
            Some(PollStep::Fail(kind)) => {
                return Err(PortError::Io(std::io::Error::new(
                    kind,
                    "simulated read failure",
                )))
            }
            Some(PollStep::Idle) => {}
            None => {
                if let Some(feed) = &state.feed {
                    state.read_queue.extend(feed.iter().copied());
                }
            }
        }
        Ok(state.read_queue.len())
    }

    fn write_data_terminal_ready(&mut self, level: bool) -> Result<(), PortError> {
        let mut state = self.state.lock();
        if state.control_line_failure {
            return Err(PortError::unsupported("DTR control line"));
        }
        state.data_terminal_ready = level;
        Ok(())
    }

    fn write_request_to_send(&mut self, level: bool) -> Result<(), PortError> {
        let mut state = self.state.lock();
        if state.control_line_failure {
            return Err(PortError::unsupported("RTS control line"));
        }
        state.request_to_send = level;
        Ok(())
    }
}

impl std::fmt::Debug for MockSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSerialPort")
            .field("name", &self.name)
            .field("handle", &self.handle)
            .field("available_bytes", &self.available_bytes())
            .finish()
    }
}
