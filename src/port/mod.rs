//! Port abstraction layer for serial communication.
//!
//! Provides the traits the handler talks to, the real OS backend and a mock
//! device, enabling dependency injection and hardware-free tests.

pub mod error;
pub mod mock;
pub mod sync_port;
pub mod traits;

pub use error::PortError;
pub use mock::{MockSerialPort, OpenFailure, PollStep};
pub use sync_port::{SyncSerialPort, SystemPortOpener};
pub use traits::*;
