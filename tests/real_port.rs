//! Tests against a real serial device.
//!
//! Ignored by default. Point `TEST_PORT` at a device (a loopback adapter with
//! TX wired to RX makes the echo test meaningful):
//!
//! TEST_PORT=/dev/ttyUSB0 TEST_BAUD=115200 cargo test --test real_port -- --ignored

mod common;

use common::{wait_until, Deliveries, PATIENCE};
use serial_handler::{CloseOutcome, SerialPortHandler};
use std::env;
use std::time::Duration;

fn test_port() -> Option<(String, u32)> {
    let port = env::var("TEST_PORT").ok()?;
    let baud = env::var("TEST_BAUD")
        .ok()
        .and_then(|b| b.parse().ok())
        .unwrap_or(9600);
    Some((port, baud))
}

fn print_available_ports() {
    match serialport::available_ports() {
        Ok(ports) if !ports.is_empty() => {
            println!("   Available ports:");
            for port in ports {
                println!("   - {}", port.port_name);
            }
        }
        _ => println!("   No serial ports detected"),
    }
}

#[test]
#[ignore] // Requires hardware
fn test_real_port_open_close_cycle() {
    let Some((port, baud)) = test_port() else {
        println!("Skipping: TEST_PORT not set");
        print_available_ports();
        return;
    };

    let handler = SerialPortHandler::builder(port)
        .baud_rate(baud)
        .poll_interval(Duration::from_millis(20))
        .build()
        .expect("valid configuration");

    for _ in 0..3 {
        handler.open().expect("open failed");
        assert!(handler.is_open());
        assert_eq!(handler.close(), CloseOutcome::Closed);
    }
}

#[test]
#[ignore] // Requires hardware with TX looped back to RX
fn test_real_port_loopback_echo() {
    let Some((port, baud)) = test_port() else {
        println!("Skipping: TEST_PORT not set");
        print_available_ports();
        return;
    };

    let handler = SerialPortHandler::builder(port)
        .baud_rate(baud)
        .poll_interval(Duration::from_millis(20))
        .build()
        .expect("valid configuration");
    let deliveries = Deliveries::attach(&handler);

    handler.open().expect("open failed");
    handler.write(b"loopback-check\n").expect("write failed");
    assert!(wait_until(PATIENCE, || deliveries
        .joined()
        .contains("loopback-check")));
    handler.close();
}
