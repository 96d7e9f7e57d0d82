//! What the background reader delivers, in what order, and what it reports.

mod common;

use common::{builder_on, handler_on, wait_until, Deliveries, Faults, PATIENCE, TEST_POLL};
use pretty_assertions::assert_eq;
use serial_handler::config::Config;
use serial_handler::port::{MockSerialPort, PollStep};
use serial_handler::{SerialPortHandler, TextEncoding};
use std::io::ErrorKind;
use std::sync::Arc;
use std::thread;

#[test]
fn test_chunks_arrive_once_and_in_order() {
    let device = MockSerialPort::new("MOCK0");
    device.script_poll(PollStep::Data(b"AB".to_vec()));
    device.script_poll(PollStep::Data(b"CD".to_vec()));
    let handler = handler_on(&device);
    let deliveries = Deliveries::attach(&handler);

    handler.open().unwrap();
    assert!(deliveries.wait_for(2));
    thread::sleep(TEST_POLL * 3);
    handler.close();

    assert_eq!(deliveries.snapshot(), vec!["AB".to_string(), "CD".to_string()]);
}

#[test]
fn test_idle_polls_deliver_nothing() {
    let device = MockSerialPort::new("MOCK0");
    let handler = handler_on(&device);
    let deliveries = Deliveries::attach(&handler);

    handler.open().unwrap();
    assert!(wait_until(PATIENCE, || device.poll_count() >= 3));
    handler.close();

    assert!(deliveries.snapshot().is_empty());
}

#[test]
fn test_every_subscriber_sees_every_chunk() {
    let device = MockSerialPort::new("MOCK0");
    device.script_poll(PollStep::Data(b"one".to_vec()));
    device.script_poll(PollStep::Data(b"two".to_vec()));
    let handler = handler_on(&device);
    let first = Deliveries::attach(&handler);
    let second = Deliveries::attach(&handler);

    handler.open().unwrap();
    assert!(first.wait_for(2));
    assert!(second.wait_for(2));
    handler.close();

    assert_eq!(first.snapshot(), second.snapshot());
}

#[test]
fn test_read_failure_is_reported_and_reading_continues() {
    let device = MockSerialPort::new("MOCK0");
    device.script_poll(PollStep::Idle);
    device.script_poll(PollStep::Fail(ErrorKind::BrokenPipe));
    device.script_poll(PollStep::Data(b"CD".to_vec()));
    let handler = handler_on(&device);
    let deliveries = Deliveries::attach(&handler);
    let faults = Faults::attach(&handler);

    handler.open().unwrap();
    assert!(deliveries.wait_for(1));
    handler.close();

    assert_eq!(deliveries.snapshot(), vec!["CD".to_string()]);
    let recorded = faults.snapshot();
    assert_eq!(recorded.len(), 1);
    let (lost, consecutive, message) = &recorded[0];
    assert!(!lost);
    assert_eq!(*consecutive, 1);
    assert!(message.contains("MOCK0"), "{message}");
}

#[test]
fn test_device_lost_is_raised_once_per_failure_streak() {
    let device = MockSerialPort::new("MOCK0");
    for _ in 0..5 {
        device.script_poll(PollStep::Fail(ErrorKind::BrokenPipe));
    }
    device.script_poll(PollStep::Data(b"back".to_vec()));
    let handler = builder_on(&device)
        .failure_threshold(Some(3))
        .build()
        .unwrap();
    let deliveries = Deliveries::attach(&handler);
    let faults = Faults::attach(&handler);

    handler.open().unwrap();
    assert!(deliveries.wait_for(1));
    handler.close();

    assert_eq!(faults.transient(), 5);
    assert_eq!(faults.lost(), 1);
    let lost: Vec<u32> = faults
        .snapshot()
        .into_iter()
        .filter(|(lost, _, _)| *lost)
        .map(|(_, consecutive, _)| consecutive)
        .collect();
    assert_eq!(lost, vec![3]);
    assert_eq!(deliveries.joined(), "back");
}

#[test]
fn test_device_lost_can_be_disabled() {
    let device = MockSerialPort::new("MOCK0");
    for _ in 0..4 {
        device.script_poll(PollStep::Fail(ErrorKind::TimedOut));
    }
    device.script_poll(PollStep::Data(b"ok".to_vec()));
    let handler = builder_on(&device).failure_threshold(None).build().unwrap();
    let deliveries = Deliveries::attach(&handler);
    let faults = Faults::attach(&handler);

    handler.open().unwrap();
    assert!(deliveries.wait_for(1));
    handler.close();

    assert_eq!(faults.transient(), 4);
    assert_eq!(faults.lost(), 0);
}

#[test]
fn test_nothing_is_delivered_after_close_returns() {
    let device = MockSerialPort::new("MOCK0");
    device.set_feed(b"x");
    let handler = handler_on(&device);
    let deliveries = Deliveries::attach(&handler);

    handler.open().unwrap();
    assert!(deliveries.wait_for(1));
    handler.close();

    let count = deliveries.len();
    thread::sleep(TEST_POLL * 10);
    assert_eq!(deliveries.len(), count);
}

#[test]
fn test_unsubscribed_callback_stops_receiving() {
    let device = MockSerialPort::new("MOCK0");
    device.set_feed(b"x");
    let handler = handler_on(&device);
    let kept = Deliveries::attach(&handler);
    let dropped = Deliveries::default();
    let id = dropped.subscribe_to(&handler);

    handler.open().unwrap();
    assert!(dropped.wait_for(1));
    assert!(handler.unsubscribe(id));
    // Let any emission that started before unsubscribe finish.
    assert!(kept.wait_for(kept.len() + 2));
    let frozen = dropped.len();
    assert!(kept.wait_for(kept.len() + 3));
    handler.close();

    assert_eq!(dropped.len(), frozen);
    assert!(!handler.unsubscribe(id));
}

#[test]
fn test_panicking_subscriber_does_not_stop_delivery() {
    let device = MockSerialPort::new("MOCK0");
    device.script_poll(PollStep::Data(b"first".to_vec()));
    device.script_poll(PollStep::Data(b"second".to_vec()));
    let handler = handler_on(&device);
    handler.subscribe(|text| {
        if text == "first" {
            panic!("subscriber failure");
        }
    });
    let deliveries = Deliveries::attach(&handler);

    handler.open().unwrap();
    assert!(deliveries.wait_for(2));
    assert!(handler.is_open());
    handler.close();

    assert_eq!(deliveries.joined(), "firstsecond");
}

#[test]
fn test_utf8_split_across_polls_is_reassembled() {
    let device = MockSerialPort::new("MOCK0");
    let text = "température 25°C";
    let bytes = text.as_bytes();
    // Cut inside the two-byte 'é'.
    let cut = text.find('é').unwrap() + 1;
    device.script_poll(PollStep::Data(bytes[..cut].to_vec()));
    device.script_poll(PollStep::Data(bytes[cut..].to_vec()));
    let handler = handler_on(&device);
    let deliveries = Deliveries::attach(&handler);

    handler.open().unwrap();
    assert!(wait_until(PATIENCE, || deliveries.joined() == text));
    handler.close();

    assert!(deliveries.snapshot().iter().all(|chunk| !chunk.contains('\u{FFFD}')));
}

#[test]
fn test_latin1_maps_every_byte() {
    let device = MockSerialPort::new("MOCK0");
    device.script_poll(PollStep::Data(vec![b'2', b'5', 0xB0, b'C']));
    let handler = builder_on(&device)
        .encoding(TextEncoding::Latin1)
        .build()
        .unwrap();
    let deliveries = Deliveries::attach(&handler);

    handler.open().unwrap();
    assert!(deliveries.wait_for(1));
    handler.close();

    assert_eq!(deliveries.joined(), "25°C");
}

#[test]
fn test_handler_from_config_resolves_aliases_and_reads() {
    let device = MockSerialPort::new("MOCK0");
    device.script_poll(PollStep::Data(b"configured".to_vec()));

    let mut config = Config::default();
    config.serial.port = Some("sensor".to_string());
    config
        .serial
        .port_aliases
        .insert("sensor".to_string(), "MOCK0".to_string());
    config.serial.baud_rate = 57_600;
    config.reader.poll_interval_ms = 10;

    let handler = SerialPortHandler::builder_from_config(&config)
        .unwrap()
        .opener(Arc::new(device.clone()))
        .build()
        .unwrap();
    assert_eq!(handler.port_name(), "MOCK0");
    let deliveries = Deliveries::attach(&handler);

    handler.open().unwrap();
    assert!(deliveries.wait_for(1));
    handler.close();

    assert_eq!(device.last_line_config().unwrap().baud_rate, 57_600);
    assert_eq!(deliveries.joined(), "configured");
}

#[test]
fn test_handler_from_config_requires_a_port() {
    let config = Config::default();
    let err = SerialPortHandler::from_config(&config).unwrap_err();
    assert!(err.to_string().contains("SERIAL_HANDLER_SERIAL_PORT"), "{err}");
}
