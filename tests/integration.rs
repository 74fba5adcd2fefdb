//! End-to-end tests over the full stack: mock UART → link → codec →
//! dispatcher → store, with replies flowing back out the mock UART.

// Links the host critical-section implementation used by the sync primitives
use critical_section as _;

use tower_link::communication::tower::{Frame, TowerLink};
use tower_link::communication::tower::dispatcher::{CommandDispatcher, VERSION_MAJOR, VERSION_MINOR};
use tower_link::parameters::DEFAULT_DEVICE_NUMBER;
use tower_link::platform::mock::{MockRtc, MockSequencer, MockUart};
use tower_link::platform::RtcInterface;
use tower_link::storage::NvStore;

fn device() -> (TowerLink, CommandDispatcher<MockSequencer, MockRtc>, MockUart) {
    let store = NvStore::new(MockSequencer::new());
    let dispatcher = CommandDispatcher::new(store, MockRtc::new()).unwrap();
    (TowerLink::new(), dispatcher, MockUart::new())
}

#[test]
fn corrupted_stream_dispatches_only_the_valid_frame() {
    let (mut link, mut dispatcher, mut uart) = device();

    // First frame's checksum is wrong (0xFF instead of 0x04); the second,
    // a version query, is valid and must be the only frame dispatched.
    let mut stream = vec![0x04, 0x00, 0x00, 0x00, 0xFF];
    stream.extend_from_slice(&Frame::new(0x09, b'v', 0x01, 0x00).to_bytes());
    uart.inject_rx_data(&stream);

    let dispatched = link.service(&mut uart, &mut dispatcher).unwrap();
    assert_eq!(dispatched, 1);

    // The surviving frame had its ack bit clear, so nothing went back out
    assert!(uart.tx_data().is_empty());
}

#[test]
fn get_device_number_round_trips_over_the_wire() {
    let (mut link, mut dispatcher, mut uart) = device();

    uart.inject_rx_data(&Frame::new(0x8B, 1, 0, 0).to_bytes());
    let dispatched = link.service(&mut uart, &mut dispatcher).unwrap();

    assert_eq!(dispatched, 1);
    let [lo, hi] = DEFAULT_DEVICE_NUMBER.to_le_bytes();
    assert_eq!(uart.tx_data(), Frame::new(0x8B, 1, lo, hi).to_bytes());
}

#[test]
fn startup_request_announces_identity_over_the_wire() {
    let (mut link, mut dispatcher, mut uart) = device();

    uart.inject_rx_data(&Frame::new(0x84, 0, 0, 0).to_bytes());
    link.service(&mut uart, &mut dispatcher).unwrap();

    let [lo, hi] = DEFAULT_DEVICE_NUMBER.to_le_bytes();
    let mut expected = Vec::new();
    expected.extend_from_slice(&Frame::new(0x84, 0, 0, 0).to_bytes());
    expected.extend_from_slice(&Frame::new(0x09, b'v', VERSION_MAJOR, VERSION_MINOR).to_bytes());
    expected.extend_from_slice(&Frame::new(0x0B, 1, lo, hi).to_bytes());
    assert_eq!(uart.tx_data(), expected.as_slice());
}

#[test]
fn boot_announcements_can_be_sent_before_any_request() {
    let (mut link, dispatcher, mut uart) = device();

    for frame in dispatcher.startup_frames().unwrap() {
        link.send_frame(&frame).unwrap();
    }
    link.pump(&mut uart).unwrap();

    // Three 5-byte frames, startup first
    assert_eq!(uart.tx_data().len(), 15);
    assert_eq!(&uart.tx_data()[..5], Frame::new(0x04, 0, 0, 0).to_bytes());
}

#[test]
fn erase_then_read_back_erased_pattern() {
    let (mut link, mut dispatcher, mut uart) = device();

    // Seeding the configuration at init already erased the sector
    let erases_before = dispatcher.store().sequencer().erase_count();

    uart.inject_rx_data(&Frame::new(0x87, 8, 0, 0xFF).to_bytes());
    link.service(&mut uart, &mut dispatcher).unwrap();
    assert_eq!(uart.tx_data(), Frame::new(0x87, 8, 0, 0xFF).to_bytes());
    assert_eq!(
        dispatcher.store().sequencer().erase_count(),
        erases_before + 1
    );

    uart.clear_tx_data();
    uart.inject_rx_data(&Frame::new(0x88, 0, 0, 0).to_bytes());
    link.service(&mut uart, &mut dispatcher).unwrap();
    assert_eq!(uart.tx_data(), Frame::new(0x88, 0, 0, 0xFF).to_bytes());
}

#[test]
fn set_then_get_device_mode_over_the_wire() {
    let (mut link, mut dispatcher, mut uart) = device();

    uart.inject_rx_data(&Frame::new(0x8D, 2, 0x07, 0x00).to_bytes());
    link.service(&mut uart, &mut dispatcher).unwrap();
    assert_eq!(uart.tx_data(), Frame::new(0x8D, 2, 0x07, 0x00).to_bytes());

    uart.clear_tx_data();
    uart.inject_rx_data(&Frame::new(0x8D, 1, 0, 0).to_bytes());
    link.service(&mut uart, &mut dispatcher).unwrap();
    assert_eq!(uart.tx_data(), Frame::new(0x8D, 1, 0x07, 0x00).to_bytes());
}

#[test]
fn back_to_back_requests_each_get_a_reply() {
    let (mut link, mut dispatcher, mut uart) = device();

    let mut stream = Vec::new();
    stream.extend_from_slice(&Frame::new(0x89, 0, 0, 0).to_bytes());
    stream.extend_from_slice(&Frame::new(0x8C, 12, 34, 56).to_bytes());
    uart.inject_rx_data(&stream);

    let dispatched = link.service(&mut uart, &mut dispatcher).unwrap();
    assert_eq!(dispatched, 2);

    let mut expected = Vec::new();
    expected.extend_from_slice(&Frame::new(0x89, b'v', VERSION_MAJOR, VERSION_MINOR).to_bytes());
    expected.extend_from_slice(&Frame::new(0x8C, 12, 34, 56).to_bytes());
    assert_eq!(uart.tx_data(), expected.as_slice());
    assert_eq!(dispatcher.rtc().time(), (12, 34, 56));
}
