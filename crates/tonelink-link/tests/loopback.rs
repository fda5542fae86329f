//! End-to-end tests through the full stack — session, ARQ, framing,
//! AFSK, channel — over software loopback, with no audio hardware.

use std::thread;
use std::time::Duration;
use tonelink_afsk::AfskParams;
use tonelink_io::{Channel, ChannelParams};
use tonelink_link::{LinkError, LinkParams, Modem};

/// Channel timing tightened for tests: loopback injection is instant, so
/// short silence windows are safe and shave seconds off each exchange.
fn test_channel_params() -> ChannelParams {
    ChannelParams {
        silence_duration: Duration::from_millis(100),
        min_samples: 1_000,
        ..ChannelParams::default()
    }
}

fn test_link_params() -> LinkParams {
    LinkParams {
        ack_timeout: Duration::from_secs(2),
        max_retries: 3,
        turnaround_guard: Duration::from_millis(20),
    }
}

/// Scenario: loopback ping. The modem hears its own transmission; the
/// received bytes must equal the payload exactly.
#[test]
fn loopback_ping() {
    let afsk = AfskParams::default();
    let channel = Channel::loopback(test_channel_params(), afsk.sample_rate);
    let mut modem = Modem::new(channel, afsk, test_link_params());

    let payload = b"Hello from acoustic modem! Testing 1-2-3.";
    modem.transmit(payload).unwrap();
    let received = modem.receive(Duration::from_secs(5)).unwrap();

    assert_eq!(received, payload);
}

/// Scenario: maximum-length payload round-trips intact.
#[test]
fn loopback_max_payload() {
    let afsk = AfskParams::default();
    let channel = Channel::loopback(test_channel_params(), afsk.sample_rate);
    let mut modem = Modem::new(channel, afsk, test_link_params());

    let payload: Vec<u8> = (0..64u8).collect();
    modem.transmit(&payload).unwrap();
    let received = modem.receive(Duration::from_secs(5)).unwrap();

    assert_eq!(received, payload);
}

/// Receive with nothing on the air times out.
#[test]
fn loopback_receive_timeout() {
    let afsk = AfskParams::default();
    let channel = Channel::loopback(test_channel_params(), afsk.sample_rate);
    let mut modem = Modem::new(channel, afsk, test_link_params());

    let result = modem.receive(Duration::from_millis(300));
    assert!(matches!(result, Err(LinkError::Timeout)));
}

/// Two modems on a paired loopback: handshake, reliable multi-segment
/// transfer, graceful close. The receiver's delivered byte stream must
/// equal the sender's input exactly.
#[test]
fn paired_session_end_to_end() {
    let afsk = AfskParams::default();
    let (channel_a, channel_b) = Channel::pair(test_channel_params(), afsk.sample_rate);
    let modem_a = Modem::new(channel_a, afsk, test_link_params());
    let modem_b = Modem::new(channel_b, afsk, test_link_params());

    let responder = thread::spawn(move || {
        let mut connection = modem_b.accept(Duration::from_secs(20)).unwrap();
        let mut received = Vec::new();
        loop {
            match connection.recv(Duration::from_secs(10)) {
                Ok(segment) => received.extend(segment),
                Err(LinkError::Closed) => break,
                Err(e) => panic!("responder error: {e}"),
            }
        }
        received
    });

    let mut connection = modem_a.connect().unwrap();
    // Three segments' worth, with a partial tail.
    let payload: Vec<u8> = (0..150u16).map(|i| (i % 251) as u8).collect();
    connection.send(&payload).unwrap();
    connection.close().unwrap();

    assert_eq!(responder.join().unwrap(), payload);
}
