//! Transport and session tests over an in-memory link with fault
//! injection: dropped ACKs, dropped frames, resets, and retry exhaustion.

use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tonelink_link::{Arq, Connection, Event, FrameLink, LinkError, LinkParams, Role, SessionState};
use tonelink_proto::{Frame, FrameType};

/// A wire-log entry: which side attempted the send, the frame, and
/// whether the fault filter let it through.
#[derive(Debug, Clone)]
struct LogEntry {
    from: &'static str,
    frame: Frame,
    delivered: bool,
}

type WireLog = Arc<Mutex<Vec<LogEntry>>>;
type Filter = Box<dyn FnMut(&Frame) -> bool + Send>;

/// In-memory frame link with a per-side outgoing fault filter.
struct MockLink {
    name: &'static str,
    tx: Sender<Frame>,
    rx: Receiver<Frame>,
    filter: Filter,
    log: WireLog,
}

impl FrameLink for MockLink {
    fn send_frame(&mut self, frame: &Frame) -> Result<(), LinkError> {
        let delivered = (self.filter)(frame);
        self.log
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(LogEntry {
                from: self.name,
                frame: frame.clone(),
                delivered,
            });
        if delivered {
            let _ = self.tx.send(frame.clone());
        }
        Ok(())
    }

    fn recv_frame(&mut self, timeout: Duration) -> Result<Option<Frame>, LinkError> {
        match self.rx.recv_timeout(timeout) {
            Ok(frame) => Ok(Some(frame)),
            Err(_) => Ok(None),
        }
    }
}

/// Two cross-connected mock links and the shared wire log.
fn mock_pair() -> (MockLink, MockLink, WireLog) {
    let (a_tx, b_rx) = channel();
    let (b_tx, a_rx) = channel();
    let log: WireLog = Arc::new(Mutex::new(Vec::new()));
    let a = MockLink {
        name: "A",
        tx: a_tx,
        rx: a_rx,
        filter: Box::new(|_| true),
        log: Arc::clone(&log),
    };
    let b = MockLink {
        name: "B",
        tx: b_tx,
        rx: b_rx,
        filter: Box::new(|_| true),
        log: Arc::clone(&log),
    };
    (a, b, log)
}

/// Tight timing so fault-recovery tests run in milliseconds.
fn fast_params() -> LinkParams {
    LinkParams {
        ack_timeout: Duration::from_millis(60),
        max_retries: 5,
        turnaround_guard: Duration::from_millis(1),
    }
}

/// Collect B-side events for a fixed window.
fn collect_events(mut arq: Arq<MockLink>, window: Duration) -> thread::JoinHandle<Vec<Event>> {
    thread::spawn(move || {
        let mut events = Vec::new();
        let start = Instant::now();
        while start.elapsed() < window {
            if let Ok(Some(event)) = arq.next_event(Duration::from_millis(20)) {
                events.push(event);
            }
        }
        events
    })
}

fn logged(log: &WireLog) -> Vec<LogEntry> {
    log.lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

// ---------------------------------------------------------------------------
// ARQ: delivery, loss recovery, exhaustion
// ---------------------------------------------------------------------------

#[test]
fn data_delivered_exactly_once() {
    let (a, b, _log) = mock_pair();
    let mut sender = Arq::new(a, fast_params());
    let receiver = collect_events(Arq::new(b, fast_params()), Duration::from_millis(300));

    sender.send_data(b"hello").unwrap();

    let events = receiver.join().unwrap();
    assert_eq!(events, vec![Event::Data(b"hello".to_vec())]);
}

#[test]
fn ack_loss_recovered_by_retransmission() {
    let (a, mut b, log) = mock_pair();
    // Drop the first ACK the receiver sends.
    let mut dropped = false;
    b.filter = Box::new(move |frame| {
        if frame.frame_type == FrameType::Ack && !dropped {
            dropped = true;
            return false;
        }
        true
    });

    let mut sender = Arq::new(a, fast_params());
    let receiver = collect_events(Arq::new(b, fast_params()), Duration::from_millis(400));

    sender.send_data(b"resilient").unwrap();
    let events = receiver.join().unwrap();

    // Delivered exactly once despite the duplicate on the wire.
    assert_eq!(events, vec![Event::Data(b"resilient".to_vec())]);

    let entries = logged(&log);
    let data_sent: Vec<_> = entries
        .iter()
        .filter(|e| e.from == "A" && e.frame.frame_type == FrameType::Data)
        .collect();
    let acks_attempted: Vec<_> = entries
        .iter()
        .filter(|e| e.from == "B" && e.frame.frame_type == FrameType::Ack)
        .collect();

    // The retransmission carries the same sequence bit.
    assert_eq!(data_sent.len(), 2);
    assert_eq!(data_sent[0].frame.seq & 1, data_sent[1].frame.seq & 1);
    // The duplicate was re-acknowledged: two ACKs, first one eaten.
    assert_eq!(acks_attempted.len(), 2);
    assert!(!acks_attempted[0].delivered);
    assert!(acks_attempted[1].delivered);
}

#[test]
fn lost_frame_recovered_by_retransmission() {
    let (mut a, b, log) = mock_pair();
    // The receiver's framer silently drops a corrupt frame; model that by
    // eating the sender's first DATA on the wire.
    let mut dropped = false;
    a.filter = Box::new(move |frame| {
        if frame.frame_type == FrameType::Data && !dropped {
            dropped = true;
            return false;
        }
        true
    });

    let mut sender = Arq::new(a, fast_params());
    let receiver = collect_events(Arq::new(b, fast_params()), Duration::from_millis(400));

    sender.send_data(b"second try").unwrap();
    let events = receiver.join().unwrap();
    assert_eq!(events, vec![Event::Data(b"second try".to_vec())]);

    let data_attempts = logged(&log)
        .iter()
        .filter(|e| e.from == "A" && e.frame.frame_type == FrameType::Data)
        .count();
    assert_eq!(data_attempts, 2);
}

#[test]
fn retry_exhaustion_surfaces_link_failure() {
    let (a, mut b, log) = mock_pair();
    // Every ACK vanishes.
    b.filter = Box::new(|frame| frame.frame_type != FrameType::Ack);

    let params = fast_params();
    let mut sender = Arq::new(a, params);
    let receiver = collect_events(Arq::new(b, params), Duration::from_millis(800));

    let result = sender.send_data(b"doomed");
    assert!(matches!(result, Err(LinkError::LinkFailure)));

    // One initial transmission plus max_retries retransmissions: the
    // receiver never sees more duplicates than the retry budget.
    let data_attempts = logged(&log)
        .iter()
        .filter(|e| e.from == "A" && e.frame.frame_type == FrameType::Data)
        .count();
    assert_eq!(data_attempts, 1 + params.max_retries as usize);

    // The payload itself was delivered upward exactly once.
    let events = receiver.join().unwrap();
    assert_eq!(events, vec![Event::Data(b"doomed".to_vec())]);
}

#[test]
fn sequence_bit_alternates_across_segments() {
    let (a, b, log) = mock_pair();
    let mut sender = Arq::new(a, fast_params());
    let receiver = collect_events(Arq::new(b, fast_params()), Duration::from_millis(500));

    sender.send_data(b"one").unwrap();
    sender.send_data(b"two").unwrap();
    sender.send_data(b"three").unwrap();

    let events = receiver.join().unwrap();
    assert_eq!(events.len(), 3);

    let seqs: Vec<u8> = logged(&log)
        .iter()
        .filter(|e| e.from == "A" && e.frame.frame_type == FrameType::Data)
        .map(|e| e.frame.seq & 1)
        .collect();
    assert_eq!(seqs, vec![0, 1, 0]);
}

#[test]
fn duplicate_data_delivers_once_but_acks_twice() {
    let (mut a, b, log) = mock_pair();

    let frame = Frame::data(0, b"twice".to_vec()).unwrap();
    a.send_frame(&frame).unwrap();
    a.send_frame(&frame).unwrap();

    let mut receiver = Arq::new(b, fast_params());
    let first = receiver.next_event(Duration::from_millis(100)).unwrap();
    assert_eq!(first, Some(Event::Data(b"twice".to_vec())));
    // The duplicate is absorbed silently; no second event emerges.
    let second = receiver.next_event(Duration::from_millis(100)).unwrap();
    assert_eq!(second, None);

    let acks = logged(&log)
        .iter()
        .filter(|e| e.from == "B" && e.frame.frame_type == FrameType::Ack)
        .count();
    assert_eq!(acks, 2);
}

#[test]
fn nak_triggers_immediate_retransmission() {
    let (a, mut b, _log) = mock_pair();
    // Generous timeout: if the NAK were ignored, the test would sit out
    // the full second before retransmitting.
    let params = LinkParams {
        ack_timeout: Duration::from_secs(1),
        max_retries: 2,
        turnaround_guard: Duration::from_millis(1),
    };

    let responder = thread::spawn(move || {
        // First DATA gets a NAK, the retransmission gets the ACK.
        let first = b
            .recv_frame(Duration::from_secs(2))
            .unwrap()
            .expect("first DATA");
        b.send_frame(&Frame::control(FrameType::Nak, first.seq))
            .unwrap();
        let second = b
            .recv_frame(Duration::from_secs(2))
            .unwrap()
            .expect("retransmitted DATA");
        b.send_frame(&Frame::ack(second.seq)).unwrap();
    });

    let mut sender = Arq::new(a, params);
    let start = Instant::now();
    sender.send_data(b"nudged").unwrap();
    let elapsed = start.elapsed();

    responder.join().unwrap();
    assert!(
        elapsed < Duration::from_millis(500),
        "NAK should cut the wait short, took {elapsed:?}"
    );
}

// ---------------------------------------------------------------------------
// Session: handshake, close, reset
// ---------------------------------------------------------------------------

#[test]
fn handshake_frames_in_order() {
    let (a, b, log) = mock_pair();
    let params = fast_params();

    let responder =
        thread::spawn(move || Connection::accept(b, params, Duration::from_secs(2)).unwrap());
    let initiator = Connection::connect(a, params).unwrap();
    let responder = responder.join().unwrap();

    assert_eq!(initiator.state(), SessionState::Established);
    assert_eq!(responder.state(), SessionState::Established);
    assert_eq!(initiator.role(), Role::Initiator);
    assert_eq!(responder.role(), Role::Responder);

    // The three legs appear in order (retransmissions of a leg are legal,
    // reordering is not).
    let entries = logged(&log);
    let position = |wanted: FrameType| {
        entries
            .iter()
            .position(|e| e.frame.frame_type == wanted)
            .unwrap_or_else(|| panic!("{wanted:?} never sent"))
    };
    let syn = position(FrameType::Syn);
    let syn_ack = position(FrameType::SynAck);
    let ack = position(FrameType::Ack);
    assert!(syn < syn_ack && syn_ack < ack);
    assert_eq!(entries[0].frame.frame_type, FrameType::Syn);
}

#[test]
fn session_transfer_and_graceful_close() {
    let (a, b, _log) = mock_pair();
    let params = fast_params();

    let responder = thread::spawn(move || {
        let mut connection = Connection::accept(b, params, Duration::from_secs(2)).unwrap();
        let mut received = Vec::new();
        loop {
            match connection.recv(Duration::from_secs(1)) {
                Ok(segment) => received.extend(segment),
                Err(LinkError::Closed) => break,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(connection.state(), SessionState::Closed);
        received
    });

    let mut initiator = Connection::connect(a, params).unwrap();
    // More than one segment's worth, to cover splitting.
    let payload: Vec<u8> = (0..150u8).collect();
    initiator.send(&payload).unwrap();
    initiator.close().unwrap();
    // close() is idempotent.
    initiator.close().unwrap();
    assert_eq!(initiator.state(), SessionState::Closed);

    assert_eq!(responder.join().unwrap(), payload);
}

#[test]
fn send_after_close_is_rejected() {
    let (a, b, _log) = mock_pair();
    let params = fast_params();

    let responder = thread::spawn(move || {
        let mut connection = Connection::accept(b, params, Duration::from_secs(2)).unwrap();
        // Service the initiator's FIN.
        let _ = connection.recv(Duration::from_secs(1));
    });

    let mut initiator = Connection::connect(a, params).unwrap();
    initiator.close().unwrap();
    assert!(matches!(
        initiator.send(b"too late"),
        Err(LinkError::Closed)
    ));
    responder.join().unwrap();
}

#[test]
fn reset_surfaces_peer_reset() {
    let (a, b, _log) = mock_pair();
    let params = fast_params();

    let responder = thread::spawn(move || {
        let mut connection = Connection::accept(b, params, Duration::from_secs(2)).unwrap();
        connection.abort().unwrap();
        assert_eq!(connection.state(), SessionState::Closed);
    });

    let mut initiator = Connection::connect(a, params).unwrap();
    responder.join().unwrap();

    let result = initiator.recv(Duration::from_secs(1));
    assert!(matches!(result, Err(LinkError::PeerReset)));
    assert_eq!(initiator.state(), SessionState::Closed);
}

#[test]
fn accept_times_out_without_peer() {
    let (_a, b, _log) = mock_pair();
    let result = Connection::accept(b, fast_params(), Duration::from_millis(100));
    assert!(matches!(result, Err(LinkError::Timeout)));
}

#[test]
fn lost_handshake_ack_recovered_by_early_data() {
    let (mut a, b, _log) = mock_pair();
    // The initiator's handshake-completing ACK is lost; its first DATA
    // must complete the handshake on the responder instead.
    let mut dropped = false;
    a.filter = Box::new(move |frame| {
        if frame.frame_type == FrameType::Ack && !dropped {
            dropped = true;
            return false;
        }
        true
    });
    let params = fast_params();

    let responder = thread::spawn(move || {
        let mut connection = Connection::accept(b, params, Duration::from_secs(2)).unwrap();
        connection.recv(Duration::from_secs(1)).unwrap()
    });

    let mut initiator = Connection::connect(a, params).unwrap();
    initiator.send(b"early bird").unwrap();

    assert_eq!(responder.join().unwrap(), b"early bird".to_vec());
}
