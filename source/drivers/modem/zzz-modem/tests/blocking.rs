//! CONTEXT: Blocking and non-blocking device behaviour against a threaded loopback peer
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Stable
//! TEST_COVERAGE: 5 integration tests
//!
//! TEST_SCENARIOS:
//!   - blocked_read_resumes_after_peer_sends(): reader parks on empty RX, peer produces + raises
//!   - blocked_write_resumes_after_peer_drains(): writer parks on full TX, peer consumes + raises
//!   - interrupt_without_data_keeps_reader_parked(): spurious raise, reader re-tests and sleeps
//!   - split_halves_echo_through_peer(): writer and reader threads against an echoing peer
//!   - non_blocking_reports_dropped_and_empty(): no parking under NonBlocking
//!
//! DEPENDENCIES:
//!   - modem_hal::RegisterFile: shared window
//!   - modem_ring::LoopbackPeer: hardware-side roles
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use modem_hal::RegisterFile;
use modem_ring::{LoopbackPeer, RegisterMap};
use zzz_modem::{DeviceConfig, ModemDevice, Policy, RxOutcome, TxOutcome};

const PARKED: Duration = Duration::from_millis(100);
const DEADLINE: Duration = Duration::from_secs(10);

fn open(policy: Policy) -> (Arc<RegisterFile>, ModemDevice<RegisterFile>) {
    let regs = Arc::new(RegisterFile::new(RegisterMap::REFERENCE.window_len()));
    let cfg = DeviceConfig { policy, ..DeviceConfig::default() };
    let dev = ModemDevice::open(Arc::clone(&regs), &cfg).unwrap();
    (regs, dev)
}

#[test]
fn blocked_read_resumes_after_peer_sends() {
    let (regs, dev) = open(Policy::Blocking);
    let irq = dev.irq_line();
    let (_writer, mut reader) = dev.split();
    let (done_tx, done_rx) = mpsc::channel();

    let handle = thread::spawn(move || {
        let mut buf = [0u8; 32];
        let len = reader.read(&mut buf).unwrap().unwrap();
        done_tx.send(buf[..len].to_vec()).unwrap();
    });

    assert!(done_rx.recv_timeout(PARKED).is_err(), "reader returned on an empty ring");

    let mut peer = LoopbackPeer::new(&RegisterMap::REFERENCE).unwrap();
    assert_eq!(peer.send(&*regs, b"ping").unwrap(), TxOutcome::Sent);
    irq.raise();

    assert_eq!(done_rx.recv_timeout(DEADLINE).unwrap(), b"ping".to_vec());
    handle.join().unwrap();
}

#[test]
fn blocked_write_resumes_after_peer_drains() {
    let (regs, dev) = open(Policy::Blocking);
    let irq = dev.irq_line();
    let (mut writer, _reader) = dev.split();
    let payload = vec![0xa5u8; 500];

    assert_eq!(writer.send(&payload).unwrap(), TxOutcome::Sent);
    assert_eq!(writer.send(&payload).unwrap(), TxOutcome::Sent);

    let (done_tx, done_rx) = mpsc::channel();
    let third = payload.clone();
    let handle = thread::spawn(move || {
        let sent = writer.write(&third).unwrap();
        done_tx.send(sent).unwrap();
    });

    assert!(done_rx.recv_timeout(PARKED).is_err(), "writer returned on a full ring");

    let mut peer = LoopbackPeer::new(&RegisterMap::REFERENCE).unwrap();
    let drained = peer.drain(&*regs).unwrap();
    assert_eq!(drained, vec![payload.clone(), payload.clone()]);
    irq.raise();

    assert_eq!(done_rx.recv_timeout(DEADLINE).unwrap(), 500);
    handle.join().unwrap();
    assert_eq!(peer.drain(&*regs).unwrap(), vec![payload]);
}

#[test]
fn interrupt_without_data_keeps_reader_parked() {
    let (regs, dev) = open(Policy::Blocking);
    let irq = dev.irq_line();
    let (_writer, mut reader) = dev.split();
    let (done_tx, done_rx) = mpsc::channel();

    let handle = thread::spawn(move || {
        let outcome = reader.recv().unwrap();
        done_tx.send(outcome).unwrap();
    });

    irq.raise();
    irq.raise();
    assert!(done_rx.recv_timeout(PARKED).is_err(), "reader returned without data");

    let mut peer = LoopbackPeer::new(&RegisterMap::REFERENCE).unwrap();
    peer.send(&*regs, b"late").unwrap();
    irq.raise();

    assert_eq!(done_rx.recv_timeout(DEADLINE).unwrap(), RxOutcome::Message(b"late".to_vec()));
    handle.join().unwrap();
    assert_eq!(irq.count(), 3);
}

#[test]
fn split_halves_echo_through_peer() {
    let (regs, dev) = open(Policy::Blocking);
    let irq = dev.irq_line();
    let (mut writer, mut reader) = dev.split();
    let messages: Vec<Vec<u8>> = (0..64u8).map(|i| vec![i; (i as usize % 40) + 1]).collect();

    let expected = messages.clone();
    let reader_thread = thread::spawn(move || {
        let mut got = Vec::new();
        while got.len() < expected.len() {
            if let RxOutcome::Message(msg) = reader.recv().unwrap() {
                got.push(msg);
            }
        }
        assert_eq!(got, expected);
    });
    let writer_thread = thread::spawn(move || {
        for msg in &messages {
            writer.write(msg).unwrap();
        }
    });

    // Peer loop: service, raise, repeat until both host threads finish.
    let mut peer = LoopbackPeer::new(&RegisterMap::REFERENCE).unwrap();
    while !(reader_thread.is_finished() && writer_thread.is_finished()) {
        peer.service(&*regs).unwrap();
        irq.raise();
        thread::sleep(Duration::from_millis(1));
    }
    writer_thread.join().unwrap();
    reader_thread.join().unwrap();
}

#[test]
fn non_blocking_reports_dropped_and_empty() {
    let (_regs, mut dev) = open(Policy::NonBlocking);
    let mut buf = [0u8; 16];
    assert_eq!(dev.read(&mut buf).unwrap(), None);

    let payload = [1u8; 1000];
    assert_eq!(dev.write(&payload).unwrap(), 1000);
    assert_eq!(dev.write(b"x").unwrap(), 1);
    assert_eq!(dev.write(&[2u8; 8]).unwrap(), 0);

    dev.set_policy(Policy::Blocking);
    let (mut writer, _reader) = dev.split();
    assert_eq!(writer.policy(), Policy::Blocking);
    writer.set_policy(Policy::NonBlocking);
    assert_eq!(writer.send(&[2u8; 8]).unwrap(), TxOutcome::Dropped);
}
