use libpm3::Error;
use libpm3::transport::{MockTransport, Transport};

#[test]
fn empty_queue_times_out() {
    let mut mock = MockTransport::new();
    match mock.receive(25) {
        Err(Error::Timeout { timeout_ms }) => assert_eq!(timeout_ms, 25),
        other => panic!("expected timeout, got {:?}", other),
    }
}

#[test]
fn send_on_closed_transport_fails() {
    let mut mock = MockTransport::closed();
    assert!(matches!(mock.send(&[1]), Err(Error::Transport(_))));
    assert!(mock.sent.is_empty());
}

#[test]
fn injected_send_failures_are_consumed() {
    let shared = MockTransport::new().into_shared();
    shared.set_send_failures(1);
    let mut t: Box<dyn Transport> = Box::new(shared.clone());
    assert!(matches!(t.send(&[1]), Err(Error::Transport(_))));
    t.send(&[2]).unwrap();
    assert_eq!(shared.sent(), vec![vec![2]]);
}
