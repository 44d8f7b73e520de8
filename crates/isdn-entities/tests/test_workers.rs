mod common;

use std::time::{Duration, Instant};

use isdn_core::debug;
use isdn_entities::{Transport, TransportErr};

use common::{ComponentTest, Sink, default_test_config};

#[test]
fn test_threads_bring_ports_up_and_stop() {
    debug::setup_logging_verbose();
    let test = ComponentTest::new(default_test_config(), Sink::new());
    assert_eq!(test.mgr.start(), Ok(()));
    assert!(test.mgr.is_running());
    // A second start leaves the running threads alone
    assert_eq!(test.mgr.start(), Ok(()));

    test.mgr.get_port_up(1).unwrap();
    let deadline = Instant::now() + Duration::from_secs(2);
    while !(test.mgr.port_up(1) && test.mgr.port_up(2)) {
        assert!(Instant::now() < deadline, "ports did not come up");
        std::thread::sleep(Duration::from_millis(10));
    }

    test.mgr.destroy();
    assert!(!test.mgr.is_running());
    assert_eq!(test.loopback.read(Duration::ZERO), Err(TransportErr::Closed));
}
