mod common;

use isdn_core::{CallDirection, debug};
use isdn_entities::{CallHandle, SendErr};
use isdn_pdus::enums::event::Event;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use common::{ComponentTest, Sink, default_test_config};

/// Number of B-channels the port has marked in use
fn channels_in_use(test: &ComponentTest, port: u8) -> usize {
    let details = test.details(port);
    let count = details.split("channels ").nth(1).and_then(|s| s.split('/').next()).unwrap();
    count.parse().unwrap()
}

#[test]
fn test_nt_channels_never_shared() {
    debug::setup_logging_verbose();
    let test = ComponentTest::new(default_test_config(), Sink::new());
    test.bring_up();

    let mut rng = StdRng::seed_from_u64(0x931);
    let mut live: Vec<CallHandle> = Vec::new();
    for _ in 0..400 {
        if live.is_empty() || rng.random_bool(0.6) {
            let want = if rng.random_bool(0.3) { rng.random_range(1..=2) } else { 0 };
            let Some(call) = test.mgr.get_free_bc(2, want, CallDirection::Outgoing, rng.random_bool(0.5)) else {
                continue;
            };
            match test.mgr.send_event(&call, Event::Setup) {
                Ok(()) => live.push(call),
                Err(e) => {
                    assert_eq!(e, SendErr::NoChannel);
                    test.mgr.release(&call);
                }
            }
        } else {
            let call = live.swap_remove(rng.random_range(0..live.len()));
            test.mgr.send_event(&call, Event::ReleaseComplete).unwrap();
        }
        test.deliver_all();

        let mut channels: Vec<u8> = live
            .iter()
            .map(|c| test.mgr.with_call(c, |ctx| ctx.channel()).unwrap())
            .collect();
        assert!(channels.iter().all(|c| (1..=2).contains(c)), "{:?}", channels);
        channels.sort_unstable();
        channels.dedup();
        assert_eq!(channels.len(), live.len());
        assert_eq!(channels_in_use(&test, 2), live.len());
    }

    for call in live.drain(..) {
        test.mgr.send_event(&call, Event::ReleaseComplete).unwrap();
    }
    test.deliver_all();
    let d = test.details(2);
    assert!(d.contains("channels 0/2 calls 0 held 0 refs 0"), "{}", d);
    assert!(test.details(1).contains("calls 0"));
}

#[test]
fn test_preselected_channel_is_exclusive() {
    debug::setup_logging_verbose();
    let test = ComponentTest::new(default_test_config(), Sink::new());
    test.bring_up();

    let a = test.mgr.get_free_bc(2, 2, CallDirection::Outgoing, false).unwrap();
    assert!(test.mgr.get_free_bc(2, 2, CallDirection::Outgoing, false).is_none());
    assert!(test.mgr.get_free_bc(2, 3, CallDirection::Outgoing, false).is_none());
    test.mgr.send_event(&a, Event::Setup).unwrap();
    assert_eq!(test.mgr.with_call(&a, |c| c.channel()), Some(2));

    // Hunting downwards from the top lands on the only channel left
    let b = test.mgr.get_free_bc(2, 0, CallDirection::Outgoing, true).unwrap();
    test.mgr.send_event(&b, Event::Setup).unwrap();
    assert_eq!(test.mgr.with_call(&b, |c| c.channel()), Some(1));

    let c = test.mgr.get_free_bc(2, 0, CallDirection::Outgoing, false).unwrap();
    assert_eq!(test.mgr.send_event(&c, Event::Setup), Err(SendErr::NoChannel));
    assert_eq!(SendErr::NoChannel.cause(), 34);
    assert_eq!(channels_in_use(&test, 2), 2);
}
