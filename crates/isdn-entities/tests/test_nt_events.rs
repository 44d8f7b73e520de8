mod common;

use isdn_core::{CallDirection, debug};
use isdn_entities::{CallHandle, Transport};
use isdn_pdus::enums::event::Event;
use isdn_saps::{Frame, addr, prim};

use common::{ComponentTest, Sink, default_test_config};

fn answering_sink() -> Sink {
    Sink::new()
        .answer(2, Event::Setup, Event::Connect)
        .answer(1, Event::Connect, Event::ConnectAcknowledge)
}

fn connected_call(test: &ComponentTest) -> (CallHandle, CallHandle) {
    test.bring_up();
    let te = test.mgr.get_free_bc(1, 0, CallDirection::Outgoing, false).unwrap();
    test.mgr.send_event(&te, Event::Setup).unwrap();
    test.deliver_all();
    let events = test.take_events();
    let nt = ComponentTest::find(&events, 2, Event::Setup).unwrap().handle();
    test.loopback.take_written();
    (te, nt)
}

/// Outgoing call from the network side that nobody answers
fn nt_outgoing(test: &ComponentTest) -> CallHandle {
    test.bring_up();
    let call = test.mgr.get_free_bc(2, 0, CallDirection::Outgoing, false).unwrap();
    test.mgr.send_event(&call, Event::Setup).unwrap();
    test.deliver_all();
    test.take_events();
    call
}

fn written_on(test: &ComponentTest, prim: u32, dinfo: u32) -> bool {
    test.loopback
        .take_written()
        .iter()
        .any(|f| f.prim == prim && f.dinfo == dinfo && f.port() == 2)
}

#[test]
fn test_setup_confirm_adopts_new_reference() {
    debug::setup_logging_verbose();
    let test = ComponentTest::new(default_test_config(), Sink::new());
    let call = nt_outgoing(&test);
    assert_eq!(test.mgr.with_call(&call, |c| c.l3id), Some(0xff00));

    let new: u32 = 0x0002_0005;
    test.loopback.inject(Frame::new(
        prim::CC_SETUP | prim::CONFIRM,
        addr::port_addr(2),
        0xff00,
        new.to_le_bytes().to_vec(),
    ));
    test.deliver_all();

    let events = test.take_events();
    assert_eq!(ComponentTest::events_on(&events, 2), vec![Event::NewL3Id]);
    assert_eq!(test.mgr.with_call(&call, |c| c.l3id), Some(new));
}

#[test]
fn test_new_cr_gives_back_local_reference() {
    debug::setup_logging_verbose();
    let test = ComponentTest::new(default_test_config(), Sink::new());
    let call = nt_outgoing(&test);
    assert!(test.details(2).contains("refs 1"));

    let new: u32 = 0x0001_0042;
    test.loopback.inject(Frame::new(
        prim::CC_NEW_CR | prim::INDICATION,
        addr::port_addr(2),
        0xff00,
        new.to_le_bytes().to_vec(),
    ));
    test.deliver_all();

    assert_eq!(ComponentTest::events_on(&test.take_events(), 2), vec![Event::NewL3Id]);
    assert_eq!(test.mgr.with_call(&call, |c| c.l3id), Some(new));
    assert!(test.details(2).contains("refs 0"));
}

#[test]
fn test_release_cr_frees_process_id() {
    debug::setup_logging_verbose();
    let test = ComponentTest::new(default_test_config(), Sink::new());
    let call = nt_outgoing(&test);

    test.loopback
        .inject(Frame::control(prim::CC_RELEASE_CR | prim::INDICATION, addr::port_addr(2), 0xff00));
    test.deliver_all();
    assert!(test.mgr.with_call(&call, |_| ()).is_none());
    let d = test.details(2);
    assert!(d.contains("channels 0/2 calls 0 held 0 refs 0"), "{}", d);
}

#[test]
fn test_suspend_rejected() {
    debug::setup_logging_verbose();
    let test = ComponentTest::new(default_test_config(), Sink::new());
    test.bring_up();
    test.loopback.take_written();

    test.loopback
        .inject(Frame::control(prim::CC_SUSPEND | prim::INDICATION, addr::port_addr(2), 0x10033));
    test.deliver_all();
    assert!(written_on(&test, prim::CC_SUSPEND_REJECT | prim::REQUEST, 0x10033));
    assert!(ComponentTest::events_on(&test.take_events(), 2).is_empty());
}

#[test]
fn test_disconnect_matched_on_upper_reference() {
    debug::setup_logging_verbose();
    let test = ComponentTest::new(default_test_config(), answering_sink());
    let (_te, nt) = connected_call(&test);

    test.loopback
        .inject(Frame::control(prim::CC_DISCONNECT | prim::INDICATION, addr::port_addr(2), 0x10099));
    test.deliver_all();

    let events = test.take_events();
    let disc = ComponentTest::find(&events, 2, Event::Disconnect).unwrap();
    assert_eq!(disc.handle(), nt);
}

#[test]
fn test_release_confirm_answers_and_delivers_release() {
    debug::setup_logging_verbose();
    let test = ComponentTest::new(default_test_config(), answering_sink());
    let (te, nt) = connected_call(&test);
    let l3id = test.mgr.with_call(&nt, |c| c.l3id).unwrap();

    test.loopback
        .inject(Frame::control(prim::CC_RELEASE | prim::CONFIRM, addr::port_addr(2), l3id));
    test.mgr.handle_frame(test.loopback.read(std::time::Duration::ZERO).unwrap().unwrap());
    let events = test.take_events();
    assert_eq!(ComponentTest::events_on(&events, 2), vec![Event::Release]);
    test.mgr.flush_queues();
    assert!(written_on(&test, prim::CC_RELEASE_COMPLETE | prim::REQUEST, l3id));

    // The peer clears too and the device drops the reference on both sides
    test.deliver_all();
    let events = test.take_events();
    assert_eq!(ComponentTest::events_on(&events, 1), vec![Event::ReleaseComplete]);
    assert!(test.mgr.with_call(&nt, |_| ()).is_none());
    assert!(test.mgr.with_call(&te, |_| ()).is_none());
    assert!(test.details(2).contains("calls 0"));
}

#[test]
fn test_setup_without_free_context_is_refused() {
    debug::setup_logging_verbose();
    let test = ComponentTest::new(default_test_config(), Sink::new());
    test.bring_up();

    // Fill all three contexts, the next SETUP has nowhere to go
    for l3id in [0x10001, 0x10002, 0x10003, 0x10004] {
        test.loopback
            .inject(Frame::control(prim::CC_SETUP | prim::INDICATION, addr::port_addr(2), l3id));
    }
    test.loopback.take_written();
    test.deliver_all();

    assert_eq!(ComponentTest::events_on(&test.take_events(), 2).len(), 3);
    assert!(test.details(2).contains("calls 3"));
    assert!(test.loopback.take_written().iter().any(|f| {
        f.prim == prim::CC_RELEASE_COMPLETE | prim::REQUEST && f.dinfo == 0x10004
    }));
}
