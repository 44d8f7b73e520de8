mod common;

use isdn_core::{CallDirection, debug};
use isdn_entities::{BchanState, CallHandle};
use isdn_pdus::enums::event::Event;
use isdn_saps::{Frame, prim};

use common::{ComponentTest, Sink, default_test_config};

fn connected_call(test: &ComponentTest) -> (CallHandle, CallHandle) {
    test.bring_up();
    let te = test.mgr.get_free_bc(1, 0, CallDirection::Outgoing, false).unwrap();
    test.mgr.send_event(&te, Event::Setup).unwrap();
    test.deliver_all();
    let events = test.take_events();
    let nt = ComponentTest::find(&events, 2, Event::Setup).unwrap().handle();
    (te, nt)
}

fn answering_sink() -> Sink {
    Sink::new()
        .answer(2, Event::Setup, Event::Connect)
        .answer(1, Event::Connect, Event::ConnectAcknowledge)
}

/// PH_CONTROL requests written with the given command word
fn cmx_words(frames: &[Frame], word: u32) -> usize {
    frames
        .iter()
        .filter(|f| f.prim == prim::PH_CONTROL | prim::REQUEST && f.payload_u32() == Some(word))
        .count()
}

#[test]
fn test_activate_and_deactivate() {
    debug::setup_logging_verbose();
    let test = ComponentTest::new(default_test_config(), answering_sink());
    let (te, _nt) = connected_call(&test);
    assert_eq!(test.mgr.with_call(&te, |c| c.state), Some(BchanState::Setuped));

    assert!(test.mgr.bchannel_activate(&te));
    test.deliver_all();
    assert_eq!(test.mgr.with_call(&te, |c| (c.state, c.active)), Some((BchanState::Activated, true)));
    let events = test.take_events();
    assert_eq!(ComponentTest::events_on(&events, 1), vec![Event::BchanActivated]);

    assert!(test.mgr.bchannel_deactivate(&te));
    test.deliver_all();
    assert_eq!(test.mgr.with_call(&te, |c| (c.state, c.active)), Some((BchanState::Setuped, false)));
}

#[test]
fn test_bridge_waits_for_activation() {
    debug::setup_logging_verbose();
    let test = ComponentTest::new(default_test_config(), answering_sink());
    let (te, nt) = connected_call(&test);
    test.loopback.take_written();

    assert!(test.mgr.bridge(&te, &nt));
    assert_eq!(test.mgr.with_call(&te, |c| c.next_state), Some(Some(BchanState::Bridged)));
    assert_eq!(test.mgr.with_call(&nt, |c| c.next_state), Some(Some(BchanState::Bridged)));

    test.mgr.bchannel_activate(&te);
    test.mgr.bchannel_activate(&nt);
    test.deliver_all();

    let conf = test.mgr.with_call(&te, |c| c.conf_id).unwrap();
    assert_ne!(conf, 0);
    assert_eq!(test.mgr.with_call(&nt, |c| (c.state, c.conf_id)), Some((BchanState::Bridged, conf)));
    assert_eq!(test.mgr.with_call(&te, |c| c.state), Some(BchanState::Bridged));
    let written = test.loopback.take_written();
    assert_eq!(cmx_words(&written, prim::CMX_RECEIVE_OFF), 2);
    assert_eq!(cmx_words(&written, prim::CMX_CONF_JOIN), 2);

    test.take_events();

    assert!(test.mgr.split(&te, &nt));
    test.mgr.flush_queues();
    let written = test.loopback.take_written();
    assert_eq!(cmx_words(&written, prim::CMX_CONF_SPLIT), 2);
    let reactivations = written.iter().filter(|f| f.prim == prim::DL_ESTABLISH | prim::REQUEST).count();
    assert_eq!(reactivations, 2);
    assert_eq!(test.mgr.with_call(&te, |c| (c.state, c.conf_id)), Some((BchanState::Setuped, 0)));
    assert_eq!(test.mgr.with_call(&nt, |c| c.state), Some(BchanState::Setuped));

    // Leaving the conference passes through SETUPED, never BRIDGED -> ACTIVATED
    test.deliver_all();
    assert_eq!(test.mgr.with_call(&te, |c| (c.state, c.active)), Some((BchanState::Activated, true)));
    assert_eq!(test.mgr.with_call(&nt, |c| c.state), Some(BchanState::Activated));
    let events = test.take_events();
    assert_eq!(ComponentTest::events_on(&events, 1), vec![Event::BchanActivated]);
    assert_eq!(ComponentTest::events_on(&events, 2), vec![Event::BchanActivated]);
}

#[test]
fn test_bridge_refused_when_disabled() {
    debug::setup_logging_verbose();
    let mut cfg = default_test_config();
    cfg.general.bridging = false;
    let test = ComponentTest::new(cfg, answering_sink());
    let (te, nt) = connected_call(&test);
    assert!(!test.mgr.bridge(&te, &nt));
    assert_eq!(test.mgr.with_call(&te, |c| c.next_state), Some(None));
}

#[test]
fn test_dtmf_and_data_reach_application() {
    debug::setup_logging_verbose();
    let test = ComponentTest::new(default_test_config(), answering_sink());
    let (te, _nt) = connected_call(&test);
    let addr = test.mgr.with_call(&te, |c| c.bchan_addr).flatten().unwrap();

    let word = prim::DTMF_TONE_VAL | '5' as u32;
    test.loopback
        .inject(Frame::new(prim::PH_CONTROL | prim::INDICATION, addr, 0, word.to_le_bytes().to_vec()));
    test.loopback.inject(Frame::new(prim::PH_DATA | prim::INDICATION, addr, 0, vec![0xd5; 160]));
    test.deliver_all();

    let events = test.take_events();
    assert_eq!(ComponentTest::events_on(&events, 1), vec![Event::DtmfTone, Event::BchanData]);
    assert_eq!(ComponentTest::find(&events, 1, Event::DtmfTone).unwrap().ctx.dtmf, Some('5'));
    assert_eq!(ComponentTest::find(&events, 1, Event::BchanData).unwrap().ctx.bframe.len(), 160);
}

#[test]
fn test_layer_failure_reported() {
    debug::setup_logging_verbose();
    let test = ComponentTest::new(default_test_config(), answering_sink());
    test.bring_up();
    test.loopback.set_layer_failure(true);

    let te = test.mgr.get_free_bc(1, 0, CallDirection::Outgoing, false).unwrap();
    test.mgr.send_event(&te, Event::Setup).unwrap();
    test.deliver_all();

    let events = test.take_events();
    assert!(ComponentTest::find(&events, 1, Event::BchanError).is_some());
    assert!(ComponentTest::find(&events, 2, Event::BchanError).is_some());
    assert_eq!(test.mgr.with_call(&te, |c| c.state), Some(BchanState::Error));
}
