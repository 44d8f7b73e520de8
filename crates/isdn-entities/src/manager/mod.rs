//! Application-facing side of the stack. [`IsdnManager`] owns one [`InterfaceStack`] per
//! configured port, the application callbacks and the queues the writer thread drains.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use isdn_config::SharedConfig;
use isdn_core::{CHANNEL_ANY, CHANNEL_NONE, CallDirection, L3Id};
use isdn_pdus::enums::event::Event;
use isdn_pdus::facility::Facility;
use isdn_pdus::ies::cause::{CAUSE_NO_CHANNEL, CAUSE_NORMAL_CLEARING, CAUSE_RESOURCE_UNAVAIL};
use isdn_pdus::messages::{build_frame, lookup_by_event};
use isdn_pdus::structs::call_data::CallData;
use isdn_saps::{Frame, addr, prim};

use crate::app::{Action, ActionQueue, EventResponse, IsdnApp};
use crate::stack::bchan_fsm::BchanState;
use crate::stack::call_context::{CallContext, CallHandle};
use crate::stack::{CallLoc, InterfaceStack};
use crate::transport::{Transport, TransportErr};
use crate::workers;

mod dispatch;
mod nt_events;

/// Process ids wrap back to 1 above this value
pub const MAX_PID: u32 = 5000;
/// How long `destroy` waits for each worker thread
const JOIN_TIMEOUT: Duration = Duration::from_secs(3);

/// Why `send_event` and friends could not do what was asked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendErr {
    /// No free B-channel on the interface
    NoChannel,
    /// Call reference table exhausted
    NoProcId,
    /// Handle does not name a live call, or the pool is full
    NoContext,
    UnknownPort(u8),
    /// Event has no Q.931 message
    UnknownEvent(Event),
    Transport(TransportErr),
}

impl SendErr {
    /// Release cause an application would answer the call with
    pub fn cause(&self) -> u8 {
        match self {
            SendErr::NoChannel => CAUSE_NO_CHANNEL,
            SendErr::NoProcId | SendErr::NoContext => CAUSE_RESOURCE_UNAVAIL,
            _ => CAUSE_NORMAL_CLEARING,
        }
    }
}

impl std::fmt::Display for SendErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SendErr::NoChannel => write!(f, "no channel available"),
            SendErr::NoProcId => write!(f, "no call reference available"),
            SendErr::NoContext => write!(f, "no such call context"),
            SendErr::UnknownPort(p) => write!(f, "unknown port {}", p),
            SendErr::UnknownEvent(e) => write!(f, "event {} cannot be sent", e),
            SendErr::Transport(e) => write!(f, "transport: {}", e),
        }
    }
}

impl std::error::Error for SendErr {}

impl From<TransportErr> for SendErr {
    fn from(e: TransportErr) -> Self {
        SendErr::Transport(e)
    }
}

pub(crate) fn lock<T: ?Sized>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

struct ManagerInner {
    config: SharedConfig,
    transport: Arc<dyn Transport>,
    stacks: BTreeMap<u8, Mutex<InterfaceStack>>,
    app: Mutex<Box<dyn IsdnApp>>,
    /// Actions requested by callbacks, carried out once the locks are released
    pending: Mutex<ActionQueue>,
    /// Administrative frames, written before any call-control frame
    activate_queue: Mutex<VecDeque<Frame>>,
    wake_tx: Sender<()>,
    wake_rx: Receiver<()>,
    running: AtomicBool,
    pid_counter: AtomicU32,
    threads: Mutex<Vec<JoinHandle<()>>>,
}

/// Handle to a running stack. Cheap to clone; all clones drive the same interfaces.
#[derive(Clone)]
pub struct IsdnManager {
    inner: Arc<ManagerInner>,
}

impl IsdnManager {
    /// Builds one interface per configured port. Every port must exist on the device.
    pub fn new(config: SharedConfig, transport: Arc<dyn Transport>, app: Box<dyn IsdnApp>) -> Result<Self, TransportErr> {
        let cfg = config.config();
        let count = transport.stack_count();
        let mut stacks = BTreeMap::new();
        for p in &cfg.ports {
            if p.port as usize > count {
                tracing::error!("port {} configured but the device only has {} ports", p.port, count);
                return Err(TransportErr::UnknownPort(p.port));
            }
            let info = transport.stack_info(p.port).ok_or(TransportErr::UnknownPort(p.port))?;
            let st = InterfaceStack::new(p, info);
            tracing::info!(port = p.port, "{}", st.stack_details(false));
            stacks.insert(p.port, Mutex::new(st));
        }

        let (wake_tx, wake_rx) = bounded::<()>(1);
        Ok(Self {
            inner: Arc::new(ManagerInner {
                config,
                transport,
                stacks,
                app: Mutex::new(app),
                pending: Mutex::new(ActionQueue::new()),
                activate_queue: Mutex::new(VecDeque::new()),
                wake_tx,
                wake_rx,
                running: AtomicBool::new(false),
                pid_counter: AtomicU32::new(0),
                threads: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Starts the reader and writer threads. Starting twice is a no-op.
    pub fn start(&self) -> Result<(), TransportErr> {
        if self.inner.running.swap(true, Ordering::SeqCst) {
            tracing::warn!("manager already running");
            return Ok(());
        }
        if let Err(e) = self.spawn_workers() {
            tracing::error!("cannot start worker threads: {}", e);
            self.inner.running.store(false, Ordering::SeqCst);
            self.wake_writer();
            let handles = std::mem::take(&mut *lock(&self.inner.threads));
            for t in handles {
                let _ = t.join();
            }
            return Err(TransportErr::OpenFailed(e.to_string()));
        }
        tracing::info!("manager started on {} ports", self.inner.stacks.len());
        Ok(())
    }

    fn spawn_workers(&self) -> std::io::Result<()> {
        let mut threads = lock(&self.inner.threads);

        let m = self.clone();
        let reader = thread::Builder::new()
            .name("isdn-reader".to_string())
            .spawn(move || workers::reader_loop(m))?;
        threads.push(reader);

        let m = self.clone();
        let writer = thread::Builder::new()
            .name("isdn-writer".to_string())
            .spawn(move || workers::writer_loop(m))?;
        threads.push(writer);
        Ok(())
    }

    /// Removes every B-channel layer, stops the threads and closes the device
    pub fn destroy(&self) {
        tracing::info!("shutting down");
        self.inner.running.store(false, Ordering::SeqCst);

        for stack in self.inner.stacks.values() {
            let mut st = lock(stack);
            let st = &mut *st;
            for ctx in st.pool.iter_mut().chain(st.held.iter_mut()) {
                InterfaceStack::clean_up_bc(ctx, self.inner.transport.as_ref());
            }
        }
        self.wake_writer();

        let handles = std::mem::take(&mut *lock(&self.inner.threads));
        for handle in handles {
            let name = handle.thread().name().unwrap_or("worker").to_string();
            let start = Instant::now();
            loop {
                if handle.is_finished() {
                    let _ = handle.join();
                    tracing::info!("{} joined cleanly", name);
                    break;
                }
                if start.elapsed() >= JOIN_TIMEOUT {
                    tracing::warn!("{} did not finish in time, abandoning", name);
                    break;
                }
                thread::sleep(Duration::from_millis(50));
            }
        }

        self.inner.transport.close();
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &SharedConfig {
        &self.inner.config
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.inner.transport
    }

    pub fn ports(&self) -> Vec<u8> {
        self.inner.stacks.keys().copied().collect()
    }

    /// Runs `f` on the application object, for inspection outside callbacks
    pub fn with_app<R>(&self, f: impl FnOnce(&mut dyn IsdnApp) -> R) -> R {
        let mut app = lock(&self.inner.app);
        f(&mut **app)
    }

    fn stack(&self, port: u8) -> Result<MutexGuard<'_, InterfaceStack>, SendErr> {
        self.inner.stacks.get(&port).map(lock).ok_or(SendErr::UnknownPort(port))
    }

    fn next_pid(&self) -> u32 {
        let step = |p: u32| if p >= MAX_PID { 1 } else { p + 1 };
        let prev = self
            .inner
            .pid_counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |p| Some(step(p)))
            .unwrap_or_else(|p| p);
        step(prev)
    }

    /* ---------- callbacks and queues ---------- */

    /// Hands `event` to the application. Runs with the interface locked.
    fn fire(&self, ctx: &mut CallContext, event: Event) -> EventResponse {
        tracing::debug!(port = ctx.port, "-> {} {}", event, ctx);
        ctx.touch();
        let mut app = lock(&self.inner.app);
        let mut pending = lock(&self.inner.pending);
        app.cb_event(&mut pending, event, ctx)
    }

    fn app_log(&self, port: u8, msg: &str) {
        tracing::info!(port, "{}", msg);
        lock(&self.inner.app).log(port, msg);
    }

    fn enqueue_activate(&self, frame: Frame) {
        lock(&self.inner.activate_queue).push_back(frame);
    }

    pub(crate) fn wake_writer(&self) {
        match self.inner.wake_tx.try_send(()) {
            Ok(()) | Err(TrySendError::Full(_)) => {}
            Err(TrySendError::Disconnected(_)) => tracing::warn!("writer wakeup channel closed"),
        }
    }

    pub(crate) fn wakeups(&self) -> &Receiver<()> {
        &self.inner.wake_rx
    }

    /// Writes everything queued: administrative frames first, then each interface's downqueue.
    /// Returns the number of frames written.
    pub fn flush_queues(&self) -> usize {
        let mut frames: Vec<Frame> = lock(&self.inner.activate_queue).drain(..).collect();
        for stack in self.inner.stacks.values() {
            frames.extend(lock(stack).downqueue.drain(..));
        }
        let n = frames.len();
        for frame in frames {
            tracing::trace!("<- {}", frame);
            if let Err(e) = self.inner.transport.write(frame) {
                tracing::error!("write failed: {}", e);
            }
        }
        n
    }

    /// Carries out what callbacks asked for, including anything those actions trigger in turn
    fn process_actions(&self) {
        loop {
            let next = lock(&self.inner.pending).pop_front();
            let Some(action) = next else {
                break;
            };
            match action {
                Action::SendEvent { call, event } => {
                    if let Err(e) = self.send_event_inner(&call, event) {
                        tracing::warn!(port = call.port, "{} for {} failed: {}", event, call, e);
                    }
                }
                Action::Release(call) => self.release_inner(&call),
                Action::Bridge(a, b) => {
                    self.bridge_inner(&a, &b);
                }
                Action::Split(a, b) => {
                    self.split_inner(&a, &b);
                }
            }
        }
    }

    fn settle(&self) {
        self.process_actions();
        self.wake_writer();
    }

    /// Feeds one frame from the device through the dispatch chain
    pub fn handle_frame(&self, frame: Frame) {
        self.dispatch_frame(&frame);
        self.settle();
    }

    /* ---------- calls ---------- */

    /// Reserves a call context. A non-zero `channel` preselects that B-channel.
    pub fn get_free_bc(&self, port: u8, channel: u8, direction: CallDirection, prefer_descending: bool) -> Option<CallHandle> {
        if direction == CallDirection::Outgoing && self.port_is_blocked(port) {
            tracing::info!(port, "port blocked, no outgoing calls");
            return None;
        }
        let mut st = self.stack(port).ok()?;
        let Some(slot) = st.acquire(channel) else {
            tracing::debug!(port, "no free context for channel {}", channel);
            return None;
        };
        let pid = self.next_pid();
        let ctx = &mut st.pool[slot];
        ctx.direction = direction;
        ctx.pid = pid;
        ctx.prefer_descending |= prefer_descending;
        tracing::debug!(port, "reserved {}", ctx);
        Some(ctx.handle())
    }

    /// Runs `f` on the context behind `call`. None if the call is gone.
    pub fn with_call<R>(&self, call: &CallHandle, f: impl FnOnce(&mut CallContext) -> R) -> Option<R> {
        let mut st = self.stack(call.port).ok()?;
        let loc = st.find_by_session(call.session)?;
        Some(f(st.call_mut(loc)))
    }

    /// Sends `event` for `call`, allocating channel and call reference as needed
    pub fn send_event(&self, call: &CallHandle, event: Event) -> Result<(), SendErr> {
        let res = self.send_event_inner(call, event);
        self.settle();
        res
    }

    fn send_event_inner(&self, call: &CallHandle, event: Event) -> Result<(), SendErr> {
        let mut st = self.stack(call.port)?;
        let loc = st.find_by_session(call.session).ok_or(SendErr::NoContext)?;
        self.send_event_locked(&mut st, loc, event)
    }

    fn send_event_locked(&self, st: &mut InterfaceStack, loc: CallLoc, event: Event) -> Result<(), SendErr> {
        if lookup_by_event(event).is_none() {
            return Err(SendErr::UnknownEvent(event));
        }
        let port = st.port;

        if st.is_nt() && !st.l1_up {
            let ctx = st.call_mut(loc);
            tracing::info!(port, "layer 1 down, queueing {} for l3id 0x{:x}", event, ctx.l3id);
            ctx.queued_events.push(event);
            self.enqueue_activate(Frame::control(prim::PH_ACTIVATE | prim::REQUEST, addr::port_addr(port), 0));
            return Ok(());
        }

        let loc = match (loc, event) {
            (CallLoc::Held(idx), Event::Retrieve | Event::RetrieveAcknowledge) => {
                CallLoc::Pool(st.unhold(idx).ok_or(SendErr::NoContext)?)
            }
            _ => loc,
        };

        match event {
            Event::Setup => self.create_process(st, loc)?,
            Event::Connect
            | Event::Progress
            | Event::Alerting
            | Event::Proceeding
            | Event::SetupAcknowledge
            | Event::RetrieveAcknowledge => {
                if st.is_nt() {
                    if st.call(loc).channel_open() {
                        if let Err(e) = st.alloc_channel(loc) {
                            tracing::warn!(port, "no channel for {}: {:?}", event, e);
                            return Err(SendErr::NoChannel);
                        }
                    } else {
                        st.mark_channel(loc);
                    }
                }
                self.setup_bc(st, loc);
                if event == Event::RetrieveAcknowledge {
                    self.bchannel_activate_locked(st, loc);
                }
            }
            _ => {}
        }

        let ctx = st.call(loc);
        let frame = build_frame(event, &ctx.data, &st.msg_ctx(ctx.l3id)).ok_or(SendErr::UnknownEvent(event))?;
        tracing::debug!(port, "<- {} l3id 0x{:x} ch {}", event, ctx.l3id, ctx.channel());
        st.downqueue.push_back(frame);

        match (event, loc) {
            (Event::HoldAcknowledge, CallLoc::Pool(slot)) => {
                let held = st.hold(slot, self.inner.transport.as_ref());
                self.fire(st.call_mut(held), Event::NewBc);
            }
            (Event::ReleaseComplete, _) => self.drop_call(st, loc),
            _ => {}
        }
        Ok(())
    }

    /// Channel and call reference for an outgoing SETUP
    fn create_process(&self, st: &mut InterfaceStack, loc: CallLoc) -> Result<(), SendErr> {
        let port = st.port;
        if st.is_nt() || st.ptp || st.cfg.te_choose_channel {
            if let Err(e) = st.alloc_channel(loc) {
                tracing::warn!(port, "no channel for SETUP: {:?}", e);
                return Err(SendErr::NoChannel);
            }
        } else if !st.call(loc).channel_preselected {
            st.call_mut(loc).data.channel = CHANNEL_ANY;
        }

        let Some(l3id) = st.call_refs.alloc() else {
            tracing::warn!(port, "call reference table exhausted");
            st.release_channel(loc);
            return Err(SendErr::NoProcId);
        };

        let pid = self.next_pid();
        let is_nt = st.is_nt();
        let (presentation, screen) = (st.cfg.presentation, st.cfg.screen);
        let ctx = st.call_mut(loc);
        ctx.l3id = l3id;
        ctx.pid = pid;
        ctx.direction = CallDirection::Outgoing;
        if let Some(p) = presentation {
            ctx.data.pres = p;
        }
        if let Some(s) = screen {
            ctx.data.screen = s;
        }
        tracing::debug!(port, "new process l3id 0x{:x} pid {} ch {}", l3id, pid, ctx.channel());

        if !is_nt {
            st.downqueue.push_back(Frame::control(prim::CC_NEW_CR | prim::REQUEST, addr::port_addr(port), l3id));
        }
        Ok(())
    }

    /// Sub-layer setup; a refusal from the device is reported to the application
    fn setup_bc(&self, st: &mut InterfaceStack, loc: CallLoc) {
        if st.setup_bc(loc, self.inner.transport.as_ref()).is_err() {
            self.fire(st.call_mut(loc), Event::BchanError);
        }
    }

    /// Forgets a call: pool contexts are wiped, held ones removed
    fn drop_call(&self, st: &mut InterfaceStack, loc: CallLoc) {
        match loc {
            CallLoc::Pool(_) => st.wipe(loc, self.inner.transport.as_ref(), false),
            CallLoc::Held(idx) => {
                let ctx = st.remove_held(idx);
                if !st.is_nt() {
                    st.call_refs.free(ctx.l3id);
                }
            }
        }
    }

    /// Every context gets a CLEANUP and is wiped, held calls included
    fn clear_l3(&self, st: &mut InterfaceStack) {
        let transport = self.inner.transport.as_ref();
        for i in 0..st.pool.len() {
            if !st.pool[i].in_use {
                continue;
            }
            self.fire(&mut st.pool[i], Event::CleanUp);
            let l3id = st.pool[i].l3id;
            if st.is_nt() {
                st.call_refs.free(l3id);
            }
            st.wipe(CallLoc::Pool(i), transport, true);
        }
        for mut ctx in std::mem::take(&mut st.held) {
            self.fire(&mut ctx, Event::CleanUp);
            st.call_refs.free(ctx.l3id);
        }
        tracing::info!(port = st.port, "layer 3 cleared");
    }

    /// Builds `event` for a call reference that has no usable context and queues it
    fn reply(&self, st: &mut InterfaceStack, l3id: L3Id, event: Event, cause: u8) {
        let data = CallData {
            out_cause: cause,
            ..CallData::default()
        };
        if let Some(frame) = build_frame(event, &data, &st.msg_ctx(l3id)) {
            tracing::debug!(port = st.port, "<- {} l3id 0x{:x} cause {}", event, l3id, cause);
            st.downqueue.push_back(frame);
        }
    }

    /// Returns a reserved context to the pool, or forgets a held call
    pub fn release(&self, call: &CallHandle) {
        self.release_inner(call);
        self.settle();
    }

    fn release_inner(&self, call: &CallHandle) {
        let Ok(mut st) = self.stack(call.port) else {
            return;
        };
        match st.find_by_session(call.session) {
            Some(loc) => {
                tracing::debug!(port = call.port, "releasing {}", st.call(loc));
                self.drop_call(&mut st, loc);
            }
            None => tracing::debug!(port = call.port, "release: {} already gone", call),
        }
    }

    /// Sets the outbound facility and sends FACILITY
    pub fn send_facility(&self, call: &CallHandle, facility: Facility) -> Result<(), SendErr> {
        self.with_call(call, |ctx| ctx.data.fac_out = facility).ok_or(SendErr::NoContext)?;
        self.send_event(call, Event::Facility)
    }

    /// Takes a held call back as an ordinary one
    pub fn transfer(&self, call: &CallHandle) -> bool {
        self.with_call(call, |ctx| {
            tracing::info!(port = ctx.port, "transfer {}", ctx);
            ctx.held = false;
        })
        .is_some()
    }

    /* ---------- B-channels ---------- */

    pub fn bchannel_activate(&self, call: &CallHandle) -> bool {
        let done = match self.stack(call.port) {
            Ok(mut st) => match st.find_by_session(call.session) {
                Some(loc) => self.bchannel_activate_locked(&mut st, loc),
                None => false,
            },
            Err(_) => false,
        };
        self.settle();
        done
    }

    fn bchannel_activate_locked(&self, st: &mut InterfaceStack, loc: CallLoc) -> bool {
        let ctx = st.call_mut(loc);
        let Some(a) = ctx.bchan_addr else {
            tracing::debug!(port = ctx.port, "activate: l3id 0x{:x} has no b-channel layer", ctx.l3id);
            return false;
        };
        if !ctx.active {
            tracing::debug!(port = ctx.port, "activating b-channel 0x{:x}", a);
            ctx.active = true;
            self.enqueue_activate(Frame::control(prim::DL_ESTABLISH | prim::REQUEST, a, 0));
        }
        true
    }

    pub fn bchannel_deactivate(&self, call: &CallHandle) -> bool {
        let done = self
            .with_call(call, |ctx| {
                let Some(a) = ctx.bchan_addr else {
                    return false;
                };
                if ctx.active {
                    tracing::debug!(port = ctx.port, "deactivating b-channel 0x{:x}", a);
                    ctx.active = false;
                    self.enqueue_activate(Frame::control(prim::DL_RELEASE | prim::REQUEST, a, 0));
                }
                if matches!(ctx.state, BchanState::Activated | BchanState::Bridged) {
                    ctx.set_state(BchanState::Setuped);
                }
                true
            })
            .unwrap_or(false);
        self.settle();
        done
    }

    /// Activation confirmed by the device; a bridge requested earlier is joined now
    fn bchannel_activated(&self, ctx: &mut CallContext) {
        ctx.active = true;
        ctx.set_state(BchanState::Activated);
        if ctx.next_state.take() == Some(BchanState::Bridged) {
            self.join_conference(ctx);
        }
        self.fire(ctx, Event::BchanActivated);
    }

    fn join_conference(&self, ctx: &mut CallContext) {
        let Some(a) = ctx.bchan_addr else {
            return;
        };
        tracing::debug!(port = ctx.port, "b-channel 0x{:x} joins conference {}", a, ctx.conf_id);
        self.enqueue_activate(Frame::ph_control(a, prim::CMX_RECEIVE_OFF, 0));
        self.enqueue_activate(Frame::ph_control(a, prim::CMX_CONF_JOIN, ctx.conf_id));
        ctx.set_state(BchanState::Bridged);
    }

    fn leave_conference(&self, ctx: &mut CallContext) {
        let Some(a) = ctx.bchan_addr else {
            return;
        };
        tracing::debug!(port = ctx.port, "b-channel 0x{:x} leaves conference {}", a, ctx.conf_id);
        self.enqueue_activate(Frame::ph_control(a, prim::CMX_RECEIVE_ON, 0));
        self.enqueue_activate(Frame::ph_control(a, prim::CMX_CONF_SPLIT, ctx.conf_id));
        ctx.set_state(BchanState::Setuped);
        ctx.conf_id = 0;
        // Back to ACTIVATED once the device confirms
        ctx.active = false;
        self.enqueue_activate(Frame::control(prim::DL_ESTABLISH | prim::REQUEST, a, 0));
    }

    /// Joins the B-channels of two calls. A channel not activated yet joins once it is.
    pub fn bridge(&self, a: &CallHandle, b: &CallHandle) -> bool {
        let done = self.bridge_inner(a, b);
        self.settle();
        done
    }

    fn bridge_inner(&self, a: &CallHandle, b: &CallHandle) -> bool {
        if !self.inner.config.config().general.bridging {
            tracing::warn!("bridging disabled by configuration");
            return false;
        }
        let Some(pid) = self.with_call(a, |ctx| ctx.pid) else {
            return false;
        };
        let conf_id = (pid << 1) + 1;
        let mut done = true;
        for h in [a, b] {
            done &= self
                .with_call(h, |ctx| {
                    ctx.conf_id = conf_id;
                    if ctx.state == BchanState::Activated {
                        self.join_conference(ctx);
                    } else {
                        tracing::debug!(port = ctx.port, "{} joins conference {} once activated", ctx, conf_id);
                        ctx.next_state = Some(BchanState::Bridged);
                    }
                })
                .is_some();
        }
        done
    }

    pub fn split(&self, a: &CallHandle, b: &CallHandle) -> bool {
        let done = self.split_inner(a, b);
        self.settle();
        done
    }

    fn split_inner(&self, a: &CallHandle, b: &CallHandle) -> bool {
        let mut done = true;
        for h in [a, b] {
            done &= self
                .with_call(h, |ctx| {
                    ctx.next_state = None;
                    if ctx.state == BchanState::Bridged {
                        self.leave_conference(ctx);
                    }
                })
                .is_some();
        }
        done
    }

    /* ---------- ports ---------- */

    /// Layer 1 up, and layer 2 as well on point-to-point links
    pub fn port_up(&self, port: u8) -> bool {
        self.stack(port).map(|st| st.l1_up && (!st.ptp || st.l2_up)).unwrap_or(false)
    }

    /// Asks the device to bring up whatever link layer is down
    pub fn get_port_up(&self, port: u8) -> Result<(), SendErr> {
        let (l1, l2) = {
            let st = self.stack(port)?;
            (st.l1_up, st.l2_up)
        };
        if !l1 {
            self.enqueue_activate(Frame::control(prim::PH_ACTIVATE | prim::REQUEST, addr::port_addr(port), 0));
        }
        if !l2 {
            self.enqueue_activate(Frame::control(prim::DL_ESTABLISH | prim::REQUEST, addr::port_addr(port), 0));
        }
        self.wake_writer();
        Ok(())
    }

    pub fn port_is_blocked(&self, port: u8) -> bool {
        self.inner.config.state_read().blocked_ports.contains(&port)
    }

    pub fn port_block(&self, port: u8) {
        tracing::info!(port, "port blocked");
        self.inner.config.state_write().blocked_ports.insert(port);
    }

    pub fn port_unblock(&self, port: u8) {
        tracing::info!(port, "port unblocked");
        self.inner.config.state_write().blocked_ports.remove(&port);
    }

    pub fn is_ptp(&self, port: u8) -> bool {
        self.stack(port).map(|st| st.ptp).unwrap_or(false)
    }

    pub fn max_channels(&self, port: u8) -> Option<u8> {
        self.stack(port).ok().map(|st| st.trunk.max_channels().min(st.b_num))
    }

    /// Drops every call on the port and releases layer 2
    pub fn port_restart(&self, port: u8) -> Result<(), SendErr> {
        {
            let mut st = self.stack(port)?;
            tracing::info!(port, "restarting port");
            self.clear_l3(&mut st);
        }
        self.enqueue_activate(Frame::control(prim::DL_RELEASE | prim::REQUEST, addr::port_addr(port), 0));
        self.settle();
        Ok(())
    }

    /// Sends RESTART for one B-channel. A call holding the channel is cleaned up first.
    pub fn channel_restart(&self, port: u8, channel: u8) -> Result<(), SendErr> {
        let res = self.channel_restart_inner(port, channel);
        self.settle();
        res
    }

    fn channel_restart_inner(&self, port: u8, channel: u8) -> Result<(), SendErr> {
        let mut st = self.stack(port)?;
        if channel == CHANNEL_NONE || channel > st.b_num {
            return Err(SendErr::NoChannel);
        }
        if let Some(i) = st.pool.iter().position(|c| c.in_use && c.data.channel == channel) {
            self.fire(&mut st.pool[i], Event::CleanUp);
            let l3id = st.pool[i].l3id;
            if st.is_nt() {
                st.call_refs.free(l3id);
            }
            st.wipe(CallLoc::Pool(i), self.inner.transport.as_ref(), true);
        }
        let data = CallData {
            restart_channel: channel,
            ..CallData::default()
        };
        let frame = build_frame(Event::Restart, &data, &st.msg_ctx(0)).ok_or(SendErr::UnknownEvent(Event::Restart))?;
        tracing::info!(port, "restarting channel {}", channel);
        st.downqueue.push_back(frame);
        Ok(())
    }

    /// Queues a STATUS_ENQUIRY on the global call reference
    pub fn get_port_info(&self, port: u8) -> Result<(), SendErr> {
        self.stack(port)?;
        self.enqueue_activate(Frame::control(prim::CC_STATUS_ENQUIRY | prim::REQUEST, addr::port_addr(port), 0));
        self.wake_writer();
        Ok(())
    }

    pub fn stack_details(&self, port: u8) -> Option<String> {
        let blocked = self.port_is_blocked(port);
        self.stack(port).ok().map(|st| st.stack_details(blocked))
    }

    /// Dumps a call to the log and the application log callback
    pub fn log_call(&self, call: &CallHandle) {
        let lines = match self.stack(call.port) {
            Ok(st) => match st.find_by_session(call.session) {
                Some(loc) => st.log_call(loc),
                None => vec![format!("{}: no such call", call)],
            },
            Err(e) => vec![format!("{}: {}", call, e)],
        };
        for line in lines {
            self.app_log(call.port, &line);
        }
    }
}
