//! Per-port interface state: link flags, the B-channel bitmap, call references,
//! the pool of call contexts and the list of held calls.

use std::collections::VecDeque;

use isdn_config::{CfgPort, ChannelMethod};
use isdn_core::{CHANNEL_ANY, CHANNEL_NONE, ChannelAllocErr, ChannelBitmap, L3Id, MAX_BCHANS, Role, TrunkType};
use isdn_pdus::messages::MsgCtx;
use isdn_saps::Frame;
use uuid::Uuid;

use crate::transport::{StackInfo, Transport, TransportErr};

pub mod bchan_fsm;
pub mod call_context;
pub mod call_ref;

use bchan_fsm::BchanState;
use call_context::CallContext;
use call_ref::CallRefAlloc;

/// Where a context lives on its interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallLoc {
    Pool(usize),
    Held(usize),
}

/// Context a frame belongs to. Frames whose call reference matches nothing get a
/// throw-away context so they can be parsed and cleaned up like any other.
#[derive(Debug)]
pub enum ResolvedCall {
    Bound(CallLoc),
    Ephemeral(Box<CallContext>),
}

impl ResolvedCall {
    pub fn loc(&self) -> Option<CallLoc> {
        match self {
            ResolvedCall::Bound(loc) => Some(*loc),
            ResolvedCall::Ephemeral(_) => None,
        }
    }
}

pub struct InterfaceStack {
    pub port: u8,
    pub cfg: CfgPort,
    pub role: Role,
    pub ptp: bool,
    pub trunk: TrunkType,
    pub b_num: u8,

    pub l1_up: bool,
    pub l2_up: bool,

    pub channels: ChannelBitmap,
    pub call_refs: CallRefAlloc,
    /// One context per B-channel plus one for signalling-only calls
    pub pool: Vec<CallContext>,
    pub held: Vec<CallContext>,
    /// Frames built by `send_event`, drained by the writer
    pub downqueue: VecDeque<Frame>,
}

impl InterfaceStack {
    pub fn new(cfg: &CfgPort, info: StackInfo) -> Self {
        if info.role != cfg.role || info.trunk != cfg.trunk {
            tracing::warn!(
                port = cfg.port,
                "device reports {} {}, configured as {} {}",
                info.role,
                info.trunk,
                cfg.role,
                cfg.trunk
            );
        }
        let b_num = info.b_num.min(MAX_BCHANS);
        let pool = (0..=b_num as usize).map(|i| CallContext::new(cfg.port, Some(i))).collect();
        Self {
            port: cfg.port,
            cfg: cfg.clone(),
            role: cfg.role,
            ptp: cfg.ptp,
            trunk: cfg.trunk,
            b_num,
            l1_up: false,
            l2_up: false,
            channels: ChannelBitmap::with_b_num(b_num),
            call_refs: CallRefAlloc::new(cfg.role, cfg.port as u16),
            pool,
            held: Vec::new(),
            downqueue: VecDeque::new(),
        }
    }

    pub fn is_nt(&self) -> bool {
        self.role.is_nt()
    }

    /// Message context for frames of call `l3id`
    pub fn msg_ctx(&self, l3id: L3Id) -> MsgCtx {
        let mut ctx = MsgCtx::new(self.role, self.trunk, self.port, l3id);
        ctx.facility = self.cfg.facility;
        ctx.outgoing_colp = self.cfg.outgoing_colp;
        ctx
    }

    pub fn call(&self, loc: CallLoc) -> &CallContext {
        match loc {
            CallLoc::Pool(i) => &self.pool[i],
            CallLoc::Held(i) => &self.held[i],
        }
    }

    pub fn call_mut(&mut self, loc: CallLoc) -> &mut CallContext {
        match loc {
            CallLoc::Pool(i) => &mut self.pool[i],
            CallLoc::Held(i) => &mut self.held[i],
        }
    }

    pub fn resolved_mut<'a>(&'a mut self, call: &'a mut ResolvedCall) -> &'a mut CallContext {
        match call {
            ResolvedCall::Bound(loc) => self.call_mut(*loc),
            ResolvedCall::Ephemeral(ctx) => ctx,
        }
    }

    /* ---------- lookups ---------- */

    fn find_held_by<F: Fn(&CallContext) -> bool>(&self, f: F) -> Option<CallLoc> {
        self.held.iter().position(f).map(CallLoc::Held)
    }

    pub fn find_by_l3id(&self, l3id: L3Id) -> Option<CallLoc> {
        self.find_by_masked_l3id(l3id, 0xffff_ffff)
    }

    /// Pool contexts first, then the held list
    pub fn find_by_masked_l3id(&self, l3id: L3Id, mask: L3Id) -> Option<CallLoc> {
        self.pool
            .iter()
            .position(|c| c.in_use && c.l3id & mask == l3id & mask)
            .map(CallLoc::Pool)
            .or_else(|| self.find_held_by(|c| c.l3id & mask == l3id & mask))
    }

    pub fn find_by_session(&self, session: Uuid) -> Option<CallLoc> {
        self.pool
            .iter()
            .position(|c| c.in_use && c.session == session)
            .map(CallLoc::Pool)
            .or_else(|| self.find_held_by(|c| c.session == session))
    }

    pub fn find_by_addr(&self, addr: u32) -> Option<CallLoc> {
        self.pool.iter().position(|c| c.bchan_addr == Some(addr)).map(CallLoc::Pool)
    }

    pub fn find_by_pid(&self, pid: u32) -> Option<CallLoc> {
        self.pool.iter().position(|c| c.in_use && c.pid == pid).map(CallLoc::Pool)
    }

    /// A pool context flagged as held, else the oldest entry of the held list
    pub fn find_held(&self) -> Option<CallLoc> {
        self.pool
            .iter()
            .position(|c| c.in_use && c.held)
            .map(CallLoc::Pool)
            .or_else(|| (!self.held.is_empty()).then_some(CallLoc::Held(0)))
    }

    pub fn resolve(&self, l3id: L3Id) -> ResolvedCall {
        match self.find_by_l3id(l3id) {
            Some(loc) => ResolvedCall::Bound(loc),
            None => {
                tracing::debug!(port = self.port, "no context for l3id 0x{:x}, using a temporary one", l3id);
                ResolvedCall::Ephemeral(Box::new(CallContext::ephemeral(self.port, l3id)))
            }
        }
    }

    /* ---------- pool ---------- */

    /// Reserves a free context. A non-zero `channel` asks for that channel; it must
    /// exist and not belong to another call.
    pub fn acquire(&mut self, channel: u8) -> Option<usize> {
        if channel != CHANNEL_NONE {
            if channel > self.b_num {
                tracing::warn!(port = self.port, "channel {} beyond b_num {}", channel, self.b_num);
                return None;
            }
            if self.pool.iter().any(|c| c.in_use && c.data.channel == channel) {
                tracing::debug!(port = self.port, "channel {} already taken", channel);
                return None;
            }
        }
        let slot = self.pool.iter().position(|c| !c.in_use)?;
        let ctx = &mut self.pool[slot];
        ctx.empty();
        // Handles given out for the previous call must not reach this one
        ctx.session = Uuid::new_v4();
        ctx.in_use = true;
        ctx.data.channel = channel;
        ctx.channel_preselected = channel != CHANNEL_NONE;
        ctx.prefer_descending = self.cfg.method == ChannelMethod::Descending;
        ctx.set_state(BchanState::Empty);
        Some(slot)
    }

    /// Picks a channel for `loc`, keeping a preselected one
    pub fn alloc_channel(&mut self, loc: CallLoc) -> Result<u8, ChannelAllocErr> {
        if self.call(loc).channel_marked {
            return Ok(self.call(loc).data.channel);
        }
        let (requested, descending) = {
            let ctx = self.call(loc);
            let req = if ctx.channel_preselected && !ctx.channel_open() { ctx.data.channel } else { CHANNEL_NONE };
            (req, ctx.prefer_descending)
        };
        let ch = self.channels.find_free(requested, descending)?;
        let port = self.port;
        let ctx = self.call_mut(loc);
        ctx.data.channel = ch;
        ctx.channel_marked = true;
        tracing::debug!(port, "l3id 0x{:x} got channel {}", ctx.l3id, ch);
        Ok(ch)
    }

    /// Marks the channel the peer chose for `loc`
    pub fn mark_channel(&mut self, loc: CallLoc) {
        let ch = self.call(loc).data.channel;
        if ch == CHANNEL_NONE || ch == CHANNEL_ANY || self.call(loc).channel_marked {
            return;
        }
        match self.channels.mark(ch) {
            Ok(()) => self.call_mut(loc).channel_marked = true,
            Err(e) => tracing::error!(port = self.port, "cannot mark channel {}: {:?}", ch, e),
        }
    }

    pub fn release_channel(&mut self, loc: CallLoc) {
        let ctx = self.call_mut(loc);
        if !ctx.channel_marked {
            return;
        }
        ctx.channel_marked = false;
        let ch = ctx.data.channel;
        if let Err(e) = self.channels.release(ch) {
            tracing::error!(port = self.port, "releasing channel {}: {:?}", ch, e);
        }
    }

    /* ---------- B-channel sub-layer ---------- */

    /// Assigns the device sub-layer for the channel of `loc`
    pub fn setup_bc(&mut self, loc: CallLoc, transport: &dyn Transport) -> Result<(), TransportErr> {
        let port = self.port;
        let b_num = self.b_num;
        let ctx = self.call_mut(loc);
        if ctx.bchan_addr.is_some() {
            tracing::trace!(port, "l3id 0x{:x}: b-channel already set up", ctx.l3id);
            return Ok(());
        }
        let ch = ctx.data.channel;
        if ch == CHANNEL_NONE || ch > b_num {
            tracing::warn!(port, "l3id 0x{:x}: no usable channel ({}) for b-channel setup", ctx.l3id, ch);
            return Ok(());
        }
        ctx.set_state(BchanState::Setup);
        match transport.new_layer(port, ch) {
            Ok(addr) => {
                tracing::debug!(port, "l3id 0x{:x}: b-channel {} at 0x{:x}", ctx.l3id, ch, addr);
                ctx.bchan_addr = Some(addr);
                ctx.set_state(BchanState::Setuped);
                Ok(())
            }
            Err(e) => {
                tracing::error!(port, "l3id 0x{:x}: b-channel setup failed: {}", ctx.l3id, e);
                ctx.set_state(BchanState::Error);
                Err(e)
            }
        }
    }

    /// Removes the sub-layer of `ctx`, if it has one
    pub fn clean_up_bc(ctx: &mut CallContext, transport: &dyn Transport) {
        let Some(addr) = ctx.bchan_addr.take() else {
            return;
        };
        ctx.set_state(BchanState::Release);
        if let Err(e) = transport.del_layer(addr) {
            tracing::warn!(port = ctx.port, "removing b-channel layer 0x{:x}: {}", addr, e);
        }
        ctx.active = false;
        ctx.set_state(BchanState::Released);
    }

    /// Frees channel, sub-layer and call data of `loc`. `notified` tells whether the
    /// application got a CLEANUP for it.
    pub fn wipe(&mut self, loc: CallLoc, transport: &dyn Transport, notified: bool) {
        self.release_channel(loc);
        let is_nt = self.is_nt();
        let ctx = self.call_mut(loc);
        Self::clean_up_bc(ctx, transport);
        ctx.set_state(if notified { BchanState::CleanRequest } else { BchanState::Clean });
        ctx.empty();
        ctx.set_state(BchanState::Cleaned);
        let l3id = ctx.l3id;
        // NT process ids stay taken until the device releases the call reference
        if !is_nt {
            self.call_refs.free(l3id);
        }
    }

    /* ---------- held calls ---------- */

    /// Moves the call in pool `slot` to the held list and frees the slot. The held copy
    /// keeps session and call reference but gives up its channel and sub-layer.
    pub fn hold(&mut self, slot: usize, transport: &dyn Transport) -> CallLoc {
        let mut held = self.pool[slot].clone();
        held.slot = None;
        held.held = true;
        held.stack_holder = true;
        held.active = false;
        held.bchan_addr = None;
        held.channel_marked = false;
        tracing::debug!(port = self.port, "holding l3id 0x{:x}", held.l3id);
        self.held.push(held);

        let ctx = &mut self.pool[slot];
        ctx.session = Uuid::new_v4();
        ctx.l3id = 0;
        self.wipe(CallLoc::Pool(slot), transport, false);
        CallLoc::Held(self.held.len() - 1)
    }

    pub fn remove_held(&mut self, idx: usize) -> CallContext {
        let ctx = self.held.remove(idx);
        tracing::debug!(port = self.port, "removing held l3id 0x{:x}", ctx.l3id);
        ctx
    }

    /// Moves a held context back into a free pool slot
    pub fn unhold(&mut self, idx: usize) -> Option<usize> {
        let slot = self.pool.iter().position(|c| !c.in_use)?;
        let mut ctx = self.remove_held(idx);
        ctx.slot = Some(slot);
        ctx.stack_holder = false;
        ctx.held = false;
        ctx.in_use = true;
        ctx.state = BchanState::Cleaned;
        ctx.set_state(BchanState::Empty);
        self.pool[slot] = ctx;
        Some(slot)
    }

    /* ---------- reporting ---------- */

    pub fn stack_details(&self, blocked: bool) -> String {
        format!(
            "port {}: {} {} {} l1 {} l2 {}{} channels {}/{} calls {} held {} refs {}",
            self.port,
            self.role,
            self.trunk,
            isdn_core::Topology::from_ptp(self.ptp),
            if self.l1_up { "up" } else { "down" },
            if self.l2_up { "up" } else { "down" },
            if blocked { " BLOCKED" } else { "" },
            self.channels.in_use_count(),
            self.trunk.max_channels().min(self.b_num),
            self.pool.iter().filter(|c| c.in_use).count(),
            self.held.len(),
            self.call_refs.in_use(),
        )
    }

    pub fn log_call(&self, loc: CallLoc) -> Vec<String> {
        let ctx = self.call(loc);
        let mut lines = vec![format!("{} ({})", ctx, if self.is_nt() { "NT" } else { "TE" })];
        lines.extend(ctx.data.summary_lines());
        lines.push(format!(
            "session {} addr {:?} conf {} queued {:?}",
            ctx.session, ctx.bchan_addr, ctx.conf_id, ctx.queued_events
        ));
        lines
    }
}
