use crate::isdn_common::{MAX_BCHANS, RESERVED_CHANNEL, TrunkType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelAllocErr {
    /// Outside 1..=b_num, or the reserved signalling timeslot
    InvalidChannel(u8),
    InUse(u8),
    NotAllocated(u8),
    /// No free channel left on the interface
    Congestion,
}

/// In-use bitmap for the B-channels of one interface.
/// Channel numbers are 1-based; the reserved signalling timeslot is never handed out.
#[derive(Debug, Clone)]
pub struct ChannelBitmap {
    in_use: [bool; MAX_BCHANS as usize],
    b_num: u8,
}

impl ChannelBitmap {
    pub fn new(trunk: TrunkType) -> Self {
        Self::with_b_num(trunk.b_num())
    }

    pub fn with_b_num(b_num: u8) -> Self {
        Self {
            in_use: [false; MAX_BCHANS as usize],
            b_num: b_num.min(MAX_BCHANS),
        }
    }

    pub fn b_num(&self) -> u8 {
        self.b_num
    }

    fn idx(&self, channel: u8) -> Result<usize, ChannelAllocErr> {
        if channel == 0 || channel > self.b_num || channel == RESERVED_CHANNEL {
            Err(ChannelAllocErr::InvalidChannel(channel))
        } else {
            Ok(channel as usize - 1)
        }
    }

    /// Finds a free channel and marks it in use.
    /// `requested == 0` hunts the whole range, ascending or descending; any other
    /// value asks for exactly that channel.
    pub fn find_free(&mut self, requested: u8, prefer_descending: bool) -> Result<u8, ChannelAllocErr> {
        if requested != 0 {
            let idx = self.idx(requested)?;
            if self.in_use[idx] {
                return Err(ChannelAllocErr::InUse(requested));
            }
            self.in_use[idx] = true;
            return Ok(requested);
        }

        let found = if prefer_descending {
            (1..=self.b_num).rev().find(|&ch| ch != RESERVED_CHANNEL && !self.in_use[ch as usize - 1])
        } else {
            (1..=self.b_num).find(|&ch| ch != RESERVED_CHANNEL && !self.in_use[ch as usize - 1])
        };

        match found {
            Some(ch) => {
                self.in_use[ch as usize - 1] = true;
                Ok(ch)
            }
            None => Err(ChannelAllocErr::Congestion),
        }
    }

    /// Marks a channel the peer chose. Double marking is reported, not applied twice.
    pub fn mark(&mut self, channel: u8) -> Result<(), ChannelAllocErr> {
        let idx = self.idx(channel)?;
        if self.in_use[idx] {
            tracing::error!("channel {} marked in use twice", channel);
            return Err(ChannelAllocErr::InUse(channel));
        }
        self.in_use[idx] = true;
        Ok(())
    }

    pub fn release(&mut self, channel: u8) -> Result<(), ChannelAllocErr> {
        let idx = self.idx(channel)?;
        if !self.in_use[idx] {
            return Err(ChannelAllocErr::NotAllocated(channel));
        }
        self.in_use[idx] = false;
        Ok(())
    }

    pub fn is_free(&self, channel: u8) -> bool {
        match self.idx(channel) {
            Ok(idx) => !self.in_use[idx],
            Err(_) => false,
        }
    }

    pub fn in_use_count(&self) -> usize {
        self.in_use.iter().filter(|b| **b).count()
    }

    pub fn clear(&mut self) {
        self.in_use = [false; MAX_BCHANS as usize];
    }
}
