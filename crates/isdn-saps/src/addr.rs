//! Frame routing address: port in the low byte, B-channel number in the next
//! byte, and a flag marking B-channel sub-layer traffic.

pub const ADDR_PORT_MASK: u32 = 0x0000_00ff;
pub const ADDR_CHANNEL_MASK: u32 = 0x0000_ff00;
pub const ADDR_CHANNEL_SHIFT: u32 = 8;
pub const FLG_BCHANNEL: u32 = 0x0001_0000;

/// Address of the signalling (D-channel) side of a port
pub fn port_addr(port: u8) -> u32 {
    port as u32
}

/// Address of a B-channel sub-layer
pub fn bchannel_addr(port: u8, channel: u8) -> u32 {
    FLG_BCHANNEL | ((channel as u32) << ADDR_CHANNEL_SHIFT) | port as u32
}

pub fn addr_port(addr: u32) -> u8 {
    (addr & ADDR_PORT_MASK) as u8
}

pub fn addr_channel(addr: u32) -> u8 {
    ((addr & ADDR_CHANNEL_MASK) >> ADDR_CHANNEL_SHIFT) as u8
}

pub fn is_bchannel_addr(addr: u32) -> bool {
    addr & FLG_BCHANNEL != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addr_layout() {
        let a = bchannel_addr(3, 17);
        assert!(is_bchannel_addr(a));
        assert_eq!(addr_port(a), 3);
        assert_eq!(addr_channel(a), 17);
        assert!(!is_bchannel_addr(port_addr(3)));
        assert_eq!(addr_port(port_addr(9)), 9);
    }
}
