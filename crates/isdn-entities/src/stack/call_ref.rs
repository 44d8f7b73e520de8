use std::collections::HashSet;

use isdn_core::{L3Id, Role};

/// Size of the NT process id table
pub const MAX_PROCS: usize = 0x100;
/// Upper byte of the call references an NT interface hands out
pub const NT_PROC_MASK: L3Id = 0xff00;
const TE_COUNTER_MAX: u16 = 0xffff;

/// Allocation of local call references. Terminals build them from an entity id and a
/// rolling counter; the network side hands out slots of a process table.
#[derive(Debug, Clone)]
pub enum CallRefAlloc {
    Te {
        entity: u16,
        counter: u16,
        live: HashSet<u16>,
    },
    Nt {
        procids: [bool; MAX_PROCS],
    },
}

impl CallRefAlloc {
    pub fn new(role: Role, entity: u16) -> Self {
        match role {
            Role::Te => Self::new_te(entity, 0),
            Role::Nt => CallRefAlloc::Nt {
                procids: [false; MAX_PROCS],
            },
        }
    }

    /// Terminal allocator whose next reference follows `counter`
    pub fn new_te(entity: u16, counter: u16) -> Self {
        CallRefAlloc::Te {
            entity,
            counter,
            live: HashSet::new(),
        }
    }

    /// Next free call reference, None when every one is taken
    pub fn alloc(&mut self) -> Option<L3Id> {
        match self {
            CallRefAlloc::Te { entity, counter, live } => {
                for _ in 0..TE_COUNTER_MAX {
                    *counter = if *counter >= TE_COUNTER_MAX { 1 } else { *counter + 1 };
                    if live.insert(*counter) {
                        return Some(((*entity as L3Id) << 16) | *counter as L3Id);
                    }
                }
                None
            }
            CallRefAlloc::Nt { procids } => {
                let i = procids.iter().position(|used| !*used)?;
                procids[i] = true;
                Some(NT_PROC_MASK | i as L3Id)
            }
        }
    }

    /// Returns `l3id` to the pool. References this allocator did not hand out are ignored.
    pub fn free(&mut self, l3id: L3Id) -> bool {
        match self {
            CallRefAlloc::Te { entity, live, .. } => {
                if l3id >> 16 != *entity as L3Id {
                    return false;
                }
                live.remove(&((l3id & 0xffff) as u16))
            }
            CallRefAlloc::Nt { procids } => {
                if !is_nt_local(l3id) {
                    return false;
                }
                let i = (l3id & 0xff) as usize;
                let was = procids[i];
                procids[i] = false;
                was
            }
        }
    }

    pub fn in_use(&self) -> usize {
        match self {
            CallRefAlloc::Te { live, .. } => live.len(),
            CallRefAlloc::Nt { procids } => procids.iter().filter(|u| **u).count(),
        }
    }
}

/// True for references built by an NT interface from its process table
pub fn is_nt_local(l3id: L3Id) -> bool {
    l3id & 0xffff_ff00 == NT_PROC_MASK
}

#[cfg(test)]
mod tests {
    use super::*;
    use isdn_core::debug;

    #[test]
    fn test_te_refs_unique_across_wrap() {
        debug::setup_logging_verbose();
        let mut alloc = CallRefAlloc::new_te(0x42, 0xffe0);
        let mut seen = HashSet::new();
        for _ in 0..200 {
            let l3id = alloc.alloc().unwrap();
            assert_eq!(l3id >> 16, 0x42);
            assert_ne!(l3id & 0xffff, 0);
            assert!(seen.insert(l3id), "duplicate call reference 0x{:x}", l3id);
        }
        assert!(seen.contains(&0x42ffff));
        assert!(seen.contains(&0x420001));
    }

    #[test]
    fn test_te_wrap_skips_live_refs() {
        debug::setup_logging_verbose();
        let mut alloc = CallRefAlloc::new_te(1, 0xfffe);
        let a = alloc.alloc().unwrap();
        assert_eq!(a, 0x1ffff);
        let b = alloc.alloc().unwrap();
        assert_eq!(b, 0x10001);
        assert!(alloc.free(b));
        assert!(!alloc.free(b));
        assert!(!alloc.free(0x20002));
        assert_eq!(alloc.in_use(), 1);
    }

    #[test]
    fn test_nt_process_table() {
        debug::setup_logging_verbose();
        let mut alloc = CallRefAlloc::new(Role::Nt, 0);
        assert_eq!(alloc.alloc(), Some(0xff00));
        assert_eq!(alloc.alloc(), Some(0xff01));
        assert!(alloc.free(0xff00));
        assert_eq!(alloc.alloc(), Some(0xff00));
        assert!(!alloc.free(0x10001));
        for _ in 2..MAX_PROCS {
            assert!(alloc.alloc().is_some());
        }
        assert_eq!(alloc.alloc(), None);
        assert!(is_nt_local(0xff7f));
        assert!(!is_nt_local(0x1ff00));
    }
}
