//! Reference-counted object arena
//!
//! Objects live in a slot vector with a free list. A slot's generation is
//! bumped every time its object is freed, so a stale [`ObjPtr`] can never
//! alias a newer object: touching one is a reference-count invariant
//! violation and aborts.

use std::fmt;

use super::object::Payload;

/// Raw pointer to a foreign object.
///
/// `ObjPtr` is `Copy` and carries no ownership. Whoever holds one must know
/// whether it owns a reference-count unit (a *new* reference) or merely
/// observes one owned elsewhere (a *borrowed* reference).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjPtr {
    index: u32,
    generation: u32,
}

impl ObjPtr {
    /// Slot index inside the arena.
    pub fn index(self) -> u32 {
        self.index
    }

    /// Generation of the slot when the object was allocated.
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for ObjPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjPtr({}@{})", self.index, self.generation)
    }
}

impl fmt::Display for ObjPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:06x}", ((self.generation as u64) << 24) | self.index as u64)
    }
}

/// Counters describing every reference-count event since the arena was
/// created.
///
/// An allocation counts as the acquisition of the object's first unit, so
/// for any object that has been freed, the units it acquired equal the units
/// it released.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefStats {
    /// Objects allocated
    pub allocations: u64,
    /// Objects freed
    pub frees: u64,
    /// Units acquired (allocations included)
    pub acquires: u64,
    /// Units released
    pub releases: u64,
}

impl RefStats {
    /// Objects currently alive.
    pub fn live(&self) -> u64 {
        self.allocations - self.frees
    }

    /// Units currently held by someone.
    pub fn outstanding(&self) -> u64 {
        self.acquires - self.releases
    }
}

struct Entry {
    refcount: usize,
    payload: Payload,
}

struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

/// Abort on a broken reference-count invariant.
///
/// Continuing would mean releasing an object someone else still owns, so
/// this is never turned into a recoverable error.
#[cold]
#[track_caller]
pub(crate) fn invariant_violation(message: String) -> ! {
    tracing::error!(%message, "reference-count invariant violated");
    panic!("reference-count invariant violated: {}", message);
}

pub(crate) struct Heap {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    stats: RefStats,
}

impl Heap {
    pub fn new() -> Self {
        Self {
            slots: Vec::with_capacity(256),
            free_list: Vec::new(),
            stats: RefStats::default(),
        }
    }

    /// Allocate an object with a reference count of one.
    pub fn alloc(&mut self, payload: Payload) -> ObjPtr {
        self.stats.allocations += 1;
        self.stats.acquires += 1;
        let entry = Some(Entry {
            refcount: 1,
            payload,
        });

        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = entry;
            ObjPtr {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                entry,
            });
            ObjPtr {
                index,
                generation: 0,
            }
        }
    }

    fn entry(&self, ptr: ObjPtr) -> Option<&Entry> {
        self.slots
            .get(ptr.index as usize)
            .filter(|slot| slot.generation == ptr.generation)
            .and_then(|slot| slot.entry.as_ref())
    }

    fn entry_mut(&mut self, ptr: ObjPtr) -> Option<&mut Entry> {
        self.slots
            .get_mut(ptr.index as usize)
            .filter(|slot| slot.generation == ptr.generation)
            .and_then(|slot| slot.entry.as_mut())
    }

    #[track_caller]
    fn live_entry(&self, ptr: ObjPtr) -> &Entry {
        match self.entry(ptr) {
            Some(entry) => entry,
            None => invariant_violation(format!("use of freed object {:?}", ptr)),
        }
    }

    pub fn is_alive(&self, ptr: ObjPtr) -> bool {
        self.entry(ptr).is_some()
    }

    #[track_caller]
    pub fn get(&self, ptr: ObjPtr) -> &Payload {
        &self.live_entry(ptr).payload
    }

    #[track_caller]
    pub fn get_mut(&mut self, ptr: ObjPtr) -> &mut Payload {
        match self.entry_mut(ptr) {
            Some(entry) => &mut entry.payload,
            None => invariant_violation(format!("use of freed object {:?}", ptr)),
        }
    }

    #[track_caller]
    pub fn refcount(&self, ptr: ObjPtr) -> usize {
        self.live_entry(ptr).refcount
    }

    #[track_caller]
    pub fn incref(&mut self, ptr: ObjPtr) {
        match self.entry_mut(ptr) {
            Some(entry) => entry.refcount += 1,
            None => invariant_violation(format!("acquire of freed object {:?}", ptr)),
        }
        self.stats.acquires += 1;
        tracing::trace!(?ptr, "acquire");
    }

    /// Release one unit; frees the object (and releases everything it owns)
    /// when the count reaches zero.
    #[track_caller]
    pub fn decref(&mut self, ptr: ObjPtr) {
        let mut pending = vec![ptr];

        while let Some(ptr) = pending.pop() {
            let remaining = match self.entry_mut(ptr) {
                Some(entry) => {
                    entry.refcount -= 1;
                    entry.refcount
                }
                None => invariant_violation(format!("release of freed object {:?}", ptr)),
            };
            self.stats.releases += 1;
            tracing::trace!(?ptr, remaining, "release");

            if remaining == 0 {
                let slot = &mut self.slots[ptr.index as usize];
                if let Some(entry) = slot.entry.take() {
                    entry.payload.owned_refs(&mut pending);
                }
                slot.generation = slot.generation.wrapping_add(1);
                self.free_list.push(ptr.index);
                self.stats.frees += 1;
            }
        }
    }

    pub fn stats(&self) -> RefStats {
        self.stats
    }

    /// Pointers of every live object.
    pub fn live_pointers(&self) -> Vec<ObjPtr> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.entry.is_some())
            .map(|(index, slot)| ObjPtr {
                index: index as u32,
                generation: slot.generation,
            })
            .collect()
    }
}
