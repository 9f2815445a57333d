//! LRU Order Module
//!
//! Arena-backed doubly linked list recording recency order in O(1).

// == Recency List ==
/// Recency order of cached items.
///
/// - Front = Most recently used
/// - Back = Least recently used
///
/// Items are addressed by the slot index returned from `push_front`, which
/// stays valid until the item is removed.
#[derive(Debug)]
pub struct RecencyList<T> {
    slots: Vec<Option<Slot<T>>>,
    free: Vec<usize>,
    front: Option<usize>,
    back: Option<usize>,
    len: usize,
}

#[derive(Debug)]
struct Slot<T> {
    item: T,
    prev: Option<usize>,
    next: Option<usize>,
}

impl<T> Default for RecencyList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RecencyList<T> {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            front: None,
            back: None,
            len: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            ..Self::new()
        }
    }

    // == Push Front ==
    /// Adds an item as the most recently used and returns its slot.
    pub fn push_front(&mut self, item: T) -> usize {
        let slot = Slot {
            item,
            prev: None,
            next: self.front,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(slot);
                idx
            }
            None => {
                self.slots.push(Some(slot));
                self.slots.len() - 1
            }
        };

        match self.front {
            Some(old_front) => self.slot_mut(old_front).prev = Some(idx),
            None => self.back = Some(idx),
        }
        self.front = Some(idx);
        self.len += 1;
        idx
    }

    // == Touch ==
    /// Marks a slot as most recently used.
    pub fn touch(&mut self, idx: usize) {
        if self.front == Some(idx) {
            return;
        }
        self.detach(idx);
        let old_front = self.front;
        {
            let slot = self.slot_mut(idx);
            slot.prev = None;
            slot.next = old_front;
        }
        match old_front {
            Some(front) => self.slot_mut(front).prev = Some(idx),
            None => self.back = Some(idx),
        }
        self.front = Some(idx);
    }

    // == Remove ==
    /// Removes a slot and returns its item.
    pub fn remove(&mut self, idx: usize) -> T {
        self.detach(idx);
        let slot = self.slots[idx].take().expect("recency slot removed twice");
        self.free.push(idx);
        self.len -= 1;
        slot.item
    }

    // == Evict Oldest ==
    /// Removes and returns the least recently used item.
    pub fn pop_back(&mut self) -> Option<T> {
        let idx = self.back?;
        Some(self.remove(idx))
    }

    /// Slot of the least recently used item.
    // == Back ==
    /// Slot of the least recently used item.
    pub fn back(&self) -> Option<usize> {
        self.back
    }

    // == Get ==
    /// Item in slot `idx`, without touching recency.
    pub fn get(&self, idx: usize) -> &T {
        &self.slot(idx).item
    }

    // == Get Mut ==
    /// Mutable item in slot `idx`, without touching recency.
    pub fn get_mut(&mut self, idx: usize) -> &mut T {
        &mut self.slot_mut(idx).item
    }

    // == Len ==
    /// Number of items in the list.
    pub fn len(&self) -> usize {
        self.len
    }

    // == Is Empty ==
    /// Returns true when the list holds no item.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates `(slot, item)` from most to least recently used.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> + '_ {
        let mut cursor = self.front;
        std::iter::from_fn(move || {
            let idx = cursor?;
            let slot = self.slot(idx);
            cursor = slot.next;
            Some((idx, &slot.item))
        })
    }

    /// Unlinks a slot from its neighbours without freeing it.
    fn detach(&mut self, idx: usize) {
        let (prev, next) = {
            let slot = self.slot(idx);
            (slot.prev, slot.next)
        };
        match prev {
            Some(p) => self.slot_mut(p).next = next,
            None => self.front = next,
        }
        match next {
            Some(n) => self.slot_mut(n).prev = prev,
            None => self.back = prev,
        }
    }

    fn slot(&self, idx: usize) -> &Slot<T> {
        self.slots[idx].as_ref().expect("recency slot is vacant")
    }

    fn slot_mut(&mut self, idx: usize) -> &mut Slot<T> {
        self.slots[idx].as_mut().expect("recency slot is vacant")
    }
}
