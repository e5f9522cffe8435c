//! A family of disjoint sets over a dense element range with constant-time
//! membership, removal and reverse lookup.
//!
//! The per-level engines keep one set per cluster plus one overflow set; the
//! structure below shares a single per-element table across all sets so that
//! `set_of` is one indexed read.

/// Where an element currently lives: which set, and at which position inside
/// that set's compact array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot {
    set: u32,
    pos: u32,
}

/// A collection of disjoint sets over the element range `0..range`.
///
/// Each element belongs to at most one set. Removal swaps the last element of
/// the set into the vacated position, so all operations other than
/// [`SetCollection::drain_from`] run in constant time.
#[derive(Debug, Clone)]
pub struct SetCollection {
    sets: Vec<Vec<u32>>,
    slots: Vec<Option<Slot>>,
}

impl SetCollection {
    /// Creates `nb_sets` empty sets over the element range `0..range`.
    ///
    /// `size_hint` pre-sizes each set's element array; it is a capacity hint
    /// only and never limits how many elements a set can hold.
    pub fn new(nb_sets: usize, size_hint: usize, range: usize) -> Self {
        SetCollection {
            sets: (0..nb_sets).map(|_| Vec::with_capacity(size_hint)).collect(),
            slots: vec![None; range],
        }
    }

    pub fn nb_sets(&self) -> usize {
        self.sets.len()
    }

    /// Number of elements currently in set `s`.
    pub fn card(&self, s: usize) -> usize {
        self.sets[s].len()
    }

    /// The elements of set `s`, in insertion order modulo removal swaps.
    pub fn elements(&self, s: usize) -> &[u32] {
        &self.sets[s]
    }

    /// The set containing `element`, if any.
    pub fn set_of(&self, element: u32) -> Option<usize> {
        self.slots[element as usize].map(|slot| slot.set as usize)
    }

    pub fn contains(&self, element: u32) -> bool {
        self.slots[element as usize].is_some()
    }

    /// Adds `element` to set `s`.
    ///
    /// # Panics
    ///
    /// If `element` is already in one of the sets.
    pub fn add(&mut self, element: u32, s: usize) {
        assert!(
            self.slots[element as usize].is_none(),
            "element {element} is already in a set"
        );
        self.slots[element as usize] = Some(Slot {
            set: s as u32,
            pos: self.sets[s].len() as u32,
        });
        self.sets[s].push(element);
    }

    /// Removes `element` from whichever set holds it.
    ///
    /// # Panics
    ///
    /// If `element` is in none of the sets.
    pub fn remove(&mut self, element: u32) {
        let slot = self.slots[element as usize]
            .take()
            .unwrap_or_else(|| panic!("element {element} is in no set"));
        let set = &mut self.sets[slot.set as usize];
        let moved = set.swap_remove(slot.pos as usize);
        debug_assert_eq!(moved, element);
        if let Some(&swapped) = set.get(slot.pos as usize) {
            self.slots[swapped as usize] = Some(Slot {
                set: slot.set,
                pos: slot.pos,
            });
        }
    }

    /// Empties every set with index `first..`, appending the removed elements
    /// to `out` in set order.
    pub fn drain_from(&mut self, first: usize, out: &mut Vec<u32>) {
        for set in &mut self.sets[first..] {
            for &element in set.iter() {
                self.slots[element as usize] = None;
                out.push(element);
            }
            set.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_remove() {
        let mut sets = SetCollection::new(3, 4, 10);
        sets.add(7, 0);
        sets.add(2, 0);
        sets.add(5, 2);
        assert_eq!(sets.set_of(7), Some(0));
        assert_eq!(sets.set_of(5), Some(2));
        assert_eq!(sets.set_of(3), None);
        assert_eq!(sets.card(0), 2);

        sets.remove(7);
        assert!(!sets.contains(7));
        // 2 was swapped into 7's position and must still resolve.
        assert_eq!(sets.set_of(2), Some(0));
        assert_eq!(sets.elements(0), &[2]);
    }

    #[test]
    fn test_remove_middle_keeps_slots_consistent() {
        let mut sets = SetCollection::new(1, 4, 10);
        for e in [1, 2, 3, 4] {
            sets.add(e, 0);
        }
        sets.remove(2);
        sets.remove(4);
        assert_eq!(sets.card(0), 2);
        for &e in sets.elements(0) {
            assert_eq!(sets.set_of(e), Some(0));
        }
        sets.remove(1);
        sets.remove(3);
        assert_eq!(sets.card(0), 0);
    }

    #[test]
    fn test_drain_from() {
        let mut sets = SetCollection::new(4, 4, 16);
        sets.add(1, 0);
        sets.add(2, 1);
        sets.add(3, 2);
        sets.add(4, 3);
        let mut out = Vec::new();
        sets.drain_from(1, &mut out);
        assert_eq!(out, vec![2, 3, 4]);
        assert_eq!(sets.card(0), 1);
        assert!((1..4).all(|s| sets.card(s) == 0));
        assert!(!sets.contains(3));
        // Drained elements can be re-added.
        sets.add(3, 0);
        assert_eq!(sets.set_of(3), Some(0));
    }

    #[test]
    #[should_panic]
    fn test_double_add_panics() {
        let mut sets = SetCollection::new(2, 2, 4);
        sets.add(0, 0);
        sets.add(0, 1);
    }
}
