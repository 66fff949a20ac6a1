//! A single Moore machine: its buffers, callbacks, and connection tables.

use smallvec::SmallVec;
use triple_arena::ptr_struct;

use crate::bits::PackedBits;

#[cfg(debug_assertions)]
ptr_struct!(PMachine);
#[cfg(not(debug_assertions))]
ptr_struct!(PMachine());

/// A boxed transition function: `trans(next_state, input, state)`.
///
/// Widths are implicit in the three `PackedBits` arguments; the callback is
/// expected to fill every word of `next_state` and must not retain borrows
/// past the call (see spec §4.7 / §9, "callback opacity").
pub type TransFn = Box<dyn FnMut(&mut PackedBits, &PackedBits, &PackedBits)>;

/// A boxed output function: `out(output, state)`.
pub type OutFn = Box<dyn FnMut(&mut PackedBits, &PackedBits)>;

/// A driver reference stored in a consumer's `in_edges[i]`: which machine
/// and output bit drives this input bit, and this consumer's slot index
/// inside that output bit's consumer list (kept in sync by connect/
/// disconnect so that removal is O(1), see spec §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Driver {
    pub machine: PMachine,
    pub out_bit: usize,
    pub slot: usize,
}

/// A consumer reference stored in a driver's `out_edges[j]` list: which
/// machine and input bit is being driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Consumer {
    pub machine: PMachine,
    pub in_bit: usize,
}

/// A single Moore machine, owning its buffers and connection tables.
///
/// `in_edges` has one slot per input bit (`None` when unconnected);
/// `out_edges` has one list per output bit, each entry a [`Consumer`].
/// Lists start empty and only allocate on first push (`SmallVec` keeps up
/// to 4 consumers inline before spilling to the heap), matching the "lazy
/// list allocation" property of spec §9.
pub struct Machine {
    pub(crate) n: usize,
    pub(crate) m: usize,
    pub(crate) s: usize,
    pub(crate) state: PackedBits,
    pub(crate) next_state: PackedBits,
    /// Zero-width (and so zero-allocation) when `n == 0`, which is
    /// observably identical to the "absent" buffer spec §3 describes: no
    /// caller can read a bit out of a zero-width `PackedBits` anyway.
    pub(crate) input: PackedBits,
    pub(crate) output: PackedBits,
    pub(crate) trans: TransFn,
    pub(crate) out: OutFn,
    pub(crate) in_edges: Vec<Option<Driver>>,
    pub(crate) out_edges: Vec<SmallVec<[Consumer; 4]>>,
}

impl Machine {
    pub fn input_count(&self) -> usize {
        self.n
    }

    pub fn output_count(&self) -> usize {
        self.m
    }

    pub fn state_count(&self) -> usize {
        self.s
    }
}
