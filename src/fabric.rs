//! The connection graph and the lifecycle/step engine built atop an arena of
//! [`Machine`]s. `Fabric` is the crate's analog of `starlight::ensemble::
//! Ensemble` / `starlight::t_dag::TDag`: it centralizes storage so that
//! sibling machines can hold stable peer references without raw pointers or
//! unsafe code.

use smallvec::SmallVec;
use triple_arena::Arena;

use crate::{
    bits::PackedBits,
    error::Error,
    machine::{Consumer, Driver, Machine, OutFn, PMachine, TransFn},
};

/// Owns every live [`Machine`] and the bidirectional wiring between them.
///
/// All lifecycle, connection, and stepping operations in spec §4 are
/// methods here, taking `&mut Fabric` plus the [`PMachine`] handles
/// returned by [`Fabric::create_full`] / [`Fabric::create_simple`].
#[derive(Default)]
pub struct Fabric {
    machines: Arena<PMachine, Machine>,
}

fn try_vec_of_none<T>(len: usize) -> Result<Vec<Option<T>>, Error> {
    let mut v = Vec::new();
    v.try_reserve_exact(len).map_err(|_| Error::AllocFailed)?;
    v.resize_with(len, || None);
    Ok(v)
}

fn try_vec_of_empty_lists<T>(len: usize) -> Result<Vec<SmallVec<[T; 4]>>, Error> {
    let mut v = Vec::new();
    v.try_reserve_exact(len).map_err(|_| Error::AllocFailed)?;
    v.resize_with(len, SmallVec::new);
    Ok(v)
}

impl Fabric {
    pub fn new() -> Self {
        Self {
            machines: Arena::new(),
        }
    }

    /// The number of live machines.
    pub fn len(&self) -> usize {
        self.machines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
    }

    pub fn contains(&self, a: PMachine) -> bool {
        self.machines.contains(a)
    }

    pub fn machine(&self, a: PMachine) -> Result<&Machine, Error> {
        self.machines.get(a).ok_or(Error::InvalidPtr)
    }

    /// Creates a machine with fully custom dimensions, callbacks, and
    /// initial state (spec §4.2).
    ///
    /// Fails with [`Error::InvalidArg`] if `m == 0`, `s == 0`, or `q`'s
    /// width does not match `s` (this resolves spec §9's open question on
    /// `set_state`/creation width by requiring the caller's buffer to carry
    /// its own width). Fails with [`Error::AllocFailed`] if any buffer or
    /// table allocation fails; nothing is left behind in either case since
    /// the `Machine` is only inserted into the arena after every fallible
    /// step has already succeeded.
    pub fn create_full(
        &mut self,
        n: usize,
        m: usize,
        s: usize,
        trans: TransFn,
        out: OutFn,
        q: &PackedBits,
    ) -> Result<PMachine, Error> {
        if m == 0 {
            return Err(Error::InvalidArg("create_full: m must be >= 1"));
        }
        if s == 0 {
            return Err(Error::InvalidArg("create_full: s must be >= 1"));
        }
        if q.len() != s {
            return Err(Error::InvalidArg("create_full: q width does not match s"));
        }

        let state = PackedBits::try_zeros(s)?;
        let next_state = PackedBits::try_zeros(s)?;
        let input = PackedBits::try_zeros(n)?;
        let output = PackedBits::try_zeros(m)?;
        let in_edges = try_vec_of_none::<Driver>(n)?;
        let out_edges = try_vec_of_empty_lists::<Consumer>(m)?;

        let mut machine = Machine {
            n,
            m,
            s,
            state,
            next_state,
            input,
            output,
            trans,
            out,
            in_edges,
            out_edges,
        };
        machine.state.copy_from(q);
        recompute_output(&mut machine);

        Ok(self.machines.insert(machine))
    }

    /// Convenience constructor equivalent to `create_full(n, m, m, trans,
    /// identity_out, zero_state)` (spec §4.2).
    pub fn create_simple(&mut self, n: usize, m: usize, trans: TransFn) -> Result<PMachine, Error> {
        if m == 0 {
            return Err(Error::InvalidArg("create_simple: m must be >= 1"));
        }
        let zero = PackedBits::try_zeros(m)?;
        let identity_out: OutFn = Box::new(|output: &mut PackedBits, state: &PackedBits| {
            output.copy_from(state);
        });
        self.create_full(n, m, m, trans, identity_out, &zero)
    }

    /// Destroys a machine, severing every edge it participates in as either
    /// driver or consumer (spec §4.5). Tolerates a handle that does not (or
    /// no longer) refer to a live machine: a no-op, matching `ma_delete`'s
    /// tolerance of a `NULL` pointer.
    pub fn delete(&mut self, a: PMachine) {
        if !self.machines.contains(a) {
            return;
        }
        let n = self.machines.get(a).unwrap().n;
        for bit in 0..n {
            self.disconnect_one(a, bit);
        }
        // By this point every edge where `a` is the consumer is gone,
        // including self-loops, so every remaining entry below belongs to a
        // machine other than `a`.
        let m = self.machines.get(a).unwrap().m;
        for j in 0..m {
            let consumers: SmallVec<[Consumer; 4]> =
                std::mem::take(&mut self.machines.get_mut(a).unwrap().out_edges[j]);
            for consumer in consumers {
                if let Some(cm) = self.machines.get_mut(consumer.machine) {
                    cm.in_edges[consumer.in_bit] = None;
                }
            }
        }
        self.machines.remove(a);
    }

    /// Wires `k` consecutive input bits `[i, i+k)` of `a_in` to `k`
    /// consecutive output bits `[o, o+k)` of `a_out` (spec §4.3).
    ///
    /// Not atomic across the `k`-bit range: if a push fails partway through
    /// with [`Error::AllocFailed`], the bit pairs already linked by this
    /// call stay linked. Retrying the same call re-links them correctly
    /// because step 1 of each pair tears down any existing driver first.
    pub fn connect(&mut self, a_in: PMachine, i: usize, a_out: PMachine, o: usize, k: usize) -> Result<(), Error> {
        if k == 0 {
            return Err(Error::InvalidArg("connect: k must be >= 1"));
        }
        let n = self.machines.get(a_in).ok_or(Error::InvalidPtr)?.n;
        let m = self.machines.get(a_out).ok_or(Error::InvalidPtr)?.m;
        let i_end = i
            .checked_add(k)
            .filter(|&e| e <= n)
            .ok_or(Error::InvalidArg("connect: input range out of bounds"))?;
        let o_end = o
            .checked_add(k)
            .filter(|&e| e <= m)
            .ok_or(Error::InvalidArg("connect: output range out of bounds"))?;
        debug_assert_eq!(i_end - i, k);
        debug_assert_eq!(o_end - o, k);

        for t in 0..k {
            self.connect_one(a_in, i + t, a_out, o + t)?;
        }
        Ok(())
    }

    /// Removes any driver for each of `a_in`'s input bits in `[i, i+k)`
    /// (spec §4.4). Always succeeds once arguments are validated.
    pub fn disconnect(&mut self, a_in: PMachine, i: usize, k: usize) -> Result<(), Error> {
        if k == 0 {
            return Err(Error::InvalidArg("disconnect: k must be >= 1"));
        }
        let n = self.machines.get(a_in).ok_or(Error::InvalidPtr)?.n;
        i.checked_add(k)
            .filter(|&e| e <= n)
            .ok_or(Error::InvalidArg("disconnect: range out of bounds"))?;

        for t in 0..k {
            self.disconnect_one(a_in, i + t);
        }
        Ok(())
    }

    /// Overwrites `a`'s state and immediately recomputes its output (spec
    /// §4.6). Wired consumers only observe the new output at the next
    /// sampling phase of [`Fabric::step`].
    pub fn set_state(&mut self, a: PMachine, q: &PackedBits) -> Result<(), Error> {
        let machine = self.machines.get_mut(a).ok_or(Error::InvalidPtr)?;
        if q.len() != machine.s {
            return Err(Error::InvalidArg("set_state: width mismatch"));
        }
        machine.state.copy_from(q);
        recompute_output(machine);
        Ok(())
    }

    /// Writes `x` into every *unconnected* input bit of `a`; connected bits
    /// are left untouched since they are driven by [`Fabric::step`], not by
    /// this call (spec §4.6).
    pub fn set_input(&mut self, a: PMachine, x: &PackedBits) -> Result<(), Error> {
        let machine = self.machines.get_mut(a).ok_or(Error::InvalidPtr)?;
        if machine.n == 0 {
            return Err(Error::InvalidArg("set_input: machine has no input bits"));
        }
        if x.len() != machine.n {
            return Err(Error::InvalidArg("set_input: width mismatch"));
        }
        for i in 0..machine.n {
            if machine.in_edges[i].is_none() {
                let bit = x.get(i);
                machine.input.copy_bit(i, bit);
            }
        }
        Ok(())
    }

    /// Returns a read-only view of `a`'s output buffer (spec §4.6). The
    /// borrow checker enforces the "valid until the next state-mutating
    /// operation" rule statically: `a`'s output cannot be mutated again
    /// while this reference is alive.
    pub fn get_output(&self, a: PMachine) -> Result<&PackedBits, Error> {
        self.machines.get(a).map(|m| &m.output).ok_or(Error::InvalidPtr)
    }

    /// Advances every machine in `machines` by exactly one synchronous tick
    /// (spec §4.7). Two phases: first every connected input bit samples its
    /// driver's *pre-step* output, then every machine computes its next
    /// state and output from that sampled snapshot. Never allocates.
    pub fn step(&mut self, machines: &[PMachine]) -> Result<(), Error> {
        if machines.is_empty() {
            return Err(Error::InvalidArg("step: machines must be non-empty"));
        }
        for &p in machines {
            if !self.machines.contains(p) {
                return Err(Error::InvalidPtr);
            }
        }

        // Sample phase: snapshot every connected input from its driver's
        // pre-step output before anything in phase two can change it.
        for &p in machines {
            let n = self.machines.get(p).unwrap().n;
            for i in 0..n {
                let edge = self.machines.get(p).unwrap().in_edges[i];
                if let Some(driver) = edge {
                    let bit = self
                        .machines
                        .get(driver.machine)
                        .expect("connection graph invariant violated")
                        .output
                        .get(driver.out_bit);
                    self.machines.get_mut(p).unwrap().input.copy_bit(i, bit);
                }
            }
        }

        // Commit phase: order is immaterial since nothing here reads
        // another machine's output or state.
        for &p in machines {
            let machine = self.machines.get_mut(p).unwrap();
            (machine.trans)(&mut machine.next_state, &machine.input, &machine.state);
            machine.state.copy_from(&machine.next_state);
            recompute_output(machine);
        }
        Ok(())
    }

    /// Checks the bidirectional consistency invariants of spec §3 /
    /// §8 across the whole fabric. Intended for tests and debugging, not
    /// the hot path.
    pub fn verify_integrity(&self) -> Result<(), Error> {
        for (p, machine) in &self.machines {
            if machine.in_edges.len() != machine.n {
                return Err(Error::InvalidArg("in_edges length does not match n"));
            }
            if machine.out_edges.len() != machine.m {
                return Err(Error::InvalidArg("out_edges length does not match m"));
            }
            for (i, edge) in machine.in_edges.iter().enumerate() {
                if let Some(driver) = edge {
                    let dm = self.machines.get(driver.machine).ok_or(Error::InvalidPtr)?;
                    let list = dm
                        .out_edges
                        .get(driver.out_bit)
                        .ok_or(Error::InvalidArg("driver out_bit out of range"))?;
                    let back = list
                        .get(driver.slot)
                        .ok_or(Error::InvalidArg("driver slot out of range"))?;
                    if back.machine != p || back.in_bit != i {
                        return Err(Error::InvalidArg("in_edges/out_edges roundtrip mismatch"));
                    }
                }
            }
            for (j, list) in machine.out_edges.iter().enumerate() {
                for (slot, consumer) in list.iter().enumerate() {
                    let cm = self.machines.get(consumer.machine).ok_or(Error::InvalidPtr)?;
                    let edge = cm.in_edges[consumer.in_bit].ok_or(Error::InvalidArg(
                        "out_edges entry has no matching in_edges back-pointer",
                    ))?;
                    if edge.machine != p || edge.out_bit != j || edge.slot != slot {
                        return Err(Error::InvalidArg("out_edges/in_edges roundtrip mismatch"));
                    }
                }
            }
        }
        Ok(())
    }

    /// Disconnects whatever currently drives `consumer`'s input bit `bit`,
    /// if anything, fixing up the driver's consumer list with a
    /// swap-with-last removal (spec §4.4). A no-op if the bit is
    /// unconnected. Assumes `consumer` is already known to be a live
    /// handle.
    fn disconnect_one(&mut self, consumer: PMachine, bit: usize) {
        let driver = match self.machines.get_mut(consumer).unwrap().in_edges[bit].take() {
            Some(d) => d,
            None => return,
        };

        let swapped = {
            let dm = self
                .machines
                .get_mut(driver.machine)
                .expect("connection graph invariant violated");
            let list = &mut dm.out_edges[driver.out_bit];
            list.swap_remove(driver.slot);
            list.get(driver.slot).copied()
        };
        if let Some(swapped_consumer) = swapped {
            let sm = self
                .machines
                .get_mut(swapped_consumer.machine)
                .expect("connection graph invariant violated");
            sm.in_edges[swapped_consumer.in_bit]
                .as_mut()
                .expect("connection graph invariant violated")
                .slot = driver.slot;
        }
    }

    /// Links a single consumer bit to a single driver bit, tearing down any
    /// pre-existing driver of the consumer bit first (spec §4.3 step 1).
    /// Assumes both handles are already known to be live.
    fn connect_one(&mut self, consumer: PMachine, in_bit: usize, driver: PMachine, out_bit: usize) -> Result<(), Error> {
        self.disconnect_one(consumer, in_bit);

        let slot = {
            let dm = self.machines.get_mut(driver).expect("validated by caller");
            let list = &mut dm.out_edges[out_bit];
            list.try_reserve(1).map_err(|_| Error::AllocFailed)?;
            list.push(Consumer {
                machine: consumer,
                in_bit,
            });
            list.len() - 1
        };

        let cm = self.machines.get_mut(consumer).expect("validated by caller");
        cm.in_edges[in_bit] = Some(Driver {
            machine: driver,
            out_bit,
            slot,
        });
        Ok(())
    }
}

fn recompute_output(machine: &mut Machine) {
    (machine.out)(&mut machine.output, &machine.state);
}
