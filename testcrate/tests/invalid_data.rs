//! Precondition checks: every documented `InvalidArg`/`InvalidPtr` case
//! must be rejected, and the corresponding valid case must still succeed.

use wireloom::{Error, Fabric, PackedBits};

fn sum_trans() -> wireloom::TransFn {
    Box::new(|next_state: &mut PackedBits, input: &PackedBits, old_state: &PackedBits| {
        next_state.copy_bit(0, old_state.get(0) ^ input.get(0));
    })
}

fn add_one() -> wireloom::OutFn {
    Box::new(|output: &mut PackedBits, state: &PackedBits| {
        output.copy_bit(0, !state.get(0));
    })
}

#[test]
fn invalid_constructor() {
    let mut fab = Fabric::new();
    let q1 = {
        let mut b = PackedBits::zeros(1);
        b.set(0);
        b
    };

    assert!(matches!(
        fab.create_full(1, 0, 1, sum_trans(), add_one(), &q1),
        Err(Error::InvalidArg(_))
    ));
    assert!(matches!(
        fab.create_full(1, 1, 0, sum_trans(), add_one(), &q1),
        Err(Error::InvalidArg(_))
    ));
    let wrong_width = PackedBits::zeros(2);
    assert!(matches!(
        fab.create_full(1, 1, 1, sum_trans(), add_one(), &wrong_width),
        Err(Error::InvalidArg(_))
    ));
    assert!(matches!(fab.create_simple(1, 0, sum_trans()), Err(Error::InvalidArg(_))));

    let m = fab.create_full(0, 1, 1, sum_trans(), add_one(), &q1).unwrap();
    fab.delete(m);

    let m = fab.create_simple(0, 1, sum_trans()).unwrap();
    fab.delete(m);
}

#[test]
fn invalid_connect() {
    let mut fab = Fabric::new();
    let input0 = 337usize;
    let input1 = input0 + 1;

    let m0 = fab.create_simple(input0, 1, sum_trans()).unwrap();
    let m1 = fab.create_simple(1, input1, sum_trans()).unwrap();

    let mut removed = Fabric::new();
    let dangling = removed.create_simple(1, 1, sum_trans()).unwrap();
    removed.delete(dangling);
    assert!(matches!(fab.connect(dangling, 0, m1, 0, 1), Err(Error::InvalidPtr)));
    assert!(matches!(fab.connect(m0, 0, dangling, 0, 1), Err(Error::InvalidPtr)));

    assert!(matches!(fab.connect(m0, input0, m1, 0, 1), Err(Error::InvalidArg(_))));
    assert!(matches!(fab.connect(m0, 0, m1, input1, 1), Err(Error::InvalidArg(_))));
    assert!(matches!(fab.connect(m0, 0, m1, 0, input0 + 1), Err(Error::InvalidArg(_))));
    assert!(matches!(fab.connect(m0, 5, m1, 0, input0 + 6), Err(Error::InvalidArg(_))));

    assert!(fab.connect(m0, 0, m1, 1, input0).is_ok());

    fab.delete(m0);
    fab.delete(m1);
}

#[test]
fn invalid_disconnect() {
    let mut fab = Fabric::new();
    let input = 337usize;
    let m = fab.create_simple(input, 1, sum_trans()).unwrap();

    let mut removed = Fabric::new();
    let dangling = removed.create_simple(1, 1, sum_trans()).unwrap();
    removed.delete(dangling);
    assert!(matches!(fab.disconnect(dangling, 0, 1), Err(Error::InvalidPtr)));

    assert!(matches!(fab.disconnect(m, 0, 0), Err(Error::InvalidArg(_))));
    assert!(matches!(fab.disconnect(m, 0, input + 1), Err(Error::InvalidArg(_))));
    assert!(matches!(fab.disconnect(m, input, 1), Err(Error::InvalidArg(_))));

    fab.delete(m);
}

#[test]
fn invalid_set_input() {
    let mut fab = Fabric::new();
    let q = PackedBits::zeros(1);
    let m = fab.create_simple(1, 1, sum_trans()).unwrap();
    let m_empty = fab.create_simple(0, 1, sum_trans()).unwrap();

    let mut removed = Fabric::new();
    let dangling = removed.create_simple(1, 1, sum_trans()).unwrap();
    removed.delete(dangling);
    assert!(matches!(fab.set_input(dangling, &q), Err(Error::InvalidPtr)));

    let wrong_width = PackedBits::zeros(2);
    assert!(matches!(fab.set_input(m, &wrong_width), Err(Error::InvalidArg(_))));
    assert!(matches!(fab.set_input(m_empty, &q), Err(Error::InvalidArg(_))));

    fab.delete(m);
    fab.delete(m_empty);
}

#[test]
fn invalid_set_state() {
    let mut fab = Fabric::new();
    let q = PackedBits::zeros(1);
    let m = fab.create_simple(1, 1, sum_trans()).unwrap();

    let mut removed = Fabric::new();
    let dangling = removed.create_simple(1, 1, sum_trans()).unwrap();
    removed.delete(dangling);
    assert!(matches!(fab.set_state(dangling, &q), Err(Error::InvalidPtr)));

    let wrong_width = PackedBits::zeros(2);
    assert!(matches!(fab.set_state(m, &wrong_width), Err(Error::InvalidArg(_))));

    fab.delete(m);
}

#[test]
fn invalid_get_output() {
    let fab = Fabric::new();
    let mut removed = Fabric::new();
    let dangling = removed.create_simple(1, 1, sum_trans()).unwrap();
    removed.delete(dangling);
    assert!(matches!(fab.get_output(dangling), Err(Error::InvalidPtr)));
}

#[test]
fn invalid_step() {
    let mut fab = Fabric::new();
    assert!(matches!(fab.step(&[]), Err(Error::InvalidArg(_))));

    let n = 10;
    let mut ms = Vec::new();
    for _ in 0..n {
        ms.push(fab.create_simple(1, 1, sum_trans()).unwrap());
    }

    for i in 0..n {
        let removed = ms[i];
        fab.delete(removed);
        assert!(matches!(fab.step(&ms), Err(Error::InvalidPtr)));
        // re-create so the rest of the loop's `ms` entries stay meaningful;
        // the original handle is now permanently dangling either way.
        ms[i] = fab.create_simple(1, 1, sum_trans()).unwrap();
    }

    for m in ms {
        fab.delete(m);
    }
}
