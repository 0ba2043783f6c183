//! End-to-end scenarios driving `Root`/`Bundle`/the collection views against
//! the in-memory backend, matching each numbered scenario and the shard
//! count law.

use bundledb::backend::memory::{MemoryDatabase, MemoryTransaction};
use bundledb::iter::{BundleIter, ListIter, Union};
use bundledb::views::{ListView, MapView, TimelineView};
use bundledb::{BundleConfig, Key, KvIterator, PrimKind, Root, Transaction};
use bytes::Bytes;

fn count_rows(txn: &MemoryTransaction) -> usize {
    let mut it = txn.new_prefix_iterator(&[]).unwrap();
    let mut n = 0;
    while it.valid() {
        n += 1;
        it.next();
    }
    n
}

#[test]
fn scenario_1_small_map() {
    let db = MemoryDatabase::new();
    let cfg = BundleConfig::default();
    {
        let txn = db.transaction(true);
        let mut root = Root::open(&txn, Key::new(1), PrimKind::Map, cfg).unwrap();
        {
            let mut map = MapView::new(root.bundle());
            assert_eq!(map.insert(&txn, Key::new(1), b"a").unwrap(), false);
            assert_eq!(map.insert(&txn, Key::new(2), b"b").unwrap(), false);
        }
        root.commit(&txn).unwrap();
        assert_eq!(count_rows(&txn), 1);
    }

    let txn = db.transaction(false);
    let mut root = Root::open(&txn, Key::new(1), PrimKind::Map, cfg).unwrap();
    let mut map = MapView::new(root.bundle());
    let (val, existed) = map.lookup(&txn, Key::new(1)).unwrap();
    assert!(existed);
    assert_eq!(val.unwrap(), Bytes::from_static(b"a"));
}

#[test]
fn scenario_2_popping_embed() {
    let db = MemoryDatabase::new();
    let cfg = BundleConfig::default();
    let txn = db.transaction(true);
    let mut root = Root::open(&txn, Key::new(2), PrimKind::Map, cfg).unwrap();
    {
        let mut map = MapView::new(root.bundle());
        for i in 1..=6u64 {
            map.insert(&txn, Key::new(i), b"x").unwrap();
        }
    }
    root.commit(&txn).unwrap();
    assert_eq!(count_rows(&txn), 2);
}

#[test]
fn scenario_3_splitting_shards() {
    let db = MemoryDatabase::new();
    let cfg = BundleConfig::default();
    let txn = db.transaction(true);
    let mut root = Root::open(&txn, Key::new(3), PrimKind::Map, cfg).unwrap();
    {
        let mut map = MapView::new(root.bundle());
        for i in 1..=11u64 {
            map.insert(&txn, Key::new(i), b"x").unwrap();
        }
    }
    root.commit(&txn).unwrap();
    assert_eq!(count_rows(&txn), 3);
}

#[test]
fn shard_count_law() {
    let cases: &[(u64, usize)] = &[(1, 1), (5, 1), (6, 2), (10, 2), (11, 3), (20, 3), (21, 4)];
    for &(n, expected_rows) in cases {
        let db = MemoryDatabase::new();
        let cfg = BundleConfig::default();
        let txn = db.transaction(true);
        let mut root = Root::open(&txn, Key::new(100 + n), PrimKind::Map, cfg).unwrap();
        {
            let mut map = MapView::new(root.bundle());
            for i in 1..=n {
                map.insert(&txn, Key::new(i), b"x").unwrap();
            }
        }
        root.commit(&txn).unwrap();
        assert_eq!(count_rows(&txn), expected_rows, "N={n}");
    }
}

#[test]
fn scenario_4_nested_path() {
    let db = MemoryDatabase::new();
    let cfg = BundleConfig::default();
    let path = [Key::new(0), Key::new(3), Key::new(1)];
    {
        let txn = db.transaction(true);
        let mut root = Root::open(&txn, Key::new(4), PrimKind::Map, cfg).unwrap();
        let bundle = root.find_bundle(&txn, PrimKind::Map, &path).unwrap();
        let mut map = MapView::new(bundle);
        map.insert(&txn, Key::new(42), b"x").unwrap();
        root.commit(&txn).unwrap();
    }

    let txn = db.transaction(false);
    let mut root = Root::open(&txn, Key::new(4), PrimKind::Map, cfg).unwrap();
    let bundle = root.find_bundle(&txn, PrimKind::Map, &path).unwrap();
    let mut map = MapView::new(bundle);
    let (val, existed) = map.lookup(&txn, Key::new(42)).unwrap();
    assert!(existed);
    assert_eq!(val.unwrap(), Bytes::from_static(b"x"));
}

#[test]
fn scenario_5_list_ordering() {
    let db = MemoryDatabase::new();
    let cfg = BundleConfig::default();
    let txn = db.transaction(true);
    let mut root = Root::open(&txn, Key::new(5), PrimKind::List, cfg).unwrap();
    let mut list = ListView::new(root.bundle());

    list.rpush(&txn, b"0").unwrap();
    list.lpush(&txn, b"1").unwrap();
    list.rpush(&txn, b"2").unwrap();
    list.lpush(&txn, b"3").unwrap();

    let expect_popped = [b"3".as_slice(), b"1", b"0", b"2"];
    for expected in expect_popped {
        let (val, existed) = list.lpop(&txn).unwrap();
        assert!(existed);
        assert_eq!(val.unwrap(), Bytes::copy_from_slice(expected));
    }
    let (val, existed) = list.lpop(&txn).unwrap();
    assert!(!existed);
    assert_eq!(val, None);
}

#[test]
fn scenario_6_timeline_monotone() {
    let db = MemoryDatabase::new();
    let cfg = BundleConfig::default();
    let txn = db.transaction(true);
    let mut root = Root::open(&txn, Key::new(6), PrimKind::Timeline, cfg).unwrap();
    let mut timeline = TimelineView::new(root.bundle());

    for i in 0..=9u64 {
        timeline.set_next(&txn, i.to_string().as_bytes()).unwrap();
    }

    let (val, key) = timeline.current(&txn).unwrap();
    assert_eq!(key, Key::new(9));
    assert_eq!(val.unwrap(), Bytes::from_static(b"9"));

    for i in 0..=8u64 {
        let (val, existed) = timeline.past(&txn, Key::new(i)).unwrap();
        assert!(existed, "key {i} should be in the past");
        assert_eq!(val.unwrap(), Bytes::copy_from_slice(i.to_string().as_bytes()));
    }
    for i in 10..=12u64 {
        let (_, existed) = timeline.past(&txn, Key::new(i)).unwrap();
        assert!(!existed);
    }
}

#[test]
fn scenario_7_union_iterator() {
    let db = MemoryDatabase::new();
    let cfg = BundleConfig::default();
    let txn = db.transaction(true);
    let mut root = Root::open(&txn, Key::new(7), PrimKind::Map, cfg).unwrap();

    let a_keys: Vec<u64> = (2..=18).step_by(2).collect();
    let b_keys: Vec<u64> = (10..=28).step_by(2).collect();
    let c_keys: Vec<u64> = vec![0];

    for (slot, keys) in [(0u64, &a_keys), (1, &b_keys), (2, &c_keys)] {
        let bundle = root.find_bundle(&txn, PrimKind::Map, &[Key::new(slot)]).unwrap();
        let mut map = MapView::new(bundle);
        for &k in keys.iter() {
            map.insert(&txn, Key::new(k), b"x").unwrap();
        }
    }

    let mut collected: Vec<Vec<Key>> = Vec::new();
    for slot in 0u64..3 {
        let bundle = root.find_bundle(&txn, PrimKind::Map, &[Key::new(slot)]).unwrap();
        let mut map = MapView::new(bundle);
        let mut it = map.iterator(&txn);
        let mut out = Vec::new();
        while it.valid() {
            out.push(it.key());
            it.next();
        }
        collected.push(out);
    }

    let mut union = Union::new(
        collected
            .into_iter()
            .map(|ks| Box::new(ListIter::new(ks)) as Box<dyn BundleIter>)
            .collect(),
    );
    union.seek(Key::new(0));
    let mut out = Vec::new();
    while union.valid() {
        out.push(union.key().0);
        union.next();
    }
    let expected: Vec<u64> = (0..=28).step_by(2).collect();
    assert_eq!(out, expected);
    assert_eq!(out.len(), 15);
}
