use std::thread;

use streamplot::{AnimationStore, DeviceId, Sample};

fn s(i: usize) -> Sample {
    Sample::new(i as f64, (i * i) as f64)
}

#[test]
fn buffer_never_exceeds_cap_and_keeps_latest() {
    let cap = 7;
    let store = AnimationStore::new(cap);
    let id = DeviceId::from("dev");
    let mut all = Vec::new();
    let mut next = 0;
    for batch in [1usize, 3, 0, 5, 9, 2, 20, 1] {
        let samples: Vec<Sample> = (next..next + batch).map(s).collect();
        next += batch;
        all.extend(samples.iter().copied());
        store.update(&id, &samples);

        let buf = store.samples(&id).unwrap_or_default();
        assert!(buf.len() <= cap);
        let keep = all.len().min(cap);
        assert_eq!(buf, all[all.len() - keep..].to_vec());
    }
}

#[test]
fn entries_are_created_lazily() {
    let store = AnimationStore::default();
    let id = DeviceId::from("dev");
    store.update(&id, &[]);
    assert!(store.is_empty());
    assert!(store.samples(&id).is_none());
    store.update(&id, &[s(1)]);
    assert_eq!(store.len(), 1);
    assert_eq!(store.line_handle(&id), None);
}

#[test]
fn clear_removes_everything() {
    let store = AnimationStore::default();
    store.update(&DeviceId::from("a"), &[s(1)]);
    store.update(&DeviceId::from("b"), &[s(2)]);
    let epoch = store.epoch();
    store.clear();
    assert!(store.is_empty());
    assert!(store.snapshot().is_empty());
    assert_eq!(store.epoch(), epoch + 1);
}

#[test]
fn snapshot_exposes_xs_and_ys() {
    let store = AnimationStore::default();
    let id = DeviceId::from("dev");
    store.update(&id, &[s(1), s(2), s(3)]);
    let snap = store.snapshot();
    let entry = snap.get(&id).unwrap();
    assert_eq!(entry.xs(), vec![1.0, 2.0, 3.0]);
    assert_eq!(entry.ys(), vec![1.0, 4.0, 9.0]);
    assert_eq!(entry.points(), vec![[1.0, 1.0], [2.0, 4.0], [3.0, 9.0]]);
}

#[test]
fn concurrent_writers_keep_per_device_order() {
    let store = AnimationStore::new(1000);
    let handles: Vec<_> = (0..4)
        .map(|w| {
            let store = store.clone();
            thread::spawn(move || {
                let id = DeviceId::from(format!("dev{w}"));
                for i in 0..200 {
                    store.update(&id, &[s(i)]);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    let snap = store.snapshot();
    assert_eq!(snap.entries.len(), 4);
    for entry in &snap.entries {
        let xs = entry.xs();
        assert_eq!(xs.len(), 200);
        assert!(xs.windows(2).all(|w| w[0] < w[1]));
    }
}
