//! File-backed caching through full sweeps

use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use looper_rs::axis::{AxisSpec, Scale};
use looper_rs::cache::{CacheStore, FileCacheStore, MemoryCacheStore};
use looper_rs::results::Output;
use looper_rs::{FnSweep, Looper, LooperConfig, Parameters};

use crate::test_helpers::response;

fn config(prefix: &std::path::Path) -> LooperConfig {
    LooperConfig::new(AxisSpec::range("delta", -1.0, 1.0, 17, Scale::Linear).unwrap())
        .with_y(AxisSpec::range("gamma", 1e-2, 1e0, 3, Scale::Log).unwrap())
        .with_file_path_prefix(prefix)
}

#[test]
fn test_round_trip_matches_uncached_run() {
    let dir = tempfile::tempdir().unwrap();
    let prefix = dir.path().join("v1.0").join("3.4a");
    let f = FnSweep::new("response", response).with_version("1");

    let uncached = Looper::new(&f, config(&prefix).with_cache(false), Parameters::new())
        .unwrap()
        .run()
        .unwrap();

    let looper = Looper::new(&f, config(&prefix), Parameters::new()).unwrap();
    let computed = looper.run().unwrap();
    assert!(!computed.from_cache);

    // One entry named after the prefix and key
    let key = looper.cache_key().unwrap();
    let path = FileCacheStore::new(&prefix).entry_path(&key);
    assert!(path.exists());
    assert_eq!(
        path.file_name().unwrap().to_string_lossy(),
        format!("3.4a_{}.json", key)
    );
    let entries: Vec<_> = fs::read_dir(prefix.parent().unwrap()).unwrap().collect();
    assert_eq!(entries.len(), 1);

    // A fresh looper picks the entry up from disk
    let cached = Looper::new(&f, config(&prefix), Parameters::new())
        .unwrap()
        .run()
        .unwrap();
    assert!(cached.from_cache);
    assert_eq!(cached.results, uncached.results);
    assert_eq!(cached.axes, uncached.axes);
}

#[test]
fn test_changed_inputs_miss_the_cache() {
    let dir = tempfile::tempdir().unwrap();
    let prefix = dir.path().join("sweep");
    let calls = AtomicUsize::new(0);
    let f = FnSweep::new("response", |p: &Parameters| {
        calls.fetch_add(1, Ordering::SeqCst);
        response(p)
    });

    let run = |config: LooperConfig, base: Parameters| {
        Looper::new(&f, config, base).unwrap().run().unwrap().from_cache
    };

    assert!(!run(config(&prefix), Parameters::new()));
    assert!(run(config(&prefix), Parameters::new()));
    assert_eq!(calls.load(Ordering::SeqCst), 51);

    // Different base parameters
    assert!(!run(config(&prefix), Parameters::new().with("unused", 1.0)));
    // Different axis
    let wider = config(&prefix).with_x(AxisSpec::range("delta", -2.0, 2.0, 17, Scale::Linear).unwrap());
    assert!(!run(wider, Parameters::new()));
    // Gradient flag
    assert!(!run(config(&prefix).with_grad(true), Parameters::new()));
    assert_eq!(calls.load(Ordering::SeqCst), 51 * 4);
}

#[test]
fn test_function_version_is_part_of_the_key() {
    let dir = tempfile::tempdir().unwrap();
    let prefix = dir.path().join("sweep");

    let v1 = FnSweep::new("response", response).with_version("1");
    let v2 = FnSweep::new("response", response).with_version("2");

    assert!(!Looper::new(v1, config(&prefix), Parameters::new()).unwrap().run().unwrap().from_cache);
    assert!(!Looper::new(v2, config(&prefix), Parameters::new()).unwrap().run().unwrap().from_cache);
}

#[test]
fn test_corrupted_entry_is_recomputed_and_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let prefix = dir.path().join("sweep");
    let f = FnSweep::new("response", response);

    let looper = Looper::new(&f, config(&prefix), Parameters::new()).unwrap();
    let first = looper.run().unwrap();
    let path = FileCacheStore::new(&prefix).entry_path(&looper.cache_key().unwrap());
    fs::write(&path, b"\x00garbage").unwrap();

    let again = Looper::new(&f, config(&prefix), Parameters::new()).unwrap();
    let second = again.run().unwrap();
    assert!(!second.from_cache);
    assert_eq!(second.results, first.results);

    // The rewritten entry is valid again
    assert!(again.run().unwrap().from_cache);
}

#[test]
fn test_nan_results_survive_the_cache() {
    let dir = tempfile::tempdir().unwrap();
    let prefix = dir.path().join("sweep");
    let f = FnSweep::new("sometimes_nan", |p: &Parameters| {
        let x = p.scalar("x")?;
        Ok(Output::Vector(vec![
            if x > 0.0 { f64::NAN } else { x },
            f64::INFINITY,
        ]))
    });
    let config = LooperConfig::new(AxisSpec::explicit("x", vec![-1.0, 0.0, 1.0]).unwrap())
        .with_file_path_prefix(&prefix);

    let computed = Looper::new(&f, config.clone(), Parameters::new()).unwrap().run().unwrap();
    let cached = Looper::new(&f, config, Parameters::new()).unwrap().run().unwrap();
    assert!(cached.from_cache);

    let bits = |r: &looper_rs::LooperResults| {
        r.results.as_array().iter().map(|v| v.to_bits()).collect::<Vec<_>>()
    };
    assert_eq!(bits(&computed), bits(&cached));
}

#[test]
fn test_invalidate_removes_entry() {
    let dir = tempfile::tempdir().unwrap();
    let prefix = dir.path().join("sweep");
    let looper = Looper::new(FnSweep::new("response", response), config(&prefix), Parameters::new())
        .unwrap();
    looper.run().unwrap();

    let store = FileCacheStore::new(&prefix);
    let key = looper.cache_key().unwrap();
    assert!(store.load(&key).is_some());

    looper.invalidate_cache().unwrap();
    assert!(store.load(&key).is_none());
    assert!(!looper.run().unwrap().from_cache);
}

#[test]
fn test_infinite_base_parameter_hits_the_file_cache() {
    let dir = tempfile::tempdir().unwrap();
    let prefix = dir.path().join("sweep");
    let f = FnSweep::new("scaled", |p: &Parameters| {
        let t = p.scalar("T")?;
        Ok(Output::Scalar(p.scalar("x")? * t.signum()))
    });
    let config = LooperConfig::new(AxisSpec::explicit("x", vec![1.0, 2.0]).unwrap())
        .with_file_path_prefix(&prefix);
    let base = Parameters::new().with("T", f64::INFINITY);

    let first = Looper::new(&f, config.clone(), base.clone()).unwrap().run().unwrap();
    let second = Looper::new(&f, config, base).unwrap().run().unwrap();
    assert!(!first.from_cache);
    assert!(second.from_cache);
    assert_eq!(second.results, first.results);
}

#[test]
fn test_opposite_infinities_do_not_share_an_entry() {
    let store: Arc<MemoryCacheStore> = Arc::new(MemoryCacheStore::new());
    let f = FnSweep::new("sign", |p: &Parameters| {
        Ok(Output::Scalar(p.scalar("T")?.signum() * p.scalar("x")?))
    });
    let config = LooperConfig::new(AxisSpec::explicit("x", vec![1.0]).unwrap());

    let run = |t: f64| {
        Looper::new(&f, config.clone(), Parameters::new().with("T", t))
            .unwrap()
            .with_cache_store(store.clone())
            .run()
            .unwrap()
    };

    let positive = run(f64::INFINITY);
    let negative = run(f64::NEG_INFINITY);
    let nan = run(f64::NAN);
    assert!(!negative.from_cache);
    assert!(!nan.from_cache);
    assert_eq!(positive.results.get(&[0]), Some(1.0));
    assert_eq!(negative.results.get(&[0]), Some(-1.0));
    assert_eq!(store.len(), 3);
}
