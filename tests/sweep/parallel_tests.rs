//! Parallel dispatch against serial dispatch

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use approx::assert_relative_eq;
use looper_rs::axis::{AxisSpec, Scale};
use looper_rs::error::LooperError;
use looper_rs::results::Output;
use looper_rs::{FnSweep, Looper, LooperConfig, MemoryCacheStore, Parameters, SweepProgress};

use crate::test_helpers::response;

fn config(parallel: bool) -> LooperConfig {
    LooperConfig::new(AxisSpec::range("delta", -2.0, 2.0, 33, Scale::Linear).unwrap())
        .with_y(AxisSpec::range("gamma", 1e-2, 1e1, 4, Scale::Log).unwrap())
        .with_z(AxisSpec::explicit("offset", vec![0.0, 1.0, 2.0]).unwrap())
        .with_parallel(parallel)
        .with_cache(false)
}

/// Response shifted by the Z value, so every outer block differs.
fn shifted_response(p: &Parameters) -> looper_rs::error::Result<Output> {
    let offset = p.scalar("offset")?;
    let values = response(p)?.values().iter().map(|v| v + offset).collect::<Vec<_>>();
    Ok(Output::Vector(values))
}

#[test]
fn test_parallel_equals_serial() {
    let base = Parameters::new().with("offset", 0.0);
    let f = FnSweep::new("shifted_response", shifted_response);

    let serial = Looper::new(&f, config(false), base.clone())
        .unwrap()
        .run()
        .unwrap();
    let parallel = Looper::new(&f, config(true).with_num_workers(2), base)
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(serial.results.shape(), &[3, 4, 33, 2]);
    assert_eq!(parallel.results, serial.results);
    assert_eq!(parallel.axes, serial.axes);

    // Each Z block sits at its own position
    for (k, offset) in [0.0, 1.0, 2.0].iter().enumerate() {
        let re = parallel.results.get(&[k, 0, 16, 0]).unwrap();
        assert_relative_eq!(re, 1.0 / 1e-2 + offset, max_relative = 1e-12);
    }
}

#[test]
fn test_out_of_order_completion_keeps_positions() {
    // Earlier outer values take longer, so they finish last
    let f = FnSweep::new("slow_first", |p: &Parameters| {
        let z = p.scalar("z")?;
        let x = p.scalar("x")?;
        thread::sleep(Duration::from_millis((3.0 - z) as u64 * 5));
        Ok((100.0 * z + x).into())
    });
    let config = LooperConfig::new(AxisSpec::explicit("x", vec![0.0, 1.0]).unwrap())
        .with_y(AxisSpec::explicit("z", vec![0.0, 1.0, 2.0, 3.0]).unwrap())
        .with_parallel(true)
        .with_num_workers(4)
        .with_cache(false);

    let results = Looper::new(f, config, Parameters::new()).unwrap().run().unwrap();
    let values: Vec<f64> = results.results.as_array().iter().copied().collect();
    assert_eq!(
        values,
        vec![0.0, 1.0, 100.0, 101.0, 200.0, 201.0, 300.0, 301.0]
    );
}

#[test]
fn test_progress_is_counted_once() {
    let seen = Arc::new(Mutex::new(Vec::<SweepProgress>::new()));
    let sink = Arc::clone(&seen);
    let base = Parameters::new().with("offset", 0.0);

    Looper::new(FnSweep::new("response", response), config(true), base)
        .unwrap()
        .with_observer(move |p| sink.lock().unwrap().push(p))
        .run()
        .unwrap();

    let seen = seen.lock().unwrap();
    // One update per outer (Z) value
    assert_eq!(seen.len(), 3);
    assert!(seen.iter().all(|p| p.total == 3 * 4 * 33));
    assert_eq!(seen.last().map(|p| p.completed), Some(3 * 4 * 33));
}

#[test]
fn test_parallel_failure_reports_coordinate() {
    let calls = AtomicUsize::new(0);
    let f = FnSweep::new("fails_at_gamma", |p: &Parameters| {
        calls.fetch_add(1, Ordering::SeqCst);
        if p.scalar("offset")? == 1.0 && p.scalar("delta")? == 0.0 {
            return Err("resonance".into());
        }
        response(p)
    });
    let base = Parameters::new().with("offset", 0.0);

    let err = Looper::new(&f, config(true), base).unwrap().run().unwrap_err();
    match err {
        LooperError::Evaluation { coordinate, .. } => {
            assert_eq!(coordinate[0], 1.0);
            assert_eq!(coordinate[2], 0.0);
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(calls.load(Ordering::SeqCst) <= 3 * 4 * 33);
}

#[test]
fn test_interrupt_from_another_thread() {
    let f = FnSweep::new("slow", |_: &Parameters| {
        thread::sleep(Duration::from_millis(2));
        Ok(Output::Scalar(0.0))
    });
    let config = LooperConfig::new(AxisSpec::range("x", 0.0, 1.0, 500, Scale::Linear).unwrap())
        .with_y(AxisSpec::explicit("y", vec![0.0, 1.0]).unwrap())
        .with_parallel(true);

    let store = Arc::new(MemoryCacheStore::new());
    let looper = Looper::new(f, config, Parameters::new())
        .unwrap()
        .with_cache_store(store.clone());
    let interrupt = looper.interrupt();
    let stopper = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        interrupt.trigger();
    });

    let result = looper.run();
    stopper.join().unwrap();
    assert!(matches!(result, Err(LooperError::Interrupted)));

    // Nothing was cached
    assert!(store.is_empty());
}
