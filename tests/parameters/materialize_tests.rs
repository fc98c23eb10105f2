//! Materializing grid points into parameters during a sweep

use std::sync::Mutex;

use looper_rs::axis::AxisSpec;
use looper_rs::results::Output;
use looper_rs::{FnSweep, Looper, LooperConfig, ParamValue, Parameters};

#[test]
fn test_indexed_axis_overrides_one_element() {
    let seen = Mutex::new(Vec::new());
    let f = FnSweep::new("record", |p: &Parameters| {
        seen.lock().unwrap().push(p.vector("A_ls")?.to_vec());
        Ok(Output::Scalar(p.vector("A_ls")?.iter().sum()))
    });

    let base = Parameters::new()
        .with("A_ls", vec![100.0, 10.0, 10.0])
        .with("t_line", "s");
    let config = LooperConfig::new(
        AxisSpec::explicit("A_ls", vec![1.0, 2.0, 3.0])
            .unwrap()
            .with_index(1),
    )
    .with_cache(false);

    let results = Looper::new(&f, config, base.clone()).unwrap().run().unwrap();
    assert_eq!(
        results.results.as_array().iter().copied().collect::<Vec<_>>(),
        vec![111.0, 112.0, 113.0]
    );
    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            vec![100.0, 1.0, 10.0],
            vec![100.0, 2.0, 10.0],
            vec![100.0, 3.0, 10.0]
        ]
    );

    // The base mapping is never touched
    let looper = Looper::new(&f, LooperConfig::new(AxisSpec::explicit("x", vec![0.0]).unwrap()), base)
        .unwrap();
    assert_eq!(
        looper.base().get("A_ls"),
        Some(&ParamValue::Vector(vec![100.0, 10.0, 10.0]))
    );
}

#[test]
fn test_two_axes_on_one_vector() {
    let f = FnSweep::new("pair", |p: &Parameters| {
        Ok(Output::Vector(p.vector("n")?.to_vec()))
    });
    let base = Parameters::new().with("n", vec![0.0, 0.0]);
    let config = LooperConfig::new(AxisSpec::explicit("n", vec![5.0, 6.0]).unwrap().with_index(1))
        .with_y(AxisSpec::explicit("n", vec![1.0, 2.0]).unwrap().with_index(0))
        .with_cache(false);

    let results = Looper::new(f, config, base).unwrap().run().unwrap();
    let flat: Vec<f64> = results.results.as_array().iter().copied().collect();
    assert_eq!(
        flat,
        vec![1.0, 5.0, 1.0, 6.0, 2.0, 5.0, 2.0, 6.0]
    );
}

#[test]
fn test_invalid_targets_are_config_errors() {
    let f = FnSweep::new("noop", |_: &Parameters| Ok(Output::Scalar(0.0)));
    let base = Parameters::new()
        .with("n", vec![0.0, 0.0])
        .with("t_line", "s")
        .with("G", 1.0);

    let cases = vec![
        // index past the end
        AxisSpec::explicit("n", vec![1.0]).unwrap().with_index(2),
        // index into a scalar
        AxisSpec::explicit("G", vec![1.0]).unwrap().with_index(0),
        // index into text
        AxisSpec::explicit("t_line", vec![1.0]).unwrap().with_index(0),
        // index into a missing parameter
        AxisSpec::explicit("missing", vec![1.0]).unwrap().with_index(0),
        // whole vector replaced by a scalar
        AxisSpec::explicit("n", vec![1.0]).unwrap(),
    ];

    for axis in cases {
        let config = LooperConfig::new(axis).with_cache(false);
        let err = Looper::new(&f, config, base.clone()).unwrap().run().unwrap_err();
        assert!(err.is_config(), "expected a configuration error, got {}", err);
    }
}
