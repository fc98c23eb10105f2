//! Sweeps shaped like the ones physics scripts run
//!
//! A phase response is swept over detuning (X), power (Y) and an integer
//! mode number (Z). With `grad` enabled the result is the group delay
//! d(phase)/d(delta), whose minimum over X is then collected per (Z, Y).

use approx::assert_relative_eq;
use looper_rs::error::Result;
use looper_rs::results::Output;
use looper_rs::{wrap_looper, AxisRole, FnSweep, LooperConfig, Parameters, Reduction};

/// Phase of a Lorentzian response: atan(delta / gamma_eff) with
/// gamma_eff = gamma * (1 + P * L).
fn phase(p: &Parameters) -> Result<Output> {
    let delta = p.scalar("delta")?;
    let power = p.scalar("P_lc")?;
    let mode = p.scalar("L_p")?;
    let gamma = p.scalar("gamma")?;
    let gamma_eff = gamma * (1.0 + power * mode);
    Ok(Output::Scalar((delta / gamma_eff).atan()))
}

fn base() -> Parameters {
    Parameters::new()
        .with("delta", 0.0)
        .with("P_lc", 1.0)
        .with("L_p", 1.0)
        .with("gamma", 0.5)
        .with("t_line", "s")
}

#[test]
fn test_group_delay_sweep_from_json() {
    let dir = tempfile::tempdir().unwrap();
    let prefix = dir.path().join("data").join("3.7a");
    let json = format!(
        r#"{{
            "show_progress": true,
            "file_path_prefix": {},
            "grad": true,
            "parallel": true,
            "X": {{"var": "delta", "min": -0.2, "max": 0.2, "dim": 401}},
            "Y": {{"var": "P_lc", "min": 0.0, "max": 1.5, "dim": 4}},
            "Z": {{"var": "L_p", "val": [1, 2, 3]}}
        }}"#,
        serde_json::to_string(&prefix).unwrap()
    );
    let config = LooperConfig::from_json(&json).unwrap();

    let f = FnSweep::new("phase", phase).with_version("1");
    let looper = wrap_looper("XYZLooper", &f, config.clone(), base()).unwrap();
    assert!(!looper.from_cache);
    assert_eq!(looper.results.shape(), &[3, 4, 401]);

    // Group delay peaks at resonance with value 1 / gamma_eff
    let peak = looper.reduce(AxisRole::X, Reduction::Max).unwrap();
    let powers = looper.axis_values(AxisRole::Y).unwrap();
    let modes = looper.axis_values(AxisRole::Z).unwrap();
    assert_eq!(modes, &[1.0, 2.0, 3.0]);
    for (k, &mode) in modes.iter().enumerate() {
        for (j, &power) in powers.iter().enumerate() {
            let gamma_eff = 0.5 * (1.0 + power * mode);
            assert_relative_eq!(
                peak.get(&[k, j]).unwrap(),
                1.0 / gamma_eff,
                max_relative = 1e-3
            );
        }
    }

    let at = looper.argreduce_values(AxisRole::X, Reduction::Max).unwrap();
    assert!(at.iter().all(|d| d.abs() < 1e-12));

    // Second run comes from disk with identical values
    let cached = wrap_looper("XYZLooper", &f, config, base()).unwrap();
    assert!(cached.from_cache);
    assert_eq!(cached.results, looper.results);
}

#[test]
fn test_coordinate_meshes_match_results_layout() {
    let config = LooperConfig::from_json(
        r#"{
            "cache": false,
            "X": {"var": "delta", "val": [-0.1, 0.0, 0.1]},
            "Y": {"var": "P_lc", "min": 1e-2, "max": 1e0, "dim": 3, "scale": "log"}
        }"#,
    )
    .unwrap();

    let results = wrap_looper("XYLooper", FnSweep::new("phase", phase), config, base()).unwrap();
    let xs = results.coordinates(AxisRole::X).unwrap();
    let ys = results.coordinates(AxisRole::Y).unwrap();
    assert_eq!(xs.shape(), results.results.sweep_shape());

    // Every entry equals the function at its own mesh coordinates
    for ((&x, &y), &v) in xs.iter().zip(ys.iter()).zip(results.results.as_array().iter()) {
        let expected = (x / (0.5 * (1.0 + y))).atan();
        assert_relative_eq!(v, expected, epsilon = 1e-15);
    }
    assert_relative_eq!(ys[[2, 0]], 1.0, max_relative = 1e-12);
}

#[test]
fn test_wrong_looper_name_is_rejected() {
    let config = LooperConfig::from_json(r#"{"X": {"var": "delta", "val": [0.0, 1.0]}}"#).unwrap();
    let f = FnSweep::new("phase", phase);
    assert!(wrap_looper("XYLooper", &f, config.clone(), base())
        .unwrap_err()
        .is_config());
    assert!(wrap_looper("Looper", &f, config, base()).unwrap_err().is_config());
}
