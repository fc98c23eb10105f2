//! Transmission sweep example
//!
//! Sweeps the probe detuning (X) and the control power (Y) of a toy
//! optomechanically induced transparency model, caches the result under
//! `data/demo/transmission`, and prints the detuning of minimum transmission
//! for every control power. Run it twice to see the cached path.
//!
//! ```sh
//! cargo run --example transmission_sweep
//! ```

use looper_rs::logging::init_logging;
use looper_rs::{
    wrap_looper, AxisRole, FnSweep, LooperConfig, Output, Parameters, Reduction, Result,
};

/// Transmission of a probe through a cavity with one mechanical mode.
fn transmission(p: &Parameters) -> Result<Output> {
    let delta = p.scalar("delta")?;
    let power = p.scalar("P_lc")?;
    let kappa = p.scalar("kappa")?;
    let gamma_m = p.scalar("gamma_m")?;
    let g0 = p.scalar("g0")?;

    // Effective coupling grows with the square root of the control power
    let g2 = g0 * g0 * power;
    let chi_m_re = gamma_m / 2.0;
    let denom_re = kappa / 2.0 + g2 * chi_m_re / (delta * delta + chi_m_re * chi_m_re);
    let denom_im = -delta + g2 * delta / (delta * delta + chi_m_re * chi_m_re);
    let amp_re = (kappa / 2.0) * denom_re / (denom_re * denom_re + denom_im * denom_im);
    let amp_im = -(kappa / 2.0) * denom_im / (denom_re * denom_re + denom_im * denom_im);

    Ok(Output::Vector(vec![
        (1.0 - amp_re).powi(2) + amp_im.powi(2),
        amp_im.atan2(1.0 - amp_re),
    ]))
}

fn main() -> Result<()> {
    init_logging("info")?;

    let config = LooperConfig::from_json(
        r#"{
            "show_progress": true,
            "file_path_prefix": "data/demo/transmission",
            "parallel": true,
            "X": {"var": "delta", "min": -2.0, "max": 2.0, "dim": 801},
            "Y": {"var": "P_lc", "min": 1e-2, "max": 1e1, "dim": 4, "scale": "log"}
        }"#,
    )?;

    let base = Parameters::new()
        .with("delta", 0.0)
        .with("P_lc", 1.0)
        .with("kappa", 1.0)
        .with("gamma_m", 1e-3)
        .with("g0", 0.2);

    let f = FnSweep::new("transmission", transmission).with_version("1");
    let results = wrap_looper("XYLooper", f, config, base)?;

    println!(
        "{} points, output shape {:?}, cached: {}",
        results.results.as_array().len(),
        results.results.output_shape(),
        results.from_cache
    );

    let powers = results.axis_values(AxisRole::Y).unwrap_or(&[]);
    let dips = results.argreduce_values(AxisRole::X, Reduction::Min)?;
    let depth = results.reduce(AxisRole::X, Reduction::Min)?;
    for (j, power) in powers.iter().enumerate() {
        println!(
            "P_lc = {:>8.3e}: |t|^2 minimum {:.4} at delta = {:+.4}",
            power,
            depth.get(&[j, 0]).unwrap_or(f64::NAN),
            dips[[j, 0]]
        );
    }

    Ok(())
}
