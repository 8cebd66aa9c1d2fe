use nalgebra::DMatrix;
use overactuated::{
    wrench::{FORWARD, PITCH, RIGHT, ROLL, THROTTLE, YAW},
    OveractuatedMotors,
};

const POINTS: usize = 150;

/// Hover command with a small deterministic wobble on the horizontal and yaw axes.
fn commands() -> DMatrix<f64> {
    DMatrix::from_fn(6, POINTS, |axis, t| {
        let wobble = 0.002 * (t as f64 * 0.7 + axis as f64).sin();
        match axis {
            FORWARD | RIGHT | YAW => 0.1 + wobble,
            THROTTLE => -0.9,
            ROLL => 0.2,
            PITCH => 0.3,
            _ => unreachable!(),
        }
    })
}

fn main() -> Result<(), overactuated::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut motors = OveractuatedMotors::<f64>::reference()?;
    let kinematics = motors.output(&commands())?;

    for (k, series) in kinematics.effectors.iter().enumerate() {
        let alpha = series.alpha.iter().flatten();
        let beta = series.beta.iter().flatten();
        log::info!(
            "motor {}: omega {:.1} throttle {:.3} pitch {:.2}..{:.2} roll {:.2}..{:.2} ({} held)",
            k + 1,
            series.angular_velocity[POINTS - 1],
            series.throttle[POINTS - 1],
            alpha.clone().cloned().fold(f64::INFINITY, f64::min),
            alpha.cloned().fold(f64::NEG_INFINITY, f64::max),
            beta.clone().cloned().fold(f64::INFINITY, f64::min),
            beta.cloned().fold(f64::NEG_INFINITY, f64::max),
            series.degenerate.len(),
        );
    }

    Ok(())
}
