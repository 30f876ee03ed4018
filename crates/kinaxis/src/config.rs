use anyhow::{Context, Result};
use kinaxis_core::{
    kinematics::cartesian::{Axis, CartesianKin},
    rot_axis_adjust::ProbePoint,
    trap_queue::{Coord, TrapQueue},
};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fs, path::Path};

// Rounding slack when one move starts where the previous one ends
const MOVE_TIME_EPSILON: f64 = 0.000_000_001;

/// Machine description: the steppers to drive and the moves to run them through
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Sampling configuration
    #[serde(default)]
    pub sampling: SamplingConfig,

    /// Toolhead state before the first move
    #[serde(default)]
    pub toolhead: ToolheadConfig,

    /// One entry per driven stepper
    #[serde(default, rename = "stepper")]
    pub steppers: Vec<StepperConfig>,

    /// Trapezoidal moves, in print time order
    #[serde(default, rename = "move")]
    pub moves: Vec<MoveConfig>,

    /// Probe points for the rotary axis alignment helper
    pub rot_axis_adjust: Option<RotAxisAdjustConfig>,
}

/// Sampling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Seconds between position samples within a move
    #[serde(default = "default_interval")]
    pub interval: f64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolheadConfig {
    /// Starting position as `[x, y, z, a, b]`
    #[serde(default)]
    pub position: [f64; 5],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepperConfig {
    pub name: String,

    /// One of x, y, z, a (linear) or b (rotary, degrees)
    pub axis: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveConfig {
    pub print_time: f64,
    #[serde(default)]
    pub accel_t: f64,
    #[serde(default)]
    pub cruise_t: f64,
    #[serde(default)]
    pub decel_t: f64,
    pub start_pos: [f64; 5],
    /// Direction of travel as `[x, y, z, a, b]`
    pub axes_r: [f64; 5],
    #[serde(default)]
    pub start_v: f64,
    #[serde(default)]
    pub cruise_v: f64,
    #[serde(default)]
    pub accel: f64,
}

impl MoveConfig {
    pub fn end_time(&self) -> f64 {
        self.print_time + self.accel_t + self.cruise_t + self.decel_t
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotAxisAdjustConfig {
    /// Probe positions as `[x, y]`
    pub points: Vec<[f64; 2]>,
}

impl RotAxisAdjustConfig {
    /// Pair each configured point with its probed z height.
    pub fn probe_points(&self, z: &[f64]) -> Result<Vec<ProbePoint>> {
        if z.len() != self.points.len() {
            anyhow::bail!(
                "expected {} probed heights, got {}",
                self.points.len(),
                z.len()
            );
        }
        Ok(self
            .points
            .iter()
            .zip(z)
            .map(|(&[_, y], &z)| ProbePoint { y, z })
            .collect())
    }
}

fn default_interval() -> f64 {
    0.1
}

impl Config {
    /// Load configuration from a file, auto-detecting TOML or JSON format
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;

        match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => Self::from_toml(&content),
            Some("json") => Self::from_json(&content),
            // Try TOML first (preferred), fall back to JSON
            _ => Self::from_toml(&content).or_else(|_| Self::from_json(&content)),
        }
    }

    /// Parse configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("failed to parse config as TOML")
    }

    /// Parse configuration from JSON string
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("failed to parse config as JSON")
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let interval = self.sampling.interval;
        if !interval.is_finite() || interval <= 0.0 {
            anyhow::bail!("sampling.interval must be positive, got {interval}");
        }

        if self.steppers.is_empty() {
            anyhow::bail!("at least one [[stepper]] must be configured");
        }

        let mut names = HashSet::new();
        for stepper in &self.steppers {
            if stepper.name.is_empty() {
                anyhow::bail!("stepper name cannot be empty");
            }
            if !names.insert(stepper.name.as_str()) {
                anyhow::bail!("duplicate stepper name '{}'", stepper.name);
            }
            Axis::parse(&stepper.axis)
                .with_context(|| format!("invalid axis for stepper '{}'", stepper.name))?;
        }

        let mut prev_end = f64::NEG_INFINITY;
        for (i, m) in self.moves.iter().enumerate() {
            let durations = [m.accel_t, m.cruise_t, m.decel_t];
            if !m.print_time.is_finite() || durations.iter().any(|t| !t.is_finite() || *t < 0.0) {
                anyhow::bail!("move {i} has an invalid print time or duration");
            }
            if m.print_time < prev_end - MOVE_TIME_EPSILON {
                anyhow::bail!(
                    "move {i} starts at {} before the previous move ends at {prev_end}",
                    m.print_time
                );
            }
            prev_end = m.end_time();
        }

        let adjust_points = self
            .rot_axis_adjust
            .as_ref()
            .map_or(2, |adjust| adjust.points.len());
        if adjust_points != 2 {
            anyhow::bail!("rot_axis_adjust: must have exactly two positions, got {adjust_points}");
        }

        Ok(())
    }

    /// Allocate kinematics for every configured stepper
    pub fn build_steppers(&self) -> Result<Vec<(String, CartesianKin)>> {
        self.steppers
            .iter()
            .map(|stepper| {
                let axis = Axis::parse(&stepper.axis)
                    .with_context(|| format!("invalid axis for stepper '{}'", stepper.name))?;
                Ok((stepper.name.clone(), CartesianKin::new(axis)))
            })
            .collect()
    }

    /// Queue every configured move
    pub fn build_trap_queue(&self) -> TrapQueue {
        let mut trapq = TrapQueue::new();
        for m in &self.moves {
            trapq.append(
                m.print_time,
                m.accel_t,
                m.cruise_t,
                m.decel_t,
                Coord::from(m.start_pos),
                Coord::from(m.axes_r),
                m.start_v,
                m.cruise_v,
                m.accel,
            );
        }
        trapq
    }

    /// Print time at which the last configured move completes
    pub fn end_time(&self) -> f64 {
        self.moves
            .iter()
            .map(MoveConfig::end_time)
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROTARY: &str = r#"
[sampling]
interval = 0.25

[toolhead]
position = [0, 0, 0, 0, 170]

[[stepper]]
name = "stepper_b"
axis = "b"

[[stepper]]
name = "stepper_x"
axis = "X"

[[move]]
print_time = 0.0
cruise_t = 1.0
start_pos = [0, 0, 0, 0, 170]
axes_r = [0, 0, 0, 0, -1]
cruise_v = 340.0

[rot_axis_adjust]
points = [[10.0, -20.0], [10.0, 20.0]]
"#;

    #[test]
    fn test_parse_toml() {
        let config = Config::from_toml(ROTARY).unwrap();
        config.validate().unwrap();
        assert_eq!(config.sampling.interval, 0.25);
        assert_eq!(config.steppers.len(), 2);
        assert_eq!(config.moves[0].cruise_v, 340.0);
        assert_eq!(config.moves[0].accel_t, 0.0);
        assert_eq!(config.end_time(), 1.0);

        let steppers = config.build_steppers().unwrap();
        assert_eq!(steppers[0].1.axis(), Axis::B);
        assert_eq!(steppers[1].1.axis(), Axis::X);
    }

    #[test]
    fn test_parse_json() {
        let json = r#"{
            "stepper": [{ "name": "stepper_a", "axis": "a" }],
            "move": [{
                "print_time": 0.5,
                "accel_t": 0.5,
                "start_pos": [0, 0, 0, 0, 0],
                "axes_r": [0, 0, 0, 1, 0],
                "accel": 4.0
            }]
        }"#;

        let config = Config::from_json(json).unwrap();
        config.validate().unwrap();
        assert_eq!(config.sampling.interval, 0.1);
        assert_eq!(config.end_time(), 1.0);
        assert!(config.rot_axis_adjust.is_none());
    }

    #[test]
    fn test_rejects_unknown_axis() {
        let config = Config::from_toml(
            r#"
[[stepper]]
name = "stepper_q"
axis = "q"
"#,
        )
        .unwrap();
        let err = config.validate().unwrap_err();
        assert_eq!(err.to_string(), "invalid axis for stepper 'stepper_q'");
        assert!(format!("{err:#}").contains("unknown axis 'q'"));
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let config = Config::from_toml(
            r#"
[[stepper]]
name = "s"
axis = "x"

[[stepper]]
name = "s"
axis = "y"
"#,
        )
        .unwrap();
        let err = config.validate().unwrap_err();
        assert_eq!(err.to_string(), "duplicate stepper name 's'");
    }

    #[test]
    fn test_rejects_empty_and_bad_sampling() {
        let empty = Config::from_toml("").unwrap();
        assert!(empty.validate().is_err());

        let mut config = Config::from_toml(ROTARY).unwrap();
        config.sampling.interval = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_moves_out_of_order() {
        let config = Config::from_toml(
            r#"
[[stepper]]
name = "stepper_x"
axis = "x"

[[move]]
print_time = 1.0
cruise_t = 1.0
start_pos = [10, 0, 0, 0, 0]
axes_r = [1, 0, 0, 0, 0]
cruise_v = 10.0

[[move]]
print_time = 0.0
cruise_t = 1.0
start_pos = [0, 0, 0, 0, 0]
axes_r = [1, 0, 0, 0, 0]
cruise_v = 10.0
"#,
        )
        .unwrap();
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "move 1 starts at 0 before the previous move ends at 2"
        );
    }

    #[test]
    fn test_accepts_back_to_back_and_gapped_moves() {
        let mut config = Config::from_toml(ROTARY).unwrap();
        let first = config.moves[0].clone();
        config.moves.push(MoveConfig {
            print_time: first.end_time(),
            ..first.clone()
        });
        config.moves.push(MoveConfig {
            print_time: 5.0,
            ..first.clone()
        });
        config.validate().unwrap();

        // Overlapping the previous move by half its cruise
        config.moves.push(MoveConfig {
            print_time: 5.5,
            ..first
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rot_axis_adjust_needs_two_points() {
        let mut config = Config::from_toml(ROTARY).unwrap();
        let adjust = config.rot_axis_adjust.as_mut().unwrap();
        adjust.points.push([0.0, 0.0]);
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "rot_axis_adjust: must have exactly two positions, got 3"
        );
    }

    #[test]
    fn test_probe_points_pair_heights() {
        let config = Config::from_toml(ROTARY).unwrap();
        let adjust = config.rot_axis_adjust.unwrap();
        let points = adjust.probe_points(&[0.1, 0.2]).unwrap();
        assert_eq!(points[0], ProbePoint { y: -20.0, z: 0.1 });
        assert_eq!(points[1], ProbePoint { y: 20.0, z: 0.2 });
        assert!(adjust.probe_points(&[0.1]).is_err());
    }
}
