use kinaxis_core::{
    kinematics::{
        CalcPositionCallback, MoveCoord, PostCallback,
        cartesian::{Axis, CartesianKin, fold_angle},
    },
    sampler::Sampler,
    trap_queue::{Coord, TrapQueue},
};

/// Evaluator that reports a single coordinate regardless of time
struct Fixed(Coord);

impl MoveCoord for Fixed {
    fn coord_at(&self, _move_time: f64) -> Coord {
        self.0
    }
}

fn rotary(b: f64) -> Fixed {
    Fixed(Coord {
        b,
        ..Coord::default()
    })
}

// Hundredths of a degree, kept inside the evaluator's +/-180 window
fn wrapped_angle(raw: i16) -> f64 {
    f64::from(raw % 18000) / 100.0
}

#[test]
fn rotary_positions_never_jump_more_than_half_turn() {
    bolero::check!()
        .with_type::<Vec<i16>>()
        .for_each(|raw_angles| {
            let mut kin = CartesianKin::new(Axis::B);
            for &raw in raw_angles {
                let angle = wrapped_angle(raw);
                let prev = kin.commanded_pos();
                let pos = kin.calc_position(&rotary(angle), 0.0);

                assert!((pos - prev).abs() <= 180.0, "{prev} -> {pos}");
                let turns = (pos - angle) / 360.0;
                assert!(
                    (turns - turns.round()).abs() < 1e-9,
                    "{pos} is not {angle} + 360k"
                );

                kin.set_commanded_pos(pos);
                kin.post_step();
                let folded = kin.commanded_pos();
                assert!((-180.0..=180.0).contains(&folded), "{folded}");
            }
        });
}

#[test]
fn sampled_rotation_stays_bounded_across_many_turns() {
    const INTERVAL: f64 = 0.1;

    bolero::check!()
        .with_type::<Vec<i16>>()
        .for_each(|speeds| {
            // One second per move at up to 1500 deg/s, so each sample
            // advances less than half a turn
            let mut trapq = TrapQueue::new();
            let mut b = 0.0;
            for (i, &speed) in speeds.iter().take(16).enumerate() {
                let v = f64::from(speed % 1500);
                let start = Coord {
                    b,
                    ..Coord::default()
                };
                let dir = Coord::new(0.0, 0.0, 0.0, 0.0, 1.0);
                trapq.append(i as f64, 0.0, 1.0, 0.0, start, dir, 0.0, v, 0.0);
                b += v;
            }

            let mut sampler = Sampler::new(CartesianKin::new(Axis::B), INTERVAL).unwrap();
            let mut commanded = sampler.commanded_pos();
            for s in sampler.sample(&trapq, speeds.len().min(16) as f64) {
                let step = s.position - commanded;
                assert!(step.abs() <= 150.0 + 1e-6, "{commanded} -> {}", s.position);
                commanded = fold_angle(s.position);
                assert!((-180.0..=180.0).contains(&commanded), "{commanded}");
            }
            assert_eq!(sampler.commanded_pos(), commanded);
        });
}

#[test]
fn linear_axes_are_pure_projections() {
    bolero::check!()
        .with_type::<(f64, f64, f64)>()
        .for_each(|&(value, other, commanded)| {
            if !(value.is_finite() && other.is_finite() && commanded.is_finite()) {
                return;
            }
            let m = Fixed(Coord::new(value, other, other, other, other));
            let mut kin = CartesianKin::new(Axis::X);
            kin.set_commanded_pos(commanded);
            assert_eq!(kin.calc_position(&m, 0.0), value);
            kin.post_step();
            assert_eq!(kin.commanded_pos(), commanded);
        });
}

#[test]
fn fixup_scenario_from_two_hundred_degrees() {
    let mut kin = CartesianKin::alloc('b').unwrap();
    kin.set_commanded_pos(200.0);
    kin.post_step();
    assert_eq!(kin.commanded_pos(), -160.0);
    kin.post_step();
    assert_eq!(kin.commanded_pos(), -160.0);
}

#[test]
fn unknown_axis_is_a_configuration_error() {
    for name in ['q', 'w', 'c', '1', ' '] {
        assert!(CartesianKin::alloc(name).is_err(), "{name:?}");
    }
    for axis in Axis::ALL {
        let kin = CartesianKin::alloc(axis.as_char()).unwrap();
        assert_eq!(kin.axis(), axis);
    }
}
