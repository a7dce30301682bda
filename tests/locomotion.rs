//! End-to-end locomotion scenarios driven through the public engine API.
use approx::assert_abs_diff_eq;

use hexapod_robot::error::StoreError;
use hexapod_robot::gait::{CycleState, GaitKind, GaitTrajectory, MotionCommand, StridePlan};
use hexapod_robot::kinematics::vector::Vec3;
use hexapod_robot::motion::{grounded_count, GaitEngine};
use hexapod_robot::robot::{
    calibration::{CalibrationTable, OffsetStore, RamStore, RECORD_LEN},
    commands::{Intent, ServoFrame},
    config::EngineConfig,
    joint::Joint,
    leg::Leg,
    link::LinkMonitor,
    state::Mode,
};

const DT: f32 = 0.01;
const GROUND: f32 = -60.0;
const BASE: Vec3 = Vec3::new(173.0, 0.0, GROUND);

fn engine() -> GaitEngine<RamStore> {
    GaitEngine::new(EngineConfig::default(), RamStore::new()).expect("gait table is valid")
}

fn stick(forward: f32, strafe: f32, rotation: f32) -> Intent {
    Intent {
        forward,
        strafe,
        rotation,
        ..Intent::connected()
    }
}

fn walk_until_moving(engine: &mut GaitEngine<RamStore>, intent: &Intent) {
    engine.tick(&Intent::connected(), DT);
    for _ in 0..100 {
        engine.tick(intent, DT);
        if engine.mode() == Mode::Walk {
            // let the amplitude reach full stride
            for _ in 0..50 {
                engine.tick(intent, DT);
            }
            return;
        }
    }
    panic!("never started walking");
}

#[test]
fn tri_walk_returns_every_foot_after_one_cycle() {
    let gait = GaitKind::Tri.definition();
    let motion = MotionCommand {
        forward: 1.0,
        speed: 1.0,
        ..Default::default()
    };
    let plan = StridePlan::new(gait, &motion, 1.0);
    let trajectory = GaitTrajectory::new(gait, plan, BASE);
    assert!(plan.cadence > 0.0);

    // one cycle at the nominal cadence, in 100 ticks
    let dt = 1.0 / (plan.cadence * 100.0);
    let mut cycle = CycleState::default();
    let start = trajectory.targets(&cycle);
    for _ in 0..100 {
        cycle.advance(plan.cadence * dt);
    }
    let end = trajectory.targets(&cycle);
    for (leg, (a, b)) in Leg::ALL.iter().zip(start.iter().zip(end.iter())) {
        assert!(a.distance_to(*b) < 0.5, "{leg}: {a:?} vs {b:?}");
    }
}

#[test]
fn blended_foot_path_is_closed() {
    let gait = GaitKind::Tri.definition();
    let motion = MotionCommand {
        forward: 0.7,
        strafe: 0.3,
        rotation: 0.4,
        speed: 1.0,
    };
    let trajectory = GaitTrajectory::new(gait, StridePlan::new(gait, &motion, 1.0), BASE);

    for leg in Leg::ALL {
        let start = trajectory.foot_target(leg, 0.0);
        let end = trajectory.foot_target(leg, 0.9999);
        assert!(
            start.distance_to(end) < 0.5,
            "{leg}: {start:?} vs {end:?}"
        );
    }

    let mut cycle = CycleState::new(0.25);
    let before = trajectory.targets(&cycle);
    cycle.advance(1.0);
    let after = trajectory.targets(&cycle);
    for (a, b) in before.iter().zip(after.iter()) {
        assert_abs_diff_eq!(a.x, b.x, epsilon = 1e-3);
        assert_abs_diff_eq!(a.y, b.y, epsilon = 1e-3);
        assert_abs_diff_eq!(a.z, b.z, epsilon = 1e-3);
    }
}

#[test]
fn trajectory_is_a_pure_function_of_its_inputs() {
    let mut first = engine();
    let mut second = engine();
    let script = [stick(1.0, 0.0, 0.0), stick(0.0, -0.5, 0.8), Intent::connected()];

    for intent in script.iter().flat_map(|i| core::iter::repeat(i).take(120)) {
        let a: ServoFrame = first.tick(intent, DT);
        let b: ServoFrame = second.tick(intent, DT);
        assert_eq!(a, b);
    }
}

#[test]
fn losing_the_link_stops_a_walk_within_one_tick() {
    let mut engine = engine();
    walk_until_moving(&mut engine, &stick(1.0, 0.0, 0.0));
    assert_eq!(engine.mode(), Mode::Walk);

    engine.tick(&Intent::default(), DT);
    assert_eq!(engine.mode(), Mode::Stand);
    assert_eq!(engine.telemetry().link_losses, 1);
}

#[test]
fn silent_link_stops_a_walk_after_the_timeout() {
    let mut engine = engine();
    let mut link = LinkMonitor::new(500);
    let forward = stick(1.0, 0.0, 0.0);
    link.receive(forward, 0);
    walk_until_moving(&mut engine, &link.current(0));

    // the operator stops sending frames
    engine.tick(&link.current(500), DT);
    assert_eq!(engine.mode(), Mode::Walk);
    engine.tick(&link.current(501), DT);
    assert_eq!(engine.mode(), Mode::Stand);
    assert_eq!(engine.telemetry().link_losses, 1);
}

#[test]
fn three_feet_stay_grounded_when_a_walk_ends() {
    let mut engine = engine();
    walk_until_moving(&mut engine, &stick(1.0, 0.0, 0.0));

    let mut ticks = 0;
    while engine.mode() != Mode::Stand || !settled(engine.feet()) {
        engine.tick(&Intent::connected(), DT);
        let grounded = grounded_count(engine.feet(), GROUND);
        assert!(grounded >= 3, "tick {ticks}: {:?}", engine.feet());
        ticks += 1;
        assert!(ticks < 500, "stance never settled");
    }
}

fn settled(feet: &[Vec3; 6]) -> bool {
    feet.iter().all(|foot| foot.distance_to(BASE) < 1e-3)
}

#[test]
fn offsets_survive_a_restart() {
    let mut engine = engine();
    let calibrate = Intent {
        calibrate: true,
        ..Intent::connected()
    };
    for _ in 0..3 {
        engine.tick(&calibrate, DT);
    }
    assert_eq!(engine.mode(), Mode::Calibrate);
    engine
        .adjust_offset(Leg::MiddleLeft, Joint::Tibia, -6.5)
        .expect("calibrating");
    engine
        .adjust_offset(Leg::FrontRight, Joint::Coxa, 3.0)
        .expect("calibrating");

    let restarted =
        GaitEngine::new(EngineConfig::default(), engine.store().clone()).expect("valid table");
    assert_eq!(restarted.offsets(), engine.offsets());
    assert_eq!(restarted.offsets().get(Leg::MiddleLeft, Joint::Tibia), -6.5);
}

#[test]
fn corrupted_record_falls_back_to_zero_offsets() {
    let mut engine = engine();
    for _ in 0..3 {
        engine.tick(
            &Intent {
                calibrate: true,
                ..Intent::connected()
            },
            DT,
        );
    }
    engine
        .adjust_offset(Leg::RearRight, Joint::Femur, 12.0)
        .expect("calibrating");
    let mut record = *engine.store().record().expect("saved");
    record[10] ^= 0xff;

    let store = CorruptStore(record);
    let restarted = GaitEngine::new(EngineConfig::default(), store).expect("valid table");
    assert_eq!(restarted.offsets().get(Leg::RearRight, Joint::Femur), 0.0);
}

struct CorruptStore([u8; RECORD_LEN]);

impl OffsetStore for CorruptStore {
    fn load(&mut self) -> Result<CalibrationTable, StoreError> {
        CalibrationTable::decode(&self.0)
    }

    fn save(&mut self, table: &CalibrationTable) -> Result<(), StoreError> {
        self.0 = table.encode();
        Ok(())
    }
}
