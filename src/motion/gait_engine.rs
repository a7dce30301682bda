use log::{info, warn};

use super::{
    attack::AttackMotion,
    calibrate::CalibrationMotion,
    input::InputFilter,
    sleep::SleepMotion,
    stance::{StanceLift, StancePlanner},
};
use crate::error::{CalibrationError, ConfigError};
use crate::gait::{validate_table, CycleState, GaitKind, GaitTrajectory, StridePlan};
use crate::kinematics::{
    conversion::{LegGeometry, LegModel},
    vector::Vec3,
};
use crate::robot::{
    calibration::{CalibrationTable, OffsetStore},
    commands::{Intent, ServoFrame, Torque},
    config::{EngineConfig, WALK_ENGAGE_SECONDS},
    joint::{Joint, JointAngles},
    leg::Leg,
    state::{Mode, Telemetry},
};

#[derive(Debug, Clone)]
struct WalkState {
    /// Latched on entry; a new selection applies to the next walk.
    gait: GaitKind,
    cycle: CycleState,
    /// Stride scale easing in from 0 so the first walking frame is the standing pose.
    amplitude: f32,
    quiet_ticks: u32,
}

#[derive(Debug, Clone)]
enum ModeState {
    Initialize,
    Stand(StancePlanner),
    Walk(WalkState),
    Calibrate(CalibrationMotion),
    Sleep(SleepMotion),
    Attack(AttackMotion),
}

impl ModeState {
    fn mode(&self) -> Mode {
        match self {
            ModeState::Initialize => Mode::Initialize,
            ModeState::Stand(_) => Mode::Stand,
            ModeState::Walk(_) => Mode::Walk,
            ModeState::Calibrate(_) => Mode::Calibrate,
            ModeState::Sleep(_) => Mode::Sleep,
            ModeState::Attack(_) => Mode::Attack,
        }
    }
}

/// State machine turning operator intent into one servo frame per tick.
///
/// Owns the foot positions, the leg models with their calibration and the active
/// mode. Everything runs synchronously inside [`GaitEngine::tick`].
pub struct GaitEngine<S: OffsetStore> {
    config: EngineConfig,
    legs: [LegModel; 6],
    calibration: CalibrationTable,
    store: S,
    state: ModeState,
    input: InputFilter,
    feet: [Vec3; 6],
    torque: Torque,
    connected: bool,
    telemetry: Telemetry,
}

impl<S: OffsetStore> GaitEngine<S> {
    /// Validates the gait table and loads calibration from `store`. A missing or
    /// unreadable record falls back to zero offsets.
    pub fn new(config: EngineConfig, mut store: S) -> Result<Self, ConfigError> {
        validate_table()?;

        let calibration = match store.load() {
            Ok(table) => {
                info!("[GAIT_ENGINE] calibration loaded: {table}");
                table
            }
            Err(e) => {
                warn!("[GAIT_ENGINE] using zero offsets, calibration not loaded: {e}");
                CalibrationTable::ZERO
            }
        };
        let geometry = LegGeometry::default();
        let legs = Leg::ALL.map(|leg| LegModel::new(geometry, calibration.legs[leg]));
        let startup = config.stance_point(config.distance_from_ground);

        Ok(Self {
            config,
            legs,
            calibration,
            store,
            state: ModeState::Initialize,
            input: InputFilter::new(&config),
            feet: [startup; 6],
            torque: Torque::Hold,
            connected: false,
            telemetry: Telemetry::default(),
        })
    }

    pub fn mode(&self) -> Mode {
        self.state.mode()
    }

    pub fn feet(&self) -> &[Vec3; 6] {
        &self.feet
    }

    pub fn offsets(&self) -> &CalibrationTable {
        &self.calibration
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn telemetry(&self) -> Telemetry {
        Telemetry {
            mode: self.mode(),
            active_gait: match &self.state {
                ModeState::Walk(walk) => Some(walk.gait),
                _ => None,
            },
            ..self.telemetry
        }
    }

    /// Advances the active mode by `dt` seconds and returns the servo frame to write.
    pub fn tick(&mut self, intent: &Intent, dt: f32) -> ServoFrame {
        let dt = if dt.is_finite() {
            dt.clamp(0.0, self.config.max_tick_seconds)
        } else {
            0.0
        };
        let intent = if intent.connected {
            intent.normalized()
        } else {
            intent.disconnected()
        };

        if self.connected && !intent.connected {
            self.telemetry.link_losses = self.telemetry.link_losses.wrapping_add(1);
            warn!("[GAIT_ENGINE] link lost in {}", self.mode());
        }
        self.connected = intent.connected;
        self.telemetry.selected_gait = intent.gait;

        self.input.update(&intent, &self.config, dt);
        if !intent.connected {
            self.input.stop();
        }

        if let Some(next) = self.step(&intent, dt) {
            self.enter(next);
        }
        self.telemetry.ticks = self.telemetry.ticks.wrapping_add(1);
        self.frame()
    }

    /// Applies a calibration delta to one servo and persists the table.
    /// Returns the stored (bounded) offset.
    pub fn adjust_offset(
        &mut self,
        leg: Leg,
        joint: Joint,
        delta: f32,
    ) -> Result<f32, CalibrationError> {
        if self.mode() != Mode::Calibrate {
            return Err(CalibrationError::NotCalibrating);
        }
        if !delta.is_finite() {
            return Err(CalibrationError::InvalidDelta { leg, joint });
        }
        let value = self.calibration.get(leg, joint) + delta;
        let stored = self.calibration.set(leg, joint, value);
        info!("[GAIT_ENGINE] {leg} {joint} offset = {stored:.1}");
        self.apply_calibration();
        Ok(stored)
    }

    /// Zeroes every offset and persists the table.
    pub fn reset_offsets(&mut self) -> Result<(), CalibrationError> {
        if self.mode() != Mode::Calibrate {
            return Err(CalibrationError::NotCalibrating);
        }
        self.calibration = CalibrationTable::ZERO;
        info!("[GAIT_ENGINE] offsets reset");
        self.apply_calibration();
        Ok(())
    }

    fn apply_calibration(&mut self) {
        for leg in Leg::ALL {
            self.legs[leg as usize].offsets = self.calibration.legs[leg];
        }
        // keep running on the in-memory table if the store is unavailable
        if let Err(e) = self.store.save(&self.calibration) {
            warn!("[GAIT_ENGINE] calibration not saved: {e}");
        }
    }

    /// Runs the active mode for one tick and returns the mode to switch to, if any.
    fn step(&mut self, intent: &Intent, dt: f32) -> Option<ModeState> {
        let ground = self.input.ground();
        let stance = self.config.stance_point(ground);
        let motion = self.input.motion();
        let requested = Vec3::new(intent.forward, intent.strafe, intent.rotation).magnitude();

        match &mut self.state {
            ModeState::Initialize => {
                self.feet = [stance; 6];
                Some(ModeState::Stand(StancePlanner::settled(stance)))
            }
            ModeState::Stand(planner) => {
                planner.retarget(stance);
                self.feet = planner.advance(dt);
                let settled = planner.is_settled();

                if intent.calibrate {
                    Some(ModeState::Calibrate(CalibrationMotion::new()))
                } else if intent.sleep && requested <= self.config.walk_enter_threshold {
                    Some(ModeState::Sleep(SleepMotion::new()))
                } else if intent.attack && settled {
                    Some(ModeState::Attack(AttackMotion::new(self.feet)))
                } else if intent.connected
                    && settled
                    && motion.magnitude() > self.config.walk_enter_threshold
                {
                    Some(ModeState::Walk(WalkState {
                        gait: intent.gait,
                        cycle: CycleState::default(),
                        amplitude: 0.0,
                        quiet_ticks: 0,
                    }))
                } else {
                    None
                }
            }
            ModeState::Walk(walk) => {
                if !intent.connected {
                    return Some(ModeState::Stand(StancePlanner::new(
                        self.feet,
                        stance,
                        StanceLift::Normal,
                    )));
                }

                let gait = walk.gait.definition();
                let plan = StridePlan::new(gait, &motion, walk.amplitude);
                let trajectory = GaitTrajectory::new(gait, plan, stance);
                let targets = trajectory.targets(&walk.cycle);
                let finite = targets
                    .iter()
                    .all(|foot| foot.x.is_finite() && foot.y.is_finite() && foot.z.is_finite());
                if finite {
                    self.feet = targets;
                } else {
                    warn!("[GAIT_ENGINE] foot target not finite, holding stance");
                    self.feet = [stance; 6];
                }
                walk.cycle.advance(plan.cadence * dt);
                walk.amplitude = (walk.amplitude + dt / WALK_ENGAGE_SECONDS).min(1.0);

                if motion.magnitude() < self.config.walk_exit_threshold {
                    walk.quiet_ticks += 1;
                } else {
                    walk.quiet_ticks = 0;
                }
                if walk.quiet_ticks >= self.config.walk_exit_ticks {
                    Some(ModeState::Stand(StancePlanner::new(
                        self.feet,
                        stance,
                        StanceLift::Normal,
                    )))
                } else {
                    None
                }
            }
            ModeState::Calibrate(calibration) => {
                calibration.step(&mut self.feet, dt);
                if intent.calibrate {
                    None
                } else {
                    Some(ModeState::Stand(StancePlanner::new(
                        self.feet,
                        stance,
                        StanceLift::High,
                    )))
                }
            }
            ModeState::Sleep(sleep) => {
                // a dropped link must not wake the robot
                let wake = intent.connected
                    && (!intent.sleep || requested > self.config.walk_enter_threshold);
                if wake {
                    self.torque = Torque::Hold;
                    return Some(ModeState::Stand(StancePlanner::new(
                        self.feet,
                        stance,
                        StanceLift::High,
                    )));
                }
                if sleep.step(&mut self.feet, dt) && self.torque == Torque::Hold {
                    info!("[GAIT_ENGINE] folded, releasing servos");
                    self.torque = Torque::Release;
                }
                None
            }
            ModeState::Attack(attack) => {
                self.feet = attack.step(dt);
                if attack.is_done() {
                    Some(ModeState::Stand(StancePlanner::new(
                        self.feet,
                        stance,
                        StanceLift::High,
                    )))
                } else {
                    None
                }
            }
        }
    }

    fn enter(&mut self, next: ModeState) {
        let from = self.mode();
        let to = next.mode();
        if from != to {
            info!("[GAIT_ENGINE] {from} -> {to}");
            self.telemetry.transitions = self.telemetry.transitions.wrapping_add(1);
        }
        if to != Mode::Sleep {
            self.torque = Torque::Hold;
        }
        self.state = next;
    }

    fn frame(&mut self) -> ServoFrame {
        let mut angles = [JointAngles::default(); 6];
        for leg in Leg::ALL {
            let (solved, clamped) = self.legs[leg as usize].solve_reporting(self.feet[leg]);
            if clamped {
                self.telemetry.reach_clamps = self.telemetry.reach_clamps.wrapping_add(1);
            }
            angles[leg] = solved;
        }
        ServoFrame {
            angles,
            torque: self.torque,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::robot::calibration::RamStore;
    use approx::assert_abs_diff_eq;

    const DT: f32 = 0.01;

    fn engine() -> GaitEngine<RamStore> {
        GaitEngine::new(EngineConfig::default(), RamStore::new()).unwrap()
    }

    fn run(engine: &mut GaitEngine<RamStore>, intent: &Intent, ticks: usize) -> ServoFrame {
        let mut frame = ServoFrame::default();
        for _ in 0..ticks {
            frame = engine.tick(intent, DT);
        }
        frame
    }

    fn walking() -> Intent {
        Intent {
            forward: 1.0,
            ..Intent::connected()
        }
    }

    #[test]
    fn starts_in_the_standing_pose() {
        let mut engine = engine();
        assert_eq!(engine.mode(), Mode::Initialize);
        let frame = engine.tick(&Intent::connected(), DT);
        assert_eq!(engine.mode(), Mode::Stand);
        assert_eq!(frame.torque, Torque::Hold);
        for foot in engine.feet() {
            assert_eq!(*foot, Vec3::new(173.0, 0.0, -60.0));
        }
        assert_eq!(engine.telemetry().transitions, 1);
    }

    #[test]
    fn stick_starts_and_stops_a_walk() {
        let mut engine = engine();
        run(&mut engine, &Intent::connected(), 5);
        run(&mut engine, &walking(), 5);
        assert_eq!(engine.mode(), Mode::Walk);
        assert_eq!(engine.telemetry().active_gait, Some(GaitKind::Tri));

        run(&mut engine, &walking(), 100);
        assert_eq!(engine.mode(), Mode::Walk);

        // sticks decay below the exit threshold after ~30 ticks, then 10 quiet ticks
        run(&mut engine, &Intent::connected(), 60);
        assert_eq!(engine.mode(), Mode::Stand);
    }

    #[test]
    fn first_walking_frame_is_the_standing_pose() {
        let mut engine = engine();
        run(&mut engine, &Intent::connected(), 5);
        let standing = *engine.feet();
        while engine.mode() != Mode::Walk {
            engine.tick(&walking(), DT);
        }
        engine.tick(&walking(), DT);
        for (walk, stand) in engine.feet().iter().zip(standing.iter()) {
            assert_abs_diff_eq!(walk.x, stand.x, epsilon = 1e-3);
            assert_abs_diff_eq!(walk.y, stand.y, epsilon = 1e-3);
            assert_abs_diff_eq!(walk.z, stand.z, epsilon = 1e-3);
        }
    }

    #[test]
    fn gait_is_latched_for_the_whole_walk() {
        let mut engine = engine();
        run(&mut engine, &Intent::connected(), 5);
        run(&mut engine, &walking(), 10);
        let wave = Intent {
            gait: GaitKind::Wave,
            ..walking()
        };
        run(&mut engine, &wave, 10);
        let telemetry = engine.telemetry();
        assert_eq!(telemetry.active_gait, Some(GaitKind::Tri));
        assert_eq!(telemetry.selected_gait, GaitKind::Wave);
    }

    #[test]
    fn offsets_only_change_while_calibrating() {
        let mut engine = engine();
        run(&mut engine, &Intent::connected(), 3);
        assert_eq!(
            engine.adjust_offset(Leg::RearLeft, Joint::Femur, 2.0),
            Err(CalibrationError::NotCalibrating)
        );

        let calibrate = Intent {
            calibrate: true,
            ..Intent::connected()
        };
        run(&mut engine, &calibrate, 2);
        assert_eq!(engine.mode(), Mode::Calibrate);
        assert_eq!(engine.adjust_offset(Leg::RearLeft, Joint::Femur, 2.0), Ok(2.0));
        assert_eq!(engine.adjust_offset(Leg::RearLeft, Joint::Femur, 40.0), Ok(30.0));
        assert_eq!(engine.offsets().get(Leg::RearLeft, Joint::Femur), 30.0);

        // persisted
        let saved = CalibrationTable::decode(engine.store().record().unwrap()).unwrap();
        assert_eq!(saved.get(Leg::RearLeft, Joint::Femur), 30.0);

        run(&mut engine, &Intent::connected(), 1);
        assert_eq!(engine.mode(), Mode::Stand);
    }

    #[test]
    fn failed_save_keeps_offsets_in_memory() {
        let mut store = RamStore::new();
        store.fail_saves = true;
        let mut engine = GaitEngine::new(EngineConfig::default(), store).unwrap();
        let calibrate = Intent {
            calibrate: true,
            ..Intent::connected()
        };
        run(&mut engine, &calibrate, 3);
        assert_eq!(engine.adjust_offset(Leg::FrontRight, Joint::Coxa, -4.0), Ok(-4.0));
        assert_eq!(engine.offsets().get(Leg::FrontRight, Joint::Coxa), -4.0);
        assert!(engine.store().record().is_none());
    }

    #[test]
    fn stored_offsets_are_loaded_at_startup() {
        let mut table = CalibrationTable::ZERO;
        table.set(Leg::MiddleRight, Joint::Tibia, 7.5);
        let engine =
            GaitEngine::new(EngineConfig::default(), RamStore::with_table(&table)).unwrap();
        assert_eq!(engine.offsets().get(Leg::MiddleRight, Joint::Tibia), 7.5);
    }

    #[test]
    fn sleep_releases_torque_and_wakes_on_motion() {
        let mut engine = engine();
        run(&mut engine, &Intent::connected(), 3);
        let sleep = Intent {
            sleep: true,
            ..Intent::connected()
        };
        let frame = run(&mut engine, &sleep, 400);
        assert_eq!(engine.mode(), Mode::Sleep);
        assert_eq!(frame.torque, Torque::Release);

        // losing the link does not wake it
        let frame = run(&mut engine, &Intent::default(), 5);
        assert_eq!(engine.mode(), Mode::Sleep);
        assert_eq!(frame.torque, Torque::Release);

        let nudge = Intent {
            rotation: 0.5,
            ..sleep
        };
        let frame = engine.tick(&nudge, DT);
        assert_eq!(engine.mode(), Mode::Stand);
        assert_eq!(frame.torque, Torque::Hold);
    }

    #[test]
    fn attack_runs_to_completion() {
        let mut engine = engine();
        run(&mut engine, &Intent::connected(), 3);
        let attack = Intent {
            attack: true,
            ..Intent::connected()
        };
        engine.tick(&attack, DT);
        assert_eq!(engine.mode(), Mode::Attack);

        // cannot be interrupted, not even by a walk request
        run(&mut engine, &walking(), 50);
        assert_eq!(engine.mode(), Mode::Attack);
        run(&mut engine, &Intent::connected(), 80);
        assert_eq!(engine.mode(), Mode::Stand);
    }

    #[test]
    fn every_frame_is_within_joint_limits() {
        let mut engine = engine();
        let intents = [
            Intent::connected(),
            Intent {
                forward: 0.8,
                strafe: -0.6,
                rotation: 1.0,
                speed: 2.0,
                height: 1.0,
                gait: GaitKind::Hop,
                ..Intent::connected()
            },
            Intent {
                attack: true,
                ..Intent::connected()
            },
            Intent {
                calibrate: true,
                ..Intent::connected()
            },
        ];
        for intent in intents.iter().cycle().take(4 * 150) {
            let frame = engine.tick(intent, DT);
            for angles in frame.angles {
                assert!(angles.within_limits(), "{angles:?}");
            }
        }
    }

    #[test]
    fn oversized_dt_is_truncated() {
        let mut engine = engine();
        run(&mut engine, &Intent::connected(), 3);
        run(&mut engine, &walking(), 10);
        let before = *engine.feet();
        engine.tick(&walking(), 5.0);
        let after = *engine.feet();
        for (a, b) in before.iter().zip(after.iter()) {
            // one clamped tick cannot move a foot across the whole stride
            assert!(a.distance_to(*b) < 60.0);
        }
    }
}
