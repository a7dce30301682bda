//! The six gaits and their parameters.
use core::fmt::Display;

use crate::error::ConfigError;
use crate::robot::leg::Leg;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GaitKind {
    /// Two alternating tripods.
    #[default]
    Tri = 0,
    Ripple = 1,
    /// One leg airborne at a time.
    Wave = 2,
    Quad = 3,
    Bi = 4,
    /// All six legs together.
    Hop = 5,
}

impl GaitKind {
    pub const ALL: [GaitKind; 6] = [
        GaitKind::Tri,
        GaitKind::Ripple,
        GaitKind::Wave,
        GaitKind::Quad,
        GaitKind::Bi,
        GaitKind::Hop,
    ];

    pub fn definition(self) -> &'static GaitDefinition {
        &GAIT_TABLE[self as usize]
    }
}

impl Display for GaitKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            GaitKind::Tri => f.write_str("TRI"),
            GaitKind::Ripple => f.write_str("RIPPLE"),
            GaitKind::Wave => f.write_str("WAVE"),
            GaitKind::Quad => f.write_str("QUAD"),
            GaitKind::Bi => f.write_str("BI"),
            GaitKind::Hop => f.write_str("HOP"),
        }
    }
}

impl TryFrom<u8> for GaitKind {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        GaitKind::ALL.get(value as usize).copied().ok_or(value)
    }
}

/// Timing and scaling of one gait.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaitDefinition {
    pub kind: GaitKind,
    /// Where each leg sits in the cycle when global progress is 0, in [0, 1).
    pub phase_offsets: [f32; 6],
    /// Fraction of the cycle a leg spends on the ground, in (0, 1).
    pub duty: f32,
    pub speed_multiplier: f32,
    pub stride_multiplier: f32,
    pub lift_multiplier: f32,
    /// Longest stride, mm.
    pub max_stride: f32,
    /// Fastest body speed, mm/s.
    pub max_speed: f32,
}

impl GaitDefinition {
    /// Phase of `leg` within its own cycle for the given global progress.
    pub fn local_phase(&self, leg: Leg, progress: f32) -> f32 {
        let local = (progress + self.phase_offsets[leg as usize]) % 1.0;
        if local < 0.0 {
            local + 1.0
        } else {
            local
        }
    }

    pub fn is_propelling(&self, leg: Leg, progress: f32) -> bool {
        self.local_phase(leg, progress) < self.duty
    }

    /// Legs on the ground and pushing at `progress`.
    pub fn propelling_count(&self, progress: f32) -> usize {
        Leg::ALL
            .iter()
            .filter(|&&leg| self.is_propelling(leg, progress))
            .count()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let gait = self.kind;
        if !(self.duty > 0.0 && self.duty < 1.0) {
            return Err(ConfigError::DutyFactor {
                gait,
                duty: self.duty,
            });
        }
        for leg in Leg::ALL {
            let offset = self.phase_offsets[leg as usize];
            if !(0.0..1.0).contains(&offset) {
                return Err(ConfigError::PhaseOffset { gait, leg, offset });
            }
        }
        let scalars = [
            self.speed_multiplier,
            self.stride_multiplier,
            self.lift_multiplier,
            self.max_stride,
            self.max_speed,
        ];
        if scalars.iter().any(|v| !(*v > 0.0 && v.is_finite())) {
            return Err(ConfigError::NonPositive { gait });
        }
        Ok(())
    }
}

const SIXTH: f32 = 1.0 / 6.0;
const THIRD: f32 = 1.0 / 3.0;

pub static GAIT_TABLE: [GaitDefinition; 6] = [
    GaitDefinition {
        kind: GaitKind::Tri,
        phase_offsets: [0.0, 0.5, 0.0, 0.5, 0.0, 0.5],
        duty: 3.1 / 6.0,
        speed_multiplier: 1.0,
        stride_multiplier: 1.2,
        lift_multiplier: 1.1,
        max_stride: 240.0,
        max_speed: 200.0,
    },
    GaitDefinition {
        kind: GaitKind::Ripple,
        phase_offsets: [0.0, 4.0 * SIXTH, 2.0 * SIXTH, 5.0 * SIXTH, SIXTH, 3.0 * SIXTH],
        duty: 3.2 / 6.0,
        speed_multiplier: 1.0,
        stride_multiplier: 1.3,
        lift_multiplier: 1.1,
        max_stride: 220.0,
        max_speed: 200.0,
    },
    GaitDefinition {
        kind: GaitKind::Wave,
        phase_offsets: [0.0, SIXTH, 2.0 * SIXTH, 5.0 * SIXTH, 4.0 * SIXTH, 3.0 * SIXTH],
        duty: 4.9 / 6.0,
        speed_multiplier: 0.4,
        stride_multiplier: 2.0,
        lift_multiplier: 1.2,
        max_stride: 150.0,
        max_speed: 160.0,
    },
    GaitDefinition {
        kind: GaitKind::Quad,
        phase_offsets: [0.0, THIRD, 2.0 * THIRD, 0.0, THIRD, 2.0 * THIRD],
        duty: 4.1 / 6.0,
        speed_multiplier: 1.0,
        stride_multiplier: 1.2,
        lift_multiplier: 1.1,
        max_stride: 220.0,
        max_speed: 200.0,
    },
    GaitDefinition {
        kind: GaitKind::Bi,
        phase_offsets: [0.0, THIRD, 2.0 * THIRD, 0.0, THIRD, 2.0 * THIRD],
        duty: 2.1 / 6.0,
        speed_multiplier: 4.0,
        stride_multiplier: 1.0,
        lift_multiplier: 1.8,
        max_stride: 230.0,
        max_speed: 130.0,
    },
    GaitDefinition {
        kind: GaitKind::Hop,
        phase_offsets: [0.0; 6],
        duty: 0.5,
        speed_multiplier: 1.0,
        stride_multiplier: 1.6,
        lift_multiplier: 2.5,
        max_stride: 240.0,
        max_speed: 200.0,
    },
];

/// Checks every gait once at startup. An error here is a build defect.
pub fn validate_table() -> Result<(), ConfigError> {
    for (i, gait) in GAIT_TABLE.iter().enumerate() {
        debug_assert_eq!(gait.kind as usize, i);
        gait.validate()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_valid_and_keyed_by_kind() {
        assert_eq!(validate_table(), Ok(()));
        for kind in GaitKind::ALL {
            assert_eq!(kind.definition().kind, kind);
        }
    }

    #[test]
    fn gait_index_decoding() {
        assert_eq!(GaitKind::try_from(0), Ok(GaitKind::Tri));
        assert_eq!(GaitKind::try_from(5), Ok(GaitKind::Hop));
        assert_eq!(GaitKind::try_from(6), Err(6));
    }

    #[test]
    fn invalid_duty_is_rejected() {
        let mut gait = GAIT_TABLE[0];
        gait.duty = 1.0;
        assert!(matches!(gait.validate(), Err(ConfigError::DutyFactor { .. })));
        gait.duty = 0.5;
        gait.phase_offsets[3] = 1.0;
        assert!(matches!(
            gait.validate(),
            Err(ConfigError::PhaseOffset { leg: Leg::RearLeft, .. })
        ));
        gait.phase_offsets[3] = 0.5;
        gait.max_speed = 0.0;
        assert_eq!(gait.validate(), Err(ConfigError::NonPositive { gait: GaitKind::Tri }));
    }

    /// `(min, max)` number of legs propelling over one cycle.
    fn support_range(kind: GaitKind) -> (usize, usize) {
        let gait = kind.definition();
        (0..1000)
            .map(|k| gait.propelling_count((k as f32 + 0.5) / 1000.0))
            .fold((usize::MAX, 0), |(lo, hi), n| (lo.min(n), hi.max(n)))
    }

    #[test]
    fn support_pattern_per_gait() {
        assert_eq!(support_range(GaitKind::Tri), (3, 6));
        assert_eq!(support_range(GaitKind::Ripple), (3, 4));
        assert_eq!(support_range(GaitKind::Wave), (4, 5));
        assert_eq!(support_range(GaitKind::Quad), (4, 6));
        assert_eq!(support_range(GaitKind::Bi), (2, 4));
        assert_eq!(support_range(GaitKind::Hop), (0, 6));
    }

    #[test]
    fn tripod_alternates_three_and_three() {
        let tri = GaitKind::Tri.definition();
        // away from the short double-support windows exactly one tripod pushes
        for progress in [0.1, 0.3, 0.45, 0.6, 0.8, 0.95] {
            assert_eq!(tri.propelling_count(progress), 3, "at {progress}");
        }
        assert!(tri.is_propelling(Leg::FrontRight, 0.1));
        assert!(!tri.is_propelling(Leg::MiddleRight, 0.1));
    }
}
