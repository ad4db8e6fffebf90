// extensions/easing.rs
//
// Curves for the visual progress through a time step. The grid state has
// already been decided when these run; they only shape how a pose gets there.

use serde::{Deserialize, Serialize};

/// Shape of a move's visual progress, named in configs in snake_case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    #[default]
    Linear,
    /// Decelerates into the target pose.
    QuadOut,
    Smoothstep,
    /// Snaps to the target when the step completes.
    Hold,
}

impl Easing {
    /// Eased progress for step progress `alpha`; both ends are fixed at 0
    /// and 1 and the input is clamped to that range.
    pub fn apply(self, alpha: f32) -> f32 {
        let a = alpha.clamp(0.0, 1.0);
        match self {
            Easing::Linear => a,
            Easing::QuadOut => a * (2.0 - a),
            Easing::Smoothstep => a * a * (3.0 - 2.0 * a),
            Easing::Hold => {
                if a < 1.0 {
                    0.0
                } else {
                    1.0
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Easing; 4] = [Easing::Linear, Easing::QuadOut, Easing::Smoothstep, Easing::Hold];

    #[test]
    fn curves_hit_endpoints() {
        for easing in ALL {
            assert!(easing.apply(0.0).abs() < 1e-6, "{:?}", easing);
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-6, "{:?}", easing);
        }
    }

    #[test]
    fn curves_at_the_midpoint() {
        assert!((Easing::Smoothstep.apply(0.5) - 0.5).abs() < 1e-5);
        assert!(Easing::QuadOut.apply(0.5) > 0.5);
        assert_eq!(Easing::Hold.apply(0.9), 0.0);
    }

    #[test]
    fn input_is_clamped() {
        assert_eq!(Easing::Linear.apply(-1.0), 0.0);
        assert_eq!(Easing::QuadOut.apply(3.0), 1.0);
    }

    #[test]
    fn parses_snake_case_names() {
        let e: Easing = serde_json::from_str("\"quad_out\"").unwrap();
        assert_eq!(e, Easing::QuadOut);
        assert_eq!(serde_json::to_string(&Easing::Smoothstep).unwrap(), "\"smoothstep\"");
    }
}
