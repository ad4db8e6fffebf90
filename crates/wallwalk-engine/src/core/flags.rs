//! Small typed bit sets.
//!
//! A `u8` newtype with named constants per set, so surface properties can't
//! be passed where move flags are expected.

use serde::{Deserialize, Serialize};

macro_rules! flag_set {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$fmeta:meta])* $flag:ident = $bit:expr ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u8);

        impl $name {
            pub const NONE: $name = $name(0);
            $( $(#[$fmeta])* pub const $flag: $name = $name(1 << $bit); )*

            /// True if every bit of `other` is set.
            #[inline]
            pub fn contains(self, other: $name) -> bool {
                self.0 & other.0 == other.0
            }

            /// True if any bit of `other` is set.
            #[inline]
            pub fn intersects(self, other: $name) -> bool {
                self.0 & other.0 != 0
            }

            #[inline]
            pub fn is_empty(self) -> bool {
                self.0 == 0
            }

            pub fn insert(&mut self, other: $name) {
                self.0 |= other.0;
            }

            pub fn remove(&mut self, other: $name) {
                self.0 &= !other.0;
            }
        }

        impl std::ops::BitOr for $name {
            type Output = $name;
            fn bitor(self, rhs: $name) -> $name {
                $name(self.0 | rhs.0)
            }
        }

        impl std::ops::BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: $name) {
                self.0 |= rhs.0;
            }
        }
    };
}

flag_set! {
    /// Behaviour properties of a standing surface.
    SurfaceFlags {
        /// Landing here is never fatal, however far the entity fell.
        SUPPRESS_FALL = 0,
        /// Not solid: skipped by standing and collision lookups by default.
        VIRTUAL = 1,
        /// Standing on this surface kills.
        FATAL = 2,
        /// Entities landing here keep their current rotation.
        IGNORE_ROTATION_ON_LANDING = 3,
        /// Lets emitter lines and sight pass through.
        TRANSPARENT = 4,
    }
}

flag_set! {
    /// Flags carried by an `EntityMove`.
    MoveFlags {
        /// Skip collision validation.
        ETHEREAL = 0,
        /// Kills the entity when the move is finished.
        FATAL = 1,
    }
}

flag_set! {
    /// Capabilities an effector advertises to the motion resolver.
    EffectorFlags {
        /// May refuse passage into its cell (see `Effector::blocks_passage`).
        BLOCKING = 0,
        /// Requires a solid surface in its cell.
        REQUIRES_SURFACE = 1,
    }
}

flag_set! {
    /// Placement requirements of an obstacle.
    PlacementFlags {
        /// The anchor cell must hold a surface facing the obstacle's up.
        REQUIRES_SURFACE = 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_and_intersects() {
        let flags = SurfaceFlags::VIRTUAL | SurfaceFlags::FATAL;
        assert!(flags.contains(SurfaceFlags::VIRTUAL));
        assert!(!flags.contains(SurfaceFlags::VIRTUAL | SurfaceFlags::SUPPRESS_FALL));
        assert!(flags.intersects(SurfaceFlags::VIRTUAL | SurfaceFlags::SUPPRESS_FALL));
        assert!(!flags.intersects(SurfaceFlags::TRANSPARENT));
        assert!(!SurfaceFlags::NONE.intersects(flags));
    }

    #[test]
    fn insert_and_remove() {
        let mut flags = MoveFlags::NONE;
        assert!(flags.is_empty());
        flags.insert(MoveFlags::FATAL);
        flags |= MoveFlags::ETHEREAL;
        assert!(flags.contains(MoveFlags::FATAL | MoveFlags::ETHEREAL));
        flags.remove(MoveFlags::FATAL);
        assert_eq!(flags, MoveFlags::ETHEREAL);
    }
}
