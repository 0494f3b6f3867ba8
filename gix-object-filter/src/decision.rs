//! The vocabulary the traversal engine and every filter agree on.

use std::fmt;

use bitflags::bitflags;

/// The visitation event the engine is currently processing.
///
/// Trees are visited twice, once when entered and once when left. Blobs are leaves and are visited once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Situation {
    /// A tree is about to be entered.
    BeginTree,
    /// All entries of a tree were visited.
    EndTree,
    /// A blob was reached.
    Blob,
}

impl Situation {
    /// The raw value the engine transmits for this situation.
    pub const fn to_raw(self) -> u32 {
        match self {
            Situation::BeginTree => 0,
            Situation::EndTree => 1,
            Situation::Blob => 2,
        }
    }

    /// A human-readable name for diagnostics.
    pub const fn as_str(self) -> &'static str {
        match self {
            Situation::BeginTree => "begin-tree",
            Situation::EndTree => "end-tree",
            Situation::Blob => "blob",
        }
    }
}

impl fmt::Display for Situation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error returned when the engine hands over a situation value outside of the closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown filter situation: {0}")]
pub struct UnknownSituation(pub u32);

impl TryFrom<u32> for Situation {
    type Error = UnknownSituation;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Situation::BeginTree,
            1 => Situation::EndTree,
            2 => Situation::Blob,
            other => return Err(UnknownSituation(other)),
        })
    }
}

bitflags! {
    /// What a filter decided about a single visitation, as a set of two independent bits.
    ///
    /// - [`Decision::MARK_SEEN`] means the object is decided for good and must not be submitted again.
    /// - [`Decision::DO_SHOW`] adds the object to the positive output of the traversal.
    ///
    /// [`Decision::ZERO`] has no bits set and is only meaningful for [`Situation::EndTree`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Decision: u8 {
        /// No decision, valid only when leaving a tree.
        const ZERO = 0;
        /// Never submit this object again during this traversal.
        const MARK_SEEN = 1 << 0;
        /// Include this object in the positive output.
        const DO_SHOW = 1 << 1;
        /// Mark as seen and show, the answer for everything that is included for good.
        const SHOW = Self::MARK_SEEN.bits() | Self::DO_SHOW.bits();
    }
}

impl Default for Decision {
    fn default() -> Self {
        Decision::ZERO
    }
}

impl Decision {
    /// Return true if the object must not be submitted again.
    pub const fn marks_seen(self) -> bool {
        self.contains(Self::MARK_SEEN)
    }

    /// Return true if the object goes into the positive output.
    pub const fn shows(self) -> bool {
        self.contains(Self::DO_SHOW)
    }
}

/// A side-channel instruction for the traversal-wide omit set, only written for blobs.
///
/// A hard omit, excluding an object from the output and from any later reconsideration, is
/// [`Decision::MARK_SEEN`] without [`Decision::DO_SHOW`] together with [`OmitDirective::Omit`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OmitDirective {
    /// Remove the object from the omit set if it is present.
    Keep,
    /// Leave omit-set membership untouched.
    #[default]
    Ignore,
    /// Add the object to the omit set.
    Omit,
}
