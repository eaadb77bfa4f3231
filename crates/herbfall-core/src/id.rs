//! Particle identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a particle record.
///
/// Particles live in a contiguous arena owned by the field, so the id is the
/// record's slot index. It stays stable across recycles because records are
/// overwritten in place.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticleId(pub u32);

impl ParticleId {
    /// Create a ParticleId from a raw value
    pub fn from_raw(id: u32) -> Self {
        Self(id)
    }

    /// Create a ParticleId from an arena slot index
    pub fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// Get the raw value
    pub fn raw(&self) -> u32 {
        self.0
    }

    /// Arena slot index
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ParticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParticleId({})", self.0)
    }
}

impl fmt::Display for ParticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw() {
        let id = ParticleId::from_raw(42);
        assert_eq!(id.raw(), 42);
        assert_eq!(id.index(), 42);
    }

    #[test]
    fn test_index_roundtrip_and_display() {
        let id = ParticleId::from_index(7);
        assert_eq!(format!("{id}"), "7");
        assert_eq!(format!("{id:?}"), "ParticleId(7)");
    }
}
