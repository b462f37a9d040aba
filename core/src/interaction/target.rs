use crate::prelude::Mmsi;

/// Map feature under the pointer.
#[derive(Debug, Clone, PartialEq)]
pub enum Hit {
    Vessel(Mmsi),
    /// Outline of the detection range; `short` for the one-hour ring.
    RangeRing { short: bool, tooltip: String },
    DistanceRing { index: usize, tooltip: String },
}

impl Hit {
    pub fn vessel(&self) -> Option<Mmsi> {
        match self {
            Hit::Vessel(mmsi) => Some(*mmsi),
            _ => None,
        }
    }

    pub fn is_ring(&self) -> bool {
        !matches!(self, Hit::Vessel(_))
    }
}
