use std::collections::HashMap;

use crate::prelude::{LatLon, Mmsi};
use crate::wire::vessel::VesselRecord;

/// Vessels of the latest snapshot, keyed by mmsi.
///
/// The map is only ever swapped as a whole; a vessel missing from a
/// snapshot is gone after [`VesselRegistry::replace`].
#[derive(Debug, Clone, Default)]
pub struct VesselRegistry {
    vessels: HashMap<Mmsi, VesselRecord>,
}

impl VesselRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swaps in a new set of records. Later duplicates of an mmsi win.
    pub fn replace(&mut self, records: Vec<VesselRecord>) {
        self.vessels = records
            .into_iter()
            .map(|record| (record.mmsi, record))
            .collect();
    }

    pub fn get(&self, mmsi: Mmsi) -> Option<&VesselRecord> {
        self.vessels.get(&mmsi)
    }

    pub fn contains(&self, mmsi: Mmsi) -> bool {
        self.vessels.contains_key(&mmsi)
    }

    /// Iteration order is unspecified.
    pub fn all(&self) -> impl Iterator<Item = &VesselRecord> {
        self.vessels.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = Mmsi> + '_ {
        self.vessels.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.vessels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vessels.is_empty()
    }

    pub fn position(&self, mmsi: Mmsi) -> Option<LatLon> {
        self.get(mmsi).and_then(|record| record.position)
    }

    /// Moves a vessel to a fresher position learned from its track.
    pub(crate) fn correct_position(&mut self, mmsi: Mmsi, position: LatLon) -> bool {
        match self.vessels.get_mut(&mmsi) {
            Some(record) if record.position != Some(position) => {
                record.position = Some(position);
                true
            }
            _ => false,
        }
    }
}
