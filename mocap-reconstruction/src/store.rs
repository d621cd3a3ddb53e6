use mocap_core::{MarkerTrack, Observation2D, ObservationSource, TriangulationSink};
use std::collections::{BTreeMap, HashMap};

/// An in-memory [`ObservationSource`] keyed by camera, marker, and frame.
///
/// ```
/// use mocap_core::{Observation2D, ObservationSource};
/// use mocap_reconstruction::ObservationTable;
///
/// let mut table = ObservationTable::new();
/// table.insert("cam1", "LWrist", 10, Observation2D::new(512.0, 300.0, 0.8));
/// assert_eq!(table.observation("cam1", "LWrist", 10).map(|o| o.x), Some(512.0));
/// assert!(table.observation("cam1", "LWrist", 11).is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ObservationTable {
    /// camera -> marker -> frame
    observations: HashMap<String, HashMap<String, BTreeMap<i32, Observation2D>>>,
}

impl ObservationTable {
    pub fn new() -> Self {
        Default::default()
    }

    /// Stores an observation, returning the one it replaces.
    pub fn insert(
        &mut self,
        camera: impl Into<String>,
        marker: impl Into<String>,
        frame: i32,
        observation: Observation2D,
    ) -> Option<Observation2D> {
        self.frames_mut(camera.into(), marker.into()).insert(frame, observation)
    }

    /// Stores a contiguous run of observations starting at `first_frame`.
    ///
    /// `None` entries leave their frame empty.
    pub fn insert_track(
        &mut self,
        camera: impl Into<String>,
        marker: impl Into<String>,
        first_frame: i32,
        track: impl IntoIterator<Item = Option<Observation2D>>,
    ) {
        let frames = self.frames_mut(camera.into(), marker.into());
        for (frame, observation) in (first_frame..).zip(track) {
            if let Some(observation) = observation {
                frames.insert(frame, observation);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.observations
            .values()
            .flat_map(HashMap::values)
            .map(BTreeMap::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn frames_mut(
        &mut self,
        camera: String,
        marker: String,
    ) -> &mut BTreeMap<i32, Observation2D> {
        self.observations
            .entry(camera)
            .or_default()
            .entry(marker)
            .or_default()
    }
}

impl ObservationSource for ObservationTable {
    fn observation(&self, camera: &str, marker: &str, frame: i32) -> Option<Observation2D> {
        self.observations
            .get(camera)?
            .get(marker)?
            .get(&frame)
            .copied()
    }
}

/// An in-memory [`TriangulationSink`] holding the last track written for each marker.
#[derive(Debug, Clone, Default)]
pub struct TrackTable {
    tracks: BTreeMap<String, MarkerTrack>,
}

impl TrackTable {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn get(&self, marker: &str) -> Option<&MarkerTrack> {
        self.tracks.get(marker)
    }

    /// Iterates markers in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MarkerTrack)> + '_ {
        self.tracks
            .iter()
            .map(|(marker, track)| (marker.as_str(), track))
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

impl TriangulationSink for TrackTable {
    fn write_track(&mut self, marker: &str, track: &MarkerTrack) {
        self.tracks.insert(marker.to_owned(), track.clone());
    }
}
