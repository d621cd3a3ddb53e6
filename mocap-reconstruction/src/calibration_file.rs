use log::*;
use mocap_core::{CalibrationError, CalibrationSet, RawCameraCalibration};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// The section of a calibration document that describes the calibration run, not a camera.
pub const METADATA_SECTION: &str = "metadata";

#[derive(Debug, Error)]
pub enum CalibrationFileError {
    #[error("failed to read calibration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse calibration document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("section {section:?} is not a camera calibration: {source}")]
    Section {
        section: String,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Calibration(#[from] CalibrationError),
}

/// Parses a calibration document.
///
/// The document is an object with one section per camera, keyed by camera name, plus an
/// optional `metadata` section which is ignored. Cameras are ordered by name.
///
/// ```
/// use mocap_core::CalibrationProvider;
/// use mocap_reconstruction::load_calibration_str;
///
/// let calibration = load_calibration_str(r#"{
///     "cam_02": {
///         "matrix": [[1500, 0, 960], [0, 1500, 540], [0, 0, 1]],
///         "rotation": [0.0, 1.5707963, 0.0],
///         "translation": [0.0, 0.0, 5.0]
///     },
///     "cam_01": {
///         "name": "front",
///         "size": [1920, 1080],
///         "matrix": [[1500, 0, 960], [0, 1500, 540], [0, 0, 1]],
///         "distortions": [0.0, 0.0, 0.0, 0.0],
///         "rotation": [0.0, 0.0, 0.0],
///         "translation": [0.0, 0.0, 5.0],
///         "fisheye": false
///     },
///     "metadata": { "adjusted": false, "error": 0.0 }
/// }"#).unwrap();
/// assert_eq!(calibration.camera_names(), ["cam_01", "cam_02"]);
/// ```
pub fn load_calibration_str(document: &str) -> Result<CalibrationSet, CalibrationFileError> {
    let sections: BTreeMap<String, Value> = serde_json::from_str(document)?;
    calibration_from_sections(sections)
}

/// Reads and parses a calibration document from `reader`. See [`load_calibration_str`].
pub fn load_calibration_reader(
    reader: impl std::io::Read,
) -> Result<CalibrationSet, CalibrationFileError> {
    let sections: BTreeMap<String, Value> = serde_json::from_reader(reader)?;
    calibration_from_sections(sections)
}

/// Reads and parses the calibration document at `path`. See [`load_calibration_str`].
pub fn load_calibration_file(
    path: impl AsRef<Path>,
) -> Result<CalibrationSet, CalibrationFileError> {
    let path = path.as_ref();
    info!("loading calibration from {}", path.display());
    let file = std::fs::File::open(path)?;
    load_calibration_reader(std::io::BufReader::new(file))
}

fn calibration_from_sections(
    sections: BTreeMap<String, Value>,
) -> Result<CalibrationSet, CalibrationFileError> {
    let mut calibration = CalibrationSet::new();
    for (section, value) in sections {
        if section == METADATA_SECTION {
            debug!("skipping calibration metadata");
            continue;
        }
        let raw: RawCameraCalibration =
            serde_json::from_value(value).map_err(|source| CalibrationFileError::Section {
                section: section.clone(),
                source,
            })?;
        let camera = raw.into_calibration(&section)?;
        debug!(
            "loaded camera {} with rotation {:?}",
            camera.name,
            camera.axis_angle().as_slice()
        );
        calibration.insert(camera)?;
    }
    Ok(calibration)
}
