use serde::{Deserialize, Serialize};

/// The 26 body markers of the HALPE whole-body layout.
pub const HALPE_26: [&str; 26] = [
    "Nose",
    "LEye",
    "REye",
    "LEar",
    "REar",
    "LShoulder",
    "RShoulder",
    "LElbow",
    "RElbow",
    "LWrist",
    "RWrist",
    "LHip",
    "RHip",
    "LKnee",
    "RKnee",
    "LAnkle",
    "RAnkle",
    "Head",
    "Neck",
    "Hip",
    "LBigToe",
    "RBigToe",
    "LSmallToe",
    "RSmallToe",
    "LHeel",
    "RHeel",
];

/// A named, ordered list of markers to triangulate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skeleton {
    name: String,
    markers: Vec<String>,
}

impl Skeleton {
    pub fn new(
        name: impl Into<String>,
        markers: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            markers: markers.into_iter().map(Into::into).collect(),
        }
    }

    pub fn halpe_26() -> Self {
        Self::new("HALPE_26", HALPE_26)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn contains(&self, marker: &str) -> bool {
        self.markers.iter().any(|m| m == marker)
    }

    /// The left/right twin of `marker`, if the skeleton has one.
    ///
    /// ```
    /// use mocap_reconstruction::Skeleton;
    ///
    /// let skeleton = Skeleton::halpe_26();
    /// assert_eq!(skeleton.counterpart("LWrist"), Some("RWrist"));
    /// assert_eq!(skeleton.counterpart("RBigToe"), Some("LBigToe"));
    /// assert_eq!(skeleton.counterpart("Neck"), None);
    /// ```
    pub fn counterpart(&self, marker: &str) -> Option<&str> {
        let twin = counterpart_name(marker)?;
        self.markers
            .iter()
            .find(|m| **m == twin)
            .map(String::as_str)
    }
}

/// Derives the left/right twin of a marker name from its naming convention.
///
/// Recognized forms are `LWrist`/`RWrist`, `left_wrist`/`right_wrist`, and
/// `LeftHand`/`RightHand`. Names in none of these forms have no twin.
pub fn counterpart_name(marker: &str) -> Option<String> {
    const WORD_PREFIXES: [(&str, &str); 4] = [
        ("left_", "right_"),
        ("right_", "left_"),
        ("Left", "Right"),
        ("Right", "Left"),
    ];
    for (from, to) in WORD_PREFIXES {
        if let Some(rest) = marker.strip_prefix(from).filter(|rest| !rest.is_empty()) {
            return Some(format!("{}{}", to, rest));
        }
    }

    // Single capital letter prefix, followed by another capitalized word.
    let mut chars = marker.chars();
    let twin = match chars.next()? {
        'L' => 'R',
        'R' => 'L',
        _ => return None,
    };
    let rest = chars.as_str();
    if rest.starts_with(|c: char| c.is_ascii_uppercase()) {
        Some(format!("{}{}", twin, rest))
    } else {
        None
    }
}
