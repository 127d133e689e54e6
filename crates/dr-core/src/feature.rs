//! The feature model: named, 0–100 valued capabilities, one banner each.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Upper bound of a feature value.
pub const MAX_VALUE: u8 = 100;

/// Names of the built-in feature set, in presentation order.
const DEFAULT_FEATURES: &[&str] = &[
    "Voice Commands",
    "Smart Replies",
    "File Sharing",
    "App Scaffolding",
    "Health Monitoring",
    "Music Overlay",
    "Video Export",
    "Auto Cleanup",
];

/// A single named feature rendered into one banner.
///
/// Deserialization goes through [`Feature::new`], so a decoded feature has
/// the same guarantees as a constructed one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFeature")]
pub struct Feature {
    name: String,
    value: u8,
}

#[derive(Deserialize)]
struct RawFeature {
    name: String,
    value: i64,
}

impl TryFrom<RawFeature> for Feature {
    type Error = Error;

    fn try_from(raw: RawFeature) -> Result<Self> {
        Feature::new(raw.name, raw.value)
    }
}

impl Feature {
    /// Create a feature, clamping `value` into `0..=100`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the trimmed name is empty.
    pub fn new(name: impl Into<String>, value: i64) -> Result<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(Error::Validation("feature name must not be empty".into()));
        }
        let value = value.clamp(0, i64::from(MAX_VALUE)) as u8;
        Ok(Self { name, value })
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value in `0..=100`.
    pub fn value(&self) -> u8 {
        self.value
    }

    /// Banner caption without the decorative glyph, e.g. `"Video Export: 80/100"`.
    pub fn caption(&self) -> String {
        format!("{}: {}/{}", self.name, self.value, MAX_VALUE)
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// Parses `NAME=VALUE`. The split happens at the last `=` so names may
/// contain one.
impl FromStr for Feature {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (name, value) = s
            .rsplit_once('=')
            .ok_or_else(|| Error::Validation(format!("expected NAME=VALUE, got '{s}'")))?;
        let value: i64 = value
            .trim()
            .parse()
            .map_err(|_| Error::Validation(format!("feature value '{value}' is not an integer")))?;
        Feature::new(name, value)
    }
}

/// Ordered mapping from feature name to value.
///
/// Iteration order is insertion order; it drives both rendering and
/// concatenation order. Names are unique: inserting an existing name
/// overwrites its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Feature>", into = "Vec<Feature>")]
pub struct FeatureSet {
    features: Vec<Feature>,
}

impl FeatureSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in set of eight features, each valued 100.
    pub fn default_set() -> Self {
        let features = DEFAULT_FEATURES
            .iter()
            .map(|name| Feature {
                name: (*name).to_string(),
                value: MAX_VALUE,
            })
            .collect();
        Self { features }
    }

    /// Insert or overwrite a feature, keeping the original position of an
    /// existing name.
    pub fn insert(&mut self, feature: Feature) {
        match self.features.iter_mut().find(|f| f.name == feature.name) {
            Some(existing) => existing.value = feature.value,
            None => self.features.push(feature),
        }
    }

    /// Look up a feature by name.
    pub fn get(&self, name: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.features.iter()
    }
}

impl FromIterator<Feature> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        let mut set = FeatureSet::new();
        for feature in iter {
            set.insert(feature);
        }
        set
    }
}

impl From<Vec<Feature>> for FeatureSet {
    fn from(features: Vec<Feature>) -> Self {
        features.into_iter().collect()
    }
}

impl From<FeatureSet> for Vec<Feature> {
    fn from(set: FeatureSet) -> Self {
        set.features
    }
}

impl<'a> IntoIterator for &'a FeatureSet {
    type Item = &'a Feature;
    type IntoIter = std::slice::Iter<'a, Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}
