use crate::core::utils::normalize::{DuplicateKeyError, lower_and_check_unique, normalize_key};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identifies one `$section` block of a Q-Chem input file.
///
/// The declaration order is the order in which sections are rendered, so
/// iterating a [`SectionCollection`] always yields sections in file order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SectionName {
    /// Primary keywords (`$rem`).
    Rem,
    /// Geometry-optimization constraint blocks (`$opt`).
    Opt,
    /// PCM cavity and surface discretization parameters (`$pcm`).
    Pcm,
    /// Solvent dielectric for PCM (`$solvent`).
    Solvent,
    /// SMD solvent selection (`$smx`).
    Smx,
    /// Potential-energy-surface scan coordinates (`$scan`).
    Scan,
    /// Custom van der Waals radii (`$van_der_waals`).
    VanDerWaals,
    /// Cube-file plotting options (`$plots`).
    Plots,
    /// Natural bond orbital analysis options (`$nbo`).
    Nbo,
    /// New-generation geometry optimizer options (`$geom_opt`).
    GeomOpt,
    /// Isodensity SS(V)PE parameters (`$svp`).
    Svp,
    /// CMIRS non-electrostatic terms (`$pcm_nonels`).
    PcmNonels,
}

impl SectionName {
    pub const ALL: [SectionName; 12] = [
        SectionName::Rem,
        SectionName::Opt,
        SectionName::Pcm,
        SectionName::Solvent,
        SectionName::Smx,
        SectionName::Scan,
        SectionName::VanDerWaals,
        SectionName::Plots,
        SectionName::Nbo,
        SectionName::GeomOpt,
        SectionName::Svp,
        SectionName::PcmNonels,
    ];

    /// The section name as it appears after `$` in the input file.
    pub fn as_str(self) -> &'static str {
        match self {
            SectionName::Rem => "rem",
            SectionName::Opt => "opt",
            SectionName::Pcm => "pcm",
            SectionName::Solvent => "solvent",
            SectionName::Smx => "smx",
            SectionName::Scan => "scan",
            SectionName::VanDerWaals => "van_der_waals",
            SectionName::Plots => "plots",
            SectionName::Nbo => "nbo",
            SectionName::GeomOpt => "geom_opt",
            SectionName::Svp => "svp",
            SectionName::PcmNonels => "pcm_nonels",
        }
    }

    /// A descriptive alias accepted wherever a section name is parsed.
    pub fn alias(self) -> &'static str {
        match self {
            SectionName::Rem => "primary-keywords",
            SectionName::Opt => "optimization-constraints",
            SectionName::Pcm => "solvation-geometry",
            SectionName::Solvent => "solvation-dielectric",
            SectionName::Smx => "solvation-method-params",
            SectionName::Scan => "scan-variables",
            SectionName::VanDerWaals => "van-der-waals-radii",
            SectionName::Plots => "plotting",
            SectionName::Nbo => "nbo",
            SectionName::GeomOpt => "new-optimizer",
            SectionName::Svp => "isosvp-params",
            SectionName::PcmNonels => "nonelectrostatic-params",
        }
    }
}

impl fmt::Display for SectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown input section '{0}'")]
pub struct UnknownSectionError(pub String);

impl FromStr for SectionName {
    type Err = UnknownSectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().trim_start_matches('$').to_lowercase();
        SectionName::ALL
            .into_iter()
            .find(|name| name.as_str() == wanted || name.alias() == wanted)
            .ok_or_else(|| UnknownSectionError(s.to_string()))
    }
}

/// How keys of the `$van_der_waals` section are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VdwMode {
    /// Keys are atomic numbers; every atom of that element gets the radius.
    #[default]
    Atomic,
    /// Keys are 1-based positions of single atoms in the molecule.
    Sequential,
}

impl VdwMode {
    /// The mode selector written as the first line of `$van_der_waals`.
    pub fn code(self) -> &'static str {
        match self {
            VdwMode::Atomic => "1",
            VdwMode::Sequential => "2",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "1" => Some(VdwMode::Atomic),
            "2" => Some(VdwMode::Sequential),
            _ => None,
        }
    }
}

/// A single keyword value.
///
/// Most keywords carry one string. Block-structured sections (`$opt`, `$scan`)
/// map a keyword to several lines instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionValue {
    Text(String),
    Lines(Vec<String>),
}

impl SectionValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            SectionValue::Text(text) => Some(text),
            SectionValue::Lines(_) => None,
        }
    }

    pub fn as_lines(&self) -> Option<&[String]> {
        match self {
            SectionValue::Lines(lines) => Some(lines),
            SectionValue::Text(_) => None,
        }
    }

    /// Every line of the value; a text value is a single line.
    pub fn lines(&self) -> Vec<&str> {
        match self {
            SectionValue::Text(text) => vec![text.as_str()],
            SectionValue::Lines(lines) => lines.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for SectionValue {
    fn from(value: &str) -> Self {
        SectionValue::Text(value.to_string())
    }
}

impl From<String> for SectionValue {
    fn from(value: String) -> Self {
        SectionValue::Text(value)
    }
}

impl From<Vec<String>> for SectionValue {
    fn from(value: Vec<String>) -> Self {
        SectionValue::Lines(value)
    }
}

impl From<Vec<&str>> for SectionValue {
    fn from(value: Vec<&str>) -> Self {
        SectionValue::Lines(value.into_iter().map(str::to_string).collect())
    }
}

impl fmt::Display for SectionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionValue::Text(text) => f.write_str(text),
            SectionValue::Lines(lines) => f.write_str(&lines.join(" ")),
        }
    }
}

/// An ordered mapping from keyword to value.
///
/// Keys are stored normalized (trimmed, lower-case), so lookups are
/// case-insensitive. Entries keep their insertion order, which is the order
/// they are rendered in.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Section {
    entries: IndexMap<String, SectionValue>,
}

impl Section {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a section from raw entries, failing if two keys differ only by case.
    pub fn from_entries<K, V, I>(entries: I) -> Result<Self, DuplicateKeyError>
    where
        K: AsRef<str>,
        V: Into<SectionValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        let entries = lower_and_check_unique(
            entries
                .into_iter()
                .map(|(k, v)| (k, Into::<SectionValue>::into(v))),
        )?;
        Ok(Self { entries })
    }

    /// Inserts or replaces a keyword, returning the previous value if any.
    ///
    /// A replaced keyword keeps its original position.
    pub fn insert(&mut self, key: &str, value: impl Into<SectionValue>) -> Option<SectionValue> {
        self.entries.insert(normalize_key(key), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&SectionValue> {
        self.entries.get(&normalize_key(key))
    }

    /// The text value of a keyword, or `None` if it is absent or holds lines.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(SectionValue::as_text)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&normalize_key(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SectionValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merges `other` into this section; values from `other` win.
    pub fn merge(&mut self, other: Section) {
        for (key, value) in other.entries {
            self.entries.insert(key, value);
        }
    }
}

/// The complete, named set of sections for one input file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SectionCollection {
    sections: BTreeMap<SectionName, Section>,
    vdw_mode: VdwMode,
}

impl SectionCollection {
    pub fn new(vdw_mode: VdwMode) -> Self {
        Self {
            sections: BTreeMap::new(),
            vdw_mode,
        }
    }

    pub fn vdw_mode(&self) -> VdwMode {
        self.vdw_mode
    }

    pub fn set_vdw_mode(&mut self, mode: VdwMode) {
        self.vdw_mode = mode;
    }

    pub fn get(&self, name: SectionName) -> Option<&Section> {
        self.sections.get(&name)
    }

    pub fn get_mut(&mut self, name: SectionName) -> Option<&mut Section> {
        self.sections.get_mut(&name)
    }

    /// Returns the named section, creating an empty one if it is absent.
    pub fn section_mut(&mut self, name: SectionName) -> &mut Section {
        self.sections.entry(name).or_default()
    }

    pub fn insert(&mut self, name: SectionName, section: Section) -> Option<Section> {
        self.sections.insert(name, section)
    }

    pub fn contains(&self, name: SectionName) -> bool {
        self.sections.contains_key(&name)
    }

    /// Shorthand for the text value of `key` in section `name`.
    pub fn text(&self, name: SectionName, key: &str) -> Option<&str> {
        self.get(name).and_then(|section| section.text(key))
    }

    /// Iterates present sections in file order.
    pub fn iter(&self) -> impl Iterator<Item = (SectionName, &Section)> {
        self.sections.iter().map(|(name, section)| (*name, section))
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}
