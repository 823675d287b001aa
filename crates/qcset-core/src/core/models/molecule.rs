use indexmap::IndexMap;
use nalgebra::Point3;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoleculeError {
    #[error("A molecule must contain at least one site")]
    Empty,
    #[error("Site {index} has an empty species label")]
    EmptySpecies { index: usize },
    #[error("Site {index} has a non-finite coordinate")]
    NonFiniteCoordinate { index: usize },
    #[error("Spin multiplicity must be at least 1 (got {0})")]
    InvalidMultiplicity(u32),
}

/// A single atomic site: an element label and Cartesian coordinates in Angstroms.
#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    /// The element symbol (e.g., "C", "Cl").
    pub species: String,
    /// The position of the site in Angstroms.
    pub position: Point3<f64>,
}

impl Site {
    pub fn new(species: &str, position: Point3<f64>) -> Self {
        Self {
            species: species.trim().to_string(),
            position,
        }
    }
}

/// A molecular structure together with its total charge and spin multiplicity.
///
/// The settings engine never inspects the structure; it is carried through to
/// the `$molecule` block of the rendered input unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct Molecule {
    sites: Vec<Site>,
    charge: i32,
    spin_multiplicity: u32,
}

impl Molecule {
    /// Creates a molecule after validating the sites and multiplicity.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no sites, a site has an empty species label
    /// or a non-finite coordinate, or the multiplicity is zero.
    pub fn new(sites: Vec<Site>, charge: i32, spin_multiplicity: u32) -> Result<Self, MoleculeError> {
        if sites.is_empty() {
            return Err(MoleculeError::Empty);
        }
        for (index, site) in sites.iter().enumerate() {
            if site.species.is_empty() {
                return Err(MoleculeError::EmptySpecies { index });
            }
            if !site.position.iter().all(|c| c.is_finite()) {
                return Err(MoleculeError::NonFiniteCoordinate { index });
            }
        }
        if spin_multiplicity == 0 {
            return Err(MoleculeError::InvalidMultiplicity(spin_multiplicity));
        }
        Ok(Self {
            sites,
            charge,
            spin_multiplicity,
        })
    }

    /// Returns a copy of this molecule with a different charge and multiplicity.
    pub fn with_charge_and_multiplicity(
        mut self,
        charge: i32,
        spin_multiplicity: u32,
    ) -> Result<Self, MoleculeError> {
        if spin_multiplicity == 0 {
            return Err(MoleculeError::InvalidMultiplicity(spin_multiplicity));
        }
        self.charge = charge;
        self.spin_multiplicity = spin_multiplicity;
        Ok(self)
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn charge(&self) -> i32 {
        self.charge
    }

    pub fn spin_multiplicity(&self) -> u32 {
        self.spin_multiplicity
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// A compact formula such as `C1 H4`, listing elements in order of first appearance.
    pub fn formula(&self) -> String {
        let mut counts: IndexMap<&str, usize> = IndexMap::new();
        for site in &self.sites {
            *counts.entry(site.species.as_str()).or_default() += 1;
        }
        counts
            .iter()
            .map(|(species, count)| format!("{}{}", species, count))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
