use phf::{Map, phf_map};

use super::error::SetError;

/// A DFT functional and its optional empirical dispersion correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DftRung {
    pub method: &'static str,
    pub dispersion: Option<&'static str>,
}

static DFT_RUNGS: Map<u8, DftRung> = phf_map! {
    1u8 => DftRung { method: "b3lyp", dispersion: None },
    2u8 => DftRung { method: "b3lyp", dispersion: Some("D3_BJ") },
    3u8 => DftRung { method: "wb97xd", dispersion: None },
    4u8 => DftRung { method: "wb97xv", dispersion: None },
    5u8 => DftRung { method: "wb97mv", dispersion: None },
};

/// Resolves a rung of the functional ladder, 1 (cheapest) to 5.
pub fn dft_rung(rung: u8) -> Result<DftRung, SetError> {
    DFT_RUNGS
        .get(&rung)
        .copied()
        .ok_or(SetError::InvalidDftRung(rung))
}

/// Nonelectrostatic CMIRS coefficients for one isodensity contour.
///
/// Values are kept as the exact text written to `$pcm_nonels`. `None` marks a
/// term the solvent is not parameterized for; such terms are omitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CmirsCoefficients {
    pub a: &'static str,
    pub b: &'static str,
    pub c: Option<&'static str>,
    pub d: Option<&'static str>,
    pub gamma: Option<&'static str>,
    pub solvrho: &'static str,
}

impl CmirsCoefficients {
    /// The keyword/value pairs in render order, skipping absent terms.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, &'static str)> {
        [
            ("a", Some(self.a)),
            ("b", Some(self.b)),
            ("c", self.c),
            ("d", self.d),
            ("gamma", self.gamma),
            ("solvrho", Some(self.solvrho)),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
    }

    /// The value of a single coefficient keyword, if tabulated.
    pub fn get(&self, key: &str) -> Option<&'static str> {
        self.entries().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

/// Per-solvent CMIRS data: the SS(V)PE dielectric plus coefficients for the
/// two supported isodensity contours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CmirsParameters {
    pub dielectric: &'static str,
    pub rho_0_001: CmirsCoefficients,
    pub rho_0_0005: CmirsCoefficients,
}

pub const DEFAULT_RHOISO: &str = "0.001";

impl CmirsParameters {
    /// Coefficients for an isodensity value, `"0.001"` or `"0.0005"`.
    pub fn coefficients(&self, rhoiso: &str) -> Result<&CmirsCoefficients, SetError> {
        match rhoiso.trim() {
            "0.001" => Ok(&self.rho_0_001),
            "0.0005" => Ok(&self.rho_0_0005),
            other => Err(SetError::UnsupportedIsodensity(other.to_string())),
        }
    }
}

static CMIRS_SETTINGS: Map<&'static str, CmirsParameters> = phf_map! {
    "water" => CmirsParameters {
        dielectric: "78.39",
        rho_0_001: CmirsCoefficients {
            a: "-0.006736", b: "0.032698", c: Some("-1249.6"), d: Some("-21.405"),
            gamma: Some("3.7"), solvrho: "0.05",
        },
        rho_0_0005: CmirsCoefficients {
            a: "-0.006496", b: "0.050833", c: Some("-566.7"), d: Some("-30.503"),
            gamma: Some("3.2"), solvrho: "0.05",
        },
    },
    "benzene" => CmirsParameters {
        dielectric: "2.28",
        rho_0_001: CmirsCoefficients {
            a: "-0.00522", b: "0.01294", c: None, d: None, gamma: None, solvrho: "0.0421",
        },
        rho_0_0005: CmirsCoefficients {
            a: "-0.00572", b: "0.01116", c: None, d: None, gamma: None, solvrho: "0.0421",
        },
    },
    "cyclohexane" => CmirsParameters {
        dielectric: "2.02",
        rho_0_001: CmirsCoefficients {
            a: "-0.00938", b: "0.03184", c: None, d: None, gamma: None, solvrho: "0.0396",
        },
        rho_0_0005: CmirsCoefficients {
            a: "-0.00721", b: "0.05618", c: None, d: None, gamma: None, solvrho: "0.0396",
        },
    },
    "dimethyl sulfoxide" => CmirsParameters {
        dielectric: "47",
        rho_0_001: CmirsCoefficients {
            a: "-0.00951", b: "0.044791", c: None, d: Some("-162.07"),
            gamma: Some("4.1"), solvrho: "0.05279",
        },
        rho_0_0005: CmirsCoefficients {
            a: "-0.002523", b: "0.011757", c: None, d: Some("-817.93"),
            gamma: Some("4.3"), solvrho: "0.05279",
        },
    },
    "acetonitrile" => CmirsParameters {
        dielectric: "36.64",
        rho_0_001: CmirsCoefficients {
            a: "-0.008178", b: "0.045278", c: None, d: Some("-0.33914"),
            gamma: Some("1.3"), solvrho: "0.03764",
        },
        rho_0_0005: CmirsCoefficients {
            a: "-0.003805", b: "0.03223", c: None, d: Some("-0.44492"),
            gamma: Some("1.2"), solvrho: "0.03764",
        },
    },
};

/// Looks up a CMIRS solvent by name (case-insensitive).
pub fn cmirs_parameters(solvent: &str) -> Result<&'static CmirsParameters, SetError> {
    CMIRS_SETTINGS
        .get(solvent.trim().to_lowercase().as_str())
        .ok_or_else(|| SetError::UnsupportedCmirsSolvent(solvent.to_string()))
}

/// The supported CMIRS solvents, sorted by name.
pub fn cmirs_solvents() -> Vec<&'static str> {
    let mut names: Vec<_> = CMIRS_SETTINGS.keys().copied().collect();
    names.sort_unstable();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_rung_resolves_to_its_functional() {
        let methods: Vec<_> = (1..=5).map(|r| dft_rung(r).unwrap().method).collect();
        assert_eq!(methods, ["b3lyp", "b3lyp", "wb97xd", "wb97xv", "wb97mv"]);
        assert_eq!(dft_rung(2).unwrap().dispersion, Some("D3_BJ"));
        assert_eq!(dft_rung(1).unwrap().dispersion, None);
    }

    #[test]
    fn out_of_range_rungs_are_rejected() {
        assert_eq!(dft_rung(0), Err(SetError::InvalidDftRung(0)));
        assert_eq!(dft_rung(6), Err(SetError::InvalidDftRung(6)));
    }

    #[test]
    fn five_cmirs_solvents_are_supported() {
        assert_eq!(
            cmirs_solvents(),
            ["acetonitrile", "benzene", "cyclohexane", "dimethyl sulfoxide", "water"]
        );
        assert!(matches!(
            cmirs_parameters("toluene"),
            Err(SetError::UnsupportedCmirsSolvent(name)) if name == "toluene"
        ));
        assert_eq!(cmirs_parameters("Water").unwrap().dielectric, "78.39");
    }

    #[test]
    fn benzene_coefficients_skip_missing_terms() {
        let benzene = cmirs_parameters("benzene").unwrap();
        let keys: Vec<_> = benzene
            .coefficients(DEFAULT_RHOISO)
            .unwrap()
            .entries()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, ["a", "b", "solvrho"]);
    }

    #[test]
    fn coefficients_are_selected_by_isodensity() {
        let water = cmirs_parameters("water").unwrap();
        assert_eq!(water.coefficients("0.001").unwrap().get("c"), Some("-1249.6"));
        assert_eq!(water.coefficients("0.0005").unwrap().get("c"), Some("-566.7"));
        assert_eq!(
            water.coefficients("0.002"),
            Err(SetError::UnsupportedIsodensity("0.002".to_string()))
        );
    }
}
