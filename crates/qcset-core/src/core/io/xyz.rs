use crate::core::io::traits::TextFormat;
use crate::core::models::molecule::{Molecule, MoleculeError, Site};
use nalgebra::Point3;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum XyzError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: XyzParseErrorKind },
    #[error("Header declares {expected} atoms but {found} were found")]
    AtomCountMismatch { expected: usize, found: usize },
    #[error("Invalid molecule: {0}")]
    Molecule(#[from] MoleculeError),
}

#[derive(Debug, Error)]
pub enum XyzParseErrorKind {
    #[error("Invalid atom count '{0}'")]
    InvalidAtomCount(String),
    #[error("Expected 'symbol x y z', found {0} field(s)")]
    WrongFieldCount(usize),
    #[error("Invalid coordinate '{0}'")]
    InvalidCoordinate(String),
    #[error("File ended before the comment line")]
    MissingCommentLine,
}

/// Plain XYZ structure files.
///
/// The format carries no charge or spin; molecules read from it are neutral
/// singlets until [`Molecule::with_charge_and_multiplicity`] says otherwise.
pub struct XyzFile;

impl TextFormat for XyzFile {
    type Document = Molecule;
    type Error = XyzError;

    fn read_from(reader: &mut impl BufRead) -> Result<Self::Document, Self::Error> {
        let mut lines = reader.lines().enumerate();

        let expected = loop {
            match lines.next() {
                Some((line_num, line)) => {
                    let line = line?;
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    break trimmed.parse::<usize>().map_err(|_| XyzError::Parse {
                        line: line_num + 1,
                        kind: XyzParseErrorKind::InvalidAtomCount(trimmed.to_string()),
                    })?;
                }
                None => return Err(XyzError::Molecule(MoleculeError::Empty)),
            }
        };

        match lines.next() {
            Some((_, comment)) => {
                comment?;
            }
            None => {
                return Err(XyzError::Parse {
                    line: 2,
                    kind: XyzParseErrorKind::MissingCommentLine,
                });
            }
        }

        let mut sites = Vec::with_capacity(expected);
        for (line_num, line) in lines {
            let line = line?;
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.is_empty() {
                continue;
            }
            if sites.len() == expected {
                break;
            }
            if fields.len() < 4 {
                return Err(XyzError::Parse {
                    line: line_num + 1,
                    kind: XyzParseErrorKind::WrongFieldCount(fields.len()),
                });
            }
            let mut coords = [0.0; 3];
            for (slot, raw) in coords.iter_mut().zip(&fields[1..4]) {
                *slot = raw.parse().map_err(|_| XyzError::Parse {
                    line: line_num + 1,
                    kind: XyzParseErrorKind::InvalidCoordinate(raw.to_string()),
                })?;
            }
            sites.push(Site::new(
                fields[0],
                Point3::new(coords[0], coords[1], coords[2]),
            ));
        }

        if sites.len() != expected {
            return Err(XyzError::AtomCountMismatch {
                expected,
                found: sites.len(),
            });
        }
        Ok(Molecule::new(sites, 0, 1)?)
    }

    fn write_to(document: &Self::Document, writer: &mut impl Write) -> Result<(), Self::Error> {
        writeln!(writer, "{}", document.len())?;
        writeln!(writer, "{}", document.formula())?;
        for site in document.sites() {
            writeln!(
                writer,
                "{:<3} {:>14.8} {:>14.8} {:>14.8}",
                site.species, site.position.x, site.position.y, site.position.z
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;

    const WATER_XYZ: &str = "3
water
O   0.000000  0.000000  0.117300
H   0.000000  0.757200 -0.469200
H   0.000000 -0.757200 -0.469200
";

    #[test]
    fn read_from_parses_sites_in_order() {
        let molecule = XyzFile::read_from(&mut Cursor::new(WATER_XYZ)).unwrap();
        assert_eq!(molecule.len(), 3);
        assert_eq!(molecule.sites()[0].species, "O");
        assert_eq!(molecule.sites()[1].position, Point3::new(0.0, 0.7572, -0.4692));
        assert_eq!(molecule.charge(), 0);
        assert_eq!(molecule.spin_multiplicity(), 1);
    }

    #[test]
    fn read_from_rejects_count_mismatch() {
        let truncated = "3\nwater\nO 0 0 0\nH 0 0 1\n";
        let result = XyzFile::read_from(&mut Cursor::new(truncated));
        assert!(matches!(
            result,
            Err(XyzError::AtomCountMismatch {
                expected: 3,
                found: 2
            })
        ));
    }

    #[test]
    fn read_from_reports_line_of_bad_coordinate() {
        let bad = "1\ncomment\nC 0.0 abc 0.0\n";
        let result = XyzFile::read_from(&mut Cursor::new(bad));
        assert!(matches!(
            result,
            Err(XyzError::Parse {
                line: 3,
                kind: XyzParseErrorKind::InvalidCoordinate(_)
            })
        ));
    }

    #[test]
    fn read_from_rejects_non_numeric_header() {
        let result = XyzFile::read_from(&mut Cursor::new("three\nwater\n"));
        assert!(matches!(
            result,
            Err(XyzError::Parse {
                line: 1,
                kind: XyzParseErrorKind::InvalidAtomCount(_)
            })
        ));
    }

    #[test]
    fn write_then_read_from_path_preserves_structure() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("water.xyz");
        let molecule = XyzFile::read_from(&mut Cursor::new(WATER_XYZ)).unwrap();

        XyzFile::write_to_path(&molecule, &path).unwrap();
        let reread = XyzFile::read_from_path(&path).unwrap();

        assert_eq!(reread, molecule);
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("3\nO1 H2\n"));
    }
}
