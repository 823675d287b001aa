use crate::core::io::traits::TextFormat;
use crate::core::models::molecule::{Molecule, MoleculeError, Site};
use crate::core::models::section::{
    Section, SectionCollection, SectionName, SectionValue, VdwMode,
};
use nalgebra::Point3;
use std::io::{self, BufRead, Write};
use thiserror::Error;

/// A complete Q-Chem input: the `$molecule` block plus every keyword section.
#[derive(Debug, Clone, PartialEq)]
pub struct QcInput {
    pub molecule: Molecule,
    pub sections: SectionCollection,
}

#[derive(Debug, Error)]
pub enum QcInputError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("Unknown section '${name}' on line {line}")]
    UnknownSection { line: usize, name: String },
    #[error("Section '${0}' is missing its closing '$end'")]
    UnterminatedSection(String),
    #[error("Input does not contain a $molecule section")]
    MissingMolecule,
    #[error("Invalid molecule: {0}")]
    Molecule(#[from] MoleculeError),
}

/// The layout of a section body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectionStyle {
    /// `   key = value`
    Assign,
    /// `   key value`, one line per value line.
    Spaced,
    /// `KEY` ... `ENDKEY` blocks of raw lines.
    Blocks,
    /// A single `KEY=value, KEY=value` line.
    Inline,
}

fn style_of(name: SectionName) -> SectionStyle {
    match name {
        SectionName::Rem | SectionName::Nbo | SectionName::GeomOpt => SectionStyle::Assign,
        SectionName::Opt => SectionStyle::Blocks,
        SectionName::Svp => SectionStyle::Inline,
        SectionName::Pcm
        | SectionName::Solvent
        | SectionName::Smx
        | SectionName::Scan
        | SectionName::VanDerWaals
        | SectionName::Plots
        | SectionName::PcmNonels => SectionStyle::Spaced,
    }
}

/// An empty `$nbo` block still switches the analysis on; other empty sections
/// carry no information and are omitted.
fn renders_when_empty(name: SectionName) -> bool {
    name == SectionName::Nbo
}

/// Renders an input to the Q-Chem text syntax.
pub fn render(input: &QcInput) -> String {
    let mut out = String::new();
    render_molecule(&input.molecule, &mut out);

    for (name, section) in input.sections.iter() {
        if section.is_empty() && !renders_when_empty(name) {
            continue;
        }
        out.push('\n');
        out.push_str(&format!("${}\n", name));
        if name == SectionName::VanDerWaals {
            out.push_str(input.sections.vdw_mode().code());
            out.push('\n');
        }
        render_body(style_of(name), section, &mut out);
        out.push_str("$end\n");
    }
    out
}

fn render_molecule(molecule: &Molecule, out: &mut String) {
    out.push_str("$molecule\n");
    out.push_str(&format!(
        "{} {}\n",
        molecule.charge(),
        molecule.spin_multiplicity()
    ));
    for site in molecule.sites() {
        out.push_str(&format!(
            " {}     {:.10}     {:.10}     {:.10}\n",
            site.species, site.position.x, site.position.y, site.position.z
        ));
    }
    out.push_str("$end\n");
}

fn render_body(style: SectionStyle, section: &Section, out: &mut String) {
    match style {
        SectionStyle::Assign => {
            for (key, value) in section.iter() {
                for line in value.lines() {
                    out.push_str(&format!("   {} = {}\n", key, line));
                }
            }
        }
        SectionStyle::Spaced => {
            for (key, value) in section.iter() {
                for line in value.lines() {
                    out.push_str(&format!("   {} {}\n", key, line));
                }
            }
        }
        SectionStyle::Blocks => {
            for (key, value) in section.iter() {
                let block = key.to_uppercase();
                out.push_str(&format!("{}\n", block));
                for line in value.lines() {
                    out.push_str(&format!("   {}\n", line));
                }
                out.push_str(&format!("END{}\n", block));
            }
        }
        SectionStyle::Inline => {
            let fields: Vec<String> = section
                .iter()
                .map(|(key, value)| format!("{}={}", key.to_uppercase(), value))
                .collect();
            if !fields.is_empty() {
                out.push_str(&fields.join(", "));
                out.push('\n');
            }
        }
    }
}

fn split_key_value(line: &str) -> Option<(&str, &str)> {
    if let Some((key, value)) = line.split_once('=') {
        return Some((key.trim(), value.trim()));
    }
    line.split_once(char::is_whitespace)
        .map(|(key, value)| (key.trim(), value.trim()))
}

struct Parser {
    molecule: Option<Molecule>,
    sections: SectionCollection,
}

impl Parser {
    fn parse_molecule(&mut self, body: &[(usize, String)]) -> Result<(), QcInputError> {
        let mut rows = body.iter();
        let (header_line, header) = rows.next().ok_or(QcInputError::MissingMolecule)?;
        let header_fields: Vec<&str> = header.split_whitespace().collect();
        if header_fields.len() != 2 {
            return Err(QcInputError::Parse {
                line: *header_line,
                message: "expected '<charge> <multiplicity>'".into(),
            });
        }
        let charge: i32 = header_fields[0].parse().map_err(|_| QcInputError::Parse {
            line: *header_line,
            message: format!("invalid charge '{}'", header_fields[0]),
        })?;
        let multiplicity: u32 = header_fields[1].parse().map_err(|_| QcInputError::Parse {
            line: *header_line,
            message: format!("invalid multiplicity '{}'", header_fields[1]),
        })?;

        let mut sites = Vec::new();
        for (line_num, row) in rows {
            let fields: Vec<&str> = row.split_whitespace().collect();
            if fields.len() != 4 {
                return Err(QcInputError::Parse {
                    line: *line_num,
                    message: format!("expected 'symbol x y z', found {} field(s)", fields.len()),
                });
            }
            let mut coords = [0.0; 3];
            for (slot, raw) in coords.iter_mut().zip(&fields[1..]) {
                *slot = raw.parse().map_err(|_| QcInputError::Parse {
                    line: *line_num,
                    message: format!("invalid coordinate '{}'", raw),
                })?;
            }
            sites.push(Site::new(
                fields[0],
                Point3::new(coords[0], coords[1], coords[2]),
            ));
        }
        self.molecule = Some(Molecule::new(sites, charge, multiplicity)?);
        Ok(())
    }

    fn parse_section(
        &mut self,
        name: SectionName,
        body: &[(usize, String)],
    ) -> Result<(), QcInputError> {
        let mut rows = body.iter().peekable();
        if name == SectionName::VanDerWaals {
            let mode = rows.peek().and_then(|(_, first)| VdwMode::from_code(first));
            if let Some(mode) = mode {
                self.sections.set_vdw_mode(mode);
                rows.next();
            }
        }

        let section = self.sections.section_mut(name);
        match style_of(name) {
            SectionStyle::Assign | SectionStyle::Spaced => {
                for (line_num, row) in rows {
                    let (key, value) = split_key_value(row).ok_or_else(|| QcInputError::Parse {
                        line: *line_num,
                        message: format!("expected a keyword and a value, found '{}'", row),
                    })?;
                    if name == SectionName::Scan {
                        push_line(section, key, value);
                    } else {
                        section.insert(key, value);
                    }
                }
            }
            SectionStyle::Blocks => {
                let mut current: Option<String> = None;
                for (line_num, row) in rows {
                    let upper = row.to_uppercase();
                    let Some(block) = current.clone() else {
                        section.insert(row, SectionValue::Lines(Vec::new()));
                        current = Some(upper);
                        continue;
                    };
                    if upper == format!("END{}", block) {
                        current = None;
                    } else if upper.starts_with("END") {
                        return Err(QcInputError::Parse {
                            line: *line_num,
                            message: format!("'{}' does not close block '{}'", row, block),
                        });
                    } else {
                        push_line(section, &block, row);
                    }
                }
                if let Some(block) = current {
                    return Err(QcInputError::UnterminatedSection(format!("opt/{}", block)));
                }
            }
            SectionStyle::Inline => {
                for (line_num, row) in rows {
                    for field in row.split(',').map(str::trim).filter(|f| !f.is_empty()) {
                        let (key, value) = field.split_once('=').ok_or_else(|| {
                            QcInputError::Parse {
                                line: *line_num,
                                message: format!("expected KEY=value, found '{}'", field),
                            }
                        })?;
                        section.insert(key.trim(), value.trim());
                    }
                }
            }
        }
        Ok(())
    }
}

fn push_line(section: &mut Section, key: &str, line: &str) {
    let mut lines: Vec<String> = section
        .get(key)
        .map(|value| value.lines().into_iter().map(str::to_string).collect())
        .unwrap_or_else(Vec::new);
    lines.push(line.to_string());
    section.insert(key, SectionValue::Lines(lines));
}

/// Q-Chem `.qin` input files.
pub struct QcInputFile;

impl TextFormat for QcInputFile {
    type Document = QcInput;
    type Error = QcInputError;

    fn read_from(reader: &mut impl BufRead) -> Result<Self::Document, Self::Error> {
        let mut parser = Parser {
            molecule: None,
            sections: SectionCollection::default(),
        };
        let mut open: Option<(usize, String)> = None;
        let mut body: Vec<(usize, String)> = Vec::new();

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('!') {
                continue;
            }

            match &open {
                None => {
                    let name = trimmed.strip_prefix('$').ok_or_else(|| QcInputError::Parse {
                        line: line_num,
                        message: format!("expected a '$section' header, found '{}'", trimmed),
                    })?;
                    open = Some((line_num, name.trim().to_lowercase()));
                    body.clear();
                }
                Some((header_line, name)) => {
                    let (header_line, name) = (*header_line, name.clone());
                    if !trimmed.eq_ignore_ascii_case("$end") {
                        body.push((line_num, trimmed.to_string()));
                        continue;
                    }
                    if name == "molecule" {
                        parser.parse_molecule(&body)?;
                    } else {
                        let section_name =
                            name.parse::<SectionName>()
                                .map_err(|_| QcInputError::UnknownSection {
                                    line: header_line,
                                    name: name.clone(),
                                })?;
                        parser.parse_section(section_name, &body)?;
                    }
                    open = None;
                }
            }
        }

        if let Some((_, name)) = open {
            return Err(QcInputError::UnterminatedSection(name));
        }
        let molecule = parser.molecule.ok_or(QcInputError::MissingMolecule)?;
        Ok(QcInput {
            molecule,
            sections: parser.sections,
        })
    }

    fn write_to(document: &Self::Document, writer: &mut impl Write) -> Result<(), Self::Error> {
        writer.write_all(render(document).as_bytes())?;
        Ok(())
    }
}
