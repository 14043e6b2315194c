//! Reading the vibrational sections of a MOLDEN file.
//!
//! Only the subset that CP2K writes for a vibrational analysis is understood:
//!
//! ```text
//! [Molden Format]
//! [FREQ]
//!     1594.784233
//! [INT]
//!        1.538740
//! [FR-COORD]
//! O        0.000000        0.000000        0.221664
//! H        0.000000        1.430330       -0.886656
//! H        0.000000       -1.430330       -0.886656
//! [FR-NORM-COORD]
//! vibration      1
//!     0.000000     0.000000    -0.068920
//!     0.000000    -0.428413     0.547014
//!     0.000000     0.428413     0.547014
//! ```
//!
//! Any other section is skipped. `[INT]` and `[Title]` are optional.
use std::path::Path;
use std::str::FromStr;

use glam::DVec3;

use crate::error::{Error, Result, Section};
use crate::{Atom, Molecule, VibrationalMode, Vibrations};

/// CODATA 2018 value of the bohr radius in ångström.
pub const BOHR_TO_ANGSTROM: f64 = 0.529177210903;

/// The length unit of the `[FR-COORD]` section.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum LengthUnit {
    /// Atomic units, as prescribed by the MOLDEN format. Converted to ångström on reading.
    #[default]
    Bohr,
    /// Already in ångström. Passed through unchanged.
    Angstrom,
}

impl LengthUnit {
    /// The factor that takes a length in this unit to ångström.
    pub fn to_angstrom(self) -> f64 {
        match self {
            LengthUnit::Bohr => BOHR_TO_ANGSTROM,
            LengthUnit::Angstrom => 1.0,
        }
    }
}

impl FromStr for LengthUnit {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bohr" | "au" => Ok(LengthUnit::Bohr),
            "angstrom" | "angs" => Ok(LengthUnit::Angstrom),
            other => Err(format!(
                "unknown length unit '{other}' (expected 'bohr' or 'angstrom')"
            )),
        }
    }
}

/// Reads and parses the MOLDEN file at `path`.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read, and [`Error::Parse`] if its contents are
/// malformed. See [`parse_molden`].
pub fn read_molden(path: impl AsRef<Path>, unit: LengthUnit) -> Result<Vibrations> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(Error::io(path))?;
    parse_molden(&text, unit)
}

/// Parses the text of a MOLDEN file into its molecule and vibrational modes.
///
/// The sections are first located, and then parsed in dependency order: `[FR-COORD]` comes first,
/// since its atom count determines the length of every block in `[FR-NORM-COORD]`.
///
/// # Errors
///
/// Returns [`Error::Parse`] if the text is empty, a required section is missing or appears twice,
/// a line does not hold the expected reals, a displacement block does not have one line per atom,
/// or the number of blocks does not match the number of frequencies.
pub fn parse_molden(text: &str, unit: LengthUnit) -> Result<Vibrations> {
    if text.trim().is_empty() {
        return Err(Error::parse(Section::Document, 1, "the input is empty"));
    }

    let mut sections = Sections::split(text)?;
    let fr_coord = sections.require(Section::FrCoord)?;
    let freq = sections.require(Section::Freq)?;
    let fr_norm_coord = sections.require(Section::FrNormCoord)?;

    let molecule = parse_atoms(&fr_coord, unit.to_angstrom())?;

    let frequencies = parse_scalars(&freq)?;
    if frequencies.is_empty() {
        return Err(Error::parse(
            Section::Freq,
            freq.marker,
            "no vibrational frequencies",
        ));
    }

    let intensities = match sections.take(Section::Int) {
        Some(int) => {
            let intensities = parse_scalars(&int)?;
            if intensities.len() != frequencies.len() {
                return Err(Error::parse(
                    Section::Int,
                    int.marker,
                    format!(
                        "found {} intensities for {} frequencies",
                        intensities.len(),
                        frequencies.len()
                    ),
                ));
            }
            Some(intensities)
        }
        None => None,
    };

    let title = sections.take(Section::Title).and_then(|block| {
        let title = block
            .content()
            .map(|(_, line)| line.trim())
            .collect::<Vec<_>>()
            .join(" ");
        (!title.is_empty()).then_some(title)
    });

    let blocks = parse_displacements(&fr_norm_coord, molecule.natoms())?;
    if blocks.len() != frequencies.len() {
        return Err(Error::parse(
            Section::FrNormCoord,
            fr_norm_coord.marker,
            format!(
                "found {} vibration blocks for {} frequencies",
                blocks.len(),
                frequencies.len()
            ),
        ));
    }

    let modes = blocks
        .into_iter()
        .zip(frequencies)
        .enumerate()
        .map(|(idx, (displacements, frequency))| VibrationalMode {
            index: idx + 1,
            frequency,
            intensity: intensities.as_ref().map(|int| int[idx]),
            displacements,
        })
        .collect();

    Ok(Vibrations {
        title,
        molecule,
        modes,
    })
}

/// The lines of one recognized section, each paired with its 1-based line number.
#[derive(Debug)]
struct Block<'s> {
    section: Section,
    /// Line number of the `[...]` marker.
    marker: usize,
    lines: Vec<(usize, &'s str)>,
}

impl<'s> Block<'s> {
    /// The non-blank lines of this block.
    fn content(&self) -> impl Iterator<Item = (usize, &'s str)> + '_ {
        self.lines
            .iter()
            .copied()
            .filter(|(_, line)| !line.trim().is_empty())
    }
}

#[derive(Debug)]
struct Sections<'s> {
    blocks: Vec<Block<'s>>,
    /// Number of the last line in the text, where a missing section is reported.
    last_line: usize,
}

impl<'s> Sections<'s> {
    fn split(text: &'s str) -> Result<Self> {
        let mut blocks: Vec<Block> = Vec::new();
        // Lines before the first marker, or inside a section we don't know, go nowhere.
        let mut current: Option<Block> = None;
        let mut last_line = 0;

        for (idx, line) in text.lines().enumerate() {
            let number = idx + 1;
            last_line = number;

            let Some(name) = marker(line) else {
                if let Some(block) = current.as_mut() {
                    block.lines.push((number, line));
                }
                continue;
            };

            blocks.extend(current.take());
            match Section::from_marker(name) {
                Some(section) => {
                    if blocks.iter().any(|block| block.section == section) {
                        return Err(Error::parse(section, number, "duplicate section"));
                    }
                    current = Some(Block {
                        section,
                        marker: number,
                        lines: Vec::new(),
                    });
                }
                None => log::debug!("skipping section [{}] at line {number}", name.trim()),
            }
        }
        blocks.extend(current);

        Ok(Self { blocks, last_line })
    }

    fn take(&mut self, section: Section) -> Option<Block<'s>> {
        let idx = self.blocks.iter().position(|block| block.section == section)?;
        Some(self.blocks.swap_remove(idx))
    }

    fn require(&mut self, section: Section) -> Result<Block<'s>> {
        let last_line = self.last_line;
        self.take(section).ok_or_else(|| {
            Error::parse(
                section,
                last_line,
                format!("missing required section {section}"),
            )
        })
    }
}

/// Returns the name inside a `[NAME]` marker line, if `line` is one.
fn marker(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix('[')?;
    let end = rest.find(']')?;
    Some(&rest[..end])
}

fn parse_atoms(block: &Block, scale: f64) -> Result<Molecule> {
    let mut atoms = Vec::new();
    for (number, line) in block.content() {
        let mut tokens = line.split_whitespace();
        let Some(element) = tokens.next() else {
            continue;
        };
        let position = parse_vector(tokens, block.section, number)?;
        atoms.push(Atom {
            element: element.to_string(),
            position: position * scale,
        });
    }

    if atoms.is_empty() {
        return Err(Error::parse(block.section, block.marker, "no atoms"));
    }

    Ok(Molecule::new(atoms))
}

/// Parses a section holding one real per line.
fn parse_scalars(block: &Block) -> Result<Vec<f64>> {
    block
        .content()
        .map(|(number, line)| {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            match tokens.as_slice() {
                [value] => parse_real(value).map_err(|d| Error::parse(block.section, number, d)),
                _ => Err(Error::parse(
                    block.section,
                    number,
                    format!("expected one real, found {} values", tokens.len()),
                )),
            }
        })
        .collect()
}

/// Parses the `vibration <n>` blocks, checking that each holds exactly `natoms` vectors.
fn parse_displacements(block: &Block, natoms: usize) -> Result<Vec<Vec<DVec3>>> {
    let section = block.section;
    let mut modes = Vec::new();
    // The marker line of the block being read, and its vectors so far.
    let mut current: Option<(usize, Vec<DVec3>)> = None;

    let close = |(marker, vectors): (usize, Vec<DVec3>), index: usize| {
        if vectors.len() == natoms {
            Ok(vectors)
        } else {
            Err(Error::parse(
                section,
                marker,
                format!(
                    "mode {index} has {} displacement lines, expected {natoms} (one per atom)",
                    vectors.len()
                ),
            ))
        }
    };

    for (number, line) in block.content() {
        let mut tokens = line.split_whitespace();
        if tokens
            .next()
            .is_some_and(|first| first.eq_ignore_ascii_case("vibration"))
        {
            if let Some(done) = current.take() {
                modes.push(close(done, modes.len() + 1)?);
            }
            current = Some((number, Vec::with_capacity(natoms)));
            continue;
        }

        let Some((_, vectors)) = current.as_mut() else {
            return Err(Error::parse(
                section,
                number,
                "displacement line before the first 'vibration' marker",
            ));
        };
        vectors.push(parse_vector(line.split_whitespace(), section, number)?);
    }
    if let Some(done) = current.take() {
        modes.push(close(done, modes.len() + 1)?);
    }

    Ok(modes)
}

fn parse_vector<'a>(
    tokens: impl Iterator<Item = &'a str>,
    section: Section,
    line: usize,
) -> Result<DVec3> {
    let tokens: Vec<&str> = tokens.collect();
    if tokens.len() != 3 {
        return Err(Error::parse(
            section,
            line,
            format!("expected three reals, found {} values", tokens.len()),
        ));
    }

    let mut xyz = [0.0; 3];
    for (value, token) in xyz.iter_mut().zip(tokens) {
        *value = parse_real(token).map_err(|details| Error::parse(section, line, details))?;
    }
    Ok(DVec3::from_array(xyz))
}

/// Parses a real, accepting Fortran `D` exponents.
fn parse_real(token: &str) -> std::result::Result<f64, String> {
    let value: f64 = token
        .replace(['D', 'd'], "E")
        .parse()
        .map_err(|_| format!("'{token}' is not a real number"))?;
    if !value.is_finite() {
        return Err(format!("'{token}' is not a finite number"));
    }
    Ok(value)
}
