//! Animate the normal modes of a MOLDEN vibration file.
//!
//! [`read_molden`] reads the equilibrium geometry and the vibrational modes written by a CP2K
//! frequency calculation. [`write_trajectory`] then samples one period of a mode according to an
//! [`Oscillation`] and writes it as a multi-frame xyz file, which any trajectory viewer can loop.
//!
//! ```no_run
//! use wobble::{export_trajectories, read_molden, LengthUnit, Oscillation};
//!
//! let vibrations = read_molden("water-VIBRATIONS-1.mol", LengthUnit::Bohr)?;
//! let oscillation = Oscillation::new(20, wobble::DEFAULT_AMPLITUDE)?;
//! // Writes `water_1.xyz`, `water_2.xyz`, ...
//! export_trajectories(&vibrations, "water", &oscillation)?;
//! # Ok::<(), wobble::Error>(())
//! ```
use std::path::{Path, PathBuf};

use glam::DVec3;

pub use crate::error::{Error, Result, Section};
pub use crate::molden::{parse_molden, read_molden, LengthUnit, BOHR_TO_ANGSTROM};
pub use crate::oscillation::{Frame, Frames, Oscillation, DEFAULT_AMPLITUDE};
use crate::xyz::XyzWriter;

mod error;
pub mod molden;
pub mod oscillation;
pub mod xyz;

#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Element symbol, exactly as it appears in the input.
    pub element: String,
    /// Equilibrium position in ångström.
    pub position: DVec3,
}

/// The equilibrium structure. The order of the atoms is the index that the displacement vectors
/// of every [`VibrationalMode`] follow.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Molecule {
    atoms: Vec<Atom>,
}

impl Molecule {
    pub fn new(atoms: Vec<Atom>) -> Self {
        Self { atoms }
    }

    pub fn natoms(&self) -> usize {
        self.atoms.len()
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn elements(&self) -> impl Iterator<Item = &str> + '_ {
        self.atoms.iter().map(|atom| atom.element.as_str())
    }

    pub fn positions(&self) -> impl Iterator<Item = DVec3> + '_ {
        self.atoms.iter().map(|atom| atom.position)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VibrationalMode {
    /// 1-based position of this mode in the input.
    pub index: usize,
    /// Wavenumber in cm⁻¹. Imaginary modes are negative.
    pub frequency: f64,
    /// IR intensity in km/mol, if the input lists them.
    pub intensity: Option<f64>,
    /// One vector per atom, in the order of the [`Molecule`].
    pub displacements: Vec<DVec3>,
}

/// Everything read from a MOLDEN vibration file.
#[derive(Debug, Clone, PartialEq)]
pub struct Vibrations {
    pub title: Option<String>,
    pub molecule: Molecule,
    pub modes: Vec<VibrationalMode>,
}

/// The path of the trajectory for mode `index`: `<base>_<index>.xyz`.
pub fn trajectory_path(base: impl AsRef<Path>, index: usize) -> PathBuf {
    let mut name = base.as_ref().as_os_str().to_os_string();
    name.push(format!("_{index}.xyz"));
    PathBuf::from(name)
}

/// Writes one period of `mode` to a multi-frame xyz file at `path`, overwriting it if it exists.
///
/// # Errors
///
/// Returns [`Error::Value`] if `oscillation` is invalid or `molecule` and `mode` disagree on the
/// number of atoms. In that case no file is created. Returns [`Error::Io`] if the file cannot be
/// created or written.
pub fn write_trajectory(
    molecule: &Molecule,
    mode: &VibrationalMode,
    path: impl AsRef<Path>,
    oscillation: &Oscillation,
) -> Result<()> {
    let path = path.as_ref();
    let frames = oscillation.frames(molecule, mode)?;
    let elements: Vec<&str> = molecule.elements().collect();

    let mut writer = XyzWriter::create(path).map_err(Error::io(path))?;
    for frame in frames {
        let comment = frame_comment(mode, frame.step, oscillation.nframes);
        writer
            .write_frame(&comment, &elements, &frame.positions)
            .map_err(Error::io(path))?;
    }
    writer.finish().map_err(Error::io(path))?;

    Ok(())
}

/// Writes the trajectory of every mode to [`trajectory_path`]`(base, mode.index)`, in order.
///
/// Stops at the first error. Trajectories written before that point are left in place.
pub fn export_trajectories(
    vibrations: &Vibrations,
    base: impl AsRef<Path>,
    oscillation: &Oscillation,
) -> Result<Vec<PathBuf>> {
    oscillation.validate()?;
    let base = base.as_ref();
    let nmodes = vibrations.modes.len();
    vibrations
        .modes
        .iter()
        .map(|mode| {
            let path = trajectory_path(base, mode.index);
            log::info!(
                "mode {}/{nmodes} ({:.2} cm^-1) -> {}",
                mode.index,
                mode.frequency,
                path.display()
            );
            write_trajectory(&vibrations.molecule, mode, &path, oscillation)?;
            Ok(path)
        })
        .collect()
}

fn frame_comment(mode: &VibrationalMode, step: usize, nframes: usize) -> String {
    let mut comment = format!("mode {} | freq {:.4} cm^-1", mode.index, mode.frequency);
    if let Some(intensity) = mode.intensity {
        comment.push_str(&format!(" | int {intensity:.4} km/mol"));
    }
    comment.push_str(&format!(" | frame {}/{nframes}", step + 1));
    comment
}
