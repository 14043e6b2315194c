//! Sampling one period of a normal-mode oscillation.
//!
//! Sample `t` of an [`Oscillation`] with `nframes` samples places every atom at
//!
//! ```text
//! equilibrium + amplitude * sin(2π t / nframes) * displacement
//! ```
//!
//! for `t` in `0..nframes`. The last sample does not repeat the first, so a viewer that loops the
//! trajectory plays a seamless oscillation.
use std::f64::consts::TAU;

use glam::DVec3;

use crate::error::{Error, Result};
use crate::{Molecule, VibrationalMode};

/// Scale of the displacement vectors, in ångström per unit of normal coordinate.
pub const DEFAULT_AMPLITUDE: f64 = 0.5;

/// How a mode is sampled: the number of frames per period and the displacement scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Oscillation {
    /// Number of frames sampled over one period. Must be at least 1.
    ///
    /// A single frame is valid, and holds just the equilibrium geometry.
    pub nframes: usize,
    /// Factor applied to every displacement vector at the peak of the oscillation.
    pub amplitude: f64,
}

impl Oscillation {
    pub fn new(nframes: usize, amplitude: f64) -> Result<Self> {
        let oscillation = Self { nframes, amplitude };
        oscillation.validate()?;
        Ok(oscillation)
    }

    pub fn validate(&self) -> Result<()> {
        if self.nframes == 0 {
            return Err(Error::Value(
                "the number of frames must be at least 1".to_string(),
            ));
        }
        if !self.amplitude.is_finite() {
            return Err(Error::Value(format!(
                "the amplitude must be finite, got {}",
                self.amplitude
            )));
        }
        Ok(())
    }

    /// The phase in radians of sample `t`.
    ///
    /// Any `t` is accepted. It is reduced modulo `nframes` first, such that the phase of `t` and
    /// `t + nframes` is exactly the same.
    pub fn phase(&self, t: usize) -> f64 {
        let nframes = self.nframes.max(1);
        TAU * (t % nframes) as f64 / nframes as f64
    }

    /// The factor by which the displacement vectors are scaled at sample `t`.
    pub fn scale(&self, t: usize) -> f64 {
        match t % self.nframes.max(1) {
            // Keep the equilibrium exact, whatever the amplitude.
            0 => 0.0,
            _ => self.amplitude * self.phase(t).sin(),
        }
    }

    /// Computes sample `t` of `mode` into `frame`, reusing its allocation.
    pub fn frame_into(
        &self,
        molecule: &Molecule,
        mode: &VibrationalMode,
        t: usize,
        frame: &mut Frame,
    ) -> Result<()> {
        self.check(molecule, mode)?;
        self.fill(molecule, mode, t, frame);
        Ok(())
    }

    /// Returns sample `t` of `mode`.
    pub fn frame(&self, molecule: &Molecule, mode: &VibrationalMode, t: usize) -> Result<Frame> {
        let mut frame = Frame::default();
        self.frame_into(molecule, mode, t, &mut frame)?;
        Ok(frame)
    }

    /// Returns an iterator over all `nframes` samples of one period of `mode`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Value`] if this [`Oscillation`] is invalid, or if the number of atoms in
    /// `molecule` does not match the number of displacement vectors of `mode`.
    pub fn frames<'a>(
        &self,
        molecule: &'a Molecule,
        mode: &'a VibrationalMode,
    ) -> Result<Frames<'a>> {
        self.check(molecule, mode)?;
        Ok(Frames {
            oscillation: *self,
            molecule,
            mode,
            step: 0,
        })
    }

    fn check(&self, molecule: &Molecule, mode: &VibrationalMode) -> Result<()> {
        self.validate()?;
        if molecule.natoms() != mode.displacements.len() {
            return Err(Error::Value(format!(
                "mode {} has {} displacement vectors, but the molecule has {} atoms",
                mode.index,
                mode.displacements.len(),
                molecule.natoms()
            )));
        }
        Ok(())
    }

    fn fill(&self, molecule: &Molecule, mode: &VibrationalMode, t: usize, frame: &mut Frame) {
        let scale = self.scale(t);
        frame.step = t;
        frame.phase = self.phase(t);
        frame.positions.clear();
        frame.positions.extend(
            molecule
                .positions()
                .zip(&mode.displacements)
                .map(|(equilibrium, &displacement)| equilibrium + scale * displacement),
        );
    }
}

/// One sampled snapshot of the atom positions.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Frame {
    /// The sample index `t`.
    pub step: usize,
    /// Phase in radians.
    pub phase: f64,
    /// Positions in ångström, in the atom order of the molecule.
    pub positions: Vec<DVec3>,
}

impl Frame {
    pub fn natoms(&self) -> usize {
        self.positions.len()
    }
}

/// Iterator over the frames of one period, created by [`Oscillation::frames`].
#[derive(Debug, Clone)]
pub struct Frames<'a> {
    oscillation: Oscillation,
    molecule: &'a Molecule,
    mode: &'a VibrationalMode,
    step: usize,
}

impl Iterator for Frames<'_> {
    type Item = Frame;

    fn next(&mut self) -> Option<Self::Item> {
        if self.step >= self.oscillation.nframes {
            return None;
        }
        let mut frame = Frame::default();
        self.oscillation
            .fill(self.molecule, self.mode, self.step, &mut frame);
        self.step += 1;
        Some(frame)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.oscillation.nframes.saturating_sub(self.step);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Frames<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Atom;

    fn triatomic() -> (Molecule, VibrationalMode) {
        let molecule = Molecule::new(vec![
            Atom {
                element: "C".to_string(),
                position: DVec3::new(0.0, 0.0, 0.0),
            },
            Atom {
                element: "O".to_string(),
                position: DVec3::new(0.0, 0.0, 1.16),
            },
            Atom {
                element: "O".to_string(),
                position: DVec3::new(0.0, 0.0, -1.16),
            },
        ]);
        let mode = VibrationalMode {
            index: 1,
            frequency: 500.0,
            intensity: None,
            displacements: vec![
                DVec3::new(0.0, 0.0, 1.0),
                DVec3::new(0.0, 0.0, -1.0),
                DVec3::new(0.0, 0.0, 0.0),
            ],
        };
        (molecule, mode)
    }

    fn assert_close(a: DVec3, b: DVec3) {
        assert!(a.abs_diff_eq(b, 1e-12), "{a} is not close to {b}");
    }

    #[test]
    fn four_frames() {
        let (molecule, mode) = triatomic();
        let oscillation = Oscillation::new(4, 0.1).unwrap();
        let frames: Vec<Frame> = oscillation.frames(&molecule, &mode).unwrap().collect();
        assert_eq!(frames.len(), 4);

        let equilibrium: Vec<DVec3> = molecule.positions().collect();
        assert_eq!(frames[0].positions, equilibrium);

        assert_close(frames[1].positions[0], DVec3::new(0.0, 0.0, 0.1));
        assert_close(frames[1].positions[1], DVec3::new(0.0, 0.0, 1.06));
        assert_close(frames[1].positions[2], equilibrium[2]);

        for (pos, eq) in frames[2].positions.iter().zip(&equilibrium) {
            assert_close(*pos, *eq);
        }

        assert_close(frames[3].positions[0], DVec3::new(0.0, 0.0, -0.1));
        assert_close(frames[3].positions[1], DVec3::new(0.0, 0.0, 1.26));
    }

    #[test]
    fn single_frame_is_equilibrium() {
        let (molecule, mode) = triatomic();
        let oscillation = Oscillation::new(1, 3.0).unwrap();
        let frames: Vec<Frame> = oscillation.frames(&molecule, &mode).unwrap().collect();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].positions, molecule.positions().collect::<Vec<_>>());
        assert_eq!(frames[0].phase, 0.0);
    }

    #[test]
    fn equilibrium_at_phase_zero() {
        let (molecule, mode) = triatomic();
        let equilibrium: Vec<DVec3> = molecule.positions().collect();
        for amplitude in [0.0, 0.1, 1.0, -2.5, 1e6] {
            for nframes in [1, 2, 7, 60] {
                let oscillation = Oscillation::new(nframes, amplitude).unwrap();
                let frame = oscillation.frame(&molecule, &mode, 0).unwrap();
                assert_eq!(frame.positions, equilibrium);
            }
        }
    }

    #[test]
    fn periodic() {
        let (molecule, mode) = triatomic();
        for nframes in [1, 3, 10, 31] {
            let oscillation = Oscillation::new(nframes, 0.7).unwrap();
            for t in 0..nframes {
                let frame = oscillation.frame(&molecule, &mode, t).unwrap();
                let next = oscillation.frame(&molecule, &mode, t + nframes).unwrap();
                let after = oscillation.frame(&molecule, &mode, t + 5 * nframes).unwrap();
                assert_eq!(frame.positions, next.positions);
                assert_eq!(frame.positions, after.positions);
            }
        }
    }

    #[test]
    fn frame_into_reuses_the_frame() {
        let (molecule, mode) = triatomic();
        let oscillation = Oscillation::new(8, 0.2).unwrap();
        let mut frame = Frame::default();
        for t in 0..8 {
            oscillation
                .frame_into(&molecule, &mode, t, &mut frame)
                .unwrap();
            assert_eq!(frame.step, t);
            assert_eq!(frame.natoms(), 3);
            assert_eq!(frame, oscillation.frame(&molecule, &mode, t).unwrap());
        }
    }

    #[test]
    fn exact_size() {
        let (molecule, mode) = triatomic();
        let oscillation = Oscillation::new(12, 0.2).unwrap();
        let mut frames = oscillation.frames(&molecule, &mode).unwrap();
        assert_eq!(frames.len(), 12);
        frames.next();
        assert_eq!(frames.len(), 11);
    }

    #[test]
    fn zero_frames() {
        assert!(matches!(Oscillation::new(0, 0.1), Err(Error::Value(_))));

        let (molecule, mode) = triatomic();
        let oscillation = Oscillation {
            nframes: 0,
            amplitude: 0.1,
        };
        assert!(matches!(
            oscillation.frames(&molecule, &mode),
            Err(Error::Value(_))
        ));
    }

    #[test]
    fn non_finite_amplitude() {
        assert!(matches!(
            Oscillation::new(4, f64::NAN),
            Err(Error::Value(_))
        ));
        assert!(matches!(
            Oscillation::new(4, f64::INFINITY),
            Err(Error::Value(_))
        ));
    }

    #[test]
    fn atom_count_mismatch() {
        let (molecule, mut mode) = triatomic();
        mode.displacements.pop();
        let oscillation = Oscillation::new(4, 0.1).unwrap();
        match oscillation.frames(&molecule, &mode) {
            Err(Error::Value(msg)) => assert!(msg.contains("mode 1"), "{msg}"),
            other => panic!("expected a value error, got {other:?}"),
        }
    }
}
