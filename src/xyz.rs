//! Multi-frame xyz files.
//!
//! A frame is a block of `natoms + 2` lines: the number of atoms, a free comment line, and one
//! `element x y z` line per atom. A trajectory is a plain concatenation of such blocks.
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::Path;

use glam::DVec3;

/// A frame as it is read back from an xyz file.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct XyzFrame {
    pub comment: String,
    pub elements: Vec<String>,
    pub positions: Vec<DVec3>,
}

impl XyzFrame {
    pub fn natoms(&self) -> usize {
        self.positions.len()
    }
}

#[derive(Debug)]
pub struct XyzWriter<W: Write> {
    inner: W,
    frames: usize,
}

impl XyzWriter<BufWriter<File>> {
    /// Creates the file at `path`, truncating it if it exists.
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> XyzWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, frames: 0 }
    }

    /// Appends one frame.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::InvalidInput`] if `comment` spans more than one line or if the
    /// number of `elements` and `positions` differ. Otherwise passes through any writer errors.
    pub fn write_frame<S: AsRef<str>>(
        &mut self,
        comment: &str,
        elements: &[S],
        positions: &[DVec3],
    ) -> io::Result<()> {
        if comment.contains(['\n', '\r']) {
            return Err(io::Error::new(
                ErrorKind::InvalidInput,
                "an xyz comment must be a single line",
            ));
        }
        if elements.len() != positions.len() {
            return Err(io::Error::new(
                ErrorKind::InvalidInput,
                format!(
                    "got {} elements for {} positions",
                    elements.len(),
                    positions.len()
                ),
            ));
        }

        let w = &mut self.inner;
        writeln!(w, "{}", positions.len())?;
        writeln!(w, "{comment}")?;
        for (element, pos) in elements.iter().zip(positions) {
            writeln!(
                w,
                "{:<2} {:>15.8} {:>15.8} {:>15.8}",
                element.as_ref(),
                unsigned_zero(pos.x),
                unsigned_zero(pos.y),
                unsigned_zero(pos.z)
            )?;
        }
        self.frames += 1;

        Ok(())
    }

    pub fn frames_written(&self) -> usize {
        self.frames
    }

    /// Flushes the writer and returns it.
    pub fn finish(mut self) -> io::Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

/// Maps values that print as zero at 8 decimals to `+0.0`, so a residue like `-1e-17` from
/// `sin(π)` does not show up as `-0.00000000`.
fn unsigned_zero(value: f64) -> f64 {
    if value.abs() < 5e-9 {
        0.0
    } else {
        value
    }
}

#[derive(Debug)]
pub struct XyzReader<R> {
    inner: R,
    line: usize,
    buf: String,
}

impl XyzReader<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> XyzReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            inner: reader,
            line: 0,
            buf: String::new(),
        }
    }

    /// Reads the next line into the internal buffer. Returns `false` at the end of the input.
    fn next_line(&mut self) -> io::Result<bool> {
        self.buf.clear();
        let n = self.inner.read_line(&mut self.buf)?;
        if n > 0 {
            self.line += 1;
        }
        Ok(n > 0)
    }

    fn invalid(&self, details: impl std::fmt::Display) -> io::Error {
        io::Error::new(
            ErrorKind::InvalidData,
            format!("xyz line {}: {details}", self.line),
        )
    }

    /// Reads the next [`XyzFrame`] into `frame`.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::UnexpectedEof`] if there are no frames left, and with
    /// [`ErrorKind::InvalidData`] if a frame is malformed or cut short.
    pub fn read_frame(&mut self, frame: &mut XyzFrame) -> io::Result<()> {
        // Blank lines between frames are tolerated.
        loop {
            if !self.next_line()? {
                return Err(io::Error::new(ErrorKind::UnexpectedEof, "no more frames"));
            }
            if !self.buf.trim().is_empty() {
                break;
            }
        }
        let natoms: usize = self
            .buf
            .trim()
            .parse()
            .map_err(|_| self.invalid(format!("invalid atom count '{}'", self.buf.trim())))?;

        if !self.next_line()? {
            return Err(self.invalid("frame ends before its comment line"));
        }
        frame.comment.clear();
        frame.comment.push_str(self.buf.trim_end_matches(['\n', '\r']));

        frame.elements.clear();
        frame.positions.clear();
        for _ in 0..natoms {
            if !self.next_line()? {
                return Err(self.invalid(format!("frame ends before its {natoms} atoms")));
            }
            let mut tokens = self.buf.split_whitespace();
            let element = tokens
                .next()
                .ok_or_else(|| self.invalid("missing element"))?
                .to_string();
            let mut xyz = [0.0; 3];
            for value in &mut xyz {
                let token = tokens
                    .next()
                    .ok_or_else(|| self.invalid("expected three coordinates"))?;
                *value = token
                    .parse()
                    .map_err(|_| self.invalid(format!("invalid coordinate '{token}'")))?;
            }
            frame.elements.push(element);
            frame.positions.push(DVec3::from_array(xyz));
        }

        Ok(())
    }

    /// A convenience function to read all remaining frames.
    pub fn read_all_frames(&mut self) -> io::Result<Box<[XyzFrame]>> {
        let mut frames = Vec::new();
        let mut frame = XyzFrame::default();
        loop {
            match self.read_frame(&mut frame) {
                Ok(()) => frames.push(std::mem::take(&mut frame)),
                // Only reported when the input runs out between two frames.
                Err(err) if err.kind() == ErrorKind::UnexpectedEof => break,
                Err(err) => return Err(err),
            }
        }
        Ok(frames.into_boxed_slice())
    }
}
