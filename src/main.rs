//! Animate the normal modes of a MOLDEN vibration file as xyz trajectories.
use std::num::ParseIntError;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use wobble::{
    export_trajectories, read_molden, LengthUnit, Oscillation, Vibrations, DEFAULT_AMPLITUDE,
};

fn nframes_parser(nframes: &str) -> Result<usize, String> {
    let nframes: usize = nframes
        .parse()
        .map_err(|err: ParseIntError| err.to_string())?;
    if nframes == 0 {
        return Err("the number of frames must be at least 1".to_string());
    }
    Ok(nframes)
}

fn unit_parser(unit: &str) -> Result<LengthUnit, String> {
    unit.parse()
}

fn summary(vibrations: &Vibrations) -> String {
    format!(
        "atoms: {}\nmodes: {}",
        vibrations.molecule.natoms(),
        vibrations.modes.len()
    )
}

/// Write one looping xyz trajectory per normal mode of a MOLDEN vibration file.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Input path (molden), as written by a CP2K vibrational analysis.
    #[arg(short, long)]
    input: PathBuf,

    /// Output base name. The trajectory of mode `n` is written to `<OUTPUT>_<n>.xyz`.
    #[arg(short, long)]
    output: PathBuf,

    /// Number of frames sampled over one period of each mode.
    ///
    /// A single frame is allowed, but only holds the equilibrium geometry.
    #[arg(short = 'f', long, value_parser = nframes_parser)]
    nframes: usize,

    /// Scale of the displacement vectors, in ångström per unit of normal coordinate.
    #[arg(short, long, default_value_t = DEFAULT_AMPLITUDE, allow_negative_numbers = true)]
    amplitude: f64,

    /// Length unit of the geometry in the input: `bohr` or `angstrom`.
    ///
    /// MOLDEN prescribes bohr, which is converted to ångström for the output.
    #[arg(short, long, default_value = "bohr", value_parser = unit_parser)]
    units: LengthUnit,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args = Args::parse();

    let oscillation = match Oscillation::new(args.nframes, args.amplitude) {
        Ok(oscillation) => oscillation,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    log::info!("reading {}", args.input.display());
    let vibrations = match read_molden(&args.input, args.units) {
        Ok(vibrations) => vibrations,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(title) = &vibrations.title {
        log::info!("title: {title}");
    }

    println!("{}", summary(&vibrations));

    log::info!(
        "writing {} trajectories of {} frames (amplitude {})",
        vibrations.modes.len(),
        oscillation.nframes,
        oscillation.amplitude
    );
    match export_trajectories(&vibrations, &args.output, &oscillation) {
        Ok(paths) => {
            log::info!("done, wrote {} files", paths.len());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
