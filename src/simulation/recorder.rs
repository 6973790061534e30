//! Snapshot output
//!
//! One line per recorded instant, fields separated by single spaces:
//!
//! ```text
//! <time> <total_energy> <x1> <y1> <z1> <vx1> <vy1> <vz1> [<x2> ... <vz2> ...]
//! ```
//!
//! Floats are written with Rust's shortest round-trip formatting, so parsing
//! a line gives back the exact values that were recorded.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::debug;

use crate::error::{Result, SimError};
use crate::simulation::states::{Body, NVec3};

/// State of the whole system at one instant
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub time: f64,
    pub total_energy: f64,
    pub states: Vec<(NVec3, NVec3)>, // (position, velocity) per body, insertion order
}

impl Snapshot {
    pub fn capture(time: f64, total_energy: f64, bodies: &[Body]) -> Self {
        Self {
            time,
            total_energy,
            states: bodies.iter().map(|b| (b.x, b.v)).collect(),
        }
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.time, self.total_energy)?;
        for (x, v) in &self.states {
            write!(f, " {} {} {} {} {} {}", x.x, x.y, x.z, v.x, v.y, v.z)?;
        }
        Ok(())
    }
}

impl FromStr for Snapshot {
    type Err = SimError;

    fn from_str(line: &str) -> Result<Self> {
        let values = line
            .split_whitespace()
            .map(|field| {
                field.parse::<f64>().map_err(|e| {
                    SimError::Parse(format!("bad snapshot field `{field}`: {e}"))
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        if values.len() < 2 || (values.len() - 2) % 6 != 0 {
            return Err(SimError::Parse(format!(
                "snapshot line has {} fields, expected 2 + 6 per body",
                values.len()
            )));
        }

        let states = values[2..]
            .chunks_exact(6)
            .map(|c| (NVec3::new(c[0], c[1], c[2]), NVec3::new(c[3], c[4], c[5])))
            .collect();

        Ok(Snapshot {
            time: values[0],
            total_energy: values[1],
            states,
        })
    }
}

/// Persistent sink for snapshots, identified by its file path
#[derive(Debug, Clone)]
pub struct StateRecorder {
    path: PathBuf,
}

impl StateRecorder {
    /// Create (or truncate) the output file
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        File::create(&path)?;
        debug!(path = %path.display(), "output file truncated");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reopen the file in append mode for the duration of one run
    pub fn session(&self) -> Result<RecorderSession> {
        let file = OpenOptions::new().append(true).create(true).open(&self.path)?;
        Ok(RecorderSession {
            out: BufWriter::new(file),
            written: 0,
        })
    }
}

/// Append-mode writer held while a run is in progress
pub struct RecorderSession {
    out: BufWriter<File>,
    written: usize,
}

impl RecorderSession {
    pub fn record(&mut self, snapshot: &Snapshot) -> Result<()> {
        writeln!(self.out, "{snapshot}")?;
        self.written += 1;
        Ok(())
    }

    /// Flush and close, returning the number of lines written
    pub fn finish(mut self) -> Result<usize> {
        self.out.flush()?;
        Ok(self.written)
    }
}

/// Read every snapshot line of an output file, skipping blank lines
pub fn read_snapshots(path: impl AsRef<Path>) -> Result<Vec<Snapshot>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| SimError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);
    let mut snapshots = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        snapshots.push(line.parse()?);
    }
    Ok(snapshots)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("nbody-recorder-{}-{name}.dat", std::process::id()))
    }

    fn sample() -> Snapshot {
        Snapshot::capture(
            0.1,
            -0.75,
            &[
                Body::new(NVec3::new(-0.5, 0.0, 0.0), NVec3::new(0.0, -0.5, 0.0), 1.0),
                Body::new(NVec3::new(0.5, 1e-17, 3.0), NVec3::new(0.0, 0.5, 1.0 / 3.0), 1.0),
            ],
        )
    }

    #[test]
    fn line_layout() {
        let line = sample().to_string();
        let fields: Vec<&str> = line.split(' ').collect();
        assert_eq!(fields.len(), 2 + 2 * 6);
        assert_eq!(fields[0], "0.1");
        assert_eq!(fields[1], "-0.75");
        assert_eq!(&fields[2..8], &["-0.5", "0", "0", "0", "-0.5", "0"]);
    }

    #[test]
    fn parsed_line_is_exact() {
        let snap = sample();
        let back: Snapshot = snap.to_string().parse().unwrap();
        assert_eq!(back, snap);
    }

    #[test]
    fn malformed_lines_are_rejected() {
        assert!("0.1".parse::<Snapshot>().is_err());
        assert!("0.1 -1 1 2 3".parse::<Snapshot>().is_err());
        assert!("0.1 -1 a 0 0 0 0 0".parse::<Snapshot>().is_err());
    }

    #[test]
    fn malformed_line_is_a_parse_error() {
        assert!(matches!("0.1 -1 1 2 3".parse::<Snapshot>(), Err(SimError::Parse(_))));
        assert!(matches!("0.1 nan? 0".parse::<Snapshot>(), Err(SimError::Parse(_))));

        let path = temp_path("garbage");
        std::fs::write(&path, "0 -1 0 0 0 0 0 0
not a snapshot
").unwrap();
        assert!(matches!(read_snapshots(&path), Err(SimError::Parse(_))));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn create_truncates_and_session_appends() {
        let path = temp_path("append");
        std::fs::write(&path, "stale contents\n").unwrap();

        let recorder = StateRecorder::create(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");

        for _ in 0..2 {
            let mut session = recorder.session().unwrap();
            session.record(&sample()).unwrap();
            assert_eq!(session.finish().unwrap(), 1);
        }

        let snaps = read_snapshots(&path).unwrap();
        assert_eq!(snaps.len(), 2);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn unwritable_path_is_output_error() {
        let path = std::env::temp_dir().join("nbody-no-such-dir").join("x").join("out.dat");
        assert!(matches!(StateRecorder::create(&path), Err(SimError::Output(_))));
    }
}
