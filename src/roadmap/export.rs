//! Path export to plain listings and instrument control scripts.
//!
//! Every exporter writes one command or row per path vertex, with `a4` as
//! the first and `a2` as the second angle, both in degrees.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{ExportError, Result};
use crate::math::Point2;

/// Fixed wavevector written ahead of the path: `(k, k_is_kf)`.
pub type KFix = (f64, bool);

/// Options shared by all exporters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportSettings {
    /// Digits after the decimal point.
    pub precision: usize,
    pub k_fix: Option<KFix>,
    /// Scattering senses of monochromator, sample and analyser.
    pub senses: [f64; 3],
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            precision: 6,
            k_fix: None,
            senses: [1.0; 3],
        }
    }
}

impl ExportSettings {
    #[must_use]
    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    #[must_use]
    pub fn with_k_fix(mut self, k: f64, is_kf: bool) -> Self {
        self.k_fix = Some((k, is_kf));
        self
    }

    #[must_use]
    pub fn with_senses(mut self, senses: [f64; 3]) -> Self {
        self.senses = senses;
        self
    }

    fn width(&self) -> usize {
        self.precision * 2
    }

    fn kf_fixed(&self) -> bool {
        self.k_fix.is_none_or(|(_, is_kf)| is_kf)
    }
}

/// Writes a path of `(a4, a2)` vertices in some output format.
pub trait PathsExporter {
    /// Encodes `vertices` into `out`.
    ///
    /// # Errors
    ///
    /// Any error of the underlying writer.
    fn write(&self, vertices: &[Point2], out: &mut dyn Write) -> io::Result<()>;

    /// Encodes a non-empty path.
    ///
    /// # Errors
    ///
    /// `ExportError::InvalidPath` for an empty path, `ExportError::Io` if
    /// writing fails.
    fn export(&self, vertices: &[Point2], out: &mut dyn Write) -> Result<()> {
        if vertices.is_empty() {
            return Err(ExportError::InvalidPath.into());
        }
        self.write(vertices, out).map_err(ExportError::from)?;
        out.flush().map_err(ExportError::from)?;
        Ok(())
    }

    /// Creates or truncates `path` and exports into it.
    ///
    /// # Errors
    ///
    /// As [`export`](Self::export); also `ExportError::Io` if the file
    /// cannot be created.
    fn export_to_file(&self, vertices: &[Point2], path: &Path) -> Result<()> {
        if vertices.is_empty() {
            return Err(ExportError::InvalidPath.into());
        }
        let file = File::create(path).map_err(ExportError::from)?;
        let mut out = BufWriter::new(file);
        self.export(vertices, &mut out)?;
        tracing::info!(path = %path.display(), vertices = vertices.len(), "path exported");
        Ok(())
    }
}

/// Two right-aligned columns under a `#` header.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawExporter {
    pub settings: ExportSettings,
}

impl RawExporter {
    #[must_use]
    pub fn new(settings: ExportSettings) -> Self {
        Self { settings }
    }
}

impl PathsExporter for RawExporter {
    fn write(&self, vertices: &[Point2], out: &mut dyn Write) -> io::Result<()> {
        let s = &self.settings;
        let (w, p) = (s.width(), s.precision);
        if let Some((k, is_kf)) = s.k_fix {
            writeln!(out, "#")?;
            writeln!(out, "# k_fix = {k}")?;
            writeln!(out, "# k_fix_is_kf = {is_kf}")?;
            writeln!(out, "#")?;
        }
        writeln!(
            out,
            "# {:>w0$} {:>w$}",
            "a4 (deg)",
            "a2 (deg)",
            w0 = w.saturating_sub(2)
        )?;
        for v in vertices {
            writeln!(out, "{:>w$.p$} {:>w$.p$}", v.x, v.y)?;
        }
        Ok(())
    }
}

/// `dr a4 .. a2 ..` drive commands.
#[derive(Debug, Clone, Copy, Default)]
pub struct NomadExporter {
    pub settings: ExportSettings,
}

impl NomadExporter {
    #[must_use]
    pub fn new(settings: ExportSettings) -> Self {
        Self { settings }
    }
}

impl PathsExporter for NomadExporter {
    fn write(&self, vertices: &[Point2], out: &mut dyn Write) -> io::Result<()> {
        let s = &self.settings;
        let (w, p) = (s.width(), s.precision);
        if let Some((k, is_kf)) = s.k_fix {
            writeln!(out, "dr {} {k}", if is_kf { "kf" } else { "ki" })?;
            writeln!(out)?;
        }
        for v in vertices {
            writeln!(out, "dr a4 {:<w$.p$} a2 {:<w$.p$}", v.x, v.y)?;
        }
        Ok(())
    }
}

/// `maw(stt, .., mtt, ..)` script with air and backlash handling around the path.
///
/// With a fixed `ki` the analyser axis `att` replaces the monochromator
/// axis `mtt`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NicosExporter {
    pub settings: ExportSettings,
}

impl NicosExporter {
    #[must_use]
    pub fn new(settings: ExportSettings) -> Self {
        Self { settings }
    }
}

impl PathsExporter for NicosExporter {
    fn write(&self, vertices: &[Point2], out: &mut dyn Write) -> io::Result<()> {
        let s = &self.settings;
        let p = s.precision;
        let kf_fixed = s.kf_fixed();
        let (air, axis, sense) = if kf_fixed {
            ("air_mono", "mtt", s.senses[0])
        } else {
            ("air_ana", "att", s.senses[2])
        };

        if let Some((k, _)) = s.k_fix {
            writeln!(out, "{}({k})", if kf_fixed { "kf" } else { "ki" })?;
        }

        writeln!(out, "\n# turn on air for entire path")?;
        writeln!(out, "move(\"air_sample\", 1)")?;
        writeln!(out, "move(\"{air}\", 1)")?;

        writeln!(out, "\n# disable motor backlash correction")?;
        writeln!(out, "stt_maxtries = stt.maxtries")?;
        writeln!(out, "stt.maxtries = 0")?;
        writeln!(out, "{axis}_maxtries = {axis}.maxtries")?;
        writeln!(out, "{axis}.maxtries = 0")?;

        writeln!(out, "\n# path vertices")?;
        for v in vertices {
            writeln!(
                out,
                "maw(stt, {:.p$}, {axis}, {:.p$})",
                v.x * s.senses[1],
                v.y * sense
            )?;
        }

        writeln!(out, "\n# turn off air")?;
        writeln!(out, "move(\"air_sample\", 0)")?;
        writeln!(out, "move(\"{air}\", 0)")?;

        writeln!(out, "\n# restore motor backlash correction")?;
        writeln!(out, "stt.maxtries = stt_maxtries")?;
        writeln!(out, "{axis}.maxtries = {axis}_maxtries")?;
        Ok(())
    }
}

/// Reads vertices written by [`RawExporter`]. Blank lines and `#` comments
/// are skipped; every other line holds `a4 a2`.
///
/// # Errors
///
/// `ExportError::Parse` with the 1-based line number for a malformed row,
/// `ExportError::Io` if reading fails.
pub fn read_raw_path(input: impl BufRead) -> Result<Vec<Point2>> {
    let mut vertices = Vec::new();
    for (i, line) in input.lines().enumerate() {
        let line = line.map_err(ExportError::from)?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let parse_error = |message: String| ExportError::Parse {
            line: i + 1,
            message,
        };
        let values = line
            .split_whitespace()
            .map(str::parse::<f64>)
            .collect::<std::result::Result<Vec<f64>, _>>()
            .map_err(|e| parse_error(e.to_string()))?;
        match values.as_slice() {
            [a4, a2] => vertices.push(Point2::new(*a4, *a2)),
            other => {
                return Err(parse_error(format!("expected 2 columns, found {}", other.len())).into())
            }
        }
    }
    Ok(vertices)
}

/// [`read_raw_path`] from a file.
///
/// # Errors
///
/// As [`read_raw_path`]; also `ExportError::Io` if the file cannot be opened.
pub fn read_raw_path_file(path: &Path) -> Result<Vec<Point2>> {
    let file = File::open(path).map_err(ExportError::from)?;
    read_raw_path(BufReader::new(file))
}
