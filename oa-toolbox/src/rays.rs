//! BELLHOP ray files
//!
//! `<title>.ray` is a text file: a header of seven lines (quoted title,
//! frequency, source counts, beam counts, top depth, bottom depth, quoted
//! coordinate type), then for every source depth and launch angle the
//! angle, a line `nsteps ntop nbot` and `nsteps` coordinate rows.

use crate::error::{Result, ToolboxError};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

const FILE: &str = ".ray";

/// One traced ray
#[derive(Debug, Clone, PartialEq)]
pub struct Ray {
    /// Range of each step [m]
    pub r: Vec<f64>,
    /// Depth of each step [m]
    pub z: Vec<f64>,
    /// Launch angle [degrees]
    pub launch_angle: f64,
    /// Number of surface reflections
    pub num_top_bounce: usize,
    /// Number of bottom reflections
    pub num_bot_bounce: usize,
}

/// Contents of a ray file
#[derive(Debug, Clone, PartialEq)]
pub struct RayFile {
    /// Run title
    pub title: String,
    /// Frequency [Hz]
    pub freq: f64,
    /// Number of source x coordinates
    pub num_sx: usize,
    /// Number of source y coordinates
    pub num_sy: usize,
    /// Number of source depths
    pub num_sz: usize,
    /// Number of beams per source
    pub num_beams: usize,
    /// Top boundary depth [m]
    pub depth_top: f64,
    /// Bottom boundary depth [m]
    pub depth_bot: f64,
    /// Coordinate type, `rz`
    pub coordinates: String,
    /// Ray fans, one per source depth
    pub sources: Vec<Vec<Ray>>,
}

impl RayFile {
    /// Total number of rays in the file
    pub fn num_rays(&self) -> usize {
        self.sources.iter().map(Vec::len).sum()
    }
}

/// Read `<path>`
pub fn read_rays<P: AsRef<Path>>(path: P) -> Result<RayFile> {
    let path = path.as_ref();
    log::debug!("reading rays from {}", path.display());
    parse_rays(BufReader::new(File::open(path)?))
}

/// Parse a ray file
///
/// A blank line where a launch angle is expected ends the file early; the
/// rays read so far are kept.
pub fn parse_rays<R: BufRead>(reader: R) -> Result<RayFile> {
    let mut lines = Lines::new(reader);

    let title = unquote(&lines.required("title")?);
    let freq = parse(&lines.required("frequency")?, "frequency")?;
    let counts = numbers::<usize>(&lines.required("source counts")?, "source counts")?;
    let beams = numbers::<usize>(&lines.required("beam counts")?, "beam counts")?;
    let depth_top = parse(&lines.required("top depth")?, "top depth")?;
    let depth_bot = parse(&lines.required("bottom depth")?, "bottom depth")?;
    let coordinates = unquote(&lines.required("coordinate type")?);

    let [num_sx, num_sy, num_sz] = counts[..] else {
        return Err(ToolboxError::format(FILE, format!("expected 3 source counts, found {}", counts.len())));
    };
    let num_beams = *beams
        .first()
        .ok_or_else(|| ToolboxError::format(FILE, "missing beam count"))?;
    if coordinates != "rz" {
        return Err(ToolboxError::Unsupported(format!("`{coordinates}` ray coordinates")));
    }

    let mut sources = Vec::with_capacity(num_sz);
    'sources: for _ in 0..num_sz {
        let mut rays = Vec::with_capacity(num_beams);
        for _ in 0..num_beams {
            let angle = match lines.next()? {
                Some(line) if !line.is_empty() => line,
                _ => {
                    sources.push(rays);
                    break 'sources;
                }
            };
            let launch_angle = parse(&angle, "launch angle")?;
            let meta = numbers::<usize>(&lines.required("ray header")?, "ray header")?;
            let [num_steps, num_top_bounce, num_bot_bounce] = meta[..] else {
                return Err(ToolboxError::format(FILE, "ray header needs `nsteps ntop nbot`"));
            };
            let mut r = Vec::with_capacity(num_steps);
            let mut z = Vec::with_capacity(num_steps);
            for _ in 0..num_steps {
                let point = numbers::<f64>(&lines.required("ray step")?, "ray step")?;
                let [ri, zi] = point[..] else {
                    return Err(ToolboxError::format(FILE, "ray step needs two coordinates"));
                };
                r.push(ri);
                z.push(zi);
            }
            rays.push(Ray {
                r,
                z,
                launch_angle,
                num_top_bounce,
                num_bot_bounce,
            });
        }
        sources.push(rays);
    }

    Ok(RayFile {
        title,
        freq,
        num_sx,
        num_sy,
        num_sz,
        num_beams,
        depth_top,
        depth_bot,
        coordinates,
        sources,
    })
}

struct Lines<R> {
    inner: R,
    buf: String,
}

impl<R: BufRead> Lines<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            buf: String::new(),
        }
    }

    /// Next trimmed line, `None` at end of file
    fn next(&mut self) -> Result<Option<String>> {
        self.buf.clear();
        if self.inner.read_line(&mut self.buf)? == 0 {
            return Ok(None);
        }
        Ok(Some(self.buf.trim().to_string()))
    }

    fn required(&mut self, what: &str) -> Result<String> {
        self.next()?
            .ok_or_else(|| ToolboxError::format(FILE, format!("file ends before {what}")))
    }
}

fn unquote(line: &str) -> String {
    line.trim_matches('\'').trim().to_string()
}

fn parse<T: FromStr>(token: &str, what: &str) -> Result<T> {
    token
        .parse()
        .map_err(|_| ToolboxError::format(FILE, format!("invalid {what} `{token}`")))
}

fn numbers<T: FromStr>(line: &str, what: &str) -> Result<Vec<T>> {
    line.split_whitespace().map(|token| parse(token, what)).collect()
}
