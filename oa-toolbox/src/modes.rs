//! KRAKEN mode files
//!
//! KRAKEN writes its modes to `<title>.mod`, a little-endian direct-access
//! file made of fixed-length records. The first word holds the record length
//! in 4-byte words; the header records describe the media, frequencies and
//! sample depths, then each frequency contributes a block of records:
//!
//! | record        | content                                      |
//! |---------------|----------------------------------------------|
//! | `i`           | number of modes `M`                          |
//! | `i + 1`       | top and bottom halfspaces                    |
//! | `i + 2 + j`   | shape of mode `j` (`nmat` complex values)    |
//! | `i + 2 + M`   | horizontal wavenumbers (`M` complex values)  |

use crate::error::{Result, ToolboxError};
use byteorder::{LittleEndian, ReadBytesExt};
use ndarray::{Array1, Array2, s};
use num_complex::Complex64;
use oa_common::{Receiver, Source};
use oa_signal::pressure_field;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

const FILE: &str = ".mod";
const FIRST_FREQUENCY_RECORD: i64 = 5;

/// Halfspace description stored with each frequency
#[derive(Debug, Clone, PartialEq)]
pub struct ModesHalfspace {
    /// Boundary condition character
    pub bc: char,
    /// Complex compressional speed [m/s]
    pub c_p: Complex64,
    /// Complex shear speed [m/s]
    pub c_s: Complex64,
    /// Density [g/cm³]
    pub rho: f64,
    /// Depth [m]
    pub z: f64,
}

/// Modes read from a `.mod` file at one frequency
#[derive(Debug, Clone)]
pub struct Modes {
    /// Title stored by KRAKEN
    pub title: String,
    /// Number of frequencies in the file
    pub nfreq: usize,
    /// Number of media
    pub nmedia: usize,
    /// Number of sample depths
    pub ntot: usize,
    /// Number of values per mode shape
    pub nmat: usize,
    /// Mesh points per medium
    pub mesh: Vec<u32>,
    /// Material of each medium (`ACOUSTIC`, `ELASTIC`)
    pub material: Vec<String>,
    /// Upper interface depth of each medium [m]
    pub layer_depth: Vec<f64>,
    /// Density of each medium [g/cm³]
    pub layer_rho: Vec<f64>,
    /// Frequencies in the file [Hz]
    pub frequencies: Vec<f64>,
    /// Frequency the modes belong to [Hz]
    pub freq: f64,
    /// Sample depths [m]
    pub z: Vec<f64>,
    /// Number of modes computed at `freq`
    pub m: usize,
    /// Wavenumbers of the selected modes
    pub k: Array1<Complex64>,
    /// Shapes of the selected modes (`nmat` × selected)
    pub phi: Array2<Complex64>,
    /// Upper halfspace
    pub top: ModesHalfspace,
    /// Lower halfspace
    pub bottom: ModesHalfspace,
}

impl Modes {
    /// Number of selected modes
    pub fn len(&self) -> usize {
        self.k.len()
    }

    /// True if no mode was read
    pub fn is_empty(&self) -> bool {
        self.k.is_empty()
    }

    /// Index of the sample depth nearest `depth`
    pub fn nearest_row(&self, depth: f64) -> usize {
        nearest(&self.z, depth)
    }

    /// Mode shapes at the sample depths nearest `depths` (depths × modes)
    pub fn shapes_at(&self, depths: &[f64]) -> Result<Array2<Complex64>> {
        let mut out = Array2::zeros((depths.len(), self.len()));
        for (i, &depth) in depths.iter().enumerate() {
            let row = self.nearest_row(depth);
            if row >= self.phi.nrows() {
                return Err(ToolboxError::format(
                    FILE,
                    format!("depth row {row} beyond {} mode shape values", self.phi.nrows()),
                ));
            }
            out.row_mut(i).assign(&self.phi.row(row));
        }
        Ok(out)
    }

    /// Keep only the first `n` modes
    pub fn truncate(&mut self, n: usize) {
        let n = n.min(self.len());
        self.k = self.k.slice(s![..n]).to_owned();
        self.phi = self.phi.slice(s![.., ..n]).to_owned();
    }

    /// Complex pressure (receiver depth × range)
    ///
    /// The source term uses the sample depth nearest the first source depth
    /// and each receiver depth uses its own nearest sample depth.
    pub fn field(&self, source: &Source, receiver: &Receiver) -> Result<Array2<Complex64>> {
        let z_src = source.z.first().copied().unwrap_or_default();
        let phi_src = self.shapes_at(&[z_src])?.row(0).to_owned();
        let phi_rec = self.shapes_at(&receiver.z)?;
        let r = receiver.r_meters().to_vec();
        Ok(pressure_field(
            &phi_src,
            &phi_rec,
            &self.k,
            &r,
            receiver.r_offsets.as_ref(),
        )?)
    }
}

/// Mode amplitudes for a two-environment adiabatic field
///
/// Both sets are cut to the smaller mode count. Returns the source-side
/// shapes at the source depth, the receiver-side shapes at the receiver
/// depths and the mean of the two wavenumber sets.
pub fn adiabatic_modes(
    src: &Modes,
    source: &Source,
    rec: &Modes,
    receiver: &Receiver,
) -> Result<(Array1<Complex64>, Array2<Complex64>, Array1<Complex64>)> {
    let m = src.len().min(rec.len());
    if m == 0 {
        return Err(ToolboxError::format(FILE, "adiabatic run needs at least one mode on each side"));
    }
    let z_src = source.z.first().copied().unwrap_or_default();
    let phi_src = src.shapes_at(&[z_src])?.slice(s![0, ..m]).to_owned();
    let phi_rec = rec.shapes_at(&receiver.z)?.slice(s![.., ..m]).to_owned();
    let k = (&src.k.slice(s![..m]) + &rec.k.slice(s![..m])) / Complex64::new(2.0, 0.0);
    Ok((phi_src, phi_rec, k))
}

/// Read the modes at the frequency nearest `freq`
///
/// `selection` picks a subset of mode indices; every mode is read when it is
/// `None`.
pub fn read_modes<P: AsRef<Path>>(path: P, freq: f64, selection: Option<&[usize]>) -> Result<Modes> {
    let path = path.as_ref();
    log::debug!("reading modes from {}", path.display());
    let mut reader = RecordReader::new(BufReader::new(File::open(path)?))?;
    reader.read_modes(path, freq, selection)
}

/// Records to advance past one frequency holding `m` modes
///
/// The division truncates toward zero: a frequency without modes still
/// holds its count, halfspace and (empty) wavenumber records.
pub(crate) fn frequency_stride(m: i64, lrecl: i64) -> i64 {
    3 + m + (8 * m - 1) / lrecl
}

fn nearest(values: &[f64], target: f64) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::INFINITY), |(best, dist), (i, &v)| {
            let d = (v - target).abs();
            if d < dist { (i, d) } else { (best, dist) }
        })
        .0
}

fn truncated(e: io::Error) -> ToolboxError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        ToolboxError::format(FILE, "file ends inside a record")
    } else {
        ToolboxError::Io(e)
    }
}

struct RecordReader<R> {
    inner: R,
    lrecl: i64,
}

impl<R: Read + Seek> RecordReader<R> {
    fn new(mut inner: R) -> Result<Self> {
        let words = inner.read_u32::<LittleEndian>().map_err(truncated)?;
        if words == 0 {
            return Err(ToolboxError::format(FILE, "record length is zero"));
        }
        Ok(Self {
            inner,
            lrecl: 4 * i64::from(words),
        })
    }

    fn seek(&mut self, record: i64) -> Result<()> {
        let offset = u64::try_from(record * self.lrecl)
            .map_err(|_| ToolboxError::format(FILE, format!("negative record {record}")))?;
        self.inner.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    fn u32(&mut self) -> Result<u32> {
        self.inner.read_u32::<LittleEndian>().map_err(truncated)
    }

    fn i32(&mut self) -> Result<i32> {
        self.inner.read_i32::<LittleEndian>().map_err(truncated)
    }

    fn f32(&mut self) -> Result<f64> {
        Ok(f64::from(self.inner.read_f32::<LittleEndian>().map_err(truncated)?))
    }

    fn f64(&mut self) -> Result<f64> {
        self.inner.read_f64::<LittleEndian>().map_err(truncated)
    }

    fn complex(&mut self) -> Result<Complex64> {
        let re = self.f32()?;
        let im = self.f32()?;
        Ok(Complex64::new(re, im))
    }

    fn text(&mut self, len: usize) -> Result<String> {
        let mut buf = vec![0u8; len];
        self.inner.read_exact(&mut buf).map_err(truncated)?;
        Ok(String::from_utf8_lossy(&buf).trim().to_string())
    }

    fn halfspace(&mut self) -> Result<ModesHalfspace> {
        let bc = char::from(self.inner.read_u8().map_err(truncated)?);
        let c_p = self.complex()?;
        let c_s = self.complex()?;
        let rho = self.f32()?;
        let z = self.f32()?;
        Ok(ModesHalfspace { bc, c_p, c_s, rho, z })
    }

    fn count(&mut self, what: &str) -> Result<usize> {
        let n = self.i32()?;
        usize::try_from(n).map_err(|_| ToolboxError::format(FILE, format!("negative {what} ({n})")))
    }

    fn read_modes(&mut self, path: &Path, freq: f64, selection: Option<&[usize]>) -> Result<Modes> {
        self.inner.seek(SeekFrom::Start(4))?;
        let title = self.text(80)?;
        let nfreq = self.u32()? as usize;
        let nmedia = self.u32()? as usize;
        let ntot = self.i32()?;
        if ntot < 0 {
            return Err(ToolboxError::NoModes(PathBuf::from(path)));
        }
        let ntot = ntot as usize;
        let nmat = self.count("nmat")?;
        if nfreq == 0 {
            return Err(ToolboxError::format(FILE, "no frequencies"));
        }

        self.seek(1)?;
        let mut mesh = Vec::with_capacity(nmedia);
        let mut material = Vec::with_capacity(nmedia);
        for _ in 0..nmedia {
            mesh.push(self.u32()?);
            material.push(self.text(8)?);
        }

        self.seek(2)?;
        let mut layer_depth = Vec::with_capacity(nmedia);
        let mut layer_rho = Vec::with_capacity(nmedia);
        for _ in 0..nmedia {
            layer_depth.push(self.f32()?);
            layer_rho.push(self.f32()?);
        }

        self.seek(3)?;
        let frequencies = (0..nfreq).map(|_| self.f64()).collect::<Result<Vec<_>>>()?;

        self.seek(4)?;
        let z = (0..ntot).map(|_| self.f32()).collect::<Result<Vec<_>>>()?;

        let ifreq = nearest(&frequencies, freq);
        let mut record = FIRST_FREQUENCY_RECORD;
        for _ in 0..ifreq {
            self.seek(record)?;
            let m = self.count("mode count")?;
            record += frequency_stride(m as i64, self.lrecl);
        }
        self.seek(record)?;
        let m = self.count("mode count")?;

        let all: Vec<usize>;
        let selection = match selection {
            Some(selection) => selection,
            None => {
                all = (0..m).collect();
                &all
            }
        };
        if let Some(&index) = selection.iter().find(|&&j| j >= m) {
            return Err(ToolboxError::ModeIndex { index, available: m });
        }

        self.seek(record + 1)?;
        let top = self.halfspace()?;
        let bottom = self.halfspace()?;

        let mut phi = Array2::zeros((nmat, selection.len()));
        let mut k = Array1::zeros(selection.len());
        if m > 0 {
            for (col, &j) in selection.iter().enumerate() {
                self.seek(record + 2 + j as i64)?;
                for row in 0..nmat {
                    phi[[row, col]] = self.complex()?;
                }
            }
            self.seek(record + 2 + m as i64)?;
            let all_k = (0..m).map(|_| self.complex()).collect::<Result<Vec<_>>>()?;
            for (col, &j) in selection.iter().enumerate() {
                k[col] = all_k[j];
            }
        }
        log::debug!(
            "{} of {m} modes at {:.2} Hz from `{title}`",
            selection.len(),
            frequencies[ifreq]
        );

        Ok(Modes {
            title,
            nfreq,
            nmedia,
            ntot,
            nmat,
            mesh,
            material,
            layer_depth,
            layer_rho,
            freq: frequencies[ifreq],
            frequencies,
            z,
            m,
            k,
            phi,
            top,
            bottom,
        })
    }
}
