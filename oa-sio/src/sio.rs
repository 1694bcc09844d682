//! SIO multichannel recordings
//!
//! An SIO file starts with one record holding a 128-byte header, followed by
//! data records that cycle through the channels: record 1 is the first
//! block of channel 0, record 2 the first block of channel 1, and so on.
//! Samples are 16-bit integers or 32-bit floats in the byte order that makes
//! the byte-swap word read as 32677.

use crate::error::{Result, SioError};
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use ndarray::{Array2, ArrayView1, s};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;

/// Value of the byte-swap word in a correctly decoded header
pub const BYTE_SWAP: u32 = 32677;

/// Size of the header at the start of the first record
pub const HEADER_BYTES: usize = 128;

/// Byte order of a recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endian {
    #[default]
    Big,
    Little,
}

/// Sample encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    Int16,
    Float32,
}

/// Descriptors found in the file header
///
/// Serialized with the field names used by the acquisition software so the
/// `_header.json` sidecar files stay readable by existing tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SioHeader {
    /// ID number
    #[serde(rename = "ID")]
    pub id: u32,
    /// Records in the file, header record included
    #[serde(rename = "Nr")]
    pub num_records: u32,
    /// Bytes per record
    #[serde(rename = "BpR")]
    pub bytes_per_record: u32,
    /// Channels in the file
    #[serde(rename = "Nc")]
    pub num_channels: u32,
    /// Bytes per sample: 2 for integers, 4 for floats
    #[serde(rename = "BpS")]
    pub bytes_per_sample: u32,
    /// 0 for integer samples, 1 for real
    #[serde(rename = "tfReal")]
    pub tf_real: u32,
    /// Samples per channel
    #[serde(rename = "SpC")]
    pub samples_per_channel: u32,
    /// Records per channel, `ceil(Nr / Nc)`
    #[serde(rename = "RpC")]
    pub records_per_channel: u32,
    /// Samples per record, `BpR / BpS`
    #[serde(rename = "SpR")]
    pub samples_per_record: u32,
    /// File name recorded at acquisition
    pub fname: String,
    /// Comment string
    pub comment: String,
    /// Byte-swap word
    pub bs: u32,
    #[serde(skip)]
    pub endian: Endian,
}

fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches(['\0', ' '])
        .to_string()
}

impl SioHeader {
    /// Decode the header bytes, detecting the byte order
    pub fn from_bytes(bytes: &[u8; HEADER_BYTES]) -> Result<Self> {
        let endian = if BigEndian::read_u32(&bytes[28..32]) == BYTE_SWAP {
            Endian::Big
        } else if LittleEndian::read_u32(&bytes[28..32]) == BYTE_SWAP {
            Endian::Little
        } else {
            return Err(SioError::ByteSwap(LittleEndian::read_u32(&bytes[28..32])));
        };
        let word = |i: usize| match endian {
            Endian::Big => BigEndian::read_u32(&bytes[4 * i..4 * i + 4]),
            Endian::Little => LittleEndian::read_u32(&bytes[4 * i..4 * i + 4]),
        };

        let num_records = word(1);
        let bytes_per_record = word(2);
        let num_channels = word(3);
        let bytes_per_sample = word(4);
        Ok(Self {
            id: word(0),
            num_records,
            bytes_per_record,
            num_channels,
            bytes_per_sample,
            tf_real: word(5),
            samples_per_channel: word(6),
            records_per_channel: if num_channels == 0 {
                0
            } else {
                num_records.div_ceil(num_channels)
            },
            samples_per_record: bytes_per_record.checked_div(bytes_per_sample).unwrap_or(0),
            fname: text(&bytes[32..56]),
            comment: text(&bytes[56..128]),
            bs: word(7),
            endian,
        })
    }

    /// Sample encoding implied by `BpS`
    pub fn sample_format(&self) -> Option<SampleFormat> {
        match self.bytes_per_sample {
            2 => Some(SampleFormat::Int16),
            4 => Some(SampleFormat::Float32),
            _ => None,
        }
    }

    fn check_layout(&self, path: &Path) -> Result<SampleFormat> {
        let fail = |message: String| SioError::Header {
            path: path.to_path_buf(),
            message,
        };
        let format = self
            .sample_format()
            .ok_or_else(|| fail(format!("unsupported sample size {}", self.bytes_per_sample)))?;
        if self.num_channels == 0 {
            return Err(fail("no channels".to_string()));
        }
        if self.bytes_per_record == 0 || self.bytes_per_record % self.bytes_per_sample != 0 {
            return Err(fail(format!(
                "record length {} is not a whole number of {}-byte samples",
                self.bytes_per_record, self.bytes_per_sample
            )));
        }
        if (self.bytes_per_record as usize) < HEADER_BYTES {
            return Err(fail(format!(
                "record length {} cannot hold the header",
                self.bytes_per_record
            )));
        }
        Ok(format)
    }
}

/// Which part of a recording to read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadRequest {
    /// 1-based sample to start from; a full return needs it on a record boundary
    pub start_sample: usize,
    /// Samples per channel; all remaining when `None`, header only when `Some(0)`
    pub num_samples: Option<usize>,
    /// 0-based channels, all when empty
    pub channels: Vec<usize>,
}

impl Default for ReadRequest {
    fn default() -> Self {
        Self {
            start_sample: 1,
            num_samples: None,
            channels: Vec::new(),
        }
    }
}

impl ReadRequest {
    /// Read everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Header only
    pub fn header_only() -> Self {
        Self::new().samples(0)
    }

    pub fn start(mut self, start_sample: usize) -> Self {
        self.start_sample = start_sample;
        self
    }

    pub fn samples(mut self, num_samples: usize) -> Self {
        self.num_samples = Some(num_samples);
        self
    }

    pub fn channels(mut self, channels: Vec<usize>) -> Self {
        self.channels = channels;
        self
    }
}

fn read_header_from<R: Read>(reader: &mut R) -> Result<SioHeader> {
    let mut bytes = [0u8; HEADER_BYTES];
    reader.read_exact(&mut bytes)?;
    SioHeader::from_bytes(&bytes)
}

/// Read only the header of `path`
pub fn read_header<P: AsRef<Path>>(path: P) -> Result<SioHeader> {
    let mut file = File::open(path.as_ref())?;
    read_header_from(&mut file)
}

fn decode<E: ByteOrder>(format: SampleFormat, record: &[u8], out: &mut [f64]) {
    match format {
        SampleFormat::Int16 => {
            for (value, bytes) in out.iter_mut().zip(record.chunks_exact(2)) {
                *value = f64::from(E::read_i16(bytes));
            }
        }
        SampleFormat::Float32 => {
            for (value, bytes) in out.iter_mut().zip(record.chunks_exact(4)) {
                *value = f64::from(E::read_f32(bytes));
            }
        }
    }
}

/// Read samples from an SIO file
///
/// Returns the data as a `(samples, channels)` matrix, columns in the order
/// of `request.channels`, together with the header. A header-only request
/// returns an empty `(0, 0)` matrix.
pub fn read_sio<P: AsRef<Path>>(path: P, request: &ReadRequest) -> Result<(Array2<f64>, SioHeader)> {
    let path = path.as_ref();
    let mut reader = BufReader::new(File::open(path)?);
    let header = read_header_from(&mut reader)?;
    if request.num_samples == Some(0) {
        return Ok((Array2::zeros((0, 0)), header));
    }
    let format = header.check_layout(path)?;
    if request.start_sample == 0 {
        return Err(SioError::StartSample(0));
    }

    let available = (header.samples_per_channel as usize + 1).saturating_sub(request.start_sample);
    let num_samples = match request.num_samples {
        None => available,
        Some(n) if n > available => {
            log::warn!(
                "More samples requested than present in data file. Returning max num samples: {available}"
            );
            available
        }
        Some(n) => n,
    };

    let nc = header.num_channels as usize;
    let channels: Vec<usize> = if request.channels.is_empty() {
        (0..nc).collect()
    } else {
        request.channels.clone()
    };
    if let Some(&channel) = channels.iter().find(|&&c| c >= nc) {
        return Err(SioError::ChannelRange {
            channel,
            available: nc,
        });
    }
    if num_samples == 0 {
        return Ok((Array2::zeros((0, channels.len())), header));
    }

    let spr = header.samples_per_record as usize;
    let bpr = header.bytes_per_record as usize;
    let first_block = (request.start_sample - 1) / spr;
    let blocks = num_samples.div_ceil(spr);
    // The header occupies the whole first record
    let r_start = first_block * nc + 1;
    let r_total = blocks * nc;
    log::debug!(
        "{}: reading {r_total} records from record {r_start} ({spr} samples each)",
        path.display()
    );

    // Check the file holds every record before sizing buffers from the header
    let records_in_file = reader.get_ref().metadata()?.len() / bpr as u64;
    let records_needed = (r_start as u64).saturating_add(r_total as u64);
    if records_in_file < records_needed {
        return Err(SioError::ShortRead {
            expected: r_total,
            read: records_in_file.saturating_sub(r_start as u64) as usize,
        });
    }
    reader.seek(SeekFrom::Start((r_start * bpr) as u64))?;

    let mut data = Array2::<f64>::zeros((blocks * spr, channels.len()));
    let mut record = vec![0u8; bpr];
    let mut samples = vec![0.0; spr];
    for r in 0..r_total {
        reader.read_exact(&mut record).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => SioError::ShortRead {
                expected: r_total,
                read: r,
            },
            _ => SioError::Io(e),
        })?;
        let channel = r % nc;
        if !channels.contains(&channel) {
            continue;
        }
        match header.endian {
            Endian::Big => decode::<BigEndian>(format, &record, &mut samples),
            Endian::Little => decode::<LittleEndian>(format, &record, &mut samples),
        }
        let row = (r / nc) * spr;
        for (col, _) in channels.iter().enumerate().filter(|(_, c)| **c == channel) {
            data.slice_mut(s![row..row + spr, col])
                .assign(&ArrayView1::from(&samples[..]));
        }
    }

    let trim = (request.start_sample - 1) % spr;
    let returned = data.nrows().saturating_sub(trim);
    if returned < num_samples {
        return Err(SioError::Misaligned {
            requested: num_samples,
            returned,
            start: request.start_sample,
            samples_per_record: spr,
        });
    }
    let data = data.slice(s![trim..trim + num_samples, ..]).to_owned();
    Ok((data, header))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes<E: ByteOrder>() -> [u8; HEADER_BYTES] {
        let mut bytes = [0u8; HEADER_BYTES];
        for (i, v) in [7u32, 9, 256, 4, 2, 0, 512, BYTE_SWAP].iter().enumerate() {
            E::write_u32(&mut bytes[4 * i..4 * i + 4], *v);
        }
        bytes[32..40].copy_from_slice(b"test.sio");
        bytes[56..63].copy_from_slice(b"shallow");
        bytes
    }

    #[test]
    fn test_header_big_endian() {
        let header = SioHeader::from_bytes(&header_bytes::<BigEndian>()).unwrap();
        assert_eq!(header.endian, Endian::Big);
        assert_eq!(header.id, 7);
        assert_eq!(header.num_channels, 4);
        assert_eq!(header.samples_per_channel, 512);
        assert_eq!(header.records_per_channel, 3);
        assert_eq!(header.samples_per_record, 128);
        assert_eq!(header.fname, "test.sio");
        assert_eq!(header.comment, "shallow");
        assert_eq!(header.bs, BYTE_SWAP);
        assert_eq!(header.sample_format(), Some(SampleFormat::Int16));
    }

    #[test]
    fn test_header_little_endian() {
        let header = SioHeader::from_bytes(&header_bytes::<LittleEndian>()).unwrap();
        assert_eq!(header.endian, Endian::Little);
        assert_eq!(header.bytes_per_record, 256);
    }

    #[test]
    fn test_bad_byte_swap_word() {
        let mut bytes = header_bytes::<LittleEndian>();
        LittleEndian::write_u32(&mut bytes[28..32], 12);
        let err = SioHeader::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, SioError::ByteSwap(12)));
    }

    #[test]
    fn test_zero_channels_have_no_records() {
        let mut bytes = header_bytes::<BigEndian>();
        BigEndian::write_u32(&mut bytes[12..16], 0);
        let header = SioHeader::from_bytes(&bytes).unwrap();
        assert_eq!(header.records_per_channel, 0);
        assert!(header.check_layout(Path::new("x.sio")).is_err());
    }

    #[test]
    fn test_json_field_names() {
        let header = SioHeader::from_bytes(&header_bytes::<BigEndian>()).unwrap();
        let json = serde_json::to_value(&header).unwrap();
        assert_eq!(json["Nc"], 4);
        assert_eq!(json["SpR"], 128);
        assert_eq!(json["tfReal"], 0);
        assert!(json.get("endian").is_none());
    }

    #[test]
    fn test_request_builder() {
        let request = ReadRequest::new().start(129).samples(10).channels(vec![2]);
        assert_eq!(request.start_sample, 129);
        assert_eq!(request.num_samples, Some(10));
        assert_eq!(ReadRequest::header_only().num_samples, Some(0));
    }
}
