//! Minimal `.npy` reader and writer for real and complex arrays

use crate::error::{CommonError, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use ndarray::{Array, ArrayBase, Data, Dimension, IxDyn, ShapeBuilder};
use num_complex::Complex64;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

const MAGIC: &[u8] = b"\x93NUMPY";

/// Element types that can be written to a `.npy` file
pub trait NpyElement: Copy {
    /// numpy dtype descriptor
    const DESCR: &'static str;

    /// Write one element in little-endian order
    fn write_le<W: Write>(&self, writer: &mut W) -> std::io::Result<()>;

    /// Read one little-endian element
    fn read_le<R: Read>(reader: &mut R) -> std::io::Result<Self>;
}

impl NpyElement for f64 {
    const DESCR: &'static str = "<f8";

    fn write_le<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_f64::<LittleEndian>(*self)
    }

    fn read_le<R: Read>(reader: &mut R) -> std::io::Result<Self> {
        reader.read_f64::<LittleEndian>()
    }
}

impl NpyElement for Complex64 {
    const DESCR: &'static str = "<c16";

    fn write_le<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_f64::<LittleEndian>(self.re)?;
        writer.write_f64::<LittleEndian>(self.im)
    }

    fn read_le<R: Read>(reader: &mut R) -> std::io::Result<Self> {
        let re = reader.read_f64::<LittleEndian>()?;
        let im = reader.read_f64::<LittleEndian>()?;
        Ok(Complex64::new(re, im))
    }
}

fn header(descr: &str, shape: &[usize]) -> Vec<u8> {
    let shape = match shape {
        [n] => format!("({n},)"),
        dims => format!(
            "({})",
            dims.iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    };
    let mut dict = format!("{{'descr': '{descr}', 'fortran_order': False, 'shape': {shape}, }}");
    // magic (6) + version (2) + header length (2) + dict + newline must be a multiple of 64
    let unpadded = MAGIC.len() + 4 + dict.len() + 1;
    let padding = (64 - unpadded % 64) % 64;
    dict.push_str(&" ".repeat(padding));
    dict.push('\n');
    dict.into_bytes()
}

/// Write an array in C order to any writer
pub fn write_npy_to<W, S, D>(writer: &mut W, array: &ArrayBase<S, D>) -> Result<()>
where
    W: Write,
    S: Data,
    S::Elem: NpyElement,
    D: Dimension,
{
    let dict = header(S::Elem::DESCR, array.shape());
    writer.write_all(MAGIC)?;
    writer.write_all(&[1, 0])?;
    writer.write_u16::<LittleEndian>(dict.len() as u16)?;
    writer.write_all(&dict)?;
    // Logical iteration order is row-major regardless of memory layout
    for value in array.iter() {
        value.write_le(writer)?;
    }
    Ok(())
}

/// Write an array to a `.npy` file
pub fn write_npy<P, S, D>(path: P, array: &ArrayBase<S, D>) -> Result<()>
where
    P: AsRef<Path>,
    S: Data,
    S::Elem: NpyElement,
    D: Dimension,
{
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    write_npy_to(&mut writer, array)?;
    writer.flush()?;
    log::debug!("Wrote {}", path.as_ref().display());
    Ok(())
}

/// Value of `'key':` in a header dictionary, up to the next top-level comma
fn dict_value<'a>(dict: &'a str, key: &str) -> Result<&'a str> {
    let pattern = format!("'{key}':");
    let start = dict
        .find(&pattern)
        .map(|i| i + pattern.len())
        .ok_or_else(|| CommonError::Npy(format!("header has no `{key}`")))?;
    let rest = dict[start..].trim_start();
    let end = if rest.starts_with('(') {
        rest.find(')').map(|i| i + 1)
    } else {
        rest.find([',', '}'])
    };
    Ok(rest[..end.unwrap_or(rest.len())].trim())
}

fn parse_shape(value: &str) -> Result<Vec<usize>> {
    value
        .trim_start_matches('(')
        .trim_end_matches(')')
        .split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(|d| {
            d.parse::<usize>()
                .map_err(|_| CommonError::Npy(format!("bad dimension `{d}` in shape {value}")))
        })
        .collect()
}

/// Read an array of known element type and dimensionality from any reader
pub fn read_npy_from<R, T, D>(reader: &mut R) -> Result<Array<T, D>>
where
    R: Read,
    T: NpyElement,
    D: Dimension,
{
    let mut magic = [0u8; 6];
    reader.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(CommonError::Npy("not a .npy file".to_string()));
    }
    let major = reader.read_u8()?;
    let _minor = reader.read_u8()?;
    let header_len = match major {
        1 => reader.read_u16::<LittleEndian>()? as usize,
        2 | 3 => reader.read_u32::<LittleEndian>()? as usize,
        v => return Err(CommonError::Npy(format!("unsupported format version {v}"))),
    };
    let mut dict = vec![0u8; header_len];
    reader.read_exact(&mut dict)?;
    let dict = String::from_utf8_lossy(&dict);

    let descr = dict_value(&dict, "descr")?.trim_matches('\'');
    if descr != T::DESCR {
        return Err(CommonError::Npy(format!(
            "element type {descr}, expected {}",
            T::DESCR
        )));
    }
    let fortran = dict_value(&dict, "fortran_order")? == "True";
    let shape = parse_shape(dict_value(&dict, "shape")?)?;

    let count: usize = shape.iter().product();
    let values = (0..count)
        .map(|_| T::read_le(reader))
        .collect::<std::io::Result<Vec<T>>>()?;
    let array = Array::from_shape_vec(IxDyn(&shape).set_f(fortran), values)
        .map_err(|e| CommonError::Npy(e.to_string()))?;
    array
        .into_dimensionality::<D>()
        .map_err(|_| CommonError::Npy(format!("array has {} dimensions", shape.len())))
}

/// Read an array from a `.npy` file
pub fn read_npy<P, T, D>(path: P) -> Result<Array<T, D>>
where
    P: AsRef<Path>,
    T: NpyElement,
    D: Dimension,
{
    let mut reader = BufReader::new(File::open(path.as_ref())?);
    let array = read_npy_from(&mut reader)?;
    log::debug!("Read {}", path.as_ref().display());
    Ok(array)
}
