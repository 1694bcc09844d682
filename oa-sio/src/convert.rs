//! Batch conversion of SIO recordings to `.npy`

use crate::error::{Result, SioError};
use crate::sio::{ReadRequest, read_sio};
use ndarray::{Array2, Axis};
use oa_common::write_npy;
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Subdirectory of the destination that receives the converted files
pub const NPY_DIR: &str = "npy";

/// How to convert a batch of recordings
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Channels to drop before saving
    pub channels_to_remove: Vec<usize>,
    /// Root for the output; each file's own directory when `None`
    pub destination: Option<PathBuf>,
    /// Files converted concurrently
    pub max_workers: usize,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            channels_to_remove: Vec::new(),
            destination: None,
            max_workers: 8,
        }
    }
}

/// Outcome of converting one file
#[derive(Debug)]
pub struct Conversion {
    pub source: PathBuf,
    /// Path of the written `.npy` file
    pub result: Result<PathBuf>,
}

/// Drop the columns listed in `remove`
pub fn remove_channels(data: &Array2<f64>, remove: &[usize]) -> Result<Array2<f64>> {
    if let Some(&channel) = remove.iter().find(|&&c| c >= data.ncols()) {
        return Err(SioError::ChannelRange {
            channel,
            available: data.ncols(),
        });
    }
    let keep: Vec<usize> = (0..data.ncols()).filter(|c| !remove.contains(c)).collect();
    Ok(data.select(Axis(1), &keep))
}

/// Convert one file
///
/// Writes `<root>/npy/<file name>.npy` with the `(samples, channels)` data and
/// `<root>/npy/<file name>_header.json` with the header.
pub fn convert_file(path: &Path, options: &ConvertOptions) -> Result<PathBuf> {
    let name = path
        .file_name()
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} has no file name", path.display()),
            )
        })?
        .to_string_lossy()
        .into_owned();

    let (data, header) = read_sio(path, &ReadRequest::new())?;
    let data = remove_channels(&data, &options.channels_to_remove)?;

    let root = match &options.destination {
        Some(dir) => dir.clone(),
        None => path.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    let savepath = root.join(NPY_DIR);
    fs::create_dir_all(&savepath)?;

    let npy = savepath.join(format!("{name}.npy"));
    write_npy(&npy, &data)?;
    fs::write(
        savepath.join(format!("{name}_header.json")),
        serde_json::to_string_pretty(&header)?,
    )?;
    log::info!("{} saved to disk in .npy format.", path.display());
    Ok(npy)
}

/// Convert every file in `files`, sorted by path, on a pool of
/// `options.max_workers` threads
///
/// A failing file does not stop the batch; each outcome is reported.
pub fn convert_files(files: &[PathBuf], options: &ConvertOptions) -> Result<Vec<Conversion>> {
    let mut files = files.to_vec();
    files.sort();
    log::info!(
        "Starting pool with {} workers for {} files.",
        options.max_workers,
        files.len()
    );
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.max_workers.max(1))
        .build()
        .map_err(|e| io::Error::other(format!("failed to build worker pool: {e}")))?;
    Ok(pool.install(|| {
        files
            .par_iter()
            .map(|source| {
                let result = convert_file(source, options);
                if let Err(e) = &result {
                    log::error!("{}: {e}", source.display());
                }
                Conversion {
                    source: source.clone(),
                    result,
                }
            })
            .collect()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_remove_channels() {
        let data = array![[0.0, 1.0, 2.0, 3.0], [4.0, 5.0, 6.0, 7.0]];
        let kept = remove_channels(&data, &[3, 1]).unwrap();
        assert_eq!(kept, array![[0.0, 2.0], [4.0, 6.0]]);
        assert_eq!(remove_channels(&data, &[]).unwrap(), data);
    }

    #[test]
    fn test_remove_missing_channel() {
        let data = Array2::<f64>::zeros((2, 3));
        let err = remove_channels(&data, &[3]).unwrap_err();
        assert!(matches!(err, SioError::ChannelRange { channel: 3, available: 3 }));
    }

    #[test]
    fn test_path_without_file_name() {
        let err = convert_file(Path::new(".."), &ConvertOptions::default()).unwrap_err();
        assert!(matches!(err, SioError::Io(_)));
    }
}
