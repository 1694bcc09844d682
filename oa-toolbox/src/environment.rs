//! Acoustics Toolbox environment files
//!
//! Every model reads a `.env` text file that starts with the same six blocks:
//! title, frequency, number of media, top option (plus upper halfspace), the
//! sound speed profile of each medium and the bottom option (plus lower
//! halfspace). Model-specific blocks are appended by [`crate::kraken`] and
//! [`crate::bellhop`]. Lines end in CRLF and carry `!` comments.

use crate::error::Result;
use crate::halfspace::{Bottom, Top, require};
use oa_common::{EnvironmentParameters, SoundSpeedProfile};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// One medium of the environment
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    /// Sampled properties
    pub ssp: SoundSpeedProfile,
    /// Number of mesh points, 0 lets the model choose
    pub nmesh: usize,
    /// Interfacial roughness [m]
    pub sigma: f64,
}

impl Layer {
    /// Layer with automatic meshing and no roughness
    pub fn new(ssp: SoundSpeedProfile) -> Self {
        Self {
            ssp,
            nmesh: 0,
            sigma: 0.0,
        }
    }

    /// Set the mesh size and roughness
    pub fn with_mesh(mut self, nmesh: usize, sigma: f64) -> Self {
        self.nmesh = nmesh;
        self.sigma = sigma;
        self
    }

    /// Deepest sample of the layer [m]
    pub fn z_max(&self) -> f64 {
        self.ssp.z_max()
    }
}

/// Common part of a model environment
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    /// Run title, including the random suffix
    pub title: String,
    /// Frequency [Hz]
    pub freq: f64,
    /// Media from the surface down
    pub layers: Vec<Layer>,
    /// Upper boundary
    pub top: Top,
    /// Lower boundary
    pub bottom: Bottom,
    /// Working directory for model files
    pub tmpdir: PathBuf,
}

impl Environment {
    /// Create an environment and its working directory
    ///
    /// Eight random hex characters are appended to `title` so that runs
    /// sharing a working directory never overwrite each other's files.
    pub fn new(
        title: &str,
        freq: f64,
        layers: Vec<Layer>,
        top: Top,
        bottom: Bottom,
        tmpdir: impl Into<PathBuf>,
    ) -> Result<Self> {
        if layers.is_empty() {
            return Err(oa_common::CommonError::InvalidConfig(
                "environment needs at least one layer".to_string(),
            )
            .into());
        }
        top.validate()?;
        bottom.validate()?;
        let tmpdir = tmpdir.into();
        fs::create_dir_all(&tmpdir)?;
        let title = format!("{title}{:08x}", rand::random::<u32>());
        log::debug!("environment `{title}` in {}", tmpdir.display());
        Ok(Self {
            title,
            freq,
            layers,
            top,
            bottom,
            tmpdir,
        })
    }

    /// Environment from run parameters
    ///
    /// `bot_z` is the lower halfspace depth used when `bot_z` is not set.
    pub fn from_parameters(
        title: &str,
        freq: f64,
        params: &EnvironmentParameters,
        bot_z: f64,
    ) -> Result<Self> {
        let layers = params
            .layerdata
            .iter()
            .map(|spec| Ok(Layer::new(spec.to_profile()?).with_mesh(spec.nmesh, spec.sigma)))
            .collect::<Result<Vec<_>>>()?;
        Self::new(
            title,
            freq,
            layers,
            Top::from_parameters(params)?,
            Bottom::from_parameters(params, bot_z)?,
            &params.tmpdir,
        )
    }

    /// Number of media
    pub fn nmedia(&self) -> usize {
        self.layers.len()
    }

    /// Path of a model file `<tmpdir>/<title>.<extension>`
    pub fn file_path(&self, extension: &str) -> PathBuf {
        self.tmpdir.join(format!("{}.{extension}", self.title))
    }

    /// Create `<title>.env` and write the common blocks
    pub(crate) fn create_envfil(&self) -> Result<(PathBuf, BufWriter<File>)> {
        let path = self.file_path("env");
        let mut writer = BufWriter::new(File::create(&path)?);
        self.write_common(&mut writer)?;
        Ok((path, writer))
    }

    /// Write blocks 1 to 6
    pub fn write_common<W: Write>(&self, w: &mut W) -> Result<()> {
        write!(w, "'{}' ! Title \r\n", self.title)?;
        write!(w, "{:8.2} \t \t \t ! Frequency (Hz) \r\n", self.freq)?;
        write!(w, "{:8} \t \t \t ! NMEDIA \r\n", self.nmedia())?;
        write!(w, "'{}' \t \t \t ! Top Option \r\n", self.top.opt)?;

        if self.top.halfspace() == 'A' {
            let z0 = self.layers.first().map_or(0.0, |layer| layer.ssp.z_min());
            write!(
                w,
                "     {:6.2} {:6.2} {:6.2} {:6.2} {:6.2} {:6.2}  \t ! Upper halfspace \r\n",
                z0,
                require(self.top.c_p, "c_p", "top", 'A')?,
                self.top.c_s,
                require(self.top.rho, "rho", "top", 'A')?,
                self.top.a_p,
                self.top.a_s,
            )?;
        }

        for layer in &self.layers {
            write!(
                w,
                "{:5} {:4.2} {:6.2} \t ! N sigma max_layer_depth \r\n",
                layer.nmesh,
                layer.sigma,
                layer.z_max()
            )?;
            let ssp = &layer.ssp;
            for i in 0..ssp.len() {
                write!(
                    w,
                    "\t {:6.2} \t {:6.2} \t {:6.2} \t {:6.2} \t {:6.2} \t {:6.2} / \t ! z cp cs rho ap as \r\n",
                    ssp.z[i], ssp.c_p[i], ssp.c_s[i], ssp.rho[i], ssp.a_p[i], ssp.a_s[i]
                )?;
            }
        }

        write!(
            w,
            "'{}' {:6.2}  \t \t ! Bottom Option, sigma\r\n",
            self.bottom.opt, self.bottom.sigma
        )?;
        match self.bottom.halfspace() {
            'A' => write!(
                w,
                "     {:6.2} {:6.2} {:6.2} {:6.2} {:6.2} {:6.2}  \t ! Lower halfspace \r\n",
                require(self.bottom.z, "z", "bottom", 'A')?,
                require(self.bottom.c_p, "c_p", "bottom", 'A')?,
                self.bottom.c_s,
                require(self.bottom.rho, "rho", "bottom", 'A')?,
                self.bottom.a_p,
                self.bottom.a_s,
            )?,
            'G' => write!(
                w,
                "   {:6.2} {:6.2} ! zb mz\r\n",
                require(self.bottom.z, "z", "bottom", 'G')?,
                require(self.bottom.mz, "mz", "bottom", 'G')?,
            )?,
            _ => {}
        }
        Ok(())
    }
}

/// Write a count line followed by a depth or range vector
///
/// Equally spaced vectors with more than one element are written as their
/// end points, which the models expand; anything else is written in full.
pub(crate) fn write_vector<W: Write>(
    w: &mut W,
    label: &str,
    values: &[f64],
    equally_spaced: bool,
) -> Result<()> {
    write!(w, "{:5} \t \t \t \t ! N{label}", values.len())?;
    match values {
        [first, .., last] if equally_spaced => write!(w, "\r\n    {first:6.6} {last:6.6}")?,
        _ => {
            write!(w, "\r\n    ")?;
            for v in values {
                write!(w, "{v:6.6} ")?;
            }
        }
    }
    write!(w, "/ \t ! {label}(1)  ... (m) \r\n")?;
    Ok(())
}

/// Remove `<title>.<ext>` for each extension, ignoring missing files
pub fn clean_up_files(dir: &Path, extensions: &[&str], title: &str) -> Result<()> {
    for ext in extensions {
        let path = dir.join(format!("{title}.{ext}"));
        match fs::remove_file(&path) {
            Ok(()) => log::debug!("removed {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pekeris(tmpdir: &Path) -> Environment {
        let ssp = SoundSpeedProfile::new(vec![0.0, 100.0], 1500.0).unwrap();
        Environment::new(
            "Test",
            100.0,
            vec![Layer::new(ssp)],
            Top::default(),
            Bottom::acoustic(100.0, 1600.0, 1.8),
            tmpdir,
        )
        .unwrap()
    }

    fn render(env: &Environment) -> String {
        let mut buf = Vec::new();
        env.write_common(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_title_suffix_and_tmpdir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let env = pekeris(&nested);
        assert!(nested.is_dir());
        assert_eq!(env.title.len(), "Test".len() + 8);
        assert!(env.title[4..].chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(env.file_path("env"), nested.join(format!("{}.env", env.title)));

        let other = pekeris(&nested);
        assert_ne!(env.title, other.title);
    }

    #[test]
    fn test_common_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let env = pekeris(dir.path());
        let text = render(&env);
        let lines: Vec<&str> = text.split("\r\n").collect();

        assert_eq!(lines[0], format!("'{}' ! Title ", env.title));
        assert_eq!(lines[1], "  100.00 \t \t \t ! Frequency (Hz) ");
        assert_eq!(lines[2], "       1 \t \t \t ! NMEDIA ");
        assert_eq!(lines[3], "'CVF    ' \t \t \t ! Top Option ");
        assert_eq!(lines[4], "    0 0.00 100.00 \t ! N sigma max_layer_depth ");
        assert_eq!(
            lines[5],
            "\t   0.00 \t 1500.00 \t   0.00 \t   1.00 \t   0.00 \t   0.00 / \t ! z cp cs rho ap as "
        );
        assert!(lines[6].starts_with("\t 100.00 \t 1500.00"));
        assert_eq!(lines[7], "'A'   0.00  \t \t ! Bottom Option, sigma");
        assert_eq!(
            lines[8],
            "     100.00 1600.00   0.00   1.80   0.00   0.00  \t ! Lower halfspace "
        );
        assert_eq!(lines[9], "");
    }

    #[test]
    fn test_upper_halfspace_and_grain_size() {
        let dir = tempfile::tempdir().unwrap();
        let mut env = pekeris(dir.path());
        env.top = Top {
            opt: "CAF    ".to_string(),
            z: Some(0.0),
            c_p: Some(343.0),
            rho: Some(0.0),
            ..Top::default()
        };
        env.bottom = Bottom {
            opt: "G".to_string(),
            z: Some(100.0),
            mz: Some(2.5),
            ..Bottom::default()
        };
        let text = render(&env);
        assert!(text.contains("       0.00 343.00   0.00   0.00   0.00   0.00  \t ! Upper halfspace \r\n"));
        assert!(text.ends_with("   100.00   2.50 ! zb mz\r\n"));
    }

    #[test]
    fn test_vector_formats() {
        let mut buf = Vec::new();
        write_vector(&mut buf, "SD", &[10.0, 20.0, 30.0], true).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "    3 \t \t \t \t ! NSD\r\n    10.000000 30.000000/ \t ! SD(1)  ... (m) \r\n"
        );

        let mut buf = Vec::new();
        write_vector(&mut buf, "RD", &[5.0], true).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "    1 \t \t \t \t ! NRD\r\n    5.000000 / \t ! RD(1)  ... (m) \r\n"
        );
    }

    #[test]
    fn test_clean_up_files() {
        let dir = tempfile::tempdir().unwrap();
        for ext in ["env", "mod", "prt", "shd"] {
            fs::write(dir.path().join(format!("run.{ext}")), b"x").unwrap();
        }
        clean_up_files(dir.path(), &["env", "mod", "prt"], "run").unwrap();
        assert!(!dir.path().join("run.env").exists());
        assert!(dir.path().join("run.shd").exists());
        // Missing files are not an error
        clean_up_files(dir.path(), &["env"], "run").unwrap();
    }

    #[test]
    fn test_environment_needs_layers() {
        let dir = tempfile::tempdir().unwrap();
        let err = Environment::new(
            "x",
            1.0,
            Vec::new(),
            Top::default(),
            Bottom::acoustic(1.0, 1600.0, 1.8),
            dir.path(),
        )
        .unwrap_err();
        assert!(err.is_configuration_error());
    }
}
