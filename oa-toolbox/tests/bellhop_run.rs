//! End-to-end BELLHOP runs against a stand-in executable
#![cfg(unix)]

mod common;

use common::{fake_model, files_with_prefix};
use oa_common::{BellhopParameters, LayerSpec, SoundSpeedProfile};
use oa_toolbox::{BellhopEnvironment, run_bellhop};
use std::fs;
use std::path::Path;

const RAYS: &str = "\
'Munk profile'
  50.0000000
           1           1           1
          3           1
   0.00000000
   5000.00000
'rz'
  -10.0000000
           3           0           1
   0.00000000       1000.00000
   50000.0000       4000.00000
   100000.000       1000.00000
   0.00000000
           2           0           0
   0.00000000       1000.00000
   100000.000       1000.00000
   10.0000000
           3           1           0
   0.00000000       1000.00000
   50000.0000       0.00000000
   100000.000       1000.00000
";

fn parameters(root: &Path) -> BellhopParameters {
    let ssp = SoundSpeedProfile::munk(5000.0, 250.0).unwrap();
    let layer = LayerSpec::new(ssp.z.clone(), ssp.c_p.clone());
    let mut params = BellhopParameters::new(vec![layer]);
    params.title = "Munk".to_string();
    params.freq = 50.0;
    params.env.tmpdir = root.join("tmp").to_string_lossy().into_owned();
    params.env.bot_c_p = Some(1600.0);
    params.env.bot_rho = Some(1.8);
    params.env.src_z = 1000.0.into();
    params.env.rec_z = vec![0.0, 2500.0, 5000.0].into();
    params.env.rec_r = vec![100.0].into();
    params.nbeams = 3;
    params.alpha = vec![-10.0, 10.0];
    params.zbox = 5500.0;
    params.rbox = 101.0;
    params
}

fn toolbox(root: &Path) -> std::path::PathBuf {
    let fixture = root.join("munk.ray");
    fs::write(&fixture, RAYS).unwrap();
    let bin = root.join("bin");
    fake_model(&bin, "bellhop", &fixture, "ray");
    bin
}

#[test]
fn test_run_bellhop_reads_rays() {
    let root = tempfile::tempdir().unwrap();
    let bin = toolbox(root.path());
    let mut params = parameters(root.path());
    params.model_path = Some(bin.to_string_lossy().into_owned());

    let rays = run_bellhop(&params).unwrap();
    assert_eq!(rays.title, "Munk profile");
    assert_eq!(rays.freq, 50.0);
    assert_eq!(rays.depth_bot, 5000.0);
    assert_eq!(rays.sources.len(), 1);
    let fan = &rays.sources[0];
    assert_eq!(fan.len(), 3);
    assert_eq!(fan[0].launch_angle, -10.0);
    assert_eq!(fan[0].num_bot_bounce, 1);
    assert_eq!(fan[1].r, vec![0.0, 100000.0]);
    assert_eq!(fan[2].num_top_bounce, 1);
    assert_eq!(fan[2].z[1], 0.0);

    assert!(files_with_prefix(&root.path().join("tmp"), "Munk").is_empty());
}

#[test]
fn test_kept_environment_file() {
    let root = tempfile::tempdir().unwrap();
    let bin = toolbox(root.path());
    let mut params = parameters(root.path());
    params.model_path = Some(bin.to_string_lossy().into_owned());
    params.keep_files = true;

    run_bellhop(&params).unwrap();
    let tmp = root.path().join("tmp");
    let files = files_with_prefix(&tmp, "Munk");
    assert_eq!(files.len(), 3);
    let envfil = files.iter().find(|f| f.ends_with(".env")).unwrap();
    let text = fs::read_to_string(tmp.join(envfil)).unwrap();
    assert!(text.contains("   50.00 \t \t \t ! Frequency (Hz) \r\n"));
    assert!(text.contains("    0 0.00 5000.00 \t ! N sigma max_layer_depth \r\n"));
    assert!(text.contains("\r\n'RGORR' \t \t \t ! Run Type"));
    assert!(text.contains("\r\n3  \t \t \t \t \t ! NBEAMS"));
    assert!(text.ends_with("\r\n0 5500 101 \t \t \t \t ! STEP (m)  ZBOX (m)  RBOX (km)"));
}

#[test]
fn test_environment_without_running() {
    let root = tempfile::tempdir().unwrap();
    let env = BellhopEnvironment::from_parameters(&parameters(root.path())).unwrap();
    let path = env.write_envfil().unwrap();
    let text = fs::read_to_string(path).unwrap();
    // 21 samples of the Munk profile, one line each
    assert_eq!(text.matches("! z cp cs rho ap as").count(), 21);
    assert!(text.contains("    3 \t \t \t \t ! NRD\r\n    0.000000 5000.000000/"));
}
