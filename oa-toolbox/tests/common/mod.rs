//! Synthetic model outputs and stand-in executables for integration tests

#![allow(dead_code)]

use byteorder::{LittleEndian, WriteBytesExt};
use std::fs;
use std::path::{Path, PathBuf};

/// Record length used by the synthetic mode files (in 4-byte words)
pub const LRECL_WORDS: u32 = 32;

/// Modes at one frequency
pub struct ModeSet {
    /// Wavenumbers (re, im)
    pub k: Vec<(f32, f32)>,
    /// One shape per mode, sampled at every depth
    pub phi: Vec<Vec<(f32, f32)>>,
}

impl ModeSet {
    /// Isovelocity waveguide modes `sin(mπz/D)` with lossy wavenumbers
    pub fn waveguide(z: &[f32], depth: f32, freq: f32, count: usize) -> Self {
        let k0 = 2.0 * std::f32::consts::PI * freq / 1500.0;
        let mut k = Vec::with_capacity(count);
        let mut phi = Vec::with_capacity(count);
        for m in 1..=count {
            let gamma = m as f32 * std::f32::consts::PI / depth;
            k.push(((k0 * k0 - gamma * gamma).sqrt(), -1e-5 * m as f32));
            phi.push(z.iter().map(|&zi| ((gamma * zi).sin() * 0.1, 0.0)).collect());
        }
        Self { k, phi }
    }
}

fn place(buf: &mut Vec<u8>, offset: usize, bytes: &[u8]) {
    if buf.len() < offset + bytes.len() {
        buf.resize(offset + bytes.len(), 0);
    }
    buf[offset..offset + bytes.len()].copy_from_slice(bytes);
}

fn halfspace(out: &mut Vec<u8>, bc: u8, c_p: (f32, f32), c_s: (f32, f32), rho: f32, z: f32) {
    out.push(bc);
    for v in [c_p.0, c_p.1, c_s.0, c_s.1, rho, z] {
        out.write_f32::<LittleEndian>(v).unwrap();
    }
}

/// Bytes of a mode file with one acoustic medium
pub fn mod_file_bytes(freqs: &[f64], z: &[f32], sets: &[ModeSet]) -> Vec<u8> {
    let lrecl = 4 * LRECL_WORDS as usize;
    let nmat = sets.first().and_then(|s| s.phi.first()).map_or(z.len(), Vec::len);
    let mut buf = Vec::new();

    let mut header = Vec::new();
    header.write_u32::<LittleEndian>(LRECL_WORDS).unwrap();
    let mut title = b"synthetic".to_vec();
    title.resize(80, b' ');
    header.extend_from_slice(&title);
    header.write_u32::<LittleEndian>(freqs.len() as u32).unwrap();
    header.write_u32::<LittleEndian>(1).unwrap();
    header.write_i32::<LittleEndian>(z.len() as i32).unwrap();
    header.write_i32::<LittleEndian>(nmat as i32).unwrap();
    place(&mut buf, 0, &header);

    let mut media = Vec::new();
    media.write_u32::<LittleEndian>(z.len() as u32).unwrap();
    media.extend_from_slice(b"ACOUSTIC");
    place(&mut buf, lrecl, &media);

    let mut interfaces = Vec::new();
    interfaces.write_f32::<LittleEndian>(0.0).unwrap();
    interfaces.write_f32::<LittleEndian>(1.0).unwrap();
    place(&mut buf, 2 * lrecl, &interfaces);

    let mut f = Vec::new();
    for &freq in freqs {
        f.write_f64::<LittleEndian>(freq).unwrap();
    }
    place(&mut buf, 3 * lrecl, &f);

    let mut depths = Vec::new();
    for &zi in z {
        depths.write_f32::<LittleEndian>(zi).unwrap();
    }
    place(&mut buf, 4 * lrecl, &depths);

    let mut record = 5usize;
    for set in sets {
        let m = set.k.len();
        let mut count = Vec::new();
        count.write_i32::<LittleEndian>(m as i32).unwrap();
        place(&mut buf, record * lrecl, &count);

        let mut spaces = Vec::new();
        halfspace(&mut spaces, b'V', (0.0, 0.0), (0.0, 0.0), 0.0, 0.0);
        halfspace(&mut spaces, b'A', (1600.0, 0.0), (200.0, 0.5), 1.8, 100.0);
        place(&mut buf, (record + 1) * lrecl, &spaces);

        for (j, shape) in set.phi.iter().enumerate() {
            let mut values = Vec::new();
            for &(re, im) in shape {
                values.write_f32::<LittleEndian>(re).unwrap();
                values.write_f32::<LittleEndian>(im).unwrap();
            }
            place(&mut buf, (record + 2 + j) * lrecl, &values);
        }

        let mut k = Vec::new();
        for &(re, im) in &set.k {
            k.write_f32::<LittleEndian>(re).unwrap();
            k.write_f32::<LittleEndian>(im).unwrap();
        }
        place(&mut buf, (record + 2 + m) * lrecl, &k);

        record += (3 + m as i64 + (8 * m as i64 - 1) / lrecl as i64) as usize;
    }

    let padded = buf.len().div_ceil(lrecl) * lrecl;
    buf.resize(padded, 0);
    buf
}

/// Sample depths 0, 10, ..., 100 m
pub fn depths() -> Vec<f32> {
    (0..=10).map(|i| i as f32 * 10.0).collect()
}

/// Write a stand-in executable `<bin_dir>/<name>.exe` that copies `fixture`
/// to `<title>.<extension>` in its working directory
#[cfg(unix)]
pub fn fake_model(bin_dir: &Path, name: &str, fixture: &Path, extension: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    fs::create_dir_all(bin_dir).unwrap();
    let exe = bin_dir.join(format!("{name}.exe"));
    let script = format!(
        "#!/bin/sh\ntest -f \"$1.env\" || exit 2\ncp \"{}\" \"$1.{extension}\"\ntouch \"$1.prt\"\n",
        fixture.display()
    );
    fs::write(&exe, script).unwrap();
    fs::set_permissions(&exe, fs::Permissions::from_mode(0o755)).unwrap();
    exe
}

/// Files in `dir` whose name starts with `prefix`
pub fn files_with_prefix(dir: &Path, prefix: &str) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with(prefix))
        .collect();
    names.sort();
    names
}
