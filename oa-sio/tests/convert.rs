//! Converting batches of SIO recordings

mod common;

use byteorder::BigEndian;
use common::Recording;
use oa_sio::{ConvertOptions, NPY_DIR, SioError, convert_files};
use std::fs;

fn npy_dict(bytes: &[u8]) -> String {
    let len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
    String::from_utf8_lossy(&bytes[10..10 + len]).into_owned()
}

#[test]
fn test_convert_batch_with_channel_removal() {
    let dir = tempfile::tempdir().unwrap();
    let raw = dir.path().join("raw");
    fs::create_dir_all(&raw).unwrap();
    let bytes = Recording::int16().bytes::<BigEndian>();
    let files = vec![raw.join("b.sio"), raw.join("a.sio")];
    for f in &files {
        fs::write(f, &bytes).unwrap();
    }

    let out = dir.path().join("out");
    let options = ConvertOptions {
        channels_to_remove: vec![3],
        destination: Some(out.clone()),
        max_workers: 2,
    };
    let outcomes = convert_files(&files, &options).unwrap();
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes[0].source.ends_with("a.sio"));
    for outcome in &outcomes {
        assert!(outcome.result.is_ok());
    }

    let npy = fs::read(out.join(NPY_DIR).join("a.sio.npy")).unwrap();
    let dict = npy_dict(&npy);
    assert!(dict.contains("'shape': (200, 3)"));
    assert!(dict.contains("'<f8'"));

    let header: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join(NPY_DIR).join("b.sio_header.json")).unwrap())
            .unwrap();
    assert_eq!(header["Nc"], 4);
    assert_eq!(header["SpC"], 200);
    assert_eq!(header["bs"], 32677);
}

#[test]
fn test_failures_are_reported_per_file() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.sio");
    let bad = dir.path().join("bad.sio");
    fs::write(&good, Recording::float32().bytes::<BigEndian>()).unwrap();
    fs::write(&bad, [0u8; 16]).unwrap();

    let outcomes = convert_files(&[good, bad], &ConvertOptions::default()).unwrap();
    let bad = &outcomes[0];
    assert!(bad.source.ends_with("bad.sio"));
    assert!(matches!(bad.result, Err(SioError::Io(_))));

    // Without a destination the files land next to the input
    let npy = outcomes[1].result.as_ref().unwrap();
    assert_eq!(npy, &dir.path().join(NPY_DIR).join("good.sio.npy"));
    assert!(npy.exists());
}
