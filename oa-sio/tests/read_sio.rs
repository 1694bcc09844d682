//! Reading synthetic SIO recordings

mod common;

use byteorder::{BigEndian, LittleEndian};
use common::{Recording, expected};
use oa_sio::{Endian, ReadRequest, SioError, read_header, read_sio};
use std::fs;
use std::path::PathBuf;

fn write(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, bytes).unwrap();
    path
}

fn int16_file(dir: &tempfile::TempDir) -> PathBuf {
    write(dir, "int16.sio", &Recording::int16().bytes::<BigEndian>())
}

#[test]
fn test_read_all_int16() {
    let dir = tempfile::tempdir().unwrap();
    let (data, header) = read_sio(int16_file(&dir), &ReadRequest::new()).unwrap();
    assert_eq!(header.endian, Endian::Big);
    assert_eq!(header.id, 42);
    assert_eq!(header.num_records, 17);
    assert_eq!(header.records_per_channel, 5);
    assert_eq!(header.samples_per_record, 64);
    assert_eq!(header.fname, "synthetic.da");
    assert_eq!(header.comment, "test run");

    assert_eq!(data.dim(), (200, 4));
    for ch in 0..4 {
        for i in [0, 63, 64, 199] {
            assert_eq!(data[[i, ch]], expected(ch, i, false));
        }
    }
}

#[test]
fn test_read_little_endian_floats() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "f32.sio", &Recording::float32().bytes::<LittleEndian>());
    let (data, header) = read_sio(&path, &ReadRequest::new()).unwrap();
    assert_eq!(header.endian, Endian::Little);
    assert_eq!(header.tf_real, 1);
    assert_eq!(data.dim(), (100, 3));
    assert_eq!(data[[99, 2]], expected(2, 99, true));
    assert_eq!(data[[32, 1]], expected(1, 32, true));
}

#[test]
fn test_channel_subset_from_record_boundary() {
    let dir = tempfile::tempdir().unwrap();
    let request = ReadRequest::new().start(65).samples(64).channels(vec![2, 0]);
    let (data, _) = read_sio(int16_file(&dir), &request).unwrap();
    assert_eq!(data.dim(), (64, 2));
    assert_eq!(data[[0, 0]], expected(2, 64, false));
    assert_eq!(data[[0, 1]], expected(0, 64, false));
    assert_eq!(data[[63, 1]], expected(0, 127, false));
}

#[test]
fn test_unaligned_start() {
    let dir = tempfile::tempdir().unwrap();
    let path = int16_file(&dir);

    // Fits inside the first record after trimming
    let (data, _) = read_sio(&path, &ReadRequest::new().start(10).samples(50)).unwrap();
    assert_eq!(data.nrows(), 50);
    assert_eq!(data[[0, 3]], expected(3, 9, false));

    let err = read_sio(&path, &ReadRequest::new().start(10)).unwrap_err();
    assert!(matches!(err, SioError::Misaligned { requested: 191, returned: 183, .. }));
    assert!(err.is_request_error());
}

#[test]
fn test_request_clamped_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = int16_file(&dir);
    let (data, _) = read_sio(&path, &ReadRequest::new().samples(1000)).unwrap();
    assert_eq!(data.dim(), (200, 4));

    let (data, _) = read_sio(&path, &ReadRequest::new().start(300)).unwrap();
    assert_eq!(data.dim(), (0, 4));
}

#[test]
fn test_header_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = int16_file(&dir);
    let (data, header) = read_sio(&path, &ReadRequest::header_only()).unwrap();
    assert_eq!(data.dim(), (0, 0));
    assert_eq!(header, read_header(&path).unwrap());
}

#[test]
fn test_invalid_requests() {
    let dir = tempfile::tempdir().unwrap();
    let path = int16_file(&dir);

    let err = read_sio(&path, &ReadRequest::new().channels(vec![0, 4])).unwrap_err();
    assert!(matches!(err, SioError::ChannelRange { channel: 4, available: 4 }));

    let err = read_sio(&path, &ReadRequest::new().start(0)).unwrap_err();
    assert!(matches!(err, SioError::StartSample(0)));
}

#[test]
fn test_truncated_file() {
    let dir = tempfile::tempdir().unwrap();
    let bytes = Recording::int16().bytes::<BigEndian>();
    let path = write(&dir, "short.sio", &bytes[..bytes.len() - 10]);
    let err = read_sio(&path, &ReadRequest::new()).unwrap_err();
    assert!(matches!(err, SioError::ShortRead { expected: 16, read: 15 }));
}

#[test]
fn test_corrupt_sample_count() {
    let dir = tempfile::tempdir().unwrap();
    let mut bytes = Recording::int16().bytes::<BigEndian>();
    // Samples per channel far beyond the 16 data records present
    bytes[24..28].copy_from_slice(&u32::MAX.to_be_bytes());
    let path = write(&dir, "corrupt.sio", &bytes);

    let err = read_sio(&path, &ReadRequest::new()).unwrap_err();
    assert!(matches!(
        err,
        SioError::ShortRead {
            expected: 268_435_456,
            read: 16
        }
    ));
    assert!(err.is_format_error());
    assert!(err.is_format_error());

    // The early records are still readable
    let (data, _) = read_sio(&path, &ReadRequest::new().samples(64)).unwrap();
    assert_eq!(data.nrows(), 64);
}

#[test]
fn test_not_an_sio_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "noise.sio", &[0xAB; 256]);
    let err = read_sio(&path, &ReadRequest::new()).unwrap_err();
    assert!(matches!(err, SioError::ByteSwap(_)));
}
