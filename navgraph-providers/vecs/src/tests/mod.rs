use std::io::Write;

use rstest::rstest;
use tempfile::NamedTempFile;

use super::*;


/// Encodes rows as length-prefixed little-endian records.
fn encode<T: Copy>(rows: &[Vec<T>], to_bytes: impl Fn(T) -> [u8; 4]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for row in rows {
        let length = i32::try_from(row.len()).expect("row length fits in i32");
        bytes.extend(length.to_le_bytes());
        for &value in row {
            bytes.extend(to_bytes(value));
        }
    }
    bytes
}

fn fvecs_bytes(rows: &[Vec<f32>]) -> Vec<u8> {
    encode(rows, f32::to_le_bytes)
}

fn ivecs_bytes(rows: &[Vec<i32>]) -> Vec<u8> {
    encode(rows, i32::to_le_bytes)
}

fn temp_file(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(bytes).expect("write temp file");
    file.flush().expect("flush temp file");
    file
}

#[rstest]
#[case(VecsError::Truncated { record: 2 }, "VECS_TRUNCATED")]
#[case(
    VecsError::CountExceedsFile { requested: 5, available: 4 },
    "VECS_COUNT_EXCEEDS_FILE"
)]
#[case(
    VecsError::DimensionMismatch { record: 0, expected: 3, actual: 4 },
    "VECS_DIMENSION_MISMATCH"
)]
fn errors_expose_stable_codes(#[case] error: VecsError, #[case] code: &str) {
    assert_eq!(error.code().as_str(), code);
}
