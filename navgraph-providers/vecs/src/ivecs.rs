//! `ivecs` reader for ground-truth neighbour lists.

use std::{fs, io::Read, path::Path};

use tracing::{debug, instrument};

use crate::{
    errors::VecsError,
    record::{Records, words},
};

/// Loads the first `width` ids of `count` rows from an `ivecs` file.
///
/// The first record fixes the row width used to size the file; every row
/// must hold at least `width` ids.
///
/// # Errors
/// Returns [`VecsError::Io`] when the file cannot be read,
/// [`VecsError::WidthExceedsFile`] when a row is narrower than `width`,
/// [`VecsError::CountExceedsFile`] when fewer than `count` rows are present,
/// and [`VecsError::NegativeId`] for ids that cannot index a store.
#[instrument(skip(path), fields(path = %path.as_ref().display()))]
pub fn read_ivecs(
    path: impl AsRef<Path>,
    count: usize,
    width: usize,
) -> Result<Vec<Vec<usize>>, VecsError> {
    let bytes = fs::read(path.as_ref())?;
    parse(&bytes, count, width)
}

/// Reader-based variant of [`read_ivecs`].
///
/// # Errors
/// See [`read_ivecs`].
pub fn read_ivecs_from<R: Read>(
    mut reader: R,
    count: usize,
    width: usize,
) -> Result<Vec<Vec<usize>>, VecsError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    parse(&bytes, count, width)
}

fn parse(bytes: &[u8], count: usize, width: usize) -> Result<Vec<Vec<usize>>, VecsError> {
    let mut records = Records::new(bytes);
    let stored = match records.leading_length() {
        Some(leading) => ensure_width(0, width, leading)?,
        None if count == 0 => return Ok(Vec::new()),
        None => {
            return Err(VecsError::CountExceedsFile {
                requested: count,
                available: 0,
            });
        }
    };
    let available = records
        .capacity(stored)
        .ok_or(VecsError::Truncated { record: 0 })?;
    if count > available {
        return Err(VecsError::CountExceedsFile {
            requested: count,
            available,
        });
    }

    let mut rows = Vec::with_capacity(count);
    for record in 0..count {
        let (length, payload) = records.next_record(record)?;
        ensure_width(record, width, length)?;
        let row = words(payload)
            .take(width)
            .map(|word| {
                let value = i32::from_le_bytes(word);
                usize::try_from(value).map_err(|_| VecsError::NegativeId { record, value })
            })
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(row);
    }
    debug!(records = count, available, width = stored, "decoded ivecs records");
    Ok(rows)
}

/// Returns the stored row width when it can supply `width` ids.
fn ensure_width(record: usize, width: usize, declared: i32) -> Result<usize, VecsError> {
    match usize::try_from(declared) {
        Ok(stored) if stored >= width => Ok(stored),
        _ => Err(VecsError::WidthExceedsFile {
            record,
            requested: width,
            available: i64::from(declared),
        }),
    }
}
