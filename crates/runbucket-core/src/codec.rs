//! Storage representations of the artifact records.
//!
//! Run configurations are UTF-8 JSON objects. Epoch snapshots use a small
//! binary container:
//!
//! ```text
//! magic "RBSN" | version u16 | buffer count u8
//! per buffer, in SNAPSHOT_BUFFERS order:
//!     name len u16 | name utf8 | rank u8 | rank x dim u64 | f32 values
//! ```
//!
//! All integers and floats are little-endian. Provenance is never encoded.

use crate::artifacts::{element_count, EpochSnapshot, RunConfiguration, Tensor, SNAPSHOT_BUFFERS};
use crate::error::{RetrievalError, RetrievalResult};
use crate::path::validate_object_name;
use bytes::{Buf, BufMut, BytesMut};
use serde::Serialize;

const SNAPSHOT_MAGIC: &[u8; 4] = b"RBSN";
const SNAPSHOT_VERSION: u16 = 1;

/// Parses a configuration payload and attaches provenance.
pub fn decode_config(raw: &[u8], object_name: &str, bucket_name: &str) -> RetrievalResult<RunConfiguration> {
    validate_object_name(object_name)?;
    let mut config: RunConfiguration = serde_json::from_slice(raw).map_err(|e| {
        if e.is_data() {
            RetrievalError::Schema(format!("{object_name}: {e}"))
        } else {
            RetrievalError::Json(e)
        }
    })?;
    config.name = object_name.to_string();
    config.bucket_name = bucket_name.to_string();
    Ok(config)
}

/// Serializes a configuration as 4-space indented JSON, without provenance.
pub fn encode_config(config: &RunConfiguration) -> RetrievalResult<Vec<u8>> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    config.serialize(&mut serializer)?;
    Ok(out)
}

/// Parses a snapshot payload and attaches provenance.
pub fn decode_snapshot(raw: &[u8], object_name: &str, bucket_name: &str) -> RetrievalResult<EpochSnapshot> {
    validate_object_name(object_name)?;
    let mut buf = raw;

    let magic = take(&mut buf, SNAPSHOT_MAGIC.len(), "magic")?;
    if magic != SNAPSHOT_MAGIC {
        return Err(RetrievalError::Schema(format!("{object_name}: not a snapshot payload")));
    }
    ensure(buf, 3, "header")?;
    let version = buf.get_u16_le();
    if version != SNAPSHOT_VERSION {
        return Err(RetrievalError::Schema(format!(
            "{object_name}: unsupported snapshot version {version}"
        )));
    }
    let count = usize::from(buf.get_u8());
    if count != SNAPSHOT_BUFFERS.len() {
        return Err(RetrievalError::Schema(format!(
            "{object_name}: expected {} buffers, found {count}",
            SNAPSHOT_BUFFERS.len()
        )));
    }

    let [ecs, ehs, dcs, dhs, out] = SNAPSHOT_BUFFERS;
    let snapshot = EpochSnapshot {
        encoder_cell_state: read_tensor(&mut buf, ecs)?,
        encoder_hidden_state: read_tensor(&mut buf, ehs)?,
        decoder_cell_state: read_tensor(&mut buf, dcs)?,
        decoder_hidden_state: read_tensor(&mut buf, dhs)?,
        output: read_tensor(&mut buf, out)?,
        name: object_name.to_string(),
        bucket_name: bucket_name.to_string(),
    };

    if buf.has_remaining() {
        return Err(RetrievalError::Schema(format!(
            "{object_name}: {} trailing bytes after last buffer",
            buf.remaining()
        )));
    }
    Ok(snapshot)
}

/// Serializes a snapshot's buffers, without provenance.
pub fn encode_snapshot(snapshot: &EpochSnapshot) -> RetrievalResult<Vec<u8>> {
    let mut buf = BytesMut::new();
    buf.put_slice(SNAPSHOT_MAGIC);
    buf.put_u16_le(SNAPSHOT_VERSION);
    buf.put_u8(SNAPSHOT_BUFFERS.len() as u8);

    for (name, tensor) in snapshot.buffers() {
        let rank = u8::try_from(tensor.rank())
            .map_err(|_| RetrievalError::Schema(format!("{name}: rank {} too large", tensor.rank())))?;
        buf.put_u16_le(name.len() as u16);
        buf.put_slice(name.as_bytes());
        buf.put_u8(rank);
        for &dim in tensor.shape() {
            buf.put_u64_le(dim as u64);
        }
        buf.reserve(tensor.data().len() * 4);
        for &value in tensor.data() {
            buf.put_f32_le(value);
        }
    }

    Ok(buf.to_vec())
}

fn ensure(buf: &[u8], needed: usize, what: &str) -> RetrievalResult<()> {
    if buf.remaining() < needed {
        return Err(RetrievalError::Schema(format!(
            "truncated snapshot: {what} needs {needed} bytes, {} left",
            buf.remaining()
        )));
    }
    Ok(())
}

fn take<'a>(buf: &mut &'a [u8], len: usize, what: &str) -> RetrievalResult<&'a [u8]> {
    ensure(buf, len, what)?;
    let (head, tail) = buf.split_at(len);
    *buf = tail;
    Ok(head)
}

fn read_tensor(buf: &mut &[u8], expected: &str) -> RetrievalResult<Tensor> {
    ensure(buf, 2, "buffer name length")?;
    let name_len = usize::from(buf.get_u16_le());
    let name = take(buf, name_len, "buffer name")?;
    if name != expected.as_bytes() {
        return Err(RetrievalError::Schema(format!(
            "expected buffer '{expected}', found '{}'",
            String::from_utf8_lossy(name)
        )));
    }

    ensure(buf, 1, "rank")?;
    let rank = usize::from(buf.get_u8());
    ensure(buf, rank * 8, "shape")?;
    let shape = (0..rank)
        .map(|_| {
            usize::try_from(buf.get_u64_le())
                .map_err(|_| RetrievalError::Schema(format!("{expected}: dimension exceeds address space")))
        })
        .collect::<RetrievalResult<Vec<_>>>()?;

    let values = element_count(&shape)
        .and_then(|n| n.checked_mul(4).map(|bytes| (n, bytes)))
        .ok_or_else(|| RetrievalError::Schema(format!("{expected}: shape {shape:?} overflows")))?;
    ensure(buf, values.1, expected)?;
    let data = (0..values.0).map(|_| buf.get_f32_le()).collect();

    Tensor::new(shape, data)
}
