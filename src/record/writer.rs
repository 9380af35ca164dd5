//! Record body and header encoding.

use byteorder::{LittleEndian, WriteBytesExt};

use super::format::*;
use super::schema::SkinRecord;
use super::value::FieldValue;
use crate::util::Result;

/// Append-only little-endian body buffer.
#[derive(Default)]
pub struct BodyWriter {
    buf: Vec<u8>,
}

impl BodyWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    fn write_u64(&mut self, value: u64) -> Result<()> {
        self.buf.write_u64::<LittleEndian>(value)?;
        Ok(())
    }

    fn write_str(&mut self, s: &str) -> Result<()> {
        self.write_u64(s.len() as u64)?;
        self.buf.extend_from_slice(s.as_bytes());
        Ok(())
    }

    /// Write the legend: count followed by names.
    pub fn write_legend<'a>(&mut self, names: impl ExactSizeIterator<Item = &'a str>) -> Result<()> {
        self.write_u64(names.len() as u64)?;
        for name in names {
            self.write_str(name)?;
        }
        Ok(())
    }

    /// Write one tagged, length-prefixed value.
    pub fn write_value(&mut self, value: &FieldValue) -> Result<()> {
        let mut payload = Vec::new();
        match value {
            FieldValue::F64Array(v) => {
                payload.write_u64::<LittleEndian>(v.len() as u64)?;
                for &x in v {
                    payload.write_f64::<LittleEndian>(x)?;
                }
            }
            FieldValue::I64Array(v) => {
                payload.write_u64::<LittleEndian>(v.len() as u64)?;
                for &x in v {
                    payload.write_i64::<LittleEndian>(x)?;
                }
            }
            FieldValue::StrArray(v) => {
                payload.write_u64::<LittleEndian>(v.len() as u64)?;
                for s in v {
                    payload.write_u64::<LittleEndian>(s.len() as u64)?;
                    payload.extend_from_slice(s.as_bytes());
                }
            }
            FieldValue::Str(s) => payload.extend_from_slice(s.as_bytes()),
            FieldValue::I64(x) => payload.write_i64::<LittleEndian>(*x)?,
            FieldValue::F64(x) => payload.write_f64::<LittleEndian>(*x)?,
            FieldValue::Bool(b) => payload.write_u8(u8::from(*b))?,
            FieldValue::Unknown(_) => {}
        }
        self.buf.write_u8(value.tag())?;
        self.write_u64(payload.len() as u64)?;
        self.buf.extend_from_slice(&payload);
        Ok(())
    }
}

fn index_array(values: &[usize]) -> FieldValue {
    FieldValue::I64Array(values.iter().map(|&x| x as i64).collect())
}

/// Flatten a record into `(field, value)` pairs in legend order.
pub fn record_fields(record: &SkinRecord) -> Vec<(&'static str, FieldValue)> {
    let weights = record.weights();
    let attrs = record.attributes();
    vec![
        (field::WEIGHTS, FieldValue::F64Array(weights.values().to_vec())),
        (field::ROW_OFFSETS, index_array(weights.row_offsets())),
        (field::INFLUENCE_INDICES, index_array(weights.influence_indices())),
        (field::INFLUENCES, FieldValue::StrArray(record.influences().to_vec())),
        (field::GEOMETRY, FieldValue::Str(record.geometry().to_string())),
        (field::SECONDARY_WEIGHTS, FieldValue::F64Array(record.secondary_weights().to_vec())),
        (field::VERTEX_COUNT, FieldValue::I64(record.vertex_count() as i64)),
        (field::NAME, FieldValue::Str(record.name().to_string())),
        (field::ENVELOPE, FieldValue::F64(attrs.envelope)),
        (field::SKINNING_METHOD, FieldValue::I64(attrs.skinning_method)),
        (field::USE_COMPONENTS, FieldValue::Bool(attrs.use_components)),
        (field::NORMALIZE_WEIGHTS, FieldValue::I64(attrs.normalize_weights)),
        (field::DEFORM_USER_NORMALS, FieldValue::Bool(attrs.deform_user_normals)),
        (field::DEFORMER_TYPE, FieldValue::Str(record.deformer_type().to_string())),
    ]
}

/// Encode the body (legend + values) of a field list.
pub fn encode_body(fields: &[(&str, FieldValue)]) -> Result<Vec<u8>> {
    let mut w = BodyWriter::new();
    w.write_legend(fields.iter().map(|(name, _)| *name))?;
    for (_, value) in fields {
        w.write_value(value)?;
    }
    Ok(w.into_bytes())
}

/// Build the 16-byte file header.
pub fn encode_header(flags: u8) -> [u8; HEADER_SIZE] {
    let mut header = [0u8; HEADER_SIZE];
    header[..RECORD_MAGIC.len()].copy_from_slice(RECORD_MAGIC);
    header[VERSION_OFFSET..VERSION_OFFSET + 2].copy_from_slice(&CURRENT_VERSION.to_le_bytes());
    header[FLAGS_OFFSET] = flags;
    header
}
