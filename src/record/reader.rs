//! Record header and body decoding.

use byteorder::{ByteOrder, LittleEndian};

use super::format::*;
use super::schema::{SkinAttributes, SkinRecord};
use super::value::{FieldTable, FieldValue};
use crate::codec::SparseWeights;
use crate::util::{Error, Result};

/// Parsed file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub version: u16,
    pub flags: u8,
}

impl RecordHeader {
    pub fn is_compressed(&self) -> bool {
        self.flags & FLAG_COMPRESSED != 0
    }
}

/// Parse and validate the header at the start of `data`.
pub fn parse_header(data: &[u8]) -> Result<RecordHeader> {
    if data.len() < HEADER_SIZE {
        return Err(Error::UnexpectedEof(data.len() as u64));
    }
    if &data[..RECORD_MAGIC.len()] != RECORD_MAGIC {
        return Err(Error::InvalidMagic);
    }
    let version = LittleEndian::read_u16(&data[VERSION_OFFSET..VERSION_OFFSET + 2]);
    if version == 0 || version > CURRENT_VERSION {
        return Err(Error::UnsupportedVersion(version));
    }
    Ok(RecordHeader { version, flags: data[FLAGS_OFFSET] })
}

/// Bounds-checked cursor over a record body.
pub struct BodyReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BodyReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(Error::UnexpectedEof(self.data.len() as u64))?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn read_u64(&mut self) -> Result<u64> {
        Ok(LittleEndian::read_u64(self.take(8)?))
    }

    fn read_len(&mut self) -> Result<usize> {
        let len = self.read_u64()?;
        usize::try_from(len).map_err(|_| Error::UnexpectedEof(self.data.len() as u64))
    }

    fn read_string(&mut self) -> Result<String> {
        let len = self.read_len()?;
        Ok(String::from_utf8(self.take(len)?.to_vec())?)
    }

    pub fn read_legend(&mut self) -> Result<Vec<String>> {
        let count = self.read_len()?;
        // Each name needs at least its 8-byte length prefix.
        if count > self.data.len() / 8 {
            return Err(Error::UnexpectedEof(self.data.len() as u64));
        }
        (0..count).map(|_| self.read_string()).collect()
    }

    pub fn read_value(&mut self) -> Result<FieldValue> {
        let tag = self.read_u8()?;
        let len = self.read_len()?;
        let payload = self.take(len)?;
        decode_payload(tag, payload)
    }
}

fn checked_count(payload: &[u8], elem_size: usize) -> Result<usize> {
    if payload.len() < 8 {
        return Err(Error::UnexpectedEof(payload.len() as u64));
    }
    let count = LittleEndian::read_u64(&payload[..8]) as usize;
    if count.checked_mul(elem_size) != Some(payload.len() - 8) {
        return Err(Error::malformed(format!(
            "array of {count} elements does not fit {} payload bytes",
            payload.len()
        )));
    }
    Ok(count)
}

fn decode_payload(tag: u8, payload: &[u8]) -> Result<FieldValue> {
    let value = match tag {
        TAG_F64_ARRAY => {
            let n = checked_count(payload, 8)?;
            let mut v = vec![0.0; n];
            LittleEndian::read_f64_into(&payload[8..], &mut v);
            FieldValue::F64Array(v)
        }
        TAG_I64_ARRAY => {
            let n = checked_count(payload, 8)?;
            let mut v = vec![0i64; n];
            LittleEndian::read_i64_into(&payload[8..], &mut v);
            FieldValue::I64Array(v)
        }
        TAG_STR_ARRAY => {
            let mut r = BodyReader::new(payload);
            let n = r.read_len()?;
            let mut v = Vec::with_capacity(n.min(payload.len() / 8));
            for _ in 0..n {
                v.push(r.read_string()?);
            }
            FieldValue::StrArray(v)
        }
        TAG_STR => FieldValue::Str(String::from_utf8(payload.to_vec())?),
        TAG_I64 | TAG_F64 if payload.len() != 8 => {
            return Err(Error::malformed(format!("{} payload of {} bytes", tag_name(tag), payload.len())));
        }
        TAG_I64 => FieldValue::I64(LittleEndian::read_i64(payload)),
        TAG_F64 => FieldValue::F64(LittleEndian::read_f64(payload)),
        TAG_BOOL => match payload {
            [b] => FieldValue::Bool(*b != 0),
            _ => return Err(Error::malformed(format!("bool payload of {} bytes", payload.len()))),
        },
        other => FieldValue::Unknown(other),
    };
    Ok(value)
}

/// Decode a body into its legend-keyed field table.
///
/// Entries past the end of the value stream are simply absent; the schema
/// step reports them as missing if they are required.
pub fn decode_body(body: &[u8]) -> Result<FieldTable> {
    let mut r = BodyReader::new(body);
    let legend = r.read_legend()?;
    let mut table = FieldTable::new();
    for name in legend {
        if r.is_at_end() {
            break;
        }
        let value = r.read_value()?;
        table.push(name, value);
    }
    Ok(table)
}

/// Resolve a field table into a validated record.
pub fn record_from_fields(fields: &FieldTable) -> Result<SkinRecord> {
    let weights = SparseWeights::new(
        fields.f64_array(field::WEIGHTS)?,
        fields.index_array(field::INFLUENCE_INDICES)?,
        fields.index_array(field::ROW_OFFSETS)?,
    )?;
    let vertex_count = usize::try_from(fields.i64(field::VERTEX_COUNT)?)
        .map_err(|_| Error::mismatch(field::VERTEX_COUNT, "count", "negative integer"))?;

    let attributes = SkinAttributes {
        envelope: fields.f64(field::ENVELOPE)?,
        skinning_method: fields.i64(field::SKINNING_METHOD)?,
        use_components: fields.bool(field::USE_COMPONENTS)?,
        normalize_weights: fields.i64(field::NORMALIZE_WEIGHTS)?,
        deform_user_normals: fields.bool(field::DEFORM_USER_NORMALS)?,
    };

    let mut record = SkinRecord::new(
        fields.string(field::NAME)?,
        fields.string(field::GEOMETRY)?,
        fields.str_array(field::INFLUENCES)?,
        weights,
        vertex_count,
    )?
    .with_secondary_weights(fields.f64_array(field::SECONDARY_WEIGHTS)?)
    .with_attributes(attributes);

    // Older files may not carry the deformer type.
    if fields.get(field::DEFORMER_TYPE).is_some() {
        record = record.with_deformer_type(fields.string(field::DEFORMER_TYPE)?);
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::writer::encode_body;

    #[test]
    fn test_parse_header() {
        let header = crate::record::writer::encode_header(FLAG_COMPRESSED);
        let parsed = parse_header(&header).unwrap();
        assert_eq!(parsed.version, CURRENT_VERSION);
        assert!(parsed.is_compressed());

        let mut bad = header;
        bad[0] = b'X';
        assert!(matches!(parse_header(&bad), Err(Error::InvalidMagic)));

        let mut future = header;
        future[VERSION_OFFSET] = 9;
        assert!(matches!(parse_header(&future), Err(Error::UnsupportedVersion(9))));

        assert!(matches!(parse_header(&header[..4]), Err(Error::UnexpectedEof(4))));
    }

    #[test]
    fn test_unknown_tag_is_skipped() {
        let body = encode_body(&[
            ("future", FieldValue::Unknown(42)),
            ("count", FieldValue::I64(7)),
        ])
        .unwrap();
        let table = decode_body(&body).unwrap();
        assert_eq!(table.get("future"), Some(&FieldValue::Unknown(42)));
        assert_eq!(table.i64("count").unwrap(), 7);
    }

    #[test]
    fn test_truncated_value() {
        let body = encode_body(&[("w", FieldValue::F64Array(vec![1.0, 2.0]))]).unwrap();
        let err = decode_body(&body[..body.len() - 3]).unwrap_err();
        assert!(matches!(err, Error::UnexpectedEof(_)));
    }

    #[test]
    fn test_legend_longer_than_values() {
        // Legend claims a second entry that has no value.
        let mut w = crate::record::writer::BodyWriter::new();
        w.write_legend(["a", "b"].into_iter()).unwrap();
        w.write_value(&FieldValue::I64(1)).unwrap();
        let body = w.into_bytes();
        let table = decode_body(&body).unwrap();
        assert_eq!(table.len(), 1);
        assert!(matches!(table.i64("b"), Err(Error::MissingField(_))));
    }
}
