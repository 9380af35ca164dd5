//! Skin record file format constants.
//!
//! ```text
//! [0..6)   magic "SKINIO"
//! [6..8)   format version, u16 LE
//! [8]      flags (bit 0: body is zlib-compressed)
//! [9..16)  reserved, zero
//! [16..)   body
//! ```
//!
//! Body: `u64` legend count, then that many `u64`-length-prefixed UTF-8 field
//! names, then one value per legend entry in the same order. Each value is
//! `tag: u8`, `len: u64`, `len` payload bytes. All integers are little-endian.

/// Magic bytes at the start of a record file.
pub const RECORD_MAGIC: &[u8; 6] = b"SKINIO";

/// Size of the file header in bytes.
pub const HEADER_SIZE: usize = 16;

/// Offset of the format version in the header.
pub const VERSION_OFFSET: usize = 6;

/// Offset of the flags byte in the header.
pub const FLAGS_OFFSET: usize = 8;

/// Current record format version.
pub const CURRENT_VERSION: u16 = 1;

/// Body is zlib-compressed (see [`super::compression`]).
pub const FLAG_COMPRESSED: u8 = 0x01;

/// Default artifact extension.
pub const RECORD_EXT: &str = ".skinrecord";

/// Default pack manifest extension.
pub const PACK_EXT: &str = ".skinpack";

/// Deformer type written when none is given.
pub const DEFAULT_DEFORMER_TYPE: &str = "skinCluster";

// Value tags.
pub const TAG_F64_ARRAY: u8 = 1;
pub const TAG_I64_ARRAY: u8 = 2;
pub const TAG_STR_ARRAY: u8 = 3;
pub const TAG_STR: u8 = 4;
pub const TAG_I64: u8 = 5;
pub const TAG_F64: u8 = 6;
pub const TAG_BOOL: u8 = 7;

/// Field names, in the order they are written.
pub mod field {
    pub const WEIGHTS: &str = "weights";
    pub const ROW_OFFSETS: &str = "row_offsets";
    pub const INFLUENCE_INDICES: &str = "influence_indices";
    pub const INFLUENCES: &str = "influences";
    pub const GEOMETRY: &str = "geometry";
    pub const SECONDARY_WEIGHTS: &str = "secondary_weights";
    pub const VERTEX_COUNT: &str = "vertex_count";
    pub const NAME: &str = "name";
    pub const ENVELOPE: &str = "envelope";
    pub const SKINNING_METHOD: &str = "skinning_method";
    pub const USE_COMPONENTS: &str = "use_components";
    pub const NORMALIZE_WEIGHTS: &str = "normalize_weights";
    pub const DEFORM_USER_NORMALS: &str = "deform_user_normals";
    pub const DEFORMER_TYPE: &str = "deformer_type";
}

/// Legend names written by older exporters, mapped to the current field name.
pub const LEGACY_FIELD_NAMES: &[(&str, &str)] = &[
    ("weightsNonZero_Array", field::WEIGHTS),
    ("vertSplit_Array", field::ROW_OFFSETS),
    ("infMap_Array", field::INFLUENCE_INDICES),
    ("inf_Array", field::INFLUENCES),
    ("blendWeights", field::SECONDARY_WEIGHTS),
    ("vtxCount", field::VERTEX_COUNT),
    ("skinningMethod", field::SKINNING_METHOD),
    ("useComponents", field::USE_COMPONENTS),
    ("normalizeWeights", field::NORMALIZE_WEIGHTS),
    ("deformUserNormals", field::DEFORM_USER_NORMALS),
    ("type", field::DEFORMER_TYPE),
];

/// Current field name for a legend entry (legacy names are translated).
pub fn canonical_field_name(name: &str) -> &str {
    LEGACY_FIELD_NAMES
        .iter()
        .find(|(legacy, _)| *legacy == name)
        .map(|(_, current)| *current)
        .unwrap_or(name)
}

/// Human-readable name of a value tag.
pub fn tag_name(tag: u8) -> &'static str {
    match tag {
        TAG_F64_ARRAY => "f64[]",
        TAG_I64_ARRAY => "i64[]",
        TAG_STR_ARRAY => "string[]",
        TAG_STR => "string",
        TAG_I64 => "i64",
        TAG_F64 => "f64",
        TAG_BOOL => "bool",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_field_name() {
        assert_eq!(canonical_field_name("vertSplit_Array"), field::ROW_OFFSETS);
        assert_eq!(canonical_field_name("type"), field::DEFORMER_TYPE);
        assert_eq!(canonical_field_name(field::WEIGHTS), field::WEIGHTS);
        assert_eq!(canonical_field_name("geometry"), field::GEOMETRY);
    }
}
