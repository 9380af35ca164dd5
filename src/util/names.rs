//! Object name helpers.
//!
//! Scene object names may carry a DAG path (`|grp|body`) and a namespace
//! (`char:body`). Artifact file names are built from the bare name.

/// Last segment of a `|`-separated DAG path.
pub fn short_name(name: &str) -> &str {
    name.rsplit('|').next().unwrap_or(name)
}

/// Name with any `ns:` prefixes removed (applied to the short name).
pub fn strip_namespace(name: &str) -> &str {
    let short = short_name(name);
    short.rsplit(':').next().unwrap_or(short)
}

/// Object name encoded in an artifact file name: everything before the first `.`.
pub fn object_name_from_file(file_name: &str) -> &str {
    file_name.split('.').next().unwrap_or(file_name)
}
