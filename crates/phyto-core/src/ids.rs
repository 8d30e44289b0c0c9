//! ID prefix constants.
//!
//! Every entity ID is `<prefix>-<8 hex chars>`, generated by the database
//! (see `PhytoDb::generate_id`).

pub const PREFIX_PLANT_TYPE: &str = "plt";
pub const PREFIX_SYMPTOM: &str = "sym";
pub const PREFIX_DISEASE: &str = "dis";
pub const PREFIX_DIAGNOSIS_CACHE: &str = "dgc";

/// All known prefixes, in table order.
pub const ALL_PREFIXES: &[&str] = &[
    PREFIX_PLANT_TYPE,
    PREFIX_SYMPTOM,
    PREFIX_DISEASE,
    PREFIX_DIAGNOSIS_CACHE,
];

/// Split a prefixed ID into `(prefix, random_part)`.
#[must_use]
pub fn split_id(id: &str) -> Option<(&str, &str)> {
    let (prefix, rest) = id.split_once('-')?;
    if prefix.is_empty() || rest.is_empty() {
        return None;
    }
    Some((prefix, rest))
}

/// Whether `id` carries the given prefix.
#[must_use]
pub fn has_prefix(id: &str, prefix: &str) -> bool {
    split_id(id).is_some_and(|(p, _)| p == prefix)
}
