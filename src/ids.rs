/// Unit ids arrive as IMEI suffixes and are matched against the
/// `imei:`-prefixed ids in storage; anything of 10 characters or fewer is too
/// short to identify a unit.
pub(crate) fn verify_unit_id(id: &str) -> bool {
    id.len() > 10
}
