//! Connection descriptor for provisioning tools

use brightbox_cloud::ConnectionInfo;

/// SSH descriptor for the first non-empty host candidate
///
/// Candidates are given in order of preference. Returns `None` when no host
/// is known.
pub fn ssh(hosts: &[Option<&str>], user: Option<&str>) -> Option<ConnectionInfo> {
    let host = hosts.iter().flatten().find(|h| !h.is_empty())?;
    let user = user.filter(|u| !u.is_empty()).map(str::to_string);
    Some(ConnectionInfo::ssh(*host).with_user(user))
}
