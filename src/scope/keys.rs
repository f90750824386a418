//! Scope keys, partitions and canonical identifiers.

use crate::error::{ModelError, ModelResult};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One category of scope membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKey {
    Computers,
    ComputerGroups,
    MobileDevices,
    MobileDeviceGroups,
    Buildings,
    Departments,
    /// Org-level users
    Users,
    /// Org-level user groups
    UserGroups,
    NetworkSegments,
    /// Directory-service users, identified by name
    LdapUsers,
    /// Directory-service groups, identified by name
    LdapUserGroups,
}

impl ScopeKey {
    pub const ALL: [ScopeKey; 11] = [
        Self::Computers,
        Self::ComputerGroups,
        Self::MobileDevices,
        Self::MobileDeviceGroups,
        Self::Buildings,
        Self::Departments,
        Self::Users,
        Self::UserGroups,
        Self::NetworkSegments,
        Self::LdapUsers,
        Self::LdapUserGroups,
    ];

    /// Element name of the list in classic payloads.
    pub fn classic_key(&self) -> &'static str {
        match self {
            Self::Computers => "computers",
            Self::ComputerGroups => "computer_groups",
            Self::MobileDevices => "mobile_devices",
            Self::MobileDeviceGroups => "mobile_device_groups",
            Self::Buildings => "buildings",
            Self::Departments => "departments",
            Self::Users => "jss_users",
            Self::UserGroups => "jss_user_groups",
            Self::NetworkSegments => "network_segments",
            Self::LdapUsers => "users",
            Self::LdapUserGroups => "user_groups",
        }
    }

    /// Element name of one list item in classic payloads.
    pub fn classic_item(&self) -> &'static str {
        match self {
            Self::Computers => "computer",
            Self::ComputerGroups => "computer_group",
            Self::MobileDevices => "mobile_device",
            Self::MobileDeviceGroups => "mobile_device_group",
            Self::Buildings => "building",
            Self::Departments => "department",
            Self::Users => "jss_user",
            Self::UserGroups => "jss_user_group",
            Self::NetworkSegments => "network_segment",
            Self::LdapUsers => "user",
            Self::LdapUserGroups => "user_group",
        }
    }

    /// Directory-service keys hold names rather than numeric ids.
    pub fn is_directory_service(&self) -> bool {
        matches!(self, Self::LdapUsers | Self::LdapUserGroups)
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.classic_key())
    }
}

impl FromStr for ScopeKey {
    type Err = ModelError;

    /// Accepts singular or plural forms in snake, space, kebab or camel case,
    /// plus the `limit_to_` prefix used for directory-service limitations.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        let (limit_prefix, stem) = match normalized.strip_prefix("limit_to_") {
            Some(rest) => (true, rest),
            None => (false, normalized.as_str()),
        };
        let stem = stem.strip_suffix('s').unwrap_or(stem);
        let key = match (limit_prefix, stem) {
            (false, "computer") => Self::Computers,
            (false, "computer_group") => Self::ComputerGroups,
            (false, "mobile_device") => Self::MobileDevices,
            (false, "mobile_device_group") => Self::MobileDeviceGroups,
            (false, "building") => Self::Buildings,
            (false, "department") => Self::Departments,
            (false, "user" | "jss_user") => Self::Users,
            (false, "user_group" | "jss_user_group") => Self::UserGroups,
            (false, "network_segment" | "segment") => Self::NetworkSegments,
            (_, "ldap_user" | "directory_service_user") | (true, "user") => Self::LdapUsers,
            (_, "ldap_user_group" | "directory_service_user_group") | (true, "user_group") => {
                Self::LdapUserGroups
            }
            _ => {
                return Err(ModelError::invalid_data(format!(
                    "Unknown scope key '{}'",
                    s
                )));
            }
        };
        Ok(key)
    }
}

fn normalize(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    let mut prev_lower = false;
    for c in s.trim().chars() {
        match c {
            ' ' | '-' => out.push('_'),
            c if c.is_ascii_uppercase() => {
                if prev_lower {
                    out.push('_');
                }
                out.push(c.to_ascii_lowercase());
            }
            c => out.push(c),
        }
        prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
    }
    out
}

/// The kind of device a scope applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Computers,
    MobileDevices,
}

impl TargetKind {
    /// Classic flag name for "every device".
    pub fn all_targets_key(&self) -> &'static str {
        match self {
            Self::Computers => "all_computers",
            Self::MobileDevices => "all_mobile_devices",
        }
    }

    /// Key holding directly targeted devices.
    pub fn device_key(&self) -> ScopeKey {
        match self {
            Self::Computers => ScopeKey::Computers,
            Self::MobileDevices => ScopeKey::MobileDevices,
        }
    }

    /// Key holding targeted device groups.
    pub fn group_key(&self) -> ScopeKey {
        match self {
            Self::Computers => ScopeKey::ComputerGroups,
            Self::MobileDevices => ScopeKey::MobileDeviceGroups,
        }
    }
}

/// The three sections of a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    Targets,
    Limitations,
    Exclusions,
}

impl Partition {
    /// Keys this partition accepts for a target kind, in classic order.
    pub fn keys(&self, kind: TargetKind) -> Vec<ScopeKey> {
        let targets = [
            kind.device_key(),
            kind.group_key(),
            ScopeKey::Buildings,
            ScopeKey::Departments,
            ScopeKey::Users,
            ScopeKey::UserGroups,
        ];
        let limitations = [
            ScopeKey::NetworkSegments,
            ScopeKey::LdapUsers,
            ScopeKey::LdapUserGroups,
        ];
        match self {
            Self::Targets => targets.to_vec(),
            Self::Limitations => limitations.to_vec(),
            Self::Exclusions => targets.into_iter().chain(limitations).collect(),
        }
    }

    pub fn accepts(&self, kind: TargetKind, key: ScopeKey) -> bool {
        self.keys(kind).contains(&key)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Targets => "targets",
            Self::Limitations => "limitations",
            Self::Exclusions => "exclusions",
        }
    }

    pub(crate) fn check(&self, kind: TargetKind, key: ScopeKey) -> ModelResult<()> {
        if self.accepts(kind, key) {
            Ok(())
        } else {
            Err(ModelError::invalid_data(format!(
                "Scope key '{}' is not valid in {} for {:?} scopes",
                key,
                self.as_str(),
                kind
            )))
        }
    }
}

/// Canonical scope member: a numeric id, or a name for directory-service entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScopeId {
    Id(u64),
    Name(String),
}

impl ScopeId {
    pub fn as_id(&self) -> Option<u64> {
        match self {
            Self::Id(id) => Some(*id),
            Self::Name(_) => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Id(_) => None,
            Self::Name(name) => Some(name),
        }
    }

    /// Ids compare exactly; names compare case-insensitively.
    pub fn matches(&self, other: &ScopeId) -> bool {
        match (self, other) {
            (Self::Id(a), Self::Id(b)) => a == b,
            (Self::Name(a), Self::Name(b)) => a.eq_ignore_ascii_case(b),
            _ => false,
        }
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{}", id),
            Self::Name(name) => f.write_str(name),
        }
    }
}

impl From<u64> for ScopeId {
    fn from(id: u64) -> Self {
        Self::Id(id)
    }
}
