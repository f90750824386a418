//! Deciding whether a device is in scope.
//!
//! Each limitation and exclusion category gives a tri-state verdict:
//! `None` when the category is empty and has no opinion, `Some(true)` when
//! the device matches it and `Some(false)` when it does not. Empty categories
//! therefore never limit or exclude anything.

use super::directory::ScopeDirectory;
use super::keys::{Partition, ScopeId, ScopeKey};
use super::scope::Scope;
use crate::error::{ModelError, ModelResult};

use log::trace;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::net::IpAddr;

/// The device facts scope evaluation looks at.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScopeSubject {
    pub id: u64,
    pub managed: bool,
    pub group_ids: BTreeSet<u64>,
    pub building_id: Option<u64>,
    pub department_id: Option<u64>,
    pub ip_address: Option<IpAddr>,
    pub username: Option<String>,
}

impl ScopeSubject {
    /// A managed device with no other facts.
    pub fn new(id: u64) -> Self {
        Self {
            id,
            managed: true,
            ..Self::default()
        }
    }

    pub fn unmanaged(mut self) -> Self {
        self.managed = false;
        self
    }

    pub fn in_groups(mut self, groups: impl IntoIterator<Item = u64>) -> Self {
        self.group_ids.extend(groups);
        self
    }

    pub fn in_building(mut self, building_id: u64) -> Self {
        self.building_id = Some(building_id);
        self
    }

    pub fn in_department(mut self, department_id: u64) -> Self {
        self.department_id = Some(department_id);
        self
    }

    pub fn at_address(mut self, address: IpAddr) -> Self {
        self.ip_address = Some(address);
        self
    }

    pub fn used_by(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }
}

impl Scope {
    /// Targeted, within every limitation and not excluded.
    pub fn in_scope<D>(&self, directory: &D, subject: &ScopeSubject) -> ModelResult<bool>
    where
        D: ScopeDirectory + ?Sized,
    {
        let result = self.is_target(subject)
            && self.within_limitations(directory, subject)?
            && !self.is_excluded(directory, subject)?;
        trace!("Device {} in scope: {}", subject.id, result);
        Ok(result)
    }

    /// Evaluate a device fetched from the directory.
    pub fn in_scope_by_id<D>(&self, directory: &D, id: u64) -> ModelResult<bool>
    where
        D: ScopeDirectory + ?Sized,
    {
        let subject = directory
            .subject(self.target_kind(), id)?
            .ok_or_else(|| {
                ModelError::no_such_item(self.target_kind().device_key().classic_item(), id.to_string())
            })?;
        self.in_scope(directory, &subject)
    }

    /// Managed and matched by the all-targets flag or a target category.
    pub fn is_target(&self, subject: &ScopeSubject) -> bool {
        if !subject.managed {
            return false;
        }
        if self.all_targets() {
            return true;
        }
        self.entity_verdict(Partition::Targets, subject) == Some(true)
    }

    /// No populated limitation category rejects the device.
    pub fn within_limitations<D>(&self, directory: &D, subject: &ScopeSubject) -> ModelResult<bool>
    where
        D: ScopeDirectory + ?Sized,
    {
        let verdicts = [
            self.network_segment_verdict(directory, Partition::Limitations, subject)?,
            self.ldap_user_verdict(Partition::Limitations, subject),
            self.ldap_group_verdict(directory, Partition::Limitations, subject)?,
        ];
        Ok(!verdicts.contains(&Some(false)))
    }

    /// Any populated exclusion category matches the device.
    pub fn is_excluded<D>(&self, directory: &D, subject: &ScopeSubject) -> ModelResult<bool>
    where
        D: ScopeDirectory + ?Sized,
    {
        if self.entity_verdict(Partition::Exclusions, subject) == Some(true) {
            return Ok(true);
        }
        Ok(
            self.network_segment_verdict(directory, Partition::Exclusions, subject)? == Some(true)
                || self.ldap_user_verdict(Partition::Exclusions, subject) == Some(true)
                || self.ldap_group_verdict(directory, Partition::Exclusions, subject)? == Some(true),
        )
    }

    /// Device id, group, building and department categories.
    ///
    /// Org-level user categories are carried for the server but play no part
    /// in device evaluation.
    fn entity_verdict(&self, partition: Partition, subject: &ScopeSubject) -> Option<bool> {
        let kind = self.target_kind();
        let checks: [(ScopeKey, &dyn Fn(u64) -> bool); 4] = [
            (kind.device_key(), &|id: u64| id == subject.id),
            (kind.group_key(), &|id: u64| subject.group_ids.contains(&id)),
            (ScopeKey::Buildings, &|id: u64| subject.building_id == Some(id)),
            (ScopeKey::Departments, &|id: u64| subject.department_id == Some(id)),
        ];
        let mut verdict = None;
        for (key, matches) in checks {
            let members = self.members(partition, key);
            if members.is_empty() {
                continue;
            }
            if members.iter().filter_map(ScopeId::as_id).any(matches) {
                return Some(true);
            }
            verdict = Some(false);
        }
        verdict
    }

    fn network_segment_verdict<D>(
        &self,
        directory: &D,
        partition: Partition,
        subject: &ScopeSubject,
    ) -> ModelResult<Option<bool>>
    where
        D: ScopeDirectory + ?Sized,
    {
        let members = self.members(partition, ScopeKey::NetworkSegments);
        if members.is_empty() {
            return Ok(None);
        }
        let Some(address) = subject.ip_address else {
            return Ok(Some(false));
        };
        let listed: BTreeSet<u64> = members.iter().filter_map(ScopeId::as_id).collect();
        let inside = directory
            .network_segments()?
            .iter()
            .filter(|segment| listed.contains(&segment.id()))
            .any(|segment| segment.contains(address));
        Ok(Some(inside))
    }

    fn ldap_user_verdict(&self, partition: Partition, subject: &ScopeSubject) -> Option<bool> {
        let members = self.members(partition, ScopeKey::LdapUsers);
        if members.is_empty() {
            return None;
        }
        let Some(username) = subject.username.as_deref() else {
            return Some(false);
        };
        Some(
            members
                .iter()
                .filter_map(ScopeId::as_name)
                .any(|name| name.eq_ignore_ascii_case(username)),
        )
    }

    fn ldap_group_verdict<D>(
        &self,
        directory: &D,
        partition: Partition,
        subject: &ScopeSubject,
    ) -> ModelResult<Option<bool>>
    where
        D: ScopeDirectory + ?Sized,
    {
        let members = self.members(partition, ScopeKey::LdapUserGroups);
        if members.is_empty() {
            return Ok(None);
        }
        let Some(username) = subject.username.as_deref() else {
            return Ok(Some(false));
        };
        for group in members.iter().filter_map(ScopeId::as_name) {
            if directory.ldap_user_in_group(username, group)? {
                return Ok(Some(true));
            }
        }
        Ok(Some(false))
    }
}
