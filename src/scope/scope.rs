//! The scope value object and its mutations.

use super::directory::ScopeDirectory;
use super::keys::{Partition, ScopeId, ScopeKey, TargetKind};
use crate::config::ScopeConfig;
use crate::error::{ModelError, ModelResult};
use crate::xml::XmlElement;

use log::{debug, warn};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// The kind of resource that owns a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScopeOwner {
    #[default]
    Policy,
    ConfigurationProfile,
    AppStoreApp,
    Other,
}

impl ScopeOwner {
    /// Owners whose classic endpoints drop org-level user targets and
    /// exclusions when the scope is saved.
    pub fn drops_user_scope(&self) -> bool {
        matches!(self, Self::ConfigurationProfile | Self::AppStoreApp)
    }
}

/// Targets, limitations and exclusions of one scopable resource.
#[derive(Debug, Clone, PartialEq)]
pub struct Scope {
    target_kind: TargetKind,
    owner: ScopeOwner,
    config: ScopeConfig,
    all_targets: bool,
    targets: BTreeMap<ScopeKey, Vec<ScopeId>>,
    limitations: BTreeMap<ScopeKey, Vec<ScopeId>>,
    exclusions: BTreeMap<ScopeKey, Vec<ScopeId>>,
    needs_update: bool,
}

impl Scope {
    /// An empty scope.
    pub fn new(target_kind: TargetKind, config: ScopeConfig) -> Self {
        Self {
            target_kind,
            owner: ScopeOwner::default(),
            config,
            all_targets: false,
            targets: BTreeMap::new(),
            limitations: BTreeMap::new(),
            exclusions: BTreeMap::new(),
            needs_update: false,
        }
    }

    pub fn with_owner(mut self, owner: ScopeOwner) -> Self {
        self.owner = owner;
        self
    }

    /// Parse a classic scope object.
    ///
    /// Members are taken as given; nothing is resolved against a directory.
    pub fn from_classic(target_kind: TargetKind, config: ScopeConfig, raw: &Value) -> ModelResult<Self> {
        if !raw.is_object() {
            return Err(ModelError::invalid_data("Scope must be a JSON object"));
        }
        let mut scope = Self::new(target_kind, config);
        scope.all_targets = raw
            .get(target_kind.all_targets_key())
            .and_then(Value::as_bool)
            .unwrap_or(false);

        for key in Partition::Targets.keys(target_kind) {
            let members = parse_members(key, raw.get(key.classic_key()))?;
            if !members.is_empty() {
                scope.targets.insert(key, members);
            }
        }
        let limitations = raw.get("limitations");
        for key in Partition::Limitations.keys(target_kind) {
            let members = parse_members(key, limitations.and_then(|l| l.get(key.classic_key())))?;
            if !members.is_empty() {
                scope.limitations.insert(key, members);
            }
        }
        // Some owners carry directory-service limitations at the top level
        if let Some(limit_to_users) = raw.get("limit_to_users") {
            for key in [ScopeKey::LdapUsers, ScopeKey::LdapUserGroups] {
                let members = parse_members(key, limit_to_users.get(key.classic_key()))?;
                for member in members {
                    push_unique(scope.limitations.entry(key).or_default(), member);
                }
            }
        }
        let exclusions = raw.get("exclusions");
        for key in Partition::Exclusions.keys(target_kind) {
            let members = parse_members(key, exclusions.and_then(|e| e.get(key.classic_key())))?;
            if !members.is_empty() {
                scope.exclusions.insert(key, members);
            }
        }
        debug!(
            "Parsed {:?} scope: all_targets={}, {} target keys, {} limitation keys, {} exclusion keys",
            target_kind,
            scope.all_targets,
            scope.targets.len(),
            scope.limitations.len(),
            scope.exclusions.len()
        );
        Ok(scope)
    }

    pub fn target_kind(&self) -> TargetKind {
        self.target_kind
    }

    pub fn owner(&self) -> ScopeOwner {
        self.owner
    }

    pub fn config(&self) -> &ScopeConfig {
        &self.config
    }

    pub fn all_targets(&self) -> bool {
        self.all_targets
    }

    pub fn targets(&self, key: ScopeKey) -> &[ScopeId] {
        members_of(&self.targets, key)
    }

    pub fn limitations(&self, key: ScopeKey) -> &[ScopeId] {
        members_of(&self.limitations, key)
    }

    pub fn exclusions(&self, key: ScopeKey) -> &[ScopeId] {
        members_of(&self.exclusions, key)
    }

    /// Members of one key in one partition.
    pub fn members(&self, partition: Partition, key: ScopeKey) -> &[ScopeId] {
        members_of(self.partition(partition), key)
    }

    /// True after any successful mutation since construction or the last save.
    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    /// Mark the scope as saved.
    pub fn clear_needs_update(&mut self) {
        self.needs_update = false;
    }

    /// Target every device; the explicit target lists are cleared.
    pub fn set_all_targets(&mut self) {
        if self.all_targets && self.targets.is_empty() {
            return;
        }
        self.all_targets = true;
        self.targets.clear();
        self.needs_update = true;
    }

    pub fn clear_all_targets(&mut self) {
        if self.all_targets {
            self.all_targets = false;
            self.needs_update = true;
        }
    }

    /// Replace the targets of one key. Adding targets clears the all-targets flag.
    pub fn set_targets<D, I, S>(&mut self, directory: &D, key: ScopeKey, identifiers: I) -> ModelResult<()>
    where
        D: ScopeDirectory + ?Sized,
        I: IntoIterator<Item = S>,
        S: fmt::Display,
    {
        self.set_members(directory, Partition::Targets, key, identifiers)
    }

    pub fn add_target<D>(&mut self, directory: &D, key: ScopeKey, identifier: impl fmt::Display) -> ModelResult<()>
    where
        D: ScopeDirectory + ?Sized,
    {
        self.add_member(directory, Partition::Targets, key, identifier)
    }

    /// Remove a target; returns whether it was present.
    pub fn remove_target<D>(&mut self, directory: &D, key: ScopeKey, identifier: impl fmt::Display) -> ModelResult<bool>
    where
        D: ScopeDirectory + ?Sized,
    {
        self.remove_member(directory, Partition::Targets, key, identifier)
    }

    pub fn set_limitations<D, I, S>(&mut self, directory: &D, key: ScopeKey, identifiers: I) -> ModelResult<()>
    where
        D: ScopeDirectory + ?Sized,
        I: IntoIterator<Item = S>,
        S: fmt::Display,
    {
        self.set_members(directory, Partition::Limitations, key, identifiers)
    }

    pub fn add_limitation<D>(&mut self, directory: &D, key: ScopeKey, identifier: impl fmt::Display) -> ModelResult<()>
    where
        D: ScopeDirectory + ?Sized,
    {
        self.add_member(directory, Partition::Limitations, key, identifier)
    }

    pub fn remove_limitation<D>(&mut self, directory: &D, key: ScopeKey, identifier: impl fmt::Display) -> ModelResult<bool>
    where
        D: ScopeDirectory + ?Sized,
    {
        self.remove_member(directory, Partition::Limitations, key, identifier)
    }

    pub fn set_exclusions<D, I, S>(&mut self, directory: &D, key: ScopeKey, identifiers: I) -> ModelResult<()>
    where
        D: ScopeDirectory + ?Sized,
        I: IntoIterator<Item = S>,
        S: fmt::Display,
    {
        self.set_members(directory, Partition::Exclusions, key, identifiers)
    }

    pub fn add_exclusion<D>(&mut self, directory: &D, key: ScopeKey, identifier: impl fmt::Display) -> ModelResult<()>
    where
        D: ScopeDirectory + ?Sized,
    {
        self.add_member(directory, Partition::Exclusions, key, identifier)
    }

    pub fn remove_exclusion<D>(&mut self, directory: &D, key: ScopeKey, identifier: impl fmt::Display) -> ModelResult<bool>
    where
        D: ScopeDirectory + ?Sized,
    {
        self.remove_member(directory, Partition::Exclusions, key, identifier)
    }

    /// Resolve a human identifier to the canonical member id for `key`.
    pub fn resolve<D>(&self, directory: &D, key: ScopeKey, identifier: &str) -> ModelResult<ScopeId>
    where
        D: ScopeDirectory + ?Sized,
    {
        let found = match key {
            ScopeKey::LdapUsers => directory
                .ldap_user_exists(identifier)?
                .then(|| ScopeId::Name(identifier.to_string())),
            ScopeKey::LdapUserGroups => directory
                .ldap_group_exists(identifier)?
                .then(|| ScopeId::Name(identifier.to_string())),
            _ => directory.valid_id(key, identifier)?.map(ScopeId::Id),
        };
        found.ok_or_else(|| ModelError::no_such_item(key.classic_item(), identifier))
    }

    /// `<scope>` element for classic writes.
    ///
    /// Warns when the owner is known to drop populated user scope on save.
    pub fn to_xml(&self) -> XmlElement {
        self.warn_on_data_loss();

        let mut xml = XmlElement::new("scope").child(XmlElement::with_text(
            self.target_kind.all_targets_key(),
            self.all_targets,
        ));
        for key in Partition::Targets.keys(self.target_kind) {
            xml.push(members_xml(key, self.targets(key)));
        }
        let mut limitations = XmlElement::new("limitations");
        for key in Partition::Limitations.keys(self.target_kind) {
            limitations.push(members_xml(key, self.limitations(key)));
        }
        xml.push(limitations);
        let mut exclusions = XmlElement::new("exclusions");
        for key in Partition::Exclusions.keys(self.target_kind) {
            exclusions.push(members_xml(key, self.exclusions(key)));
        }
        xml.push(exclusions);
        xml
    }

    /// Whether saving this scope through its owner would silently drop
    /// populated user or user group targets or exclusions.
    ///
    /// Always false when the warning is suppressed in the config.
    pub fn data_loss_at_risk(&self) -> bool {
        if self.config.suppress_data_loss_warning || !self.owner.drops_user_scope() {
            return false;
        }
        [ScopeKey::Users, ScopeKey::UserGroups]
            .into_iter()
            .any(|key| !self.targets(key).is_empty() || !self.exclusions(key).is_empty())
    }

    fn warn_on_data_loss(&self) {
        if self.data_loss_at_risk() {
            warn!(
                "{:?} scopes lose user and user group targets and exclusions when saved; \
                 re-check them after saving",
                self.owner
            );
        }
    }

    fn partition(&self, partition: Partition) -> &BTreeMap<ScopeKey, Vec<ScopeId>> {
        match partition {
            Partition::Targets => &self.targets,
            Partition::Limitations => &self.limitations,
            Partition::Exclusions => &self.exclusions,
        }
    }

    fn partition_mut(&mut self, partition: Partition) -> &mut BTreeMap<ScopeKey, Vec<ScopeId>> {
        match partition {
            Partition::Targets => &mut self.targets,
            Partition::Limitations => &mut self.limitations,
            Partition::Exclusions => &mut self.exclusions,
        }
    }

    /// Fail when `id` already sits in a partition opposing `partition`.
    fn check_conflict(&self, partition: Partition, key: ScopeKey, id: &ScopeId) -> ModelResult<()> {
        let opposing: &[Partition] = match partition {
            Partition::Targets | Partition::Limitations => &[Partition::Exclusions],
            Partition::Exclusions => &[Partition::Targets, Partition::Limitations],
        };
        for other in opposing {
            if self.members(*other, key).iter().any(|m| m.matches(id)) {
                return Err(ModelError::already_exists(format!(
                    "{} '{}' is already in the scope {}",
                    key.classic_item(),
                    id,
                    other.as_str()
                )));
            }
        }
        Ok(())
    }

    fn set_members<D, I, S>(
        &mut self,
        directory: &D,
        partition: Partition,
        key: ScopeKey,
        identifiers: I,
    ) -> ModelResult<()>
    where
        D: ScopeDirectory + ?Sized,
        I: IntoIterator<Item = S>,
        S: fmt::Display,
    {
        partition.check(self.target_kind, key)?;
        let mut resolved = Vec::new();
        for identifier in identifiers {
            let id = self.resolve(directory, key, &identifier.to_string())?;
            self.check_conflict(partition, key, &id)?;
            push_unique(&mut resolved, id);
        }
        if self.members(partition, key) == resolved.as_slice() {
            return Ok(());
        }
        debug!("Setting {} {} to {} members", partition.as_str(), key, resolved.len());
        if resolved.is_empty() {
            self.partition_mut(partition).remove(&key);
        } else {
            if partition == Partition::Targets {
                self.all_targets = false;
            }
            self.partition_mut(partition).insert(key, resolved);
        }
        self.needs_update = true;
        Ok(())
    }

    fn add_member<D>(
        &mut self,
        directory: &D,
        partition: Partition,
        key: ScopeKey,
        identifier: impl fmt::Display,
    ) -> ModelResult<()>
    where
        D: ScopeDirectory + ?Sized,
    {
        partition.check(self.target_kind, key)?;
        let id = self.resolve(directory, key, &identifier.to_string())?;
        if self.members(partition, key).iter().any(|m| m.matches(&id)) {
            return Ok(());
        }
        self.check_conflict(partition, key, &id)?;
        debug!("Adding {} '{}' to scope {}", key.classic_item(), id, partition.as_str());
        if partition == Partition::Targets {
            self.all_targets = false;
        }
        self.partition_mut(partition).entry(key).or_default().push(id);
        self.needs_update = true;
        Ok(())
    }

    fn remove_member<D>(
        &mut self,
        directory: &D,
        partition: Partition,
        key: ScopeKey,
        identifier: impl fmt::Display,
    ) -> ModelResult<bool>
    where
        D: ScopeDirectory + ?Sized,
    {
        partition.check(self.target_kind, key)?;
        let id = self.resolve(directory, key, &identifier.to_string())?;
        let members = self.partition_mut(partition);
        let Some(list) = members.get_mut(&key) else {
            return Ok(false);
        };
        let before = list.len();
        list.retain(|m| !m.matches(&id));
        let removed = list.len() != before;
        if list.is_empty() {
            members.remove(&key);
        }
        if removed {
            debug!("Removed {} '{}' from scope {}", key.classic_item(), id, partition.as_str());
            self.needs_update = true;
        }
        Ok(removed)
    }
}

fn members_of(map: &BTreeMap<ScopeKey, Vec<ScopeId>>, key: ScopeKey) -> &[ScopeId] {
    map.get(&key).map(Vec::as_slice).unwrap_or(&[])
}

fn push_unique(list: &mut Vec<ScopeId>, id: ScopeId) {
    if !list.iter().any(|m| m.matches(&id)) {
        list.push(id);
    }
}

fn parse_members(key: ScopeKey, raw: Option<&Value>) -> ModelResult<Vec<ScopeId>> {
    let items = match raw {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(ModelError::invalid_data(format!(
                "Scope {} must be an array, got {}",
                key, other
            )));
        }
    };
    let mut members = Vec::with_capacity(items.len());
    for item in items {
        let id = if key.is_directory_service() {
            item.get("name")
                .and_then(Value::as_str)
                .or_else(|| item.as_str())
                .map(|name| ScopeId::Name(name.to_string()))
        } else {
            item.get("id")
                .and_then(|id| id.as_u64().or_else(|| id.as_str().and_then(|s| s.parse().ok())))
                .map(ScopeId::Id)
        };
        let id = id.ok_or_else(|| {
            ModelError::invalid_data(format!("Unreadable {} entry in scope: {}", key.classic_item(), item))
        })?;
        push_unique(&mut members, id);
    }
    Ok(members)
}

fn members_xml(key: ScopeKey, members: &[ScopeId]) -> XmlElement {
    let mut list = XmlElement::new(key.classic_key());
    for member in members {
        let field = match member {
            ScopeId::Id(id) => XmlElement::with_text("id", id),
            ScopeId::Name(name) => XmlElement::with_text("name", name),
        };
        list.push(XmlElement::new(key.classic_item()).child(field));
    }
    list
}
