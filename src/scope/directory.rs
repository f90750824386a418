//! Lookups the scope engine needs to resolve and evaluate memberships.
//!
//! [`ScopeDirectory`] is implemented by callers on top of their
//! [`Connection`](crate::resource::Connection). [`CachedDirectory`] memoizes
//! the lookups that do not change during a session, and [`MemoryDirectory`]
//! serves fixed data for tests and offline use.
//!
//! # Example
//!
//! ```rust
//! use mdm_objects::scope::{CachedDirectory, MemoryDirectory, ScopeDirectory, ScopeKey};
//!
//! # fn main() -> Result<(), mdm_objects::error::ModelError> {
//! let directory = CachedDirectory::new(
//!     MemoryDirectory::new().with_entity(ScopeKey::Buildings, 3, "Headquarters"),
//! );
//! assert_eq!(directory.valid_id(ScopeKey::Buildings, "headquarters")?, Some(3));
//! assert_eq!(directory.valid_id(ScopeKey::Buildings, "3")?, Some(3));
//! assert_eq!(directory.valid_id(ScopeKey::Buildings, "Annex")?, None);
//! # Ok(())
//! # }
//! ```

use super::evaluation::ScopeSubject;
use super::keys::{ScopeKey, TargetKind};
use super::network::NetworkSegment;
use crate::error::ModelResult;

use log::{debug, trace};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, PoisonError};

/// Entity and directory-service lookups.
pub trait ScopeDirectory {
    /// Resolve a name or id to the numeric id of an entity of `key`'s kind.
    fn valid_id(&self, key: ScopeKey, identifier: &str) -> ModelResult<Option<u64>>;

    /// Every id of `key`'s kind with its name.
    fn map_all_ids_to_name(&self, key: ScopeKey) -> ModelResult<BTreeMap<u64, String>>;

    /// Every network segment definition.
    fn network_segments(&self) -> ModelResult<Vec<NetworkSegment>>;

    fn ldap_user_exists(&self, name: &str) -> ModelResult<bool>;

    fn ldap_group_exists(&self, name: &str) -> ModelResult<bool>;

    fn ldap_user_in_group(&self, user: &str, group: &str) -> ModelResult<bool>;

    /// Current evaluation data for one device, if it exists.
    fn subject(&self, kind: TargetKind, id: u64) -> ModelResult<Option<ScopeSubject>>;
}

impl<D: ScopeDirectory + ?Sized> ScopeDirectory for &D {
    fn valid_id(&self, key: ScopeKey, identifier: &str) -> ModelResult<Option<u64>> {
        (**self).valid_id(key, identifier)
    }

    fn map_all_ids_to_name(&self, key: ScopeKey) -> ModelResult<BTreeMap<u64, String>> {
        (**self).map_all_ids_to_name(key)
    }

    fn network_segments(&self) -> ModelResult<Vec<NetworkSegment>> {
        (**self).network_segments()
    }

    fn ldap_user_exists(&self, name: &str) -> ModelResult<bool> {
        (**self).ldap_user_exists(name)
    }

    fn ldap_group_exists(&self, name: &str) -> ModelResult<bool> {
        (**self).ldap_group_exists(name)
    }

    fn ldap_user_in_group(&self, user: &str, group: &str) -> ModelResult<bool> {
        (**self).ldap_user_in_group(user, group)
    }

    fn subject(&self, kind: TargetKind, id: u64) -> ModelResult<Option<ScopeSubject>> {
        (**self).subject(kind, id)
    }
}

#[derive(Default)]
struct DirectoryCache {
    ids: HashMap<(ScopeKey, String), Option<u64>>,
    names: HashMap<ScopeKey, BTreeMap<u64, String>>,
    segments: Option<Vec<NetworkSegment>>,
    ldap_users: HashMap<String, bool>,
    ldap_groups: HashMap<String, bool>,
    memberships: HashMap<(String, String), bool>,
}

/// Memoizing wrapper around another directory.
///
/// Device subjects are always fetched fresh; everything else is cached until
/// [`flush`](Self::flush). Errors are never cached.
pub struct CachedDirectory<D> {
    inner: D,
    cache: Mutex<DirectoryCache>,
}

impl<D: ScopeDirectory> CachedDirectory<D> {
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            cache: Mutex::new(DirectoryCache::default()),
        }
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }

    /// Drop every cached lookup.
    pub fn flush(&self) {
        *self.lock() = DirectoryCache::default();
        debug!("Scope directory cache flushed");
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DirectoryCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<D: ScopeDirectory> ScopeDirectory for CachedDirectory<D> {
    fn valid_id(&self, key: ScopeKey, identifier: &str) -> ModelResult<Option<u64>> {
        let cache_key = (key, identifier.to_ascii_lowercase());
        if let Some(hit) = self.lock().ids.get(&cache_key) {
            trace!("Directory cache hit for {} '{}'", key, identifier);
            return Ok(*hit);
        }
        let resolved = self.inner.valid_id(key, identifier)?;
        self.lock().ids.insert(cache_key, resolved);
        Ok(resolved)
    }

    fn map_all_ids_to_name(&self, key: ScopeKey) -> ModelResult<BTreeMap<u64, String>> {
        if let Some(hit) = self.lock().names.get(&key) {
            return Ok(hit.clone());
        }
        let names = self.inner.map_all_ids_to_name(key)?;
        self.lock().names.insert(key, names.clone());
        Ok(names)
    }

    fn network_segments(&self) -> ModelResult<Vec<NetworkSegment>> {
        if let Some(hit) = &self.lock().segments {
            return Ok(hit.clone());
        }
        let segments = self.inner.network_segments()?;
        self.lock().segments = Some(segments.clone());
        Ok(segments)
    }

    fn ldap_user_exists(&self, name: &str) -> ModelResult<bool> {
        let cache_key = name.to_ascii_lowercase();
        if let Some(hit) = self.lock().ldap_users.get(&cache_key) {
            return Ok(*hit);
        }
        let exists = self.inner.ldap_user_exists(name)?;
        self.lock().ldap_users.insert(cache_key, exists);
        Ok(exists)
    }

    fn ldap_group_exists(&self, name: &str) -> ModelResult<bool> {
        let cache_key = name.to_ascii_lowercase();
        if let Some(hit) = self.lock().ldap_groups.get(&cache_key) {
            return Ok(*hit);
        }
        let exists = self.inner.ldap_group_exists(name)?;
        self.lock().ldap_groups.insert(cache_key, exists);
        Ok(exists)
    }

    fn ldap_user_in_group(&self, user: &str, group: &str) -> ModelResult<bool> {
        let cache_key = (user.to_ascii_lowercase(), group.to_ascii_lowercase());
        if let Some(hit) = self.lock().memberships.get(&cache_key) {
            return Ok(*hit);
        }
        let member = self.inner.ldap_user_in_group(user, group)?;
        self.lock().memberships.insert(cache_key, member);
        Ok(member)
    }

    fn subject(&self, kind: TargetKind, id: u64) -> ModelResult<Option<ScopeSubject>> {
        self.inner.subject(kind, id)
    }
}

/// Fixed in-memory directory data.
#[derive(Debug, Clone, Default)]
pub struct MemoryDirectory {
    entities: HashMap<ScopeKey, BTreeMap<u64, String>>,
    segments: Vec<NetworkSegment>,
    ldap_users: BTreeSet<String>,
    ldap_groups: BTreeMap<String, BTreeSet<String>>,
    subjects: HashMap<(TargetKind, u64), ScopeSubject>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(mut self, key: ScopeKey, id: u64, name: impl Into<String>) -> Self {
        self.entities.entry(key).or_default().insert(id, name.into());
        self
    }

    /// Adds the segment and registers it as a `NetworkSegments` entity.
    pub fn with_segment(mut self, segment: NetworkSegment) -> Self {
        self.entities
            .entry(ScopeKey::NetworkSegments)
            .or_default()
            .insert(segment.id(), segment.name().to_string());
        self.segments.push(segment);
        self
    }

    pub fn with_ldap_user(mut self, name: impl Into<String>) -> Self {
        self.ldap_users.insert(name.into().to_ascii_lowercase());
        self
    }

    /// Adds a group with members; members also become known users.
    pub fn with_ldap_group<I, S>(mut self, name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let members: BTreeSet<String> = members
            .into_iter()
            .map(|m| m.into().to_ascii_lowercase())
            .collect();
        self.ldap_users.extend(members.iter().cloned());
        self.ldap_groups
            .insert(name.into().to_ascii_lowercase(), members);
        self
    }

    pub fn with_subject(mut self, kind: TargetKind, subject: ScopeSubject) -> Self {
        self.subjects.insert((kind, subject.id), subject);
        self
    }
}

impl ScopeDirectory for MemoryDirectory {
    fn valid_id(&self, key: ScopeKey, identifier: &str) -> ModelResult<Option<u64>> {
        let Some(entities) = self.entities.get(&key) else {
            return Ok(None);
        };
        let identifier = identifier.trim();
        if let Ok(id) = identifier.parse::<u64>() {
            if entities.contains_key(&id) {
                return Ok(Some(id));
            }
        }
        Ok(entities
            .iter()
            .find(|(_, name)| name.eq_ignore_ascii_case(identifier))
            .map(|(id, _)| *id))
    }

    fn map_all_ids_to_name(&self, key: ScopeKey) -> ModelResult<BTreeMap<u64, String>> {
        Ok(self.entities.get(&key).cloned().unwrap_or_default())
    }

    fn network_segments(&self) -> ModelResult<Vec<NetworkSegment>> {
        Ok(self.segments.clone())
    }

    fn ldap_user_exists(&self, name: &str) -> ModelResult<bool> {
        Ok(self.ldap_users.contains(&name.to_ascii_lowercase()))
    }

    fn ldap_group_exists(&self, name: &str) -> ModelResult<bool> {
        Ok(self.ldap_groups.contains_key(&name.to_ascii_lowercase()))
    }

    fn ldap_user_in_group(&self, user: &str, group: &str) -> ModelResult<bool> {
        Ok(self
            .ldap_groups
            .get(&group.to_ascii_lowercase())
            .is_some_and(|members| members.contains(&user.to_ascii_lowercase())))
    }

    fn subject(&self, kind: TargetKind, id: u64) -> ModelResult<Option<ScopeSubject>> {
        Ok(self.subjects.get(&(kind, id)).cloned())
    }
}
