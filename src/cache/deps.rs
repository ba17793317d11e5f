//! Cross-entity dependency table.
//!
//! Each mutation kind lists the cache keys it makes stale. Services describe
//! what happened through a [`Mutation`]; [`InvalidationPlan::for_mutation`]
//! expands the matching templates with the mutation's identifiers into the
//! generations to retire. Adding a new cached read means adding its template
//! to every row that affects it.

use std::collections::BTreeSet;
use std::fmt;

use uuid::Uuid;

use super::keys::{CacheKey, GenerationKey};
use crate::domain::entities::{ContactRecord, RegionRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    RegionCreated,
    RegionUpdated,
    RegionDeleted,
    ContactCreated,
    ContactUpdated,
    ContactDeleted,
}

impl MutationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RegionCreated => "region_created",
            Self::RegionUpdated => "region_updated",
            Self::RegionDeleted => "region_deleted",
            Self::ContactCreated => "contact_created",
            Self::ContactUpdated => "contact_updated",
            Self::ContactDeleted => "contact_deleted",
        }
    }
}

/// Which side of the mutation a ddd parameter is taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Before,
    After,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTemplate {
    RegionById,
    RegionByDdd(Side),
    RegionWithContacts(Side),
    RegionPages,
    ContactById,
    ContactsByDdd(Side),
}

pub const DEPENDENCY_TABLE: &[(MutationKind, &[KeyTemplate])] = &[
    // Lookups for a ddd reclaimed after a delete start from a fresh generation.
    (
        MutationKind::RegionCreated,
        &[
            KeyTemplate::RegionByDdd(Side::After),
            KeyTemplate::RegionWithContacts(Side::After),
            KeyTemplate::ContactsByDdd(Side::After),
            KeyTemplate::RegionPages,
        ],
    ),
    (
        MutationKind::RegionUpdated,
        &[
            KeyTemplate::RegionById,
            KeyTemplate::RegionByDdd(Side::Before),
            KeyTemplate::RegionByDdd(Side::After),
            KeyTemplate::RegionWithContacts(Side::Before),
            KeyTemplate::RegionWithContacts(Side::After),
            KeyTemplate::ContactsByDdd(Side::Before),
            KeyTemplate::ContactsByDdd(Side::After),
            KeyTemplate::RegionPages,
        ],
    ),
    (
        MutationKind::RegionDeleted,
        &[
            KeyTemplate::RegionById,
            KeyTemplate::RegionByDdd(Side::Before),
            KeyTemplate::RegionWithContacts(Side::Before),
            KeyTemplate::ContactsByDdd(Side::Before),
            KeyTemplate::RegionPages,
        ],
    ),
    (
        MutationKind::ContactCreated,
        &[
            KeyTemplate::ContactsByDdd(Side::After),
            KeyTemplate::RegionWithContacts(Side::After),
        ],
    ),
    (
        MutationKind::ContactUpdated,
        &[
            KeyTemplate::ContactById,
            KeyTemplate::ContactsByDdd(Side::Before),
            KeyTemplate::ContactsByDdd(Side::After),
            KeyTemplate::RegionWithContacts(Side::Before),
            KeyTemplate::RegionWithContacts(Side::After),
        ],
    ),
    (
        MutationKind::ContactDeleted,
        &[
            KeyTemplate::ContactById,
            KeyTemplate::ContactsByDdd(Side::Before),
            KeyTemplate::RegionWithContacts(Side::Before),
        ],
    ),
];

pub fn templates_for(kind: MutationKind) -> &'static [KeyTemplate] {
    DEPENDENCY_TABLE
        .iter()
        .find(|(candidate, _)| *candidate == kind)
        .map(|(_, templates)| *templates)
        .unwrap_or(&[])
}

/// A committed change to the store, described by the identifiers that cache
/// keys are built from.
///
/// For contacts the ddd values are those of the owning region before and
/// after the change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    pub kind: MutationKind,
    pub id: Uuid,
    pub ddd_before: Option<String>,
    pub ddd_after: Option<String>,
}

impl Mutation {
    pub fn region_created(region: &RegionRecord) -> Self {
        Self {
            kind: MutationKind::RegionCreated,
            id: region.id,
            ddd_before: None,
            ddd_after: Some(region.ddd.clone()),
        }
    }

    pub fn region_updated(before: &RegionRecord, after: &RegionRecord) -> Self {
        Self {
            kind: MutationKind::RegionUpdated,
            id: after.id,
            ddd_before: Some(before.ddd.clone()),
            ddd_after: Some(after.ddd.clone()),
        }
    }

    pub fn region_deleted(region: &RegionRecord) -> Self {
        Self {
            kind: MutationKind::RegionDeleted,
            id: region.id,
            ddd_before: Some(region.ddd.clone()),
            ddd_after: None,
        }
    }

    pub fn contact_created(contact: &ContactRecord, region_ddd: &str) -> Self {
        Self {
            kind: MutationKind::ContactCreated,
            id: contact.id,
            ddd_before: None,
            ddd_after: Some(region_ddd.to_string()),
        }
    }

    /// `ddd_before` is `None` when the old region no longer resolves.
    pub fn contact_updated(
        contact: &ContactRecord,
        ddd_before: Option<&str>,
        ddd_after: &str,
    ) -> Self {
        Self {
            kind: MutationKind::ContactUpdated,
            id: contact.id,
            ddd_before: ddd_before.map(str::to_string),
            ddd_after: Some(ddd_after.to_string()),
        }
    }

    pub fn contact_deleted(contact: &ContactRecord, region_ddd: Option<&str>) -> Self {
        Self {
            kind: MutationKind::ContactDeleted,
            id: contact.id,
            ddd_before: region_ddd.map(str::to_string),
            ddd_after: None,
        }
    }

    fn ddd(&self, side: Side) -> Option<&str> {
        match side {
            Side::Before => self.ddd_before.as_deref(),
            Side::After => self.ddd_after.as_deref(),
        }
    }
}

/// Generations to retire after a mutation commits.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InvalidationPlan {
    pub slots: BTreeSet<GenerationKey>,
}

impl InvalidationPlan {
    pub fn for_mutation(mutation: &Mutation) -> Self {
        let mut slots = BTreeSet::new();
        for template in templates_for(mutation.kind) {
            let slot = match *template {
                KeyTemplate::RegionPages => Some(GenerationKey::RegionPages),
                KeyTemplate::RegionById => {
                    Some(CacheKey::region_by_id(mutation.id).generation_key())
                }
                KeyTemplate::ContactById => {
                    Some(CacheKey::contact_by_id(mutation.id).generation_key())
                }
                KeyTemplate::RegionByDdd(side) => mutation
                    .ddd(side)
                    .map(|ddd| CacheKey::region_by_ddd(ddd).generation_key()),
                KeyTemplate::RegionWithContacts(side) => mutation
                    .ddd(side)
                    .map(|ddd| CacheKey::region_with_contacts(ddd).generation_key()),
                KeyTemplate::ContactsByDdd(side) => mutation
                    .ddd(side)
                    .map(|ddd| CacheKey::contacts_by_ddd(ddd).generation_key()),
            };
            slots.extend(slot);
        }
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether entries read under `key` are retired by this plan.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.slots.contains(&key.generation_key())
    }

    pub fn retires_pages(&self) -> bool {
        self.slots.contains(&GenerationKey::RegionPages)
    }
}

impl fmt::Display for InvalidationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.slots.iter().map(ToString::to_string).collect();
        write!(f, "[{}]", rendered.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::*;

    fn region(ddd: &str) -> RegionRecord {
        let now = OffsetDateTime::now_utc();
        RegionRecord {
            id: Uuid::new_v4(),
            name: "SP".to_string(),
            ddd: ddd.to_string(),
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn contact(region_id: Uuid) -> ContactRecord {
        let now = OffsetDateTime::now_utc();
        ContactRecord {
            id: Uuid::new_v4(),
            name: "Ana".to_string(),
            phone: "4141-3338".to_string(),
            email: "ana@email.com".to_string(),
            region_id,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn every_mutation_kind_has_a_row() {
        for kind in [
            MutationKind::RegionCreated,
            MutationKind::RegionUpdated,
            MutationKind::RegionDeleted,
            MutationKind::ContactCreated,
            MutationKind::ContactUpdated,
            MutationKind::ContactDeleted,
        ] {
            assert!(!templates_for(kind).is_empty(), "{} has no row", kind.as_str());
        }
    }

    #[test]
    fn region_ddd_change_covers_both_ddds() {
        let before = region("11");
        let mut after = before.clone();
        after.ddd = "95".to_string();
        let plan = InvalidationPlan::for_mutation(&Mutation::region_updated(&before, &after));

        for ddd in ["11", "95"] {
            assert!(plan.contains(&CacheKey::region_by_ddd(ddd)));
            assert!(plan.contains(&CacheKey::region_with_contacts(ddd)));
            assert!(plan.contains(&CacheKey::contacts_by_ddd(ddd)));
        }
        assert!(plan.contains(&CacheKey::region_by_id(before.id)));
        assert!(plan.retires_pages());
        assert_eq!(plan.len(), 8);
    }

    #[test]
    fn region_rename_collapses_duplicate_keys() {
        let before = region("11");
        let mut after = before.clone();
        after.name = "Sao Paulo".to_string();
        let plan = InvalidationPlan::for_mutation(&Mutation::region_updated(&before, &after));
        assert_eq!(plan.len(), 5);
    }

    #[test]
    fn region_delete_never_touches_contact_ids() {
        let region = region("47");
        let plan = InvalidationPlan::for_mutation(&Mutation::region_deleted(&region));
        assert!(plan.slots.iter().all(|slot| {
            !matches!(slot, GenerationKey::Entry(CacheKey::ContactById(_)))
        }));
        assert!(plan.contains(&CacheKey::contacts_by_ddd("47")));
    }

    #[test]
    fn contact_creation_invalidates_region_listings() {
        let region = region("11");
        let contact = contact(region.id);
        let plan = InvalidationPlan::for_mutation(&Mutation::contact_created(&contact, "11"));
        let expected: BTreeSet<_> = [
            CacheKey::contacts_by_ddd("11").generation_key(),
            CacheKey::region_with_contacts("11").generation_key(),
        ]
        .into_iter()
        .collect();
        assert_eq!(plan.slots, expected);
    }

    #[test]
    fn contact_move_invalidates_old_and_new_region() {
        let contact = contact(Uuid::new_v4());
        let plan = InvalidationPlan::for_mutation(&Mutation::contact_updated(
            &contact,
            Some("11"),
            "47",
        ));
        assert!(plan.contains(&CacheKey::contact_by_id(contact.id)));
        assert!(plan.contains(&CacheKey::contacts_by_ddd("11")));
        assert!(plan.contains(&CacheKey::contacts_by_ddd("47")));
        assert!(plan.contains(&CacheKey::region_with_contacts("11")));
        assert!(plan.contains(&CacheKey::region_with_contacts("47")));
        assert!(!plan.retires_pages());
    }

    #[test]
    fn missing_ddd_skips_ddd_templates() {
        let contact = contact(Uuid::new_v4());
        let plan = InvalidationPlan::for_mutation(&Mutation::contact_deleted(&contact, None));
        assert_eq!(plan.len(), 1);
        assert!(plan.contains(&CacheKey::contact_by_id(contact.id)));
    }
}
