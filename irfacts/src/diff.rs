//! Delta between two fact stores.
//!
//! [`compute_diff`] partitions the symmetric difference of every relation by
//! side: tuples only in the previous snapshot are *deleted*, tuples only in
//! the current one are *inserted*. Unchanged tuples appear in neither set and
//! relations whose delta is empty are omitted altogether.
use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use crate::{
    database::{FactStore, Relation, Schema, Tuple, write_block},
    utils::error::FactResult,
};

/// The (deleted, inserted) pair of one relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDiff {
    schema: Option<Schema>,
    deleted: BTreeSet<Tuple>,
    inserted: BTreeSet<Tuple>,
}

impl RelationDiff {
    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    pub fn deleted(&self) -> &BTreeSet<Tuple> {
        &self.deleted
    }

    pub fn inserted(&self) -> &BTreeSet<Tuple> {
        &self.inserted
    }

    pub fn is_empty(&self) -> bool {
        self.deleted.is_empty() && self.inserted.is_empty()
    }
}

/// Schema line, then `-` lines for deleted tuples, then `+` lines for
/// inserted tuples. No trailing newline.
impl std::fmt::Display for RelationDiff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let deleted = self.deleted.iter().map(|t| ("-", t));
        let inserted = self.inserted.iter().map(|t| ("+", t));
        write_block(f, self.schema.as_ref(), deleted.chain(inserted))
    }
}

/// Per-relation deltas, in relation name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffDatabase {
    relations: BTreeMap<String, RelationDiff>,
}

impl DiffDatabase {
    pub fn get(&self, name: &str) -> Option<&RelationDiff> {
        self.relations.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RelationDiff)> {
        self.relations
            .iter()
            .map(|(name, diff)| (name.as_str(), diff))
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    /// Serialized block of every changed relation, keyed by relation name.
    pub fn serialize_blocks(&self) -> BTreeMap<String, String> {
        self.relations
            .iter()
            .filter(|(_, diff)| !diff.is_empty())
            .map(|(name, diff)| (name.clone(), diff.to_string()))
            .collect()
    }

    /// Replay the delta on `base`: deleted tuples are removed and inserted
    /// tuples added. Relations left empty are dropped from the result.
    pub fn apply_to(&self, base: Option<&FactStore>) -> FactResult<FactStore> {
        let mut store = base.cloned().unwrap_or_default();
        for (name, diff) in &self.relations {
            let relation = store.relation_mut(name);
            if let Some(schema) = &diff.schema {
                relation.set_schema(schema.clone());
            }
            for tuple in &diff.deleted {
                relation.remove(tuple);
            }
            for tuple in &diff.inserted {
                relation.insert(tuple.clone())?;
            }
        }
        store.prune_empty();
        Ok(store)
    }
}

fn relation_diff(previous: Option<&Relation>, current: Option<&Relation>) -> RelationDiff {
    let schema = previous
        .and_then(Relation::schema)
        .or_else(|| current.and_then(Relation::schema))
        .cloned();
    let (deleted, inserted) = match (previous, current) {
        (Some(previous), Some(current)) => (
            previous
                .tuples()
                .difference(current.tuples())
                .cloned()
                .collect(),
            current
                .tuples()
                .difference(previous.tuples())
                .cloned()
                .collect(),
        ),
        (Some(previous), None) => (previous.tuples().clone(), BTreeSet::new()),
        (None, Some(current)) => (BTreeSet::new(), current.tuples().clone()),
        (None, None) => (BTreeSet::new(), BTreeSet::new()),
    };
    RelationDiff {
        schema,
        deleted,
        inserted,
    }
}

/// Compute the delta from `previous` to `current`. Either side may be absent,
/// in which case it is treated as an empty store.
pub fn compute_diff(previous: Option<&FactStore>, current: Option<&FactStore>) -> DiffDatabase {
    let names: BTreeSet<&str> = previous
        .into_iter()
        .chain(current)
        .flat_map(|store| store.relations().map(|(name, _)| name))
        .collect();

    let mut relations = BTreeMap::new();
    for name in names {
        let diff = relation_diff(
            previous.and_then(|store| store.relation(name)),
            current.and_then(|store| store.relation(name)),
        );
        if !diff.is_empty() {
            relations.insert(name.to_string(), diff);
        }
    }

    debug!(
        "Computed diff: {} changed relations, {} deleted and {} inserted tuples",
        relations.len(),
        relations.values().map(|d: &RelationDiff| d.deleted.len()).sum::<usize>(),
        relations.values().map(|d: &RelationDiff| d.inserted.len()).sum::<usize>()
    );
    DiffDatabase { relations }
}
