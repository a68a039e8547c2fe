//! Fact store: named relations of typed tuples.
//!
//! A [`FactStore`] maps relation names to [`Relation`]s. Relations are created
//! on first reference and hold a set of [`Tuple`]s; iteration order (and thus
//! the serialized form) follows the total order of tuples, so two stores with
//! the same content always serialize to the same text.
use std::collections::{BTreeMap, BTreeSet};

use irgraph::graph::{FieldId, MethodId, NodeId, StmtId, TypeId, ValueId};
use smallvec::SmallVec;
use strum::{Display, EnumIs};

use crate::utils::error::{FactError, FactResult};

/// Semantic type of a column, printed in the schema line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ColumnType {
    Integer,
    String,
    Boolean,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Column {
    pub name: String,
    pub ty: ColumnType,
}

/// Ordered list of columns.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    /// Schema whose columns are all integers.
    pub fn from_names(names: &[&str]) -> Self {
        Self {
            columns: names
                .iter()
                .map(|name| Column {
                    name: name.to_string(),
                    ty: ColumnType::Integer,
                })
                .collect(),
        }
    }

    pub fn from_pairs(pairs: &[(&str, ColumnType)]) -> Self {
        Self {
            columns: pairs
                .iter()
                .map(|(name, ty)| Column {
                    name: name.to_string(),
                    ty: *ty,
                })
                .collect(),
        }
    }

    pub fn arity(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }
}

/// `name:Type` pairs, tab separated.
impl std::fmt::Display for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, "\t")?;
            }
            write!(f, "{}:{}", column.name, column.ty)?;
        }
        Ok(())
    }
}

/// A single column value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIs)]
pub enum FactValue {
    Int(i64),
    Str(String),
    Bool(bool),
}

impl std::fmt::Display for FactValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FactValue::Int(value) => write!(f, "{}", value),
            FactValue::Str(value) => write!(f, "{}", value),
            FactValue::Bool(value) => write!(f, "{}", value),
        }
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for FactValue {
                fn from(value: $ty) -> Self {
                    FactValue::Int(i64::from(value))
                }
            }
        )*
    };
}

macro_rules! impl_from_handle {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for FactValue {
                fn from(handle: $ty) -> Self {
                    FactValue::from(NodeId::from(handle))
                }
            }
        )*
    };
}

impl_from_int!(i32, i64, u32);
impl_from_handle!(StmtId, ValueId, TypeId, MethodId, FieldId);

impl From<NodeId> for FactValue {
    fn from(id: NodeId) -> Self {
        FactValue::Int(i64::from(id.0))
    }
}

impl From<usize> for FactValue {
    fn from(value: usize) -> Self {
        FactValue::Int(value as i64)
    }
}

impl From<bool> for FactValue {
    fn from(value: bool) -> Self {
        FactValue::Bool(value)
    }
}

impl From<String> for FactValue {
    fn from(value: String) -> Self {
        FactValue::Str(value)
    }
}

impl From<&str> for FactValue {
    fn from(value: &str) -> Self {
        FactValue::Str(value.to_string())
    }
}

/// An ordered list of column values. Tuples compare by value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Tuple(pub SmallVec<[FactValue; 4]>);

impl Tuple {
    pub fn arity(&self) -> usize {
        self.0.len()
    }

    pub fn values(&self) -> &[FactValue] {
        &self.0
    }
}

impl FromIterator<FactValue> for Tuple {
    fn from_iter<I: IntoIterator<Item = FactValue>>(iter: I) -> Self {
        Tuple(iter.into_iter().collect())
    }
}

impl std::fmt::Display for Tuple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "\t")?;
            }
            write!(f, "{}", value)?;
        }
        Ok(())
    }
}

/// Build a [`Tuple`] from values convertible into [`FactValue`].
#[macro_export]
macro_rules! tuple {
    ($($value:expr),* $(,)?) => {
        <$crate::database::Tuple as ::core::iter::FromIterator<$crate::database::FactValue>>::from_iter([
            $($crate::database::FactValue::from($value)),*
        ])
    };
}

/// A named set of tuples with an optional schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    name: String,
    schema: Option<Schema>,
    tuples: BTreeSet<Tuple>,
}

impl Relation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: None,
            tuples: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    /// Install `schema` unless one is already set. Returns whether it was
    /// installed.
    pub fn set_schema(&mut self, schema: Schema) -> bool {
        if self.schema.is_some() {
            return false;
        }
        self.schema = Some(schema);
        true
    }

    /// Insert a tuple. Returns false if it was already present.
    pub fn insert(&mut self, tuple: Tuple) -> FactResult<bool> {
        self.check_arity(&tuple)?;
        Ok(self.tuples.insert(tuple))
    }

    pub fn remove(&mut self, tuple: &Tuple) -> bool {
        self.tuples.remove(tuple)
    }

    pub fn contains(&self, tuple: &Tuple) -> bool {
        self.tuples.contains(tuple)
    }

    pub fn tuples(&self) -> &BTreeSet<Tuple> {
        &self.tuples
    }

    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    pub(crate) fn check_arity(&self, tuple: &Tuple) -> FactResult<()> {
        match &self.schema {
            Some(schema) if schema.arity() != tuple.arity() => Err(FactError::SchemaMismatch {
                relation: self.name.clone(),
                expected: schema.arity(),
                found: tuple.arity(),
            }),
            _ => Ok(()),
        }
    }
}

/// Write the schema line (if any) and one `prefix`ed line per tuple, newline
/// separated, without a trailing newline.
pub(crate) fn write_block<'a>(
    f: &mut std::fmt::Formatter<'_>,
    schema: Option<&Schema>,
    rows: impl IntoIterator<Item = (&'static str, &'a Tuple)>,
) -> std::fmt::Result {
    let mut first = true;
    if let Some(schema) = schema {
        write!(f, "{}", schema)?;
        first = false;
    }
    for (prefix, tuple) in rows {
        if !first {
            f.write_str("\n")?;
        }
        write!(f, "{}{}", prefix, tuple)?;
        first = false;
    }
    Ok(())
}

/// Schema line followed by one line per tuple, without a trailing newline.
impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_block(f, self.schema.as_ref(), self.tuples.iter().map(|t| ("", t)))
    }
}

/// The relations produced by one extraction pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FactStore {
    relations: BTreeMap<String, Relation>,
}

impl FactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.get(name)
    }

    /// Get or create the relation `name`.
    pub fn relation_mut(&mut self, name: &str) -> &mut Relation {
        self.relations
            .entry(name.to_string())
            .or_insert_with(|| Relation::new(name))
    }

    /// Insert `tuple` into `name`, installing the schema described by
    /// `columns` if the relation has none yet.
    pub fn emit(
        &mut self,
        name: &str,
        columns: &[(&str, ColumnType)],
        tuple: Tuple,
    ) -> FactResult<bool> {
        let relation = self.relation_mut(name);
        if relation.schema.is_none() {
            relation.set_schema(Schema::from_pairs(columns));
        }
        relation.insert(tuple)
    }

    /// Relations in name order, including empty ones.
    pub fn relations(&self) -> impl Iterator<Item = (&str, &Relation)> {
        self.relations
            .iter()
            .map(|(name, relation)| (name.as_str(), relation))
    }

    /// Number of relations, including empty ones.
    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    pub fn tuple_count(&self) -> usize {
        self.relations.values().map(Relation::len).sum()
    }

    pub(crate) fn prune_empty(&mut self) {
        self.relations.retain(|_, relation| !relation.is_empty());
    }

    /// Serialized text of every non-empty relation, keyed by relation name.
    pub fn serialize(&self) -> BTreeMap<String, String> {
        self.relations
            .iter()
            .filter(|(_, relation)| !relation.is_empty())
            .map(|(name, relation)| (name.clone(), relation.to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_schema_wins() {
        let mut relation = Relation::new("Assign");
        assert!(relation.set_schema(Schema::from_names(&["id", "left", "right"])));
        assert!(!relation.set_schema(Schema::from_names(&["id"])));
        assert_eq!(relation.schema().unwrap().arity(), 3);

        let err = relation.insert(tuple![1, 2]).unwrap_err();
        assert!(matches!(
            err,
            FactError::SchemaMismatch {
                expected: 3,
                found: 2,
                ..
            }
        ));
        assert!(relation.is_empty());
    }

    #[test]
    fn duplicate_insert_is_noop() {
        let mut relation = Relation::new("Unit");
        assert!(relation.insert(tuple![4]).unwrap());
        assert!(!relation.insert(tuple![4]).unwrap());
        assert_eq!(relation.len(), 1);
    }

    #[test]
    fn relation_text_has_schema_line_and_sorted_rows() {
        let mut relation = Relation::new("Local");
        relation.set_schema(Schema::from_pairs(&[
            ("id", ColumnType::Integer),
            ("name", ColumnType::String),
            ("type", ColumnType::Integer),
        ]));
        relation.insert(tuple![7, "b", 1]).unwrap();
        relation.insert(tuple![3, "a", 1]).unwrap();
        assert_eq!(
            relation.to_string(),
            "id:Integer\tname:String\ttype:Integer\n3\ta\t1\n7\tb\t1"
        );
    }

    #[test]
    fn relation_without_schema_has_no_leading_newline() {
        let mut relation = Relation::new("Unit");
        relation.insert(tuple![4]).unwrap();
        relation.insert(tuple![9]).unwrap();
        assert_eq!(relation.to_string(), "4\n9");
    }

    #[test]
    fn store_creates_relations_lazily() {
        let mut store = FactStore::new();
        assert!(store.relation("Unit").is_none());
        store.relation_mut("Unit");
        assert_eq!(store.len(), 1);
        assert!(store.serialize().is_empty());

        store
            .emit("Unit", &[("id", ColumnType::Integer)], tuple![0])
            .unwrap();
        store
            .emit(
                "Method",
                &[("id", ColumnType::Integer), ("isStatic", ColumnType::Boolean)],
                tuple![1, true],
            )
            .unwrap();
        let serialized = store.serialize();
        assert_eq!(serialized["Unit"], "id:Integer\n0");
        assert_eq!(serialized["Method"], "id:Integer\tisStatic:Boolean\n1\ttrue");
        assert_eq!(store.tuple_count(), 2);
    }
}
