use serde_json::Value;

use crate::error::{StoreError, StoreResult};
use crate::model::{DocumentKey, FieldPath, IntoFieldPath, ResourcePath};
use crate::store::Store;

/// Comparison applied by a [`FieldFilter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterOperator {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    ArrayContains,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OrderDirection {
    #[default]
    Ascending,
    Descending,
}

/// A single field comparison within a query.
#[derive(Clone, Debug)]
pub struct FieldFilter {
    field: FieldPath,
    operator: FilterOperator,
    value: Value,
}

impl FieldFilter {
    pub fn field(&self) -> &FieldPath {
        &self.field
    }

    pub fn operator(&self) -> FilterOperator {
        self.operator
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

#[derive(Clone, Debug)]
pub struct OrderBy {
    field: FieldPath,
    direction: OrderDirection,
}

impl OrderBy {
    pub fn field(&self) -> &FieldPath {
        &self.field
    }

    pub fn direction(&self) -> OrderDirection {
        self.direction
    }
}

/// A query scoped to a single collection.
///
/// Construction, filtering and ordering happen here; execution and real-time
/// subscription are delegated to the datastore through [`QueryDefinition`].
#[derive(Clone, Debug)]
pub struct Query {
    store: Store,
    definition: QueryDefinition,
}

impl Query {
    pub(crate) fn new(store: Store, collection_path: ResourcePath) -> StoreResult<Self> {
        if !collection_path.is_collection_path() {
            return Err(StoreError::invalid_argument(format!(
                "\"{collection_path}\" does not name a collection to query"
            )));
        }
        Ok(Self {
            store,
            definition: QueryDefinition {
                collection_path,
                filters: Vec::new(),
                order_by: None,
                limit: None,
            },
        })
    }

    /// Returns the store instance that created this query.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// The identifier (last segment) of the targeted collection.
    pub fn collection_id(&self) -> &str {
        self.definition
            .collection_path
            .last_segment()
            .expect("Collection path always ends with an identifier")
    }

    /// Adds a field comparison to the query.
    pub fn where_field(
        mut self,
        field: impl IntoFieldPath,
        operator: FilterOperator,
        value: impl Into<Value>,
    ) -> StoreResult<Self> {
        self.definition.filters.push(FieldFilter {
            field: field.into_field_path()?,
            operator,
            value: value.into(),
        });
        Ok(self)
    }

    /// Orders results by a single field.
    pub fn order_by(
        mut self,
        field: impl IntoFieldPath,
        direction: OrderDirection,
    ) -> StoreResult<Self> {
        self.definition.order_by = Some(OrderBy {
            field: field.into_field_path()?,
            direction,
        });
        Ok(self)
    }

    /// Caps the number of returned documents.
    pub fn limit(mut self, limit: usize) -> Self {
        self.definition.limit = Some(limit);
        self
    }

    pub fn definition(&self) -> &QueryDefinition {
        &self.definition
    }
}

/// The datastore-facing form of a query.
#[derive(Clone, Debug)]
pub struct QueryDefinition {
    collection_path: ResourcePath,
    filters: Vec<FieldFilter>,
    order_by: Option<OrderBy>,
    limit: Option<usize>,
}

impl QueryDefinition {
    pub fn collection_path(&self) -> &ResourcePath {
        &self.collection_path
    }

    pub fn filters(&self) -> &[FieldFilter] {
        &self.filters
    }

    pub fn order_by(&self) -> Option<&OrderBy> {
        self.order_by.as_ref()
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Whether a document key lives directly in the queried collection.
    pub fn matches_collection(&self, key: &DocumentKey) -> bool {
        key.collection_path() == self.collection_path
    }
}
