//! Attribute-driven schema collection and sync engine for MySQL 8.0+.
//!
//! The pipeline: `#[derive(Resource)]` types carry a [`resource::ResourceDescriptor`]
//! → [`registry::SchemaRegistry`] groups the ones a process cares about →
//! [`collector`] widens them into a [`schema::DeclaredSchema`] → [`reader::SchemaReader`]
//! reads the live `INFORMATION_SCHEMA` state → [`comparator`] diffs the two →
//! [`ordering`]/[`plan`] turn the diff into an [`plan::DdlPlan`] → [`executor`]
//! runs it statement by statement, auditing every run via [`audit`].
//!
//! Row access (`hydrate`, `relations`, `query`, `upsert`) is a separate,
//! independent concern: it reads/writes rows through the same
//! [`adapter::DatabaseAdapter`] boundary but never touches the declared
//! schema.

mod adapter;
mod audit;
mod collector;
mod comparator;
mod config;
mod ddl;
mod diff_op;
mod error;
mod executor;
mod hydrate;
mod ordering;
mod plan;
mod pool;
mod query;
mod reader;
mod registry;
mod relations;
mod resource;
mod schema;
mod sync;
mod tx;
mod upsert;

pub use adapter::{AffectedRows, DatabaseAdapter, Row, Transaction};
pub use audit::{AuditRecord, AuditedOperation};
pub use collector::{CollectedSchema, DEPRECATION_SENTINEL, collect};
pub use comparator::compare;
pub use config::{ConnectionConfig, OrmSettings, Version};
pub use ddl::TABLE_OPTIONS;
pub use diff_op::{ColumnChange, DiffOp};
pub use error::{BadQueryError, CapabilityError, Error, Result, SchemaStateError, ValidationError};
pub use executor::{ExecutedStatement, ExecutionReport, Executor, SkippedStatement};
pub use hydrate::{HydratedRow, Value};
pub use ordering::sort_diff_ops;
pub use plan::{DdlPlan, DdlPlanner, PlannedStatement, build_ddl_plan};
pub use pool::{Pool, PooledConnection};
pub use query::{Operator, QueryBuilder};
pub use reader::{DbColumnState, DbForeignKeyState, DbIndexState, DbTableState, LiveSchemaState, SchemaReader};
pub use registry::{SchemaRegistry, SchemaRegistryBuilder};
pub use relations::{Loaded, load_relation};
pub use resource::{
    AnnotationLiteral, ClassIndexAnnotation, ColumnAnnotation, FieldAnnotation, RelationAnnotation,
    Resource, ResourceDescriptor, TenantStrategy, ToDomain,
};
pub use schema::{
    ColumnDefinition, ColumnType, DeclaredSchema, ForeignKeyAction, ForeignKeyDefinition, Ident,
    IndexDefinition, Literal, PkStrategy, RelationKind, RelationMeta, TableDefinition,
    is_valid_identifier,
};
pub use sync::{SyncOptions, SyncOutcome, plan_diff, sync};
pub use tx::{Tx, run as run_tx};
pub use upsert::{UpsertBatchOutcome, UpsertColumn, UpsertOutcome, replace_pivot_rows, run_seed, upsert, upsert_batch};
