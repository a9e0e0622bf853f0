//! Query building: `filter`/`filterRelation` predicates rendered into a
//! `WHERE` clause, paired with the `BadQuery` guards that keep a caller from
//! building a broken or unconditionally-destructive statement.

use crate::adapter::DatabaseAdapter;
use crate::adapter::Row;
use crate::error::{BadQueryError, Error, Result};
use crate::resource::ResourceDescriptor;
use crate::schema::RelationKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    In,
    IsNull,
    IsNotNull,
}

impl Operator {
    fn parse(raw: &str) -> Result<Self> {
        match raw {
            "eq" => Ok(Self::Eq),
            "ne" => Ok(Self::Ne),
            "gt" => Ok(Self::Gt),
            "gte" => Ok(Self::Gte),
            "lt" => Ok(Self::Lt),
            "lte" => Ok(Self::Lte),
            "like" => Ok(Self::Like),
            "in" => Ok(Self::In),
            "isNull" => Ok(Self::IsNull),
            "isNotNull" => Ok(Self::IsNotNull),
            other => Err(Error::BadQuery(BadQueryError::InvalidOperator(other.to_string()))),
        }
    }

    fn sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Like => "LIKE",
            Self::In => "IN",
            Self::IsNull => "IS NULL",
            Self::IsNotNull => "IS NOT NULL",
        }
    }
}

#[derive(Debug, Clone)]
enum Predicate {
    Column { column: String, operator: Operator, literal: Option<String> },
    RelationColumn { alias: String, column: String, operator: Operator, literal: Option<String> },
}

#[derive(Debug, Clone)]
struct Join {
    target_table: String,
    alias: String,
    on: String,
}

/// Builds a `SELECT`/`DELETE` against one resource's table, validating every
/// filter against the resource's declared `Filterable` fields (and relation
/// targets, for `filter_relation`) before any SQL is rendered.
pub struct QueryBuilder {
    descriptor: &'static ResourceDescriptor,
    predicates: Vec<Predicate>,
    page: Option<i64>,
    per_page: Option<i64>,
    joins: Vec<Join>,
}

impl QueryBuilder {
    #[must_use]
    pub fn new(descriptor: &'static ResourceDescriptor) -> Self {
        Self {
            descriptor,
            predicates: Vec::new(),
            page: None,
            per_page: None,
            joins: Vec::new(),
        }
    }

    pub fn filter(&mut self, property: &str, operator: &str, literal: Option<&str>) -> Result<&mut Self> {
        let field = self
            .descriptor
            .fields
            .iter()
            .find(|f| f.property_name == property)
            .filter(|f| f.filterable.is_some())
            .ok_or_else(|| Error::NotFilterable {
                table: self.descriptor.table_name.to_string(),
                property: property.to_string(),
            })?;

        let op = Operator::parse(operator)?;
        let column_name = field
            .column
            .as_ref()
            .and_then(|c| c.name)
            .unwrap_or(field.property_name);

        self.predicates.push(Predicate::Column {
            column: column_name.to_string(),
            operator: op,
            literal: literal.map(escape_literal),
        });
        Ok(self)
    }

    pub fn filter_relation(
        &mut self,
        relation_property: &str,
        column: &str,
        operator: &str,
        literal: Option<&str>,
    ) -> Result<&mut Self> {
        let relation = self
            .descriptor
            .fields
            .iter()
            .find(|f| f.property_name == relation_property)
            .and_then(|f| f.relation)
            .ok_or_else(|| Error::UnknownRelation {
                table: self.descriptor.table_name.to_string(),
                property: relation_property.to_string(),
            })?;

        let op = Operator::parse(operator)?;
        let alias = format!("rel_{relation_property}");

        if !self.joins.iter().any(|j| j.alias == alias) {
            for join in render_joins(self.descriptor.table_name, &alias, &relation) {
                self.joins.push(join);
            }
        }

        self.predicates.push(Predicate::RelationColumn {
            alias,
            column: column.to_string(),
            operator: op,
            literal: literal.map(escape_literal),
        });
        Ok(self)
    }

    pub fn paginate(&mut self, page: i64, per_page: i64) -> Result<&mut Self> {
        if page < 1 {
            return Err(Error::BadQuery(BadQueryError::InvalidPage(page)));
        }
        if per_page < 1 {
            return Err(Error::BadQuery(BadQueryError::InvalidPage(per_page)));
        }
        self.page = Some(page);
        self.per_page = Some(per_page);
        Ok(self)
    }

    fn where_clause(&self) -> String {
        if self.predicates.is_empty() {
            return String::new();
        }
        let clauses: Vec<String> = self
            .predicates
            .iter()
            .map(|p| match p {
                Predicate::Column { column, operator, literal } => {
                    render_predicate(&format!("`{}`.`{column}`", self.descriptor.table_name), *operator, literal.as_deref())
                }
                Predicate::RelationColumn { alias, column, operator, literal } => {
                    render_predicate(&format!("`{alias}`.`{column}`"), *operator, literal.as_deref())
                }
            })
            .collect();
        format!(" WHERE {}", clauses.join(" AND "))
    }

    fn join_clause(&self) -> String {
        self.joins.iter().map(|j| format!(" JOIN `{}` AS `{}` ON {}", j.target_table, j.alias, j.on)).collect()
    }

    #[must_use]
    pub fn render_select(&self) -> String {
        let mut sql = format!("SELECT `{0}`.* FROM `{0}`", self.descriptor.table_name);
        sql.push_str(&self.join_clause());
        sql.push_str(&self.where_clause());
        if let (Some(page), Some(per_page)) = (self.page, self.per_page) {
            sql.push_str(&format!(" LIMIT {per_page} OFFSET {}", (page - 1) * per_page));
        }
        sql
    }

    /// Refuses to build a statement with no `WHERE` clause: a bug in a
    /// caller that forgets to filter must never compile into a full-table
    /// delete.
    pub fn render_delete(&self) -> Result<String> {
        if self.predicates.is_empty() {
            return Err(Error::BadQuery(BadQueryError::UnconditionalDelete));
        }
        Ok(format!("DELETE FROM `{}`{}", self.descriptor.table_name, self.where_clause()))
    }

    pub fn fetch(&self, adapter: &mut dyn DatabaseAdapter) -> Result<Vec<Row>> {
        adapter.query_rows(&self.render_select())
    }
}

/// `qualified_column` is already backtick-quoted (e.g. `` `users`.`email` ``).
fn render_predicate(qualified_column: &str, operator: Operator, literal: Option<&str>) -> String {
    match operator {
        Operator::IsNull | Operator::IsNotNull => format!("{qualified_column} {}", operator.sql()),
        Operator::In => format!("{qualified_column} {} ({})", operator.sql(), literal.unwrap_or("NULL")),
        _ => format!("{qualified_column} {} {}", operator.sql(), literal.unwrap_or("NULL")),
    }
}

fn escape_literal(raw: &str) -> String {
    format!("'{}'", raw.replace('\'', "''"))
}

/// Renders the join(s) needed to reach a relation's target table under
/// `alias`. `ManyToMany` needs an intermediate pivot join the caller never
/// sees directly, so this can return more than one [`Join`].
fn render_joins(owner_table: &str, alias: &str, relation: &crate::resource::RelationAnnotation) -> Vec<Join> {
    match relation.kind {
        RelationKind::BelongsTo => {
            let foreign_key = relation.foreign_key.unwrap_or("");
            vec![Join {
                target_table: relation.target_table.to_string(),
                alias: alias.to_string(),
                on: format!("`{alias}`.`id` = `{owner_table}`.`{foreign_key}`"),
            }]
        }
        RelationKind::OneToOne | RelationKind::HasMany => {
            let foreign_key = relation.foreign_key.unwrap_or("");
            vec![Join {
                target_table: relation.target_table.to_string(),
                alias: alias.to_string(),
                on: format!("`{alias}`.`{foreign_key}` = `{owner_table}`.`id`"),
            }]
        }
        RelationKind::ManyToMany => {
            let pivot = relation.pivot_table.unwrap_or("");
            let foreign_key = relation.foreign_key.unwrap_or("");
            let related_key = relation.related_key.unwrap_or("");
            let pivot_alias = format!("{alias}_pivot");
            vec![
                Join {
                    target_table: pivot.to_string(),
                    alias: pivot_alias.clone(),
                    on: format!("`{pivot_alias}`.`{foreign_key}` = `{owner_table}`.`id`"),
                },
                Join {
                    target_table: relation.target_table.to_string(),
                    alias: alias.to_string(),
                    on: format!("`{alias}`.`id` = `{pivot_alias}`.`{related_key}`"),
                },
            ]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{ColumnAnnotation, FieldAnnotation};
    use crate::schema::ColumnType;

    const FIELDS: &[FieldAnnotation] = &[FieldAnnotation {
        property_name: "email",
        source_type: "string",
        column: Some(ColumnAnnotation {
            sql_type: ColumnType::Varchar,
            length: Some(255),
            precision: None,
            scale: None,
            default: None,
            nullable: false,
            name: None,
        }),
        primary_key: None,
        deprecated: false,
        filterable: Some(""),
        aggregate: false,
        relation: None,
    }];

    const DESCRIPTOR: ResourceDescriptor = ResourceDescriptor {
        table_name: "users",
        map_to: None,
        has_domain_mapping: false,
        fields: FIELDS,
        class_indexes: &[],
        tenant_scoped: None,
    };

    #[test]
    fn filtering_an_undeclared_property_is_rejected() {
        let mut builder = QueryBuilder::new(&DESCRIPTOR);
        let err = builder.filter("unknown", "eq", Some("x")).unwrap_err();
        assert!(matches!(err, Error::NotFilterable { .. }));
    }

    #[test]
    fn unconditional_delete_is_refused() {
        let builder = QueryBuilder::new(&DESCRIPTOR);
        let err = builder.render_delete().unwrap_err();
        assert!(matches!(err, Error::BadQuery(BadQueryError::UnconditionalDelete)));
    }

    #[test]
    fn filter_renders_into_a_where_clause() {
        let mut builder = QueryBuilder::new(&DESCRIPTOR);
        builder.filter("email", "eq", Some("a@example.com")).unwrap();
        assert_eq!(
            builder.render_select(),
            "SELECT `users`.* FROM `users` WHERE `users`.`email` = 'a@example.com'"
        );
    }

    #[test]
    fn invalid_page_is_rejected() {
        let mut builder = QueryBuilder::new(&DESCRIPTOR);
        assert!(builder.paginate(0, 10).is_err());
    }
}
