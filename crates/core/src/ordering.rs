//! Orders an unordered `Vec<DiffOp>` from the comparator into an
//! execution-safe sequence.
//!
//! Tables are created (topologically, by FK dependency, with cycles broken
//! for ordering purposes only) before anything references them. Every
//! foreign key on a newly created table is always deferred to a separate
//! `AddForeignKey` op that runs after all tables exist, never rendered
//! inline in the `CREATE TABLE` body — so a non-cyclic FK is treated the
//! same way a cyclic one always was. Destructive drops run in the reverse
//! dependency direction, narrowest first.

use std::collections::BTreeSet;

use crate::diff_op::DiffOp;
use crate::schema::TableDefinition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum PriorityGroup {
    AddColumn,
    AlterColumn,
    AddForeignKey,
    AddIndex,
    DropIndex,
    DropColumn,
    DropForeignKey,
    DropTable,
}

#[must_use]
pub fn sort_diff_ops(ops: Vec<DiffOp>) -> Vec<DiffOp> {
    let (create_table_ops, rest): (Vec<DiffOp>, Vec<DiffOp>) =
        ops.into_iter().partition(|op| matches!(op, DiffOp::CreateTable(_)));

    let (ordered_creates, deferred_foreign_keys) = order_create_tables(create_table_ops);

    let mut grouped: Vec<(PriorityGroup, DiffOp)> = rest
        .into_iter()
        .chain(deferred_foreign_keys)
        .map(|op| (priority_group(&op), op))
        .collect();
    // `sort_by_key` is stable, so ops within a group keep the comparator's
    // original relative order (itself deterministic, table-name ordered).
    grouped.sort_by_key(|(group, _)| *group);

    let mut sorted = ordered_creates;
    sorted.extend(grouped.into_iter().map(|(_, op)| op));
    sorted
}

fn priority_group(op: &DiffOp) -> PriorityGroup {
    match op {
        DiffOp::CreateTable(_) => unreachable!("CreateTable is ordered separately"),
        DiffOp::AddColumn { .. } => PriorityGroup::AddColumn,
        DiffOp::AlterColumn { .. } => PriorityGroup::AlterColumn,
        DiffOp::AddForeignKey { .. } => PriorityGroup::AddForeignKey,
        DiffOp::AddIndex { .. } => PriorityGroup::AddIndex,
        DiffOp::DropIndex { .. } => PriorityGroup::DropIndex,
        DiffOp::MarkColumnDeprecated { .. } | DiffOp::DropColumn { .. } => PriorityGroup::DropColumn,
        DiffOp::DropForeignKey { .. } => PriorityGroup::DropForeignKey,
        DiffOp::MarkTableDeprecated { .. } | DiffOp::DropTable { .. } => PriorityGroup::DropTable,
    }
}

/// Topologically sorts `CreateTable` ops by FK dependency (cycles broken so
/// the ordering is well-defined) and strips every table's foreign keys into
/// deferred `AddForeignKey` ops, run after every table exists.
fn order_create_tables(ops: Vec<DiffOp>) -> (Vec<DiffOp>, Vec<DiffOp>) {
    let mut tables: Vec<TableDefinition> = ops
        .into_iter()
        .map(|op| match op {
            DiffOp::CreateTable(table) => table,
            _ => unreachable!("partition guarantees only CreateTable ops here"),
        })
        .collect();

    let index_by_name: std::collections::BTreeMap<String, usize> = tables
        .iter()
        .enumerate()
        .map(|(idx, table)| (table.name.to_string(), idx))
        .collect();

    let mut dependencies: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); tables.len()];
    for (idx, table) in tables.iter().enumerate() {
        for fk in &table.foreign_keys {
            if let Some(&dep_idx) = index_by_name.get(fk.referenced_table.as_str())
                && dep_idx != idx
            {
                dependencies[idx].insert(dep_idx);
            }
        }
    }

    while let Some((from, to)) = find_cyclic_edge(&dependencies) {
        dependencies[from].remove(&to);
    }

    let mut deferred = Vec::new();
    for table in &mut tables {
        for fk in table.foreign_keys.drain(..) {
            deferred.push(DiffOp::AddForeignKey {
                table: table.name.clone(),
                fk,
            });
        }
    }

    let order = topo_sort_indices(&dependencies);
    let mut slots: Vec<Option<TableDefinition>> = tables.into_iter().map(Some).collect();
    let ordered_creates = order
        .into_iter()
        .map(|idx| DiffOp::CreateTable(slots[idx].take().expect("each index visited once")))
        .collect();

    (ordered_creates, deferred)
}

fn can_reach(dependencies: &[BTreeSet<usize>], from: usize, to: usize) -> bool {
    let mut visited = vec![false; dependencies.len()];
    let mut stack = vec![from];
    while let Some(node) = stack.pop() {
        if node == to {
            return true;
        }
        if visited[node] {
            continue;
        }
        visited[node] = true;
        stack.extend(dependencies[node].iter().copied());
    }
    false
}

/// Finds an edge `from -> to` (meaning `from` depends on `to`) where `to` can
/// also reach `from`, i.e. an edge that participates in a cycle.
fn find_cyclic_edge(dependencies: &[BTreeSet<usize>]) -> Option<(usize, usize)> {
    for (from, deps) in dependencies.iter().enumerate() {
        for &to in deps {
            if can_reach(dependencies, to, from) {
                return Some((from, to));
            }
        }
    }
    None
}

fn topo_sort_indices(dependencies: &[BTreeSet<usize>]) -> Vec<usize> {
    let n = dependencies.len();
    let mut reverse_edges = vec![BTreeSet::<usize>::new(); n];
    for (idx, deps) in dependencies.iter().enumerate() {
        for &dep in deps {
            reverse_edges[dep].insert(idx);
        }
    }

    let mut remaining: Vec<usize> = dependencies.iter().map(BTreeSet::len).collect();
    let mut ready: BTreeSet<usize> = (0..n).filter(|&idx| remaining[idx] == 0).collect();
    let mut visited = vec![false; n];
    let mut order = Vec::with_capacity(n);

    while let Some(&idx) = ready.iter().next() {
        ready.remove(&idx);
        if visited[idx] {
            continue;
        }
        visited[idx] = true;
        order.push(idx);

        for &dependent in &reverse_edges[idx] {
            if remaining[dependent] == 0 {
                continue;
            }
            remaining[dependent] -= 1;
            if remaining[dependent] == 0 {
                ready.insert(dependent);
            }
        }
    }

    // Every cycle was broken before this runs, but fall back to declaration
    // order for any index a logic bug left unvisited rather than panicking.
    if order.len() != n {
        order.extend((0..n).filter(|idx| !visited[*idx]));
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ForeignKeyAction, ForeignKeyDefinition, Ident};

    fn table(name: &str) -> TableDefinition {
        TableDefinition::new(Ident::new(name).unwrap())
    }

    fn fk(table_name: &str, referenced: &str) -> ForeignKeyDefinition {
        ForeignKeyDefinition {
            name: Ident::new(format!("fk_{table_name}_{referenced}_id")).unwrap(),
            table: Ident::new(table_name).unwrap(),
            column: Ident::new(format!("{referenced}_id")).unwrap(),
            referenced_table: Ident::new(referenced).unwrap(),
            referenced_column: Ident::new("id").unwrap(),
            on_delete: ForeignKeyAction::Restrict,
            on_update: ForeignKeyAction::Restrict,
        }
    }

    #[test]
    fn dependent_tables_are_created_after_their_dependencies() {
        let mut posts = table("posts");
        posts.foreign_keys.push(fk("posts", "users"));
        let users = table("users");

        let ops = vec![DiffOp::CreateTable(posts), DiffOp::CreateTable(users)];
        let (ordered, deferred) = order_create_tables(ops);

        assert_eq!(deferred.len(), 1);
        assert!(matches!(&deferred[0], DiffOp::AddForeignKey { table, .. } if table.as_str() == "posts"));

        let names: Vec<&str> = ordered
            .iter()
            .map(|op| match op {
                DiffOp::CreateTable(t) => t.name.as_str(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(names, ["users", "posts"]);

        // Foreign keys never render inline in a CREATE TABLE body — every one
        // of them, cyclic or not, always comes back out as a deferred op.
        for op in &ordered {
            let DiffOp::CreateTable(table) = op else { unreachable!() };
            assert!(table.foreign_keys.is_empty());
        }
    }

    #[test]
    fn cyclic_foreign_keys_are_deferred_to_add_foreign_key() {
        let mut a = table("a");
        a.foreign_keys.push(fk("a", "b"));
        let mut b = table("b");
        b.foreign_keys.push(fk("b", "a"));

        let ops = vec![DiffOp::CreateTable(a), DiffOp::CreateTable(b)];
        let (ordered, deferred) = order_create_tables(ops);

        assert_eq!(ordered.len(), 2);
        assert_eq!(deferred.len(), 2);
        assert!(deferred.iter().all(|op| matches!(op, DiffOp::AddForeignKey { .. })));
    }

    #[test]
    fn group_order_places_drops_after_adds() {
        let ops = vec![
            DiffOp::DropTable {
                table: Ident::new("legacy").unwrap(),
                state: crate::reader::DbTableState {
                    name: "legacy".to_string(),
                    comment: "SEMITEXA_DEPRECATED".to_string(),
                },
            },
            DiffOp::AddColumn {
                table: Ident::new("users").unwrap(),
                column: Box::new(crate::schema::ColumnDefinition {
                    name: Ident::new("nickname").unwrap(),
                    property_name: "nickname".to_string(),
                    column_type: crate::schema::ColumnType::Varchar,
                    source_type: "string".to_string(),
                    nullable: true,
                    length: Some(50),
                    precision: None,
                    scale: None,
                    default: None,
                    is_primary_key: false,
                    pk_strategy: None,
                    is_deprecated: false,
                }),
            },
        ];

        let sorted = sort_diff_ops(ops);
        assert!(matches!(sorted[0], DiffOp::AddColumn { .. }));
        assert!(matches!(sorted[1], DiffOp::DropTable { .. }));
    }
}
