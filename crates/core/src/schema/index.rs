use super::ident::Ident;

/// A declared index over one or more columns of a single table.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDefinition {
    pub name: Ident,
    pub columns: Vec<Ident>,
    pub unique: bool,
}

impl IndexDefinition {
    /// Generates the deterministic name used when an annotation leaves it
    /// unspecified: `idx_{table}_{cols}` or `uniq_{table}_{cols}`.
    #[must_use]
    pub fn generate_name(table: &str, columns: &[Ident], unique: bool) -> String {
        let prefix = if unique { "uniq" } else { "idx" };
        let cols = columns
            .iter()
            .map(Ident::as_str)
            .collect::<Vec<_>>()
            .join("_");
        format!("{prefix}_{table}_{cols}")
    }
}
