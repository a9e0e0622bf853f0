//! A resource type that wants `seed` to upsert its `defaults()` rows
//! implements this and is handed to [`crate::commands::run_seed`]. There is
//! no blanket impl over `Resource` because `defaults()` is application
//! data, not something the derive macro can synthesize.

use semitexa_core::UpsertColumn;

pub trait SeedSource {
    fn table(&self) -> &str;

    /// One `Vec<UpsertColumn>` per row, already rendered to SQL literals.
    fn rows(&self) -> Vec<Vec<UpsertColumn<'_>>>;
}
