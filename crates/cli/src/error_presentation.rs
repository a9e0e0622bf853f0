use std::io;
use std::path::PathBuf;

use anyhow::Context;
use miette::Report;

const CORE_CONTEXT: &str = "while running semitexa-core";
const CONNECT_CONTEXT: &str = "while connecting to MySQL";
const AUDIT_WRITE_CONTEXT: &str = "while writing the sync audit record";

pub(crate) type CliResult<T> = std::result::Result<T, CliError>;

#[derive(Debug)]
pub(crate) enum CliError {
    Connect(semitexa_core::Error),
    Core(semitexa_core::Error),
    AuditWrite { path: PathBuf, source: io::Error },
}

impl From<semitexa_core::Error> for CliError {
    fn from(value: semitexa_core::Error) -> Self {
        Self::Core(value)
    }
}

pub(crate) fn render_runtime_error(error: CliError) -> String {
    match error {
        CliError::Connect(source) => {
            let category = core_category(&source);
            let report = report_with_context(source, CONNECT_CONTEXT);
            format!("[{category}] {report}")
        }
        CliError::Core(source) => {
            let category = core_category(&source);
            let report = report_with_context(source, CORE_CONTEXT);
            format!("[{category}] {report}")
        }
        CliError::AuditWrite { path, source } => {
            let context = format!("{AUDIT_WRITE_CONTEXT} `{}`", path.display());
            let report = report_with_context(source, context);
            format!("[io] {report}")
        }
    }
}

fn report_with_context<E, C>(source: E, context: C) -> Report
where
    E: std::error::Error + Send + Sync + 'static,
    C: Into<String>,
{
    let context = context.into();
    let anyhow_error = std::result::Result::<(), E>::Err(source)
        .context(context)
        .expect_err("context wrapping must produce an error");
    miette::miette!("{anyhow_error:#}")
}

fn core_category(error: &semitexa_core::Error) -> &'static str {
    match error {
        semitexa_core::Error::Validation(_) => "validation",
        semitexa_core::Error::SchemaState(_) => "schema-state",
        semitexa_core::Error::Capability(_) => "capability",
        semitexa_core::Error::PoolTimeout(_) => "pool",
        semitexa_core::Error::ConnectionLost(_) => "connection",
        semitexa_core::Error::Integrity(_) => "integrity",
        semitexa_core::Error::UnknownRelation { .. } => "relation",
        semitexa_core::Error::NotFilterable { .. } => "query",
        semitexa_core::Error::BadQuery(_) => "query",
    }
}
