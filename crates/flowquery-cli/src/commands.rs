//! Subcommand implementations.

use crate::formatter::Formatter;
use clap::ValueEnum;
use flowquery_core::entity::{HistoricProcessInstance, ProcessInstance, Task};
use flowquery_core::filter::{from_json, to_json};
use flowquery_core::{
    DefaultSerializers, EngineConfig, EntityKind, MemoryIdentityProvider, MemoryStore, Query,
    QueryContext, QueryError,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Errors reported by the command-line tool.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("cannot read {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not valid JSON: {}", .path.display(), .source)]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Query(#[from] QueryError),
}

/// Entity a filter targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Entity {
    Task,
    ProcessInstance,
    HistoricProcessInstance,
}

macro_rules! for_entity {
    ($entity:expr, $func:ident($($arg:expr),*)) => {
        match $entity {
            Entity::Task => $func::<Task>($($arg),*),
            Entity::ProcessInstance => $func::<ProcessInstance>($($arg),*),
            Entity::HistoricProcessInstance => $func::<HistoricProcessInstance>($($arg),*),
        }
    };
}

/// Summary of a decoded filter.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckReport {
    pub entity: &'static str,
    pub fields: Vec<&'static str>,
    pub variables: usize,
    pub disjuncts: usize,
    pub ordering: usize,
    /// Why the filter can never match, if it cannot.
    pub empty_reason: Option<String>,
}

/// Inputs of the `run` subcommand.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub filter: PathBuf,
    pub data: PathBuf,
    pub extend: Option<PathBuf>,
    pub groups: Option<PathBuf>,
    pub first: usize,
    pub max: Option<usize>,
    pub count: bool,
}

fn read_json(path: &Path) -> Result<serde_json::Value, CliError> {
    let content = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn load_query<E: EntityKind>(path: &Path) -> Result<Query<E>, CliError> {
    let query = from_json::<E>(&read_json(path)?)?;
    debug!(path = %path.display(), entity = E::NAME, "loaded filter");
    Ok(query)
}

fn load_identity(path: &Path) -> Result<MemoryIdentityProvider, CliError> {
    let memberships: HashMap<String, Vec<String>> =
        serde_json::from_value(read_json(path)?).map_err(|source| CliError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(MemoryIdentityProvider::from_memberships(memberships))
}

pub fn check(entity: Entity, filter: &Path, formatter: &dyn Formatter) -> Result<String, CliError> {
    for_entity!(entity, check_as(filter, formatter))
}

fn check_as<E: EntityKind>(filter: &Path, formatter: &dyn Formatter) -> Result<String, CliError> {
    let query = load_query::<E>(filter)?;
    let report = CheckReport {
        entity: E::NAME,
        fields: E::descriptors()
            .iter()
            .filter(|d| query.root().is_set(d.field))
            .map(|d| d.key)
            .collect(),
        variables: query.root().variables().len(),
        disjuncts: query.disjuncts().len(),
        ordering: query.root().ordering().len(),
        empty_reason: query.excluding_reason().map(|r| r.to_string()),
    };
    Ok(formatter.format_check(&report))
}

pub fn merge(
    entity: Entity,
    base: &Path,
    extension: &Path,
    formatter: &dyn Formatter,
) -> Result<String, CliError> {
    for_entity!(entity, merge_as(base, extension, formatter))
}

fn merge_as<E: EntityKind>(base: &Path, extension: &Path, formatter: &dyn Formatter) -> Result<String, CliError> {
    let merged = load_query::<E>(base)?.extend(&load_query::<E>(extension)?)?;
    Ok(formatter.format_filter(&to_json(&merged)?))
}

pub fn run(
    entity: Entity,
    options: &RunOptions,
    config: &EngineConfig,
    formatter: &dyn Formatter,
) -> Result<String, CliError> {
    for_entity!(entity, run_as(options, config, formatter))
}

fn run_as<E: EntityKind>(
    options: &RunOptions,
    config: &EngineConfig,
    formatter: &dyn Formatter,
) -> Result<String, CliError> {
    let mut query = load_query::<E>(&options.filter)?;
    if let Some(extension) = &options.extend {
        query = query.extend(&load_query::<E>(extension)?)?;
    }
    let store = MemoryStore::<E>::from_json(&read_json(&options.data)?)?;
    let identity = match &options.groups {
        Some(path) => load_identity(path)?,
        None => MemoryIdentityProvider::new(),
    };
    let serializers = DefaultSerializers::new();
    let ctx = QueryContext::new(config, &serializers, &identity);

    if options.count {
        let count = query.count(&ctx, &store)?;
        info!(entity = E::NAME, count, "counted matches");
        return Ok(formatter.format_count(count));
    }

    let max = options.max.or(config.query_max_results).unwrap_or(usize::MAX);
    let records = query.list_page(&ctx, &store, options.first, max)?;
    info!(entity = E::NAME, records = store.len(), matched = records.len(), "executed filter");
    Ok(formatter.format_records(&records))
}
