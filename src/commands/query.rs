use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use maptomethod::config::Config;
use maptomethod::entities::QueryResult;
use maptomethod::mapping::Mapper;
use maptomethod::ontology::{ClassMatch, OntologyRegistry};

use super::MatchMode;

/// Arguments shared by `subjects` and `objects`
pub struct QueryParams {
    pub url: String,
    pub classes: Vec<String>,
    pub mode: Option<MatchMode>,
    pub output: Option<PathBuf>,
    pub authorization: Option<String>,
}

pub async fn subjects(config: Config, params: QueryParams) -> Result<()> {
    let classes = if params.classes.is_empty() {
        config.mapping.data_subject_classes.clone()
    } else {
        params.classes.clone()
    };
    let mode = params
        .mode
        .map(ClassMatch::from)
        .unwrap_or_else(|| config.mapping.data_match());

    run_query(config, params, classes, mode).await
}

pub async fn objects(config: Config, params: QueryParams) -> Result<()> {
    let classes = if params.classes.is_empty() {
        config.mapping.template_object_classes.clone()
    } else {
        params.classes.clone()
    };
    let mode = params
        .mode
        .map(ClassMatch::from)
        .unwrap_or_else(|| config.mapping.template_match());

    run_query(config, params, classes, mode).await
}

async fn run_query(
    config: Config,
    params: QueryParams,
    classes: Vec<String>,
    mode: ClassMatch,
) -> Result<()> {
    let mapper = Mapper::new(config).context("Failed to create mapper")?;
    let result = mapper
        .query(&params.url, &classes, mode, params.authorization.as_deref())
        .await
        .with_context(|| format!("Failed to query entities of {}", params.url))?;

    for collision in &result.collisions {
        eprintln!(
            "warning: short id '{}' used by {} and {}; kept the first",
            collision.short_id, collision.kept, collision.dropped
        );
    }

    match params.output {
        Some(path) => {
            write_result(&result, &path)?;
            println!("{} entities written to {}", result.len(), path.display());
        }
        None => print_result(&result),
    }

    Ok(())
}

fn print_result(result: &QueryResult) {
    println!("base: {}", result.base_namespace);
    for (short_id, record) in &result.entities {
        let label = match (&record.label_property, &record.label_text) {
            (Some(property), Some(text)) => format!("{property}: {text}"),
            _ => String::from("-"),
        };
        println!(
            "{short_id}\t{}\t{label}",
            record.rdf_type.as_deref().unwrap_or("-")
        );
    }
}

fn write_result(result: &QueryResult, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(result).context("Failed to serialize entities")?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write entities file: {}", path.display()))
}

pub async fn types(config: Config, url: String, authorization: Option<String>) -> Result<()> {
    let mapper = Mapper::new(config).context("Failed to create mapper")?;
    let types = mapper
        .types(&url, authorization.as_deref())
        .await
        .with_context(|| format!("Failed to list types of {url}"))?;

    for class in types {
        println!("{class}");
    }
    Ok(())
}

pub async fn resolve(config: Config, class: String, authorization: Option<String>) -> Result<()> {
    let mapper = Mapper::new(config).context("Failed to create mapper")?;
    let classes = mapper
        .resolve(&class, authorization.as_deref())
        .await
        .with_context(|| format!("Failed to resolve subclasses of {class}"))?;

    for class in classes {
        println!("{class}");
    }
    Ok(())
}

pub fn registry() -> Result<()> {
    let registry = OntologyRegistry::shared();
    for entry in registry.iter() {
        println!("{}\t{}\t{}", entry.prefix, entry.uri, entry.src);
    }
    Ok(())
}
