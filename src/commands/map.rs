use anyhow::{Context, Result};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

use maptomethod::config::Config;
use maptomethod::entities::QueryResult;
use maptomethod::mapping::{CachedEntities, Mapper, MappingOutput, MappingPair, MappingRequest};

use super::OutputFormat;

/// Arguments of the `map` command
pub struct MapParams {
    pub data_url: String,
    pub template_url: String,
    pub pairs: Vec<String>,
    pub pairs_file: Option<PathBuf>,
    pub data_entities: Option<PathBuf>,
    pub predicate: Option<String>,
    pub rowwise: bool,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub authorization: Option<String>,
}

pub async fn map(config: Config, params: MapParams) -> Result<()> {
    let pairs = collect_pairs(&params.pairs, params.pairs_file.as_deref())?;
    if pairs.is_empty() {
        anyhow::bail!("No pairs given; use --pair TEMPLATE_ID=DATA_ID or --pairs-file");
    }

    let cached = CachedEntities {
        data: params
            .data_entities
            .as_deref()
            .map(load_entities)
            .transpose()?,
        template_namespace: None,
    };

    let request = MappingRequest {
        data_url: params.data_url,
        template_url: params.template_url,
        pairs,
        predicate: params.predicate,
        use_template_rowwise: params.rowwise.then_some(true),
    };

    let mapper = Mapper::new(config).context("Failed to create mapper")?;
    let output = mapper
        .map(&request, cached, params.authorization.as_deref())
        .await
        .with_context(|| format!("Failed to map {}", request.data_url))?;

    for skipped in &output.skipped {
        eprintln!("warning: skipped {} ({})", skipped.pair, skipped.reason);
    }

    let text = render(&output, params.format)?;
    match params.output {
        Some(path) => {
            let target = if path.is_dir() {
                path.join(file_name(&output, params.format))
            } else {
                path
            };
            std::fs::write(&target, text)
                .with_context(|| format!("Failed to write mapping file: {}", target.display()))?;
            println!(
                "{} rules written to {}",
                output.document.mappings.len(),
                target.display()
            );
        }
        None => print!("{text}"),
    }

    Ok(())
}

fn collect_pairs(args: &[String], file: Option<&Path>) -> Result<Vec<MappingPair>> {
    let mut pairs = Vec::new();

    if let Some(path) = file {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read pairs file: {}", path.display()))?;
        let entries: IndexMap<String, String> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse pairs file: {}", path.display()))?;
        pairs.extend(
            entries
                .into_iter()
                .map(|(template, data)| MappingPair::new(template, data)),
        );
    }

    for arg in args {
        let pair = arg.parse::<MappingPair>().map_err(anyhow::Error::msg)?;
        pairs.push(pair);
    }

    Ok(pairs)
}

fn load_entities(path: &Path) -> Result<QueryResult> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read entities file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse entities file: {}", path.display()))
}

fn render(output: &MappingOutput, format: OutputFormat) -> Result<String> {
    let text = match format {
        OutputFormat::Yaml => output.to_yaml()?,
        OutputFormat::Json => output.to_json()?,
    };
    Ok(text)
}

fn file_name(output: &MappingOutput, format: OutputFormat) -> String {
    match format {
        OutputFormat::Yaml => output.filename.clone(),
        OutputFormat::Json => output
            .filename
            .strip_suffix(".yaml")
            .map(|stem| format!("{stem}.json"))
            .unwrap_or_else(|| output.filename.clone()),
    }
}
