use std::path::{Path, PathBuf};

use anyhow::anyhow;
use clap::Parser as ClapParser;
use clap::Subcommand;
use impala_lineage::config::LineageConfig;
use impala_lineage::lineage::{LineageRecord, extract_lineage};
use impala_lineage::summary::{TableEdge, table_edges};
use indexmap::IndexMap;
use serde::Serialize;
use std::time::Instant;

#[derive(clap::Parser)]
#[command(name = "impala-lineage")]
#[command(about = "Heuristic lineage extractor for Impala SQL", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract lineage from one or more SQL files.
    ExtractLineage(LineageCommand),
}

#[derive(clap::Args)]
struct LineageCommand {
    /// Path to a TOML file with extraction settings.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Path to the SQL file or directory containing SQL files.
    #[arg(value_name = "SQL_[FILE|DIR]")]
    sql: PathBuf,
    /// Output table-level edges instead of records.
    #[arg(long)]
    tables: bool,
    /// Pretty-print the output lineage.
    #[arg(long)]
    pretty: bool,
}

#[derive(Serialize)]
#[serde(untagged)]
enum OutLineage {
    Records(Vec<LineageRecord>),
    Tables(Vec<TableEdge>),
}

fn output_lineage(
    lineage_command: &LineageCommand,
    config: &LineageConfig,
    sql_file_path: &Path,
) -> anyhow::Result<OutLineage> {
    let sql = std::fs::read_to_string(sql_file_path)
        .map_err(|_| anyhow!("Failed to read sql file {}", sql_file_path.display()))?;
    let records = extract_lineage(&sql, config);
    log::info!(
        "Extracted {} lineage records from {}",
        records.len(),
        sql_file_path.display()
    );
    Ok(if lineage_command.tables {
        OutLineage::Tables(table_edges(&records))
    } else {
        OutLineage::Records(records)
    })
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<String> {
    Ok(if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    })
}

fn main() -> anyhow::Result<()> {
    let now = Instant::now();

    env_logger::init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::ExtractLineage(lineage_command) => {
            let config = match &lineage_command.config {
                Some(path) => LineageConfig::from_file(path)?,
                None => LineageConfig::default(),
            };
            let sql_file_or_dir = &lineage_command.sql;
            let out_str = if sql_file_or_dir.is_dir() {
                let mut file_lineages: IndexMap<String, OutLineage> = IndexMap::new();
                let mut sql_in_dir: Vec<_> = std::fs::read_dir(sql_file_or_dir)?
                    .filter_map(|res| res.ok())
                    .map(|entry| entry.path())
                    .filter(|file| file.extension().is_some_and(|ext| ext == "sql"))
                    .collect();
                sql_in_dir.sort();

                for sql_file in sql_in_dir {
                    let output_lineage = output_lineage(lineage_command, &config, &sql_file)?;
                    file_lineages.insert(
                        std::path::absolute(sql_file)?.display().to_string(),
                        output_lineage,
                    );
                }
                to_json(&file_lineages, lineage_command.pretty)?
            } else {
                let output_lineage = output_lineage(lineage_command, &config, sql_file_or_dir)?;
                to_json(&output_lineage, lineage_command.pretty)?
            };
            println!("{}", out_str);
        }
    }

    let elapsed = now.elapsed();
    log::info!("Elapsed: {:.2?}", elapsed);

    Ok(())
}
