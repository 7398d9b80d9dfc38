//! Subcommand handlers.

use crate::{Args, Command};
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::time::Duration;
use stockroom_core::query::{compile, CompiledQuery, RecognizedKeywords};
use stockroom_core::{CustomField, CustomFieldType, IndexServiceConfig, StockroomApi};
use tracing::info;

pub async fn run(args: &Args) -> Result<()> {
    match &args.command {
        // Compiling against explicit keywords needs neither the catalog nor
        // the index service.
        Command::Compile { query, keywords } => print_json(&compile_query(query, keywords)),
        command => {
            let api = build_api(args)?;
            run_with_api(&api, command).await
        }
    }
}

async fn run_with_api(api: &StockroomApi, command: &Command) -> Result<()> {
    match command {
        Command::Compile { query, keywords } => print_json(&compile_query(query, keywords)),
        Command::Search {
            team,
            query,
            limit,
            plan,
        } => {
            if *plan {
                print_json(&api.plan(team, query).await?)
            } else {
                print_json(&api.search(team, query, *limit).await?)
            }
        }
        Command::Tasks { team } => print_json(&api.list_tasks(team).await?),
        Command::Watch { team, interval_ms } => {
            watch(api, team, Duration::from_millis((*interval_ms).max(100))).await
        }
        Command::Rebuild { team } => {
            let summaries = api.rebuild_indexes(team).await?;
            info!("Index service accepted {} settings updates", summaries.len());
            print_json(&summaries)
        }
        Command::Fields { team } => print_json(&api.catalog().list_fields(team)?),
        Command::AddField {
            team,
            name,
            field_type,
        } => {
            let field_type = CustomFieldType::parse(field_type)?;
            let field = CustomField::new(team.as_str(), name.as_str(), field_type);
            api.catalog().upsert_field(&field)?;
            print_json(&field)
        }
        Command::RenameField { id, name } => {
            if !api.catalog().rename_field(id, name)? {
                bail!("no custom field with id {}", id);
            }
            print_json(&api.catalog().get_field(id)?)
        }
        Command::RemoveField { id } => {
            if !api.catalog().delete_field(id)? {
                bail!("no custom field with id {}", id);
            }
            info!("Removed custom field {}", id);
            Ok(())
        }
    }
}

fn compile_query(query: &str, keywords: &[String]) -> CompiledQuery {
    compile(query, &RecognizedKeywords::from_slugs(keywords.iter().cloned()))
}

fn build_api(args: &Args) -> Result<StockroomApi> {
    let mut config = IndexServiceConfig::new(&args.url)?;
    if let Some(key) = &args.api_key {
        config = config.with_api_key(key.as_str());
    }

    let mut builder = StockroomApi::builder(config).index_prefix(args.index_prefix.as_str());
    if let Some(path) = &args.catalog {
        builder = builder.catalog_path(path);
    }
    builder.build().context("failed to initialize Stockroom")
}

async fn watch(api: &StockroomApi, team: &str, interval: Duration) -> Result<()> {
    let mut watcher = api.watch_tasks(team, interval);

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal?;
                info!("Shutdown signal received, stopping");
                break;
            }
            snapshot = watcher.changed() => match snapshot {
                Some(snapshot) => print_json(&snapshot)?,
                None => break,
            },
        }
    }

    watcher.shutdown().await;
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
