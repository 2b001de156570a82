use std::{env, sync::Arc};

use pubrec_core::config::{resolve_with_base, Config};
use pubrec_service::{RecommenderService, WorkLayout};
use pubrec_text::TantivyBackend;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let args: Vec<String> = env::args().skip(1).collect();
    let mut collection = None;
    let mut source_override = None;
    let mut index_override = None;
    let mut chunk_bytes = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--source" | "-s" => {
                if i + 1 < args.len() {
                    source_override = Some(args[i + 1].clone());
                    i += 1;
                } else {
                    eprintln!("Error: --source requires a directory");
                    std::process::exit(1);
                }
            }
            "--index" | "-i" => {
                if i + 1 < args.len() {
                    index_override = Some(args[i + 1].clone());
                    i += 1;
                } else {
                    eprintln!("Error: --index requires a directory");
                    std::process::exit(1);
                }
            }
            "--chunk-bytes" => {
                if i + 1 < args.len() {
                    match args[i + 1].parse::<usize>() {
                        Ok(n) if n > 0 => {
                            chunk_bytes = Some(n);
                            i += 1;
                        }
                        _ => {
                            eprintln!("Error: --chunk-bytes requires a positive number");
                            std::process::exit(1);
                        }
                    }
                } else {
                    eprintln!("Error: --chunk-bytes requires a number");
                    std::process::exit(1);
                }
            }
            _ if !args[i].starts_with('-') => collection = Some(args[i].clone()),
            other => {
                eprintln!("Error: Unknown argument '{}'", other);
                std::process::exit(1);
            }
        }
        i += 1;
    }
    let collection = collection.unwrap_or_else(|| "documents".to_string());
    let cwd = env::current_dir()?;
    let source_root = source_override
        .map(|dir| resolve_with_base(&cwd, dir))
        .unwrap_or_else(|| config.source_root());
    let index_root = index_override
        .map(|dir| resolve_with_base(&cwd, dir))
        .unwrap_or_else(|| config.index_root());
    let max_chunk_bytes = chunk_bytes.unwrap_or_else(|| config.max_chunk_bytes());

    println!("pubrec indexer\n==============");
    println!("Collection: {}", collection);
    println!("Sources:    {}", source_root.display());
    println!("Index root: {}", index_root.display());

    let service = RecommenderService::new(
        WorkLayout::new(source_root, index_root),
        max_chunk_bytes,
        Arc::new(TantivyBackend::new()),
    );
    let report = service.index(&collection)?;

    println!("\n✅ Indexing completed successfully!");
    println!(
        "📊 {} source files split into {} chunks; {} records indexed, {} skipped",
        report.source_files, report.chunk_files, report.records_written, report.records_skipped
    );
    println!("\n💡 To query, use: cargo run --bin pubrec-recommend -- <item_id>");
    Ok(())
}
