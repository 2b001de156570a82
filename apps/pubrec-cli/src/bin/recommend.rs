use std::{env, sync::Arc};

use pubrec_core::config::Config;
use pubrec_service::{RecommenderService, WorkLayout};
use pubrec_text::TantivyBackend;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!(
            "Usage: {} <item_id> [-p <page>] [-n <rpp>] [-c <collection>] [--rank]",
            args[0]
        );
        eprintln!("Examples:");
        eprintln!("  {} d12345", args[0]);
        eprintln!("  {} d12345 -p 2 -n 20", args[0]);
        eprintln!("  {} 'neural networks' --rank", args[0]);
        std::process::exit(1);
    }

    let mut item = String::new();
    let mut page = 0usize;
    let mut rpp = 10usize;
    let mut collection = "documents".to_string();
    let mut rank_mode = false;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-p" => {
                if i + 1 < args.len() {
                    page = args[i + 1].parse().unwrap_or_else(|_| {
                        eprintln!("Error: -p requires a valid number");
                        std::process::exit(1);
                    });
                    i += 2;
                } else {
                    eprintln!("Error: -p requires a number");
                    std::process::exit(1);
                }
            }
            "-n" => {
                if i + 1 < args.len() {
                    rpp = args[i + 1].parse().unwrap_or_else(|_| {
                        eprintln!("Error: -n requires a valid number");
                        std::process::exit(1);
                    });
                    i += 2;
                } else {
                    eprintln!("Error: -n requires a number");
                    std::process::exit(1);
                }
            }
            "-c" => {
                if i + 1 < args.len() {
                    collection = args[i + 1].clone();
                    i += 2;
                } else {
                    eprintln!("Error: -c requires a collection name");
                    std::process::exit(1);
                }
            }
            "--rank" => {
                rank_mode = true;
                i += 1;
            }
            _ => {
                item = args[i].clone();
                i += 1;
            }
        }
    }
    if item.is_empty() {
        eprintln!("Error: An item id (or a query with --rank) is required");
        std::process::exit(1);
    }

    let config = Config::load()?;
    let service = RecommenderService::new(
        WorkLayout::new(config.source_root(), config.index_root()),
        config.max_chunk_bytes(),
        Arc::new(TantivyBackend::new()),
    );

    if rank_mode {
        let result = service.rank(&item, page, rpp);
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        service.load(&collection)?;
        let result = service.recommend(&item, page, rpp)?;
        println!("{}", serde_json::to_string_pretty(&result)?);
    }
    Ok(())
}
