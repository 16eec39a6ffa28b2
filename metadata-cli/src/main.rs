use anyhow::Result;
use clap::Parser;
use log::info;

use kv::contract::MemTxnKv;
use metadata::cancellation::Cancellation;
use metadata::entities::{Collection, DataType, FieldSchema, Schema, Segment};
use metadata::table::MetaTable;
use metadata_cli::config::CliConfig;
use metadata_cli::trace;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Configuration file path.
    #[clap(short = 'c', long = "config", default_value = "config/metadata-cli.toml")]
    config: String,

    #[clap(short = 'l', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_dir = format!("{}/.metadata-cli", std::env::var("HOME").unwrap_or_else(|_| ".".to_string()));
    std::fs::create_dir_all(&log_dir)?;
    let _guards = trace::init_logging(&log_dir, &args.log_level).await?;

    let cfg = CliConfig::load(&args.config);
    info!("metadata-cli starting with config: {:?}", &cfg);

    let table = MetaTable::new(MemTxnKv::new(), cfg.table_config())?;

    let collection = Collection {
        id: 1,
        schema: Schema {
            name: "demo".to_string(),
            fields: vec![FieldSchema { field_id: 1, name: "embedding".to_string(), data_type: DataType::VectorFloat }],
        },
        create_time: 0,
        segment_ids: Vec::new(),
        partition_tags: Vec::new(),
    };
    table.add_collection(collection, &Cancellation::none())?;
    info!("created collection {:?}", table.list_collections());

    table.add_partition(1, "p1".to_string(), &Cancellation::none())?;

    let segment = Segment {
        segment_id: 100,
        collection_id: 1,
        partition_tag: "p1".to_string(),
        num_rows: 0,
        open_time: 1,
        close_time: 0,
        binlog_file_paths: Vec::new(),
    };
    table.add_segment(segment, &Cancellation::none())?;
    table.close_segment(100, 42, &Cancellation::none())?;

    let got = table.get_segment_by_id(100)?;
    println!("segment 100 close_time = {}", got.close_time);

    table.delete_collection(1, &Cancellation::none())?;
    println!("collections remaining: {:?}", table.list_collections());

    Ok(())
}
