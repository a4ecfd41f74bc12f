//! Runner binary - queue fetched activity as time entries
//!
//! Reads a JSON array of raw activity items on stdin (the hand-off format
//! the fetchers emit), runs the aggregation pipeline against the persisted
//! seen set, and submits one entry per bucket to the tracking service.
//!
//! ## Usage
//!
//! ```bash
//! fetch-sources | timeflow [--dont-submit]
//! ```
//!
//! With `--dont-submit`, entries are printed along with their payloads
//! instead of being POSTed.
//!
//! ## Environment Variables
//!
//! See `RunConfig::from_env` for the full `TIMEFLOW_*` list; a `.env` file
//! in the working directory is honored.

use std::env;
use std::io::Read;

use timeflow::config::RunConfig;
use timeflow::outbound::{convert_bucket, EntrySubmitter, HttpSubmitter};
use timeflow::pipeline::{Pipeline, RawActivity, SeenStore, SqliteSeenStore};

fn parse_dont_submit_from_args() -> bool {
    env::args().any(|arg| arg == "--dont-submit")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    dotenv::dotenv().ok();

    let config = RunConfig::from_env();
    let dont_submit = parse_dont_submit_from_args();

    log::info!("🚀 Starting timeflow run");
    log::info!("   Seen state: {}", config.state_db_path);
    log::info!("   Max age: {} days", config.max_age_days);
    log::info!("   Bucket ceiling: {}s", config.bucket_ceiling_secs);
    if dont_submit {
        log::info!("   Dry run: entries will be printed, not submitted");
    }

    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    let batch: Vec<RawActivity> = serde_json::from_str(&input)?;
    log::info!("📖 Read {} raw items", batch.len());

    let mut store = SqliteSeenStore::open(&config.state_db_path)?;

    let run_result = {
        let mut pipeline = Pipeline::new(&config, &mut store);
        pipeline.process(batch)
    };

    // The seen set is flushed exactly once, whatever the run did.
    if let Err(e) = store.flush() {
        log::error!("❌ Failed to flush seen state: {}", e);
    }

    let (buckets, summary) = run_result?;

    let server = config
        .server
        .as_deref()
        .ok_or("TIMEFLOW_SERVER must be set")?;
    let username = config
        .username
        .as_deref()
        .ok_or("TIMEFLOW_USERNAME must be set")?;
    let submitter = HttpSubmitter::new(server, username, config.password.as_deref())?;

    let directory = submitter.fetch_projects()?;
    log::info!("📊 Resolved {} projects", directory.len());

    for bucket in &buckets {
        let entry = convert_bucket(bucket, &directory, config.default_project.as_deref())?;
        if dont_submit {
            println!("{}", entry);
            println!("{}", entry.to_xml());
        } else {
            submitter.submit(&entry)?;
            log::debug!("submitted entry for {}", entry.spent_at);
        }
    }

    log::info!("✅ Run complete");
    println!("{} items were recorded", summary.recorded);
    println!(
        "{} items were excluded because they had already been seen",
        summary.already_seen
    );
    println!(
        "{} items were excluded because they were too old",
        summary.too_old
    );

    Ok(())
}
