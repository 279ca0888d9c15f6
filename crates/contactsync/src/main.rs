//! `ctsync` - CLI for contactsync
//!
//! This binary provides the command-line interface for inspecting
//! configuration and exercising the realtime contact sync pipeline.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::watch;

use contactsync::cli::{Cli, Command, ConfigCommand, DemoCommand, OutputFormat, StatusCommand};
use contactsync::diagnostics::{CrashReporter, NoopReporter, TracingReporter};
use contactsync::remote::memory::MemoryCollection;
use contactsync::state::ContactStore;
use contactsync::{init_logging, Config, ContactList, ContactRepository};

// Platform-specific imports using conditional compilation
#[cfg(target_os = "linux")]
use contactsync_linux as platform;

#[cfg(target_os = "macos")]
use contactsync_mac as platform;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    // Execute the command
    match cli.command {
        Command::Demo(demo_cmd) => handle_demo(&config, &demo_cmd).await,
        Command::Status(status_cmd) => handle_status(&config, &status_cmd),
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
    }
}

/// Run the scripted add -> update -> delete round against the in-process
/// backend, printing every snapshot push as it arrives.
async fn handle_demo(config: &Config, cmd: &DemoCommand) -> anyhow::Result<()> {
    platform::init().map_err(|e| anyhow::anyhow!("platform init failed: {e}"))?;

    let reporter: Arc<dyn CrashReporter> = if config.diagnostics.report_errors {
        Arc::new(TracingReporter)
    } else {
        Arc::new(NoopReporter)
    };
    reporter.set_custom_key("platform", platform::platform_name());
    reporter.set_custom_key("collection", &config.remote.collection);

    let collection = Arc::new(MemoryCollection::with_snapshot_buffer(
        config.remote.snapshot_buffer,
    ));
    let repository = ContactRepository::with_reporter(collection, reporter);
    let store = ContactStore::with_config(repository, &config.sync);
    let mut snapshots = store.watch();

    println!("Collection:  {}", config.remote.collection);
    println!("Platform:    {}", platform::platform_name());
    println!();

    store.add_contact(cmd.name.as_str(), cmd.number.as_str());
    let list = next_snapshot(&mut snapshots, |l| l.len() == 1).await?;
    print_snapshot("after add", &list, cmd.format)?;
    let id = list[0].id.clone();

    let updated_number = format!("{}-updated", cmd.number);
    store.update_contact(id.clone(), cmd.name.as_str(), updated_number.as_str());
    let list = next_snapshot(&mut snapshots, |l| {
        l.first().is_some_and(|c| c.number == updated_number)
    })
    .await?;
    print_snapshot("after update", &list, cmd.format)?;

    store.delete_contact(id);
    let list = next_snapshot(&mut snapshots, ContactList::is_empty).await?;
    print_snapshot("after delete", &list, cmd.format)?;

    store.shutdown();
    Ok(())
}

/// Wait for the next snapshot push satisfying the predicate.
async fn next_snapshot(
    rx: &mut watch::Receiver<ContactList>,
    pred: impl Fn(&ContactList) -> bool,
) -> anyhow::Result<ContactList> {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            {
                let current = rx.borrow();
                if pred(&current) {
                    return Ok(current.clone());
                }
            }
            rx.changed()
                .await
                .map_err(|_| anyhow::anyhow!("snapshot stream closed"))?;
        }
    })
    .await
    .map_err(|_| anyhow::anyhow!("timed out waiting for snapshot push"))?
}

fn print_snapshot(label: &str, list: &ContactList, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(list)?);
        }
        OutputFormat::Plain => {
            println!("[{label}] {} contact(s)", list.len());
            for contact in list {
                println!("  {} ({})", contact, contact.id);
            }
        }
    }
    Ok(())
}

fn handle_status(config: &Config, cmd: &StatusCommand) -> anyhow::Result<()> {
    if cmd.json {
        let status = serde_json::json!({
            "platform": platform::platform_name(),
            "collection": config.remote.collection,
            "config_path": Config::default_config_path(),
            "snapshot_buffer": config.remote.snapshot_buffer,
            "mutation_queue_capacity": config.sync.mutation_queue_capacity,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("ctsync status");
        println!("-------------");
        println!("Platform:        {}", platform::platform_name());
        println!("Collection:      {}", config.remote.collection);
        println!(
            "Config path:     {}",
            Config::default_config_path().display()
        );
        println!("Snapshot buffer: {}", config.remote.snapshot_buffer);
        println!(
            "Mutation queue:  {}",
            config.sync.mutation_queue_capacity
        );
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Remote]");
                println!("  Collection:       {}", config.remote.collection);
                println!("  Snapshot buffer:  {}", config.remote.snapshot_buffer);
                println!();
                println!("[Sync]");
                println!(
                    "  Mutation queue:   {}",
                    config.sync.mutation_queue_capacity
                );
                println!("  Error queue:      {}", config.sync.error_queue_capacity);
                println!();
                println!("[Diagnostics]");
                println!("  Report errors:    {}", config.diagnostics.report_errors);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
