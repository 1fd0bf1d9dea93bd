// CLI Command Implementations
// Wires the poller and the cloud collaborators to console output

use super::{
    error, info, success, warning, BucketAction, Cli, Commands, InstanceAction, KeypairAction,
    ObjectAction,
};
use crate::cloud::memory::MemoryCloud;
use crate::cloud::{ComputeApi, LaunchRequest, StorageApi};
use crate::config::SkywatchConfig;
use crate::poller::{PollerConfig, TelemetryPoller};
use crate::render::{ConsoleRenderer, JsonRenderer, TelemetrySink};
use crate::signals;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

/// Execute a CLI command
pub async fn execute(cli: Cli) -> anyhow::Result<()> {
    // The demo provider stands in for a real SDK-backed collaborator
    let cloud = Arc::new(MemoryCloud::with_demo_fleet());

    match cli.command {
        Commands::Monitor { instance, region, interval, json } => {
            monitor_command(&cli.config, cloud, instance, region, interval, json).await
        }
        Commands::Catalog => catalog_command(&cli.config),
        Commands::Regions => regions_command(cloud.as_ref()).await,
        Commands::Instances { action } => instances_command(cloud.as_ref(), action).await,
        Commands::Keypairs { action } => keypairs_command(cloud.as_ref(), action).await,
        Commands::SecurityGroups { region } => {
            security_groups_command(cloud.as_ref(), region).await
        }
        Commands::Buckets { action } => buckets_command(cloud.as_ref(), action).await,
        Commands::Objects { action } => objects_command(cloud.as_ref(), action).await,
        Commands::Validate { file } => validate_command(&file),
    }
}

/// Run the polling loop until SIGINT/SIGTERM
async fn monitor_command(
    config_path: &str,
    cloud: Arc<MemoryCloud>,
    instance: String,
    region: Option<String>,
    interval: Option<u64>,
    json: bool,
) -> anyhow::Result<()> {
    let file_config = SkywatchConfig::load(config_path)?;

    let region = region.unwrap_or_else(|| file_config.monitor.region.clone());
    let interval_secs = interval.unwrap_or(file_config.monitor.refresh_interval_secs);

    let mut poller_config =
        PollerConfig::new(&instance, &region, Duration::from_secs(interval_secs));
    poller_config.lookback_secs = file_config.monitor.lookback_secs;
    poller_config.period_secs = file_config.monitor.period_secs;
    poller_config.retention_events = file_config.monitor.retention_events;
    poller_config.catalog = file_config.catalog();

    let poller = match TelemetryPoller::new(poller_config, cloud) {
        Ok(poller) => poller,
        Err(e) => {
            error(&format!("Invalid monitoring configuration: {}", e));
            return Err(e.into());
        }
    };
    let session = poller.session();

    info(&format!(
        "Monitoring instance {} in region {}",
        instance.cyan(),
        region.cyan()
    ));
    info(&format!("Refresh interval: {}s", interval_secs));
    info("Press Ctrl+C to stop");
    println!();

    // Signal handling: SIGINT/SIGTERM cancel the loop gracefully
    let coordinator = signals::ShutdownCoordinator::new();
    let shutdown = coordinator.subscribe();
    let listener = signals::create_shutdown_listener()?;
    tokio::spawn(async move {
        listener.await;
        coordinator.trigger();
    });

    let sink: Box<dyn TelemetrySink> = if json {
        Box::new(JsonRenderer::new())
    } else {
        Box::new(ConsoleRenderer::new())
    };

    let span = crate::observability::session_span(session.id(), &instance, &region);
    let reason = poller.run(sink.as_ref(), shutdown).instrument(span).await;
    tracing::info!(reason = ?reason, "Monitoring loop exited");

    let elapsed_secs = (chrono::Utc::now() - session.started_at()).num_seconds();
    println!();
    success(&format!(
        "Stopped monitoring {} in {} after {} poll cycles ({}s elapsed)",
        session.resource_id().cyan(),
        session.region().cyan(),
        poller.ticks_completed(),
        elapsed_secs
    ));

    Ok(())
}

/// Show the configured metric catalog
fn catalog_command(config_path: &str) -> anyhow::Result<()> {
    let config = SkywatchConfig::load(config_path)?;
    let catalog = config.catalog();

    println!();
    for group in catalog.groups() {
        println!("{} {}", "▸".bright_cyan(), group.name.bright_white().bold());
        for metric in &group.metrics {
            println!(
                "    {:<28} {:<10} {}",
                metric.name,
                metric.unit.yellow(),
                metric.namespace.bright_black()
            );
        }
    }
    println!();
    info(&format!(
        "{} groups, {} metrics, one query each per tick",
        catalog.groups().len(),
        catalog.metric_count()
    ));

    Ok(())
}

/// List regions and their endpoints
async fn regions_command(cloud: &dyn ComputeApi) -> anyhow::Result<()> {
    let regions = cloud.list_regions().await?;

    println!();
    println!("{:<16}{}", "Region".bright_white().bold(), "Endpoint".bright_white().bold());
    for region in &regions {
        println!("{:<16}{}", region.name.cyan(), region.endpoint);
    }
    println!();

    Ok(())
}

async fn instances_command(cloud: &dyn ComputeApi, action: InstanceAction) -> anyhow::Result<()> {
    match action {
        InstanceAction::List { region } => {
            let region = region.unwrap_or_else(default_region);
            let instances = cloud.describe_instances(&region).await?;

            if instances.is_empty() {
                warning(&format!("No instances found in region {}", region));
                return Ok(());
            }

            println!();
            for instance in &instances {
                let state = match instance.state {
                    crate::cloud::InstanceState::Running => instance.state.to_string().green(),
                    crate::cloud::InstanceState::Stopped => instance.state.to_string().red(),
                    _ => instance.state.to_string().yellow(),
                };
                println!(
                    "  {:<22} {:<14} {:<10} {}",
                    instance.id.cyan(),
                    instance.name.as_deref().unwrap_or("-"),
                    instance.instance_type,
                    state
                );
            }
            println!();
            info(&format!("Found {} instance(s) in {}", instances.len(), region));
        }

        InstanceAction::Start { identifier, region } => {
            let region = region.unwrap_or_else(default_region);
            let matches = cloud.resolve_instances(&region, &identifier).await?;
            for instance in &matches {
                match cloud.start_instance(&region, &instance.id).await {
                    Ok(()) => success(&format!("Started instance {}", instance.id.cyan())),
                    Err(e) => error(&format!("Could not start {}: {}", instance.id, e)),
                }
            }
        }

        InstanceAction::Stop { identifier, region } => {
            let region = region.unwrap_or_else(default_region);
            let matches = cloud.resolve_instances(&region, &identifier).await?;
            for instance in &matches {
                match cloud.stop_instance(&region, &instance.id).await {
                    Ok(()) => success(&format!("Stopped instance {}", instance.id.cyan())),
                    Err(e) => error(&format!("Could not stop {}: {}", instance.id, e)),
                }
            }
        }

        InstanceAction::Launch {
            name,
            region,
            image,
            instance_type,
            key_pair,
            security_group,
            count,
        } => {
            let region = region.unwrap_or_else(default_region);
            let request = LaunchRequest {
                image_id: image,
                instance_type,
                key_pair,
                security_group,
                name_tag: name.clone(),
                count,
            };

            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::default_spinner()
                    .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
                    .template("{spinner:.green} {msg}")
                    .unwrap(),
            );
            spinner.set_message(format!("Launching {} instance(s)...", count));
            spinner.enable_steady_tick(Duration::from_millis(100));

            let result = cloud.launch_instances(&region, &request).await;
            spinner.finish_and_clear();

            let ids = result?;
            success(&format!(
                "Launched {} instance(s) named '{}' in {}",
                ids.len(),
                name.cyan(),
                region
            ));
            for id in &ids {
                println!("  - {}", id.cyan());
            }
        }
    }

    Ok(())
}

async fn keypairs_command(cloud: &dyn ComputeApi, action: KeypairAction) -> anyhow::Result<()> {
    match action {
        KeypairAction::List { region } => {
            let region = region.unwrap_or_else(default_region);
            let names = cloud.list_key_pairs(&region).await?;

            if names.is_empty() {
                warning(&format!("No key pairs in region {}", region));
            } else {
                for name in &names {
                    println!("  {}", name.cyan());
                }
            }
        }

        KeypairAction::Create { name, region } => {
            let region = region.unwrap_or_else(default_region);
            let material = cloud.create_key_pair(&region, &name).await?;

            let pem_path = format!("{}.pem", name);
            std::fs::write(&pem_path, material)?;
            success(&format!(
                "Key pair '{}' created and saved to '{}'",
                name.cyan(),
                pem_path
            ));
        }
    }

    Ok(())
}

async fn security_groups_command(
    cloud: &dyn ComputeApi,
    region: Option<String>,
) -> anyhow::Result<()> {
    let region = region.unwrap_or_else(default_region);
    let ids = cloud.list_security_groups(&region).await?;

    if ids.is_empty() {
        warning(&format!("No security groups in region {}", region));
    } else {
        for id in &ids {
            println!("  {}", id.cyan());
        }
        info(&format!("Found {} security group(s) in {}", ids.len(), region));
    }

    Ok(())
}

async fn buckets_command(cloud: &dyn StorageApi, action: BucketAction) -> anyhow::Result<()> {
    match action {
        BucketAction::List => {
            let buckets = cloud.list_buckets().await?;

            if buckets.is_empty() {
                warning("No buckets found");
                return Ok(());
            }

            println!();
            for bucket in &buckets {
                println!("  {:<32} {}", bucket.name.cyan(), bucket.region.bright_black());
            }
            println!();
            info(&format!("Found {} bucket(s)", buckets.len()));
        }

        BucketAction::Create { name, region } => {
            let region = region.unwrap_or_else(default_region);
            cloud.create_bucket(&region, &name).await?;
            success(&format!("Bucket '{}' created in {}", name.cyan(), region));
        }
    }

    Ok(())
}

async fn objects_command(cloud: &dyn StorageApi, action: ObjectAction) -> anyhow::Result<()> {
    match action {
        ObjectAction::List { bucket } => {
            let objects = cloud.list_objects(&bucket).await?;

            if objects.is_empty() {
                warning(&format!("Bucket '{}' is empty", bucket));
                return Ok(());
            }

            println!();
            for object in &objects {
                println!("  {:<40} {:>12} bytes", object.key.cyan(), object.size_bytes);
            }
            println!();
            info(&format!("{} object(s) in '{}'", objects.len(), bucket));
        }

        ObjectAction::Put { bucket, file, key } => {
            let body = std::fs::read(&file)?;
            let key = key.unwrap_or_else(|| {
                std::path::Path::new(&file)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| file.clone())
            });

            let size = body.len();
            cloud.put_object(&bucket, &key, body).await?;
            success(&format!(
                "Uploaded '{}' to bucket '{}' ({} bytes)",
                key.cyan(),
                bucket,
                size
            ));
        }

        ObjectAction::Delete { bucket, key } => {
            cloud.delete_object(&bucket, &key).await?;
            success(&format!("Deleted '{}' from bucket '{}'", key.cyan(), bucket));
        }
    }

    Ok(())
}

/// Validate a configuration file
fn validate_command(file: &str) -> anyhow::Result<()> {
    info(&format!("Validating {}", file.bright_white()));

    match SkywatchConfig::load(file) {
        Ok(config) => {
            success("Configuration file is valid");
            info(&format!(
                "Catalog: {} groups, {} metrics",
                config.catalog().groups().len(),
                config.catalog().metric_count()
            ));
            Ok(())
        }
        Err(e) => {
            error(&format!("Configuration invalid: {}", e));
            Err(e)
        }
    }
}

fn default_region() -> String {
    "eu-north-1".to_string()
}
