use std::path::{Path, PathBuf};

use anyhow::Context;
use colored::Colorize;
use dirsync_directory::LdapDirectory;
use dirsync_engine::{HookRegistry, SyncConfig, SyncOrchestrator, SyncReport};
use dirsync_store::{IdentityStore, JsonFileStore};
use tracing::debug;

use crate::cli::*;

/// Environment variable that overrides `[connection].bind_password`.
const BIND_PASSWORD_ENV: &str = "DIRSYNC_BIND_PASSWORD";

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    match cli.command {
        Command::Run(args) => cmd_run(args, format),
        Command::Check(args) => cmd_check(args, format),
        Command::Show(args) => cmd_show(args, format),
    }
}

fn store_path(flag: Option<PathBuf>, config: &SyncConfig) -> anyhow::Result<PathBuf> {
    flag.or_else(|| config.store.path.clone())
        .context("no store path: pass --store or set [store].path")
}

fn open_store(path: &Path, config: &SyncConfig) -> anyhow::Result<JsonFileStore> {
    JsonFileStore::open_with_max_field_length(path, config.store.max_field_length)
        .with_context(|| format!("cannot open store {}", path.display()))
}

fn cmd_run(args: RunArgs, format: OutputFormat) -> anyhow::Result<()> {
    let config = SyncConfig::load(&args.config)?;
    let settings = HookRegistry::with_builtins().resolve(&config)?;
    let store = open_store(&store_path(args.store, &config)?, &config)?;

    let mut connection = config
        .connection
        .clone()
        .context("no [connection] section in config")?;
    if let Ok(password) = std::env::var(BIND_PASSWORD_ENV) {
        debug!("bind password taken from {BIND_PASSWORD_ENV}");
        connection.bind_password = Some(password);
    }
    let mut directory = LdapDirectory::connect(&connection)?;

    let report = SyncOrchestrator::new(&settings, &store).run(&mut directory)?;
    print_report(&report, format)?;
    if report.has_failures() {
        anyhow::bail!("synchronization finished with failures");
    }
    Ok(())
}

fn print_report(report: &SyncReport, format: OutputFormat) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    match &report.groups {
        Some(g) => println!(
            "{} Groups: {} created, {} existing, {} skipped, {} failed",
            "✓".green().bold(),
            g.created.to_string().bold(),
            g.existing,
            g.skipped,
            failed_count(g.failed.len()),
        ),
        None => println!("  Groups: {}", "not configured".dimmed()),
    }
    match &report.users {
        Some(u) => println!(
            "{} Users: {} created, {} updated, {} unchanged, {} skipped, {} failed",
            "✓".green().bold(),
            u.created.to_string().bold(),
            u.updated.to_string().bold(),
            u.unchanged,
            u.skipped,
            failed_count(u.failed.len() + u.hook_failures.len()),
        ),
        None => println!("  Users: {}", "not configured".dimmed()),
    }
    if let Some(r) = &report.removal {
        println!(
            "{} Removed: {} processed, {} failed",
            "✓".green().bold(),
            r.removed.len().to_string().bold(),
            failed_count(r.hook_failures.len()),
        );
        for name in &r.removed {
            println!("  {} {}", "-".red(), name);
        }
    }
    Ok(())
}

fn failed_count(n: usize) -> colored::ColoredString {
    if n == 0 {
        n.to_string().normal()
    } else {
        n.to_string().red().bold()
    }
}

fn cmd_check(args: CheckArgs, format: OutputFormat) -> anyhow::Result<()> {
    let config = SyncConfig::load(&args.config)?;
    let settings = HookRegistry::with_builtins().resolve(&config)?;

    if format == OutputFormat::Json {
        let summary = serde_json::json!({
            "groups": settings.groups.as_ref().map(|g| &g.filter),
            "users": settings.users.as_ref().map(|u| &u.filter),
            "callbacks": settings.users.as_ref().map(|u| u.callbacks.iter().map(|h| h.name()).collect::<Vec<_>>()),
            "removed_callbacks": settings.users.as_ref().map(|u| u.removed_callbacks.iter().map(|h| h.name()).collect::<Vec<_>>()),
            "store": config.store.path,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{} {} is valid", "✓".green().bold(), args.config.display());
    match &settings.groups {
        Some(g) => println!("  Groups: {} ({} attributes)", g.filter.cyan(), g.attributes.len()),
        None => println!("  Groups: {}", "disabled".dimmed()),
    }
    match &settings.users {
        Some(u) => {
            println!("  Users: {} ({} attributes)", u.filter.cyan(), u.search_attributes().len());
            for hook in &u.callbacks {
                println!("  Callback: {}", hook.name().yellow());
            }
            for hook in &u.removed_callbacks {
                println!("  Removal callback: {}", hook.name().yellow());
            }
        }
        None => println!("  Users: {}", "disabled".dimmed()),
    }
    if config.connection.is_none() {
        println!("  {} no [connection] section; `run` will refuse to start", "!".yellow().bold());
    }
    Ok(())
}

fn cmd_show(args: ShowArgs, format: OutputFormat) -> anyhow::Result<()> {
    let store = JsonFileStore::open(&args.store)
        .with_context(|| format!("cannot open store {}", args.store.display()))?;
    let want_groups = !args.users;
    let want_users = !args.groups;
    let groups = if want_groups { store.groups()? } else { Vec::new() };
    let users = if want_users { store.users()? } else { Vec::new() };

    if format == OutputFormat::Json {
        let listing = serde_json::json!({ "groups": groups, "users": users });
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    if want_groups {
        println!("{} ({})", "Groups".bold(), groups.len());
        for group in &groups {
            println!("  {}", group.name.yellow());
        }
    }
    if want_users {
        println!("{} ({})", "Users".bold(), users.len());
        for user in &users {
            let state = if user.is_active { "active".green() } else { "inactive".red() };
            let password = if user.has_usable_password() { "local password" } else { "no local password" };
            println!("  {} [{}] {}", user.username.yellow(), state, password.dimmed());
        }
    }
    Ok(())
}
