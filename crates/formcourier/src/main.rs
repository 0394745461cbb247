//! `fcourier` - CLI for formcourier
//!
//! This binary sends contact form messages to the configured form-relay
//! endpoint, shows the remaining send allowance, and manages configuration.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::Read;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;

use formcourier::cli::{Cli, Command, ConfigCommand, QuotaCommand, ResetCommand, SendCommand};
use formcourier::{
    init_logging, Config, Controller, FileStore, HttpRelay, Message, Notice, NoticeKind, Notifier,
    Quota, QuotaStatus,
};

/// Prints notices to the terminal.
///
/// The CLI has no surface to fade; the notice's visibility window only
/// matters to graphical front ends embedding the library.
#[derive(Debug, Default)]
struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&mut self, notice: &Notice) {
        match notice.kind {
            NoticeKind::Success => println!("{}", notice.text),
            NoticeKind::Error => eprintln!("{}", notice.text),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    // Execute the command
    match cli.command {
        Command::Send(send_cmd) => handle_send(&config, send_cmd).await,
        Command::Quota(quota_cmd) => handle_quota(&config, &quota_cmd),
        Command::Reset(reset_cmd) => handle_reset(&config, &reset_cmd),
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
    }
}

async fn handle_send(config: &Config, cmd: SendCommand) -> anyhow::Result<()> {
    let endpoint = config.endpoint()?;

    let body = match cmd.message {
        Some(body) => body,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read message body from stdin")?;
            buf
        }
    };
    let message = Message::new(&cmd.name, &cmd.email, cmd.subject.as_deref(), &body);

    let store = FileStore::open(config.state_path())?;
    let relay = HttpRelay::new(endpoint, config.relay.honeypot_field.clone());
    let mut controller = Controller::new(store, relay, TerminalNotifier, config.quota())
        .with_notice_visible(config.notice_visible());

    // The notifier has already shown the user-facing text; the propagated
    // error carries the diagnostic detail and the non-zero exit code.
    controller.submit(&message, Utc::now()).await?;
    Ok(())
}

fn handle_quota(config: &Config, cmd: &QuotaCommand) -> anyhow::Result<()> {
    let store = FileStore::open(config.state_path())?;
    let status = config.quota().status(&store, Utc::now())?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    match status {
        QuotaStatus::DailyCount {
            date,
            used,
            cap,
            remaining,
        } => {
            println!("Policy:     daily count");
            println!("Day:        {date}");
            println!("Used:       {used} of {cap}");
            println!("Remaining:  {remaining}");
        }
        QuotaStatus::Cooldown {
            last_sent_ms,
            remaining_ms,
        } => {
            println!("Policy:     cooldown");
            match last_sent_ms {
                Some(ms) => println!("Last sent:  {ms} (epoch ms)"),
                None => println!("Last sent:  never"),
            }
            if remaining_ms > 0 {
                println!("Next send:  in {remaining_ms} ms");
            } else {
                println!("Next send:  ready");
            }
        }
    }
    Ok(())
}

fn handle_reset(config: &Config, cmd: &ResetCommand) -> anyhow::Result<()> {
    if !cmd.yes {
        println!("This will clear the persisted rate-limit state.");
        println!("Use --yes to confirm.");
        return Ok(());
    }

    let mut store = FileStore::open(config.state_path())?;
    Quota::reset(&mut store)?;
    println!("Rate limit state cleared.");
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
                println!("[Relay]");
                println!(
                    "  Endpoint:        {}",
                    config.relay.endpoint.as_deref().unwrap_or("<not set>")
                );
                println!(
                    "  Honeypot field:  {}",
                    config.relay.honeypot_field.as_deref().unwrap_or("<none>")
                );
                println!();
                println!("[Quota]");
                println!("  Policy:          {}", config.quota.policy);
                println!("  Daily cap:       {}", config.quota.daily_cap);
                println!("  Cooldown hours:  {}", config.quota.cooldown_hours);
                println!();
                println!("[Store]");
                println!("  State file:      {}", config.state_path().display());
                println!();
                println!("[Notice]");
                println!("  Visible (secs):  {}", config.notice.visible_secs);
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
