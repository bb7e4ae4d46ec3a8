use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::{fs, sync::Arc};
use tokio::io::{AsyncBufReadExt, BufReader};
use vigil_core::{
    get_config_path, ActivityKind, AuthState, RedirectPolicy, SessionExtender, SessionMonitor,
    SignalSink, WatchdogConfig,
};
use vigil_telemetry::{ActivityReporter, CollectorClient, EventTransport, PageContext};

#[derive(Parser)]
#[command(name = "vigil")]
#[command(about = "Session-activity watchdog and activity telemetry", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the watchdog interactively, mapping stdin input to activity
    Watch {
        /// Session timeout in minutes
        #[arg(long)]
        timeout_minutes: Option<u32>,
        /// Warn this many minutes before the timeout
        #[arg(long)]
        warn_minutes: Option<u32>,
        /// Inactivity check interval in milliseconds
        #[arg(long)]
        poll_interval_ms: Option<u64>,
        /// Collector base URL; telemetry and server-side extension are
        /// disabled without it
        #[arg(long)]
        collector: Option<String>,
        /// Page path reported to the collector
        #[arg(long, default_value = "/")]
        page: String,
    },
    /// Activity collector commands
    Collector {
        #[command(subcommand)]
        action: CollectorAction,
    },
}

#[derive(Subcommand, Debug)]
enum CollectorAction {
    /// Test connectivity against the extend-session endpoint
    Test {
        /// Collector base URL
        collector: String,
    },
}

/// Prints what a web rendering layer would put on screen
struct TerminalSink;

#[async_trait]
impl SignalSink for TerminalSink {
    async fn on_warn(&self, remaining_secs: u64) {
        println!(
            "\n[!] Session expiring in {remaining_secs}s due to inactivity. Type 'extend' to stay active."
        );
    }

    async fn on_dismiss_warning(&self) {
        println!("[.] Warning dismissed");
    }

    async fn on_expire(&self, redirect: &RedirectPolicy) {
        println!(
            "[x] Session expired. Redirecting to {} in {}s...",
            redirect.login_path, redirect.delay_secs
        );
        // The collaborator owns the navigation; here that is a delayed print
        tokio::time::sleep(std::time::Duration::from_secs(redirect.delay_secs)).await;
        println!("[x] -> {}", redirect.login_path);
    }

    async fn on_extension_confirmed(&self) {
        println!("[+] Session extended");
    }
}

/// Stand-in extension channel when no collector is configured
struct LocalExtender;

#[async_trait]
impl SessionExtender for LocalExtender {
    async fn extend_session(&self) -> Result<bool> {
        log::debug!("No collector configured; acknowledging extension locally");
        Ok(true)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    match cli.command {
        Commands::Watch {
            timeout_minutes,
            warn_minutes,
            poll_interval_ms,
            collector,
            page,
        } => {
            let mut config = load_config()?;
            if let Some(v) = timeout_minutes {
                config.timeout_minutes = v;
            }
            if let Some(v) = warn_minutes {
                config.warn_minutes = v;
            }
            if let Some(v) = poll_interval_ms {
                config.poll_interval_ms = v;
            }
            watch(config, collector, page).await
        }
        Commands::Collector { action } => match action {
            CollectorAction::Test { collector } => collector_test(collector).await,
        },
    }
}

/// Read the config file if present, otherwise fall back to defaults
fn load_config() -> Result<WatchdogConfig> {
    let path = get_config_path()?;
    if !path.exists() {
        return Ok(WatchdogConfig::default());
    }
    let raw = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

async fn watch(config: WatchdogConfig, collector: Option<String>, page: String) -> Result<()> {
    // The shell owns every instance; nothing here is a global
    let auth = Arc::new(AuthState::new(true));
    let sink: Arc<dyn SignalSink> = Arc::new(TerminalSink);

    let (extender, reporter): (Arc<dyn SessionExtender>, Option<ActivityReporter>) =
        match collector {
            Some(url) => {
                let client = Arc::new(CollectorClient::new(url)?);
                let transport: Arc<dyn EventTransport> = client.clone();
                let reporter = ActivityReporter::new(
                    transport,
                    auth.clone(),
                    PageContext {
                        path: page,
                        referrer: String::new(),
                    },
                    Utc::now(),
                );
                (client, Some(reporter))
            }
            None => (Arc::new(LocalExtender), None),
        };

    if let Some(r) = &reporter {
        r.report_page_view(Utc::now()).await;
    }

    let (monitor, handle) = SessionMonitor::new(config, sink, extender)?;
    let mut monitor_task = tokio::spawn(monitor.run());

    println!("vigil watch: any input counts as activity; 'extend' extends the session,");
    println!("'submit <text>' submits the tracked form, 'quit' exits.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = &mut monitor_task => break,
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => {
                let Ok(Some(text)) = line else { break };
                let input = text.trim();
                if input == "quit" || input == "q" {
                    break;
                }
                if input == "extend" {
                    handle.extend();
                } else if let Some(value) = input.strip_prefix("submit ") {
                    handle.record_activity(ActivityKind::KeyPress);
                    if let Some(r) = &reporter {
                        r.report_form_submit("translation", value, Utc::now()).await;
                    }
                } else {
                    handle.record_activity(ActivityKind::KeyPress);
                }
            }
        }
    }

    handle.dispose();
    if let Some(r) = &reporter {
        r.report_page_leave(Utc::now()).await;
    }

    Ok(())
}

async fn collector_test(collector: String) -> Result<()> {
    let client = CollectorClient::new(collector)?;

    println!("Testing collector connection...");
    match client.extend_session().await {
        Ok(true) => println!("Connection successful!"),
        Ok(false) => println!("Collector reachable, but the extension was refused"),
        Err(e) => println!("Connection failed: {e}"),
    }
    Ok(())
}
