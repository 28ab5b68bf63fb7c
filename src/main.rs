mod api;
mod config;
mod format;
mod history;
mod indicator;
mod logging;
mod session;
mod timer;
mod transcript;
mod tui;

use std::sync::Arc;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use config::{ConfigFile, ResolvedConfig};

use api::{ApiClient, Backend};
use history::HistoryPanel;
use session::{Controller, HistoryOp, RenderPort, TranscriptOp};
use transcript::Sender;

#[derive(Parser, Debug)]
#[command(
    name = "quicknews",
    about = "Terminal client for the QuickNews article summarizer",
    long_about = None,
)]
struct Args {
    /// Article URL or question to send once (omit to enter interactive TUI mode)
    text: Option<String>,

    /// Send the text to the search endpoint instead
    #[arg(short, long)]
    search: bool,

    /// Profile to use from config file
    #[arg(short, long, env = "QUICKNEWS_PROFILE")]
    profile: Option<String>,

    /// Override backend URL
    #[arg(long, env = "QUICKNEWS_ENDPOINT")]
    endpoint: Option<String>,

    /// Anti-forgery token to send with state-changing requests
    #[arg(long, env = "QUICKNEWS_CSRF_TOKEN")]
    csrf_token: Option<String>,

    /// Print the grouped article history and exit
    #[arg(long)]
    history: bool,

    /// Log to stderr instead of the log file
    #[arg(long)]
    log_stderr: bool,

    /// Write a default config file to ~/.config/quicknews/config.toml and exit
    #[arg(long)]
    init: bool,

    /// List available profiles and exit
    #[arg(long)]
    profiles: bool,

    /// Generate shell completions and print to stdout (bash, zsh, fish, elvish)
    #[arg(long, value_name = "SHELL")]
    completions: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // ── --init ────────────────────────────────────────────────────────────────
    if args.init {
        let path = ConfigFile::write_default_if_missing()?;
        println!("Config written to: {}", path.display());
        println!("Edit it, then run: quicknews");
        return Ok(());
    }

    // ── --completions ─────────────────────────────────────────────────────────
    if let Some(shell_name) = &args.completions {
        return generate_completions(shell_name);
    }

    let file = ConfigFile::load()?;

    // ── --profiles ────────────────────────────────────────────────────────────
    if args.profiles {
        print_profiles(&file);
        return Ok(());
    }

    let state_dir = config::state_dir();
    let target = if args.log_stderr {
        logging::LogTarget::Stderr
    } else {
        logging::LogTarget::File(&state_dir)
    };
    if let Err(e) = logging::init(target) {
        eprintln!("  logging disabled: {e:#}");
    }

    let resolved = ResolvedConfig::resolve(
        &file,
        args.profile.as_deref(),
        args.endpoint.as_deref(),
        args.csrf_token.as_deref(),
    );

    let client = ApiClient::new(&resolved.endpoint, resolved.request_timeout)?;
    if let Some(token) = &resolved.csrf_token {
        client.seed_csrf_token(token);
    }

    // ── --history ─────────────────────────────────────────────────────────────
    if args.history {
        return print_history(&client, &resolved).await;
    }

    tracing::info!(endpoint = client.endpoint(), profile = %resolved.profile_name, "connecting");
    client.bootstrap().await;

    // ── Single-shot mode (plain stdout, no TUI) ───────────────────────────────
    if let Some(text) = args.text {
        return run_single_shot(&text, args.search, &client).await;
    }

    // ── Interactive TUI mode ──────────────────────────────────────────────────
    let backend: Arc<dyn Backend> = Arc::new(client);
    tui::run(resolved, backend).await
}

// ── Single-shot mode ──────────────────────────────────────────────────────────

/// Prints assistant rows as they would appear in the transcript, minus animation.
struct PlainPrinter;

impl RenderPort for PlainPrinter {
    fn transcript(&mut self, op: TranscriptOp) {
        match op {
            TranscriptOp::Append { content, sender: Sender::Assistant, .. } => {
                print_markup(&format::format_content(&content));
            }
            // The user row is the command line itself
            _ => {}
        }
    }

    fn history(&mut self, _op: HistoryOp) {}
}

async fn run_single_shot(text: &str, search: bool, backend: &dyn Backend) -> Result<()> {
    let mut controller = Controller::new();
    if search {
        controller.toggle_search();
    }
    let mut printer = PlainPrinter;
    let Some(request) = controller.send(text, &mut printer) else {
        anyhow::bail!("nothing to send");
    };

    println!();
    let reply = request.run(backend).await;
    let failed = reply.renders_error();
    // Follow-ups only refresh the sidebar, which one-shot mode has none of
    let _ = controller.handle_reply(reply, &mut printer);
    println!();
    if failed {
        std::process::exit(1);
    }
    Ok(())
}

fn print_markup(markup: &str) {
    for line in format::parse_markup(markup) {
        let mut out = String::from("  ");
        for seg in &line {
            out.push_str(&seg.text);
            if let Some(href) = &seg.href {
                out.push_str(&format!(" <{href}>"));
            }
        }
        println!("{}", out.trim_end());
    }
}

// ── History listing (non-TUI) ─────────────────────────────────────────────────

async fn print_history(backend: &dyn Backend, resolved: &ResolvedConfig) -> Result<()> {
    let groups = backend
        .get_history()
        .await
        .map_err(|e| anyhow::anyhow!("could not load history from {}: {e}", resolved.endpoint))?;
    let mut panel = HistoryPanel::new(resolved.fade);
    panel.rebuild(groups);

    println!();
    if panel.is_empty() {
        println!("  no articles yet");
        println!();
        return Ok(());
    }
    for section in panel.sections() {
        println!("  {}", section.bucket.title());
        for item in &section.entries {
            let when = item.entry.created_at.as_deref().unwrap_or("");
            println!("    {:>6}  {:<12}  {}", item.entry.id.0, when, item.entry.short_title);
        }
        println!();
    }
    Ok(())
}

// ── Profiles listing (non-TUI) ────────────────────────────────────────────────

fn print_profiles(file: &ConfigFile) {
    let mut entries: Vec<(&String, &config::Profile)> = file.profiles.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    println!();
    println!("  Profiles");
    for (name, profile) in &entries {
        let marker = if **name == file.default_profile { " ←" } else { "" };
        let timeout = match profile.request_timeout_secs {
            0 => "none".to_string(),
            s => format!("{s}s"),
        };
        println!("  {name}{marker}");
        println!("    endpoint  {}", profile.endpoint);
        println!("    timeout   {timeout}");
        println!();
    }
}

// ── Shell completions ─────────────────────────────────────────────────────────

fn generate_completions(shell_name: &str) -> Result<()> {
    use clap_complete::{Shell, generate};

    let shell: Shell = match shell_name.to_lowercase().as_str() {
        "bash"    => Shell::Bash,
        "zsh"     => Shell::Zsh,
        "fish"    => Shell::Fish,
        "elvish"  => Shell::Elvish,
        _ => {
            anyhow::bail!("Unknown shell: {shell_name} (supported: bash, zsh, fish, elvish)");
        }
    };

    let mut cmd = Args::command();
    generate(shell, &mut cmd, "quicknews", &mut std::io::stdout());
    Ok(())
}
