mod html;
mod session;
mod terminal;

use anyhow::{Context as _, anyhow};
use clap::Parser;
use explainer_core::{
    AnalysisClient, ExplainerConfig, FileInput, Orchestrator, TextExtractor, ViewMode,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use terminal::TerminalView;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "report-explainer",
    version,
    about = "Explain a medical report in patient and clinician language"
)]
struct Cli {
    /// Report text to analyze. Used instead of --file when both are given.
    #[arg(long)]
    text: Option<String>,

    /// PDF or plain-text report file.
    #[arg(long)]
    file: Option<PathBuf>,

    /// Declared type of --file, overriding detection (e.g. application/pdf, text/plain).
    #[arg(long, requires = "file")]
    mime: Option<String>,

    /// Which explanation to show.
    #[arg(long, default_value = "patient")]
    mode: ViewMode,

    /// Also write the results to a standalone HTML page.
    #[arg(long)]
    html_out: Option<PathBuf>,

    /// Start an interactive session. Implied when neither --text nor --file is given.
    #[arg(short, long)]
    interactive: bool,

    /// Base URL of the analysis service.
    #[arg(long)]
    backend_url: Option<String>,

    /// Request timeout in seconds, 0 to wait indefinitely.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// YAML file with backend_url / timeout_secs.
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Initialize tracing on stderr; stdout is the user's screen.
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "report_explainer=warn,explainer_core=warn".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// CLI flags win over the YAML file, which wins over the environment.
async fn load_config(cli: &Cli) -> anyhow::Result<ExplainerConfig> {
    let mut config = ExplainerConfig::from_env()?;
    if let Some(path) = &cli.config {
        config = config.merge_yaml_file(path).await?;
    }
    if let Some(url) = &cli.backend_url {
        config.backend_url = url.clone();
    }
    if let Some(secs) = cli.timeout_secs {
        config.timeout_secs = secs;
    }
    Ok(config)
}

pub(crate) async fn export_html(
    orchestrator: &Orchestrator<TerminalView>,
    path: &Path,
) -> anyhow::Result<()> {
    let page = orchestrator.with_view(|view| {
        let mode = view.mode();
        view.surface()
            .rendered()
            .map(|rendered| html::results_page(rendered, mode, chrono::Utc::now()))
    });
    let page = page.ok_or_else(|| anyhow!("no results to export"))?;

    tokio::fs::write(path, page)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!("Results written to {}", path.display());
    Ok(())
}

async fn run_once(cli: &Cli, orchestrator: &Orchestrator<TerminalView>) -> anyhow::Result<ExitCode> {
    if let Some(text) = &cli.text {
        orchestrator.set_text(text.clone());
    }
    if let Some(path) = &cli.file {
        let mut file = FileInput::from_path(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        if let Some(mime) = &cli.mime {
            file.mime_type = mime.clone();
        }
        orchestrator.select_file(file);
    }

    // Failures were already shown to the user by the view.
    if orchestrator.analyze().await.is_err() {
        return Ok(ExitCode::FAILURE);
    }

    orchestrator.set_mode(cli.mode);
    let mut stdout = std::io::stdout().lock();
    orchestrator.with_view(|view| view.surface().draw(&mut stdout))?;
    drop(stdout);

    if let Some(path) = &cli.html_out {
        export_html(orchestrator, path).await?;
        println!("Saved {}", path.display());
    }
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();

    let config = load_config(&cli).await?;
    let client = AnalysisClient::new(&config)?;
    info!("Using analysis service at {}", client.endpoint());

    let orchestrator = Orchestrator::new(TextExtractor::default(), Arc::new(client), TerminalView::new());

    if cli.interactive || (cli.text.is_none() && cli.file.is_none()) {
        session::run(&orchestrator).await?;
        return Ok(ExitCode::SUCCESS);
    }
    run_once(&cli, &orchestrator).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_one_shot_flags() {
        let cli = Cli::try_parse_from([
            "report-explainer",
            "--file",
            "cbc.pdf",
            "--mode",
            "clinician",
            "--timeout-secs",
            "30",
        ])
        .unwrap();
        assert_eq!(cli.file, Some(PathBuf::from("cbc.pdf")));
        assert_eq!(cli.mode, ViewMode::Clinician);
        assert_eq!(cli.timeout_secs, Some(30));
        assert!(!cli.interactive);
    }

    #[test]
    fn mime_needs_a_file() {
        assert!(Cli::try_parse_from(["report-explainer", "--mime", "text/plain"]).is_err());
        assert!(Cli::try_parse_from(["report-explainer", "--mode", "doctor"]).is_err());
    }

    #[tokio::test]
    async fn flags_override_environment_defaults() {
        let cli = Cli::try_parse_from([
            "report-explainer",
            "--backend-url",
            "http://analysis.internal:9000",
            "--timeout-secs",
            "0",
        ])
        .unwrap();
        let config = load_config(&cli).await.unwrap();
        assert_eq!(config.backend_url, "http://analysis.internal:9000");
        assert_eq!(config.timeout(), None);
    }
}
