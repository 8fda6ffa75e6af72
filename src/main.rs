use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use webspace_config::{
    Cli, ConfigManager, ErrorReporter, Output, ProgressCallback, ScanProgress, WebspaceError,
    WebspaceScanner, logging,
};

const EXIT_FAILURES: u8 = 1;
const EXIT_USAGE: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(EXIT_USAGE)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = match ConfigManager::load_config(&cli).await {
        Ok(config) => config,
        Err(e) => {
            ErrorReporter::new(cli.verbosity()).report_config_error(&e);
            return Ok(ExitCode::from(EXIT_USAGE));
        }
    };

    let verbosity = config.output.verbosity();
    logging::init_cli_logger(verbosity);
    tracing::debug!(?config, "effective configuration");

    let reporter = Arc::new(ErrorReporter::new(verbosity));

    let discovery = match config.build_discovery() {
        Ok(discovery) => discovery,
        Err(e) => {
            reporter.report_error(&e);
            return Ok(ExitCode::from(EXIT_USAGE));
        }
    };

    let progress: Option<ProgressCallback> = config.output.progress.then(|| {
        let reporter = Arc::clone(&reporter);
        Arc::new(move |progress: ScanProgress| reporter.report_progress(&progress))
            as ProgressCallback
    });

    let scanner = WebspaceScanner::new(config.build_loader(), config.scan_config());
    let results = match scanner
        .scan_path_with_progress(&cli.path, &discovery, progress)
        .await
    {
        Ok(results) => results,
        Err(e) => {
            reporter.report_error(&e);
            let code = match e {
                WebspaceError::Config(_) => EXIT_USAGE,
                _ => EXIT_FAILURES,
            };
            return Ok(ExitCode::from(code));
        }
    };

    let rendered = Output::new(config.output.format, verbosity)
        .render(&results)
        .context("failed to render scan results")?;
    print!("{}", rendered);

    if results.has_errors() {
        Ok(ExitCode::from(EXIT_FAILURES))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
