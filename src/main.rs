//! Stiletto CLI - run task manifests as container jobs

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde_json::json;

use stiletto::cli::{run_dagger, validate_manifests, Args, DaggerSettings, JobCommand, ManifestCommand, SubCommand};
use stiletto::container::{ContainerEngine, DockerEngine, RecordingEngine};
use stiletto::context::{CancelToken, Client};
use stiletto::logging::LogSettings;
use stiletto::output::{format_report, ConsoleMessenger, OutputFormat, UxMessenger};

fn main() {
    let args = Args::parse();
    let ux: Arc<dyn UxMessenger> = Arc::new(ConsoleMessenger::default());

    if let Err(e) = run(args, Arc::clone(&ux)) {
        ux.show_error(&render_error(&e));
        std::process::exit(1);
    }
}

fn run(args: Args, ux: Arc<dyn UxMessenger>) -> anyhow::Result<()> {
    init_logging(&args)?;

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || handler_token.cancel()).context("failed to install the interrupt handler")?;

    let output_format = if args.json { OutputFormat::Json } else { OutputFormat::Human };

    match args.command {
        SubCommand::Job(JobCommand::Dagger(dagger)) => {
            let engine: Arc<dyn ContainerEngine> = if dagger.dry_run {
                Arc::new(RecordingEngine::new())
            } else {
                Arc::new(DockerEngine::new(dagger.docker_bin.clone()))
            };

            let client = Client::builder()
                .with_ux(ux)
                .with_engine(engine)
                .with_cancel_token(cancel)
                .build()
                .context("failed to create the client")?;

            let report = run_dagger(&client, &DaggerSettings::from(&dagger)).context("job dagger failed")?;
            println!("{}", format_report(&report, &output_format));
        }

        SubCommand::Manifest(ManifestCommand::Validate { files }) => {
            let client = Client::builder()
                .with_ux(ux)
                .with_cancel_token(cancel)
                .build()
                .context("failed to create the client")?;

            let valid = validate_manifests(&client, &files).context("manifest validation failed")?;
            if args.json {
                let data: Vec<_> = valid
                    .iter()
                    .map(|(file, manifest)| {
                        json!({
                            "file": file.display().to_string(),
                            "name": manifest.metadata.name,
                            "image": manifest.spec.container_image,
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&data)?);
            }
        }
    }

    Ok(())
}

fn init_logging(args: &Args) -> anyhow::Result<()> {
    LogSettings::from_cli(args.log_level.as_deref(), &args.log_format, args.verbose)?
        .install()
        .context("failed to initialize logging")
}

/// Outermost context followed by the library error, which renders its own causes.
fn render_error(e: &anyhow::Error) -> String {
    let mut chain = e.chain();
    match (chain.next(), chain.next()) {
        (Some(context), Some(cause)) => format!("{}: {}", context, cause),
        _ => e.to_string(),
    }
}
