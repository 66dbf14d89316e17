use anyhow::{Context, Result};
use box_token_agent::cache::token_context::CredentialContext;
use box_token_agent::observability::metrics::get_metrics;
use box_token_agent::sources::SubjectKind;
use box_token_agent::utils::config_loader;
use box_token_agent::utils::logging;
use box_token_agent::utils::logging::LogLevel;
use clap::Parser;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = "box-token-agent.yaml")]
    config: String,
    #[arg(long, env = "LOG_LEVEL" , value_enum)]
    log_level: Option<LogLevel>,
    /// Subject type to issue for; defaults to settings.default_subject
    #[arg(short, long, value_enum)]
    subject: Option<SubjectKind>,
    /// Dump metrics to stderr after the token is printed
    #[arg(long)]
    metrics: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Load YAML config
    // -------------------------------

    let args = Args::parse();
    let service_config = config_loader::run(&args.config).await?;
    logging::run(&service_config.settings, args.log_level.to_owned());

    // -------------------------------
    // 2. Prepare credential context
    // -------------------------------

    let mut context = CredentialContext::from_config(service_config)?;
    if let Some(subject) = args.subject {
        context.set_subject_type(subject);
    }

    // -------------------------------
    // 3. Obtain token (cache first, exchange on miss)
    // -------------------------------

    let subject = context.active_subject_type();
    let token = context
        .ensure_token()
        .await
        .with_context(|| format!("cannot obtain {} access token", subject))?;
    info!(subject = %subject, "access token ready");
    println!("{}", token);

    if args.metrics {
        eprintln!("{}", get_metrics().await.render());
    }

    Ok(())
}
