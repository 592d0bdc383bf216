use crate::cli::Cli;
use crate::config::EngineConfig;
use crate::content::FsContentSource;
use crate::engine::{Engine, RunOptions};
use crate::mode::TxnMode;
use crate::notify::TracingNotify;
use anyhow::Result;
use tokio_util::sync::CancellationToken;

pub async fn run(cli: &Cli, n: usize) -> Result<()> {
    let url = cli.url.as_deref().ok_or(crate::error::EngineError::MissingUrl)?;
    let engine = Engine::connect(cli.driver.as_deref(), url, &cli.migrations_dir).await?;
    let content = FsContentSource::new(&cli.migrations_dir);
    let notify = TracingNotify;
    let config = EngineConfig::load_or_default(&cli.config)?;
    let mode = match cli.mode.as_deref() {
        Some(m) => TxnMode::parse(m)?,
        None => config.mode(),
    };

    let cancel = CancellationToken::new();
    let deadline_guard = cancel.clone();
    let deadline_task = tokio::spawn(async move {
        tokio::time::sleep(config.deadline()).await;
        deadline_guard.cancel();
    });

    let opts = RunOptions {
        mode,
        no_lock: cli.no_lock,
        schema: cli.schema.as_deref(),
        lock_poll_interval: config.lock_poll_interval(),
        cancel,
        notify: &notify,
    };

    let result = engine.down(&content, n, &opts).await;
    deadline_task.abort();
    result?;
    tracing::info!("rolled back {n} migration(s)");
    Ok(())
}
