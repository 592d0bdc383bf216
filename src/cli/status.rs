use crate::cli::Cli;
use crate::engine::Engine;
use anyhow::Result;

pub async fn run(cli: &Cli) -> Result<()> {
    let url = cli.url.as_deref().ok_or(crate::error::EngineError::MissingUrl)?;
    let engine = Engine::connect(cli.driver.as_deref(), url, &cli.migrations_dir).await?;
    let versions = engine.load_versions(cli.schema.as_deref()).await?;

    println!("\n  Migration Status\n");
    println!("  {:<14} {}", "Version", "Applied");
    println!("  {}", "-".repeat(40));

    for file in engine.catalogue().ascending_up() {
        let applied = if versions.contains(&file.version) {
            "applied"
        } else {
            "pending"
        };
        println!("  {:<14} {}", file.version, applied);
    }

    let pending = crate::runner::pending_up(engine.catalogue(), &versions).len();
    println!();
    if pending > 0 {
        println!("  {pending} pending. Run `dbmigrate up` to apply.");
    } else {
        println!("  All migrations applied.");
    }
    println!();

    Ok(())
}
