use anyhow::Result;
use tracing::error;
use worklog::cli::run_cli;

fn main() -> Result<()> {
    run_cli().inspect_err(|e| {
        error!("Error running cli {e:?}");
    })?;
    Ok(())
}
