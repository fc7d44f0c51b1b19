use anyhow::Result;
use tracing::Level;
use tracing_subscriber::fmt;

/// Warnings are always shown; each `-v` adds a level.
pub fn init(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let _ = fmt()
        .with_max_level(level)
        .with_target(verbosity > 2)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init();
    Ok(())
}
