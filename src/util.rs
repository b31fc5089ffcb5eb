use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;

/// Filter applied to this crate's own log records.
#[must_use]
pub fn crate_log_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Trace
    } else {
        LevelFilter::Info
    }
}

/// Installs a colored stderr logger. Dependencies only report warnings and errors.
pub fn setup_logger(verbose: bool) -> Result<(), fern::InitError> {
    let levels = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Cyan)
        .debug(Color::White)
        .trace(Color::BrightBlack);

    fern::Dispatch::new()
        .level(LevelFilter::Warn)
        .level_for(env!("CARGO_PKG_NAME"), crate_log_level(verbose))
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{} {:<5} {}: {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                levels.color(record.level()),
                record.target(),
                message
            ));
        })
        .chain(std::io::stderr())
        .apply()?;

    Ok(())
}
