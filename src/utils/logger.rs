use chrono::Local;
use eyre::Result;
use fern::Dispatch;
use log::LevelFilter;

/// Chatty dependencies kept at `Warn` unless `RUST_LOG` asks for `Trace`.
const NOISY_TARGETS: [&str; 3] = ["hyper", "reqwest", "alloy_transport_http"];

/// Sets up the application logger with console output.
///
/// The level comes from `RUST_LOG` (a single level name such as `debug`), and
/// falls back to `Info` when unset or unparsable.
///
/// # Errors
/// * If a global logger has already been installed
pub fn setup_logger() -> Result<()> {
    let level = level_from_env(std::env::var("RUST_LOG").ok().as_deref());

    let mut dispatch = Dispatch::new().level(level);
    if level < LevelFilter::Trace {
        for target in NOISY_TARGETS {
            dispatch = dispatch.level_for(target, LevelFilter::Warn);
        }
    }

    dispatch
        .chain(std::io::stdout())
        // Format log messages with time, level and module
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}: {}",
                Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ));
        })
        .apply()?;
    Ok(())
}

/// Parses a `RUST_LOG` value into a level filter
fn level_from_env(value: Option<&str>) -> LevelFilter {
    value
        .and_then(|level| level.trim().parse().ok())
        .unwrap_or(LevelFilter::Info)
}
