//! Shared setup for the key-value store binaries.

/// Installs a stderr logger. Each `-v` raises the level by one step,
/// starting from warnings.
pub fn init_logger(verbose: u8) -> Result<(), log::SetLoggerError> {
    let level = match verbose {
    | 0 => log::LevelFilter::Warn,
    | 1 => log::LevelFilter::Info,
    | 2 => log::LevelFilter::Debug,
    | _ => log::LevelFilter::Trace,
    };
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}][{}] {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message,
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()
}

pub fn parse_millis(s: &str) -> Result<std::time::Duration, std::num::ParseIntError> {
    s.parse().map(std::time::Duration::from_millis)
}
