use log::LevelFilter;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::append::rolling_file::policy::compound::{
    CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
};
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::error::Error;
use std::path::{Path, PathBuf};

use super::devlog::DEV6_TARGET;

const ENC_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l}] {t} - {m}{n}";
const ROLL_SIZE: u64 = 10 * 1024 * 1024;
const DEFAULT_RETENTION: u32 = 7;

/// Initializes the logging system from a log4rs YAML config file.
///
/// # Errors
/// Returns an error if the file cannot be read or a logger is already set.
pub fn init_path(path: &Path) -> Result<(), Box<dyn Error>> {
    log4rs::init_file(path, log4rs::config::Deserializers::default())?;
    Ok(())
}

/// Parse `error|warn|info|debug|trace`; anything else is `Info`.
#[must_use]
pub fn parse_level(level: Option<&str>) -> LevelFilter {
    match level.unwrap_or("info").to_ascii_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

fn rolling(base: &Path, stem: &str, keep: u32) -> Result<RollingFileAppender, Box<dyn Error>> {
    let roller = FixedWindowRoller::builder()
        .build(&format!("{}", base.join(format!("{stem}.{{}}.log")).display()), keep)?;
    let policy = CompoundPolicy::new(Box::new(SizeTrigger::new(ROLL_SIZE)), Box::new(roller));
    Ok(RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(ENC_PATTERN)))
        .build(base.join(format!("{stem}.log")), Box::new(policy))?)
}

/// Configure process-wide logging to `{dir}/app.log`.
/// - dir: base directory for logs; if None, current directory.
/// - level: error|warn|info|debug|trace
/// - retention: number of rolled files to keep (default 7)
///
/// # Errors
/// Returns an error if the directory or appenders cannot be created, or if a
/// global logger was already installed.
pub fn configure_logging(
    dir: Option<&Path>,
    level: Option<&str>,
    retention: Option<usize>,
) -> Result<(), Box<dyn Error>> {
    configure_logging_with_dev(dir, level, retention, false)
}

/// Like [`configure_logging`], and when `enable_dev6` is set also persists
/// `dev6!` lines (target `odmlite::dev6`) to a rolling `dev6.log`.
///
/// # Errors
/// See [`configure_logging`].
pub fn configure_logging_with_dev(
    dir: Option<&Path>,
    level: Option<&str>,
    retention: Option<usize>,
    enable_dev6: bool,
) -> Result<(), Box<dyn Error>> {
    let base = match dir {
        Some(d) => PathBuf::from(d),
        None => std::env::current_dir()?,
    };
    std::fs::create_dir_all(&base)?;
    let keep = retention.map_or(DEFAULT_RETENTION, |n| u32::try_from(n).unwrap_or(u32::MAX));
    let lvl = parse_level(level);

    let mut builder =
        Config::builder().appender(Appender::builder().build("app", Box::new(rolling(&base, "app", keep)?)));
    if enable_dev6 {
        builder = builder
            .appender(Appender::builder().build("dev6", Box::new(rolling(&base, "dev6", keep)?)))
            .logger(Logger::builder().appender("dev6").additive(false).build(DEV6_TARGET, LevelFilter::Trace));
    } else {
        builder = builder.logger(Logger::builder().additive(false).build(DEV6_TARGET, LevelFilter::Off));
    }
    let config = builder.build(Root::builder().appender("app").build(lvl))?;
    log4rs::init_config(config)?;
    log::info!("logging configured at {} (level {lvl}, dev6 {enable_dev6})", base.display());
    Ok(())
}

/// Configure logging from environment variables if present:
/// - `ODMLITE_LOG_DIR`
/// - `ODMLITE_LOG_LEVEL`
/// - `ODMLITE_LOG_RETENTION`
/// - `ODMLITE_DEV6` (`1`, `true` or `yes`)
///
/// # Errors
/// See [`configure_logging`].
pub fn configure_from_env() -> Result<(), Box<dyn Error>> {
    let dir = std::env::var("ODMLITE_LOG_DIR").ok().map(PathBuf::from);
    let level = std::env::var("ODMLITE_LOG_LEVEL").ok();
    let retention = std::env::var("ODMLITE_LOG_RETENTION").ok().and_then(|s| s.parse::<usize>().ok());
    let dev6_enabled = std::env::var("ODMLITE_DEV6")
        .is_ok_and(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes"));
    configure_logging_with_dev(dir.as_deref(), level.as_deref(), retention, dev6_enabled)
}
