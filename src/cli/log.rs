//! Logger setup for the command line.
//!
//! `-v` raises the global level one step at a time (warn, info, debug,
//! trace). `--log COMPONENT=LEVEL` sets the level of one module: `cli`, or
//! any engine module such as `parser`, `path` or `merge`.

use colored::*;
use log::{Level, LevelFilter};
use time::macros::format_description;
use time::OffsetDateTime;

fn global_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Module target a component name refers to.
fn target(component: &str) -> String {
    if component == "yedit" || component.starts_with("yedit::") {
        component.to_string()
    } else if component == "cli" || component.starts_with("cli::") {
        format!("yedit::{}", component)
    } else {
        format!("yedit::yaml::{}", component)
    }
}

/// Parse one `COMPONENT=LEVEL` specification.
fn parse_spec(spec: &str) -> Result<(String, LevelFilter), String> {
    let (component, level) = spec.split_once('=').ok_or_else(|| {
        format!(
            "Invalid log specification '{}': expected format COMPONENT=LEVEL",
            spec
        )
    })?;
    let level = level
        .trim()
        .parse::<LevelFilter>()
        .map_err(|_| format!("Invalid log level '{}' in '{}'", level.trim(), spec))?;
    Ok((target(component.trim()), level))
}

fn colored_level(level: Level) -> ColoredString {
    match level {
        Level::Error => "ERROR".bright_red(),
        Level::Warn => "WARN ".yellow(),
        Level::Info => "INFO ".green(),
        Level::Debug => "DEBUG".blue(),
        Level::Trace => "TRACE".dimmed(),
    }
}

fn timestamp() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    now.format(format_description!(
        "[hour]:[minute]:[second].[subsecond digits:3]"
    ))
    .unwrap_or_default()
}

/// Install the global logger, writing to stderr.
pub fn setup(verbose: u8, specs: Vec<&str>, log_time: bool) -> Result<(), String> {
    let mut dispatch = fern::Dispatch::new()
        .format(move |out, message, record| {
            let time = if log_time {
                format!("{} ", timestamp())
            } else {
                String::new()
            };
            out.finish(format_args!(
                "{}{} [{}] {}",
                time,
                colored_level(record.level()),
                record.target(),
                message
            ))
        })
        .level(global_level(verbose));

    for spec in specs {
        let (target, level) = parse_spec(spec)?;
        dispatch = dispatch.level_for(target, level);
    }

    dispatch
        .chain(std::io::stderr())
        .apply()
        .map_err(|e| format!("Failed to set up logging: {}", e))
}
