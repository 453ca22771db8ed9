use clap::{Arg, ArgAction, Command, builder::ValueParser};

pub const ARG_VERBOSITY: &str = "verbosity";
pub const ENV_LOG_LEVEL: &str = "DIARIO_LOG_LEVEL";

/// Level names in verbosity order; `-v` count and position agree.
const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Accepts a level name from `DIARIO_LOG_LEVEL` (or its position, `0..=4`)
/// and yields the equivalent `-v` count.
#[must_use]
pub fn validator_log_level() -> ValueParser {
    ValueParser::from(|level: &str| -> Result<u8, String> {
        let level = level.trim().to_ascii_lowercase();
        (0u8..)
            .zip(LEVELS)
            .find(|(index, name)| *name == level || index.to_string() == level)
            .map(|(index, _)| index)
            .ok_or_else(|| format!("invalid log level {level:?}, expected one of {LEVELS:?}"))
    })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Raise log verbosity; repeat up to -vvvv (errors only by default)")
            .long_help(
                "Raise log verbosity: -v warn, -vv info, -vvv debug, -vvvv trace. \
                 DIARIO_LOG_LEVEL takes a level name instead. RUST_LOG directives \
                 still apply on top.",
            )
            .env(ENV_LOG_LEVEL)
            .global(true)
            .action(ArgAction::Count)
            .value_parser(validator_log_level()),
    )
}
