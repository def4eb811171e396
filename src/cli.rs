use {
    clap::{Parser, ValueEnum},
    log::Level,
    std::path::PathBuf,
};

/// Renders a wayland protocol description as an HTML document on stdout.
#[derive(Parser, Debug)]
#[clap(version)]
pub struct Cli {
    #[clap(flatten)]
    pub global: GlobalArgs,
    /// The protocol XML file.
    pub protocol: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct GlobalArgs {
    /// The log level.
    #[clap(value_enum, long, default_value_t)]
    pub log_level: CliLogLevel,
}

#[derive(ValueEnum, Debug, Copy, Clone, Hash, Eq, PartialEq, Default)]
pub enum CliLogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<CliLogLevel> for Level {
    fn from(level: CliLogLevel) -> Self {
        match level {
            CliLogLevel::Trace => Level::Trace,
            CliLogLevel::Debug => Level::Debug,
            CliLogLevel::Info => Level::Info,
            CliLogLevel::Warn => Level::Warn,
            CliLogLevel::Error => Level::Error,
        }
    }
}
