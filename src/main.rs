use {
    crate::{cli::Cli, logger::Logger},
    clap::Parser,
    error_reporter::Report,
    std::{
        io::{self, Write},
        path::{Path, PathBuf},
    },
    thiserror::Error,
    wl_protocol_html::{
        html::write_html,
        parser::{ParserError, parse},
    },
};

mod cli;
mod logger;

#[derive(Debug, Error)]
enum MainError {
    #[error("Could not read {}", .0.display())]
    ReadFile(PathBuf, #[source] io::Error),
    #[error("{}:{}", .path.display(), .line)]
    ParseFile {
        path: PathBuf,
        line: usize,
        #[source]
        source: ParserError,
    },
    #[error("Could not write the document to stdout")]
    WriteOutput(#[source] io::Error),
}

fn main() {
    let cli = Cli::parse();
    let _logger = Logger::install_stderr(cli.global.log_level.into());
    if let Err(e) = main_(&cli.protocol) {
        log::error!("{}", Report::new(e));
        std::process::exit(1);
    }
}

fn main_(path: &Path) -> Result<(), MainError> {
    let data = std::fs::read(path).map_err(|e| MainError::ReadFile(path.to_owned(), e))?;
    let protocol = parse(&data).map_err(|e| MainError::ParseFile {
        path: path.to_owned(),
        line: e.line,
        source: e.error,
    })?;
    log::debug!(
        "Parsed protocol {} with {} interfaces",
        protocol.name,
        protocol.interfaces.len(),
    );
    let mut buf = vec![];
    write_html(&mut buf, &protocol).map_err(MainError::WriteOutput)?;
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(&buf)
        .and_then(|_| stdout.flush())
        .map_err(MainError::WriteOutput)?;
    Ok(())
}
