//! These structs provide the CLI interface for the caixa CLI.

use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// caixa: records cashier payments into a Google sheet, one worksheet per day.
///
/// Each batch holds up to eight entries. Every entry becomes one row on the worksheet named after
/// the current date, e.g. 19-10-2026. That worksheet is created from the template worksheet the
/// first time it is needed.
///
/// The program authenticates with a Google service account. Share the spreadsheet with the
/// service account's e-mail address before using it.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the home directory and initialize the configuration file.
    ///
    /// This is the first command you should run. By default the home directory is $HOME/caixa,
    /// pass --caixa-home if you want it somewhere else.
    Init(InitArgs),
    /// Show the number of vehicles and boletos recorded today.
    Totals,
    /// Submit one batch of up to eight entries from a CSV file.
    Submit(SubmitArgs),
    /// Serve the entry form over HTTP.
    Serve(ServeArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where the configuration and secrets are held. Defaults to ~/caixa
    #[arg(long, env = "CAIXA_HOME", default_value_t = default_caixa_home())]
    caixa_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, caixa_home: PathBuf) -> Self {
        Self {
            log_level,
            caixa_home: caixa_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn caixa_home(&self) -> &DisplayPath {
        &self.caixa_home
    }
}

/// Args for the `caixa init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The URL of the Google sheet, which looks like this:
    /// https://docs.google.com/spreadsheets/d/1a7Km9FxQwRbPt82JvN4LzYpH5OcGnWsT6iDuE3VhMjX
    /// or the name of the spreadsheet document, e.g. sistema_pagamentos
    #[arg(long)]
    spreadsheet: String,

    /// The path to the downloaded service-account key. This file will be copied to the default
    /// secrets location in the home directory. Omit it if the key is provided through
    /// CAIXA_SERVICE_ACCOUNT.
    #[arg(long)]
    credentials: Option<PathBuf>,
}

impl InitArgs {
    pub fn new(spreadsheet: impl Into<String>, credentials: Option<PathBuf>) -> Self {
        Self {
            spreadsheet: spreadsheet.into(),
            credentials,
        }
    }

    pub fn spreadsheet(&self) -> &str {
        &self.spreadsheet
    }

    pub fn credentials(&self) -> Option<&Path> {
        self.credentials.as_deref()
    }
}

/// Args for the `caixa submit` command.
#[derive(Debug, Parser, Clone)]
pub struct SubmitArgs {
    /// A CSV file with the header plate,quantity,value,fee,addition,exited,method and at most
    /// eight entries.
    entries: PathBuf,
}

impl SubmitArgs {
    pub fn new(entries: impl Into<PathBuf>) -> Self {
        Self {
            entries: entries.into(),
        }
    }

    pub fn entries(&self) -> &Path {
        &self.entries
    }
}

/// Args for the `caixa serve` command.
#[derive(Debug, Parser, Clone)]
pub struct ServeArgs {
    /// The address to listen on.
    #[arg(long, default_value = "127.0.0.1:8080")]
    addr: SocketAddr,
}

impl ServeArgs {
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

fn default_caixa_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("caixa"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --caixa-home or CAIXA_HOME instead of relying on the default \
                caixa home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("caixa")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_are_valid() {
        <Args as CommandFactory>::command().debug_assert();
    }

    #[test]
    fn test_parse_serve() {
        let args = Args::try_parse_from([
            "caixa",
            "--caixa-home",
            "/tmp/caixa",
            "--log-level",
            "debug",
            "serve",
        ])
        .unwrap();
        assert_eq!(args.common().caixa_home().path(), Path::new("/tmp/caixa"));
        assert_eq!(args.common().log_level(), LevelFilter::DEBUG);
        match args.command() {
            Command::Serve(serve) => assert_eq!(serve.addr().to_string(), "127.0.0.1:8080"),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_init_without_credentials() {
        let args = Args::try_parse_from(["caixa", "init", "--spreadsheet", "sistema_pagamentos"])
            .unwrap();
        match args.command() {
            Command::Init(init) => {
                assert_eq!(init.spreadsheet(), "sistema_pagamentos");
                assert!(init.credentials().is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_submit_requires_file() {
        assert!(Args::try_parse_from(["caixa", "submit"]).is_err());
        let args = Args::try_parse_from(["caixa", "submit", "lote.csv"]).unwrap();
        match args.command() {
            Command::Submit(submit) => assert_eq!(submit.entries(), Path::new("lote.csv")),
            other => panic!("unexpected command {other:?}"),
        }
    }
}
