use std::{net::IpAddr, path::PathBuf, time::Duration};

use clap::{ArgAction, Parser};
use log::LevelFilter;

use crate::archive::Pacing;

#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Options {
    /// Enable debug logs.
    #[arg(short = 'l', long)]
    pub logs: bool,
    /// Increase logs verbosity (Error (default), Warn, Info, Debug, Trace).
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbosity: u8,
    /// Delay after each archive chunk sent (seconds, or a duration like 250ms).
    #[arg(short = 'd', long, default_value = "0", value_parser(parse_delay))]
    pub delay: Duration,
    /// Source directory containing the archivable directories.
    #[arg(short = 'r', long = "path", default_value = "test_photos")]
    pub root: PathBuf,
    /// Index page served on /.
    #[arg(short = 'i', long, default_value = "index.html")]
    pub index: PathBuf,
    /// Zip program used to build archives.
    #[arg(short = 'z', long, default_value = "zip")]
    pub zip_program: PathBuf,
    /// Abort downloads when the archiver produces nothing for this long (e.g. 30s).
    #[arg(short = 't', long, value_parser(parse_duration))]
    pub stall_timeout: Option<Duration>,
    /// HTTP listening address.
    #[arg(short = 'a', long, default_value = "0.0.0.0")]
    pub address: IpAddr,
    /// HTTP listening port.
    #[arg(short = 'p', long, default_value = "8080")]
    pub port: u16,
}

impl Options {
    pub fn log_level(&self) -> LevelFilter {
        if self.logs {
            return LevelFilter::Debug.max(self.verbosity_level());
        }
        self.verbosity_level()
    }

    fn verbosity_level(&self) -> LevelFilter {
        use LevelFilter::*;
        match self.verbosity {
            0 => Error,
            1 => Warn,
            2 => Info,
            3 => Debug,
            _ => Trace,
        }
    }

    pub fn pacing(&self) -> Pacing {
        Pacing {
            delay: self.delay,
            stall_timeout: self.stall_timeout,
        }
    }
}

fn parse_delay(s: &str) -> Result<Duration, String> {
    match s.parse::<u64>() {
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(_) => parse_duration(s),
    }
}

fn parse_duration(s: &str) -> Result<Duration, String> {
    s.parse::<humantime::Duration>()
        .map(Into::into)
        .map_err(|err| err.to_string())
}
