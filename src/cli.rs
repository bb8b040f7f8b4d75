//! Minimal CLI parsing for the matcher binary.

use std::env;
use std::path::PathBuf;

use anyhow::{Result, bail};

pub const USAGE: &str = "\
usage: media-matcher [--strict] [--json] --episodes <file.json> <path>...
       media-matcher --series-name <path>...";

#[derive(Debug, Default, PartialEq, Eq)]
pub struct CliOptions {
    /// Overrides `MATCHER_STRICT` when given
    pub strict: Option<bool>,
    pub json: bool,
    pub episodes: Option<PathBuf>,
    pub series_name: bool,
    pub help: bool,
    pub paths: Vec<PathBuf>,
}

impl CliOptions {
    pub fn from_args() -> Result<Self> {
        Self::parse(env::args().skip(1))
    }

    pub fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut options = CliOptions::default();
        let mut args = args.into_iter().map(Into::<String>::into);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--strict" => options.strict = Some(true),
                "--lenient" => options.strict = Some(false),
                "--json" => options.json = true,
                "--series-name" => options.series_name = true,
                "-h" | "--help" => options.help = true,
                "--episodes" => match args.next() {
                    Some(value) => options.episodes = Some(PathBuf::from(value)),
                    None => bail!("--episodes needs a file argument"),
                },
                _ if arg.starts_with("--episodes=") => {
                    if let Some(value) = arg.split_once('=').map(|(_, v)| v) {
                        options.episodes = Some(PathBuf::from(value));
                    }
                }
                _ if arg.starts_with("--") => bail!("unknown option {arg}"),
                _ => options.paths.push(PathBuf::from(arg)),
            }
        }

        if !options.help {
            if options.paths.is_empty() {
                bail!("no paths given");
            }
            if options.episodes.is_none() && !options.series_name {
                bail!("--episodes or --series-name is required");
            }
        }
        Ok(options)
    }
}
