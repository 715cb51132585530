use std::fmt;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::core::EvalMode;

#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(
    name = "evalto",
    version,
    about = "Derivation prover and evaluator for ML with error values"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn from_args<I, S>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::try_parse_from(args.into_iter().map(Into::into))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    #[command(about = "Print the derivation of a judgment")]
    Prove(InputArgs),
    #[command(about = "Print the value of an expression")]
    Eval {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, value_enum, default_value_t = EvalMode::Strict)]
        mode: EvalMode,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct InputArgs {
    #[arg(
        short,
        long = "expr",
        value_name = "TEXT",
        conflicts_with = "file",
        help = "Source text given inline"
    )]
    pub expr: Option<String>,
    #[arg(help = "File to read, stdin when absent")]
    pub file: Option<PathBuf>,
}

impl InputArgs {
    pub fn source(&self) -> InputSource {
        match (&self.expr, &self.file) {
            (Some(text), _) => InputSource::Inline(text.clone()),
            (None, Some(path)) => InputSource::File(path.clone()),
            (None, None) => InputSource::Stdin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Stdin,
    File(PathBuf),
    Inline(String),
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdin => write!(f, "stdin"),
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Inline(_) => write!(f, "--expr"),
        }
    }
}
