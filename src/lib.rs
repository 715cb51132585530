pub mod cli;
pub mod combinator;
pub mod core;
pub mod ml;

use std::fs::File;
use std::io::{self, Read, Write};

use clap::error::ErrorKind;
use thiserror::Error;

use cli::{Cli, Command, InputSource};

#[cfg(test)]
const MAX_INPUT_BYTES: usize = 1024;
#[cfg(not(test))]
const MAX_INPUT_BYTES: usize = 8 * 1024 * 1024;

pub fn run<I, S>(
    args: I,
    stdin: &mut dyn Read,
    stdout: &mut dyn Write,
    _stderr: &mut dyn Write,
) -> Result<(), RunError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let cli = match Cli::from_args(args) {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                return write_output(stdout, err.render());
            }
            _ => return Err(RunError::Cli(err)),
        },
    };
    execute(cli, stdin, stdout)
}

fn execute(cli: Cli, stdin: &mut dyn Read, stdout: &mut dyn Write) -> Result<(), RunError> {
    match cli.command {
        Command::Prove(input) => {
            let source = read_source(&input.source(), stdin)?;
            log::debug!("proving {} bytes from {}", source.len(), input.source());
            let derivation = ml::prove(&source)?;
            write_output(stdout, derivation)
        }
        Command::Eval { input, mode } => {
            let source = read_source(&input.source(), stdin)?;
            log::debug!("evaluating in {mode} mode from {}", input.source());
            let value = ml::eval(&source, mode)?;
            write_output(stdout, value)
        }
    }
}

fn write_output(stdout: &mut dyn Write, text: impl std::fmt::Display) -> Result<(), RunError> {
    writeln!(stdout, "{text}").map_err(|source| RunError::Io {
        source,
        context: "stdout".to_string(),
    })
}

fn read_source(input: &InputSource, stdin: &mut dyn Read) -> Result<String, RunError> {
    match input {
        InputSource::Stdin => read_limited_utf8(stdin, "stdin"),
        InputSource::File(path) => {
            let context = path.display().to_string();
            let mut file = File::open(path).map_err(|source| RunError::Io {
                source,
                context: context.clone(),
            })?;
            read_limited_utf8(&mut file, &context)
        }
        InputSource::Inline(text) => {
            if text.len() > MAX_INPUT_BYTES {
                return Err(RunError::InputTooLarge {
                    context: input.to_string(),
                    max_bytes: MAX_INPUT_BYTES,
                });
            }
            Ok(text.clone())
        }
    }
}

fn read_limited_utf8(reader: &mut dyn Read, context: &str) -> Result<String, RunError> {
    let mut bytes = Vec::new();
    let mut limited_reader = reader.take((MAX_INPUT_BYTES + 1) as u64);
    limited_reader
        .read_to_end(&mut bytes)
        .map_err(|source| RunError::Io {
            source,
            context: context.to_string(),
        })?;
    if bytes.len() > MAX_INPUT_BYTES {
        return Err(RunError::InputTooLarge {
            context: context.to_string(),
            max_bytes: MAX_INPUT_BYTES,
        });
    }

    String::from_utf8(bytes).map_err(|_| RunError::InvalidUtf8 {
        context: context.to_string(),
    })
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("{0}")]
    Cli(#[source] clap::Error),
    #[error("I/O error ({context}): {source}")]
    Io { source: io::Error, context: String },
    #[error("input too large ({context}): limit is {max_bytes} bytes")]
    InputTooLarge { context: String, max_bytes: usize },
    #[error("input is not valid UTF-8 ({context})")]
    InvalidUtf8 { context: String },
    #[error(transparent)]
    Check(#[from] core::CheckError),
}

impl RunError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Cli(_) => 2,
            Self::Io { .. } => 1,
            Self::InputTooLarge { .. } => 1,
            Self::InvalidUtf8 { .. } => 1,
            Self::Check(_) => 1,
        }
    }
}
