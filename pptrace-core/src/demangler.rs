use std::ffi::{OsStr, OsString};
use std::io;
use std::process::{Command, ExitStatus};
use std::string::FromUtf8Error;

use thiserror::Error;

pub const DEFAULT_DEMANGLER: &str = "c++filt";

#[derive(Debug, Error)]
pub enum DemangleError {
    #[error("failed to run demangler `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("demangler `{program}` exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("demangler `{program}` produced non UTF-8 output")]
    InvalidOutput {
        program: String,
        #[source]
        source: FromUtf8Error,
    },
}

/// Turns a single mangled symbol into its readable form.
pub trait Demangler {
    fn demangle(&self, symbol: &str) -> Result<String, DemangleError>;
}

impl<F> Demangler for F
where
    F: Fn(&str) -> Result<String, DemangleError>,
{
    fn demangle(&self, symbol: &str) -> Result<String, DemangleError> {
        self(symbol)
    }
}

/// Runs an external program once per symbol, passing the symbol as its only
/// argument and reading the result from stdout.
#[derive(Debug, Clone)]
pub struct CommandDemangler {
    program: OsString,
}

impl CommandDemangler {
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
        }
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }
}

impl Default for CommandDemangler {
    fn default() -> Self {
        Self::new(DEFAULT_DEMANGLER)
    }
}

impl Demangler for CommandDemangler {
    fn demangle(&self, symbol: &str) -> Result<String, DemangleError> {
        let output = Command::new(&self.program)
            .arg(symbol)
            .output()
            .map_err(|source| DemangleError::Spawn {
                program: self.program_name(),
                source,
            })?;

        if !output.status.success() {
            return Err(DemangleError::Failed {
                program: self.program_name(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        // nothing at all on stdout: keep the mangled name
        if output.stdout.is_empty() {
            log::debug!("{} printed nothing for {}", self.program_name(), symbol);
            return Ok(symbol.to_string());
        }

        let text = String::from_utf8(output.stdout).map_err(|source| {
            DemangleError::InvalidOutput {
                program: self.program_name(),
                source,
            }
        })?;

        Ok(text.trim().to_string())
    }
}
