use anyhow::{Context, Result};
use clap::Parser;
use pptrace_core::{CommandDemangler, demangle_stream};
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Pretty-print a backtrace by demangling its C++ function names
#[derive(Parser)]
#[command(
    name = "pptrace",
    about = "Pretty-print a backtrace, demangling all C++ function names",
    version,
    author
)]
struct Cli {
    /// Input file (default: stdin, `-` also means stdin)
    #[arg(short = 'i', long = "infile")]
    infile: Option<PathBuf>,

    /// Output file, appended to (default: stdout)
    #[arg(short = 'o', long = "outfile", visible_alias = "oufile")]
    outfile: Option<PathBuf>,
}

fn open_input(path: Option<&Path>) -> Result<Box<dyn BufRead>> {
    match path {
        Some(path) if path != Path::new("-") => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open input file {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        _ => Ok(Box::new(io::stdin().lock())),
    }
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open output file {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(io::stdout().lock())),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let input = open_input(cli.infile.as_deref())?;
    let output = open_output(cli.outfile.as_deref())?;
    let demangler = CommandDemangler::default();
    log::debug!("Using demangler {}", demangler.program().to_string_lossy());

    demangle_stream(input, output, &demangler)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::fs;
    use std::io::Read;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_short_and_long_options() {
        let cli = Cli::try_parse_from(["pptrace", "-i", "trace.txt", "--oufile", "out.txt"]).unwrap();
        assert_eq!(cli.infile, Some(PathBuf::from("trace.txt")));
        assert_eq!(cli.outfile, Some(PathBuf::from("out.txt")));

        let cli = Cli::try_parse_from(["pptrace"]).unwrap();
        assert_eq!(cli.infile, None);
        assert_eq!(cli.outfile, None);
    }

    #[test]
    fn demangler_is_not_configurable() {
        assert!(Cli::try_parse_from(["pptrace", "--demangler", "llvm-cxxfilt"]).is_err());
    }

    #[test]
    fn rejects_positional_arguments() {
        assert!(Cli::try_parse_from(["pptrace", "trace.txt"]).is_err());
    }

    #[test]
    fn reads_input_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.txt");
        fs::write(&path, "  #0 00 in main+0x1\n").unwrap();

        let mut text = String::new();
        open_input(Some(path.as_path()))
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, "  #0 00 in main+0x1\n");
    }

    #[test]
    fn missing_input_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.txt");
        let err = open_input(Some(path.as_path())).err().unwrap();
        assert!(err.to_string().contains("missing.txt"));
    }

    #[test]
    fn output_file_is_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        fs::write(&path, "existing\n").unwrap();

        {
            let mut out = open_output(Some(path.as_path())).unwrap();
            out.write_all(b"more\n").unwrap();
        }
        {
            let mut out = open_output(Some(path.as_path())).unwrap();
            out.write_all(b"again\n").unwrap();
        }
        assert_eq!(fs::read_to_string(&path).unwrap(), "existing\nmore\nagain\n");
    }

    #[test]
    fn output_file_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.txt");

        let out = open_output(Some(path.as_path())).unwrap();
        drop(out);
        assert!(path.exists());
    }

    #[test]
    fn file_to_file_pass_through() {
        let dir = tempfile::tempdir().unwrap();
        let in_path = dir.path().join("in.txt");
        let out_path = dir.path().join("out.txt");
        fs::write(&in_path, "header\r\nno frames here\n").unwrap();

        let input = open_input(Some(in_path.as_path())).unwrap();
        let output = open_output(Some(out_path.as_path())).unwrap();
        let demangler = CommandDemangler::new("pptrace-never-called");
        let stats = demangle_stream(input, output, &demangler).unwrap();

        assert_eq!(stats.frames, 0);
        assert_eq!(
            fs::read_to_string(&out_path).unwrap(),
            "header\r\nno frames here\n"
        );
    }
}
