use crate::{Demangler, FrameLine, substitute_first};
use anyhow::{Context, Result};
use std::io::{BufRead, Write};

/// Counters for one pass over a backtrace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub lines: usize,
    pub frames: usize,
    /// frames marked with `=>`
    pub faults: usize,
    pub rewritten: usize,
}

/// Copies `input` to `output` line by line, demangling the symbol of every
/// frame line on the way.
///
/// Line terminators are kept as read. Lines that are not valid UTF-8 are
/// copied untouched. The first demangler failure stops the pass; whatever
/// was already written stays written.
pub fn demangle_stream<R, W, D>(mut input: R, mut output: W, demangler: &D) -> Result<FilterStats>
where
    R: BufRead,
    W: Write,
    D: Demangler + ?Sized,
{
    let mut stats = FilterStats::default();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let read = input
            .read_until(b'\n', &mut buf)
            .context("Failed to read backtrace input")?;
        if read == 0 {
            break;
        }
        stats.lines += 1;

        let Ok(line) = std::str::from_utf8(&buf) else {
            log::warn!("Line {} is not valid UTF-8; copying as is", stats.lines);
            output.write_all(&buf).context("Failed to write output")?;
            continue;
        };

        let Some(frame) = FrameLine::parse(line) else {
            output.write_all(&buf).context("Failed to write output")?;
            continue;
        };
        stats.frames += 1;
        if frame.is_faulting() {
            stats.faults += 1;
        }

        let demangled = demangler.demangle(frame.symbol).with_context(|| {
            format!(
                "Failed to demangle {} on line {}",
                frame.symbol, stats.lines
            )
        })?;

        let rewritten = substitute_first(line, frame.symbol, &demangled);
        if rewritten != line {
            stats.rewritten += 1;
            log::debug!(
                "[{}] frame #{} at {}: {} -> {}",
                frame.marker,
                frame.index,
                frame.address,
                frame.symbol,
                demangled
            );
        }
        output
            .write_all(rewritten.as_bytes())
            .context("Failed to write output")?;
    }

    output.flush().context("Failed to flush output")?;
    log::info!(
        "Processed {} lines, {} frames ({} faulting), {} rewritten",
        stats.lines,
        stats.frames,
        stats.faults,
        stats.rewritten
    );
    Ok(stats)
}
