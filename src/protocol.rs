use anyhow::Result;
use std::io::{BufRead, Write};

use crate::commands;
use crate::git::ObjectStore;
use crate::remote::Remote;
use crate::store::ContentStore;
use crate::tracker::Tracker;

/// Main protocol handler - reads commands from `input` and dispatches them
pub fn handle_commands<O, C, T, R, W>(
    remote: &mut Remote<O, C, T>,
    input: R,
    output: &mut W,
) -> Result<()>
where
    O: ObjectStore,
    C: ContentStore,
    T: Tracker,
    R: BufRead,
    W: Write,
{
    let mut lines = input.lines();

    #[allow(clippy::while_let_on_iterator)]
    while let Some(line) = lines.next() {
        let line = line?;
        let line = line.trim();

        tracing::debug!("Received command: {}", line);

        // Empty line at top level ends the session
        if line.is_empty() {
            break;
        }

        let (command, args) = line.split_once(' ').unwrap_or((line, ""));
        match command {
            "capabilities" => {
                commands::capabilities::handle(output)?;
            }
            "option" => {
                handle_option(remote, output, args)?;
            }
            "list" => {
                let for_push = args == "for-push";
                commands::list::handle(remote, output, for_push)?;
            }
            "push" => {
                commands::push::handle(remote, output, args, &mut lines)?;
            }
            cmd => {
                anyhow::bail!("Unknown command: {}", cmd);
            }
        }

        output.flush()?;
    }

    Ok(())
}

fn handle_option<O, C, T, W: Write>(
    remote: &mut Remote<O, C, T>,
    output: &mut W,
    args: &str,
) -> Result<()> {
    let (name, value) = args.split_once(' ').unwrap_or((args, ""));
    match name {
        "verbosity" => writeln!(output, "ok")?,
        "progress" => {
            remote.progress = remote.progress && value == "true";
            writeln!(output, "ok")?;
        }
        _ => writeln!(output, "unsupported")?,
    }
    Ok(())
}
