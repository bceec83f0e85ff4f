use anyhow::Result;
use std::io::Write;

/// Handle the capabilities command
pub fn handle<W: Write>(output: &mut W) -> Result<()> {
    writeln!(output, "push")?;
    writeln!(output, "option")?;
    writeln!(output)?; // Empty line signals completion

    Ok(())
}
