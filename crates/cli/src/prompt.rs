//! Terminal prompts.
//!
//! Both prompts take a reader and a writer so tests can drive them without
//! a terminal.

use std::io::{BufRead, Write};

use mapprune_core::{Error, Result};

/// Ask a yes/no question until the answer is one of `y`, `yes`, `n`, `no`.
///
/// End of input counts as "no".
pub fn confirm(input: &mut impl BufRead, output: &mut impl Write, question: &str) -> Result<bool> {
    loop {
        write!(output, "{} [y/N] ", question)?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            return Ok(false);
        }
        match line.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => writeln!(output, "Please answer Y or N.")?,
        }
    }
}

/// Read one line of comma-separated coordinates.
pub fn read_coordinates(input: &mut impl BufRead, output: &mut impl Write) -> Result<String> {
    writeln!(output, "Enter coordinates to keep, e.g. 119.183.10, 119.183.9")?;
    write!(output, "> ")?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(Error::config("no coordinates entered"));
    }
    Ok(line.trim().to_string())
}
