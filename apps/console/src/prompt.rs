use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use shared::error::FieldErrors;
use wizard::{RawInput, Schema};

/// Typed on any field to return to the previous wizard step.
pub const BACK: &str = "<";

pub enum FormInput {
    Filled(RawInput),
    Back,
}

/// Reads one line. `Ok(None)` at end of input.
pub fn read_line(label: &str, default: Option<&str>) -> Result<Option<String>> {
    let mut stdout = io::stdout().lock();
    match default.filter(|d| !d.is_empty()) {
        Some(default) => write!(stdout, "{label} [{default}]: ")?,
        None => write!(stdout, "{label}: ")?,
    }
    stdout.flush()?;

    let mut line = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    if read == 0 {
        return Ok(None);
    }
    let line = line.trim_end_matches(['\r', '\n']).to_string();
    if line.is_empty() {
        return Ok(Some(default.unwrap_or_default().to_string()));
    }
    Ok(Some(line))
}

/// Asks for every field of `schema`, offering `prefill` values as defaults.
pub fn fill_form(schema: &Schema, prefill: &RawInput, allow_back: bool) -> Result<FormInput> {
    let mut input = RawInput::new();
    for field in schema.field_names() {
        let default = prefill.get(field).map(String::as_str);
        let Some(value) = read_line(field, default)? else {
            bail!("input closed before the form was complete");
        };
        if allow_back && value == BACK {
            return Ok(FormInput::Back);
        }
        input.insert(field.to_string(), value);
    }
    Ok(FormInput::Filled(input))
}

pub fn confirm(question: &str) -> Result<bool> {
    let answer = read_line(&format!("{question} [y/N]"), None)?.unwrap_or_default();
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

pub fn print_field_errors(errors: &FieldErrors) {
    for (field, message) in errors.iter() {
        eprintln!("  {field}: {message}");
    }
}
