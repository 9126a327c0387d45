use std::{fs::File, io::Write};

use crate::{error::ToolError, BinStore, Record, Value};

/// Renders one record as a single human-readable line with an aligned
/// kind column.
pub fn render(record: &Record) -> String {
    match &record.value {
        Value::Int(v) => format!("(int)    \"{}\" = {}", record.name, v),
        Value::Float(v) => format!("(float)  \"{}\" = {}", record.name, v),
        Value::Str(s) => format!("(string) \"{}\" = \"{}\"", record.name, s),
        Value::Raw(b) => format!("(raw)    \"{}\" = <{} bytes>", record.name, b.len()),
    }
}

pub fn list_keys<W: Write>(store: &BinStore, filename: &str, out: &mut W) -> Result<(), ToolError> {
    writeln!(out, "File \"{}\" ({} keys):", filename, store.len())?;

    for record in store.records() {
        writeln!(out, "{}", render(record))?;
    }

    Ok(())
}

/// Writes every raw record verbatim to `<name>.bin` in the working
/// directory, overwriting silently. Non-raw records are skipped with a
/// notice. A side-file failure is reported per key and the remaining
/// records are still processed.
pub fn dump_keys<W: Write>(store: &BinStore, filename: &str, out: &mut W) -> Result<(), ToolError> {
    writeln!(out, "File \"{}\" ({} keys):", filename, store.len())?;

    for record in store.records() {
        match &record.value {
            Value::Int(_) => writeln!(out, "IGNORING: (int)    \"{}\".", record.name)?,
            Value::Float(_) => writeln!(out, "IGNORING: (float)  \"{}\".", record.name)?,
            Value::Str(_) => writeln!(out, "IGNORING: (string) \"{}\".", record.name)?,
            Value::Raw(bytes) => {
                let target = format!("{}.bin", record.name);
                writeln!(
                    out,
                    "WRITING:  (raw)    \"{}\" ({} bytes) -> FILE: \"{}\"",
                    record.name,
                    bytes.len(),
                    target
                )?;

                let written = File::create(&target).and_then(|mut f| f.write_all(bytes));
                if written.is_err() {
                    writeln!(out, "ERROR: {}", ToolError::FileOpen(target))?;
                }
            }
        }
    }

    Ok(())
}

pub fn get_keys<W: Write>(
    store: &BinStore,
    filename: &str,
    names: &[String],
    out: &mut W,
) -> Result<(), ToolError> {
    writeln!(out, "In file \"{}\":", filename)?;

    for name in names {
        match store.get_key(name) {
            Some(record) => writeln!(out, "{}", render(record))?,
            None => writeln!(out, "Key not found: \"{}\".", name)?,
        }
    }

    Ok(())
}

pub fn remove_keys<W: Write>(
    store: &mut BinStore,
    filename: &str,
    names: &[String],
    out: &mut W,
) -> Result<(), ToolError> {
    writeln!(out, "In file \"{}\":", filename)?;

    for name in names {
        match store.get_key(name).map(render) {
            Some(line) => {
                writeln!(out, "DELETING: {}", line)?;
                store.delete_key(name);
            }
            None => writeln!(out, "Key not found: \"{}\".", name)?,
        }
    }

    Ok(())
}
