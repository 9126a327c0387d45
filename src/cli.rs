use std::{
    fs::File,
    io::{Read, Write},
};

use tracing::debug;

use crate::{error::ToolError, report, BinStore, KeyType, StoreError};

/// Parser position within the argument vector. One state is active at
/// a time; every transition consumes exactly one token, moving forward
/// only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    AwaitingFilename,
    AwaitingAction,
    AwaitingKeyType,
    AwaitingKeyName,
    AwaitingKeyValue,
}

const HELP: &str = "\
binkv - typed binary key-value record tool

Usage: binkv <file> (list | dump | get [keys] | remove [keys] | set {options})
\t- When using 'list', binkv will list all keys and their values.
\t- When using 'dump', binkv will dump 'raw' keys to appropriately named files.
\t- When using 'get', binkv will list specified keys.
\t- When using 'remove', binkv will remove (delete) specified keys.

Options:
\t-i <name> <value>    Set integer value.
\t-f <name> <value>    Set float value.
\t-s <name> <value>    Set string value.
\t-r <name> <file>     Set raw value using bytes from given file.
";

/// Interprets one invocation's argument vector (program name already
/// stripped) against the store it names. All report output goes to
/// `out`; errors map to exit code 1 in the binary.
pub fn run<W: Write>(args: &[String], out: &mut W) -> Result<(), ToolError> {
    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        write!(out, "{HELP}")?;
        return Ok(());
    }
    if args.iter().any(|a| a == "--version" || a == "-v") {
        writeln!(out, "binkv v{}", env!("CARGO_PKG_VERSION"))?;
        return Ok(());
    }

    let mut state = ParseState::AwaitingFilename;
    let mut store = BinStore::new();
    let mut filename = String::new();
    let mut pending_type: Option<KeyType> = None;
    let mut pending_name = String::new();

    for (i, arg) in args.iter().enumerate() {
        let is_last = i == args.len() - 1;

        match state {
            ParseState::AwaitingFilename => {
                filename = arg.clone();

                // An action must follow the filename.
                if is_last {
                    return Err(ToolError::NoActionGiven);
                }

                // Load the store if the file exists. A missing file is
                // tolerated only for 'set', which creates a new store.
                if File::open(&filename).is_ok() {
                    store = BinStore::load(&filename).map_err(|err| {
                        debug!(%err, file = %filename, "store decode failed");
                        ToolError::StoreRead(filename.clone())
                    })?;
                } else if args[1] != "set" {
                    return Err(ToolError::FileOpen(filename.clone()));
                }

                state = ParseState::AwaitingAction;
            }
            ParseState::AwaitingAction => match arg.as_str() {
                "list" => {
                    report::list_keys(&store, &filename, out)?;
                    return Ok(());
                }
                "dump" => {
                    report::dump_keys(&store, &filename, out)?;
                    return Ok(());
                }
                "get" => {
                    report::get_keys(&store, &filename, &args[i + 1..], out)?;
                    return Ok(());
                }
                "remove" => {
                    report::remove_keys(&mut store, &filename, &args[i + 1..], out)?;
                    persist(&store, &filename)?;
                    return Ok(());
                }
                "set" => state = ParseState::AwaitingKeyType,
                other => return Err(ToolError::UnknownAction(other.to_string())),
            },
            ParseState::AwaitingKeyType => {
                pending_type = Some(match arg.as_str() {
                    "-i" => KeyType::Int,
                    "-f" => KeyType::Float,
                    "-s" => KeyType::Str,
                    "-r" => KeyType::Raw,
                    _ => return Err(ToolError::InvalidSyntax("unknown key type option")),
                });
                if is_last {
                    return Err(ToolError::InvalidSyntax("key name was not given"));
                }
                state = ParseState::AwaitingKeyName;
            }
            ParseState::AwaitingKeyName => {
                pending_name = arg.clone();
                if is_last {
                    return Err(ToolError::InvalidSyntax("no value given for key"));
                }
                state = ParseState::AwaitingKeyValue;
            }
            ParseState::AwaitingKeyValue => {
                match pending_type.take() {
                    Some(KeyType::Int) => store.set_int(&pending_name, parse_int_lossy(arg)),
                    Some(KeyType::Float) => store.set_float(&pending_name, parse_float_lossy(arg)),
                    Some(KeyType::Str) => store.set_string(&pending_name, arg),
                    Some(KeyType::Raw) => {
                        let mut bytes = Vec::new();
                        File::open(arg)
                            .and_then(|mut f| f.read_to_end(&mut bytes))
                            .map_err(|_| ToolError::FileOpen(arg.clone()))?;
                        store.set_raw(&pending_name, bytes);
                    }
                    None => return Err(ToolError::Unknown),
                }

                let record = store.get_key(&pending_name).ok_or(ToolError::Unknown)?;
                writeln!(out, "SET: {}", report::render(record))?;

                state = ParseState::AwaitingKeyType;
            }
        }
    }

    // Only the 'set' sub-loop falls out of the token loop; every other
    // action returned above.
    persist(&store, &filename)?;
    Ok(())
}

fn persist(store: &BinStore, filename: &str) -> Result<(), ToolError> {
    store.save(filename).map_err(|err| match err {
        StoreError::Io(err) => ToolError::Io(err),
        _ => ToolError::Unknown,
    })
}

/// Base-10 integer parse with atoi semantics: the longest leading
/// numeric prefix counts, anything else yields zero.
fn parse_int_lossy(token: &str) -> i64 {
    let t = token.trim_start();
    let mut end = 0;
    for (i, c) in t.char_indices() {
        let is_sign = (c == '-' || c == '+') && i == 0;
        if c.is_ascii_digit() || is_sign {
            end = i + c.len_utf8();
        } else {
            break;
        }
    }
    t[..end].parse().unwrap_or(0)
}

/// Decimal float parse with the same lossy-prefix semantics.
fn parse_float_lossy(token: &str) -> f64 {
    let t = token.trim_start();
    let mut end = 0;
    let mut seen_dot = false;
    let mut seen_digit = false;
    for (i, c) in t.char_indices() {
        match c {
            '0'..='9' => {
                seen_digit = true;
                end = i + 1;
            }
            '+' | '-' if i == 0 => end = i + 1,
            '.' if !seen_dot => {
                seen_dot = true;
                end = i + 1;
            }
            _ => break,
        }
    }
    if !seen_digit {
        return 0.0;
    }
    t[..end].parse().unwrap_or(0.0)
}
