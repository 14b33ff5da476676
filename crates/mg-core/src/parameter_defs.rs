use crate::error::MapGenError;
use crate::scenario::{ParameterDef, ScenarioParameters};
use crate::types::SourceSpan;

/// Scenario parameter definitions file looked up in a scenario's base directory.
pub const PARAMETER_DEFS_FILE: &str = "ParameterDefs.txt";

const PARAMETER_DEFS_ERROR_CODE: &str = "SCENARIO_DEFS";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Other,
    Definition,
    Option,
}

struct PendingDef {
    def: ParameterDef,
    line: usize,
}

fn defs_error(filename: &str, line: usize, message: &str) -> MapGenError {
    MapGenError::with_span(
        PARAMETER_DEFS_ERROR_CODE,
        format!("{}:{}: {}", filename, line, message),
        SourceSpan::at(line, 1),
    )
}

fn finish(
    pending: Option<PendingDef>,
    filename: &str,
    parameters: &mut ScenarioParameters,
) -> Result<(), MapGenError> {
    let Some(PendingDef { def, line }) = pending else {
        return Ok(());
    };
    if def.id.is_empty() {
        return Err(defs_error(filename, line, "parameter definition without ID"));
    }
    parameters.define(def);
    Ok(())
}

/// Reads `[ParameterDef]` sections (`ID`, `Name`, `Default`) and the `Value`
/// of their `[Option]` subsections, which bound the parameter's range.
/// Other sections and keys are skipped.
pub fn parse_parameter_defs(text: &str, filename: &str) -> Result<ScenarioParameters, MapGenError> {
    let mut parameters = ScenarioParameters::new();
    let mut pending: Option<PendingDef> = None;
    let mut section = Section::Other;

    for (index, raw) in text.lines().enumerate() {
        let line_number = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with("//") {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
            section = match name.trim() {
                "ParameterDef" => {
                    finish(pending.take(), filename, &mut parameters)?;
                    pending = Some(PendingDef {
                        def: ParameterDef {
                            id: String::new(),
                            name: String::new(),
                            default: 0,
                            min: None,
                            max: None,
                        },
                        line: line_number,
                    });
                    Section::Definition
                }
                "Option" if pending.is_some() => Section::Option,
                "Options" if pending.is_some() => section,
                _ => {
                    finish(pending.take(), filename, &mut parameters)?;
                    Section::Other
                }
            };
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            return Err(defs_error(
                filename,
                line_number,
                &format!("expected 'key=value', found '{}'", line),
            ));
        };
        let (key, value) = (key.trim(), value.trim());
        let int = || {
            value.parse::<i32>().map_err(|_| {
                defs_error(
                    filename,
                    line_number,
                    &format!("invalid value '{}' for '{}'", value, key),
                )
            })
        };
        let Some(PendingDef { def, .. }) = pending.as_mut() else {
            continue;
        };
        match (section, key) {
            (Section::Definition, "ID") => def.id = value.to_string(),
            (Section::Definition, "Name") => def.name = value.to_string(),
            (Section::Definition, "Default") => def.default = int()?,
            (Section::Option, "Value") => {
                let option = int()?;
                def.min = Some(def.min.map_or(option, |min| min.min(option)));
                def.max = Some(def.max.map_or(option, |max| max.max(option)));
            }
            _ => {}
        }
    }
    finish(pending, filename, &mut parameters)?;
    Ok(parameters)
}
