//! CSV loader for the device table.
//!
//! Columns are fixed by position and the first row is always a header:
//!
//! ```text
//! | DeviceName | OS_Type | ImplementationCommands | RollbackCommands | VerificationCommands |
//! | device1    | cisco   | commands to run        | rollback cmds    | show command         |
//! ```
//!
//! A command cell holds one line, or several when the cell is quoted and
//! contains newlines.

use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::Path;

use log::debug;

use super::{CommandSet, DeviceRecord};
use crate::error::InputError;
use crate::platform::{DeviceKind, UnknownKind};

/// Name, kind, implementation and rollback columns.
pub const REQUIRED_COLUMNS: usize = 4;

const NAME: usize = 0;
const KIND: usize = 1;
const IMPLEMENTATION: usize = 2;
const ROLLBACK: usize = 3;
const VERIFICATION: usize = 4;

/// Load the device table at `path`.
pub fn load(
    path: impl AsRef<Path>,
    command_set: CommandSet,
) -> Result<Vec<DeviceRecord>, InputError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| InputError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_reader(file, command_set)
}

/// Load a device table from any reader.
///
/// Only the command column for `command_set` has to be filled in; the
/// other one is parsed but not checked.
pub fn load_from_reader<R: io::Read>(
    reader: R,
    command_set: CommandSet,
) -> Result<Vec<DeviceRecord>, InputError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut records = Vec::new();
    let mut seen: HashMap<String, u64> = HashMap::new();

    for row in reader.records() {
        let row = row?;
        let line = row.position().map(|p| p.line()).unwrap_or_default();

        let name = row.get(NAME).map(str::trim).unwrap_or_default();
        if name.is_empty() {
            debug!("skipping line {line}: no device name");
            continue;
        }

        if row.len() < REQUIRED_COLUMNS {
            return Err(InputError::MissingColumns {
                line,
                expected: REQUIRED_COLUMNS,
                found: row.len(),
            });
        }

        let kind: DeviceKind = row[KIND]
            .parse()
            .map_err(|UnknownKind(value)| InputError::UnknownKind { line, value })?;

        let record = DeviceRecord {
            name: name.to_string(),
            kind,
            implementation_commands: split_lines(&row[IMPLEMENTATION]),
            rollback_commands: split_lines(&row[ROLLBACK]),
            verification_commands: row.get(VERIFICATION).map(split_lines).unwrap_or_default(),
            line,
        };

        if record.commands(command_set).is_empty() {
            return Err(InputError::MissingCommands {
                line,
                device: record.name,
                command_set: command_set.to_string(),
            });
        }

        if let Some(&first_line) = seen.get(&record.name) {
            return Err(InputError::DuplicateDevice {
                line,
                name: record.name,
                first_line,
            });
        }
        seen.insert(record.name.clone(), line);

        records.push(record);
    }

    debug!("loaded {} device records", records.len());
    Ok(records)
}

/// Split a command cell into its non-blank lines.
fn split_lines(cell: &str) -> Vec<String> {
    cell.lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "DeviceName,OS_Type,Implementation_Cmds,Rollback_Cmds,Verification_Cmds\n";

    fn parse(body: &str, command_set: CommandSet) -> Result<Vec<DeviceRecord>, InputError> {
        let table = format!("{HEADER}{body}");
        load_from_reader(table.as_bytes(), command_set)
    }

    #[test]
    fn test_header_is_skipped() {
        let records = parse(
            "sw1,cisco_ios,vlan 10,no vlan 10,show vlan brief\n",
            CommandSet::Implementation,
        )
        .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "sw1");
        assert_eq!(records[0].kind, DeviceKind::CiscoIos);
        assert_eq!(records[0].implementation_commands, vec!["vlan 10"]);
        assert_eq!(records[0].rollback_commands, vec!["no vlan 10"]);
        assert_eq!(records[0].verification_commands, vec!["show vlan brief"]);
        assert_eq!(records[0].line, 2);
    }

    #[test]
    fn test_multiline_cells_keep_order() {
        let body = "rtr1,cisco_ios,\"interface Gi0/1\r\n description uplink\r\n no shutdown\",\"interface Gi0/1\n no description\",\n";
        let records = parse(body, CommandSet::Implementation).unwrap();

        assert_eq!(
            records[0].implementation_commands,
            vec!["interface Gi0/1", " description uplink", " no shutdown"]
        );
        assert_eq!(
            records[0].rollback_commands,
            vec!["interface Gi0/1", " no description"]
        );
        assert!(!records[0].has_verification());
    }

    #[test]
    fn test_empty_name_rows_are_dropped() {
        let body = "sw1,cisco_ios,vlan 10,no vlan 10\n,,,\n  ,juniper,x,y\nsw2,juniper,set a,delete a\n";
        let records = parse(body, CommandSet::Implementation).unwrap();

        let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["sw1", "sw2"]);
    }

    #[test]
    fn test_verification_column_is_optional() {
        let records = parse("fw1,cisco_asa,object network A,no object network A\n", CommandSet::Rollback)
            .unwrap();
        assert!(records[0].verification_commands.is_empty());
    }

    #[test]
    fn test_truncated_row_is_an_error() {
        let err = parse("sw1,cisco_ios,vlan 10\n", CommandSet::Implementation).unwrap_err();
        assert!(matches!(
            err,
            InputError::MissingColumns {
                line: 2,
                expected: 4,
                found: 3
            }
        ));
    }

    #[test]
    fn test_unknown_kind_is_an_error() {
        let err = parse("sw1,arista_eos,vlan 10,no vlan 10\n", CommandSet::Implementation)
            .unwrap_err();
        match err {
            InputError::UnknownKind { line, value } => {
                assert_eq!(line, 2);
                assert_eq!(value, "arista_eos");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_kind_is_case_insensitive() {
        let records = parse("sw1,Cisco,vlan 10,no vlan 10\nr1,JUNIPER,set a,delete a\n", CommandSet::Implementation)
            .unwrap();
        assert_eq!(records[0].kind, DeviceKind::CiscoIos);
        assert_eq!(records[1].kind, DeviceKind::Juniper);
    }

    #[test]
    fn test_selected_command_set_must_be_present() {
        let body = "sw1,cisco_ios,vlan 10,\n";

        assert!(parse(body, CommandSet::Implementation).is_ok());

        let err = parse(body, CommandSet::Rollback).unwrap_err();
        assert!(matches!(err, InputError::MissingCommands { ref device, .. } if device == "sw1"));
    }

    #[test]
    fn test_duplicate_device_is_an_error() {
        let body = "sw1,cisco_ios,vlan 10,no vlan 10\nsw1,cisco_ios,vlan 20,no vlan 20\n";
        let err = parse(body, CommandSet::Implementation).unwrap_err();
        assert!(matches!(
            err,
            InputError::DuplicateDevice {
                line: 3,
                first_line: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = load("/nonexistent/devices.csv", CommandSet::Implementation).unwrap_err();
        assert!(matches!(err, InputError::Open { .. }));
    }

    #[test]
    fn test_header_only_table() {
        let records = parse("", CommandSet::Implementation).unwrap();
        assert!(records.is_empty());
    }
}
