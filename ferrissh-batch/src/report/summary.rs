//! JSON outcome summary.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::ReportError;
use crate::runner::{RunOutcome, Tally};

#[derive(Serialize)]
struct Summary<'a> {
    succeeded: usize,
    failed: usize,
    saved: usize,
    devices: &'a [RunOutcome],
}

/// Write all outcomes of a run as pretty-printed JSON.
pub fn write_summary(path: impl AsRef<Path>, outcomes: &[RunOutcome]) -> Result<(), ReportError> {
    let path = path.as_ref();
    let io_err = |source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    };

    let tally = Tally::from_outcomes(outcomes);
    let summary = Summary {
        succeeded: tally.succeeded,
        failed: tally.failed,
        saved: tally.saved,
        devices: outcomes,
    };

    let mut out = BufWriter::new(File::create(path).map_err(io_err)?);
    serde_json::to_writer_pretty(&mut out, &summary)?;
    writeln!(out).and_then(|()| out.flush()).map_err(io_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::inventory::CommandSet;
    use crate::platform::DeviceKind;
    use crate::runner::DeviceFailure;

    #[test]
    fn test_summary_json() {
        let outcomes = vec![
            RunOutcome {
                device_name: "sw1".to_string(),
                kind: DeviceKind::CiscoIos,
                succeeded: true,
                command_set: CommandSet::Implementation,
                captured_output: "sw1(config)#vlan 10".to_string(),
                verification_output: None,
                saved: true,
                error: None,
            },
            RunOutcome {
                device_name: "mx1".to_string(),
                kind: DeviceKind::Juniper,
                succeeded: false,
                command_set: CommandSet::Implementation,
                captured_output: String::new(),
                verification_output: None,
                saved: false,
                error: Some(DeviceFailure {
                    kind: FailureKind::ConnectionTimeout,
                    message: "Connection timed out".to_string(),
                }),
            },
        ];

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        write_summary(&path, &outcomes).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["succeeded"], 1);
        assert_eq!(value["failed"], 1);
        assert_eq!(value["devices"][0]["kind"], "cisco_ios");
        assert_eq!(value["devices"][0]["command_set"], "implementation");
        assert_eq!(value["devices"][1]["error"]["kind"], "ConnectionTimeout");
        assert!(value["devices"][1]["verification_output"].is_null());
    }
}
