//! Transcript cleanup for the run log.

/// Normalize a device transcript for logging.
///
/// Line endings become `\n`, trailing whitespace is stripped from every
/// line, leading and trailing blank lines are dropped, and indentation
/// shared by every non-blank line is removed.
pub fn normalize_transcript(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<&str> = text.lines().map(str::trim_end).collect();

    let indent = lines
        .iter()
        .filter(|line| !line.is_empty())
        .map(|line| line.len() - line.trim_start_matches([' ', '\t']).len())
        .min()
        .unwrap_or(0);

    let first = lines.iter().position(|line| !line.is_empty());
    let last = lines.iter().rposition(|line| !line.is_empty());
    let (Some(first), Some(last)) = (first, last) else {
        return String::new();
    };

    lines[first..=last]
        .iter()
        .map(|line| line.get(indent..).unwrap_or(""))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_endings_and_trailing_space() {
        let raw = "sw1(config)#vlan 10   \r\nsw1(config-vlan)#name users\r\nsw1(config-vlan)#";
        assert_eq!(
            normalize_transcript(raw),
            "sw1(config)#vlan 10\nsw1(config-vlan)#name users\nsw1(config-vlan)#"
        );
    }

    #[test]
    fn test_common_indent_removed() {
        let raw = "\n    interface Gi0/1\n      description uplink\n\n    exit\n";
        assert_eq!(
            normalize_transcript(raw),
            "interface Gi0/1\n  description uplink\n\nexit"
        );
    }

    #[test]
    fn test_blank_input() {
        assert_eq!(normalize_transcript(" \r\n\n"), "");
    }
}
