//! Platform definition for vendor-specific CLI behavior.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use super::privilege_level::PrivilegeLevel;

/// Trait for vendor-specific output handling.
pub trait VendorBehavior: Send + Sync {
    /// Normalize command output (strip command echo, trailing prompt).
    fn normalize_output(&self, raw: &str, command: &str) -> String {
        let raw = raw.replace("\r\n", "\n");
        let output = raw.trim_start_matches(['\r', '\n']);
        let output = output
            .strip_prefix(command)
            .unwrap_or(output)
            .trim_start_matches(['\r', '\n']);

        let output = match output.rfind('\n') {
            Some(pos) => &output[..pos],
            None => "",
        };
        self.post_process_output(output)
    }

    /// Vendor-specific cleanup applied after normalization.
    fn post_process_output(&self, output: &str) -> String {
        output.to_string()
    }
}

/// Vendor behavior with no post-processing.
pub struct DefaultBehavior;

impl VendorBehavior for DefaultBehavior {}

/// Prompt, privilege and command definition for one platform.
#[derive(Clone)]
pub struct PlatformDefinition {
    /// Platform name (e.g., "cisco_ios", "juniper_junos").
    pub name: String,

    /// Privilege levels, in prompt-matching order.
    pub privilege_levels: IndexMap<String, PrivilegeLevel>,

    /// Level a fresh login lands in.
    pub default_privilege: String,

    /// Level acquired by `enable`; `None` when login is already privileged.
    pub privileged_level: Option<String>,

    /// Level configuration lines are sent from.
    pub config_privilege: String,

    /// Patterns that indicate command failure.
    pub failed_when_contains: Vec<String>,

    /// Commands to run when the session opens.
    pub on_open_commands: Vec<String>,

    /// Commands that discard uncommitted changes before leaving
    /// configuration mode on disconnect.
    pub abandon_commands: Vec<String>,

    /// Terminal width for PTY.
    pub terminal_width: u32,

    /// Terminal height for PTY.
    pub terminal_height: u32,

    /// Optional vendor-specific behavior.
    pub behavior: Option<Arc<dyn VendorBehavior>>,
}

impl PlatformDefinition {
    /// Create a new platform definition with minimal required fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            privilege_levels: IndexMap::new(),
            default_privilege: String::new(),
            privileged_level: None,
            config_privilege: String::new(),
            failed_when_contains: vec![],
            on_open_commands: vec![],
            abandon_commands: vec![],
            terminal_width: 511,
            terminal_height: 24,
            behavior: None,
        }
    }

    /// Add a privilege level.
    pub fn with_privilege(mut self, level: PrivilegeLevel) -> Self {
        self.privilege_levels.insert(level.name.clone(), level);
        self
    }

    /// Set the default privilege level.
    pub fn with_default_privilege(mut self, name: impl Into<String>) -> Self {
        self.default_privilege = name.into();
        self
    }

    /// Set the level `enable` acquires.
    pub fn with_privileged_level(mut self, name: impl Into<String>) -> Self {
        self.privileged_level = Some(name.into());
        self
    }

    /// Set the configuration level.
    pub fn with_config_privilege(mut self, name: impl Into<String>) -> Self {
        self.config_privilege = name.into();
        self
    }

    /// Add a failure pattern.
    pub fn with_failure_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.failed_when_contains.push(pattern.into());
        self
    }

    /// Add an on_open command.
    pub fn with_on_open_command(mut self, command: impl Into<String>) -> Self {
        self.on_open_commands.push(command.into());
        self
    }

    /// Add a command that discards uncommitted changes.
    pub fn with_abandon_command(mut self, command: impl Into<String>) -> Self {
        self.abandon_commands.push(command.into());
        self
    }

    /// Set terminal dimensions.
    pub fn with_terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }

    /// Set vendor behavior.
    pub fn with_behavior(mut self, behavior: Arc<dyn VendorBehavior>) -> Self {
        self.behavior = Some(behavior);
        self
    }

    /// Get a privilege level by name.
    pub fn get_privilege(&self, name: &str) -> Option<&PrivilegeLevel> {
        self.privilege_levels.get(name)
    }

    /// First failure pattern contained in `output`.
    pub fn detect_failure(&self, output: &str) -> Option<&str> {
        self.failed_when_contains
            .iter()
            .find(|pattern| output.contains(pattern.as_str()))
            .map(String::as_str)
    }
}

impl fmt::Debug for PlatformDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformDefinition")
            .field("name", &self.name)
            .field("privilege_levels", &self.privilege_levels)
            .field("default_privilege", &self.default_privilege)
            .field("privileged_level", &self.privileged_level)
            .field("config_privilege", &self.config_privilege)
            .field("failed_when_contains", &self.failed_when_contains)
            .field("on_open_commands", &self.on_open_commands)
            .field("abandon_commands", &self.abandon_commands)
            .field(
                "behavior",
                &self.behavior.as_ref().map(|_| "<VendorBehavior>"),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_echo_and_prompt() {
        let raw = "show clock\r\n*10:01:02.123 UTC Mon Oct 5 2026\r\nrouter#";
        let out = DefaultBehavior.normalize_output(raw, "show clock");
        assert_eq!(out, "*10:01:02.123 UTC Mon Oct 5 2026");
    }

    #[test]
    fn test_normalize_prompt_only() {
        let out = DefaultBehavior.normalize_output("write memory\nrouter#", "write memory");
        assert_eq!(out, "");
    }

    #[test]
    fn test_detect_failure() {
        let platform = PlatformDefinition::new("test").with_failure_pattern("% Invalid input");
        assert_eq!(
            platform.detect_failure("   ^\n% Invalid input detected at '^' marker."),
            Some("% Invalid input")
        );
        assert_eq!(platform.detect_failure("Building configuration...\n[OK]"), None);
    }
}
