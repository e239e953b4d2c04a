//! Juniper JUNOS platform definition.
//!
//! Two privilege levels matter for pushing configuration:
//! - `exec` - Operational mode with `>` prompt
//! - `configuration` - Configuration mode with `#` prompt
//!
//! Login lands in operational mode, which is already privileged, so there
//! is nothing to escalate. Changes go to the candidate configuration and
//! become active on `commit`.
//!
//! # Prompt Examples
//!
//! ```text
//! user@router>              # exec mode
//! {master:0}                # routing-engine indicator (separate line)
//! user@router>              # exec prompt on next line
//! [edit]                    # config context (separate line)
//! user@router#              # configuration mode
//! ```

use std::sync::Arc;

use crate::platform::{PlatformDefinition, PrivilegeLevel, VendorBehavior};

/// Platform name for Juniper JUNOS.
pub const PLATFORM_NAME: &str = "juniper_junos";

/// Create the Juniper JUNOS platform definition.
///
/// Prompt patterns adapted from scrapli's JunOS driver.
pub fn platform() -> PlatformDefinition {
    let exec = PrivilegeLevel::new(
        "exec",
        r"(?mi)^(\{\w+(:(\w+)?\d)?\}\n)?[\w\-@()/:\.]{1,63}>\s?$",
    )
    .unwrap();

    let configuration = PrivilegeLevel::new(
        "configuration",
        r"(?mi)^(\{\w+(:(\w+)?\d)?\}\[edit\]\n)?[\w\-@()/:\.]{1,63}#\s?$",
    )
    .unwrap()
    .with_parent("exec")
    .with_escalate("configure")
    .with_deescalate("exit configuration-mode")
    .with_deescalate_confirm(r"(?i)exit with uncommitted changes\?", "yes")
    .unwrap();

    PlatformDefinition::new(PLATFORM_NAME)
        .with_privilege(exec)
        .with_privilege(configuration)
        .with_default_privilege("exec")
        .with_config_privilege("configuration")
        .with_failure_pattern("unknown command")
        .with_failure_pattern("syntax error")
        .with_failure_pattern("error:")
        .with_failure_pattern("missing argument")
        .with_failure_pattern("is ambiguous")
        .with_failure_pattern("No valid completions")
        .with_on_open_command("set cli screen-length 0")
        .with_on_open_command("set cli screen-width 511")
        .with_abandon_command("rollback 0")
        .with_terminal_size(511, 24)
        .with_behavior(Arc::new(JuniperBehavior))
}

/// Juniper JUNOS-specific behavior.
pub struct JuniperBehavior;

impl VendorBehavior for JuniperBehavior {
    fn post_process_output(&self, output: &str) -> String {
        // JUNOS prints the [edit] context before every config-mode prompt
        output
            .lines()
            .filter(|line| !line.trim().starts_with("[edit"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
