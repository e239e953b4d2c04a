//! Cisco ASA platform definition.
//!
//! Same privilege graph as IOS. ASA hostnames can carry a
//! failover/context suffix (`asa/pri/act#`) and paging is disabled with
//! `terminal pager 0`.

use crate::platform::{PlatformDefinition, PrivilegeLevel};

/// Platform name for Cisco ASA.
pub const PLATFORM_NAME: &str = "cisco_asa";

/// Create the Cisco ASA platform definition.
pub fn platform() -> PlatformDefinition {
    let exec = PrivilegeLevel::new("exec", r"(?mi)^[\w.\-@/:]{1,63}>\s?$").unwrap();

    let privilege_exec = PrivilegeLevel::new("privilege_exec", r"(?mi)^[\w.\-@/:]{1,63}#\s?$")
        .unwrap()
        .with_parent("exec")
        .with_escalate("enable")
        .with_deescalate("disable")
        .with_auth(r"(?mi)^(?:enable\s)?password:\s?$")
        .unwrap()
        .with_not_contains("(config");

    let configuration = PrivilegeLevel::new(
        "configuration",
        r"(?mi)^[\w.\-@/:]{1,63}\(config[\w.\-@/:+]{0,63}\)#\s?$",
    )
    .unwrap()
    .with_parent("privilege_exec")
    .with_escalate("configure terminal")
    .with_deescalate("end");

    PlatformDefinition::new(PLATFORM_NAME)
        .with_privilege(exec)
        .with_privilege(privilege_exec)
        .with_privilege(configuration)
        .with_default_privilege("exec")
        .with_privileged_level("privilege_exec")
        .with_config_privilege("configuration")
        .with_failure_pattern("ERROR: % Invalid input detected")
        .with_failure_pattern("ERROR: % Incomplete command")
        .with_failure_pattern("ERROR: % Ambiguous command")
        .with_on_open_command("terminal pager 0")
        .with_terminal_size(511, 24)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failover_prompts() {
        let platform = platform();
        let privileged = platform.get_privilege("privilege_exec").unwrap();
        let config = platform.get_privilege("configuration").unwrap();

        assert!(privileged.matches("asa/pri/act#"));
        assert!(privileged.matches("fw01# "));
        assert!(!privileged.matches("fw01(config)#"));

        assert!(config.matches("asa/pri/act(config)#"));
        assert!(config.matches("fw01(config-network-object)#"));
    }

    #[test]
    fn test_pager_disabled_on_open() {
        let platform = platform();
        assert_eq!(platform.on_open_commands, vec!["terminal pager 0".to_string()]);
    }
}
