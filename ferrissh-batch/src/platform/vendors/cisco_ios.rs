//! Cisco IOS / IOS-XE platform definition.
//!
//! Prompt patterns are adapted from [scrapli](https://github.com/carlmontanari/scrapli).
//!
//! # Prompt Examples
//!
//! ```text
//! router>                      # exec mode
//! router#                      # privilege_exec mode
//! router(config)#              # configuration mode
//! router(config-if)#           # configuration sub-mode
//! ```
//!
//! # Privilege Graph
//!
//! ```text
//! ┌──────┐  enable     ┌────────────────┐  configure terminal  ┌───────────────┐
//! │ exec ├──────────────► privilege_exec ├──────────────────────► configuration │
//! │  >   │   disable   │       #        │        end           │  (config*)#   │
//! └──────┘◄────────────┴────────────────┘◄─────────────────────┴───────────────┘
//! ```

use crate::platform::{PlatformDefinition, PrivilegeLevel};

/// Platform name for Cisco IOS.
pub const PLATFORM_NAME: &str = "cisco_ios";

/// Create the Cisco IOS platform definition.
pub fn platform() -> PlatformDefinition {
    let exec = PrivilegeLevel::new("exec", r"(?mi)^[\w.\-@/:]{1,63}>\s?$").unwrap();

    let privilege_exec = PrivilegeLevel::new("privilege_exec", r"(?mi)^[\w.\-@/:]{1,63}#\s?$")
        .unwrap()
        .with_parent("exec")
        .with_escalate("enable")
        .with_deescalate("disable")
        .with_auth(r"(?mi)^(?:enable\s)?password:\s?$")
        .unwrap()
        .with_not_contains("(conf");

    let configuration = PrivilegeLevel::new(
        "configuration",
        r"(?mi)^[\w.\-@/:]{1,63}\(conf[\w.\-@/:+]{0,63}\)#\s?$",
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
        .with_failure_pattern("% Ambiguous command")
        .with_failure_pattern("% Incomplete command")
        .with_failure_pattern("% Invalid input detected")
        .with_failure_pattern("% Unknown command")
        .with_on_open_command("terminal length 0")
        .with_on_open_command("terminal width 512")
        .with_terminal_size(511, 24)
}
