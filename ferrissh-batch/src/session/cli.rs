//! Vendor CLI driver.
//!
//! [`CliSession`] drives a vendor shell over any [`Shell`]: it waits for
//! prompts, walks the privilege graph of the platform definition, and
//! normalizes command output.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, warn};
use regex::Regex;
use secrecy::SecretString;

use super::privilege::{PrivilegeManager, TransitionInfo};
use super::response::Response;
use super::{DeviceSession, SessionSettings};
use crate::credentials::Credentials;
use crate::error::{ChannelError, DriverError, SessionError};
use crate::platform::{DefaultBehavior, PlatformDefinition, SaveProcedure, SendMode, VendorBehavior};
use crate::transport::Shell;

/// An interactive CLI session driving one device's vendor shell.
pub struct CliSession<T> {
    transport: T,
    platform: PlatformDefinition,
    behavior: Arc<dyn VendorBehavior>,
    privileges: PrivilegeManager,

    /// Matches the prompt of any privilege level.
    prompt_pattern: Regex,

    /// Last prompt seen.
    last_prompt: String,

    username: String,
    password: SecretString,
    timeout: Duration,
    save_timeout: Duration,
}

impl<T: Shell> CliSession<T> {
    /// Wait for the first prompt on an authenticated shell and run the
    /// platform's on-open commands. The shell is closed if that fails.
    pub async fn start(
        transport: T,
        platform: PlatformDefinition,
        credentials: &Credentials,
        settings: &SessionSettings,
    ) -> Result<Self, SessionError> {
        let prompt_pattern = combined_prompt_pattern(&platform).map_err(ChannelError::from)?;
        let behavior = platform
            .behavior
            .clone()
            .unwrap_or_else(|| Arc::new(DefaultBehavior));
        let privileges = PrivilegeManager::new(platform.privilege_levels.clone());

        let mut session = Self {
            transport,
            platform,
            behavior,
            privileges,
            prompt_pattern,
            last_prompt: String::new(),
            username: credentials.username.clone(),
            password: credentials.password_copy(),
            timeout: settings.timeout,
            save_timeout: settings.save_timeout,
        };

        match session.on_open().await {
            Ok(()) => Ok(session),
            Err(err) => {
                let host = session.transport.host().to_string();
                if let Err(close_err) = session.transport.close().await {
                    debug!("{host}: close after failed open: {close_err}");
                }
                Err(err)
            }
        }
    }

    async fn on_open(&mut self) -> Result<(), SessionError> {
        let read = self
            .transport
            .read_until(&self.prompt_pattern, self.timeout)
            .await?;

        if self.privileges.observe_prompt(&read.prompt).is_none() {
            return Err(DriverError::UnknownPrivilege { prompt: read.prompt }.into());
        }
        debug!(
            "{}: initial prompt '{}' ({})",
            self.transport.host(),
            read.prompt,
            self.privileges.current().unwrap_or_default()
        );
        self.last_prompt = read.prompt;

        for command in self.platform.on_open_commands.clone() {
            self.send_timed(&command, self.timeout).await?;
        }
        Ok(())
    }

    /// Send one line and wait for any prompt.
    async fn send_timed(&mut self, command: &str, timeout: Duration) -> Result<Response, SessionError> {
        let start = Instant::now();
        debug!("{}: send '{}'", self.transport.host(), command);

        self.transport.send(command).await?;
        let read = self.transport.read_until(&self.prompt_pattern, timeout).await?;
        self.privileges.observe_prompt(&read.prompt);
        self.last_prompt = read.prompt.clone();

        let result = self.behavior.normalize_output(&read.data, command);
        let failure = self.platform.detect_failure(&result).map(str::to_string);
        if let Some(ref pattern) = failure {
            debug!("{}: '{}' output contains '{}'", self.transport.host(), command, pattern);
        }

        Ok(Response::new(command, result, read.data, read.prompt, start.elapsed()).with_failure(failure))
    }

    /// Walk the privilege graph from the current level to `target`.
    async fn acquire_privilege(&mut self, target: &str) -> Result<(), SessionError> {
        let current = self
            .privileges
            .current()
            .map(str::to_string)
            .ok_or_else(|| DriverError::UnknownPrivilege {
                prompt: self.last_prompt.clone(),
            })?;

        if current == target {
            return Ok(());
        }

        let path = self.privileges.find_path(&current, target)?;
        for step in path.windows(2) {
            let (from, to) = (&step[0], &step[1]);
            let transition = self
                .privileges
                .get_transition(from, to)
                .ok_or_else(|| DriverError::NoPrivilegePath {
                    from: from.clone(),
                    to: to.clone(),
                })?;

            debug!(
                "{}: {} -> {} via '{}'",
                self.transport.host(),
                from,
                to,
                transition.command
            );
            self.transition(&transition, to).await?;
        }

        Ok(())
    }

    /// Run one transition, answering password and confirmation prompts.
    async fn transition(&mut self, transition: &TransitionInfo, to: &str) -> Result<(), SessionError> {
        let expect = transition_pattern(&self.prompt_pattern, transition).map_err(ChannelError::from)?;
        self.transport.send(&transition.command).await?;

        let mut password_sent = false;
        let mut confirmed = false;

        loop {
            let read = self.transport.read_until(&expect, self.timeout).await?;
            let line = read.prompt;

            if let Some(ref auth) = transition.auth_prompt {
                if auth.is_match(&line) {
                    if password_sent {
                        return Err(self.rejected());
                    }
                    self.transport.send_secret(&self.password).await?;
                    password_sent = true;
                    continue;
                }
            }

            if let Some((ref question, ref answer)) = transition.confirm {
                if !confirmed && question.is_match(&line) {
                    self.transport.send(answer).await?;
                    confirmed = true;
                    continue;
                }
            }

            self.privileges.observe_prompt(&line);
            self.last_prompt = line;

            if self.privileges.is_at(to) {
                return Ok(());
            }
            if password_sent {
                return Err(self.rejected());
            }
            return Err(DriverError::PrivilegeAcquisitionFailed {
                target: to.to_string(),
            }
            .into());
        }
    }

    fn rejected(&self) -> SessionError {
        warn!("{}: enable password rejected", self.transport.host());
        SessionError::AuthenticationFailure {
            user: self.username.clone(),
        }
    }

    /// Level save commands and display commands run from.
    fn privileged_level(&self) -> String {
        self.platform
            .privileged_level
            .clone()
            .unwrap_or_else(|| self.platform.default_privilege.clone())
    }

    /// Discard uncommitted changes and leave configuration mode.
    async fn leave_configuration(&mut self) -> Result<(), SessionError> {
        if !self.privileges.is_at(&self.platform.config_privilege) {
            return Ok(());
        }
        for command in self.platform.abandon_commands.clone() {
            self.send_timed(&command, self.timeout).await?;
        }
        let default = self.platform.default_privilege.clone();
        self.acquire_privilege(&default).await
    }
}

impl<T: Shell> DeviceSession for CliSession<T> {
    async fn enable(&mut self) -> Result<(), SessionError> {
        match self.platform.privileged_level.clone() {
            Some(level) => self.acquire_privilege(&level).await,
            None => Ok(()),
        }
    }

    async fn send_config_set(&mut self, lines: &[String], mode: SendMode) -> Result<Response, SessionError> {
        let original = self.privileges.current().map(str::to_string);
        let config = self.platform.config_privilege.clone();
        self.acquire_privilege(&config).await?;

        let start = Instant::now();
        let mut raw_result = self.last_prompt.clone();
        let mut results = Vec::with_capacity(lines.len());
        let mut failure = None;

        for line in lines {
            let response = self.send_timed(line, self.timeout).await?;
            raw_result.push_str(&response.raw_result);
            if failure.is_none() {
                failure = response
                    .failure_message
                    .map(|pattern| format!("'{line}': {pattern}"));
            }
            results.push(response.result);
        }

        if mode == SendMode::ExitConfig {
            let back = original
                .filter(|level| *level != config)
                .unwrap_or_else(|| self.platform.default_privilege.clone());
            self.acquire_privilege(&back).await?;
        }

        let results: Vec<&str> = results.iter().map(String::as_str).filter(|r| !r.is_empty()).collect();
        Ok(Response::new(
            lines.join("\n"),
            results.join("\n"),
            raw_result,
            self.last_prompt.clone(),
            start.elapsed(),
        )
        .with_failure(failure))
    }

    async fn send_command(&mut self, command: &str) -> Result<Response, SessionError> {
        self.send_timed(command, self.timeout).await
    }

    async fn save(&mut self, procedure: &SaveProcedure) -> Result<Response, SessionError> {
        match *procedure {
            SaveProcedure::Command(command) => {
                let level = self.privileged_level();
                self.acquire_privilege(&level).await?;
                self.send_timed(command, self.save_timeout).await
            }
            SaveProcedure::Commit {
                commit,
                commit_and_exit,
            } => {
                let config = self.platform.config_privilege.clone();
                if self.privileges.is_at(&config) {
                    return self.send_timed(commit_and_exit, self.save_timeout).await;
                }

                self.acquire_privilege(&config).await?;
                let response = self.send_timed(commit, self.save_timeout).await?;
                let default = self.platform.default_privilege.clone();
                self.acquire_privilege(&default).await?;
                Ok(response)
            }
        }
    }

    async fn disconnect(mut self) -> Result<(), SessionError> {
        if !self.transport.is_closed() {
            if let Err(e) = self.leave_configuration().await {
                warn!("{}: could not leave configuration mode: {}", self.transport.host(), e);
            }
        }
        debug!("{}: closing session", self.transport.host());
        self.transport.close().await
    }
}

/// A pattern matching the prompt of any privilege level.
pub fn combined_prompt_pattern(platform: &PlatformDefinition) -> Result<Regex, regex::Error> {
    let combined = platform
        .privilege_levels
        .values()
        .map(|level| format!("(?:{})", level.pattern.as_str()))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&combined)
}

/// The prompt pattern extended with a transition's password and
/// confirmation prompts.
fn transition_pattern(prompt: &Regex, transition: &TransitionInfo) -> Result<Regex, regex::Error> {
    let mut alternatives = vec![format!("(?:{})", prompt.as_str())];
    if let Some(ref auth) = transition.auth_prompt {
        alternatives.push(format!("(?:{})", auth.as_str()));
    }
    if let Some((ref question, _)) = transition.confirm {
        alternatives.push(format!("(?:{})", question.as_str()));
    }
    Regex::new(&alternatives.join("|"))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::platform::{DeviceKind, vendors};
    use crate::transport::ReadResult;
    use crate::channel::PatternBuffer;

    /// A shell that feeds each sent line to a device model and buffers
    /// the model's reply. Reads that find no prompt time out at once.
    struct ScriptedShell {
        buffer: PatternBuffer,
        device: Box<dyn FnMut(&str) -> String + Send>,
        sent: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedShell {
        fn new(banner: &str, device: impl FnMut(&str) -> String + Send + 'static) -> (Self, Arc<Mutex<Vec<String>>>) {
            let sent = Arc::new(Mutex::new(Vec::new()));
            let mut buffer = PatternBuffer::default();
            buffer.extend(banner.as_bytes());
            let shell = Self {
                buffer,
                device: Box::new(device),
                sent: sent.clone(),
            };
            (shell, sent)
        }
    }

    impl Shell for ScriptedShell {
        async fn send(&mut self, input: &str) -> Result<(), SessionError> {
            self.sent.lock().unwrap().push(input.to_string());
            let reply = (self.device)(input);
            self.buffer.extend(reply.as_bytes());
            Ok(())
        }

        async fn send_secret(&mut self, secret: &SecretString) -> Result<(), SessionError> {
            use secrecy::ExposeSecret;
            self.send(secret.expose_secret()).await
        }

        async fn read_until(&mut self, pattern: &Regex, timeout: Duration) -> Result<ReadResult, SessionError> {
            if !self.buffer.tail_contains(pattern) {
                return Err(ChannelError::PatternTimeout(timeout).into());
            }
            let prompt = self.buffer.last_line().to_string();
            Ok(ReadResult {
                data: self.buffer.take(),
                prompt,
            })
        }

        fn host(&self) -> &str {
            "lab"
        }

        fn is_closed(&self) -> bool {
            false
        }

        async fn close(self) -> Result<(), SessionError> {
            self.sent.lock().unwrap().push("<close>".to_string());
            Ok(())
        }
    }

    /// JUNOS model: a candidate configuration that is either committed or
    /// dirty, and a confirmation when leaving with uncommitted changes.
    fn junos() -> impl FnMut(&str) -> String + Send {
        let mut configuring = false;
        let mut dirty = false;
        move |line: &str| {
            let output = match line {
                "configure" => {
                    configuring = true;
                    "Entering configuration mode\n".to_string()
                }
                "commit" => {
                    dirty = false;
                    "commit complete\n".to_string()
                }
                "commit and-quit" => {
                    dirty = false;
                    configuring = false;
                    "commit complete\nExiting configuration mode\n".to_string()
                }
                "rollback 0" => {
                    dirty = false;
                    "load complete\n".to_string()
                }
                "exit configuration-mode" if dirty => {
                    return format!(
                        "{line}\r\nThe configuration has been changed but not committed\r\n\
                         Exit with uncommitted changes? [yes,no] (yes) "
                    );
                }
                "exit configuration-mode" | "yes" => {
                    configuring = false;
                    "Exiting configuration mode\n".to_string()
                }
                _ if configuring => {
                    dirty = true;
                    String::new()
                }
                _ => String::new(),
            };
            let prompt = if configuring {
                "\n[edit]\nnetops@mx1# "
            } else {
                "\nnetops@mx1> "
            };
            format!("{line}\r\n{output}{prompt}")
        }
    }

    /// IOS model with an enable secret.
    fn ios(enable_secret: &'static str) -> impl FnMut(&str) -> String + Send {
        let mut prompt = "lab-sw1>";
        let mut awaiting_secret = false;
        move |line: &str| {
            if awaiting_secret {
                awaiting_secret = false;
                if line == enable_secret {
                    prompt = "lab-sw1#";
                    return format!("\r\n{prompt}");
                }
                return "\r\n% Access denied\r\n\r\nPassword: ".to_string();
            }
            let output = match line {
                "enable" => {
                    awaiting_secret = true;
                    return "enable\r\nPassword: ".to_string();
                }
                "configure terminal" => {
                    prompt = "lab-sw1(config)#";
                    "Enter configuration commands, one per line.  End with CNTL/Z.\n"
                }
                "end" | "disable" => {
                    prompt = if line == "end" { "lab-sw1#" } else { "lab-sw1>" };
                    ""
                }
                "write memory" => "Building configuration...\n[OK]\n",
                "vlan abc" => "                ^\n% Invalid input detected at '^' marker.\n",
                _ => "",
            };
            format!("{line}\r\n{output}{prompt}")
        }
    }

    async fn start(
        kind: DeviceKind,
        banner: &str,
        device: impl FnMut(&str) -> String + Send + 'static,
    ) -> (CliSession<ScriptedShell>, Arc<Mutex<Vec<String>>>) {
        let (shell, sent) = ScriptedShell::new(banner, device);
        let platform = (kind.profile().definition)();
        let creds = Credentials::new("netops", "secret");
        let session = CliSession::start(shell, platform, &creds, &SessionSettings::default())
            .await
            .unwrap();
        (session, sent)
    }

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn sent(log: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn test_junos_change_committed_from_configuration_mode() {
        let (mut session, log) = start(DeviceKind::Juniper, "Last login: today\r\n\r\nnetops@mx1> ", junos()).await;

        session.enable().await.unwrap();
        let response = session
            .send_config_set(&lines(&["set vlans v10 vlan-id 10"]), SendMode::StayInConfig)
            .await
            .unwrap();
        assert!(response.is_success());
        assert!(session.privileges.is_at("configuration"));

        let save = DeviceKind::Juniper.profile().save;
        let response = session.save(&save).await.unwrap();
        assert_eq!(response.command, "commit and-quit");
        assert!(response.result.contains("commit complete"));
        session.disconnect().await.unwrap();

        assert_eq!(
            sent(&log),
            lines(&[
                "set cli screen-length 0",
                "set cli screen-width 511",
                "configure",
                "set vlans v10 vlan-id 10",
                "commit and-quit",
                "<close>",
            ])
        );
    }

    #[tokio::test]
    async fn test_junos_rollback_exits_then_commits() {
        let (mut session, log) = start(DeviceKind::Juniper, "netops@mx1> ", junos()).await;

        session
            .send_config_set(&lines(&["delete vlans v10"]), SendMode::ExitConfig)
            .await
            .unwrap();
        assert!(session.privileges.is_at("exec"));

        let save = DeviceKind::Juniper.profile().save;
        session.save(&save).await.unwrap();
        assert!(session.privileges.is_at("exec"));
        session.disconnect().await.unwrap();

        assert_eq!(
            sent(&log)[2..],
            lines(&[
                "configure",
                "delete vlans v10",
                "exit configuration-mode",
                "yes",
                "configure",
                "commit",
                "exit configuration-mode",
                "<close>",
            ])
        );
    }

    #[tokio::test]
    async fn test_junos_unsaved_change_is_abandoned_on_disconnect() {
        let (mut session, log) = start(DeviceKind::Juniper, "netops@mx1> ", junos()).await;

        session
            .send_config_set(&lines(&["set vlans v10 vlan-id 10"]), SendMode::StayInConfig)
            .await
            .unwrap();
        session.disconnect().await.unwrap();

        assert_eq!(
            sent(&log)[2..],
            lines(&[
                "configure",
                "set vlans v10 vlan-id 10",
                "rollback 0",
                "exit configuration-mode",
                "<close>",
            ])
        );
    }

    #[tokio::test]
    async fn test_ios_enable_configure_and_write() {
        let (mut session, log) = start(DeviceKind::CiscoIos, "\r\nlab-sw1>", ios("secret")).await;

        session.enable().await.unwrap();
        assert!(session.privileges.is_at("privilege_exec"));

        let response = session
            .send_config_set(&lines(&["vlan 10", "name users"]), SendMode::ExitConfig)
            .await
            .unwrap();
        assert!(response.is_success());
        assert!(response.raw_result.contains("lab-sw1(config)#"));
        assert!(session.privileges.is_at("privilege_exec"));

        let response = session.save(&DeviceKind::CiscoIos.profile().save).await.unwrap();
        assert!(response.is_success());
        assert!(response.result.contains("[OK]"));

        let response = session.send_command("show vlan brief").await.unwrap();
        assert_eq!(response.prompt, "lab-sw1#");
        session.disconnect().await.unwrap();

        assert_eq!(
            sent(&log),
            lines(&[
                "terminal length 0",
                "terminal width 512",
                "enable",
                "secret",
                "configure terminal",
                "vlan 10",
                "name users",
                "end",
                "write memory",
                "show vlan brief",
                "<close>",
            ])
        );
    }

    #[tokio::test]
    async fn test_ios_rejected_enable_secret() {
        let (mut session, log) = start(DeviceKind::CiscoIos, "lab-sw1>", ios("other")).await;

        let err = session.enable().await.unwrap_err();
        assert!(matches!(err, SessionError::AuthenticationFailure { ref user } if user == "netops"));
        assert!(err.is_recoverable());
        // the password is sent once, never retried
        assert_eq!(sent(&log).iter().filter(|l| *l == "secret").count(), 1);
    }

    #[tokio::test]
    async fn test_ios_rejected_line_is_reported() {
        let (mut session, _) = start(DeviceKind::CiscoIos, "lab-sw1>", ios("secret")).await;

        session.enable().await.unwrap();
        let response = session
            .send_config_set(&lines(&["vlan abc", "name users"]), SendMode::ExitConfig)
            .await
            .unwrap();
        assert!(!response.is_success());
        assert_eq!(
            response.failure_message.as_deref(),
            Some("'vlan abc': % Invalid input detected")
        );
    }

    #[tokio::test]
    async fn test_unknown_first_prompt_fails_open_and_closes() {
        let (shell, log) = ScriptedShell::new("Welcome\r\nrouter$ ", |line: &str| format!("{line}\r\n"));
        let platform = vendors::cisco_ios::platform();
        let creds = Credentials::new("netops", "secret");

        let err = CliSession::start(shell, platform, &creds, &SessionSettings::default())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, SessionError::ConnectionTimeout { .. }));
        assert_eq!(sent(&log), lines(&["<close>"]));
    }

    #[test]
    fn test_combined_prompt_matches_every_level() {
        let pattern = combined_prompt_pattern(&vendors::cisco_ios::platform()).unwrap();
        assert!(pattern.is_match("core-sw1>"));
        assert!(pattern.is_match("core-sw1#"));
        assert!(pattern.is_match("core-sw1(config-if)#"));
        assert!(!pattern.is_match("Building configuration..."));

        let pattern = combined_prompt_pattern(&vendors::juniper::platform()).unwrap();
        assert!(pattern.is_match("netops@mx1>"));
        assert!(pattern.is_match("[edit]\nnetops@mx1#"));
    }

    #[test]
    fn test_transition_pattern_includes_password_prompt() {
        let platform = vendors::cisco_ios::platform();
        let prompt = combined_prompt_pattern(&platform).unwrap();
        let manager = PrivilegeManager::new(platform.privilege_levels);
        let transition = manager.get_transition("exec", "privilege_exec").unwrap();

        let expect = transition_pattern(&prompt, &transition).unwrap();
        assert!(expect.is_match("Password:"));
        assert!(expect.is_match("core-sw1#"));
    }

    #[test]
    fn test_transition_pattern_includes_confirmation() {
        let platform = vendors::juniper::platform();
        let prompt = combined_prompt_pattern(&platform).unwrap();
        let manager = PrivilegeManager::new(platform.privilege_levels);
        let transition = manager.get_transition("configuration", "exec").unwrap();

        let expect = transition_pattern(&prompt, &transition).unwrap();
        assert!(expect.is_match("Exit with uncommitted changes? [yes,no] (yes)"));
    }
}
