// src/brute/ssh.rs
use log::debug;

use crate::brute::{AttemptOutcome, AttemptReport, SideEffect};
use crate::common::credentials::Credential;
use crate::common::targets::Target;
use crate::context::Options;
use crate::output;
use crate::transport::{AuthOutcome, ProbeSession, Transport};

/// 凭证里代表目标主机名的占位符，替换只在单次尝试内生效
pub const TARGET_PLACEHOLDER: &str = "$TARGET";

pub fn substitute(credential: &Credential, target: &Target) -> Credential {
    Credential {
        username: credential.username.replace(TARGET_PLACEHOLDER, &target.host),
        password: credential.password.replace(TARGET_PLACEHOLDER, &target.host),
    }
}

/// 对一对 (目标, 凭证) 执行一次登录尝试。不重试，
/// 所有失败路径都收敛为FAILURE，会话在返回时随Drop关闭。
pub fn run_attempt(
    transport: &dyn Transport,
    target: &Target,
    credential: &Credential,
    options: &Options,
) -> AttemptReport {
    let effective = substitute(credential, target);

    let mut session = match transport.open_session(target, options.timeout) {
        Ok(session) => session,
        Err(e) => {
            debug!("[!] Error connecting to {} {}.", target, e);
            return AttemptReport::failure(effective);
        }
    };

    // 目标虽经过检测过滤，这里仍不盲目信任：
    // 免认证或探测出错的服务器直接判失败
    match session.auth_none(&effective.username) {
        AuthOutcome::Success => {
            debug!("[!] {} - Server without authentication.", target);
            return AttemptReport::failure(effective);
        }
        AuthOutcome::Error(e) => {
            debug!("[!] {} - auth_none(): {}", target, e);
            return AttemptReport::failure(effective);
        }
        AuthOutcome::Failure => {}
    }

    let methods = match session.auth_methods(&effective.username) {
        Ok(methods) => methods,
        Err(e) => {
            debug!("[!] {} - auth_methods(): {}", target, e);
            return AttemptReport::failure(effective);
        }
    };

    if !methods.password {
        debug!(
            "[!] {} - The server doesn't accept password authentication method",
            target
        );
        return AttemptReport::failure(effective);
    }

    match session.auth_password(&effective.username, &effective.password) {
        AuthOutcome::Success => {}
        _ => return AttemptReport::failure(effective),
    }

    let side_effect = post_auth(session.as_mut(), target, options);

    AttemptReport {
        outcome: AttemptOutcome::Success,
        side_effect,
        credential: effective,
    }
}

/// 登录成功后的可选附加动作：远程命令或HTTP连通性检查
fn post_auth(session: &mut dyn ProbeSession, target: &Target, options: &Options) -> SideEffect {
    if let Some(command) = &options.command {
        match session.exec_command(command) {
            Ok(stdout) => {
                let ip = session
                    .peer_ip()
                    .map(|ip| ip.to_string())
                    .unwrap_or_else(|| target.host.clone());
                let path = output::command_log_path(&ip);
                match output::file::append_to_file(&path, &String::from_utf8_lossy(&stdout)) {
                    Ok(()) => SideEffect::CommandCaptured(path),
                    Err(e) => {
                        SideEffect::CommandFailed(format!("cannot write {}: {}", path.display(), e))
                    }
                }
            }
            Err(e) => SideEffect::CommandFailed(e.to_string()),
        }
    } else if let Some(host) = &options.check_http {
        match session.http_probe(host) {
            Ok(status) => SideEffect::TunnelConfirmed(status),
            Err(e) => SideEffect::TunnelFailed(e.to_string()),
        }
    } else {
        SideEffect::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::ScriptedTransport;
    use crate::transport::{MethodSet, TransportError};

    fn target() -> Target {
        Target::new("10.0.0.5", 22)
    }

    #[test]
    fn test_substitute_target_placeholder() {
        let credential = Credential::new("$TARGET", "$TARGET");
        let effective = substitute(&credential, &target());
        assert_eq!(effective.username, "10.0.0.5");
        assert_eq!(effective.password, "10.0.0.5");

        let credential = Credential::new("root", "pw-$TARGET-suffix");
        let effective = substitute(&credential, &target());
        assert_eq!(effective.username, "root");
        assert_eq!(effective.password, "pw-10.0.0.5-suffix");
    }

    #[test]
    fn test_successful_attempt() {
        let script = ScriptedTransport::accepting("root", "toor");
        let report = run_attempt(
            &script,
            &target(),
            &Credential::new("root", "toor"),
            &Options::default(),
        );

        assert_eq!(report.outcome, AttemptOutcome::Success);
        assert_eq!(report.side_effect, SideEffect::None);
    }

    #[test]
    fn test_substituted_credential_used_for_auth() {
        let script = ScriptedTransport::accepting("10.0.0.5", "10.0.0.5");
        let report = run_attempt(
            &script,
            &target(),
            &Credential::new("$TARGET", "$TARGET"),
            &Options::default(),
        );

        assert_eq!(report.outcome, AttemptOutcome::Success);
        assert_eq!(report.credential.username, "10.0.0.5");
        assert_eq!(report.credential.password, "10.0.0.5");
    }

    #[test]
    fn test_wrong_password_fails() {
        let script = ScriptedTransport::accepting("root", "toor");
        let report = run_attempt(
            &script,
            &target(),
            &Credential::new("root", "wrong"),
            &Options::default(),
        );

        assert_eq!(report.outcome, AttemptOutcome::Failure);
    }

    #[test]
    fn test_connect_failure_is_failure() {
        let script = ScriptedTransport {
            connect_error: Some(TransportError::Connect("timed out".to_string())),
            ..ScriptedTransport::default()
        };
        let report = run_attempt(
            &script,
            &target(),
            &Credential::new("root", "toor"),
            &Options::default(),
        );

        assert_eq!(report.outcome, AttemptOutcome::Failure);
        assert!(!script.called("auth_none"));
    }

    #[test]
    fn test_no_auth_server_never_tries_password() {
        let script = ScriptedTransport {
            auth_none: AuthOutcome::Success,
            accepted: vec![("root".to_string(), "toor".to_string())],
            ..ScriptedTransport::default()
        };
        let report = run_attempt(
            &script,
            &target(),
            &Credential::new("root", "toor"),
            &Options::default(),
        );

        assert_eq!(report.outcome, AttemptOutcome::Failure);
        assert!(!script.called("auth_password"));
    }

    #[test]
    fn test_missing_password_method_fails() {
        let script = ScriptedTransport {
            methods: Ok(MethodSet {
                publickey: true,
                ..MethodSet::default()
            }),
            accepted: vec![("root".to_string(), "toor".to_string())],
            ..ScriptedTransport::default()
        };
        let report = run_attempt(
            &script,
            &target(),
            &Credential::new("root", "toor"),
            &Options::default(),
        );

        assert_eq!(report.outcome, AttemptOutcome::Failure);
        assert!(!script.called("auth_password"));
    }

    #[test]
    fn test_command_failure_keeps_success_verdict() {
        let script = ScriptedTransport {
            accepted: vec![("root".to_string(), "toor".to_string())],
            exec_result: Err(TransportError::Protocol("channel denied".to_string())),
            ..ScriptedTransport::default()
        };
        let options = Options {
            command: Some("id".to_string()),
            ..Options::default()
        };
        let report = run_attempt(&script, &target(), &Credential::new("root", "toor"), &options);

        assert_eq!(report.outcome, AttemptOutcome::Success);
        assert!(matches!(report.side_effect, SideEffect::CommandFailed(_)));
    }

    #[test]
    fn test_http_tunnel_check() {
        let script = ScriptedTransport {
            accepted: vec![("root".to_string(), "toor".to_string())],
            ..ScriptedTransport::default()
        };
        let options = Options {
            check_http: Some("example.com".to_string()),
            ..Options::default()
        };
        let report = run_attempt(&script, &target(), &Credential::new("root", "toor"), &options);

        assert_eq!(report.outcome, AttemptOutcome::Success);
        assert_eq!(
            report.side_effect,
            SideEffect::TunnelConfirmed("HTTP/1.1 200 OK".to_string())
        );

        let script = ScriptedTransport {
            accepted: vec![("root".to_string(), "toor".to_string())],
            http_result: Err(TransportError::Io("channel closed".to_string())),
            ..ScriptedTransport::default()
        };
        let report = run_attempt(&script, &target(), &Credential::new("root", "toor"), &options);

        assert_eq!(report.outcome, AttemptOutcome::Success);
        assert!(matches!(report.side_effect, SideEffect::TunnelFailed(_)));
    }
}
