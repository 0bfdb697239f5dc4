// 测试用的脚本化传输：每个探测步骤的结果都预先写好，
// 并记录调用序列供断言使用。
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::common::targets::Target;
use crate::transport::{AuthOutcome, MethodSet, ProbeSession, Transport, TransportError};

pub struct ScriptedTransport {
    pub banner: Result<String, TransportError>,
    pub mismatch_reply: Result<bool, TransportError>,
    pub connect_error: Option<TransportError>,
    pub auth_none: AuthOutcome,
    pub methods: Result<MethodSet, TransportError>,
    /// 会被接受的 (username, password) 组合
    pub accepted: Vec<(String, String)>,
    pub exec_result: Result<Vec<u8>, TransportError>,
    pub http_result: Result<String, TransportError>,
    pub peer: Option<IpAddr>,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        ScriptedTransport {
            banner: Ok("SSH-2.0-OpenSSH_7.4".to_string()),
            mismatch_reply: Ok(true),
            connect_error: None,
            auth_none: AuthOutcome::Failure,
            methods: Ok(MethodSet::password_only()),
            accepted: Vec::new(),
            exec_result: Ok(b"ok\n".to_vec()),
            http_result: Ok("HTTP/1.1 200 OK".to_string()),
            peer: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl ScriptedTransport {
    pub fn accepting(username: &str, password: &str) -> Self {
        ScriptedTransport {
            accepted: vec![(username.to_string(), password.to_string())],
            ..ScriptedTransport::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called(&self, name: &str) -> bool {
        self.calls().iter().any(|c| c == name)
    }

    fn record(&self, name: &str) {
        self.calls.lock().unwrap().push(name.to_string());
    }
}

impl Transport for ScriptedTransport {
    fn read_banner(&self, _target: &Target, _timeout: Duration) -> Result<String, TransportError> {
        self.record("read_banner");
        self.banner.clone()
    }

    fn honeypot_check(
        &self,
        _target: &Target,
        _timeout: Duration,
    ) -> Result<bool, TransportError> {
        self.record("honeypot_check");
        self.mismatch_reply.clone()
    }

    fn open_session(
        &self,
        _target: &Target,
        _timeout: Duration,
    ) -> Result<Box<dyn ProbeSession>, TransportError> {
        self.record("open_session");
        if let Some(e) = &self.connect_error {
            return Err(e.clone());
        }
        Ok(Box::new(ScriptedSession {
            auth_none: self.auth_none.clone(),
            methods: self.methods.clone(),
            accepted: self.accepted.clone(),
            exec_result: self.exec_result.clone(),
            http_result: self.http_result.clone(),
            peer: self.peer,
            calls: Arc::clone(&self.calls),
        }))
    }
}

struct ScriptedSession {
    auth_none: AuthOutcome,
    methods: Result<MethodSet, TransportError>,
    accepted: Vec<(String, String)>,
    exec_result: Result<Vec<u8>, TransportError>,
    http_result: Result<String, TransportError>,
    peer: Option<IpAddr>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedSession {
    fn record(&self, name: &str) {
        self.calls.lock().unwrap().push(name.to_string());
    }
}

impl ProbeSession for ScriptedSession {
    fn auth_none(&mut self, _username: &str) -> AuthOutcome {
        self.record("auth_none");
        self.auth_none.clone()
    }

    fn auth_methods(&mut self, _username: &str) -> Result<MethodSet, TransportError> {
        self.record("auth_methods");
        self.methods.clone()
    }

    fn auth_password(&mut self, username: &str, password: &str) -> AuthOutcome {
        self.record("auth_password");
        if self
            .accepted
            .iter()
            .any(|(u, p)| u == username && p == password)
        {
            AuthOutcome::Success
        } else {
            AuthOutcome::Failure
        }
    }

    fn exec_command(&mut self, _command: &str) -> Result<Vec<u8>, TransportError> {
        self.record("exec_command");
        self.exec_result.clone()
    }

    fn http_probe(&mut self, _host: &str) -> Result<String, TransportError> {
        self.record("http_probe");
        self.http_result.clone()
    }

    fn peer_ip(&self) -> Option<IpAddr> {
        self.peer
    }
}
