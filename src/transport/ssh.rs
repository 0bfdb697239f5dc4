// src/transport/ssh.rs
use std::io::{Read, Write};
use std::net::{IpAddr, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use log::debug;
use ssh2::{DisconnectCode, Session};

use crate::common::targets::Target;
use crate::transport::{AuthOutcome, MethodSet, ProbeSession, Transport, TransportError};

/// 标准OpenSSH对无效标识串的拒绝回复
const PROTOCOL_MISMATCH: &str = "Protocol mismatch.";

/// 触发序列：三段不是SSH标识串的明文行。
/// 真正的OpenSSH会回复"Protocol mismatch."并断开，
/// 伪装成SSH的蜜罐通常给出其他响应或干脆不响应。
const MISMATCH_TRIGGER: [&[u8]; 3] = [b"\r\n", b"ping\r\n", b"\r\n"];

pub struct SshTransport;

impl SshTransport {
    pub fn new() -> Self {
        SshTransport
    }
}

impl Default for SshTransport {
    fn default() -> Self {
        SshTransport::new()
    }
}

fn resolve(target: &Target) -> Result<SocketAddr, TransportError> {
    format!("{}:{}", target.host, target.port)
        .to_socket_addrs()
        .map_err(|e| TransportError::Connect(format!("cannot resolve {}: {}", target.host, e)))?
        .next()
        .ok_or_else(|| TransportError::Connect(format!("cannot resolve {}", target.host)))
}

/// 裸TCP连接，读写都以同一个超时为界
fn connect_raw(target: &Target, timeout: Duration) -> Result<TcpStream, TransportError> {
    let addr = resolve(target)?;
    let stream = TcpStream::connect_timeout(&addr, timeout)
        .map_err(|e| TransportError::Connect(e.to_string()))?;
    stream
        .set_read_timeout(Some(timeout))
        .map_err(|e| TransportError::Io(e.to_string()))?;
    stream
        .set_write_timeout(Some(timeout))
        .map_err(|e| TransportError::Io(e.to_string()))?;
    Ok(stream)
}

/// 读一次并取首行，SSH标识串总在单个报文里
fn read_line(stream: &mut TcpStream) -> Result<String, TransportError> {
    let mut buffer = [0u8; 256];
    let n = match stream.read(&mut buffer) {
        Ok(n) => n,
        Err(e) if matches!(
            e.kind(),
            std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
        ) =>
        {
            return Err(TransportError::NoBanner)
        }
        Err(e) => return Err(TransportError::Io(e.to_string())),
    };
    if n == 0 {
        return Err(TransportError::NoBanner);
    }

    let text = String::from_utf8_lossy(&buffer[..n]);
    let line = text.lines().next().unwrap_or("").trim().to_string();
    if line.is_empty() {
        return Err(TransportError::NoBanner);
    }
    Ok(line)
}

impl Transport for SshTransport {
    fn read_banner(&self, target: &Target, timeout: Duration) -> Result<String, TransportError> {
        let mut stream = connect_raw(target, timeout)?;
        read_line(&mut stream)
    }

    fn honeypot_check(
        &self,
        target: &Target,
        timeout: Duration,
    ) -> Result<bool, TransportError> {
        let mut stream = connect_raw(target, timeout)?;

        // 服务器先发标识串，这里只消费不检查
        read_line(&mut stream)?;

        // 有的服务器在第一段就断开，写失败不算结论
        for chunk in MISMATCH_TRIGGER {
            if stream.write_all(chunk).is_err() {
                break;
            }
        }

        let mut buffer = [0u8; 256];
        match stream.read(&mut buffer) {
            Ok(n) => Ok(String::from_utf8_lossy(&buffer[..n]).contains(PROTOCOL_MISMATCH)),
            Err(e) if matches!(
                e.kind(),
                std::io::ErrorKind::WouldBlock
                    | std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::ConnectionReset
            ) =>
            {
                // 不回应或直接重置：没有给出标准拒绝
                Ok(false)
            }
            Err(e) => Err(TransportError::Io(e.to_string())),
        }
    }

    fn open_session(
        &self,
        target: &Target,
        timeout: Duration,
    ) -> Result<Box<dyn ProbeSession>, TransportError> {
        let addr = resolve(target)?;
        let tcp = TcpStream::connect_timeout(&addr, timeout)
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        let peer = tcp.peer_addr().ok().map(|a| a.ip());

        let mut session =
            Session::new().map_err(|e| TransportError::Protocol(e.to_string()))?;
        // 后续所有阻塞调用都以配置的超时为界
        session.set_timeout(timeout.as_millis() as u32);
        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|e| TransportError::Connect(format!("handshake: {}", e)))?;

        Ok(Box::new(Ssh2Session {
            session,
            peer,
            methods: None,
        }))
    }
}

struct Ssh2Session {
    session: Session,
    peer: Option<IpAddr>,
    /// auth_methods的查询本身就是一次none认证，缓存列表避免重复探测
    methods: Option<MethodSet>,
}

impl ProbeSession for Ssh2Session {
    fn auth_none(&mut self, username: &str) -> AuthOutcome {
        match self.session.auth_methods(username) {
            Ok(list) => {
                let methods = MethodSet::parse(list);
                self.methods = Some(methods);
                if self.session.authenticated() {
                    AuthOutcome::Success
                } else {
                    AuthOutcome::Failure
                }
            }
            Err(e) => {
                if self.session.authenticated() {
                    AuthOutcome::Success
                } else {
                    AuthOutcome::Error(e.to_string())
                }
            }
        }
    }

    fn auth_methods(&mut self, username: &str) -> Result<MethodSet, TransportError> {
        if let Some(methods) = self.methods {
            return Ok(methods);
        }

        match self.session.auth_methods(username) {
            Ok(list) => {
                let methods = MethodSet::parse(list);
                self.methods = Some(methods);
                Ok(methods)
            }
            Err(e) => Err(TransportError::Protocol(e.to_string())),
        }
    }

    fn auth_password(&mut self, username: &str, password: &str) -> AuthOutcome {
        match self.session.userauth_password(username, password) {
            Ok(()) if self.session.authenticated() => AuthOutcome::Success,
            Ok(()) => AuthOutcome::Failure,
            Err(e) => {
                debug!("userauth_password: {}", e);
                AuthOutcome::Failure
            }
        }
    }

    fn exec_command(&mut self, command: &str) -> Result<Vec<u8>, TransportError> {
        let mut channel = self
            .session
            .channel_session()
            .map_err(|e| TransportError::Protocol(e.to_string()))?;
        channel
            .exec(command)
            .map_err(|e| TransportError::Protocol(e.to_string()))?;

        let mut output = Vec::new();
        channel
            .read_to_end(&mut output)
            .map_err(|e| TransportError::Io(e.to_string()))?;
        let _ = channel.wait_close();

        Ok(output)
    }

    fn http_probe(&mut self, host: &str) -> Result<String, TransportError> {
        let mut channel = self
            .session
            .channel_direct_tcpip(host, 80, None)
            .map_err(|e| TransportError::Protocol(e.to_string()))?;

        let request = format!(
            "HEAD / HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
            host
        );
        channel
            .write_all(request.as_bytes())
            .map_err(|e| TransportError::Io(e.to_string()))?;

        let mut buffer = [0u8; 1024];
        let n = channel
            .read(&mut buffer)
            .map_err(|e| TransportError::Io(e.to_string()))?;
        if n == 0 {
            return Err(TransportError::Io("empty response".to_string()));
        }

        let response = String::from_utf8_lossy(&buffer[..n]);
        Ok(response.lines().next().unwrap_or("").trim().to_string())
    }

    fn peer_ip(&self) -> Option<IpAddr> {
        self.peer
    }
}

impl Drop for Ssh2Session {
    fn drop(&mut self) {
        let _ = self
            .session
            .disconnect(Some(DisconnectCode::ByApplication), "closing", None);
    }
}
