use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

use crate::common::targets::Target;

#[cfg(test)]
pub mod mock;
pub mod ssh;

/// 传输层错误，由上层引擎映射为各自的结果分类
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// 无法建立连接（超时、拒绝、解析失败）
    Connect(String),
    /// 连接成功但没有读到标识串
    NoBanner,
    /// 已建立连接上的读写失败
    Io(String),
    /// SSH协议层失败
    Protocol(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Connect(e) => write!(f, "connect: {}", e),
            TransportError::NoBanner => write!(f, "no banner received"),
            TransportError::Io(e) => write!(f, "io: {}", e),
            TransportError::Protocol(e) => write!(f, "protocol: {}", e),
        }
    }
}

impl std::error::Error for TransportError {}

/// 一次认证调用的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Success,
    Failure,
    Error(String),
}

/// 服务器公布的认证方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MethodSet {
    pub none: bool,
    pub password: bool,
    pub publickey: bool,
    pub keyboard_interactive: bool,
}

impl MethodSet {
    /// 解析逗号分隔的认证方式列表
    pub fn parse(list: &str) -> Self {
        let mut methods = MethodSet::default();
        for method in list.split(',') {
            match method.trim() {
                "none" => methods.none = true,
                "password" => methods.password = true,
                "publickey" => methods.publickey = true,
                "keyboard-interactive" => methods.keyboard_interactive = true,
                _ => {}
            }
        }
        methods
    }

    pub fn password_only() -> Self {
        MethodSet {
            password: true,
            ..MethodSet::default()
        }
    }
}

/// 一条已完成握手的SSH会话。实现者在Drop时断开连接，
/// 保证每条提前返回的路径都会干净关闭。
pub trait ProbeSession: Send {
    /// 无凭证认证探测
    fn auth_none(&mut self, username: &str) -> AuthOutcome;

    /// 查询服务器公布的认证方式
    fn auth_methods(&mut self, username: &str) -> Result<MethodSet, TransportError>;

    /// 密码认证
    fn auth_password(&mut self, username: &str, password: &str) -> AuthOutcome;

    /// 执行远程命令并捕获标准输出
    fn exec_command(&mut self, command: &str) -> Result<Vec<u8>, TransportError>;

    /// 通过转发TCP通道向指定主机发一个HTTP请求，返回响应首行
    fn http_probe(&mut self, host: &str) -> Result<String, TransportError>;

    /// 对端IP，用于派生每目标的命令输出文件名
    fn peer_ip(&self) -> Option<IpAddr>;
}

/// 探测传输：检测引擎和爆破引擎共用的网络层入口
pub trait Transport: Send + Sync {
    /// 裸TCP读取服务器标识串
    fn read_banner(&self, target: &Target, timeout: Duration) -> Result<String, TransportError>;

    /// 发送三段触发包，返回服务器是否按标准回复"Protocol mismatch."
    fn honeypot_check(&self, target: &Target, timeout: Duration)
        -> Result<bool, TransportError>;

    /// 建立SSH会话
    fn open_session(
        &self,
        target: &Target,
        timeout: Duration,
    ) -> Result<Box<dyn ProbeSession>, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_set_parse() {
        let methods = MethodSet::parse("publickey,password");
        assert!(methods.password);
        assert!(methods.publickey);
        assert!(!methods.none);
        assert!(!methods.keyboard_interactive);

        let methods = MethodSet::parse("none, keyboard-interactive");
        assert!(methods.none);
        assert!(methods.keyboard_interactive);
        assert!(!methods.password);

        assert_eq!(MethodSet::parse(""), MethodSet::default());
    }
}
