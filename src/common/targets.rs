use std::fmt;
use std::path::Path;
use anyhow::{anyhow, Result};
use log::warn;
use serde::Serialize;

use crate::common::{iprange, utils};

pub const DEFAULT_PORT: u16 = 22;

/// 一个待测试的SSH端点
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Target {
    pub host: String,
    pub port: u16,
}

impl Target {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Target {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// 解析单个目标描述：host、host:port、CIDR 或 IP范围（可带端口后缀）
pub fn parse_spec(spec: &str) -> Result<Vec<Target>> {
    let spec = spec.trim();
    if spec.is_empty() {
        return Err(anyhow!("Empty target"));
    }

    let (host_part, port) = split_host_port(spec)?;
    if host_part.contains(char::is_whitespace) {
        return Err(anyhow!("Invalid host: {}", host_part));
    }

    // 只对IPv4形式的CIDR/范围做展开，主机名原样保留
    if host_part.contains('/') || host_part.contains('-') {
        let ips = iprange::expand(host_part)?;
        Ok(ips
            .into_iter()
            .map(|ip| Target::new(ip.to_string(), port))
            .collect())
    } else {
        Ok(vec![Target::new(host_part, port)])
    }
}

fn split_host_port(spec: &str) -> Result<(&str, u16)> {
    match spec.rsplit_once(':') {
        Some((host, port_str)) if !host.is_empty() => {
            let port = port_str
                .parse::<u16>()
                .map_err(|_| anyhow!("Invalid port: {}", port_str))?;
            if port == 0 {
                return Err(anyhow!("Invalid port: {}", port_str));
            }
            Ok((host, port))
        }
        _ => Ok((spec, DEFAULT_PORT)),
    }
}

/// 解析命令行目标参数，格式错误的条目告警后跳过
pub fn parse_args(specs: &[String]) -> Vec<Target> {
    let mut targets = Vec::new();

    for spec in specs {
        match parse_spec(spec) {
            Ok(mut expanded) => targets.append(&mut expanded),
            Err(e) => warn!("An error occurred parsing target '{}': {}", spec, e),
        }
    }

    targets
}

/// 从文件加载目标列表
pub fn load_from_file(path: impl AsRef<Path>) -> Result<Vec<Target>> {
    let path = path.as_ref();
    let lines = utils::read_lines_from_file(path)
        .map_err(|e| anyhow!("Error opening file. ({}): {}", path.display(), e))?;

    let mut targets = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        match parse_spec(line) {
            Ok(mut expanded) => targets.append(&mut expanded),
            Err(e) => warn!(
                "An error occurred parsing '{}' on line #{}: {}",
                path.display(),
                idx + 1,
                e
            ),
        }
    }

    Ok(targets)
}
