use std::path::Path;
use anyhow::{anyhow, Result};
use log::warn;

use crate::common::utils;

/// 空密码占位符：密码字段必须存在，留空要显式声明
pub const BLANK_PASSWORD: &str = "$BLANKPASS";

/// 一组待测试的用户名/密码
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credential {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// 解析 "username password" 格式的一行，密码可以包含空格
pub fn parse_line(line: &str) -> Result<Credential> {
    match line.split_once(' ') {
        Some((username, password)) if !username.is_empty() && !password.is_empty() => {
            let password = if password == BLANK_PASSWORD {
                String::new()
            } else {
                password.to_string()
            };
            Ok(Credential::new(username, password))
        }
        _ => Err(anyhow!("Expected 'username password'")),
    }
}

/// 从文件加载用户名/密码组合，格式错误的行告警后跳过
pub fn load_from_file(path: impl AsRef<Path>) -> Result<Vec<Credential>> {
    let path = path.as_ref();
    let lines = utils::read_lines_from_file(path)
        .map_err(|e| anyhow!("Error opening file. ({}): {}", path.display(), e))?;

    let mut credentials = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        match parse_line(line) {
            Ok(credential) => credentials.push(credential),
            Err(e) => warn!(
                "An error occurred parsing '{}' on line #{}: {}",
                path.display(),
                idx + 1,
                e
            ),
        }
    }

    Ok(credentials)
}
