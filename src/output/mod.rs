pub mod file;
pub mod report;

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Local;
use log::error;

use crate::common::credentials::Credential;
use crate::common::targets::Target;
use crate::common::utils;

/// 追加式输出，多个工作线程并发写入时以sink为单位加锁。
/// 写失败只记录错误并跳过该行，不中断运行。
pub struct OutputSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl OutputSink {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(OutputSink {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn write_line(&self, line: &str) {
        let mut file = self.file.lock().unwrap();
        if let Err(e) = writeln!(file, "{}", line) {
            error!("Cannot write to {}: {}", self.path.display(), e);
        }
    }
}

/// 按模板渲染一条成功记录，支持 %DATETIME% %HOSTNAME% %PORT%
/// %USERNAME% %PASSWORD% 占位符和 \t \n \r 转义
pub fn format_success_line(template: &str, target: &Target, credential: &Credential) -> String {
    utils::expand_escapes(template)
        .replace(
            "%DATETIME%",
            &Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        )
        .replace("%HOSTNAME%", &target.host)
        .replace("%PORT%", &target.port.to_string())
        .replace("%USERNAME%", &credential.username)
        .replace("%PASSWORD%", &credential.password)
}

/// 每目标的命令输出文件，名字取自对端地址
pub fn command_log_path(ip: &str) -> PathBuf {
    PathBuf::from(format!("{}_cmd.log", ip))
}
