use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// 从文件中读取行（跳过空行和注释）
pub fn read_lines_from_file(file_path: impl AsRef<Path>) -> io::Result<Vec<String>> {
    let file = File::open(file_path)?;
    let reader = BufReader::new(file);
    let mut lines = Vec::new();

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if !line.is_empty() && !line.starts_with('#') {
            lines.push(line.to_string());
        }
    }

    Ok(lines)
}

/// 创建进度条
pub fn create_progress_bar(total: u64, message: &str) -> indicatif::ProgressBar {
    let pb = indicatif::ProgressBar::new(total);
    pb.set_style(
        indicatif::ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("=>-"),
    );
    pb.set_message(message.to_string());
    pb
}

/// 展开模板中的转义序列 (\t, \n, \r)
pub fn expand_escapes(input: &str) -> String {
    input
        .replace("\\t", "\t")
        .replace("\\n", "\n")
        .replace("\\r", "\r")
}
