// src/output/report.rs
use std::path::Path;
use std::sync::atomic::Ordering;

use chrono::Local;
use serde::Serialize;

use crate::brute::BruteResult;
use crate::common::targets::Target;
use crate::context::RunCounters;
use crate::output::file;

#[derive(Serialize)]
struct Report<'a> {
    timestamp: String,
    summary: Summary,
    targets: &'a [Target],
    credentials: &'a [BruteResult],
}

#[derive(Serialize)]
struct Summary {
    targets: usize,
    attempts: usize,
    credentials: usize,
}

pub fn generate(
    output_path: &Path,
    format: &str,
    targets: &[Target],
    credentials: &[BruteResult],
    counters: &RunCounters,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = Report {
        timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        summary: Summary {
            targets: targets.len(),
            attempts: counters.attempted.load(Ordering::Relaxed),
            credentials: credentials.len(),
        },
        targets,
        credentials,
    };

    match format.to_lowercase().as_str() {
        "json" => generate_json_report(output_path, &report)?,
        _ => generate_text_report(output_path, &report)?,
    }

    Ok(())
}

fn generate_text_report(
    output_path: &Path,
    report: &Report<'_>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut content = String::new();

    content.push_str("# SCAN REPORT\n");
    content.push_str(&format!("Date: {}\n\n", report.timestamp));

    content.push_str("## SUMMARY\n");
    content.push_str(&format!("Targets: {}\n", report.summary.targets));
    content.push_str(&format!("Attempts: {}\n", report.summary.attempts));
    content.push_str(&format!("Credentials: {}\n\n", report.summary.credentials));

    content.push_str("## TARGETS\n");
    for target in report.targets {
        content.push_str(&format!("- {}\n", target));
    }
    content.push('\n');

    if !report.credentials.is_empty() {
        content.push_str("## CREDENTIALS\n");
        for cred in report.credentials {
            content.push_str(&format!(
                "- {}:{} - username: '{}', password: '{}'\n",
                cred.host, cred.port, cred.username, cred.password
            ));
        }
        content.push('\n');
    }

    file::write_to_file(output_path, &content)?;

    Ok(())
}

fn generate_json_report(
    output_path: &Path,
    report: &Report<'_>,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(report)?;
    file::write_to_file(output_path, &json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_report() {
        let path = std::env::temp_dir().join("sshbrute_rs_report_test.txt");
        let targets = vec![Target::new("10.0.0.1", 22)];
        let credentials = vec![BruteResult {
            host: "10.0.0.1".to_string(),
            port: 22,
            username: "root".to_string(),
            password: "toor".to_string(),
        }];
        let counters = RunCounters::new();
        counters.reset(1);
        counters.attempted.store(1, Ordering::Relaxed);

        generate(&path, "txt", &targets, &credentials, &counters).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("Attempts: 1"));
        assert!(content.contains("username: 'root', password: 'toor'"));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_json_report() {
        let path = std::env::temp_dir().join("sshbrute_rs_report_test.json");
        let counters = RunCounters::new();

        generate(&path, "json", &[], &[], &counters).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed["summary"]["credentials"], 0);

        std::fs::remove_file(&path).unwrap();
    }
}
