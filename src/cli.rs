use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "sshbrute-rs",
    version = "0.1.0",
    about = "A concurrent OpenSSH credential auditing and honeypot detection tool"
)]
pub struct Args {
    /// Targets: host, host:port, CIDR (192.168.1.0/24) or range (192.168.1.1-254)
    #[clap(value_name = "TARGETS")]
    pub targets: Vec<String>,

    /// File with one target per line (default: hostnames.txt)
    #[clap(short = 'T', long)]
    pub target_file: Option<PathBuf>,

    /// File with "username password" combinations (default: combos.txt)
    #[clap(short = 'C', long)]
    pub credentials_file: Option<PathBuf>,

    /// Number of concurrent workers
    #[clap(short = 't', long, default_value = "10")]
    pub threads: usize,

    /// Connection timeout in seconds
    #[clap(long, default_value = "3")]
    pub timeout: u64,

    /// Run the detection phase first and only attack eligible servers
    #[clap(short = 's', long)]
    pub scan: bool,

    /// Dry run (no network activity, used to exercise work distribution)
    #[clap(short = 'D', long)]
    pub dry_run: bool,

    /// Render an interactive progress bar
    #[clap(short = 'P', long)]
    pub progress_bar: bool,

    /// Accept servers that do not identify as OpenSSH
    #[clap(short = 'a', long)]
    pub non_openssh: bool,

    /// Attack servers detected as possible honeypots
    #[clap(short = 'A', long)]
    pub allow_honeypots: bool,

    /// Append successful logins to this file
    #[clap(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Append eligible servers found during detection to this file
    #[clap(long)]
    pub scan_output: Option<PathBuf>,

    /// Template for successful login lines
    #[clap(
        long,
        default_value = "%DATETIME%\\t%HOSTNAME%:%PORT%\\t%USERNAME%\\t%PASSWORD%"
    )]
    pub output_format: String,

    /// Execute this command after each successful login
    #[clap(short = 'X', long)]
    pub command: Option<String>,

    /// After a successful login, fetch this host through a forwarded TCP channel
    #[clap(long, value_name = "HOST")]
    pub check_http: Option<String>,

    /// Write a final run report to this file
    #[clap(long)]
    pub report: Option<PathBuf>,

    /// Report format (txt, json)
    #[clap(long, default_value = "txt")]
    pub report_format: String,

    /// Log file
    #[clap(long)]
    pub log_file: Option<PathBuf>,

    /// Verbose output
    #[clap(short, long)]
    pub verbose: bool,

    /// Silent mode (no banner)
    #[clap(long)]
    pub silent: bool,
}
