// src/main.rs
use std::path::PathBuf;
use std::process;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, bail, Result};
use clap::Parser;
use log::{error, info, warn};

use sshbrute_rs::brute;
use sshbrute_rs::cli::Args;
use sshbrute_rs::common::{banner, credentials, logger, targets};
use sshbrute_rs::context::{self, EngineContext, Options, RunCounters};
use sshbrute_rs::output::{report, OutputSink};
use sshbrute_rs::scanner;
use sshbrute_rs::transport::ssh::SshTransport;
use sshbrute_rs::transport::Transport;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = logger::init(args.verbose, args.silent, &args.log_file) {
        eprintln!("Cannot initialize logging: {}", e);
        process::exit(1);
    }

    if !args.silent {
        banner::show();
    }

    if let Err(e) = run(args).await {
        error!("{}", e);
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    // 加载目标列表
    let mut target_list = targets::parse_args(&args.targets);
    if let Some(path) = &args.target_file {
        target_list.extend(targets::load_from_file(path)?);
    } else if target_list.is_empty() {
        target_list.extend(targets::load_from_file("hostnames.txt")?);
    }

    // 加载用户名/密码组合
    let credentials_path = args
        .credentials_file
        .clone()
        .unwrap_or_else(|| PathBuf::from("combos.txt"));
    let credential_list = credentials::load_from_file(&credentials_path)?;

    let total = target_list.len() * credential_list.len();
    println!(
        "\nAmount of username/password combinations: {}",
        credential_list.len()
    );
    println!("Number of targets: {}", target_list.len());
    println!("Total attempts: {}", total);

    if total == 0 {
        bail!("No work to do.");
    }

    let mut options = Options::from_args(&args);
    if options.max_threads < 1 {
        bail!("Invalid threads size. ({})", options.max_threads);
    }
    if options.max_threads > target_list.len() {
        info!("Decreasing max threads to {}.", target_list.len());
        options.max_threads = context::clamp_threads(options.max_threads, target_list.len());
    }
    println!("Max threads: {}\n", options.max_threads);

    // 输出文件打不开属于配置错误，直接终止
    let output = match &args.output {
        Some(path) => Some(
            OutputSink::open(path)
                .map_err(|e| anyhow!("Error opening output file. ({}): {}", path.display(), e))?,
        ),
        None => None,
    };
    let scan_output = match &args.scan_output {
        Some(path) => Some(
            OutputSink::open(path)
                .map_err(|e| anyhow!("Error opening output file. ({}): {}", path.display(), e))?,
        ),
        None => None,
    };

    let ctx = Arc::new(EngineContext {
        options,
        counters: Arc::new(RunCounters::new()),
        output,
        scan_output,
        stop: Arc::new(std::sync::atomic::AtomicBool::new(false)),
    });

    // Ctrl-C后不再分发新工作，在途尝试跑完即收
    {
        let stop = Arc::clone(&ctx.stop);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, stopping after in-flight attempts...");
                stop.store(true, Ordering::Relaxed);
            }
        });
    }

    let transport: Arc<dyn Transport> = Arc::new(SshTransport::new());
    let mut target_list = Arc::new(target_list);

    // 检测阶段：过滤掉不值得攻击的目标
    if ctx.options.perform_scan {
        info!("Starting servers discovery process...");
        let start = Instant::now();
        let filtered = scanner::run(
            Arc::clone(&ctx),
            Arc::clone(&target_list),
            Arc::clone(&transport),
        )
        .await;
        info!(
            "Detection process took {:.2} seconds.",
            start.elapsed().as_secs_f64()
        );
        info!("Number of targets after filtering: {}.", filtered.len());
        target_list = Arc::new(filtered);
    }

    if target_list.is_empty() {
        info!("No work to do.");
        return Ok(());
    }

    // 爆破阶段
    let credential_list = Arc::new(credential_list);
    info!("Starting brute-force process...");
    let start = Instant::now();
    let results = brute::run(
        Arc::clone(&ctx),
        Arc::clone(&target_list),
        Arc::clone(&credential_list),
        transport,
    )
    .await;
    info!(
        "Brute-force process took {:.2} seconds.",
        start.elapsed().as_secs_f64()
    );
    info!(
        "{} attempts, {} successful logins.",
        ctx.counters.attempted.load(Ordering::Relaxed),
        results.len()
    );

    if let Some(path) = &args.report {
        report::generate(path, &args.report_format, &target_list, &results, &ctx.counters)
            .map_err(|e| anyhow!("Cannot write report: {}", e))?;
        info!("Report written to {}", path.display());
    }

    Ok(())
}
