pub mod ssh;

use std::mem;
use std::sync::{Arc, Mutex};

use colored::*;
use log::{debug, error, info, warn};
use serde::Serialize;

use crate::common::credentials::Credential;
use crate::common::targets::Target;
use crate::context::{self, EngineContext};
use crate::matrix::WorkMatrix;
use crate::output;
use crate::pool;
use crate::progress;
use crate::transport::Transport;

/// 单次登录尝试的结论
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    Failure,
    Error,
}

/// 登录成功后的附加动作结果，失败不影响登录成功的结论
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
    None,
    CommandCaptured(std::path::PathBuf),
    CommandFailed(String),
    TunnelConfirmed(String),
    TunnelFailed(String),
}

/// 一次尝试的完整汇报，凭证是占位符替换后的实际值
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptReport {
    pub outcome: AttemptOutcome,
    pub side_effect: SideEffect,
    pub credential: Credential,
}

impl AttemptReport {
    pub fn failure(credential: Credential) -> Self {
        AttemptReport {
            outcome: AttemptOutcome::Failure,
            side_effect: SideEffect::None,
            credential,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BruteResult {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

/// 爆破引擎：工作池取空目标×凭证矩阵，返回命中的凭证
pub async fn run(
    ctx: Arc<EngineContext>,
    targets: Arc<Vec<Target>>,
    credentials: Arc<Vec<Credential>>,
    transport: Arc<dyn Transport>,
) -> Vec<BruteResult> {
    if targets.is_empty() || credentials.is_empty() {
        return Vec::new();
    }

    let matrix = Arc::new(WorkMatrix::new(
        Arc::clone(&targets),
        Arc::clone(&credentials),
        Arc::clone(&ctx.counters),
    ));
    ctx.counters.reset(matrix.total());

    let workers = context::clamp_threads(ctx.options.max_threads, targets.len());
    debug!(
        "Brute-force pool: {} workers for {} combinations",
        workers,
        matrix.total()
    );

    let results: Arc<Mutex<Vec<BruteResult>>> = Arc::new(Mutex::new(Vec::new()));
    let watcher = progress::spawn(Arc::clone(&ctx), "Brute-force");

    let handler = {
        let ctx = Arc::clone(&ctx);
        let transport = Arc::clone(&transport);
        let results = Arc::clone(&results);

        move |(target, credential): (Target, Credential)| {
            let ctx = Arc::clone(&ctx);
            let transport = Arc::clone(&transport);
            let results = Arc::clone(&results);

            async move {
                // 演练模式：组合照常分发计数，不碰网络
                if ctx.options.dry_run {
                    debug!(
                        "{} {} {} (dry run)",
                        target, credential.username, credential.password
                    );
                    return;
                }

                let report = {
                    let ctx = Arc::clone(&ctx);
                    let transport = Arc::clone(&transport);
                    let probe_target = target.clone();
                    let probe_credential = credential.clone();
                    match tokio::task::spawn_blocking(move || {
                        ssh::run_attempt(
                            transport.as_ref(),
                            &probe_target,
                            &probe_credential,
                            &ctx.options,
                        )
                    })
                    .await
                    {
                        Ok(report) => report,
                        Err(e) => {
                            // 传输层崩溃收敛为错误结论，绝不冲出工作循环
                            error!("Attempt task failed for {}: {}", target, e);
                            AttemptReport {
                                outcome: AttemptOutcome::Error,
                                side_effect: SideEffect::None,
                                credential: credential.clone(),
                            }
                        }
                    }
                };

                let credential = report.credential;
                match report.outcome {
                    AttemptOutcome::Success => {
                        ctx.counters
                            .succeeded
                            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                        info!(
                            "{} {} {} {}",
                            "[+]".green(),
                            target,
                            credential.username,
                            credential.password
                        );
                        if let Some(sink) = &ctx.output {
                            sink.write_line(&output::format_success_line(
                                &ctx.options.output_format,
                                &target,
                                &credential,
                            ));
                        }
                        match &report.side_effect {
                            SideEffect::CommandCaptured(path) => {
                                info!("[+] {} - Command output saved to {}", target, path.display());
                            }
                            SideEffect::CommandFailed(e) => {
                                warn!("[!] {} - Remote command failed: {}", target, e);
                            }
                            SideEffect::TunnelConfirmed(status) => {
                                info!("[+] {} - HTTP check: {}", target, status);
                            }
                            SideEffect::TunnelFailed(e) => {
                                warn!("[!] {} - HTTP check failed: {}", target, e);
                            }
                            SideEffect::None => {}
                        }
                        results.lock().unwrap().push(BruteResult {
                            host: target.host.clone(),
                            port: target.port,
                            username: credential.username,
                            password: credential.password,
                        });
                    }
                    AttemptOutcome::Failure => {
                        debug!(
                            "{} {} {} {}",
                            "[-]".dimmed(),
                            target,
                            credential.username,
                            credential.password
                        );
                    }
                    AttemptOutcome::Error => {
                        debug!("[!] {} - attempt error", target);
                    }
                }
            }
        }
    };

    pool::run(matrix, workers, Arc::clone(&ctx.stop), handler).await;
    let _ = watcher.await;

    let mut results = results.lock().unwrap();
    mem::take(&mut *results)
}
