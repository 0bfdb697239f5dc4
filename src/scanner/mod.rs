pub mod detect;

use std::fmt;
use std::mem;
use std::sync::{Arc, Mutex};

use log::{debug, info};

use crate::common::targets::Target;
use crate::context::{self, EngineContext};
use crate::matrix::TargetCursor;
use crate::pool;
use crate::progress;
use crate::transport::Transport;

/// 单个目标的检测结论
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectReason {
    Eligible,
    Unreachable,
    NoBanner,
    NotSsh,
    NotOpenSsh,
    PossibleHoneypot,
    NoAuthRequired,
    AuthProbeError,
    NoPasswordAuth,
}

impl fmt::Display for DetectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DetectReason::Eligible => "eligible",
            DetectReason::Unreachable => "unreachable",
            DetectReason::NoBanner => "no banner",
            DetectReason::NotSsh => "not SSH, likely tcpwrapped",
            DetectReason::NotOpenSsh => "not an OpenSSH server",
            DetectReason::PossibleHoneypot => "possible honeypot",
            DetectReason::NoAuthRequired => "server without authentication",
            DetectReason::AuthProbeError => "authentication probe error",
            DetectReason::NoPasswordAuth => "no password auth",
        };
        write!(f, "{}", text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionResult {
    pub target: Target,
    pub eligible: bool,
    pub banner: String,
    pub reason: DetectReason,
}

impl DetectionResult {
    fn new(target: &Target, eligible: bool, banner: String, reason: DetectReason) -> Self {
        DetectionResult {
            target: target.clone(),
            eligible,
            banner,
            reason,
        }
    }
}

/// 检测引擎：工作池扫过目标列表，返回通过所有检查的目标。
/// 合格目标在共享结果锁下追加，顺序无保证。
pub async fn run(
    ctx: Arc<EngineContext>,
    targets: Arc<Vec<Target>>,
    transport: Arc<dyn Transport>,
) -> Vec<Target> {
    if targets.is_empty() {
        return Vec::new();
    }

    ctx.counters.reset(targets.len());
    let workers = context::clamp_threads(ctx.options.max_threads, targets.len());
    debug!("Detection pool: {} workers for {} targets", workers, targets.len());

    let cursor = Arc::new(TargetCursor::new(
        Arc::clone(&targets),
        Arc::clone(&ctx.counters),
    ));
    let filtered: Arc<Mutex<Vec<Target>>> = Arc::new(Mutex::new(Vec::new()));
    let watcher = progress::spawn(Arc::clone(&ctx), "Scanning targets");

    let handler = {
        let ctx = Arc::clone(&ctx);
        let transport = Arc::clone(&transport);
        let filtered = Arc::clone(&filtered);

        move |target: Target| {
            let ctx = Arc::clone(&ctx);
            let transport = Arc::clone(&transport);
            let filtered = Arc::clone(&filtered);

            async move {
                // 演练模式：不碰网络，所有目标一律合格
                if ctx.options.dry_run {
                    info!("Scanning {}", target);
                    filtered.lock().unwrap().push(target);
                    return;
                }

                let result = {
                    let ctx = Arc::clone(&ctx);
                    let transport = Arc::clone(&transport);
                    let probe_target = target.clone();
                    match tokio::task::spawn_blocking(move || {
                        detect::classify(transport.as_ref(), &probe_target, &ctx.options)
                    })
                    .await
                    {
                        Ok(result) => result,
                        Err(e) => {
                            log::error!("Detection task failed for {}: {}", target, e);
                            return;
                        }
                    }
                };

                if result.eligible {
                    info!("[!] {} - {}", result.target, result.banner);
                    if let Some(sink) = &ctx.scan_output {
                        sink.write_line(&format!("{}\t{}", result.target, result.banner));
                    }
                    filtered.lock().unwrap().push(result.target);
                }
            }
        }
    };

    pool::run(cursor, workers, Arc::clone(&ctx.stop), handler).await;
    let _ = watcher.await;

    let mut filtered = filtered.lock().unwrap();
    mem::take(&mut *filtered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Options;
    use crate::transport::mock::ScriptedTransport;

    fn targets(count: usize) -> Arc<Vec<Target>> {
        Arc::new(
            (0..count)
                .map(|i| Target::new(format!("10.0.0.{}", i), 22))
                .collect(),
        )
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_run_filters_all_eligible() {
        let ctx = Arc::new(EngineContext::new(Options {
            max_threads: 4,
            ..Options::default()
        }));
        let transport: Arc<dyn Transport> = Arc::new(ScriptedTransport::default());

        let filtered = run(Arc::clone(&ctx), targets(5), transport).await;

        assert_eq!(filtered.len(), 5);
        assert_eq!(
            ctx.counters
                .attempted
                .load(std::sync::atomic::Ordering::Relaxed),
            5
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_run_excludes_unreachable() {
        let ctx = Arc::new(EngineContext::new(Options {
            max_threads: 2,
            ..Options::default()
        }));
        let script = ScriptedTransport {
            banner: Err(crate::transport::TransportError::Connect(
                "refused".to_string(),
            )),
            ..ScriptedTransport::default()
        };
        let transport: Arc<dyn Transport> = Arc::new(script);

        let filtered = run(ctx, targets(3), transport).await;

        assert!(filtered.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_dry_run_marks_everything_eligible_without_probing() {
        let ctx = Arc::new(EngineContext::new(Options {
            max_threads: 4,
            dry_run: true,
            ..Options::default()
        }));
        let script = Arc::new(ScriptedTransport::default());
        let transport: Arc<dyn Transport> = Arc::clone(&script) as Arc<dyn Transport>;

        let filtered = run(ctx, targets(10), transport).await;

        assert_eq!(filtered.len(), 10);
        assert!(script.calls().is_empty());
    }
}
