// src/progress.rs
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::info;
use tokio::task::JoinHandle;

use crate::common::utils;
use crate::context::EngineContext;

/// 进度观察者：单个长生命周期任务，与工作线程数无关。
/// 定期采样共享计数器，算出速率和预计剩余时间；
/// 只读不写，快照允许轻微滞后。计数器到达总数或收到
/// 停止信号后退出，池结束后由引擎显式等待。
pub fn spawn(ctx: Arc<EngineContext>, label: &str) -> JoinHandle<()> {
    let label = label.to_string();

    tokio::spawn(async move {
        let counters = Arc::clone(&ctx.counters);
        let total = counters.total.load(Ordering::Relaxed);
        if total == 0 {
            return;
        }

        let bar = if ctx.options.progress_bar {
            Some(utils::create_progress_bar(total as u64, &label))
        } else {
            None
        };

        let start = Instant::now();
        let mut last_update = Instant::now();
        let mut stats = String::new();

        loop {
            let attempted = counters.attempted.load(Ordering::Relaxed);
            if attempted >= total || ctx.stop.load(Ordering::Relaxed) {
                break;
            }

            // 每秒刷新一次ETR，非交互模式下也以此节流日志输出
            if last_update.elapsed() >= Duration::from_secs(1) {
                let elapsed = start.elapsed().as_secs_f64();
                if attempted > 0 && elapsed > 0.0 {
                    let rate = attempted as f64 / elapsed;
                    let remaining = (total - attempted) as f64 / rate;
                    let (hours, minutes, seconds) = format_time(remaining);
                    stats = format!(
                        "ETR: {:02}:{:02}:{:02} Rate: {:.0}/sec",
                        hours, minutes, seconds, rate
                    );
                    if bar.is_none() {
                        info!("{}", stats);
                    }
                }
                last_update = Instant::now();
            }

            if let Some(pb) = &bar {
                pb.set_position(attempted as u64);
                if !stats.is_empty() {
                    pb.set_message(stats.clone());
                }
            }

            tokio::time::sleep(Duration::from_millis(200)).await;
        }

        if let Some(pb) = &bar {
            pb.set_position(counters.attempted.load(Ordering::Relaxed) as u64);
            pb.finish_with_message(format!(
                "{} OK",
                counters.succeeded.load(Ordering::Relaxed)
            ));
        }
    })
}

/// 把秒数拆成时分秒
pub fn format_time(seconds: f64) -> (u64, u64, u64) {
    let total = seconds.max(0.0) as u64;
    (total / 3600, (total % 3600) / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Options;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), (0, 0, 0));
        assert_eq!(format_time(59.9), (0, 0, 59));
        assert_eq!(format_time(61.0), (0, 1, 1));
        assert_eq!(format_time(3724.0), (1, 2, 4));
        assert_eq!(format_time(-5.0), (0, 0, 0));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_watcher_exits_when_counters_reach_total() {
        let ctx = Arc::new(EngineContext::new(Options::default()));
        ctx.counters.reset(10);

        let watcher = spawn(Arc::clone(&ctx), "test");
        ctx.counters.attempted.store(10, Ordering::Relaxed);

        tokio::time::timeout(Duration::from_secs(5), watcher)
            .await
            .expect("watcher did not terminate")
            .unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_watcher_exits_immediately_with_no_work() {
        let ctx = Arc::new(EngineContext::new(Options::default()));
        ctx.counters.reset(0);

        let watcher = spawn(Arc::clone(&ctx), "test");
        tokio::time::timeout(Duration::from_secs(1), watcher)
            .await
            .expect("watcher did not terminate")
            .unwrap();
    }
}
