use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, error};

/// 可被多个工作线程并发取用的工作源，取尽返回None
pub trait WorkSource: Send + Sync {
    type Unit: Send + 'static;

    fn next(&self) -> Option<Self::Unit>;
}

/// 固定大小的工作池：N个任务循环从共享游标拉取工作，
/// 游标取尽或停止标志置位后各自退出，全部退出后返回。
pub async fn run<S, F, Fut>(source: Arc<S>, workers: usize, stop: Arc<AtomicBool>, handler: F)
where
    S: WorkSource + 'static,
    F: Fn(S::Unit) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let mut handles = Vec::with_capacity(workers);

    for worker in 0..workers {
        let source = Arc::clone(&source);
        let stop = Arc::clone(&stop);
        let handler = handler.clone();

        debug!("Spawning worker {}", worker);
        handles.push(tokio::spawn(async move {
            loop {
                // 每轮先检查停止标志，收到关停信号后不再领取新工作
                if stop.load(Ordering::Relaxed) {
                    break;
                }

                let unit = match source.next() {
                    Some(unit) => unit,
                    None => break,
                };

                handler(unit).await;
            }
        }));
    }

    for handle in handles {
        if let Err(e) = handle.await {
            error!("Worker terminated abnormally: {}", e);
        }
    }
}
