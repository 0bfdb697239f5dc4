use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::cli::Args;
use crate::output::OutputSink;

/// 单次运行的配置，由命令行参数构造，运行期间只读
#[derive(Debug, Clone)]
pub struct Options {
    pub timeout: Duration,
    pub max_threads: usize,
    pub progress_bar: bool,
    pub verbose: bool,
    pub dry_run: bool,
    pub perform_scan: bool,
    pub non_openssh: bool,
    pub allow_honeypots: bool,
    pub command: Option<String>,
    pub check_http: Option<String>,
    pub output_format: String,
}

impl Options {
    pub fn from_args(args: &Args) -> Self {
        Options {
            timeout: Duration::from_secs(args.timeout),
            max_threads: args.threads,
            progress_bar: args.progress_bar,
            verbose: args.verbose,
            dry_run: args.dry_run,
            perform_scan: args.scan,
            non_openssh: args.non_openssh,
            allow_honeypots: args.allow_honeypots,
            command: args.command.clone(),
            check_http: args.check_http.clone(),
            output_format: args.output_format.clone(),
        }
    }
}

impl Default for Options {
    fn default() -> Self {
        Options {
            timeout: Duration::from_secs(3),
            max_threads: 1,
            progress_bar: false,
            verbose: false,
            dry_run: false,
            perform_scan: false,
            non_openssh: false,
            allow_honeypots: false,
            command: None,
            check_http: None,
            output_format: "%HOSTNAME%:%PORT%\\t%USERNAME%\\t%PASSWORD%".to_string(),
        }
    }
}

/// 共享进度计数器，工作线程写入，进度观察者只读
#[derive(Debug, Default)]
pub struct RunCounters {
    pub attempted: AtomicUsize,
    pub succeeded: AtomicUsize,
    pub total: AtomicUsize,
}

impl RunCounters {
    pub fn new() -> Self {
        RunCounters::default()
    }

    /// 每个阶段开始前重置
    pub fn reset(&self, total: usize) {
        self.attempted.store(0, Ordering::Relaxed);
        self.succeeded.store(0, Ordering::Relaxed);
        self.total.store(total, Ordering::Relaxed);
    }
}

/// 一次运行的共享状态：配置、计数器、输出和停止标志。
/// 由驱动创建并独占持有，借给所有工作线程和进度观察者。
pub struct EngineContext {
    pub options: Options,
    pub counters: Arc<RunCounters>,
    pub output: Option<OutputSink>,
    pub scan_output: Option<OutputSink>,
    pub stop: Arc<AtomicBool>,
}

impl EngineContext {
    pub fn new(options: Options) -> Self {
        EngineContext {
            options,
            counters: Arc::new(RunCounters::new()),
            output: None,
            scan_output: None,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// 工作线程数不超过第一维度的工作量，至少为1
pub fn clamp_threads(requested: usize, work: usize) -> usize {
    requested.min(work).max(1)
}
