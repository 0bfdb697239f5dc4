use std::sync::{Arc, Mutex};
use std::sync::atomic::Ordering;

use crate::common::credentials::Credential;
use crate::common::targets::Target;
use crate::context::RunCounters;
use crate::pool::WorkSource;

/// 目标×凭证笛卡尔积的惰性游标，凭证优先：
/// 同一个凭证先走完所有目标，再推进到下一个凭证。
/// 多个工作线程并发调用next()，每个组合恰好被取走一次。
pub struct WorkMatrix {
    targets: Arc<Vec<Target>>,
    credentials: Arc<Vec<Credential>>,
    cursor: Mutex<MatrixCursor>,
    counters: Arc<RunCounters>,
}

#[derive(Debug, Default)]
struct MatrixCursor {
    target: usize,
    credential: usize,
}

impl WorkMatrix {
    pub fn new(
        targets: Arc<Vec<Target>>,
        credentials: Arc<Vec<Credential>>,
        counters: Arc<RunCounters>,
    ) -> Self {
        WorkMatrix {
            targets,
            credentials,
            cursor: Mutex::new(MatrixCursor::default()),
            counters,
        }
    }

    pub fn total(&self) -> usize {
        self.targets.len() * self.credentials.len()
    }
}

impl WorkSource for WorkMatrix {
    type Unit = (Target, Credential);

    fn next(&self) -> Option<(Target, Credential)> {
        // 临界区只读写两个整数并拷贝一对元素，绝不包含网络操作
        let mut cursor = self.cursor.lock().unwrap();

        if self.targets.is_empty() || self.credentials.is_empty() {
            return None;
        }

        if cursor.target >= self.targets.len() {
            cursor.target = 0;
            cursor.credential += 1;
        }

        if cursor.credential >= self.credentials.len() {
            return None;
        }

        let pair = (
            self.targets[cursor.target].clone(),
            self.credentials[cursor.credential].clone(),
        );
        cursor.target += 1;
        self.counters.attempted.fetch_add(1, Ordering::Relaxed);

        Some(pair)
    }
}

/// 检测阶段用的目标游标，同样的恰好一次分发约定
pub struct TargetCursor {
    targets: Arc<Vec<Target>>,
    next: Mutex<usize>,
    counters: Arc<RunCounters>,
}

impl TargetCursor {
    pub fn new(targets: Arc<Vec<Target>>, counters: Arc<RunCounters>) -> Self {
        TargetCursor {
            targets,
            next: Mutex::new(0),
            counters,
        }
    }
}

impl WorkSource for TargetCursor {
    type Unit = Target;

    fn next(&self) -> Option<Target> {
        let mut next = self.next.lock().unwrap();

        if *next >= self.targets.len() {
            return None;
        }

        let target = self.targets[*next].clone();
        *next += 1;
        self.counters.attempted.fetch_add(1, Ordering::Relaxed);

        Some(target)
    }
}
