use crate::check::ProbeResult;
use crate::config::Config;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// 批量探测的进度条
#[derive(Clone)]
pub struct ProgressTracker {
    progress: Option<ProgressBar>,
    total: Arc<AtomicU64>,
    reachable: Arc<AtomicU64>,
    unreachable: Arc<AtomicU64>,
}

impl ProgressTracker {
    pub fn new(config: &Config, total: u64) -> Self {
        let progress = if config.print_progress && total > 1 {
            let style = ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");

            let bar = ProgressBar::new(total);
            bar.set_style(style);
            Some(bar)
        } else {
            None
        };

        Self {
            progress,
            total: Arc::new(AtomicU64::new(total)),
            reachable: Arc::new(AtomicU64::new(0)),
            unreachable: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn record(&self, name: &str, result: &ProbeResult) {
        if result.is_reachable() {
            self.reachable.fetch_add(1, Ordering::Relaxed);
        } else {
            self.unreachable.fetch_add(1, Ordering::Relaxed);
        }

        if let Some(pb) = &self.progress {
            pb.inc(1);
            pb.set_message(format!(
                "{} {}",
                if result.is_reachable() { "✅" } else { "❌" },
                name
            ));
        }
    }

    /// 进度条存在时经它打印，避免输出被覆盖
    pub fn println(&self, line: String) {
        match &self.progress {
            Some(pb) => pb.println(line),
            None => println!("{}", line),
        }
    }

    pub fn finalize(&self) {
        if let Some(pb) = &self.progress {
            pb.finish_with_message("探测完成");
        }
    }

    pub fn get_stats(&self) -> ProgressStats {
        ProgressStats {
            total: self.total.load(Ordering::Relaxed),
            reachable: self.reachable.load(Ordering::Relaxed),
            unreachable: self.unreachable.load(Ordering::Relaxed),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.progress.is_some()
    }
}

pub struct ProgressStats {
    pub total: u64,
    pub reachable: u64,
    pub unreachable: u64,
}

impl ProgressStats {
    pub fn success_rate(&self) -> f64 {
        if self.total > 0 {
            (self.reachable as f64 / self.total as f64) * 100.0
        } else {
            0.0
        }
    }
}
