//! 探测调度器模块
//!
//! 以固定间隔发起探测轮次。每一轮为每个主机派发一个独立任务，轮次循环
//! 不等待探测完成。若某主机上一轮的探测仍未完成，本轮跳过该主机，因此
//! 同一主机的探测永远不会重叠，`up` 总是反映最近一次派发（也是最近一次
//! 完成）的探测结果。

use crate::health::prober::Prober;
use crate::health::result::HostTarget;
use crate::health::stats::{HostSnapshot, StatsAggregator};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

/// 调度器状态
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStatus {
    /// 调度器是否运行中
    pub is_running: bool,
    /// 被监控主机数量
    pub total_hosts: usize,
    /// 已执行的轮次
    pub rounds: u64,
    /// 已派发的探测次数
    pub dispatched: u64,
    /// 因上一次探测未完成而跳过的次数
    pub skipped: u64,
}

/// 调度器trait，定义调度接口
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// 启动调度器
    ///
    /// # 参数
    /// * `shutdown_rx` - 关闭信号接收器，收到信号或发送端全部关闭时轮次循环退出
    ///
    /// # 返回
    /// * `Result<()>` - 启动结果，重复启动返回错误
    async fn start(&self, shutdown_rx: broadcast::Receiver<()>) -> Result<()>;

    /// 停止调度器，已派发的探测不会被取消
    async fn stop(&self) -> Result<()>;

    /// 获取调度器状态
    async fn get_status(&self) -> SchedulerStatus;
}

/// 单个主机的调度槽位
#[derive(Debug)]
struct ProbeSlot {
    target: HostTarget,
    in_flight: Arc<AtomicBool>,
}

/// 探测完成（或任务被中止）时清除进行中标记
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// 调度计数器
#[derive(Debug, Default)]
struct Counters {
    running: AtomicBool,
    rounds: AtomicU64,
    dispatched: AtomicU64,
    skipped: AtomicU64,
}

/// 探测调度器实现
pub struct ProbeScheduler {
    /// 探测器
    prober: Arc<dyn Prober>,
    /// 统计聚合器
    stats: Arc<StatsAggregator>,
    /// 调度槽位，按配置顺序排列
    slots: Arc<Vec<ProbeSlot>>,
    /// 轮次间隔
    interval: Duration,
    /// 调度计数器
    counters: Arc<Counters>,
    /// 轮次循环任务
    round_task: Mutex<Option<JoinHandle<()>>>,
}

impl ProbeScheduler {
    /// 创建新的探测调度器
    ///
    /// # 参数
    /// * `prober` - 探测器，其默认超时即每次探测的超时
    /// * `stats` - 统计聚合器
    /// * `targets` - 探测目标列表
    /// * `interval` - 轮次间隔，为0时 `start` 会返回错误
    pub fn new(
        prober: Arc<dyn Prober>,
        stats: Arc<StatsAggregator>,
        targets: Vec<HostTarget>,
        interval: Duration,
    ) -> Self {
        let slots = targets
            .into_iter()
            .map(|target| ProbeSlot {
                target,
                in_flight: Arc::new(AtomicBool::new(false)),
            })
            .collect();

        Self {
            prober,
            stats,
            slots: Arc::new(slots),
            interval,
            counters: Arc::new(Counters::default()),
            round_task: Mutex::new(None),
        }
    }

    /// 执行一轮探测并等待全部完成，返回本轮之后的统计视图
    pub async fn run_once(&self) -> Vec<HostSnapshot> {
        let targets: Vec<HostTarget> = self.slots.iter().map(|s| s.target.clone()).collect();
        let outcomes = self.prober.probe_batch(&targets).await;

        for (target, outcome) in targets.iter().zip(outcomes) {
            self.stats.record(&target.host, outcome).await;
        }
        self.counters.rounds.fetch_add(1, Ordering::Relaxed);
        self.counters
            .dispatched
            .fetch_add(targets.len() as u64, Ordering::Relaxed);

        self.stats.snapshot().await
    }

    /// 派发一轮探测，不等待探测完成
    fn dispatch_round(
        slots: &[ProbeSlot],
        prober: &Arc<dyn Prober>,
        stats: &Arc<StatsAggregator>,
        counters: &Counters,
    ) {
        let round = counters.rounds.fetch_add(1, Ordering::Relaxed) + 1;

        for slot in slots {
            if slot
                .in_flight
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                counters.skipped.fetch_add(1, Ordering::Relaxed);
                debug!("上一次探测尚未完成，跳过: {} (轮次 {})", slot.target, round);
                continue;
            }

            counters.dispatched.fetch_add(1, Ordering::Relaxed);

            let guard = InFlightGuard(Arc::clone(&slot.in_flight));
            let target = slot.target.clone();
            let prober = Arc::clone(prober);
            let stats = Arc::clone(stats);

            tokio::spawn(async move {
                let _guard = guard;
                let outcome = prober.probe(&target).await;
                stats.record(&target.host, outcome).await;
                debug!(
                    "探测完成: {} success={} elapsed={:?}",
                    target, outcome.success, outcome.elapsed
                );
            });
        }
    }
}

#[async_trait]
impl Scheduler for ProbeScheduler {
    async fn start(&self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        let mut round_task = self.round_task.lock().await;
        if self.counters.running.load(Ordering::Acquire) {
            return Err(anyhow!("调度器已在运行"));
        }

        // tokio::time::interval 不接受零周期
        if self.interval.is_zero() {
            return Err(anyhow!("探测间隔不能为0"));
        }

        info!(
            "启动探测调度器，主机数量: {}，间隔: {:?}",
            self.slots.len(),
            self.interval
        );

        self.counters.running.store(true, Ordering::Release);

        let slots = Arc::clone(&self.slots);
        let prober = Arc::clone(&self.prober);
        let stats = Arc::clone(&self.stats);
        let counters = Arc::clone(&self.counters);
        let period = self.interval;

        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        Self::dispatch_round(&slots, &prober, &stats, &counters);
                    }
                    _ = shutdown_rx.recv() => {
                        info!("收到关闭信号，探测调度器退出");
                        break;
                    }
                }
            }

            counters.running.store(false, Ordering::Release);
        });

        *round_task = Some(task);
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        info!("停止探测调度器");

        if let Some(task) = self.round_task.lock().await.take() {
            task.abort();
        }
        self.counters.running.store(false, Ordering::Release);

        info!("探测调度器已停止");
        Ok(())
    }

    async fn get_status(&self) -> SchedulerStatus {
        SchedulerStatus {
            is_running: self.counters.running.load(Ordering::Acquire),
            total_hosts: self.slots.len(),
            rounds: self.counters.rounds.load(Ordering::Relaxed),
            dispatched: self.counters.dispatched.load(Ordering::Relaxed),
            skipped: self.counters.skipped.load(Ordering::Relaxed),
        }
    }
}

impl Drop for ProbeScheduler {
    fn drop(&mut self) {
        // 调度器销毁时中止轮次循环
        if let Some(task) = self.round_task.get_mut().take() {
            task.abort();
        }
    }
}
