//! TCP Vitals 主程序入口
//!
//! 周期性探测主机的TCP可达性，并通过HTTP展示统计

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tcp_vitals::cli::Args;
use tcp_vitals::config::{resolve_config, ConfigSource, MonitorConfig, TomlConfigLoader, WebConfig};
use tcp_vitals::health::{ProbeScheduler, Scheduler, StatsAggregator, TcpProber};
use tcp_vitals::logging::{setup_logging, LogConfig};
use tcp_vitals::web::WebServer;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

/// 等待Web服务器优雅退出的最长时间
const WEB_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行参数
    let args = Args::parse_args();

    // 初始化日志系统
    let log_config = LogConfig {
        level: args.log_level.clone().into(),
        file_path: args.log_file.clone(),
        json_format: args.log_json,
    };

    setup_logging(&log_config).context("初始化日志系统失败")?;

    info!("TCP Vitals v{} 启动", tcp_vitals::VERSION);

    if let Err(e) = run(&args).await {
        error!("运行失败: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// 加载配置并按运行模式启动
async fn run(args: &Args) -> Result<()> {
    let config = load_config(args).await?;

    let targets = config.targets();
    let stats = Arc::new(StatsAggregator::for_targets(&targets));
    let prober = Arc::new(TcpProber::new(config.timeout));
    let scheduler = ProbeScheduler::new(prober, Arc::clone(&stats), targets, config.interval);

    if args.once {
        info!("执行单轮探测...");
        for snapshot in scheduler.run_once().await {
            info!("{}", snapshot.summary_line());
        }
        return Ok(());
    }

    run_service(scheduler, stats).await
}

/// 解析最终配置并输出配置警告
async fn load_config(args: &Args) -> Result<MonitorConfig> {
    let loader = TomlConfigLoader::default();
    let (config, source) = resolve_config(&loader, &args.cli_settings(), args.config.as_deref())
        .await
        .context("加载配置失败")?;

    match &source {
        ConfigSource::File(path) => info!("使用配置文件: {}", path.display()),
        ConfigSource::CommandLine => info!("使用命令行配置"),
    }

    for warning in config.warnings() {
        warn!("配置警告: {}", warning);
    }

    info!(
        "监控主机: {:?}，端口: {}，间隔: {:?}，超时: {:?}",
        config.hosts, config.port, config.interval, config.timeout
    );

    Ok(config)
}

/// 常驻运行：启动Web服务器和调度器，直到收到中断信号
async fn run_service(scheduler: ProbeScheduler, stats: Arc<StatsAggregator>) -> Result<()> {
    let (shutdown_tx, mut shutdown_rx) = broadcast::channel(1);

    // 监听地址绑定失败属于启动失败
    let web_server = WebServer::new(WebConfig::default(), Arc::clone(&stats));
    let listener = web_server.bind().await.context("启动Web服务器失败")?;

    let web_shutdown_rx = shutdown_tx.subscribe();
    let web_server_handle = tokio::spawn(async move {
        if let Err(e) = web_server.serve(listener, web_shutdown_rx).await {
            error!("Web服务器运行失败: {}", e);
        }
    });

    scheduler
        .start(shutdown_tx.subscribe())
        .await
        .context("启动探测调度器失败")?;

    // 设置Ctrl+C信号处理
    let shutdown_tx_clone = shutdown_tx.clone();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("收到中断信号，正在停止服务...");
                let _ = shutdown_tx_clone.send(());
            }
            Err(err) => {
                error!("监听中断信号失败: {}", err);
            }
        }
    });

    info!("TCP Vitals 已启动");

    // 等待关闭信号
    if let Err(err) = shutdown_rx.recv().await {
        error!("等待关闭信号失败: {}", err);
    }

    scheduler.stop().await.context("停止探测调度器失败")?;

    let status = scheduler.get_status().await;
    info!(
        "共执行 {} 轮探测，派发 {} 次，跳过 {} 次",
        status.rounds, status.dispatched, status.skipped
    );
    for snapshot in stats.snapshot().await {
        info!("{}", snapshot.summary_line());
    }

    match tokio::time::timeout(WEB_SHUTDOWN_TIMEOUT, web_server_handle).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("等待Web服务器退出失败: {}", e),
        Err(_) => warn!("Web服务器未在 {:?} 内退出", WEB_SHUTDOWN_TIMEOUT),
    }

    info!("服务已停止");
    Ok(())
}
