//! # fx-playground
//!
//! 特效演练场命令行。
//!
//! ## 用法
//!
//! ```bash
//! cargo run -p fx-playground -- demo firework
//! cargo run -p fx-playground -- run my-scenario.json --seed 42 --json
//! cargo run -p fx-playground -- effects
//! cargo run -p fx-playground -- init-config fx.json
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use fx_playground::{PlaygroundConfig, RunReport, Scenario, ScenarioRunner, demo_names, load_demo};
use tracing::Level;

#[derive(Parser)]
#[command(name = "fx-playground")]
#[command(about = "特效演练场 - 在虚拟舞台上运行特效场景")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 配置文件（JSON）
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// 随机种子（覆盖配置文件）
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// 以 JSON 输出报告
    #[arg(long, global = true)]
    json: bool,

    /// 输出调试日志
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// 运行场景文件
    Run {
        /// 场景文件路径
        scenario: PathBuf,
    },

    /// 运行内置演示
    Demo {
        /// 演示名称（ripple-remote / firework / burning）
        name: String,
    },

    /// 列出已注册的效果及其默认值
    Effects,

    /// 写出默认配置文件
    InitConfig {
        /// 输出路径
        #[arg(default_value = "fx-playground.json")]
        path: PathBuf,
    },
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("fx-playground error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => PlaygroundConfig::try_load(path)
            .with_context(|| format!("无法读取配置文件 {}", path.display()))?,
        None => PlaygroundConfig::default(),
    };
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    config.validate()?;

    let level = if cli.verbose { Level::DEBUG } else { config.level()? };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run { scenario } => {
            let scenario = Scenario::load(&scenario)
                .with_context(|| format!("无法加载场景 {}", scenario.display()))?;
            let report = ScenarioRunner::new(&config).run(&scenario)?;
            print_report(&report, cli.json)?;
        }
        Commands::Demo { name } => {
            let scenario = load_demo(&name)?;
            let report = ScenarioRunner::new(&config).run(&scenario)?;
            print_report(&report, cli.json)?;
        }
        Commands::Effects => {
            let runner = ScenarioRunner::new(&config);
            let registry = runner.registry();
            for descriptor in registry.kinds().into_iter().filter_map(|k| registry.descriptor(k)) {
                let defaults = serde_json::to_string(&descriptor.defaults)?;
                println!("{:<10} {defaults}", descriptor.kind.name());
            }
            println!("\n演示: {}", demo_names().join(", "));
        }
        Commands::InitConfig { path } => {
            config.save(&path)?;
            println!("已写出配置文件 {}", path.display());
        }
    }
    Ok(())
}

fn print_report(report: &RunReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("{report}");
    }
    Ok(())
}
