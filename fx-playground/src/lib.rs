//! # FX Playground
//!
//! 无头演练场：在虚拟舞台上按场景文件执行特效，并输出运行报告。
//!
//! ## 模块结构
//!
//! - [`config`]：配置文件（种子、帧长、日志级别、注册默认值覆盖）
//! - [`scenario`]：场景文件格式与校验
//! - [`runner`]：逐帧执行场景并汇总 [`RunReport`]
//! - [`demos`]：内置演示场景

pub mod config;
pub mod demos;
pub mod runner;
pub mod scenario;

pub use config::{ConfigError, EffectDefaults, PlaygroundConfig};
pub use demos::{demo_names, load_demo};
pub use runner::{RunReport, ScenarioRunner, TimelineSample};
pub use scenario::{BindingDecl, EffectCall, Scenario, ScenarioError, Step, SurfaceDecl};
