//! # Config 模块
//!
//! Playground 配置管理。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高）
//! 2. 配置文件（JSON）
//! 3. 默认值（最低）

use std::fs;
use std::path::Path;

use fx_runtime::{
    BurningOptions, EffectOptions, EffectRegistry, FireworkOptions, RippleOptions,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Playground 配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaygroundConfig {
    /// 随机种子；未配置时每次运行结果不同
    #[serde(default)]
    pub seed: Option<u64>,

    /// 每帧推进的虚拟时间（毫秒）
    #[serde(default = "default_frame_ms")]
    pub frame_ms: f64,

    /// 日志级别（trace / debug / info / warn / error）
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// 覆盖内置的注册默认值
    #[serde(default)]
    pub defaults: EffectDefaults,
}

/// 各效果的注册默认值覆盖
///
/// 未给出的字段沿用内置默认值。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectDefaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ripple: Option<RippleOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firework: Option<FireworkOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub burning: Option<BurningOptions>,
}

// 默认值函数
fn default_frame_ms() -> f64 {
    16.0
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        Self {
            seed: None,
            frame_ms: default_frame_ms(),
            log_level: default_log_level(),
            defaults: EffectDefaults::default(),
        }
    }
}

impl PlaygroundConfig {
    /// 读取并解析配置文件
    pub fn try_load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// 加载配置文件
    ///
    /// 如果文件不存在或解析失败，返回默认配置并记录警告。
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::try_load(path) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "配置文件加载成功");
                config
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "配置文件不可用，使用默认配置");
                Self::default()
            }
        }
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.frame_ms.is_finite() || self.frame_ms <= 0.0 {
            return Err(ConfigError::ValidationFailed(format!(
                "frame_ms 必须为正数，当前为 {}",
                self.frame_ms
            )));
        }
        self.level()?;
        Ok(())
    }

    /// 解析日志级别
    pub fn level(&self) -> Result<tracing::Level, ConfigError> {
        self.log_level
            .parse()
            .map_err(|_| ConfigError::ValidationFailed(format!("未知日志级别: {}", self.log_level)))
    }

    /// 把配置的默认值写入注册表（叠加在内置默认值之上）
    pub fn apply_defaults(&self, registry: &EffectRegistry) {
        let overrides: [Option<EffectOptions>; 3] = [
            self.defaults
                .ripple
                .as_ref()
                .map(|o| RippleOptions::builtin().overlay(o).into()),
            self.defaults
                .firework
                .as_ref()
                .map(|o| FireworkOptions::builtin().overlay(o).into()),
            self.defaults
                .burning
                .as_ref()
                .map(|o| BurningOptions::builtin().overlay(o).into()),
        ];
        for options in overrides.into_iter().flatten() {
            let kind = options.kind();
            if registry.set_defaults(options) {
                tracing::debug!(effect = %kind, "已应用配置默认值");
            } else {
                tracing::warn!(effect = %kind, "效果未注册，忽略配置默认值");
            }
        }
    }
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO 错误
    #[error("配置 IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 序列化 / 反序列化失败
    #[error("配置解析失败: {0}")]
    Parse(#[from] serde_json::Error),

    /// 验证失败
    #[error("配置验证失败: {0}")]
    ValidationFailed(String),
}
