//! # Error 模块
//!
//! 定义 fx-runtime 中使用的错误类型。
//!
//! 运行时的空操作路径（缺失表面、`active: false`、未注册的效果）不产生错误；
//! 错误只出现在解析边界：效果名称与 JSON 选项。

use thiserror::Error;

use crate::effects::EffectKind;

/// 效果错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EffectError {
    /// 未知的效果名称
    #[error("未知效果 '{name}'，可用效果：ripple, scale, fade, firework, burning")]
    UnknownEffect { name: String },

    /// 选项无法解析
    #[error("效果 '{kind}' 的选项无效 - {message}")]
    InvalidOptions { kind: EffectKind, message: String },

    /// 选项与效果类型不匹配
    #[error("选项类型不匹配：期望 {expected}，实际 {actual}")]
    KindMismatch {
        expected: EffectKind,
        actual: EffectKind,
    },
}

/// Result 类型别名
pub type EffectResult<T> = Result<T, EffectError>;
