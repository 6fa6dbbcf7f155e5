//! # Clip 模块
//!
//! 单个粒子的动画片段：关键帧序列 + 时长 + 缓动。
//!
//! 片段不知道粒子是谁，只负责时间轴推进与帧采样；
//! 完成后保持末帧（fill forwards），由舞台触发完成回调。

use super::Easing;
use super::keyframe::{self, Frame, Keyframe};

/// 片段状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClipState {
    /// 正在播放
    #[default]
    Playing,
    /// 已完成
    Completed,
}

impl ClipState {
    /// 是否已结束
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// 关键帧动画片段
#[derive(Debug, Clone)]
pub struct Clip {
    keyframes: Vec<Keyframe>,
    offsets: Vec<f64>,
    /// 时长（毫秒）
    pub duration_ms: f64,
    /// 缓动函数（作用于整个片段进度）
    pub easing: Easing,
    /// 当前状态
    pub state: ClipState,
    /// 当前进度（0.0 - 1.0，已应用缓动）
    pub progress: f64,
    elapsed: f64,
}

impl Clip {
    /// 创建片段
    ///
    /// 时长不大于 0 的片段直接进入完成状态。
    pub fn new(keyframes: Vec<Keyframe>, duration_ms: f64, easing: Easing) -> Self {
        let offsets = keyframe::resolve_offsets(&keyframes);
        let (state, progress) = if duration_ms > 0.0 {
            (ClipState::Playing, 0.0)
        } else {
            (ClipState::Completed, 1.0)
        };

        Self {
            keyframes,
            offsets,
            duration_ms,
            easing,
            state,
            progress,
            elapsed: 0.0,
        }
    }

    /// 推进片段
    ///
    /// # 返回
    /// - `true`: 片段仍在播放
    /// - `false`: 片段已结束
    pub fn update(&mut self, dt_ms: f64) -> bool {
        match self.state {
            ClipState::Playing => {
                self.elapsed += dt_ms.max(0.0);
                let raw = self.elapsed / self.duration_ms;
                if raw >= 1.0 {
                    self.progress = 1.0;
                    self.state = ClipState::Completed;
                    false
                } else {
                    self.progress = self.easing.apply(raw);
                    true
                }
            }
            ClipState::Completed => false,
        }
    }

    /// 当前帧
    pub fn current_frame(&self) -> Option<Frame> {
        keyframe::sample(&self.keyframes, &self.offsets, self.progress)
    }

    /// 是否已结束
    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }
}
