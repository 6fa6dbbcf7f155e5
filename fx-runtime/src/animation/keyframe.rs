//! # Keyframe 模块
//!
//! 粒子视觉状态的关键帧与采样帧。

use crate::geometry::Vec2;

/// 关键帧
///
/// `offset` 为 `None` 时由 [`resolve_offsets`] 在相邻已知偏移之间均匀分配。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe {
    /// 在片段中的位置（0.0 - 1.0）
    pub offset: Option<f64>,
    /// 相对于粒子初始位置的平移（px）
    pub translate: Vec2,
    /// 缩放因子
    pub scale: f64,
    /// 透明度
    pub opacity: f64,
    /// 模糊半径（px）
    pub blur: f64,
}

impl Keyframe {
    /// 创建关键帧（无偏移、无模糊）
    pub fn new(translate: Vec2, scale: f64, opacity: f64) -> Self {
        Self {
            offset: None,
            translate,
            scale,
            opacity,
            blur: 0.0,
        }
    }

    /// 设置显式偏移
    pub fn at(mut self, offset: f64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// 设置模糊半径
    pub fn with_blur(mut self, blur: f64) -> Self {
        self.blur = blur;
        self
    }

    /// 转换为采样帧
    pub fn frame(&self) -> Frame {
        Frame {
            translate: self.translate,
            scale: self.scale,
            opacity: self.opacity,
            blur: self.blur,
        }
    }
}

impl std::fmt::Display for Keyframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(offset) = self.offset {
            write!(f, "@{} ", offset)?;
        }
        write!(
            f,
            "translate({}px, {}px) scale({}) opacity {}",
            self.translate.x, self.translate.y, self.scale, self.opacity
        )?;
        if self.blur > 0.0 {
            write!(f, " blur({}px)", self.blur)?;
        }
        Ok(())
    }
}

/// 某一时刻的视觉状态
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub translate: Vec2,
    pub scale: f64,
    pub opacity: f64,
    pub blur: f64,
}

impl Frame {
    /// 线性插值
    pub fn lerp(&self, other: &Frame, t: f64) -> Frame {
        Frame {
            translate: self.translate.lerp(other.translate, t),
            scale: self.scale + (other.scale - self.scale) * t,
            opacity: self.opacity + (other.opacity - self.opacity) * t,
            blur: self.blur + (other.blur - self.blur) * t,
        }
    }
}

/// 计算每个关键帧的实际偏移
///
/// 首帧缺省为 0，末帧缺省为 1，中间缺省帧在相邻已知偏移之间均分。
pub fn resolve_offsets(keyframes: &[Keyframe]) -> Vec<f64> {
    let n = keyframes.len();
    let mut offsets: Vec<Option<f64>> = keyframes.iter().map(|k| k.offset).collect();
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![offsets[0].unwrap_or(1.0)];
    }
    if offsets[0].is_none() {
        offsets[0] = Some(0.0);
    }
    if offsets[n - 1].is_none() {
        offsets[n - 1] = Some(1.0);
    }

    let mut resolved = Vec::with_capacity(n);
    let mut last_known = 0;
    resolved.push(offsets[0].unwrap_or(0.0));
    for i in 1..n {
        if let Some(offset) = offsets[i] {
            let start = resolved[last_known];
            let gap = (i - last_known) as f64;
            for k in (last_known + 1)..i {
                resolved.push(start + (offset - start) * (k - last_known) as f64 / gap);
            }
            resolved.push(offset);
            last_known = i;
        }
    }
    resolved
}

/// 在给定进度处采样关键帧序列
pub fn sample(keyframes: &[Keyframe], offsets: &[f64], progress: f64) -> Option<Frame> {
    let first = keyframes.first()?;
    let last = keyframes.last()?;
    if progress <= offsets[0] {
        return Some(first.frame());
    }

    for i in 0..keyframes.len() - 1 {
        let (from, to) = (offsets[i], offsets[i + 1]);
        if progress <= to {
            let span = to - from;
            let t = if span <= 0.0 {
                1.0
            } else {
                (progress - from) / span
            };
            return Some(keyframes[i].frame().lerp(&keyframes[i + 1].frame(), t));
        }
    }
    Some(last.frame())
}
