//! 游戏处理上下文
//!
//! 封装"哪个工作者正在处理分区里的第几个游戏"这一信息

use std::fmt::Display;

/// 游戏处理上下文
///
/// 所有在工作者内部输出的日志都以它作为前缀
#[derive(Debug, Clone)]
pub struct ItemCtx {
    /// 工作者编号（从1开始）
    pub worker_id: usize,

    /// 游戏在分区中的索引（从1开始）
    pub index: usize,

    /// 分区大小
    pub total: usize,

    /// 由商店链接得出的短名
    pub slug: String,
}

impl ItemCtx {
    pub fn new(worker_id: usize, index: usize, total: usize, slug: String) -> Self {
        Self {
            worker_id,
            index,
            total,
            slug,
        }
    }
}

impl Display for ItemCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[worker {} #{} {}]", self.worker_id, self.index, self.slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefix() {
        let ctx = ItemCtx::new(2, 5, 9, "beat-saber".to_string());
        assert_eq!(ctx.to_string(), "[worker 2 #5 beat-saber]");
    }
}
