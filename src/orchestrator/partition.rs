//! 工作分区
//!
//! 把目录切成 N 段连续、保序的子序列，各段大小最多相差 1

/// 按工作者数量切分
///
/// 前 `len % n` 段各多分一个元素；`workers` 为 0 时按 1 处理。
/// 元素少于工作者时，靠后的分区为空。
pub fn partition<T: Clone>(items: &[T], workers: usize) -> Vec<Vec<T>> {
    let n = workers.max(1);
    let base = items.len() / n;
    let extra = items.len() % n;

    let mut partitions = Vec::with_capacity(n);
    let mut start = 0;
    for i in 0..n {
        let size = base + usize::from(i < extra);
        partitions.push(items[start..start + size].to_vec());
        start += size;
    }
    partitions
}
