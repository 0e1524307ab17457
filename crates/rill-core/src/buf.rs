use alloc::vec::Vec;

use crate::error::{BufferError, Result};
use crate::view::ByteView;

/// `ByteStreamBuf` 定义对象安全的字节流缓冲只读契约。
///
/// # 设计背景（Why）
/// - 读取器与分帧器需要在不关心底层内存策略（连续 / 分段 / 共享存储）的
///   情况下消费字节流，统一契约使它们可以通过 `&mut dyn ByteStreamBuf`
///   驱动任意实现。
/// - 多数方法以“概念拼接”定义语义：无论内部如何分段，结果必须等价于把
///   所有可读字节按序拼接后再操作——这是分帧正确性的基石。
///
/// # 逻辑解析（How）
/// - 观察：[`chunk`] 暴露首个连续区（零拷贝借用），[`peek`] /
///   [`peek_exact`] / [`split_to`] 物化为 [`ByteView`]（非消费）。
/// - 消费：[`advance`] 推进读指针，[`take`] 等价于 `peek_exact` 后
///   `advance`。
/// - 检索：[`find`] / [`rfind`] 必须“流正确”——跨段边界的匹配同样要被
///   发现；[`coalesce`] 允许实现做内容保持的重整以换取前缀连续性。
///
/// # 契约说明（What）
/// - **前置条件**：`peek_exact(n)` / `split_to(n)` / `take(n)` 要求
///   `n <= len()`，否则返回 `buffer.need_more_data`；`advance(n)` 的越界是
///   调用方算术错误，返回 `buffer.out_of_range`。
/// - **后置条件**：非消费操作不改变 `len()`；消费操作结束后 `len()` 精确
///   反映剩余字节数；[`segments`] 返回的切片序列恰好覆盖全部可读字节、
///   按序、无空项。
/// - 实现必须满足 `Send + Sync + 'static` 以支持跨线程移交（单一逻辑
///   所有者驱动，契约本身不提供同步）。
///
/// # 设计取舍（Trade-offs）
/// - 为保证对象安全放弃泛型化零成本抽象，换取组件间的动态调度能力。
/// - [`chunk`] 返回的借用在下一次可变访问前有效，由借用检查器静态保证，
///   无需引用计数。
///
/// [`chunk`]: Self::chunk
/// [`peek`]: Self::peek
/// [`peek_exact`]: Self::peek_exact
/// [`split_to`]: Self::split_to
/// [`advance`]: Self::advance
/// [`take`]: Self::take
/// [`find`]: Self::find
/// [`rfind`]: Self::rfind
/// [`coalesce`]: Self::coalesce
/// [`segments`]: Self::segments
pub trait ByteStreamBuf: Send + Sync + 'static {
    /// 返回当前可读字节总数。要求 O(1)：热路径用它判断是否需要更多数据。
    fn len(&self) -> usize;

    /// 判断缓冲是否已读空。
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 返回首个连续可读区的借用；空缓冲返回空切片。
    fn chunk(&self) -> &[u8];

    /// 以借用切片序列暴露全部可读字节的散布/聚集布局。
    ///
    /// 序列按序恰好覆盖可读字节，不含空项；连续实现恰好返回一项。
    fn segments(&self) -> Vec<&[u8]>;

    /// 返回覆盖全部剩余字节的视图，非消费。
    fn peek(&self) -> ByteView;

    /// 返回前 `n` 字节的视图，非消费；`len() < n` 时返回欠载错误。
    fn peek_exact(&self, n: usize) -> Result<ByteView>;

    /// 前缀取用惯用名：契约与 [`peek_exact`](Self::peek_exact) 完全一致。
    fn split_to(&self, n: usize) -> Result<ByteView> {
        self.peek_exact(n)
    }

    /// 消费并返回前 `n` 字节的视图，等价于 `peek_exact(n)` 后 `advance(n)`。
    fn take(&mut self, n: usize) -> Result<ByteView> {
        let view = self.peek_exact(n)?;
        self.advance(n)?;
        Ok(view)
    }

    /// 丢弃前 `n` 字节；`n > len()` 时返回 `buffer.out_of_range` 且缓冲不变。
    fn advance(&mut self, n: usize) -> Result<()>;

    /// 确保前 `n` 字节物理连续并返回其借用，非消费。
    ///
    /// 实现可以做内容保持的段重整（把跨段前缀拷入新段）；reserve 未完结时
    /// 返回 `buffer.outstanding_reserve`，`len() < n` 时返回欠载错误。
    fn coalesce(&mut self, n: usize) -> Result<&[u8]>;

    /// 在可读字节的概念拼接中查找 `needle` 首次出现的偏移。
    ///
    /// `start` / `end` 为相对可读区的偏移（`end = None` 取 `len()`），越界
    /// 自动收拢到合法区间。跨段边界的匹配必须被发现。空 `needle` 返回
    /// 收拢后的 `start`。
    fn find(&self, needle: &[u8], start: usize, end: Option<usize>) -> Option<usize>;

    /// 与 [`find`](Self::find) 对偶，返回最后一次出现的偏移。
    fn rfind(&self, needle: &[u8], start: usize, end: Option<usize>) -> Option<usize>;
}

/// `MutByteStreamBuf` 在只读契约之上追加生产者侧的写入协议。
///
/// # 逻辑解析（How）
/// - [`write`](Self::write) 是常规追加路径；[`write_view`](Self::write_view)
///   允许把既有视图续写进缓冲，分段实现可覆写为零拷贝收编。
/// - [`reserve`](Self::reserve) / [`commit`](Self::commit) 构成两阶段零拷贝
///   写入：调用方直接把数据填入返回的可写区（如 `read` 进 socket 缓冲），
///   再提交实际写入的字节数。
///
/// # 契约说明（What）
/// - 任意时刻至多一个未完结 reserve：重复 `reserve` 返回
///   `buffer.outstanding_reserve`，无 reserve 时 `commit` 返回
///   `buffer.no_outstanding_reserve`，`commit(k)` 要求 `k <= n`。
/// - reserve 未完结期间，`write` / `advance` / `take` / `coalesce` /
///   `reserve` 一律拒绝（存储形态可能随提交而变化）；非消费读取不受限。
/// - [`reserve`](Self::reserve) 返回的可写区已全部清零，长度恰为 `n`。
/// - 配置了容量上限的实现，在追加会使 `len()` 超限时返回
///   `buffer.too_large`。
pub trait MutByteStreamBuf: ByteStreamBuf {
    /// 把 `data` 追加到可读区尾部，摊还 O(len(data))。
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// 追加一个既有视图的全部字节。
    ///
    /// 缺省实现逐段拷贝写入；能够共享段所有权的实现应覆写为零拷贝收编。
    fn write_view(&mut self, view: &ByteView) -> Result<()> {
        for seg in view.segments() {
            self.write(seg)?;
        }
        Ok(())
    }

    /// 预留 `n` 字节的可写区并返回其独占借用（两阶段写入的第一阶段）。
    fn reserve(&mut self, n: usize) -> Result<&mut [u8]>;

    /// 提交最近一次 reserve 中实际写入的前 `k` 字节，使其进入可读区。
    fn commit(&mut self, k: usize) -> Result<()>;
}

/// 统一的只读缓冲类型擦除别名。
pub type ErasedStreamBuf = dyn ByteStreamBuf;

/// 统一的可写缓冲类型擦除别名。
pub type ErasedStreamBufMut = dyn MutByteStreamBuf;

/// 按 `bytes` 切片语义把 `start` / `end` 收拢到 `[0, len]` 区间。
///
/// 返回 `(start, end)` 且保证 `start <= end`，供各实现与检索助手复用。
pub fn clamp_range(len: usize, start: usize, end: Option<usize>) -> (usize, usize) {
    let start = start.min(len);
    let end = end.unwrap_or(len).min(len).max(start);
    (start, end)
}

/// 在单个连续切片内查找 `needle` 首次出现的位置（`bytes.find` 语义）。
///
/// `start` / `end` 已收拢；空 `needle` 命中 `start`。实现为朴素窗口扫描：
/// 定界符与长度字段都很短，窗口扫描在此量级上优于引入额外依赖。
pub fn find_in_slice(haystack: &[u8], needle: &[u8], start: usize, end: usize) -> Option<usize> {
    if needle.is_empty() {
        return Some(start);
    }
    let window = haystack.get(start..end)?;
    if window.len() < needle.len() {
        return None;
    }
    window
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| start + i)
}

/// 与 [`find_in_slice`] 对偶的反向查找。
pub fn rfind_in_slice(haystack: &[u8], needle: &[u8], start: usize, end: usize) -> Option<usize> {
    if needle.is_empty() {
        return Some(end);
    }
    let window = haystack.get(start..end)?;
    if window.len() < needle.len() {
        return None;
    }
    window
        .windows(needle.len())
        .rposition(|w| w == needle)
        .map(|i| start + i)
}

/// 校验 `peek_exact` 族操作的欠载前置条件。
pub fn ensure_readable(len: usize, n: usize) -> Result<()> {
    if n > len {
        return Err(BufferError::need_more_data(n, len));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_range_follows_bytes_slice_semantics() {
        // Why: find/rfind 的范围语义以 `bytes.find` 为准，越界收拢而非报错。
        assert_eq!(clamp_range(5, 0, None), (0, 5));
        assert_eq!(clamp_range(5, 2, Some(4)), (2, 4));
        assert_eq!(clamp_range(5, 7, Some(9)), (5, 5));
        assert_eq!(clamp_range(5, 3, Some(1)), (3, 3));
    }

    #[test]
    fn slice_find_handles_edges() {
        let hay = b"abcabc";
        assert_eq!(find_in_slice(hay, b"abc", 0, 6), Some(0));
        assert_eq!(find_in_slice(hay, b"abc", 1, 6), Some(3));
        assert_eq!(find_in_slice(hay, b"abc", 1, 5), None);
        assert_eq!(find_in_slice(hay, b"", 2, 6), Some(2));
        assert_eq!(rfind_in_slice(hay, b"abc", 0, 6), Some(3));
        assert_eq!(rfind_in_slice(hay, b"abc", 0, 5), Some(0));
        assert_eq!(rfind_in_slice(hay, b"", 0, 4), Some(4));
    }
}
