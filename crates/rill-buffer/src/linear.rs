use alloc::vec::Vec;

use bytes::Bytes;
use rill_core::buf::{
    ByteStreamBuf, MutByteStreamBuf, clamp_range, ensure_readable, find_in_slice, rfind_in_slice,
};
use rill_core::error::{BufferError, BufferErrorKind, Result};
use rill_core::view::ByteView;

const DEFAULT_COMPACT_THRESHOLD: usize = 64 * 1024;

/// `LinearStreamBuf` 是单块连续存储的可写字节流缓冲。
///
/// # 设计背景（Why）
/// - 以一条 `Vec<u8>` 加读写双指针承载全部字节：检索与 `coalesce` 天然
///   零拷贝、恒为连续，是头部解析密集型协议的首选底座。
/// - 代价在写路径与视图：增长可能搬迁存储，因此视图采取“取景即拷贝”
///   策略（物化为独立 `Bytes`），保证视图稳定而无需钉住底层存储。
///
/// # 逻辑解析（How）
/// - `rpos`/`wpos` 标记已消费前缀与已写入末尾；消费只推进 `rpos`。
/// - 已消费前缀跨过 `compact_threshold` 且不少于已写入区一半时，做一次
///   前移压实，避免“小尾巴钉住大缓冲”。
/// - `reserve(n)` 在尾部补零扩展并借出该区间；`commit(k)` 截断未使用的
///   预留并把前 `k` 字节并入可读区。
///
/// # 契约说明（What）
/// - 配置 `max_bytes` 后，任何使可读量超限的追加返回 `buffer.too_large`。
/// - reserve 未完结期间，`write`/`advance`/`take`/`coalesce`/`reserve`
///   返回 `buffer.outstanding_reserve`；非消费读取不受限。
///
/// # 设计取舍（Trade-offs）
/// - 压实是纯优化：语义不依赖它，触发阈值只影响内存峰值与搬移成本。
/// - 视图拷贝换来的是实现极简与借用关系清晰；需要零拷贝视图时应选用
///   分段缓冲。
#[derive(Debug)]
pub struct LinearStreamBuf {
    ba: Vec<u8>,
    rpos: usize,
    wpos: usize,
    max_bytes: Option<usize>,
    compact_threshold: usize,
    resv_len: Option<usize>,
    compactions: u64,
}

impl LinearStreamBuf {
    /// 构造空缓冲，默认无容量上限、压实阈值 64 KiB。
    pub fn new() -> Self {
        Self {
            ba: Vec::new(),
            rpos: 0,
            wpos: 0,
            max_bytes: None,
            compact_threshold: DEFAULT_COMPACT_THRESHOLD,
            resv_len: None,
            compactions: 0,
        }
    }

    /// 设置可读字节总量上限，超限追加返回 `buffer.too_large`。
    pub fn with_max_bytes(mut self, max_bytes: Option<usize>) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// 预分配底层存储容量，减少细碎写入引发的扩容搬迁。
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.ba.reserve(capacity);
        self
    }

    /// 设置压实阈值：已消费前缀达到该字节数才考虑前移压实。
    pub fn with_compact_threshold(mut self, threshold: usize) -> Self {
        self.compact_threshold = threshold;
        self
    }

    /// 返回已发生的压实次数（诊断用）。
    pub fn compactions(&self) -> u64 {
        self.compactions
    }

    fn readable(&self) -> &[u8] {
        &self.ba[self.rpos..self.wpos]
    }

    fn check_no_reserve(&self, op: &str) -> Result<()> {
        if self.resv_len.is_some() {
            return Err(BufferError::outstanding_reserve(op));
        }
        Ok(())
    }

    /// 读空后复位双指针并释放已写字节，保持容量以迎接下一轮写入。
    fn reset_if_empty(&mut self) {
        if self.rpos == self.wpos {
            self.rpos = 0;
            self.wpos = 0;
            self.ba.clear();
        }
    }

    /// 已消费前缀足够大时前移压实，丢弃前缀、回收搬移空间。
    fn maybe_compact(&mut self) {
        if self.rpos >= self.compact_threshold && self.wpos > 0 && self.rpos * 2 >= self.wpos {
            self.ba.drain(..self.rpos);
            self.wpos -= self.rpos;
            self.rpos = 0;
            self.compactions += 1;
        }
    }

    fn check_capacity(&self, additional: usize) -> Result<()> {
        if let Some(max) = self.max_bytes
            && self.len() + additional > max
        {
            return Err(BufferError::new(
                BufferErrorKind::BufferTooLarge,
                alloc::format!(
                    "append of {additional} bytes exceeds max_bytes {max} ({} buffered)",
                    self.len()
                ),
            ));
        }
        Ok(())
    }
}

impl Default for LinearStreamBuf {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteStreamBuf for LinearStreamBuf {
    fn len(&self) -> usize {
        self.wpos - self.rpos
    }

    fn chunk(&self) -> &[u8] {
        self.readable()
    }

    fn segments(&self) -> Vec<&[u8]> {
        if self.is_empty() {
            Vec::new()
        } else {
            alloc::vec![self.readable()]
        }
    }

    fn peek(&self) -> ByteView {
        ByteView::from_bytes(Bytes::copy_from_slice(self.readable()))
    }

    fn peek_exact(&self, n: usize) -> Result<ByteView> {
        ensure_readable(self.len(), n)?;
        Ok(ByteView::from_bytes(Bytes::copy_from_slice(
            &self.readable()[..n],
        )))
    }

    fn advance(&mut self, n: usize) -> Result<()> {
        self.check_no_reserve("advance")?;
        if n > self.len() {
            return Err(BufferError::out_of_range("advance", n, self.len()));
        }
        self.rpos += n;
        self.maybe_compact();
        self.reset_if_empty();
        Ok(())
    }

    fn coalesce(&mut self, n: usize) -> Result<&[u8]> {
        self.check_no_reserve("coalesce")?;
        ensure_readable(self.len(), n)?;
        // 连续存储的前缀天然连续。
        Ok(&self.ba[self.rpos..self.rpos + n])
    }

    fn find(&self, needle: &[u8], start: usize, end: Option<usize>) -> Option<usize> {
        let (s, e) = clamp_range(self.len(), start, end);
        find_in_slice(self.readable(), needle, s, e)
    }

    fn rfind(&self, needle: &[u8], start: usize, end: Option<usize>) -> Option<usize> {
        let (s, e) = clamp_range(self.len(), start, end);
        rfind_in_slice(self.readable(), needle, s, e)
    }
}

impl MutByteStreamBuf for LinearStreamBuf {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        self.check_no_reserve("write")?;
        if data.is_empty() {
            return Ok(());
        }
        self.check_capacity(data.len())?;
        self.reset_if_empty();
        self.ba.extend_from_slice(data);
        self.wpos += data.len();
        Ok(())
    }

    fn reserve(&mut self, n: usize) -> Result<&mut [u8]> {
        self.check_no_reserve("reserve")?;
        // 预留区位于已写末尾之后，补零保证借出的区间已初始化。
        self.ba.resize(self.wpos + n, 0);
        self.resv_len = Some(n);
        Ok(&mut self.ba[self.wpos..self.wpos + n])
    }

    fn commit(&mut self, k: usize) -> Result<()> {
        let Some(n) = self.resv_len else {
            return Err(BufferError::no_outstanding_reserve());
        };
        if k > n {
            return Err(BufferError::out_of_range("commit", k, n));
        }
        self.resv_len = None;
        if let Some(max) = self.max_bytes
            && self.len() + k > max
        {
            self.ba.truncate(self.wpos);
            return Err(BufferError::new(
                BufferErrorKind::BufferTooLarge,
                alloc::format!("commit of {k} bytes exceeds max_bytes {max}"),
            ));
        }
        self.ba.truncate(self.wpos + k);
        self.wpos += k;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rill_core::error::codes;

    #[test]
    fn write_then_take_round_trips() {
        let mut buf = LinearStreamBuf::new();
        buf.write(b"hello ").expect("write");
        buf.write(b"world").expect("write");
        assert_eq!(buf.len(), 11);
        let head = buf.take(6).expect("take");
        assert_eq!(head.to_bytes().as_ref(), b"hello ");
        assert_eq!(buf.chunk(), b"world");
    }

    #[test]
    fn views_stay_stable_across_later_writes() {
        // Why: 取景即拷贝的全部意义——后续写入引发的存储搬迁不得影响已发出的视图。
        let mut buf = LinearStreamBuf::new();
        buf.write(b"abc").expect("write");
        let view = buf.peek_exact(3).expect("peek_exact");
        buf.write(&[b'x'; 4096]).expect("grow");
        buf.advance(2).expect("advance");
        assert_eq!(view.to_bytes().as_ref(), b"abc");
    }

    #[test]
    fn advance_past_end_is_out_of_range_and_keeps_state() {
        let mut buf = LinearStreamBuf::new();
        buf.write(b"abc").expect("write");
        let err = buf.advance(4).expect_err("越界 advance 必须失败");
        assert_eq!(err.code(), codes::BUFFER_OUT_OF_RANGE);
        assert_eq!(buf.len(), 3, "失败的 advance 不得改变缓冲");
    }

    #[test]
    fn reserve_commit_publishes_only_committed_prefix() {
        let mut buf = LinearStreamBuf::new();
        buf.write(b"ab").expect("write");
        let region = buf.reserve(8).expect("reserve");
        assert_eq!(region.len(), 8);
        region[..3].copy_from_slice(b"cde");
        buf.commit(3).expect("commit");
        assert_eq!(buf.chunk(), b"abcde");
        assert_eq!(buf.len(), 5);
    }

    #[test]
    fn reserve_protocol_violations_are_state_errors() {
        let mut buf = LinearStreamBuf::new();
        let err = buf.commit(0).expect_err("无 reserve 的 commit");
        assert_eq!(err.code(), codes::BUFFER_NO_OUTSTANDING_RESERVE);

        buf.reserve(4).expect("reserve");
        let err = buf.reserve(4).expect_err("重复 reserve");
        assert_eq!(err.code(), codes::BUFFER_OUTSTANDING_RESERVE);
        let err = buf.write(b"x").expect_err("reserve 期间 write");
        assert_eq!(err.code(), codes::BUFFER_OUTSTANDING_RESERVE);
        let err = buf.commit(5).expect_err("提交超出预留量");
        assert_eq!(err.code(), codes::BUFFER_OUT_OF_RANGE);
        // 越界提交不吞掉预留，修正参数后仍可正常完结。
        buf.commit(2).expect("commit");
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn max_bytes_limits_write_and_commit() {
        let mut buf = LinearStreamBuf::new().with_max_bytes(Some(4));
        buf.write(b"abc").expect("within limit");
        let err = buf.write(b"de").expect_err("超限追加");
        assert_eq!(err.code(), codes::BUFFER_TOO_LARGE);
        assert_eq!(buf.len(), 3);

        let region = buf.reserve(4).expect("reserve 本身不受限");
        region[..2].copy_from_slice(b"xy");
        let err = buf.commit(2).expect_err("提交后超限");
        assert_eq!(err.code(), codes::BUFFER_TOO_LARGE);
        assert_eq!(buf.len(), 3, "超限提交丢弃预留数据");
        buf.write(b"d").expect("恰好到达上限");
    }

    #[test]
    fn compaction_reclaims_consumed_prefix() {
        let mut buf = LinearStreamBuf::new().with_compact_threshold(8);
        buf.write(&[b'a'; 16]).expect("write");
        buf.advance(12).expect("advance");
        assert_eq!(buf.compactions(), 1);
        assert_eq!(buf.chunk(), &[b'a'; 4]);
    }

    #[test]
    fn find_sees_whole_readable_region() {
        let mut buf = LinearStreamBuf::new();
        buf.write(b"ab\r\ncd").expect("write");
        buf.advance(1).expect("advance");
        assert_eq!(buf.find(b"\r\n", 0, None), Some(1));
        assert_eq!(buf.rfind(b"c", 0, None), Some(3));
    }
}
