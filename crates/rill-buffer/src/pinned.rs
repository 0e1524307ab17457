use alloc::sync::Arc;
use alloc::vec::Vec;

use bytes::Bytes;
use rill_core::buf::{
    ByteStreamBuf, MutByteStreamBuf, clamp_range, ensure_readable, find_in_slice, rfind_in_slice,
};
use rill_core::error::{BufferError, BufferErrorKind, Result};
use rill_core::view::ByteView;

const DEFAULT_COMPACT_THRESHOLD: usize = 64 * 1024;

/// 视图持有者：把共享存储的一段可读区间适配成 `Bytes` 的所有权来源。
///
/// 每个存活视图持有一份 `Arc` 克隆，存储的引用计数因此成为天然的
/// “未关闭视图计数器”。
struct PinnedSlice {
    owner: Arc<Vec<u8>>,
    start: usize,
    end: usize,
}

impl AsRef<[u8]> for PinnedSlice {
    fn as_ref(&self) -> &[u8] {
        &self.owner[self.start..self.end]
    }
}

/// `PinnedStreamBuf` 是单块共享存储、带视图钉定纪律的可写缓冲。
///
/// # 设计背景（Why）
/// - 某些互操作场景要求视图直接引用缓冲的底层存储（不做取景拷贝，也不
///   分段）。此时“视图存活期间存储不得增长/搬迁”就从约定升级为硬性
///   纪律，否则视图将悬垂。
/// - 本实现把存储放进 `Arc<Vec<u8>>`：视图经 [`Bytes::from_owner`] 引用
///   同一分配，引用计数大于 1 即意味着有视图在场——这就是钉定判据，
///   无需额外的计数器字段。
///
/// # 逻辑解析（How）
/// - `peek` 族以 `Arc` 克隆 + 区间构造零拷贝视图；
/// - `write`/`commit` 在钉定期间直接拒绝（`buffer.pinned`），而不是冒险
///   搬迁存储；视图全部释放后写入恢复可用；
/// - `advance` 只推进读指针；压实仅在未钉定时尝试，钉定时静默跳过
///   （正确性不依赖压实）；
/// - reserve 使用独立暂存块，提交经由 `write` 汇入，因此同样受钉定纪律
///   约束。
///
/// # 契约说明（What）
/// - 视图一经创建即永久稳定（引用计数保证）；
/// - 钉定是单线程的自防误用护栏，不是跨线程互斥原语；
/// - 该底座适合受控的互操作场景，通用负载请优先分段/线性缓冲。
#[derive(Debug)]
pub struct PinnedStreamBuf {
    storage: Arc<Vec<u8>>,
    rpos: usize,
    compact_threshold: usize,
    resv: Option<Vec<u8>>,
}

impl PinnedStreamBuf {
    /// 构造空缓冲，压实阈值默认 64 KiB。
    pub fn new() -> Self {
        Self {
            storage: Arc::new(Vec::new()),
            rpos: 0,
            compact_threshold: DEFAULT_COMPACT_THRESHOLD,
            resv: None,
        }
    }

    /// 设置压实阈值。
    pub fn with_compact_threshold(mut self, threshold: usize) -> Self {
        self.compact_threshold = threshold;
        self
    }

    /// 是否存在存活视图正在钉定存储。
    pub fn is_pinned(&self) -> bool {
        Arc::strong_count(&self.storage) > 1
    }

    fn readable(&self) -> &[u8] {
        &self.storage[self.rpos..]
    }

    fn check_no_reserve(&self, op: &str) -> Result<()> {
        if self.resv.is_some() {
            return Err(BufferError::outstanding_reserve(op));
        }
        Ok(())
    }

    fn pinned_error(op: &str) -> BufferError {
        BufferError::new(
            BufferErrorKind::Pinned,
            alloc::format!("{op}: storage pinned by outstanding views"),
        )
    }

    /// 构造钉定存储的零拷贝视图。
    fn view_of(&self, start: usize, end: usize) -> ByteView {
        if start == end {
            return ByteView::empty();
        }
        ByteView::from_bytes(Bytes::from_owner(PinnedSlice {
            owner: Arc::clone(&self.storage),
            start,
            end,
        }))
    }

    /// 未钉定且已消费前缀足够大时压实；钉定时跳过（纯优化）。
    fn maybe_compact(&mut self) {
        if self.rpos >= self.compact_threshold
            && self.rpos * 2 >= self.storage.len()
            && let Some(storage) = Arc::get_mut(&mut self.storage)
        {
            storage.drain(..self.rpos);
            self.rpos = 0;
        }
    }
}

impl Default for PinnedStreamBuf {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteStreamBuf for PinnedStreamBuf {
    fn len(&self) -> usize {
        self.storage.len() - self.rpos
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
        self.view_of(self.rpos, self.storage.len())
    }

    fn peek_exact(&self, n: usize) -> Result<ByteView> {
        ensure_readable(self.len(), n)?;
        Ok(self.view_of(self.rpos, self.rpos + n))
    }

    fn take(&mut self, n: usize) -> Result<ByteView> {
        self.check_no_reserve("take")?;
        let view = self.peek_exact(n)?;
        self.advance(n)?;
        Ok(view)
    }

    fn advance(&mut self, n: usize) -> Result<()> {
        self.check_no_reserve("advance")?;
        if n > self.len() {
            return Err(BufferError::out_of_range("advance", n, self.len()));
        }
        self.rpos += n;
        self.maybe_compact();
        Ok(())
    }

    fn coalesce(&mut self, n: usize) -> Result<&[u8]> {
        self.check_no_reserve("coalesce")?;
        ensure_readable(self.len(), n)?;
        Ok(&self.storage[self.rpos..self.rpos + n])
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

impl MutByteStreamBuf for PinnedStreamBuf {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        let Some(storage) = Arc::get_mut(&mut self.storage) else {
            return Err(Self::pinned_error("write"));
        };
        if self.rpos == storage.len() {
            // 读空时复位，避免已消费前缀无限增长。
            storage.clear();
            self.rpos = 0;
        }
        storage.extend_from_slice(data);
        Ok(())
    }

    fn reserve(&mut self, n: usize) -> Result<&mut [u8]> {
        self.check_no_reserve("reserve")?;
        self.resv = Some(alloc::vec![0; n]);
        Ok(self
            .resv
            .as_mut()
            .expect("刚刚设置的预留必然存在")
            .as_mut_slice())
    }

    fn commit(&mut self, k: usize) -> Result<()> {
        let Some(buf) = self.resv.take() else {
            return Err(BufferError::no_outstanding_reserve());
        };
        let cap = buf.len();
        if k > cap {
            self.resv = Some(buf);
            return Err(BufferError::out_of_range("commit", k, cap));
        }
        if k > 0 {
            self.write(&buf[..k])?;
        }
        Ok(())
    }
}
