use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::cmp::min;
use core::mem;

use bytes::{Buf, Bytes, BytesMut};
use rill_core::buf::{ByteStreamBuf, MutByteStreamBuf, ensure_readable};
use rill_core::error::{BufferError, BufferErrorKind, Result};
use rill_core::view::ByteView;

use crate::search::{find_across, rfind_across};

/// reserve/commit 两阶段写入的内部状态。
///
/// - `InActive`：预留区间开凿在活跃块尾部（`start` 之前为可读字节，
///   `start..start+cap` 为借出的区间）；
/// - `Detached`：预留区间是独立的暂存块，提交时整体并入段列表。
#[derive(Debug)]
enum ReserveState {
    None,
    InActive { start: usize, cap: usize },
    Detached { buf: Vec<u8> },
}

/// `SegmentedStreamBuf` 是分段存储的可写字节流缓冲（散布/聚集布局）。
///
/// # 设计背景（Why）
/// - 以有序的 [`Bytes`] 段列表加头部偏移承载字节流：追加新段无需搬迁
///   既有数据，消费只调整偏移或弹出耗尽的段——两端都避开了线性缓冲的
///   拷贝/搬移成本。
/// - 段是引用计数切片，视图（`peek_exact`/`take`）只做计数递增，天然
///   零拷贝且永久稳定；代价是视图可能跨段，消费方需按段遍历。
///
/// # 逻辑解析（How）
/// - **分块累积**：`chunk_size > 0` 时，小于该值的写入被累积进活跃
///   `BytesMut` 块，避免细碎写入产生成群小段；达到或超过该值的写入
///   （以及收编的视图段）直接成段。`chunk_size == 0` 时每次写入一段。
/// - **消费**：`advance`/`take` 先耗尽段列表，再就地推进活跃块；
///   `take` 以 `slice`/`split_to().freeze()` 产出零拷贝视图。
/// - **reserve**：请求量不超过 `chunk_size` 时在活跃块尾部开凿（补零），
///   否则使用独立暂存块；`commit(k)` 只发布实际写入的前缀。
/// - **检索**：`find`/`rfind` 在概念拼接上求解，跨段匹配经边界窗口发现。
///
/// # 契约说明（What）
/// - 段列表不含空段；`head_off` 恒小于首段长度（空缓冲时两者皆零）。
/// - reserve 未完结期间，`write`/`advance`/`take`/`coalesce`/`reserve`
///   返回 `buffer.outstanding_reserve`；非消费读取仍可进行且绝不暴露
///   未提交的预留区间。
/// - 配置 `max_bytes` 后，超限追加/提交返回 `buffer.too_large`。
///
/// # 设计取舍（Trade-offs）
/// - `peek` 族触及活跃块时需要一次有界拷贝（至多 `chunk_size` 字节），
///   换取活跃块可以持续累积；`take`/`advance` 路径无此开销。
/// - 段粒度策略只是性能旋钮：任何取值下内容与顺序不变量都成立。
#[derive(Debug)]
pub struct SegmentedStreamBuf {
    segs: VecDeque<Bytes>,
    head_off: usize,
    len: usize,
    max_bytes: Option<usize>,
    chunk_size: usize,
    active: Option<BytesMut>,
    resv: ReserveState,
}

impl SegmentedStreamBuf {
    /// 构造空缓冲，默认每次写入独立成段、无容量上限。
    pub fn new() -> Self {
        Self {
            segs: VecDeque::new(),
            head_off: 0,
            len: 0,
            max_bytes: None,
            chunk_size: 0,
            active: None,
            resv: ReserveState::None,
        }
    }

    /// 设置可读字节总量上限，超限追加返回 `buffer.too_large`。
    pub fn with_max_bytes(mut self, max_bytes: Option<usize>) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// 设置分块累积阈值；`0` 表示关闭累积（每次写入独立成段）。
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// 返回当前物理段数（诊断用；含活跃块）。
    pub fn segment_count(&self) -> usize {
        self.segs.len() + usize::from(self.active_readable() > 0)
    }

    fn check_no_reserve(&self, op: &str) -> Result<()> {
        if !matches!(self.resv, ReserveState::None) {
            return Err(BufferError::outstanding_reserve(op));
        }
        Ok(())
    }

    fn check_capacity(&self, additional: usize) -> Result<()> {
        if let Some(max) = self.max_bytes
            && self.len + additional > max
        {
            return Err(BufferError::new(
                BufferErrorKind::BufferTooLarge,
                alloc::format!(
                    "append of {additional} bytes exceeds max_bytes {max} ({} buffered)",
                    self.len
                ),
            ));
        }
        Ok(())
    }

    /// 活跃块中当前可读的字节数（预留区间不计入）。
    fn active_readable(&self) -> usize {
        match &self.resv {
            ReserveState::InActive { start, .. } => *start,
            _ => self.active.as_ref().map_or(0, BytesMut::len),
        }
    }

    /// 冻结活跃块为只读段。仅在无未完结 reserve 时调用。
    fn flush_active(&mut self) {
        if let Some(active) = self.active.take()
            && !active.is_empty()
        {
            self.segs.push_back(active.freeze());
        }
    }

    /// 按序收集全部可读切片（段列表 + 活跃块可读前缀），无空项。
    fn readable_slices(&self) -> Vec<&[u8]> {
        let mut out = Vec::with_capacity(self.segs.len() + 1);
        for (i, seg) in self.segs.iter().enumerate() {
            let off = if i == 0 { self.head_off } else { 0 };
            out.push(&seg[off..]);
        }
        let ar = self.active_readable();
        if ar > 0
            && let Some(active) = self.active.as_ref()
        {
            out.push(&active[..ar]);
        }
        out
    }
}

impl Default for SegmentedStreamBuf {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteStreamBuf for SegmentedStreamBuf {
    fn len(&self) -> usize {
        self.len
    }

    fn chunk(&self) -> &[u8] {
        if let Some(first) = self.segs.front() {
            return &first[self.head_off..];
        }
        let ar = self.active_readable();
        match self.active.as_ref() {
            Some(active) if ar > 0 => &active[..ar],
            _ => &[],
        }
    }

    fn segments(&self) -> Vec<&[u8]> {
        self.readable_slices()
    }

    fn peek(&self) -> ByteView {
        self.peek_exact(self.len).unwrap_or_default()
    }

    fn peek_exact(&self, n: usize) -> Result<ByteView> {
        ensure_readable(self.len, n)?;
        let mut out = Vec::new();
        let mut rem = n;
        for (i, seg) in self.segs.iter().enumerate() {
            if rem == 0 {
                break;
            }
            let off = if i == 0 { self.head_off } else { 0 };
            let avail = seg.len() - off;
            let take = min(rem, avail);
            out.push(seg.slice(off..off + take));
            rem -= take;
        }
        if rem > 0 {
            // 触及活跃块：有界拷贝，上限为 chunk_size。
            let active = self.active.as_ref().expect("len 记账保证活跃块存在");
            out.push(Bytes::copy_from_slice(&active[..rem]));
        }
        Ok(ByteView::from_segments(out))
    }

    fn take(&mut self, n: usize) -> Result<ByteView> {
        self.check_no_reserve("take")?;
        ensure_readable(self.len, n)?;
        let mut out = Vec::new();
        let mut rem = n;
        while rem > 0 {
            let Some(first) = self.segs.front() else {
                break;
            };
            let avail = first.len() - self.head_off;
            if rem < avail {
                out.push(first.slice(self.head_off..self.head_off + rem));
                self.head_off += rem;
                rem = 0;
            } else {
                out.push(first.slice(self.head_off..));
                rem -= avail;
                self.segs.pop_front();
                self.head_off = 0;
            }
        }
        if rem > 0 {
            let active = self.active.as_mut().expect("len 记账保证活跃块存在");
            out.push(active.split_to(rem).freeze());
        }
        self.len -= n;
        Ok(ByteView::from_segments(out))
    }

    fn advance(&mut self, n: usize) -> Result<()> {
        self.check_no_reserve("advance")?;
        if n > self.len {
            return Err(BufferError::out_of_range("advance", n, self.len));
        }
        let mut rem = n;
        while rem > 0 {
            let Some(first) = self.segs.front() else {
                break;
            };
            let avail = first.len() - self.head_off;
            if rem < avail {
                self.head_off += rem;
                rem = 0;
            } else {
                rem -= avail;
                self.segs.pop_front();
                self.head_off = 0;
            }
        }
        if rem > 0 {
            let active = self.active.as_mut().expect("len 记账保证活跃块存在");
            Buf::advance(active, rem);
        }
        self.len -= n;
        Ok(())
    }

    fn coalesce(&mut self, n: usize) -> Result<&[u8]> {
        self.check_no_reserve("coalesce")?;
        ensure_readable(self.len, n)?;
        if n == 0 {
            return Ok(&[]);
        }

        // 快速路径：首个连续区已覆盖需求。
        let first_len = if let Some(first) = self.segs.front() {
            first.len() - self.head_off
        } else {
            self.active_readable()
        };
        if first_len >= n {
            if let Some(first) = self.segs.front() {
                return Ok(&first[self.head_off..self.head_off + n]);
            }
            let active = self.active.as_ref().expect("len 记账保证活跃块存在");
            return Ok(&active[..n]);
        }

        // 慢路径：把前 n 字节合并为新的首段（内容保持的段重整）。
        if self.head_off > 0 {
            let first = self.segs.front_mut().expect("head_off 仅对首段有效");
            *first = first.slice(self.head_off..);
            self.head_off = 0;
        }
        let mut merged = BytesMut::with_capacity(n);
        let mut rem = n;
        while rem > 0 && !self.segs.is_empty() {
            let avail = self.segs[0].len();
            if avail <= rem {
                let seg = self.segs.pop_front().expect("非空已判定");
                merged.extend_from_slice(&seg);
                rem -= avail;
            } else {
                merged.extend_from_slice(&self.segs[0][..rem]);
                let rest = self.segs[0].slice(rem..);
                self.segs[0] = rest;
                rem = 0;
            }
        }
        if rem > 0 {
            let active = self.active.as_mut().expect("len 记账保证活跃块存在");
            merged.extend_from_slice(&active.split_to(rem));
        }
        self.segs.push_front(merged.freeze());
        Ok(&self.segs[0][..n])
    }

    fn find(&self, needle: &[u8], start: usize, end: Option<usize>) -> Option<usize> {
        find_across(&self.readable_slices(), needle, start, end)
    }

    fn rfind(&self, needle: &[u8], start: usize, end: Option<usize>) -> Option<usize> {
        rfind_across(&self.readable_slices(), needle, start, end)
    }
}

impl MutByteStreamBuf for SegmentedStreamBuf {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        self.check_no_reserve("write")?;
        if data.is_empty() {
            return Ok(());
        }
        self.check_capacity(data.len())?;

        if self.chunk_size == 0 || data.len() >= self.chunk_size {
            self.flush_active();
            self.segs.push_back(Bytes::copy_from_slice(data));
        } else {
            if self.active_readable() + data.len() > self.chunk_size {
                self.flush_active();
            }
            let chunk_size = self.chunk_size;
            let active = self
                .active
                .get_or_insert_with(|| BytesMut::with_capacity(chunk_size));
            active.extend_from_slice(data);
        }
        self.len += data.len();
        Ok(())
    }

    /// 覆写缺省实现：达到成段门槛的视图段直接收编（引用计数递增，零拷贝）。
    fn write_view(&mut self, view: &ByteView) -> Result<()> {
        self.check_no_reserve("write_view")?;
        self.check_capacity(view.len())?;
        for seg in view.segments() {
            if self.chunk_size == 0 || seg.len() >= self.chunk_size {
                self.flush_active();
                self.segs.push_back(seg.clone());
                self.len += seg.len();
            } else {
                // 小段走累积路径；容量已整体预检，逐段写入不会中途超限。
                self.write(seg)?;
            }
        }
        Ok(())
    }

    fn reserve(&mut self, n: usize) -> Result<&mut [u8]> {
        self.check_no_reserve("reserve")?;

        if self.chunk_size == 0 || n > self.chunk_size {
            self.flush_active();
            self.resv = ReserveState::Detached {
                buf: alloc::vec![0; n],
            };
            let ReserveState::Detached { buf } = &mut self.resv else {
                unreachable!("刚刚设置为 Detached")
            };
            return Ok(buf.as_mut_slice());
        }

        if self.active_readable() + n > self.chunk_size {
            self.flush_active();
        }
        let chunk_size = self.chunk_size;
        let active = self
            .active
            .get_or_insert_with(|| BytesMut::with_capacity(chunk_size));
        let start = active.len();
        active.resize(start + n, 0);
        self.resv = ReserveState::InActive { start, cap: n };
        Ok(&mut active[start..start + n])
    }

    fn commit(&mut self, k: usize) -> Result<()> {
        match &mut self.resv {
            ReserveState::None => Err(BufferError::no_outstanding_reserve()),
            ReserveState::InActive { start, cap } => {
                if k > *cap {
                    return Err(BufferError::out_of_range("commit", k, *cap));
                }
                let start = *start;
                self.resv = ReserveState::None;
                let active = self.active.as_mut().expect("InActive 预留依附活跃块");
                if let Some(max) = self.max_bytes
                    && self.len + k > max
                {
                    active.truncate(start);
                    return Err(BufferError::new(
                        BufferErrorKind::BufferTooLarge,
                        alloc::format!("commit of {k} bytes exceeds max_bytes {max}"),
                    ));
                }
                active.truncate(start + k);
                self.len += k;
                Ok(())
            }
            ReserveState::Detached { buf } => {
                if k > buf.len() {
                    return Err(BufferError::out_of_range("commit", k, buf.len()));
                }
                let mut buf = mem::take(buf);
                self.resv = ReserveState::None;
                if let Some(max) = self.max_bytes
                    && self.len + k > max
                {
                    return Err(BufferError::new(
                        BufferErrorKind::BufferTooLarge,
                        alloc::format!("commit of {k} bytes exceeds max_bytes {max}"),
                    ));
                }
                if k > 0 {
                    buf.truncate(k);
                    self.segs.push_back(Bytes::from(buf));
                    self.len += k;
                }
                Ok(())
            }
        }
    }
}
