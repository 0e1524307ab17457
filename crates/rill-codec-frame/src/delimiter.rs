use alloc::vec::Vec;

use bytes::Bytes;
use rill_core::buf::{ByteStreamBuf, ErasedStreamBuf};
use rill_core::error::{BufferError, BufferErrorKind, Result};
use rill_core::view::ByteView;

/// `DelimiterFramer` 按定界符集合切分字节流，支持重叠定界符的最长匹配。
///
/// # 设计背景（Why）
/// - 文本型协议的记录边界常由多个候选定界符标记，且彼此可能互为前缀
///   （`\r` 与 `\r\n` 是典型）。朴素的“先见先切”会在前缀情形下误切：
///   读到 `...\r` 时还无法断言这是独立的 `\r`，还是 `\r\n` 的前半。
/// - 本分帧器的核心性质：除非能证明更长的候选不可能再被补全（或流已
///   收尾），否则不会按较短定界符出帧——这就是跨流式边界的歧义消解。
///
/// # 算法解析（How）
/// 每次 [`decode`](Self::decode) 反复执行直到无法推进：
/// 1. 在全部候选中找最早的已确认命中；同位多个命中取最长者（两趟：
///    先比最早位置，再在该位置按长度降序复核实际匹配）。
/// 2. 无命中：若配置了 `max_size`、缓冲超限且本次调用尚未出帧，返回
///    `buffer.too_large`；否则返回已积累的帧，剩余字节留存缓冲。
/// 3. 命中但匹配恰好止于缓冲末尾，且存在以其为前缀的更长候选可能被
///    后续字节补全：歧义。非收尾调用返回已积累的帧等待更多输入；
///    收尾调用（`at_eof`）按当前已确认的匹配出帧。
/// 4. 出帧：负载为命中位置之前的字节（`keep_ends` 时含定界符）；命中
///    位置超过 `max_size` 返回 `frame.too_large`。消费至定界符之后，
///    回到第 1 步。
///
/// # 契约说明（What）
/// - 构造校验定界符集合：非空、无空串、无重复（`config.invalid`）。
/// - 分帧器本身无状态：扫描进度完全体现在缓冲的消费位置上，同一实例
///   可服务多条流。
/// - 帧严格按字节流中定界符出现的顺序产出，跨 `decode` 调用不重排。
///
/// # 设计取舍（Trade-offs）
/// - `max_size` 约束的是“当前帧”：尾部尚未定界的超限字节只有在本次
///   调用颗粒无收成时才触发 `buffer.too_large`，否则先交付已出的帧。
/// - `frame.too_large` 在同一调用内已出帧后仍会直接返回（限额错误是
///   中止信号，已消费的前序帧不再回滚）。
#[derive(Debug, Clone)]
pub struct DelimiterFramer {
    delims: Vec<Bytes>,
    /// 按长度降序排列的下标，用于同位置最长匹配复核。
    order_by_len: Vec<usize>,
    /// 对每个定界符，以它为真前缀的更长定界符下标（按长度降序）。
    longer_with_prefix: Vec<Vec<usize>>,
    keep_ends: bool,
    max_size: Option<usize>,
}

impl DelimiterFramer {
    /// 用定界符集合构造分帧器。
    ///
    /// 集合为空、含空串或含重复项时返回 `config.invalid` 错误。
    pub fn new<I, D>(delims: I) -> Result<Self>
    where
        I: IntoIterator<Item = D>,
        D: Into<Bytes>,
    {
        let delims: Vec<Bytes> = delims.into_iter().map(Into::into).collect();
        if delims.is_empty() {
            return Err(BufferError::new(
                BufferErrorKind::Config,
                "delimiter set is empty",
            ));
        }
        for (i, d) in delims.iter().enumerate() {
            if d.is_empty() {
                return Err(BufferError::new(
                    BufferErrorKind::Config,
                    "empty delimiter",
                ));
            }
            if delims[..i].contains(d) {
                return Err(BufferError::new(
                    BufferErrorKind::Config,
                    "duplicate delimiter",
                ));
            }
        }

        let mut order_by_len: Vec<usize> = (0..delims.len()).collect();
        order_by_len.sort_by(|&a, &b| delims[b].len().cmp(&delims[a].len()));

        let longer_with_prefix = delims
            .iter()
            .map(|d| {
                let mut longer: Vec<usize> = delims
                    .iter()
                    .enumerate()
                    .filter(|(_, e)| e.len() > d.len() && e.starts_with(d))
                    .map(|(j, _)| j)
                    .collect();
                longer.sort_by(|&a, &b| delims[b].len().cmp(&delims[a].len()));
                longer
            })
            .collect();

        Ok(Self {
            delims,
            order_by_len,
            longer_with_prefix,
            keep_ends: false,
            max_size: None,
        })
    }

    /// 产出的帧保留终结它的定界符字节。
    pub fn with_keep_ends(mut self, keep_ends: bool) -> Self {
        self.keep_ends = keep_ends;
        self
    }

    /// 设置单帧负载上限（不含定界符），超限触发限额错误。
    pub fn with_max_size(mut self, max_size: Option<usize>) -> Self {
        self.max_size = max_size;
        self
    }

    /// 从缓冲中提取所有当前可确认的帧。
    ///
    /// `at_eof = true` 声明流已收尾：末尾的前缀歧义按已确认的较短定界
    /// 符消解，不再等待后续字节。未定界的剩余字节始终留存缓冲。
    pub fn decode(&self, buf: &mut ErasedStreamBuf, at_eof: bool) -> Result<Vec<ByteView>> {
        Ok(self
            .decode_with_delimiters(buf, at_eof)?
            .into_iter()
            .map(|(frame, _)| frame)
            .collect())
    }

    /// 同 [`decode`](Self::decode)，并报告终结每一帧的定界符。
    pub fn decode_with_delimiters(
        &self,
        buf: &mut ErasedStreamBuf,
        at_eof: bool,
    ) -> Result<Vec<(ByteView, Bytes)>> {
        let mut out = Vec::new();

        loop {
            let Some((pos, di)) = self.find_next_delimiter(buf) else {
                if let Some(max) = self.max_size
                    && buf.len() > max
                    && out.is_empty()
                {
                    return Err(BufferError::new(
                        BufferErrorKind::BufferTooLarge,
                        alloc::format!(
                            "{} bytes buffered without delimiter, max_size {max}",
                            buf.len()
                        ),
                    ));
                }
                return Ok(out);
            };

            if let Some(max) = self.max_size
                && pos > max
            {
                return Err(BufferError::new(
                    BufferErrorKind::FrameTooLarge,
                    alloc::format!("frame payload of {pos} bytes exceeds max_size {max}"),
                ));
            }

            if !at_eof && self.should_defer(buf, pos, di) {
                return Ok(out);
            }

            let delim = self.delims[di].clone();
            let frame = if self.keep_ends {
                buf.take(pos + delim.len())?
            } else {
                let frame = buf.take(pos)?;
                buf.advance(delim.len())?;
                frame
            };
            out.push((frame, delim));
        }
    }

    /// 定位最早的已确认命中，返回（位置，定界符下标）。
    ///
    /// 第一趟逐个候选求最早出现位；第二趟在该位置按长度降序复核实际
    /// 匹配，保证同位重叠时选中最长者。
    fn find_next_delimiter(&self, buf: &ErasedStreamBuf) -> Option<(usize, usize)> {
        let ln = buf.len();
        if ln == 0 {
            return None;
        }

        let mut best: Option<(usize, usize)> = None;
        for (i, d) in self.delims.iter().enumerate() {
            let Some(p) = buf.find(d, 0, None) else {
                continue;
            };
            best = match best {
                None => Some((p, i)),
                Some((bp, bi)) => {
                    if p < bp || (p == bp && d.len() > self.delims[bi].len()) {
                        Some((p, i))
                    } else {
                        Some((bp, bi))
                    }
                }
            };
        }
        let (pos, _) = best?;

        for &i in &self.order_by_len {
            let d = &self.delims[i];
            if pos + d.len() > ln {
                continue;
            }
            if buf.find(d, pos, Some(pos + d.len())) == Some(pos) {
                return Some((pos, i));
            }
        }

        // best 来自某个候选的实际出现位，复核必然命中；保守回退。
        best
    }

    /// 判断位于 `pos` 的已确认匹配是否因前缀歧义需要等待更多字节。
    ///
    /// 仅当匹配恰好止于缓冲末尾、存在以它为前缀的更长候选、且已缓冲的
    /// 字节与该候选的对应前缀一致时成立。
    fn should_defer(&self, buf: &ErasedStreamBuf, pos: usize, matched: usize) -> bool {
        let ln = buf.len();
        let end = pos + self.delims[matched].len();
        if end != ln {
            return false;
        }

        let longer = &self.longer_with_prefix[matched];
        if longer.is_empty() {
            return false;
        }

        let avail = ln - pos;
        for &li in longer {
            let d2 = &self.delims[li];
            if avail >= d2.len() {
                // 字节足够时更长候选早该在定位阶段命中，无歧义可言。
                continue;
            }
            if buf.find(&d2[..avail], pos, Some(pos + avail)) == Some(pos) {
                return true;
            }
        }
        false
    }
}
