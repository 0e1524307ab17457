use alloc::vec::Vec;

use rill_core::buf::{ByteStreamBuf, ErasedStreamBuf};
use rill_core::error::{BufferError, BufferErrorKind, Result};
use rill_core::view::ByteView;

/// 长度字段的字节序。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// 大端（网络序）。
    Big,
    /// 小端。
    Little,
}

/// `LengthFieldFramer` 按长度前缀切分字节流。
///
/// # 设计背景（Why）
/// - 二进制协议的主流分帧方式是在帧头携带长度字段；各协议对字段位置、
///   宽度、字节序以及“长度覆盖哪些字节”的约定不尽相同，用少量参数把
///   这些差异参数化即可复用同一实现。
/// - 帧总长按
///   `total = 长度字段值 + length_adjustment + 长度字段结束偏移`
///   计算，`initial_bytes_to_strip` 决定交付前剥掉多少头部字节。
///
/// # 契约说明（What）
/// - `length_field_length` 仅接受 1/2/4/8（构造时校验，`config.invalid`）。
/// - 计算出的帧长为负或溢出地址空间时返回 `framer.decode`（线上数据
///   损坏，非限额问题）。
/// - 配置 `max_frame_length` 后：帧总长超限返回 `frame.too_large`；帧
///   未收齐而缓冲已超限返回 `buffer.too_large`（防御性兜底）。
/// - 头部解析经 [`coalesce`](ByteStreamBuf::coalesce) 取得连续前缀，
///   跨段存储无需调用方干预。
#[derive(Debug, Clone)]
pub struct LengthFieldFramer {
    offset: usize,
    field_len: usize,
    order: ByteOrder,
    adjustment: i64,
    strip: usize,
    max_frame_len: Option<usize>,
    end_off: usize,
}

impl LengthFieldFramer {
    /// 构造分帧器；默认字段在帧头、宽 4 字节、大端、无调整、不剥头。
    pub fn new() -> Self {
        Self {
            offset: 0,
            field_len: 4,
            order: ByteOrder::Big,
            adjustment: 0,
            strip: 0,
            max_frame_len: None,
            end_off: 4,
        }
    }

    /// 设置长度字段的起始偏移与宽度；宽度仅接受 1/2/4/8。
    pub fn with_length_field(mut self, offset: usize, field_len: usize) -> Result<Self> {
        if !matches!(field_len, 1 | 2 | 4 | 8) {
            return Err(BufferError::new(
                BufferErrorKind::Config,
                alloc::format!("length field width {field_len} not in {{1, 2, 4, 8}}"),
            ));
        }
        self.offset = offset;
        self.field_len = field_len;
        self.end_off = offset + field_len;
        Ok(self)
    }

    /// 设置长度字段的字节序。
    pub fn with_byte_order(mut self, order: ByteOrder) -> Self {
        self.order = order;
        self
    }

    /// 设置帧长调整量（可为负，用于“长度不含头部”之类的协议约定）。
    pub fn with_length_adjustment(mut self, adjustment: i64) -> Self {
        self.adjustment = adjustment;
        self
    }

    /// 设置交付前从帧头剥除的字节数（通常用于剥掉长度字段本身）。
    pub fn with_strip(mut self, strip: usize) -> Self {
        self.strip = strip;
        self
    }

    /// 设置帧总长上限（剥除之前计）。
    pub fn with_max_frame_length(mut self, max: Option<usize>) -> Self {
        self.max_frame_len = max;
        self
    }

    /// 从缓冲中提取所有当前收齐的帧；未收齐的字节留存缓冲。
    pub fn decode(&self, buf: &mut ErasedStreamBuf) -> Result<Vec<ByteView>> {
        let mut out = Vec::new();

        loop {
            if buf.len() < self.end_off {
                return Ok(out);
            }

            // 把长度字段拷出到定宽数组，释放头部借用后再做消费。
            let header = buf.coalesce(self.end_off)?;
            let field = &header[self.offset..self.end_off];
            let mut raw = [0u8; 8];
            let value = match self.order {
                ByteOrder::Big => {
                    raw[8 - field.len()..].copy_from_slice(field);
                    u64::from_be_bytes(raw)
                }
                ByteOrder::Little => {
                    raw[..field.len()].copy_from_slice(field);
                    u64::from_le_bytes(raw)
                }
            };

            let total = value as i128 + self.adjustment as i128 + self.end_off as i128;
            if total < 0 {
                return Err(BufferError::new(
                    BufferErrorKind::Decode,
                    alloc::format!("negative frame length {total}"),
                ));
            }
            let Ok(total) = usize::try_from(total) else {
                return Err(BufferError::new(
                    BufferErrorKind::Decode,
                    "frame length overflows address space",
                ));
            };

            if let Some(max) = self.max_frame_len
                && total > max
            {
                return Err(BufferError::new(
                    BufferErrorKind::FrameTooLarge,
                    alloc::format!("frame of {total} bytes exceeds max_frame_length {max}"),
                ));
            }

            if buf.len() < total {
                if let Some(max) = self.max_frame_len
                    && buf.len() > max
                {
                    return Err(BufferError::new(
                        BufferErrorKind::BufferTooLarge,
                        alloc::format!(
                            "{} bytes buffered without completing a frame, max_frame_length {max}",
                            buf.len()
                        ),
                    ));
                }
                return Ok(out);
            }

            let mut deliver = total;
            if self.strip > 0 {
                if self.strip > total {
                    return Err(BufferError::new(
                        BufferErrorKind::Decode,
                        alloc::format!(
                            "initial_bytes_to_strip {} exceeds frame length {total}",
                            self.strip
                        ),
                    ));
                }
                buf.advance(self.strip)?;
                deliver -= self.strip;
            }

            out.push(buf.take(deliver)?);
        }
    }
}

impl Default for LengthFieldFramer {
    fn default() -> Self {
        Self::new()
    }
}
