use alloc::vec::Vec;

use bytes::Bytes;
use rill_core::buf::{
    ByteStreamBuf, clamp_range, ensure_readable, find_in_slice, rfind_in_slice,
};
use rill_core::error::{BufferError, Result};
use rill_core::view::ByteView;

/// `DirectStreamBuf` 把既有的一段字节零拷贝包装成只读字节流缓冲。
///
/// # 设计背景（Why）
/// - 数据常常已经整体在内存里（一次性读入的报文、测试向量、内嵌资源）；
///   为了对它跑分帧器/读取器而先写入可变缓冲是一次纯浪费的拷贝。
/// - 以 [`Bytes`] 直接承载即可获得完整的只读契约：检索、`coalesce`、
///   视图全部零拷贝，且视图与源数据共享存储、永久稳定。
///
/// # 契约说明（What）
/// - 只实现只读契约，无 `write`/`reserve`/`commit` 表面；
/// - 消费只推进读指针，不释放底层存储（源数据的生命周期由 `Bytes`
///   引用计数管理）。
#[derive(Debug, Clone)]
pub struct DirectStreamBuf {
    data: Bytes,
    rpos: usize,
}

impl DirectStreamBuf {
    /// 包装一段既有字节。
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            rpos: 0,
        }
    }

    fn readable(&self) -> &[u8] {
        &self.data[self.rpos..]
    }
}

impl ByteStreamBuf for DirectStreamBuf {
    fn len(&self) -> usize {
        self.data.len() - self.rpos
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
        ByteView::from_bytes(self.data.slice(self.rpos..))
    }

    fn peek_exact(&self, n: usize) -> Result<ByteView> {
        ensure_readable(self.len(), n)?;
        Ok(ByteView::from_bytes(
            self.data.slice(self.rpos..self.rpos + n),
        ))
    }

    fn advance(&mut self, n: usize) -> Result<()> {
        if n > self.len() {
            return Err(BufferError::out_of_range("advance", n, self.len()));
        }
        self.rpos += n;
        Ok(())
    }

    fn coalesce(&mut self, n: usize) -> Result<&[u8]> {
        ensure_readable(self.len(), n)?;
        Ok(&self.data[self.rpos..self.rpos + n])
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
