use std::io;
use std::io::Write;

use rill_core::buf::ByteStreamBuf;
use rill_core::view::ByteView;

/// `StreamBufWriter` 把视图/缓冲按散布布局写入文件式输出端。
///
/// # 设计背景（Why）
/// - 视图与分段缓冲的内容物理上可能分布在多个段；写出时逐段交给
///   输出端即可避免先合并成一整块的拷贝（`writev` 思路的阻塞版）。
/// - 适配器刻意保持小而笨：它只是为期待 `.write(...)` 的代码提供桥接，
///   不做缓冲、不做重试策略。
///
/// # 契约说明（What）
/// - [`write_view`](Self::write_view) / [`write_buffer`](Self::write_buffer)
///   逐段调用 `write_all`，输出端会看到与段布局一致的多次写入；
/// - [`write_buffer`](Self::write_buffer) 成功后消费缓冲中已写出的字节；
/// - 任一段写失败即上抛 `io::Error`，已写出的段不回滚（输出端语义）。
pub struct StreamBufWriter<W> {
    sink: W,
}

impl<W: Write> StreamBufWriter<W> {
    /// 包装一个输出端。
    pub fn new(sink: W) -> Self {
        Self { sink }
    }

    /// 访问底层输出端。
    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    /// 可变访问底层输出端。
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.sink
    }

    /// 拆解适配器，取回输出端。
    pub fn into_inner(self) -> W {
        self.sink
    }

    /// 写出一段连续字节，返回写出量。
    pub fn write_slice(&mut self, data: &[u8]) -> io::Result<usize> {
        self.sink.write_all(data)?;
        Ok(data.len())
    }

    /// 按段写出一个视图（不合并拷贝），返回总写出量。
    pub fn write_view(&mut self, view: &ByteView) -> io::Result<usize> {
        let mut total = 0;
        for seg in view.segments() {
            self.sink.write_all(seg)?;
            total += seg.len();
        }
        Ok(total)
    }

    /// 把缓冲中全部可读字节按段写出并消费之，返回总写出量。
    pub fn write_buffer(&mut self, buf: &mut dyn ByteStreamBuf) -> io::Result<usize> {
        let mut total = 0;
        for seg in buf.segments() {
            self.sink.write_all(seg)?;
            total += seg.len();
        }
        buf.advance(total).map_err(io::Error::other)?;
        Ok(total)
    }
}

impl<W: Write> Write for StreamBufWriter<W> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.sink.write(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }
}
