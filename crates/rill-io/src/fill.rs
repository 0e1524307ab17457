use std::io;
use std::io::Read;

use rill_core::buf::MutByteStreamBuf;

/// 把任意 `io::Read` 源包装成 block 策略适配器可用的 fill 回调。
///
/// # 设计背景（Why）
/// - 「reserve 一块可写区 → 让源直接读进去 → commit 实际读取量」是
///   两阶段写入的标准用法（等价于 `recv_into`），不经过任何中间分配；
///   把这个模式做成现成回调，调用方无需每次手写预留纪律。
///
/// # 契约说明（What）
/// - 返回的回调每次调用预留 `chunk_size` 字节、读取一次并提交实际量；
///   读到 0 字节即报告 EOF（返回 `false`）。
/// - `Interrupted` 在提交空预留后继续重试；其余 `io::Error` 在释放预留
///   （`commit(0)`）后原样上抛，保证缓冲不会滞留未完结的预留。
pub fn read_to_fill<R, B>(mut source: R, chunk_size: usize) -> impl FnMut(&mut B) -> io::Result<bool> + Send
where
    R: Read + Send,
    B: MutByteStreamBuf,
{
    move |buf: &mut B| {
        loop {
            let region = buf.reserve(chunk_size).map_err(io::Error::other)?;
            match source.read(region) {
                Ok(0) => {
                    buf.commit(0).map_err(io::Error::other)?;
                    tracing::trace!(chunk_size, "source reached eof");
                    return Ok(false);
                }
                Ok(n) => {
                    buf.commit(n).map_err(io::Error::other)?;
                    return Ok(true);
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {
                    buf.commit(0).map_err(io::Error::other)?;
                }
                Err(err) => {
                    buf.commit(0).map_err(io::Error::other)?;
                    return Err(err);
                }
            }
        }
    }
}
