#![doc = r#"
# rill-io

## 设计动机（Why）
- **定位**：在 `rill-core` 缓冲抽象与阻塞式 `std::io` 世界之间架设最薄
  的一层胶水：
  - [`StreamBufReader`]：策略驱动的读取端适配（欠载时报错 / 返还现有
    字节 / 经 fill 回调阻塞补数），并实现 `std::io::Read`；
  - [`StreamBufWriter`]：按段写出视图与缓冲内容，避免合并拷贝；
  - [`read_to_fill`]：把任意 `io::Read` 源变成 reserve/commit 两阶段
    写入的 fill 回调。
- **阻塞边界**：核心库纯同步、不可阻塞；唯一可能阻塞的位置就是 fill
  回调内部的真实 I/O。取消与超时同样是回调的职责（例如带超时的
  socket）。

## 核心契约（What）
- 欠载（`buffer.need_more_data`）按策略翻译；其余错误类别原样穿透；
- fill 的 `io::Error` 包装为 `adapter.io` 并保留 cause 链。
"#]

mod fill;
mod reader;
mod writer;

pub use fill::read_to_fill;
pub use reader::{FillFn, StreamBufReader, UnderflowPolicy};
pub use writer::StreamBufWriter;
