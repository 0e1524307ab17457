#![cfg_attr(not(feature = "std"), no_std)]
#![doc = r#"
# rill-buffer

## 设计动机（Why）
- **定位**：为 `rill-core` 的缓冲契约提供具体实现，覆盖三种存储策略与
  一个只读包装：
  - [`LinearStreamBuf`]：单块连续存储，检索与头部解析最快，视图取景
    即拷贝；
  - [`SegmentedStreamBuf`]：分段存储，写入与消费零搬迁，视图零拷贝，
    支持分块累积与零拷贝收编；
  - [`PinnedStreamBuf`]：单块共享存储，视图直接引用底层分配并钉定它，
    钉定期间增长类写入被拒绝；
  - [`DirectStreamBuf`]：把既有字节零拷贝包装成只读缓冲，就地解析。
- **选型指引**：头部密集解析选线性；高吞吐流水线选分段；受控互操作
  选钉定；数据已在内存则直接包装。

## 实现策略（How）
- 所有视图以 `bytes::Bytes` 的引用计数段表达，创建即稳定；
- 分段检索在概念拼接上求解，跨段匹配经边界窗口发现（见 `search`）；
- reserve/commit 两阶段写入在各实现上遵循统一纪律：至多一个未完结
  预留，预留期间消费与重整操作被拒绝。
"#]

extern crate alloc;

mod direct;
mod linear;
mod pinned;
mod search;
mod segmented;

pub use direct::DirectStreamBuf;
pub use linear::LinearStreamBuf;
pub use pinned::PinnedStreamBuf;
pub use segmented::SegmentedStreamBuf;
