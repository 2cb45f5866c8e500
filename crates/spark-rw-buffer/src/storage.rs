use bytes::Bytes;
use tracing::{debug, trace};

use crate::error::{BufferError, Result};

/// 计算扩容后的容量：优先翻倍，翻倍不足时直接取 `required`，并以 `limit` 封顶。
///
/// 返回 `None` 表示 `required` 已超过 `limit`，调用方需报告容量耗尽。
pub(crate) fn next_capacity(current: usize, required: usize, limit: usize) -> Option<usize> {
    if required > limit {
        return None;
    }
    let doubled = current.saturating_mul(2);
    Some(doubled.max(required).min(limit))
}

/// 连续字节存储及其已提交长度。
///
/// # 设计概要（How）
/// - `bytes.len()` 即逻辑容量，超出 `committed` 的部分是已分配但尚未提交的零填充区；
/// - 扩容只发生在 [`Storage::append`] 内部，且在复制任何字节之前完成，
///   因此失败时 `bytes` 与 `committed` 都不会改变；
/// - 截断只重置 `committed`，保留已分配的内存供后续写入复用。
///
/// # 契约说明（What）
/// - 不变量：`bytes.len() >= committed`；
/// - 本类型不做任何同步，调用方必须在互斥保护下访问。
#[derive(Debug)]
pub(crate) struct Storage {
    bytes: Vec<u8>,
    committed: usize,
    limit: usize,
}

impl Storage {
    /// 创建一个零填充、尚无提交内容的存储。
    ///
    /// 预分配失败时退化为空存储，首次追加再经 [`Storage::append`] 的受检扩容路径申请内存，
    /// 由配置带来的超大初始容量因此不会中止进程。
    pub(crate) fn with_capacity(capacity: usize, limit: usize) -> Self {
        let mut bytes = Vec::new();
        match bytes.try_reserve_exact(capacity) {
            Ok(()) => bytes.resize(capacity, 0),
            Err(_) => debug!(capacity, "rw buffer initial allocation refused, starting empty"),
        }
        Self {
            bytes,
            committed: 0,
            limit,
        }
    }

    /// 以给定字节作为已提交内容创建存储。
    pub(crate) fn from_committed(bytes: Vec<u8>, limit: usize) -> Self {
        let committed = bytes.len();
        Self {
            bytes,
            committed,
            limit,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.bytes.len()
    }

    pub(crate) fn committed(&self) -> usize {
        self.committed
    }

    /// 确保在已提交内容之后至少还有 `additional` 字节可写。
    fn ensure_capacity(&mut self, additional: usize) -> Result<()> {
        let (committed, limit) = (self.committed, self.limit);
        let exhausted = || BufferError::ResourceExhausted {
            committed,
            additional,
            limit,
        };
        let required = committed.checked_add(additional).ok_or_else(exhausted)?;
        let current = self.bytes.len();
        if required <= current {
            return Ok(());
        }
        let target = next_capacity(current, required, limit).ok_or_else(exhausted)?;
        self.bytes
            .try_reserve_exact(target - current)
            .map_err(|_| exhausted())?;
        self.bytes.resize(target, 0);
        trace!(from = current, to = target, "rw buffer storage grown");
        Ok(())
    }

    /// 追加字节并推进已提交长度；要么全部成功，要么完全不改变状态。
    pub(crate) fn append(&mut self, src: &[u8]) -> Result<()> {
        if src.is_empty() {
            return Ok(());
        }
        self.ensure_capacity(src.len())?;
        let end = self.committed + src.len();
        self.bytes[self.committed..end].copy_from_slice(src);
        self.committed = end;
        Ok(())
    }

    /// 丢弃全部已提交内容，返回被丢弃的字节数。
    pub(crate) fn truncate(&mut self) -> usize {
        std::mem::take(&mut self.committed)
    }

    /// 从 `from` 开始、最多 `max` 字节的已提交切片。
    ///
    /// `from` 超出已提交长度时返回空切片。
    pub(crate) fn committed_range(&self, from: usize, max: usize) -> &[u8] {
        let start = from.min(self.committed);
        let end = start + max.min(self.committed - start);
        &self.bytes[start..end]
    }

    /// 复制全部已提交内容，生成与存储解耦的只读快照。
    pub(crate) fn snapshot(&self) -> Bytes {
        Bytes::copy_from_slice(&self.bytes[..self.committed])
    }
}
