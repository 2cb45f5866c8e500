use std::{fmt, sync::Arc};

use bytes::Bytes;

use crate::{
    config::BufferConfig,
    reader::BufferReader,
    shared::{CompletionListener, Shared},
    writer::BufferWriter,
};

/// `ReadWriteBuffer` 是可增长的内存字节管道：任意数量的写端向尾部追加，
/// 任意数量的读端各自从头顺序消费，并在写入发生的同时看到数据。
///
/// # 模块角色（Why）
/// - 为“边生产边消费”的场景提供阻塞式字节流，而不必等整段数据写完；
/// - 通过写端计数区分“暂时没有数据”和“永远不会再有数据”，
///   读端据此选择阻塞等待或返回流结束；
/// - 所有写端关闭时，可选的完成回调会收到完整的提交历史。
///
/// # 核心机制（How）
/// - 句柄只持有 `Arc<Shared>`，克隆代价极低，可随意分发到多个线程；
/// - [`open_reader`](Self::open_reader) 与 [`open_writer`](Self::open_writer)
///   返回的视图各自拥有私有游标，共享同一份存储；
/// - 共享状态全部由单把互斥锁保护，详见 `shared` 模块。
///
/// # 契约说明（What）
/// - **线程安全**：句柄、读端、写端均满足 `Send`，句柄额外满足 `Sync`；
/// - **顺序保证**：读端观察到的字节顺序与写端追加获得锁的顺序一致；
/// - **生命周期**：底层存储在最后一个句柄或视图释放后销毁。
///
/// # 设计权衡（Trade-offs）
/// - 存储只增不减，没有背压；生产远快于消费时内存会持续增长；
/// - 读端超时属于活性保护，默认 5 秒，可通过 [`BufferConfig`] 调整。
#[derive(Clone)]
pub struct ReadWriteBuffer {
    shared: Arc<Shared>,
}

impl Default for ReadWriteBuffer {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ReadWriteBuffer {
    /// 创建空缓冲，使用默认配置且没有完成回调。
    pub fn new() -> Self {
        Self::default()
    }

    /// 以给定字节作为已提交内容创建缓冲，效果等同于在任何读端出现前已写入这些字节。
    pub fn from_bytes(initial: impl Into<Vec<u8>>) -> Self {
        Self::builder().initial_bytes(initial).build()
    }

    /// 返回构建器，用于组合初始内容、完成回调与配置。
    pub fn builder() -> ReadWriteBufferBuilder {
        ReadWriteBufferBuilder::default()
    }

    /// 打开一个从偏移 0 开始读取的读端。
    pub fn open_reader(&self) -> BufferReader {
        BufferReader::new(Arc::clone(&self.shared))
    }

    /// 打开一个写端；在其关闭前，阻塞读不会返回流结束。
    pub fn open_writer(&self) -> BufferWriter {
        BufferWriter::open(Arc::clone(&self.shared))
    }

    /// 丢弃全部已提交内容，写端计数不受影响。
    ///
    /// 截断前打开的读端会在下一次操作时回到新内容的起点，
    /// 不会读到截断前的字节。
    pub fn truncate(&self) {
        self.shared.truncate();
    }

    /// 当前已提交的字节数。
    pub fn len(&self) -> usize {
        self.shared.committed()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 当前存储已分配的容量。
    pub fn capacity(&self) -> usize {
        self.shared.capacity()
    }

    /// 当前尚未关闭的写端数量。
    pub fn open_writers(&self) -> usize {
        self.shared.open_writers()
    }

    pub fn config(&self) -> &BufferConfig {
        self.shared.config()
    }
}

impl fmt::Debug for ReadWriteBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadWriteBuffer")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("open_writers", &self.open_writers())
            .finish()
    }
}

/// [`ReadWriteBuffer`] 的构建器。
///
/// # 契约 (What)
/// - `initial_bytes`：预填充内容，设置后忽略 [`BufferConfig::initial_capacity`]；
/// - `on_completion`：最后一个写端关闭时调用，参数为当时全部已提交字节；
/// - `config`：超时、容量等参数，缺省为 [`BufferConfig::default`]。
#[derive(Default)]
pub struct ReadWriteBufferBuilder {
    initial: Option<Vec<u8>>,
    listener: Option<CompletionListener>,
    config: BufferConfig,
}

impl ReadWriteBufferBuilder {
    pub fn initial_bytes(mut self, initial: impl Into<Vec<u8>>) -> Self {
        self.initial = Some(initial.into());
        self
    }

    pub fn on_completion<F>(mut self, listener: F) -> Self
    where
        F: Fn(Bytes) + Send + Sync + 'static,
    {
        self.listener = Some(Arc::new(listener));
        self
    }

    pub fn config(mut self, config: BufferConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> ReadWriteBuffer {
        ReadWriteBuffer {
            shared: Arc::new(Shared::new(self.initial, self.listener, self.config)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_bytes_are_committed_up_front() {
        let buffer = ReadWriteBuffer::from_bytes(b"seed".to_vec());
        assert_eq!(buffer.len(), 4);
        assert_eq!(buffer.capacity(), 4);
        assert_eq!(buffer.open_writers(), 0);
    }

    #[test]
    fn new_buffer_uses_configured_initial_capacity() {
        let buffer = ReadWriteBuffer::builder()
            .config(BufferConfig::new().with_initial_capacity(64))
            .build();
        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), 64);
        assert_eq!(ReadWriteBuffer::new().capacity(), 1024);
    }

    #[test]
    fn oversized_initial_capacity_from_toml_does_not_abort() {
        let config: BufferConfig =
            toml::from_str("initial_capacity = 9223372036854775807\n").expect("解析 TOML 配置");
        let buffer = ReadWriteBuffer::builder().config(config).build();
        assert_eq!(buffer.capacity(), 0, "预分配失败时应退化为空存储");

        let mut writer = buffer.open_writer();
        writer.put_slice(b"grown lazily").expect("首次写入应按需扩容");
        assert_eq!(buffer.len(), 12);
        assert!(buffer.capacity() >= 12);
    }

    #[test]
    fn clones_share_the_same_storage() {
        let buffer = ReadWriteBuffer::new();
        let other = buffer.clone();
        let mut writer = other.open_writer();
        writer.put_slice(b"shared").expect("写入");
        assert_eq!(buffer.len(), 6);
        assert_eq!(buffer.open_writers(), 1);
        writer.close();
        assert_eq!(buffer.open_writers(), 0);
    }

    #[test]
    fn handles_are_thread_safe() {
        fn assert_send_sync<T: Send + Sync>() {}
        fn assert_send<T: Send>() {}
        assert_send_sync::<ReadWriteBuffer>();
        assert_send::<BufferReader>();
        assert_send::<BufferWriter>();
    }
}
