use std::{fmt, io, sync::Arc};

use crate::{
    error::{BufferError, Result},
    shared::Shared,
};

/// 只追加的写端视图。
///
/// # 教案式说明
/// - **意图 (Why)**：写端的存在本身就是读端阻塞而非返回流结束的理由，
///   因此写端必须精确地登记与注销，既不能漏记，也不能重复注销。
/// - **逻辑 (How)**：创建时登记；[`close`](Self::close) 通过 `closed` 标记保证只注销一次，
///   `Drop` 时补做关闭，遗忘或 panic 的写端不会让读端一直等到超时。
/// - **契约 (What)**：
///   - 每次写入都直接追加到已提交内容末尾，返回即对读端可见，`flush` 无需做任何事；
///   - 写入只会因容量耗尽失败，失败时缓冲内容不变；
///   - 关闭后继续写入返回 [`BufferError::WriterClosed`]。
/// - **注意事项 (Trade-offs)**：多个写端之间没有公平性保证，交错顺序由各自获得锁的先后决定。
pub struct BufferWriter {
    shared: Arc<Shared>,
    closed: bool,
}

impl BufferWriter {
    pub(crate) fn open(shared: Arc<Shared>) -> Self {
        shared.register_writer_open();
        Self {
            shared,
            closed: false,
        }
    }

    /// 追加一段字节。
    pub fn put_slice(&mut self, src: &[u8]) -> Result<()> {
        if self.closed {
            return Err(BufferError::WriterClosed);
        }
        self.shared.append(src)
    }

    /// 追加单个字节。
    pub fn put_u8(&mut self, byte: u8) -> Result<()> {
        self.put_slice(&[byte])
    }

    /// 关闭写端，重复调用无副作用。
    ///
    /// 若这是最后一个打开的写端，完成回调会在本方法返回前于当前线程执行，
    /// 随后所有阻塞中的读端被唤醒以观察流结束。
    pub fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.shared.register_writer_close();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for BufferWriter {
    fn drop(&mut self) {
        self.close();
    }
}

impl io::Write for BufferWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.put_slice(buf)?;
        Ok(buf.len())
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.put_slice(buf).map_err(Into::into)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl fmt::Debug for BufferWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferWriter")
            .field("closed", &self.closed)
            .finish()
    }
}
