use std::{sync::Arc, time::Instant};

use bytes::Bytes;
use parking_lot::{Condvar, Mutex};
use tracing::debug;

use crate::{
    config::BufferConfig,
    error::{BufferError, Result},
    storage::Storage,
};

/// 最后一个写端关闭时收到全部已提交字节的回调。
///
/// 回调在关闭写端的线程上同步执行，执行期间不持有任何缓冲锁，
/// 因此可以在回调内再次打开读端或写端。
///
/// 回调中的 panic 会传播给关闭写端的调用方，阻塞中的读端仍会被唤醒；
/// 但写端在 `Drop` 中关闭且当前线程已在展开时，二次 panic 会直接中止进程，
/// 回调不应 panic。
pub type CompletionListener = Arc<dyn Fn(Bytes) + Send + Sync + 'static>;

/// 离开作用域时广播唤醒，回调 panic 也不会漏掉通知。
struct WakeReaders<'a>(&'a Condvar);

impl Drop for WakeReaders<'_> {
    fn drop(&mut self) {
        self.0.notify_all();
    }
}

/// 受互斥保护的全部共享状态。
///
/// 存储、已提交长度、打开的写端数量与截断纪元放在同一把锁下，
/// 读端任何时候看到的都是一致的组合：不会出现“长度已更新、字节尚未写入”，
/// 也不会出现“写端已关闭、最后一次追加尚不可见”。
struct State {
    storage: Storage,
    open_writers: usize,
    epoch: u64,
}

/// 读端私有的游标。
///
/// `epoch` 记录游标所属的截断纪元；纪元落后时游标会回到 0，
/// 读端因此永远不会越过截断后的已提交长度。
#[derive(Debug)]
pub(crate) struct ReadCursor {
    position: usize,
    epoch: u64,
}

impl ReadCursor {
    fn sync(&mut self, state: &State) {
        if self.epoch != state.epoch {
            self.position = 0;
            self.epoch = state.epoch;
        }
    }

    fn available(&self, state: &State) -> usize {
        state.storage.committed().saturating_sub(self.position)
    }
}

/// 读写缓冲的共享核心。
///
/// # 模块角色（Why）
/// - 读端与写端只是携带私有游标的薄视图，真正的状态全部集中在这里；
/// - 写端追加与关闭都会广播唤醒，所有阻塞中的读端各自重新检查条件。
///
/// # 核心机制（How）
/// - `parking_lot::Mutex<State>` 保护存储、长度、写端计数与纪元；
/// - `parking_lot::Condvar` 承载“有新数据或写端关闭”的通知，读端总是在循环中
///   重新检查谓词，不把单次唤醒当作条件成立；
/// - 完成回调在锁外执行，快照在锁内复制，保证回调看到的是关闭瞬间的完整内容。
///
/// # 契约说明（What）
/// - 追加要么完整可见，要么完全不发生；
/// - 写端计数永不为负：关闭路径由写端自身的 `closed` 标记保证只调用一次；
/// - 只有阻塞读会挂起调用线程，且等待总时长受 [`BufferConfig::read_timeout`] 约束。
pub(crate) struct Shared {
    state: Mutex<State>,
    readable: Condvar,
    listener: Option<CompletionListener>,
    config: BufferConfig,
}

impl Shared {
    pub(crate) fn new(
        initial: Option<Vec<u8>>,
        listener: Option<CompletionListener>,
        config: BufferConfig,
    ) -> Self {
        let storage = match initial {
            Some(bytes) => Storage::from_committed(bytes, config.max_capacity()),
            None => Storage::with_capacity(config.initial_capacity(), config.max_capacity()),
        };
        Self {
            state: Mutex::new(State {
                storage,
                open_writers: 0,
                epoch: 0,
            }),
            readable: Condvar::new(),
            listener,
            config,
        }
    }

    pub(crate) fn config(&self) -> &BufferConfig {
        &self.config
    }

    pub(crate) fn committed(&self) -> usize {
        self.state.lock().storage.committed()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.state.lock().storage.capacity()
    }

    pub(crate) fn open_writers(&self) -> usize {
        self.state.lock().open_writers
    }

    /// 追加字节并唤醒所有等待中的读端。
    pub(crate) fn append(&self, src: &[u8]) -> Result<()> {
        if src.is_empty() {
            return Ok(());
        }
        self.state.lock().storage.append(src)?;
        self.readable.notify_all();
        Ok(())
    }

    /// 丢弃全部已提交内容；空缓冲上调用不产生任何变化。
    pub(crate) fn truncate(&self) {
        let mut state = self.state.lock();
        let discarded = state.storage.truncate();
        if discarded > 0 {
            state.epoch = state.epoch.wrapping_add(1);
            debug!(discarded, epoch = state.epoch, "rw buffer truncated");
        }
    }

    pub(crate) fn register_writer_open(&self) {
        let mut state = self.state.lock();
        state.open_writers += 1;
        debug!(open_writers = state.open_writers, "rw buffer writer opened");
    }

    /// 写端关闭：计数归零时在锁内复制快照，锁外调用完成回调，最后广播唤醒（回调 panic 时同样广播）。
    pub(crate) fn register_writer_close(&self) {
        let snapshot = {
            let mut state = self.state.lock();
            debug_assert!(state.open_writers > 0, "写端计数不应为负");
            state.open_writers = state.open_writers.saturating_sub(1);
            debug!(open_writers = state.open_writers, "rw buffer writer closed");
            if state.open_writers == 0 {
                debug!(
                    committed = state.storage.committed(),
                    "rw buffer last writer closed"
                );
                self.listener.as_ref().map(|_| state.storage.snapshot())
            } else {
                None
            }
        };

        let _wake = WakeReaders(&self.readable);
        if let (Some(listener), Some(bytes)) = (self.listener.as_ref(), snapshot) {
            listener(bytes);
        }
    }

    pub(crate) fn new_cursor(&self) -> ReadCursor {
        ReadCursor {
            position: 0,
            epoch: self.state.lock().epoch,
        }
    }

    /// 非阻塞地返回游标之后可读的字节数。
    pub(crate) fn available(&self, cursor: &mut ReadCursor) -> usize {
        let state = self.state.lock();
        cursor.sync(&state);
        cursor.available(&state)
    }

    /// 跳过至多 `n` 个已提交字节，不等待新数据。
    pub(crate) fn skip(&self, cursor: &mut ReadCursor, n: usize) -> usize {
        let state = self.state.lock();
        cursor.sync(&state);
        let skipped = n.min(cursor.available(&state));
        cursor.position += skipped;
        skipped
    }

    /// 阻塞读取至多 `dst.len()` 字节。
    ///
    /// # 执行逻辑（How）
    /// 1. 有可读字节时立即复制并推进游标；
    /// 2. 无可读字节且没有打开的写端时返回 `Ok(0)` 表示流结束；
    /// 3. 否则在条件变量上等待，从首次发现无数据起累计时长，
    ///    超过 [`BufferConfig::read_timeout`] 时返回
    ///    [`BufferError::BlockingReadTimeout`]，游标保持不变。
    ///
    /// 每次醒来都会重新走一遍 1、2，超时判断放在它们之后，
    /// 临界时刻到达的数据或写端关闭优先于超时。
    pub(crate) fn read(&self, cursor: &mut ReadCursor, dst: &mut [u8]) -> Result<usize> {
        if dst.is_empty() {
            return Ok(0);
        }

        let timeout = self.config.read_timeout();
        let mut state = self.state.lock();
        let mut wait_started: Option<Instant> = None;
        loop {
            cursor.sync(&state);
            if cursor.available(&state) > 0 {
                let chunk = state.storage.committed_range(cursor.position, dst.len());
                let n = chunk.len();
                dst[..n].copy_from_slice(chunk);
                cursor.position += n;
                return Ok(n);
            }

            if state.open_writers == 0 {
                return Ok(0);
            }

            let started = *wait_started.get_or_insert_with(Instant::now);
            let waited = started.elapsed();
            if waited >= timeout {
                debug!(?waited, position = cursor.position, "rw buffer read timed out");
                return Err(BufferError::BlockingReadTimeout { waited });
            }
            self.readable.wait_for(&mut state, timeout - waited);
        }
    }
}
