//! Size-adaptive writer: one call for small payloads, 64 KiB slices otherwise.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use qgrid_render::task::{CancelToken, Scheduler, TaskSlot};

use crate::conf::{N_CHUNK_SIZE, N_SMALL_WRITE_MAX};
use crate::host::FileHost;
use crate::report::{ReportWrite, ReportWriteBuilder};
use crate::spec::{EnumWriteState, EnumWriteStep, WriteError};
use crate::util::{count_chunks, derive_chunk_range};

/// Progress callback receiving `(bytes_written, bytes_total)`.
pub type TypeProgressFn = Box<dyn FnMut(u64, u64)>;

////////////////////////////////////////////////////////////////////////////////
// #region ChunkedWriter

/// Synchronous write state machine driven one [`ChunkedWriter::step`] at a time.
pub struct ChunkedWriter<H: FileHost> {
    host: Rc<H>,
    path: PathBuf,
    bytes: Vec<u8>,
    handle: Option<H::Handle>,
    state: EnumWriteState,
    report: ReportWriteBuilder,
}

impl<H: FileHost> ChunkedWriter<H> {
    /// Idle writer for `bytes` into `path`.
    pub fn new(host: Rc<H>, path: impl Into<PathBuf>, bytes: Vec<u8>) -> Self {
        Self {
            host,
            path: path.into(),
            bytes,
            handle: None,
            state: EnumWriteState::Idle,
            report: ReportWriteBuilder::default(),
        }
    }

    /// Current state.
    pub fn state(&self) -> EnumWriteState {
        self.state
    }

    /// Target path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Payload size.
    pub fn total(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Bytes committed so far.
    pub fn written(&self) -> u64 {
        self.report.cnt_bytes_written
    }

    /// Whether the payload goes through the sliced path.
    pub fn is_chunked(&self) -> bool {
        self.bytes.len() > N_SMALL_WRITE_MAX
    }

    /// Number of write calls a full run issues.
    pub fn n_chunks_expected(&self) -> usize {
        if self.is_chunked() {
            count_chunks(self.bytes.len(), N_CHUNK_SIZE)
        } else {
            1
        }
    }

    /// Report snapshot.
    pub fn report(&self) -> ReportWrite {
        self.report
            .build(self.path.clone(), self.total(), self.is_chunked())
    }

    /// Run one unit of work.
    ///
    /// Errors move the writer to [`EnumWriteState::Failed`] with the handle closed;
    /// bytes already written stay on disk.
    pub fn step(&mut self) -> Result<EnumWriteStep, WriteError> {
        match self.state {
            EnumWriteState::Idle if self.is_chunked() => self.open(),
            EnumWriteState::Idle => self.write_whole(),
            EnumWriteState::Writing { n_offset } => self.write_slice(n_offset),
            _ => Ok(EnumWriteStep::Finished),
        }
    }

    /// Stop the write, closing any open handle.
    pub fn cancel(&mut self) -> WriteError {
        self.close_quietly();
        self.state = EnumWriteState::Cancelled;
        WriteError::Cancelled {
            path: self.path.clone(),
            n_bytes_written: self.written(),
        }
    }

    fn write_whole(&mut self) -> Result<EnumWriteStep, WriteError> {
        let n_total = self.total();
        if let Err(err) = self.host.write_all(&self.path, &self.bytes) {
            self.state = EnumWriteState::Failed;
            return Err(WriteError::Write {
                path: self.path.clone(),
                offset: 0,
                message: err.to_string(),
            });
        }
        self.report.add_chunk(n_total);
        self.state = EnumWriteState::Done;
        Ok(EnumWriteStep::Progress {
            n_written: n_total,
            n_total,
        })
    }

    fn open(&mut self) -> Result<EnumWriteStep, WriteError> {
        match self.host.open(&self.path) {
            Ok(handle) => {
                self.handle = Some(handle);
                self.state = EnumWriteState::Writing { n_offset: 0 };
                Ok(EnumWriteStep::Opened)
            }
            Err(err) => {
                self.state = EnumWriteState::Failed;
                Err(WriteError::Open {
                    path: self.path.clone(),
                    message: err.to_string(),
                })
            }
        }
    }

    fn write_slice(&mut self, n_offset: u64) -> Result<EnumWriteStep, WriteError> {
        let n_total = self.total();
        let range = derive_chunk_range(n_offset as usize, self.bytes.len(), N_CHUNK_SIZE);
        let Some(handle) = self.handle.as_mut() else {
            self.state = EnumWriteState::Failed;
            return Err(WriteError::Write {
                path: self.path.clone(),
                offset: n_offset,
                message: "file handle is not open".to_string(),
            });
        };
        if let Err(err) = self
            .host
            .write_at(handle, n_offset, &self.bytes[range.clone()])
        {
            self.close_quietly();
            self.state = EnumWriteState::Failed;
            return Err(WriteError::Write {
                path: self.path.clone(),
                offset: n_offset,
                message: err.to_string(),
            });
        }
        self.report.add_chunk(range.len() as u64);
        let n_written = range.end as u64;

        if n_written < n_total {
            self.state = EnumWriteState::Writing {
                n_offset: n_written,
            };
        } else {
            if let Some(handle) = self.handle.take()
                && let Err(err) = self.host.close(handle)
            {
                self.state = EnumWriteState::Failed;
                return Err(WriteError::Close {
                    path: self.path.clone(),
                    message: err.to_string(),
                });
            }
            self.state = EnumWriteState::Done;
        }
        Ok(EnumWriteStep::Progress { n_written, n_total })
    }

    fn close_quietly(&mut self) {
        if let Some(handle) = self.handle.take()
            && let Err(err) = self.host.close(handle)
        {
            tracing::warn!(path = %self.path.display(), error = %err, "failed to close write handle");
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WriteAsync

struct WriteTaskState<H: FileHost, C> {
    writer: ChunkedWriter<H>,
    token: CancelToken,
    slot: TaskSlot,
    on_progress: Option<TypeProgressFn>,
    on_complete: Option<C>,
}

impl<H: FileHost, C> WriteTaskState<H, C>
where
    C: FnOnce(Result<ReportWrite, WriteError>),
{
    fn complete(&mut self, result: Result<ReportWrite, WriteError>) {
        self.slot.release(&self.token);
        match &result {
            Ok(report) => tracing::info!("{report}"),
            Err(err) => tracing::warn!(error = %err, "write did not complete"),
        }
        if let Some(on_complete) = self.on_complete.take() {
            on_complete(result);
        }
    }
}

/// Write `bytes` to `path` through `host` without blocking the scheduler loop.
///
/// Payloads up to 1 MiB take one deferred write; larger ones open the file and
/// write one 64 KiB slice per scheduled task. `on_progress` runs after every
/// write call and `on_complete` runs exactly once. Starting a write cancels the
/// one already registered in `slot`; the check happens before each slice.
pub fn write_async<H, C>(
    scheduler: Rc<dyn Scheduler>,
    slot: &TaskSlot,
    host: Rc<H>,
    path: impl Into<PathBuf>,
    bytes: Vec<u8>,
    on_progress: Option<TypeProgressFn>,
    on_complete: C,
) where
    H: FileHost + 'static,
    H::Handle: 'static,
    C: FnOnce(Result<ReportWrite, WriteError>) + 'static,
{
    let token = slot.begin();
    let writer = ChunkedWriter::new(host, path, bytes);
    tracing::debug!(
        path = %writer.path().display(),
        n_bytes = writer.total(),
        n_chunks = writer.n_chunks_expected(),
        "write scheduled"
    );
    let state = Rc::new(RefCell::new(WriteTaskState {
        writer,
        token,
        slot: slot.clone(),
        on_progress,
        on_complete: Some(on_complete),
    }));
    schedule_write_step(scheduler, state);
}

fn schedule_write_step<H, C>(
    scheduler: Rc<dyn Scheduler>,
    state: Rc<RefCell<WriteTaskState<H, C>>>,
) where
    H: FileHost + 'static,
    H::Handle: 'static,
    C: FnOnce(Result<ReportWrite, WriteError>) + 'static,
{
    let scheduler_next = Rc::clone(&scheduler);
    scheduler.defer(Box::new(move || {
        let mut guard = state.borrow_mut();
        let st = &mut *guard;

        if st.token.is_cancelled() {
            let err = st.writer.cancel();
            st.complete(Err(err));
            return;
        }

        match st.writer.step() {
            Ok(EnumWriteStep::Progress { n_written, n_total }) => {
                tracing::debug!(n_written, n_total, "write progress");
                if let Some(on_progress) = st.on_progress.as_mut() {
                    on_progress(n_written, n_total);
                }
            }
            Ok(EnumWriteStep::Opened) | Ok(EnumWriteStep::Finished) => {}
            Err(err) => {
                st.complete(Err(err));
                return;
            }
        }

        if st.writer.state() == EnumWriteState::Done {
            let report = st.writer.report();
            st.complete(Ok(report));
            return;
        }

        drop(guard);
        schedule_write_step(scheduler_next, state);
    }));
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
