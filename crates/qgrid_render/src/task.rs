//! Cooperative single-threaded task primitives and the batched render.
//!
//! The host supplies a [`Scheduler`] that runs deferred closures later on the
//! same thread. Long operations split themselves into steps, re-scheduling the
//! next step and checking their [`CancelToken`] before each one.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use crate::layout::{SpecRenderContext, render_batch_with_context};
use crate::spec::{SpecCellMap, SpecLine, SpecRenderOptions, SpecResultBatch};

////////////////////////////////////////////////////////////////////////////////
// #region Scheduling

/// Deferred work.
pub type TypeTask = Box<dyn FnOnce()>;

/// "Run later" primitive provided by the host event loop.
pub trait Scheduler {
    /// Queue `task` to run after the current one returns.
    fn defer(&self, task: TypeTask);
}

/// FIFO scheduler drained explicitly with [`LocalScheduler::run_until_idle`].
#[derive(Default, Clone)]
pub struct LocalScheduler {
    queue: Rc<RefCell<VecDeque<TypeTask>>>,
}

impl LocalScheduler {
    /// Empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued tasks.
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Run one queued task; `false` when the queue was empty.
    pub fn run_one(&self) -> bool {
        // The borrow ends before the task runs so it can queue more work.
        let task = self.queue.borrow_mut().pop_front();
        match task {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Run tasks until none is left; returns how many ran.
    pub fn run_until_idle(&self) -> usize {
        let mut n_ran = 0;
        while self.run_one() {
            n_ran += 1;
        }
        n_ran
    }
}

impl Scheduler for LocalScheduler {
    fn defer(&self, task: TypeTask) {
        self.queue.borrow_mut().push_back(task);
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Cancellation

/// Shared cancellation flag checked by a running task between steps.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Rc<Cell<bool>>,
}

impl CancelToken {
    /// Fresh, not cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.set(true);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.get()
    }

    /// Whether both handles share one flag.
    pub fn is_same(&self, other: &CancelToken) -> bool {
        Rc::ptr_eq(&self.flag, &other.flag)
    }
}

/// Holder of the single active task of one kind.
///
/// [`TaskSlot::begin`] cancels whatever was running and hands out a new token.
#[derive(Debug, Clone, Default)]
pub struct TaskSlot {
    current: Rc<RefCell<Option<CancelToken>>>,
}

impl TaskSlot {
    /// Empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the active task, if any, and register a new one.
    pub fn begin(&self) -> CancelToken {
        let token = CancelToken::new();
        if let Some(prev) = self.current.borrow_mut().replace(token.clone()) {
            prev.cancel();
        }
        token
    }

    /// Cancel the active task, if any.
    pub fn cancel(&self) {
        if let Some(prev) = self.current.borrow_mut().take() {
            prev.cancel();
        }
    }

    /// Clear the slot if `token` is still the registered task.
    ///
    /// Called when a task finishes; a newer registration is left alone.
    pub fn release(&self, token: &CancelToken) {
        let mut current = self.current.borrow_mut();
        if current.as_ref().is_some_and(|active| active.is_same(token)) {
            *current = None;
        }
    }

    /// Whether a registered task is still running.
    pub fn is_active(&self) -> bool {
        self.current
            .borrow()
            .as_ref()
            .is_some_and(|token| !token.is_cancelled())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region BatchedRender

/// Final outcome of [`render_batched`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumBatchedRenderOutcome {
    /// Every line was delivered.
    Completed {
        /// Cell maps of the rendered document.
        cell_maps: Vec<SpecCellMap>,
        /// Total delivered lines.
        n_lines: usize,
    },
    /// A newer render (or an explicit cancel) stopped this one.
    Cancelled {
        /// Lines delivered before cancellation was observed.
        n_lines_delivered: usize,
    },
}

struct BatchedRenderState<S, D> {
    lines: Vec<SpecLine>,
    cell_maps: Vec<SpecCellMap>,
    n_next: usize,
    n_batch: usize,
    token: CancelToken,
    slot: TaskSlot,
    on_lines: S,
    on_done: Option<D>,
}

/// Render `batch` and deliver its lines in steps of `options.batch_size`.
///
/// `on_lines(first_line_index, lines)` receives each step in order; `on_done`
/// runs exactly once with the outcome. The first step is deferred too, so
/// nothing is delivered before the caller returns to the scheduler.
pub fn render_batched<S, D>(
    scheduler: Rc<dyn Scheduler>,
    slot: &TaskSlot,
    batch: &SpecResultBatch,
    options: &SpecRenderOptions,
    on_lines: S,
    on_done: D,
) where
    S: FnMut(usize, &[SpecLine]) + 'static,
    D: FnOnce(EnumBatchedRenderOutcome) + 'static,
{
    let token = slot.begin();
    let (document, cell_maps) = render_batch_with_context(batch, options, &SpecRenderContext::now());
    let state = Rc::new(RefCell::new(BatchedRenderState {
        lines: document.lines,
        cell_maps,
        n_next: 0,
        n_batch: options.batch_size.max(1),
        token,
        slot: slot.clone(),
        on_lines,
        on_done: Some(on_done),
    }));
    schedule_step(scheduler, state);
}

fn schedule_step<S, D>(scheduler: Rc<dyn Scheduler>, state: Rc<RefCell<BatchedRenderState<S, D>>>)
where
    S: FnMut(usize, &[SpecLine]) + 'static,
    D: FnOnce(EnumBatchedRenderOutcome) + 'static,
{
    let scheduler_next = Rc::clone(&scheduler);
    scheduler.defer(Box::new(move || {
        let mut guard = state.borrow_mut();
        let st = &mut *guard;

        if st.token.is_cancelled() {
            tracing::debug!(n_delivered = st.n_next, "batched render cancelled");
            st.slot.release(&st.token);
            if let Some(on_done) = st.on_done.take() {
                on_done(EnumBatchedRenderOutcome::Cancelled {
                    n_lines_delivered: st.n_next,
                });
            }
            return;
        }

        let n_end = (st.n_next + st.n_batch).min(st.lines.len());
        if st.n_next < n_end {
            (st.on_lines)(st.n_next, &st.lines[st.n_next..n_end]);
            tracing::debug!(n_first = st.n_next, n_end, "delivered render batch");
            st.n_next = n_end;
        }

        if st.n_next >= st.lines.len() {
            st.slot.release(&st.token);
            if let Some(on_done) = st.on_done.take() {
                on_done(EnumBatchedRenderOutcome::Completed {
                    cell_maps: std::mem::take(&mut st.cell_maps),
                    n_lines: st.lines.len(),
                });
            }
            return;
        }

        drop(guard);
        schedule_step(scheduler_next, state);
    }));
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{EnumCellValue, SpecColumn, SpecResultSet, TypeRow};

    fn batch_of(n_rows: i64) -> SpecResultBatch {
        let l_rows: Vec<TypeRow> = (0..n_rows)
            .map(|n| TypeRow::from([("n".to_string(), EnumCellValue::from(n))]))
            .collect();
        SpecResultBatch::new(vec![SpecResultSet::new(
            vec![SpecColumn::new("n", 0)],
            l_rows,
        )])
    }

    #[test]
    fn task_slot_cancels_previous_token() {
        let slot = TaskSlot::new();
        let token_1 = slot.begin();
        assert!(slot.is_active());
        let token_2 = slot.begin();
        assert!(token_1.is_cancelled());
        assert!(!token_2.is_cancelled());
        slot.cancel();
        assert!(token_2.is_cancelled());
        assert!(!slot.is_active());
    }

    #[test]
    fn task_slot_release_only_clears_own_token() {
        let slot = TaskSlot::new();
        let token_1 = slot.begin();
        let token_2 = slot.begin();
        slot.release(&token_1);
        assert!(slot.is_active());
        slot.release(&token_2);
        assert!(!slot.is_active());
        assert!(!token_2.is_cancelled());
    }

    #[test]
    fn batched_render_delivers_every_line_in_order() {
        let scheduler = LocalScheduler::new();
        let slot = TaskSlot::new();
        let options = SpecRenderOptions {
            batch_size: 4,
            ..Default::default()
        };
        let l_received: Rc<RefCell<Vec<(usize, usize)>>> = Rc::default();
        let outcome: Rc<RefCell<Option<EnumBatchedRenderOutcome>>> = Rc::default();

        let l_received_sink = Rc::clone(&l_received);
        let outcome_sink = Rc::clone(&outcome);
        render_batched(
            Rc::new(scheduler.clone()),
            &slot,
            &batch_of(7),
            &options,
            move |n_first, l_lines| l_received_sink.borrow_mut().push((n_first, l_lines.len())),
            move |result| *outcome_sink.borrow_mut() = Some(result),
        );
        assert!(l_received.borrow().is_empty());

        assert!(slot.is_active());
        scheduler.run_until_idle();
        assert!(!slot.is_active());
        // 7 rows + top + header + rule + bottom = 11 lines.
        assert_eq!(*l_received.borrow(), vec![(0, 4), (4, 4), (8, 3)]);
        match outcome.borrow().as_ref() {
            Some(EnumBatchedRenderOutcome::Completed { cell_maps, n_lines }) => {
                assert_eq!(*n_lines, 11);
                assert_eq!(cell_maps.len(), 1);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn newer_render_cancels_older_between_batches() {
        let scheduler = LocalScheduler::new();
        let slot = TaskSlot::new();
        let options = SpecRenderOptions {
            batch_size: 2,
            ..Default::default()
        };
        let l_outcomes: Rc<RefCell<Vec<EnumBatchedRenderOutcome>>> = Rc::default();

        let l_outcomes_1 = Rc::clone(&l_outcomes);
        render_batched(
            Rc::new(scheduler.clone()),
            &slot,
            &batch_of(10),
            &options,
            |_, _| {},
            move |result| l_outcomes_1.borrow_mut().push(result),
        );
        assert!(scheduler.run_one());

        let l_outcomes_2 = Rc::clone(&l_outcomes);
        render_batched(
            Rc::new(scheduler.clone()),
            &slot,
            &batch_of(1),
            &options,
            |_, _| {},
            move |result| l_outcomes_2.borrow_mut().push(result),
        );
        scheduler.run_until_idle();

        let l_outcomes = l_outcomes.borrow();
        assert_eq!(l_outcomes.len(), 2);
        assert_eq!(
            l_outcomes[0],
            EnumBatchedRenderOutcome::Cancelled {
                n_lines_delivered: 2
            }
        );
        assert!(matches!(
            l_outcomes[1],
            EnumBatchedRenderOutcome::Completed { n_lines: 5, .. }
        ));
    }
}
