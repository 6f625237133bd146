//! Progress reporting and cooperative cancellation for puzzle construction.

/// Receiver of progress updates while a puzzle is being built.
///
/// Every method returns whether construction should continue. Returning
/// `false` cancels construction, which then produces no puzzle.
pub trait Progress {
    /// Called at the start of a phase. `max` is the number of steps in the
    /// phase, if known.
    fn subtask_init(&mut self, name: &str, max: Option<usize>) -> bool;
    /// Called after each step of the current phase.
    fn update_progress(&mut self, n: usize) -> bool;
    /// Called at the end of the current phase.
    fn subtask_done(&mut self) -> bool;
}

/// Ignores progress and never cancels.
impl Progress for () {
    fn subtask_init(&mut self, _name: &str, _max: Option<usize>) -> bool {
        true
    }
    fn update_progress(&mut self, _n: usize) -> bool {
        true
    }
    fn subtask_done(&mut self) -> bool {
        true
    }
}

impl<P: Progress + ?Sized> Progress for &mut P {
    fn subtask_init(&mut self, name: &str, max: Option<usize>) -> bool {
        (**self).subtask_init(name, max)
    }
    fn update_progress(&mut self, n: usize) -> bool {
        (**self).update_progress(n)
    }
    fn subtask_done(&mut self) -> bool {
        (**self).subtask_done()
    }
}

/// Reports progress through the [`log`] crate and never cancels.
#[derive(Debug, Default, Clone)]
pub struct LogProgress {
    current: Option<(String, Option<usize>)>,
}
impl LogProgress {
    /// Constructs a new progress logger.
    pub fn new() -> Self {
        Self::default()
    }
}
impl Progress for LogProgress {
    fn subtask_init(&mut self, name: &str, max: Option<usize>) -> bool {
        match max {
            Some(max) => log::info!("{name} ({max} steps)"),
            None => log::info!("{name}"),
        }
        self.current = Some((name.to_owned(), max));
        true
    }
    fn update_progress(&mut self, n: usize) -> bool {
        match &self.current {
            Some((name, Some(max))) => log::debug!("{name}: {n}/{max}"),
            Some((name, None)) => log::debug!("{name}: {n}"),
            None => log::debug!("progress: {n}"),
        }
        true
    }
    fn subtask_done(&mut self) -> bool {
        if let Some((name, _)) = self.current.take() {
            log::debug!("{name}: done");
        }
        true
    }
}

/// Progress update passed to a [`FnProgress`] callback.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProgressEvent<'a> {
    /// A phase started.
    Init {
        /// Name of the phase.
        name: &'a str,
        /// Number of steps in the phase, if known.
        max: Option<usize>,
    },
    /// A step of the current phase finished.
    Update(usize),
    /// The current phase finished.
    Done,
}

/// Reports progress to a closure, which returns `false` to cancel.
pub struct FnProgress<F>(pub F);
impl<F> std::fmt::Debug for FnProgress<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnProgress").finish_non_exhaustive()
    }
}
impl<F: FnMut(ProgressEvent<'_>) -> bool> FnProgress<F> {
    /// Wraps a closure.
    pub fn new(f: F) -> Self {
        Self(f)
    }
}
impl<F: FnMut(ProgressEvent<'_>) -> bool> Progress for FnProgress<F> {
    fn subtask_init(&mut self, name: &str, max: Option<usize>) -> bool {
        (self.0)(ProgressEvent::Init { name, max })
    }
    fn update_progress(&mut self, n: usize) -> bool {
        (self.0)(ProgressEvent::Update(n))
    }
    fn subtask_done(&mut self) -> bool {
        (self.0)(ProgressEvent::Done)
    }
}
