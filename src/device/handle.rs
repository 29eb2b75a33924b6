use super::settings::{HandleSettings, PointerMode};
use super::sync::{KernelFault, SpinGuard};
use crate::io::{ConfigurablePrintTarget, PrintTarget};
use crate::SparseError;
use parking_lot::Mutex;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::fs::File;
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Execution context threaded through every routine.
///
/// A handle owns the worker pool that kernels are launched onto, along
/// with the launch configuration and the target for diagnostic output.
/// It is created and owned by the caller; there is no global device
/// state.
///
/// A kernel launch over a grid of `n` workers hands out tickets
/// `0..n` in increasing order to a fixed set of persistent workers.
/// Kernels map tickets to rows so that every row a worker may wait on
/// was handed out earlier, which guarantees progress for any pool size.
pub struct Handle {
    pool: Option<ThreadPool>,
    settings: HandleSettings,
    print_target: Mutex<PrintTarget>,
}

impl std::fmt::Debug for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handle")
            .field("active", &self.pool.is_some())
            .field("settings", &self.settings)
            .finish()
    }
}

impl Handle {
    /// Create a handle and start its worker pool.
    pub fn new(settings: HandleSettings) -> Result<Self, SparseError> {
        settings
            .validate()
            .map_err(|_| SparseError::InvalidValue("settings"))?;

        let pool = ThreadPoolBuilder::new()
            .num_threads(settings.max_threads as usize)
            .thread_name(|i| format!("csrtri-worker-{}", i))
            .build()
            .map_err(|e| SparseError::Internal(e.to_string()))?;

        Ok(Self {
            pool: Some(pool),
            settings,
            print_target: Mutex::new(PrintTarget::default()),
        })
    }

    /// Shut down the worker pool.   Every later call made through this
    /// handle fails with [`SparseError::InvalidHandle`].
    pub fn destroy(&mut self) {
        self.pool = None;
    }

    pub fn is_active(&self) -> bool {
        self.pool.is_some()
    }

    /// The worker pool, if the handle is still active.
    pub fn device(&self) -> Result<&ThreadPool, SparseError> {
        self.pool.as_ref().ok_or(SparseError::InvalidHandle)
    }

    /// Number of persistent workers used by a kernel launch
    pub fn num_threads(&self) -> Result<usize, SparseError> {
        Ok(self.device()?.current_num_threads())
    }

    pub fn settings(&self) -> &HandleSettings {
        &self.settings
    }

    pub fn pointer_mode(&self) -> PointerMode {
        self.settings.pointer_mode
    }

    pub fn set_pointer_mode(&mut self, mode: PointerMode) {
        self.settings.pointer_mode = mode;
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.settings.verbose = verbose;
    }

    pub fn wavefront_size(&self) -> usize {
        self.settings.wavefront_size
    }

    /// Checks that the kernels can be launched with the configured
    /// wavefront width and returns the width.
    pub(crate) fn check_arch(&self) -> Result<usize, SparseError> {
        match self.settings.wavefront_size {
            w @ (32 | 64) => Ok(w),
            w => Err(SparseError::ArchMismatch(w)),
        }
    }

    /// Run `kernel` once for every ticket in `0..grid`.
    ///
    /// The first fault raised by any worker stops the launch and is
    /// returned.   Other workers stop at their next ticket or dependency
    /// poll.
    pub(crate) fn launch<F>(&self, grid: usize, kernel: F) -> Result<(), SparseError>
    where
        F: Fn(usize, &SpinGuard) -> Result<(), KernelFault> + Sync,
    {
        let pool = self.device()?;
        if grid == 0 {
            return Ok(());
        }

        let workers = pool.current_num_threads().clamp(1, grid);
        let next = AtomicUsize::new(0);
        let abort = AtomicBool::new(false);
        let fault: Mutex<Option<KernelFault>> = Mutex::new(None);
        let guard = SpinGuard::new(self.settings.spin_limit, &abort);

        pool.scope(|s| {
            for _ in 0..workers {
                s.spawn(|_| loop {
                    if abort.load(Ordering::Relaxed) {
                        break;
                    }
                    let ticket = next.fetch_add(1, Ordering::Relaxed);
                    if ticket >= grid {
                        break;
                    }
                    if let Err(f) = kernel(ticket, &guard) {
                        abort.store(true, Ordering::Relaxed);
                        let mut first = fault.lock();
                        // an abort observed by one worker never hides
                        // the fault that caused it
                        if matches!(*first, None | Some(KernelFault::Aborted)) {
                            *first = Some(f);
                        }
                        break;
                    }
                });
            }
        });

        match fault.into_inner() {
            None => Ok(()),
            Some(f) => Err(f.into()),
        }
    }

    /// Write one line of call trace when running verbose.
    pub(crate) fn log_trace(&self, args: std::fmt::Arguments) {
        if !self.settings.verbose {
            return;
        }
        let mut out = self.print_target.lock();
        let _ = writeln!(out, "{}", args);
    }

    /// Write a block of diagnostics when running verbose.
    pub(crate) fn log_block<F>(&self, f: F)
    where
        F: FnOnce(&mut dyn Write) -> std::io::Result<()>,
    {
        if !self.settings.verbose {
            return;
        }
        let mut out = self.print_target.lock();
        let _ = f(&mut *out).and_then(|_| out.flush());
    }
}

impl ConfigurablePrintTarget for Handle {
    fn print_to_stdout(&mut self) {
        self.print_target.get_mut().print_to_stdout()
    }

    fn print_to_file(&mut self, file: File) {
        self.print_target.get_mut().print_to_file(file)
    }

    fn print_to_stream(&mut self, stream: Box<dyn Write + Send + Sync>) {
        self.print_target.get_mut().print_to_stream(stream)
    }

    fn print_to_buffer(&mut self) {
        self.print_target.get_mut().print_to_buffer()
    }

    fn print_to_sink(&mut self) {
        self.print_target.get_mut().print_to_sink()
    }

    fn get_print_buffer(&mut self) -> std::io::Result<String> {
        self.print_target.get_mut().get_print_buffer()
    }
}

#[test]
fn test_launch_covers_grid() {
    use super::settings::HandleSettingsBuilder;
    use std::sync::atomic::AtomicI32;

    for threads in [1, 3] {
        let settings = HandleSettingsBuilder::default()
            .max_threads(threads)
            .build()
            .unwrap();
        let handle = Handle::new(settings).unwrap();

        let hits: Vec<AtomicI32> = (0..100).map(|_| AtomicI32::new(0)).collect();
        handle
            .launch(hits.len(), |t, _| {
                hits[t].fetch_add(1, Ordering::Relaxed);
                Ok(())
            })
            .unwrap();
        assert!(hits.iter().all(|h| h.load(Ordering::Relaxed) == 1));
    }
}

#[test]
fn test_launch_reports_first_fault() {
    let handle = Handle::new(HandleSettings::default()).unwrap();
    let result = handle.launch(50, |t, _| match t {
        7 => Err(KernelFault::BadIndex("csr_col_ind")),
        _ => Ok(()),
    });
    assert_eq!(result, Err(SparseError::InvalidValue("csr_col_ind")));
}

#[test]
fn test_destroyed_handle() {
    let mut handle = Handle::new(HandleSettings::default()).unwrap();
    assert!(handle.is_active());
    handle.destroy();
    assert_eq!(handle.device().err(), Some(SparseError::InvalidHandle));
    assert_eq!(
        handle.launch(1, |_, _| Ok(())),
        Err(SparseError::InvalidHandle)
    );
}

#[test]
fn test_arch_check() {
    use super::settings::HandleSettingsBuilder;

    let handle = Handle::new(HandleSettings::default()).unwrap();
    assert_eq!(handle.check_arch(), Ok(64));

    let settings = HandleSettingsBuilder::default()
        .wavefront_size(48)
        .build()
        .unwrap();
    let handle = Handle::new(settings).unwrap();
    assert_eq!(handle.check_arch(), Err(SparseError::ArchMismatch(48)));
}
