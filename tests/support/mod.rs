//! Stub computational modules shared by integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use scanfleet::{ColorParams, FleetError, FleetResult, ModuleFactory, RowRenderer};

/// Deterministic pattern derived from `(row, params)`: pixel `x` of row `y` is
/// `[r*255, g*255, b*255 ^ y, 255 ^ x]`.
pub struct PatternModule;

struct PatternRenderer {
    size: u32,
    params: ColorParams,
}

impl ModuleFactory for PatternModule {
    fn construct(&self, size: u32, params: ColorParams) -> FleetResult<Box<dyn RowRenderer>> {
        Ok(Box::new(PatternRenderer { size, params }))
    }
}

impl RowRenderer for PatternRenderer {
    fn render_row(&mut self, row: u32) -> FleetResult<Vec<u8>> {
        let q = |c: f64| (c * 255.0) as u8;
        let mut out = Vec::with_capacity(self.size as usize * 4);
        for x in 0..self.size {
            out.extend_from_slice(&[
                q(self.params.r),
                q(self.params.g),
                q(self.params.b) ^ row as u8,
                255 ^ x as u8,
            ]);
        }
        Ok(out)
    }
}

/// Returns one fixed pixel repeated across every row and counts `render_row` calls.
pub struct SolidModule {
    pub pixel: [u8; 4],
    pub row_calls: Arc<AtomicUsize>,
}

impl SolidModule {
    pub fn new(pixel: [u8; 4]) -> Self {
        Self {
            pixel,
            row_calls: Arc::default(),
        }
    }
}

struct SolidRenderer {
    size: u32,
    pixel: [u8; 4],
    row_calls: Arc<AtomicUsize>,
}

impl ModuleFactory for SolidModule {
    fn construct(&self, size: u32, _params: ColorParams) -> FleetResult<Box<dyn RowRenderer>> {
        Ok(Box::new(SolidRenderer {
            size,
            pixel: self.pixel,
            row_calls: self.row_calls.clone(),
        }))
    }
}

impl RowRenderer for SolidRenderer {
    fn render_row(&mut self, _row: u32) -> FleetResult<Vec<u8>> {
        self.row_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.pixel.repeat(self.size as usize))
    }
}

/// Wraps [`PatternModule`], but crashes (panics) at `crash_row` for jobs whose red channel equals
/// `poisoned_r`, and refuses construction for jobs whose red channel equals `refused_r`.
pub struct FaultyModule {
    pub poisoned_r: f64,
    pub crash_row: u32,
    pub refused_r: Option<f64>,
}

impl ModuleFactory for FaultyModule {
    fn construct(&self, size: u32, params: ColorParams) -> FleetResult<Box<dyn RowRenderer>> {
        if self.refused_r == Some(params.r) {
            return Err(FleetError::initialization("module unavailable"));
        }
        let crash_at = (params.r == self.poisoned_r).then_some(self.crash_row);
        Ok(Box::new(FaultyRenderer {
            inner: PatternRenderer { size, params },
            crash_at,
        }))
    }
}

struct FaultyRenderer {
    inner: PatternRenderer,
    crash_at: Option<u32>,
}

impl RowRenderer for FaultyRenderer {
    fn render_row(&mut self, row: u32) -> FleetResult<Vec<u8>> {
        if self.crash_at == Some(row) {
            panic!("simulated worker crash at row {row}");
        }
        self.inner.render_row(row)
    }
}

/// Tracks how many module instances are alive at once.
#[derive(Default)]
pub struct GaugeModule {
    live: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl GaugeModule {
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

struct GaugeRenderer {
    size: u32,
    live: Arc<AtomicUsize>,
}

impl ModuleFactory for GaugeModule {
    fn construct(&self, size: u32, _params: ColorParams) -> FleetResult<Box<dyn RowRenderer>> {
        let now = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        Ok(Box::new(GaugeRenderer {
            size,
            live: self.live.clone(),
        }))
    }
}

impl RowRenderer for GaugeRenderer {
    fn render_row(&mut self, _row: u32) -> FleetResult<Vec<u8>> {
        std::thread::sleep(Duration::from_millis(1));
        Ok(vec![0; self.size as usize * 4])
    }
}

impl Drop for GaugeRenderer {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Blocks in `render_row` for rows >= 1 until opened, so tests can cancel mid-job
/// deterministically.
pub struct GateModule {
    gate: Arc<(Mutex<GateState>, Condvar)>,
}

#[derive(Default)]
struct GateState {
    entered: bool,
    open: bool,
}

impl GateModule {
    pub fn new() -> Self {
        Self {
            gate: Arc::new((Mutex::new(GateState::default()), Condvar::new())),
        }
    }

    /// Wait until some worker is blocked inside row 1.
    pub fn wait_entered(&self) {
        let (lock, cv) = &*self.gate;
        let mut st = lock.lock().unwrap();
        while !st.entered {
            st = cv.wait(st).unwrap();
        }
    }

    pub fn open(&self) {
        let (lock, cv) = &*self.gate;
        lock.lock().unwrap().open = true;
        cv.notify_all();
    }
}

struct GateRenderer {
    size: u32,
    gate: Arc<(Mutex<GateState>, Condvar)>,
}

impl ModuleFactory for GateModule {
    fn construct(&self, size: u32, _params: ColorParams) -> FleetResult<Box<dyn RowRenderer>> {
        Ok(Box::new(GateRenderer {
            size,
            gate: self.gate.clone(),
        }))
    }
}

impl RowRenderer for GateRenderer {
    fn render_row(&mut self, row: u32) -> FleetResult<Vec<u8>> {
        if row >= 1 {
            let (lock, cv) = &*self.gate;
            let mut st = lock.lock().unwrap();
            st.entered = true;
            cv.notify_all();
            while !st.open {
                st = cv.wait(st).unwrap();
            }
        }
        Ok(vec![row as u8; self.size as usize * 4])
    }
}

/// Returns `Err` from `render_row` at `fail_row`, and counts live module instances so tests can
/// see the worker dropped its module.
pub struct ErrAtModule {
    pub fail_row: u32,
    live: Arc<AtomicUsize>,
}

impl ErrAtModule {
    pub fn new(fail_row: u32) -> Self {
        Self {
            fail_row,
            live: Arc::default(),
        }
    }

    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

struct ErrAtRenderer {
    size: u32,
    fail_row: u32,
    live: Arc<AtomicUsize>,
}

impl ModuleFactory for ErrAtModule {
    fn construct(&self, size: u32, _params: ColorParams) -> FleetResult<Box<dyn RowRenderer>> {
        self.live.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ErrAtRenderer {
            size,
            fail_row: self.fail_row,
            live: self.live.clone(),
        }))
    }
}

impl RowRenderer for ErrAtRenderer {
    fn render_row(&mut self, row: u32) -> FleetResult<Vec<u8>> {
        if row == self.fail_row {
            return Err(FleetError::render(format!("no data for row {row}")));
        }
        Ok(vec![200; self.size as usize * 4])
    }
}

impl Drop for ErrAtRenderer {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Every job's first row waits until `parties` jobs are inside `render_row` at once. If that
/// never happens within `timeout`, the row fails with a render error.
pub struct RendezvousModule {
    parties: usize,
    timeout: Duration,
    arrived: Arc<(Mutex<usize>, Condvar)>,
}

impl RendezvousModule {
    pub fn new(parties: usize, timeout: Duration) -> Self {
        Self {
            parties,
            timeout,
            arrived: Arc::new((Mutex::new(0), Condvar::new())),
        }
    }
}

struct RendezvousRenderer {
    size: u32,
    parties: usize,
    timeout: Duration,
    arrived: Arc<(Mutex<usize>, Condvar)>,
}

impl ModuleFactory for RendezvousModule {
    fn construct(&self, size: u32, _params: ColorParams) -> FleetResult<Box<dyn RowRenderer>> {
        Ok(Box::new(RendezvousRenderer {
            size,
            parties: self.parties,
            timeout: self.timeout,
            arrived: self.arrived.clone(),
        }))
    }
}

impl RowRenderer for RendezvousRenderer {
    fn render_row(&mut self, row: u32) -> FleetResult<Vec<u8>> {
        if row == 0 {
            let (lock, cv) = &*self.arrived;
            let mut n = lock.lock().unwrap();
            *n += 1;
            cv.notify_all();
            let (n, waited) = cv
                .wait_timeout_while(n, self.timeout, |n| *n < self.parties)
                .unwrap();
            if waited.timed_out() {
                return Err(FleetError::render(format!(
                    "only {} of {} jobs were in flight together",
                    *n, self.parties
                )));
            }
        }
        Ok(vec![row as u8; self.size as usize * 4])
    }
}
