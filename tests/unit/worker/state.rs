use std::sync::Mutex;

use super::*;

/// Fills every pixel of row `y` with `[y, r*255, 0, 255]` and records the rows it was asked for.
struct Recording {
    size: u32,
    tag: u8,
    calls: Arc<Mutex<Vec<u32>>>,
}

impl RowRenderer for Recording {
    fn render_row(&mut self, row: u32) -> FleetResult<Vec<u8>> {
        self.calls.lock().unwrap().push(row);
        Ok([row as u8, self.tag, 0, 255].repeat(self.size as usize))
    }
}

fn recording_factory(calls: Arc<Mutex<Vec<u32>>>) -> Arc<dyn ModuleFactory> {
    Arc::new(move |size: u32, params: ColorParams| -> FleetResult<Box<dyn RowRenderer>> {
        Ok(Box::new(Recording {
            size,
            tag: (params.r * 255.0) as u8,
            calls: calls.clone(),
        }))
    })
}

fn params() -> ColorParams {
    ColorParams::new(1.0, 0.0, 0.0)
}

#[test]
fn render_before_init_is_protocol_violation() {
    let mut w = RenderWorker::new(recording_factory(Arc::default()));
    assert!(!w.is_ready());
    assert!(matches!(w.render_next(), Err(FleetError::Protocol(_))));
}

#[test]
fn double_init_is_protocol_violation() {
    let mut w = RenderWorker::new(recording_factory(Arc::default()));
    w.init(4, ScanlineRange::full(4), params()).unwrap();
    let err = w.init(4, ScanlineRange::full(4), params()).unwrap_err();
    assert!(matches!(err, FleetError::Protocol(_)));
}

#[test]
fn rows_stream_in_order_then_exhaust() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut w = RenderWorker::new(recording_factory(calls.clone()));
    w.init(8, ScanlineRange::new(2, 5).unwrap(), params()).unwrap();
    assert_eq!(w.cursor(), Some(2));

    let mut seen = Vec::new();
    while let RowResult::Row(row) = w.render_next().unwrap() {
        assert_eq!(row.data.len(), 8 * 4);
        assert_eq!(row.data[0], row.y as u8);
        seen.push(row.y);
    }
    assert_eq!(seen, vec![2, 3, 4]);
    assert_eq!(*calls.lock().unwrap(), vec![2, 3, 4]);
    assert_eq!(w.cursor(), Some(5));
}

#[test]
fn exhaustion_is_idempotent() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut w = RenderWorker::new(recording_factory(calls.clone()));
    w.init(2, ScanlineRange::full(2), params()).unwrap();
    assert!(!w.render_next().unwrap().is_exhausted());
    assert!(!w.render_next().unwrap().is_exhausted());
    for _ in 0..5 {
        assert!(w.render_next().unwrap().is_exhausted());
    }
    assert_eq!(calls.lock().unwrap().len(), 2);
    assert_eq!(w.cursor(), Some(2));
}

#[test]
fn empty_range_exhausts_immediately() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut w = RenderWorker::new(recording_factory(calls.clone()));
    w.init(4, ScanlineRange::new(3, 3).unwrap(), params()).unwrap();
    assert_eq!(w.render_next().unwrap(), RowResult::Exhausted);
    assert!(calls.lock().unwrap().is_empty());
}

#[test]
fn init_rejects_range_past_size() {
    let mut w = RenderWorker::new(recording_factory(Arc::default()));
    let err = w
        .init(4, ScanlineRange::new(0, 5).unwrap(), params())
        .unwrap_err();
    assert!(matches!(err, FleetError::Validation(_)));
    assert!(!w.is_ready());
}

#[test]
fn factory_failure_is_initialization_error() {
    let factory: Arc<dyn ModuleFactory> = Arc::new(
        |_size: u32, _params: ColorParams| -> FleetResult<Box<dyn RowRenderer>> {
            Err(FleetError::transport("module unavailable"))
        },
    );
    let mut w = RenderWorker::new(factory);
    let err = w.init(4, ScanlineRange::full(4), params()).unwrap_err();
    assert!(matches!(err, FleetError::Initialization(_)));
    assert!(!w.is_ready());
}

#[test]
fn short_row_is_render_error_and_cursor_holds() {
    struct Short;
    impl RowRenderer for Short {
        fn render_row(&mut self, _row: u32) -> FleetResult<Vec<u8>> {
            Ok(vec![0; 3])
        }
    }
    let factory: Arc<dyn ModuleFactory> = Arc::new(
        |_size: u32, _params: ColorParams| -> FleetResult<Box<dyn RowRenderer>> {
            Ok(Box::new(Short))
        },
    );
    let mut w = RenderWorker::new(factory);
    w.init(4, ScanlineRange::full(4), params()).unwrap();
    assert!(matches!(w.render_next(), Err(FleetError::Render(_))));
    assert_eq!(w.cursor(), Some(0));
}
