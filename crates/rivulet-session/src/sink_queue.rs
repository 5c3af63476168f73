use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use rivulet_core::{MediaSink, SinkError};
use tracing::{trace, warn};

/// One queued sink operation.
#[derive(Debug, Clone)]
pub enum SinkOp {
    Append { data: Bytes, timestamp_offset: f64 },
    Remove { start: f64, end: f64 },
}

type UpdateCallback = Box<dyn Fn(Duration) + Send>;

/// FIFO serialization of mutating operations against one sink.
///
/// The sink permits a single in-flight operation; everything else waits
/// here in order. The embedder must call [`on_update_end`](Self::on_update_end)
/// when the sink signals completion, which records the operation's elapsed
/// time and immediately dispatches the next queued operation. One queue
/// exists per (sink, mime type) pair.
pub struct SinkAppendQueue {
    sink: Arc<dyn MediaSink>,
    mime_type: String,
    queue: VecDeque<SinkOp>,
    busy: bool,
    op_started: Option<Instant>,
    on_update: Option<UpdateCallback>,
}

impl SinkAppendQueue {
    pub fn new(sink: Arc<dyn MediaSink>, mime_type: impl Into<String>) -> Self {
        Self {
            sink,
            mime_type: mime_type.into(),
            queue: VecDeque::new(),
            busy: false,
            op_started: None,
            on_update: None,
        }
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn queued_ops(&self) -> usize {
        self.queue.len()
    }

    /// Total payload bytes waiting in queued append operations.
    pub fn queued_append_bytes(&self) -> usize {
        self.queue
            .iter()
            .map(|op| match op {
                SinkOp::Append { data, .. } => data.len(),
                SinkOp::Remove { .. } => 0,
            })
            .sum()
    }

    /// Invoked with the elapsed time of each completed operation.
    pub fn on_update(&mut self, callback: impl Fn(Duration) + Send + 'static) {
        self.on_update = Some(Box::new(callback));
    }

    /// Queue an append and dispatch if the sink is idle.
    pub fn append(&mut self, data: Bytes, timestamp_offset: f64) {
        self.queue.push_back(SinkOp::Append {
            data,
            timestamp_offset,
        });
        self.try_run_queue_once();
    }

    /// Queue a remove and dispatch if the sink is idle.
    pub fn remove(&mut self, start: f64, end: f64) {
        self.queue.push_back(SinkOp::Remove { start, end });
        self.try_run_queue_once();
    }

    /// Queue removal of the entire timeline.
    pub fn flush(&mut self) {
        self.remove(0.0, f64::INFINITY);
    }

    /// Discard every pending operation; with `immediate_abort`, also abort
    /// the in-flight one.
    pub fn drop_pending(&mut self, immediate_abort: bool) {
        let dropped = self.queue.len();
        self.queue.clear();
        if immediate_abort {
            self.sink.abort();
            self.busy = false;
            self.op_started = None;
        }
        trace!(dropped, immediate_abort, "dropped pending sink operations");
    }

    /// Abort whatever is running, discard the queue, then flush.
    pub fn drop_and_flush(&mut self) {
        self.drop_pending(true);
        self.flush();
    }

    /// Dispatch the head of the queue if neither we nor the sink are busy.
    ///
    /// A `Busy` refusal is backpressure: the operation goes back to the
    /// front and waits for the next update-end. A rejection discards the
    /// operation and moves on.
    pub fn try_run_queue_once(&mut self) {
        while !self.busy && !self.sink.busy() {
            let Some(op) = self.queue.pop_front() else {
                return;
            };
            let result = match &op {
                SinkOp::Append {
                    data,
                    timestamp_offset,
                } => self.sink.append(data, *timestamp_offset),
                SinkOp::Remove { start, end } => self.sink.remove(*start, *end),
            };
            match result {
                Ok(()) => {
                    self.busy = true;
                    self.op_started = Some(Instant::now());
                }
                Err(SinkError::Busy) => {
                    self.queue.push_front(op);
                    return;
                }
                Err(SinkError::Rejected(message)) => {
                    warn!(mime_type = %self.mime_type, %message, "sink rejected operation");
                }
            }
        }
    }

    /// The sink finished its in-flight operation.
    pub fn on_update_end(&mut self) {
        self.busy = false;
        let elapsed = self.op_started.take().map(|t| t.elapsed());
        if let (Some(callback), Some(elapsed)) = (&self.on_update, elapsed) {
            callback(elapsed);
        }
        self.try_run_queue_once();
    }
}
