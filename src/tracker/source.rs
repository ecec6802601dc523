use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;

use crate::session::AccelerationReading;

type Slot<T> = Arc<Mutex<Option<mpsc::UnboundedSender<T>>>>;

/// A push-based sensor: position fixes or acceleration readings.
pub trait SampleSource<T>: Send {
    fn request_permission(&mut self) -> bool;
    fn subscribe(&mut self) -> Subscription<T>;
}

/// Live feed from a source. Unsubscribes exactly once, on `unsubscribe` or
/// drop, whichever comes first.
pub struct Subscription<T> {
    rx: mpsc::UnboundedReceiver<T>,
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl<T> Subscription<T> {
    pub fn new(rx: mpsc::UnboundedReceiver<T>, cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            rx,
            cancel: Some(Box::new(cancel)),
        }
    }

    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    pub fn unsubscribe(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
        self.rx.close();
    }

    pub fn is_subscribed(&self) -> bool {
        self.cancel.is_some()
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// Source fed from the outside through a [`SourceHandle`].
pub struct ChannelSource<T> {
    permitted: bool,
    slot: Slot<T>,
}

impl<T> ChannelSource<T> {
    pub fn new(permitted: bool) -> Self {
        Self {
            permitted,
            slot: Arc::new(Mutex::new(None)),
        }
    }

    pub fn handle(&self) -> SourceHandle<T> {
        SourceHandle {
            slot: self.slot.clone(),
        }
    }
}

impl<T: Send + 'static> SampleSource<T> for ChannelSource<T> {
    fn request_permission(&mut self) -> bool {
        self.permitted
    }

    fn subscribe(&mut self) -> Subscription<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(tx);

        let slot = self.slot.clone();
        Subscription::new(rx, move || {
            slot.lock().unwrap_or_else(PoisonError::into_inner).take();
        })
    }
}

pub struct SourceHandle<T> {
    slot: Slot<T>,
}

impl<T> Clone for SourceHandle<T> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
        }
    }
}

impl<T> SourceHandle<T> {
    /// Returns false when nobody is subscribed and the sample was dropped.
    pub fn push(&self, sample: T) -> bool {
        match self.slot.lock().unwrap_or_else(PoisonError::into_inner).as_ref() {
            Some(tx) => tx.send(sample).is_ok(),
            None => false,
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

/// Motion source with a fixed output cadence.
///
/// Readings pushed through the handle replace the pending value; on each tick
/// the pending value is emitted and consumed, so a client that goes quiet
/// produces no further readings. A new subscription starts with nothing
/// pending.
pub struct IntervalMotionSource {
    permitted: bool,
    interval: Duration,
    latest: Arc<Mutex<Option<AccelerationReading>>>,
}

impl IntervalMotionSource {
    pub fn new(interval: Duration, permitted: bool) -> Self {
        Self {
            permitted,
            interval,
            latest: Arc::new(Mutex::new(None)),
        }
    }

    pub fn handle(&self) -> MotionHandle {
        MotionHandle {
            latest: self.latest.clone(),
        }
    }
}

impl SampleSource<AccelerationReading> for IntervalMotionSource {
    fn request_permission(&mut self) -> bool {
        self.permitted
    }

    /// Must be called from within a tokio runtime.
    fn subscribe(&mut self) -> Subscription<AccelerationReading> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let latest = self.latest.clone();
        let period = self.interval;

        let ticker = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let reading = latest.lock().unwrap_or_else(PoisonError::into_inner).take();
                if let Some(reading) = reading {
                    if tx.send(reading).is_err() {
                        break;
                    }
                }
            }
        });

        Subscription::new(rx, move || ticker.abort())
    }
}

#[derive(Clone)]
pub struct MotionHandle {
    latest: Arc<Mutex<Option<AccelerationReading>>>,
}

impl MotionHandle {
    pub fn push(&self, reading: AccelerationReading) {
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = Some(reading);
    }
}
