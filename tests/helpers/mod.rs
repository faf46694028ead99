/// Test doubles to simulate the CAN bus and timer during integration tests.
use korri_isobus::protocol::{
    pgn::PGN_VT_TO_ECU,
    transport::{
        can_frame::CanFrame,
        can_id::CanId,
        traits::{can_bus::CanBus, korri_timer::KorriTimer, periodic::PeriodicScheduler},
    },
};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::time::{sleep, timeout, Duration};

#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(dead_code)]
/// Frame handed to the mock periodic scheduler.
pub struct ScheduledFrame {
    pub handle: usize,
    pub frame: CanFrame,
    pub period_ms: u32,
}

#[derive(Clone)]
#[allow(dead_code)]
/// In-memory CAN bus reproducing the `CanBus` trait behavior. Periodic frames are
/// recorded instead of being transmitted.
pub struct MockCanBus {
    tx: mpsc::UnboundedSender<CanFrame>,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<CanFrame>>>,
    scheduled: Arc<std::sync::Mutex<Vec<ScheduledFrame>>>,
    next_handle: usize,
    refuse_periodic: bool,
}

#[allow(dead_code)]
impl MockCanBus {
    /// Construct a pair of interconnected buses (DUT ↔ host).
    pub fn create_pair() -> (Self, Self) {
        let (dut_tx, host_rx) = mpsc::unbounded_channel();
        let (host_tx, dut_rx) = mpsc::unbounded_channel();

        let dut_bus = Self {
            tx: dut_tx,
            rx: Arc::new(Mutex::new(dut_rx)),
            scheduled: Arc::default(),
            next_handle: 0,
            refuse_periodic: false,
        };

        let host_bus = Self {
            tx: host_tx,
            rx: Arc::new(Mutex::new(host_rx)),
            scheduled: Arc::default(),
            next_handle: 0,
            refuse_periodic: false,
        };

        (dut_bus, host_bus)
    }

    /// Make `schedule_periodic` fail.
    pub fn refusing_periodic(mut self) -> Self {
        self.refuse_periodic = true;
        self
    }

    /// Shared view of the frames currently scheduled on this endpoint.
    pub fn scheduled(&self) -> Arc<std::sync::Mutex<Vec<ScheduledFrame>>> {
        Arc::clone(&self.scheduled)
    }

    /// Next frame if one is already queued.
    pub fn try_recv(&mut self) -> Option<CanFrame> {
        self.rx.try_lock().ok()?.try_recv().ok()
    }

    /// Next frame within `millis`, panicking otherwise.
    pub async fn expect_frame(&mut self, millis: u64) -> CanFrame {
        timeout(Duration::from_millis(millis), self.recv())
            .await
            .expect("no frame within the deadline")
            .expect("bus closed")
    }
}

impl CanBus for MockCanBus {
    type Error = ();

    async fn send<'a>(&'a mut self, frame: &'a CanFrame) -> Result<(), Self::Error> {
        self.tx.send(*frame).map_err(|_| ())?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<CanFrame, Self::Error> {
        let mut rx = self.rx.lock().await;
        rx.recv().await.ok_or(())
    }
}

impl PeriodicScheduler for MockCanBus {
    type Handle = usize;
    type Error = ();

    fn schedule_periodic(&mut self, frame: &CanFrame, period_ms: u32) -> Result<usize, ()> {
        if self.refuse_periodic {
            return Err(());
        }
        let handle = self.next_handle;
        self.next_handle += 1;
        self.scheduled.lock().unwrap().push(ScheduledFrame {
            handle,
            frame: *frame,
            period_ms,
        });
        Ok(handle)
    }

    fn cancel_periodic(&mut self, handle: usize) {
        self.scheduled.lock().unwrap().retain(|s| s.handle != handle);
    }
}

#[allow(dead_code)]
/// Timer based on `tokio::time::sleep` to drive delays in tests.
pub struct MockTimer;

impl KorriTimer for MockTimer {
    async fn delay_ms(&mut self, millis: u32) {
        sleep(Duration::from_millis(millis as u64)).await;
    }
}

#[allow(dead_code)]
/// Frame sent by the VT at `vt_address` to `destination`.
pub fn vt_frame(vt_address: u8, destination: u8, data: &[u8]) -> CanFrame {
    let id = CanId::builder(PGN_VT_TO_ECU, vt_address)
        .to_destination(destination)
        .build();
    CanFrame::new(id, data)
}

#[allow(dead_code)]
/// VT status broadcast of `vt_address`.
pub fn vt_status(vt_address: u8) -> CanFrame {
    vt_frame(
        vt_address,
        0xFF,
        &[0xFE, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00],
    )
}

#[allow(dead_code)]
/// Utility loop: drain every frame without answering.
pub(crate) async fn drain(mut host_bus: MockCanBus) {
    while let Ok(_frame) = host_bus.recv().await {}
}
