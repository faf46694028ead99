//! `ScheduledBus` + `PeriodicTable` as the maintenance scheduler of a `VtClient`.
mod helpers {
    include!("helpers/mod.rs");
}

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use helpers::{vt_status, MockCanBus, MockTimer};
use korri_isobus::{
    error::VtError,
    protocol::{
        pgn::PGN_ECU_TO_VT,
        transport::{
            can_frame::CanFrame,
            can_id::CanId,
            periodic_table::{PeriodicTable, ScheduledBus},
            traits::can_bus::CanBus,
        },
        vt::{
            client::{VtClient, VtClientConfig},
            commands,
        },
    },
};
use tokio::time::{timeout, Duration};

const VT: u8 = 0x26;

fn drain_pending(host_bus: &mut MockCanBus) -> usize {
    std::iter::from_fn(|| host_bus.try_recv()).count()
}

#[tokio::test(start_paused = true)]
async fn test_maintenance_runs_from_the_table() {
    let table: PeriodicTable<NoopRawMutex, 4> = PeriodicTable::new();
    let (dut_bus, mut host_bus) = MockCanBus::create_pair();
    let mut driver_bus = dut_bus.clone();
    let mut client = VtClient::new(
        ScheduledBus::new(dut_bus, &table),
        MockTimer,
        VtClientConfig::default(),
    );

    host_bus.send(&vt_status(VT)).await.unwrap();
    client.connect(VT).await.unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(drain_pending(&mut host_bus), 3);

    let mut timer = MockTimer;
    let driven = timeout(
        Duration::from_millis(3_050),
        table.drive(&mut driver_bus, &mut timer, 10),
    )
    .await;
    assert!(driven.is_err());

    let maintenance: Vec<CanFrame> = std::iter::from_fn(|| host_bus.try_recv()).collect();
    assert_eq!(maintenance.len(), 3);
    for frame in &maintenance {
        assert_eq!(frame.id.pgn(), PGN_ECU_TO_VT);
        assert_eq!(frame.id.destination(), VT);
        assert_eq!(frame.data, commands::working_set_maintenance(false));
    }

    client.disconnect();
    assert!(table.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_full_table_fails_the_connect() {
    let table: PeriodicTable<NoopRawMutex, 1> = PeriodicTable::new();
    let other = CanFrame::new(CanId::builder(PGN_ECU_TO_VT, 0x0A).build(), &[0x00]);
    table.insert(&other, 100).unwrap();

    let (dut_bus, mut host_bus) = MockCanBus::create_pair();
    let mut client = VtClient::new(
        ScheduledBus::new(dut_bus, &table),
        MockTimer,
        VtClientConfig::default(),
    );

    host_bus.send(&vt_status(VT)).await.unwrap();
    assert_eq!(client.connect(VT).await, Err(VtError::PeriodicUnavailable));
    assert!(!client.is_connected());
    assert_eq!(table.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_into_inner_releases_the_slot() {
    let table: PeriodicTable<NoopRawMutex, 2> = PeriodicTable::new();
    let (dut_bus, mut host_bus) = MockCanBus::create_pair();
    let mut client = VtClient::new(
        ScheduledBus::new(dut_bus, &table),
        MockTimer,
        VtClientConfig::default(),
    );

    host_bus.send(&vt_status(VT)).await.unwrap();
    client.connect(VT).await.unwrap();
    assert_eq!(table.len(), 1);

    let (scheduled_bus, _timer) = client.into_inner();
    assert!(table.is_empty());
    let _bus: MockCanBus = scheduled_bus.into_inner();
}
