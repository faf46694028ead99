//! # Quickstart Example
//!
//! Minimal tour of korri-isobus without a CAN bus:
//! - Build the working-set NAME
//! - Encode the frames sent while connecting to a VT
//! - Encode a command and decode the VT's answer
//! - See which transport a payload needs
//!
//! ```bash
//! cargo run --example quickstart
//! ```

use korri_isobus::protocol::managment::address_claiming::{
    build_address_claim_frame, build_address_claim_request_frame, contention_delay_ms,
};
use korri_isobus::protocol::managment::iso_name::{IsoName, INDUSTRY_GROUP_AGRICULTURE};
use korri_isobus::protocol::pgn::{PGN_ECU_TO_VT, PGN_VT_TO_ECU};
use korri_isobus::protocol::transport::can_frame::CanFrame;
use korri_isobus::protocol::transport::can_id::CanId;
use korri_isobus::protocol::transport::transfer::{Payload, TransferRequest};
use korri_isobus::protocol::vt::commands::{self, CommandResponse, VersionLabel, VtFunction};

const WORKING_SET: u8 = 0x0A;
const VT: u8 = 0x26;

fn print_frame(label: &str, frame: &CanFrame) {
    print!("   {label:<12} 0x{:08X} ", frame.id.0);
    for byte in frame.payload() {
        print!("{:02X} ", byte);
    }
    println!();
}

fn main() {
    println!("=== korri-isobus Quickstart ===\n");

    // ======================================================================
    // 1. Working-set NAME
    // ======================================================================
    println!("1. Building a NAME");

    let name = IsoName::builder()
        .identity_number(0x1FF)
        .manufacturer_code(0x59)
        .function(0x3E)
        .function_instance(1)
        .industry_group(INDUSTRY_GROUP_AGRICULTURE)
        .self_configurable(false)
        .build();

    println!("   NAME: {}", name);
    println!("   Raw: 0x{:016X}", name.raw());
    println!("   Claim backoff: {} ms\n", contention_delay_ms(name));

    // ======================================================================
    // 2. Address claim frames
    // ======================================================================
    println!("2. Address claim");

    print_frame("request", &build_address_claim_request_frame(WORKING_SET));
    print_frame("claim", &build_address_claim_frame(name, WORKING_SET));
    println!();

    // ======================================================================
    // 3. Commands and responses
    // ======================================================================
    println!("3. Change Active Mask");

    let id = CanId::builder(PGN_ECU_TO_VT, WORKING_SET)
        .to_destination(VT)
        .build();
    print_frame("command", &CanFrame::new(id, &commands::change_active_mask(0x0001, 0x1000)));

    let answer_id = CanId::builder(PGN_VT_TO_ECU, VT)
        .to_destination(WORKING_SET)
        .build();
    let answer = CanFrame::new(answer_id, &[0xAD, 0x00, 0x10, 0x00, 0xFF, 0xFF, 0xFF, 0xFF]);
    print_frame("answer", &answer);

    match CommandResponse::parse(VtFunction::ChangeActiveMask, &answer) {
        Some(response) if response.is_success() => {
            println!("   Mask shown: {:#06X}\n", response.object_id.unwrap_or(0));
        }
        Some(response) => println!("   Rejected with code {:#04X}\n", response.error_code),
        None => println!("   Not an acknowledged command\n"),
    }

    match VersionLabel::try_from("POOL_V1") {
        Ok(label) => print_frame("load", &CanFrame::new(id, &commands::load_version(&label))),
        Err(e) => eprintln!("   Invalid label: {}", e.reason()),
    }
    println!();

    // ======================================================================
    // 4. Transport selection
    // ======================================================================
    println!("4. Transport per payload size");

    let pool = vec![0u8; 4_000];
    for len in [8usize, 100, 1_785, 4_000] {
        let request = TransferRequest::new(
            PGN_ECU_TO_VT,
            WORKING_SET,
            VT,
            Payload::with_prefix(&commands::OBJECT_POOL_TRANSFER_PREFIX, &pool[..len - 1]),
        );
        println!("   {:>5} bytes -> {:?}", len, request.kind());
    }

    // ======================================================================
    println!("\nQuickstart complete.");
}
