//! Working-set side of a VT session.
//!
//! [`VtClient`] owns the bus and the timer. It starts Disconnected; [`VtClient::connect`]
//! waits for the VT status broadcast, claims the configured address, announces the
//! working set and hands the 1 Hz maintenance message to the bus'
//! [`PeriodicScheduler`]. Every command then runs as one send/await-response pair.
//! While disconnected, commands fail with [`VtError::NotConnected`] before any frame
//! is sent.
//!
//! ```rust,ignore
//! let mut client = VtClient::new(bus, timer, VtClientConfig::default());
//! client.connect(0x26).await?;
//! client.upload_pool(&pool, true).await?;
//! let shown = client.change_active_mask(0x0001, 0x1000).await?;
//! client.disconnect();
//! ```
use embassy_time::Duration;

use crate::error::{TransportError, VtError};
use crate::protocol::managment::address_claiming::claim_address;
use crate::protocol::managment::iso_name::{IsoName, INDUSTRY_GROUP_AGRICULTURE};
use crate::protocol::pgn::{ADDRESS_GLOBAL, PGN_ECU_TO_VT, PGN_VT_TO_ECU};
use crate::protocol::transport::can_frame::CanFrame;
use crate::protocol::transport::can_id::CanId;
use crate::protocol::transport::etp::ETP_MAX_PAYLOAD;
use crate::protocol::transport::matcher::{wait_for_frame, ResponseFilter};
use crate::protocol::transport::traits::{
    can_bus::CanBus, korri_timer::KorriTimer, periodic::PeriodicScheduler,
    pgn_sender::PgnSender,
};
use crate::protocol::transport::transfer::{Payload, TransferRequest};
use crate::protocol::vt::commands::{
    self, CommandResponse, MemoryResponse, VersionLabel, VtFunction, VtMessage, VtStatus,
    OBJECT_POOL_TRANSFER_PREFIX,
};
use crate::protocol::vt::{
    CONNECT_SETTLE_MS, DEFAULT_RESPONSE_TIMEOUT_MS, END_OF_POOL_TIMEOUT_MS,
    MAINTENANCE_PERIOD_MS, STATUS_TIMEOUT_MS,
};

/// Default source address of the working set.
pub const DEFAULT_SOURCE_ADDRESS: u8 = 0x0A;

/// Largest function instance the NAME can carry.
const MAX_FUNCTION_INSTANCE: u8 = 0x1F;

type BusError<C> = <C as CanBus>::Error;
type VtResult<T, C> = Result<T, VtError<BusError<C>>>;

//==================================================================================CONFIG
/// Client settings. Build from [`Default`] and adjust with the `with_*` methods.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VtClientConfig {
    /// Address claimed on connect.
    pub source_address: u8,
    /// Written into the NAME's function instance field (0 to 31).
    pub function_instance: u8,
    /// NAME claimed on connect, before the function instance is applied.
    pub name: IsoName,
    pub response_timeout: Duration,
    pub end_of_pool_timeout: Duration,
    /// How long `connect` waits for the VT status broadcast.
    pub status_timeout: Duration,
    pub connect_settle: Duration,
    pub maintenance_period: Duration,
}

impl Default for VtClientConfig {
    fn default() -> Self {
        Self {
            source_address: DEFAULT_SOURCE_ADDRESS,
            function_instance: 0,
            name: IsoName::builder()
                .identity_number(0x1FF)
                .manufacturer_code(0x59)
                .function(0x3E)
                .industry_group(INDUSTRY_GROUP_AGRICULTURE)
                .build(),
            response_timeout: Duration::from_millis(DEFAULT_RESPONSE_TIMEOUT_MS as u64),
            end_of_pool_timeout: Duration::from_millis(END_OF_POOL_TIMEOUT_MS as u64),
            status_timeout: Duration::from_millis(STATUS_TIMEOUT_MS as u64),
            connect_settle: Duration::from_millis(CONNECT_SETTLE_MS as u64),
            maintenance_period: Duration::from_millis(MAINTENANCE_PERIOD_MS as u64),
        }
    }
}

impl VtClientConfig {
    pub fn with_source_address(mut self, source_address: u8) -> Self {
        self.source_address = source_address;
        self
    }

    pub fn with_function_instance(mut self, function_instance: u8) -> Self {
        self.function_instance = function_instance;
        self
    }

    pub fn with_name(mut self, name: IsoName) -> Self {
        self.name = name;
        self
    }

    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    pub fn with_end_of_pool_timeout(mut self, timeout: Duration) -> Self {
        self.end_of_pool_timeout = timeout;
        self
    }

    pub fn with_status_timeout(mut self, timeout: Duration) -> Self {
        self.status_timeout = timeout;
        self
    }

    pub fn with_connect_settle(mut self, settle: Duration) -> Self {
        self.connect_settle = settle;
        self
    }

    pub fn with_maintenance_period(mut self, period: Duration) -> Self {
        self.maintenance_period = period;
        self
    }

    /// NAME actually claimed: `name` with the configured function instance.
    pub fn claimed_name(&self) -> IsoName {
        self.name
            .to_builder()
            .function_instance(self.function_instance & MAX_FUNCTION_INSTANCE)
            .build()
    }

    fn timeout_for(&self, function: VtFunction) -> u32 {
        match function {
            VtFunction::EndOfObjectPool => millis(self.end_of_pool_timeout),
            _ => millis(self.response_timeout),
        }
    }
}

/// Duration as a timer argument, saturating at `u32::MAX` milliseconds.
fn millis(duration: Duration) -> u32 {
    duration.as_millis().min(u32::MAX as u64) as u32
}

//==================================================================================SESSION
/// Snapshot of the session, for display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VtSessionState {
    pub connected: bool,
    pub local_address: u8,
    /// VT of the current session.
    pub remote_address: Option<u8>,
    pub function_instance: u8,
}

struct Session<H> {
    vt_address: u8,
    maintenance: H,
}

/// Working-set client bound to one bus.
pub struct VtClient<C, T>
where
    C: CanBus + PeriodicScheduler,
    T: KorriTimer,
{
    can_bus: C,
    timer: T,
    config: VtClientConfig,
    session: Option<Session<<C as PeriodicScheduler>::Handle>>,
}

impl<C, T> VtClient<C, T>
where
    C: CanBus + PeriodicScheduler,
    T: KorriTimer,
{
    pub fn new(can_bus: C, timer: T, config: VtClientConfig) -> Self {
        Self {
            can_bus,
            timer,
            config,
            session: None,
        }
    }

    pub fn config(&self) -> &VtClientConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    pub fn session_state(&self) -> VtSessionState {
        VtSessionState {
            connected: self.is_connected(),
            local_address: self.config.source_address,
            remote_address: self.session.as_ref().map(|s| s.vt_address),
            function_instance: self.config.function_instance,
        }
    }

    /// Change the address claimed on the next `connect`.
    pub fn set_source_address(&mut self, source_address: u8) -> VtResult<(), C> {
        if self.is_connected() {
            return Err(VtError::AlreadyConnected);
        }
        if source_address == ADDRESS_GLOBAL {
            return Err(VtError::InvalidArgument {
                reason: "source address 0xFF cannot be claimed",
            });
        }
        self.config.source_address = source_address;
        Ok(())
    }

    /// Change the NAME function instance used on the next `connect`.
    pub fn set_function_instance(&mut self, function_instance: u8) -> VtResult<(), C> {
        if self.is_connected() {
            return Err(VtError::AlreadyConnected);
        }
        if function_instance > MAX_FUNCTION_INSTANCE {
            return Err(VtError::InvalidArgument {
                reason: "function instance must fit in 5 bits",
            });
        }
        self.config.function_instance = function_instance;
        Ok(())
    }

    /// Stop the session (if any) and hand back the bus and timer.
    pub fn into_inner(mut self) -> (C, T) {
        self.disconnect();
        (self.can_bus, self.timer)
    }

    //==============================================================================LIFECYCLE
    /// Open a session with the VT at `vt_address` and return its first status message.
    ///
    /// On failure the client stays Disconnected. Frames already sent (request, claim,
    /// maintenance) are not undone.
    pub async fn connect(&mut self, vt_address: u8) -> VtResult<VtStatus, C> {
        if self.is_connected() {
            return Err(VtError::AlreadyConnected);
        }
        if self.config.function_instance > MAX_FUNCTION_INSTANCE {
            return Err(VtError::InvalidArgument {
                reason: "function instance must fit in 5 bits",
            });
        }

        #[cfg(feature = "defmt")]
        defmt::info!("Waiting for status of VT {:#X}", vt_address);

        let status_filter = ResponseFilter::new(
            PGN_VT_TO_ECU,
            vt_address,
            ADDRESS_GLOBAL,
            VtFunction::VtStatus.mux(),
        );
        let status = wait_for_frame(
            &mut self.can_bus,
            &mut self.timer,
            &status_filter,
            millis(self.config.status_timeout),
        )
        .await
        .map_err(VtError::Receive)?
        .map(|frame| VtStatus::parse(&frame))
        .ok_or(VtError::VtNotFound {
            address: vt_address,
        })?;

        let source_address = claim_address(
            &mut self.can_bus,
            &mut self.timer,
            self.config.claimed_name(),
            self.config.source_address,
        )
        .await?;

        self.send_to(vt_address, &commands::working_set_maintenance(true))
            .await?;
        self.timer.delay_ms(millis(self.config.connect_settle)).await;

        let maintenance = CanFrame::new(
            vt_id(source_address, vt_address),
            &commands::working_set_maintenance(false),
        );
        let handle = self
            .can_bus
            .schedule_periodic(&maintenance, millis(self.config.maintenance_period))
            .map_err(|_e| {
                #[cfg(feature = "defmt")]
                defmt::warn!("Maintenance message could not be scheduled");
                VtError::PeriodicUnavailable
            })?;

        self.session = Some(Session {
            vt_address,
            maintenance: handle,
        });

        #[cfg(feature = "defmt")]
        defmt::info!("Connected to VT {:#X} as {:#X}", vt_address, source_address);
        Ok(status)
    }

    /// Stop the maintenance message and forget the VT. Does nothing when already
    /// disconnected.
    pub fn disconnect(&mut self) {
        if let Some(session) = self.session.take() {
            self.can_bus.cancel_periodic(session.maintenance);

            #[cfg(feature = "defmt")]
            defmt::info!("Disconnected from VT {:#X}", session.vt_address);
        }
    }

    //==============================================================================COMMANDS
    /// Load a pool version stored on the VT.
    pub async fn load_version(&mut self, label: &str) -> VtResult<(), C> {
        let vt_address = self.vt_address()?;
        let label = parse_label(label)?;
        self.transact(vt_address, VtFunction::LoadVersion, &commands::load_version(&label))
            .await
            .map(|_| ())
    }

    /// Store the current pool on the VT under `label`.
    pub async fn store_version(&mut self, label: &str) -> VtResult<(), C> {
        let vt_address = self.vt_address()?;
        let label = parse_label(label)?;
        self.transact(vt_address, VtFunction::StoreVersion, &commands::store_version(&label))
            .await
            .map(|_| ())
    }

    /// Ask whether the VT can hold `required` bytes of object pool.
    pub async fn get_memory(&mut self, required: u32) -> VtResult<MemoryResponse, C> {
        let vt_address = self.vt_address()?;
        self.send_to(vt_address, &commands::get_memory(required))
            .await?;
        let frame = self.await_response(vt_address, VtFunction::GetMemory).await?;
        Ok(MemoryResponse::parse(&frame))
    }

    /// Upload an object pool (or a part of it).
    ///
    /// The VT is asked for memory first; nothing is transferred when it refuses.
    /// With `end_of_pool` the upload is closed by End of Object Pool, and the VT's
    /// parse result is awaited.
    pub async fn upload_pool(&mut self, pool: &[u8], end_of_pool: bool) -> VtResult<(), C> {
        let vt_address = self.vt_address()?;
        let total = pool.len() + OBJECT_POOL_TRANSFER_PREFIX.len();
        let required = match u32::try_from(pool.len()) {
            Ok(required) if total <= ETP_MAX_PAYLOAD => required,
            _ => {
                return Err(VtError::Transport(TransportError::PayloadTooLarge {
                    len: total,
                }))
            }
        };

        let memory = self.get_memory(required).await?;
        if !memory.enough_memory {
            #[cfg(feature = "defmt")]
            defmt::warn!("VT refused {} bytes of object pool", required);
            return Err(VtError::InsufficientMemory { required });
        }

        #[cfg(feature = "defmt")]
        defmt::info!("Uploading {} bytes of object pool", required);
        self.send_payload(
            vt_address,
            Payload::with_prefix(&OBJECT_POOL_TRANSFER_PREFIX, pool),
        )
        .await?;

        if end_of_pool {
            self.transact(
                vt_address,
                VtFunction::EndOfObjectPool,
                &commands::bare_command(VtFunction::EndOfObjectPool),
            )
            .await?;
        }
        Ok(())
    }

    pub async fn delete_object_pool(&mut self) -> VtResult<(), C> {
        let vt_address = self.vt_address()?;
        self.transact(
            vt_address,
            VtFunction::DeleteObjectPool,
            &commands::bare_command(VtFunction::DeleteObjectPool),
        )
        .await
        .map(|_| ())
    }

    /// Show `mask_id` in working set `working_set_id`; returns the mask the VT reports.
    pub async fn change_active_mask(
        &mut self,
        working_set_id: u16,
        mask_id: u16,
    ) -> VtResult<u16, C> {
        let vt_address = self.vt_address()?;
        let response = self
            .transact(
                vt_address,
                VtFunction::ChangeActiveMask,
                &commands::change_active_mask(working_set_id, mask_id),
            )
            .await?;
        Ok(response.object_id.unwrap_or(mask_id))
    }

    /// Attach `soft_key_mask_id` to a data mask, or an alarm mask when `alarm` is set;
    /// returns the soft key mask the VT reports.
    pub async fn change_soft_key_mask(
        &mut self,
        mask_id: u16,
        soft_key_mask_id: u16,
        alarm: bool,
    ) -> VtResult<u16, C> {
        let vt_address = self.vt_address()?;
        let response = self
            .transact(
                vt_address,
                VtFunction::ChangeSoftKeyMask,
                &commands::change_soft_key_mask(mask_id, soft_key_mask_id, alarm),
            )
            .await?;
        Ok(response.object_id.unwrap_or(soft_key_mask_id))
    }

    pub async fn change_attribute(
        &mut self,
        object_id: u16,
        attribute_id: u8,
        value: u32,
    ) -> VtResult<(), C> {
        let vt_address = self.vt_address()?;
        self.transact(
            vt_address,
            VtFunction::ChangeAttribute,
            &commands::change_attribute(object_id, attribute_id, value),
        )
        .await
        .map(|_| ())
    }

    pub async fn change_numeric_value(&mut self, object_id: u16, value: u32) -> VtResult<(), C> {
        let vt_address = self.vt_address()?;
        self.transact(
            vt_address,
            VtFunction::ChangeNumericValue,
            &commands::change_numeric_value(object_id, value),
        )
        .await
        .map(|_| ())
    }

    /// Replace the text of a string object. Texts beyond three bytes go through TP.
    pub async fn change_string_value(&mut self, object_id: u16, text: &str) -> VtResult<(), C> {
        let vt_address = self.vt_address()?;
        let header = commands::change_string_value_header(object_id, text.as_bytes())
            .map_err(|e| VtError::InvalidArgument { reason: e.reason() })?;
        self.send_payload(vt_address, Payload::with_prefix(&header, text.as_bytes()))
            .await?;
        self.complete(vt_address, VtFunction::ChangeStringValue)
            .await
            .map(|_| ())
    }

    /// Point entry `index` of a list object at `new_object_id` (0xFFFF clears it).
    pub async fn change_list_item(
        &mut self,
        object_id: u16,
        index: u8,
        new_object_id: u16,
    ) -> VtResult<(), C> {
        let vt_address = self.vt_address()?;
        self.transact(
            vt_address,
            VtFunction::ChangeListItem,
            &commands::change_list_item(object_id, index, new_object_id),
        )
        .await
        .map(|_| ())
    }

    /// Abort the input in progress; returns the object that was being edited.
    pub async fn esc_input(&mut self) -> VtResult<u16, C> {
        let vt_address = self.vt_address()?;
        let response = self
            .transact(
                vt_address,
                VtFunction::Esc,
                &commands::bare_command(VtFunction::Esc),
            )
            .await?;
        Ok(response.object_id.unwrap_or(u16::MAX))
    }

    /// Ask every VT to show its number. The answer is visual only.
    pub async fn identify_vts(&mut self) -> VtResult<(), C> {
        self.vt_address()?;
        self.send_to(
            ADDRESS_GLOBAL,
            &commands::bare_command(VtFunction::IdentifyVt),
        )
        .await
    }

    //==============================================================================HELPERS
    fn vt_address(&self) -> VtResult<u8, C> {
        self.session
            .as_ref()
            .map(|s| s.vt_address)
            .ok_or(VtError::NotConnected)
    }

    async fn send_to(&mut self, destination: u8, message: &VtMessage) -> VtResult<(), C> {
        let frame = CanFrame::new(vt_id(self.config.source_address, destination), message);
        self.can_bus.send(&frame).await.map_err(VtError::Send)
    }

    async fn send_payload(&mut self, destination: u8, payload: Payload<'_>) -> VtResult<(), C> {
        let request =
            TransferRequest::new(PGN_ECU_TO_VT, self.config.source_address, destination, payload);
        self.can_bus
            .send_transfer(&mut self.timer, request)
            .await
            .map_err(VtError::from)
    }

    async fn await_response(&mut self, vt_address: u8, function: VtFunction) -> VtResult<CanFrame, C> {
        let filter = ResponseFilter::new(
            PGN_VT_TO_ECU,
            vt_address,
            self.config.source_address,
            function.mux(),
        );
        let timeout_ms = self.config.timeout_for(function);
        wait_for_frame(&mut self.can_bus, &mut self.timer, &filter, timeout_ms)
            .await
            .map_err(VtError::Receive)?
            .ok_or_else(|| {
                #[cfg(feature = "defmt")]
                defmt::warn!("No response to {} within {} ms", function, timeout_ms);
                VtError::Timeout { function }
            })
    }

    /// Await the acknowledgement of `function` and turn a non-zero code into an error.
    async fn complete(&mut self, vt_address: u8, function: VtFunction) -> VtResult<CommandResponse, C> {
        let frame = self.await_response(vt_address, function).await?;
        let response = CommandResponse::parse(function, &frame).ok_or(VtError::InvalidArgument {
            reason: "function is not acknowledged by the VT",
        })?;
        if response.is_success() {
            Ok(response)
        } else {
            #[cfg(feature = "defmt")]
            defmt::warn!("{} rejected with code {:#X}", function, response.error_code);
            Err(VtError::Protocol {
                function,
                code: response.error_code,
            })
        }
    }

    /// Send a single-frame command and await its acknowledgement.
    async fn transact(
        &mut self,
        vt_address: u8,
        function: VtFunction,
        message: &VtMessage,
    ) -> VtResult<CommandResponse, C> {
        #[cfg(feature = "defmt")]
        defmt::debug!("VT command {}", function);
        self.send_to(vt_address, message).await?;
        self.complete(vt_address, function).await
    }
}

fn vt_id(source_address: u8, destination: u8) -> CanId {
    CanId::builder(PGN_ECU_TO_VT, source_address)
        .to_destination(destination)
        .build()
}

fn parse_label<E: core::fmt::Debug>(label: &str) -> Result<VersionLabel, VtError<E>> {
    VersionLabel::try_from(label).map_err(|e| VtError::InvalidArgument { reason: e.reason() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = VtClientConfig::default();

        assert_eq!(config.source_address, 0x0A);
        assert_eq!(config.function_instance, 0);
        assert_eq!(config.name.raw(), 0x2000_3E00_0B20_01FF);
        assert_eq!(millis(config.response_timeout), 3_000);
        assert_eq!(millis(config.end_of_pool_timeout), 5_000);
        assert_eq!(millis(config.status_timeout), 3_000);
        assert_eq!(millis(config.connect_settle), 500);
        assert_eq!(millis(config.maintenance_period), 1_000);
    }

    #[test]
    fn test_claimed_name_carries_function_instance() {
        let config = VtClientConfig::default().with_function_instance(5);
        let name = config.claimed_name();

        assert_eq!(name.function_instance(), 5);
        assert_eq!(name.identity_number(), 0x1FF);
        assert_eq!(name.function(), 0x3E);
    }

    #[test]
    fn test_timeout_per_function() {
        let config = VtClientConfig::default()
            .with_response_timeout(Duration::from_millis(100))
            .with_end_of_pool_timeout(Duration::from_secs(10));

        assert_eq!(config.timeout_for(VtFunction::ChangeAttribute), 100);
        assert_eq!(config.timeout_for(VtFunction::EndOfObjectPool), 10_000);
    }
}
