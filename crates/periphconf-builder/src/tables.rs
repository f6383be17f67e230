//! SoC lookup tables.
//!
//! Fixed per-SoC knowledge the topology does not carry: which control-select
//! value a peripheral needs on a pin, which pins the analog inputs are bonded
//! to, how DPPI channels reach the PPI bridges, and the names of SPU and PPIB
//! instances. The tables are read-only during a build.

use std::collections::HashMap;
use std::fmt;
use std::ops::Range;

use serde::Deserialize;

use crate::error::{BuildError, Result};
use crate::psel::{NrfFun, NrfPsel};

/// Value of the `GPIO.PIN_CNF[n].CTRLSEL` field.
///
/// The named values are the ones used on current SoCs; tables may carry
/// others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(transparent)]
pub struct Ctrlsel(pub u32);

impl Ctrlsel {
    /// Pin controlled by GPIO. Also used when no peripheral control is needed.
    pub const GPIO: Self = Self(0);
    /// VPR / GRC.
    pub const VPR_GRC: Self = Self(1);
    /// CAN, PWM or I3C.
    pub const CAN_PWM_I3C: Self = Self(2);
    /// Serial 0.
    pub const SERIAL0: Self = Self(3);
    /// EXMIF, radio or serial 1.
    pub const EXMIF_RADIO_SERIAL1: Self = Self(4);
    /// CAN, TDM or serial 2.
    pub const CAN_TDM_SERIAL2: Self = Self(5);
    /// CAN.
    pub const CAN: Self = Self(6);
    /// Trace and debug.
    pub const TND: Self = Self(7);
}

impl fmt::Display for Ctrlsel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies the peripheral a control-select table belongs to: its secure
/// register address, or its label when it has no registers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(untagged)]
pub enum PeripheralKey {
    /// Secure register address.
    Address(u32),
    /// Node label.
    Label(String),
}

impl fmt::Display for PeripheralKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address(a) => write!(f, "0x{a:08x}"),
            Self::Label(l) => f.write_str(l),
        }
    }
}

/// A pin referenced through a `*-gpios` property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct GpiosPin {
    /// Property name, e.g. `cs-gpios`.
    pub name: String,
    /// GPIO port.
    pub port: u32,
    /// Pin within the port.
    pub pin: u32,
}

/// Key within one peripheral's control-select table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinKey {
    /// Pin-control pin select.
    Psel(NrfPsel),
    /// `*-gpios` property pin.
    Gpios(GpiosPin),
}

/// Fixed connection from one instance to another: channel `n` of this
/// instance is channel `channels.start + n` of `connected_to`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FixedPpiMap {
    /// Instance the map belongs to.
    pub address: u32,
    /// Connected instance.
    pub connected_to: u32,
    /// Channel range on the connected instance.
    pub channels: Range<u32>,
}

impl FixedPpiMap {
    /// Channel on the connected instance for local channel `channel`.
    pub fn map_channel(&self, channel: u32) -> Option<u32> {
        let mapped = self.channels.start.checked_add(channel)?;
        self.channels.contains(&mapped).then_some(mapped)
    }
}

/// A named SPU or PPIB instance.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Instance {
    /// Instance name, e.g. `SPU131`.
    pub name: String,
    /// Instance address.
    pub address: u32,
}

#[derive(Debug, Deserialize)]
struct CtrlselTable {
    peripheral: PeripheralKey,
    pins: Vec<CtrlselEntry>,
}

#[derive(Debug, Deserialize)]
struct CtrlselEntry {
    #[serde(flatten)]
    key: PinKey,
    ctrlsel: Ctrlsel,
}

#[derive(Debug, Deserialize)]
struct ChannelPins<K> {
    address: u32,
    channels: Vec<ChannelPin<K>>,
}

#[derive(Debug, Deserialize)]
struct ChannelPin<K> {
    channel: K,
    port: u32,
    pin: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TablesFile {
    ctrlsel: Vec<CtrlselTable>,
    adc_channel_pins: Vec<ChannelPins<u32>>,
    comp_channel_pins: Vec<ChannelPins<String>>,
    dppic_to_ppib: Vec<FixedPpiMap>,
    ppib_to_ppib: Vec<FixedPpiMap>,
    spu_instances: Vec<Instance>,
    ppib_instances: Vec<Instance>,
}

/// Indexed SoC lookup tables.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "TablesFile")]
pub struct SocLookupTables {
    ctrlsel: HashMap<PeripheralKey, HashMap<PinKey, Ctrlsel>>,
    adc_channel_pins: HashMap<u32, HashMap<u32, (u32, u32)>>,
    comp_channel_pins: HashMap<u32, HashMap<String, (u32, u32)>>,
    dppic_to_ppib: HashMap<u32, FixedPpiMap>,
    ppib_to_ppib: HashMap<u32, FixedPpiMap>,
    spu_names: HashMap<u32, String>,
    ppib_names: HashMap<u32, String>,
}

fn index_channel_pins<K: std::hash::Hash + Eq>(
    tables: Vec<ChannelPins<K>>,
) -> HashMap<u32, HashMap<K, (u32, u32)>> {
    tables
        .into_iter()
        .map(|t| {
            let pins = t.channels.into_iter().map(|c| (c.channel, (c.port, c.pin))).collect();
            (t.address, pins)
        })
        .collect()
}

impl From<TablesFile> for SocLookupTables {
    fn from(file: TablesFile) -> Self {
        Self {
            ctrlsel: file
                .ctrlsel
                .into_iter()
                .map(|t| (t.peripheral, t.pins.into_iter().map(|e| (e.key, e.ctrlsel)).collect()))
                .collect(),
            adc_channel_pins: index_channel_pins(file.adc_channel_pins),
            comp_channel_pins: index_channel_pins(file.comp_channel_pins),
            dppic_to_ppib: file.dppic_to_ppib.into_iter().map(|m| (m.address, m)).collect(),
            ppib_to_ppib: file.ppib_to_ppib.into_iter().map(|m| (m.address, m)).collect(),
            spu_names: file.spu_instances.into_iter().map(|i| (i.address, i.name)).collect(),
            ppib_names: file.ppib_instances.into_iter().map(|i| (i.address, i.name)).collect(),
        }
    }
}

impl SocLookupTables {
    /// Parse lookup tables from JSON.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|source| BuildError::Parse { what: "lookup tables", source })
    }

    /// Register a control-select value.
    pub fn insert_ctrlsel(&mut self, peripheral: PeripheralKey, key: PinKey, ctrlsel: Ctrlsel) {
        self.ctrlsel.entry(peripheral).or_default().insert(key, ctrlsel);
    }

    /// Register a named SPU instance.
    pub fn insert_spu(&mut self, name: impl Into<String>, address: u32) {
        self.spu_names.insert(address, name.into());
    }

    /// Register a named PPIB instance.
    pub fn insert_ppib(&mut self, name: impl Into<String>, address: u32) {
        self.ppib_names.insert(address, name.into());
    }

    /// Register a fixed DPPIC to PPIB channel map.
    pub fn insert_dppic_to_ppib(&mut self, map: FixedPpiMap) {
        self.dppic_to_ppib.insert(map.address, map);
    }

    /// Register a fixed PPIB to PPIB channel map.
    pub fn insert_ppib_to_ppib(&mut self, map: FixedPpiMap) {
        self.ppib_to_ppib.insert(map.address, map);
    }

    /// Register the pin an ADC input is bonded to.
    pub fn insert_adc_channel_pin(&mut self, adc: u32, channel: u32, port: u32, pin: u32) {
        self.adc_channel_pins.entry(adc).or_default().insert(channel, (port, pin));
    }

    /// Register the pin a comparator input is bonded to.
    pub fn insert_comp_channel_pin(&mut self, comp: u32, channel: impl Into<String>, port: u32, pin: u32) {
        self.comp_channel_pins
            .entry(comp)
            .or_default()
            .insert(channel.into(), (port, pin));
    }

    /// Name of the SPU instance at `address`.
    ///
    /// # Errors
    ///
    /// Fails if the address is not a known SPU instance.
    pub fn spu_name(&self, address: u32) -> Result<&str> {
        self.spu_names
            .get(&address)
            .map(String::as_str)
            .ok_or(BuildError::UnknownInstance { kind: "SPU", address })
    }

    /// Name of the PPIB instance at `address`.
    ///
    /// # Errors
    ///
    /// Fails if the address is not a known PPIB instance.
    pub fn ppib_name(&self, address: u32) -> Result<&str> {
        self.ppib_names
            .get(&address)
            .map(String::as_str)
            .ok_or(BuildError::UnknownInstance { kind: "PPIB", address })
    }

    /// Local PPIB address and channel that DPPIC channel `channel` connects to.
    ///
    /// # Errors
    ///
    /// Fails if the DPPIC has no fixed PPIB connection or the channel is
    /// outside the mapped range.
    pub fn dppic_to_ppib(&self, dppic: u32, channel: u32) -> Result<(u32, u32)> {
        Self::hop(&self.dppic_to_ppib, "DPPIC to PPIB", "DPPIC", dppic, channel)
    }

    /// Remote PPIB address and channel that PPIB channel `channel` connects to.
    ///
    /// # Errors
    ///
    /// Fails if the PPIB has no fixed partner or the channel is outside the
    /// mapped range.
    pub fn ppib_to_ppib(&self, ppib: u32, channel: u32) -> Result<(u32, u32)> {
        Self::hop(&self.ppib_to_ppib, "PPIB to PPIB", "PPIB", ppib, channel)
    }

    fn hop(
        maps: &HashMap<u32, FixedPpiMap>,
        table: &'static str,
        kind: &'static str,
        address: u32,
        channel: u32,
    ) -> Result<(u32, u32)> {
        let map = maps.get(&address).ok_or(BuildError::UnknownInstance { kind, address })?;
        let mapped = map
            .map_channel(channel)
            .ok_or(BuildError::ChannelNotMapped { table, address, channel })?;
        Ok((map.connected_to, mapped))
    }

    /// Pins bonded to the inputs of the ADC at secure address `adc`.
    pub fn adc_channel_pins(&self, adc: u32) -> Option<&HashMap<u32, (u32, u32)>> {
        self.adc_channel_pins.get(&adc)
    }

    /// Pins bonded to the inputs of the comparator at secure address `comp`.
    pub fn comp_channel_pins(&self, comp: u32) -> Option<&HashMap<String, (u32, u32)>> {
        self.comp_channel_pins.get(&comp)
    }

    /// Control-select value for a pin used by `peripheral`.
    ///
    /// Pin selects with an unknown function always resolve to
    /// [`Ctrlsel::GPIO`]. A pin select without an exact entry falls back to
    /// the entry for the same pin with [`NrfFun::Ignore`]. `None` means the
    /// pin needs no control-select configuration.
    pub fn lookup_ctrlsel(&self, peripheral: &PeripheralKey, key: &PinKey) -> Option<Ctrlsel> {
        if let PinKey::Psel(psel) = key {
            if psel.fun == NrfFun::AssumedGpio {
                return Some(Ctrlsel::GPIO);
            }
        }

        let ctrlsel = self.ctrlsel.get(peripheral).and_then(|pins| {
            pins.get(key).copied().or_else(|| match key {
                PinKey::Psel(psel) => pins.get(&PinKey::Psel(psel.without_fun())).copied(),
                PinKey::Gpios(_) => None,
            })
        });

        tracing::debug!("ctrlsel lookup: peripheral={peripheral}, key={key:?} -> {ctrlsel:?}");
        ctrlsel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UARTE120: u32 = 0x5F8E_6000;

    #[test]
    fn ctrlsel_falls_back_to_ignored_function() {
        let mut tables = SocLookupTables::default();
        let key = PeripheralKey::Address(UARTE120);
        tables.insert_ctrlsel(
            key.clone(),
            PinKey::Psel(NrfPsel { fun: NrfFun::UartTx, port: 6, pin: 8 }),
            Ctrlsel::SERIAL0,
        );
        tables.insert_ctrlsel(
            key.clone(),
            PinKey::Psel(NrfPsel { fun: NrfFun::Ignore, port: 6, pin: 9 }),
            Ctrlsel::CAN_TDM_SERIAL2,
        );

        let tx = PinKey::Psel(NrfPsel { fun: NrfFun::UartTx, port: 6, pin: 8 });
        let rx = PinKey::Psel(NrfPsel { fun: NrfFun::UartRx, port: 6, pin: 9 });
        let other = PinKey::Psel(NrfPsel { fun: NrfFun::UartRx, port: 6, pin: 10 });
        assert_eq!(tables.lookup_ctrlsel(&key, &tx), Some(Ctrlsel::SERIAL0));
        assert_eq!(tables.lookup_ctrlsel(&key, &rx), Some(Ctrlsel::CAN_TDM_SERIAL2));
        assert_eq!(tables.lookup_ctrlsel(&key, &other), None);
    }

    #[test]
    fn assumed_gpio_function_needs_no_table() {
        let tables = SocLookupTables::default();
        let key = PinKey::Psel(NrfPsel { fun: NrfFun::AssumedGpio, port: 0, pin: 1 });
        assert_eq!(
            tables.lookup_ctrlsel(&PeripheralKey::Label("x".into()), &key),
            Some(Ctrlsel::GPIO)
        );
    }

    #[test]
    fn fixed_map_channel_range() {
        let map = FixedPpiMap { address: 1, connected_to: 2, channels: 8..16 };
        assert_eq!(map.map_channel(0), Some(8));
        assert_eq!(map.map_channel(7), Some(15));
        assert_eq!(map.map_channel(8), None);
    }

    #[test]
    fn parses_tables_json() {
        let json = r#"{
            "ctrlsel": [
                { "peripheral": 1603166208, "pins": [
                    { "psel": { "fun": "UART_TX", "port": 6, "pin": 8 }, "ctrlsel": 3 },
                    { "psel": { "fun": "IGNORE", "port": 6, "pin": 9 }, "ctrlsel": 3 } ] },
                { "peripheral": "led0", "pins": [
                    { "gpios": { "name": "gpios", "port": 9, "pin": 0 }, "ctrlsel": 0 } ] }
            ],
            "spu_instances": [ { "name": "SPU131", "address": 1603403776 } ],
            "dppic_to_ppib": [ { "address": 1, "connected_to": 2, "channels": { "start": 0, "end": 8 } } ]
        }"#;
        let tables = SocLookupTables::from_json(json).unwrap();
        assert_eq!(tables.spu_name(0x5F92_0000).unwrap(), "SPU131");
        assert_eq!(tables.dppic_to_ppib(1, 3).unwrap(), (2, 3));
        assert!(matches!(
            tables.dppic_to_ppib(1, 9),
            Err(BuildError::ChannelNotMapped { channel: 9, .. })
        ));

        let gpios = PinKey::Gpios(GpiosPin { name: "gpios".into(), port: 9, pin: 0 });
        assert_eq!(
            tables.lookup_ctrlsel(&PeripheralKey::Label("led0".into()), &gpios),
            Some(Ctrlsel::GPIO)
        );
        let tx = PinKey::Psel(NrfPsel { fun: NrfFun::UartTx, port: 6, pin: 8 });
        assert_eq!(
            tables.lookup_ctrlsel(&PeripheralKey::Address(UARTE120), &tx),
            Some(Ctrlsel::SERIAL0)
        );
    }
}
