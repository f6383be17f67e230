//! `NRF_PSEL` pin-select decoding.
//!
//! Pin-control groups store each pin as `NRF_PSEL(fun, port, pin)`: the pin
//! function in the top byte and `port * 32 + pin` below it.

use serde::Deserialize;

/// Bit position of the function field.
pub const FUN_POS: u32 = 24;
/// Mask of the function field.
pub const FUN_MASK: u32 = 0xFF << FUN_POS;
/// Pins per GPIO port.
pub const GPIO_PIN_COUNT: u32 = 32;
/// `port * 32 + pin` value of a disconnected pin.
pub const PIN_DISCONNECTED: u32 = 0x1FF;

/// Pin functions relevant for control-select lookup.
///
/// Function codes not listed here decode as [`NrfFun::AssumedGpio`].
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NrfFun {
    UartTx,
    UartRx,
    UartRts,
    UartCts,
    SpimSck,
    SpimMosi,
    SpimMiso,
    SpisSck,
    SpisMosi,
    SpisMiso,
    SpisCsn,
    TwimScl,
    TwimSda,
    PwmOut0,
    PwmOut1,
    PwmOut2,
    PwmOut3,
    ExmifCk,
    ExmifDq0,
    ExmifDq1,
    ExmifDq2,
    ExmifDq3,
    ExmifDq4,
    ExmifDq5,
    ExmifDq6,
    ExmifDq7,
    ExmifCs0,
    ExmifCs1,
    CanTx,
    CanRx,
    TwisScl,
    TwisSda,
    ExmifRwds,
    GrtcClkoutFast,
    #[serde(rename = "GRTC_CLKOUT_32K")]
    GrtcClkout32k,
    TdmSckM,
    TdmSckS,
    TdmFsyncM,
    TdmFsyncS,
    TdmSdin,
    TdmSdout,
    TdmMck,
    /// Matches any function; table entries keyed only by `(port, pin)`.
    Ignore,
    /// Unknown function code. Such pins always use `CTRLSEL = GPIO`.
    #[serde(skip)]
    AssumedGpio,
}

impl NrfFun {
    /// Decode a function code.
    pub const fn from_code(code: u32) -> Self {
        match code {
            0 => Self::UartTx,
            1 => Self::UartRx,
            2 => Self::UartRts,
            3 => Self::UartCts,
            4 => Self::SpimSck,
            5 => Self::SpimMosi,
            6 => Self::SpimMiso,
            7 => Self::SpisSck,
            8 => Self::SpisMosi,
            9 => Self::SpisMiso,
            10 => Self::SpisCsn,
            11 => Self::TwimScl,
            12 => Self::TwimSda,
            22 => Self::PwmOut0,
            23 => Self::PwmOut1,
            24 => Self::PwmOut2,
            25 => Self::PwmOut3,
            35 => Self::ExmifCk,
            36 => Self::ExmifDq0,
            37 => Self::ExmifDq1,
            38 => Self::ExmifDq2,
            39 => Self::ExmifDq3,
            40 => Self::ExmifDq4,
            41 => Self::ExmifDq5,
            42 => Self::ExmifDq6,
            43 => Self::ExmifDq7,
            44 => Self::ExmifCs0,
            45 => Self::ExmifCs1,
            46 => Self::CanTx,
            47 => Self::CanRx,
            48 => Self::TwisScl,
            49 => Self::TwisSda,
            50 => Self::ExmifRwds,
            55 => Self::GrtcClkoutFast,
            56 => Self::GrtcClkout32k,
            71 => Self::TdmSckM,
            72 => Self::TdmSckS,
            73 => Self::TdmFsyncM,
            74 => Self::TdmFsyncS,
            75 => Self::TdmSdin,
            76 => Self::TdmSdout,
            77 => Self::TdmMck,
            _ => Self::AssumedGpio,
        }
    }
}

/// Decoded `NRF_PSEL` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub struct NrfPsel {
    /// Pin function.
    pub fun: NrfFun,
    /// GPIO port.
    pub port: u32,
    /// Pin within the port.
    pub pin: u32,
}

impl NrfPsel {
    /// Decode a raw `NRF_PSEL` value.
    pub const fn from_raw(value: u32) -> Self {
        let pin_bits = value & !FUN_MASK;
        Self {
            fun: NrfFun::from_code((value & FUN_MASK) >> FUN_POS),
            port: pin_bits / GPIO_PIN_COUNT,
            pin: pin_bits % GPIO_PIN_COUNT,
        }
    }

    /// True if the value encodes a disconnected pin.
    pub const fn is_disconnected(&self) -> bool {
        self.port * GPIO_PIN_COUNT + self.pin == PIN_DISCONNECTED
    }

    /// Same pin with the function replaced by [`NrfFun::Ignore`].
    #[must_use]
    pub const fn without_fun(self) -> Self {
        Self { fun: NrfFun::Ignore, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const fn psel(fun: u32, port: u32, pin: u32) -> u32 {
        (fun << FUN_POS) | (port * GPIO_PIN_COUNT + pin)
    }

    #[test]
    fn decodes_function_port_and_pin() {
        let p = NrfPsel::from_raw(psel(0, 6, 8));
        assert_eq!(p, NrfPsel { fun: NrfFun::UartTx, port: 6, pin: 8 });

        let p = NrfPsel::from_raw(psel(77, 1, 31));
        assert_eq!(p.fun, NrfFun::TdmMck);
        assert_eq!((p.port, p.pin), (1, 31));
    }

    #[test]
    fn unknown_function_is_assumed_gpio() {
        assert_eq!(NrfPsel::from_raw(psel(13, 0, 0)).fun, NrfFun::AssumedGpio);
        assert_eq!(NrfPsel::from_raw(psel(255, 0, 0)).fun, NrfFun::AssumedGpio);
    }

    #[test]
    fn disconnected_pin() {
        assert!(NrfPsel::from_raw(psel(4, 15, 31)).is_disconnected());
        assert!(!NrfPsel::from_raw(psel(4, 15, 30)).is_disconnected());
    }
}
