//! Register classification from dotted register names.
//!
//! Catalog names look like `SPU131.FEATURE.GPIO[1].PIN[7]`: a peripheral
//! instance name followed by a register path with bracketed array indices.
//! Each [`RegisterKind`] has a path template such as `FEATURE.GPIO{0}.PIN{0}`
//! where every `{0}` stands for one `[n]` index. Templates are compiled once,
//! grouped by instance-name prefix, and tried in a fixed order.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ClassifyError;

/// A register that can be configured through PERIPHCONF.
///
/// Every variant carries the peripheral instance name (`periph`) and the
/// array indices recovered from the register path.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RegisterKind {
    /// `P*.PIN_CNF[pin]`
    GpioPinCnf { periph: String, pin: u32 },
    /// `IPCMAP*.CHANNEL[channel].SINK`
    IpcmapChannelSink { periph: String, channel: u32 },
    /// `IPCMAP*.CHANNEL[channel].SOURCE`
    IpcmapChannelSource { periph: String, channel: u32 },
    /// `IRQMAP*.IRQ[irq].SINK`
    IrqmapIrqSink { periph: String, irq: u32 },
    /// `MEMCONF*.POWER[power].CONTROL`
    MemconfPowerControl { periph: String, power: u32 },
    /// `MEMCONF*.POWER[power].RET`
    MemconfPowerRet { periph: String, power: u32 },
    /// `MEMCONF*.POWER[power].RET2`
    MemconfPowerRet2 { periph: String, power: u32 },
    /// `PPIB*.PUBLISH_RECEIVE[channel]`
    PpibPublishReceive { periph: String, channel: u32 },
    /// `PPIB*.SUBSCRIBE_SEND[channel]`
    PpibSubscribeSend { periph: String, channel: u32 },
    /// `SPU*.PERIPH[slave].PERM`
    SpuPeriphPerm { periph: String, slave: u32 },
    /// `SPU*.FEATURE.BELLS.PROCESSOR[processor].EVENTS[index]`
    SpuFeatureBellsProcessorEvents { periph: String, processor: u32, index: u32 },
    /// `SPU*.FEATURE.BELLS.PROCESSOR[processor].INTERRUPT[index]`
    SpuFeatureBellsProcessorInterrupt { periph: String, processor: u32, index: u32 },
    /// `SPU*.FEATURE.BELLS.PROCESSOR[processor].TASKS[index]`
    SpuFeatureBellsProcessorTasks { periph: String, processor: u32, index: u32 },
    /// `SPU*.FEATURE.DPPIC.CH[channel]`
    SpuFeatureDppicCh { periph: String, channel: u32 },
    /// `SPU*.FEATURE.DPPIC.CHG[group]`
    SpuFeatureDppicChg { periph: String, group: u32 },
    /// `SPU*.FEATURE.GPIO[port].PIN[pin]`
    SpuFeatureGpioPin { periph: String, port: u32, pin: u32 },
    /// `SPU*.FEATURE.GPIOTE[gpiote].CH[channel]`
    SpuFeatureGpioteCh { periph: String, gpiote: u32, channel: u32 },
    /// `SPU*.FEATURE.GPIOTE[gpiote].INTERRUPT[index]`
    SpuFeatureGpioteInterrupt { periph: String, gpiote: u32, index: u32 },
    /// `SPU*.FEATURE.GRTC.CC[cc]`
    SpuFeatureGrtcCc { periph: String, cc: u32 },
    /// `SPU*.FEATURE.GRTC.CLK`
    SpuFeatureGrtcClk { periph: String },
    /// `SPU*.FEATURE.GRTC.INTERRUPT[index]`
    SpuFeatureGrtcInterrupt { periph: String, index: u32 },
    /// `SPU*.FEATURE.GRTC.PWMCONFIG`
    SpuFeatureGrtcPwmconfig { periph: String },
    /// `SPU*.FEATURE.GRTC.SYSCOUNTER`
    SpuFeatureGrtcSyscounter { periph: String },
    /// `SPU*.FEATURE.IPCT.CH[channel]`
    SpuFeatureIpctCh { periph: String, channel: u32 },
    /// `SPU*.FEATURE.IPCT.INTERRUPT[index]`
    SpuFeatureIpctInterrupt { periph: String, index: u32 },
}

impl RegisterKind {
    /// Classify a dotted register name.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError`] when no template of the name's prefix group
    /// matches.
    pub fn classify(name: &str) -> Result<Self, ClassifyError> {
        let group = PrefixGroup::of(name).ok_or_else(|| ClassifyError { name: name.to_owned() })?;

        TEMPLATES
            .iter()
            .filter(|t| t.group == group)
            .find_map(|t| t.parse(name))
            .ok_or_else(|| ClassifyError { name: name.to_owned() })
    }

    /// Peripheral instance name, e.g. `SPU131` or `P2`.
    #[must_use]
    pub fn periph(&self) -> &str {
        match self {
            Self::GpioPinCnf { periph, .. }
            | Self::IpcmapChannelSink { periph, .. }
            | Self::IpcmapChannelSource { periph, .. }
            | Self::IrqmapIrqSink { periph, .. }
            | Self::MemconfPowerControl { periph, .. }
            | Self::MemconfPowerRet { periph, .. }
            | Self::MemconfPowerRet2 { periph, .. }
            | Self::PpibPublishReceive { periph, .. }
            | Self::PpibSubscribeSend { periph, .. }
            | Self::SpuPeriphPerm { periph, .. }
            | Self::SpuFeatureBellsProcessorEvents { periph, .. }
            | Self::SpuFeatureBellsProcessorInterrupt { periph, .. }
            | Self::SpuFeatureBellsProcessorTasks { periph, .. }
            | Self::SpuFeatureDppicCh { periph, .. }
            | Self::SpuFeatureDppicChg { periph, .. }
            | Self::SpuFeatureGpioPin { periph, .. }
            | Self::SpuFeatureGpioteCh { periph, .. }
            | Self::SpuFeatureGpioteInterrupt { periph, .. }
            | Self::SpuFeatureGrtcCc { periph, .. }
            | Self::SpuFeatureGrtcClk { periph }
            | Self::SpuFeatureGrtcInterrupt { periph, .. }
            | Self::SpuFeatureGrtcPwmconfig { periph }
            | Self::SpuFeatureGrtcSyscounter { periph }
            | Self::SpuFeatureIpctCh { periph, .. }
            | Self::SpuFeatureIpctInterrupt { periph, .. } => periph,
        }
    }

    /// Array indices in the order they appear in the register path.
    #[must_use]
    pub fn indices(&self) -> Vec<u32> {
        match *self {
            Self::SpuFeatureGrtcClk { .. }
            | Self::SpuFeatureGrtcPwmconfig { .. }
            | Self::SpuFeatureGrtcSyscounter { .. } => Vec::new(),
            Self::GpioPinCnf { pin: i, .. }
            | Self::IpcmapChannelSink { channel: i, .. }
            | Self::IpcmapChannelSource { channel: i, .. }
            | Self::IrqmapIrqSink { irq: i, .. }
            | Self::MemconfPowerControl { power: i, .. }
            | Self::MemconfPowerRet { power: i, .. }
            | Self::MemconfPowerRet2 { power: i, .. }
            | Self::PpibPublishReceive { channel: i, .. }
            | Self::PpibSubscribeSend { channel: i, .. }
            | Self::SpuPeriphPerm { slave: i, .. }
            | Self::SpuFeatureDppicCh { channel: i, .. }
            | Self::SpuFeatureDppicChg { group: i, .. }
            | Self::SpuFeatureGrtcCc { cc: i, .. }
            | Self::SpuFeatureGrtcInterrupt { index: i, .. }
            | Self::SpuFeatureIpctCh { channel: i, .. }
            | Self::SpuFeatureIpctInterrupt { index: i, .. } => vec![i],
            Self::SpuFeatureBellsProcessorEvents { processor: a, index: b, .. }
            | Self::SpuFeatureBellsProcessorInterrupt { processor: a, index: b, .. }
            | Self::SpuFeatureBellsProcessorTasks { processor: a, index: b, .. }
            | Self::SpuFeatureGpioPin { port: a, pin: b, .. }
            | Self::SpuFeatureGpioteCh { gpiote: a, channel: b, .. }
            | Self::SpuFeatureGpioteInterrupt { gpiote: a, index: b, .. } => vec![a, b],
        }
    }

    /// Registers in an SPU instance. These lock on first write, so
    /// conflicting writes to them are fatal.
    #[must_use]
    pub fn is_spu_register(&self) -> bool {
        matches!(self, Self::SpuPeriphPerm { .. }) || self.is_spu_feature()
    }

    /// SPU `FEATURE.*` registers.
    #[must_use]
    pub fn is_spu_feature(&self) -> bool {
        match self {
            Self::SpuFeatureBellsProcessorEvents { .. }
            | Self::SpuFeatureBellsProcessorInterrupt { .. }
            | Self::SpuFeatureBellsProcessorTasks { .. }
            | Self::SpuFeatureDppicCh { .. }
            | Self::SpuFeatureDppicChg { .. }
            | Self::SpuFeatureGpioPin { .. }
            | Self::SpuFeatureGpioteCh { .. }
            | Self::SpuFeatureGpioteInterrupt { .. }
            | Self::SpuFeatureGrtcCc { .. }
            | Self::SpuFeatureGrtcClk { .. }
            | Self::SpuFeatureGrtcInterrupt { .. }
            | Self::SpuFeatureGrtcPwmconfig { .. }
            | Self::SpuFeatureGrtcSyscounter { .. }
            | Self::SpuFeatureIpctCh { .. }
            | Self::SpuFeatureIpctInterrupt { .. } => true,
            Self::GpioPinCnf { .. }
            | Self::IpcmapChannelSink { .. }
            | Self::IpcmapChannelSource { .. }
            | Self::IrqmapIrqSink { .. }
            | Self::MemconfPowerControl { .. }
            | Self::MemconfPowerRet { .. }
            | Self::MemconfPowerRet2 { .. }
            | Self::PpibPublishReceive { .. }
            | Self::PpibSubscribeSend { .. }
            | Self::SpuPeriphPerm { .. } => false,
        }
    }
}

/// Instance-name prefix groups, checked in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PrefixGroup {
    Spu,
    Ipcmap,
    Irqmap,
    Memconf,
    Ppib,
    Gpio,
}

impl PrefixGroup {
    fn of(name: &str) -> Option<Self> {
        [
            ("SPU", Self::Spu),
            ("IPCMAP", Self::Ipcmap),
            ("IRQMAP", Self::Irqmap),
            ("MEMCONF", Self::Memconf),
            ("PPIB", Self::Ppib),
            ("P", Self::Gpio),
        ]
        .into_iter()
        .find(|(prefix, _)| name.starts_with(prefix))
        .map(|(_, group)| group)
    }
}

type Build = fn(String, &[u32]) -> RegisterKind;

struct Template {
    group: PrefixGroup,
    regex: Regex,
    build: Build,
}

impl Template {
    fn new(group: PrefixGroup, path: &str, build: Build) -> Self {
        let regex = Regex::new(&template_pattern(path)).expect("register templates are valid regexes");
        Self { group, regex, build }
    }

    fn parse(&self, name: &str) -> Option<RegisterKind> {
        let caps = self.regex.captures(name)?;
        let periph = caps.get(1)?.as_str().to_owned();
        let indices = caps
            .iter()
            .skip(2)
            .map(|m| m?.as_str().parse::<u32>().ok())
            .collect::<Option<Vec<_>>>()?;
        Some((self.build)(periph, &indices))
    }
}

/// Regex source for a register path template.
///
/// Dots are escaped, each `{0}` becomes a captured `[n]` index, and a
/// captured instance name is prepended:
///
/// ```text
/// "PERIPH{0}.PERM"  →  ^([^\.]+)\.PERIPH\[([0-9]+)\]\.PERM$
/// ```
#[must_use]
pub fn template_pattern(path: &str) -> String {
    let body = path.replace('.', r"\.").replace("{0}", r"\[([0-9]+)\]");
    format!(r"^([^\.]+)\.{body}$")
}

lazy_static! {
    static ref TEMPLATES: Vec<Template> = {
        use PrefixGroup::{Gpio, Ipcmap, Irqmap, Memconf, Ppib, Spu};
        use RegisterKind as K;

        vec![
            Template::new(Spu, "PERIPH{0}.PERM", |periph, i| K::SpuPeriphPerm { periph, slave: i[0] }),
            Template::new(Spu, "FEATURE.BELLS.PROCESSOR{0}.TASKS{0}", |periph, i| {
                K::SpuFeatureBellsProcessorTasks { periph, processor: i[0], index: i[1] }
            }),
            Template::new(Spu, "FEATURE.BELLS.PROCESSOR{0}.EVENTS{0}", |periph, i| {
                K::SpuFeatureBellsProcessorEvents { periph, processor: i[0], index: i[1] }
            }),
            Template::new(Spu, "FEATURE.BELLS.PROCESSOR{0}.INTERRUPT{0}", |periph, i| {
                K::SpuFeatureBellsProcessorInterrupt { periph, processor: i[0], index: i[1] }
            }),
            Template::new(Spu, "FEATURE.DPPIC.CH{0}", |periph, i| K::SpuFeatureDppicCh { periph, channel: i[0] }),
            Template::new(Spu, "FEATURE.DPPIC.CHG{0}", |periph, i| K::SpuFeatureDppicChg { periph, group: i[0] }),
            Template::new(Spu, "FEATURE.GPIO{0}.PIN{0}", |periph, i| {
                K::SpuFeatureGpioPin { periph, port: i[0], pin: i[1] }
            }),
            Template::new(Spu, "FEATURE.GPIOTE{0}.CH{0}", |periph, i| {
                K::SpuFeatureGpioteCh { periph, gpiote: i[0], channel: i[1] }
            }),
            Template::new(Spu, "FEATURE.GPIOTE{0}.INTERRUPT{0}", |periph, i| {
                K::SpuFeatureGpioteInterrupt { periph, gpiote: i[0], index: i[1] }
            }),
            Template::new(Spu, "FEATURE.GRTC.CC{0}", |periph, i| K::SpuFeatureGrtcCc { periph, cc: i[0] }),
            Template::new(Spu, "FEATURE.GRTC.PWMCONFIG", |periph, _| K::SpuFeatureGrtcPwmconfig { periph }),
            Template::new(Spu, "FEATURE.GRTC.CLK", |periph, _| K::SpuFeatureGrtcClk { periph }),
            Template::new(Spu, "FEATURE.GRTC.SYSCOUNTER", |periph, _| K::SpuFeatureGrtcSyscounter { periph }),
            Template::new(Spu, "FEATURE.GRTC.INTERRUPT{0}", |periph, i| {
                K::SpuFeatureGrtcInterrupt { periph, index: i[0] }
            }),
            Template::new(Spu, "FEATURE.IPCT.CH{0}", |periph, i| K::SpuFeatureIpctCh { periph, channel: i[0] }),
            Template::new(Spu, "FEATURE.IPCT.INTERRUPT{0}", |periph, i| {
                K::SpuFeatureIpctInterrupt { periph, index: i[0] }
            }),
            Template::new(Ipcmap, "CHANNEL{0}.SINK", |periph, i| K::IpcmapChannelSink { periph, channel: i[0] }),
            Template::new(Ipcmap, "CHANNEL{0}.SOURCE", |periph, i| K::IpcmapChannelSource { periph, channel: i[0] }),
            Template::new(Irqmap, "IRQ{0}.SINK", |periph, i| K::IrqmapIrqSink { periph, irq: i[0] }),
            Template::new(Memconf, "POWER{0}.CONTROL", |periph, i| K::MemconfPowerControl { periph, power: i[0] }),
            Template::new(Memconf, "POWER{0}.RET", |periph, i| K::MemconfPowerRet { periph, power: i[0] }),
            Template::new(Memconf, "POWER{0}.RET2", |periph, i| K::MemconfPowerRet2 { periph, power: i[0] }),
            Template::new(Ppib, "SUBSCRIBE_SEND{0}", |periph, i| K::PpibSubscribeSend { periph, channel: i[0] }),
            Template::new(Ppib, "PUBLISH_RECEIVE{0}", |periph, i| K::PpibPublishReceive { periph, channel: i[0] }),
            Template::new(Gpio, "PIN_CNF{0}", |periph, i| K::GpioPinCnf { periph, pin: i[0] }),
        ]
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_escapes_dots_and_captures_indices() {
        assert_eq!(
            template_pattern("PERIPH{0}.PERM"),
            r"^([^\.]+)\.PERIPH\[([0-9]+)\]\.PERM$"
        );
    }

    #[test]
    fn classifies_spu_registers() {
        assert_eq!(
            RegisterKind::classify("SPU131.PERIPH[6].PERM").unwrap(),
            RegisterKind::SpuPeriphPerm { periph: "SPU131".into(), slave: 6 }
        );
        assert_eq!(
            RegisterKind::classify("SPU131.FEATURE.GPIO[1].PIN[7]").unwrap(),
            RegisterKind::SpuFeatureGpioPin { periph: "SPU131".into(), port: 1, pin: 7 }
        );
        assert_eq!(
            RegisterKind::classify("SPU133.FEATURE.DPPIC.CHG[2]").unwrap(),
            RegisterKind::SpuFeatureDppicChg { periph: "SPU133".into(), group: 2 }
        );
        assert_eq!(
            RegisterKind::classify("SPU131.FEATURE.GRTC.SYSCOUNTER").unwrap(),
            RegisterKind::SpuFeatureGrtcSyscounter { periph: "SPU131".into() }
        );
    }

    #[test]
    fn classifies_other_groups() {
        let ipcmap = RegisterKind::classify("IPCMAP.CHANNEL[3].SOURCE").unwrap();
        assert_eq!(ipcmap.periph(), "IPCMAP");
        assert_eq!(ipcmap.indices(), vec![3]);

        assert!(matches!(
            RegisterKind::classify("MEMCONF.POWER[1].RET2").unwrap(),
            RegisterKind::MemconfPowerRet2 { power: 1, .. }
        ));
        assert!(matches!(
            RegisterKind::classify("PPIB130.PUBLISH_RECEIVE[9]").unwrap(),
            RegisterKind::PpibPublishReceive { channel: 9, .. }
        ));
        assert!(matches!(
            RegisterKind::classify("P2.PIN_CNF[11]").unwrap(),
            RegisterKind::GpioPinCnf { pin: 11, .. }
        ));
        assert!(matches!(
            RegisterKind::classify("IRQMAP.IRQ[400].SINK").unwrap(),
            RegisterKind::IrqmapIrqSink { irq: 400, .. }
        ));
    }

    #[test]
    fn unknown_names_fail() {
        assert!(RegisterKind::classify("SPU131.FEATURE.UNKNOWN").is_err());
        assert!(RegisterKind::classify("UARTE120.ENABLE").is_err());
        // PPIB prefix wins over the GPIO fallback.
        assert!(RegisterKind::classify("PPIB130.PIN_CNF[1]").is_err());
    }

    #[test]
    fn spu_grouping() {
        let perm = RegisterKind::classify("SPU131.PERIPH[0].PERM").unwrap();
        assert!(perm.is_spu_register());
        assert!(!perm.is_spu_feature());

        let bells = RegisterKind::classify("SPU131.FEATURE.BELLS.PROCESSOR[1].TASKS[2]").unwrap();
        assert!(bells.is_spu_feature());
        assert_eq!(bells.indices(), vec![1, 2]);

        let pin_cnf = RegisterKind::classify("P0.PIN_CNF[0]").unwrap();
        assert!(!pin_cnf.is_spu_register());
    }
}
