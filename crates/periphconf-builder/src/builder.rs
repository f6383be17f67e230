//! PERIPHCONF builder.
//!
//! Walks topology nodes and collects the UICR macro calls that give the
//! processor ownership of its peripherals, channels and pins. Every `add_*`
//! call either succeeds completely or leaves the builder unchanged.

use std::collections::{BTreeSet, HashMap};

use periphconf_chip::{spu_address_for_peripheral, Address, DomainId, OwnerId, ProcessorId};

use crate::error::{BuildError, Result};
use crate::macro_call::{Arg, MacroCall};
use crate::psel::NrfPsel;
use crate::tables::{Ctrlsel, GpiosPin, PeripheralKey, PinKey, SocLookupTables};
use crate::topology::{Node, NodeId, Prop, Topology, GPIO_COMPAT};

/// Compatibles of global peripherals that never get an SPU `PERIPH[n].PERM`
/// entry for the processor. Their resources are split per channel or pin.
pub const SKIP_SPU_PERIPH_PERM_COMPATS: &[&str] = &[
    "nordic,nrf-gpio",
    "nordic,nrf-gpiote",
    "nordic,nrf-grtc",
    "nordic,nrf-dppic-global",
    "nordic,nrf-ipct-global",
    "nordic,nrf-clic",
    "nordic,nrf-bellboard-tx",
    "nordic,nrf-bellboard-rx",
    "nordic,nrf-vevif-task-tx",
    "nordic,nrf-vevif-task-rx",
    "nordic,nrf-temp",
];

/// Compatibles of global peripherals without DMA. `DMASEC` is not writable
/// on these and reads as zero.
pub const NO_DMA_COMPATS: &[&str] = &[
    "nordic,nrf-auxpll",
    "nordic,nrf-comp",
    "nordic,nrf-egu",
    "nordic,nrf-exmif",
    "nordic,nrf-lpcomp",
    "nordic,nrf-qdec",
    "nordic,nrf-timer",
    "nordic,nrf-rtc",
    "nordic,nrf-wdt",
    // PPR does not run correctly with DMASEC set.
    "nordic,nrf-vpr-coprocessor",
];

const GPIOTE_COMPAT: &str = "nordic,nrf-gpiote";
const DPPIC_GLOBAL_COMPAT: &str = "nordic,nrf-dppic-global";
const IPCT_GLOBAL_COMPAT: &str = "nordic,nrf-ipct-global";
const IPCT_LOCAL_COMPAT: &str = "nordic,nrf-ipct-local";
const GRTC_COMPAT: &str = "nordic,nrf-grtc";
const SAADC_COMPAT: &str = "nordic,nrf-saadc";
const COMP_COMPATS: &[&str] = &["nordic,nrf-comp", "nordic,nrf-lpcomp"];

/// A node given by ID or by label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRef<'s> {
    /// Arena index.
    Id(NodeId),
    /// Node label.
    Label(&'s str),
}

impl From<NodeId> for NodeRef<'_> {
    fn from(id: NodeId) -> Self {
        Self::Id(id)
    }
}

impl<'s> From<&'s str> for NodeRef<'s> {
    fn from(label: &'s str) -> Self {
        Self::Label(label)
    }
}

/// What to generate for one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeripheralOptions {
    /// The node is in a global domain: SPU permissions, IRQ routing,
    /// split-ownership channels and pin-control pins apply.
    pub is_global: bool,
    /// Route the node's interrupts to the processor.
    pub has_irq_mapping: bool,
    /// Connect DPPIC source/sink channels through the PPI bridges.
    pub add_ppib_links: bool,
    /// Configure pins referenced by `*-gpios` properties.
    pub add_gpios: bool,
}

impl Default for PeripheralOptions {
    fn default() -> Self {
        Self {
            is_global: true,
            has_irq_mapping: true,
            add_ppib_links: true,
            add_gpios: true,
        }
    }
}

/// A cross-domain IPCT channel link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IpcLink {
    /// Domain of the source IPCT.
    pub source_domain: DomainId,
    /// Source channel.
    pub source_channel: u32,
    /// Domain of the sink IPCT.
    pub sink_domain: DomainId,
    /// Sink channel.
    pub sink_channel: u32,
}

impl IpcLink {
    fn to_macro(self, index: u32) -> MacroCall {
        MacroCall::new(
            "UICR_IPCMAP_CHANNEL_CFG",
            vec![
                index.into(),
                Arg::Enum(self.source_domain.c_enum()),
                self.source_channel.into(),
                Arg::Enum(self.sink_domain.c_enum()),
                self.sink_channel.into(),
            ],
            format!(
                "{} IPCT ch. {} => {} IPCT ch. {}",
                self.source_domain, self.source_channel, self.sink_domain, self.sink_channel
            ),
        )
    }
}

/// Output of one `add_*` call, committed only when the call succeeds.
#[derive(Debug, Default)]
struct Pending {
    macros: Vec<MacroCall>,
    links: Vec<IpcLink>,
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Source,
    Sink,
}

/// Collects PERIPHCONF macro calls for one processor.
#[derive(Debug)]
pub struct PeriphconfBuilder<'a> {
    topology: &'a Topology,
    tables: &'a SocLookupTables,
    processor: ProcessorId,
    owner: OwnerId,
    macros: Vec<MacroCall>,
    ipc_links: BTreeSet<IpcLink>,
    node_labels: HashMap<u32, String>,
}

impl<'a> PeriphconfBuilder<'a> {
    /// Create a builder for the processor described by `topology`.
    ///
    /// # Errors
    ///
    /// Fails if the processor cannot be determined from the `/cpus` node.
    pub fn new(topology: &'a Topology, tables: &'a SocLookupTables) -> Result<Self> {
        let processor = topology.processor_id()?;
        tracing::info!("Building PERIPHCONF for processor {processor}");

        let node_labels = topology
            .nodes()
            .filter_map(|(_, n)| Some((n.regs.first()?.addr, n.label()?.to_string())))
            .collect();

        Ok(Self {
            topology,
            tables,
            processor,
            owner: processor.default_owner_id(),
            macros: Vec::new(),
            ipc_links: BTreeSet::new(),
            node_labels,
        })
    }

    /// Processor the configuration is generated for.
    pub fn processor(&self) -> ProcessorId {
        self.processor
    }

    /// Owner ID written to every permission entry.
    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    /// All macro calls collected so far, in render order.
    ///
    /// IPCMAP indices are assigned here in link order, so they do not depend
    /// on the order nodes were added in.
    pub fn macros(&self) -> Vec<MacroCall> {
        let mut macros = self.macros.clone();
        macros.extend(
            self.ipc_links
                .iter()
                .zip(0u32..)
                .map(|(link, index)| link.to_macro(index)),
        );
        macros.sort();
        macros
    }

    /// Render the C source file populating PERIPHCONF.
    pub fn build_generated_source(&self, header_line: Option<&str>) -> String {
        let mut lines = Vec::new();

        if let Some(header) = header_line.filter(|h| !h.is_empty()) {
            lines.push(format!("/* {header} */"));
            lines.push(String::new());
        }

        lines.push("#include <zephyr/devicetree.h>".to_string());
        lines.push("#include <uicr/uicr.h>".to_string());
        lines.push(String::new());

        lines.extend(self.macros().iter().map(|m| m.render(&self.node_labels)));
        lines.join("\n")
    }

    /// Configure a node in a global domain.
    ///
    /// # Errors
    ///
    /// See [`PeriphconfBuilder::add_peripheral_cfg`].
    pub fn add_global_peripheral_cfg<'s>(
        &mut self,
        node: impl Into<NodeRef<'s>>,
        has_irq_mapping: bool,
        add_ppib_links: bool,
    ) -> Result<()> {
        self.add_peripheral_cfg(
            node,
            PeripheralOptions {
                is_global: true,
                has_irq_mapping,
                add_ppib_links,
                add_gpios: true,
            },
        )
    }

    /// Configure a node in the processor's local domain. Only IPCT channel
    /// links apply.
    ///
    /// # Errors
    ///
    /// See [`PeriphconfBuilder::add_peripheral_cfg`].
    pub fn add_local_peripheral_cfg<'s>(&mut self, node: impl Into<NodeRef<'s>>) -> Result<()> {
        self.add_peripheral_cfg(
            node,
            PeripheralOptions {
                is_global: false,
                add_gpios: false,
                ..PeripheralOptions::default()
            },
        )
    }

    /// Give the processor the pins referenced by the node's `*-gpios`
    /// properties, without touching their control-select.
    ///
    /// # Errors
    ///
    /// See [`PeriphconfBuilder::add_peripheral_cfg`].
    pub fn add_gpio_spu_permissions<'s>(&mut self, node: impl Into<NodeRef<'s>>) -> Result<()> {
        let Some(id) = self.owned_node(node.into())? else {
            return Ok(());
        };
        let mut out = Pending::default();
        self.gpios_pins(id, false, &mut out)?;
        self.commit(out);
        Ok(())
    }

    /// Configure one node. Nodes that are not `okay` or `reserved` are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Fails with [`BuildError::BadTopology`] when the node does not meet the
    /// builder's assumptions (ambiguous IRQ routing, malformed channel links,
    /// unknown domain, missing GPIO port), or when the lookup tables lack an
    /// instance or channel mapping. Nothing from a failed call is kept.
    pub fn add_peripheral_cfg<'s>(
        &mut self,
        node: impl Into<NodeRef<'s>>,
        options: PeripheralOptions,
    ) -> Result<()> {
        let Some(id) = self.owned_node(node.into())? else {
            return Ok(());
        };
        let mut out = Pending::default();
        self.peripheral_actions(id, options, &mut out)?;
        self.commit(out);
        Ok(())
    }

    fn owned_node(&self, node: NodeRef<'_>) -> Result<Option<NodeId>> {
        let id = match node {
            NodeRef::Id(id) => id,
            NodeRef::Label(label) => self
                .topology
                .by_label(label)
                .ok_or_else(|| BuildError::bad_topology(label, "no node with this label"))?,
        };

        let node = self
            .topology
            .get(id)
            .ok_or_else(|| BuildError::bad_topology(format!("node #{}", id.0), "no node with this ID"))?;
        if node.status.is_owned() {
            Ok(Some(id))
        } else {
            tracing::debug!("Skipping {} (status {:?})", node.path, node.status);
            Ok(None)
        }
    }

    fn commit(&mut self, out: Pending) {
        self.macros.extend(out.macros);
        for link in out.links {
            if !self.ipc_links.insert(link) {
                tracing::debug!("Skip duplicate IPCMAP entry: {link:?}");
            }
        }
    }

    fn owner_arg(&self) -> Arg {
        Arg::Enum(self.owner.c_enum())
    }

    fn spu_for(&self, periph: Address) -> Result<(Address, &'a str)> {
        let tables = self.tables;
        let spu = spu_address_for_peripheral(periph)?;
        Ok((spu, tables.spu_name(spu.encode())?))
    }

    fn peripheral_key(node: &Node) -> Result<PeripheralKey> {
        if node.regs.is_empty() {
            Ok(PeripheralKey::Label(node.require_label()?.to_string()))
        } else {
            Ok(PeripheralKey::Address(node.secure_reg_addr()?.encode()))
        }
    }

    fn peripheral_actions(&self, id: NodeId, options: PeripheralOptions, out: &mut Pending) -> Result<()> {
        let node = &self.topology[id];
        let has_any = |compats: &[&str]| compats.iter().any(|c| node.has_compat(c));

        if options.is_global {
            if !has_any(SKIP_SPU_PERIPH_PERM_COMPATS) {
                self.periph_perm(id, !has_any(NO_DMA_COMPATS), out)?;
                if options.has_irq_mapping {
                    self.irq_mapping(id, out)?;
                }
            }

            if node.has_compat(GPIOTE_COMPAT) {
                let label = node.require_label()?;
                self.feature_channels(
                    id,
                    "UICR_SPU_FEATURE_GPIOTE_CH_SET",
                    ("owned-channels", "nonsecure-channels"),
                    Some(0),
                    |spu, num| format!("{spu}: {label} ch. {num} permissions"),
                    out,
                )?;
            }

            if node.has_compat(DPPIC_GLOBAL_COMPAT) {
                let label = node.require_label()?;
                self.feature_channels(
                    id,
                    "UICR_SPU_FEATURE_DPPIC_CH_SET",
                    ("owned-channels", "nonsecure-channels"),
                    None,
                    |spu, num| format!("{spu}: {label} ch. {num} permissions"),
                    out,
                )?;
                self.feature_channels(
                    id,
                    "UICR_SPU_FEATURE_DPPIC_CHG_SET",
                    ("owned-channel-groups", "nonsecure-channel-groups"),
                    None,
                    |spu, num| format!("{spu}: {label} ch. group {num} permissions"),
                    out,
                )?;
                if options.add_ppib_links {
                    self.dppic_ppib_links(node, out)?;
                }
            }

            if node.has_compat(IPCT_GLOBAL_COMPAT) {
                let label = node.require_label()?;
                self.feature_channels(
                    id,
                    "UICR_SPU_FEATURE_IPCT_CH_SET",
                    ("owned-channels", "nonsecure-channels"),
                    None,
                    |spu, num| format!("{spu}: {label} ch. {num} permissions"),
                    out,
                )?;
                ipct_links(node, out)?;
            }

            if node.has_compat(GRTC_COMPAT) {
                self.feature_channels(
                    id,
                    "UICR_SPU_FEATURE_GRTC_CC_SET",
                    ("owned-channels", "nonsecure-channels"),
                    None,
                    |spu, num| format!("{spu}: GRTC CC{num} permissions"),
                    out,
                )?;
            }

            if node.has_compat(SAADC_COMPAT) {
                self.saadc_pins(id, out)?;
            }

            if has_any(COMP_COMPATS) {
                self.comp_pins(id, out)?;
            }

            self.pinctrl_pins(id, out)?;
        }

        if node.has_compat(IPCT_LOCAL_COMPAT) {
            ipct_links(node, out)?;
        }

        if options.add_gpios {
            self.gpios_pins(id, true, out)?;
        }

        Ok(())
    }

    fn periph_perm(&self, id: NodeId, has_dma: bool, out: &mut Pending) -> Result<()> {
        let node = &self.topology[id];
        let addr = node.reg_addr()?;
        let secure = self.topology.is_secure(id)?;
        let label = node.require_label()?;
        let (spu, spu_name) = self.spu_for(addr)?;

        out.macros.push(MacroCall::new(
            "UICR_SPU_PERIPH_PERM_SET",
            vec![
                spu.into(),
                addr.slave_index()?.into(),
                secure.into(),
                (has_dma && secure).into(),
                self.owner_arg(),
            ],
            format!("{spu_name}: {label} permissions"),
        ));
        Ok(())
    }

    fn irq_mapping(&self, id: NodeId, out: &mut Pending) -> Result<()> {
        let node = &self.topology[id];
        if node.interrupts.is_empty() {
            return Ok(());
        }
        let label = node.require_label()?;

        for (index, irq) in (0u32..).zip(&node.interrupts) {
            let mut processors = self.topology.processors_from_labels(irq.controller);
            if processors.is_empty() {
                processors = self.topology.processors_from_labels(id);
            }

            let mut candidates = processors.iter();
            let processor = match (candidates.next(), candidates.next()) {
                (Some(&p), None) => p,
                (None, _) => {
                    return Err(BuildError::bad_topology(
                        &node.path,
                        "no unique processor ID could be found based on interrupt controllers or node labels",
                    ))
                }
                (Some(_), Some(_)) => {
                    let names: Vec<&str> = processors.iter().map(|p| p.name()).collect();
                    return Err(BuildError::bad_topology(
                        &node.path,
                        format!(
                            "node corresponds to multiple processors ({}), which is not supported",
                            names.join(", ")
                        ),
                    ));
                }
            };

            out.macros.push(MacroCall::new(
                "UICR_IRQMAP_IRQ_SINK_SET",
                vec![
                    Arg::IrqNumber {
                        label: label.to_string(),
                        index,
                    },
                    Arg::Enum(processor.c_enum()),
                ],
                format!("{label} IRQ => {}", processor.name()),
            ));
        }
        Ok(())
    }

    /// One SPU feature entry per owned channel. `instance` is the feature
    /// instance index for features that take one.
    fn feature_channels(
        &self,
        id: NodeId,
        macro_name: &'static str,
        (owned, nonsecure): (&str, &str),
        instance: Option<u32>,
        comment: impl Fn(&str, u32) -> String,
        out: &mut Pending,
    ) -> Result<()> {
        let (spu, spu_name) = self.spu_for(self.topology[id].reg_addr()?)?;

        for (num, secure) in self.topology.split_channels(id, owned, nonsecure)? {
            let mut args = vec![Arg::from(spu)];
            args.extend(instance.map(Arg::from));
            args.extend([num.into(), secure.into(), self.owner_arg()]);
            out.macros.push(MacroCall::new(macro_name, args, comment(spu_name, num)));
        }
        Ok(())
    }

    fn dppic_ppib_links(&self, node: &Node, out: &mut Pending) -> Result<()> {
        let dppic = node.secure_reg_addr()?.encode();

        for channel in node.array_prop("source-channels")? {
            self.link_dppi_channel(dppic, channel, Direction::Source, out)?;
        }
        for channel in node.array_prop("sink-channels")? {
            self.link_dppi_channel(dppic, channel, Direction::Sink, out)?;
        }
        Ok(())
    }

    fn link_dppi_channel(&self, dppic: u32, channel: u32, direction: Direction, out: &mut Pending) -> Result<()> {
        let local = self.tables.dppic_to_ppib(dppic, channel)?;
        let remote = self.tables.ppib_to_ppib(local.0, local.1)?;

        let ((sub, sub_ch), (publ, pub_ch)) = match direction {
            Direction::Source => (local, remote),
            Direction::Sink => (remote, local),
        };
        let link = format!(
            "{} ch. {sub_ch} => {} ch. {pub_ch}",
            self.tables.ppib_name(sub)?,
            self.tables.ppib_name(publ)?
        );

        out.macros.push(MacroCall::new(
            "UICR_PPIB_SUBSCRIBE_SEND_ENABLE",
            vec![Address::decode(sub).into(), sub_ch.into()],
            format!("SUB: {link}"),
        ));
        out.macros.push(MacroCall::new(
            "UICR_PPIB_PUBLISH_RECEIVE_ENABLE",
            vec![Address::decode(publ).into(), pub_ch.into()],
            format!("PUB: {link}"),
        ));
        Ok(())
    }

    fn gpios_pins(&self, id: NodeId, with_ctrlsel: bool, out: &mut Pending) -> Result<()> {
        let node = &self.topology[id];

        for (name, prop) in &node.props {
            if !is_gpios_prop(name) {
                continue;
            }
            let Prop::PhandleArray(entries) = prop else {
                tracing::debug!("skipping *-gpios prop {name} in {} (not a phandle-array)", node.path);
                continue;
            };

            for entry in entries {
                let gpio = &self.topology[entry.controller];
                if !gpio.has_compat(GPIO_COMPAT) {
                    continue;
                }

                let port = gpio.int_prop("port")?;
                let pin = *entry.data.get("pin").ok_or_else(|| {
                    BuildError::bad_topology(&node.path, format!("{name} entry has no pin cell"))
                })?;
                let secure = self.topology.is_secure(entry.controller)?;
                let ctrlsel = if with_ctrlsel {
                    let key = PinKey::Gpios(GpiosPin {
                        name: name.clone(),
                        port,
                        pin,
                    });
                    self.tables.lookup_ctrlsel(&Self::peripheral_key(node)?, &key)
                } else {
                    None
                };
                self.gpio_pin(gpio, pin, secure, ctrlsel, out)?;
            }
        }
        Ok(())
    }

    fn pinctrl_pins(&self, id: NodeId, out: &mut Pending) -> Result<()> {
        let node = &self.topology[id];
        if node.pinctrls.is_empty() {
            return Ok(());
        }

        let secure = self.topology.is_secure(id)?;
        let key = Self::peripheral_key(node)?;

        for group in node.pinctrls.iter().flat_map(|p| &p.groups) {
            for (i, &raw) in group.psels.iter().enumerate() {
                let psel = NrfPsel::from_raw(raw);
                if psel.is_disconnected() {
                    continue;
                }

                let gpio = self.topology.gpio_node_by_port(
                    psel.port,
                    &format!(" (referenced by {}:psels[{i}])", group.path),
                )?;
                let ctrlsel = self.tables.lookup_ctrlsel(&key, &PinKey::Psel(psel));
                self.gpio_pin(&self.topology[gpio], psel.pin, secure, ctrlsel, out)?;
            }
        }
        Ok(())
    }

    fn saadc_pins(&self, id: NodeId, out: &mut Pending) -> Result<()> {
        let node = &self.topology[id];
        let Some(pins) = self.tables.adc_channel_pins(node.secure_reg_addr()?.encode()) else {
            return Ok(());
        };
        let secure = self.topology.is_secure(id)?;

        for &child in &node.children {
            let child = &self.topology[child];
            if !child.name().starts_with("channel") {
                continue;
            }
            for input in ["zephyr,input-positive", "zephyr,input-negative"] {
                if let Some(Prop::Int(channel)) = child.prop(input) {
                    if let Some(&(port, pin)) = pins.get(channel) {
                        self.analog_pin(port, pin, secure, out)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn comp_pins(&self, id: NodeId, out: &mut Pending) -> Result<()> {
        let node = &self.topology[id];
        let Some(pins) = self.tables.comp_channel_pins(node.secure_reg_addr()?.encode()) else {
            return Ok(());
        };
        let secure = self.topology.is_secure(id)?;

        for input in ["psel", "extrefsel"] {
            if let Some(Prop::String(channel)) = node.prop(input) {
                if let Some(&(port, pin)) = pins.get(channel) {
                    self.analog_pin(port, pin, secure, out)?;
                }
            }
        }
        Ok(())
    }

    fn analog_pin(&self, port: u32, pin: u32, secure: bool, out: &mut Pending) -> Result<()> {
        let gpio = self.topology.gpio_node_by_port(port, "")?;
        self.gpio_pin(&self.topology[gpio], pin, secure, Some(Ctrlsel::GPIO), out)
    }

    fn gpio_pin(
        &self,
        gpio: &Node,
        pin: u32,
        secure: bool,
        ctrlsel: Option<Ctrlsel>,
        out: &mut Pending,
    ) -> Result<()> {
        let gpio_addr = gpio.reg_addr()?;
        let port = gpio.int_prop("port")?;
        let (spu, spu_name) = self.spu_for(gpio_addr)?;

        out.macros.push(MacroCall::new(
            "UICR_SPU_FEATURE_GPIO_PIN_SET",
            vec![spu.into(), port.into(), pin.into(), secure.into(), self.owner_arg()],
            format!("{spu_name}: P{port}.{pin} permissions"),
        ));

        if let Some(ctrlsel) = ctrlsel {
            out.macros.push(MacroCall::new(
                "UICR_GPIO_PIN_CNF_CTRLSEL_SET",
                vec![gpio_addr.into(), pin.into(), ctrlsel.0.into()],
                format!("{spu_name}: P{port}.{pin} CTRLSEL = {ctrlsel}"),
            ));
        }
        Ok(())
    }
}

/// `gpios` or `<name>-gpios`.
fn is_gpios_prop(name: &str) -> bool {
    name.strip_suffix("gpios")
        .is_some_and(|rest| rest.is_empty() || (rest.len() > 1 && rest.ends_with('-')))
}

fn domain_id(node: &Node, raw: u32) -> Result<DomainId> {
    DomainId::try_from(raw).map_err(|e| BuildError::bad_topology(&node.path, e.to_string()))
}

fn link_triples(node: &Node, name: &str) -> Result<Vec<(u32, u32, u32)>> {
    let cells = node.array_prop(name)?;
    if cells.len() % 3 != 0 {
        return Err(BuildError::bad_topology(
            &node.path,
            format!("{name} has {} cells, expected a multiple of 3", cells.len()),
        ));
    }
    Ok(cells.chunks_exact(3).map(|c| (c[0], c[1], c[2])).collect())
}

/// IPCMAP links from `source-channel-links` / `sink-channel-links`
/// `(local channel, remote domain, remote channel)` triples.
fn ipct_links(node: &Node, out: &mut Pending) -> Result<()> {
    let source_links = link_triples(node, "source-channel-links")?;
    let sink_links = link_triples(node, "sink-channel-links")?;
    if source_links.is_empty() && sink_links.is_empty() {
        return Ok(());
    }

    let node_domain = match node.prop("global-domain-id") {
        Some(Prop::Int(raw)) => domain_id(node, *raw)?,
        Some(_) => {
            return Err(BuildError::bad_topology(
                &node.path,
                "global-domain-id is not an integer",
            ))
        }
        None => {
            let addr = node.reg_addr()?;
            addr.domain().map_err(|e| {
                BuildError::bad_topology(
                    &node.path,
                    format!("failed to determine domain ID for address 0x{:08x}: {e}", addr.encode()),
                )
            })?
        }
    };

    for (source_channel, sink_domain, sink_channel) in source_links {
        out.links.push(IpcLink {
            source_domain: node_domain,
            source_channel,
            sink_domain: domain_id(node, sink_domain)?,
            sink_channel,
        });
    }
    for (sink_channel, source_domain, source_channel) in sink_links {
        out.links.push(IpcLink {
            source_domain: domain_id(node, source_domain)?,
            source_channel,
            sink_domain: node_domain,
            sink_channel,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpios_property_names() {
        assert!(is_gpios_prop("gpios"));
        assert!(is_gpios_prop("cs-gpios"));
        assert!(is_gpios_prop("reset-n-gpios"));
        assert!(!is_gpios_prop("-gpios"));
        assert!(!is_gpios_prop("csgpios"));
        assert!(!is_gpios_prop("gpio"));
    }

    #[test]
    fn link_triples_must_be_complete() {
        let mut node = Node {
            path: "/soc/ipct".into(),
            ..Node::default()
        };
        node.props
            .insert("source-channel-links".into(), Prop::Array(vec![0, 3, 2, 1]));
        assert!(link_triples(&node, "source-channel-links")
            .unwrap_err()
            .is_bad_topology());

        node.props
            .insert("source-channel-links".into(), Prop::Array(vec![0, 3, 2, 1, 3, 4]));
        assert_eq!(
            link_triples(&node, "source-channel-links").unwrap(),
            vec![(0, 3, 2), (1, 3, 4)]
        );
    }

    #[test]
    fn ipcmap_comment_names_domains() {
        let link = IpcLink {
            source_domain: DomainId::Application,
            source_channel: 0,
            sink_domain: DomainId::Radiocore,
            sink_channel: 2,
        };
        let call = link.to_macro(0);
        assert_eq!(
            call.comment.as_deref(),
            Some("APPLICATION IPCT ch. 0 => RADIOCORE IPCT ch. 2")
        );
        assert_eq!(call.args[1], Arg::Enum("NRF_DOMAIN_APPLICATION".into()));
    }
}
