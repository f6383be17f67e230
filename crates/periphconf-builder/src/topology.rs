//! Hardware topology snapshot.
//!
//! The builder does not parse devicetree sources. It consumes an already
//! resolved snapshot: an arena of nodes with labels, compatibles, status,
//! register blocks, properties, interrupts and pin-control groups, where all
//! references (phandles, parent bus, children) are [`NodeId`]s into the arena.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Index;

use periphconf_chip::{Address, ProcessorId};
use serde::Deserialize;

use crate::error::{BuildError, Result};

/// Compatible of the GPIO port nodes.
pub const GPIO_COMPAT: &str = "nordic,nrf-gpio";

/// Index of a node in the [`Topology`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

/// Node status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Enabled and owned by the processor.
    #[default]
    #[serde(alias = "enabled")]
    Okay,
    /// Owned, but used by another processor or child image.
    Reserved,
    /// Not in use.
    Disabled,
    /// Any other status string (`fail`, `fail-sss`, ...).
    #[serde(other)]
    Other,
}

impl Status {
    /// True if the node is owned by the processor or one of its children.
    pub fn is_owned(self) -> bool {
        matches!(self, Self::Okay | Self::Reserved)
    }
}

/// One register block of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Reg {
    /// Base address.
    pub addr: u32,
    /// Size in bytes, if known.
    #[serde(default)]
    pub size: Option<u32>,
}

/// A phandle-array element: controller node plus named cells.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PhandleEntry {
    /// Referenced controller node.
    pub controller: NodeId,
    /// Specifier cells by name (e.g. `pin`, `flags`).
    #[serde(default)]
    pub data: BTreeMap<String, u32>,
}

/// A property value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "kebab-case")]
pub enum Prop {
    /// Single integer cell.
    Int(u32),
    /// Integer array.
    Array(Vec<u32>),
    /// String.
    String(String),
    /// Boolean (present / absent).
    Boolean(bool),
    /// Phandle array with specifiers.
    PhandleArray(Vec<PhandleEntry>),
}

/// An interrupt specifier.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Interrupt {
    /// Interrupt controller node.
    pub controller: NodeId,
    /// Specifier cells by name (`irq`, `priority`, ...).
    #[serde(default)]
    pub data: BTreeMap<String, u32>,
}

/// One pin-control state (`default`, `sleep`, ...) of a node.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PinCtrl {
    /// State name.
    pub name: String,
    /// Pin groups referenced by the state.
    #[serde(default)]
    pub groups: Vec<PinGroup>,
}

/// A pin group with encoded pin selections.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PinGroup {
    /// Path of the group node, used in diagnostics.
    pub path: String,
    /// `NRF_PSEL` encoded values.
    #[serde(default)]
    pub psels: Vec<u32>,
}

/// A topology node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Node {
    /// Full node path, e.g. `/soc/peripheral@5f000000/uart@8e6000`.
    pub path: String,
    /// Node labels; the first one names the node in generated source.
    #[serde(default)]
    pub labels: Vec<String>,
    /// Compatible strings.
    #[serde(default)]
    pub compats: Vec<String>,
    /// Status.
    #[serde(default)]
    pub status: Status,
    /// Register blocks.
    #[serde(default)]
    pub regs: Vec<Reg>,
    /// Parent bus node, if any.
    #[serde(default)]
    pub bus: Option<NodeId>,
    /// Properties.
    #[serde(default)]
    pub props: BTreeMap<String, Prop>,
    /// Interrupts.
    #[serde(default)]
    pub interrupts: Vec<Interrupt>,
    /// Pin-control states.
    #[serde(default)]
    pub pinctrls: Vec<PinCtrl>,
    /// Child nodes.
    #[serde(default)]
    pub children: Vec<NodeId>,
}

impl Node {
    /// Last path component, e.g. `channel@0`.
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// First node label.
    pub fn label(&self) -> Option<&str> {
        self.labels.first().map(String::as_str)
    }

    /// First node label, or an error naming the node.
    ///
    /// # Errors
    ///
    /// Fails if the node has no labels.
    pub fn require_label(&self) -> Result<&str> {
        self.label()
            .ok_or_else(|| BuildError::bad_topology(&self.path, "node has no label"))
    }

    /// True if the node lists `compat`.
    pub fn has_compat(&self, compat: &str) -> bool {
        self.compats.iter().any(|c| c == compat)
    }

    /// Address of the first register block.
    ///
    /// # Errors
    ///
    /// Fails if the node has no register blocks.
    pub fn reg_addr(&self) -> Result<Address> {
        self.regs
            .first()
            .map(|r| Address::decode(r.addr))
            .ok_or_else(|| BuildError::bad_topology(&self.path, "node has no reg property"))
    }

    /// Secure alias of the first register block address.
    ///
    /// # Errors
    ///
    /// Fails if the node has no register blocks or its address region has no
    /// security bit.
    pub fn secure_reg_addr(&self) -> Result<Address> {
        self.reg_addr()?
            .as_secure()
            .map_err(|e| BuildError::bad_topology(&self.path, e.to_string()))
    }

    /// Property by name.
    pub fn prop(&self, name: &str) -> Option<&Prop> {
        self.props.get(name)
    }

    /// Integer property.
    ///
    /// # Errors
    ///
    /// Fails if the property is missing or not an integer.
    pub fn int_prop(&self, name: &str) -> Result<u32> {
        match self.props.get(name) {
            Some(Prop::Int(v)) => Ok(*v),
            Some(_) => Err(BuildError::bad_topology(
                &self.path,
                format!("property {name} is not an integer"),
            )),
            None => Err(BuildError::bad_topology(
                &self.path,
                format!("missing property {name}"),
            )),
        }
    }

    /// Integer array property; empty if absent. A single integer counts as a
    /// one-element array.
    ///
    /// # Errors
    ///
    /// Fails if the property exists with a non-integer type.
    pub fn array_prop(&self, name: &str) -> Result<Vec<u32>> {
        match self.props.get(name) {
            None => Ok(Vec::new()),
            Some(Prop::Array(v)) => Ok(v.clone()),
            Some(Prop::Int(v)) => Ok(vec![*v]),
            Some(_) => Err(BuildError::bad_topology(
                &self.path,
                format!("property {name} is not an integer array"),
            )),
        }
    }
}

/// Deserialized form of a topology file before reference checks.
#[derive(Debug, Deserialize)]
struct TopologyFile {
    nodes: Vec<Node>,
}

/// A validated node arena. Every [`NodeId`] stored in a node refers to an
/// existing node, so indexing with them cannot fail.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "TopologyFile")]
pub struct Topology {
    nodes: Vec<Node>,
    labels: HashMap<String, NodeId>,
}

impl Topology {
    /// Build a topology, checking all node references.
    ///
    /// # Errors
    ///
    /// Fails if a node references an index outside the arena.
    pub fn new(nodes: Vec<Node>) -> Result<Self> {
        let count = nodes.len();
        for node in &nodes {
            let refs = node
                .bus
                .iter()
                .chain(&node.children)
                .chain(node.interrupts.iter().map(|i| &i.controller))
                .chain(node.props.values().flat_map(|p| match p {
                    Prop::PhandleArray(entries) => entries.iter().map(|e| &e.controller).collect(),
                    _ => Vec::new(),
                }));
            for id in refs {
                if id.0 >= count {
                    return Err(BuildError::bad_topology(
                        &node.path,
                        format!("reference to node #{} outside the topology ({count} nodes)", id.0),
                    ));
                }
            }
        }

        let mut labels = HashMap::new();
        for (i, node) in nodes.iter().enumerate() {
            for label in &node.labels {
                labels.insert(label.clone(), NodeId(i));
            }
        }

        Ok(Self { nodes, labels })
    }

    /// Parse and validate a topology from JSON.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON or dangling node references.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: TopologyFile =
            serde_json::from_str(json).map_err(|source| BuildError::Parse { what: "topology", source })?;
        Self::new(file.nodes)
    }

    /// All nodes with their IDs.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Node by ID, `None` if the ID is outside the arena.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Node by label.
    pub fn by_label(&self, label: &str) -> Option<NodeId> {
        self.labels.get(label).copied()
    }

    /// Nodes listing `compat`.
    pub fn by_compat<'a>(&'a self, compat: &'a str) -> impl Iterator<Item = NodeId> + 'a {
        self.nodes().filter(move |(_, n)| n.has_compat(compat)).map(|(id, _)| id)
    }

    /// Security of a node, taken from the address of its bus node if that has
    /// one, otherwise from its own address.
    ///
    /// # Errors
    ///
    /// Fails if neither address exists or it has no security bit.
    pub fn is_secure(&self, id: NodeId) -> Result<bool> {
        let node = &self[id];
        let addr = match node.bus.map(|b| &self[b]).filter(|b| !b.regs.is_empty()) {
            Some(bus) => bus.reg_addr()?,
            None if !node.regs.is_empty() => node.reg_addr()?,
            None => {
                return Err(BuildError::bad_topology(
                    &node.path,
                    "failed to determine security from the address of its bus node or itself",
                ))
            }
        };
        addr.security()
            .map_err(|e| BuildError::bad_topology(&node.path, e.to_string()))
    }

    /// Processors whose label substring (`cpuapp`, `cpurad`, ...) appears in
    /// any label of the node.
    pub fn processors_from_labels(&self, id: NodeId) -> BTreeSet<ProcessorId> {
        let labels = &self[id].labels;
        ProcessorId::ALL
            .into_iter()
            .filter(|p| labels.iter().any(|l| l.contains(p.label_name())))
            .collect()
    }

    /// Processor this topology describes, from the register address of the
    /// single `/cpus/cpu@N` node.
    ///
    /// # Errors
    ///
    /// Fails unless there is exactly one cpu node with a valid processor ID.
    pub fn processor_id(&self) -> Result<ProcessorId> {
        let cpus: Vec<&Node> = self
            .nodes
            .iter()
            .filter(|n| {
                n.path
                    .strip_prefix("/cpus/")
                    .is_some_and(|rest| rest.starts_with("cpu@") && !rest.contains('/'))
            })
            .collect();

        let [cpu] = cpus.as_slice() else {
            return Err(BuildError::bad_topology(
                "/cpus",
                format!("expected exactly 1 'cpu' node, but topology contains {}", cpus.len()),
            ));
        };

        let id = cpu.reg_addr()?.encode();
        ProcessorId::try_from(id).map_err(|e| BuildError::bad_topology(&cpu.path, e.to_string()))
    }

    /// GPIO port node with the given `port` property.
    ///
    /// # Errors
    ///
    /// Fails if no such node exists; `context` is appended to the message.
    pub fn gpio_node_by_port(&self, port: u32, context: &str) -> Result<NodeId> {
        self.by_compat(GPIO_COMPAT)
            .find(|&id| matches!(self[id].prop("port"), Some(Prop::Int(p)) if *p == port))
            .ok_or_else(|| {
                BuildError::bad_topology(
                    format!("gpio port {port}"),
                    format!("failed to find GPIO node with port {port}{context}"),
                )
            })
    }

    /// Owned channels of a split-ownership node with their security.
    ///
    /// Channels come from `<owned>` and `child-<owned>`. They take the node's
    /// security unless listed in `<nonsecure>`.
    ///
    /// # Errors
    ///
    /// Fails on malformed properties or undeterminable node security.
    pub fn split_channels(&self, id: NodeId, owned: &str, nonsecure: &str) -> Result<Vec<(u32, bool)>> {
        let node = &self[id];
        let mut channels = node.array_prop(owned)?;
        channels.extend(node.array_prop(&format!("child-{owned}"))?);

        if channels.is_empty() {
            return Ok(Vec::new());
        }

        let nonsecure = node.array_prop(nonsecure)?;
        let default_secure = self.is_secure(id)?;

        Ok(channels
            .into_iter()
            .map(|ch| (ch, default_secure && !nonsecure.contains(&ch)))
            .collect())
    }
}

impl TryFrom<TopologyFile> for Topology {
    type Error = BuildError;

    fn try_from(file: TopologyFile) -> Result<Self> {
        Self::new(file.nodes)
    }
}

impl Index<NodeId> for Topology {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }
}
