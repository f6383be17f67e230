//! Configuration actions and their C rendering.

use std::collections::HashMap;
use std::fmt;

use periphconf_chip::Address;

/// A macro argument.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Arg {
    /// Peripheral address. Rendered through the node label when one is
    /// known for it.
    Address(Address),
    /// Boolean.
    Bool(bool),
    /// C enumerator (`NRF_OWNER_APPLICATION`, ...).
    Enum(String),
    /// Integer.
    Integer(u32),
    /// IRQ number of the `index`-th interrupt of the labelled node.
    IrqNumber {
        /// Node label.
        label: String,
        /// Interrupt index.
        index: u32,
    },
}

impl Arg {
    fn fmt_with(&self, node_labels: &HashMap<u32, String>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address(addr) => match node_labels.get(&addr.encode()) {
                Some(label) => write!(f, "DT_REG_ADDR(DT_NODELABEL({label}))"),
                None => write!(f, "0x{:08x}UL", addr.encode()),
            },
            Self::Bool(b) => write!(f, "{b}"),
            Self::Enum(e) => f.write_str(e),
            Self::Integer(i) => write!(f, "{i}"),
            Self::IrqNumber { label, index } => {
                write!(f, "DT_IRQN_BY_IDX(DT_NODELABEL({label}), {index})")
            }
        }
    }
}

impl From<Address> for Arg {
    fn from(addr: Address) -> Self {
        Self::Address(addr)
    }
}

impl From<bool> for Arg {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<u32> for Arg {
    fn from(i: u32) -> Self {
        Self::Integer(i)
    }
}

/// One configuration action: a call to a UICR macro.
///
/// Calls order by name, then arguments. The builder sorts its output by this
/// order so that rendering does not depend on topology traversal order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MacroCall {
    /// Macro name.
    pub name: &'static str,
    /// Arguments.
    pub args: Vec<Arg>,
    /// Comment rendered above the call.
    pub comment: Option<String>,
}

impl MacroCall {
    /// Create a call with a comment.
    pub fn new(name: &'static str, args: Vec<Arg>, comment: impl Into<String>) -> Self {
        Self {
            name,
            args,
            comment: Some(comment.into()),
        }
    }

    /// C source for this call, resolving addresses through `node_labels`.
    pub fn display<'m>(&'m self, node_labels: &'m HashMap<u32, String>) -> RenderedCall<'m> {
        RenderedCall { call: self, node_labels }
    }

    /// Render as C, resolving addresses through `node_labels`.
    pub fn render(&self, node_labels: &HashMap<u32, String>) -> String {
        self.display(node_labels).to_string()
    }
}

/// [`MacroCall`] paired with the node labels used to render it.
#[derive(Debug, Clone, Copy)]
pub struct RenderedCall<'m> {
    call: &'m MacroCall,
    node_labels: &'m HashMap<u32, String>,
}

impl fmt::Display for RenderedCall<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(comment) = &self.call.comment {
            writeln!(f, "/* {comment} */")?;
        }
        write!(f, "{}(", self.call.name)?;
        for (i, arg) in self.call.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            arg.fmt_with(self.node_labels, f)?;
        }
        f.write_str(");")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_labels_hex_and_bools() {
        let call = MacroCall::new(
            "UICR_SPU_PERIPH_PERM_SET",
            vec![
                Address::decode(0x5F8E_0000).into(),
                14.into(),
                true.into(),
                false.into(),
                Arg::Enum("NRF_OWNER_APPLICATION".into()),
            ],
            "SPU120: uart120 permissions",
        );
        assert_eq!(
            call.render(&HashMap::new()),
            "/* SPU120: uart120 permissions */\n\
             UICR_SPU_PERIPH_PERM_SET(0x5f8e0000UL, 14, true, false, NRF_OWNER_APPLICATION);"
        );

        let labels = HashMap::from([(0x5F8E_0000, "spu120".to_string())]);
        assert!(call
            .render(&labels)
            .contains("UICR_SPU_PERIPH_PERM_SET(DT_REG_ADDR(DT_NODELABEL(spu120)), 14,"));
        assert_eq!(format!("{}", call.display(&labels)), call.render(&labels));
    }

    #[test]
    fn renders_irq_number_without_comment() {
        let call = MacroCall {
            name: "UICR_IRQMAP_IRQ_SINK_SET",
            args: vec![
                Arg::IrqNumber { label: "uart120".into(), index: 0 },
                Arg::Enum("NRF_PROCESSOR_APPLICATION".into()),
            ],
            comment: None,
        };
        assert_eq!(
            call.render(&HashMap::new()),
            "UICR_IRQMAP_IRQ_SINK_SET(DT_IRQN_BY_IDX(DT_NODELABEL(uart120), 0), NRF_PROCESSOR_APPLICATION);"
        );
    }

    #[test]
    fn orders_by_name_then_args() {
        let a = MacroCall::new("A", vec![2.into()], "z");
        let b = MacroCall::new("A", vec![10.into()], "a");
        let c = MacroCall::new("B", vec![0.into()], "a");
        let mut calls = vec![c.clone(), b.clone(), a.clone()];
        calls.sort();
        assert_eq!(calls, vec![a, b, c]);
    }
}
