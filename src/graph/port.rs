use crate::data::DatasetKind;

/// How many connections an input port takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortArity {
    Single,
    Repeatable,
}

/// Input port declaration: arity, optionality, and the dataset kinds the
/// port accepts. `accepts == None` means any kind.
///
/// This declaration is the compile-time-checkable half of the node
/// contract; the builder consults it before accepting an edge.
#[derive(Debug, Clone)]
pub struct InputPort {
    pub arity: PortArity,
    pub optional: bool,
    pub accepts: Option<Vec<DatasetKind>>,
}

impl InputPort {
    pub fn single(kinds: &[DatasetKind]) -> Self {
        Self {
            arity: PortArity::Single,
            optional: false,
            accepts: Some(kinds.to_vec()),
        }
    }

    pub fn repeatable(kinds: &[DatasetKind]) -> Self {
        Self {
            arity: PortArity::Repeatable,
            optional: false,
            accepts: Some(kinds.to_vec()),
        }
    }

    /// A single-connection port accepting any dataset kind.
    pub fn single_any() -> Self {
        Self {
            arity: PortArity::Single,
            optional: false,
            accepts: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    fn accepts_kind(&self, kind: DatasetKind) -> bool {
        match &self.accepts {
            None => true,
            Some(kinds) => kinds.contains(&DatasetKind::Any) || kinds.contains(&kind),
        }
    }

    /// Wiring compatibility with an upstream port's declared kind.
    ///
    /// `Any` outputs are accepted everywhere (the concrete kind is unknown
    /// until runtime), and `Composite` outputs are accepted by leaf-typed
    /// ports because the executive fans composite containers out over the
    /// node's single-dataset path.
    pub fn compatible(&self, kind: DatasetKind) -> bool {
        kind == DatasetKind::Any || kind == DatasetKind::Composite || self.accepts_kind(kind)
    }

    /// Whether a dataset of `kind` arriving at runtime must be fanned out
    /// leaf by leaf instead of handed to the node whole.
    pub fn wants_fan_out(&self, kind: DatasetKind) -> bool {
        kind == DatasetKind::Composite && !self.accepts_kind(DatasetKind::Composite)
    }
}

/// Output port declaration: the dataset kind the port produces, `Any` when
/// the node cannot say statically.
#[derive(Debug, Clone, Copy)]
pub struct OutputPort {
    pub kind: DatasetKind,
}

impl OutputPort {
    pub fn of(kind: DatasetKind) -> Self {
        Self { kind }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_acceptance() {
        let port = InputPort::single(&[DatasetKind::Structured]);
        assert!(port.compatible(DatasetKind::Structured));
        assert!(!port.compatible(DatasetKind::Table));
        // Composite is compatible via fan-out, Any via late binding.
        assert!(port.compatible(DatasetKind::Composite));
        assert!(port.compatible(DatasetKind::Any));
    }

    #[test]
    fn test_fan_out_detection() {
        let leaf_port = InputPort::single(&[DatasetKind::Structured]);
        assert!(leaf_port.wants_fan_out(DatasetKind::Composite));
        assert!(!leaf_port.wants_fan_out(DatasetKind::Structured));

        let composite_port = InputPort::single(&[DatasetKind::Composite]);
        assert!(!composite_port.wants_fan_out(DatasetKind::Composite));

        let any_port = InputPort::single_any();
        assert!(!any_port.wants_fan_out(DatasetKind::Composite));
    }
}
