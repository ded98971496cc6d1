//! Stage declarations: order, names, dependencies, anti-cheat scope.

/// Every artifact the pipeline can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactId {
    RawCustomers,
    RawTransactions,
    Cleaned,
    Merged,
    Totals,
}

/// The four pipeline stages, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Load,
    Clean,
    Merge,
    Aggregate,
}

/// Declaration order; the report always follows it.
pub const PIPELINE: [StageKind; 4] = [
    StageKind::Load,
    StageKind::Clean,
    StageKind::Merge,
    StageKind::Aggregate,
];

impl StageKind {
    pub fn name(self) -> &'static str {
        match self {
            StageKind::Load => "Load",
            StageKind::Clean => "Clean",
            StageKind::Merge => "Merge",
            StageKind::Aggregate => "Aggregate",
        }
    }

    /// Artifacts this stage reads. Load reads none; Merge deliberately
    /// depends on the raw artifacts, not on Clean's output.
    pub fn dependencies(self) -> &'static [ArtifactId] {
        match self {
            StageKind::Load => &[],
            StageKind::Clean => &[ArtifactId::RawTransactions],
            StageKind::Merge => &[ArtifactId::RawTransactions, ArtifactId::RawCustomers],
            StageKind::Aggregate => &[ArtifactId::Merged],
        }
    }

    /// Whether the stage's contract is "derive an aggregate from input",
    /// the class of output where constant-return cheating is plausible.
    pub fn anticheat_applies(self) -> bool {
        matches!(self, StageKind::Aggregate)
    }
}
