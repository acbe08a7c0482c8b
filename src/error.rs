use thiserror::Error;

/// Host-level failures of the mu_ interpreter.
///
/// The language itself has no error values: evaluation is total. These
/// variants cover resource exhaustion and embedder misuse at the Rust
/// boundary, surfaced before any mu_ state becomes observable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MuError {
    /// The cons heap reached its configured capacity.
    #[error("cons heap exhausted ({0} cells)")]
    HeapExhausted(usize),

    /// The string yard or internment table ran out of encodable space.
    #[error("string yard or internment table exhausted")]
    InternExhausted,

    /// A system operation was registered under an atom with no
    /// internment record.
    #[error("system operation name is not an interned atom")]
    NotInterned,

    /// No opcodes left for system-operation registration.
    #[error("system operation table full")]
    SysOpsExhausted,
}

pub type MuResult<T> = Result<T, MuError>;
