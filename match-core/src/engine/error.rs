use thiserror::Error;

/// All failures the engine can report. `Display` renders the exact stable
/// strings the external gateway contract surfaces to clients, so callers can
/// match on the enum while still getting the right wording for free.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    #[error("Instrument not found")]
    InstrumentUnknown,
    #[error("Instrument is halted")]
    InstrumentHalted,
    #[error("Risk limit exceeded")]
    RiskExceeded,
    #[error("Invalid quantity")]
    InvalidQuantity,
    #[error("Order not found")]
    OrderNotFound,
    #[error("Not the order owner")]
    NotOrderOwner,
    #[error("Order is not modifiable")]
    OrderNotModifiable,
    #[error("Duplicate instrument id")]
    DuplicateInstrument,
    #[error("Reference instrument not found")]
    ReferenceInstrumentUnknown,
}
