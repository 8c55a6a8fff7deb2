// Escrow flow coordination: unsigned instructions and the prepare/confirm protocol.

pub mod coordinator;
pub mod instruction;

pub use coordinator::{EscrowCoordinator, EscrowSettings};
pub use instruction::{to_minor_units, InstructionKind, UnsignedInstruction, MINOR_UNITS_PER_MAJOR};
