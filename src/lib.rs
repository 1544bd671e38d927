pub mod catalog;
pub mod cpu;
pub mod decoder;
pub mod disasm;
pub mod fastio;
pub mod ihex;
pub mod instructions;
pub mod memory;
pub mod pattern;

pub use catalog::{Catalog, CatalogError, Fields, Form, Instruction, OperandKind};
pub use cpu::{CpuVariant, Register};
pub use decoder::{Decoder, Match};
pub use disasm::{Decoded, DisasmConfig, DisasmError, Disassembler, SymbolTable};
pub use memory::WideMemory;
