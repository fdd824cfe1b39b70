//! # wasmine
//!
//! A validating WebAssembly interpreter.
//!
//! The crate consumes parsed modules (the binary-format parser is an
//! external collaborator producing the [`Module`] data model), validates
//! them against the core specification, instantiates them (linking
//! imports and initialising memories, tables and globals) and executes
//! their functions.
//!
//! # Design
//!
//! Function bodies are executed in place: instructions are addressed by
//! their byte offset within the module binary (the *pc*), and the
//! validator precomputes per-function jump tables, cell-width
//! annotations for value-polymorphic opcodes and stack high-water marks
//! so that the engine never re-derives block structure at run time.
//! Validation and execution share a single instruction-decoding
//! skeleton, so the two cannot disagree about the opcode space.
//!
//! Values live on a dense stack of uniform 64-bit cells: scalars occupy
//! one cell, a `v128` two. Execution is resumable: blocking host calls
//! can park a restart record and hand control back to the embedder, and
//! a cancellation flag is polled on a configurable cadence.
//!
//! # Usage
//!
//! ```rust
//! use wasmine::{
//!     validate_module, Expr, Features, FuncEntry, FuncType, ImportsBuilder, Module,
//!     ModuleInstance, NopExternals, Value, ValueType,
//! };
//!
//! // A module with one exported function returning the i32 constant
//! // 1337. Function bodies are raw binary-format bytes; real embedders
//! // get the whole structure from the binary parser.
//! let mut module = Module::default();
//! module.types.push(FuncType::new(&[][..], &[ValueType::I32][..]));
//! module.funcs.push(FuncEntry {
//!     type_idx: 0,
//!     locals: Vec::new(),
//!     // i32.const 1337; end
//!     body: Expr::new(vec![0x41, 0xB9, 0x0A, 0x0B], 0),
//! });
//! module.exports.push(wasmine::Export {
//!     field: "test".into(),
//!     idx: wasmine::ExternIdx::Func(0),
//! });
//!
//! let validated = validate_module(module, Features::new()).expect("validation failed");
//! let instance = ModuleInstance::new(&validated, &ImportsBuilder::default())
//!     .expect("instantiation failed")
//!     .assert_no_start();
//!
//! let result = instance
//!     .invoke_export("test", &[], &mut NopExternals)
//!     .expect("execution failed");
//! assert_eq!(result, vec![Value::I32(1337)]);
//! ```

#![warn(missing_docs)]
#![cfg_attr(not(feature = "std"), no_std)]
#![allow(clippy::len_without_is_empty)]
#![allow(clippy::new_ret_no_self)]

#[cfg(not(feature = "std"))]
#[macro_use]
extern crate alloc;
#[cfg(feature = "std")]
extern crate std as alloc;

#[cfg(feature = "std")]
#[macro_use]
extern crate core;

use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use core::fmt;

mod decode;
mod features;
mod func;
mod global;
mod host;
mod imports;
mod instance;
mod memory;
mod module;
mod runner;
mod stack;
mod table;
mod trap;
mod types;
mod untyped;
mod validation;
mod value;

pub mod isa;
pub mod leb128;
pub mod nan_preserving_float;
pub mod v128;

pub use self::features::{
    Config, Features, StackLimits, DEFAULT_CALL_STACK_LIMIT, DEFAULT_VALUE_STACK_LIMIT,
};
pub use self::func::{FuncInstance, FuncInvocation, FuncRef};
pub use self::global::{GlobalInstance, GlobalRef};
pub use self::host::{
    Externals, HostCall, HostControl, HostError, NopExternals, RestartRecord, RuntimeArgs,
};
pub use self::imports::{ImportResolver, ImportsBuilder, ModuleImportResolver};
pub use self::instance::{ExternVal, ModuleInstance, ModuleRef, NotStartedModuleRef};
pub use self::memory::{MemoryInstance, MemoryRef, LINEAR_MEMORY_PAGE_SIZE};
pub use self::module::{
    ConstExpr, DataKind, DataSegment, ElemItem, ElemKind, ElemSegment, ExecInfo, Export, Expr,
    ExternIdx, FuncBody, FuncEntry, GlobalEntry, Import, ImportDesc, Jump, Module, TypeAnnotation,
    ValidatedModule,
};
pub use self::runner::InvokeOutcome;
pub use self::table::{TableInstance, TableRef};
pub use self::trap::{Trap, TrapCode};
pub use self::types::{
    BlockType, FuncType, GlobalDescriptor, GlobalType, Limits, MemoryDescriptor, MemoryType,
    TableDescriptor, TableType,
};
pub use self::untyped::UntypedValue;
pub use self::v128::V128;
pub use self::validation::{validate_module, Error as ValidationError};
pub use self::value::{ExternRef, FromValue, Value, ValueType};

/// WebAssembly-specific sizes and units.
pub mod memory_units {
    pub use memory_units::wasm32::*;
    pub use memory_units::{size_of, ByteSize, Bytes, RoundUpTo};
}

/// Internal interpreter error.
#[derive(Debug)]
pub enum Error {
    /// Module validation error. Might occur only at load time.
    Validation(String),
    /// Error while instantiating a module. Might occur when provided
    /// with incorrect exports (i.e. linkage failure).
    Instantiation(String),
    /// Function-level error.
    Function(String),
    /// Table-level error.
    Table(String),
    /// Memory-level error.
    Memory(String),
    /// Global-level error.
    Global(String),
    /// Value-level error.
    Value(String),
    /// Trap.
    Trap(Trap),
    /// Execution was cancelled through the interrupt flag. The instance
    /// stays usable.
    Interrupted,
    /// Custom embedder error.
    Host(Box<dyn HostError>),
}

impl Error {
    /// Returns a reference to a [`HostError`] if this `Error` represents
    /// one, either directly or wrapped in a host [`Trap`].
    pub fn as_host_error(&self) -> Option<&dyn HostError> {
        match self {
            Error::Host(host_err) => Some(&**host_err),
            Error::Trap(trap) => match trap.code() {
                TrapCode::Host(host_err) => Some(&**host_err),
                _ => None,
            },
            _ => None,
        }
    }

    /// Returns the [`Trap`] if this `Error` wraps one.
    pub fn as_trap(&self) -> Option<&Trap> {
        match self {
            Error::Trap(trap) => Some(trap),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Validation(s) => write!(f, "Validation: {}", s),
            Error::Instantiation(s) => write!(f, "Instantiation: {}", s),
            Error::Function(s) => write!(f, "Function: {}", s),
            Error::Table(s) => write!(f, "Table: {}", s),
            Error::Memory(s) => write!(f, "Memory: {}", s),
            Error::Global(s) => write!(f, "Global: {}", s),
            Error::Value(s) => write!(f, "Value: {}", s),
            Error::Trap(t) => write!(f, "Trap: {}", t),
            Error::Interrupted => write!(f, "Interrupted"),
            Error::Host(e) => write!(f, "User: {}", e),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

impl<U> From<U> for Error
where
    U: HostError + Sized,
{
    fn from(e: U) -> Self {
        Error::Host(Box::new(e))
    }
}

impl From<Trap> for Error {
    fn from(e: Trap) -> Error {
        Error::Trap(e)
    }
}

impl From<validation::Error> for Error {
    fn from(e: validation::Error) -> Error {
        Error::Validation(format!("{}", e))
    }
}
