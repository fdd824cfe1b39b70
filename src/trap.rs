use crate::host::HostError;
use alloc::boxed::Box;
use alloc::string::String;
use core::fmt;

/// Error type which can be thrown by wasm code or by the host environment.
///
/// Under some conditions, wasm execution may produce a trap, which
/// immediately aborts the current invocation. Traps can't be handled by
/// WebAssembly code, but are reported to the embedder.
#[derive(Debug)]
pub struct Trap {
    code: TrapCode,
    message: Option<String>,
}

impl Trap {
    /// Create a new trap of the given kind.
    pub fn new(code: TrapCode) -> Trap {
        Trap {
            code,
            message: None,
        }
    }

    /// Create a new trap carrying an additional message, typically
    /// including the pc of the faulting instruction.
    pub fn with_message<M: Into<String>>(code: TrapCode, message: M) -> Trap {
        Trap {
            code,
            message: Some(message.into()),
        }
    }

    /// Returns the kind of this trap.
    pub fn code(&self) -> &TrapCode {
        &self.code
    }

    /// Converts into the kind of this trap.
    pub fn into_code(self) -> TrapCode {
        self.code
    }

    /// Whether this trap was raised by a host function.
    pub fn is_host(&self) -> bool {
        matches!(self.code, TrapCode::Host(_))
    }
}

impl fmt::Display for Trap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {}", self.code, message),
            None => write!(f, "{}", self.code),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Trap {}

/// Kind of a [`Trap`].
///
/// Each kind corresponds to one of the defined runtime failures of the
/// WebAssembly execution semantics, plus the host escape hatches.
#[derive(Debug)]
pub enum TrapCode {
    /// Wasm code executed the `unreachable` opcode.
    Unreachable,

    /// Attempt to divide an integer by zero.
    IntegerDivideByZero,

    /// Signed division (or remainder) of `INT_MIN` by `-1`, whose result
    /// is not representable.
    IntegerOverflow,

    /// Truncation of a NaN or an out-of-range float to an integer.
    InvalidConversionToInt,

    /// A load or store outside the bounds of a linear memory.
    ///
    /// Addresses are unsigned, so negative offsets cannot occur; the
    /// effective address computation is performed without wrap-around.
    MemoryAccessOutOfBounds,

    /// A table access outside the bounds of the table.
    TableAccessOutOfBounds,

    /// A `memory.init` source range outside the (possibly dropped) data
    /// segment.
    DataAccessOutOfBounds,

    /// A `table.init` source range outside the (possibly dropped) element
    /// segment.
    ElementAccessOutOfBounds,

    /// `call_indirect` with a table index past the end of the table.
    IndirectCallOutOfBounds,

    /// `call_indirect` through a null funcref.
    IndirectCallNullFuncref,

    /// `call_indirect` through a function whose type does not match the
    /// expected function type. This check happens at run time regardless
    /// of static validation.
    IndirectCallTypeMismatch,

    /// Use of a table element which holds no function.
    UninitializedElement,

    /// The configured call depth or value stack budget was exceeded.
    ///
    /// This is likely caused by some infinite or very deep recursion.
    CallStackExhausted,

    /// An invocation (direct, host, or embedder-driven) was performed
    /// with values not matching the function signature.
    UnexpectedSignature,

    /// The guest requested termination with the given exit code.
    ///
    /// Raised by host layers implementing `proc_exit`-style calls; the
    /// code is reported through [`FuncInvocation::exit_code`].
    ///
    /// [`FuncInvocation::exit_code`]: crate::FuncInvocation::exit_code
    VoluntaryExit(u32),

    /// Error specified by the host.
    Host(Box<dyn HostError>),
}

impl TrapCode {
    /// Returns the trap message as specified by the WebAssembly
    /// specification.
    pub fn trap_message(&self) -> &'static str {
        match self {
            TrapCode::Unreachable => "unreachable",
            TrapCode::IntegerDivideByZero => "integer divide by zero",
            TrapCode::IntegerOverflow => "integer overflow",
            TrapCode::InvalidConversionToInt => "invalid conversion to integer",
            TrapCode::MemoryAccessOutOfBounds => "out of bounds memory access",
            TrapCode::TableAccessOutOfBounds => "out of bounds table access",
            TrapCode::DataAccessOutOfBounds => "out of bounds data access",
            TrapCode::ElementAccessOutOfBounds => "out of bounds element access",
            TrapCode::IndirectCallOutOfBounds => "undefined element",
            TrapCode::IndirectCallNullFuncref => "uninitialized element",
            TrapCode::IndirectCallTypeMismatch => "indirect call type mismatch",
            TrapCode::UninitializedElement => "uninitialized element",
            TrapCode::CallStackExhausted => "call stack exhausted",
            TrapCode::UnexpectedSignature => "unexpected signature",
            TrapCode::VoluntaryExit(_) => "voluntary exit",
            TrapCode::Host(_) => "host error",
        }
    }

    /// Whether this trap is specified by the host.
    pub fn is_host(&self) -> bool {
        matches!(self, TrapCode::Host(_))
    }
}

impl fmt::Display for TrapCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TrapCode::VoluntaryExit(code) => write!(f, "voluntary exit (code {})", code),
            TrapCode::Host(host) => write!(f, "{}", host),
            other => write!(f, "{}", other.trap_message()),
        }
    }
}

impl From<TrapCode> for Trap {
    fn from(code: TrapCode) -> Trap {
        Trap::new(code)
    }
}
