/// Proposal gates and engine tuning knobs recognised by the runtime.
///
/// Proposal flags are checked during validation: a module using a gated
/// opcode page while the gate is off is rejected. Execution never
/// re-checks them since only validated code runs.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Features {
    /// Accept the SIMD opcode page (prefix 0xFD) and the `v128` type.
    pub simd: bool,
    /// Accept the atomics opcode page (prefix 0xFE) and shared memories.
    pub threads: bool,
    /// Accept `return_call` / `return_call_indirect` (0x12 / 0x13).
    pub tail_call: bool,
    /// Accept non-zero memory indexes in memory-op immediates and more
    /// than one memory per module.
    pub multi_memory: bool,
    /// Prefer the compact 32-bit cell layout.
    ///
    /// Recognised for configuration compatibility; the current engine
    /// always uses the uniform 64-bit cell representation.
    pub small_cells: bool,
    /// Let the engine pick a fetch-execute path separate from the
    /// validator's.
    ///
    /// Recognised for configuration compatibility; both paths already
    /// share a single dispatch here.
    pub separate_execute: bool,
}

impl Features {
    /// The MVP feature set: every proposal gate off.
    pub fn new() -> Features {
        Features {
            simd: false,
            threads: false,
            tail_call: false,
            multi_memory: false,
            small_cells: false,
            separate_execute: false,
        }
    }

    /// Every supported proposal enabled.
    pub fn all() -> Features {
        Features {
            simd: true,
            threads: true,
            tail_call: true,
            multi_memory: true,
            small_cells: false,
            separate_execute: false,
        }
    }
}

impl Default for Features {
    fn default() -> Features {
        Features::new()
    }
}

/// Bounds on the run-time stacks.
///
/// Exhausting any of them raises the `call stack exhausted` trap rather
/// than aborting the embedding process.
#[derive(Debug, Copy, Clone)]
pub struct StackLimits {
    /// Maximum number of 64-bit cells on the value stack.
    pub value_cells: usize,
    /// Maximum number of simultaneously active call frames.
    pub call_frames: usize,
    /// Maximum number of simultaneously active labels.
    pub labels: usize,
}

/// Maximum number of cells on the value stack.
pub const DEFAULT_VALUE_STACK_LIMIT: usize = 256 * 1024;

/// Maximum number of levels on the call stack.
pub const DEFAULT_CALL_STACK_LIMIT: usize = 64 * 1024;

impl Default for StackLimits {
    fn default() -> StackLimits {
        StackLimits {
            value_cells: DEFAULT_VALUE_STACK_LIMIT,
            call_frames: DEFAULT_CALL_STACK_LIMIT,
            labels: DEFAULT_CALL_STACK_LIMIT,
        }
    }
}

/// Engine configuration: proposal gates, stack bounds and the interrupt
/// polling cadence.
#[derive(Debug, Copy, Clone)]
pub struct Config {
    /// Proposal gates applied at validation time.
    pub features: Features,
    /// Run-time stack bounds.
    pub stack_limits: StackLimits,
    /// Cadence, in milliseconds, at which blocking host operations
    /// re-check the interrupt flag. The main loop additionally polls the
    /// flag on an instruction-count cadence.
    pub interrupt_check_interval_ms: u32,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            features: Features::default(),
            stack_limits: StackLimits::default(),
            interrupt_check_interval_ms: 100,
        }
    }
}
