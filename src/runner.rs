//! The execution engine.
//!
//! An [`Interpreter`] is one execution context: the cell value stack,
//! the label and frame stacks, the current pc and a pending event. The
//! driver loop alternates between dispatching instructions through the
//! shared decoder and processing the control events they queue: branch
//! unwinding, frame entry and exit, tail calls and host calls.
//!
//! Instructions are addressed by their byte offset in the module binary
//! (`pc`); branch targets come from the validator's jump table and the
//! parameter/result arities of a branch target are recovered by
//! re-reading its blocktype with the unchecked readers.

use crate::decode::{dispatch, InsnContext, MemArg};
use crate::features::{Config, Features, StackLimits};
use crate::func::{FuncInstanceInternal, FuncRef};
use crate::host::{Externals, HostCall, HostControl, RestartRecord};
use crate::instance::ModuleRef;
use crate::leb128;
use crate::memory::MemoryRef;
use crate::module::FuncBody;
use crate::stack::{Cell, ValueStack};
use crate::table::TableInstance;
use crate::types::BlockType;
use crate::untyped::UntypedValue;
use crate::v128::V128;
use crate::value::{Value, ValueType};
use crate::{Error, Trap, TrapCode};
use alloc::format;
use alloc::rc::Rc;
use alloc::vec::Vec;
use memory_units::wasm32::Pages;

/// Instruction-count cadence of interrupt-flag polls in the main loop.
const INTERRUPT_CHECK_PERIOD: u32 = 4096;

/// How an invocation left the execution loop.
#[derive(Debug)]
pub enum InvokeOutcome {
    /// The function returned these values.
    Finished(Vec<Value>),
    /// A host call pushed a restart record and asked to be re-entered.
    Restartable,
    /// A host call yielded to the embedder.
    Suspended,
    /// The interrupt flag was observed; the restart stack was cleared
    /// and the invocation unwound. The instance stays usable.
    Interrupted,
}

/// Internal non-local control flow of the execution loop. An explicit
/// value, not an unwinding mechanism.
pub(crate) enum Signal {
    Trap(Trap),
    Restart,
    Suspended,
    Interrupted,
}

impl From<Trap> for Signal {
    fn from(trap: Trap) -> Signal {
        Signal::Trap(trap)
    }
}

impl From<TrapCode> for Signal {
    fn from(code: TrapCode) -> Signal {
        Signal::Trap(Trap::new(code))
    }
}

/// Pending work queued by an instruction for the driver loop.
enum Event {
    None,
    Branch { index: u32, goto_else: bool },
    Call(FuncRef),
    ReturnCall(FuncRef),
    Exit,
}

/// A control-flow label: the pc of its `block`/`loop`/`if` opcode and
/// the cell height at its entry (parameters included).
#[derive(Copy, Clone)]
struct Label {
    pc: u32,
    height: u32,
}

/// A function activation record.
struct Frame {
    body: Rc<FuncBody>,
    /// Label-stack length at frame entry.
    labels_base: usize,
    /// Cell index of the locals region base.
    height: usize,
    result_cells: u32,
    ret_pc: u32,
    /// Caller instance and body; `None` in the outermost frame.
    ret: Option<(ModuleRef, Rc<FuncBody>)>,
}

enum BlockOp {
    Block,
    Loop,
    If,
}

/// One execution context.
pub(crate) struct Interpreter {
    value_stack: ValueStack,
    labels: Vec<Label>,
    frames: Vec<Frame>,
    instance: ModuleRef,
    body: Rc<FuncBody>,
    pc: u32,
    insn_pc: u32,
    event: Event,
    restart: Vec<RestartRecord>,
    #[cfg(feature = "std")]
    interrupt: Option<alloc::sync::Arc<core::sync::atomic::AtomicBool>>,
    insn_counter: u32,
    exit_code: Option<u32>,
    limits: StackLimits,
    interrupt_interval_ms: u32,
    features: Features,
    return_types: Vec<ValueType>,
}

impl Interpreter {
    pub(crate) fn new(func: &FuncRef, args: &[Value], config: &Config) -> Result<Interpreter, Error> {
        let body = func
            .body()
            .expect("only wasm functions are driven by an interpreter");
        let instance = func.module().expect("wasm functions have a module");
        let features = instance.features();

        let mut value_stack = ValueStack::new(config.stack_limits.value_cells);
        for arg in args {
            value_stack
                .push_value(arg.clone())
                .map_err(|code| Error::Trap(Trap::new(code)))?;
        }

        let return_types = body.func_type.results().to_vec();
        let frame = Frame {
            body: Rc::clone(&body),
            labels_base: 0,
            height: 0,
            result_cells: body.func_type.result_cells(),
            ret_pc: 0,
            ret: None,
        };

        let mut interpreter = Interpreter {
            value_stack,
            labels: Vec::new(),
            frames: alloc::vec![frame],
            instance,
            pc: body.expr.base_pc(),
            insn_pc: body.expr.base_pc(),
            body: Rc::clone(&body),
            event: Event::None,
            restart: Vec::new(),
            #[cfg(feature = "std")]
            interrupt: None,
            insn_counter: 0,
            exit_code: None,
            limits: config.stack_limits,
            interrupt_interval_ms: config.interrupt_check_interval_ms,
            features,
            return_types,
        };
        interpreter
            .enter_body(&body)
            .map_err(|code| Error::Trap(Trap::new(code)))?;
        Ok(interpreter)
    }

    /// Reserves operand-stack room and zero-initialises the declared
    /// locals of the function about to run. The parameters are already
    /// on the stack.
    fn enter_body(&mut self, body: &FuncBody) -> Result<(), TrapCode> {
        let param_cells = body.func_type.param_cells();
        self.value_stack
            .ensure((body.info.max_cells - param_cells) as usize)?;
        let params = body.func_type.params().len();
        for ty in &body.local_types[params..] {
            match ty {
                ValueType::FuncRef => self.value_stack.push_funcref(None)?,
                ValueType::ExternRef => self.value_stack.push_externref(None)?,
                ValueType::V128 => self.value_stack.push_v128(V128::zero())?,
                _ => self.value_stack.push_scalar(UntypedValue::from_bits(0))?,
            }
        }
        Ok(())
    }

    /// Installs the cancellation flag polled by the driver loop.
    #[cfg(feature = "std")]
    pub(crate) fn set_interrupt_flag(
        &mut self,
        flag: alloc::sync::Arc<core::sync::atomic::AtomicBool>,
    ) {
        self.interrupt = Some(flag);
    }

    /// The exit code recorded by a voluntary-exit trap.
    pub(crate) fn exit_code(&self) -> Option<u32> {
        self.exit_code
    }

    /// Runs until the outermost function returns or execution leaves
    /// the loop with a non-trap signal. Re-entering after a restart,
    /// suspension or host yield resumes the pending operation.
    pub(crate) fn run<E: Externals>(&mut self, externals: &mut E) -> Result<InvokeOutcome, Error> {
        match self.run_loop(externals) {
            Ok(()) => {
                let values = self.value_stack.peek_values(&self.return_types);
                self.value_stack.truncate(0);
                Ok(InvokeOutcome::Finished(values))
            }
            Err(Signal::Trap(trap)) => {
                if let TrapCode::VoluntaryExit(code) = trap.code() {
                    self.exit_code = Some(*code);
                }
                Err(Error::Trap(trap))
            }
            Err(Signal::Restart) => Ok(InvokeOutcome::Restartable),
            Err(Signal::Suspended) => Ok(InvokeOutcome::Suspended),
            Err(Signal::Interrupted) => {
                self.restart.clear();
                Ok(InvokeOutcome::Interrupted)
            }
        }
    }

    fn run_loop<E: Externals>(&mut self, externals: &mut E) -> Result<(), Signal> {
        loop {
            match core::mem::replace(&mut self.event, Event::None) {
                Event::None => {
                    self.insn_counter += 1;
                    if self.insn_counter >= INTERRUPT_CHECK_PERIOD {
                        self.insn_counter = 0;
                        self.check_interrupt()?;
                    }
                    self.insn_pc = self.pc;
                    dispatch(self)?;
                }
                Event::Branch { index, goto_else } => self.do_branch(index, goto_else)?,
                Event::Call(func) => self.do_call(func, false, externals)?,
                Event::ReturnCall(func) => self.do_call(func, true, externals)?,
                Event::Exit => {
                    if self.do_exit() {
                        return Ok(());
                    }
                }
            }
        }
    }

    fn check_interrupt(&mut self) -> Result<(), Signal> {
        #[cfg(feature = "std")]
        if let Some(flag) = &self.interrupt {
            if flag.load(core::sync::atomic::Ordering::Relaxed) {
                self.restart.clear();
                return Err(Signal::Interrupted);
            }
        }
        Ok(())
    }

    fn trap(&self, code: TrapCode) -> Signal {
        Signal::Trap(Trap::with_message(code, format!("at pc {}", self.insn_pc)))
    }

    fn cur_frame(&self) -> &Frame {
        self.frames
            .last()
            .expect("the outermost frame lives for the whole invocation")
    }

    fn memory(&self, memidx: u32) -> MemoryRef {
        self.instance
            .memory_by_index(memidx)
            .expect("memory indexes were checked during validation")
    }

    fn push_label(&mut self) -> Result<(), Signal> {
        if self.labels.len() >= self.limits.labels {
            return Err(self.trap(TrapCode::CallStackExhausted));
        }
        self.labels.push(Label {
            pc: self.insn_pc,
            height: self.value_stack.len() as u32,
        });
        Ok(())
    }

    /// Reads the blocktype of the block opcode at `pc` and resolves its
    /// parameter and result cell arities.
    fn read_block_header(&self, pc: u32) -> (BlockOp, u32, u32) {
        let base = self.body.expr.base_pc();
        let bytes = self.body.expr.bytes();
        let mut pos = (pc - base) as usize;
        let op = leb128::read_u8_nocheck(bytes, &mut pos);
        let raw = leb128::read_leb_s33_nocheck(bytes, &mut pos);
        let kind = match op {
            crate::isa::BLOCK => BlockOp::Block,
            crate::isa::LOOP => BlockOp::Loop,
            crate::isa::IF => BlockOp::If,
            _ => unreachable!("labels only address block opcodes"),
        };
        let bt = BlockType::from_s33(raw).expect("blocktypes were checked during validation");
        let (param_cells, result_cells) = match bt {
            BlockType::Empty => (0, 0),
            BlockType::Value(ty) => (0, ty.cell_count()),
            BlockType::TypeIndex(idx) => {
                let ty = self
                    .instance
                    .type_by_index(idx)
                    .expect("type indexes were checked during validation");
                (ty.param_cells(), ty.result_cells())
            }
        };
        (kind, param_cells, result_cells)
    }

    /// Processes a queued branch: pops `index` labels, unwinds the value
    /// stack to the target label and transfers control per the label's
    /// block kind. Branching past every label of the frame is the
    /// function return.
    fn do_branch(&mut self, index: u32, goto_else: bool) -> Result<(), Signal> {
        let labels_base = self.cur_frame().labels_base;
        let nlabels = self.labels.len() - labels_base;
        if index as usize >= nlabels {
            debug_assert_eq!(index as usize, nlabels);
            self.event = Event::Exit;
            return Ok(());
        }
        let label_idx = self.labels.len() - 1 - index as usize;
        let label = self.labels[label_idx];
        let (kind, param_cells, result_cells) = self.read_block_header(label.pc);

        if goto_else {
            // A failed `if` condition transfers into the false arm (or
            // straight to the `end` opcode), keeping the label alive.
            debug_assert_eq!(index, 0);
            let jump = self
                .body
                .info
                .jump(label.pc)
                .expect("every `if` has a jump entry");
            self.labels.truncate(label_idx + 1);
            self.pc = jump.else_target;
            return Ok(());
        }

        let dest = (label.height - param_cells) as usize;
        match kind {
            BlockOp::Loop => {
                // Transfer the parameters back to the loop entry; the
                // loop opcode re-pushes its label on re-execution.
                self.value_stack.rewind(dest, param_cells as usize);
                self.labels.truncate(label_idx);
                self.pc = label.pc;
            }
            BlockOp::Block | BlockOp::If => {
                let jump = self
                    .body
                    .info
                    .jump(label.pc)
                    .expect("every block and if has a jump entry");
                self.value_stack.rewind(dest, result_cells as usize);
                self.labels.truncate(label_idx);
                self.pc = jump.target;
            }
        }
        Ok(())
    }

    /// Pops the current frame, rewinding the stack to the frame's
    /// result region, and resumes the caller. Returns `true` when the
    /// outermost frame finished.
    fn do_exit(&mut self) -> bool {
        let frame = self
            .frames
            .pop()
            .expect("exit events only arise inside a frame");
        self.labels.truncate(frame.labels_base);
        self.value_stack
            .rewind(frame.height, frame.result_cells as usize);
        match frame.ret {
            Some((instance, body)) => {
                self.instance = instance;
                self.body = body;
                self.pc = frame.ret_pc;
                false
            }
            None => true,
        }
    }

    fn do_call<E: Externals>(
        &mut self,
        func: FuncRef,
        tail: bool,
        externals: &mut E,
    ) -> Result<(), Signal> {
        match func.as_internal() {
            FuncInstanceInternal::Internal { .. } => self.call_wasm(func, tail),
            FuncInstanceInternal::Host {
                func_type,
                host_func_index,
            } => {
                let func_type = Rc::clone(func_type);
                let host_func_index = *host_func_index;
                self.call_host(func, func_type, host_func_index, tail, externals)
            }
        }
    }

    fn call_wasm(&mut self, func: FuncRef, tail: bool) -> Result<(), Signal> {
        let body = func.body().expect("checked by the caller");
        let callee_instance = func.module().expect("wasm functions have a module");
        let param_cells = body.func_type.param_cells();
        let result_cells = body.func_type.result_cells();

        if tail {
            // Reuse the caller's frame slot: slide the arguments down to
            // the locals base and discard the frame's labels. The return
            // linkage stays with the original caller.
            let (dest, labels_base) = {
                let frame = self.cur_frame();
                (frame.height, frame.labels_base)
            };
            self.labels.truncate(labels_base);
            self.value_stack.rewind(dest, param_cells as usize);
            let frame = self
                .frames
                .last_mut()
                .expect("tail calls happen inside a frame");
            frame.body = Rc::clone(&body);
            frame.result_cells = result_cells;
        } else {
            if self.frames.len() >= self.limits.call_frames {
                return Err(self.trap(TrapCode::CallStackExhausted));
            }
            let height = self.value_stack.len() - param_cells as usize;
            self.frames.push(Frame {
                body: Rc::clone(&body),
                labels_base: self.labels.len(),
                height,
                result_cells,
                ret_pc: self.pc,
                ret: Some((self.instance.clone(), Rc::clone(&self.body))),
            });
        }

        self.enter_body(&body)
            .map_err(|_| self.trap(TrapCode::CallStackExhausted))?;
        self.instance = callee_instance;
        self.pc = body.expr.base_pc();
        self.body = body;
        Ok(())
    }

    fn call_host<E: Externals>(
        &mut self,
        func: FuncRef,
        func_type: Rc<crate::types::FuncType>,
        host_func_index: usize,
        tail: bool,
        externals: &mut E,
    ) -> Result<(), Signal> {
        // Parameters are peeked, not popped: a restarting call must find
        // the stack exactly as it left it.
        let args = self.value_stack.peek_values(func_type.params());
        let mut results: Vec<Value> = func_type
            .results()
            .iter()
            .map(|ty| Value::default(*ty))
            .collect();
        let control = {
            let call = HostCall::new(&args, &mut results, &mut self.restart);
            externals.invoke_index(host_func_index, call)
        };
        match control {
            Err(trap) => Err(Signal::Trap(trap)),
            Ok(HostControl::Done) => {
                for (value, expected) in results.iter().zip(func_type.results()) {
                    if value.value_type() != *expected {
                        return Err(self.trap(TrapCode::UnexpectedSignature));
                    }
                }
                self.value_stack
                    .drop_cells(func_type.param_cells() as usize);
                for value in results {
                    self.value_stack.push_value(value)?;
                }
                if tail {
                    // The callee's results become the frame's results.
                    self.event = Event::Exit;
                }
                Ok(())
            }
            Ok(HostControl::Restart) => {
                // Keep the call pending so that re-entering the loop
                // re-issues it with the stack untouched.
                self.event = if tail {
                    Event::ReturnCall(func)
                } else {
                    Event::Call(func)
                };
                Err(Signal::Restart)
            }
            Ok(HostControl::Suspend) => {
                self.event = if tail {
                    Event::ReturnCall(func)
                } else {
                    Event::Call(func)
                };
                Err(Signal::Suspended)
            }
        }
    }

    // Unchecked immediate readers over the current function body.

    fn read_u8_at_pc(&mut self) -> u8 {
        let base = self.body.expr.base_pc();
        let mut pos = (self.pc - base) as usize;
        let value = leb128::read_u8_nocheck(self.body.expr.bytes(), &mut pos);
        self.pc = base + pos as u32;
        value
    }

    fn read_leb_u32_at_pc(&mut self) -> u32 {
        let base = self.body.expr.base_pc();
        let mut pos = (self.pc - base) as usize;
        let value = leb128::read_leb_u32_nocheck(self.body.expr.bytes(), &mut pos);
        self.pc = base + pos as u32;
        value
    }

    fn effective_address(&self, memarg: &MemArg) -> u64 {
        let addr = u32::from(self.value_stack.peek_scalar(0));
        addr as u64 + memarg.offset as u64
    }
}

/// Builds the scalar cell for a loaded value: zero- or sign-extends the
/// raw little-endian bytes to the full operand width.
fn extend_loaded(ty: ValueType, width: u32, signed: bool, raw: u64) -> UntypedValue {
    match (ty, signed) {
        (ValueType::I32, false) => UntypedValue::from(raw as u32),
        (ValueType::I32, true) => match width {
            1 => UntypedValue::from((raw as u8 as i8) as i32),
            2 => UntypedValue::from((raw as u16 as i16) as i32),
            _ => UntypedValue::from(raw as u32 as i32),
        },
        (ValueType::I64, false) => UntypedValue::from(raw),
        (ValueType::I64, true) => match width {
            1 => UntypedValue::from((raw as u8 as i8) as i64),
            2 => UntypedValue::from((raw as u16 as i16) as i64),
            4 => UntypedValue::from((raw as u32 as i32) as i64),
            _ => UntypedValue::from(raw as i64),
        },
        (ValueType::F32, _) => UntypedValue::from_bits(raw & 0xFFFF_FFFF),
        (ValueType::F64, _) => UntypedValue::from_bits(raw),
        _ => unreachable!("loads produce numeric types only"),
    }
}

/// Masks a scalar cell down to the bytes a store writes.
fn wrap_stored(width: u32, bits: u64) -> u64 {
    if width < 8 {
        bits & ((1u64 << (width * 8)) - 1)
    } else {
        bits
    }
}

impl InsnContext for Interpreter {
    type Error = Signal;

    fn features(&self) -> Features {
        self.features
    }

    fn unsupported(&mut self, what: &'static str) -> Signal {
        // Validated code never reaches an unknown or gated opcode.
        unreachable!("unsupported instruction in validated code: {}", what)
    }

    fn read_opcode(&mut self) -> Result<u8, Signal> {
        Ok(self.read_u8_at_pc())
    }

    fn read_subopcode(&mut self) -> Result<u32, Signal> {
        Ok(self.read_leb_u32_at_pc())
    }

    fn read_u8_imm(&mut self) -> Result<u8, Signal> {
        Ok(self.read_u8_at_pc())
    }

    fn read_u32_imm(&mut self) -> Result<u32, Signal> {
        Ok(self.read_leb_u32_at_pc())
    }

    fn read_i32_imm(&mut self) -> Result<i32, Signal> {
        let base = self.body.expr.base_pc();
        let mut pos = (self.pc - base) as usize;
        let value = leb128::read_leb_i32_nocheck(self.body.expr.bytes(), &mut pos);
        self.pc = base + pos as u32;
        Ok(value)
    }

    fn read_i64_imm(&mut self) -> Result<i64, Signal> {
        let base = self.body.expr.base_pc();
        let mut pos = (self.pc - base) as usize;
        let value = leb128::read_leb_i64_nocheck(self.body.expr.bytes(), &mut pos);
        self.pc = base + pos as u32;
        Ok(value)
    }

    fn read_f32_imm(&mut self) -> Result<u32, Signal> {
        let base = self.body.expr.base_pc();
        let mut pos = (self.pc - base) as usize;
        let bytes = leb128::read_bytes_nocheck::<4>(self.body.expr.bytes(), &mut pos);
        self.pc = base + pos as u32;
        Ok(u32::from_le_bytes(bytes))
    }

    fn read_f64_imm(&mut self) -> Result<u64, Signal> {
        let base = self.body.expr.base_pc();
        let mut pos = (self.pc - base) as usize;
        let bytes = leb128::read_bytes_nocheck::<8>(self.body.expr.bytes(), &mut pos);
        self.pc = base + pos as u32;
        Ok(u64::from_le_bytes(bytes))
    }

    fn read_bytes16_imm(&mut self) -> Result<[u8; 16], Signal> {
        let base = self.body.expr.base_pc();
        let mut pos = (self.pc - base) as usize;
        let bytes = leb128::read_bytes_nocheck::<16>(self.body.expr.bytes(), &mut pos);
        self.pc = base + pos as u32;
        Ok(bytes)
    }

    fn read_blocktype(&mut self) -> Result<BlockType, Signal> {
        let base = self.body.expr.base_pc();
        let mut pos = (self.pc - base) as usize;
        let raw = leb128::read_leb_s33_nocheck(self.body.expr.bytes(), &mut pos);
        self.pc = base + pos as u32;
        Ok(BlockType::from_s33(raw).expect("blocktypes were checked during validation"))
    }

    fn read_reftype(&mut self) -> Result<ValueType, Signal> {
        let byte = self.read_u8_at_pc();
        Ok(ValueType::from_u8(byte).expect("reference types were checked during validation"))
    }

    fn read_memarg(&mut self, _width: u32, _exact: bool) -> Result<MemArg, Signal> {
        let flags = self.read_leb_u32_at_pc();
        let memidx = if flags & 0x40 != 0 {
            self.read_leb_u32_at_pc()
        } else {
            0
        };
        let offset = self.read_leb_u32_at_pc();
        Ok(MemArg {
            offset,
            align: flags & 0x3F,
            memidx,
        })
    }

    fn read_memidx(&mut self) -> Result<u32, Signal> {
        Ok(self.read_leb_u32_at_pc())
    }

    fn visit_unreachable(&mut self) -> Result<(), Signal> {
        Err(self.trap(TrapCode::Unreachable))
    }

    fn visit_nop(&mut self) -> Result<(), Signal> {
        Ok(())
    }

    fn visit_block(&mut self, _bt: BlockType) -> Result<(), Signal> {
        self.push_label()
    }

    fn visit_loop(&mut self, _bt: BlockType) -> Result<(), Signal> {
        self.push_label()
    }

    fn visit_if(&mut self, _bt: BlockType) -> Result<(), Signal> {
        let condition = u32::from(self.value_stack.pop_scalar());
        self.push_label()?;
        if condition == 0 {
            self.event = Event::Branch {
                index: 0,
                goto_else: true,
            };
        }
        Ok(())
    }

    fn visit_else(&mut self) -> Result<(), Signal> {
        // Reached only by falling out of the true arm: skip past `end`.
        self.event = Event::Branch {
            index: 0,
            goto_else: false,
        };
        Ok(())
    }

    fn visit_end(&mut self) -> Result<(), Signal> {
        if self.labels.len() > self.cur_frame().labels_base {
            self.labels.pop();
        } else {
            self.event = Event::Exit;
        }
        Ok(())
    }

    fn visit_br(&mut self, label: u32) -> Result<(), Signal> {
        self.event = Event::Branch {
            index: label,
            goto_else: false,
        };
        Ok(())
    }

    fn visit_br_if(&mut self, label: u32) -> Result<(), Signal> {
        let condition = u32::from(self.value_stack.pop_scalar());
        if condition != 0 {
            self.event = Event::Branch {
                index: label,
                goto_else: false,
            };
        }
        Ok(())
    }

    fn visit_br_table(&mut self) -> Result<(), Signal> {
        let count = self.read_leb_u32_at_pc();
        let index = u32::from(self.value_stack.pop_scalar());
        // Entry `count` is the default target. The pc is left inside
        // the target vector; the queued branch transfers control anyway.
        let chosen = index.min(count);
        let mut target = 0;
        for _ in 0..=chosen {
            target = self.read_leb_u32_at_pc();
        }
        self.event = Event::Branch {
            index: target,
            goto_else: false,
        };
        Ok(())
    }

    fn visit_return(&mut self) -> Result<(), Signal> {
        let nlabels = self.labels.len() - self.cur_frame().labels_base;
        self.event = Event::Branch {
            index: nlabels as u32,
            goto_else: false,
        };
        Ok(())
    }

    fn visit_call(&mut self, func: u32) -> Result<(), Signal> {
        let func = self
            .instance
            .func_by_index(func)
            .expect("function indexes were checked during validation");
        self.event = Event::Call(func);
        Ok(())
    }

    fn visit_call_indirect(&mut self, type_idx: u32, table: u32) -> Result<(), Signal> {
        let func = self.indirect_callee(type_idx, table)?;
        self.event = Event::Call(func);
        Ok(())
    }

    fn visit_return_call(&mut self, func: u32) -> Result<(), Signal> {
        let func = self
            .instance
            .func_by_index(func)
            .expect("function indexes were checked during validation");
        self.event = Event::ReturnCall(func);
        Ok(())
    }

    fn visit_return_call_indirect(&mut self, type_idx: u32, table: u32) -> Result<(), Signal> {
        let func = self.indirect_callee(type_idx, table)?;
        self.event = Event::ReturnCall(func);
        Ok(())
    }

    fn visit_drop(&mut self) -> Result<(), Signal> {
        let cells = self
            .body
            .info
            .annotation(self.insn_pc)
            .expect("drop is annotated during validation");
        self.value_stack.drop_cells(cells as usize);
        Ok(())
    }

    fn visit_select(&mut self) -> Result<(), Signal> {
        let cells = self
            .body
            .info
            .annotation(self.insn_pc)
            .expect("select is annotated during validation");
        self.do_select(cells as usize)
    }

    fn visit_select_t(&mut self) -> Result<(), Signal> {
        let _count = self.read_leb_u32_at_pc();
        let ty = ValueType::from_u8(self.read_u8_at_pc())
            .expect("value types were checked during validation");
        self.do_select(ty.cell_count() as usize)
    }

    fn visit_local_get(&mut self, idx: u32) -> Result<(), Signal> {
        let (offset, width) = self.local_slot(idx);
        let base = self.cur_frame().height;
        let cells = self.value_stack.read_local(base + offset, width);
        self.value_stack.push_cells(cells)?;
        Ok(())
    }

    fn visit_local_set(&mut self, idx: u32) -> Result<(), Signal> {
        let (offset, width) = self.local_slot(idx);
        let base = self.cur_frame().height;
        let cells = self.value_stack.pop_cells(width);
        self.value_stack.write_local(base + offset, &cells);
        Ok(())
    }

    fn visit_local_tee(&mut self, idx: u32) -> Result<(), Signal> {
        let (offset, width) = self.local_slot(idx);
        let base = self.cur_frame().height;
        let cells = self.value_stack.peek_cells(width);
        self.value_stack.write_local(base + offset, &cells);
        Ok(())
    }

    fn visit_global_get(&mut self, idx: u32) -> Result<(), Signal> {
        let global = self
            .instance
            .global_by_index(idx)
            .expect("global indexes were checked during validation");
        self.value_stack.push_value(global.get())?;
        Ok(())
    }

    fn visit_global_set(&mut self, idx: u32) -> Result<(), Signal> {
        let global = self
            .instance
            .global_by_index(idx)
            .expect("global indexes were checked during validation");
        let value = self.value_stack.pop_value(global.value_type());
        global
            .set(value)
            .expect("mutability and types were checked during validation");
        Ok(())
    }

    fn visit_ref_null(&mut self, ty: ValueType) -> Result<(), Signal> {
        match ty {
            ValueType::FuncRef => self.value_stack.push_funcref(None)?,
            _ => self.value_stack.push_externref(None)?,
        }
        Ok(())
    }

    fn visit_ref_is_null(&mut self) -> Result<(), Signal> {
        let is_null = match self.value_stack.pop_cell() {
            Cell::Func(value) => value.is_none(),
            Cell::Extern(value) => value.is_none(),
            Cell::Val(_) => unreachable!("ref.is_null operates on reference cells"),
        };
        self.value_stack.push_scalar(UntypedValue::from(is_null))?;
        Ok(())
    }

    fn visit_ref_func(&mut self, func: u32) -> Result<(), Signal> {
        let func = self
            .instance
            .func_by_index(func)
            .expect("function indexes were checked during validation");
        self.value_stack.push_funcref(Some(func))?;
        Ok(())
    }

    fn visit_table_get(&mut self, table: u32) -> Result<(), Signal> {
        let table = self.table(table);
        let index = u32::from(self.value_stack.pop_scalar());
        let value = table
            .get(index)
            .map_err(|_| self.trap(TrapCode::TableAccessOutOfBounds))?;
        self.value_stack.push_value(value)?;
        Ok(())
    }

    fn visit_table_set(&mut self, table: u32) -> Result<(), Signal> {
        let table = self.table(table);
        let value = self.value_stack.pop_value(table.ty().elem());
        let index = u32::from(self.value_stack.pop_scalar());
        table
            .set(index, value)
            .map_err(|_| self.trap(TrapCode::TableAccessOutOfBounds))?;
        Ok(())
    }

    fn visit_table_init(&mut self, elem: u32, table: u32) -> Result<(), Signal> {
        let table = self.table(table);
        let n = u32::from(self.value_stack.pop_scalar());
        let src = u32::from(self.value_stack.pop_scalar());
        let dst = u32::from(self.value_stack.pop_scalar());
        let segment = self.instance.elem_segment(elem);
        let seg_len = segment.as_ref().map(|seg| seg.len()).unwrap_or(0) as u64;
        if src as u64 + n as u64 > seg_len {
            return Err(self.trap(TrapCode::ElementAccessOutOfBounds));
        }
        let items: &[Value] = match &segment {
            Some(seg) => &seg[src as usize..(src + n) as usize],
            None => &[],
        };
        table
            .init(dst, items)
            .map_err(|_| self.trap(TrapCode::TableAccessOutOfBounds))?;
        Ok(())
    }

    fn visit_elem_drop(&mut self, elem: u32) -> Result<(), Signal> {
        self.instance.drop_elem_segment(elem);
        Ok(())
    }

    fn visit_table_copy(&mut self, dst: u32, src: u32) -> Result<(), Signal> {
        let dst_table = self.table(dst);
        let src_table = self.table(src);
        let n = u32::from(self.value_stack.pop_scalar());
        let src_offset = u32::from(self.value_stack.pop_scalar());
        let dst_offset = u32::from(self.value_stack.pop_scalar());
        TableInstance::transfer(&src_table, src_offset, &dst_table, dst_offset, n)
            .map_err(|_| self.trap(TrapCode::TableAccessOutOfBounds))?;
        Ok(())
    }

    fn visit_table_grow(&mut self, table: u32) -> Result<(), Signal> {
        let table = self.table(table);
        let delta = u32::from(self.value_stack.pop_scalar());
        let init = self.value_stack.pop_value(table.ty().elem());
        let result = match table.grow(delta, init) {
            Ok(previous) => previous,
            Err(_) => u32::MAX,
        };
        self.value_stack.push_scalar(UntypedValue::from(result))?;
        Ok(())
    }

    fn visit_table_size(&mut self, table: u32) -> Result<(), Signal> {
        let size = self.table(table).current_size();
        self.value_stack.push_scalar(UntypedValue::from(size))?;
        Ok(())
    }

    fn visit_table_fill(&mut self, table: u32) -> Result<(), Signal> {
        let table = self.table(table);
        let n = u32::from(self.value_stack.pop_scalar());
        let value = self.value_stack.pop_value(table.ty().elem());
        let offset = u32::from(self.value_stack.pop_scalar());
        table
            .fill(offset, n, value)
            .map_err(|_| self.trap(TrapCode::TableAccessOutOfBounds))?;
        Ok(())
    }

    fn visit_load(
        &mut self,
        memarg: MemArg,
        ty: ValueType,
        width: u32,
        signed: bool,
    ) -> Result<(), Signal> {
        let memory = self.memory(memarg.memidx);
        let addr = self.effective_address(&memarg);
        self.value_stack.pop_scalar();
        let raw = memory
            .read_scalar(addr, width)
            .map_err(|_| self.trap(TrapCode::MemoryAccessOutOfBounds))?;
        self.value_stack
            .push_scalar(extend_loaded(ty, width, signed, raw))?;
        Ok(())
    }

    fn visit_store(&mut self, memarg: MemArg, _ty: ValueType, width: u32) -> Result<(), Signal> {
        let memory = self.memory(memarg.memidx);
        let value = self.value_stack.pop_scalar();
        let addr = self.effective_address(&memarg);
        self.value_stack.pop_scalar();
        memory
            .write_scalar(addr, width, wrap_stored(width, value.to_bits()))
            .map_err(|_| self.trap(TrapCode::MemoryAccessOutOfBounds))?;
        Ok(())
    }

    fn visit_memory_size(&mut self, memidx: u32) -> Result<(), Signal> {
        let pages = self.memory(memidx).current_size().0 as u32;
        self.value_stack.push_scalar(UntypedValue::from(pages))?;
        Ok(())
    }

    fn visit_memory_grow(&mut self, memidx: u32) -> Result<(), Signal> {
        let memory = self.memory(memidx);
        let delta = u32::from(self.value_stack.pop_scalar());
        let result = match memory.grow(Pages(delta as usize)) {
            Ok(previous) => previous.0 as u32,
            Err(_) => u32::MAX,
        };
        self.value_stack.push_scalar(UntypedValue::from(result))?;
        Ok(())
    }

    fn visit_memory_init(&mut self, data: u32, memidx: u32) -> Result<(), Signal> {
        let memory = self.memory(memidx);
        let n = u32::from(self.value_stack.pop_scalar());
        let src = u32::from(self.value_stack.pop_scalar());
        let dst = u32::from(self.value_stack.pop_scalar());
        let segment = self.instance.data_segment(data);
        let seg_len = segment.as_ref().map(|seg| seg.len()).unwrap_or(0) as u64;
        if src as u64 + n as u64 > seg_len {
            return Err(self.trap(TrapCode::DataAccessOutOfBounds));
        }
        let bytes: &[u8] = match &segment {
            Some(seg) => &seg[src as usize..(src + n) as usize],
            None => &[],
        };
        memory
            .set(dst, bytes)
            .map_err(|_| self.trap(TrapCode::MemoryAccessOutOfBounds))?;
        Ok(())
    }

    fn visit_data_drop(&mut self, data: u32) -> Result<(), Signal> {
        self.instance.drop_data_segment(data);
        Ok(())
    }

    fn visit_memory_copy(&mut self, dst: u32, src: u32) -> Result<(), Signal> {
        let dst_memory = self.memory(dst);
        let src_memory = self.memory(src);
        let n = u32::from(self.value_stack.pop_scalar());
        let src_offset = u32::from(self.value_stack.pop_scalar());
        let dst_offset = u32::from(self.value_stack.pop_scalar());
        crate::memory::MemoryInstance::transfer(
            &src_memory,
            src_offset as usize,
            &dst_memory,
            dst_offset as usize,
            n as usize,
        )
        .map_err(|_| self.trap(TrapCode::MemoryAccessOutOfBounds))?;
        Ok(())
    }

    fn visit_memory_fill(&mut self, memidx: u32) -> Result<(), Signal> {
        let memory = self.memory(memidx);
        let n = u32::from(self.value_stack.pop_scalar());
        let value = u32::from(self.value_stack.pop_scalar()) as u8;
        let offset = u32::from(self.value_stack.pop_scalar());
        memory
            .clear(offset as usize, value, n as usize)
            .map_err(|_| self.trap(TrapCode::MemoryAccessOutOfBounds))?;
        Ok(())
    }

    fn visit_i32_const(&mut self, value: i32) -> Result<(), Signal> {
        self.value_stack.push_scalar(UntypedValue::from(value))?;
        Ok(())
    }

    fn visit_i64_const(&mut self, value: i64) -> Result<(), Signal> {
        self.value_stack.push_scalar(UntypedValue::from(value))?;
        Ok(())
    }

    fn visit_f32_const(&mut self, bits: u32) -> Result<(), Signal> {
        // The bit pattern, NaN payloads included, is preserved exactly.
        self.value_stack
            .push_scalar(UntypedValue::from_bits(bits as u64))?;
        Ok(())
    }

    fn visit_f64_const(&mut self, bits: u64) -> Result<(), Signal> {
        self.value_stack.push_scalar(UntypedValue::from_bits(bits))?;
        Ok(())
    }

    fn visit_testop(
        &mut self,
        _ty: ValueType,
        f: fn(UntypedValue) -> UntypedValue,
    ) -> Result<(), Signal> {
        let value = self.value_stack.pop_scalar();
        self.value_stack.push_scalar(f(value))?;
        Ok(())
    }

    fn visit_relop(
        &mut self,
        _ty: ValueType,
        f: fn(UntypedValue, UntypedValue) -> UntypedValue,
    ) -> Result<(), Signal> {
        let rhs = self.value_stack.pop_scalar();
        let lhs = self.value_stack.pop_scalar();
        self.value_stack.push_scalar(f(lhs, rhs))?;
        Ok(())
    }

    fn visit_unop(
        &mut self,
        _ty: ValueType,
        f: fn(UntypedValue) -> UntypedValue,
    ) -> Result<(), Signal> {
        let value = self.value_stack.pop_scalar();
        self.value_stack.push_scalar(f(value))?;
        Ok(())
    }

    fn visit_binop(
        &mut self,
        _ty: ValueType,
        f: fn(UntypedValue, UntypedValue) -> UntypedValue,
    ) -> Result<(), Signal> {
        let rhs = self.value_stack.pop_scalar();
        let lhs = self.value_stack.pop_scalar();
        self.value_stack.push_scalar(f(lhs, rhs))?;
        Ok(())
    }

    fn visit_binop_partial(
        &mut self,
        _ty: ValueType,
        f: fn(UntypedValue, UntypedValue) -> Result<UntypedValue, TrapCode>,
    ) -> Result<(), Signal> {
        let rhs = self.value_stack.pop_scalar();
        let lhs = self.value_stack.pop_scalar();
        let result = f(lhs, rhs).map_err(|code| self.trap(code))?;
        self.value_stack.push_scalar(result)?;
        Ok(())
    }

    fn visit_cvtop(
        &mut self,
        _from: ValueType,
        _to: ValueType,
        f: fn(UntypedValue) -> UntypedValue,
    ) -> Result<(), Signal> {
        let value = self.value_stack.pop_scalar();
        self.value_stack.push_scalar(f(value))?;
        Ok(())
    }

    fn visit_cvtop_partial(
        &mut self,
        _from: ValueType,
        _to: ValueType,
        f: fn(UntypedValue) -> Result<UntypedValue, TrapCode>,
    ) -> Result<(), Signal> {
        let value = self.value_stack.pop_scalar();
        let result = f(value).map_err(|code| self.trap(code))?;
        self.value_stack.push_scalar(result)?;
        Ok(())
    }

    fn visit_v128_const(&mut self, bytes: [u8; 16]) -> Result<(), Signal> {
        self.value_stack.push_v128(V128::from_le_bytes(bytes))?;
        Ok(())
    }

    fn visit_v128_load(&mut self, memarg: MemArg) -> Result<(), Signal> {
        let memory = self.memory(memarg.memidx);
        let addr = self.effective_address(&memarg);
        self.value_stack.pop_scalar();
        let bytes = memory
            .read_wide(addr)
            .map_err(|_| self.trap(TrapCode::MemoryAccessOutOfBounds))?;
        self.value_stack.push_v128(V128::from_le_bytes(bytes))?;
        Ok(())
    }

    fn visit_v128_store(&mut self, memarg: MemArg) -> Result<(), Signal> {
        let memory = self.memory(memarg.memidx);
        let value = self.value_stack.pop_v128();
        let addr = self.effective_address(&memarg);
        self.value_stack.pop_scalar();
        memory
            .write_wide(addr, value.to_le_bytes())
            .map_err(|_| self.trap(TrapCode::MemoryAccessOutOfBounds))?;
        Ok(())
    }

    fn visit_v128_load_extend(&mut self, memarg: MemArg, f: fn(u64) -> V128) -> Result<(), Signal> {
        let memory = self.memory(memarg.memidx);
        let addr = self.effective_address(&memarg);
        self.value_stack.pop_scalar();
        let raw = memory
            .read_scalar(addr, 8)
            .map_err(|_| self.trap(TrapCode::MemoryAccessOutOfBounds))?;
        self.value_stack.push_v128(f(raw))?;
        Ok(())
    }

    fn visit_v128_load_splat(&mut self, memarg: MemArg, width: u32) -> Result<(), Signal> {
        let memory = self.memory(memarg.memidx);
        let addr = self.effective_address(&memarg);
        self.value_stack.pop_scalar();
        let raw = memory
            .read_scalar(addr, width)
            .map_err(|_| self.trap(TrapCode::MemoryAccessOutOfBounds))?;
        let value = match width {
            1 => V128::i8x16_splat(raw as u8 as i32),
            2 => V128::i16x8_splat(raw as u16 as i32),
            4 => V128::i32x4_splat(raw as u32 as i32),
            _ => V128::i64x2_splat(raw as i64),
        };
        self.value_stack.push_v128(value)?;
        Ok(())
    }

    fn visit_v128_load_zero(&mut self, memarg: MemArg, width: u32) -> Result<(), Signal> {
        let memory = self.memory(memarg.memidx);
        let addr = self.effective_address(&memarg);
        self.value_stack.pop_scalar();
        let raw = memory
            .read_scalar(addr, width)
            .map_err(|_| self.trap(TrapCode::MemoryAccessOutOfBounds))?;
        let value = match width {
            4 => V128::from_u32x4([raw as u32, 0, 0, 0]),
            _ => V128::from_u64x2([raw, 0]),
        };
        self.value_stack.push_v128(value)?;
        Ok(())
    }

    fn visit_v128_load_lane(
        &mut self,
        memarg: MemArg,
        width: u32,
        lane: u8,
    ) -> Result<(), Signal> {
        let memory = self.memory(memarg.memidx);
        let vector = self.value_stack.pop_v128();
        let addr = self.effective_address(&memarg);
        self.value_stack.pop_scalar();
        let raw = memory
            .read_scalar(addr, width)
            .map_err(|_| self.trap(TrapCode::MemoryAccessOutOfBounds))?;
        let value = match width {
            1 => vector.i8x16_replace_lane(lane, raw as u8 as i32),
            2 => vector.i16x8_replace_lane(lane, raw as u16 as i32),
            4 => vector.i32x4_replace_lane(lane, raw as u32 as i32),
            _ => vector.i64x2_replace_lane(lane, raw as i64),
        };
        self.value_stack.push_v128(value)?;
        Ok(())
    }

    fn visit_v128_store_lane(
        &mut self,
        memarg: MemArg,
        width: u32,
        lane: u8,
    ) -> Result<(), Signal> {
        let memory = self.memory(memarg.memidx);
        let vector = self.value_stack.pop_v128();
        let addr = self.effective_address(&memarg);
        self.value_stack.pop_scalar();
        let raw = match width {
            1 => vector.i8x16_extract_lane_u(lane) as u64,
            2 => vector.i16x8_extract_lane_u(lane) as u64,
            4 => vector.i32x4_extract_lane(lane) as u32 as u64,
            _ => vector.i64x2_extract_lane(lane) as u64,
        };
        memory
            .write_scalar(addr, width, raw)
            .map_err(|_| self.trap(TrapCode::MemoryAccessOutOfBounds))?;
        Ok(())
    }

    fn visit_i8x16_shuffle(&mut self, lanes: [u8; 16]) -> Result<(), Signal> {
        let rhs = self.value_stack.pop_v128();
        let lhs = self.value_stack.pop_v128();
        self.value_stack.push_v128(lhs.i8x16_shuffle(rhs, lanes))?;
        Ok(())
    }

    fn visit_v128_unop(&mut self, f: fn(V128) -> V128) -> Result<(), Signal> {
        let value = self.value_stack.pop_v128();
        self.value_stack.push_v128(f(value))?;
        Ok(())
    }

    fn visit_v128_binop(&mut self, f: fn(V128, V128) -> V128) -> Result<(), Signal> {
        let rhs = self.value_stack.pop_v128();
        let lhs = self.value_stack.pop_v128();
        self.value_stack.push_v128(f(lhs, rhs))?;
        Ok(())
    }

    fn visit_v128_bitselect(&mut self) -> Result<(), Signal> {
        let ctrl = self.value_stack.pop_v128();
        let rhs = self.value_stack.pop_v128();
        let lhs = self.value_stack.pop_v128();
        self.value_stack.push_v128(lhs.bitselect(rhs, ctrl))?;
        Ok(())
    }

    fn visit_v128_shift(&mut self, f: fn(V128, u32) -> V128) -> Result<(), Signal> {
        let amount = u32::from(self.value_stack.pop_scalar());
        let value = self.value_stack.pop_v128();
        self.value_stack.push_v128(f(value, amount))?;
        Ok(())
    }

    fn visit_v128_testop(&mut self, f: fn(V128) -> bool) -> Result<(), Signal> {
        let value = self.value_stack.pop_v128();
        self.value_stack.push_scalar(UntypedValue::from(f(value)))?;
        Ok(())
    }

    fn visit_v128_bitmask(&mut self, f: fn(V128) -> i32) -> Result<(), Signal> {
        let value = self.value_stack.pop_v128();
        self.value_stack.push_scalar(UntypedValue::from(f(value)))?;
        Ok(())
    }

    fn visit_splat(&mut self, _ty: ValueType, f: fn(UntypedValue) -> V128) -> Result<(), Signal> {
        let value = self.value_stack.pop_scalar();
        self.value_stack.push_v128(f(value))?;
        Ok(())
    }

    fn visit_extract_lane(
        &mut self,
        _ty: ValueType,
        _lanes: u8,
        lane: u8,
        f: fn(V128, u8) -> UntypedValue,
    ) -> Result<(), Signal> {
        let vector = self.value_stack.pop_v128();
        self.value_stack.push_scalar(f(vector, lane))?;
        Ok(())
    }

    fn visit_replace_lane(
        &mut self,
        _ty: ValueType,
        _lanes: u8,
        lane: u8,
        f: fn(V128, u8, UntypedValue) -> V128,
    ) -> Result<(), Signal> {
        let scalar = self.value_stack.pop_scalar();
        let vector = self.value_stack.pop_v128();
        self.value_stack.push_v128(f(vector, lane, scalar))?;
        Ok(())
    }

    #[cfg(feature = "threads")]
    fn visit_atomic_notify(&mut self, memarg: MemArg) -> Result<(), Signal> {
        let memory = self.memory(memarg.memidx);
        let count = u32::from(self.value_stack.pop_scalar());
        let addr = self.effective_address(&memarg);
        self.value_stack.pop_scalar();
        self.check_atomic_access(addr, 4)?;
        let woken = if memory.is_shared() {
            memory.atomic_notify(addr, count)
        } else {
            // An unshared memory never has waiters.
            0
        };
        self.value_stack.push_scalar(UntypedValue::from(woken))?;
        Ok(())
    }

    #[cfg(feature = "threads")]
    fn visit_atomic_wait(&mut self, memarg: MemArg, width: u32) -> Result<(), Signal> {
        let memory = self.memory(memarg.memidx);
        let timeout = i64::from(self.value_stack.pop_scalar());
        let expected = self.value_stack.pop_scalar().to_bits();
        let expected = wrap_stored(width, expected);
        let addr = self.effective_address(&memarg);
        self.value_stack.pop_scalar();
        self.check_atomic_access(addr, width)?;
        if !memory.is_shared() {
            return Err(Signal::Trap(Trap::with_message(
                TrapCode::MemoryAccessOutOfBounds,
                "atomic wait on unshared memory",
            )));
        }
        let poll_interval = core::time::Duration::from_millis(self.interrupt_interval_ms as u64);
        #[cfg(feature = "std")]
        let flag = self.interrupt.clone();
        let interrupted = move || {
            #[cfg(feature = "std")]
            {
                if let Some(flag) = &flag {
                    return flag.load(core::sync::atomic::Ordering::Relaxed);
                }
            }
            false
        };
        let outcome = memory
            .atomic_wait(addr, width, expected, timeout, poll_interval, interrupted)
            .map_err(|_| self.trap(TrapCode::MemoryAccessOutOfBounds))?;
        let result: u32 = match outcome {
            crate::memory::WaitOutcome::Woken => 0,
            crate::memory::WaitOutcome::NotEqual => 1,
            crate::memory::WaitOutcome::TimedOut => 2,
            crate::memory::WaitOutcome::Interrupted => {
                self.restart.clear();
                return Err(Signal::Interrupted);
            }
        };
        self.value_stack.push_scalar(UntypedValue::from(result))?;
        Ok(())
    }

    #[cfg(feature = "threads")]
    fn visit_atomic_fence(&mut self) -> Result<(), Signal> {
        core::sync::atomic::fence(core::sync::atomic::Ordering::SeqCst);
        Ok(())
    }

    #[cfg(feature = "threads")]
    fn visit_atomic_load(
        &mut self,
        memarg: MemArg,
        ty: ValueType,
        width: u32,
    ) -> Result<(), Signal> {
        let memory = self.memory(memarg.memidx);
        let addr = self.effective_address(&memarg);
        self.value_stack.pop_scalar();
        self.check_atomic_access(addr, width)?;
        let raw = memory
            .atomic_load(addr, width)
            .map_err(|_| self.trap(TrapCode::MemoryAccessOutOfBounds))?;
        self.value_stack
            .push_scalar(extend_loaded(ty, width, false, raw))?;
        Ok(())
    }

    #[cfg(feature = "threads")]
    fn visit_atomic_store(
        &mut self,
        memarg: MemArg,
        _ty: ValueType,
        width: u32,
    ) -> Result<(), Signal> {
        let memory = self.memory(memarg.memidx);
        let value = self.value_stack.pop_scalar();
        let addr = self.effective_address(&memarg);
        self.value_stack.pop_scalar();
        self.check_atomic_access(addr, width)?;
        memory
            .atomic_store(addr, width, wrap_stored(width, value.to_bits()))
            .map_err(|_| self.trap(TrapCode::MemoryAccessOutOfBounds))?;
        Ok(())
    }

    #[cfg(feature = "threads")]
    fn visit_atomic_rmw(
        &mut self,
        memarg: MemArg,
        ty: ValueType,
        width: u32,
        f: fn(u64, u64) -> u64,
    ) -> Result<(), Signal> {
        let memory = self.memory(memarg.memidx);
        let operand = wrap_stored(width, self.value_stack.pop_scalar().to_bits());
        let addr = self.effective_address(&memarg);
        self.value_stack.pop_scalar();
        self.check_atomic_access(addr, width)?;
        let old = memory
            .atomic_rmw(addr, width, operand, f)
            .map_err(|_| self.trap(TrapCode::MemoryAccessOutOfBounds))?;
        self.value_stack
            .push_scalar(extend_loaded(ty, width, false, old))?;
        Ok(())
    }

    #[cfg(feature = "threads")]
    fn visit_atomic_cmpxchg(
        &mut self,
        memarg: MemArg,
        ty: ValueType,
        width: u32,
    ) -> Result<(), Signal> {
        let memory = self.memory(memarg.memidx);
        let replacement = wrap_stored(width, self.value_stack.pop_scalar().to_bits());
        let expected = wrap_stored(width, self.value_stack.pop_scalar().to_bits());
        let addr = self.effective_address(&memarg);
        self.value_stack.pop_scalar();
        self.check_atomic_access(addr, width)?;
        let old = memory
            .atomic_cmpxchg(addr, width, expected, replacement)
            .map_err(|_| self.trap(TrapCode::MemoryAccessOutOfBounds))?;
        self.value_stack
            .push_scalar(extend_loaded(ty, width, false, old))?;
        Ok(())
    }
}

impl Interpreter {
    fn do_select(&mut self, cells: usize) -> Result<(), Signal> {
        let condition = u32::from(self.value_stack.pop_scalar());
        let on_zero = self.value_stack.pop_cells(cells);
        let on_nonzero = self.value_stack.pop_cells(cells);
        self.value_stack.push_cells(if condition != 0 {
            on_nonzero
        } else {
            on_zero
        })?;
        Ok(())
    }

    fn local_slot(&self, idx: u32) -> (usize, usize) {
        let offsets = &self.body.cell_offsets;
        let offset = offsets[idx as usize] as usize;
        let width = offsets[idx as usize + 1] as usize - offset;
        (offset, width)
    }

    fn table(&self, idx: u32) -> crate::table::TableRef {
        self.instance
            .table_by_index(idx)
            .expect("table indexes were checked during validation")
    }

    fn indirect_callee(&mut self, type_idx: u32, table: u32) -> Result<FuncRef, Signal> {
        let table = self.table(table);
        let index = u32::from(self.value_stack.pop_scalar());
        let element = table
            .get(index)
            .map_err(|_| self.trap(TrapCode::IndirectCallOutOfBounds))?;
        let func = match element {
            Value::FuncRef(Some(func)) => func,
            Value::FuncRef(None) => {
                return Err(self.trap(TrapCode::IndirectCallNullFuncref));
            }
            _ => unreachable!("call_indirect tables hold funcrefs"),
        };
        let expected = self
            .instance
            .type_by_index(type_idx)
            .expect("type indexes were checked during validation");
        // The signature check happens at run time regardless of static
        // validation: the table may hold functions of other modules.
        if *expected != *func.func_type() {
            return Err(self.trap(TrapCode::IndirectCallTypeMismatch));
        }
        Ok(func)
    }

    #[cfg(feature = "threads")]
    fn check_atomic_access(&self, addr: u64, width: u32) -> Result<(), Signal> {
        if addr % width as u64 != 0 {
            return Err(Signal::Trap(Trap::with_message(
                TrapCode::MemoryAccessOutOfBounds,
                "unaligned atomic access",
            )));
        }
        Ok(())
    }
}
