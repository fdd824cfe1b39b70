//! Function-body validation.
//!
//! The validator is an abstract interpreter over a type stack and a
//! control-frame stack, driven by the shared decoder. Alongside type
//! checking it precomputes everything the engine needs to run the body
//! without re-deriving structure: the jump table, the cell-width
//! annotations for value-polymorphic opcodes, and the stack high-water
//! marks.

use super::{ModuleContext, Error};
use crate::decode::{dispatch, InsnContext, MemArg};
use crate::features::Features;
use crate::leb128;
use crate::module::{ExecInfo, Expr, Jump, TypeAnnotation};
use crate::types::BlockType;
use crate::untyped::UntypedValue;
use crate::v128::V128;
use crate::value::ValueType;
use crate::TrapCode;
use alloc::format;
use alloc::vec::Vec;

/// Maximum number of entries in the type stack per function.
const VALUE_STACK_LIMIT: usize = 16384;
/// Maximum number of entries in the control-frame stack per function.
const FRAME_STACK_LIMIT: usize = 16384;

/// Type of an entry on the abstract stack.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum StackType {
    /// A concrete value type.
    Known(ValueType),
    /// The polymorphic placeholder produced in dead code.
    Unknown,
}

impl StackType {
    fn cells(self) -> u32 {
        match self {
            StackType::Known(ty) => ty.cell_count(),
            StackType::Unknown => 1,
        }
    }

    fn matches(self, expected: ValueType) -> bool {
        match self {
            StackType::Known(ty) => ty == expected,
            StackType::Unknown => true,
        }
    }
}

/// What kind of structure opened a control frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum FrameKind {
    /// The implicit frame of the function body.
    Body,
    /// A `block`, opened at the given pc.
    Block { pc: u32 },
    /// A `loop`, opened at the given pc.
    Loop,
    /// The true arm of an `if`, opened at the given pc.
    If { pc: u32 },
    /// The false arm of an `if`; `else_slot` is the pc just after the
    /// `else` opcode.
    Else { pc: u32, else_slot: u32 },
}

#[derive(Debug)]
struct CtrlFrame {
    kind: FrameKind,
    start_types: Vec<ValueType>,
    end_types: Vec<ValueType>,
    /// Type-stack height at frame entry, parameters excluded.
    height: usize,
    /// Cell height at the same point.
    cell_height: u32,
    /// Set once control can no longer reach the current position.
    unreachable: bool,
}

impl CtrlFrame {
    /// The types a branch targeting this frame transfers: parameters for
    /// a loop, results otherwise.
    fn label_types(&self) -> &[ValueType] {
        match self.kind {
            FrameKind::Loop => &self.start_types,
            _ => &self.end_types,
        }
    }
}

pub(crate) struct FuncValidator<'a> {
    ctx: &'a ModuleContext,
    /// The declared result types of the function being validated.
    results: Vec<ValueType>,
    /// Flattened locals, parameters first.
    locals: Vec<ValueType>,
    bytes: &'a [u8],
    base_pc: u32,
    pos: usize,
    insn_pc: u32,
    stack: Vec<StackType>,
    cell_height: u32,
    max_cells: u32,
    frames: Vec<CtrlFrame>,
    max_labels: u32,
    jumps: Vec<Jump>,
    annotations: Vec<TypeAnnotation>,
}

impl<'a> FuncValidator<'a> {
    pub(crate) fn new(
        ctx: &'a ModuleContext,
        results: Vec<ValueType>,
        locals: Vec<ValueType>,
        expr: &'a Expr,
    ) -> FuncValidator<'a> {
        FuncValidator {
            ctx,
            results,
            locals,
            bytes: expr.bytes(),
            base_pc: expr.base_pc(),
            pos: 0,
            insn_pc: expr.base_pc(),
            stack: Vec::new(),
            cell_height: 0,
            max_cells: 0,
            frames: Vec::new(),
            max_labels: 0,
            jumps: Vec::new(),
            annotations: Vec::new(),
        }
    }

    /// Runs validation to completion and returns the collected
    /// execution metadata. `max_cells` covers the operand stack only;
    /// the caller adds the locals region.
    pub(crate) fn run(mut self) -> Result<ExecInfo, Error> {
        let results = self.results.clone();
        self.push_frame(FrameKind::Body, Vec::new(), results)?;
        while !self.frames.is_empty() {
            if self.pos >= self.bytes.len() {
                return Err(Error(format!(
                    "function body ended inside a block (at pc {})",
                    self.cur_pc()
                )));
            }
            self.insn_pc = self.cur_pc();
            dispatch(&mut self)?;
        }
        if self.pos != self.bytes.len() {
            return Err(Error(format!(
                "trailing bytes after the function `end` (at pc {})",
                self.cur_pc()
            )));
        }
        self.jumps.sort_by_key(|jump| jump.pc);
        self.annotations.sort_by_key(|annotation| annotation.pc);
        Ok(ExecInfo {
            jumps: self.jumps,
            annotations: self.annotations,
            max_cells: self.max_cells,
            max_labels: self.max_labels,
        })
    }

    fn cur_pc(&self) -> u32 {
        self.base_pc + self.pos as u32
    }

    fn fail(&self, message: &str) -> Error {
        Error(format!("at pc {}: {}", self.insn_pc, message))
    }

    fn fail_with(&self, message: alloc::string::String) -> Error {
        Error(format!("at pc {}: {}", self.insn_pc, message))
    }

    fn top_frame(&self) -> &CtrlFrame {
        self.frames
            .last()
            .expect("the body frame outlives every opcode")
    }

    fn push_ty(&mut self, ty: StackType) -> Result<(), Error> {
        if self.stack.len() >= VALUE_STACK_LIMIT {
            return Err(self.fail("type stack limit exceeded"));
        }
        self.cell_height += ty.cells();
        if self.cell_height > self.max_cells {
            self.max_cells = self.cell_height;
        }
        self.stack.push(ty);
        Ok(())
    }

    fn push_val(&mut self, ty: ValueType) -> Result<(), Error> {
        self.push_ty(StackType::Known(ty))
    }

    fn push_vals(&mut self, types: &[ValueType]) -> Result<(), Error> {
        for ty in types {
            self.push_val(*ty)?;
        }
        Ok(())
    }

    /// Pops one entry, checking it against `expected` when given. In a
    /// polymorphic frame, pops below the frame height synthesize
    /// `Unknown` entries.
    fn pop_any(&mut self, expected: Option<ValueType>) -> Result<StackType, Error> {
        let frame = self.top_frame();
        if self.stack.len() == frame.height {
            if frame.unreachable {
                return Ok(expected.map(StackType::Known).unwrap_or(StackType::Unknown));
            }
            return Err(self.fail("stack underflow"));
        }
        let actual = self
            .stack
            .pop()
            .expect("just checked to be above the frame height");
        self.cell_height -= actual.cells();
        if let Some(expected) = expected {
            if !actual.matches(expected) {
                return Err(self.fail_with(format!(
                    "type mismatch: expected {:?}, found {:?}",
                    expected, actual
                )));
            }
        }
        Ok(actual)
    }

    fn pop_val(&mut self, expected: ValueType) -> Result<(), Error> {
        self.pop_any(Some(expected)).map(|_| ())
    }

    fn pop_vals(&mut self, types: &[ValueType]) -> Result<(), Error> {
        for ty in types.iter().rev() {
            self.pop_val(*ty)?;
        }
        Ok(())
    }

    fn push_frame(
        &mut self,
        kind: FrameKind,
        start_types: Vec<ValueType>,
        end_types: Vec<ValueType>,
    ) -> Result<(), Error> {
        if self.frames.len() >= FRAME_STACK_LIMIT {
            return Err(self.fail("frame stack limit exceeded"));
        }
        self.frames.push(CtrlFrame {
            kind,
            start_types,
            end_types,
            height: self.stack.len(),
            cell_height: self.cell_height,
            unreachable: false,
        });
        let labels = self.frames.len() as u32 - 1;
        if labels > self.max_labels {
            self.max_labels = labels;
        }
        let start = self.top_frame().start_types.clone();
        self.push_vals(&start)
    }

    fn pop_frame(&mut self) -> Result<CtrlFrame, Error> {
        let end = self.top_frame().end_types.clone();
        self.pop_vals(&end)?;
        let frame = self
            .frames
            .last()
            .expect("pop_frame is only reached with a frame on the stack");
        if frame.unreachable {
            self.stack.truncate(frame.height);
            self.cell_height = frame.cell_height;
        } else if self.stack.len() != frame.height {
            return Err(self.fail("values remain on the stack at the end of the block"));
        }
        Ok(self
            .frames
            .pop()
            .expect("presence checked above"))
    }

    fn mark_unreachable(&mut self) {
        let frame = self
            .frames
            .last_mut()
            .expect("the body frame outlives every opcode");
        frame.unreachable = true;
        self.stack.truncate(frame.height);
        self.cell_height = frame.cell_height;
    }

    fn nth_frame(&self, label: u32) -> Result<&CtrlFrame, Error> {
        let depth = label as usize;
        if depth >= self.frames.len() {
            return Err(self.fail_with(format!("unknown label {}", label)));
        }
        Ok(&self.frames[self.frames.len() - 1 - depth])
    }

    fn block_arity(&self, bt: BlockType) -> Result<(Vec<ValueType>, Vec<ValueType>), Error> {
        bt.arity(self.ctx.types())
            .ok_or_else(|| self.fail("unknown type index in blocktype"))
    }

    fn record_jump(&mut self, pc: u32, else_target: u32) {
        self.jumps.push(Jump {
            pc,
            target: self.cur_pc(),
            else_target,
        });
    }

    fn leb_err(&self, err: leb128::LebError) -> Error {
        Error(format!("at pc {}: {}", self.cur_pc(), err))
    }

    /// Pops the expected label types of every target and pushes back the
    /// entries actually popped, so that dead-code `Unknown`s survive.
    fn peek_vals(&mut self, types: &[ValueType]) -> Result<(), Error> {
        let mut popped = Vec::with_capacity(types.len());
        for ty in types.iter().rev() {
            popped.push(self.pop_any(Some(*ty))?);
        }
        for ty in popped.into_iter().rev() {
            self.push_ty(ty)?;
        }
        Ok(())
    }
}

impl<'a> InsnContext for FuncValidator<'a> {
    type Error = Error;

    fn features(&self) -> Features {
        self.ctx.features()
    }

    fn unsupported(&mut self, what: &'static str) -> Error {
        self.fail(what)
    }

    fn read_opcode(&mut self) -> Result<u8, Error> {
        leb128::read_u8(self.bytes, &mut self.pos).map_err(|e| self.leb_err(e))
    }

    fn read_subopcode(&mut self) -> Result<u32, Error> {
        leb128::read_leb_u32(self.bytes, &mut self.pos).map_err(|e| self.leb_err(e))
    }

    fn read_u8_imm(&mut self) -> Result<u8, Error> {
        leb128::read_u8(self.bytes, &mut self.pos).map_err(|e| self.leb_err(e))
    }

    fn read_u32_imm(&mut self) -> Result<u32, Error> {
        leb128::read_leb_u32(self.bytes, &mut self.pos).map_err(|e| self.leb_err(e))
    }

    fn read_i32_imm(&mut self) -> Result<i32, Error> {
        leb128::read_leb_i32(self.bytes, &mut self.pos).map_err(|e| self.leb_err(e))
    }

    fn read_i64_imm(&mut self) -> Result<i64, Error> {
        leb128::read_leb_i64(self.bytes, &mut self.pos).map_err(|e| self.leb_err(e))
    }

    fn read_f32_imm(&mut self) -> Result<u32, Error> {
        leb128::read_bytes::<4>(self.bytes, &mut self.pos)
            .map(u32::from_le_bytes)
            .map_err(|e| self.leb_err(e))
    }

    fn read_f64_imm(&mut self) -> Result<u64, Error> {
        leb128::read_bytes::<8>(self.bytes, &mut self.pos)
            .map(u64::from_le_bytes)
            .map_err(|e| self.leb_err(e))
    }

    fn read_bytes16_imm(&mut self) -> Result<[u8; 16], Error> {
        leb128::read_bytes::<16>(self.bytes, &mut self.pos).map_err(|e| self.leb_err(e))
    }

    fn read_blocktype(&mut self) -> Result<BlockType, Error> {
        let raw = leb128::read_leb_s33(self.bytes, &mut self.pos).map_err(|e| self.leb_err(e))?;
        let bt = BlockType::from_s33(raw)
            .ok_or_else(|| self.fail_with(format!("malformed blocktype {}", raw)))?;
        if bt == BlockType::Value(ValueType::V128) && !self.features().simd {
            return Err(self.fail("v128 blocktype requires the simd feature"));
        }
        Ok(bt)
    }

    fn read_reftype(&mut self) -> Result<ValueType, Error> {
        let byte = self.read_u8_imm()?;
        match ValueType::from_u8(byte) {
            Some(ty) if ty.is_ref() => Ok(ty),
            _ => Err(self.fail_with(format!("malformed reference type 0x{:02x}", byte))),
        }
    }

    fn read_memarg(&mut self, width: u32, exact: bool) -> Result<MemArg, Error> {
        let flags = self.read_u32_imm()?;
        let memidx = if flags & 0x40 != 0 {
            if !self.features().multi_memory {
                return Err(self.fail("memory index in memarg requires the multi-memory feature"));
            }
            self.read_u32_imm()?
        } else {
            0
        };
        let align = flags & 0x3F;
        let natural = width.trailing_zeros();
        if exact {
            if align != natural {
                return Err(self.fail("atomic access requires natural alignment"));
            }
        } else if align > natural {
            return Err(self.fail("alignment must not exceed the access width"));
        }
        let offset = self.read_u32_imm()?;
        self.ctx.require_memory(memidx).map_err(|e| self.fail_with(e))?;
        Ok(MemArg {
            offset,
            align,
            memidx,
        })
    }

    fn read_memidx(&mut self) -> Result<u32, Error> {
        let memidx = if self.features().multi_memory {
            self.read_u32_imm()?
        } else {
            let byte = self.read_u8_imm()?;
            if byte != 0 {
                return Err(self.fail("non-zero memory index requires the multi-memory feature"));
            }
            0
        };
        self.ctx.require_memory(memidx).map_err(|e| self.fail_with(e))?;
        Ok(memidx)
    }

    fn visit_unreachable(&mut self) -> Result<(), Error> {
        self.mark_unreachable();
        Ok(())
    }

    fn visit_nop(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn visit_block(&mut self, bt: BlockType) -> Result<(), Error> {
        let (params, results) = self.block_arity(bt)?;
        self.pop_vals(&params)?;
        self.push_frame(FrameKind::Block { pc: self.insn_pc }, params, results)
    }

    fn visit_loop(&mut self, bt: BlockType) -> Result<(), Error> {
        let (params, results) = self.block_arity(bt)?;
        self.pop_vals(&params)?;
        self.push_frame(FrameKind::Loop, params, results)
    }

    fn visit_if(&mut self, bt: BlockType) -> Result<(), Error> {
        let (params, results) = self.block_arity(bt)?;
        self.pop_val(ValueType::I32)?;
        self.pop_vals(&params)?;
        self.push_frame(FrameKind::If { pc: self.insn_pc }, params, results)
    }

    fn visit_else(&mut self) -> Result<(), Error> {
        let frame = self.pop_frame()?;
        let pc = match frame.kind {
            FrameKind::If { pc } => pc,
            _ => return Err(self.fail("misplaced else")),
        };
        // The slot after the `else` opcode itself.
        let else_slot = self.cur_pc();
        self.push_frame(
            FrameKind::Else { pc, else_slot },
            frame.start_types,
            frame.end_types,
        )
    }

    fn visit_end(&mut self) -> Result<(), Error> {
        let frame = self.pop_frame()?;
        match frame.kind {
            FrameKind::Body => {
                // Done; the run loop stops once the frame stack drains.
            }
            FrameKind::Block { pc } => {
                self.record_jump(pc, 0);
                self.push_vals(&frame.end_types)?;
            }
            FrameKind::Loop => {
                self.push_vals(&frame.end_types)?;
            }
            FrameKind::If { pc } => {
                // An `if` without `else` falls through with its inputs.
                if frame.start_types != frame.end_types {
                    return Err(
                        self.fail("if without else must have matching parameter and result types")
                    );
                }
                self.record_jump(pc, self.insn_pc);
                self.push_vals(&frame.end_types)?;
            }
            FrameKind::Else { pc, else_slot } => {
                self.record_jump(pc, else_slot);
                self.push_vals(&frame.end_types)?;
            }
        }
        Ok(())
    }

    fn visit_br(&mut self, label: u32) -> Result<(), Error> {
        let types = self.nth_frame(label)?.label_types().to_vec();
        self.pop_vals(&types)?;
        self.mark_unreachable();
        Ok(())
    }

    fn visit_br_if(&mut self, label: u32) -> Result<(), Error> {
        self.pop_val(ValueType::I32)?;
        let types = self.nth_frame(label)?.label_types().to_vec();
        self.peek_vals(&types)
    }

    fn visit_br_table(&mut self) -> Result<(), Error> {
        let count = self.read_u32_imm()?;
        let mut targets = Vec::with_capacity(count.min(1024) as usize);
        for _ in 0..count {
            targets.push(self.read_u32_imm()?);
        }
        let default = self.read_u32_imm()?;
        self.pop_val(ValueType::I32)?;
        let default_types = self.nth_frame(default)?.label_types().to_vec();
        for target in targets {
            let types = self.nth_frame(target)?.label_types().to_vec();
            if types.len() != default_types.len() {
                return Err(self.fail("br_table targets disagree on arity"));
            }
            self.peek_vals(&types)?;
        }
        self.pop_vals(&default_types)?;
        self.mark_unreachable();
        Ok(())
    }

    fn visit_return(&mut self) -> Result<(), Error> {
        let results = self.results.clone();
        self.pop_vals(&results)?;
        self.mark_unreachable();
        Ok(())
    }

    fn visit_call(&mut self, func: u32) -> Result<(), Error> {
        let ty = self
            .ctx
            .func_type(func)
            .map_err(|e| self.fail_with(e))?;
        self.pop_vals(ty.params())?;
        self.push_vals(ty.results())
    }

    fn visit_call_indirect(&mut self, type_idx: u32, table: u32) -> Result<(), Error> {
        let table_ty = self.ctx.require_table(table).map_err(|e| self.fail_with(e))?;
        if table_ty.elem() != ValueType::FuncRef {
            return Err(self.fail("call_indirect requires a funcref table"));
        }
        let ty = self
            .ctx
            .type_by_index(type_idx)
            .map_err(|e| self.fail_with(e))?;
        self.pop_val(ValueType::I32)?;
        self.pop_vals(ty.params())?;
        self.push_vals(ty.results())
    }

    fn visit_return_call(&mut self, func: u32) -> Result<(), Error> {
        let ty = self
            .ctx
            .func_type(func)
            .map_err(|e| self.fail_with(e))?;
        if ty.results() != &self.results[..] {
            return Err(self.fail("tail callee must return exactly the caller's results"));
        }
        self.pop_vals(ty.params())?;
        self.mark_unreachable();
        Ok(())
    }

    fn visit_return_call_indirect(&mut self, type_idx: u32, table: u32) -> Result<(), Error> {
        let table_ty = self.ctx.require_table(table).map_err(|e| self.fail_with(e))?;
        if table_ty.elem() != ValueType::FuncRef {
            return Err(self.fail("return_call_indirect requires a funcref table"));
        }
        let ty = self
            .ctx
            .type_by_index(type_idx)
            .map_err(|e| self.fail_with(e))?;
        if ty.results() != &self.results[..] {
            return Err(self.fail("tail callee must return exactly the caller's results"));
        }
        self.pop_val(ValueType::I32)?;
        self.pop_vals(ty.params())?;
        self.mark_unreachable();
        Ok(())
    }

    fn visit_drop(&mut self) -> Result<(), Error> {
        let dropped = self.pop_any(None)?;
        self.annotations.push(TypeAnnotation {
            pc: self.insn_pc,
            cells: dropped.cells(),
        });
        Ok(())
    }

    fn visit_select(&mut self) -> Result<(), Error> {
        self.pop_val(ValueType::I32)?;
        let first = self.pop_any(None)?;
        let expected = match first {
            StackType::Known(ty) => Some(ty),
            StackType::Unknown => None,
        };
        let second = self.pop_any(expected)?;
        let result = match (first, second) {
            (StackType::Known(ty), _) => StackType::Known(ty),
            (StackType::Unknown, other) => other,
        };
        if let StackType::Known(ty) = result {
            if ty.is_ref() {
                return Err(self.fail("untyped select cannot operate on references"));
            }
        }
        self.annotations.push(TypeAnnotation {
            pc: self.insn_pc,
            cells: result.cells(),
        });
        self.push_ty(result)
    }

    fn visit_select_t(&mut self) -> Result<(), Error> {
        let count = self.read_u32_imm()?;
        if count != 1 {
            return Err(self.fail("typed select requires exactly one value type"));
        }
        let byte = self.read_u8_imm()?;
        let ty = ValueType::from_u8(byte)
            .ok_or_else(|| self.fail_with(format!("malformed value type 0x{:02x}", byte)))?;
        if ty == ValueType::V128 && !self.features().simd {
            return Err(self.fail("v128 requires the simd feature"));
        }
        self.pop_val(ValueType::I32)?;
        self.pop_val(ty)?;
        self.pop_val(ty)?;
        self.push_val(ty)
    }

    fn visit_local_get(&mut self, idx: u32) -> Result<(), Error> {
        let ty = *self
            .locals
            .get(idx as usize)
            .ok_or_else(|| self.fail_with(format!("unknown local {}", idx)))?;
        self.push_val(ty)
    }

    fn visit_local_set(&mut self, idx: u32) -> Result<(), Error> {
        let ty = *self
            .locals
            .get(idx as usize)
            .ok_or_else(|| self.fail_with(format!("unknown local {}", idx)))?;
        self.pop_val(ty)
    }

    fn visit_local_tee(&mut self, idx: u32) -> Result<(), Error> {
        let ty = *self
            .locals
            .get(idx as usize)
            .ok_or_else(|| self.fail_with(format!("unknown local {}", idx)))?;
        self.pop_val(ty)?;
        self.push_val(ty)
    }

    fn visit_global_get(&mut self, idx: u32) -> Result<(), Error> {
        let ty = self.ctx.require_global(idx).map_err(|e| self.fail_with(e))?;
        self.push_val(ty.content())
    }

    fn visit_global_set(&mut self, idx: u32) -> Result<(), Error> {
        let ty = self.ctx.require_global(idx).map_err(|e| self.fail_with(e))?;
        if !ty.is_mutable() {
            return Err(self.fail_with(format!("global {} is immutable", idx)));
        }
        self.pop_val(ty.content())
    }

    fn visit_ref_null(&mut self, ty: ValueType) -> Result<(), Error> {
        self.push_val(ty)
    }

    fn visit_ref_is_null(&mut self) -> Result<(), Error> {
        let popped = self.pop_any(None)?;
        if let StackType::Known(ty) = popped {
            if !ty.is_ref() {
                return Err(self.fail("ref.is_null requires a reference operand"));
            }
        }
        self.push_val(ValueType::I32)
    }

    fn visit_ref_func(&mut self, func: u32) -> Result<(), Error> {
        self.ctx.func_type(func).map_err(|e| self.fail_with(e))?;
        if !self.ctx.is_declared_func(func) {
            return Err(self.fail_with(format!(
                "function {} is not declared for use by ref.func",
                func
            )));
        }
        self.push_val(ValueType::FuncRef)
    }

    fn visit_table_get(&mut self, table: u32) -> Result<(), Error> {
        let ty = self.ctx.require_table(table).map_err(|e| self.fail_with(e))?;
        self.pop_val(ValueType::I32)?;
        self.push_val(ty.elem())
    }

    fn visit_table_set(&mut self, table: u32) -> Result<(), Error> {
        let ty = self.ctx.require_table(table).map_err(|e| self.fail_with(e))?;
        self.pop_val(ty.elem())?;
        self.pop_val(ValueType::I32)
    }

    fn visit_table_init(&mut self, elem: u32, table: u32) -> Result<(), Error> {
        let table_ty = self.ctx.require_table(table).map_err(|e| self.fail_with(e))?;
        let elem_ty = self.ctx.require_elem(elem).map_err(|e| self.fail_with(e))?;
        if table_ty.elem() != elem_ty {
            return Err(self.fail("table.init element type mismatch"));
        }
        self.pop_val(ValueType::I32)?;
        self.pop_val(ValueType::I32)?;
        self.pop_val(ValueType::I32)
    }

    fn visit_elem_drop(&mut self, elem: u32) -> Result<(), Error> {
        self.ctx.require_elem(elem).map_err(|e| self.fail_with(e))?;
        Ok(())
    }

    fn visit_table_copy(&mut self, dst: u32, src: u32) -> Result<(), Error> {
        let dst_ty = self.ctx.require_table(dst).map_err(|e| self.fail_with(e))?;
        let src_ty = self.ctx.require_table(src).map_err(|e| self.fail_with(e))?;
        if dst_ty.elem() != src_ty.elem() {
            return Err(self.fail("table.copy element type mismatch"));
        }
        self.pop_val(ValueType::I32)?;
        self.pop_val(ValueType::I32)?;
        self.pop_val(ValueType::I32)
    }

    fn visit_table_grow(&mut self, table: u32) -> Result<(), Error> {
        let ty = self.ctx.require_table(table).map_err(|e| self.fail_with(e))?;
        self.pop_val(ValueType::I32)?;
        self.pop_val(ty.elem())?;
        self.push_val(ValueType::I32)
    }

    fn visit_table_size(&mut self, table: u32) -> Result<(), Error> {
        self.ctx.require_table(table).map_err(|e| self.fail_with(e))?;
        self.push_val(ValueType::I32)
    }

    fn visit_table_fill(&mut self, table: u32) -> Result<(), Error> {
        let ty = self.ctx.require_table(table).map_err(|e| self.fail_with(e))?;
        self.pop_val(ValueType::I32)?;
        self.pop_val(ty.elem())?;
        self.pop_val(ValueType::I32)
    }

    fn visit_load(
        &mut self,
        _memarg: MemArg,
        ty: ValueType,
        _width: u32,
        _signed: bool,
    ) -> Result<(), Error> {
        self.pop_val(ValueType::I32)?;
        self.push_val(ty)
    }

    fn visit_store(&mut self, _memarg: MemArg, ty: ValueType, _width: u32) -> Result<(), Error> {
        self.pop_val(ty)?;
        self.pop_val(ValueType::I32)
    }

    fn visit_memory_size(&mut self, _memidx: u32) -> Result<(), Error> {
        self.push_val(ValueType::I32)
    }

    fn visit_memory_grow(&mut self, _memidx: u32) -> Result<(), Error> {
        self.pop_val(ValueType::I32)?;
        self.push_val(ValueType::I32)
    }

    fn visit_memory_init(&mut self, data: u32, _memidx: u32) -> Result<(), Error> {
        self.ctx.require_data(data).map_err(|e| self.fail_with(e))?;
        self.pop_val(ValueType::I32)?;
        self.pop_val(ValueType::I32)?;
        self.pop_val(ValueType::I32)
    }

    fn visit_data_drop(&mut self, data: u32) -> Result<(), Error> {
        self.ctx.require_data(data).map_err(|e| self.fail_with(e))?;
        Ok(())
    }

    fn visit_memory_copy(&mut self, _dst: u32, _src: u32) -> Result<(), Error> {
        self.pop_val(ValueType::I32)?;
        self.pop_val(ValueType::I32)?;
        self.pop_val(ValueType::I32)
    }

    fn visit_memory_fill(&mut self, _memidx: u32) -> Result<(), Error> {
        self.pop_val(ValueType::I32)?;
        self.pop_val(ValueType::I32)?;
        self.pop_val(ValueType::I32)
    }

    fn visit_i32_const(&mut self, _value: i32) -> Result<(), Error> {
        self.push_val(ValueType::I32)
    }

    fn visit_i64_const(&mut self, _value: i64) -> Result<(), Error> {
        self.push_val(ValueType::I64)
    }

    fn visit_f32_const(&mut self, _bits: u32) -> Result<(), Error> {
        self.push_val(ValueType::F32)
    }

    fn visit_f64_const(&mut self, _bits: u64) -> Result<(), Error> {
        self.push_val(ValueType::F64)
    }

    fn visit_testop(
        &mut self,
        ty: ValueType,
        _f: fn(UntypedValue) -> UntypedValue,
    ) -> Result<(), Error> {
        self.pop_val(ty)?;
        self.push_val(ValueType::I32)
    }

    fn visit_relop(
        &mut self,
        ty: ValueType,
        _f: fn(UntypedValue, UntypedValue) -> UntypedValue,
    ) -> Result<(), Error> {
        self.pop_val(ty)?;
        self.pop_val(ty)?;
        self.push_val(ValueType::I32)
    }

    fn visit_unop(
        &mut self,
        ty: ValueType,
        _f: fn(UntypedValue) -> UntypedValue,
    ) -> Result<(), Error> {
        self.pop_val(ty)?;
        self.push_val(ty)
    }

    fn visit_binop(
        &mut self,
        ty: ValueType,
        _f: fn(UntypedValue, UntypedValue) -> UntypedValue,
    ) -> Result<(), Error> {
        self.pop_val(ty)?;
        self.pop_val(ty)?;
        self.push_val(ty)
    }

    fn visit_binop_partial(
        &mut self,
        ty: ValueType,
        _f: fn(UntypedValue, UntypedValue) -> Result<UntypedValue, TrapCode>,
    ) -> Result<(), Error> {
        self.pop_val(ty)?;
        self.pop_val(ty)?;
        self.push_val(ty)
    }

    fn visit_cvtop(
        &mut self,
        from: ValueType,
        to: ValueType,
        _f: fn(UntypedValue) -> UntypedValue,
    ) -> Result<(), Error> {
        self.pop_val(from)?;
        self.push_val(to)
    }

    fn visit_cvtop_partial(
        &mut self,
        from: ValueType,
        to: ValueType,
        _f: fn(UntypedValue) -> Result<UntypedValue, TrapCode>,
    ) -> Result<(), Error> {
        self.pop_val(from)?;
        self.push_val(to)
    }

    fn visit_v128_const(&mut self, _bytes: [u8; 16]) -> Result<(), Error> {
        self.push_val(ValueType::V128)
    }

    fn visit_v128_load(&mut self, _memarg: MemArg) -> Result<(), Error> {
        self.pop_val(ValueType::I32)?;
        self.push_val(ValueType::V128)
    }

    fn visit_v128_store(&mut self, _memarg: MemArg) -> Result<(), Error> {
        self.pop_val(ValueType::V128)?;
        self.pop_val(ValueType::I32)
    }

    fn visit_v128_load_extend(
        &mut self,
        _memarg: MemArg,
        _f: fn(u64) -> V128,
    ) -> Result<(), Error> {
        self.pop_val(ValueType::I32)?;
        self.push_val(ValueType::V128)
    }

    fn visit_v128_load_splat(&mut self, _memarg: MemArg, _width: u32) -> Result<(), Error> {
        self.pop_val(ValueType::I32)?;
        self.push_val(ValueType::V128)
    }

    fn visit_v128_load_zero(&mut self, _memarg: MemArg, _width: u32) -> Result<(), Error> {
        self.pop_val(ValueType::I32)?;
        self.push_val(ValueType::V128)
    }

    fn visit_v128_load_lane(
        &mut self,
        _memarg: MemArg,
        width: u32,
        lane: u8,
    ) -> Result<(), Error> {
        if lane as u32 >= 16 / width {
            return Err(self.fail("lane index out of range"));
        }
        self.pop_val(ValueType::V128)?;
        self.pop_val(ValueType::I32)?;
        self.push_val(ValueType::V128)
    }

    fn visit_v128_store_lane(
        &mut self,
        _memarg: MemArg,
        width: u32,
        lane: u8,
    ) -> Result<(), Error> {
        if lane as u32 >= 16 / width {
            return Err(self.fail("lane index out of range"));
        }
        self.pop_val(ValueType::V128)?;
        self.pop_val(ValueType::I32)
    }

    fn visit_i8x16_shuffle(&mut self, lanes: [u8; 16]) -> Result<(), Error> {
        if lanes.iter().any(|&lane| lane >= 32) {
            return Err(self.fail("shuffle lane index out of range"));
        }
        self.pop_val(ValueType::V128)?;
        self.pop_val(ValueType::V128)?;
        self.push_val(ValueType::V128)
    }

    fn visit_v128_unop(&mut self, _f: fn(V128) -> V128) -> Result<(), Error> {
        self.pop_val(ValueType::V128)?;
        self.push_val(ValueType::V128)
    }

    fn visit_v128_binop(&mut self, _f: fn(V128, V128) -> V128) -> Result<(), Error> {
        self.pop_val(ValueType::V128)?;
        self.pop_val(ValueType::V128)?;
        self.push_val(ValueType::V128)
    }

    fn visit_v128_bitselect(&mut self) -> Result<(), Error> {
        self.pop_val(ValueType::V128)?;
        self.pop_val(ValueType::V128)?;
        self.pop_val(ValueType::V128)?;
        self.push_val(ValueType::V128)
    }

    fn visit_v128_shift(&mut self, _f: fn(V128, u32) -> V128) -> Result<(), Error> {
        self.pop_val(ValueType::I32)?;
        self.pop_val(ValueType::V128)?;
        self.push_val(ValueType::V128)
    }

    fn visit_v128_testop(&mut self, _f: fn(V128) -> bool) -> Result<(), Error> {
        self.pop_val(ValueType::V128)?;
        self.push_val(ValueType::I32)
    }

    fn visit_v128_bitmask(&mut self, _f: fn(V128) -> i32) -> Result<(), Error> {
        self.pop_val(ValueType::V128)?;
        self.push_val(ValueType::I32)
    }

    fn visit_splat(&mut self, ty: ValueType, _f: fn(UntypedValue) -> V128) -> Result<(), Error> {
        self.pop_val(ty)?;
        self.push_val(ValueType::V128)
    }

    fn visit_extract_lane(
        &mut self,
        ty: ValueType,
        lanes: u8,
        lane: u8,
        _f: fn(V128, u8) -> UntypedValue,
    ) -> Result<(), Error> {
        if lane >= lanes {
            return Err(self.fail("lane index out of range"));
        }
        self.pop_val(ValueType::V128)?;
        self.push_val(ty)
    }

    fn visit_replace_lane(
        &mut self,
        ty: ValueType,
        lanes: u8,
        lane: u8,
        _f: fn(V128, u8, UntypedValue) -> V128,
    ) -> Result<(), Error> {
        if lane >= lanes {
            return Err(self.fail("lane index out of range"));
        }
        self.pop_val(ty)?;
        self.pop_val(ValueType::V128)?;
        self.push_val(ValueType::V128)
    }

    #[cfg(feature = "threads")]
    fn visit_atomic_notify(&mut self, _memarg: MemArg) -> Result<(), Error> {
        self.pop_val(ValueType::I32)?;
        self.pop_val(ValueType::I32)?;
        self.push_val(ValueType::I32)
    }

    #[cfg(feature = "threads")]
    fn visit_atomic_wait(&mut self, _memarg: MemArg, width: u32) -> Result<(), Error> {
        self.pop_val(ValueType::I64)?;
        self.pop_val(if width == 8 {
            ValueType::I64
        } else {
            ValueType::I32
        })?;
        self.pop_val(ValueType::I32)?;
        self.push_val(ValueType::I32)
    }

    #[cfg(feature = "threads")]
    fn visit_atomic_fence(&mut self) -> Result<(), Error> {
        Ok(())
    }

    #[cfg(feature = "threads")]
    fn visit_atomic_load(
        &mut self,
        _memarg: MemArg,
        ty: ValueType,
        _width: u32,
    ) -> Result<(), Error> {
        self.pop_val(ValueType::I32)?;
        self.push_val(ty)
    }

    #[cfg(feature = "threads")]
    fn visit_atomic_store(
        &mut self,
        _memarg: MemArg,
        ty: ValueType,
        _width: u32,
    ) -> Result<(), Error> {
        self.pop_val(ty)?;
        self.pop_val(ValueType::I32)
    }

    #[cfg(feature = "threads")]
    fn visit_atomic_rmw(
        &mut self,
        _memarg: MemArg,
        ty: ValueType,
        _width: u32,
        _f: fn(u64, u64) -> u64,
    ) -> Result<(), Error> {
        self.pop_val(ty)?;
        self.pop_val(ValueType::I32)?;
        self.push_val(ty)
    }

    #[cfg(feature = "threads")]
    fn visit_atomic_cmpxchg(
        &mut self,
        _memarg: MemArg,
        ty: ValueType,
        _width: u32,
    ) -> Result<(), Error> {
        self.pop_val(ty)?;
        self.pop_val(ty)?;
        self.pop_val(ValueType::I32)?;
        self.push_val(ty)
    }
}
