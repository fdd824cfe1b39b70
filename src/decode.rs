//! The shared instruction-decoding skeleton.
//!
//! [`dispatch`] reads one instruction (opcode plus immediates) and hands
//! it to an [`InsnContext`]. The validator and the execution engine are
//! the two implementations of the trait: the former type-checks on an
//! abstract stack with checked immediate readers, the latter runs the
//! operation with unchecked readers over pre-validated bytes. Since both
//! are driven by this one dispatch, the two paths cannot drift apart in
//! their view of the opcode space.

use crate::features::Features;
use crate::isa;
use crate::types::BlockType;
use crate::untyped::UntypedValue;
use crate::v128::V128;
use crate::value::ValueType;
use crate::TrapCode;

/// A decoded `memarg` immediate.
#[derive(Debug, Copy, Clone)]
pub(crate) struct MemArg {
    /// Static offset added to the dynamic address.
    pub offset: u32,
    /// The encoded alignment exponent.
    pub align: u32,
    /// Target memory; zero unless multi-memory is enabled.
    pub memidx: u32,
}

/// One side of the shared decoder: immediate readers plus one handler
/// per instruction shape.
///
/// Reader methods advance the context's pc. The validator's readers are
/// checked (length-bounded LEB128, alignment and feature rules); the
/// executor's are the unchecked fast path over validated bytes.
pub(crate) trait InsnContext {
    type Error;

    fn features(&self) -> Features;

    /// Builds the error for an opcode that is unknown or gated off.
    fn unsupported(&mut self, what: &'static str) -> Self::Error;

    fn read_opcode(&mut self) -> Result<u8, Self::Error>;
    fn read_subopcode(&mut self) -> Result<u32, Self::Error>;
    fn read_u8_imm(&mut self) -> Result<u8, Self::Error>;
    fn read_u32_imm(&mut self) -> Result<u32, Self::Error>;
    fn read_i32_imm(&mut self) -> Result<i32, Self::Error>;
    fn read_i64_imm(&mut self) -> Result<i64, Self::Error>;
    fn read_f32_imm(&mut self) -> Result<u32, Self::Error>;
    fn read_f64_imm(&mut self) -> Result<u64, Self::Error>;
    fn read_bytes16_imm(&mut self) -> Result<[u8; 16], Self::Error>;
    fn read_blocktype(&mut self) -> Result<BlockType, Self::Error>;
    fn read_reftype(&mut self) -> Result<ValueType, Self::Error>;
    /// Reads a memarg for an access of `width` bytes. `exact` requires
    /// natural alignment (atomics); otherwise the alignment exponent may
    /// be anything up to the natural one.
    fn read_memarg(&mut self, width: u32, exact: bool) -> Result<MemArg, Self::Error>;
    /// Reads a memory index immediate: a LEB index under multi-memory, a
    /// mandatory zero byte otherwise.
    fn read_memidx(&mut self) -> Result<u32, Self::Error>;

    // Control.
    fn visit_unreachable(&mut self) -> Result<(), Self::Error>;
    fn visit_nop(&mut self) -> Result<(), Self::Error>;
    fn visit_block(&mut self, bt: BlockType) -> Result<(), Self::Error>;
    fn visit_loop(&mut self, bt: BlockType) -> Result<(), Self::Error>;
    fn visit_if(&mut self, bt: BlockType) -> Result<(), Self::Error>;
    fn visit_else(&mut self) -> Result<(), Self::Error>;
    fn visit_end(&mut self) -> Result<(), Self::Error>;
    fn visit_br(&mut self, label: u32) -> Result<(), Self::Error>;
    fn visit_br_if(&mut self, label: u32) -> Result<(), Self::Error>;
    /// Reads its own target-vector immediates.
    fn visit_br_table(&mut self) -> Result<(), Self::Error>;
    fn visit_return(&mut self) -> Result<(), Self::Error>;
    fn visit_call(&mut self, func: u32) -> Result<(), Self::Error>;
    fn visit_call_indirect(&mut self, type_idx: u32, table: u32) -> Result<(), Self::Error>;
    fn visit_return_call(&mut self, func: u32) -> Result<(), Self::Error>;
    fn visit_return_call_indirect(&mut self, type_idx: u32, table: u32)
        -> Result<(), Self::Error>;

    // Parametric.
    fn visit_drop(&mut self) -> Result<(), Self::Error>;
    fn visit_select(&mut self) -> Result<(), Self::Error>;
    /// Reads its own value-type-vector immediate.
    fn visit_select_t(&mut self) -> Result<(), Self::Error>;

    // Variables.
    fn visit_local_get(&mut self, idx: u32) -> Result<(), Self::Error>;
    fn visit_local_set(&mut self, idx: u32) -> Result<(), Self::Error>;
    fn visit_local_tee(&mut self, idx: u32) -> Result<(), Self::Error>;
    fn visit_global_get(&mut self, idx: u32) -> Result<(), Self::Error>;
    fn visit_global_set(&mut self, idx: u32) -> Result<(), Self::Error>;

    // References.
    fn visit_ref_null(&mut self, ty: ValueType) -> Result<(), Self::Error>;
    fn visit_ref_is_null(&mut self) -> Result<(), Self::Error>;
    fn visit_ref_func(&mut self, func: u32) -> Result<(), Self::Error>;

    // Tables.
    fn visit_table_get(&mut self, table: u32) -> Result<(), Self::Error>;
    fn visit_table_set(&mut self, table: u32) -> Result<(), Self::Error>;
    fn visit_table_init(&mut self, elem: u32, table: u32) -> Result<(), Self::Error>;
    fn visit_elem_drop(&mut self, elem: u32) -> Result<(), Self::Error>;
    fn visit_table_copy(&mut self, dst: u32, src: u32) -> Result<(), Self::Error>;
    fn visit_table_grow(&mut self, table: u32) -> Result<(), Self::Error>;
    fn visit_table_size(&mut self, table: u32) -> Result<(), Self::Error>;
    fn visit_table_fill(&mut self, table: u32) -> Result<(), Self::Error>;

    // Memory.
    fn visit_load(
        &mut self,
        memarg: MemArg,
        ty: ValueType,
        width: u32,
        signed: bool,
    ) -> Result<(), Self::Error>;
    fn visit_store(&mut self, memarg: MemArg, ty: ValueType, width: u32)
        -> Result<(), Self::Error>;
    fn visit_memory_size(&mut self, memidx: u32) -> Result<(), Self::Error>;
    fn visit_memory_grow(&mut self, memidx: u32) -> Result<(), Self::Error>;
    fn visit_memory_init(&mut self, data: u32, memidx: u32) -> Result<(), Self::Error>;
    fn visit_data_drop(&mut self, data: u32) -> Result<(), Self::Error>;
    fn visit_memory_copy(&mut self, dst: u32, src: u32) -> Result<(), Self::Error>;
    fn visit_memory_fill(&mut self, memidx: u32) -> Result<(), Self::Error>;

    // Constants.
    fn visit_i32_const(&mut self, value: i32) -> Result<(), Self::Error>;
    fn visit_i64_const(&mut self, value: i64) -> Result<(), Self::Error>;
    fn visit_f32_const(&mut self, bits: u32) -> Result<(), Self::Error>;
    fn visit_f64_const(&mut self, bits: u64) -> Result<(), Self::Error>;

    // Scalar numeric shapes.
    fn visit_testop(
        &mut self,
        ty: ValueType,
        f: fn(UntypedValue) -> UntypedValue,
    ) -> Result<(), Self::Error>;
    fn visit_relop(
        &mut self,
        ty: ValueType,
        f: fn(UntypedValue, UntypedValue) -> UntypedValue,
    ) -> Result<(), Self::Error>;
    fn visit_unop(
        &mut self,
        ty: ValueType,
        f: fn(UntypedValue) -> UntypedValue,
    ) -> Result<(), Self::Error>;
    fn visit_binop(
        &mut self,
        ty: ValueType,
        f: fn(UntypedValue, UntypedValue) -> UntypedValue,
    ) -> Result<(), Self::Error>;
    fn visit_binop_partial(
        &mut self,
        ty: ValueType,
        f: fn(UntypedValue, UntypedValue) -> Result<UntypedValue, TrapCode>,
    ) -> Result<(), Self::Error>;
    fn visit_cvtop(
        &mut self,
        from: ValueType,
        to: ValueType,
        f: fn(UntypedValue) -> UntypedValue,
    ) -> Result<(), Self::Error>;
    fn visit_cvtop_partial(
        &mut self,
        from: ValueType,
        to: ValueType,
        f: fn(UntypedValue) -> Result<UntypedValue, TrapCode>,
    ) -> Result<(), Self::Error>;

    // SIMD shapes.
    fn visit_v128_const(&mut self, bytes: [u8; 16]) -> Result<(), Self::Error>;
    fn visit_v128_load(&mut self, memarg: MemArg) -> Result<(), Self::Error>;
    fn visit_v128_store(&mut self, memarg: MemArg) -> Result<(), Self::Error>;
    fn visit_v128_load_extend(
        &mut self,
        memarg: MemArg,
        f: fn(u64) -> V128,
    ) -> Result<(), Self::Error>;
    fn visit_v128_load_splat(&mut self, memarg: MemArg, width: u32) -> Result<(), Self::Error>;
    fn visit_v128_load_zero(&mut self, memarg: MemArg, width: u32) -> Result<(), Self::Error>;
    fn visit_v128_load_lane(
        &mut self,
        memarg: MemArg,
        width: u32,
        lane: u8,
    ) -> Result<(), Self::Error>;
    fn visit_v128_store_lane(
        &mut self,
        memarg: MemArg,
        width: u32,
        lane: u8,
    ) -> Result<(), Self::Error>;
    fn visit_i8x16_shuffle(&mut self, lanes: [u8; 16]) -> Result<(), Self::Error>;
    fn visit_v128_unop(&mut self, f: fn(V128) -> V128) -> Result<(), Self::Error>;
    fn visit_v128_binop(&mut self, f: fn(V128, V128) -> V128) -> Result<(), Self::Error>;
    fn visit_v128_bitselect(&mut self) -> Result<(), Self::Error>;
    fn visit_v128_shift(&mut self, f: fn(V128, u32) -> V128) -> Result<(), Self::Error>;
    fn visit_v128_testop(&mut self, f: fn(V128) -> bool) -> Result<(), Self::Error>;
    fn visit_v128_bitmask(&mut self, f: fn(V128) -> i32) -> Result<(), Self::Error>;
    fn visit_splat(
        &mut self,
        ty: ValueType,
        f: fn(UntypedValue) -> V128,
    ) -> Result<(), Self::Error>;
    fn visit_extract_lane(
        &mut self,
        ty: ValueType,
        lanes: u8,
        lane: u8,
        f: fn(V128, u8) -> UntypedValue,
    ) -> Result<(), Self::Error>;
    fn visit_replace_lane(
        &mut self,
        ty: ValueType,
        lanes: u8,
        lane: u8,
        f: fn(V128, u8, UntypedValue) -> V128,
    ) -> Result<(), Self::Error>;

    // Atomics.
    #[cfg(feature = "threads")]
    fn visit_atomic_notify(&mut self, memarg: MemArg) -> Result<(), Self::Error>;
    #[cfg(feature = "threads")]
    fn visit_atomic_wait(&mut self, memarg: MemArg, width: u32) -> Result<(), Self::Error>;
    #[cfg(feature = "threads")]
    fn visit_atomic_fence(&mut self) -> Result<(), Self::Error>;
    #[cfg(feature = "threads")]
    fn visit_atomic_load(
        &mut self,
        memarg: MemArg,
        ty: ValueType,
        width: u32,
    ) -> Result<(), Self::Error>;
    #[cfg(feature = "threads")]
    fn visit_atomic_store(
        &mut self,
        memarg: MemArg,
        ty: ValueType,
        width: u32,
    ) -> Result<(), Self::Error>;
    #[cfg(feature = "threads")]
    fn visit_atomic_rmw(
        &mut self,
        memarg: MemArg,
        ty: ValueType,
        width: u32,
        f: fn(u64, u64) -> u64,
    ) -> Result<(), Self::Error>;
    #[cfg(feature = "threads")]
    fn visit_atomic_cmpxchg(
        &mut self,
        memarg: MemArg,
        ty: ValueType,
        width: u32,
    ) -> Result<(), Self::Error>;
}

/// Decodes and handles one instruction.
pub(crate) fn dispatch<C: InsnContext>(cx: &mut C) -> Result<(), C::Error> {
    use ValueType::{F32, F64, I32, I64};
    let op = cx.read_opcode()?;
    match op {
        isa::UNREACHABLE => cx.visit_unreachable(),
        isa::NOP => cx.visit_nop(),
        isa::BLOCK => {
            let bt = cx.read_blocktype()?;
            cx.visit_block(bt)
        }
        isa::LOOP => {
            let bt = cx.read_blocktype()?;
            cx.visit_loop(bt)
        }
        isa::IF => {
            let bt = cx.read_blocktype()?;
            cx.visit_if(bt)
        }
        isa::ELSE => cx.visit_else(),
        isa::END => cx.visit_end(),
        isa::BR => {
            let label = cx.read_u32_imm()?;
            cx.visit_br(label)
        }
        isa::BR_IF => {
            let label = cx.read_u32_imm()?;
            cx.visit_br_if(label)
        }
        isa::BR_TABLE => cx.visit_br_table(),
        isa::RETURN => cx.visit_return(),
        isa::CALL => {
            let func = cx.read_u32_imm()?;
            cx.visit_call(func)
        }
        isa::CALL_INDIRECT => {
            let type_idx = cx.read_u32_imm()?;
            let table = cx.read_u32_imm()?;
            cx.visit_call_indirect(type_idx, table)
        }
        isa::RETURN_CALL => {
            if !cx.features().tail_call {
                return Err(cx.unsupported("return_call requires the tail-call feature"));
            }
            let func = cx.read_u32_imm()?;
            cx.visit_return_call(func)
        }
        isa::RETURN_CALL_INDIRECT => {
            if !cx.features().tail_call {
                return Err(cx.unsupported("return_call_indirect requires the tail-call feature"));
            }
            let type_idx = cx.read_u32_imm()?;
            let table = cx.read_u32_imm()?;
            cx.visit_return_call_indirect(type_idx, table)
        }
        isa::DROP => cx.visit_drop(),
        isa::SELECT => cx.visit_select(),
        isa::SELECT_T => cx.visit_select_t(),
        isa::LOCAL_GET => {
            let idx = cx.read_u32_imm()?;
            cx.visit_local_get(idx)
        }
        isa::LOCAL_SET => {
            let idx = cx.read_u32_imm()?;
            cx.visit_local_set(idx)
        }
        isa::LOCAL_TEE => {
            let idx = cx.read_u32_imm()?;
            cx.visit_local_tee(idx)
        }
        isa::GLOBAL_GET => {
            let idx = cx.read_u32_imm()?;
            cx.visit_global_get(idx)
        }
        isa::GLOBAL_SET => {
            let idx = cx.read_u32_imm()?;
            cx.visit_global_set(idx)
        }
        isa::TABLE_GET => {
            let table = cx.read_u32_imm()?;
            cx.visit_table_get(table)
        }
        isa::TABLE_SET => {
            let table = cx.read_u32_imm()?;
            cx.visit_table_set(table)
        }
        isa::I32_LOAD => {
            let m = cx.read_memarg(4, false)?;
            cx.visit_load(m, I32, 4, false)
        }
        isa::I64_LOAD => {
            let m = cx.read_memarg(8, false)?;
            cx.visit_load(m, I64, 8, false)
        }
        isa::F32_LOAD => {
            let m = cx.read_memarg(4, false)?;
            cx.visit_load(m, F32, 4, false)
        }
        isa::F64_LOAD => {
            let m = cx.read_memarg(8, false)?;
            cx.visit_load(m, F64, 8, false)
        }
        isa::I32_LOAD8_S => {
            let m = cx.read_memarg(1, false)?;
            cx.visit_load(m, I32, 1, true)
        }
        isa::I32_LOAD8_U => {
            let m = cx.read_memarg(1, false)?;
            cx.visit_load(m, I32, 1, false)
        }
        isa::I32_LOAD16_S => {
            let m = cx.read_memarg(2, false)?;
            cx.visit_load(m, I32, 2, true)
        }
        isa::I32_LOAD16_U => {
            let m = cx.read_memarg(2, false)?;
            cx.visit_load(m, I32, 2, false)
        }
        isa::I64_LOAD8_S => {
            let m = cx.read_memarg(1, false)?;
            cx.visit_load(m, I64, 1, true)
        }
        isa::I64_LOAD8_U => {
            let m = cx.read_memarg(1, false)?;
            cx.visit_load(m, I64, 1, false)
        }
        isa::I64_LOAD16_S => {
            let m = cx.read_memarg(2, false)?;
            cx.visit_load(m, I64, 2, true)
        }
        isa::I64_LOAD16_U => {
            let m = cx.read_memarg(2, false)?;
            cx.visit_load(m, I64, 2, false)
        }
        isa::I64_LOAD32_S => {
            let m = cx.read_memarg(4, false)?;
            cx.visit_load(m, I64, 4, true)
        }
        isa::I64_LOAD32_U => {
            let m = cx.read_memarg(4, false)?;
            cx.visit_load(m, I64, 4, false)
        }
        isa::I32_STORE => {
            let m = cx.read_memarg(4, false)?;
            cx.visit_store(m, I32, 4)
        }
        isa::I64_STORE => {
            let m = cx.read_memarg(8, false)?;
            cx.visit_store(m, I64, 8)
        }
        isa::F32_STORE => {
            let m = cx.read_memarg(4, false)?;
            cx.visit_store(m, F32, 4)
        }
        isa::F64_STORE => {
            let m = cx.read_memarg(8, false)?;
            cx.visit_store(m, F64, 8)
        }
        isa::I32_STORE8 => {
            let m = cx.read_memarg(1, false)?;
            cx.visit_store(m, I32, 1)
        }
        isa::I32_STORE16 => {
            let m = cx.read_memarg(2, false)?;
            cx.visit_store(m, I32, 2)
        }
        isa::I64_STORE8 => {
            let m = cx.read_memarg(1, false)?;
            cx.visit_store(m, I64, 1)
        }
        isa::I64_STORE16 => {
            let m = cx.read_memarg(2, false)?;
            cx.visit_store(m, I64, 2)
        }
        isa::I64_STORE32 => {
            let m = cx.read_memarg(4, false)?;
            cx.visit_store(m, I64, 4)
        }
        isa::MEMORY_SIZE => {
            let memidx = cx.read_memidx()?;
            cx.visit_memory_size(memidx)
        }
        isa::MEMORY_GROW => {
            let memidx = cx.read_memidx()?;
            cx.visit_memory_grow(memidx)
        }
        isa::I32_CONST => {
            let value = cx.read_i32_imm()?;
            cx.visit_i32_const(value)
        }
        isa::I64_CONST => {
            let value = cx.read_i64_imm()?;
            cx.visit_i64_const(value)
        }
        isa::F32_CONST => {
            let bits = cx.read_f32_imm()?;
            cx.visit_f32_const(bits)
        }
        isa::F64_CONST => {
            let bits = cx.read_f64_imm()?;
            cx.visit_f64_const(bits)
        }
        isa::I32_EQZ => cx.visit_testop(I32, UntypedValue::i32_eqz),
        isa::I32_EQ => cx.visit_relop(I32, UntypedValue::i32_eq),
        isa::I32_NE => cx.visit_relop(I32, UntypedValue::i32_ne),
        isa::I32_LT_S => cx.visit_relop(I32, UntypedValue::i32_lt_s),
        isa::I32_LT_U => cx.visit_relop(I32, UntypedValue::i32_lt_u),
        isa::I32_GT_S => cx.visit_relop(I32, UntypedValue::i32_gt_s),
        isa::I32_GT_U => cx.visit_relop(I32, UntypedValue::i32_gt_u),
        isa::I32_LE_S => cx.visit_relop(I32, UntypedValue::i32_le_s),
        isa::I32_LE_U => cx.visit_relop(I32, UntypedValue::i32_le_u),
        isa::I32_GE_S => cx.visit_relop(I32, UntypedValue::i32_ge_s),
        isa::I32_GE_U => cx.visit_relop(I32, UntypedValue::i32_ge_u),
        isa::I64_EQZ => cx.visit_testop(I64, UntypedValue::i64_eqz),
        isa::I64_EQ => cx.visit_relop(I64, UntypedValue::i64_eq),
        isa::I64_NE => cx.visit_relop(I64, UntypedValue::i64_ne),
        isa::I64_LT_S => cx.visit_relop(I64, UntypedValue::i64_lt_s),
        isa::I64_LT_U => cx.visit_relop(I64, UntypedValue::i64_lt_u),
        isa::I64_GT_S => cx.visit_relop(I64, UntypedValue::i64_gt_s),
        isa::I64_GT_U => cx.visit_relop(I64, UntypedValue::i64_gt_u),
        isa::I64_LE_S => cx.visit_relop(I64, UntypedValue::i64_le_s),
        isa::I64_LE_U => cx.visit_relop(I64, UntypedValue::i64_le_u),
        isa::I64_GE_S => cx.visit_relop(I64, UntypedValue::i64_ge_s),
        isa::I64_GE_U => cx.visit_relop(I64, UntypedValue::i64_ge_u),
        isa::F32_EQ => cx.visit_relop(F32, UntypedValue::f32_eq),
        isa::F32_NE => cx.visit_relop(F32, UntypedValue::f32_ne),
        isa::F32_LT => cx.visit_relop(F32, UntypedValue::f32_lt),
        isa::F32_GT => cx.visit_relop(F32, UntypedValue::f32_gt),
        isa::F32_LE => cx.visit_relop(F32, UntypedValue::f32_le),
        isa::F32_GE => cx.visit_relop(F32, UntypedValue::f32_ge),
        isa::F64_EQ => cx.visit_relop(F64, UntypedValue::f64_eq),
        isa::F64_NE => cx.visit_relop(F64, UntypedValue::f64_ne),
        isa::F64_LT => cx.visit_relop(F64, UntypedValue::f64_lt),
        isa::F64_GT => cx.visit_relop(F64, UntypedValue::f64_gt),
        isa::F64_LE => cx.visit_relop(F64, UntypedValue::f64_le),
        isa::F64_GE => cx.visit_relop(F64, UntypedValue::f64_ge),
        isa::I32_CLZ => cx.visit_unop(I32, UntypedValue::i32_clz),
        isa::I32_CTZ => cx.visit_unop(I32, UntypedValue::i32_ctz),
        isa::I32_POPCNT => cx.visit_unop(I32, UntypedValue::i32_popcnt),
        isa::I32_ADD => cx.visit_binop(I32, UntypedValue::i32_add),
        isa::I32_SUB => cx.visit_binop(I32, UntypedValue::i32_sub),
        isa::I32_MUL => cx.visit_binop(I32, UntypedValue::i32_mul),
        isa::I32_DIV_S => cx.visit_binop_partial(I32, UntypedValue::i32_div_s),
        isa::I32_DIV_U => cx.visit_binop_partial(I32, UntypedValue::i32_div_u),
        isa::I32_REM_S => cx.visit_binop_partial(I32, UntypedValue::i32_rem_s),
        isa::I32_REM_U => cx.visit_binop_partial(I32, UntypedValue::i32_rem_u),
        isa::I32_AND => cx.visit_binop(I32, UntypedValue::i32_and),
        isa::I32_OR => cx.visit_binop(I32, UntypedValue::i32_or),
        isa::I32_XOR => cx.visit_binop(I32, UntypedValue::i32_xor),
        isa::I32_SHL => cx.visit_binop(I32, UntypedValue::i32_shl),
        isa::I32_SHR_S => cx.visit_binop(I32, UntypedValue::i32_shr_s),
        isa::I32_SHR_U => cx.visit_binop(I32, UntypedValue::i32_shr_u),
        isa::I32_ROTL => cx.visit_binop(I32, UntypedValue::i32_rotl),
        isa::I32_ROTR => cx.visit_binop(I32, UntypedValue::i32_rotr),
        isa::I64_CLZ => cx.visit_unop(I64, UntypedValue::i64_clz),
        isa::I64_CTZ => cx.visit_unop(I64, UntypedValue::i64_ctz),
        isa::I64_POPCNT => cx.visit_unop(I64, UntypedValue::i64_popcnt),
        isa::I64_ADD => cx.visit_binop(I64, UntypedValue::i64_add),
        isa::I64_SUB => cx.visit_binop(I64, UntypedValue::i64_sub),
        isa::I64_MUL => cx.visit_binop(I64, UntypedValue::i64_mul),
        isa::I64_DIV_S => cx.visit_binop_partial(I64, UntypedValue::i64_div_s),
        isa::I64_DIV_U => cx.visit_binop_partial(I64, UntypedValue::i64_div_u),
        isa::I64_REM_S => cx.visit_binop_partial(I64, UntypedValue::i64_rem_s),
        isa::I64_REM_U => cx.visit_binop_partial(I64, UntypedValue::i64_rem_u),
        isa::I64_AND => cx.visit_binop(I64, UntypedValue::i64_and),
        isa::I64_OR => cx.visit_binop(I64, UntypedValue::i64_or),
        isa::I64_XOR => cx.visit_binop(I64, UntypedValue::i64_xor),
        isa::I64_SHL => cx.visit_binop(I64, UntypedValue::i64_shl),
        isa::I64_SHR_S => cx.visit_binop(I64, UntypedValue::i64_shr_s),
        isa::I64_SHR_U => cx.visit_binop(I64, UntypedValue::i64_shr_u),
        isa::I64_ROTL => cx.visit_binop(I64, UntypedValue::i64_rotl),
        isa::I64_ROTR => cx.visit_binop(I64, UntypedValue::i64_rotr),
        isa::F32_ABS => cx.visit_unop(F32, UntypedValue::f32_abs),
        isa::F32_NEG => cx.visit_unop(F32, UntypedValue::f32_neg),
        isa::F32_CEIL => cx.visit_unop(F32, UntypedValue::f32_ceil),
        isa::F32_FLOOR => cx.visit_unop(F32, UntypedValue::f32_floor),
        isa::F32_TRUNC => cx.visit_unop(F32, UntypedValue::f32_trunc),
        isa::F32_NEAREST => cx.visit_unop(F32, UntypedValue::f32_nearest),
        isa::F32_SQRT => cx.visit_unop(F32, UntypedValue::f32_sqrt),
        isa::F32_ADD => cx.visit_binop(F32, UntypedValue::f32_add),
        isa::F32_SUB => cx.visit_binop(F32, UntypedValue::f32_sub),
        isa::F32_MUL => cx.visit_binop(F32, UntypedValue::f32_mul),
        isa::F32_DIV => cx.visit_binop_partial(F32, UntypedValue::f32_div),
        isa::F32_MIN => cx.visit_binop(F32, UntypedValue::f32_min),
        isa::F32_MAX => cx.visit_binop(F32, UntypedValue::f32_max),
        isa::F32_COPYSIGN => cx.visit_binop(F32, UntypedValue::f32_copysign),
        isa::F64_ABS => cx.visit_unop(F64, UntypedValue::f64_abs),
        isa::F64_NEG => cx.visit_unop(F64, UntypedValue::f64_neg),
        isa::F64_CEIL => cx.visit_unop(F64, UntypedValue::f64_ceil),
        isa::F64_FLOOR => cx.visit_unop(F64, UntypedValue::f64_floor),
        isa::F64_TRUNC => cx.visit_unop(F64, UntypedValue::f64_trunc),
        isa::F64_NEAREST => cx.visit_unop(F64, UntypedValue::f64_nearest),
        isa::F64_SQRT => cx.visit_unop(F64, UntypedValue::f64_sqrt),
        isa::F64_ADD => cx.visit_binop(F64, UntypedValue::f64_add),
        isa::F64_SUB => cx.visit_binop(F64, UntypedValue::f64_sub),
        isa::F64_MUL => cx.visit_binop(F64, UntypedValue::f64_mul),
        isa::F64_DIV => cx.visit_binop_partial(F64, UntypedValue::f64_div),
        isa::F64_MIN => cx.visit_binop(F64, UntypedValue::f64_min),
        isa::F64_MAX => cx.visit_binop(F64, UntypedValue::f64_max),
        isa::F64_COPYSIGN => cx.visit_binop(F64, UntypedValue::f64_copysign),
        isa::I32_WRAP_I64 => cx.visit_cvtop(I64, I32, UntypedValue::i32_wrap_i64),
        isa::I32_TRUNC_F32_S => cx.visit_cvtop_partial(F32, I32, UntypedValue::i32_trunc_f32_s),
        isa::I32_TRUNC_F32_U => cx.visit_cvtop_partial(F32, I32, UntypedValue::i32_trunc_f32_u),
        isa::I32_TRUNC_F64_S => cx.visit_cvtop_partial(F64, I32, UntypedValue::i32_trunc_f64_s),
        isa::I32_TRUNC_F64_U => cx.visit_cvtop_partial(F64, I32, UntypedValue::i32_trunc_f64_u),
        isa::I64_EXTEND_I32_S => cx.visit_cvtop(I32, I64, UntypedValue::i64_extend_i32_s),
        isa::I64_EXTEND_I32_U => cx.visit_cvtop(I32, I64, UntypedValue::i64_extend_i32_u),
        isa::I64_TRUNC_F32_S => cx.visit_cvtop_partial(F32, I64, UntypedValue::i64_trunc_f32_s),
        isa::I64_TRUNC_F32_U => cx.visit_cvtop_partial(F32, I64, UntypedValue::i64_trunc_f32_u),
        isa::I64_TRUNC_F64_S => cx.visit_cvtop_partial(F64, I64, UntypedValue::i64_trunc_f64_s),
        isa::I64_TRUNC_F64_U => cx.visit_cvtop_partial(F64, I64, UntypedValue::i64_trunc_f64_u),
        isa::F32_CONVERT_I32_S => cx.visit_cvtop(I32, F32, UntypedValue::f32_convert_i32_s),
        isa::F32_CONVERT_I32_U => cx.visit_cvtop(I32, F32, UntypedValue::f32_convert_i32_u),
        isa::F32_CONVERT_I64_S => cx.visit_cvtop(I64, F32, UntypedValue::f32_convert_i64_s),
        isa::F32_CONVERT_I64_U => cx.visit_cvtop(I64, F32, UntypedValue::f32_convert_i64_u),
        isa::F32_DEMOTE_F64 => cx.visit_cvtop(F64, F32, UntypedValue::f32_demote_f64),
        isa::F64_CONVERT_I32_S => cx.visit_cvtop(I32, F64, UntypedValue::f64_convert_i32_s),
        isa::F64_CONVERT_I32_U => cx.visit_cvtop(I32, F64, UntypedValue::f64_convert_i32_u),
        isa::F64_CONVERT_I64_S => cx.visit_cvtop(I64, F64, UntypedValue::f64_convert_i64_s),
        isa::F64_CONVERT_I64_U => cx.visit_cvtop(I64, F64, UntypedValue::f64_convert_i64_u),
        isa::F64_PROMOTE_F32 => cx.visit_cvtop(F32, F64, UntypedValue::f64_promote_f32),
        isa::I32_REINTERPRET_F32 => cx.visit_cvtop(F32, I32, UntypedValue::i32_reinterpret_f32),
        isa::I64_REINTERPRET_F64 => cx.visit_cvtop(F64, I64, UntypedValue::i64_reinterpret_f64),
        isa::F32_REINTERPRET_I32 => cx.visit_cvtop(I32, F32, UntypedValue::f32_reinterpret_i32),
        isa::F64_REINTERPRET_I64 => cx.visit_cvtop(I64, F64, UntypedValue::f64_reinterpret_i64),
        isa::I32_EXTEND8_S => cx.visit_unop(I32, UntypedValue::i32_extend8_s),
        isa::I32_EXTEND16_S => cx.visit_unop(I32, UntypedValue::i32_extend16_s),
        isa::I64_EXTEND8_S => cx.visit_unop(I64, UntypedValue::i64_extend8_s),
        isa::I64_EXTEND16_S => cx.visit_unop(I64, UntypedValue::i64_extend16_s),
        isa::I64_EXTEND32_S => cx.visit_unop(I64, UntypedValue::i64_extend32_s),
        isa::REF_NULL => {
            let ty = cx.read_reftype()?;
            cx.visit_ref_null(ty)
        }
        isa::REF_IS_NULL => cx.visit_ref_is_null(),
        isa::REF_FUNC => {
            let func = cx.read_u32_imm()?;
            cx.visit_ref_func(func)
        }
        isa::PREFIX_FC => dispatch_fc(cx),
        isa::PREFIX_SIMD => {
            if !cx.features().simd {
                return Err(cx.unsupported("0xfd opcodes require the simd feature"));
            }
            dispatch_simd(cx)
        }
        #[cfg(feature = "threads")]
        isa::PREFIX_THREADS => {
            if !cx.features().threads {
                return Err(cx.unsupported("0xfe opcodes require the threads feature"));
            }
            dispatch_threads(cx)
        }
        _ => Err(cx.unsupported("unknown opcode")),
    }
}

fn dispatch_fc<C: InsnContext>(cx: &mut C) -> Result<(), C::Error> {
    use ValueType::{F32, F64, I32, I64};
    let op = cx.read_subopcode()?;
    match op {
        isa::fc::I32_TRUNC_SAT_F32_S => cx.visit_cvtop(F32, I32, UntypedValue::i32_trunc_sat_f32_s),
        isa::fc::I32_TRUNC_SAT_F32_U => cx.visit_cvtop(F32, I32, UntypedValue::i32_trunc_sat_f32_u),
        isa::fc::I32_TRUNC_SAT_F64_S => cx.visit_cvtop(F64, I32, UntypedValue::i32_trunc_sat_f64_s),
        isa::fc::I32_TRUNC_SAT_F64_U => cx.visit_cvtop(F64, I32, UntypedValue::i32_trunc_sat_f64_u),
        isa::fc::I64_TRUNC_SAT_F32_S => cx.visit_cvtop(F32, I64, UntypedValue::i64_trunc_sat_f32_s),
        isa::fc::I64_TRUNC_SAT_F32_U => cx.visit_cvtop(F32, I64, UntypedValue::i64_trunc_sat_f32_u),
        isa::fc::I64_TRUNC_SAT_F64_S => cx.visit_cvtop(F64, I64, UntypedValue::i64_trunc_sat_f64_s),
        isa::fc::I64_TRUNC_SAT_F64_U => cx.visit_cvtop(F64, I64, UntypedValue::i64_trunc_sat_f64_u),
        isa::fc::MEMORY_INIT => {
            let data = cx.read_u32_imm()?;
            let memidx = cx.read_memidx()?;
            cx.visit_memory_init(data, memidx)
        }
        isa::fc::DATA_DROP => {
            let data = cx.read_u32_imm()?;
            cx.visit_data_drop(data)
        }
        isa::fc::MEMORY_COPY => {
            let dst = cx.read_memidx()?;
            let src = cx.read_memidx()?;
            cx.visit_memory_copy(dst, src)
        }
        isa::fc::MEMORY_FILL => {
            let memidx = cx.read_memidx()?;
            cx.visit_memory_fill(memidx)
        }
        isa::fc::TABLE_INIT => {
            let elem = cx.read_u32_imm()?;
            let table = cx.read_u32_imm()?;
            cx.visit_table_init(elem, table)
        }
        isa::fc::ELEM_DROP => {
            let elem = cx.read_u32_imm()?;
            cx.visit_elem_drop(elem)
        }
        isa::fc::TABLE_COPY => {
            let dst = cx.read_u32_imm()?;
            let src = cx.read_u32_imm()?;
            cx.visit_table_copy(dst, src)
        }
        isa::fc::TABLE_GROW => {
            let table = cx.read_u32_imm()?;
            cx.visit_table_grow(table)
        }
        isa::fc::TABLE_SIZE => {
            let table = cx.read_u32_imm()?;
            cx.visit_table_size(table)
        }
        isa::fc::TABLE_FILL => {
            let table = cx.read_u32_imm()?;
            cx.visit_table_fill(table)
        }
        _ => Err(cx.unsupported("unknown 0xfc opcode")),
    }
}

fn dispatch_simd<C: InsnContext>(cx: &mut C) -> Result<(), C::Error> {
    use ValueType::{F32, F64, I32, I64};
    let op = cx.read_subopcode()?;
    match op {
        isa::simd::V128_LOAD => {
            let m = cx.read_memarg(16, false)?;
            cx.visit_v128_load(m)
        }
        isa::simd::V128_LOAD8X8_S => {
            let m = cx.read_memarg(8, false)?;
            cx.visit_v128_load_extend(m, V128::i16x8_load8x8_s)
        }
        isa::simd::V128_LOAD8X8_U => {
            let m = cx.read_memarg(8, false)?;
            cx.visit_v128_load_extend(m, V128::i16x8_load8x8_u)
        }
        isa::simd::V128_LOAD16X4_S => {
            let m = cx.read_memarg(8, false)?;
            cx.visit_v128_load_extend(m, V128::i32x4_load16x4_s)
        }
        isa::simd::V128_LOAD16X4_U => {
            let m = cx.read_memarg(8, false)?;
            cx.visit_v128_load_extend(m, V128::i32x4_load16x4_u)
        }
        isa::simd::V128_LOAD32X2_S => {
            let m = cx.read_memarg(8, false)?;
            cx.visit_v128_load_extend(m, V128::i64x2_load32x2_s)
        }
        isa::simd::V128_LOAD32X2_U => {
            let m = cx.read_memarg(8, false)?;
            cx.visit_v128_load_extend(m, V128::i64x2_load32x2_u)
        }
        isa::simd::V128_LOAD8_SPLAT => {
            let m = cx.read_memarg(1, false)?;
            cx.visit_v128_load_splat(m, 1)
        }
        isa::simd::V128_LOAD16_SPLAT => {
            let m = cx.read_memarg(2, false)?;
            cx.visit_v128_load_splat(m, 2)
        }
        isa::simd::V128_LOAD32_SPLAT => {
            let m = cx.read_memarg(4, false)?;
            cx.visit_v128_load_splat(m, 4)
        }
        isa::simd::V128_LOAD64_SPLAT => {
            let m = cx.read_memarg(8, false)?;
            cx.visit_v128_load_splat(m, 8)
        }
        isa::simd::V128_STORE => {
            let m = cx.read_memarg(16, false)?;
            cx.visit_v128_store(m)
        }
        isa::simd::V128_CONST => {
            let bytes = cx.read_bytes16_imm()?;
            cx.visit_v128_const(bytes)
        }
        isa::simd::I8X16_SHUFFLE => {
            let lanes = cx.read_bytes16_imm()?;
            cx.visit_i8x16_shuffle(lanes)
        }
        isa::simd::I8X16_SWIZZLE => cx.visit_v128_binop(V128::i8x16_swizzle),
        isa::simd::I8X16_SPLAT => {
            cx.visit_splat(I32, |v| V128::i8x16_splat(i32::from(v)))
        }
        isa::simd::I16X8_SPLAT => {
            cx.visit_splat(I32, |v| V128::i16x8_splat(i32::from(v)))
        }
        isa::simd::I32X4_SPLAT => {
            cx.visit_splat(I32, |v| V128::i32x4_splat(i32::from(v)))
        }
        isa::simd::I64X2_SPLAT => {
            cx.visit_splat(I64, |v| V128::i64x2_splat(i64::from(v)))
        }
        isa::simd::F32X4_SPLAT => {
            cx.visit_splat(F32, |v| V128::f32x4_splat(f32::from(v)))
        }
        isa::simd::F64X2_SPLAT => {
            cx.visit_splat(F64, |v| V128::f64x2_splat(f64::from(v)))
        }
        isa::simd::I8X16_EXTRACT_LANE_S => {
            let lane = cx.read_u8_imm()?;
            cx.visit_extract_lane(I32, 16, lane, |v, l| {
                UntypedValue::from(v.i8x16_extract_lane_s(l))
            })
        }
        isa::simd::I8X16_EXTRACT_LANE_U => {
            let lane = cx.read_u8_imm()?;
            cx.visit_extract_lane(I32, 16, lane, |v, l| {
                UntypedValue::from(v.i8x16_extract_lane_u(l))
            })
        }
        isa::simd::I8X16_REPLACE_LANE => {
            let lane = cx.read_u8_imm()?;
            cx.visit_replace_lane(I32, 16, lane, |v, l, x| {
                v.i8x16_replace_lane(l, i32::from(x))
            })
        }
        isa::simd::I16X8_EXTRACT_LANE_S => {
            let lane = cx.read_u8_imm()?;
            cx.visit_extract_lane(I32, 8, lane, |v, l| {
                UntypedValue::from(v.i16x8_extract_lane_s(l))
            })
        }
        isa::simd::I16X8_EXTRACT_LANE_U => {
            let lane = cx.read_u8_imm()?;
            cx.visit_extract_lane(I32, 8, lane, |v, l| {
                UntypedValue::from(v.i16x8_extract_lane_u(l))
            })
        }
        isa::simd::I16X8_REPLACE_LANE => {
            let lane = cx.read_u8_imm()?;
            cx.visit_replace_lane(I32, 8, lane, |v, l, x| {
                v.i16x8_replace_lane(l, i32::from(x))
            })
        }
        isa::simd::I32X4_EXTRACT_LANE => {
            let lane = cx.read_u8_imm()?;
            cx.visit_extract_lane(I32, 4, lane, |v, l| {
                UntypedValue::from(v.i32x4_extract_lane(l))
            })
        }
        isa::simd::I32X4_REPLACE_LANE => {
            let lane = cx.read_u8_imm()?;
            cx.visit_replace_lane(I32, 4, lane, |v, l, x| {
                v.i32x4_replace_lane(l, i32::from(x))
            })
        }
        isa::simd::I64X2_EXTRACT_LANE => {
            let lane = cx.read_u8_imm()?;
            cx.visit_extract_lane(I64, 2, lane, |v, l| {
                UntypedValue::from(v.i64x2_extract_lane(l))
            })
        }
        isa::simd::I64X2_REPLACE_LANE => {
            let lane = cx.read_u8_imm()?;
            cx.visit_replace_lane(I64, 2, lane, |v, l, x| {
                v.i64x2_replace_lane(l, i64::from(x))
            })
        }
        isa::simd::F32X4_EXTRACT_LANE => {
            let lane = cx.read_u8_imm()?;
            cx.visit_extract_lane(F32, 4, lane, |v, l| {
                UntypedValue::from(v.f32x4_extract_lane(l))
            })
        }
        isa::simd::F32X4_REPLACE_LANE => {
            let lane = cx.read_u8_imm()?;
            cx.visit_replace_lane(F32, 4, lane, |v, l, x| {
                v.f32x4_replace_lane(l, f32::from(x))
            })
        }
        isa::simd::F64X2_EXTRACT_LANE => {
            let lane = cx.read_u8_imm()?;
            cx.visit_extract_lane(F64, 2, lane, |v, l| {
                UntypedValue::from(v.f64x2_extract_lane(l))
            })
        }
        isa::simd::F64X2_REPLACE_LANE => {
            let lane = cx.read_u8_imm()?;
            cx.visit_replace_lane(F64, 2, lane, |v, l, x| {
                v.f64x2_replace_lane(l, f64::from(x))
            })
        }
        isa::simd::I8X16_EQ => cx.visit_v128_binop(V128::i8x16_eq),
        isa::simd::I8X16_NE => cx.visit_v128_binop(V128::i8x16_ne),
        isa::simd::I8X16_LT_S => cx.visit_v128_binop(V128::i8x16_lt_s),
        isa::simd::I8X16_LT_U => cx.visit_v128_binop(V128::i8x16_lt_u),
        isa::simd::I8X16_GT_S => cx.visit_v128_binop(V128::i8x16_gt_s),
        isa::simd::I8X16_GT_U => cx.visit_v128_binop(V128::i8x16_gt_u),
        isa::simd::I8X16_LE_S => cx.visit_v128_binop(V128::i8x16_le_s),
        isa::simd::I8X16_LE_U => cx.visit_v128_binop(V128::i8x16_le_u),
        isa::simd::I8X16_GE_S => cx.visit_v128_binop(V128::i8x16_ge_s),
        isa::simd::I8X16_GE_U => cx.visit_v128_binop(V128::i8x16_ge_u),
        isa::simd::I16X8_EQ => cx.visit_v128_binop(V128::i16x8_eq),
        isa::simd::I16X8_NE => cx.visit_v128_binop(V128::i16x8_ne),
        isa::simd::I16X8_LT_S => cx.visit_v128_binop(V128::i16x8_lt_s),
        isa::simd::I16X8_LT_U => cx.visit_v128_binop(V128::i16x8_lt_u),
        isa::simd::I16X8_GT_S => cx.visit_v128_binop(V128::i16x8_gt_s),
        isa::simd::I16X8_GT_U => cx.visit_v128_binop(V128::i16x8_gt_u),
        isa::simd::I16X8_LE_S => cx.visit_v128_binop(V128::i16x8_le_s),
        isa::simd::I16X8_LE_U => cx.visit_v128_binop(V128::i16x8_le_u),
        isa::simd::I16X8_GE_S => cx.visit_v128_binop(V128::i16x8_ge_s),
        isa::simd::I16X8_GE_U => cx.visit_v128_binop(V128::i16x8_ge_u),
        isa::simd::I32X4_EQ => cx.visit_v128_binop(V128::i32x4_eq),
        isa::simd::I32X4_NE => cx.visit_v128_binop(V128::i32x4_ne),
        isa::simd::I32X4_LT_S => cx.visit_v128_binop(V128::i32x4_lt_s),
        isa::simd::I32X4_LT_U => cx.visit_v128_binop(V128::i32x4_lt_u),
        isa::simd::I32X4_GT_S => cx.visit_v128_binop(V128::i32x4_gt_s),
        isa::simd::I32X4_GT_U => cx.visit_v128_binop(V128::i32x4_gt_u),
        isa::simd::I32X4_LE_S => cx.visit_v128_binop(V128::i32x4_le_s),
        isa::simd::I32X4_LE_U => cx.visit_v128_binop(V128::i32x4_le_u),
        isa::simd::I32X4_GE_S => cx.visit_v128_binop(V128::i32x4_ge_s),
        isa::simd::I32X4_GE_U => cx.visit_v128_binop(V128::i32x4_ge_u),
        isa::simd::F32X4_EQ => cx.visit_v128_binop(V128::f32x4_eq),
        isa::simd::F32X4_NE => cx.visit_v128_binop(V128::f32x4_ne),
        isa::simd::F32X4_LT => cx.visit_v128_binop(V128::f32x4_lt),
        isa::simd::F32X4_GT => cx.visit_v128_binop(V128::f32x4_gt),
        isa::simd::F32X4_LE => cx.visit_v128_binop(V128::f32x4_le),
        isa::simd::F32X4_GE => cx.visit_v128_binop(V128::f32x4_ge),
        isa::simd::F64X2_EQ => cx.visit_v128_binop(V128::f64x2_eq),
        isa::simd::F64X2_NE => cx.visit_v128_binop(V128::f64x2_ne),
        isa::simd::F64X2_LT => cx.visit_v128_binop(V128::f64x2_lt),
        isa::simd::F64X2_GT => cx.visit_v128_binop(V128::f64x2_gt),
        isa::simd::F64X2_LE => cx.visit_v128_binop(V128::f64x2_le),
        isa::simd::F64X2_GE => cx.visit_v128_binop(V128::f64x2_ge),
        isa::simd::V128_NOT => cx.visit_v128_unop(V128::not),
        isa::simd::V128_AND => cx.visit_v128_binop(V128::and),
        isa::simd::V128_ANDNOT => cx.visit_v128_binop(V128::andnot),
        isa::simd::V128_OR => cx.visit_v128_binop(V128::or),
        isa::simd::V128_XOR => cx.visit_v128_binop(V128::xor),
        isa::simd::V128_BITSELECT => cx.visit_v128_bitselect(),
        isa::simd::V128_ANY_TRUE => cx.visit_v128_testop(V128::any_true),
        isa::simd::V128_LOAD8_LANE => {
            let m = cx.read_memarg(1, false)?;
            let lane = cx.read_u8_imm()?;
            cx.visit_v128_load_lane(m, 1, lane)
        }
        isa::simd::V128_LOAD16_LANE => {
            let m = cx.read_memarg(2, false)?;
            let lane = cx.read_u8_imm()?;
            cx.visit_v128_load_lane(m, 2, lane)
        }
        isa::simd::V128_LOAD32_LANE => {
            let m = cx.read_memarg(4, false)?;
            let lane = cx.read_u8_imm()?;
            cx.visit_v128_load_lane(m, 4, lane)
        }
        isa::simd::V128_LOAD64_LANE => {
            let m = cx.read_memarg(8, false)?;
            let lane = cx.read_u8_imm()?;
            cx.visit_v128_load_lane(m, 8, lane)
        }
        isa::simd::V128_STORE8_LANE => {
            let m = cx.read_memarg(1, false)?;
            let lane = cx.read_u8_imm()?;
            cx.visit_v128_store_lane(m, 1, lane)
        }
        isa::simd::V128_STORE16_LANE => {
            let m = cx.read_memarg(2, false)?;
            let lane = cx.read_u8_imm()?;
            cx.visit_v128_store_lane(m, 2, lane)
        }
        isa::simd::V128_STORE32_LANE => {
            let m = cx.read_memarg(4, false)?;
            let lane = cx.read_u8_imm()?;
            cx.visit_v128_store_lane(m, 4, lane)
        }
        isa::simd::V128_STORE64_LANE => {
            let m = cx.read_memarg(8, false)?;
            let lane = cx.read_u8_imm()?;
            cx.visit_v128_store_lane(m, 8, lane)
        }
        isa::simd::V128_LOAD32_ZERO => {
            let m = cx.read_memarg(4, false)?;
            cx.visit_v128_load_zero(m, 4)
        }
        isa::simd::V128_LOAD64_ZERO => {
            let m = cx.read_memarg(8, false)?;
            cx.visit_v128_load_zero(m, 8)
        }
        isa::simd::F32X4_DEMOTE_F64X2_ZERO => cx.visit_v128_unop(V128::f32x4_demote_f64x2_zero),
        isa::simd::F64X2_PROMOTE_LOW_F32X4 => cx.visit_v128_unop(V128::f64x2_promote_low_f32x4),
        isa::simd::I8X16_ABS => cx.visit_v128_unop(V128::i8x16_abs),
        isa::simd::I8X16_NEG => cx.visit_v128_unop(V128::i8x16_neg),
        isa::simd::I8X16_POPCNT => cx.visit_v128_unop(V128::i8x16_popcnt),
        isa::simd::I8X16_ALL_TRUE => cx.visit_v128_testop(V128::i8x16_all_true),
        isa::simd::I8X16_BITMASK => cx.visit_v128_bitmask(V128::i8x16_bitmask),
        isa::simd::I8X16_NARROW_I16X8_S => cx.visit_v128_binop(V128::i8x16_narrow_i16x8_s),
        isa::simd::I8X16_NARROW_I16X8_U => cx.visit_v128_binop(V128::i8x16_narrow_i16x8_u),
        isa::simd::F32X4_CEIL => cx.visit_v128_unop(V128::f32x4_ceil),
        isa::simd::F32X4_FLOOR => cx.visit_v128_unop(V128::f32x4_floor),
        isa::simd::F32X4_TRUNC => cx.visit_v128_unop(V128::f32x4_trunc),
        isa::simd::F32X4_NEAREST => cx.visit_v128_unop(V128::f32x4_nearest),
        isa::simd::I8X16_SHL => cx.visit_v128_shift(V128::i8x16_shl),
        isa::simd::I8X16_SHR_S => cx.visit_v128_shift(V128::i8x16_shr_s),
        isa::simd::I8X16_SHR_U => cx.visit_v128_shift(V128::i8x16_shr_u),
        isa::simd::I8X16_ADD => cx.visit_v128_binop(V128::i8x16_add),
        isa::simd::I8X16_ADD_SAT_S => cx.visit_v128_binop(V128::i8x16_add_sat_s),
        isa::simd::I8X16_ADD_SAT_U => cx.visit_v128_binop(V128::i8x16_add_sat_u),
        isa::simd::I8X16_SUB => cx.visit_v128_binop(V128::i8x16_sub),
        isa::simd::I8X16_SUB_SAT_S => cx.visit_v128_binop(V128::i8x16_sub_sat_s),
        isa::simd::I8X16_SUB_SAT_U => cx.visit_v128_binop(V128::i8x16_sub_sat_u),
        isa::simd::F64X2_CEIL => cx.visit_v128_unop(V128::f64x2_ceil),
        isa::simd::F64X2_FLOOR => cx.visit_v128_unop(V128::f64x2_floor),
        isa::simd::I8X16_MIN_S => cx.visit_v128_binop(V128::i8x16_min_s),
        isa::simd::I8X16_MIN_U => cx.visit_v128_binop(V128::i8x16_min_u),
        isa::simd::I8X16_MAX_S => cx.visit_v128_binop(V128::i8x16_max_s),
        isa::simd::I8X16_MAX_U => cx.visit_v128_binop(V128::i8x16_max_u),
        isa::simd::F64X2_TRUNC => cx.visit_v128_unop(V128::f64x2_trunc),
        isa::simd::I8X16_AVGR_U => cx.visit_v128_binop(V128::i8x16_avgr_u),
        isa::simd::I16X8_EXTADD_PAIRWISE_I8X16_S => {
            cx.visit_v128_unop(V128::i16x8_extadd_pairwise_i8x16_s)
        }
        isa::simd::I16X8_EXTADD_PAIRWISE_I8X16_U => {
            cx.visit_v128_unop(V128::i16x8_extadd_pairwise_i8x16_u)
        }
        isa::simd::I32X4_EXTADD_PAIRWISE_I16X8_S => {
            cx.visit_v128_unop(V128::i32x4_extadd_pairwise_i16x8_s)
        }
        isa::simd::I32X4_EXTADD_PAIRWISE_I16X8_U => {
            cx.visit_v128_unop(V128::i32x4_extadd_pairwise_i16x8_u)
        }
        isa::simd::I16X8_ABS => cx.visit_v128_unop(V128::i16x8_abs),
        isa::simd::I16X8_NEG => cx.visit_v128_unop(V128::i16x8_neg),
        isa::simd::I16X8_Q15MULR_SAT_S => cx.visit_v128_binop(V128::i16x8_q15mulr_sat_s),
        isa::simd::I16X8_ALL_TRUE => cx.visit_v128_testop(V128::i16x8_all_true),
        isa::simd::I16X8_BITMASK => cx.visit_v128_bitmask(V128::i16x8_bitmask),
        isa::simd::I16X8_NARROW_I32X4_S => cx.visit_v128_binop(V128::i16x8_narrow_i32x4_s),
        isa::simd::I16X8_NARROW_I32X4_U => cx.visit_v128_binop(V128::i16x8_narrow_i32x4_u),
        isa::simd::I16X8_EXTEND_LOW_I8X16_S => cx.visit_v128_unop(V128::i16x8_extend_low_i8x16_s),
        isa::simd::I16X8_EXTEND_HIGH_I8X16_S => {
            cx.visit_v128_unop(V128::i16x8_extend_high_i8x16_s)
        }
        isa::simd::I16X8_EXTEND_LOW_I8X16_U => cx.visit_v128_unop(V128::i16x8_extend_low_i8x16_u),
        isa::simd::I16X8_EXTEND_HIGH_I8X16_U => {
            cx.visit_v128_unop(V128::i16x8_extend_high_i8x16_u)
        }
        isa::simd::I16X8_SHL => cx.visit_v128_shift(V128::i16x8_shl),
        isa::simd::I16X8_SHR_S => cx.visit_v128_shift(V128::i16x8_shr_s),
        isa::simd::I16X8_SHR_U => cx.visit_v128_shift(V128::i16x8_shr_u),
        isa::simd::I16X8_ADD => cx.visit_v128_binop(V128::i16x8_add),
        isa::simd::I16X8_ADD_SAT_S => cx.visit_v128_binop(V128::i16x8_add_sat_s),
        isa::simd::I16X8_ADD_SAT_U => cx.visit_v128_binop(V128::i16x8_add_sat_u),
        isa::simd::I16X8_SUB => cx.visit_v128_binop(V128::i16x8_sub),
        isa::simd::I16X8_SUB_SAT_S => cx.visit_v128_binop(V128::i16x8_sub_sat_s),
        isa::simd::I16X8_SUB_SAT_U => cx.visit_v128_binop(V128::i16x8_sub_sat_u),
        isa::simd::F64X2_NEAREST => cx.visit_v128_unop(V128::f64x2_nearest),
        isa::simd::I16X8_MUL => cx.visit_v128_binop(V128::i16x8_mul),
        isa::simd::I16X8_MIN_S => cx.visit_v128_binop(V128::i16x8_min_s),
        isa::simd::I16X8_MIN_U => cx.visit_v128_binop(V128::i16x8_min_u),
        isa::simd::I16X8_MAX_S => cx.visit_v128_binop(V128::i16x8_max_s),
        isa::simd::I16X8_MAX_U => cx.visit_v128_binop(V128::i16x8_max_u),
        isa::simd::I16X8_AVGR_U => cx.visit_v128_binop(V128::i16x8_avgr_u),
        isa::simd::I16X8_EXTMUL_LOW_I8X16_S => cx.visit_v128_binop(V128::i16x8_extmul_low_i8x16_s),
        isa::simd::I16X8_EXTMUL_HIGH_I8X16_S => {
            cx.visit_v128_binop(V128::i16x8_extmul_high_i8x16_s)
        }
        isa::simd::I16X8_EXTMUL_LOW_I8X16_U => cx.visit_v128_binop(V128::i16x8_extmul_low_i8x16_u),
        isa::simd::I16X8_EXTMUL_HIGH_I8X16_U => {
            cx.visit_v128_binop(V128::i16x8_extmul_high_i8x16_u)
        }
        isa::simd::I32X4_ABS => cx.visit_v128_unop(V128::i32x4_abs),
        isa::simd::I32X4_NEG => cx.visit_v128_unop(V128::i32x4_neg),
        isa::simd::I32X4_ALL_TRUE => cx.visit_v128_testop(V128::i32x4_all_true),
        isa::simd::I32X4_BITMASK => cx.visit_v128_bitmask(V128::i32x4_bitmask),
        isa::simd::I32X4_EXTEND_LOW_I16X8_S => cx.visit_v128_unop(V128::i32x4_extend_low_i16x8_s),
        isa::simd::I32X4_EXTEND_HIGH_I16X8_S => {
            cx.visit_v128_unop(V128::i32x4_extend_high_i16x8_s)
        }
        isa::simd::I32X4_EXTEND_LOW_I16X8_U => cx.visit_v128_unop(V128::i32x4_extend_low_i16x8_u),
        isa::simd::I32X4_EXTEND_HIGH_I16X8_U => {
            cx.visit_v128_unop(V128::i32x4_extend_high_i16x8_u)
        }
        isa::simd::I32X4_SHL => cx.visit_v128_shift(V128::i32x4_shl),
        isa::simd::I32X4_SHR_S => cx.visit_v128_shift(V128::i32x4_shr_s),
        isa::simd::I32X4_SHR_U => cx.visit_v128_shift(V128::i32x4_shr_u),
        isa::simd::I32X4_ADD => cx.visit_v128_binop(V128::i32x4_add),
        isa::simd::I32X4_SUB => cx.visit_v128_binop(V128::i32x4_sub),
        isa::simd::I32X4_MUL => cx.visit_v128_binop(V128::i32x4_mul),
        isa::simd::I32X4_MIN_S => cx.visit_v128_binop(V128::i32x4_min_s),
        isa::simd::I32X4_MIN_U => cx.visit_v128_binop(V128::i32x4_min_u),
        isa::simd::I32X4_MAX_S => cx.visit_v128_binop(V128::i32x4_max_s),
        isa::simd::I32X4_MAX_U => cx.visit_v128_binop(V128::i32x4_max_u),
        isa::simd::I32X4_DOT_I16X8_S => cx.visit_v128_binop(V128::i32x4_dot_i16x8_s),
        isa::simd::I32X4_EXTMUL_LOW_I16X8_S => cx.visit_v128_binop(V128::i32x4_extmul_low_i16x8_s),
        isa::simd::I32X4_EXTMUL_HIGH_I16X8_S => {
            cx.visit_v128_binop(V128::i32x4_extmul_high_i16x8_s)
        }
        isa::simd::I32X4_EXTMUL_LOW_I16X8_U => cx.visit_v128_binop(V128::i32x4_extmul_low_i16x8_u),
        isa::simd::I32X4_EXTMUL_HIGH_I16X8_U => {
            cx.visit_v128_binop(V128::i32x4_extmul_high_i16x8_u)
        }
        isa::simd::I64X2_ABS => cx.visit_v128_unop(V128::i64x2_abs),
        isa::simd::I64X2_NEG => cx.visit_v128_unop(V128::i64x2_neg),
        isa::simd::I64X2_ALL_TRUE => cx.visit_v128_testop(V128::i64x2_all_true),
        isa::simd::I64X2_BITMASK => cx.visit_v128_bitmask(V128::i64x2_bitmask),
        isa::simd::I64X2_EXTEND_LOW_I32X4_S => cx.visit_v128_unop(V128::i64x2_extend_low_i32x4_s),
        isa::simd::I64X2_EXTEND_HIGH_I32X4_S => {
            cx.visit_v128_unop(V128::i64x2_extend_high_i32x4_s)
        }
        isa::simd::I64X2_EXTEND_LOW_I32X4_U => cx.visit_v128_unop(V128::i64x2_extend_low_i32x4_u),
        isa::simd::I64X2_EXTEND_HIGH_I32X4_U => {
            cx.visit_v128_unop(V128::i64x2_extend_high_i32x4_u)
        }
        isa::simd::I64X2_SHL => cx.visit_v128_shift(V128::i64x2_shl),
        isa::simd::I64X2_SHR_S => cx.visit_v128_shift(V128::i64x2_shr_s),
        isa::simd::I64X2_SHR_U => cx.visit_v128_shift(V128::i64x2_shr_u),
        isa::simd::I64X2_ADD => cx.visit_v128_binop(V128::i64x2_add),
        isa::simd::I64X2_SUB => cx.visit_v128_binop(V128::i64x2_sub),
        isa::simd::I64X2_MUL => cx.visit_v128_binop(V128::i64x2_mul),
        isa::simd::I64X2_EQ => cx.visit_v128_binop(V128::i64x2_eq),
        isa::simd::I64X2_NE => cx.visit_v128_binop(V128::i64x2_ne),
        isa::simd::I64X2_LT_S => cx.visit_v128_binop(V128::i64x2_lt_s),
        isa::simd::I64X2_GT_S => cx.visit_v128_binop(V128::i64x2_gt_s),
        isa::simd::I64X2_LE_S => cx.visit_v128_binop(V128::i64x2_le_s),
        isa::simd::I64X2_GE_S => cx.visit_v128_binop(V128::i64x2_ge_s),
        isa::simd::I64X2_EXTMUL_LOW_I32X4_S => cx.visit_v128_binop(V128::i64x2_extmul_low_i32x4_s),
        isa::simd::I64X2_EXTMUL_HIGH_I32X4_S => {
            cx.visit_v128_binop(V128::i64x2_extmul_high_i32x4_s)
        }
        isa::simd::I64X2_EXTMUL_LOW_I32X4_U => cx.visit_v128_binop(V128::i64x2_extmul_low_i32x4_u),
        isa::simd::I64X2_EXTMUL_HIGH_I32X4_U => {
            cx.visit_v128_binop(V128::i64x2_extmul_high_i32x4_u)
        }
        isa::simd::F32X4_ABS => cx.visit_v128_unop(V128::f32x4_abs),
        isa::simd::F32X4_NEG => cx.visit_v128_unop(V128::f32x4_neg),
        isa::simd::F32X4_SQRT => cx.visit_v128_unop(V128::f32x4_sqrt),
        isa::simd::F32X4_ADD => cx.visit_v128_binop(V128::f32x4_add),
        isa::simd::F32X4_SUB => cx.visit_v128_binop(V128::f32x4_sub),
        isa::simd::F32X4_MUL => cx.visit_v128_binop(V128::f32x4_mul),
        isa::simd::F32X4_DIV => cx.visit_v128_binop(V128::f32x4_div),
        isa::simd::F32X4_MIN => cx.visit_v128_binop(V128::f32x4_min),
        isa::simd::F32X4_MAX => cx.visit_v128_binop(V128::f32x4_max),
        isa::simd::F32X4_PMIN => cx.visit_v128_binop(V128::f32x4_pmin),
        isa::simd::F32X4_PMAX => cx.visit_v128_binop(V128::f32x4_pmax),
        isa::simd::F64X2_ABS => cx.visit_v128_unop(V128::f64x2_abs),
        isa::simd::F64X2_NEG => cx.visit_v128_unop(V128::f64x2_neg),
        isa::simd::F64X2_SQRT => cx.visit_v128_unop(V128::f64x2_sqrt),
        isa::simd::F64X2_ADD => cx.visit_v128_binop(V128::f64x2_add),
        isa::simd::F64X2_SUB => cx.visit_v128_binop(V128::f64x2_sub),
        isa::simd::F64X2_MUL => cx.visit_v128_binop(V128::f64x2_mul),
        isa::simd::F64X2_DIV => cx.visit_v128_binop(V128::f64x2_div),
        isa::simd::F64X2_MIN => cx.visit_v128_binop(V128::f64x2_min),
        isa::simd::F64X2_MAX => cx.visit_v128_binop(V128::f64x2_max),
        isa::simd::F64X2_PMIN => cx.visit_v128_binop(V128::f64x2_pmin),
        isa::simd::F64X2_PMAX => cx.visit_v128_binop(V128::f64x2_pmax),
        isa::simd::I32X4_TRUNC_SAT_F32X4_S => cx.visit_v128_unop(V128::i32x4_trunc_sat_f32x4_s),
        isa::simd::I32X4_TRUNC_SAT_F32X4_U => cx.visit_v128_unop(V128::i32x4_trunc_sat_f32x4_u),
        isa::simd::F32X4_CONVERT_I32X4_S => cx.visit_v128_unop(V128::f32x4_convert_i32x4_s),
        isa::simd::F32X4_CONVERT_I32X4_U => cx.visit_v128_unop(V128::f32x4_convert_i32x4_u),
        isa::simd::I32X4_TRUNC_SAT_F64X2_S_ZERO => {
            cx.visit_v128_unop(V128::i32x4_trunc_sat_f64x2_s_zero)
        }
        isa::simd::I32X4_TRUNC_SAT_F64X2_U_ZERO => {
            cx.visit_v128_unop(V128::i32x4_trunc_sat_f64x2_u_zero)
        }
        isa::simd::F64X2_CONVERT_LOW_I32X4_S => cx.visit_v128_unop(V128::f64x2_convert_low_i32x4_s),
        isa::simd::F64X2_CONVERT_LOW_I32X4_U => cx.visit_v128_unop(V128::f64x2_convert_low_i32x4_u),
        _ => Err(cx.unsupported("unknown 0xfd opcode")),
    }
}

#[cfg(feature = "threads")]
fn dispatch_threads<C: InsnContext>(cx: &mut C) -> Result<(), C::Error> {
    use ValueType::{I32, I64};
    let op = cx.read_subopcode()?;
    match op {
        isa::threads::MEMORY_ATOMIC_NOTIFY => {
            let m = cx.read_memarg(4, true)?;
            cx.visit_atomic_notify(m)
        }
        isa::threads::MEMORY_ATOMIC_WAIT32 => {
            let m = cx.read_memarg(4, true)?;
            cx.visit_atomic_wait(m, 4)
        }
        isa::threads::MEMORY_ATOMIC_WAIT64 => {
            let m = cx.read_memarg(8, true)?;
            cx.visit_atomic_wait(m, 8)
        }
        isa::threads::ATOMIC_FENCE => {
            let flags = cx.read_u8_imm()?;
            let _ = flags;
            cx.visit_atomic_fence()
        }
        isa::threads::I32_ATOMIC_LOAD => {
            let m = cx.read_memarg(4, true)?;
            cx.visit_atomic_load(m, I32, 4)
        }
        isa::threads::I64_ATOMIC_LOAD => {
            let m = cx.read_memarg(8, true)?;
            cx.visit_atomic_load(m, I64, 8)
        }
        isa::threads::I32_ATOMIC_LOAD8_U => {
            let m = cx.read_memarg(1, true)?;
            cx.visit_atomic_load(m, I32, 1)
        }
        isa::threads::I32_ATOMIC_LOAD16_U => {
            let m = cx.read_memarg(2, true)?;
            cx.visit_atomic_load(m, I32, 2)
        }
        isa::threads::I64_ATOMIC_LOAD8_U => {
            let m = cx.read_memarg(1, true)?;
            cx.visit_atomic_load(m, I64, 1)
        }
        isa::threads::I64_ATOMIC_LOAD16_U => {
            let m = cx.read_memarg(2, true)?;
            cx.visit_atomic_load(m, I64, 2)
        }
        isa::threads::I64_ATOMIC_LOAD32_U => {
            let m = cx.read_memarg(4, true)?;
            cx.visit_atomic_load(m, I64, 4)
        }
        isa::threads::I32_ATOMIC_STORE => {
            let m = cx.read_memarg(4, true)?;
            cx.visit_atomic_store(m, I32, 4)
        }
        isa::threads::I64_ATOMIC_STORE => {
            let m = cx.read_memarg(8, true)?;
            cx.visit_atomic_store(m, I64, 8)
        }
        isa::threads::I32_ATOMIC_STORE8 => {
            let m = cx.read_memarg(1, true)?;
            cx.visit_atomic_store(m, I32, 1)
        }
        isa::threads::I32_ATOMIC_STORE16 => {
            let m = cx.read_memarg(2, true)?;
            cx.visit_atomic_store(m, I32, 2)
        }
        isa::threads::I64_ATOMIC_STORE8 => {
            let m = cx.read_memarg(1, true)?;
            cx.visit_atomic_store(m, I64, 1)
        }
        isa::threads::I64_ATOMIC_STORE16 => {
            let m = cx.read_memarg(2, true)?;
            cx.visit_atomic_store(m, I64, 2)
        }
        isa::threads::I64_ATOMIC_STORE32 => {
            let m = cx.read_memarg(4, true)?;
            cx.visit_atomic_store(m, I64, 4)
        }
        _ => dispatch_threads_rmw(cx, op),
    }
}

#[cfg(feature = "threads")]
fn dispatch_threads_rmw<C: InsnContext>(cx: &mut C, op: u32) -> Result<(), C::Error> {
    use ValueType::{I32, I64};
    // The RMW block is laid out as seven consecutive (ty, width)
    // encodings per operation.
    let ops: [fn(u64, u64) -> u64; 6] = [
        |a, b| a.wrapping_add(b),
        |a, b| a.wrapping_sub(b),
        |a, b| a & b,
        |a, b| a | b,
        |a, b| a ^ b,
        |_, b| b,
    ];
    let widths: [(ValueType, u32); 7] = [
        (I32, 4),
        (I64, 8),
        (I32, 1),
        (I32, 2),
        (I64, 1),
        (I64, 2),
        (I64, 4),
    ];
    if (isa::threads::I32_ATOMIC_RMW_ADD..=isa::threads::I64_ATOMIC_RMW32_XCHG_U).contains(&op) {
        let rel = op - isa::threads::I32_ATOMIC_RMW_ADD;
        let f = ops[(rel / 7) as usize];
        let (ty, width) = widths[(rel % 7) as usize];
        let m = cx.read_memarg(width, true)?;
        return cx.visit_atomic_rmw(m, ty, width, f);
    }
    if (isa::threads::I32_ATOMIC_RMW_CMPXCHG..=isa::threads::I64_ATOMIC_RMW32_CMPXCHG_U)
        .contains(&op)
    {
        let rel = op - isa::threads::I32_ATOMIC_RMW_CMPXCHG;
        let (ty, width) = widths[rel as usize];
        let m = cx.read_memarg(width, true)?;
        return cx.visit_atomic_cmpxchg(m, ty, width);
    }
    Err(cx.unsupported("unknown 0xfe opcode"))
}
