//! Opcode numbering.
//!
//! One declarative list per opcode page; the constants and the
//! mnemonic lookup used in diagnostics are generated from the same
//! list, and `decode::dispatch` matches on these constants, so the
//! validator and the executor cannot disagree about the opcode space.
//!
//! The numbering is byte-for-byte the upstream binary format: the base
//! page `0x00..=0xC4` plus the reference ops `0xD0..=0xD2`, and the
//! LEB128-subopcode pages behind the `0xFC` (saturating conversions +
//! bulk memory), `0xFD` (SIMD) and `0xFE` (atomics) prefix bytes.

#![allow(missing_docs)]

macro_rules! define_page {
    (
        $const_ty:ty, $name_fn:ident;
        $( ($name:ident, $value:expr, $mnemonic:expr); )*
    ) => {
        $( pub const $name: $const_ty = $value; )*

        /// Mnemonic of an opcode on this page, for diagnostics.
        pub fn $name_fn(op: $const_ty) -> &'static str {
            match op {
                $( $value => $mnemonic, )*
                _ => "unknown",
            }
        }
    };
}

define_page! {
    u8, base_name;
    (UNREACHABLE, 0x00, "unreachable");
    (NOP, 0x01, "nop");
    (BLOCK, 0x02, "block");
    (LOOP, 0x03, "loop");
    (IF, 0x04, "if");
    (ELSE, 0x05, "else");
    (END, 0x0B, "end");
    (BR, 0x0C, "br");
    (BR_IF, 0x0D, "br_if");
    (BR_TABLE, 0x0E, "br_table");
    (RETURN, 0x0F, "return");
    (CALL, 0x10, "call");
    (CALL_INDIRECT, 0x11, "call_indirect");
    (RETURN_CALL, 0x12, "return_call");
    (RETURN_CALL_INDIRECT, 0x13, "return_call_indirect");
    (DROP, 0x1A, "drop");
    (SELECT, 0x1B, "select");
    (SELECT_T, 0x1C, "select");
    (LOCAL_GET, 0x20, "local.get");
    (LOCAL_SET, 0x21, "local.set");
    (LOCAL_TEE, 0x22, "local.tee");
    (GLOBAL_GET, 0x23, "global.get");
    (GLOBAL_SET, 0x24, "global.set");
    (TABLE_GET, 0x25, "table.get");
    (TABLE_SET, 0x26, "table.set");
    (I32_LOAD, 0x28, "i32.load");
    (I64_LOAD, 0x29, "i64.load");
    (F32_LOAD, 0x2A, "f32.load");
    (F64_LOAD, 0x2B, "f64.load");
    (I32_LOAD8_S, 0x2C, "i32.load8_s");
    (I32_LOAD8_U, 0x2D, "i32.load8_u");
    (I32_LOAD16_S, 0x2E, "i32.load16_s");
    (I32_LOAD16_U, 0x2F, "i32.load16_u");
    (I64_LOAD8_S, 0x30, "i64.load8_s");
    (I64_LOAD8_U, 0x31, "i64.load8_u");
    (I64_LOAD16_S, 0x32, "i64.load16_s");
    (I64_LOAD16_U, 0x33, "i64.load16_u");
    (I64_LOAD32_S, 0x34, "i64.load32_s");
    (I64_LOAD32_U, 0x35, "i64.load32_u");
    (I32_STORE, 0x36, "i32.store");
    (I64_STORE, 0x37, "i64.store");
    (F32_STORE, 0x38, "f32.store");
    (F64_STORE, 0x39, "f64.store");
    (I32_STORE8, 0x3A, "i32.store8");
    (I32_STORE16, 0x3B, "i32.store16");
    (I64_STORE8, 0x3C, "i64.store8");
    (I64_STORE16, 0x3D, "i64.store16");
    (I64_STORE32, 0x3E, "i64.store32");
    (MEMORY_SIZE, 0x3F, "memory.size");
    (MEMORY_GROW, 0x40, "memory.grow");
    (I32_CONST, 0x41, "i32.const");
    (I64_CONST, 0x42, "i64.const");
    (F32_CONST, 0x43, "f32.const");
    (F64_CONST, 0x44, "f64.const");
    (I32_EQZ, 0x45, "i32.eqz");
    (I32_EQ, 0x46, "i32.eq");
    (I32_NE, 0x47, "i32.ne");
    (I32_LT_S, 0x48, "i32.lt_s");
    (I32_LT_U, 0x49, "i32.lt_u");
    (I32_GT_S, 0x4A, "i32.gt_s");
    (I32_GT_U, 0x4B, "i32.gt_u");
    (I32_LE_S, 0x4C, "i32.le_s");
    (I32_LE_U, 0x4D, "i32.le_u");
    (I32_GE_S, 0x4E, "i32.ge_s");
    (I32_GE_U, 0x4F, "i32.ge_u");
    (I64_EQZ, 0x50, "i64.eqz");
    (I64_EQ, 0x51, "i64.eq");
    (I64_NE, 0x52, "i64.ne");
    (I64_LT_S, 0x53, "i64.lt_s");
    (I64_LT_U, 0x54, "i64.lt_u");
    (I64_GT_S, 0x55, "i64.gt_s");
    (I64_GT_U, 0x56, "i64.gt_u");
    (I64_LE_S, 0x57, "i64.le_s");
    (I64_LE_U, 0x58, "i64.le_u");
    (I64_GE_S, 0x59, "i64.ge_s");
    (I64_GE_U, 0x5A, "i64.ge_u");
    (F32_EQ, 0x5B, "f32.eq");
    (F32_NE, 0x5C, "f32.ne");
    (F32_LT, 0x5D, "f32.lt");
    (F32_GT, 0x5E, "f32.gt");
    (F32_LE, 0x5F, "f32.le");
    (F32_GE, 0x60, "f32.ge");
    (F64_EQ, 0x61, "f64.eq");
    (F64_NE, 0x62, "f64.ne");
    (F64_LT, 0x63, "f64.lt");
    (F64_GT, 0x64, "f64.gt");
    (F64_LE, 0x65, "f64.le");
    (F64_GE, 0x66, "f64.ge");
    (I32_CLZ, 0x67, "i32.clz");
    (I32_CTZ, 0x68, "i32.ctz");
    (I32_POPCNT, 0x69, "i32.popcnt");
    (I32_ADD, 0x6A, "i32.add");
    (I32_SUB, 0x6B, "i32.sub");
    (I32_MUL, 0x6C, "i32.mul");
    (I32_DIV_S, 0x6D, "i32.div_s");
    (I32_DIV_U, 0x6E, "i32.div_u");
    (I32_REM_S, 0x6F, "i32.rem_s");
    (I32_REM_U, 0x70, "i32.rem_u");
    (I32_AND, 0x71, "i32.and");
    (I32_OR, 0x72, "i32.or");
    (I32_XOR, 0x73, "i32.xor");
    (I32_SHL, 0x74, "i32.shl");
    (I32_SHR_S, 0x75, "i32.shr_s");
    (I32_SHR_U, 0x76, "i32.shr_u");
    (I32_ROTL, 0x77, "i32.rotl");
    (I32_ROTR, 0x78, "i32.rotr");
    (I64_CLZ, 0x79, "i64.clz");
    (I64_CTZ, 0x7A, "i64.ctz");
    (I64_POPCNT, 0x7B, "i64.popcnt");
    (I64_ADD, 0x7C, "i64.add");
    (I64_SUB, 0x7D, "i64.sub");
    (I64_MUL, 0x7E, "i64.mul");
    (I64_DIV_S, 0x7F, "i64.div_s");
    (I64_DIV_U, 0x80, "i64.div_u");
    (I64_REM_S, 0x81, "i64.rem_s");
    (I64_REM_U, 0x82, "i64.rem_u");
    (I64_AND, 0x83, "i64.and");
    (I64_OR, 0x84, "i64.or");
    (I64_XOR, 0x85, "i64.xor");
    (I64_SHL, 0x86, "i64.shl");
    (I64_SHR_S, 0x87, "i64.shr_s");
    (I64_SHR_U, 0x88, "i64.shr_u");
    (I64_ROTL, 0x89, "i64.rotl");
    (I64_ROTR, 0x8A, "i64.rotr");
    (F32_ABS, 0x8B, "f32.abs");
    (F32_NEG, 0x8C, "f32.neg");
    (F32_CEIL, 0x8D, "f32.ceil");
    (F32_FLOOR, 0x8E, "f32.floor");
    (F32_TRUNC, 0x8F, "f32.trunc");
    (F32_NEAREST, 0x90, "f32.nearest");
    (F32_SQRT, 0x91, "f32.sqrt");
    (F32_ADD, 0x92, "f32.add");
    (F32_SUB, 0x93, "f32.sub");
    (F32_MUL, 0x94, "f32.mul");
    (F32_DIV, 0x95, "f32.div");
    (F32_MIN, 0x96, "f32.min");
    (F32_MAX, 0x97, "f32.max");
    (F32_COPYSIGN, 0x98, "f32.copysign");
    (F64_ABS, 0x99, "f64.abs");
    (F64_NEG, 0x9A, "f64.neg");
    (F64_CEIL, 0x9B, "f64.ceil");
    (F64_FLOOR, 0x9C, "f64.floor");
    (F64_TRUNC, 0x9D, "f64.trunc");
    (F64_NEAREST, 0x9E, "f64.nearest");
    (F64_SQRT, 0x9F, "f64.sqrt");
    (F64_ADD, 0xA0, "f64.add");
    (F64_SUB, 0xA1, "f64.sub");
    (F64_MUL, 0xA2, "f64.mul");
    (F64_DIV, 0xA3, "f64.div");
    (F64_MIN, 0xA4, "f64.min");
    (F64_MAX, 0xA5, "f64.max");
    (F64_COPYSIGN, 0xA6, "f64.copysign");
    (I32_WRAP_I64, 0xA7, "i32.wrap_i64");
    (I32_TRUNC_F32_S, 0xA8, "i32.trunc_f32_s");
    (I32_TRUNC_F32_U, 0xA9, "i32.trunc_f32_u");
    (I32_TRUNC_F64_S, 0xAA, "i32.trunc_f64_s");
    (I32_TRUNC_F64_U, 0xAB, "i32.trunc_f64_u");
    (I64_EXTEND_I32_S, 0xAC, "i64.extend_i32_s");
    (I64_EXTEND_I32_U, 0xAD, "i64.extend_i32_u");
    (I64_TRUNC_F32_S, 0xAE, "i64.trunc_f32_s");
    (I64_TRUNC_F32_U, 0xAF, "i64.trunc_f32_u");
    (I64_TRUNC_F64_S, 0xB0, "i64.trunc_f64_s");
    (I64_TRUNC_F64_U, 0xB1, "i64.trunc_f64_u");
    (F32_CONVERT_I32_S, 0xB2, "f32.convert_i32_s");
    (F32_CONVERT_I32_U, 0xB3, "f32.convert_i32_u");
    (F32_CONVERT_I64_S, 0xB4, "f32.convert_i64_s");
    (F32_CONVERT_I64_U, 0xB5, "f32.convert_i64_u");
    (F32_DEMOTE_F64, 0xB6, "f32.demote_f64");
    (F64_CONVERT_I32_S, 0xB7, "f64.convert_i32_s");
    (F64_CONVERT_I32_U, 0xB8, "f64.convert_i32_u");
    (F64_CONVERT_I64_S, 0xB9, "f64.convert_i64_s");
    (F64_CONVERT_I64_U, 0xBA, "f64.convert_i64_u");
    (F64_PROMOTE_F32, 0xBB, "f64.promote_f32");
    (I32_REINTERPRET_F32, 0xBC, "i32.reinterpret_f32");
    (I64_REINTERPRET_F64, 0xBD, "i64.reinterpret_f64");
    (F32_REINTERPRET_I32, 0xBE, "f32.reinterpret_i32");
    (F64_REINTERPRET_I64, 0xBF, "f64.reinterpret_i64");
    (I32_EXTEND8_S, 0xC0, "i32.extend8_s");
    (I32_EXTEND16_S, 0xC1, "i32.extend16_s");
    (I64_EXTEND8_S, 0xC2, "i64.extend8_s");
    (I64_EXTEND16_S, 0xC3, "i64.extend16_s");
    (I64_EXTEND32_S, 0xC4, "i64.extend32_s");
    (REF_NULL, 0xD0, "ref.null");
    (REF_IS_NULL, 0xD1, "ref.is_null");
    (REF_FUNC, 0xD2, "ref.func");
    (PREFIX_FC, 0xFC, "0xfc prefix");
    (PREFIX_SIMD, 0xFD, "0xfd prefix");
    (PREFIX_THREADS, 0xFE, "0xfe prefix");
}

/// Sub-opcodes behind the `0xFC` prefix: saturating conversions and
/// bulk memory/table operations.
pub mod fc {
    define_page! {
        u32, name;
        (I32_TRUNC_SAT_F32_S, 0, "i32.trunc_sat_f32_s");
        (I32_TRUNC_SAT_F32_U, 1, "i32.trunc_sat_f32_u");
        (I32_TRUNC_SAT_F64_S, 2, "i32.trunc_sat_f64_s");
        (I32_TRUNC_SAT_F64_U, 3, "i32.trunc_sat_f64_u");
        (I64_TRUNC_SAT_F32_S, 4, "i64.trunc_sat_f32_s");
        (I64_TRUNC_SAT_F32_U, 5, "i64.trunc_sat_f32_u");
        (I64_TRUNC_SAT_F64_S, 6, "i64.trunc_sat_f64_s");
        (I64_TRUNC_SAT_F64_U, 7, "i64.trunc_sat_f64_u");
        (MEMORY_INIT, 8, "memory.init");
        (DATA_DROP, 9, "data.drop");
        (MEMORY_COPY, 10, "memory.copy");
        (MEMORY_FILL, 11, "memory.fill");
        (TABLE_INIT, 12, "table.init");
        (ELEM_DROP, 13, "elem.drop");
        (TABLE_COPY, 14, "table.copy");
        (TABLE_GROW, 15, "table.grow");
        (TABLE_SIZE, 16, "table.size");
        (TABLE_FILL, 17, "table.fill");
    }
}

/// Sub-opcodes behind the `0xFD` prefix: the 128-bit SIMD page.
pub mod simd {
    define_page! {
        u32, name;
        (V128_LOAD, 0, "v128.load");
        (V128_LOAD8X8_S, 1, "v128.load8x8_s");
        (V128_LOAD8X8_U, 2, "v128.load8x8_u");
        (V128_LOAD16X4_S, 3, "v128.load16x4_s");
        (V128_LOAD16X4_U, 4, "v128.load16x4_u");
        (V128_LOAD32X2_S, 5, "v128.load32x2_s");
        (V128_LOAD32X2_U, 6, "v128.load32x2_u");
        (V128_LOAD8_SPLAT, 7, "v128.load8_splat");
        (V128_LOAD16_SPLAT, 8, "v128.load16_splat");
        (V128_LOAD32_SPLAT, 9, "v128.load32_splat");
        (V128_LOAD64_SPLAT, 10, "v128.load64_splat");
        (V128_STORE, 11, "v128.store");
        (V128_CONST, 12, "v128.const");
        (I8X16_SHUFFLE, 13, "i8x16.shuffle");
        (I8X16_SWIZZLE, 14, "i8x16.swizzle");
        (I8X16_SPLAT, 15, "i8x16.splat");
        (I16X8_SPLAT, 16, "i16x8.splat");
        (I32X4_SPLAT, 17, "i32x4.splat");
        (I64X2_SPLAT, 18, "i64x2.splat");
        (F32X4_SPLAT, 19, "f32x4.splat");
        (F64X2_SPLAT, 20, "f64x2.splat");
        (I8X16_EXTRACT_LANE_S, 21, "i8x16.extract_lane_s");
        (I8X16_EXTRACT_LANE_U, 22, "i8x16.extract_lane_u");
        (I8X16_REPLACE_LANE, 23, "i8x16.replace_lane");
        (I16X8_EXTRACT_LANE_S, 24, "i16x8.extract_lane_s");
        (I16X8_EXTRACT_LANE_U, 25, "i16x8.extract_lane_u");
        (I16X8_REPLACE_LANE, 26, "i16x8.replace_lane");
        (I32X4_EXTRACT_LANE, 27, "i32x4.extract_lane");
        (I32X4_REPLACE_LANE, 28, "i32x4.replace_lane");
        (I64X2_EXTRACT_LANE, 29, "i64x2.extract_lane");
        (I64X2_REPLACE_LANE, 30, "i64x2.replace_lane");
        (F32X4_EXTRACT_LANE, 31, "f32x4.extract_lane");
        (F32X4_REPLACE_LANE, 32, "f32x4.replace_lane");
        (F64X2_EXTRACT_LANE, 33, "f64x2.extract_lane");
        (F64X2_REPLACE_LANE, 34, "f64x2.replace_lane");
        (I8X16_EQ, 35, "i8x16.eq");
        (I8X16_NE, 36, "i8x16.ne");
        (I8X16_LT_S, 37, "i8x16.lt_s");
        (I8X16_LT_U, 38, "i8x16.lt_u");
        (I8X16_GT_S, 39, "i8x16.gt_s");
        (I8X16_GT_U, 40, "i8x16.gt_u");
        (I8X16_LE_S, 41, "i8x16.le_s");
        (I8X16_LE_U, 42, "i8x16.le_u");
        (I8X16_GE_S, 43, "i8x16.ge_s");
        (I8X16_GE_U, 44, "i8x16.ge_u");
        (I16X8_EQ, 45, "i16x8.eq");
        (I16X8_NE, 46, "i16x8.ne");
        (I16X8_LT_S, 47, "i16x8.lt_s");
        (I16X8_LT_U, 48, "i16x8.lt_u");
        (I16X8_GT_S, 49, "i16x8.gt_s");
        (I16X8_GT_U, 50, "i16x8.gt_u");
        (I16X8_LE_S, 51, "i16x8.le_s");
        (I16X8_LE_U, 52, "i16x8.le_u");
        (I16X8_GE_S, 53, "i16x8.ge_s");
        (I16X8_GE_U, 54, "i16x8.ge_u");
        (I32X4_EQ, 55, "i32x4.eq");
        (I32X4_NE, 56, "i32x4.ne");
        (I32X4_LT_S, 57, "i32x4.lt_s");
        (I32X4_LT_U, 58, "i32x4.lt_u");
        (I32X4_GT_S, 59, "i32x4.gt_s");
        (I32X4_GT_U, 60, "i32x4.gt_u");
        (I32X4_LE_S, 61, "i32x4.le_s");
        (I32X4_LE_U, 62, "i32x4.le_u");
        (I32X4_GE_S, 63, "i32x4.ge_s");
        (I32X4_GE_U, 64, "i32x4.ge_u");
        (F32X4_EQ, 65, "f32x4.eq");
        (F32X4_NE, 66, "f32x4.ne");
        (F32X4_LT, 67, "f32x4.lt");
        (F32X4_GT, 68, "f32x4.gt");
        (F32X4_LE, 69, "f32x4.le");
        (F32X4_GE, 70, "f32x4.ge");
        (F64X2_EQ, 71, "f64x2.eq");
        (F64X2_NE, 72, "f64x2.ne");
        (F64X2_LT, 73, "f64x2.lt");
        (F64X2_GT, 74, "f64x2.gt");
        (F64X2_LE, 75, "f64x2.le");
        (F64X2_GE, 76, "f64x2.ge");
        (V128_NOT, 77, "v128.not");
        (V128_AND, 78, "v128.and");
        (V128_ANDNOT, 79, "v128.andnot");
        (V128_OR, 80, "v128.or");
        (V128_XOR, 81, "v128.xor");
        (V128_BITSELECT, 82, "v128.bitselect");
        (V128_ANY_TRUE, 83, "v128.any_true");
        (V128_LOAD8_LANE, 84, "v128.load8_lane");
        (V128_LOAD16_LANE, 85, "v128.load16_lane");
        (V128_LOAD32_LANE, 86, "v128.load32_lane");
        (V128_LOAD64_LANE, 87, "v128.load64_lane");
        (V128_STORE8_LANE, 88, "v128.store8_lane");
        (V128_STORE16_LANE, 89, "v128.store16_lane");
        (V128_STORE32_LANE, 90, "v128.store32_lane");
        (V128_STORE64_LANE, 91, "v128.store64_lane");
        (V128_LOAD32_ZERO, 92, "v128.load32_zero");
        (V128_LOAD64_ZERO, 93, "v128.load64_zero");
        (F32X4_DEMOTE_F64X2_ZERO, 94, "f32x4.demote_f64x2_zero");
        (F64X2_PROMOTE_LOW_F32X4, 95, "f64x2.promote_low_f32x4");
        (I8X16_ABS, 96, "i8x16.abs");
        (I8X16_NEG, 97, "i8x16.neg");
        (I8X16_POPCNT, 98, "i8x16.popcnt");
        (I8X16_ALL_TRUE, 99, "i8x16.all_true");
        (I8X16_BITMASK, 100, "i8x16.bitmask");
        (I8X16_NARROW_I16X8_S, 101, "i8x16.narrow_i16x8_s");
        (I8X16_NARROW_I16X8_U, 102, "i8x16.narrow_i16x8_u");
        (F32X4_CEIL, 103, "f32x4.ceil");
        (F32X4_FLOOR, 104, "f32x4.floor");
        (F32X4_TRUNC, 105, "f32x4.trunc");
        (F32X4_NEAREST, 106, "f32x4.nearest");
        (I8X16_SHL, 107, "i8x16.shl");
        (I8X16_SHR_S, 108, "i8x16.shr_s");
        (I8X16_SHR_U, 109, "i8x16.shr_u");
        (I8X16_ADD, 110, "i8x16.add");
        (I8X16_ADD_SAT_S, 111, "i8x16.add_sat_s");
        (I8X16_ADD_SAT_U, 112, "i8x16.add_sat_u");
        (I8X16_SUB, 113, "i8x16.sub");
        (I8X16_SUB_SAT_S, 114, "i8x16.sub_sat_s");
        (I8X16_SUB_SAT_U, 115, "i8x16.sub_sat_u");
        (F64X2_CEIL, 116, "f64x2.ceil");
        (F64X2_FLOOR, 117, "f64x2.floor");
        (I8X16_MIN_S, 118, "i8x16.min_s");
        (I8X16_MIN_U, 119, "i8x16.min_u");
        (I8X16_MAX_S, 120, "i8x16.max_s");
        (I8X16_MAX_U, 121, "i8x16.max_u");
        (F64X2_TRUNC, 122, "f64x2.trunc");
        (I8X16_AVGR_U, 123, "i8x16.avgr_u");
        (I16X8_EXTADD_PAIRWISE_I8X16_S, 124, "i16x8.extadd_pairwise_i8x16_s");
        (I16X8_EXTADD_PAIRWISE_I8X16_U, 125, "i16x8.extadd_pairwise_i8x16_u");
        (I32X4_EXTADD_PAIRWISE_I16X8_S, 126, "i32x4.extadd_pairwise_i16x8_s");
        (I32X4_EXTADD_PAIRWISE_I16X8_U, 127, "i32x4.extadd_pairwise_i16x8_u");
        (I16X8_ABS, 128, "i16x8.abs");
        (I16X8_NEG, 129, "i16x8.neg");
        (I16X8_Q15MULR_SAT_S, 130, "i16x8.q15mulr_sat_s");
        (I16X8_ALL_TRUE, 131, "i16x8.all_true");
        (I16X8_BITMASK, 132, "i16x8.bitmask");
        (I16X8_NARROW_I32X4_S, 133, "i16x8.narrow_i32x4_s");
        (I16X8_NARROW_I32X4_U, 134, "i16x8.narrow_i32x4_u");
        (I16X8_EXTEND_LOW_I8X16_S, 135, "i16x8.extend_low_i8x16_s");
        (I16X8_EXTEND_HIGH_I8X16_S, 136, "i16x8.extend_high_i8x16_s");
        (I16X8_EXTEND_LOW_I8X16_U, 137, "i16x8.extend_low_i8x16_u");
        (I16X8_EXTEND_HIGH_I8X16_U, 138, "i16x8.extend_high_i8x16_u");
        (I16X8_SHL, 139, "i16x8.shl");
        (I16X8_SHR_S, 140, "i16x8.shr_s");
        (I16X8_SHR_U, 141, "i16x8.shr_u");
        (I16X8_ADD, 142, "i16x8.add");
        (I16X8_ADD_SAT_S, 143, "i16x8.add_sat_s");
        (I16X8_ADD_SAT_U, 144, "i16x8.add_sat_u");
        (I16X8_SUB, 145, "i16x8.sub");
        (I16X8_SUB_SAT_S, 146, "i16x8.sub_sat_s");
        (I16X8_SUB_SAT_U, 147, "i16x8.sub_sat_u");
        (F64X2_NEAREST, 148, "f64x2.nearest");
        (I16X8_MUL, 149, "i16x8.mul");
        (I16X8_MIN_S, 150, "i16x8.min_s");
        (I16X8_MIN_U, 151, "i16x8.min_u");
        (I16X8_MAX_S, 152, "i16x8.max_s");
        (I16X8_MAX_U, 153, "i16x8.max_u");
        (I16X8_AVGR_U, 155, "i16x8.avgr_u");
        (I16X8_EXTMUL_LOW_I8X16_S, 156, "i16x8.extmul_low_i8x16_s");
        (I16X8_EXTMUL_HIGH_I8X16_S, 157, "i16x8.extmul_high_i8x16_s");
        (I16X8_EXTMUL_LOW_I8X16_U, 158, "i16x8.extmul_low_i8x16_u");
        (I16X8_EXTMUL_HIGH_I8X16_U, 159, "i16x8.extmul_high_i8x16_u");
        (I32X4_ABS, 160, "i32x4.abs");
        (I32X4_NEG, 161, "i32x4.neg");
        (I32X4_ALL_TRUE, 163, "i32x4.all_true");
        (I32X4_BITMASK, 164, "i32x4.bitmask");
        (I32X4_EXTEND_LOW_I16X8_S, 167, "i32x4.extend_low_i16x8_s");
        (I32X4_EXTEND_HIGH_I16X8_S, 168, "i32x4.extend_high_i16x8_s");
        (I32X4_EXTEND_LOW_I16X8_U, 169, "i32x4.extend_low_i16x8_u");
        (I32X4_EXTEND_HIGH_I16X8_U, 170, "i32x4.extend_high_i16x8_u");
        (I32X4_SHL, 171, "i32x4.shl");
        (I32X4_SHR_S, 172, "i32x4.shr_s");
        (I32X4_SHR_U, 173, "i32x4.shr_u");
        (I32X4_ADD, 174, "i32x4.add");
        (I32X4_SUB, 177, "i32x4.sub");
        (I32X4_MUL, 181, "i32x4.mul");
        (I32X4_MIN_S, 182, "i32x4.min_s");
        (I32X4_MIN_U, 183, "i32x4.min_u");
        (I32X4_MAX_S, 184, "i32x4.max_s");
        (I32X4_MAX_U, 185, "i32x4.max_u");
        (I32X4_DOT_I16X8_S, 186, "i32x4.dot_i16x8_s");
        (I32X4_EXTMUL_LOW_I16X8_S, 188, "i32x4.extmul_low_i16x8_s");
        (I32X4_EXTMUL_HIGH_I16X8_S, 189, "i32x4.extmul_high_i16x8_s");
        (I32X4_EXTMUL_LOW_I16X8_U, 190, "i32x4.extmul_low_i16x8_u");
        (I32X4_EXTMUL_HIGH_I16X8_U, 191, "i32x4.extmul_high_i16x8_u");
        (I64X2_ABS, 192, "i64x2.abs");
        (I64X2_NEG, 193, "i64x2.neg");
        (I64X2_ALL_TRUE, 195, "i64x2.all_true");
        (I64X2_BITMASK, 196, "i64x2.bitmask");
        (I64X2_EXTEND_LOW_I32X4_S, 199, "i64x2.extend_low_i32x4_s");
        (I64X2_EXTEND_HIGH_I32X4_S, 200, "i64x2.extend_high_i32x4_s");
        (I64X2_EXTEND_LOW_I32X4_U, 201, "i64x2.extend_low_i32x4_u");
        (I64X2_EXTEND_HIGH_I32X4_U, 202, "i64x2.extend_high_i32x4_u");
        (I64X2_SHL, 203, "i64x2.shl");
        (I64X2_SHR_S, 204, "i64x2.shr_s");
        (I64X2_SHR_U, 205, "i64x2.shr_u");
        (I64X2_ADD, 206, "i64x2.add");
        (I64X2_SUB, 209, "i64x2.sub");
        (I64X2_MUL, 213, "i64x2.mul");
        (I64X2_EQ, 214, "i64x2.eq");
        (I64X2_NE, 215, "i64x2.ne");
        (I64X2_LT_S, 216, "i64x2.lt_s");
        (I64X2_GT_S, 217, "i64x2.gt_s");
        (I64X2_LE_S, 218, "i64x2.le_s");
        (I64X2_GE_S, 219, "i64x2.ge_s");
        (I64X2_EXTMUL_LOW_I32X4_S, 220, "i64x2.extmul_low_i32x4_s");
        (I64X2_EXTMUL_HIGH_I32X4_S, 221, "i64x2.extmul_high_i32x4_s");
        (I64X2_EXTMUL_LOW_I32X4_U, 222, "i64x2.extmul_low_i32x4_u");
        (I64X2_EXTMUL_HIGH_I32X4_U, 223, "i64x2.extmul_high_i32x4_u");
        (F32X4_ABS, 224, "f32x4.abs");
        (F32X4_NEG, 225, "f32x4.neg");
        (F32X4_SQRT, 227, "f32x4.sqrt");
        (F32X4_ADD, 228, "f32x4.add");
        (F32X4_SUB, 229, "f32x4.sub");
        (F32X4_MUL, 230, "f32x4.mul");
        (F32X4_DIV, 231, "f32x4.div");
        (F32X4_MIN, 232, "f32x4.min");
        (F32X4_MAX, 233, "f32x4.max");
        (F32X4_PMIN, 234, "f32x4.pmin");
        (F32X4_PMAX, 235, "f32x4.pmax");
        (F64X2_ABS, 236, "f64x2.abs");
        (F64X2_NEG, 237, "f64x2.neg");
        (F64X2_SQRT, 239, "f64x2.sqrt");
        (F64X2_ADD, 240, "f64x2.add");
        (F64X2_SUB, 241, "f64x2.sub");
        (F64X2_MUL, 242, "f64x2.mul");
        (F64X2_DIV, 243, "f64x2.div");
        (F64X2_MIN, 244, "f64x2.min");
        (F64X2_MAX, 245, "f64x2.max");
        (F64X2_PMIN, 246, "f64x2.pmin");
        (F64X2_PMAX, 247, "f64x2.pmax");
        (I32X4_TRUNC_SAT_F32X4_S, 248, "i32x4.trunc_sat_f32x4_s");
        (I32X4_TRUNC_SAT_F32X4_U, 249, "i32x4.trunc_sat_f32x4_u");
        (F32X4_CONVERT_I32X4_S, 250, "f32x4.convert_i32x4_s");
        (F32X4_CONVERT_I32X4_U, 251, "f32x4.convert_i32x4_u");
        (I32X4_TRUNC_SAT_F64X2_S_ZERO, 252, "i32x4.trunc_sat_f64x2_s_zero");
        (I32X4_TRUNC_SAT_F64X2_U_ZERO, 253, "i32x4.trunc_sat_f64x2_u_zero");
        (F64X2_CONVERT_LOW_I32X4_S, 254, "f64x2.convert_low_i32x4_s");
        (F64X2_CONVERT_LOW_I32X4_U, 255, "f64x2.convert_low_i32x4_u");
    }
}

/// Sub-opcodes behind the `0xFE` prefix: the atomics page.
pub mod threads {
    define_page! {
        u32, name;
        (MEMORY_ATOMIC_NOTIFY, 0x00, "memory.atomic.notify");
        (MEMORY_ATOMIC_WAIT32, 0x01, "memory.atomic.wait32");
        (MEMORY_ATOMIC_WAIT64, 0x02, "memory.atomic.wait64");
        (ATOMIC_FENCE, 0x03, "atomic.fence");
        (I32_ATOMIC_LOAD, 0x10, "i32.atomic.load");
        (I64_ATOMIC_LOAD, 0x11, "i64.atomic.load");
        (I32_ATOMIC_LOAD8_U, 0x12, "i32.atomic.load8_u");
        (I32_ATOMIC_LOAD16_U, 0x13, "i32.atomic.load16_u");
        (I64_ATOMIC_LOAD8_U, 0x14, "i64.atomic.load8_u");
        (I64_ATOMIC_LOAD16_U, 0x15, "i64.atomic.load16_u");
        (I64_ATOMIC_LOAD32_U, 0x16, "i64.atomic.load32_u");
        (I32_ATOMIC_STORE, 0x17, "i32.atomic.store");
        (I64_ATOMIC_STORE, 0x18, "i64.atomic.store");
        (I32_ATOMIC_STORE8, 0x19, "i32.atomic.store8");
        (I32_ATOMIC_STORE16, 0x1A, "i32.atomic.store16");
        (I64_ATOMIC_STORE8, 0x1B, "i64.atomic.store8");
        (I64_ATOMIC_STORE16, 0x1C, "i64.atomic.store16");
        (I64_ATOMIC_STORE32, 0x1D, "i64.atomic.store32");
        (I32_ATOMIC_RMW_ADD, 0x1E, "i32.atomic.rmw.add");
        (I64_ATOMIC_RMW_ADD, 0x1F, "i64.atomic.rmw.add");
        (I32_ATOMIC_RMW8_ADD_U, 0x20, "i32.atomic.rmw8.add_u");
        (I32_ATOMIC_RMW16_ADD_U, 0x21, "i32.atomic.rmw16.add_u");
        (I64_ATOMIC_RMW8_ADD_U, 0x22, "i64.atomic.rmw8.add_u");
        (I64_ATOMIC_RMW16_ADD_U, 0x23, "i64.atomic.rmw16.add_u");
        (I64_ATOMIC_RMW32_ADD_U, 0x24, "i64.atomic.rmw32.add_u");
        (I32_ATOMIC_RMW_SUB, 0x25, "i32.atomic.rmw.sub");
        (I64_ATOMIC_RMW_SUB, 0x26, "i64.atomic.rmw.sub");
        (I32_ATOMIC_RMW8_SUB_U, 0x27, "i32.atomic.rmw8.sub_u");
        (I32_ATOMIC_RMW16_SUB_U, 0x28, "i32.atomic.rmw16.sub_u");
        (I64_ATOMIC_RMW8_SUB_U, 0x29, "i64.atomic.rmw8.sub_u");
        (I64_ATOMIC_RMW16_SUB_U, 0x2A, "i64.atomic.rmw16.sub_u");
        (I64_ATOMIC_RMW32_SUB_U, 0x2B, "i64.atomic.rmw32.sub_u");
        (I32_ATOMIC_RMW_AND, 0x2C, "i32.atomic.rmw.and");
        (I64_ATOMIC_RMW_AND, 0x2D, "i64.atomic.rmw.and");
        (I32_ATOMIC_RMW8_AND_U, 0x2E, "i32.atomic.rmw8.and_u");
        (I32_ATOMIC_RMW16_AND_U, 0x2F, "i32.atomic.rmw16.and_u");
        (I64_ATOMIC_RMW8_AND_U, 0x30, "i64.atomic.rmw8.and_u");
        (I64_ATOMIC_RMW16_AND_U, 0x31, "i64.atomic.rmw16.and_u");
        (I64_ATOMIC_RMW32_AND_U, 0x32, "i64.atomic.rmw32.and_u");
        (I32_ATOMIC_RMW_OR, 0x33, "i32.atomic.rmw.or");
        (I64_ATOMIC_RMW_OR, 0x34, "i64.atomic.rmw.or");
        (I32_ATOMIC_RMW8_OR_U, 0x35, "i32.atomic.rmw8.or_u");
        (I32_ATOMIC_RMW16_OR_U, 0x36, "i32.atomic.rmw16.or_u");
        (I64_ATOMIC_RMW8_OR_U, 0x37, "i64.atomic.rmw8.or_u");
        (I64_ATOMIC_RMW16_OR_U, 0x38, "i64.atomic.rmw16.or_u");
        (I64_ATOMIC_RMW32_OR_U, 0x39, "i64.atomic.rmw32.or_u");
        (I32_ATOMIC_RMW_XOR, 0x3A, "i32.atomic.rmw.xor");
        (I64_ATOMIC_RMW_XOR, 0x3B, "i64.atomic.rmw.xor");
        (I32_ATOMIC_RMW8_XOR_U, 0x3C, "i32.atomic.rmw8.xor_u");
        (I32_ATOMIC_RMW16_XOR_U, 0x3D, "i32.atomic.rmw16.xor_u");
        (I64_ATOMIC_RMW8_XOR_U, 0x3E, "i64.atomic.rmw8.xor_u");
        (I64_ATOMIC_RMW16_XOR_U, 0x3F, "i64.atomic.rmw16.xor_u");
        (I64_ATOMIC_RMW32_XOR_U, 0x40, "i64.atomic.rmw32.xor_u");
        (I32_ATOMIC_RMW_XCHG, 0x41, "i32.atomic.rmw.xchg");
        (I64_ATOMIC_RMW_XCHG, 0x42, "i64.atomic.rmw.xchg");
        (I32_ATOMIC_RMW8_XCHG_U, 0x43, "i32.atomic.rmw8.xchg_u");
        (I32_ATOMIC_RMW16_XCHG_U, 0x44, "i32.atomic.rmw16.xchg_u");
        (I64_ATOMIC_RMW8_XCHG_U, 0x45, "i64.atomic.rmw8.xchg_u");
        (I64_ATOMIC_RMW16_XCHG_U, 0x46, "i64.atomic.rmw16.xchg_u");
        (I64_ATOMIC_RMW32_XCHG_U, 0x47, "i64.atomic.rmw32.xchg_u");
        (I32_ATOMIC_RMW_CMPXCHG, 0x48, "i32.atomic.rmw.cmpxchg");
        (I64_ATOMIC_RMW_CMPXCHG, 0x49, "i64.atomic.rmw.cmpxchg");
        (I32_ATOMIC_RMW8_CMPXCHG_U, 0x4A, "i32.atomic.rmw8.cmpxchg_u");
        (I32_ATOMIC_RMW16_CMPXCHG_U, 0x4B, "i32.atomic.rmw16.cmpxchg_u");
        (I64_ATOMIC_RMW8_CMPXCHG_U, 0x4C, "i64.atomic.rmw8.cmpxchg_u");
        (I64_ATOMIC_RMW16_CMPXCHG_U, 0x4D, "i64.atomic.rmw16.cmpxchg_u");
        (I64_ATOMIC_RMW32_CMPXCHG_U, 0x4E, "i64.atomic.rmw32.cmpxchg_u");
    }
}
