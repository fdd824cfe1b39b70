//! Validator tests: rejection cases and the determinism of the
//! precomputed execution metadata.

mod common;

use common::*;
use wasmine::{
    isa, validate_module, Export, ExternIdx, Features, FuncEntry, FuncType, GlobalEntry,
    GlobalType, MemoryType, Module, ValueType,
};

fn single_func_module(func_type: FuncType, body: Body) -> Module {
    let mut module = Module::default();
    module.types.push(func_type);
    module.funcs.push(FuncEntry {
        type_idx: 0,
        locals: vec![],
        body: body.build(0),
    });
    module
}

#[test]
fn rejects_operand_type_mismatch() {
    let module = single_func_module(
        FuncType::new(&[][..], &[ValueType::F32][..]),
        Body::new()
            .i32_const(1)
            .f32_const(0x3F80_0000)
            .op(isa::F32_ADD)
            .end(),
    );
    let err = validate_module(module, Features::new()).unwrap_err();
    assert!(format!("{}", err).contains("type mismatch"), "{}", err);
}

#[test]
fn rejects_stack_underflow() {
    let module = single_func_module(
        FuncType::new(&[][..], &[ValueType::I32][..]),
        Body::new().op(isa::I32_ADD).end(),
    );
    let err = validate_module(module, Features::new()).unwrap_err();
    assert!(format!("{}", err).contains("underflow"), "{}", err);
}

#[test]
fn rejects_leftover_values_at_block_end() {
    let module = single_func_module(
        FuncType::new(&[][..], &[][..]),
        Body::new().i32_const(1).i32_const(2).op(isa::DROP).end(),
    );
    let err = validate_module(module, Features::new()).unwrap_err();
    assert!(format!("{}", err).contains("remain"), "{}", err);
}

#[test]
fn rejects_overaligned_access() {
    let mut module = single_func_module(
        FuncType::new(&[][..], &[ValueType::I32][..]),
        // i32.load with an alignment exponent of 3 (2^3 > 4 bytes).
        Body::new().i32_const(0).mem_op(isa::I32_LOAD, 3, 0).end(),
    );
    module.memories.push(MemoryType::new(1, None));
    let err = validate_module(module, Features::new()).unwrap_err();
    assert!(format!("{}", err).contains("alignment"), "{}", err);
}

#[test]
fn rejects_unknown_local() {
    let module = single_func_module(
        FuncType::new(&[][..], &[ValueType::I32][..]),
        Body::new().local_get(3).end(),
    );
    let err = validate_module(module, Features::new()).unwrap_err();
    assert!(format!("{}", err).contains("unknown local"), "{}", err);
}

#[test]
fn rejects_unknown_label() {
    let module = single_func_module(
        FuncType::new(&[][..], &[][..]),
        Body::new().block_empty().br(5).end().end(),
    );
    let err = validate_module(module, Features::new()).unwrap_err();
    assert!(format!("{}", err).contains("unknown label"), "{}", err);
}

#[test]
fn rejects_memory_init_without_datacount() {
    let mut module = single_func_module(
        FuncType::new(&[][..], &[][..]),
        Body::new()
            .i32_const(0)
            .i32_const(0)
            .i32_const(0)
            .memory_init(0)
            .end(),
    );
    module.memories.push(MemoryType::new(1, None));
    module.datas.push(wasmine::DataSegment {
        kind: wasmine::DataKind::Passive,
        bytes: vec![1, 2, 3],
    });
    // No datacount section.
    let err = validate_module(module, Features::new()).unwrap_err();
    assert!(format!("{}", err).contains("datacount"), "{}", err);
}

#[test]
fn rejects_set_of_immutable_global() {
    let mut module = single_func_module(
        FuncType::new(&[][..], &[][..]),
        Body::new().i32_const(1).global_set(0).end(),
    );
    module.globals.push(GlobalEntry {
        ty: GlobalType::new(ValueType::I32, false),
        init: const_i32(0),
    });
    let err = validate_module(module, Features::new()).unwrap_err();
    assert!(format!("{}", err).contains("immutable"), "{}", err);
}

#[test]
fn rejects_mutable_global_in_const_expr() {
    let mut module = Module::default();
    module.globals.push(GlobalEntry {
        ty: GlobalType::new(ValueType::I32, true),
        init: const_i32(1),
    });
    module.globals.push(GlobalEntry {
        ty: GlobalType::new(ValueType::I32, false),
        // Reads a non-imported (and mutable) global.
        init: const_global_get(0),
    });
    let err = validate_module(module, Features::new()).unwrap_err();
    assert!(format!("{}", err).contains("imported"), "{}", err);
}

#[test]
fn rejects_gated_opcode_pages() {
    let module = single_func_module(
        FuncType::new(&[][..], &[][..]),
        Body::new()
            .v128_const([0; 16])
            .op(isa::DROP)
            .end(),
    );
    // SIMD disabled.
    let err = validate_module(module, Features::new()).unwrap_err();
    assert!(format!("{}", err).contains("simd"), "{}", err);
}

#[test]
fn rejects_tail_call_without_the_feature() {
    let mut module = Module::default();
    module.types.push(FuncType::new(&[][..], &[][..]));
    module.funcs.push(FuncEntry {
        type_idx: 0,
        locals: vec![],
        body: Body::new().return_call(0).end().build(0),
    });
    let err = validate_module(module, Features::new()).unwrap_err();
    assert!(format!("{}", err).contains("tail-call"), "{}", err);
}

#[test]
fn rejects_br_table_arity_mismatch() {
    let module = single_func_module(
        FuncType::new(&[][..], &[ValueType::I32][..]),
        Body::new()
            .block_result(ValueType::I32)
            .block_empty()
            .i32_const(1)
            .i32_const(0)
            // Target 0 expects no values, target 1 expects one.
            .br_table(&[0], 1)
            .end()
            .i32_const(2)
            .end()
            .end(),
    );
    let err = validate_module(module, Features::new()).unwrap_err();
    assert!(format!("{}", err).contains("arity"), "{}", err);
}

#[test]
fn rejects_if_without_else_that_changes_types() {
    let module = single_func_module(
        FuncType::new(&[][..], &[ValueType::I32][..]),
        Body::new()
            .i32_const(1)
            .if_result(ValueType::I32)
            .i32_const(2)
            .end()
            .end(),
    );
    let err = validate_module(module, Features::new()).unwrap_err();
    assert!(format!("{}", err).contains("if without else"), "{}", err);
}

#[test]
fn rejects_duplicate_exports() {
    let mut module = single_func_module(
        FuncType::new(&[][..], &[][..]),
        Body::new().end(),
    );
    module.exports.push(Export {
        field: "f".into(),
        idx: ExternIdx::Func(0),
    });
    module.exports.push(Export {
        field: "f".into(),
        idx: ExternIdx::Func(0),
    });
    let err = validate_module(module, Features::new()).unwrap_err();
    assert!(format!("{}", err).contains("duplicate"), "{}", err);
}

#[test]
fn rejects_undeclared_ref_func() {
    let mut module = Module::default();
    module.types.push(FuncType::new(&[][..], &[][..]));
    module.funcs.push(FuncEntry {
        type_idx: 0,
        locals: vec![],
        // ref.func on a function never declared in an elem segment,
        // export or global initialiser.
        body: Body::new()
            .op(isa::REF_FUNC)
            .uleb(0)
            .op(isa::DROP)
            .end()
            .build(0),
    });
    let err = validate_module(module, Features::new()).unwrap_err();
    assert!(format!("{}", err).contains("not declared"), "{}", err);
}

#[test]
fn dead_code_is_still_decoded() {
    // Bytes after `unreachable` are dead but must still parse; an
    // unknown opcode there rejects the module.
    let module = single_func_module(
        FuncType::new(&[][..], &[][..]),
        Body::new().op(isa::UNREACHABLE).byte(0x27).end(),
    );
    let err = validate_module(module, Features::new()).unwrap_err();
    assert!(format!("{}", err).contains("unknown opcode"), "{}", err);

    // Well-formed dead code with permissive stack typing passes.
    let module = single_func_module(
        FuncType::new(&[][..], &[][..]),
        Body::new()
            .op(isa::UNREACHABLE)
            .op(isa::I32_ADD)
            .op(isa::DROP)
            .end(),
    );
    validate_module(module, Features::new()).unwrap();
}

#[test]
fn validation_is_idempotent() {
    let build = || {
        let mut module = Module::default();
        module
            .types
            .push(FuncType::new(&[ValueType::I32][..], &[ValueType::I32][..]));
        module.funcs.push(FuncEntry {
            type_idx: 0,
            locals: vec![(1, ValueType::I64)],
            body: Body::new()
                .block_result(ValueType::I32)
                .local_get(0)
                .if_result(ValueType::I32)
                .i32_const(1)
                .else_()
                .i32_const(2)
                .end()
                .br(0)
                .end()
                .i64_const(5)
                .op(isa::DROP)
                .end()
                .build(0x123),
        });
        module
    };

    let first = validate_module(build(), Features::new()).unwrap();
    let second = validate_module(build(), Features::new()).unwrap();
    let a = &first.func_body(0).unwrap().info;
    let b = &second.func_body(0).unwrap().info;
    assert_eq!(a, b);
    assert!(!a.jumps.is_empty());
    assert!(!a.annotations.is_empty());
    assert!(a.max_cells >= 3);
}

#[test]
fn jump_targets_stay_inside_the_expression() {
    let mut module = Module::default();
    module.types.push(FuncType::new(&[][..], &[][..]));
    module.funcs.push(FuncEntry {
        type_idx: 0,
        locals: vec![],
        body: Body::new()
            .block_empty()
            .block_empty()
            .br(1)
            .end()
            .end()
            .end()
            .build(0x40),
    });
    let validated = validate_module(module, Features::new()).unwrap();
    let body = validated.func_body(0).unwrap();
    let start = body.expr.base_pc();
    let end = body.expr.end_pc();
    for jump in &body.info.jumps {
        assert!(jump.pc >= start && jump.pc < end);
        assert!(jump.target > start && jump.target <= end);
    }
}
