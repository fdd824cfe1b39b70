//! End-to-end interpreter tests driving whole modules through
//! validation, instantiation and execution.

mod common;

use common::*;
use wasmine::{
    isa, Export, ExternIdx, Features, FuncEntry, FuncInstance, FuncType, GlobalEntry, GlobalType,
    HostControl, Import, ImportDesc, ImportsBuilder, MemoryType, Module, ModuleImportResolver,
    NopExternals, RestartRecord, TableType, Trap, TrapCode, Value, ValueType,
};

use wasmine::{DataKind, DataSegment, ElemItem, ElemKind, ElemSegment, InvokeOutcome};

fn i32_unary_type() -> FuncType {
    FuncType::new(&[ValueType::I32][..], &[ValueType::I32][..])
}

fn nullary(result: Option<ValueType>) -> FuncType {
    match result {
        Some(ty) => FuncType::new(&[][..], vec![ty]),
        None => FuncType::new(&[][..], &[][..]),
    }
}

#[test]
fn factorial() {
    let mut module = Module::default();
    module.types.push(i32_unary_type());
    module.funcs.push(FuncEntry {
        type_idx: 0,
        locals: vec![],
        body: Body::new()
            .local_get(0)
            .i32_const(1)
            .op(isa::I32_LE_S)
            .if_result(ValueType::I32)
            .i32_const(1)
            .else_()
            .local_get(0)
            .local_get(0)
            .i32_const(1)
            .op(isa::I32_SUB)
            .call(0)
            .op(isa::I32_MUL)
            .end()
            .end()
            .build(0x40),
    });
    module.exports.push(Export {
        field: "fact".into(),
        idx: ExternIdx::Func(0),
    });

    let (_validated, instance) = instantiate(module, Features::new());
    let result = instance
        .invoke_export("fact", &[Value::I32(5)], &mut NopExternals)
        .unwrap();
    assert_eq!(result, vec![Value::I32(120)]);

    // 13! = 6227020800, which wraps to 1932053504 mod 2^32.
    let result = instance
        .invoke_export("fact", &[Value::I32(13)], &mut NopExternals)
        .unwrap();
    assert_eq!(result, vec![Value::I32(1932053504)]);
}

#[test]
fn division_overflow_traps() {
    let mut module = Module::default();
    module.types.push(nullary(Some(ValueType::I32)));
    module.funcs.push(FuncEntry {
        type_idx: 0,
        locals: vec![],
        body: Body::new()
            .i32_const(i32::MIN)
            .i32_const(-1)
            .op(isa::I32_DIV_S)
            .end()
            .build(0),
    });
    module.funcs.push(FuncEntry {
        type_idx: 0,
        locals: vec![],
        body: Body::new()
            .i32_const(1)
            .i32_const(0)
            .op(isa::I32_DIV_U)
            .end()
            .build(0x100),
    });
    module.exports.push(Export {
        field: "overflow".into(),
        idx: ExternIdx::Func(0),
    });
    module.exports.push(Export {
        field: "div0".into(),
        idx: ExternIdx::Func(1),
    });

    let (_validated, instance) = instantiate(module, Features::new());
    let trap = expect_trap(instance.invoke_export("overflow", &[], &mut NopExternals));
    assert!(matches!(trap.code(), TrapCode::IntegerOverflow));
    let trap = expect_trap(instance.invoke_export("div0", &[], &mut NopExternals));
    assert!(matches!(trap.code(), TrapCode::IntegerDivideByZero));
}

#[test]
fn memory_grow_and_overlapping_copy() {
    let mut module = Module::default();
    module.types.push(nullary(Some(ValueType::I32)));
    module.types.push(nullary(None));
    module.memories.push(MemoryType::new(1, None));
    module.funcs.push(FuncEntry {
        type_idx: 0,
        locals: vec![],
        body: Body::new().i32_const(1).memory_grow().end().build(0),
    });
    module.funcs.push(FuncEntry {
        type_idx: 1,
        locals: vec![],
        body: Body::new()
            .i32_const(65534)
            .i32_const(65532)
            .i32_const(4)
            .memory_copy()
            .end()
            .build(0x80),
    });
    module.funcs.push(FuncEntry {
        type_idx: 0,
        locals: vec![],
        body: Body::new().memory_size().end().build(0x200),
    });
    module.exports.push(Export {
        field: "grow".into(),
        idx: ExternIdx::Func(0),
    });
    module.exports.push(Export {
        field: "copy".into(),
        idx: ExternIdx::Func(1),
    });
    module.exports.push(Export {
        field: "size".into(),
        idx: ExternIdx::Func(2),
    });
    module.exports.push(Export {
        field: "mem".into(),
        idx: ExternIdx::Memory(0),
    });

    let (_validated, instance) = instantiate(module, Features::new());
    let result = instance
        .invoke_export("grow", &[], &mut NopExternals)
        .unwrap();
    assert_eq!(result, vec![Value::I32(1)]);
    let result = instance
        .invoke_export("size", &[], &mut NopExternals)
        .unwrap();
    assert_eq!(result, vec![Value::I32(2)]);

    let memory = instance
        .export_by_name("mem")
        .unwrap()
        .as_memory()
        .cloned()
        .unwrap();
    memory.set(65532, &[1, 2, 3, 4]).unwrap();
    instance
        .invoke_export("copy", &[], &mut NopExternals)
        .unwrap();
    assert_eq!(memory.get(65532, 6).unwrap(), vec![1, 2, 1, 2, 3, 4]);
}

#[test]
fn failed_grow_returns_minus_one() {
    let mut module = Module::default();
    module.types.push(nullary(Some(ValueType::I32)));
    module.memories.push(MemoryType::new(1, Some(1)));
    module.funcs.push(FuncEntry {
        type_idx: 0,
        locals: vec![],
        body: Body::new().i32_const(1).memory_grow().end().build(0),
    });
    module.funcs.push(FuncEntry {
        type_idx: 0,
        locals: vec![],
        body: Body::new().memory_size().end().build(0x40),
    });
    module.exports.push(Export {
        field: "grow".into(),
        idx: ExternIdx::Func(0),
    });
    module.exports.push(Export {
        field: "size".into(),
        idx: ExternIdx::Func(1),
    });

    let (_validated, instance) = instantiate(module, Features::new());
    let result = instance
        .invoke_export("grow", &[], &mut NopExternals)
        .unwrap();
    assert_eq!(result, vec![Value::I32(-1)]);
    let result = instance
        .invoke_export("size", &[], &mut NopExternals)
        .unwrap();
    assert_eq!(result, vec![Value::I32(1)]);
}

#[test]
fn br_table_selects_depths() {
    let mut module = Module::default();
    module.types.push(i32_unary_type());
    module.funcs.push(FuncEntry {
        type_idx: 0,
        locals: vec![],
        body: Body::new()
            .block_empty()
            .block_empty()
            .block_empty()
            .block_empty()
            .local_get(0)
            .br_table(&[0, 1, 2], 3)
            .end()
            .i32_const(10)
            .op(isa::RETURN)
            .end()
            .i32_const(11)
            .op(isa::RETURN)
            .end()
            .i32_const(12)
            .op(isa::RETURN)
            .end()
            .i32_const(13)
            .end()
            .build(0),
    });
    module.exports.push(Export {
        field: "select_depth".into(),
        idx: ExternIdx::Func(0),
    });

    let (_validated, instance) = instantiate(module, Features::new());
    for (selector, expected) in [(0, 10), (1, 11), (2, 12), (3, 13), (5, 13)] {
        let result = instance
            .invoke_export("select_depth", &[Value::I32(selector)], &mut NopExternals)
            .unwrap();
        assert_eq!(result, vec![Value::I32(expected)], "selector {}", selector);
    }
}

#[test]
fn call_indirect_signature_checks() {
    let mut module = Module::default();
    // type 0: (i32) -> i32, type 1: (i64) -> i32
    module
        .types
        .push(FuncType::new(&[ValueType::I32][..], &[ValueType::I32][..]));
    module
        .types
        .push(FuncType::new(&[ValueType::I64][..], &[ValueType::I32][..]));
    module.types.push(nullary(Some(ValueType::I32)));
    // func 0: the (i64) -> i32 callee.
    module.funcs.push(FuncEntry {
        type_idx: 1,
        locals: vec![],
        body: Body::new().i32_const(9).end().build(0),
    });
    // func 1: calls through the table expecting (i32) -> i32.
    module.funcs.push(FuncEntry {
        type_idx: 2,
        locals: vec![],
        body: Body::new()
            .i32_const(7)
            .i32_const(0)
            .call_indirect(0, 0)
            .end()
            .build(0x40),
    });
    // func 2: calls with the correct type.
    module.funcs.push(FuncEntry {
        type_idx: 2,
        locals: vec![],
        body: Body::new()
            .i64_const(5)
            .i32_const(0)
            .call_indirect(1, 0)
            .end()
            .build(0x80),
    });
    // func 3: a null entry.
    module.funcs.push(FuncEntry {
        type_idx: 2,
        locals: vec![],
        body: Body::new()
            .i64_const(5)
            .i32_const(1)
            .call_indirect(1, 0)
            .end()
            .build(0xC0),
    });
    // func 4: out of bounds.
    module.funcs.push(FuncEntry {
        type_idx: 2,
        locals: vec![],
        body: Body::new()
            .i64_const(5)
            .i32_const(5)
            .call_indirect(1, 0)
            .end()
            .build(0x100),
    });
    module
        .tables
        .push(TableType::new(ValueType::FuncRef, 2, Some(2)));
    module.elems.push(ElemSegment {
        ty: ValueType::FuncRef,
        kind: ElemKind::Active {
            table_index: 0,
            offset: const_i32(0),
        },
        items: vec![ElemItem::Func(0)],
    });
    for (i, name) in [(1, "mismatch"), (2, "matching"), (3, "null"), (4, "oob")] {
        module.exports.push(Export {
            field: name.into(),
            idx: ExternIdx::Func(i),
        });
    }

    let (_validated, instance) = instantiate(module, Features::new());
    let trap = expect_trap(instance.invoke_export("mismatch", &[], &mut NopExternals));
    assert!(matches!(trap.code(), TrapCode::IndirectCallTypeMismatch));
    let result = instance
        .invoke_export("matching", &[], &mut NopExternals)
        .unwrap();
    assert_eq!(result, vec![Value::I32(9)]);
    let trap = expect_trap(instance.invoke_export("null", &[], &mut NopExternals));
    assert!(matches!(trap.code(), TrapCode::IndirectCallNullFuncref));
    let trap = expect_trap(instance.invoke_export("oob", &[], &mut NopExternals));
    assert!(matches!(trap.code(), TrapCode::IndirectCallOutOfBounds));
}

#[test]
fn proc_exit_reports_exit_code() {
    let mut module = Module::default();
    module
        .types
        .push(FuncType::new(&[ValueType::I32][..], &[][..]));
    module.types.push(nullary(None));
    module.imports.push(Import {
        module: "wasi_snapshot_preview1".into(),
        field: "proc_exit".into(),
        desc: ImportDesc::Func(0),
    });
    module.funcs.push(FuncEntry {
        type_idx: 1,
        locals: vec![],
        body: Body::new().i32_const(42).call(0).end().build(0),
    });
    module.exports.push(Export {
        field: "go".into(),
        idx: ExternIdx::Func(1),
    });

    struct WasiResolver;
    impl ModuleImportResolver for WasiResolver {
        fn resolve_func(
            &self,
            field_name: &str,
            func_type: &FuncType,
        ) -> Result<wasmine::FuncRef, wasmine::Error> {
            assert_eq!(field_name, "proc_exit");
            Ok(FuncInstance::alloc_host(func_type.clone(), 0))
        }
    }

    let validated = wasmine::validate_module(module, Features::new()).unwrap();
    let imports = ImportsBuilder::new().with_resolver("wasi_snapshot_preview1", &WasiResolver);
    let instance = wasmine::ModuleInstance::new(&validated, &imports)
        .unwrap()
        .assert_no_start();

    let mut host = TestHost {
        handler: |index: usize, call: wasmine::HostCall| -> Result<HostControl, Trap> {
            assert_eq!(index, 0);
            let code: u32 = call.args().nth_checked(0)?;
            Err(Trap::new(TrapCode::VoluntaryExit(code)))
        },
    };

    let go = instance
        .export_by_name("go")
        .unwrap()
        .as_func()
        .cloned()
        .unwrap();
    let mut invocation = FuncInstance::invoke_resumable(&go, &[], &config()).unwrap();
    let err = invocation.resume(&mut host).unwrap_err();
    match err {
        wasmine::Error::Trap(trap) => {
            assert!(matches!(trap.code(), TrapCode::VoluntaryExit(42)));
        }
        other => panic!("expected a voluntary-exit trap, got {:?}", other),
    }
    assert_eq!(invocation.exit_code(), Some(42));
}

#[test]
fn loop_branches_resume_at_the_loop_head() {
    // Sums 1..=n with a br_if-driven loop.
    let mut module = Module::default();
    module.types.push(i32_unary_type());
    module.funcs.push(FuncEntry {
        type_idx: 0,
        locals: vec![(2, ValueType::I32)],
        body: Body::new()
            .loop_empty()
            .local_get(2)
            .i32_const(1)
            .op(isa::I32_ADD)
            .local_tee(2)
            .local_get(1)
            .op(isa::I32_ADD)
            .local_set(1)
            .local_get(2)
            .local_get(0)
            .op(isa::I32_LT_S)
            .br_if(0)
            .end()
            .local_get(1)
            .end()
            .build(0),
    });
    module.exports.push(Export {
        field: "sum".into(),
        idx: ExternIdx::Func(0),
    });

    let (_validated, instance) = instantiate(module, Features::new());
    let result = instance
        .invoke_export("sum", &[Value::I32(10)], &mut NopExternals)
        .unwrap();
    assert_eq!(result, vec![Value::I32(55)]);
}

#[test]
fn block_parameters_flow_through_branches() {
    let mut module = Module::default();
    // type 0: () -> i32 for the function, type 1: (i32, i32) -> i32 for
    // the block.
    module.types.push(nullary(Some(ValueType::I32)));
    module.types.push(FuncType::new(
        &[ValueType::I32, ValueType::I32][..],
        &[ValueType::I32][..],
    ));
    module.funcs.push(FuncEntry {
        type_idx: 0,
        locals: vec![],
        body: Body::new()
            .i32_const(30)
            .i32_const(12)
            .block_type(1)
            .op(isa::I32_ADD)
            .br(0)
            .end()
            .end()
            .build(0),
    });
    module.exports.push(Export {
        field: "add".into(),
        idx: ExternIdx::Func(0),
    });

    let (_validated, instance) = instantiate(module, Features::new());
    let result = instance
        .invoke_export("add", &[], &mut NopExternals)
        .unwrap();
    assert_eq!(result, vec![Value::I32(42)]);
}

#[test]
fn drop_discards_the_annotated_width() {
    let mut module = Module::default();
    module.types.push(nullary(Some(ValueType::I32)));
    module.funcs.push(FuncEntry {
        type_idx: 0,
        locals: vec![],
        body: Body::new()
            .i32_const(1)
            .i64_const(2)
            .op(isa::DROP)
            .end()
            .build(0),
    });
    module.exports.push(Export {
        field: "keep_first".into(),
        idx: ExternIdx::Func(0),
    });

    let (_validated, instance) = instantiate(module, Features::new());
    let result = instance
        .invoke_export("keep_first", &[], &mut NopExternals)
        .unwrap();
    assert_eq!(result, vec![Value::I32(1)]);
}

#[test]
fn select_picks_by_condition() {
    let mut module = Module::default();
    module.types.push(i32_unary_type());
    module.funcs.push(FuncEntry {
        type_idx: 0,
        locals: vec![],
        body: Body::new()
            .i64_const(111)
            .i64_const(222)
            .local_get(0)
            .op(isa::SELECT)
            .op(isa::I32_WRAP_I64)
            .end()
            .build(0),
    });
    module.exports.push(Export {
        field: "pick".into(),
        idx: ExternIdx::Func(0),
    });

    let (_validated, instance) = instantiate(module, Features::new());
    let result = instance
        .invoke_export("pick", &[Value::I32(1)], &mut NopExternals)
        .unwrap();
    assert_eq!(result, vec![Value::I32(111)]);
    let result = instance
        .invoke_export("pick", &[Value::I32(0)], &mut NopExternals)
        .unwrap();
    assert_eq!(result, vec![Value::I32(222)]);
}

#[test]
fn mutable_global_keeps_state_between_calls() {
    let mut module = Module::default();
    module.types.push(nullary(Some(ValueType::I32)));
    module.globals.push(GlobalEntry {
        ty: GlobalType::new(ValueType::I32, true),
        init: const_i32(7),
    });
    module.funcs.push(FuncEntry {
        type_idx: 0,
        locals: vec![],
        body: Body::new()
            .global_get(0)
            .i32_const(1)
            .op(isa::I32_ADD)
            .global_set(0)
            .global_get(0)
            .end()
            .build(0),
    });
    module.exports.push(Export {
        field: "bump".into(),
        idx: ExternIdx::Func(0),
    });

    let (_validated, instance) = instantiate(module, Features::new());
    let result = instance
        .invoke_export("bump", &[], &mut NopExternals)
        .unwrap();
    assert_eq!(result, vec![Value::I32(8)]);
    let result = instance
        .invoke_export("bump", &[], &mut NopExternals)
        .unwrap();
    assert_eq!(result, vec![Value::I32(9)]);
}

#[test]
fn passive_data_init_and_drop() {
    let mut module = Module::default();
    module.types.push(nullary(Some(ValueType::I32)));
    module.types.push(nullary(None));
    module.memories.push(MemoryType::new(1, None));
    module.datas.push(DataSegment {
        kind: DataKind::Passive,
        bytes: vec![0xAA, 0xBB, 0xCC],
    });
    module.datacount = Some(1);
    module.funcs.push(FuncEntry {
        type_idx: 0,
        locals: vec![],
        body: Body::new()
            .i32_const(0)
            .i32_const(1)
            .i32_const(2)
            .memory_init(0)
            .i32_const(0)
            .mem_op(isa::I32_LOAD8_U, 0, 0)
            .end()
            .build(0),
    });
    module.funcs.push(FuncEntry {
        type_idx: 1,
        locals: vec![],
        body: Body::new()
            .data_drop(0)
            .i32_const(0)
            .i32_const(0)
            .i32_const(1)
            .memory_init(0)
            .end()
            .build(0x80),
    });
    module.exports.push(Export {
        field: "init".into(),
        idx: ExternIdx::Func(0),
    });
    module.exports.push(Export {
        field: "drop_then_init".into(),
        idx: ExternIdx::Func(1),
    });

    let (_validated, instance) = instantiate(module, Features::new());
    let result = instance
        .invoke_export("init", &[], &mut NopExternals)
        .unwrap();
    assert_eq!(result, vec![Value::I32(0xBB)]);
    let trap = expect_trap(instance.invoke_export("drop_then_init", &[], &mut NopExternals));
    assert!(matches!(trap.code(), TrapCode::DataAccessOutOfBounds));
}

#[test]
fn restartable_host_call_is_resumed() {
    let mut module = Module::default();
    module.types.push(nullary(Some(ValueType::I32)));
    module.imports.push(Import {
        module: "env".into(),
        field: "blocking".into(),
        desc: ImportDesc::Func(0),
    });
    module.funcs.push(FuncEntry {
        type_idx: 0,
        locals: vec![],
        body: Body::new().call(0).end().build(0),
    });
    module.exports.push(Export {
        field: "run".into(),
        idx: ExternIdx::Func(1),
    });

    struct EnvResolver;
    impl ModuleImportResolver for EnvResolver {
        fn resolve_func(
            &self,
            _field_name: &str,
            func_type: &FuncType,
        ) -> Result<wasmine::FuncRef, wasmine::Error> {
            Ok(FuncInstance::alloc_host(func_type.clone(), 0))
        }
    }

    let validated = wasmine::validate_module(module, Features::new()).unwrap();
    let imports = ImportsBuilder::new().with_resolver("env", &EnvResolver);
    let instance = wasmine::ModuleInstance::new(&validated, &imports)
        .unwrap()
        .assert_no_start();

    let mut calls = 0usize;
    let mut host = TestHost {
        handler: |_index: usize, mut call: wasmine::HostCall| {
            calls += 1;
            match call.take_restart() {
                None => {
                    // First attempt: park a record and ask to be
                    // re-entered.
                    call.push_restart(RestartRecord::Host(7));
                    Ok(HostControl::Restart)
                }
                Some(RestartRecord::Host(7)) => {
                    call.results[0] = Value::I32(123);
                    Ok(HostControl::Done)
                }
                Some(other) => panic!("unexpected restart record {:?}", other),
            }
        },
    };

    let result = instance
        .invoke_export("run", &[], &mut host)
        .unwrap();
    assert_eq!(result, vec![Value::I32(123)]);
    drop(host);
    assert_eq!(calls, 2);
}

#[test]
fn interrupt_unwinds_the_invocation() {
    let mut module = Module::default();
    module.types.push(nullary(None));
    module.funcs.push(FuncEntry {
        type_idx: 0,
        locals: vec![],
        body: Body::new().loop_empty().br(0).end().end().build(0),
    });
    module.exports.push(Export {
        field: "spin".into(),
        idx: ExternIdx::Func(0),
    });

    let (_validated, instance) = instantiate(module, Features::new());
    let spin = instance
        .export_by_name("spin")
        .unwrap()
        .as_func()
        .cloned()
        .unwrap();

    let flag = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(true));
    let mut invocation = FuncInstance::invoke_resumable(&spin, &[], &config()).unwrap();
    invocation.set_interrupt_flag(flag);
    let outcome = invocation.resume(&mut NopExternals).unwrap();
    assert!(matches!(outcome, InvokeOutcome::Interrupted));
}

#[test]
fn runaway_recursion_exhausts_the_call_stack() {
    let mut module = Module::default();
    module.types.push(nullary(None));
    module.funcs.push(FuncEntry {
        type_idx: 0,
        locals: vec![],
        body: Body::new().call(0).end().build(0),
    });
    module.exports.push(Export {
        field: "recurse".into(),
        idx: ExternIdx::Func(0),
    });

    let (_validated, instance) = instantiate(module, Features::new());
    let trap = expect_trap(instance.invoke_export("recurse", &[], &mut NopExternals));
    assert!(matches!(trap.code(), TrapCode::CallStackExhausted));
}

#[test]
fn invoking_with_wrong_argument_types_is_rejected() {
    let mut module = Module::default();
    module.types.push(i32_unary_type());
    module.funcs.push(FuncEntry {
        type_idx: 0,
        locals: vec![],
        body: Body::new().local_get(0).end().build(0),
    });
    module.exports.push(Export {
        field: "id".into(),
        idx: ExternIdx::Func(0),
    });

    let (_validated, instance) = instantiate(module, Features::new());
    let trap = expect_trap(instance.invoke_export("id", &[Value::I64(1)], &mut NopExternals));
    assert!(matches!(trap.code(), TrapCode::UnexpectedSignature));
    let trap = expect_trap(instance.invoke_export("id", &[], &mut NopExternals));
    assert!(matches!(trap.code(), TrapCode::UnexpectedSignature));
}
