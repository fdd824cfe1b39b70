//! Tests for the gated proposals: SIMD, tail calls and shared-memory
//! atomics.

mod common;

use common::*;
use wasmine::{
    isa, Export, ExternIdx, Features, FuncEntry, FuncType, MemoryType, Module, NopExternals,
    TrapCode, Value, ValueType, V128,
};

fn simd_features() -> Features {
    let mut features = Features::new();
    features.simd = true;
    features
}

#[test]
fn simd_lane_arithmetic() {
    let mut module = Module::default();
    module
        .types
        .push(FuncType::new(&[][..], &[ValueType::I32][..]));
    let lhs = V128::from_i32x4([1, 2, 3, 4]).to_le_bytes();
    let rhs = V128::from_i32x4([10, 20, 30, 40]).to_le_bytes();
    module.funcs.push(FuncEntry {
        type_idx: 0,
        locals: vec![],
        body: Body::new()
            .v128_const(lhs)
            .v128_const(rhs)
            .simd_op(isa::simd::I32X4_ADD)
            .simd_op(isa::simd::I32X4_EXTRACT_LANE)
            .byte(2)
            .end()
            .build(0),
    });
    module.exports.push(Export {
        field: "lane2".into(),
        idx: ExternIdx::Func(0),
    });

    let (_validated, instance) = instantiate(module, simd_features());
    let result = instance
        .invoke_export("lane2", &[], &mut NopExternals)
        .unwrap();
    assert_eq!(result, vec![Value::I32(33)]);
}

#[test]
fn simd_select_moves_both_cells() {
    // An untyped select over v128 operands exercises the two-cell
    // width annotation.
    let mut module = Module::default();
    module
        .types
        .push(FuncType::new(&[ValueType::I32][..], &[ValueType::I32][..]));
    let a = V128::from_i32x4([111, 0, 0, 0]).to_le_bytes();
    let b = V128::from_i32x4([222, 0, 0, 0]).to_le_bytes();
    module.funcs.push(FuncEntry {
        type_idx: 0,
        locals: vec![],
        body: Body::new()
            .v128_const(a)
            .v128_const(b)
            .local_get(0)
            .op(isa::SELECT)
            .simd_op(isa::simd::I32X4_EXTRACT_LANE)
            .byte(0)
            .end()
            .build(0),
    });
    module.exports.push(Export {
        field: "pick".into(),
        idx: ExternIdx::Func(0),
    });

    let (_validated, instance) = instantiate(module, simd_features());
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
fn simd_memory_round_trip() {
    let mut module = Module::default();
    module
        .types
        .push(FuncType::new(&[][..], &[ValueType::I32][..]));
    module.memories.push(MemoryType::new(1, None));
    module.funcs.push(FuncEntry {
        type_idx: 0,
        locals: vec![],
        body: Body::new()
            // Store a splatted vector at 16, reload it, sum the lanes
            // via bitmask of an all-true comparison.
            .i32_const(16)
            .i32_const(7)
            .simd_op(isa::simd::I32X4_SPLAT)
            .simd_op(isa::simd::V128_STORE)
            .memarg(0, 0)
            .i32_const(16)
            .simd_op(isa::simd::V128_LOAD)
            .memarg(0, 0)
            .i32_const(7)
            .simd_op(isa::simd::I32X4_SPLAT)
            .simd_op(isa::simd::I32X4_EQ)
            .simd_op(isa::simd::I32X4_BITMASK)
            .end()
            .build(0),
    });
    module.exports.push(Export {
        field: "round_trip".into(),
        idx: ExternIdx::Func(0),
    });

    let (_validated, instance) = instantiate(module, simd_features());
    let result = instance
        .invoke_export("round_trip", &[], &mut NopExternals)
        .unwrap();
    assert_eq!(result, vec![Value::I32(0b1111)]);
}

#[test]
fn simd_v128_load_oob_traps() {
    let mut module = Module::default();
    module.types.push(FuncType::new(&[][..], &[][..]));
    module.memories.push(MemoryType::new(1, None));
    module.funcs.push(FuncEntry {
        type_idx: 0,
        locals: vec![],
        body: Body::new()
            .i32_const(65532)
            .simd_op(isa::simd::V128_LOAD)
            .memarg(0, 0)
            .op(isa::DROP)
            .end()
            .build(0),
    });
    module.exports.push(Export {
        field: "oob".into(),
        idx: ExternIdx::Func(0),
    });

    let (_validated, instance) = instantiate(module, simd_features());
    let trap = expect_trap(instance.invoke_export("oob", &[], &mut NopExternals));
    assert!(matches!(trap.code(), TrapCode::MemoryAccessOutOfBounds));
}

#[test]
fn tail_calls_reuse_the_frame() {
    let mut features = Features::new();
    features.tail_call = true;

    // Mutually recursive parity via return_call; a deep chain would
    // exhaust the call stack if tail calls consumed frames.
    let mut module = Module::default();
    module
        .types
        .push(FuncType::new(&[ValueType::I32][..], &[ValueType::I32][..]));
    // func 0: even(n) = n == 0 ? 1 : odd(n - 1)
    module.funcs.push(FuncEntry {
        type_idx: 0,
        locals: vec![],
        body: Body::new()
            .local_get(0)
            .op(isa::I32_EQZ)
            .if_empty()
            .i32_const(1)
            .op(isa::RETURN)
            .end()
            .local_get(0)
            .i32_const(1)
            .op(isa::I32_SUB)
            .return_call(1)
            .end()
            .build(0),
    });
    // func 1: odd(n) = n == 0 ? 0 : even(n - 1)
    module.funcs.push(FuncEntry {
        type_idx: 0,
        locals: vec![],
        body: Body::new()
            .local_get(0)
            .op(isa::I32_EQZ)
            .if_empty()
            .i32_const(0)
            .op(isa::RETURN)
            .end()
            .local_get(0)
            .i32_const(1)
            .op(isa::I32_SUB)
            .return_call(0)
            .end()
            .build(0x100),
    });
    module.exports.push(Export {
        field: "even".into(),
        idx: ExternIdx::Func(0),
    });

    let (_validated, instance) = instantiate(module, features);
    let result = instance
        .invoke_export("even", &[Value::I32(1_000_000)], &mut NopExternals)
        .unwrap();
    assert_eq!(result, vec![Value::I32(1)]);
    let result = instance
        .invoke_export("even", &[Value::I32(999_999)], &mut NopExternals)
        .unwrap();
    assert_eq!(result, vec![Value::I32(0)]);
}

#[cfg(feature = "threads")]
mod atomics {
    use super::*;
    use wasmine::{Import, ImportDesc, ImportsBuilder, MemoryInstance, ModuleImportResolver};

    fn threads_features() -> Features {
        let mut features = Features::new();
        features.threads = true;
        features
    }

    struct SharedMemResolver(wasmine::MemoryRef);

    impl ModuleImportResolver for SharedMemResolver {
        fn resolve_memory(
            &self,
            _field_name: &str,
            _descriptor: &wasmine::MemoryDescriptor,
        ) -> Result<wasmine::MemoryRef, wasmine::Error> {
            Ok(self.0.clone())
        }
    }

    fn shared_module() -> Module {
        let mut module = Module::default();
        module
            .types
            .push(FuncType::new(&[][..], &[ValueType::I32][..]));
        module.imports.push(Import {
            module: "env".into(),
            field: "memory".into(),
            desc: ImportDesc::Memory(MemoryType::shared(1, 1)),
        });
        module
    }

    #[test]
    fn rmw_add_returns_the_old_value() {
        let mut module = shared_module();
        module.funcs.push(FuncEntry {
            type_idx: 0,
            locals: vec![],
            body: Body::new()
                .i32_const(8)
                .i32_const(5)
                .atomic_op(isa::threads::I32_ATOMIC_RMW_ADD, 2, 0)
                .end()
                .build(0),
        });
        module.exports.push(Export {
            field: "add".into(),
            idx: ExternIdx::Func(0),
        });

        let memory = MemoryInstance::alloc(MemoryType::shared(1, 1)).unwrap();
        memory.set_value::<u32>(8, 100).unwrap();
        let resolver = SharedMemResolver(memory.clone());
        let validated = wasmine::validate_module(module, threads_features()).unwrap();
        let imports = ImportsBuilder::new().with_resolver("env", &resolver);
        let instance = wasmine::ModuleInstance::new(&validated, &imports)
            .unwrap()
            .assert_no_start();

        let result = instance
            .invoke_export("add", &[], &mut NopExternals)
            .unwrap();
        assert_eq!(result, vec![Value::I32(100)]);
        assert_eq!(memory.get_value::<u32>(8).unwrap(), 105);
    }

    #[test]
    fn cmpxchg_and_wait_results() {
        let mut module = shared_module();
        // cmpxchg(addr=4, expected, replacement) -> old
        module
            .types
            .push(FuncType::new(
                &[ValueType::I32, ValueType::I32][..],
                &[ValueType::I32][..],
            ));
        module.funcs.push(FuncEntry {
            type_idx: 1,
            locals: vec![],
            body: Body::new()
                .i32_const(4)
                .local_get(0)
                .local_get(1)
                .atomic_op(isa::threads::I32_ATOMIC_RMW_CMPXCHG, 2, 0)
                .end()
                .build(0),
        });
        // wait32(expected) with a 1ms timeout -> result code
        module.funcs.push(FuncEntry {
            type_idx: 0,
            locals: vec![],
            body: Body::new()
                .i32_const(4)
                .i32_const(77)
                .i64_const(1_000_000)
                .atomic_op(isa::threads::MEMORY_ATOMIC_WAIT32, 2, 0)
                .end()
                .build(0x100),
        });
        // notify(addr=4) -> woken count
        module.funcs.push(FuncEntry {
            type_idx: 0,
            locals: vec![],
            body: Body::new()
                .i32_const(4)
                .i32_const(1)
                .atomic_op(isa::threads::MEMORY_ATOMIC_NOTIFY, 2, 0)
                .end()
                .build(0x200),
        });
        module.exports.push(Export {
            field: "cmpxchg".into(),
            idx: ExternIdx::Func(0),
        });
        module.exports.push(Export {
            field: "wait".into(),
            idx: ExternIdx::Func(1),
        });
        module.exports.push(Export {
            field: "notify".into(),
            idx: ExternIdx::Func(2),
        });

        let memory = MemoryInstance::alloc(MemoryType::shared(1, 1)).unwrap();
        let resolver = SharedMemResolver(memory.clone());
        let validated = wasmine::validate_module(module, threads_features()).unwrap();
        let imports = ImportsBuilder::new().with_resolver("env", &resolver);
        let instance = wasmine::ModuleInstance::new(&validated, &imports)
            .unwrap()
            .assert_no_start();

        // Successful exchange: 0 -> 7.
        let result = instance
            .invoke_export("cmpxchg", &[Value::I32(0), Value::I32(7)], &mut NopExternals)
            .unwrap();
        assert_eq!(result, vec![Value::I32(0)]);
        // Failed exchange leaves 7 in place.
        let result = instance
            .invoke_export("cmpxchg", &[Value::I32(0), Value::I32(9)], &mut NopExternals)
            .unwrap();
        assert_eq!(result, vec![Value::I32(7)]);
        assert_eq!(memory.get_value::<u32>(4).unwrap(), 7);

        // The stored value differs from the expected one: "not-equal".
        let result = instance
            .invoke_export("wait", &[], &mut NopExternals)
            .unwrap();
        assert_eq!(result, vec![Value::I32(1)]);

        // Waiting on the current value times out.
        memory.set_value::<u32>(4, 77).unwrap();
        let result = instance
            .invoke_export("wait", &[], &mut NopExternals)
            .unwrap();
        assert_eq!(result, vec![Value::I32(2)]);

        // Nobody is parked on the address.
        let result = instance
            .invoke_export("notify", &[], &mut NopExternals)
            .unwrap();
        assert_eq!(result, vec![Value::I32(0)]);
    }

    #[test]
    fn unaligned_atomic_access_traps() {
        let mut module = shared_module();
        module.funcs.push(FuncEntry {
            type_idx: 0,
            locals: vec![],
            body: Body::new()
                .i32_const(2)
                .atomic_op(isa::threads::I32_ATOMIC_LOAD, 2, 0)
                .end()
                .build(0),
        });
        module.exports.push(Export {
            field: "unaligned".into(),
            idx: ExternIdx::Func(0),
        });

        let memory = MemoryInstance::alloc(MemoryType::shared(1, 1)).unwrap();
        let resolver = SharedMemResolver(memory);
        let validated = wasmine::validate_module(module, threads_features()).unwrap();
        let imports = ImportsBuilder::new().with_resolver("env", &resolver);
        let instance = wasmine::ModuleInstance::new(&validated, &imports)
            .unwrap()
            .assert_no_start();

        let trap = expect_trap(instance.invoke_export("unaligned", &[], &mut NopExternals));
        assert!(matches!(trap.code(), TrapCode::MemoryAccessOutOfBounds));
    }
}
