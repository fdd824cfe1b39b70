//! Shared helpers for the integration tests: a small code emitter over
//! the crate's LEB128 writers, used to assemble function bodies and
//! constant expressions byte-exactly, plus instantiation shorthands.

#![allow(dead_code)]

use wasmine::{
    isa, leb128, validate_module, Config, ConstExpr, Expr, Features, FuncInstance, HostCall,
    HostControl, ImportsBuilder, Module, ModuleInstance, ModuleRef, Trap, ValidatedModule, Value,
    ValueType,
};

/// Incremental encoder for one function body.
pub struct Body {
    bytes: Vec<u8>,
}

impl Default for Body {
    fn default() -> Self {
        Self::new()
    }
}

impl Body {
    pub fn new() -> Body {
        Body { bytes: Vec::new() }
    }

    pub fn op(mut self, op: u8) -> Body {
        self.bytes.push(op);
        self
    }

    pub fn byte(mut self, byte: u8) -> Body {
        self.bytes.push(byte);
        self
    }

    pub fn uleb(mut self, value: u32) -> Body {
        leb128::write_leb_u32(&mut self.bytes, value);
        self
    }

    /// A prefixed opcode: the prefix byte plus the LEB sub-opcode.
    pub fn sub(mut self, prefix: u8, sub: u32) -> Body {
        self.bytes.push(prefix);
        leb128::write_leb_u32(&mut self.bytes, sub);
        self
    }

    pub fn i32_const(mut self, value: i32) -> Body {
        self.bytes.push(isa::I32_CONST);
        leb128::write_leb_i32(&mut self.bytes, value);
        self
    }

    pub fn i64_const(mut self, value: i64) -> Body {
        self.bytes.push(isa::I64_CONST);
        leb128::write_leb_i64(&mut self.bytes, value);
        self
    }

    pub fn f32_const(mut self, bits: u32) -> Body {
        self.bytes.push(isa::F32_CONST);
        self.bytes.extend_from_slice(&bits.to_le_bytes());
        self
    }

    pub fn f64_const(mut self, bits: u64) -> Body {
        self.bytes.push(isa::F64_CONST);
        self.bytes.extend_from_slice(&bits.to_le_bytes());
        self
    }

    pub fn v128_const(mut self, bytes: [u8; 16]) -> Body {
        self = self.sub(isa::PREFIX_SIMD, isa::simd::V128_CONST);
        self.bytes.extend_from_slice(&bytes);
        self
    }

    pub fn local_get(self, idx: u32) -> Body {
        self.op(isa::LOCAL_GET).uleb(idx)
    }

    pub fn local_set(self, idx: u32) -> Body {
        self.op(isa::LOCAL_SET).uleb(idx)
    }

    pub fn local_tee(self, idx: u32) -> Body {
        self.op(isa::LOCAL_TEE).uleb(idx)
    }

    pub fn global_get(self, idx: u32) -> Body {
        self.op(isa::GLOBAL_GET).uleb(idx)
    }

    pub fn global_set(self, idx: u32) -> Body {
        self.op(isa::GLOBAL_SET).uleb(idx)
    }

    pub fn call(self, func: u32) -> Body {
        self.op(isa::CALL).uleb(func)
    }

    pub fn call_indirect(self, type_idx: u32, table: u32) -> Body {
        self.op(isa::CALL_INDIRECT).uleb(type_idx).uleb(table)
    }

    pub fn return_call(self, func: u32) -> Body {
        self.op(isa::RETURN_CALL).uleb(func)
    }

    pub fn br(self, label: u32) -> Body {
        self.op(isa::BR).uleb(label)
    }

    pub fn br_if(self, label: u32) -> Body {
        self.op(isa::BR_IF).uleb(label)
    }

    pub fn br_table(mut self, targets: &[u32], default: u32) -> Body {
        self = self.op(isa::BR_TABLE).uleb(targets.len() as u32);
        for target in targets {
            self = self.uleb(*target);
        }
        self.uleb(default)
    }

    pub fn block_empty(self) -> Body {
        self.op(isa::BLOCK).byte(0x40)
    }

    pub fn block_result(self, ty: ValueType) -> Body {
        self.op(isa::BLOCK).byte(ty.into_u8())
    }

    /// A block whose type comes from the type section (multi-value).
    pub fn block_type(self, type_idx: u32) -> Body {
        // Small non-negative s33 values encode like unsigned LEB.
        self.op(isa::BLOCK).uleb(type_idx)
    }

    pub fn loop_empty(self) -> Body {
        self.op(isa::LOOP).byte(0x40)
    }

    pub fn loop_result(self, ty: ValueType) -> Body {
        self.op(isa::LOOP).byte(ty.into_u8())
    }

    pub fn if_empty(self) -> Body {
        self.op(isa::IF).byte(0x40)
    }

    pub fn if_result(self, ty: ValueType) -> Body {
        self.op(isa::IF).byte(ty.into_u8())
    }

    pub fn else_(self) -> Body {
        self.op(isa::ELSE)
    }

    pub fn end(self) -> Body {
        self.op(isa::END)
    }

    pub fn memarg(self, align: u32, offset: u32) -> Body {
        self.uleb(align).uleb(offset)
    }

    /// A plain load/store opcode followed by its memarg.
    pub fn mem_op(self, op: u8, align: u32, offset: u32) -> Body {
        self.op(op).memarg(align, offset)
    }

    pub fn memory_size(self) -> Body {
        self.op(isa::MEMORY_SIZE).byte(0)
    }

    pub fn memory_grow(self) -> Body {
        self.op(isa::MEMORY_GROW).byte(0)
    }

    pub fn memory_copy(self) -> Body {
        self.sub(isa::PREFIX_FC, isa::fc::MEMORY_COPY).byte(0).byte(0)
    }

    pub fn memory_fill(self) -> Body {
        self.sub(isa::PREFIX_FC, isa::fc::MEMORY_FILL).byte(0)
    }

    pub fn memory_init(self, data: u32) -> Body {
        self.sub(isa::PREFIX_FC, isa::fc::MEMORY_INIT)
            .uleb(data)
            .byte(0)
    }

    pub fn data_drop(self, data: u32) -> Body {
        self.sub(isa::PREFIX_FC, isa::fc::DATA_DROP).uleb(data)
    }

    pub fn table_op(self, sub: u32, idx: u32) -> Body {
        self.sub(isa::PREFIX_FC, sub).uleb(idx)
    }

    /// An atomic opcode with its (naturally aligned) memarg.
    pub fn atomic_op(self, sub: u32, align: u32, offset: u32) -> Body {
        self.sub(isa::PREFIX_THREADS, sub).memarg(align, offset)
    }

    pub fn simd_op(self, sub: u32) -> Body {
        self.sub(isa::PREFIX_SIMD, sub)
    }

    pub fn build(self, base_pc: u32) -> Expr {
        Expr::new(self.bytes, base_pc)
    }
}

/// `i32.const value; end` as a constant expression.
pub fn const_i32(value: i32) -> ConstExpr {
    let mut bytes = vec![isa::I32_CONST];
    leb128::write_leb_i32(&mut bytes, value);
    bytes.push(isa::END);
    ConstExpr::new(bytes)
}

/// `ref.func idx; end` as a constant expression.
pub fn const_ref_func(idx: u32) -> ConstExpr {
    let mut bytes = vec![isa::REF_FUNC];
    leb128::write_leb_u32(&mut bytes, idx);
    bytes.push(isa::END);
    ConstExpr::new(bytes)
}

/// `ref.null func; end` as a constant expression.
pub fn const_ref_null_func() -> ConstExpr {
    ConstExpr::new(vec![isa::REF_NULL, 0x70, isa::END])
}

/// `global.get idx; end` as a constant expression.
pub fn const_global_get(idx: u32) -> ConstExpr {
    let mut bytes = vec![isa::GLOBAL_GET];
    leb128::write_leb_u32(&mut bytes, idx);
    bytes.push(isa::END);
    ConstExpr::new(bytes)
}

/// Validates and instantiates a module without imports; panics on any
/// failure and asserts the absence of a start function.
pub fn instantiate(module: Module, features: Features) -> (ValidatedModule, ModuleRef) {
    let validated = validate_module(module, features).expect("validation failed");
    let instance = ModuleInstance::new(&validated, &ImportsBuilder::default())
        .expect("instantiation failed")
        .assert_no_start();
    (validated, instance)
}

/// Unwraps a finished invocation into its trap, panicking otherwise.
pub fn expect_trap(result: Result<Vec<Value>, wasmine::Error>) -> Trap {
    match result {
        Err(wasmine::Error::Trap(trap)) => trap,
        other => panic!("expected a trap, got {:?}", other),
    }
}

/// Host function registry used by tests that need imports.
pub struct TestHost<F>
where
    F: FnMut(usize, HostCall) -> Result<HostControl, Trap>,
{
    pub handler: F,
}

impl<F> wasmine::Externals for TestHost<F>
where
    F: FnMut(usize, HostCall) -> Result<HostControl, Trap>,
{
    fn invoke_index(&mut self, index: usize, call: HostCall) -> Result<HostControl, Trap> {
        (self.handler)(index, call)
    }
}

/// Shorthand for host-function instances.
pub fn host_func(params: &'static [ValueType], results: &'static [ValueType], index: usize) -> wasmine::FuncRef {
    FuncInstance::alloc_host(wasmine::FuncType::new(params, results), index)
}

/// The default engine configuration used by tests.
pub fn config() -> Config {
    Config::default()
}
