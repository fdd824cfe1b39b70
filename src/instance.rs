use crate::features::Features;
use crate::func::{FuncInstance, FuncRef};
use crate::global::{GlobalInstance, GlobalRef};
use crate::host::Externals;
use crate::imports::ImportResolver;
use crate::isa;
use crate::leb128;
use crate::memory::{MemoryInstance, MemoryRef};
use crate::module::{ConstExpr, DataKind, ElemItem, ElemKind, ExternIdx, ImportDesc, ValidatedModule};
use crate::table::{TableInstance, TableRef};
use crate::types::{FuncType, GlobalDescriptor, MemoryDescriptor, TableDescriptor};
use crate::value::{Value, ValueType};
use crate::{Error, Trap, TrapCode};
use alloc::collections::BTreeMap;
use alloc::format;
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

/// Reference to a [`ModuleInstance`].
///
/// This reference has a reference-counting semantics.
///
/// A [`ModuleInstance`] holds strong references to its components
/// (globals, memories, functions, tables) while the components hold
/// weak references back to the containing instance, so the embedder
/// must retain every instance that may still execute.
#[derive(Clone, Debug)]
pub struct ModuleRef(pub(crate) Rc<ModuleInstance>);

impl ::core::ops::Deref for ModuleRef {
    type Target = ModuleInstance;
    fn deref(&self) -> &ModuleInstance {
        &self.0
    }
}

/// An external value: the runtime representation of an entity that can
/// be imported or exported.
pub enum ExternVal {
    /// [Function][`FuncInstance`].
    Func(FuncRef),
    /// [Table][`TableInstance`].
    Table(TableRef),
    /// [Memory][`MemoryInstance`].
    Memory(MemoryRef),
    /// [Global][`GlobalInstance`].
    Global(GlobalRef),
}

impl Clone for ExternVal {
    fn clone(&self) -> Self {
        match self {
            ExternVal::Func(func) => ExternVal::Func(func.clone()),
            ExternVal::Table(table) => ExternVal::Table(table.clone()),
            ExternVal::Memory(memory) => ExternVal::Memory(memory.clone()),
            ExternVal::Global(global) => ExternVal::Global(global.clone()),
        }
    }
}

impl fmt::Debug for ExternVal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "ExternVal {{ {} }}",
            match self {
                ExternVal::Func(_) => "Func",
                ExternVal::Table(_) => "Table",
                ExternVal::Memory(_) => "Memory",
                ExternVal::Global(_) => "Global",
            }
        )
    }
}

impl ExternVal {
    /// Get the underlying function reference if this `ExternVal`
    /// contains a function, or `None` if it is some other kind.
    pub fn as_func(&self) -> Option<&FuncRef> {
        match self {
            ExternVal::Func(func) => Some(func),
            _ => None,
        }
    }

    /// Get the underlying table reference if this `ExternVal` contains
    /// a table, or `None` if it is some other kind.
    pub fn as_table(&self) -> Option<&TableRef> {
        match self {
            ExternVal::Table(table) => Some(table),
            _ => None,
        }
    }

    /// Get the underlying memory reference if this `ExternVal` contains
    /// a memory, or `None` if it is some other kind.
    pub fn as_memory(&self) -> Option<&MemoryRef> {
        match self {
            ExternVal::Memory(memory) => Some(memory),
            _ => None,
        }
    }

    /// Get the underlying global reference if this `ExternVal` contains
    /// a global, or `None` if it is some other kind.
    pub fn as_global(&self) -> Option<&GlobalRef> {
        match self {
            ExternVal::Global(global) => Some(global),
            _ => None,
        }
    }
}

/// A module instance: the runtime representation of a module.
///
/// It is created by instantiating a [`ValidatedModule`] and collects
/// the runtime representations of all entities imported or defined by
/// the module: functions, tables, memories and globals, plus the
/// run-time state of the module's element and data segments.
#[derive(Debug)]
pub struct ModuleInstance {
    types: RefCell<Vec<Rc<FuncType>>>,
    funcs: RefCell<Vec<FuncRef>>,
    tables: RefCell<Vec<TableRef>>,
    memories: RefCell<Vec<MemoryRef>>,
    globals: RefCell<Vec<GlobalRef>>,
    exports: RefCell<BTreeMap<String, ExternVal>>,
    /// Passive element segment contents; `None` once dropped.
    elem_segments: RefCell<Vec<Option<Rc<Vec<Value>>>>>,
    /// Passive data segment contents; `None` once dropped.
    data_segments: RefCell<Vec<Option<Rc<Vec<u8>>>>>,
    features: Features,
}

impl ModuleInstance {
    fn default(features: Features) -> Self {
        ModuleInstance {
            types: RefCell::new(Vec::new()),
            funcs: RefCell::new(Vec::new()),
            tables: RefCell::new(Vec::new()),
            memories: RefCell::new(Vec::new()),
            globals: RefCell::new(Vec::new()),
            exports: RefCell::new(BTreeMap::new()),
            elem_segments: RefCell::new(Vec::new()),
            data_segments: RefCell::new(Vec::new()),
            features,
        }
    }

    pub(crate) fn features(&self) -> Features {
        self.features
    }

    pub(crate) fn memory_by_index(&self, idx: u32) -> Option<MemoryRef> {
        self.memories.borrow().get(idx as usize).cloned()
    }

    pub(crate) fn table_by_index(&self, idx: u32) -> Option<TableRef> {
        self.tables.borrow().get(idx as usize).cloned()
    }

    pub(crate) fn global_by_index(&self, idx: u32) -> Option<GlobalRef> {
        self.globals.borrow().get(idx as usize).cloned()
    }

    pub(crate) fn func_by_index(&self, idx: u32) -> Option<FuncRef> {
        self.funcs.borrow().get(idx as usize).cloned()
    }

    pub(crate) fn type_by_index(&self, idx: u32) -> Option<Rc<FuncType>> {
        self.types.borrow().get(idx as usize).cloned()
    }

    pub(crate) fn elem_segment(&self, idx: u32) -> Option<Rc<Vec<Value>>> {
        self.elem_segments
            .borrow()
            .get(idx as usize)
            .and_then(|seg| seg.clone())
    }

    pub(crate) fn drop_elem_segment(&self, idx: u32) {
        if let Some(seg) = self.elem_segments.borrow_mut().get_mut(idx as usize) {
            *seg = None;
        }
    }

    pub(crate) fn data_segment(&self, idx: u32) -> Option<Rc<Vec<u8>>> {
        self.data_segments
            .borrow()
            .get(idx as usize)
            .and_then(|seg| seg.clone())
    }

    pub(crate) fn drop_data_segment(&self, idx: u32) {
        if let Some(seg) = self.data_segments.borrow_mut().get_mut(idx as usize) {
            *seg = None;
        }
    }

    fn push_func(&self, func: FuncRef) {
        self.funcs.borrow_mut().push(func);
    }

    fn push_type(&self, func_type: Rc<FuncType>) {
        self.types.borrow_mut().push(func_type)
    }

    fn push_memory(&self, memory: MemoryRef) {
        self.memories.borrow_mut().push(memory)
    }

    fn push_table(&self, table: TableRef) {
        self.tables.borrow_mut().push(table)
    }

    fn push_global(&self, global: GlobalRef) {
        self.globals.borrow_mut().push(global)
    }

    fn insert_export<N: Into<String>>(&self, name: N, extern_val: ExternVal) {
        self.exports.borrow_mut().insert(name.into(), extern_val);
    }

    /// Finds an export by a name.
    pub fn export_by_name(&self, name: &str) -> Option<ExternVal> {
        self.exports.borrow().get(name).cloned()
    }

    fn alloc_module<'i, I: Iterator<Item = &'i ExternVal>>(
        validated: &ValidatedModule,
        extern_vals: I,
    ) -> Result<ModuleRef, Error> {
        let module = validated.module();
        let instance = ModuleRef(Rc::new(ModuleInstance::default(validated.features())));

        for func_type in validated.types() {
            instance.push_type(Rc::clone(func_type));
        }

        {
            let mut imports = module.imports.iter();
            let mut extern_vals = extern_vals;
            loop {
                // Iterate over imports and extern_vals in lockstep,
                // checking that the lengths agree.
                let (import, extern_val) = match (imports.next(), extern_vals.next()) {
                    (Some(import), Some(extern_val)) => (import, extern_val),
                    (None, None) => break,
                    (Some(_), None) | (None, Some(_)) => {
                        return Err(Error::Instantiation(
                            "extern_vals length is not equal to import count".to_string(),
                        ));
                    }
                };

                match (&import.desc, extern_val) {
                    (ImportDesc::Func(type_idx), ExternVal::Func(func)) => {
                        let expected = instance
                            .type_by_index(*type_idx)
                            .expect("type indexes were checked during validation");
                        if &*expected != func.func_type() {
                            return Err(Error::Instantiation(format!(
                                "expected function with type {:?}, but actual type is {:?} for entry {}",
                                expected,
                                func.func_type(),
                                import.field,
                            )));
                        }
                        instance.push_func(func.clone())
                    }
                    (ImportDesc::Table(expected), ExternVal::Table(table)) => {
                        if table.ty().elem() != expected.elem() {
                            return Err(Error::Instantiation(format!(
                                "expected a table of {:?}, found {:?} for entry {}",
                                expected.elem(),
                                table.ty().elem(),
                                import.field,
                            )));
                        }
                        if !table.ty().limits().subsumes(expected.limits()) {
                            return Err(Error::Instantiation(format!(
                                "table limits do not satisfy entry {}",
                                import.field
                            )));
                        }
                        instance.push_table(table.clone());
                    }
                    (ImportDesc::Memory(expected), ExternVal::Memory(memory)) => {
                        if memory.is_shared() != expected.is_shared() {
                            return Err(Error::Instantiation(format!(
                                "shared flag mismatch for entry {}",
                                import.field
                            )));
                        }
                        if !memory.limits().subsumes(expected.limits()) {
                            return Err(Error::Instantiation(format!(
                                "memory limits do not satisfy entry {}",
                                import.field
                            )));
                        }
                        instance.push_memory(memory.clone());
                    }
                    (ImportDesc::Global(expected), ExternVal::Global(global)) => {
                        if global.global_type() != *expected {
                            return Err(Error::Instantiation(format!(
                                "expected a global of {:?}, found {:?} for entry {}",
                                expected,
                                global.global_type(),
                                import.field,
                            )));
                        }
                        instance.push_global(global.clone());
                    }
                    (expected_import, actual_extern_val) => {
                        return Err(Error::Instantiation(format!(
                            "expected {:?} type, but provided {:?} extern_val",
                            expected_import, actual_extern_val
                        )));
                    }
                }
            }
        }

        for (index, entry) in module.funcs.iter().enumerate() {
            let body = validated
                .func_body(index)
                .expect("one body per local function, checked during validation")
                .clone();
            let func_type = Rc::clone(&body.func_type);
            let func = FuncInstance::alloc_internal(Rc::downgrade(&instance.0), func_type, body);
            instance.push_func(func);
        }

        for table_type in &module.tables {
            let table = TableInstance::alloc(*table_type)?;
            instance.push_table(table);
        }

        for memory_type in &module.memories {
            let memory = MemoryInstance::alloc(*memory_type)?;
            instance.push_memory(memory);
        }

        for entry in &module.globals {
            let init_val = eval_const_expr(&entry.init, &instance);
            let global = GlobalInstance::alloc(init_val, entry.ty.is_mutable());
            instance.push_global(global);
        }

        for export in &module.exports {
            let extern_val: ExternVal = match export.idx {
                ExternIdx::Func(idx) => ExternVal::Func(
                    instance
                        .func_by_index(idx)
                        .expect("export indexes were checked during validation"),
                ),
                ExternIdx::Global(idx) => ExternVal::Global(
                    instance
                        .global_by_index(idx)
                        .expect("export indexes were checked during validation"),
                ),
                ExternIdx::Memory(idx) => ExternVal::Memory(
                    instance
                        .memory_by_index(idx)
                        .expect("export indexes were checked during validation"),
                ),
                ExternIdx::Table(idx) => ExternVal::Table(
                    instance
                        .table_by_index(idx)
                        .expect("export indexes were checked during validation"),
                ),
            };
            instance.insert_export(export.field.clone(), extern_val);
        }

        Ok(instance)
    }

    /// Instantiate a module with the given [external values][ExternVal]
    /// as imports, in import order.
    ///
    /// See [`new`] for details.
    ///
    /// [`new`]: #method.new
    pub fn with_externvals<'m, 'i, I: Iterator<Item = &'i ExternVal>>(
        validated: &'m ValidatedModule,
        extern_vals: I,
    ) -> Result<NotStartedModuleRef<'m>, Error> {
        let module = validated.module();
        let instance = ModuleInstance::alloc_module(validated, extern_vals)?;

        // Element segments: evaluate contents, apply active segments in
        // order (trapping stops instantiation), keep passive ones for
        // `table.init`.
        for segment in &module.elems {
            let items: Vec<Value> = segment
                .items
                .iter()
                .map(|item| match item {
                    ElemItem::Func(idx) => Value::FuncRef(Some(
                        instance
                            .func_by_index(*idx)
                            .expect("element items were checked during validation"),
                    )),
                    ElemItem::Null => Value::default(segment.ty),
                })
                .collect();
            let state = match &segment.kind {
                ElemKind::Active {
                    table_index,
                    offset,
                } => {
                    let offset_val = match eval_const_expr(offset, &instance) {
                        Value::I32(v) => v as u32,
                        _ => unreachable!("segment offsets are validated to be i32"),
                    };
                    let table = instance
                        .table_by_index(*table_index)
                        .expect("active segment tables were checked during validation");
                    table.init(offset_val, &items).map_err(|_| {
                        Error::Trap(Trap::with_message(
                            TrapCode::TableAccessOutOfBounds,
                            "active element segment does not fit its table",
                        ))
                    })?;
                    // Applied active segments behave as dropped.
                    None
                }
                ElemKind::Passive => Some(Rc::new(items)),
                ElemKind::Declarative => None,
            };
            instance.elem_segments.borrow_mut().push(state);
        }

        // Data segments, analogously.
        for segment in &module.datas {
            let state = match &segment.kind {
                DataKind::Active {
                    memory_index,
                    offset,
                } => {
                    let offset_val = match eval_const_expr(offset, &instance) {
                        Value::I32(v) => v as u32,
                        _ => unreachable!("segment offsets are validated to be i32"),
                    };
                    let memory = instance
                        .memory_by_index(*memory_index)
                        .expect("active segment memories were checked during validation");
                    memory.set(offset_val, &segment.bytes).map_err(|_| {
                        Error::Trap(Trap::with_message(
                            TrapCode::MemoryAccessOutOfBounds,
                            "active data segment does not fit its memory",
                        ))
                    })?;
                    None
                }
                DataKind::Passive => Some(Rc::new(segment.bytes.clone())),
            };
            instance.data_segments.borrow_mut().push(state);
        }

        Ok(NotStartedModuleRef {
            validated,
            instance,
        })
    }

    /// Instantiate a module, resolving its imports through `imports`.
    ///
    /// Note that after instantiation the module's `start` function, when
    /// present, must still run before using the instance; see
    /// [`NotStartedModuleRef`].
    ///
    /// # Errors
    ///
    /// Returns `Err` if an import cannot be resolved, an import's type
    /// does not match, or an active segment does not fit.
    pub fn new<'m, I: ImportResolver>(
        validated: &'m ValidatedModule,
        imports: &I,
    ) -> Result<NotStartedModuleRef<'m>, Error> {
        let module = validated.module();

        let mut extern_vals = Vec::new();
        for import in &module.imports {
            let extern_val = match &import.desc {
                ImportDesc::Func(type_idx) => {
                    let func_type = module
                        .types
                        .get(*type_idx as usize)
                        .expect("type indexes were checked during validation");
                    ExternVal::Func(imports.resolve_func(
                        &import.module,
                        &import.field,
                        func_type,
                    )?)
                }
                ImportDesc::Table(ty) => ExternVal::Table(imports.resolve_table(
                    &import.module,
                    &import.field,
                    &TableDescriptor::from_table_type(ty),
                )?),
                ImportDesc::Memory(ty) => ExternVal::Memory(imports.resolve_memory(
                    &import.module,
                    &import.field,
                    &MemoryDescriptor::from_memory_type(ty),
                )?),
                ImportDesc::Global(ty) => ExternVal::Global(imports.resolve_global(
                    &import.module,
                    &import.field,
                    &GlobalDescriptor::from_global_type(ty),
                )?),
            };
            extern_vals.push(extern_val);
        }

        ModuleInstance::with_externvals(validated, extern_vals.iter())
    }

    /// Invoke the exported function with the given `name` and `args`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if there is no such export, it is not a function,
    /// the argument types mismatch, or execution traps.
    pub fn invoke_export<E: Externals>(
        &self,
        name: &str,
        args: &[Value],
        externals: &mut E,
    ) -> Result<Vec<Value>, Error> {
        let extern_val = self
            .export_by_name(name)
            .ok_or_else(|| Error::Function(format!("module doesn't have export {}", name)))?;

        let func = match extern_val {
            ExternVal::Func(func) => func,
            unexpected => {
                return Err(Error::Function(format!(
                    "export {} is not a function, but {:?}",
                    name, unexpected
                )));
            }
        };

        FuncInstance::invoke(&func, args, externals)
    }

    /// Invoke the function with the given index in the instance's
    /// function index space.
    pub fn invoke_func<E: Externals>(
        &self,
        func_idx: u32,
        args: &[Value],
        externals: &mut E,
    ) -> Result<Vec<Value>, Error> {
        let func = self
            .func_by_index(func_idx)
            .ok_or_else(|| Error::Function(format!("module doesn't have function {}", func_idx)))?;
        FuncInstance::invoke(&func, args, externals)
    }
}

/// Evaluates a validated constant expression against an instance.
fn eval_const_expr(expr: &ConstExpr, instance: &ModuleRef) -> Value {
    let bytes = expr.bytes();
    let mut pos = 0usize;
    let op = leb128::read_u8_nocheck(bytes, &mut pos);
    match op {
        isa::I32_CONST => Value::I32(leb128::read_leb_i32_nocheck(bytes, &mut pos)),
        isa::I64_CONST => Value::I64(leb128::read_leb_i64_nocheck(bytes, &mut pos)),
        isa::F32_CONST => Value::decode_f32(u32::from_le_bytes(leb128::read_bytes_nocheck::<4>(
            bytes, &mut pos,
        ))),
        isa::F64_CONST => Value::decode_f64(u64::from_le_bytes(leb128::read_bytes_nocheck::<8>(
            bytes, &mut pos,
        ))),
        isa::PREFIX_SIMD => {
            let sub = leb128::read_leb_u32_nocheck(bytes, &mut pos);
            debug_assert_eq!(sub, isa::simd::V128_CONST);
            Value::V128(crate::v128::V128::from_le_bytes(
                leb128::read_bytes_nocheck::<16>(bytes, &mut pos),
            ))
        }
        isa::REF_NULL => {
            let ty = ValueType::from_u8(leb128::read_u8_nocheck(bytes, &mut pos))
                .expect("reference types were checked during validation");
            Value::default(ty)
        }
        isa::REF_FUNC => {
            let idx = leb128::read_leb_u32_nocheck(bytes, &mut pos);
            Value::FuncRef(Some(instance.func_by_index(idx).expect(
                "ref.func indexes were checked during validation",
            )))
        }
        isa::GLOBAL_GET => {
            let idx = leb128::read_leb_u32_nocheck(bytes, &mut pos);
            instance
                .global_by_index(idx)
                .expect("global indexes were checked during validation")
                .get()
        }
        _ => unreachable!("non-constant opcodes were rejected during validation"),
    }
}

/// A module instance whose `start` function, if any, did not run yet.
///
/// The embedder must either run it with [`run_start`] or assert its
/// absence with [`assert_no_start`] before using the instance.
///
/// [`run_start`]: #method.run_start
/// [`assert_no_start`]: #method.assert_no_start
pub struct NotStartedModuleRef<'a> {
    validated: &'a ValidatedModule,
    instance: ModuleRef,
}

impl<'a> NotStartedModuleRef<'a> {
    /// Whether the module declares a start function.
    pub fn has_start(&self) -> bool {
        self.validated.module().start.is_some()
    }

    /// Returns the instance before the start function ran. Calling
    /// exported functions on it breaks the module's expectations.
    pub fn not_started_instance(&self) -> &ModuleRef {
        &self.instance
    }

    /// Executes the module's start function, if present, and returns
    /// the ready instance.
    pub fn run_start<E: Externals>(self, externals: &mut E) -> Result<ModuleRef, Error> {
        if let Some(start) = self.validated.module().start {
            let func = self
                .instance
                .func_by_index(start)
                .expect("start indexes were checked during validation");
            FuncInstance::invoke(&func, &[], externals)?;
        }
        Ok(self.instance)
    }

    /// Returns the instance, panicking if the module declares a start
    /// function.
    ///
    /// # Panics
    ///
    /// Panics if there is a start function.
    pub fn assert_no_start(self) -> ModuleRef {
        assert!(
            self.validated.module().start.is_none(),
            "assert_no_start called on a module with a start function"
        );
        self.instance
    }
}
