//! Module validation.
//!
//! Validates a parsed [`Module`] against the core specification under a
//! set of [`Features`], producing a [`ValidatedModule`] whose function
//! bodies carry the precomputed jump tables, annotations and cell-index
//! maps the engine executes from.

use crate::features::Features;
use crate::isa;
use crate::leb128;
use crate::module::{
    ConstExpr, DataKind, ElemItem, ElemKind, ExternIdx, FuncBody, ImportDesc, Module,
    ValidatedModule,
};
use crate::types::{FuncType, GlobalType, MemoryType, TableType};
use crate::value::ValueType;
use alloc::collections::{BTreeMap, BTreeSet};
use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;

mod func;

use func::FuncValidator;

/// Maximum number of flattened locals (parameters included) accepted in
/// one function.
const MAX_LOCALS: usize = 50_000;

/// Maximal number of pages of a linear memory.
pub(crate) const MAX_MEMORY_PAGES: u32 = 65536;

/// A validation failure with a human-readable reason, usually including
/// the pc of the offending instruction.
#[derive(Debug)]
pub struct Error(pub(crate) String);

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Index spaces of a module with imports folded in, shared between the
/// module-level checks and the function-body validator.
pub(crate) struct ModuleContext {
    types: Vec<Rc<FuncType>>,
    funcs: Vec<Rc<FuncType>>,
    tables: Vec<TableType>,
    memories: Vec<MemoryType>,
    globals: Vec<GlobalType>,
    imported_globals: usize,
    elems: Vec<ValueType>,
    datacount: Option<u32>,
    declared_funcs: BTreeSet<u32>,
    features: Features,
}

impl ModuleContext {
    pub(crate) fn features(&self) -> Features {
        self.features
    }

    pub(crate) fn types(&self) -> &[Rc<FuncType>] {
        &self.types
    }

    pub(crate) fn type_by_index(&self, idx: u32) -> Result<Rc<FuncType>, String> {
        self.types
            .get(idx as usize)
            .cloned()
            .ok_or_else(|| format!("unknown type {}", idx))
    }

    pub(crate) fn func_type(&self, idx: u32) -> Result<Rc<FuncType>, String> {
        self.funcs
            .get(idx as usize)
            .cloned()
            .ok_or_else(|| format!("unknown function {}", idx))
    }

    pub(crate) fn require_table(&self, idx: u32) -> Result<TableType, String> {
        self.tables
            .get(idx as usize)
            .copied()
            .ok_or_else(|| format!("unknown table {}", idx))
    }

    pub(crate) fn require_memory(&self, idx: u32) -> Result<(), String> {
        if (idx as usize) < self.memories.len() {
            Ok(())
        } else {
            Err(format!("unknown memory {}", idx))
        }
    }

    pub(crate) fn require_global(&self, idx: u32) -> Result<GlobalType, String> {
        self.globals
            .get(idx as usize)
            .copied()
            .ok_or_else(|| format!("unknown global {}", idx))
    }

    pub(crate) fn require_elem(&self, idx: u32) -> Result<ValueType, String> {
        self.elems
            .get(idx as usize)
            .copied()
            .ok_or_else(|| format!("unknown element segment {}", idx))
    }

    pub(crate) fn require_data(&self, idx: u32) -> Result<(), String> {
        match self.datacount {
            None => Err("data segment access requires a datacount section".into()),
            Some(count) if idx < count => Ok(()),
            Some(count) => Err(format!(
                "unknown data segment {} (datacount is {})",
                idx, count
            )),
        }
    }

    pub(crate) fn is_declared_func(&self, idx: u32) -> bool {
        self.declared_funcs.contains(&idx)
    }
}

fn check_value_type(ty: ValueType, features: &Features) -> Result<(), Error> {
    if ty == ValueType::V128 && !features.simd {
        return Err(Error("v128 requires the simd feature".into()));
    }
    Ok(())
}

fn check_table_type(ty: &TableType) -> Result<(), Error> {
    if !ty.elem().is_ref() {
        return Err(Error("table element type must be a reference type".into()));
    }
    check_limits_ordered(ty.limits().initial(), ty.limits().maximum(), "table")
}

fn check_memory_type(ty: &MemoryType, features: &Features) -> Result<(), Error> {
    let limits = ty.limits();
    if limits.initial() > MAX_MEMORY_PAGES {
        return Err(Error(format!(
            "initial memory size must be at most {} pages",
            MAX_MEMORY_PAGES
        )));
    }
    if let Some(maximum) = limits.maximum() {
        if maximum > MAX_MEMORY_PAGES {
            return Err(Error(format!(
                "maximum memory size must be at most {} pages",
                MAX_MEMORY_PAGES
            )));
        }
    }
    check_limits_ordered(limits.initial(), limits.maximum(), "memory")?;
    if ty.is_shared() {
        if !features.threads {
            return Err(Error("shared memories require the threads feature".into()));
        }
        if limits.maximum().is_none() {
            return Err(Error("shared memories must declare a maximum size".into()));
        }
    }
    Ok(())
}

fn check_limits_ordered(initial: u32, maximum: Option<u32>, what: &str) -> Result<(), Error> {
    if let Some(maximum) = maximum {
        if initial > maximum {
            return Err(Error(format!(
                "{} maximum limit {} is less than minimum {}",
                what, maximum, initial
            )));
        }
    }
    Ok(())
}

/// Validates a whole module and computes the per-function execution
/// metadata.
pub fn validate_module(module: Module, features: Features) -> Result<ValidatedModule, Error> {
    let types: Vec<Rc<FuncType>> = module.types.iter().cloned().map(Rc::new).collect();
    for ty in &types {
        for vt in ty.params().iter().chain(ty.results()) {
            check_value_type(*vt, &features)?;
        }
    }

    let mut funcs = Vec::new();
    let mut tables = Vec::new();
    let mut memories = Vec::new();
    let mut globals = Vec::new();
    let mut imported_globals = 0usize;
    let mut imported_funcs = 0usize;

    for import in &module.imports {
        match &import.desc {
            ImportDesc::Func(type_idx) => {
                let ty = types.get(*type_idx as usize).cloned().ok_or_else(|| {
                    Error(format!(
                        "import {}:{} references unknown type {}",
                        import.module, import.field, type_idx
                    ))
                })?;
                funcs.push(ty);
                imported_funcs += 1;
            }
            ImportDesc::Table(ty) => {
                check_table_type(ty)?;
                tables.push(*ty);
            }
            ImportDesc::Memory(ty) => {
                check_memory_type(ty, &features)?;
                memories.push(*ty);
            }
            ImportDesc::Global(ty) => {
                check_value_type(ty.content(), &features)?;
                globals.push(*ty);
                imported_globals += 1;
            }
        }
    }

    for entry in &module.funcs {
        let ty = types
            .get(entry.type_idx as usize)
            .cloned()
            .ok_or_else(|| Error(format!("function references unknown type {}", entry.type_idx)))?;
        funcs.push(ty);
    }
    for ty in &module.tables {
        check_table_type(ty)?;
        tables.push(*ty);
    }
    for ty in &module.memories {
        check_memory_type(ty, &features)?;
        memories.push(*ty);
    }
    for entry in &module.globals {
        check_value_type(entry.ty.content(), &features)?;
        globals.push(entry.ty);
    }

    if memories.len() > 1 && !features.multi_memory {
        return Err(Error(format!(
            "too many memories in index space: {}",
            memories.len()
        )));
    }

    if let Some(count) = module.datacount {
        if count as usize != module.datas.len() {
            return Err(Error(format!(
                "datacount section declares {} segments but {} are present",
                count,
                module.datas.len()
            )));
        }
    }

    // Collect the function indexes usable by `ref.func` in code: every
    // index mentioned by an export, an element segment or a global
    // initialiser.
    let mut declared_funcs = BTreeSet::new();
    for export in &module.exports {
        if let ExternIdx::Func(idx) = export.idx {
            declared_funcs.insert(idx);
        }
    }
    for elem in &module.elems {
        for item in &elem.items {
            if let ElemItem::Func(idx) = item {
                declared_funcs.insert(*idx);
            }
        }
    }

    let elems: Vec<ValueType> = module.elems.iter().map(|seg| seg.ty).collect();

    let mut ctx = ModuleContext {
        types,
        funcs,
        tables,
        memories,
        globals,
        imported_globals,
        elems,
        datacount: module.datacount,
        declared_funcs,
        features,
    };

    // Globals: the initialiser must be a constant expression of the
    // declared content type, and may only read imported immutable
    // globals. A `ref.func` inside also declares its function.
    let mut init_declared = BTreeSet::new();
    for (i, entry) in module.globals.iter().enumerate() {
        let ty = const_expr_type(&entry.init, &ctx, &mut init_declared)
            .map_err(|e| Error(format!("global {} initialiser: {}", i, e.0)))?;
        if ty != entry.ty.content() {
            return Err(Error(format!(
                "global {} initialised with {:?} but declared {:?}",
                i,
                ty,
                entry.ty.content()
            )));
        }
    }
    ctx.declared_funcs.extend(init_declared);

    // Element segments.
    for (i, seg) in module.elems.iter().enumerate() {
        if !seg.ty.is_ref() {
            return Err(Error(format!(
                "element segment {} has non-reference type {:?}",
                i, seg.ty
            )));
        }
        for item in &seg.items {
            if let ElemItem::Func(idx) = item {
                if seg.ty != ValueType::FuncRef {
                    return Err(Error(format!(
                        "element segment {} holds funcrefs but is typed {:?}",
                        i, seg.ty
                    )));
                }
                ctx.func_type(*idx)
                    .map_err(|e| Error(format!("element segment {}: {}", i, e)))?;
            }
        }
        if let ElemKind::Active {
            table_index,
            offset,
        } = &seg.kind
        {
            let table_ty = ctx
                .require_table(*table_index)
                .map_err(|e| Error(format!("element segment {}: {}", i, e)))?;
            if table_ty.elem() != seg.ty {
                return Err(Error(format!(
                    "element segment {} type {:?} does not match table type {:?}",
                    i,
                    seg.ty,
                    table_ty.elem()
                )));
            }
            let mut scratch = BTreeSet::new();
            let ty = const_expr_type(offset, &ctx, &mut scratch)
                .map_err(|e| Error(format!("element segment {} offset: {}", i, e.0)))?;
            if ty != ValueType::I32 {
                return Err(Error(format!(
                    "element segment {} offset must be i32, found {:?}",
                    i, ty
                )));
            }
        }
    }

    // Data segments.
    for (i, seg) in module.datas.iter().enumerate() {
        if let DataKind::Active {
            memory_index,
            offset,
        } = &seg.kind
        {
            ctx.require_memory(*memory_index)
                .map_err(|e| Error(format!("data segment {}: {}", i, e)))?;
            let mut scratch = BTreeSet::new();
            let ty = const_expr_type(offset, &ctx, &mut scratch)
                .map_err(|e| Error(format!("data segment {} offset: {}", i, e.0)))?;
            if ty != ValueType::I32 {
                return Err(Error(format!(
                    "data segment {} offset must be i32, found {:?}",
                    i, ty
                )));
            }
        }
    }

    // Exports: names must be unique, indexes valid.
    let mut export_names = BTreeMap::new();
    for export in &module.exports {
        if export_names.insert(export.field.clone(), ()).is_some() {
            return Err(Error(format!("duplicate export {}", export.field)));
        }
        match export.idx {
            ExternIdx::Func(idx) => {
                ctx.func_type(idx).map_err(Error)?;
            }
            ExternIdx::Table(idx) => {
                ctx.require_table(idx).map_err(Error)?;
            }
            ExternIdx::Memory(idx) => {
                ctx.require_memory(idx).map_err(Error)?;
            }
            ExternIdx::Global(idx) => {
                ctx.require_global(idx).map_err(Error)?;
            }
        }
    }

    // Start function: no parameters, no results.
    if let Some(start) = module.start {
        let ty = ctx.func_type(start).map_err(Error)?;
        if !ty.params().is_empty() || !ty.results().is_empty() {
            return Err(Error("start function must have type [] -> []".into()));
        }
    }

    // Function bodies.
    let mut bodies = Vec::with_capacity(module.funcs.len());
    for (i, entry) in module.funcs.iter().enumerate() {
        let func_type = ctx
            .funcs
            .get(imported_funcs + i)
            .cloned()
            .expect("the function index space was built above");
        let local_types = flatten_locals(&func_type, &entry.locals, &features)
            .map_err(|e| Error(format!("function {}: {}", i, e.0)))?;
        let cell_offsets = cell_offsets(&local_types);
        let local_cells = *cell_offsets
            .last()
            .expect("the offsets vector always holds the trailing total");

        let validator = FuncValidator::new(
            &ctx,
            func_type.results().to_vec(),
            local_types.clone(),
            &entry.body,
        );
        let mut info = validator
            .run()
            .map_err(|e| Error(format!("function {}: {}", i, e.0)))?;
        info.max_cells += local_cells;

        bodies.push(Rc::new(FuncBody {
            func_type,
            local_types,
            cell_offsets,
            expr: entry.body.clone(),
            info,
        }));
    }

    let ModuleContext { types, .. } = ctx;
    Ok(ValidatedModule::new(module, bodies, types, features))
}

fn flatten_locals(
    func_type: &FuncType,
    locals: &[(u32, ValueType)],
    features: &Features,
) -> Result<Vec<ValueType>, Error> {
    let mut out: Vec<ValueType> = func_type.params().to_vec();
    for (count, ty) in locals {
        check_value_type(*ty, features)?;
        let total = out.len().checked_add(*count as usize);
        match total {
            Some(total) if total <= MAX_LOCALS => {
                out.extend(core::iter::repeat(*ty).take(*count as usize));
            }
            _ => return Err(Error("too many locals".into())),
        }
    }
    Ok(out)
}

/// Computes the cell-index map of a locals region: the starting cell
/// offset of every local plus a trailing total.
fn cell_offsets(locals: &[ValueType]) -> Vec<u32> {
    let mut offsets = Vec::with_capacity(locals.len() + 1);
    let mut offset = 0u32;
    for ty in locals {
        offsets.push(offset);
        offset += ty.cell_count();
    }
    offsets.push(offset);
    offsets
}

/// Determines the type of a constant expression, enforcing the constant
/// rules: `*.const`, `ref.null`, `ref.func` and `global.get` of an
/// imported immutable global only. `declared` accumulates `ref.func`
/// indexes.
pub(crate) fn const_expr_type(
    expr: &ConstExpr,
    ctx: &ModuleContext,
    declared: &mut BTreeSet<u32>,
) -> Result<ValueType, Error> {
    let bytes = expr.bytes();
    let mut pos = 0usize;
    let err_leb = |e: leb128::LebError| Error(format!("{}", e));
    let op = leb128::read_u8(bytes, &mut pos).map_err(err_leb)?;
    let ty = match op {
        isa::I32_CONST => {
            leb128::read_leb_i32(bytes, &mut pos).map_err(err_leb)?;
            ValueType::I32
        }
        isa::I64_CONST => {
            leb128::read_leb_i64(bytes, &mut pos).map_err(err_leb)?;
            ValueType::I64
        }
        isa::F32_CONST => {
            leb128::read_bytes::<4>(bytes, &mut pos).map_err(err_leb)?;
            ValueType::F32
        }
        isa::F64_CONST => {
            leb128::read_bytes::<8>(bytes, &mut pos).map_err(err_leb)?;
            ValueType::F64
        }
        isa::PREFIX_SIMD => {
            if !ctx.features().simd {
                return Err(Error("v128.const requires the simd feature".into()));
            }
            let sub = leb128::read_leb_u32(bytes, &mut pos).map_err(err_leb)?;
            if sub != isa::simd::V128_CONST {
                return Err(Error("non-constant opcode in constant expression".into()));
            }
            leb128::read_bytes::<16>(bytes, &mut pos).map_err(err_leb)?;
            ValueType::V128
        }
        isa::REF_NULL => {
            let byte = leb128::read_u8(bytes, &mut pos).map_err(err_leb)?;
            match ValueType::from_u8(byte) {
                Some(ty) if ty.is_ref() => ty,
                _ => {
                    return Err(Error(format!(
                        "malformed reference type 0x{:02x} in constant expression",
                        byte
                    )))
                }
            }
        }
        isa::REF_FUNC => {
            let idx = leb128::read_leb_u32(bytes, &mut pos).map_err(err_leb)?;
            ctx.func_type(idx).map_err(Error)?;
            declared.insert(idx);
            ValueType::FuncRef
        }
        isa::GLOBAL_GET => {
            let idx = leb128::read_leb_u32(bytes, &mut pos).map_err(err_leb)?;
            if idx as usize >= ctx.imported_globals {
                return Err(Error(format!(
                    "constant expression may only read imported globals, found global {}",
                    idx
                )));
            }
            let ty = ctx.require_global(idx).map_err(Error)?;
            if ty.is_mutable() {
                return Err(Error(format!(
                    "constant expression reads mutable global {}",
                    idx
                )));
            }
            ty.content()
        }
        other => {
            return Err(Error(format!(
                "non-constant opcode 0x{:02x} in constant expression",
                other
            )))
        }
    };
    let end = leb128::read_u8(bytes, &mut pos).map_err(err_leb)?;
    if end != isa::END {
        return Err(Error("constant expression must end with `end`".into()));
    }
    if pos != bytes.len() {
        return Err(Error("trailing bytes after constant expression".into()));
    }
    Ok(ty)
}
