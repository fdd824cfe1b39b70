//! The module data model consumed by the validator and the engine.
//!
//! Modules are materialised by the binary-format parser, which is an
//! external collaborator; this crate only defines the structures it
//! produces. Function bodies and constant expressions are kept as
//! contiguous slices of the original binary, addressed by 32-bit pc
//! values counted from the module's binary origin, so that the
//! validator's jump and annotation tables are plain `(pc, ...)` records.

use crate::features::Features;
use crate::types::{FuncType, GlobalType, MemoryType, TableType};
use crate::value::ValueType;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;

/// A function body expression: a contiguous byte slice of the module
/// binary, including the terminating `end` opcode.
#[derive(Debug, Clone)]
pub struct Expr {
    bytes: Rc<[u8]>,
    base_pc: u32,
}

impl Expr {
    /// Wraps raw expression bytes located at `base_pc` within the module
    /// binary.
    pub fn new(bytes: Vec<u8>, base_pc: u32) -> Expr {
        Expr {
            bytes: bytes.into(),
            base_pc,
        }
    }

    /// The raw bytes of the expression.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The pc of the first byte.
    pub fn base_pc(&self) -> u32 {
        self.base_pc
    }

    /// The pc one past the last byte.
    pub fn end_pc(&self) -> u32 {
        self.base_pc + self.bytes.len() as u32
    }

    pub(crate) fn share_bytes(&self) -> Rc<[u8]> {
        Rc::clone(&self.bytes)
    }
}

/// A constant expression (global initialiser or segment offset),
/// terminated by `end`.
///
/// Only `*.const`, `ref.null`, `ref.func` and `global.get` of an
/// imported immutable global are permitted inside.
#[derive(Debug, Clone)]
pub struct ConstExpr {
    bytes: Vec<u8>,
}

impl ConstExpr {
    /// Wraps raw constant-expression bytes.
    pub fn new(bytes: Vec<u8>) -> ConstExpr {
        ConstExpr { bytes }
    }

    /// The raw bytes of the expression.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// What an import provides.
#[derive(Debug, Clone)]
pub enum ImportDesc {
    /// A function of the given type-section index.
    Func(u32),
    /// A table of the given type.
    Table(TableType),
    /// A linear memory of the given type.
    Memory(MemoryType),
    /// A global of the given type.
    Global(GlobalType),
}

/// One import entry.
#[derive(Debug, Clone)]
pub struct Import {
    /// Name of the providing module.
    pub module: String,
    /// Name of the item within the providing module.
    pub field: String,
    /// What kind of entity is imported.
    pub desc: ImportDesc,
}

/// A function defined inside the module.
#[derive(Debug, Clone)]
pub struct FuncEntry {
    /// Index into the module's type table.
    pub type_idx: u32,
    /// Declared locals as `(count, type)` runs, params excluded.
    pub locals: Vec<(u32, ValueType)>,
    /// The body expression.
    pub body: Expr,
}

/// A global defined inside the module.
#[derive(Debug, Clone)]
pub struct GlobalEntry {
    /// Type and mutability.
    pub ty: GlobalType,
    /// Constant initialiser expression.
    pub init: ConstExpr,
}

/// Index of an exported or imported entity.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExternIdx {
    /// A function index.
    Func(u32),
    /// A table index.
    Table(u32),
    /// A memory index.
    Memory(u32),
    /// A global index.
    Global(u32),
}

/// One export entry.
#[derive(Debug, Clone)]
pub struct Export {
    /// The exported name.
    pub field: String,
    /// What is exported.
    pub idx: ExternIdx,
}

/// One item of an element segment.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ElemItem {
    /// `ref.func idx`
    Func(u32),
    /// `ref.null`
    Null,
}

/// Placement of an element segment.
#[derive(Debug, Clone)]
pub enum ElemKind {
    /// Written into a table at instantiation time.
    Active {
        /// The target table.
        table_index: u32,
        /// Start offset, evaluated as a constant expression.
        offset: ConstExpr,
    },
    /// Available to `table.init` until dropped.
    Passive,
    /// Only declares its function indexes for `ref.func`; holds no
    /// run-time contents.
    Declarative,
}

/// An element segment.
#[derive(Debug, Clone)]
pub struct ElemSegment {
    /// Element type; must be a reference type.
    pub ty: ValueType,
    /// Active, passive or declarative placement.
    pub kind: ElemKind,
    /// The segment contents.
    pub items: Vec<ElemItem>,
}

/// Placement of a data segment.
#[derive(Debug, Clone)]
pub enum DataKind {
    /// Copied into a memory at instantiation time.
    Active {
        /// The target memory.
        memory_index: u32,
        /// Start offset, evaluated as a constant expression.
        offset: ConstExpr,
    },
    /// Available to `memory.init` until dropped.
    Passive,
}

/// A data segment.
#[derive(Debug, Clone)]
pub struct DataSegment {
    /// Active or passive placement.
    pub kind: DataKind,
    /// The segment bytes.
    pub bytes: Vec<u8>,
}

/// A parsed module, read-only to the runtime.
#[derive(Debug, Clone, Default)]
pub struct Module {
    /// The type table.
    pub types: Vec<FuncType>,
    /// Imports, in binding order.
    pub imports: Vec<Import>,
    /// Locally defined functions.
    pub funcs: Vec<FuncEntry>,
    /// Locally defined tables.
    pub tables: Vec<TableType>,
    /// Locally defined memories.
    pub memories: Vec<MemoryType>,
    /// Locally defined globals.
    pub globals: Vec<GlobalEntry>,
    /// Exports.
    pub exports: Vec<Export>,
    /// Optional start function index.
    pub start: Option<u32>,
    /// Element segments.
    pub elems: Vec<ElemSegment>,
    /// Data segments.
    pub datas: Vec<DataSegment>,
    /// Contents of the `datacount` section, when present. Required for
    /// modules whose code references data segments.
    pub datacount: Option<u32>,
}

/// One resolved branch target.
///
/// `pc` addresses the `block` or `if` opcode, `target` the slot just
/// past its `end`. For an `if`, `else_target` addresses the slot just
/// past `else`, or the `end` opcode itself when there is no `else`.
/// Loops need no entry: branching to a loop transfers to the loop
/// opcode itself.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Jump {
    /// Pc of the `block`/`if` opcode.
    pub pc: u32,
    /// Slot past the matching `end`.
    pub target: u32,
    /// The `else` slot; meaningful for `if` only.
    pub else_target: u32,
}

/// A type-width annotation: at `pc`, the value-polymorphic opcode
/// operates on `cells` stack cells.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TypeAnnotation {
    /// Pc of the annotated opcode.
    pub pc: u32,
    /// Operand width in cells.
    pub cells: u32,
}

/// Everything the validator precomputes about one function body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecInfo {
    /// Branch targets, sorted by `pc`.
    pub jumps: Vec<Jump>,
    /// Type-width annotations for `drop` and untyped `select`, sorted by
    /// `pc`.
    pub annotations: Vec<TypeAnnotation>,
    /// High-water mark of the value stack in cells, locals included.
    pub max_cells: u32,
    /// High-water mark of the label stack.
    pub max_labels: u32,
}

impl ExecInfo {
    /// Looks up the branch target for the block starting at `pc`.
    pub fn jump(&self, pc: u32) -> Option<&Jump> {
        self.jumps
            .binary_search_by_key(&pc, |jump| jump.pc)
            .ok()
            .map(|i| &self.jumps[i])
    }

    /// Looks up the operand width recorded for the opcode at `pc`.
    pub fn annotation(&self, pc: u32) -> Option<u32> {
        self.annotations
            .binary_search_by_key(&pc, |annotation| annotation.pc)
            .ok()
            .map(|i| self.annotations[i].cells)
    }
}

/// A validated function body with its precomputed execution metadata.
#[derive(Debug)]
pub struct FuncBody {
    /// The function's type.
    pub func_type: Rc<FuncType>,
    /// Flattened local types: parameters first, then declared locals.
    pub local_types: Vec<ValueType>,
    /// Cell offset of each local; one extra entry holds the total local
    /// cell count. `cell_offsets[i+1] - cell_offsets[i]` is the width of
    /// local `i`.
    pub cell_offsets: Vec<u32>,
    /// The body expression.
    pub expr: Expr,
    /// Jump table, annotations and stack high-water marks.
    pub info: ExecInfo,
}

impl FuncBody {
    /// Total number of cells the locals region (params + locals)
    /// occupies.
    pub fn local_cells(&self) -> u32 {
        *self
            .cell_offsets
            .last()
            .expect("the offsets vector always holds the trailing total")
    }
}

/// A module that passed validation, ready for instantiation.
#[derive(Debug)]
pub struct ValidatedModule {
    module: Module,
    funcs: Vec<Rc<FuncBody>>,
    types: Vec<Rc<FuncType>>,
    features: Features,
}

impl ValidatedModule {
    pub(crate) fn new(
        module: Module,
        funcs: Vec<Rc<FuncBody>>,
        types: Vec<Rc<FuncType>>,
        features: Features,
    ) -> ValidatedModule {
        ValidatedModule {
            module,
            funcs,
            types,
            features,
        }
    }

    /// The underlying module.
    pub fn module(&self) -> &Module {
        &self.module
    }

    /// The validated body of the `index`-th locally defined function.
    pub fn func_body(&self, index: usize) -> Option<&Rc<FuncBody>> {
        self.funcs.get(index)
    }

    /// The shared type table.
    pub fn types(&self) -> &[Rc<FuncType>] {
        &self.types
    }

    /// The feature set the module was validated under.
    pub fn features(&self) -> Features {
        self.features
    }
}
