use crate::value::ValueType;
use alloc::borrow::Cow;
use alloc::vec::Vec;

/// Type of a [function].
///
/// A function type consists of an ordered list of parameter types and an
/// ordered list of result types; multiple results are supported. Two
/// function types are equal iff both sequences are equal.
///
/// [function]: crate::FuncInstance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncType {
    params: Cow<'static, [ValueType]>,
    results: Cow<'static, [ValueType]>,
}

impl FuncType {
    /// Creates a new function type from the given parameter and result
    /// types.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use wasmine::{FuncType, ValueType};
    ///
    /// // (i32, i32) -> i32
    /// let binary = FuncType::new(&[ValueType::I32, ValueType::I32][..], &[ValueType::I32][..]);
    /// // () -> ()
    /// let thunk = FuncType::new(&[][..], &[][..]);
    /// ```
    pub fn new<P, R>(params: P, results: R) -> FuncType
    where
        P: Into<Cow<'static, [ValueType]>>,
        R: Into<Cow<'static, [ValueType]>>,
    {
        FuncType {
            params: params.into(),
            results: results.into(),
        }
    }

    /// Returns the parameter types of this function type.
    pub fn params(&self) -> &[ValueType] {
        self.params.as_ref()
    }

    /// Returns the result types of this function type.
    pub fn results(&self) -> &[ValueType] {
        self.results.as_ref()
    }

    /// Total number of value-stack cells the parameters occupy.
    pub fn param_cells(&self) -> u32 {
        self.params.iter().map(|ty| ty.cell_count()).sum()
    }

    /// Total number of value-stack cells the results occupy.
    pub fn result_cells(&self) -> u32 {
        self.results.iter().map(|ty| ty.cell_count()).sum()
    }
}

/// Size bounds of a table or memory.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Limits {
    initial: u32,
    maximum: Option<u32>,
}

impl Limits {
    /// Creates new limits.
    pub fn new(initial: u32, maximum: Option<u32>) -> Limits {
        Limits { initial, maximum }
    }

    /// The initial size.
    pub fn initial(&self) -> u32 {
        self.initial
    }

    /// The optional maximum size.
    pub fn maximum(&self) -> Option<u32> {
        self.maximum
    }

    /// Whether an entity with limits `self` can satisfy an import
    /// requiring `required`: the provided initial size must be at least
    /// the required initial, and the provided maximum must not exceed
    /// the required one (an absent required maximum accepts anything).
    pub fn subsumes(&self, required: &Limits) -> bool {
        if self.initial < required.initial {
            return false;
        }
        match (required.maximum, self.maximum) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(required_max), Some(provided_max)) => provided_max <= required_max,
        }
    }
}

/// Type of a table: the element reference type plus size limits.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TableType {
    elem: ValueType,
    limits: Limits,
}

impl TableType {
    /// Creates a new table type. `elem` must be a reference type.
    pub fn new(elem: ValueType, initial: u32, maximum: Option<u32>) -> TableType {
        TableType {
            elem,
            limits: Limits::new(initial, maximum),
        }
    }

    /// The element type.
    pub fn elem(&self) -> ValueType {
        self.elem
    }

    /// The size limits, counted in elements.
    pub fn limits(&self) -> &Limits {
        &self.limits
    }
}

/// Type of a linear memory: page-count limits plus the shared flag.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MemoryType {
    limits: Limits,
    shared: bool,
}

impl MemoryType {
    /// Creates a new memory type with limits counted in 64 KiB pages.
    pub fn new(initial: u32, maximum: Option<u32>) -> MemoryType {
        MemoryType {
            limits: Limits::new(initial, maximum),
            shared: false,
        }
    }

    /// Creates a new shared memory type. Shared memories always declare
    /// a maximum size.
    pub fn shared(initial: u32, maximum: u32) -> MemoryType {
        MemoryType {
            limits: Limits::new(initial, Some(maximum)),
            shared: true,
        }
    }

    /// The page-count limits.
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Whether this memory may be shared between threads.
    pub fn is_shared(&self) -> bool {
        self.shared
    }
}

/// Type of a global variable: content type plus mutability.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GlobalType {
    content: ValueType,
    mutable: bool,
}

impl GlobalType {
    /// Creates a new global type.
    pub fn new(content: ValueType, mutable: bool) -> GlobalType {
        GlobalType { content, mutable }
    }

    /// The type of the contained value.
    pub fn content(&self) -> ValueType {
        self.content
    }

    /// Whether the global may be written after initialisation.
    pub fn is_mutable(&self) -> bool {
        self.mutable
    }
}

/// A decoded blocktype immediate.
///
/// The s33 encoding maps non-negative values to type-section indexes and
/// `{-1, ..., -64}` to single value types or the empty blocktype.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BlockType {
    /// `[] -> []`
    Empty,
    /// `[] -> [ty]`
    Value(ValueType),
    /// A multi-value type from the type section.
    TypeIndex(u32),
}

impl BlockType {
    /// Decodes a blocktype from its s33 immediate value.
    pub fn from_s33(value: i64) -> Option<BlockType> {
        if value >= 0 {
            u32::try_from(value).ok().map(BlockType::TypeIndex)
        } else if value == -64 {
            Some(BlockType::Empty)
        } else {
            ValueType::from_u8((value & 0x7f) as u8).map(BlockType::Value)
        }
    }

    /// Parameter and result types of the block, resolved against the
    /// type table.
    pub(crate) fn arity<'a>(
        &self,
        types: &'a [alloc::rc::Rc<FuncType>],
    ) -> Option<(Vec<ValueType>, Vec<ValueType>)> {
        match self {
            BlockType::Empty => Some((Vec::new(), Vec::new())),
            BlockType::Value(ty) => Some((Vec::new(), alloc::vec![*ty])),
            BlockType::TypeIndex(idx) => {
                let ty = types.get(*idx as usize)?;
                Some((ty.params().to_vec(), ty.results().to_vec()))
            }
        }
    }
}

/// Description of a global variable, primarily used to describe imports.
/// See [`ImportResolver`] for details.
///
/// [`ImportResolver`]: crate::ImportResolver
pub struct GlobalDescriptor {
    value_type: ValueType,
    mutable: bool,
}

impl GlobalDescriptor {
    pub(crate) fn from_global_type(global_type: &GlobalType) -> GlobalDescriptor {
        GlobalDescriptor {
            value_type: global_type.content(),
            mutable: global_type.is_mutable(),
        }
    }

    /// Returns the [`ValueType`] of the requested global.
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Returns whether the requested global is mutable.
    pub fn is_mutable(&self) -> bool {
        self.mutable
    }
}

/// Description of a table, primarily used to describe imports.
/// See [`ImportResolver`] for details.
///
/// [`ImportResolver`]: crate::ImportResolver
pub struct TableDescriptor {
    elem: ValueType,
    initial: u32,
    maximum: Option<u32>,
}

impl TableDescriptor {
    pub(crate) fn from_table_type(table_type: &TableType) -> TableDescriptor {
        TableDescriptor {
            elem: table_type.elem(),
            initial: table_type.limits().initial(),
            maximum: table_type.limits().maximum(),
        }
    }

    /// The element type of the requested table.
    pub fn elem(&self) -> ValueType {
        self.elem
    }

    /// Returns the initial size of the requested table.
    pub fn initial(&self) -> u32 {
        self.initial
    }

    /// Returns the maximum size of the requested table.
    pub fn maximum(&self) -> Option<u32> {
        self.maximum
    }
}

/// Description of a linear memory, primarily used to describe imports.
/// See [`ImportResolver`] for details.
///
/// [`ImportResolver`]: crate::ImportResolver
pub struct MemoryDescriptor {
    initial: u32,
    maximum: Option<u32>,
    shared: bool,
}

impl MemoryDescriptor {
    pub(crate) fn from_memory_type(memory_type: &MemoryType) -> MemoryDescriptor {
        MemoryDescriptor {
            initial: memory_type.limits().initial(),
            maximum: memory_type.limits().maximum(),
            shared: memory_type.is_shared(),
        }
    }

    /// Returns the initial size (in pages) of the requested memory.
    pub fn initial(&self) -> u32 {
        self.initial
    }

    /// Returns the maximum size (in pages) of the requested memory.
    pub fn maximum(&self) -> Option<u32> {
        self.maximum
    }

    /// Whether the requested memory must be shared.
    pub fn is_shared(&self) -> bool {
        self.shared
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn functype_equality_is_structural() {
        let a = FuncType::new(&[ValueType::I32][..], &[ValueType::I32][..]);
        let b = FuncType::new(alloc::vec![ValueType::I32], alloc::vec![ValueType::I32]);
        assert_eq!(a, b);
        let c = FuncType::new(&[ValueType::I64][..], &[ValueType::I32][..]);
        assert_ne!(a, c);
    }

    #[test]
    fn cell_accounting() {
        let ty = FuncType::new(
            alloc::vec![ValueType::I32, ValueType::V128, ValueType::F64],
            alloc::vec![ValueType::I64],
        );
        assert_eq!(ty.param_cells(), 4);
        assert_eq!(ty.result_cells(), 1);
    }

    #[test]
    fn limits_subsumption() {
        let provided = Limits::new(2, Some(4));
        assert!(provided.subsumes(&Limits::new(1, None)));
        assert!(provided.subsumes(&Limits::new(2, Some(4))));
        assert!(provided.subsumes(&Limits::new(1, Some(8))));
        assert!(!provided.subsumes(&Limits::new(3, None)));
        assert!(!provided.subsumes(&Limits::new(1, Some(3))));
        assert!(!Limits::new(2, None).subsumes(&Limits::new(1, Some(8))));
    }

    #[test]
    fn blocktype_decoding() {
        assert_eq!(BlockType::from_s33(-64), Some(BlockType::Empty));
        assert_eq!(
            BlockType::from_s33(-1),
            Some(BlockType::Value(ValueType::I32))
        );
        assert_eq!(
            BlockType::from_s33(-5),
            Some(BlockType::Value(ValueType::V128))
        );
        assert_eq!(BlockType::from_s33(7), Some(BlockType::TypeIndex(7)));
        assert_eq!(BlockType::from_s33(-6), None);
    }
}
