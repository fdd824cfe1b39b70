use crate::types::TableType;
use crate::value::Value;
use crate::Error;
use alloc::format;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

/// Reference to a table (See [`TableInstance`] for details).
///
/// This reference has a reference-counting semantics.
#[derive(Clone, Debug)]
pub struct TableRef(Rc<TableInstance>);

impl ::core::ops::Deref for TableRef {
    type Target = TableInstance;
    fn deref(&self) -> &TableInstance {
        &self.0
    }
}

impl TableRef {
    pub(crate) fn ptr_eq(a: &TableRef, b: &TableRef) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }
}

/// Runtime representation of a table.
///
/// A table is an array of reference values of a single element type. It
/// allows wasm code to call functions indirectly through a dynamic
/// index, emulating function pointers by way of table indices.
///
/// A table is created with an initial size but can be grown dynamically
/// via the [`grow`] method; growth can be limited by an optional maximum
/// size.
///
/// [`grow`]: #method.grow
pub struct TableInstance {
    ty: TableType,
    /// Table elements; every entry has the table's element type.
    elements: RefCell<Vec<Value>>,
}

impl fmt::Debug for TableInstance {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TableInstance")
            .field("ty", &self.ty)
            .field("len", &self.elements.borrow().len())
            .finish()
    }
}

impl TableInstance {
    /// Allocate a table instance with every element null.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the initial size is greater than the maximum.
    pub fn alloc(ty: TableType) -> Result<TableRef, Error> {
        if let Some(maximum) = ty.limits().maximum() {
            if ty.limits().initial() > maximum {
                return Err(Error::Table(format!(
                    "maximum limit {} is less than minimum {}",
                    maximum,
                    ty.limits().initial()
                )));
            }
        }
        let null = Value::default(ty.elem());
        Ok(TableRef(Rc::new(TableInstance {
            ty,
            elements: RefCell::new(alloc::vec![null; ty.limits().initial() as usize]),
        })))
    }

    /// The type this table was created with.
    pub fn ty(&self) -> &TableType {
        &self.ty
    }

    /// Returns the size this table was created with.
    pub fn initial_size(&self) -> u32 {
        self.ty.limits().initial()
    }

    /// Returns the maximum size this `TableInstance` can grow to.
    pub fn maximum_size(&self) -> Option<u32> {
        self.ty.limits().maximum()
    }

    /// Returns the current size of the table.
    pub fn current_size(&self) -> u32 {
        self.elements.borrow().len() as u32
    }

    /// Reads the element at `offset`.
    pub fn get(&self, offset: u32) -> Result<Value, Error> {
        let elements = self.elements.borrow();
        let len = elements.len();
        elements.get(offset as usize).cloned().ok_or_else(|| {
            Error::Table(format!(
                "trying to read table item with index {} when there are only {} items",
                offset, len
            ))
        })
    }

    /// Writes the element at `offset`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the index is out of bounds or the value's type
    /// does not match the element type.
    pub fn set(&self, offset: u32, value: Value) -> Result<(), Error> {
        if value.value_type() != self.ty.elem() {
            return Err(Error::Table(format!(
                "trying to store a {:?} into a table of {:?}",
                value.value_type(),
                self.ty.elem()
            )));
        }
        let mut elements = self.elements.borrow_mut();
        let len = elements.len();
        let slot = elements.get_mut(offset as usize).ok_or_else(|| {
            Error::Table(format!(
                "trying to update table item with index {} when there are only {} items",
                offset, len
            ))
        })?;
        *slot = value;
        Ok(())
    }

    /// Grows the table by `delta` elements, filling the new slots with
    /// `init`. Returns the previous size.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the limit would be exceeded; the table is left
    /// unchanged in that case.
    pub fn grow(&self, delta: u32, init: Value) -> Result<u32, Error> {
        if init.value_type() != self.ty.elem() {
            return Err(Error::Table(format!(
                "trying to fill a table of {:?} with a {:?}",
                self.ty.elem(),
                init.value_type()
            )));
        }
        let mut elements = self.elements.borrow_mut();
        let previous = elements.len() as u32;
        let maximum = self.maximum_size().unwrap_or(u32::MAX);
        let new_size = previous
            .checked_add(delta)
            .filter(|new_size| *new_size <= maximum)
            .ok_or_else(|| {
                Error::Table(format!(
                    "trying to grow table by {} items when there are already {} items",
                    delta, previous,
                ))
            })?;
        elements.resize(new_size as usize, init);
        Ok(previous)
    }

    /// Fills `[offset, offset + len)` with `value` after a full bounds
    /// check.
    pub fn fill(&self, offset: u32, len: u32, value: Value) -> Result<(), Error> {
        if value.value_type() != self.ty.elem() {
            return Err(Error::Table(format!(
                "trying to fill a table of {:?} with a {:?}",
                self.ty.elem(),
                value.value_type()
            )));
        }
        let mut elements = self.elements.borrow_mut();
        let range = checked_range(offset, len, elements.len())?;
        for slot in &mut elements[range] {
            *slot = value.clone();
        }
        Ok(())
    }

    /// Copies `len` elements from `src_offset` to `dst_offset` within
    /// one table, tolerating overlap.
    pub fn copy_within(&self, dst_offset: u32, src_offset: u32, len: u32) -> Result<(), Error> {
        let mut elements = self.elements.borrow_mut();
        let src = checked_range(src_offset, len, elements.len())?;
        checked_range(dst_offset, len, elements.len())?;
        // Ranges may overlap, so detour through a scratch copy.
        let scratch: Vec<Value> = elements[src].to_vec();
        elements[dst_offset as usize..dst_offset as usize + len as usize]
            .clone_from_slice(&scratch);
        Ok(())
    }

    /// Copies `len` elements between two (possibly identical) tables.
    pub fn transfer(
        src: &TableRef,
        src_offset: u32,
        dst: &TableRef,
        dst_offset: u32,
        len: u32,
    ) -> Result<(), Error> {
        if TableRef::ptr_eq(src, dst) {
            return src.copy_within(dst_offset, src_offset, len);
        }
        let src_elements = src.elements.borrow();
        let mut dst_elements = dst.elements.borrow_mut();
        let src_range = checked_range(src_offset, len, src_elements.len())?;
        let dst_range = checked_range(dst_offset, len, dst_elements.len())?;
        dst_elements[dst_range].clone_from_slice(&src_elements[src_range]);
        Ok(())
    }

    /// Writes `items` into the table starting at `offset` after a full
    /// bounds check.
    pub(crate) fn init(&self, offset: u32, items: &[Value]) -> Result<(), Error> {
        let mut elements = self.elements.borrow_mut();
        let range = checked_range(offset, items.len() as u32, elements.len())?;
        elements[range].clone_from_slice(items);
        Ok(())
    }
}

fn checked_range(offset: u32, len: u32, size: usize) -> Result<core::ops::Range<usize>, Error> {
    let end = (offset as u64).checked_add(len as u64).ok_or_else(|| {
        Error::Table(format!(
            "trying to access {} table items from index {}",
            len, offset
        ))
    })?;
    if end > size as u64 {
        return Err(Error::Table(format!(
            "trying to access items [{}..{}] in a table of {} items",
            offset, end, size
        )));
    }
    Ok(offset as usize..end as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueType;

    fn table(initial: u32, maximum: Option<u32>) -> TableRef {
        TableInstance::alloc(TableType::new(ValueType::FuncRef, initial, maximum)).unwrap()
    }

    #[test]
    fn starts_out_null() {
        let t = table(3, None);
        assert_eq!(t.current_size(), 3);
        assert_eq!(t.get(0).unwrap(), Value::FuncRef(None));
        assert!(t.get(3).is_err());
    }

    #[test]
    fn grow_returns_previous_size_and_respects_max() {
        let t = table(1, Some(3));
        assert_eq!(t.grow(1, Value::FuncRef(None)).unwrap(), 1);
        assert_eq!(t.current_size(), 2);
        assert!(t.grow(2, Value::FuncRef(None)).is_err());
        assert_eq!(t.current_size(), 2);
    }

    #[test]
    fn set_rejects_wrong_type() {
        let t = table(1, None);
        assert!(t.set(0, Value::I32(1)).is_err());
        assert!(t.set(0, Value::FuncRef(None)).is_ok());
    }

    #[test]
    fn copy_within_handles_overlap() {
        let t = TableInstance::alloc(TableType::new(ValueType::ExternRef, 4, None)).unwrap();
        t.set(0, Value::ExternRef(Some(crate::value::ExternRef::new(1u32))))
            .unwrap();
        t.copy_within(1, 0, 3).unwrap();
        // Slot 0 was propagated into slot 1.
        assert!(matches!(t.get(1).unwrap(), Value::ExternRef(Some(_))));
        assert!(matches!(t.get(2).unwrap(), Value::ExternRef(None)));
    }
}
