use crate::types::GlobalType;
use crate::value::Value;
use crate::Error;
use alloc::rc::Rc;
use core::cell::RefCell;

/// Reference to a global variable (See [`GlobalInstance`] for details).
///
/// This reference has a reference-counting semantics.
#[derive(Clone, Debug)]
pub struct GlobalRef(Rc<GlobalInstance>);

impl ::core::ops::Deref for GlobalRef {
    type Target = GlobalInstance;
    fn deref(&self) -> &GlobalInstance {
        &self.0
    }
}

/// Runtime representation of a global variable (or `global` for short).
///
/// A global contains a value of a fixed type and a mutability flag.
/// Neither the type of the value nor the mutability can change after
/// creation; attempts to write an immutable global or to change the
/// value's type are errors.
#[derive(Debug)]
pub struct GlobalInstance {
    val: RefCell<Value>,
    mutable: bool,
}

impl GlobalInstance {
    /// Allocate a global variable instance.
    pub fn alloc(val: Value, mutable: bool) -> GlobalRef {
        GlobalRef(Rc::new(GlobalInstance {
            val: RefCell::new(val),
            mutable,
        }))
    }

    /// Change the value of this global variable.
    ///
    /// # Errors
    ///
    /// Returns `Err` if this global isn't mutable or if the type of
    /// `val` doesn't match the global's type.
    pub fn set(&self, val: Value) -> Result<(), Error> {
        if !self.mutable {
            return Err(Error::Global(
                "attempt to change an immutable variable".into(),
            ));
        }
        if self.value_type() != val.value_type() {
            return Err(Error::Global("attempt to change variable type".into()));
        }
        *self.val.borrow_mut() = val;
        Ok(())
    }

    /// Get the value of this global variable.
    pub fn get(&self) -> Value {
        self.val.borrow().clone()
    }

    /// Returns whether this global variable is mutable.
    pub fn is_mutable(&self) -> bool {
        self.mutable
    }

    /// Returns the value type of this global variable.
    pub fn value_type(&self) -> crate::ValueType {
        self.val.borrow().value_type()
    }

    /// The matching [`GlobalType`].
    pub fn global_type(&self) -> GlobalType {
        GlobalType::new(self.value_type(), self.mutable)
    }
}
