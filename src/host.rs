use crate::value::{FromValue, Value};
use crate::{Trap, TrapCode};
use alloc::vec::Vec;
use downcast_rs::{impl_downcast, DowncastSync};

/// Wrapper around a slice of [`Value`] for using it as an argument list
/// conveniently.
#[derive(Debug)]
pub struct RuntimeArgs<'a>(&'a [Value]);

impl<'a> From<&'a [Value]> for RuntimeArgs<'a> {
    fn from(inner: &'a [Value]) -> Self {
        RuntimeArgs(inner)
    }
}

impl<'a> AsRef<[Value]> for RuntimeArgs<'a> {
    fn as_ref(&self) -> &[Value] {
        self.0
    }
}

impl<'a> RuntimeArgs<'a> {
    /// Extract argument by index `idx`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the cast is invalid or there are not enough
    /// arguments.
    pub fn nth_checked<T>(&self, idx: usize) -> Result<T, Trap>
    where
        T: FromValue,
    {
        self.nth_value_checked(idx)?
            .try_into()
            .ok_or_else(|| Trap::new(TrapCode::UnexpectedSignature))
    }

    /// Extract argument as a [`Value`] by index `idx`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if this list does not have enough arguments.
    pub fn nth_value_checked(&self, idx: usize) -> Result<Value, Trap> {
        self.0
            .get(idx)
            .cloned()
            .ok_or_else(|| Trap::new(TrapCode::UnexpectedSignature))
    }

    /// Extract argument by index `idx`.
    ///
    /// # Panics
    ///
    /// Panics if the cast is invalid or there are not enough arguments.
    pub fn nth<T>(&self, idx: usize) -> T
    where
        T: FromValue,
    {
        let value = self.nth_value_checked(idx).expect("invalid argument index");
        value.try_into().expect("unexpected argument type")
    }

    /// Total number of arguments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the argument list is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Trait that allows the host to return a custom error.
///
/// It should be useful for representing custom traps, troubles at
/// instantiation time or other host specific conditions.
///
/// # Examples
///
/// ```rust
/// use core::fmt;
/// use wasmine::{HostError, Trap, TrapCode};
///
/// #[derive(Debug)]
/// struct MyError {
///     code: u32,
/// }
///
/// impl fmt::Display for MyError {
///     fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
///         write!(f, "MyError, code={}", self.code)
///     }
/// }
///
/// impl HostError for MyError {}
///
/// fn failable_fn() -> Result<(), Trap> {
///     Err(Trap::new(TrapCode::Host(Box::new(MyError { code: 1312 }))))
/// }
///
/// match failable_fn() {
///     Err(trap) => {
///         if let TrapCode::Host(host_error) = trap.code() {
///             let my_error: &MyError = host_error.downcast_ref().unwrap();
///             assert_eq!(my_error.code, 1312);
///         }
///     }
///     _ => panic!(),
/// }
/// ```
pub trait HostError: 'static + core::fmt::Display + core::fmt::Debug + DowncastSync {}
impl_downcast!(sync HostError);

/// Saved state that lets a blocking host operation resume after an
/// interrupt poll. A record is pushed by the host function that needs
/// to restart and popped by it once the operation completes; the engine
/// clears the whole stack on interrupt.
#[derive(Debug, Clone)]
pub enum RestartRecord {
    /// An absolute deadline for a timer-like wait.
    #[cfg(feature = "std")]
    Timer {
        /// When the wait elapses.
        deadline: std::time::Instant,
    },
    /// An opaque host-defined token.
    Host(u64),
}

/// What a host function asks the engine to do next.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HostControl {
    /// The call completed; its results are in the result slice.
    Done,
    /// The call could not complete yet. The engine keeps the stack and
    /// pc untouched and reports a restartable outcome to the embedder;
    /// re-entering the execution loop re-issues the same call, which
    /// finds its state on the restart stack.
    Restart,
    /// The call yields to the embedder; resumption re-issues the call.
    Suspend,
}

/// One in-flight host call: arguments, result slots and access to the
/// per-context restart stack.
///
/// Arguments and results follow the Wasm calling convention in
/// declaration order; the result slice arrives pre-filled with zero or
/// null values of the declared result types.
pub struct HostCall<'a> {
    args: &'a [Value],
    /// Result slots, one per declared result type.
    pub results: &'a mut [Value],
    restart: &'a mut Vec<RestartRecord>,
}

impl<'a> HostCall<'a> {
    pub(crate) fn new(
        args: &'a [Value],
        results: &'a mut [Value],
        restart: &'a mut Vec<RestartRecord>,
    ) -> HostCall<'a> {
        HostCall {
            args,
            results,
            restart,
        }
    }

    /// The arguments of the call.
    pub fn args(&self) -> RuntimeArgs<'_> {
        RuntimeArgs(self.args)
    }

    /// Pushes a restart record; the host function should do this right
    /// before returning [`HostControl::Restart`].
    pub fn push_restart(&mut self, record: RestartRecord) {
        self.restart.push(record);
    }

    /// Pops the restart record a previous attempt of this call pushed.
    /// Returns `None` on the first attempt or after an interrupt cleared
    /// the stack.
    pub fn take_restart(&mut self) -> Option<RestartRecord> {
        self.restart.pop()
    }

    /// Whether a restart record is pending.
    pub fn is_restarting(&self) -> bool {
        !self.restart.is_empty()
    }
}

/// Trait that allows to implement host functions.
///
/// A host function is identified by the index given to
/// [`FuncInstance::alloc_host`]; invoking it hands the implementation a
/// [`HostCall`] with typed arguments and result slots.
///
/// [`FuncInstance::alloc_host`]: crate::FuncInstance::alloc_host
///
/// # Examples
///
/// ```rust
/// use wasmine::{Externals, HostCall, HostControl, Trap, Value};
///
/// struct HostExternals;
///
/// const ADD_FUNC_INDEX: usize = 0;
///
/// impl Externals for HostExternals {
///     fn invoke_index(
///         &mut self,
///         index: usize,
///         call: HostCall,
///     ) -> Result<HostControl, Trap> {
///         match index {
///             ADD_FUNC_INDEX => {
///                 let a: u32 = call.args().nth_checked(0)?;
///                 let b: u32 = call.args().nth_checked(1)?;
///                 call.results[0] = Value::I32(a.wrapping_add(b) as i32);
///                 Ok(HostControl::Done)
///             }
///             _ => panic!("unimplemented function at {}", index),
///         }
///     }
/// }
/// ```
pub trait Externals {
    /// Perform the invocation of a host function by the specified
    /// `index`.
    fn invoke_index(&mut self, index: usize, call: HostCall) -> Result<HostControl, Trap>;
}

/// Implementation of [`Externals`] that traps on every
/// [`invoke_index`][`Externals::invoke_index`].
pub struct NopExternals;

impl Externals for NopExternals {
    fn invoke_index(&mut self, _index: usize, _call: HostCall) -> Result<HostControl, Trap> {
        Err(Trap::new(TrapCode::Unreachable))
    }
}

#[cfg(test)]
mod tests {
    use super::{HostError, RuntimeArgs};
    use crate::value::Value;

    #[test]
    fn i32_runtime_args() {
        let args: RuntimeArgs = (&[Value::I32(0)][..]).into();
        let val: i32 = args.nth_checked(0).unwrap();
        assert_eq!(val, 0);
    }

    #[test]
    fn i64_invalid_arg_cast() {
        let args: RuntimeArgs = (&[Value::I64(90534534545322)][..]).into();
        assert!(args.nth_checked::<i32>(0).is_err());
    }

    // Tests that `HostError` trait is object safe.
    fn _host_error_is_object_safe(_: &dyn HostError) {}
}
