use crate::features::Config;
use crate::host::{Externals, HostCall, HostControl, RestartRecord};
use crate::instance::{ModuleInstance, ModuleRef};
use crate::module::FuncBody;
use crate::runner::{Interpreter, InvokeOutcome};
use crate::types::FuncType;
use crate::value::Value;
use crate::{Error, Trap, TrapCode};
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::fmt;

/// Reference to a function (See [`FuncInstance`] for details).
///
/// This reference has a reference-counting semantics.
#[derive(Clone)]
pub struct FuncRef(Rc<FuncInstance>);

impl ::core::ops::Deref for FuncRef {
    type Target = FuncInstance;
    fn deref(&self) -> &FuncInstance {
        &self.0
    }
}

impl fmt::Debug for FuncRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FuncRef {
    /// Whether two references point at the same function instance.
    pub fn ptr_eq(a: &FuncRef, b: &FuncRef) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }
}

/// Runtime representation of a function.
///
/// Functions are the unit of organization of code in WebAssembly. Each
/// function takes a sequence of values as parameters and returns a
/// sequence of result values or traps. Functions can call other
/// functions, including themselves, and imported functions.
///
/// A function instance is defined either
///
/// - by a wasm module, owning a validated body, or
/// - by the host environment, dispatching into [`Externals`].
pub struct FuncInstance(FuncInstanceInternal);

pub(crate) enum FuncInstanceInternal {
    Internal {
        func_type: Rc<FuncType>,
        module: Weak<ModuleInstance>,
        body: Rc<FuncBody>,
    },
    Host {
        func_type: Rc<FuncType>,
        host_func_index: usize,
    },
}

impl fmt::Debug for FuncInstance {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.as_internal() {
            FuncInstanceInternal::Internal { func_type, .. } => {
                // Printing the module here would recurse through the
                // instance's function list.
                write!(f, "Internal {{ type={:?} }}", func_type)
            }
            FuncInstanceInternal::Host { func_type, .. } => {
                write!(f, "Host {{ type={:?} }}", func_type)
            }
        }
    }
}

impl FuncInstance {
    /// Allocate a function instance for a host function.
    ///
    /// When this function instance is called by wasm code, the instance
    /// of [`Externals`] passed to the invocation is entered through
    /// `invoke_index` with the `host_func_index` given here.
    pub fn alloc_host(func_type: FuncType, host_func_index: usize) -> FuncRef {
        FuncRef(Rc::new(FuncInstance(FuncInstanceInternal::Host {
            func_type: Rc::new(func_type),
            host_func_index,
        })))
    }

    pub(crate) fn alloc_internal(
        module: Weak<ModuleInstance>,
        func_type: Rc<FuncType>,
        body: Rc<FuncBody>,
    ) -> FuncRef {
        FuncRef(Rc::new(FuncInstance(FuncInstanceInternal::Internal {
            func_type,
            module,
            body,
        })))
    }

    /// Returns the [type][`FuncType`] of this function instance.
    ///
    /// A function instance can only be called with matching arguments.
    pub fn func_type(&self) -> &FuncType {
        match self.as_internal() {
            FuncInstanceInternal::Internal { func_type, .. } => func_type,
            FuncInstanceInternal::Host { func_type, .. } => func_type,
        }
    }

    pub(crate) fn as_internal(&self) -> &FuncInstanceInternal {
        &self.0
    }

    pub(crate) fn body(&self) -> Option<Rc<FuncBody>> {
        match self.as_internal() {
            FuncInstanceInternal::Internal { body, .. } => Some(Rc::clone(body)),
            FuncInstanceInternal::Host { .. } => None,
        }
    }

    pub(crate) fn module(&self) -> Option<ModuleRef> {
        match self.as_internal() {
            FuncInstanceInternal::Internal { module, .. } => {
                Some(ModuleRef(module.upgrade().expect(
                    "the instance owning this function is kept alive by the embedder",
                )))
            }
            FuncInstanceInternal::Host { .. } => None,
        }
    }

    /// Invoke this function with the default configuration.
    ///
    /// Restartable and suspended host calls are transparently resumed;
    /// use [`FuncInvocation`] for fine-grained control.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the argument types do not match the function
    /// [type][`FuncInstance::func_type`], if a [`Trap`] occurs during
    /// execution, or if execution is interrupted.
    pub fn invoke<E: Externals>(
        func: &FuncRef,
        args: &[Value],
        externals: &mut E,
    ) -> Result<Vec<Value>, Error> {
        FuncInstance::invoke_configured(func, args, externals, &Config::default())
    }

    /// Invoke this function under an explicit [`Config`].
    pub fn invoke_configured<E: Externals>(
        func: &FuncRef,
        args: &[Value],
        externals: &mut E,
        config: &Config,
    ) -> Result<Vec<Value>, Error> {
        let mut invocation = FuncInvocation::new(func.clone(), args, config)?;
        loop {
            match invocation.resume(externals)? {
                InvokeOutcome::Finished(values) => return Ok(values),
                InvokeOutcome::Restartable | InvokeOutcome::Suspended => continue,
                InvokeOutcome::Interrupted => return Err(Error::Interrupted),
            }
        }
    }

    /// Invoke the function through a resumable handle.
    ///
    /// The handle reports restartable/suspended/interrupted outcomes to
    /// the embedder instead of driving them internally.
    pub fn invoke_resumable(
        func: &FuncRef,
        args: &[Value],
        config: &Config,
    ) -> Result<FuncInvocation, Error> {
        FuncInvocation::new(func.clone(), args, config)
    }
}

/// Checks that the argument values match the function type.
pub(crate) fn check_function_args(func_type: &FuncType, args: &[Value]) -> Result<(), Trap> {
    if func_type.params().len() != args.len() {
        return Err(Trap::new(TrapCode::UnexpectedSignature));
    }
    if func_type
        .params()
        .iter()
        .zip(args)
        .any(|(expected, arg)| arg.value_type() != *expected)
    {
        return Err(Trap::new(TrapCode::UnexpectedSignature));
    }
    Ok(())
}

/// A resumable invocation handle.
///
/// Driving it with [`resume`] executes until the function finishes, a
/// host call asks for a restart or suspension, or the interrupt flag is
/// observed. The same context is re-entered on the next call, resuming
/// the same instruction.
///
/// [`resume`]: FuncInvocation::resume
pub struct FuncInvocation {
    kind: InvocationKind,
    finished: bool,
}

enum InvocationKind {
    Internal(Interpreter),
    Host {
        func: FuncRef,
        args: Vec<Value>,
        restart: Vec<RestartRecord>,
    },
}

impl FuncInvocation {
    fn new(func: FuncRef, args: &[Value], config: &Config) -> Result<FuncInvocation, Error> {
        check_function_args(func.func_type(), args)?;
        let kind = match func.as_internal() {
            FuncInstanceInternal::Internal { .. } => {
                InvocationKind::Internal(Interpreter::new(&func, args, config)?)
            }
            FuncInstanceInternal::Host { .. } => InvocationKind::Host {
                func,
                args: args.to_vec(),
                restart: Vec::new(),
            },
        };
        Ok(FuncInvocation {
            kind,
            finished: false,
        })
    }

    /// Whether the invocation already produced its results.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Installs an interrupt flag polled by the execution loop.
    #[cfg(feature = "std")]
    pub fn set_interrupt_flag(
        &mut self,
        flag: alloc::sync::Arc<core::sync::atomic::AtomicBool>,
    ) {
        if let InvocationKind::Internal(interp) = &mut self.kind {
            interp.set_interrupt_flag(flag);
        }
    }

    /// The exit code recorded by a voluntary-exit trap, if any.
    pub fn exit_code(&self) -> Option<u32> {
        match &self.kind {
            InvocationKind::Internal(interp) => interp.exit_code(),
            InvocationKind::Host { .. } => None,
        }
    }

    /// Starts or resumes execution.
    pub fn resume<E: Externals>(&mut self, externals: &mut E) -> Result<InvokeOutcome, Error> {
        if self.finished {
            return Err(Error::Function(
                "the invocation already ran to completion".into(),
            ));
        }
        let outcome = match &mut self.kind {
            InvocationKind::Internal(interp) => interp.run(externals)?,
            InvocationKind::Host {
                func,
                args,
                restart,
            } => {
                // A host function invoked directly, without any wasm
                // frame around it.
                let func_type = func.func_type();
                let mut results: Vec<Value> = func_type
                    .results()
                    .iter()
                    .map(|ty| Value::default(*ty))
                    .collect();
                let host_func_index = match func.as_internal() {
                    FuncInstanceInternal::Host {
                        host_func_index, ..
                    } => *host_func_index,
                    FuncInstanceInternal::Internal { .. } => {
                        unreachable!("constructed as a host invocation")
                    }
                };
                let call = HostCall::new(args, &mut results, restart);
                match externals.invoke_index(host_func_index, call)? {
                    HostControl::Done => {
                        for (value, expected) in results.iter().zip(func_type.results()) {
                            if value.value_type() != *expected {
                                return Err(Error::Trap(Trap::new(
                                    TrapCode::UnexpectedSignature,
                                )));
                            }
                        }
                        InvokeOutcome::Finished(results)
                    }
                    HostControl::Restart => InvokeOutcome::Restartable,
                    HostControl::Suspend => InvokeOutcome::Suspended,
                }
            }
        };
        if let InvokeOutcome::Finished(_) = &outcome {
            self.finished = true;
        }
        Ok(outcome)
    }
}
