//! Reflective method catalog entries

use crate::error::{ReflectError, Result};
use crate::value::{Value, ValueKind};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Static type of a method parameter or return value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// One of the serializable primitive kinds
    Value(ValueKind),
    /// Any other type, identified by name only
    Opaque(String),
}

impl TypeTag {
    /// Get the primitive kind, if any
    pub fn value_kind(&self) -> Option<ValueKind> {
        match self {
            TypeTag::Value(kind) => Some(*kind),
            TypeTag::Opaque(_) => None,
        }
    }
}

impl From<ValueKind> for TypeTag {
    fn from(kind: ValueKind) -> Self {
        TypeTag::Value(kind)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Value(kind) => write!(f, "{}", kind),
            TypeTag::Opaque(name) => f.write_str(name),
        }
    }
}

/// Call through a shared receiver
pub type RefInvoker = Arc<dyn Fn(&dyn Any, &[Value]) -> Result<Option<Value>> + Send + Sync>;

/// Call through a mutable receiver
pub type MutInvoker = Arc<dyn Fn(&mut dyn Any, &[Value]) -> Result<Option<Value>> + Send + Sync>;

/// How a method is invoked on an instance
#[derive(Clone)]
pub enum Invoker {
    Ref(RefInvoker),
    Mut(MutInvoker),
}

/// A single method exposed by a reflected type
#[derive(Clone)]
pub struct MethodInfo {
    name: String,
    params: Vec<TypeTag>,
    returns: Option<TypeTag>,
    invoker: Invoker,
}

impl MethodInfo {
    /// Describe a method
    pub fn new(
        name: impl Into<String>,
        params: Vec<TypeTag>,
        returns: Option<TypeTag>,
        invoker: Invoker,
    ) -> Self {
        Self {
            name: name.into(),
            params,
            returns,
            invoker,
        }
    }

    /// Method name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter types
    pub fn params(&self) -> &[TypeTag] {
        &self.params
    }

    /// Return type, `None` for methods returning nothing
    pub fn returns(&self) -> Option<&TypeTag> {
        self.returns.as_ref()
    }

    /// Whether the method needs a mutable receiver
    pub fn is_mut(&self) -> bool {
        matches!(self.invoker, Invoker::Mut(_))
    }

    /// Invoke through a shared receiver
    pub fn invoke(&self, target: &dyn Any, args: &[Value]) -> Result<Option<Value>> {
        self.check_arity(args)?;
        match &self.invoker {
            Invoker::Ref(f) => f(target, args),
            Invoker::Mut(_) => Err(ReflectError::invocation(
                &self.name,
                "method requires a mutable receiver",
            )),
        }
    }

    /// Invoke through a mutable receiver
    pub fn invoke_mut(&self, target: &mut dyn Any, args: &[Value]) -> Result<Option<Value>> {
        self.check_arity(args)?;
        match &self.invoker {
            Invoker::Ref(f) => f(&*target, args),
            Invoker::Mut(f) => f(target, args),
        }
    }

    fn check_arity(&self, args: &[Value]) -> Result<()> {
        if args.len() != self.params.len() {
            return Err(ReflectError::invocation(
                &self.name,
                format!("expected {} arguments, got {}", self.params.len(), args.len()),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for MethodInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodInfo")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("returns", &self.returns)
            .field("mut", &self.is_mut())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter_method() -> MethodInfo {
        MethodInfo::new(
            "bump",
            vec![TypeTag::Value(ValueKind::Int)],
            None,
            Invoker::Mut(Arc::new(|target: &mut dyn Any, args: &[Value]| {
                let counter = target
                    .downcast_mut::<i32>()
                    .ok_or_else(|| ReflectError::invocation("bump", "wrong receiver"))?;
                if let Some(Value::Int(by)) = args.first() {
                    *counter += by;
                }
                Ok(None)
            })),
        )
    }

    #[test]
    fn test_mut_method_rejects_shared_receiver() {
        let method = counter_method();
        let counter = 1i32;
        assert!(method.invoke(&counter, &[Value::Int(1)]).is_err());
    }

    #[test]
    fn test_invoke_mut() {
        let method = counter_method();
        let mut counter = 1i32;
        method.invoke_mut(&mut counter, &[Value::Int(4)]).unwrap();
        assert_eq!(counter, 5);
    }

    #[test]
    fn test_arity_checked() {
        let method = counter_method();
        let mut counter = 0i32;
        assert!(matches!(
            method.invoke_mut(&mut counter, &[]),
            Err(ReflectError::PropertyInvocation { .. })
        ));
    }
}
