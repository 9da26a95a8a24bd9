//! Module and function views

use std::fmt;
use std::rc::Rc;

use super::Tuple;
use crate::convert::{into_raw, IntoForeign};
use crate::error::Result;
use crate::handle::Handle;
use crate::runtime::{NativeFn, Runtime};
use crate::view::foreign_view;

foreign_view! {
    /// View of a foreign module: a named namespace of attributes.
    Module => [Module]
}

foreign_view! {
    /// View of a callable host function.
    Function => [Function]
}

impl<'rt> Module<'rt> {
    /// A new module with no attributes.
    pub fn new(rt: &'rt Runtime, name: &str) -> Result<Self> {
        Handle::adopt(rt, rt.new_module(name)).map(Self::wrap)
    }

    /// The module's name.
    pub fn name(&self) -> String {
        self.parts()
            .and_then(|(rt, ptr)| rt.module_name(ptr))
            .unwrap_or_default()
    }

    /// Bind `name` to `value`, replacing any previous binding.
    pub fn set_attr(&self, name: &str, value: impl IntoForeign<'rt>) -> Result<()> {
        let (rt, ptr) = self.parts()?;
        rt.module_set_attr(ptr, name, into_raw(rt, value)?)
    }

    /// Whether `name` is bound.
    pub fn has_attr(&self, name: &str) -> bool {
        self.attr_names().iter().any(|bound| bound == name)
    }

    /// Bind a host function under `name`.
    pub fn add_function<F>(&self, name: &str, f: F) -> Result<Function<'rt>>
    where
        F: for<'a> Fn(&'a Runtime, &Tuple<'a>) -> Result<Handle<'a>> + 'static,
    {
        let (rt, _) = self.parts()?;
        let function = Function::new(rt, name, f)?;
        self.set_attr(name, &function)?;
        Ok(function)
    }

    /// Bound attribute names, in binding order.
    pub fn attr_names(&self) -> Vec<String> {
        self.parts()
            .and_then(|(rt, ptr)| rt.module_attr_names(ptr))
            .unwrap_or_default()
    }
}

impl<'rt> Function<'rt> {
    /// Expose the host closure `f` as a foreign function called `name`.
    pub fn new<F>(rt: &'rt Runtime, name: &str, f: F) -> Result<Self>
    where
        F: for<'a> Fn(&'a Runtime, &Tuple<'a>) -> Result<Handle<'a>> + 'static,
    {
        let func: Rc<NativeFn> = Rc::new(f);
        Handle::adopt(rt, rt.new_function(name, func)).map(Self::wrap)
    }

    /// The name the function was created with.
    pub fn name(&self) -> String {
        self.parts()
            .and_then(|(rt, ptr)| rt.function_parts(ptr))
            .map(|(name, _)| name)
            .unwrap_or_default()
    }
}

impl fmt::Display for Module<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&**self, f)
    }
}

impl fmt::Display for Function<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&**self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::ToForeign;
    use crate::error::Error;

    #[test]
    fn test_attributes() {
        let rt = Runtime::new();
        let module = Module::new(&rt, "config").unwrap();
        module.set_attr("debug", true).unwrap();
        module.set_attr("level", 3i64).unwrap();
        module.set_attr("level", 4i64).unwrap();
        assert_eq!(module.name(), "config");
        assert_eq!(module.attr_names(), ["debug", "level"]);
        assert_eq!(module.get_attr("level").unwrap().to_int(), Ok(4));
        assert!(matches!(module.get_attr("missing"), Err(Error::Attribute(_))));
    }

    #[test]
    fn test_call_function() {
        let rt = Runtime::new();
        let module = Module::new(&rt, "math").unwrap();
        module
            .add_function("add", |rt, args| {
                let sum = args.get(0)?.to_int()? + args.get(1)?.to_int()?;
                sum.to_foreign(rt)
            })
            .unwrap();

        let add = module.get_attr("add").unwrap();
        assert!(add.is_callable());
        let args = Tuple::from_items(&rt, [2i64, 3]).unwrap();
        assert_eq!(add.call(&args).unwrap().to_int(), Ok(5));
        assert!(matches!(add.call0(), Err(Error::Index { .. })));
    }

    #[test]
    fn test_function_name() {
        let rt = Runtime::new();
        let f = Function::new(&rt, "noop", |rt, _| ().to_foreign(rt)).unwrap();
        assert_eq!(f.name(), "noop");
        assert!(f.call0().unwrap().is_none());
    }

    #[test]
    fn test_function_must_return_an_object() {
        let rt = Runtime::new();
        let f = Function::new(&rt, "hollow", |_, _| Ok(Handle::empty())).unwrap();
        assert!(matches!(f.call0(), Err(Error::Call(_))));
    }
}
