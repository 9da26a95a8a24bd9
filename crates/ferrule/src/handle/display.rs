//! Formatting and comparison of handles

use std::cmp::Ordering;
use std::fmt;

use super::Handle;
use crate::error::Result;

impl Handle<'_> {
    /// Rich ordering against another handle.
    ///
    /// Fails with [`Error::Type`](crate::Error::Type) for kinds that are not mutually comparable
    /// and with [`Error::Empty`](crate::Error::Empty) if either side is empty.
    pub fn try_cmp(&self, other: &Handle<'_>) -> Result<Ordering> {
        let (rt, a) = self.parts()?;
        let b = other.ptr_in(rt)?;
        rt.rich_cmp(a, b)
    }
}

/// `str()` of the object; an empty handle renders as nothing.
impl fmt::Display for Handle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.parts() {
            Ok((rt, ptr)) => f.write_str(&rt.to_str(ptr)),
            Err(_) => Ok(()),
        }
    }
}

impl fmt::Debug for Handle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.parts() {
            Ok((rt, ptr)) => write!(f, "Handle({})", rt.repr(ptr)),
            Err(_) => f.write_str("Handle(<empty>)"),
        }
    }
}

impl<'a, 'b> PartialEq<Handle<'b>> for Handle<'a> {
    fn eq(&self, other: &Handle<'b>) -> bool {
        match (self.parts(), other.parts()) {
            (Err(_), Err(_)) => true,
            (Ok((rt, a)), Ok((other_rt, b))) => std::ptr::eq(rt, other_rt) && rt.rich_eq(a, b),
            _ => false,
        }
    }
}

impl<'a, 'b> PartialOrd<Handle<'b>> for Handle<'a> {
    fn partial_cmp(&self, other: &Handle<'b>) -> Option<Ordering> {
        match (self.exists(), other.exists()) {
            (false, false) => Some(Ordering::Equal),
            (true, true) => self.try_cmp(other).ok(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::runtime::Runtime;

    #[test]
    fn test_display_and_debug() {
        let rt = Runtime::new();
        let text = Handle::adopt(&rt, rt.new_text("hi")).unwrap();
        assert_eq!(text.to_string(), "hi");
        assert_eq!(format!("{:?}", text), "Handle('hi')");
        assert_eq!(Handle::empty().to_string(), "");
        assert_eq!(format!("{:?}", Handle::empty()), "Handle(<empty>)");
    }

    #[test]
    fn test_equality() {
        let rt = Runtime::new();
        let one = Handle::adopt(&rt, rt.new_int(1)).unwrap();
        let one_f = Handle::adopt(&rt, rt.new_float(1.0)).unwrap();
        let two = Handle::adopt(&rt, rt.new_int(2)).unwrap();

        assert_eq!(one, one_f);
        assert_ne!(one, two);
        assert_ne!(one, Handle::empty());
        assert_eq!(Handle::empty(), Handle::empty());
        assert!(one < two);
    }

    #[test]
    fn test_try_cmp_incomparable() {
        let rt = Runtime::new();
        let one = Handle::adopt(&rt, rt.new_int(1)).unwrap();
        let text = Handle::adopt(&rt, rt.new_text("a")).unwrap();
        assert!(matches!(one.try_cmp(&text), Err(Error::Type { .. })));
        assert_eq!(one.partial_cmp(&text), None);
    }
}
