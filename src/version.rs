//! Dot-separated app versions with any number of numeric components.

use crate::error::{Error, Result};
use num_bigint::BigUint;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Parsed app version: an ordered list of non-negative integers.
///
/// Invariants:
/// - At least one component
/// - Components are unbounded (`"1.99999999999999999999"` is valid)
/// - Ordering pads the shorter side with zeros, so `1.2 == 1.2.0`
#[derive(Debug, Clone)]
pub struct Version {
    components: Vec<BigUint>,
}

impl Version {
    /// Parse a dot-separated version string.
    ///
    /// Components that are not base-10 integers are dropped. Returns `None`
    /// when nothing numeric is left.
    pub fn parse(s: &str) -> Option<Self> {
        let components: Vec<BigUint> = s
            .split('.')
            .filter(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()))
            .filter_map(|part| part.parse::<BigUint>().ok())
            .collect();

        if components.is_empty() {
            None
        } else {
            Some(Version { components })
        }
    }

    /// Like [`Version::parse`] but reports the offending input.
    pub fn parse_strict(s: &str) -> Result<Self> {
        Version::parse(s).ok_or_else(|| Error::InvalidVersion(s.to_string()))
    }

    pub fn components(&self) -> &[BigUint] {
        &self.components
    }

    /// Components with trailing zeros stripped; equal versions share this form.
    fn significant(&self) -> &[BigUint] {
        let end = self
            .components
            .iter()
            .rposition(|c| c.bits() != 0)
            .map_or(0, |i| i + 1);
        &self.components[..end]
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        for i in 0..len {
            let ord = match (self.components.get(i), other.components.get(i)) {
                (Some(a), Some(b)) => a.cmp(b),
                (Some(a), None) if a.bits() != 0 => Ordering::Greater,
                (None, Some(b)) if b.bits() != 0 => Ordering::Less,
                _ => Ordering::Equal,
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.significant().hash(state);
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, c) in self.components.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Version::parse_strict(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert!(Version::parse("").is_none());
        assert!(Version::parse("abc").is_none());
        assert!(Version::parse("...").is_none());
        assert!(Version::parse("-1").is_none());
    }

    #[test]
    fn test_parse_drops_bad_components() {
        assert_eq!(v("1.beta.3").components().len(), 2);
        assert_eq!(v("1.beta.3"), v("1.3"));
        assert_eq!(v("5").to_string(), "5");
        assert_eq!(v("1.2.3.4.5").components().len(), 5);
    }

    #[test]
    fn test_parse_strict_error() {
        assert!(matches!(Version::parse_strict("x.y"), Err(Error::InvalidVersion(_))));
        assert_eq!("1.0".parse::<Version>().unwrap(), v("1"));
    }

    #[test]
    fn test_trailing_zero_equality() {
        assert_eq!(v("1.2"), v("1.2.0"));
        assert_eq!(v("1.2.0"), v("1.2.0.0"));
        assert_eq!(v("0"), v("0.0.0"));
    }

    #[test]
    fn test_monotonic_examples() {
        assert!(v("1.9.0") < v("2.0.0"));
        assert!(v("1.9.0") < v("1.10.0"));
        assert!(v("1.0.0") < v("1.0.1"));
        assert!(v("2.0.0") > v("1.9.0"));
        assert!(v("1.2.0.1") > v("1.2"));
    }

    #[test]
    fn test_unbounded_components() {
        assert!(v("1.99999999999999999999999") > v("1.99999999999999999999998"));
        assert!(v("18446744073709551616") > v("18446744073709551615"));
    }

    #[test]
    fn test_equal_versions_hash_equal() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(v("3.1"));
        assert!(set.contains(&v("3.1.0.0")));
    }

    fn components() -> impl Strategy<Value = Vec<u64>> {
        prop::collection::vec(0u64..20, 1..6)
    }

    fn render(c: &[u64]) -> String {
        c.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(".")
    }

    proptest! {
        #[test]
        fn prop_reflexive(a in components()) {
            let s = render(&a);
            prop_assert_eq!(v(&s).cmp(&v(&s)), Ordering::Equal);
        }

        #[test]
        fn prop_trailing_zeros_ignored(a in components(), zeros in 0usize..4) {
            let mut padded = a.clone();
            padded.extend(std::iter::repeat(0).take(zeros));
            prop_assert_eq!(v(&render(&a)), v(&render(&padded)));
        }

        #[test]
        fn prop_antisymmetric(a in components(), b in components()) {
            let (va, vb) = (v(&render(&a)), v(&render(&b)));
            prop_assert_eq!(va.cmp(&vb), vb.cmp(&va).reverse());
        }

        #[test]
        fn prop_transitive(a in components(), b in components(), c in components()) {
            let mut vs = [v(&render(&a)), v(&render(&b)), v(&render(&c))];
            vs.sort();
            prop_assert!(vs[0] <= vs[1] && vs[1] <= vs[2] && vs[0] <= vs[2]);
        }

        #[test]
        fn prop_matches_padded_numeric_order(a in components(), b in components()) {
            let len = a.len().max(b.len());
            let mut pa = a.clone();
            let mut pb = b.clone();
            pa.resize(len, 0);
            pb.resize(len, 0);
            prop_assert_eq!(v(&render(&a)).cmp(&v(&render(&b))), pa.cmp(&pb));
        }
    }
}
