use core::fmt;

/// A stable identifier for one element of a replicated sequence.
///
/// Every element ever generated anywhere in the system gets a distinct
/// `Element` identifier, formed from the generating site and that site's
/// logical clock at generation time. The two sentinels bracket the
/// identifier space: `Start` compares below every element identifier and
/// `End` above.
///
/// The variant order is load-bearing: the derived [`Ord`] relies on
/// `Start` being declared first and `End` last, and on `site` preceding
/// `clock` inside `Element`. Together these give the strict total order
/// the sequence engine uses to arbitrate concurrent inserts.
///
/// # Example
///
/// ```
/// use woot_kit::Id;
///
/// let a = Id::element(1u8, 1);
/// let b = Id::element(2u8, 1);
///
/// assert!(Id::Start < a);
/// assert!(a < b);
/// assert!(b < Id::<u8>::End);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Id<S> {
    /// Sentinel below every element identifier.
    Start,
    /// An identifier minted by a site for one generated element.
    Element {
        /// The generating replica.
        site: S,
        /// The generating replica's logical clock when the element was made.
        clock: u64,
    },
    /// Sentinel above every element identifier.
    End,
}

impl<S> Id<S> {
    /// Construct an element identifier.
    pub fn element(site: S, clock: u64) -> Self {
        Id::Element { site, clock }
    }

    /// Whether this is `Start` or `End`.
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Id::Start | Id::End)
    }
}

impl<S: fmt::Display> fmt::Display for Id<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Start => write!(f, "start"),
            Id::Element { site, clock } => write!(f, "{site}:{clock}"),
            Id::End => write!(f, "end"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_bracket_elements() {
        let id = Id::element(7u8, 42);
        assert!(Id::Start < id);
        assert!(id < Id::End);
        assert!(Id::<u8>::Start < Id::End);
    }

    #[test]
    fn elements_order_by_site_then_clock() {
        assert!(Id::element(1u8, 9) < Id::element(2u8, 1));
        assert!(Id::element(1u8, 1) < Id::element(1u8, 2));
    }

    #[test]
    fn equality_is_structural() {
        assert_eq!(Id::element("a", 1), Id::element("a", 1));
        assert_ne!(Id::element("a", 1), Id::element("a", 2));
        assert_ne!(Id::element("a", 1), Id::element("b", 1));
        assert_eq!(Id::<&str>::Start, Id::Start);
        assert_eq!(Id::<&str>::End, Id::End);
    }

    #[test]
    fn order_is_trichotomous_and_transitive() {
        let ids = vec![
            Id::Start,
            Id::element(1u8, 1),
            Id::element(1u8, 2),
            Id::element(2u8, 1),
            Id::End,
        ];

        for a in &ids {
            for b in &ids {
                let lt = a < b;
                let gt = a > b;
                let eq = a == b;
                assert_eq!(
                    1,
                    usize::from(lt) + usize::from(gt) + usize::from(eq),
                    "exactly one of <, >, == must hold for {a:?} vs {b:?}"
                );
                for c in &ids {
                    if a < b && b < c {
                        assert!(a < c, "transitivity broken at {a:?} < {b:?} < {c:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn display_forms() {
        assert_eq!(Id::element(3u8, 5).to_string(), "3:5");
        assert_eq!(Id::<u8>::Start.to_string(), "start");
        assert_eq!(Id::<u8>::End.to_string(), "end");
    }
}
