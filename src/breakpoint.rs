use serde::Deserialize;
use std::fmt;

/// Viewport size buckets, ordered from smallest to largest screen.
///
/// The derived `Ord` follows declaration order, so `Xs < Sm < Md < Lg < Xl`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Breakpoint {
    Xs,
    Sm,
    Md,
    Lg,
    Xl,
}

impl Breakpoint {
    /// All known breakpoints, smallest first.
    pub const ALL: [Breakpoint; 5] = [
        Breakpoint::Xs,
        Breakpoint::Sm,
        Breakpoint::Md,
        Breakpoint::Lg,
        Breakpoint::Xl,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Breakpoint::Xs => "xs",
            Breakpoint::Sm => "sm",
            Breakpoint::Md => "md",
            Breakpoint::Lg => "lg",
            Breakpoint::Xl => "xl",
        }
    }

    /// The next larger breakpoint, wrapping around to the smallest.
    pub fn cycle(&self) -> Breakpoint {
        match self {
            Breakpoint::Xs => Breakpoint::Sm,
            Breakpoint::Sm => Breakpoint::Md,
            Breakpoint::Md => Breakpoint::Lg,
            Breakpoint::Lg => Breakpoint::Xl,
            Breakpoint::Xl => Breakpoint::Xs,
        }
    }
}

impl fmt::Display for Breakpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Terminal width thresholds (in columns) at which the next larger
/// breakpoint starts. Widths below `sm` bucket as `Xs`.
#[derive(Debug, Clone)]
pub struct BreakpointThresholds {
    pub sm: usize,
    pub md: usize,
    pub lg: usize,
    pub xl: usize,
}

impl Default for BreakpointThresholds {
    fn default() -> Self {
        BreakpointThresholds {
            sm: 60,
            md: 90,
            lg: 120,
            xl: 160,
        }
    }
}

impl BreakpointThresholds {
    pub fn bucket(&self, width: usize) -> Breakpoint {
        if width >= self.xl {
            Breakpoint::Xl
        } else if width >= self.lg {
            Breakpoint::Lg
        } else if width >= self.md {
            Breakpoint::Md
        } else if width >= self.sm {
            Breakpoint::Sm
        } else {
            Breakpoint::Xs
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breakpoints_are_ordered_smallest_first() {
        assert!(Breakpoint::Xs < Breakpoint::Sm);
        assert!(Breakpoint::Sm < Breakpoint::Md);
        assert!(Breakpoint::Md < Breakpoint::Lg);
        assert!(Breakpoint::Lg < Breakpoint::Xl);

        let mut sorted = Breakpoint::ALL;
        sorted.sort();
        assert_eq!(sorted, Breakpoint::ALL);
    }

    #[test]
    fn bucket_boundaries() {
        let t = BreakpointThresholds::default();
        assert_eq!(t.bucket(0), Breakpoint::Xs);
        assert_eq!(t.bucket(59), Breakpoint::Xs);
        assert_eq!(t.bucket(60), Breakpoint::Sm);
        assert_eq!(t.bucket(89), Breakpoint::Sm);
        assert_eq!(t.bucket(90), Breakpoint::Md);
        assert_eq!(t.bucket(120), Breakpoint::Lg);
        assert_eq!(t.bucket(159), Breakpoint::Lg);
        assert_eq!(t.bucket(160), Breakpoint::Xl);
        assert_eq!(t.bucket(500), Breakpoint::Xl);
    }

    #[test]
    fn cycle_wraps_around() {
        let mut bp = Breakpoint::Xs;
        for expected in [
            Breakpoint::Sm,
            Breakpoint::Md,
            Breakpoint::Lg,
            Breakpoint::Xl,
            Breakpoint::Xs,
        ] {
            bp = bp.cycle();
            assert_eq!(bp, expected);
        }
    }

    #[test]
    fn deserializes_lowercase_names() {
        let bp: Breakpoint = serde_json::from_str("\"md\"").unwrap();
        assert_eq!(bp, Breakpoint::Md);
    }
}
