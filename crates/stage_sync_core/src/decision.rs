use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Promotion {
    /// Staging is strictly newer; overwrite production.
    Copy,
    /// Production is as new as or newer than staging.
    Skip,
}

impl Promotion {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Copy => "copy",
            Self::Skip => "skip",
        }
    }
}

/// Equal timestamps never promote, so a production object rewritten by a
/// previous run is not copied again.
pub fn decide_promotion(
    staging_last_modified: DateTime<Utc>,
    prod_last_modified: DateTime<Utc>,
) -> Promotion {
    if staging_last_modified > prod_last_modified {
        Promotion::Copy
    } else {
        Promotion::Skip
    }
}
