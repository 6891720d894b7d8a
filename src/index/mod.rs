// Index module - pluggable strategies for accelerating k-NN search
// Supports: Flat (exact), IVF (clustered), Annoy (random projection forest)
//
// The active strategy is a closed sum type rather than a trait object: the
// dispatcher pattern-matches, which keeps the hot path free of virtual
// dispatch and makes the persisted tagged layout a direct mirror of the
// in-memory one.

pub mod annoy;
pub mod flat;
pub mod ivf;
mod params;

pub use annoy::{AnnoyConfig, AnnoyIndex};
pub use ivf::{IvfConfig, IvfIndex, KMeans, KMeansModel};
pub use params::{AnnoySearchParams, IvfSearchParams, SearchParams};

use serde::{Deserialize, Serialize};

use crate::error::IndexError;

// Supported index kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexKind {
    // Brute force linear scan - exact, zero build cost
    Flat,
    // Inverted file over k-means clusters - probes a few lists per query
    Ivf,
    // Random projection forest - greedy or best-first traversal
    Annoy,
}

impl std::fmt::Display for IndexKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexKind::Flat => write!(f, "Flat"),
            IndexKind::Ivf => write!(f, "IVF"),
            IndexKind::Annoy => write!(f, "Annoy"),
        }
    }
}

impl IndexKind {
    fn as_str(&self) -> &'static str {
        match self {
            IndexKind::Flat => "Flat",
            IndexKind::Ivf => "IVF",
            IndexKind::Annoy => "Annoy",
        }
    }
}

// The one active strategy. `None` behaves as Flat when searching; Ivf and
// Annoy fall back to Flat until their build runs.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ActiveIndex {
    #[default]
    None,
    Flat,
    Ivf(IvfIndex),
    Annoy(AnnoyIndex),
}

impl ActiveIndex {
    pub fn kind(&self) -> IndexKind {
        match self {
            ActiveIndex::None | ActiveIndex::Flat => IndexKind::Flat,
            ActiveIndex::Ivf(_) => IndexKind::Ivf,
            ActiveIndex::Annoy(_) => IndexKind::Annoy,
        }
    }

    pub fn is_built(&self) -> bool {
        match self {
            // Flat needs no build; None searches as Flat
            ActiveIndex::None | ActiveIndex::Flat => true,
            ActiveIndex::Ivf(idx) => idx.is_built(),
            ActiveIndex::Annoy(idx) => idx.is_built(),
        }
    }

    // Reject params whose variant does not match the active kind.
    pub(crate) fn check_params(&self, params: Option<&SearchParams>) -> Result<(), IndexError> {
        let Some(params) = params else {
            return Ok(());
        };
        let matches = matches!(
            (self, params),
            (ActiveIndex::Ivf(_), SearchParams::Ivf(_))
                | (ActiveIndex::Annoy(_), SearchParams::Annoy(_))
        );
        if matches {
            Ok(())
        } else {
            Err(IndexError::ParamsKindMismatch {
                expected: self.kind().as_str(),
                got: params.kind_name(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_and_flat_report_flat() {
        assert_eq!(ActiveIndex::None.kind(), IndexKind::Flat);
        assert_eq!(ActiveIndex::Flat.kind(), IndexKind::Flat);
        assert!(ActiveIndex::None.is_built());
    }

    #[test]
    fn params_must_match_active_kind() {
        let flat = ActiveIndex::Flat;
        assert!(flat.check_params(None).is_ok());

        let params = SearchParams::ivf(3);
        let err = flat.check_params(Some(&params)).unwrap_err();
        assert_eq!(
            err,
            IndexError::ParamsKindMismatch {
                expected: "Flat",
                got: "IVF"
            }
        );

        let ivf = ActiveIndex::Ivf(IvfIndex::new(IvfConfig::default()));
        assert!(ivf.check_params(Some(&SearchParams::ivf(3))).is_ok());
        assert!(ivf
            .check_params(Some(&SearchParams::annoy(None, None)))
            .is_err());
    }
}
