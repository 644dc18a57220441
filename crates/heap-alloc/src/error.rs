//! Assembly-time error taxonomy.
//!
//! Assignment is the only operation with enough distinct failure modes to
//! warrant an error type; the allocation family reports failure through a
//! null pointer and mutates nothing on the way out.

/// Why a region list was rejected at assignment.
///
/// In every case the instance is left exactly as it was: unassembled
/// instances stay unassembled, and no region memory has been adopted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AssignError {
    /// Regions are adopted exactly once per instance.
    #[error("instance already has regions assigned")]
    AlreadyAssigned,
    /// The region list was empty.
    #[error("region list is empty")]
    NoRegions,
    /// A region had a null base or a zero size, or its extent wraps the
    /// address space.
    #[error("region has a null base, zero size, or wrapping extent")]
    InvalidRegion,
    /// Region bases must be given in ascending address order; the list is
    /// never reordered on the caller's behalf.
    #[error("region bases are not ascending")]
    UnorderedRegions,
    /// Two regions share bytes.
    #[error("regions overlap")]
    OverlappingRegions,
    /// After alignment normalisation, no region had room for block metadata.
    #[error("no region is large enough to hold block metadata")]
    NoUsableRegion,
    /// The grow-only mode manages a single region.
    #[error("grow-only mode accepts exactly one region")]
    TooManyRegions,
}
