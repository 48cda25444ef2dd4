use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("merge error: {0}")]
    Merge(#[from] strata_merge::MergeError),

    #[error("patch error: {0}")]
    Patch(#[from] strata_patch::PatchError),

    #[error("diff error: {0}")]
    Diff(#[from] strata_diff::DiffError),
}

pub type SdkResult<T> = Result<T, SdkError>;
