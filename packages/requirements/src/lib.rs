// ABOUTME: Requirements with version lineage and the change request workflow
// ABOUTME: Keeps exactly one current version per requirement across every mutation

pub mod change_requests;
pub mod lineage;
pub mod storage;
pub mod types;

pub use change_requests::ChangeRequestStorage;
pub use storage::RequirementStorage;
pub use types::{
    ApproveInput, ChangeRequest, ChangeRequestCreateInput, ChangeRequestFilter,
    ChangeRequestStatus, ChangeRequestUpdateInput, ForceStatusInput, ImplementInput,
    RejectInput, Requirement, RequirementCreateInput, RequirementStatus, RequirementType,
    RequirementVersion, RequirementWithVersion, VersionCreateInput, VersionFields,
    VersionPatch, VersionUpdateInput,
};
