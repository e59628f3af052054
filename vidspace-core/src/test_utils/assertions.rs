//! Assertions for access outcomes
//!
//! Panicking helpers with messages that name the expected error kind.

use crate::core_access::{AccessError, AccessResult, ErrorKind, SpaceAccess, SpaceId, SpaceWithAccess};
use std::fmt::Debug;

/// Assert that a Result failed with `kind` and return the error
pub fn assert_kind<T: Debug>(result: AccessResult<T>, kind: ErrorKind) -> AccessError {
    match result {
        Ok(value) => panic!("Expected {:?}, got Ok: {:?}", kind, value),
        Err(e) if e.kind() == kind => e,
        Err(e) => panic!("Expected {:?}, got {:?}", kind, e),
    }
}

/// Assert that a Result failed with PermissionDenied
pub fn assert_denied<T: Debug>(result: AccessResult<T>) -> AccessError {
    assert_kind(result, ErrorKind::PermissionDenied)
}

/// Assert that a Result is Ok and return the value
pub fn assert_allowed<T>(result: AccessResult<T>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => panic!("Expected access to be allowed, got {:?}", e),
    }
}

/// Assert that `space` is listed with the given access and return the entry
pub fn assert_space_listed<'a>(
    spaces: &'a [SpaceWithAccess],
    space: &SpaceId,
    access: SpaceAccess,
) -> &'a SpaceWithAccess {
    let entry = spaces
        .iter()
        .find(|s| &s.space.id == space)
        .unwrap_or_else(|| panic!("Expected space {} to be listed in {:?}", space, spaces));
    assert_eq!(entry.access, access, "access on space {}", space);
    entry
}

/// Assert that `space` is absent from a listing
pub fn assert_space_not_listed(spaces: &[SpaceWithAccess], space: &SpaceId) {
    if let Some(entry) = spaces.iter().find(|s| &s.space.id == space) {
        panic!("Expected space {} not to be listed, found {:?}", space, entry);
    }
}
