use std::path::{Component, Path};

use crate::TransferError;

/// Returns the file name an entry is written under: the last path
/// component of `name`.
///
/// Directory parts never reach the destination, so `../../etc/passwd`
/// lands as `passwd` inside the destination. Rejects:
/// - Empty names
/// - Names without a final normal component (`..`, `/`, `.`)
pub fn target_name(name: &str) -> Result<&str, TransferError> {
    if name.is_empty() {
        return Err(TransferError::InvalidName(name.into()));
    }

    match Path::new(name).components().next_back() {
        Some(Component::Normal(last)) => last
            .to_str()
            .ok_or_else(|| TransferError::InvalidName(name.into())),
        _ => Err(TransferError::InvalidName(name.into())),
    }
}
