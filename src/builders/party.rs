use chrono::{DateTime, Utc};

use crate::normalize::{canonical_address, display_name};
use crate::types::{DeletedState, Party, PartyRole};

/// Build a sender/recipient/cc/bcc entry from a raw address column.
///
/// `delivered` is the message's already-decoded `date`; `name_candidate` is a
/// separately stored name, used only when it looks like an address.
pub fn build_party(
    raw: Option<&str>,
    delivered: Option<DateTime<Utc>>,
    name_candidate: Option<&str>,
    role: PartyRole,
) -> Party {
    Party {
        identifier: canonical_address(raw),
        name: display_name(raw, name_candidate),
        role,
        date_delivered: delivered,
        deleted: DeletedState::Intact,
    }
}
