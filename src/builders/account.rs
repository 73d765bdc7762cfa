use crate::errors::AppResult;
use crate::normalize::TimestampGuard;
use crate::types::{Account, DeletedState};

#[derive(Clone, Debug, Default)]
pub struct AccountParts<'a> {
    pub username: Option<&'a str>,
    pub service_type: &'a str,
    pub created_at: Option<&'a str>,
    pub name: Option<&'a str>,
    pub source: Option<&'a str>,
}

pub fn build_account(parts: AccountParts<'_>, timestamps: &mut TimestampGuard) -> AppResult<Account> {
    Ok(Account {
        username: parts.username.map(str::to_string),
        service_type: parts.service_type.to_string(),
        time_created: timestamps.entry_date("account.time_created", parts.created_at)?,
        name: parts.name.unwrap_or_default().to_string(),
        source: parts.source.map(str::to_string),
        deleted: DeletedState::Intact,
    })
}
