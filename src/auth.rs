use subtle::ConstantTimeEq;

use pharmledger_core::{LedgerStore, StorageError, ADMIN_PASSWORD_KEY};

/// Compares a submitted password with the expected one in constant time.
pub fn passwords_match(submitted: &str, expected: &str) -> bool {
    submitted.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// The password admin actions are checked against: the one stored by setup,
/// or `fallback` while setup has not run.
pub fn effective_admin_password(
    store: &dyn LedgerStore,
    fallback: &str,
) -> Result<String, StorageError> {
    Ok(store
        .get_setting(ADMIN_PASSWORD_KEY)?
        .unwrap_or_else(|| fallback.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pharmledger_memory::InMemoryStorage;

    #[test]
    fn matching_requires_exact_bytes() {
        assert!(passwords_match("1234", "1234"));
        assert!(!passwords_match("1234 ", "1234"));
        assert!(!passwords_match("", "1234"));
    }

    #[test]
    fn stored_password_replaces_fallback() {
        let store = InMemoryStorage::new();
        assert_eq!(effective_admin_password(&store, "1234").unwrap(), "1234");

        store.set_setting(ADMIN_PASSWORD_KEY, "owner-pw").unwrap();
        assert_eq!(effective_admin_password(&store, "1234").unwrap(), "owner-pw");
    }
}
