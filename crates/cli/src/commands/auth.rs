//! Login and logout commands.

use tracing::info;

use super::{CommandError, Session};

/// Log in with `token`, merging any guest cart into the account.
///
/// The token is stored even if the merge fails so later commands stay
/// logged in; a 401 logs out again and removes it.
///
/// # Errors
///
/// Returns an error if the merge is rejected with 401 or the follow-up
/// fetch fails.
pub async fn login(session: &Session, token: String) -> Result<(), CommandError> {
    session.auth.login(token);
    session.persist_identity()?;

    let snapshot = session.store.sync_identity().await?;
    info!(items = snapshot.item_count(), total = %snapshot.total, "Logged in");
    Ok(())
}

/// Forget the stored token.
///
/// # Errors
///
/// Returns an error if the token file cannot be removed.
pub fn logout(session: &Session) -> Result<(), CommandError> {
    use shopfront_cart::AuthStore as _;

    session.auth.logout();
    session.persist_identity()?;
    info!("Logged out");
    Ok(())
}
