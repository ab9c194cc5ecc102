use crate::{
    error::Error,
    objects::{Account, Page, Profile},
    store::{SearchFilter, Store},
};

/// Lists other accounts. A term containing `@` matches an email exactly,
/// anything else matches first or last names case-insensitively.
pub async fn search(
    store: &dyn Store,
    caller: &Account,
    term: Option<&str>,
    page: Page,
) -> Result<Vec<Profile>, Error> {
    let filter = SearchFilter::from_term(term);

    let profiles = store.search_accounts(caller.id, &filter, page).await?;

    page.check(profiles)
}
