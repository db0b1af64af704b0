//! Keeping page-local collections in line with the server after a mutation.
//!
//! Every create/update/delete/toggle goes through the same two steps:
//!
//! 1. send the mutating request and wait for it to complete;
//! 2. only if it succeeded, reconcile the local view: either re-request the whole collection
//!    or replace/remove/prepend exactly the one affected element, matched by id.
//!
//! If step 1 fails nothing local changes except the recorded error. Fields of an element are
//! never merged piecemeal: the element is replaced wholesale by what the server returned (or
//! what the confirmed mutation must have produced).
//!
//! Toggles (like, subscribe) live in [`ToggleState`] and follow the same rule: the flip is
//! applied after the server confirms, never before.

use crate::api::ApiError;
use std::future::Future;

/// Anything that can be matched by its server identifier.
pub trait Identified {
    fn id(&self) -> &str;
}

/// How to bring a [`ListView`] up to date after a successful mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation<T> {
    /// Re-request the whole collection.
    Refetch,
    /// Replace the element with the same id.
    Replace(T),
    /// Remove the element with this id.
    Remove(String),
    /// Insert a new element at the front.
    Prepend(T),
    /// The mutation has no visible effect on the collection.
    Keep,
}

/// A collection fetched from the server plus its loading and error state.
#[derive(Debug, Clone, PartialEq)]
pub struct ListView<T> {
    items: Vec<T>,
    loading: bool,
    error: Option<String>,
}

impl<T> Default for ListView<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            error: None,
        }
    }
}

impl<T: Identified> ListView<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Message of the most recent failure, for display.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn replace_all(&mut self, items: Vec<T>) {
        self.items = items;
    }

    /// Replaces the element with the same id as `item`.
    ///
    /// Returns `false`, leaving the list untouched, if no such element is present.
    pub fn replace_by_id(&mut self, item: T) -> bool {
        match self.items.iter_mut().find(|existing| existing.id() == item.id()) {
            Some(slot) => {
                *slot = item;
                true
            }
            None => false,
        }
    }

    /// Removes the element with the given id, if present.
    pub fn remove_by_id(&mut self, id: &str) -> Option<T> {
        let index = self.items.iter().position(|item| item.id() == id)?;
        Some(self.items.remove(index))
    }

    pub fn prepend(&mut self, item: T) {
        self.items.insert(0, item);
    }

    /// Loads the whole collection.
    ///
    /// On failure the previous items are kept and the error is recorded.
    pub async fn load<F>(&mut self, fetch: F) -> bool
    where
        F: Future<Output = Result<Vec<T>, ApiError>>,
    {
        self.loading = true;
        let result = fetch.await;
        self.loading = false;
        match result {
            Ok(items) => {
                self.items = items;
                self.error = None;
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load collection");
                self.error = Some(e.message);
                false
            }
        }
    }

    fn apply(&mut self, reconciliation: Reconciliation<T>) {
        match reconciliation {
            Reconciliation::Refetch | Reconciliation::Keep => {}
            Reconciliation::Replace(item) => {
                let id = item.id().to_string();
                if !self.replace_by_id(item) {
                    tracing::debug!(id, "replaced element is no longer displayed");
                }
            }
            Reconciliation::Remove(id) => {
                self.remove_by_id(&id);
            }
            Reconciliation::Prepend(item) => self.prepend(item),
        }
    }
}

/// Runs `mutation` and, if it succeeds, reconciles `view`.
///
/// `reconcile` sees the mutation's response and the items as they are when the response
/// arrives, and picks a [`Reconciliation`]. `refetch` is only called for
/// [`Reconciliation::Refetch`]; if it fails the stale list stays and the error is recorded.
///
/// # Returns
///
/// Whether the mutation itself succeeded. A failed mutation leaves the items untouched.
pub async fn mutate_then_reconcile<T, R, M>(
    view: &mut ListView<T>,
    mutation: M,
    reconcile: impl FnOnce(R, &[T]) -> Reconciliation<T>,
    refetch: impl AsyncFnOnce() -> Result<Vec<T>, ApiError>,
) -> bool
where
    T: Identified,
    M: Future<Output = Result<R, ApiError>>,
{
    let response = match mutation.await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(error = %e, "mutation failed, leaving view unchanged");
            view.error = Some(e.message);
            return false;
        }
    };
    view.error = None;

    let reconciliation = reconcile(response, view.items());
    if matches!(reconciliation, Reconciliation::Refetch) {
        view.load(refetch()).await;
    } else {
        view.apply(reconciliation);
    }
    true
}

/// A binary, server-confirmed state with an optional paired counter, e.g. liked + like count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToggleState {
    pub active: bool,
    pub count: u64,
}

impl ToggleState {
    pub fn new(active: bool, count: u64) -> Self {
        Self { active, count }
    }

    /// Applies a toggle the server has confirmed.
    ///
    /// When the server reported the resulting state it is taken as is; otherwise the state as
    /// of now is flipped. The counter moves by exactly one, and only if the state changed. It
    /// never goes below zero.
    ///
    /// Returns whether the state changed.
    pub fn confirm(&mut self, reported: Option<bool>) -> bool {
        let next = reported.unwrap_or(!self.active);
        if next == self.active {
            return false;
        }
        self.active = next;
        self.count = if next {
            self.count.saturating_add(1)
        } else {
            self.count.saturating_sub(1)
        };
        true
    }

    /// Sends a toggle request and applies it once confirmed.
    ///
    /// On failure the state is left exactly as it was.
    pub async fn toggle<M>(&mut self, mutation: M) -> Result<(), ApiError>
    where
        M: Future<Output = Result<Option<bool>, ApiError>>,
    {
        let reported = mutation.await?;
        self.confirm(reported);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: &'static str,
        text: &'static str,
    }

    impl Identified for Item {
        fn id(&self) -> &str {
            self.id
        }
    }

    fn item(id: &'static str, text: &'static str) -> Item {
        Item { id, text }
    }

    fn view(items: &[Item]) -> ListView<Item> {
        let mut view = ListView::new();
        view.replace_all(items.to_vec());
        view
    }

    fn failure() -> ApiError {
        ApiError {
            status: Some(500),
            message: "boom".into(),
        }
    }

    async fn no_refetch() -> Result<Vec<Item>, ApiError> {
        panic!("refetch should not be called")
    }

    #[tokio::test]
    async fn failed_mutation_changes_nothing_but_the_error() {
        let mut list = view(&[item("a", "1"), item("b", "2")]);
        let ok = mutate_then_reconcile(
            &mut list,
            async { Err::<(), _>(failure()) },
            |_, _| Reconciliation::Remove("a".into()),
            no_refetch,
        )
        .await;
        assert!(!ok);
        assert_eq!(list.items(), &[item("a", "1"), item("b", "2")]);
        assert_eq!(list.error(), Some("boom"));
    }

    #[tokio::test]
    async fn remove_touches_only_the_matching_element() {
        let mut list = view(&[item("a", "1"), item("b", "2"), item("c", "3")]);
        let ok = mutate_then_reconcile(
            &mut list,
            async { Ok::<_, ApiError>(()) },
            |_, _| Reconciliation::Remove("b".into()),
            no_refetch,
        )
        .await;
        assert!(ok);
        assert_eq!(list.items(), &[item("a", "1"), item("c", "3")]);
    }

    #[tokio::test]
    async fn replace_swaps_the_whole_element() {
        let mut list = view(&[item("a", "1"), item("b", "2")]);
        mutate_then_reconcile(
            &mut list,
            async { Ok::<_, ApiError>(item("b", "edited")) },
            |updated, _| Reconciliation::Replace(updated),
            no_refetch,
        )
        .await;
        assert_eq!(list.items(), &[item("a", "1"), item("b", "edited")]);
    }

    #[tokio::test]
    async fn prepend_puts_new_element_first() {
        let mut list = view(&[item("a", "1")]);
        mutate_then_reconcile(
            &mut list,
            async { Ok::<_, ApiError>(item("z", "new")) },
            |created, _| Reconciliation::Prepend(created),
            no_refetch,
        )
        .await;
        assert_eq!(list.items(), &[item("z", "new"), item("a", "1")]);
    }

    #[tokio::test]
    async fn refetch_replaces_the_list() {
        let mut list = view(&[item("a", "1")]);
        let ok = mutate_then_reconcile(
            &mut list,
            async { Ok::<_, ApiError>(()) },
            |_, _| Reconciliation::Refetch,
            async || Ok::<_, ApiError>(vec![item("a", "1"), item("b", "2")]),
        )
        .await;
        assert!(ok);
        assert_eq!(list.len(), 2);
        assert_eq!(list.error(), None);
    }

    #[tokio::test]
    async fn failed_refetch_keeps_stale_list() {
        let mut list = view(&[item("a", "1")]);
        let ok = mutate_then_reconcile(
            &mut list,
            async { Ok::<_, ApiError>(()) },
            |_, _| Reconciliation::Refetch,
            async || Err::<Vec<Item>, _>(failure()),
        )
        .await;
        assert!(ok, "the mutation itself went through");
        assert_eq!(list.items(), &[item("a", "1")]);
        assert_eq!(list.error(), Some("boom"));
    }

    #[test]
    fn confirm_flips_once_and_moves_counter_by_one() {
        let mut liked = ToggleState::new(false, 4);
        assert!(liked.confirm(None));
        assert_eq!(liked, ToggleState::new(true, 5));
        assert!(liked.confirm(None));
        assert_eq!(liked, ToggleState::new(false, 4));
    }

    #[test]
    fn confirm_trusts_reported_state() {
        let mut liked = ToggleState::new(true, 4);
        // the server says we already ended up liked, e.g. after a double click
        assert!(!liked.confirm(Some(true)));
        assert_eq!(liked, ToggleState::new(true, 4));
        assert!(liked.confirm(Some(false)));
        assert_eq!(liked, ToggleState::new(false, 3));
    }

    #[test]
    fn counter_never_underflows() {
        let mut subscribed = ToggleState::new(true, 0);
        subscribed.confirm(None);
        assert_eq!(subscribed, ToggleState::new(false, 0));
    }

    #[tokio::test]
    async fn failed_toggle_leaves_state_alone() {
        let mut liked = ToggleState::new(false, 10);
        let result = liked.toggle(async { Err(failure()) }).await;
        assert!(result.is_err());
        assert_eq!(liked, ToggleState::new(false, 10));
    }
}
