use std::rc::Rc;

use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::services::query::{Query, QueryClient, QueryState};

/// What a component gets back from [`use_query`].
pub struct QueryHandle<T> {
    pub data: Option<Rc<T>>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub refetch: Callback<()>,
}

impl<T> QueryHandle<T> {
    /// Nothing to show yet: no data and no error.
    pub fn is_pending(&self) -> bool {
        self.data.is_none() && self.error.is_none()
    }
}

impl<T> Clone for QueryHandle<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            is_loading: self.is_loading,
            error: self.error.clone(),
            refetch: self.refetch.clone(),
        }
    }
}

impl<T: PartialEq> PartialEq for QueryHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
            && self.is_loading == other.is_loading
            && self.error == other.error
            && self.refetch == other.refetch
    }
}

impl<T> From<(QueryState<T>, Callback<()>)> for QueryHandle<T> {
    fn from((state, refetch): (QueryState<T>, Callback<()>)) -> Self {
        Self {
            error: state.error_message(),
            data: state.data,
            is_loading: state.is_loading,
            refetch,
        }
    }
}

/// Subscribes the component to `query` and fetches it when it is absent or stale.
///
/// Fetching starts when the component mounts and whenever the key changes.
/// Window focus never triggers a refetch. Unmounting drops the
/// subscription; a fetch already running completes and fills the cache.
#[hook]
pub fn use_query<T>(client: QueryClient, query: Query<T>) -> QueryHandle<T>
where
    T: 'static,
{
    let force_update = use_force_update();

    {
        let query = query.clone();
        use_effect_with(
            (query.key().clone(), client.clone()),
            move |(_, client)| {
                let subscription =
                    client.subscribe(query.key(), move || force_update.force_update());

                let client = client.clone();
                spawn_local(async move {
                    // failures are recorded in the cache and read back below
                    let _ = client.fetch(&query).await;
                });

                move || drop(subscription)
            },
        );
    }

    let refetch = {
        let client = client.clone();
        let query = query.clone();
        Callback::from(move |()| {
            let client = client.clone();
            let query = query.clone();
            spawn_local(async move {
                let _ = client.refetch(&query).await;
            });
        })
    };

    QueryHandle::from((client.snapshot(&query), refetch))
}
