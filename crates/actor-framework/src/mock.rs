//! # Mock Clients
//!
//! `MockClient<T>` hands out a real [`ResourceClient<T>`] whose requests are answered from
//! a queue of scripted expectations instead of a running actor. Code that talks to a
//! store through a typed client can be tested against it without spawning the store.
//!
//! | | MockClient | Real actor |
//! |---|---|---|
//! | State | none, scripted answers | real store semantics |
//! | Error injection | trivial (`return_err`) | needs specific state |
//! | Use for | workflows and client wrappers | the entity itself, end-to-end flows |
//!
//! ```rust
//! use actor_framework::mock::MockClient;
//! use actor_framework::{ActorEntity, FrameworkError};
//! use async_trait::async_trait;
//!
//! #[derive(Clone, Debug)] struct Shop { id: u32 }
//! #[derive(Debug)] struct ShopCreate;
//! #[derive(Debug)] struct ShopUpdate;
//! #[derive(Debug)] enum ShopAction {}
//! #[derive(Debug, thiserror::Error)] #[error("shop error")] struct ShopError;
//!
//! #[async_trait]
//! impl ActorEntity for Shop {
//!     type Id = u32; type Create = ShopCreate; type Update = ShopUpdate;
//!     type Action = ShopAction; type ActionResult = (); type Context = (); type Error = ShopError;
//!     fn from_create_params(id: u32, _: ShopCreate) -> Result<Self, Self::Error> { Ok(Self { id }) }
//!     async fn on_update(&mut self, _: ShopUpdate, _: &()) -> Result<(), Self::Error> { Ok(()) }
//!     async fn handle_action(&mut self, _: ShopAction, _: &()) -> Result<(), Self::Error> { Ok(()) }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut mock = MockClient::<Shop>::new();
//!     mock.expect_find_by_key("my-shop").return_ok(Some(Shop { id: 7 }));
//!     mock.expect_create().return_err(FrameworkError::Conflict("my-shop".into()));
//!
//!     let client = mock.client();
//!     assert_eq!(client.find_by_key("my-shop").await.unwrap().unwrap().id, 7);
//!     assert!(matches!(client.create(ShopCreate).await, Err(FrameworkError::Conflict(_))));
//!     mock.verify();
//! }
//! ```
//!
//! For finer control (inspecting the exact payload a workflow sent) use
//! [`create_mock_client`] together with the `expect_*` receiver helpers.

use crate::client::ResourceClient;
use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use crate::message::{ResourceRequest, Response};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

/// A scripted answer for the next request of a given kind.
enum Expectation<T: ActorEntity> {
    Get(Result<Option<T>, FrameworkError>),
    FindByKey(Result<Option<T>, FrameworkError>),
    List(Result<Vec<T>, FrameworkError>),
    Create(Result<T::Id, FrameworkError>),
    Update(Result<T, FrameworkError>),
    Delete(Result<(), FrameworkError>),
    Action(Result<T::ActionResult, FrameworkError>),
}

impl<T: ActorEntity> Expectation<T> {
    fn kind(&self) -> &'static str {
        match self {
            Expectation::Get(_) => "get",
            Expectation::FindByKey(_) => "find_by_key",
            Expectation::List(_) => "list",
            Expectation::Create(_) => "create",
            Expectation::Update(_) => "update",
            Expectation::Delete(_) => "delete",
            Expectation::Action(_) => "action",
        }
    }
}

fn request_kind<T: ActorEntity>(request: &ResourceRequest<T>) -> &'static str {
    match request {
        ResourceRequest::Get { .. } => "get",
        ResourceRequest::FindByKey { .. } => "find_by_key",
        ResourceRequest::List { .. } => "list",
        ResourceRequest::Create { .. } => "create",
        ResourceRequest::Update { .. } => "update",
        ResourceRequest::Delete { .. } => "delete",
        ResourceRequest::Action { .. } => "action",
    }
}

type Queue<T> = Arc<Mutex<VecDeque<Expectation<T>>>>;

/// A mock client answering requests from a FIFO of expectations.
///
/// A request that does not match the next expectation is recorded and its response
/// channel dropped, so the caller sees [`FrameworkError::ActorDropped`];
/// [`MockClient::verify`] then fails the test.
pub struct MockClient<T: ActorEntity> {
    client: ResourceClient<T>,
    expectations: Queue<T>,
    mismatches: Arc<Mutex<Vec<String>>>,
    _handle: tokio::task::JoinHandle<()>,
}

impl<T: ActorEntity> Default for MockClient<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn answer<R>(respond_to: Response<R>, response: Result<R, FrameworkError>) {
    let _ = respond_to.send(response);
}

impl<T: ActorEntity> MockClient<T> {
    /// Creates a new mock client with no expectations.
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::channel::<ResourceRequest<T>>(100);
        let expectations: Queue<T> = Arc::new(Mutex::new(VecDeque::new()));
        let mismatches = Arc::new(Mutex::new(Vec::new()));
        let queue = expectations.clone();
        let errors = mismatches.clone();

        let handle = tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                let next = queue.lock().map(|mut q| q.pop_front()).unwrap_or(None);

                match (request, next) {
                    (ResourceRequest::Get { respond_to, .. }, Some(Expectation::Get(r))) => {
                        answer(respond_to, r)
                    }
                    (
                        ResourceRequest::FindByKey { respond_to, .. },
                        Some(Expectation::FindByKey(r)),
                    ) => answer(respond_to, r),
                    (ResourceRequest::List { respond_to }, Some(Expectation::List(r))) => {
                        answer(respond_to, r)
                    }
                    (ResourceRequest::Create { respond_to, .. }, Some(Expectation::Create(r))) => {
                        answer(respond_to, r)
                    }
                    (ResourceRequest::Update { respond_to, .. }, Some(Expectation::Update(r))) => {
                        answer(respond_to, r)
                    }
                    (ResourceRequest::Delete { respond_to, .. }, Some(Expectation::Delete(r))) => {
                        answer(respond_to, r)
                    }
                    (ResourceRequest::Action { respond_to, .. }, Some(Expectation::Action(r))) => {
                        answer(respond_to, r)
                    }
                    (request, expected) => {
                        let expected = expected.map(|e| e.kind()).unwrap_or("nothing");
                        if let Ok(mut errors) = errors.lock() {
                            errors.push(format!(
                                "expected {expected}, got {}",
                                request_kind(&request)
                            ));
                        }
                    }
                }
            }
        });

        Self {
            client: ResourceClient::new(sender),
            expectations,
            mismatches,
            _handle: handle,
        }
    }

    /// Returns the client for use in tests.
    pub fn client(&self) -> ResourceClient<T> {
        self.client.clone()
    }

    fn builder(&self) -> ExpectationBuilder<T> {
        ExpectationBuilder {
            expectations: self.expectations.clone(),
        }
    }

    /// Expects a `get` operation.
    pub fn expect_get(&mut self, _id: T::Id) -> GetExpectation<T> {
        GetExpectation(self.builder())
    }

    /// Expects a `find_by_key` operation.
    pub fn expect_find_by_key(&mut self, _key: &str) -> FindByKeyExpectation<T> {
        FindByKeyExpectation(self.builder())
    }

    /// Expects a `list` operation.
    pub fn expect_list(&mut self) -> ListExpectation<T> {
        ListExpectation(self.builder())
    }

    /// Expects a `create` operation.
    pub fn expect_create(&mut self) -> CreateExpectation<T> {
        CreateExpectation(self.builder())
    }

    /// Expects an `update` operation.
    pub fn expect_update(&mut self, _id: T::Id) -> UpdateExpectation<T> {
        UpdateExpectation(self.builder())
    }

    /// Expects a `delete` operation.
    pub fn expect_delete(&mut self, _id: T::Id) -> DeleteExpectation<T> {
        DeleteExpectation(self.builder())
    }

    /// Expects an `action` operation.
    pub fn expect_action(&mut self, _id: T::Id) -> ActionExpectation<T> {
        ActionExpectation(self.builder())
    }

    /// Panics if an expectation was left unused or a request did not match.
    pub fn verify(&self) {
        let mismatches = self.mismatches.lock().map(|m| m.clone()).unwrap_or_default();
        if !mismatches.is_empty() {
            panic!("Unexpected requests: {}", mismatches.join("; "));
        }
        let remaining = self.expectations.lock().map(|q| q.len()).unwrap_or(0);
        if remaining > 0 {
            panic!("Not all expectations were met. {remaining} remaining");
        }
    }
}

struct ExpectationBuilder<T: ActorEntity> {
    expectations: Queue<T>,
}

impl<T: ActorEntity> ExpectationBuilder<T> {
    fn push(self, expectation: Expectation<T>) {
        if let Ok(mut queue) = self.expectations.lock() {
            queue.push_back(expectation);
        }
    }
}

macro_rules! expectation_builder {
    ($(#[$doc:meta])* $name:ident, $variant:ident, $ok:ty) => {
        $(#[$doc])*
        pub struct $name<T: ActorEntity>(ExpectationBuilder<T>);

        impl<T: ActorEntity> $name<T> {
            /// Answers the request successfully with `value`.
            pub fn return_ok(self, value: $ok) {
                self.0.push(Expectation::$variant(Ok(value)));
            }

            /// Answers the request with `error`.
            pub fn return_err(self, error: FrameworkError) {
                self.0.push(Expectation::$variant(Err(error)));
            }
        }
    };
}

expectation_builder!(
    /// Builder for `get` expectations.
    GetExpectation, Get, Option<T>
);
expectation_builder!(
    /// Builder for `find_by_key` expectations.
    FindByKeyExpectation, FindByKey, Option<T>
);
expectation_builder!(
    /// Builder for `list` expectations.
    ListExpectation, List, Vec<T>
);
expectation_builder!(
    /// Builder for `create` expectations.
    CreateExpectation, Create, T::Id
);
expectation_builder!(
    /// Builder for `update` expectations.
    UpdateExpectation, Update, T
);
expectation_builder!(
    /// Builder for `delete` expectations.
    DeleteExpectation, Delete, ()
);
expectation_builder!(
    /// Builder for `action` expectations.
    ActionExpectation, Action, T::ActionResult
);

// =============================================================================
// RECEIVER HELPERS
// =============================================================================

/// Creates a client whose requests land on the returned receiver, so a test can
/// inspect each payload and answer it by hand.
pub fn create_mock_client<T: ActorEntity>(
    buffer_size: usize,
) -> (ResourceClient<T>, mpsc::Receiver<ResourceRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ResourceClient::new(sender), receiver)
}

/// Receives the next request, expecting a `Create`.
pub async fn expect_create<T: ActorEntity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Create, Response<T::Id>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Create { params, respond_to }) => Some((params, respond_to)),
        _ => None,
    }
}

/// Receives the next request, expecting a `Get`.
pub async fn expect_get<T: ActorEntity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, Response<Option<T>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Get { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Receives the next request, expecting a `FindByKey`.
pub async fn expect_find_by_key<T: ActorEntity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(String, Response<Option<T>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::FindByKey { key, respond_to }) => Some((key, respond_to)),
        _ => None,
    }
}

/// Receives the next request, expecting an `Action`.
pub async fn expect_action<T: ActorEntity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, T::Action, Response<T::ActionResult>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Action {
            id,
            action,
            respond_to,
        }) => Some((id, action, respond_to)),
        _ => None,
    }
}
