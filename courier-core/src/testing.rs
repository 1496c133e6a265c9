//! Shared fixtures for unit tests

use crate::describe::{CapabilitySet, Describe};
use crate::error::BoxError;
use crate::handler::{CommandHandler, CommandWithResultHandler, QueryHandler};
use crate::message::{Command, CommandWithResult, Query};
use async_trait::async_trait;
use std::fmt;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(pub String);

#[derive(Debug)]
pub struct UserNotFound(pub String);

impl fmt::Display for UserNotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user {} not found", self.0)
    }
}

impl std::error::Error for UserNotFound {}

// Messages

pub struct CreateUser {
    pub name: String,
}

impl Command for CreateUser {}
impl CommandWithResult<UserId> for CreateUser {}

impl Describe for CreateUser {
    fn describe(set: &mut CapabilitySet<Self>) {
        set.command_with_result::<UserId>();
    }
}

pub struct DeleteUser {
    pub id: String,
}

impl Command for DeleteUser {}

impl Describe for DeleteUser {
    fn describe(set: &mut CapabilitySet<Self>) {
        set.command();
    }
}

pub struct Rename {
    pub id: String,
}

impl Command for Rename {}
impl CommandWithResult<Option<String>> for Rename {}

impl Describe for Rename {
    fn describe(set: &mut CapabilitySet<Self>) {
        set.command_with_optional_result::<String>();
    }
}

/// Declares an `Option` result without marking it optional.
pub struct Touch;

impl Command for Touch {}
impl CommandWithResult<Option<String>> for Touch {}

impl Describe for Touch {
    fn describe(set: &mut CapabilitySet<Self>) {
        set.command_with_result::<Option<String>>();
    }
}

pub struct Peek;

impl Query<Option<String>> for Peek {}

impl Describe for Peek {
    fn describe(set: &mut CapabilitySet<Self>) {
        set.query::<Option<String>>();
    }
}

pub struct GetUser {
    pub id: String,
}

impl Query<User> for GetUser {}

impl Describe for GetUser {
    fn describe(set: &mut CapabilitySet<Self>) {
        set.query::<User>();
    }
}

pub struct FindUser {
    pub id: String,
}

impl Query<Option<User>> for FindUser {}

impl Describe for FindUser {
    fn describe(set: &mut CapabilitySet<Self>) {
        set.optional_query::<User>();
    }
}

pub struct IsCancelled;

impl Query<bool> for IsCancelled {}

impl Describe for IsCancelled {
    fn describe(set: &mut CapabilitySet<Self>) {
        set.query::<bool>();
    }
}

pub struct TwoAnswers;

impl Query<u32> for TwoAnswers {}
impl Query<String> for TwoAnswers {}

impl Describe for TwoAnswers {
    fn describe(set: &mut CapabilitySet<Self>) {
        set.query::<u32>().query::<String>();
    }
}

// Handlers

#[derive(Default)]
pub struct CreateUserHandler;

#[async_trait]
impl CommandWithResultHandler<CreateUser, UserId> for CreateUserHandler {
    type Error = BoxError;

    async fn handle(&self, command: CreateUser, _: Option<CancellationToken>) -> Result<UserId, BoxError> {
        Ok(UserId(format!("user-{}", command.name)))
    }
}

impl Describe for CreateUserHandler {
    fn describe(set: &mut CapabilitySet<Self>) {
        set.command_with_result_handler::<CreateUser, UserId>()
            .default_constructible();
    }
}

#[derive(Default)]
pub struct DeleteUserHandler;

#[async_trait]
impl CommandHandler<DeleteUser> for DeleteUserHandler {
    type Error = BoxError;

    async fn handle(&self, command: DeleteUser, _: Option<CancellationToken>) -> Result<(), BoxError> {
        if command.id.is_empty() {
            return Err("empty user id".into());
        }
        Ok(())
    }
}

impl Describe for DeleteUserHandler {
    fn describe(set: &mut CapabilitySet<Self>) {
        set.command_handler::<DeleteUser>().default_constructible();
    }
}

/// Declares a command contract but no construction path.
pub struct NoConstructorHandler;

#[async_trait]
impl CommandHandler<DeleteUser> for NoConstructorHandler {
    type Error = BoxError;

    async fn handle(&self, _: DeleteUser, _: Option<CancellationToken>) -> Result<(), BoxError> {
        Ok(())
    }
}

impl Describe for NoConstructorHandler {
    fn describe(set: &mut CapabilitySet<Self>) {
        set.command_handler::<DeleteUser>();
    }
}

pub struct FailingConstructorHandler;

#[async_trait]
impl CommandHandler<DeleteUser> for FailingConstructorHandler {
    type Error = BoxError;

    async fn handle(&self, _: DeleteUser, _: Option<CancellationToken>) -> Result<(), BoxError> {
        Ok(())
    }
}

impl Describe for FailingConstructorHandler {
    fn describe(set: &mut CapabilitySet<Self>) {
        set.command_handler::<DeleteUser>().constructor(|| None);
    }
}

/// Plain handler for commands that declare a result.
#[derive(Default)]
pub struct SilentCreateHandler;

#[async_trait]
impl CommandHandler<CreateUser> for SilentCreateHandler {
    type Error = BoxError;

    async fn handle(&self, _: CreateUser, _: Option<CancellationToken>) -> Result<(), BoxError> {
        Ok(())
    }
}

impl Describe for SilentCreateHandler {
    fn describe(set: &mut CapabilitySet<Self>) {
        set.command_handler::<CreateUser>().default_constructible();
    }
}

#[derive(Default)]
pub struct SilentRenameHandler;

#[async_trait]
impl CommandHandler<Rename> for SilentRenameHandler {
    type Error = BoxError;

    async fn handle(&self, command: Rename, _: Option<CancellationToken>) -> Result<(), BoxError> {
        if command.id.is_empty() {
            return Err("empty user id".into());
        }
        Ok(())
    }
}

impl Describe for SilentRenameHandler {
    fn describe(set: &mut CapabilitySet<Self>) {
        set.command_handler::<Rename>().default_constructible();
    }
}

#[derive(Default)]
pub struct SilentTouchHandler;

#[async_trait]
impl CommandHandler<Touch> for SilentTouchHandler {
    type Error = BoxError;

    async fn handle(&self, _: Touch, _: Option<CancellationToken>) -> Result<(), BoxError> {
        Ok(())
    }
}

impl Describe for SilentTouchHandler {
    fn describe(set: &mut CapabilitySet<Self>) {
        set.command_handler::<Touch>().default_constructible();
    }
}

pub struct GetUserHandler;

#[async_trait]
impl QueryHandler<GetUser, User> for GetUserHandler {
    type Error = UserNotFound;

    async fn handle(&self, query: GetUser, _: Option<CancellationToken>) -> Result<User, UserNotFound> {
        if query.id == "u1" {
            Ok(User {
                id: query.id,
                name: "ada".into(),
            })
        } else {
            Err(UserNotFound(query.id))
        }
    }
}

impl Describe for GetUserHandler {
    fn describe(set: &mut CapabilitySet<Self>) {
        set.query_handler::<GetUser, User>()
            .constructor(|| Some(GetUserHandler));
    }
}

#[derive(Default)]
pub struct FindUserHandler;

#[async_trait]
impl QueryHandler<FindUser, Option<User>> for FindUserHandler {
    type Error = BoxError;

    async fn handle(
        &self,
        query: FindUser,
        _: Option<CancellationToken>,
    ) -> Result<Option<User>, BoxError> {
        Ok((query.id == "u1").then(|| User {
            id: query.id,
            name: "ada".into(),
        }))
    }
}

impl Describe for FindUserHandler {
    fn describe(set: &mut CapabilitySet<Self>) {
        set.query_handler::<FindUser, Option<User>>()
            .default_constructible();
    }
}

#[derive(Default)]
pub struct IsCancelledHandler;

#[async_trait]
impl QueryHandler<IsCancelled, bool> for IsCancelledHandler {
    type Error = BoxError;

    async fn handle(
        &self,
        _: IsCancelled,
        cancellation: Option<CancellationToken>,
    ) -> Result<bool, BoxError> {
        Ok(cancellation.is_some_and(|token| token.is_cancelled()))
    }
}

impl Describe for IsCancelledHandler {
    fn describe(set: &mut CapabilitySet<Self>) {
        set.query_handler::<IsCancelled, bool>().default_constructible();
    }
}

pub struct TwoAnswersHandler;

#[async_trait]
impl QueryHandler<TwoAnswers, u32> for TwoAnswersHandler {
    type Error = BoxError;

    async fn handle(&self, _: TwoAnswers, _: Option<CancellationToken>) -> Result<u32, BoxError> {
        Ok(42)
    }
}

impl Describe for TwoAnswersHandler {
    fn describe(set: &mut CapabilitySet<Self>) {
        set.query_handler::<TwoAnswers, u32>();
    }
}

/// Abstract lookup behind a trait object.
pub trait UserDirectory: Send + Sync {
    fn lookup(&self, id: &str) -> Option<User>;
}

pub type DirectoryHandler = Box<dyn UserDirectory>;

#[async_trait]
impl QueryHandler<FindUser, Option<User>> for Box<dyn UserDirectory> {
    type Error = BoxError;

    async fn handle(
        &self,
        query: FindUser,
        _: Option<CancellationToken>,
    ) -> Result<Option<User>, BoxError> {
        Ok(self.lookup(&query.id))
    }
}

impl Describe for Box<dyn UserDirectory> {
    fn describe(set: &mut CapabilitySet<Self>) {
        set.query_handler::<FindUser, Option<User>>().abstract_type();
    }
}

pub struct StaticDirectory;

impl UserDirectory for StaticDirectory {
    fn lookup(&self, id: &str) -> Option<User> {
        (id == "u1").then(|| User {
            id: id.to_string(),
            name: "from directory".into(),
        })
    }
}
