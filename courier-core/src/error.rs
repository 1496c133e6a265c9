// Error types for the dispatch core

use crate::token::TypeToken;
use thiserror::Error;

/// Error channel of every dispatch call.
///
/// Core failures arrive as a boxed [`CqrsError`]; handler failures arrive as
/// the handler's own error value, boxed once and never wrapped, so callers can
/// `downcast_ref` to the type the handler produced.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failures raised by the registration, resolution, instantiation and
/// post-processing stages.
#[derive(Error, Debug)]
pub enum CqrsError {
    // Contract-shape errors (registration time)
    #[error("{message} does not implement Command")]
    NotCommand { message: TypeToken },

    #[error("{message} does not implement Query<_>")]
    NotQuery { message: TypeToken },

    #[error("{ty} implements {contract} more than once ({})", join(.candidates))]
    AmbiguousContract {
        ty: TypeToken,
        contract: &'static str,
        candidates: Vec<TypeToken>,
    },

    #[error("{handler} does not implement {}", command_handler_contract(.message, .result))]
    NotCommandHandler {
        handler: TypeToken,
        message: Option<TypeToken>,
        result: Option<TypeToken>,
    },

    #[error("{message} declares result type {result} without marking it optional")]
    UnmarkedOptionalResult { message: TypeToken, result: TypeToken },

    #[error("{handler} does not implement QueryHandler<{message}, {result}>")]
    NotQueryHandler {
        handler: TypeToken,
        message: TypeToken,
        result: TypeToken,
    },

    // Resolution errors (dispatch time)
    #[error("No command handler registered for {message}")]
    CommandHandlerNotRegistered { message: TypeToken },

    #[error("No query handler registered for {message}")]
    QueryHandlerNotRegistered { message: TypeToken },

    // Instantiation errors
    #[error("Cannot create an instance of abstract handler type {handler}")]
    CannotInstantiateAbstract { handler: TypeToken },

    #[error("Failed to create an instance of {handler}: no default construction path produced a value")]
    ConstructionFailed { handler: TypeToken },

    #[error("{ty} is neither a command handler nor a query handler")]
    NotAHandler { ty: TypeToken },

    #[error("Factory for {ty} returned no instance")]
    FactoryReturnedNull { ty: TypeToken },

    #[error("No instance or factory registered for {handler}")]
    InstanceNotRegistered { handler: TypeToken },

    #[error("Unable to resolve {handler} from the host container: {source}")]
    UnregisteredDependency {
        handler: TypeToken,
        #[source]
        source: BoxError,
    },

    #[error("Instance supplied for {expected} is of a different type")]
    InstanceTypeMismatch { expected: TypeToken },

    #[error("Message routed to {handler} is not a {expected}")]
    MessageTypeMismatch {
        handler: TypeToken,
        expected: TypeToken,
    },

    // Post-processing errors
    #[error("Handler returned no value for non-nullable result type {result}")]
    NullHandlerResult { result: TypeToken },

    #[error("Handler produced a value that is not a {expected}")]
    ResultTypeMismatch { expected: TypeToken },
}

impl CqrsError {
    /// Configuration mistakes detected while registering a handler.
    pub fn is_registration_error(&self) -> bool {
        matches!(
            self,
            CqrsError::NotCommand { .. }
                | CqrsError::NotQuery { .. }
                | CqrsError::AmbiguousContract { .. }
                | CqrsError::UnmarkedOptionalResult { .. }
                | CqrsError::NotCommandHandler { .. }
                | CqrsError::NotQueryHandler { .. }
        )
    }

    /// Missing registry entries detected at dispatch time.
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            CqrsError::CommandHandlerNotRegistered { .. }
                | CqrsError::QueryHandlerNotRegistered { .. }
        )
    }

    /// Misconfiguration of an instance provider.
    pub fn is_instantiation_error(&self) -> bool {
        matches!(
            self,
            CqrsError::CannotInstantiateAbstract { .. }
                | CqrsError::ConstructionFailed { .. }
                | CqrsError::NotAHandler { .. }
                | CqrsError::FactoryReturnedNull { .. }
                | CqrsError::InstanceNotRegistered { .. }
                | CqrsError::UnregisteredDependency { .. }
                | CqrsError::InstanceTypeMismatch { .. }
        )
    }
}

fn command_handler_contract(message: &Option<TypeToken>, result: &Option<TypeToken>) -> String {
    match (message, result) {
        (Some(message), Some(result)) => format!("CommandHandler<{message}, {result}>"),
        (Some(message), None) => format!("CommandHandler<{message}>"),
        _ => "CommandHandler<_>".to_string(),
    }
}

fn join(tokens: &[TypeToken]) -> String {
    tokens
        .iter()
        .map(TypeToken::name)
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, CqrsError>;

#[cfg(test)]
mod tests {
    use super::*;

    struct CreateUser;
    struct CreateUserHandler;
    struct UserId;

    #[test]
    fn test_not_command_handler_messages() {
        let bare = CqrsError::NotCommandHandler {
            handler: TypeToken::of::<CreateUserHandler>(),
            message: None,
            result: None,
        };
        assert_eq!(
            bare.to_string(),
            "CreateUserHandler does not implement CommandHandler<_>"
        );

        let with_message = CqrsError::NotCommandHandler {
            handler: TypeToken::of::<CreateUserHandler>(),
            message: Some(TypeToken::of::<CreateUser>()),
            result: None,
        };
        assert_eq!(
            with_message.to_string(),
            "CreateUserHandler does not implement CommandHandler<CreateUser>"
        );

        let with_result = CqrsError::NotCommandHandler {
            handler: TypeToken::of::<CreateUserHandler>(),
            message: Some(TypeToken::of::<CreateUser>()),
            result: Some(TypeToken::of::<UserId>()),
        };
        assert_eq!(
            with_result.to_string(),
            "CreateUserHandler does not implement CommandHandler<CreateUser, UserId>"
        );
    }

    #[test]
    fn test_ambiguous_contract_lists_candidates() {
        let err = CqrsError::AmbiguousContract {
            ty: TypeToken::of::<CreateUser>(),
            contract: "Query<_>",
            candidates: vec![TypeToken::of::<UserId>(), TypeToken::of::<String>()],
        };
        assert_eq!(
            err.to_string(),
            "CreateUser implements Query<_> more than once (UserId, String)"
        );
    }

    #[test]
    fn test_categories() {
        let message = TypeToken::of::<CreateUser>();
        assert!(CqrsError::NotCommand { message }.is_registration_error());
        assert!(CqrsError::CommandHandlerNotRegistered { message }.is_resolution_error());
        assert!(CqrsError::FactoryReturnedNull { ty: message }.is_instantiation_error());

        let unmarked = CqrsError::UnmarkedOptionalResult {
            message,
            result: TypeToken::of::<Option<UserId>>(),
        };
        assert!(unmarked.is_registration_error());
        assert_eq!(
            unmarked.to_string(),
            "CreateUser declares result type Option<UserId> without marking it optional"
        );

        let null = CqrsError::NullHandlerResult { result: message };
        assert!(!null.is_registration_error());
        assert!(!null.is_resolution_error());
        assert!(!null.is_instantiation_error());
    }
}
