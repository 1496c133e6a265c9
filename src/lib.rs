// Courier - A typed, in-process command and query dispatcher
//
// Messages are routed by type to the single handler registered for them.
// Registrations are validated against declared contracts, and handler
// errors reach the caller unmodified.

// Re-export core functionality
pub use courier_core::*;

// Re-export logging configuration
pub use courier_log as log;

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        ActivatorInstanceProvider,
        BoxError,
        CancellationToken,
        CapabilitySet,
        Command,
        CommandHandler,
        CommandWithResult,
        CommandWithResultHandler,
        CqrsError,
        CqrsOptions,
        CqrsService,
        DelegatedInstanceProvider,
        Describe,
        HandlerModule,
        InstanceProvider,
        LocalInstanceProvider,
        Query,
        QueryHandler,
        Registrar,
        ServiceContainer,
        TypeDescriptor,
        async_trait,
    };
}
