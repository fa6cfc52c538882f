pub mod domain;
pub mod editor;
pub mod filter;
pub mod instance;
pub mod ports;
pub mod presets;
pub mod schema;
pub mod token;

pub use domain::{
    Attachment, Attachments, Constraints, FieldKey, FieldKind, FieldSpec, FieldValue,
    FormDefinition, FormValues, NormalizedRecord, PublishedForm, QuestionAnswer, QuestionId,
    QuestionSpec,
};
pub use editor::{EditorError, FormEditor};
pub use filter::{CandidateFilter, FilterError};
pub use instance::{
    FieldError, FormController, FormInstance, SubmissionFailure, SubmitError, ValidationFailure,
};
pub use ports::{
    ApplicationDirectory, FormPublishingService, PortError, PortResult, SubmissionService,
};
pub use schema::{compile, CompileError, FieldRules, Rule, Validator};
pub use token::{AddressToken, TokenError};
