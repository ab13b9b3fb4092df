mod attempt_vm;
mod dashboard_vm;
mod login_vm;
mod question_form_vm;
mod register_vm;
mod time_fmt;

pub use attempt_vm::{
    AttemptCommand, AttemptScreen, CERTIFICATION_TITLE, CertificationVm, LOADING_QUESTIONS,
    NO_QUESTIONS, OptionVm, QuestionVm, attempt_screen, failure_message, run_attempt,
};
pub use dashboard_vm::{BarVm, DashboardVm, QuestionRowVm, SessionRowVm, UserRowVm};
pub use login_vm::{INVALID_CREDENTIALS, LOGIN_FAILED, LoginErrorsVm};
pub use question_form_vm::{OPTION_SLOTS, QuestionFormVm, question_error_message};
pub use register_vm::{
    EMAIL_TAKEN, REGISTRATION_FAILED, RegisterErrorsVm, RegisterPage, StrengthVm,
};
pub use time_fmt::format_datetime;
