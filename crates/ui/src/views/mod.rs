mod assessment;
mod dashboard;
mod guard;
mod home;
mod login;
mod register;
mod state;
mod unauthorized;

#[cfg(test)]
mod test_harness;
#[cfg(test)]
mod view_smoke;

pub use assessment::AssessmentView;
pub use dashboard::DashboardView;
pub use guard::Guarded;
pub use home::HomeView;
pub use login::LoginView;
pub use register::RegisterView;
pub use state::{ViewError, ViewState, view_state_from_resource};
pub use unauthorized::UnauthorizedView;
