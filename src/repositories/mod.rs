pub(crate) mod answers;
pub(crate) mod assignments;
pub(crate) mod attempts;
pub(crate) mod enrollments;
pub(crate) mod grades;
pub(crate) mod health;
pub(crate) mod notifications;
pub(crate) mod offerings;
pub(crate) mod questions;
pub(crate) mod quizzes;
pub(crate) mod staff_assignments;
pub(crate) mod submissions;
pub(crate) mod users;
