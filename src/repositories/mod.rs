pub(crate) mod agreements;
pub(crate) mod attendance;
pub(crate) mod classrooms;
pub(crate) mod courses;
pub(crate) mod enrollments;
pub(crate) mod grades;
pub(crate) mod groups;
pub(crate) mod guardians;
pub(crate) mod levels;
pub(crate) mod notifications;
pub(crate) mod roles;
pub(crate) mod schools;
pub(crate) mod settings;
pub(crate) mod stats;
pub(crate) mod students;
pub(crate) mod teachers;
pub(crate) mod users;
